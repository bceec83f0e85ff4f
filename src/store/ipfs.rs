use std::{
    io::Write,
    path::PathBuf,
    process::{Command, Stdio},
};

use cid::Cid;

use super::{parse_cid, BlockFormat, ContentStore};
use crate::error::{Error, Result};

/// Content store backed by a local IPFS node, driven through the `ipfs` CLI
pub struct IpfsStore {
    bin: PathBuf,
    api: Option<String>,
}

impl IpfsStore {
    pub fn new(bin: PathBuf, api: Option<String>) -> Self {
        Self { bin, api }
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.bin);
        if let Some(api) = &self.api {
            cmd.arg("--api").arg(api);
        }
        cmd
    }

    fn run(&self, mut cmd: Command, stdin: Option<&[u8]>) -> Result<Vec<u8>> {
        let mut child = cmd
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::store(format!("failed to execute {:?}: {}", self.bin, e)))?;

        if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
            pipe.write_all(input)
                .map_err(|e| Error::store(format!("failed to write to ipfs: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| Error::store(format!("failed to wait for ipfs: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::store(format!("ipfs failed: {}", stderr.trim())));
        }

        Ok(output.stdout)
    }
}

impl ContentStore for IpfsStore {
    fn put(&self, bytes: &[u8], format: BlockFormat) -> Result<Cid> {
        let mut cmd = self.command();
        cmd.arg("dag")
            .arg("put")
            .arg("--input-codec")
            .arg(format.input_codec())
            .arg("--store-codec")
            .arg(format.store_codec())
            .arg("--hash")
            .arg(format.hash_name());

        let stdout = self.run(cmd, Some(bytes))?;
        let text = String::from_utf8_lossy(&stdout);
        tracing::debug!("ipfs dag put ({}) -> {}", format.store_codec(), text.trim());

        parse_cid(&text).map_err(|e| Error::store(format!("ipfs dag put returned {}", e)))
    }

    fn get(&self, cid: &Cid) -> Result<Vec<u8>> {
        let mut cmd = self.command();
        cmd.arg("block").arg("get").arg(cid.to_string());
        self.run(cmd, None)
    }
}
