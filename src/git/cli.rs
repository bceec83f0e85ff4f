//! Local object store backed by `git` subprocesses

use std::{
    cell::RefCell,
    io::{BufRead, BufReader, Read, Write},
    path::PathBuf,
    process::{Child, ChildStdin, ChildStdout, Command, Stdio},
};

use gix_object::Kind;

use super::{ObjectId, ObjectStore, Reference, TypedObject};
use crate::error::{Error, Result};

/// Reads refs and objects from the repository git invoked us for.
///
/// Object reads go through one long-lived `git cat-file --batch` process
/// that is spawned on first use.
pub struct GitCli {
    git_dir: Option<PathBuf>,
    batch: RefCell<Option<CatFileBatch>>,
}

impl GitCli {
    /// Use `GIT_DIR` from the environment (git sets it for remote helpers)
    pub fn from_env() -> Self {
        Self::new(std::env::var_os("GIT_DIR").map(PathBuf::from))
    }

    pub fn new(git_dir: Option<PathBuf>) -> Self {
        Self {
            git_dir,
            batch: RefCell::new(None),
        }
    }

    /// Path of the git directory, asking git when not set explicitly
    pub fn git_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.git_dir {
            return Ok(dir.clone());
        }
        let out = self.run(&["rev-parse", "--absolute-git-dir"])?;
        if !out.status.success() {
            return Err(Error::retrieval("not inside a git repository"));
        }
        Ok(PathBuf::from(String::from_utf8_lossy(&out.stdout).trim()))
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new("git");
        if let Some(dir) = &self.git_dir {
            cmd.arg("--git-dir").arg(dir);
        }
        cmd
    }

    fn run(&self, args: &[&str]) -> Result<std::process::Output> {
        self.command()
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| Error::retrieval(format!("failed to run git {}: {}", args.join(" "), e)))
    }

    fn read_batch(&self, id: &ObjectId) -> Result<TypedObject> {
        let mut slot = self.batch.borrow_mut();
        if slot.is_none() {
            *slot = Some(CatFileBatch::spawn(self.command())?);
        }
        match slot.as_mut() {
            Some(batch) => batch.read(id),
            None => Err(Error::retrieval("git cat-file is not running")),
        }
    }
}

impl ObjectStore for GitCli {
    fn resolve_reference(&self, name: &str) -> Result<Reference> {
        let out = self.run(&["symbolic-ref", "-q", name])?;
        if out.status.success() {
            let target = String::from_utf8_lossy(&out.stdout).trim().to_string();
            return Ok(Reference::symbolic(name, target));
        }

        let out = self.run(&["rev-parse", "--verify", "-q", name])?;
        if !out.status.success() {
            return Err(Error::retrieval(format!("could not resolve reference {}", name)));
        }
        let hex_str = String::from_utf8_lossy(&out.stdout).trim().to_string();
        Ok(Reference::direct(name, ObjectId::from_hex(&hex_str)?))
    }

    fn branches(&self) -> Result<Vec<Reference>> {
        let out = self.run(&[
            "for-each-ref",
            "--format=%(objectname) %(refname)",
            "refs/heads/",
        ])?;
        if !out.status.success() {
            return Err(Error::retrieval(format!(
                "git for-each-ref failed: {}",
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }

        String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| {
                let (hex_str, name) = line
                    .split_once(' ')
                    .ok_or_else(|| Error::retrieval(format!("unexpected for-each-ref line: {}", line)))?;
                Ok(Reference::direct(name, ObjectId::from_hex(hex_str)?))
            })
            .collect()
    }

    fn object(&self, id: &ObjectId) -> Result<TypedObject> {
        self.read_batch(id)
    }
}

struct CatFileBatch {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl CatFileBatch {
    fn spawn(mut cmd: Command) -> Result<Self> {
        let mut child = cmd
            .arg("cat-file")
            .arg("--batch")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::retrieval(format!("failed to spawn git cat-file: {}", e)))?;

        let stdin = child.stdin.take();
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::retrieval("git cat-file has no stdout"))?;

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    fn read(&mut self, id: &ObjectId) -> Result<TypedObject> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| Error::retrieval("git cat-file stdin closed"))?;
        writeln!(stdin, "{}", id)?;
        stdin.flush()?;

        // Response header: "<oid> <type> <size>" or "<oid> missing"
        let mut header = String::new();
        self.stdout.read_line(&mut header)?;
        let parts: Vec<&str> = header.split_whitespace().collect();
        let (kind, size) = match parts.as_slice() {
            [_, kind, size] => (*kind, *size),
            [_, "missing"] => {
                return Err(Error::retrieval(format!("object {} not found", id)));
            }
            _ => {
                return Err(Error::retrieval(format!(
                    "unexpected cat-file response for {}: {:?}",
                    id,
                    header.trim()
                )));
            }
        };

        let kind = Kind::from_bytes(kind.as_bytes())
            .map_err(|_| Error::retrieval(format!("object {} has unknown type {}", id, kind)))?;
        let size: u64 = size
            .parse()
            .map_err(|_| Error::retrieval(format!("object {} has invalid size {}", id, size)))?;

        let mut data = vec![0u8; size as usize];
        self.stdout.read_exact(&mut data)?;
        let mut newline = [0u8; 1];
        self.stdout.read_exact(&mut newline)?;

        Ok(TypedObject { kind, size, data })
    }
}

impl Drop for CatFileBatch {
    fn drop(&mut self) {
        // Closing stdin lets cat-file exit on its own
        drop(self.stdin.take());
        let _ = self.child.wait();
    }
}
