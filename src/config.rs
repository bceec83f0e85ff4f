use std::{
    env,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    let home = match dirs::home_dir() {
        Some(home) => home,
        None => return path.to_path_buf(),
    };
    match path.strip_prefix("~") {
        Ok(rest) if rest.as_os_str().is_empty() => home,
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

/// Which content store backs the remote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Local IPFS node via the `ipfs` CLI
    Ipfs,
    /// Block directory on the local filesystem
    Filesystem,
}

impl std::str::FromStr for StoreKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ipfs" => Ok(StoreKind::Ipfs),
            "filesystem" => Ok(StoreKind::Filesystem),
            other => anyhow::bail!("Unknown store kind: {}", other),
        }
    }
}

/// Configuration for git-remote-ipld
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    #[serde(default = "defaults::store")]
    pub store: StoreKind,
    /// `ipfs` executable
    #[serde(default = "defaults::ipfs_bin")]
    pub ipfs_bin: PathBuf,
    /// API multiaddr passed to `ipfs --api`
    #[serde(default)]
    pub ipfs_api: Option<String>,
    /// Block directory for the filesystem store
    #[serde(default = "defaults::blocks_dir")]
    pub blocks_dir: PathBuf,
    /// Tracker location; defaults to `<GIT_DIR>/ipld`
    #[serde(default)]
    pub tracker_dir: Option<PathBuf>,
    #[serde(default = "defaults::progress")]
    pub progress: bool,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            store: defaults::store(),
            ipfs_bin: defaults::ipfs_bin(),
            ipfs_api: None,
            blocks_dir: defaults::blocks_dir(),
            tracker_dir: None,
            progress: defaults::progress(),
        }
    }
}

impl RemoteConfig {
    /// Load the config file if there is one, then apply environment overrides
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file_path()?;
        tracing::debug!("loading git-remote-ipld config from {:?}", config_path);
        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env_overrides()?;
        Ok(config)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(store) = env::var("GIT_REMOTE_IPLD_STORE") {
            self.store = store.parse()?;
        }

        if let Ok(path) = env::var("GIT_REMOTE_IPLD_IPFS_BIN") {
            self.ipfs_bin = expand_tilde(&PathBuf::from(path));
        }

        if let Ok(api) = env::var("GIT_REMOTE_IPLD_IPFS_API") {
            self.ipfs_api = Some(api);
        }

        if let Ok(path) = env::var("GIT_REMOTE_IPLD_BLOCKS_DIR") {
            self.blocks_dir = expand_tilde(&PathBuf::from(path));
        }

        if let Ok(path) = env::var("GIT_REMOTE_IPLD_TRACKER_DIR") {
            self.tracker_dir = Some(expand_tilde(&PathBuf::from(path)));
        }

        if let Ok(progress) = env::var("GIT_REMOTE_IPLD_PROGRESS") {
            self.progress = progress
                .parse()
                .context("Failed to parse GIT_REMOTE_IPLD_PROGRESS as bool")?;
        }
        Ok(())
    }

    /// Load configuration from a file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: RemoteConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand tildes in all path fields
        config.ipfs_bin = expand_tilde(&config.ipfs_bin);
        config.blocks_dir = expand_tilde(&config.blocks_dir);
        if let Some(ref tracker_dir) = config.tracker_dir {
            config.tracker_dir = Some(expand_tilde(tracker_dir));
        }

        Ok(config)
    }

    /// Get default config file path
    pub fn config_file_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".config/git-remote-ipld/config.yaml"))
            .context("Could not determine home directory for config file")
    }

    /// Tracker directory for the repository at `git_dir`
    pub fn tracker_dir_for(&self, git_dir: &Path) -> PathBuf {
        self.tracker_dir
            .clone()
            .unwrap_or_else(|| git_dir.join("ipld"))
    }
}

mod defaults {
    use std::path::PathBuf;

    use super::StoreKind;

    pub(crate) fn store() -> StoreKind {
        StoreKind::Ipfs
    }

    pub(crate) fn ipfs_bin() -> PathBuf {
        PathBuf::from("ipfs")
    }

    pub(crate) fn blocks_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|dir| dir.join("git-remote-ipld/blocks"))
            .unwrap_or_else(|| PathBuf::from(".git-remote-ipld/blocks"))
    }

    pub(crate) fn progress() -> bool {
        true
    }
}
