#![deny(clippy::mod_module_files)]
use std::io;

use anyhow::{Context, Result};
use cid::Cid;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod engine;
mod error;
mod git;
mod manifest;
mod protocol;
mod remote;
mod store;
#[cfg(test)]
mod testing;
mod tracker;

use config::{RemoteConfig, StoreKind};
use git::GitCli;
use remote::Remote;
use store::{BlockFormat, ContentStore, FilesystemBlockStore, IpfsStore};
use tracker::FileTracker;

/// Git remote helper pushing repositories into IPFS as git-raw IPLD blocks
#[derive(Parser, Debug)]
#[command(name = "git-remote-ipld", version)]
struct Args {
    /// Remote name (e.g., "origin")
    remote_name: String,
    /// Remote URL (e.g., "ipld::<commit hash>")
    url: Option<String>,
}

/// Wrapper enum for the configured content store
enum Store {
    Ipfs(IpfsStore),
    Filesystem(FilesystemBlockStore),
}

impl ContentStore for Store {
    fn put(&self, bytes: &[u8], format: BlockFormat) -> error::Result<Cid> {
        match self {
            Store::Ipfs(s) => s.put(bytes, format),
            Store::Filesystem(s) => s.put(bytes, format),
        }
    }

    fn get(&self, cid: &Cid) -> error::Result<Vec<u8>> {
        match self {
            Store::Ipfs(s) => s.get(cid),
            Store::Filesystem(s) => s.get(cid),
        }
    }
}

fn init_tracing() {
    // stdout carries the remote-helper protocol; logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("git_remote_ipld=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    // Git hands us the URL with or without the "ipld::" prefix
    let remote_hash = args
        .url
        .as_deref()
        .map(|url| url.strip_prefix("ipld::").unwrap_or(url).to_string())
        .filter(|hash| !hash.is_empty());
    tracing::debug!("remote {} hash {:?}", args.remote_name, remote_hash);

    let config = RemoteConfig::load().context("Failed to load configuration")?;

    let objects = GitCli::from_env();
    let git_dir = objects.git_dir()?;

    let store = match config.store {
        StoreKind::Ipfs => {
            tracing::debug!("Using IPFS store via {:?}", config.ipfs_bin);
            Store::Ipfs(IpfsStore::new(config.ipfs_bin.clone(), config.ipfs_api.clone()))
        }
        StoreKind::Filesystem => {
            tracing::debug!("Using filesystem store: {:?}", config.blocks_dir);
            let fs_store = FilesystemBlockStore::new(&config.blocks_dir);
            fs_store.initialize()?;
            Store::Filesystem(fs_store)
        }
    };

    let tracker_dir = config.tracker_dir_for(&git_dir);
    let tracker = FileTracker::open(&tracker_dir)
        .with_context(|| format!("Failed to open tracker at {:?}", tracker_dir))?;

    let mut remote = Remote::new(objects, store, tracker, remote_hash);
    remote.progress = config.progress;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    protocol::handle_commands(&mut remote, stdin.lock(), &mut stdout)?;

    Ok(())
}
