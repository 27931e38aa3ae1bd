use std::{io, net::SocketAddr, path::PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to replace {}: {source}", .path.display())]
    Rename { path: PathBuf, source: io::Error },

    #[error("failed to serialize deliveries: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Fatal errors; everything else is logged and swallowed.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to listen on {addr}: {source}")]
    Bind { addr: SocketAddr, source: io::Error },

    #[error("server error: {0}")]
    Serve(#[from] io::Error),
}
