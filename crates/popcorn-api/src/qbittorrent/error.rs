use thiserror::Error;

/// Errors from the qBittorrent WebUI client.
#[derive(Debug, Error)]
pub enum QbError {
    #[error("qBittorrent unreachable: {0}")]
    Unreachable(String),

    #[error("qBittorrent login rejected, check WebUI credentials")]
    AuthFailed,

    #[error("torrent submit rejected: {0}")]
    Submit(String),
}
