//! Network clients for the movie browser: the YTS listing API (with
//! ordered mirror fallback) and the qBittorrent WebUI remote control.

pub mod qbittorrent;
pub mod yts;
