pub mod client;
pub mod error;
pub mod types;

pub use client::{YtsClient, DEFAULT_MIRRORS};
pub use error::{MirrorFailure, YtsError};
pub use types::{Genre, ListQuery, Movie, MoviePage, SortBy, SortOrder, Torrent};
