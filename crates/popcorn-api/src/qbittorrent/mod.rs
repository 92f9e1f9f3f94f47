pub mod client;
pub mod error;

pub use client::{AddOptions, QbClient, Session};
pub use error::QbError;
