use thiserror::Error;

/// One mirror's failure reason within a single query attempt.
#[derive(Debug, Clone)]
pub struct MirrorFailure {
    pub mirror: String,
    pub reason: String,
}

/// Errors from the YTS listing client.
///
/// Individual mirror failures are never surfaced on their own; the only
/// failure a caller sees is the aggregate, carrying one reason per mirror.
#[derive(Debug, Error)]
pub enum YtsError {
    #[error("listing unavailable, all {} mirrors failed: {}", .0.len(), summarize(.0))]
    Unavailable(Vec<MirrorFailure>),
}

fn summarize(failures: &[MirrorFailure]) -> String {
    failures
        .iter()
        .map(|f| format!("{}: {}", f.mirror, f.reason))
        .collect::<Vec<_>>()
        .join("; ")
}
