/// Errors raised selecting a chain by time.
#[derive(Debug, thiserror::Error)]
pub enum CollectionsError {
    /// No backup chains were found at all.
    #[error("no backup chains found")]
    NoBackupChains,

    /// More than one chain's `[start_time, end_time]` window covers the
    /// requested time — should be unreachable given how chains are built.
    #[error("more than one backup chain covers the requested time")]
    AmbiguousTime,
}
