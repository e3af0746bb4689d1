/// Errors returned by the ledger facade.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("entry encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("entry decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
