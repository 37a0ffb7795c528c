use thiserror::Error;

/// Errors surfaced by `crates/tickets`'s scheduler and search.
#[derive(Debug, Error)]
pub enum TicketError {
    #[error("no testing configuration payload was supplied")]
    EmptyPayload,

    #[error("no known device supports vendor={vendor:?} model={model:?} version={version:?}")]
    UnsupportedTriple {
        vendor: String,
        model: String,
        version: String,
    },

    #[error("no such ticket: {0}")]
    NotFound(String),

    #[error("unknown search field: {0:?}")]
    UnknownSearchField(String),

    #[error("ticket storage error: {0}")]
    Storage(String),
}
