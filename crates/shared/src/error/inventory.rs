use thiserror::Error;

/// Errors surfaced by `crates/inventory`'s public operations. Adapter
/// failures (ping/ssh) are not represented here — they are folded into
/// status transitions and `ReleaseResult`, never propagated as errors.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("unknown device status: {0:?}")]
    UnknownStatus(String),

    #[error("no device matches vendor={vendor:?} model={model:?} version={version:?}")]
    NoMatchingDevice {
        vendor: String,
        model: String,
        version: String,
    },

    #[error("catalog reload failed: {0}")]
    ReloadFailed(String),
}
