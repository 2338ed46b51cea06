//! DFU class glue
//!
//! The USB stack owns the DFU request state machine and calls into
//! [`DfuBridge`] for each download block, upload block, manifestation and
//! abort. The bridge answers with a [`DfuStatus`] that the stack reports in
//! its next `DFU_GETSTATUS` response.

mod bridge;
mod session;
mod status;

pub use bridge::{BridgeState, DfuBridge};
pub use session::{Direction, TransferSession};
pub use status::{poll_timeout_ms, DfuPhase, DfuStatus};
