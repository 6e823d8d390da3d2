//! Error taxonomy of the coordination core.
//!
//! Every recoverable case is an explicit return value; transport failures
//! are surfaced verbatim and never swallowed. Subscription-level faults are
//! delivered through the session event channel instead (exactly once, and
//! without detaching the subscription).

use thiserror::Error;

use crate::model::RoomStatus;
use crate::store::StoreError;

/// Result alias for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors surfaced by the coordination core.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Room or member missing on a required read.
    #[error("room `{code}` not found")]
    NotFound {
        /// Room code the read targeted.
        code: String,
    },
    /// Join attempt against a room that is no longer waiting.
    #[error("room `{code}` has already started")]
    AlreadyStarted {
        /// Room code the join targeted.
        code: String,
    },
    /// Join attempt against a full room.
    #[error("room `{code}` is full")]
    Capacity {
        /// Room code the join targeted.
        code: String,
    },
    /// The code minter exhausted its collision retries.
    #[error("could not mint a unique room code after {attempts} attempts")]
    CodeExhaustion {
        /// Number of attempts made.
        attempts: usize,
    },
    /// Transport-level failure, surfaced verbatim.
    #[error("store operation failed")]
    Store(#[from] StoreError),
    /// A status or pagination write was refused because it would cross an
    /// illegal edge. Returned synchronously; the core never issues the
    /// write.
    #[error("illegal transition: cannot {action} while status is {from:?}")]
    IllegalTransition {
        /// The refused operation.
        action: &'static str,
        /// Locally observed status at the time of the call.
        from: Option<RoomStatus>,
    },
    /// A host-only write was issued by a non-host session. Enforcement is
    /// advisory: the core refuses from its own API, nothing more.
    #[error("host-only action `{action}` refused for non-host")]
    NotHost {
        /// The refused operation.
        action: &'static str,
    },
    /// A room snapshot failed to parse against the schema.
    #[error("malformed snapshot for room `{code}`: {message}")]
    Corrupt {
        /// Room code the snapshot belongs to.
        code: String,
        /// Parser diagnostic.
        message: String,
    },
}
