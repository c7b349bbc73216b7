use thiserror::Error;

/// Errors produced by store operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A path argument was empty or malformed.
    #[error("invalid argument to {operation}(): {reason}")]
    InvalidArgument {
        operation: &'static str,
        reason: String,
    },

    /// A subscriber callback panicked while handling a notification.
    ///
    /// Never returned from `send`; it is only logged.
    #[error("unexpected error in store notification ({path}): {message}")]
    SubscriberCallback { path: String, message: String },

    /// The store's broadcast bus has stopped. Fatal for the instance.
    #[error("unable to send, the store {store} is dead due to previous errors")]
    StoreTerminated { store: String },

    /// An intermediate segment of a write path holds a non-container value.
    #[error("cannot write through '{segment}' in path '{path}': not a mapping")]
    PathConflict { path: String, segment: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn invalid(operation: &'static str, reason: impl Into<String>) -> Self {
        StoreError::InvalidArgument {
            operation,
            reason: reason.into(),
        }
    }

    /// True for errors that leave the store permanently unusable for writes.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::StoreTerminated { .. })
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;
