//! Errors returned by the access request ledger.

use crate::types::{Identity, RequestId, RequestStatus};
use access_ledger_runtime::StoreError;
use thiserror::Error;

/// Errors returned by access request operations
///
/// Every variant except [`EventLog`](Self::EventLog) is raised before any
/// state change.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessRequestError {
    /// The parallel arrays of a batch disagree in length
    #[error(
        "Input arrays must have the same length (requester_names: {requester_names}, \
         data_owners: {data_owners}, data_types: {data_types}, purposes: {purposes}, \
         durations: {durations})"
    )]
    InputMismatch {
        /// Length of `requester_names`
        requester_names: usize,
        /// Length of `data_owners`
        data_owners: usize,
        /// Length of `data_types`
        data_types: usize,
        /// Length of `purposes`
        purposes: usize,
        /// Length of `durations`
        durations: usize,
    },

    /// The caller is not the party allowed to act on the request
    #[error("{caller} is not authorized to act on request {id}")]
    NotAuthorized {
        /// Target request
        id: RequestId,
        /// Rejected caller
        caller: Identity,
    },

    /// Approve or deny on a request that is no longer PENDING
    #[error("Request {id} is not pending (status: {status})")]
    NotPending {
        /// Target request
        id: RequestId,
        /// Stored status
        status: RequestStatus,
    },

    /// Exercise on a request that is neither APPROVED nor expired
    #[error("Request {id} is not approved (status: {status})")]
    NotApproved {
        /// Target request
        id: RequestId,
        /// Stored status
        status: RequestStatus,
    },

    /// A read named an identifier that was never minted
    #[error("Request {0} not found")]
    NotFound(RequestId),

    /// The event log rejected an append, or an event failed to serialize
    #[error("Event log error: {0}")]
    EventLog(String),

    /// A command was accepted but did not publish the event it always publishes
    #[error("Command accepted without publishing {0}")]
    MissingEvent(&'static str),
}

/// Result type for access request operations
pub type Result<T> = std::result::Result<T, AccessRequestError>;

impl From<StoreError<AccessRequestError>> for AccessRequestError {
    fn from(error: StoreError<AccessRequestError>) -> Self {
        match error {
            StoreError::Rejected(error) => error,
            StoreError::Serialization(error) => Self::EventLog(error.to_string()),
            StoreError::EventLog(error) => Self::EventLog(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use access_ledger_core::event_log::EventLogError;

    #[test]
    fn mismatch_lists_every_length() {
        let error = AccessRequestError::InputMismatch {
            requester_names: 2,
            data_owners: 2,
            data_types: 1,
            purposes: 2,
            durations: 2,
        };

        let message = error.to_string();
        assert!(message.contains("data_types: 1"));
        assert!(message.contains("durations: 2"));
    }

    #[test]
    fn rejection_unwraps_to_domain_error() {
        let rejected = AccessRequestError::NotPending {
            id: RequestId::new(9),
            status: RequestStatus::Denied,
        };

        let error: AccessRequestError = StoreError::Rejected(rejected.clone()).into();

        assert_eq!(error, rejected);
    }

    #[test]
    fn log_failure_becomes_event_log_error() {
        let error: AccessRequestError = StoreError::EventLog(EventLogError::AppendFailed {
            event_type: "RequestCreated.v1".to_string(),
            reason: "offline".to_string(),
        })
        .into();

        assert!(matches!(
            error,
            AccessRequestError::EventLog(ref reason) if reason.contains("offline")
        ));
    }
}
