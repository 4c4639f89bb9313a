//! Actions for the access request ledger.
//!
//! One enum carries both commands (intent, validated by the reducer) and
//! events (facts, appended to the event log and replayed to rebuild state).

use crate::types::{Identity, NewAccessRequest, RequestBatch, RequestId};
use access_ledger_core::event::Event;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Reason carried by every `AccessExpired` event
pub const EXPIRY_REASON: &str = "Request has expired";

/// Commands and events of the access request ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessRequestAction {
    // ========== Commands ==========
    /// Command: Create one request on behalf of `caller`
    CreateRequest {
        /// Becomes the stored requester
        caller: Identity,
        /// Request fields
        request: NewAccessRequest,
    },

    /// Command: Create several requests atomically, in input order
    CreateRequestsBatch {
        /// Becomes the stored requester of every entry
        caller: Identity,
        /// Parallel arrays of request fields
        batch: RequestBatch,
    },

    /// Command: Owner approves a pending request
    ApproveRequest {
        /// Must be the stored data owner
        caller: Identity,
        /// Request to approve
        id: RequestId,
    },

    /// Command: Owner denies a pending request
    DenyRequest {
        /// Must be the stored data owner
        caller: Identity,
        /// Request to deny
        id: RequestId,
    },

    /// Command: Requester exercises an approved request
    ExerciseRequest {
        /// Must be the stored requester
        caller: Identity,
        /// Request to exercise
        id: RequestId,
    },

    // ========== Events ==========
    /// Event: A request was created in PENDING status
    RequestCreated {
        /// Assigned identifier
        id: RequestId,
        /// Data owner
        owner: Identity,
        /// Display name of the requester
        requester_name: String,
        /// Creating identity
        requester: Identity,
        /// Category of data requested
        data_type: String,
        /// Free-text justification
        purpose: String,
        /// Validity window in seconds
        duration: u64,
        /// Creation time
        requested_at: DateTime<Utc>,
    },

    /// Event: The owner approved a request
    RequestApproved {
        /// Request identifier
        id: RequestId,
        /// Data owner
        owner: Identity,
        /// Requester
        requester: Identity,
    },

    /// Event: The owner denied a request
    RequestDenied {
        /// Request identifier
        id: RequestId,
        /// Data owner
        owner: Identity,
        /// Requester
        requester: Identity,
    },

    /// Event: The requester exercised an approved request
    AccessExercised {
        /// Request identifier
        id: RequestId,
        /// Requester
        requester: Identity,
    },

    /// Event: An exercise attempt found the request past its deadline
    AccessExpired {
        /// Request identifier
        id: RequestId,
        /// Always [`EXPIRY_REASON`]
        reason: String,
        /// Requester
        requester: Identity,
    },
}

impl AccessRequestAction {
    /// Whether this action is a command
    #[must_use]
    pub const fn is_command(&self) -> bool {
        matches!(
            self,
            Self::CreateRequest { .. }
                | Self::CreateRequestsBatch { .. }
                | Self::ApproveRequest { .. }
                | Self::DenyRequest { .. }
                | Self::ExerciseRequest { .. }
        )
    }

    /// Whether this action is an event
    #[must_use]
    pub const fn is_event(&self) -> bool {
        !self.is_command()
    }

    /// Request the action targets or describes, if it names exactly one
    #[must_use]
    pub const fn request_id(&self) -> Option<RequestId> {
        match self {
            Self::ApproveRequest { id, .. }
            | Self::DenyRequest { id, .. }
            | Self::ExerciseRequest { id, .. }
            | Self::RequestCreated { id, .. }
            | Self::RequestApproved { id, .. }
            | Self::RequestDenied { id, .. }
            | Self::AccessExercised { id, .. }
            | Self::AccessExpired { id, .. } => Some(*id),
            Self::CreateRequest { .. } | Self::CreateRequestsBatch { .. } => None,
        }
    }
}

impl Event for AccessRequestAction {
    fn event_type(&self) -> &'static str {
        match self {
            Self::CreateRequest { .. } => "CreateRequest.command",
            Self::CreateRequestsBatch { .. } => "CreateRequestsBatch.command",
            Self::ApproveRequest { .. } => "ApproveRequest.command",
            Self::DenyRequest { .. } => "DenyRequest.command",
            Self::ExerciseRequest { .. } => "ExerciseRequest.command",
            Self::RequestCreated { .. } => "RequestCreated.v1",
            Self::RequestApproved { .. } => "RequestApproved.v1",
            Self::RequestDenied { .. } => "RequestDenied.v1",
            Self::AccessExercised { .. } => "AccessExercised.v1",
            Self::AccessExpired { .. } => "AccessExpired.v1",
        }
    }

    fn metadata(&self) -> Option<serde_json::Value> {
        self.request_id()
            .map(|id| serde_json::json!({ "request_id": id }))
    }
}
