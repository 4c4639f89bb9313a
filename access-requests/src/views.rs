//! Read-side projections of stored requests.

use crate::types::{AccessRequest, Identity, RequestId};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Full record of one request, status rendered as its display label
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AccessRequestDetail {
    /// Request identifier
    pub id: RequestId,
    /// Display name of the requester
    pub requester_name: String,
    /// Creating identity
    pub requester: Identity,
    /// Category of data requested
    pub data_type: String,
    /// Data owner
    pub data_owner: Identity,
    /// Free-text justification
    pub purpose: String,
    /// Creation time
    pub request_time: DateTime<Utc>,
    /// Validity window in seconds
    pub duration: u64,
    /// Stored status label
    pub status: &'static str,
}

impl From<&AccessRequest> for AccessRequestDetail {
    fn from(request: &AccessRequest) -> Self {
        Self {
            id: request.id,
            requester_name: request.requester_name.clone(),
            requester: request.requester.clone(),
            data_type: request.data_type.clone(),
            data_owner: request.data_owner.clone(),
            purpose: request.purpose.clone(),
            request_time: request.request_time,
            duration: request.duration,
            status: request.status.as_str(),
        }
    }
}

/// Every request of one owner as parallel arrays.
///
/// Index `i` of every array describes the same request; order matches the
/// owner index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OwnerRequestDetails {
    /// Request identifiers
    pub ids: Vec<RequestId>,
    /// Display names of the requesters
    pub requester_names: Vec<String>,
    /// Creating identities
    pub requesters: Vec<Identity>,
    /// Data categories
    pub data_types: Vec<String>,
    /// Data owners
    pub data_owners: Vec<Identity>,
    /// Justifications
    pub purposes: Vec<String>,
    /// Creation times
    pub request_times: Vec<DateTime<Utc>>,
    /// Validity windows in seconds
    pub durations: Vec<u64>,
    /// Stored status labels
    pub statuses: Vec<&'static str>,
}

impl OwnerRequestDetails {
    /// Number of requests described
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether no request is described
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn push(&mut self, request: &AccessRequest) {
        self.ids.push(request.id);
        self.requester_names.push(request.requester_name.clone());
        self.requesters.push(request.requester.clone());
        self.data_types.push(request.data_type.clone());
        self.data_owners.push(request.data_owner.clone());
        self.purposes.push(request.purpose.clone());
        self.request_times.push(request.request_time);
        self.durations.push(request.duration);
        self.statuses.push(request.status.as_str());
    }
}

impl<'a> FromIterator<&'a AccessRequest> for OwnerRequestDetails {
    fn from_iter<I: IntoIterator<Item = &'a AccessRequest>>(iter: I) -> Self {
        let mut details = Self::default();
        for request in iter {
            details.push(request);
        }
        details
    }
}
