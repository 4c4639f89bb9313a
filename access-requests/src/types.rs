//! Domain types for access requests.
//!
//! An access request is created by a requester on behalf of a data owner,
//! decided by that owner, and later exercised by the requester until its
//! validity window runs out.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Sequential identifier of an access request, starting at 0
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(u64);

impl RequestId {
    /// Creates a `RequestId` from its raw value
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw value
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque caller identity, compared for equality only
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    /// Creates an `Identity`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identity as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Identity {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for Identity {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Lifecycle status of a request
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Waiting for the owner's decision
    Pending,
    /// Approved by the owner; may be exercised until it expires
    Approved,
    /// Denied by the owner
    Denied,
    /// Observed past its deadline on an exercise attempt
    Expired,
}

impl RequestStatus {
    /// Display label of the status
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Denied => "DENIED",
            Self::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a successful `exercise_request` call
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExerciseOutcome {
    /// Access was exercised; status is unchanged
    Exercised,
    /// The deadline had passed; the request is now EXPIRED
    Expired,
}

/// Input of a single request creation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccessRequest {
    /// Display name of the requester
    pub requester_name: String,
    /// Whose data is requested
    pub data_owner: Identity,
    /// Category of data requested
    pub data_type: String,
    /// Free-text justification
    pub purpose: String,
    /// Validity window in seconds, counted from creation
    pub duration: u64,
}

/// Batch creation input as parallel arrays; index `i` of every array
/// describes request `i`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestBatch {
    /// Display names of the requester
    pub requester_names: Vec<String>,
    /// Data owners
    pub data_owners: Vec<Identity>,
    /// Data categories
    pub data_types: Vec<String>,
    /// Justifications
    pub purposes: Vec<String>,
    /// Validity windows in seconds
    pub durations: Vec<u64>,
}

impl RequestBatch {
    /// Whether all five arrays have the same length
    #[must_use]
    pub fn is_aligned(&self) -> bool {
        let len = self.requester_names.len();
        self.data_owners.len() == len
            && self.data_types.len() == len
            && self.purposes.len() == len
            && self.durations.len() == len
    }

    /// Number of entries, as given by `requester_names`
    #[must_use]
    pub fn len(&self) -> usize {
        self.requester_names.len()
    }

    /// Whether the batch has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.requester_names.is_empty()
    }

    /// Appends one request to every array
    pub fn push(&mut self, request: NewAccessRequest) {
        self.requester_names.push(request.requester_name);
        self.data_owners.push(request.data_owner);
        self.data_types.push(request.data_type);
        self.purposes.push(request.purpose);
        self.durations.push(request.duration);
    }

    /// Splits the batch into individual requests, in input order.
    ///
    /// Stops at the shortest array; check [`is_aligned`](Self::is_aligned) first.
    pub fn into_requests(self) -> impl Iterator<Item = NewAccessRequest> {
        self.requester_names
            .into_iter()
            .zip(self.data_owners)
            .zip(self.data_types)
            .zip(self.purposes)
            .zip(self.durations)
            .map(
                |((((requester_name, data_owner), data_type), purpose), duration)| {
                    NewAccessRequest {
                        requester_name,
                        data_owner,
                        data_type,
                        purpose,
                        duration,
                    }
                },
            )
    }
}

impl FromIterator<NewAccessRequest> for RequestBatch {
    fn from_iter<I: IntoIterator<Item = NewAccessRequest>>(iter: I) -> Self {
        let mut batch = Self::default();
        for request in iter {
            batch.push(request);
        }
        batch
    }
}

/// A stored access request
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Unique identifier
    pub id: RequestId,
    /// Display name of the requester
    pub requester_name: String,
    /// Identity that created the request
    pub requester: Identity,
    /// Category of data requested
    pub data_type: String,
    /// Whose data is requested
    pub data_owner: Identity,
    /// Free-text justification
    pub purpose: String,
    /// When the request was created
    pub request_time: DateTime<Utc>,
    /// Validity window in seconds, counted from `request_time`
    pub duration: u64,
    /// Current stored status
    pub status: RequestStatus,
}

impl AccessRequest {
    /// Instant after which the request is expired.
    ///
    /// `None` when `request_time + duration` falls outside the calendar
    /// range: such a request never expires.
    #[must_use]
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        let secs = i64::try_from(self.duration).ok()?;
        let window = TimeDelta::try_seconds(secs)?;
        self.request_time.checked_add_signed(window)
    }

    /// Whether `now` is strictly past the deadline
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|deadline| now > deadline)
    }

    /// Status as seen at `now`, without mutating anything
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> RequestStatus {
        if self.is_expired_at(now) {
            RequestStatus::Expired
        } else {
            self.status
        }
    }
}

/// State of the access request ledger
///
/// Holds every request ever created plus the owner and requester indices.
/// Requests are never removed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequestState {
    /// All requests indexed by ID
    pub requests: HashMap<RequestId, AccessRequest>,
    /// Next identifier to mint
    pub next_id: u64,
    /// Request IDs per data owner, in creation order
    pub by_owner: HashMap<Identity, Vec<RequestId>>,
    /// Request IDs per requester, in creation order
    pub by_requester: HashMap<Identity, Vec<RequestId>>,
}

impl AccessRequestState {
    /// Creates an empty state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a request by ID
    #[must_use]
    pub fn get(&self, id: RequestId) -> Option<&AccessRequest> {
        self.requests.get(&id)
    }

    /// Checks if a request exists
    #[must_use]
    pub fn exists(&self, id: RequestId) -> bool {
        self.requests.contains_key(&id)
    }

    /// Number of identifiers minted so far
    #[must_use]
    pub const fn request_count(&self) -> u64 {
        self.next_id
    }

    /// IDs of requests naming `owner` as data owner
    #[must_use]
    pub fn ids_by_owner(&self, owner: &Identity) -> &[RequestId] {
        self.by_owner
            .get(owner)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// IDs of requests created by `requester`
    #[must_use]
    pub fn ids_by_requester(&self, requester: &Identity) -> &[RequestId] {
        self.by_requester
            .get(requester)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Requests of `owner`, in creation order
    pub fn requests_by_owner<'a>(
        &'a self,
        owner: &Identity,
    ) -> impl Iterator<Item = &'a AccessRequest> + 'a {
        self.ids_by_owner(owner)
            .iter()
            .filter_map(|id| self.requests.get(id))
    }

    /// Number of `owner`'s requests whose stored status is PENDING
    #[must_use]
    pub fn pending_count(&self, owner: &Identity) -> usize {
        self.requests_by_owner(owner)
            .filter(|request| request.status == RequestStatus::Pending)
            .count()
    }
}
