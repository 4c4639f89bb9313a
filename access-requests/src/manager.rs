//! Async facade over the access request store.
//!
//! Mutations go through [`Store::send`], which holds the write lock while the
//! reducer runs and the resulting events are appended. Reads take the read
//! lock and project stored records.

use crate::actions::AccessRequestAction;
use crate::environment::AccessRequestEnvironment;
use crate::error::{AccessRequestError, Result};
use crate::reducer::AccessRequestReducer;
use crate::types::{
    AccessRequestState, ExerciseOutcome, Identity, NewAccessRequest, RequestBatch, RequestId,
    RequestStatus,
};
use crate::views::{AccessRequestDetail, OwnerRequestDetails};
use access_ledger_core::event_log::EventLog;
use access_ledger_runtime::Store;
use std::sync::Arc;

/// Store specialised to the access request ledger
pub type AccessRequestStore = Store<
    AccessRequestState,
    AccessRequestAction,
    AccessRequestEnvironment,
    AccessRequestReducer,
>;

/// Access request lifecycle manager
///
/// Cloning is cheap; clones share the same store.
#[derive(Clone)]
pub struct AccessRequestManager {
    store: AccessRequestStore,
}

impl AccessRequestManager {
    /// Creates an empty manager publishing to `event_log`
    #[must_use]
    pub fn new(environment: AccessRequestEnvironment, event_log: Arc<dyn EventLog>) -> Self {
        Self {
            store: Store::new(
                AccessRequestState::new(),
                AccessRequestReducer::new(),
                environment,
                event_log,
            ),
        }
    }

    /// Rebuilds a manager from every event already in `event_log`.
    ///
    /// Replayed events are not published again; new events are appended
    /// after them.
    ///
    /// # Errors
    ///
    /// Returns [`AccessRequestError::EventLog`] if the log cannot be read or
    /// holds an event that does not decode.
    pub async fn recover(
        environment: AccessRequestEnvironment,
        event_log: Arc<dyn EventLog>,
    ) -> Result<Self> {
        let store = Store::replay(
            AccessRequestState::new(),
            AccessRequestReducer::new(),
            environment,
            event_log,
        )
        .await?;

        Ok(Self { store })
    }

    /// Creates one PENDING request with `caller` as requester.
    ///
    /// # Errors
    ///
    /// Returns [`AccessRequestError::EventLog`] if the event log rejects the
    /// `RequestCreated` event.
    pub async fn create_request(
        &self,
        caller: &Identity,
        request: NewAccessRequest,
    ) -> Result<RequestId> {
        let events = self
            .store
            .send(AccessRequestAction::CreateRequest {
                caller: caller.clone(),
                request,
            })
            .await?;

        let id = created_ids(&events)
            .next()
            .ok_or(AccessRequestError::MissingEvent("RequestCreated.v1"))?;

        tracing::info!(request_id = %id, requester = %caller, "Access request created");
        Ok(id)
    }

    /// Creates several PENDING requests atomically; ids follow input order.
    ///
    /// # Errors
    ///
    /// - [`AccessRequestError::InputMismatch`] if the arrays differ in length;
    ///   nothing is created or published
    /// - [`AccessRequestError::EventLog`] if the event log rejects an append
    pub async fn create_requests_batch(
        &self,
        caller: &Identity,
        batch: RequestBatch,
    ) -> Result<Vec<RequestId>> {
        let events = self
            .store
            .send(AccessRequestAction::CreateRequestsBatch {
                caller: caller.clone(),
                batch,
            })
            .await?;

        let ids: Vec<_> = created_ids(&events).collect();
        tracing::info!(count = ids.len(), requester = %caller, "Access request batch created");
        Ok(ids)
    }

    /// Owner approves a PENDING request.
    ///
    /// # Errors
    ///
    /// - [`AccessRequestError::NotAuthorized`] unless `caller` is the data
    ///   owner of an existing request
    /// - [`AccessRequestError::NotPending`] if the request was already decided
    pub async fn approve(&self, caller: &Identity, id: RequestId) -> Result<()> {
        self.store
            .send(AccessRequestAction::ApproveRequest {
                caller: caller.clone(),
                id,
            })
            .await?;

        tracing::info!(request_id = %id, owner = %caller, "Access request approved");
        Ok(())
    }

    /// Owner denies a PENDING request.
    ///
    /// # Errors
    ///
    /// Same as [`approve`](Self::approve).
    pub async fn deny(&self, caller: &Identity, id: RequestId) -> Result<()> {
        self.store
            .send(AccessRequestAction::DenyRequest {
                caller: caller.clone(),
                id,
            })
            .await?;

        tracing::info!(request_id = %id, owner = %caller, "Access request denied");
        Ok(())
    }

    /// Requester exercises a request.
    ///
    /// A request past its deadline is marked EXPIRED, whatever its status,
    /// and [`ExerciseOutcome::Expired`] is returned.
    ///
    /// # Errors
    ///
    /// - [`AccessRequestError::NotAuthorized`] unless `caller` is the requester
    ///   of an existing request
    /// - [`AccessRequestError::NotApproved`] if the request is within its
    ///   window but not APPROVED
    pub async fn exercise_request(
        &self,
        caller: &Identity,
        id: RequestId,
    ) -> Result<ExerciseOutcome> {
        let events = self
            .store
            .send(AccessRequestAction::ExerciseRequest {
                caller: caller.clone(),
                id,
            })
            .await?;

        let outcome = events
            .iter()
            .find_map(|event| match event {
                AccessRequestAction::AccessExercised { .. } => Some(ExerciseOutcome::Exercised),
                AccessRequestAction::AccessExpired { .. } => Some(ExerciseOutcome::Expired),
                _ => None,
            })
            .ok_or(AccessRequestError::MissingEvent("AccessExercised.v1"))?;

        match outcome {
            ExerciseOutcome::Exercised => {
                tracing::info!(request_id = %id, requester = %caller, "Access exercised");
            },
            ExerciseOutcome::Expired => {
                tracing::warn!(request_id = %id, requester = %caller, "Access request expired");
            },
        }
        Ok(outcome)
    }

    /// Display label of the stored status.
    ///
    /// # Errors
    ///
    /// Returns [`AccessRequestError::NotFound`] for an unknown id.
    pub async fn check_status(&self, id: RequestId) -> Result<&'static str> {
        self.store
            .state(|s| s.get(id).map(|request| request.status.as_str()))
            .await
            .ok_or(AccessRequestError::NotFound(id))
    }

    /// Status as seen now: EXPIRED once past the deadline, without storing it.
    ///
    /// # Errors
    ///
    /// Returns [`AccessRequestError::NotFound`] for an unknown id.
    pub async fn effective_status(&self, id: RequestId) -> Result<RequestStatus> {
        let now = self.store.environment().now();
        self.store
            .state(|s| s.get(id).map(|request| request.status_at(now)))
            .await
            .ok_or(AccessRequestError::NotFound(id))
    }

    /// IDs of requests naming `owner` as data owner, in creation order
    pub async fn list_by_owner(&self, owner: &Identity) -> Vec<RequestId> {
        self.store.state(|s| s.ids_by_owner(owner).to_vec()).await
    }

    /// IDs of requests created by `requester`, in creation order
    pub async fn list_by_requester(&self, requester: &Identity) -> Vec<RequestId> {
        self.store
            .state(|s| s.ids_by_requester(requester).to_vec())
            .await
    }

    /// Full record of one request.
    ///
    /// # Errors
    ///
    /// Returns [`AccessRequestError::NotFound`] for an unknown id.
    pub async fn detail(&self, id: RequestId) -> Result<AccessRequestDetail> {
        self.store
            .state(|s| s.get(id).map(AccessRequestDetail::from))
            .await
            .ok_or(AccessRequestError::NotFound(id))
    }

    /// Every request of `owner` as parallel arrays, ordered like
    /// [`list_by_owner`](Self::list_by_owner)
    pub async fn detail_batch_by_owner(&self, owner: &Identity) -> OwnerRequestDetails {
        self.store
            .state(|s| s.requests_by_owner(owner).collect())
            .await
    }

    /// Number of `owner`'s requests whose stored status is PENDING
    pub async fn pending_count(&self, owner: &Identity) -> usize {
        self.store.state(|s| s.pending_count(owner)).await
    }

    /// Number of identifiers minted so far
    pub async fn request_count(&self) -> u64 {
        self.store.state(AccessRequestState::request_count).await
    }

    /// The event log this manager publishes to
    #[must_use]
    pub fn event_log(&self) -> Arc<dyn EventLog> {
        self.store.event_log()
    }
}

fn created_ids(events: &[AccessRequestAction]) -> impl Iterator<Item = RequestId> + '_ {
    events.iter().filter_map(|event| match event {
        AccessRequestAction::RequestCreated { id, .. } => Some(*id),
        _ => None,
    })
}
