//! Reducer logic for the access request ledger.
//!
//! Commands are validated against current state first. Only when validation
//! passes are the resulting events built, applied to state and returned as
//! `PublishEvent` effects. Events sent directly (during replay) are applied
//! without producing effects.

use crate::actions::{AccessRequestAction, EXPIRY_REASON};
use crate::environment::AccessRequestEnvironment;
use crate::error::AccessRequestError;
use crate::types::{
    AccessRequest, AccessRequestState, Identity, NewAccessRequest, RequestBatch, RequestId,
    RequestStatus,
};
use access_ledger_core::effect::{Effect, Effects};
use access_ledger_core::reducer::Reducer;
use access_ledger_core::smallvec;
use chrono::{DateTime, Utc};

/// Reducer for the access request ledger
#[derive(Clone, Debug, Default)]
pub struct AccessRequestReducer;

impl AccessRequestReducer {
    /// Creates a new `AccessRequestReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Validates a `CreateRequestsBatch` command
    fn validate_batch(batch: &RequestBatch) -> Result<(), AccessRequestError> {
        if batch.is_aligned() {
            return Ok(());
        }

        Err(AccessRequestError::InputMismatch {
            requester_names: batch.requester_names.len(),
            data_owners: batch.data_owners.len(),
            data_types: batch.data_types.len(),
            purposes: batch.purposes.len(),
            durations: batch.durations.len(),
        })
    }

    /// Validates an `ApproveRequest` or `DenyRequest` command.
    ///
    /// Authorization is checked before status. Nobody owns an unknown id.
    fn validate_owner_decision<'a>(
        state: &'a AccessRequestState,
        caller: &Identity,
        id: RequestId,
    ) -> Result<&'a AccessRequest, AccessRequestError> {
        let Some(request) = state.get(id).filter(|r| r.data_owner == *caller) else {
            return Err(AccessRequestError::NotAuthorized {
                id,
                caller: caller.clone(),
            });
        };

        if request.status != RequestStatus::Pending {
            return Err(AccessRequestError::NotPending {
                id,
                status: request.status,
            });
        }

        Ok(request)
    }

    /// Validates an `ExerciseRequest` command and picks the resulting event.
    ///
    /// Expiry is checked before approval, so a request past its deadline
    /// expires whatever its stored status. Nobody requested an unknown id.
    fn validate_exercise(
        state: &AccessRequestState,
        caller: &Identity,
        id: RequestId,
        now: DateTime<Utc>,
    ) -> Result<AccessRequestAction, AccessRequestError> {
        let Some(request) = state.get(id).filter(|r| r.requester == *caller) else {
            return Err(AccessRequestError::NotAuthorized {
                id,
                caller: caller.clone(),
            });
        };

        if request.is_expired_at(now) {
            return Ok(AccessRequestAction::AccessExpired {
                id,
                reason: EXPIRY_REASON.to_string(),
                requester: request.requester.clone(),
            });
        }

        if request.status != RequestStatus::Approved {
            return Err(AccessRequestError::NotApproved {
                id,
                status: request.status,
            });
        }

        Ok(AccessRequestAction::AccessExercised {
            id,
            requester: request.requester.clone(),
        })
    }

    /// Builds the `RequestCreated` event for the next identifier
    fn created_event(
        state: &AccessRequestState,
        caller: &Identity,
        request: NewAccessRequest,
        now: DateTime<Utc>,
    ) -> AccessRequestAction {
        AccessRequestAction::RequestCreated {
            id: RequestId::new(state.next_id),
            owner: request.data_owner,
            requester_name: request.requester_name,
            requester: caller.clone(),
            data_type: request.data_type,
            purpose: request.purpose,
            duration: request.duration,
            requested_at: now,
        }
    }

    /// Applies an event to state
    fn apply_event(state: &mut AccessRequestState, action: &AccessRequestAction) {
        match action {
            AccessRequestAction::RequestCreated {
                id,
                owner,
                requester_name,
                requester,
                data_type,
                purpose,
                duration,
                requested_at,
            } => {
                let request = AccessRequest {
                    id: *id,
                    requester_name: requester_name.clone(),
                    requester: requester.clone(),
                    data_type: data_type.clone(),
                    data_owner: owner.clone(),
                    purpose: purpose.clone(),
                    request_time: *requested_at,
                    duration: *duration,
                    status: RequestStatus::Pending,
                };
                state.requests.insert(*id, request);
                state.by_owner.entry(owner.clone()).or_default().push(*id);
                state
                    .by_requester
                    .entry(requester.clone())
                    .or_default()
                    .push(*id);
                state.next_id = state.next_id.max(id.value().saturating_add(1));
            },
            AccessRequestAction::RequestApproved { id, .. } => {
                Self::set_status(state, *id, RequestStatus::Approved);
            },
            AccessRequestAction::RequestDenied { id, .. } => {
                Self::set_status(state, *id, RequestStatus::Denied);
            },
            AccessRequestAction::AccessExpired { id, .. } => {
                Self::set_status(state, *id, RequestStatus::Expired);
            },
            // Exercising leaves the record untouched; commands are not applied
            AccessRequestAction::AccessExercised { .. }
            | AccessRequestAction::CreateRequest { .. }
            | AccessRequestAction::CreateRequestsBatch { .. }
            | AccessRequestAction::ApproveRequest { .. }
            | AccessRequestAction::DenyRequest { .. }
            | AccessRequestAction::ExerciseRequest { .. } => {},
        }
    }

    fn set_status(state: &mut AccessRequestState, id: RequestId, status: RequestStatus) {
        if let Some(request) = state.requests.get_mut(&id) {
            request.status = status;
        }
    }

    /// Applies `event` and wraps it as a publish effect
    fn commit(
        state: &mut AccessRequestState,
        event: AccessRequestAction,
    ) -> Effect<AccessRequestAction> {
        Self::apply_event(state, &event);
        Effect::PublishEvent(event)
    }
}

impl Reducer for AccessRequestReducer {
    type State = AccessRequestState;
    type Action = AccessRequestAction;
    type Environment = AccessRequestEnvironment;
    type Error = AccessRequestError;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> Result<Effects<Self::Action>, Self::Error> {
        match action {
            // ========== Commands ==========
            AccessRequestAction::CreateRequest { caller, request } => {
                let event = Self::created_event(state, &caller, request, env.now());
                Ok(smallvec![Self::commit(state, event)])
            },

            AccessRequestAction::CreateRequestsBatch { caller, batch } => {
                Self::validate_batch(&batch)?;

                let now = env.now();
                let effects = batch
                    .into_requests()
                    .map(|request| {
                        let event = Self::created_event(state, &caller, request, now);
                        Self::commit(state, event)
                    })
                    .collect();

                Ok(smallvec![Effect::chain(effects)])
            },

            AccessRequestAction::ApproveRequest { caller, id } => {
                let request = Self::validate_owner_decision(state, &caller, id)?;
                let event = AccessRequestAction::RequestApproved {
                    id,
                    owner: request.data_owner.clone(),
                    requester: request.requester.clone(),
                };
                Ok(smallvec![Self::commit(state, event)])
            },

            AccessRequestAction::DenyRequest { caller, id } => {
                let request = Self::validate_owner_decision(state, &caller, id)?;
                let event = AccessRequestAction::RequestDenied {
                    id,
                    owner: request.data_owner.clone(),
                    requester: request.requester.clone(),
                };
                Ok(smallvec![Self::commit(state, event)])
            },

            AccessRequestAction::ExerciseRequest { caller, id } => {
                let event = Self::validate_exercise(state, &caller, id, env.now())?;
                Ok(smallvec![Self::commit(state, event)])
            },

            // ========== Events ==========
            AccessRequestAction::RequestCreated { .. }
            | AccessRequestAction::RequestApproved { .. }
            | AccessRequestAction::RequestDenied { .. }
            | AccessRequestAction::AccessExercised { .. }
            | AccessRequestAction::AccessExpired { .. } => {
                // Replayed from the event log; already published
                Self::apply_event(state, &action);
                Ok(Effects::new())
            },
        }
    }
}
