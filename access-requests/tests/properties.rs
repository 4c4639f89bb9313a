//! Property tests: arbitrary command sequences keep the ledger consistent.

#![allow(clippy::unwrap_used)]

use access_ledger_core::reducer::Reducer;
use access_ledger_testing::ManualClock;
use access_requests::{
    AccessRequestAction, AccessRequestEnvironment, AccessRequestReducer, AccessRequestState,
    Identity, NewAccessRequest, RequestBatch, RequestId, RequestStatus,
};
use proptest::prelude::*;
use std::sync::Arc;

const PEOPLE: [&str; 4] = ["alice", "bob", "clinic", "lab"];

#[derive(Clone, Debug)]
enum Op {
    Create { caller: usize, owner: usize, duration: u64 },
    Batch { caller: usize, owners: Vec<usize>, drop_duration: bool },
    Approve { caller: usize, id: u64 },
    Deny { caller: usize, id: u64 },
    Exercise { caller: usize, id: u64 },
    Wait { secs: i64 },
}

fn person(i: usize) -> Identity {
    Identity::new(PEOPLE[i % PEOPLE.len()])
}

fn new_request(owner: usize, duration: u64) -> NewAccessRequest {
    NewAccessRequest {
        requester_name: "requester".to_string(),
        data_owner: person(owner),
        data_type: "data".to_string(),
        purpose: "purpose".to_string(),
        duration,
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, 0..4usize, 0..200u64)
            .prop_map(|(caller, owner, duration)| Op::Create { caller, owner, duration }),
        (0..4usize, prop::collection::vec(0..4usize, 0..4), any::<bool>()).prop_map(
            |(caller, owners, drop_duration)| Op::Batch { caller, owners, drop_duration }
        ),
        (0..4usize, 0..12u64).prop_map(|(caller, id)| Op::Approve { caller, id }),
        (0..4usize, 0..12u64).prop_map(|(caller, id)| Op::Deny { caller, id }),
        (0..4usize, 0..12u64).prop_map(|(caller, id)| Op::Exercise { caller, id }),
        (0..120i64).prop_map(|secs| Op::Wait { secs }),
    ]
}

fn to_action(op: Op) -> Option<AccessRequestAction> {
    Some(match op {
        Op::Create { caller, owner, duration } => AccessRequestAction::CreateRequest {
            caller: person(caller),
            request: new_request(owner, duration),
        },
        Op::Batch { caller, owners, drop_duration } => {
            let mut batch: RequestBatch =
                owners.into_iter().map(|owner| new_request(owner, 50)).collect();
            if drop_duration {
                batch.durations.pop();
                batch.durations.push(1);
                batch.durations.push(2);
            }
            AccessRequestAction::CreateRequestsBatch { caller: person(caller), batch }
        },
        Op::Approve { caller, id } => AccessRequestAction::ApproveRequest {
            caller: person(caller),
            id: RequestId::new(id),
        },
        Op::Deny { caller, id } => AccessRequestAction::DenyRequest {
            caller: person(caller),
            id: RequestId::new(id),
        },
        Op::Exercise { caller, id } => AccessRequestAction::ExerciseRequest {
            caller: person(caller),
            id: RequestId::new(id),
        },
        Op::Wait { .. } => return None,
    })
}

fn allowed_transition(from: RequestStatus, to: RequestStatus) -> bool {
    from == to
        || to == RequestStatus::Expired
        || (from == RequestStatus::Pending
            && matches!(to, RequestStatus::Approved | RequestStatus::Denied))
}

fn check_consistency(state: &AccessRequestState) -> Result<(), TestCaseError> {
    // Dense ids
    let count = usize::try_from(state.request_count()).unwrap();
    prop_assert_eq!(state.requests.len(), count);
    for id in 0..state.request_count() {
        prop_assert!(state.exists(RequestId::new(id)));
    }

    // Each request indexed exactly once per index, in ascending id order
    let owner_entries: usize = state.by_owner.values().map(Vec::len).sum();
    let requester_entries: usize = state.by_requester.values().map(Vec::len).sum();
    prop_assert_eq!(owner_entries, count);
    prop_assert_eq!(requester_entries, count);
    for request in state.requests.values() {
        prop_assert!(state.ids_by_owner(&request.data_owner).contains(&request.id));
        prop_assert!(state.ids_by_requester(&request.requester).contains(&request.id));
    }
    for ids in state.by_owner.values().chain(state.by_requester.values()) {
        prop_assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));
    }

    // Pending count agrees with the owner index
    for i in 0..PEOPLE.len() {
        let owner = person(i);
        let pending = state
            .ids_by_owner(&owner)
            .iter()
            .filter(|id| state.get(**id).unwrap().status == RequestStatus::Pending)
            .count();
        prop_assert_eq!(state.pending_count(&owner), pending);
    }
    Ok(())
}

proptest! {
    #[test]
    fn ledger_stays_consistent(ops in prop::collection::vec(arb_op(), 1..40)) {
        let clock = ManualClock::at_timestamp(1_000);
        let env = AccessRequestEnvironment::new(Arc::new(clock.clone()));
        let reducer = AccessRequestReducer::new();
        let mut state = AccessRequestState::new();

        for op in ops {
            if let Op::Wait { secs } = op {
                clock.advance_secs(secs);
                continue;
            }
            let Some(action) = to_action(op) else { continue };

            let before = state.clone();
            match reducer.reduce(&mut state, action, &env) {
                Ok(_) => {
                    for (id, old) in &before.requests {
                        let new = state.get(*id).unwrap();
                        prop_assert!(allowed_transition(old.status, new.status));
                        prop_assert_eq!(&old.requester, &new.requester);
                        prop_assert_eq!(&old.data_owner, &new.data_owner);
                        prop_assert_eq!(old.request_time, new.request_time);
                    }
                },
                Err(_) => {
                    prop_assert_eq!(&state, &before);
                },
            }

            check_consistency(&state)?;
        }
    }

    #[test]
    fn replay_reproduces_state(ops in prop::collection::vec(arb_op(), 1..40)) {
        let clock = ManualClock::at_timestamp(1_000);
        let env = AccessRequestEnvironment::new(Arc::new(clock.clone()));
        let reducer = AccessRequestReducer::new();
        let mut state = AccessRequestState::new();
        let mut log = Vec::new();

        for op in ops {
            if let Op::Wait { secs } = op {
                clock.advance_secs(secs);
                continue;
            }
            let Some(action) = to_action(op) else { continue };
            if let Ok(effects) = reducer.reduce(&mut state, action, &env) {
                log.extend(access_ledger_core::effect::published(effects));
            }
        }

        let mut replayed = AccessRequestState::new();
        for event in log {
            prop_assert!(event.is_event());
            let effects = reducer.reduce(&mut replayed, event, &env).unwrap();
            prop_assert!(effects.is_empty());
        }

        prop_assert_eq!(replayed, state);
    }
}
