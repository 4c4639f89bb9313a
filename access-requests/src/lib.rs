//! Access request lifecycle manager.
//!
//! A requester asks a data owner for access to one category of data, for a
//! stated purpose and a bounded window. The owner approves or denies; the
//! requester then exercises the approved request until the window runs out.
//!
//! - Commands are validated in full before any state change
//! - Every accepted command publishes its events to the event log
//! - Expiry is lazy: an exercise attempt past the deadline marks the request
//!   EXPIRED, whatever its status
//! - Owners and requesters can enumerate their requests through indices
//!
//! # Quick Start
//!
//! ```no_run
//! use access_requests::{
//!     AccessRequestEnvironment, AccessRequestManager, ExerciseOutcome, Identity, NewAccessRequest,
//! };
//! use access_ledger_core::environment::SystemClock;
//! use access_ledger_runtime::InMemoryEventLog;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let env = AccessRequestEnvironment::new(Arc::new(SystemClock));
//! let manager = AccessRequestManager::new(env, Arc::new(InMemoryEventLog::new()));
//!
//! let owner = Identity::new("alice");
//! let clinic = Identity::new("city-clinic");
//!
//! let id = manager
//!     .create_request(
//!         &clinic,
//!         NewAccessRequest {
//!             requester_name: "City Clinic".to_string(),
//!             data_owner: owner.clone(),
//!             data_type: "medical-records".to_string(),
//!             purpose: "treatment".to_string(),
//!             duration: 3_600,
//!         },
//!     )
//!     .await?;
//!
//! manager.approve(&owner, id).await?;
//! assert_eq!(manager.exercise_request(&clinic, id).await?, ExerciseOutcome::Exercised);
//! # Ok(())
//! # }
//! ```

pub mod actions;
pub mod config;
pub mod environment;
pub mod error;
pub mod manager;
pub mod reducer;
pub mod types;
pub mod views;

// Re-export commonly used types
pub use actions::{AccessRequestAction, EXPIRY_REASON};
pub use config::Config;
pub use environment::AccessRequestEnvironment;
pub use error::{AccessRequestError, Result};
pub use manager::{AccessRequestManager, AccessRequestStore};
pub use reducer::AccessRequestReducer;
pub use types::{
    AccessRequest, AccessRequestState, ExerciseOutcome, Identity, NewAccessRequest, RequestBatch,
    RequestId, RequestStatus,
};
pub use views::{AccessRequestDetail, OwnerRequestDetails};
