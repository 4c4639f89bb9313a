//! Access Ledger Demo
//!
//! Walks one request through its whole lifecycle against a scripted clock:
//! - Requester creates a request valid for one hour (T=1000)
//! - Owner approves it
//! - Requester exercises it inside the window (T=2000)
//! - Requester tries again after the deadline (T=4700) and it expires
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=debug cargo run --bin access-demo
//! ```

use access_ledger_core::environment::Clock;
use access_ledger_runtime::InMemoryEventLog;
use access_requests::{
    AccessRequestEnvironment, AccessRequestManager, Config, Identity, NewAccessRequest,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Clock the demo moves by hand, in whole seconds
#[derive(Debug, Default)]
struct ScriptedClock {
    secs: AtomicI64,
}

impl ScriptedClock {
    fn set(&self, secs: i64) {
        self.secs.store(secs, Ordering::SeqCst);
    }
}

impl Clock for ScriptedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.secs.load(Ordering::SeqCst), 0).unwrap_or_default()
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::debug!(?config, "Configuration loaded");

    let clock = Arc::new(ScriptedClock::default());
    let event_log = Arc::new(InMemoryEventLog::with_broadcast_capacity(
        config.event_log_capacity,
    ));
    let mut events = event_log.subscribe();

    let manager = AccessRequestManager::new(
        AccessRequestEnvironment::new(clock.clone()),
        event_log.clone(),
    );

    let owner = Identity::new(config.demo_owner.clone());
    let requester = Identity::new(config.demo_requester.clone());

    println!("\n============================================");
    println!("   Access Ledger - Lifecycle Demo");
    println!("============================================\n");

    clock.set(1_000);
    println!("1. T=1000  {requester} asks {owner} for medical records (3600s)");
    let id = manager
        .create_request(
            &requester,
            NewAccessRequest {
                requester_name: "City Clinic".to_string(),
                data_owner: owner.clone(),
                data_type: "medical-records".to_string(),
                purpose: "treatment".to_string(),
                duration: 3_600,
            },
        )
        .await?;
    println!("   request {id} is {}", manager.check_status(id).await?);
    println!("   {owner} has {} pending", manager.pending_count(&owner).await);

    println!("2. {owner} approves request {id}");
    manager.approve(&owner, id).await?;
    println!("   request {id} is {}", manager.check_status(id).await?);

    clock.set(2_000);
    let outcome = manager.exercise_request(&requester, id).await?;
    println!("3. T=2000  exercise -> {outcome:?}");
    println!("   request {id} is {}", manager.check_status(id).await?);

    clock.set(4_700);
    let outcome = manager.exercise_request(&requester, id).await?;
    println!("4. T=4700  exercise -> {outcome:?}");
    println!("   request {id} is {}", manager.check_status(id).await?);

    println!("\nEvent log:");
    while let Ok(logged) = events.try_recv() {
        let metadata = logged
            .event
            .metadata
            .map(|m| m.to_string())
            .unwrap_or_default();
        println!("   #{} {} {metadata}", logged.position, logged.event.event_type);
    }

    let detail = manager.detail(id).await?;
    println!("\nFinal record:\n{}", serde_json::to_string_pretty(&detail)?);

    Ok(())
}
