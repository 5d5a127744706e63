use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use finite_core::{
    spawn_watch, Config, CountdownWatch, Database, DatabaseError, Event, Observation,
    TickScheduler,
};
use tokio::sync::mpsc;

use crate::notifier::TerminalNotifier;

/// How long a finished watch waits for expiry notifications still in flight.
const DELIVERY_GRACE: Duration = Duration::from_secs(3);

fn build_watch(
    db: &Database,
    config: &Config,
    event_id: Option<String>,
) -> Result<CountdownWatch, Box<dyn std::error::Error>> {
    match event_id {
        Some(id) => {
            let event = db
                .get_event(&id)?
                .ok_or(DatabaseError::NotFound { id })?;
            Ok(CountdownWatch::new(event.to_target()?, event.name.clone()).with_event_id(event.id))
        }
        None => Ok(CountdownWatch::new(super::life_target(config)?, "Life")),
    }
}

pub fn run(event_id: Option<String>, ticks: Option<u64>) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let watch = build_watch(&db, &config, event_id)?;
    let notifier = Arc::new(TerminalNotifier::new(config.notifications.enabled));
    let ledger = Arc::new(Mutex::new(db));

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let (tx, mut rx) = mpsc::unbounded_channel::<Observation>();
        let event_id = watch.event_id().map(str::to_string);
        let name = watch.title().to_string();

        let mut scheduler = TickScheduler::system();
        let pending = spawn_watch(&mut scheduler, watch, ledger, notifier, move |obs| {
            let _ = tx.send(obs.clone());
        })?;

        let mut seen = 0u64;
        loop {
            tokio::select! {
                obs = rx.recv() => {
                    let Some(obs) = obs else { break };
                    seen += 1;
                    let tick = Event::tick(event_id.clone(), name.clone(), &obs.snapshot, Utc::now());
                    println!("{}", serde_json::to_string(&tick)?);
                    if let Some(notice) = obs.expiry {
                        let expired = Event::CountdownExpired {
                            event_id: notice.event_id,
                            name: notice.title,
                            at: notice.at,
                        };
                        println!("{}", serde_json::to_string(&expired)?);
                    }
                    if ticks.is_some_and(|limit| seen >= limit) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        scheduler.stop();
        tracing::debug!(ticks = seen, "watch stopped");
        if tokio::time::timeout(DELIVERY_GRACE, pending.settle()).await.is_err() {
            tracing::warn!("gave up waiting for notifications");
        }
        let stopped = Event::SchedulerStopped {
            ticks: seen,
            at: Utc::now(),
        };
        println!("{}", serde_json::to_string(&stopped)?);
        Ok::<(), Box<dyn std::error::Error>>(())
    })
}
