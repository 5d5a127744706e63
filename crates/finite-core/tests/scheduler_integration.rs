//! Tick scheduler behaviour under tokio's paused clock.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use finite_core::{Clock, SchedulerState, TickScheduler};

/// Wall clock that follows tokio's (paused) time.
#[derive(Clone)]
struct PausedClock {
    origin: DateTime<Utc>,
    start: tokio::time::Instant,
}

impl PausedClock {
    fn at(origin: DateTime<Utc>) -> Self {
        Self {
            origin,
            start: tokio::time::Instant::now(),
        }
    }
}

impl Clock for PausedClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = TimeDelta::from_std(self.start.elapsed()).unwrap_or(TimeDelta::zero());
        self.origin + elapsed
    }
}

fn origin(ms: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap() + TimeDelta::milliseconds(ms)
}

fn recorder() -> (Arc<Mutex<Vec<i64>>>, Arc<Mutex<Vec<i64>>>) {
    let fired = Arc::new(Mutex::new(Vec::new()));
    (Arc::clone(&fired), fired)
}

#[tokio::test(start_paused = true)]
async fn hundred_ticks_stay_on_second_boundaries() {
    let start = origin(250);
    let mut scheduler = TickScheduler::new(PausedClock::at(start));
    let (fired, rec) = recorder();

    scheduler
        .start(move |tick| {
            rec.lock().unwrap().push(tick.now().timestamp_millis());
            if tick.sequence() == 100 {
                tick.cancel();
            }
        })
        .unwrap();
    scheduler.finished().await;

    let fired = fired.lock().unwrap();
    assert_eq!(fired.len(), 101);
    assert_eq!(fired[0], start.timestamp_millis());
    for pair in fired.windows(2) {
        assert!(pair[1] > pair[0]);
        assert!(pair[1] - pair[0] <= 1000, "gap {} ms", pair[1] - pair[0]);
    }
    for ms in &fired[1..] {
        assert!(ms.rem_euclid(1000) <= 1, "off boundary: {ms}");
    }
    assert_eq!(fired[100] / 1000 - fired[1] / 1000, 99);
    assert_eq!(scheduler.state(), SchedulerState::Cancelled);
    assert!(!scheduler.is_running());
}

#[tokio::test(start_paused = true)]
async fn stop_discards_pending_firing() {
    let mut scheduler = TickScheduler::new(PausedClock::at(origin(0)));
    let (fired, rec) = recorder();
    scheduler
        .start(move |tick| rec.lock().unwrap().push(tick.now().timestamp_millis()))
        .unwrap();
    assert!(scheduler.is_running());

    tokio::time::sleep(Duration::from_millis(2500)).await;
    assert_eq!(fired.lock().unwrap().len(), 3);

    scheduler.stop();
    scheduler.stop();
    assert!(!scheduler.is_running());
    assert_eq!(scheduler.state(), SchedulerState::Cancelled);

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(fired.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn cancel_from_inside_callback_is_final() {
    let mut scheduler = TickScheduler::new(PausedClock::at(origin(400)));
    let (fired, rec) = recorder();
    scheduler
        .start(move |tick| {
            rec.lock().unwrap().push(tick.now().timestamp_millis());
            if tick.sequence() == 2 {
                tick.cancel();
                // a second cancel from the same callback is harmless
                tick.canceller().cancel();
            }
        })
        .unwrap();
    scheduler.finished().await;
    assert_eq!(fired.lock().unwrap().len(), 3);

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(fired.lock().unwrap().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn external_canceller_ends_run() {
    let mut scheduler = TickScheduler::new(PausedClock::at(origin(0)));
    let (fired, rec) = recorder();
    scheduler
        .start(move |tick| rec.lock().unwrap().push(tick.now().timestamp_millis()))
        .unwrap();
    let canceller = scheduler.canceller();

    tokio::time::sleep(Duration::from_millis(1500)).await;
    canceller.cancel();
    assert!(canceller.is_cancelled());
    scheduler.finished().await;

    assert_eq!(fired.lock().unwrap().len(), 2);
    assert_eq!(scheduler.state(), SchedulerState::Cancelled);
}

#[tokio::test(start_paused = true)]
async fn restart_replaces_previous_run() {
    let mut scheduler = TickScheduler::new(PausedClock::at(origin(0)));
    let log = Arc::new(Mutex::new(Vec::<&'static str>::new()));

    let a = Arc::clone(&log);
    scheduler.start(move |_| a.lock().unwrap().push("a")).unwrap();
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let b = Arc::clone(&log);
    scheduler.start(move |_| b.lock().unwrap().push("b")).unwrap();
    tokio::time::sleep(Duration::from_millis(2000)).await;
    scheduler.stop();

    let log = log.lock().unwrap();
    assert_eq!(log.iter().filter(|s| **s == "a").count(), 2);
    let first_b = log.iter().position(|s| *s == "b").unwrap();
    assert!(log[first_b..].iter().all(|s| *s == "b"));
    assert_eq!(log.len() - first_b, 3);
}

#[tokio::test(start_paused = true)]
async fn dropping_scheduler_cancels() {
    let (fired, rec) = recorder();
    {
        let mut scheduler = TickScheduler::new(PausedClock::at(origin(0)));
        scheduler
            .start(move |tick| rec.lock().unwrap().push(tick.now().timestamp_millis()))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(1500)).await;
    }
    let seen = fired.lock().unwrap().len();
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(fired.lock().unwrap().len(), seen);
}
