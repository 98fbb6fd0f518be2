//! Daily reset scheduler.
//!
//! One recurring timer, fired at a fixed local wall-clock time, returns
//! stale in-flight jobs to the pending pool via
//! `JobStore::reset_stale_jobs`. This is the only component allowed to
//! revert a completed job. Fires are skip-safe: a day is never reset
//! twice, whether the second fire comes from the timer or the manual
//! trigger channel. Failures are logged and the next fire still happens.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, NaiveTime};
use tokio::sync::broadcast;

use crate::store::JobStore;

pub struct DailyResetScheduler {
    store: JobStore,
    reset_time: NaiveTime,
    /// Run a reset immediately on start when today's fire was missed
    /// while the process was down.
    catch_up: bool,
    shutdown: Arc<AtomicBool>,
    last_reset: Arc<Mutex<Option<NaiveDate>>>,
}

impl DailyResetScheduler {
    pub fn new(store: JobStore, reset_time: NaiveTime, catch_up: bool) -> Self {
        Self {
            store,
            reset_time,
            catch_up,
            shutdown: Arc::new(AtomicBool::new(false)),
            last_reset: Arc::new(Mutex::new(None)),
        }
    }

    /// Starts the reset loop in a background thread. The receiver allows
    /// manual trigger (used by tests and an admin entry point); a manual
    /// fire obeys the same once-per-day guard as the timer.
    pub fn start(&self, mut trigger_rx: broadcast::Receiver<()>) -> JoinHandle<()> {
        let store = self.store.clone();
        let reset_time = self.reset_time;
        let catch_up = self.catch_up;
        let shutdown = Arc::clone(&self.shutdown);
        let last_reset = Arc::clone(&self.last_reset);

        std::thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();

            rt.block_on(async {
                if catch_up && Local::now().time() >= reset_time {
                    log::info!("Catch-up pass: the scheduled reset time already passed today");
                    run_reset(&store, &last_reset, Local::now().date_naive());
                }

                loop {
                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    // If every trigger sender is gone the branch is
                    // disabled and only the timer remains.
                    let wait = duration_until_next_fire(Local::now(), reset_time);
                    tokio::select! {
                        _ = tokio::time::sleep(wait) => {},
                        Ok(()) = trigger_rx.recv() => {
                            log::info!("Manual job reset triggered");
                        },
                    }

                    if shutdown.load(Ordering::Acquire) {
                        break;
                    }

                    run_reset(&store, &last_reset, Local::now().date_naive());
                }
            });
        })
    }

    /// Signals the scheduler to stop.
    pub fn stop(&self) {
        self.shutdown.store(true, Ordering::Release);
    }
}

/// Runs one reset pass, guarded so the same day is never reset twice.
/// Store failures leave the guard unset so a later fire can retry.
fn run_reset(store: &JobStore, last_reset: &Mutex<Option<NaiveDate>>, today: NaiveDate) {
    let mut guard = match last_reset.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            log::warn!("Reset guard lock was poisoned, recovering");
            poisoned.into_inner()
        }
    };
    if *guard == Some(today) {
        log::debug!("Skipping job reset: already ran for {}", today);
        return;
    }

    match store.reset_stale_jobs(today) {
        Ok(count) => {
            log::info!("Daily reset returned {} job(s) to pending", count);
            *guard = Some(today);
        }
        Err(e) => log::error!("Daily job reset failed: {}", e),
    }
}

/// Time until the next occurrence of `at` on the local clock.
fn duration_until_next_fire(now: DateTime<Local>, at: NaiveTime) -> Duration {
    let today_fire = now.date_naive().and_time(at);
    let next = if now.naive_local() < today_fire {
        today_fire
    } else {
        today_fire + chrono::Duration::days(1)
    };
    (next - now.naive_local()).to_std().unwrap_or_default()
}
