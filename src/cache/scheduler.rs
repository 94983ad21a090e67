//! Maintenance scheduler: independent periodic background tasks.
//!
//! Each task is a tokio interval loop. A tick returns `ControlFlow::Break`
//! to end its loop; `stop` aborts every loop at its next await point.

use std::future::Future;
use std::ops::ControlFlow;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

struct PeriodicTask {
    name: &'static str,
    period: Duration,
    handle: JoinHandle<()>,
}

/// Owns the handles of the running maintenance tasks.
#[derive(Default)]
pub struct MaintenanceScheduler {
    tasks: Vec<PeriodicTask>,
}

impl MaintenanceScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `tick` every `period`, first firing one period from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<F, Fut>(&mut self, name: &'static str, period: Duration, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if tick().await.is_break() {
                    debug!(task = name, "maintenance task finished");
                    break;
                }
            }
        });

        debug!(task = name, period_ms = period.as_millis() as u64, "maintenance task started");
        self.tasks.push(PeriodicTask { name, period, handle });
    }

    /// Abort every task. Safe to call repeatedly.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.handle.abort();
            debug!(task = task.name, "maintenance task stopped");
        }
    }

    /// Names and periods of the tasks still registered.
    pub fn tasks(&self) -> Vec<(&'static str, Duration)> {
        self.tasks.iter().map(|t| (t.name, t.period)).collect()
    }

    pub fn is_running(&self) -> bool {
        self.tasks.iter().any(|t| !t.handle.is_finished())
    }
}

impl Drop for MaintenanceScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_task_ticks_until_break() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut scheduler = MaintenanceScheduler::new();

        let counter = ticks.clone();
        scheduler.spawn("count", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                if counter.fetch_add(1, Ordering::SeqCst) + 1 >= 3 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            }
        });

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_tasks() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let mut scheduler = MaintenanceScheduler::new();

        let counter = ticks.clone();
        scheduler.spawn("count", Duration::from_millis(10), move || {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                ControlFlow::Continue(())
            }
        });
        assert_eq!(scheduler.tasks(), vec![("count", Duration::from_millis(10))]);

        tokio::time::sleep(Duration::from_millis(25)).await;
        scheduler.stop();
        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(ticks.load(Ordering::SeqCst), seen);
        assert!(scheduler.tasks().is_empty());
        scheduler.stop();
    }
}
