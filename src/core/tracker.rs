//! # Worker activity tracker with sequence-based ordering.
//!
//! Maintains an event-fed view of what every live worker is doing, used to
//! name stuck workers when termination exceeds its grace period.
//!
//! ## Architecture
//! ```text
//! Worker ──► Bus ──► Factory listener ──► WorkerTracker::update()
//!                                                │
//!                                                ▼
//!                                   BTreeMap<usize, WorkerState>
//!                                     (index → {seq, activity})
//! ```
//!
//! ## Rules
//! - `WorkerStarted` / task outcomes → idle; `TaskAccepted` → busy with that task
//! - `WorkerTerminated` / `WorkerDead` → worker forgotten
//! - Events with `seq <= last_seq` for that worker are **rejected** (stale)
//! - Reads are **eventually consistent** with the workers themselves

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::events::{Event, EventKind};

#[derive(Debug, Clone)]
enum Activity {
    Idle,
    Busy(Arc<str>),
}

#[derive(Debug, Clone)]
struct WorkerState {
    last_seq: u64,
    activity: Activity,
}

/// Thread-safe tracker of worker activity.
#[derive(Default)]
pub struct WorkerTracker {
    state: RwLock<BTreeMap<usize, WorkerState>>,
}

impl WorkerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a worker event if it is newer than the last one seen for that worker.
    ///
    /// Returns `true` when the tracked state changed.
    pub async fn update(&self, ev: &Event) -> bool {
        let Some(idx) = ev.worker else {
            return false;
        };
        let mut state = self.state.write().await;

        if let Some(ws) = state.get(&idx) {
            if ev.seq <= ws.last_seq {
                return false;
            }
        }
        let activity = match ev.kind {
            _ if ev.is_task_outcome() => Activity::Idle,
            EventKind::WorkerStarted => Activity::Idle,
            EventKind::TaskAccepted => {
                Activity::Busy(ev.task.clone().unwrap_or_else(|| Arc::from("<unknown task>")))
            }
            EventKind::WorkerTerminated | EventKind::WorkerDead => {
                return state.remove(&idx).is_some();
            }
            _ => {
                if let Some(ws) = state.get_mut(&idx) {
                    ws.last_seq = ev.seq;
                }
                return false;
            }
        };
        state.insert(
            idx,
            WorkerState {
                last_seq: ev.seq,
                activity,
            },
        );
        true
    }

    /// Describes every live worker, ordered by index.
    ///
    /// ```text
    /// worker-0: idle
    /// worker-1: running <Task #4: crunch(4)>
    /// ```
    pub async fn snapshot(&self) -> Vec<String> {
        self.state
            .read()
            .await
            .iter()
            .map(|(idx, ws)| match &ws.activity {
                Activity::Idle => format!("worker-{idx}: idle"),
                Activity::Busy(task) => format!("worker-{idx}: running {task}"),
            })
            .collect()
    }

    /// Number of workers currently running a task.
    pub async fn busy(&self) -> usize {
        self.state
            .read()
            .await
            .values()
            .filter(|ws| matches!(ws.activity, Activity::Busy(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn worker_event(kind: EventKind, worker: usize) -> Event {
        Event::new(kind).with_worker(worker)
    }

    #[tokio::test]
    async fn follows_worker_activity() {
        let t = WorkerTracker::new();
        assert!(t.update(&worker_event(EventKind::WorkerStarted, 0)).await);
        assert!(t.update(&worker_event(EventKind::WorkerStarted, 1)).await);
        assert!(
            t.update(&worker_event(EventKind::TaskAccepted, 1).with_task("<Task #1: a()>"))
                .await
        );
        assert_eq!(t.busy().await, 1);
        assert_eq!(
            t.snapshot().await,
            vec!["worker-0: idle", "worker-1: running <Task #1: a()>"]
        );

        assert!(t.update(&worker_event(EventKind::TaskFailed, 1)).await);
        assert!(t.update(&worker_event(EventKind::WorkerTerminated, 0)).await);
        assert_eq!(t.snapshot().await, vec!["worker-1: idle"]);
        assert_eq!(t.busy().await, 0);
    }

    #[tokio::test]
    async fn rejects_stale_events() {
        let t = WorkerTracker::new();
        let accepted = worker_event(EventKind::TaskAccepted, 0).with_task("<Task #2: b()>");
        let completed = worker_event(EventKind::TaskCompleted, 0);

        assert!(t.update(&completed).await);
        // Older than what we already applied.
        assert!(!t.update(&accepted).await);
        assert_eq!(t.busy().await, 0);
    }

    #[tokio::test]
    async fn ignores_events_without_worker() {
        let t = WorkerTracker::new();
        assert!(!t.update(&Event::new(EventKind::TaskScheduled)).await);
        assert!(t.snapshot().await.is_empty());
    }
}
