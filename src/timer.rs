/// Cancellable scheduled tasks for the animated parts of the UI.
///
/// Each animated component owns at most one `TimerHandle` per kind. Ticks are
/// delivered as `TimerKind` values on the UI loop's channel, so all state
/// changes still happen on the single UI task.
use std::time::Duration;

use tokio::sync::mpsc;

use crate::api::ArticleId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Reveal the next character of the typing assistant row
    Typewriter,
    /// Advance the typing indicator's visual state
    Indicator,
    /// Removal transition of a history entry has finished
    Fade(ArticleId),
}

/// Owning handle to a scheduled task. Dropping it cancels the task.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self { cancel: Some(Box::new(cancel)) }
    }

    pub fn cancel(mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(f) = self.cancel.take() {
            f();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").field("armed", &self.cancel.is_some()).finish()
    }
}

pub trait Scheduler {
    /// Deliver `kind` every `period` until the handle goes away.
    fn every(&self, kind: TimerKind, period: Duration) -> TimerHandle;
    /// Deliver `kind` once after `delay`.
    fn after(&self, kind: TimerKind, delay: Duration) -> TimerHandle;
}

// ── Tokio-backed scheduler ────────────────────────────────────────────────────

pub struct TokioScheduler {
    tx: mpsc::UnboundedSender<TimerKind>,
}

impl TokioScheduler {
    pub fn new(tx: mpsc::UnboundedSender<TimerKind>) -> Self {
        Self { tx }
    }
}

impl Scheduler for TokioScheduler {
    fn every(&self, kind: TimerKind, period: Duration) -> TimerHandle {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // First tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                if tx.send(kind).is_err() {
                    break;
                }
            }
        });
        TimerHandle::new(move || task.abort())
    }

    fn after(&self, kind: TimerKind, delay: Duration) -> TimerHandle {
        let tx = self.tx.clone();
        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = tx.send(kind);
        });
        TimerHandle::new(move || task.abort())
    }
}

// ── Manual scheduler for tests ────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::manual::ManualScheduler;
    use super::*;

    #[test]
    fn test_handle_cancels_once() {
        let sched = ManualScheduler::default();
        let h = sched.every(TimerKind::Indicator, Duration::from_millis(10));
        assert_eq!(sched.live(), 1);
        h.cancel();
        assert_eq!(sched.live(), 0);

        let h = sched.after(TimerKind::Typewriter, Duration::from_millis(10));
        drop(h);
        assert_eq!(sched.live(), 0);
    }

    #[tokio::test]
    async fn test_tokio_every_delivers_until_cancelled() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sched = TokioScheduler::new(tx);
        let handle = sched.every(TimerKind::Indicator, Duration::from_millis(5));
        assert_eq!(rx.recv().await, Some(TimerKind::Indicator));
        assert_eq!(rx.recv().await, Some(TimerKind::Indicator));
        handle.cancel();
        drop(sched);
        // Drain whatever was already queued; the channel then closes
        while rx.recv().await.is_some() {}
    }

    #[tokio::test]
    async fn test_tokio_after_fires_once() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let sched = TokioScheduler::new(tx);
        let _handle = sched.after(TimerKind::Fade(ArticleId(3)), Duration::from_millis(5));
        assert_eq!(rx.recv().await, Some(TimerKind::Fade(ArticleId(3))));
    }
}
