use std::time::Duration;

use tokio::runtime::Handle;

pub type TimerTask = Box<dyn FnOnce() + Send + 'static>;

/// Delayed callbacks with explicit cancellation.
///
/// Every timer of the playback core goes through this trait so that the
/// whole state machine runs on one injectable clock.
pub trait Scheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, tag: &'static str, task: TimerTask) -> TimerHandle;
}

/// Handle of a scheduled callback. Dropping it leaves the timer running.
pub struct TimerHandle {
    tag: &'static str,
    cancel: Box<dyn FnOnce() + Send>,
}

impl TimerHandle {
    pub fn new(tag: &'static str, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            tag,
            cancel: Box::new(cancel),
        }
    }

    pub fn tag(&self) -> &'static str {
        self.tag
    }

    pub fn cancel(self) {
        log::trace!("Cancel timer: {}", self.tag);
        (self.cancel)();
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle").field("tag", &self.tag).finish()
    }
}

/// Runs timers as tasks on a tokio runtime
#[derive(Clone, Debug)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler bound to the runtime of the calling task.
    ///
    /// Panics when called outside a tokio runtime, use [`Self::try_current`]
    /// to check first.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn try_current() -> Option<Self> {
        Handle::try_current().ok().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, tag: &'static str, task: TimerTask) -> TimerHandle {
        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            log::trace!("Timer fired: {tag}");
            task();
        });
        TimerHandle::new(tag, move || join.abort())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_after_delay() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let _handle = scheduler.schedule_after(
            Duration::from_secs(5),
            "test",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_timer_never_fires() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        let handle = scheduler.schedule_after(
            Duration::from_secs(5),
            "test",
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        assert_eq!(handle.tag(), "test");
        handle.cancel();

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
