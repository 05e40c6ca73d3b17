//! Listener registry and derived timers shared by every player backend.
//!
//! A backend translates its engine's native callbacks into the `trigger_*`
//! calls below. The hub fans each trigger out to the registered listeners
//! in registration order and owns two watchdogs on top of them:
//!
//! - load timeout: armed by [`PlayerEventHub::trigger_prepared`], cancelled by
//!   ready or by any error other than the timeout itself. When it elapses a
//!   synthetic [`PlaybackException::load_timeout`] error is raised.
//! - interruption: restarted whenever the reported position changes. When
//!   the position stays put for a whole window, [`PlayerEvent::Interrupted`]
//!   is raised once.
//!
//! Both timers use the same duration and both are cancelled by
//! [`PlayerEventHub::stop`].

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::mpsc;

use crate::scheduler::{Scheduler, TimerHandle};
use crate::{EventKind, Metadata, PlaybackException, PlayerEvent};

pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

type Callback = Arc<dyn Fn(&PlayerEvent) + Send + Sync>;

#[derive(Clone)]
enum Sink {
    Callback { kind: EventKind, callback: Callback },
    Channel(mpsc::UnboundedSender<PlayerEvent>),
}

impl Sink {
    fn accepts(&self, kind: EventKind) -> bool {
        match self {
            Sink::Callback { kind: k, .. } => *k == kind,
            Sink::Channel(_) => true,
        }
    }
}

struct Listener {
    id: u64,
    sink: Sink,
}

struct HubState {
    listeners: Vec<Listener>,
    next_id: u64,
    load_timeout: Duration,
    load_timeout_timer: Option<TimerHandle>,
    load_timeout_generation: u64,
    interrupt_timer: Option<TimerHandle>,
    interrupt_generation: u64,
    current_position: i64,
    metadata: Metadata,
}

impl HubState {
    fn cancel_load_timeout(&mut self) {
        self.load_timeout_generation += 1;
        if let Some(timer) = self.load_timeout_timer.take() {
            timer.cancel();
        }
    }

    fn cancel_interrupt(&mut self) {
        self.interrupt_generation += 1;
        if let Some(timer) = self.interrupt_timer.take() {
            timer.cancel();
        }
    }
}

struct HubInner {
    state: Mutex<HubState>,
    scheduler: Arc<dyn Scheduler>,
}

/// Event contract between the playback core and a concrete backend.
///
/// Cloning is cheap and every clone refers to the same registry and timers.
#[derive(Clone)]
pub struct PlayerEventHub {
    inner: Arc<HubInner>,
}

/// Registration handle. Listeners live as long as the hub unless disposed.
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dispose(self) {
        if let Some(inner) = self.hub.upgrade() {
            lock(&inner).listeners.retain(|l| l.id != self.id);
        }
    }
}

fn lock(inner: &HubInner) -> MutexGuard<'_, HubState> {
    inner.state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl PlayerEventHub {
    pub fn new(scheduler: Arc<dyn Scheduler>) -> Self {
        Self::with_load_timeout(scheduler, DEFAULT_LOAD_TIMEOUT)
    }

    pub fn with_load_timeout(scheduler: Arc<dyn Scheduler>, load_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(HubInner {
                state: Mutex::new(HubState {
                    listeners: Vec::new(),
                    next_id: 0,
                    load_timeout,
                    load_timeout_timer: None,
                    load_timeout_generation: 0,
                    interrupt_timer: None,
                    interrupt_generation: 0,
                    current_position: 0,
                    metadata: Metadata::default(),
                }),
                scheduler,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, HubState> {
        lock(&self.inner)
    }

    pub fn scheduler(&self) -> Arc<dyn Scheduler> {
        self.inner.scheduler.clone()
    }

    pub fn load_timeout(&self) -> Duration {
        self.state().load_timeout
    }

    /// Applies from the next prepared source on
    pub fn set_load_timeout(&self, load_timeout: Duration) {
        self.state().load_timeout = load_timeout;
    }

    pub fn metadata(&self) -> Metadata {
        self.state().metadata.clone()
    }

    pub fn set_metadata(&self, metadata: Metadata) {
        self.state().metadata = metadata;
    }

    pub fn current_position(&self) -> i64 {
        self.state().current_position
    }

    pub fn listener_count(&self) -> usize {
        self.state().listeners.len()
    }

    fn register(&self, sink: Sink) -> Subscription {
        let mut state = self.state();
        let id = state.next_id;
        state.next_id += 1;
        state.listeners.push(Listener { id, sink });
        Subscription {
            id,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Register a listener for one kind of event
    pub fn on(
        &self,
        kind: EventKind,
        listener: impl Fn(&PlayerEvent) + Send + Sync + 'static,
    ) -> Subscription {
        self.register(Sink::Callback {
            kind,
            callback: Arc::new(listener),
        })
    }

    pub fn on_ready(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.on(EventKind::Ready, move |_| listener())
    }

    pub fn on_prepared(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.on(EventKind::Prepared, move |_| listener())
    }

    pub fn on_error(
        &self,
        listener: impl Fn(&PlaybackException) + Send + Sync + 'static,
    ) -> Subscription {
        self.on(EventKind::Error, move |event| {
            if let PlayerEvent::Error(err) = event {
                listener(err);
            }
        })
    }

    pub fn on_buffering(&self, listener: impl Fn(bool) + Send + Sync + 'static) -> Subscription {
        self.on(EventKind::Buffering, move |event| {
            if let PlayerEvent::Buffering(buffering) = event {
                listener(*buffering);
            }
        })
    }

    pub fn on_resolution(
        &self,
        listener: impl Fn(u32, u32) + Send + Sync + 'static,
    ) -> Subscription {
        self.on(EventKind::Resolution, move |event| {
            if let PlayerEvent::Resolution { width, height } = event {
                listener(*width, *height);
            }
        })
    }

    pub fn on_is_playing_changed(
        &self,
        listener: impl Fn(bool) + Send + Sync + 'static,
    ) -> Subscription {
        self.on(EventKind::IsPlayingChanged, move |event| {
            if let PlayerEvent::IsPlayingChanged(playing) = event {
                listener(*playing);
            }
        })
    }

    pub fn on_duration_changed(
        &self,
        listener: impl Fn(i64) + Send + Sync + 'static,
    ) -> Subscription {
        self.on(EventKind::DurationChanged, move |event| {
            if let PlayerEvent::DurationChanged(duration) = event {
                listener(*duration);
            }
        })
    }

    pub fn on_position_changed(
        &self,
        listener: impl Fn(i64) + Send + Sync + 'static,
    ) -> Subscription {
        self.on(EventKind::PositionChanged, move |event| {
            if let PlayerEvent::PositionChanged(position) = event {
                listener(*position);
            }
        })
    }

    pub fn on_metadata(
        &self,
        listener: impl Fn(&Metadata) + Send + Sync + 'static,
    ) -> Subscription {
        self.on(EventKind::MetadataChanged, move |event| {
            if let PlayerEvent::MetadataChanged(metadata) = event {
                listener(metadata);
            }
        })
    }

    pub fn on_interrupted(&self, listener: impl Fn() + Send + Sync + 'static) -> Subscription {
        self.on(EventKind::Interrupted, move |_| listener())
    }

    /// Receive every event through a queue instead of a callback.
    ///
    /// The registration is dropped at the first dispatch after the receiver
    /// is closed.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<PlayerEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.register(Sink::Channel(tx));
        rx
    }

    pub fn clear_listeners(&self) {
        self.state().listeners.clear();
    }

    fn dispatch(&self, event: PlayerEvent) {
        let kind = event.kind();
        // listeners run without the lock held so they may call back into the hub
        let sinks: Vec<Sink> = {
            let mut state = self.state();
            state
                .listeners
                .retain(|l| !matches!(&l.sink, Sink::Channel(tx) if tx.is_closed()));
            state
                .listeners
                .iter()
                .filter(|l| l.sink.accepts(kind))
                .map(|l| l.sink.clone())
                .collect()
        };

        for sink in sinks {
            match sink {
                Sink::Callback { callback, .. } => callback(&event),
                Sink::Channel(tx) => {
                    let _ = tx.send(event.clone());
                }
            }
        }
    }

    fn arm_load_timeout(&self, state: &mut HubState) {
        state.cancel_load_timeout();
        let generation = state.load_timeout_generation;
        let hub = Arc::downgrade(&self.inner);
        let timer = self.inner.scheduler.schedule_after(
            state.load_timeout,
            "load-timeout",
            Box::new(move || {
                if let Some(inner) = hub.upgrade() {
                    PlayerEventHub { inner }.on_load_timeout(generation);
                }
            }),
        );
        state.load_timeout_timer = Some(timer);
    }

    fn on_load_timeout(&self, generation: u64) {
        let timeout = {
            let mut state = self.state();
            if state.load_timeout_generation != generation {
                return;
            }
            state.load_timeout_timer = None;
            state.load_timeout
        };
        log::warn!("Source not ready within {:?}, raising load timeout", timeout);
        self.trigger_error(PlaybackException::load_timeout());
    }

    fn arm_interrupt(&self, state: &mut HubState) {
        state.cancel_interrupt();
        let generation = state.interrupt_generation;
        let hub = Arc::downgrade(&self.inner);
        let timer = self.inner.scheduler.schedule_after(
            state.load_timeout,
            "interrupt",
            Box::new(move || {
                if let Some(inner) = hub.upgrade() {
                    PlayerEventHub { inner }.on_interrupt(generation);
                }
            }),
        );
        state.interrupt_timer = Some(timer);
    }

    fn on_interrupt(&self, generation: u64) {
        let position = {
            let mut state = self.state();
            if state.interrupt_generation != generation {
                return;
            }
            state.interrupt_timer = None;
            state.current_position
        };
        log::warn!("Playback position stuck at {position}ms, raising interruption");
        self.dispatch(PlayerEvent::Interrupted);
    }

    /// A new source was accepted and started loading
    pub fn trigger_prepared(&self) {
        {
            let mut state = self.state();
            state.cancel_interrupt();
            state.metadata = Metadata::default();
            self.arm_load_timeout(&mut state);
        }
        self.dispatch(PlayerEvent::Prepared);
    }

    pub fn trigger_ready(&self) {
        self.state().cancel_load_timeout();
        self.dispatch(PlayerEvent::Ready);
    }

    pub fn trigger_error(&self, error: PlaybackException) {
        // a late natural error must not leave the timeout racing it
        if !error.is_load_timeout() {
            self.state().cancel_load_timeout();
        }
        self.dispatch(PlayerEvent::Error(error));
    }

    pub fn trigger_buffering(&self, buffering: bool) {
        self.dispatch(PlayerEvent::Buffering(buffering));
    }

    pub fn trigger_resolution(&self, width: u32, height: u32) {
        self.dispatch(PlayerEvent::Resolution { width, height });
    }

    pub fn trigger_is_playing_changed(&self, is_playing: bool) {
        self.dispatch(PlayerEvent::IsPlayingChanged(is_playing));
    }

    pub fn trigger_duration(&self, duration: i64) {
        self.dispatch(PlayerEvent::DurationChanged(duration));
    }

    pub fn trigger_metadata(&self, metadata: Metadata) {
        self.state().metadata = metadata.clone();
        self.dispatch(PlayerEvent::MetadataChanged(metadata));
    }

    /// Report the playback position in milliseconds.
    ///
    /// A changed position restarts the interruption window; repeating the
    /// last position leaves the running window alone.
    pub fn trigger_current_position(&self, position: i64) {
        {
            let mut state = self.state();
            if state.current_position != position {
                self.arm_interrupt(&mut state);
            }
            state.current_position = position;
        }
        self.dispatch(PlayerEvent::PositionChanged(position));
    }

    /// Cancel both watchdogs and forget the last position
    pub fn stop(&self) {
        let mut state = self.state();
        state.cancel_load_timeout();
        state.cancel_interrupt();
        state.current_position = 0;
    }
}

impl std::fmt::Debug for PlayerEventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state();
        f.debug_struct("PlayerEventHub")
            .field("listeners", &state.listeners.len())
            .field("load_timeout", &state.load_timeout)
            .field("current_position", &state.current_position)
            .finish()
    }
}
