//! What is supposed to be playing right now.
//!
//! The controller owns the backend and the settings store. Backend events
//! and its own timers are queued and handled one at a time, either
//! synchronously through [`PlaybackController::process_pending`] or from an
//! async loop through [`PlaybackController::next`] / [`PlaybackController::run`].

use std::sync::Arc;
use std::time::Duration;

use channel_data::url::{append_query, url_support_playback, url_to_can_playback};
use channel_data::{
    Channel, ChannelGroupList, ChannelLine, ChannelList, EpgProgramme, EpgProgrammeReserve,
    HybridType,
};
use tokio::sync::mpsc;
use video_player::{
    Metadata, PlaybackException, PlayerEvent, Scheduler, TimerHandle, VideoPlayer,
};

use crate::line_selector::select_line_idx;
use crate::navigator::{next_channel, prev_channel, NavigationPolicy};
use crate::settings::SettingsStore;

pub const DEFAULT_OVERLAY_HIDE_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    /// How long the channel info overlay stays after buffering ends
    pub overlay_hide_delay: Duration,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            overlay_hide_delay: DEFAULT_OVERLAY_HIDE_DELAY,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReserveToggle {
    Reserved(EpgProgrammeReserve),
    Cancelled(EpgProgrammeReserve),
}

#[derive(Debug)]
enum Signal {
    HideOverlay {
        generation: u64,
        channel_name: String,
        line_idx: usize,
    },
}

pub struct PlaybackController<P: VideoPlayer, S: SettingsStore> {
    player: P,
    settings: S,
    groups: ChannelGroupList,
    favorites: ChannelList,
    options: ControllerOptions,
    scheduler: Arc<dyn Scheduler>,
    events: mpsc::UnboundedReceiver<PlayerEvent>,
    signal_tx: mpsc::UnboundedSender<Signal>,
    signals: mpsc::UnboundedReceiver<Signal>,

    current_channel: Channel,
    current_line_idx: usize,
    current_programme: Option<EpgProgramme>,
    info_overlay_visible: bool,
    overlay_hide_timer: Option<TimerHandle>,
    overlay_generation: u64,
}

impl<P: VideoPlayer, S: SettingsStore> PlaybackController<P, S> {
    /// Wire the controller to `player` and start the initial channel.
    ///
    /// The initial channel is the last played one when known, otherwise the
    /// first channel of `groups`.
    pub fn new(
        player: P,
        settings: S,
        groups: ChannelGroupList,
        favorites: ChannelList,
        options: ControllerOptions,
    ) -> Self {
        let hub = player.events();
        hub.set_load_timeout(Duration::from_millis(
            settings.settings().load_timeout_ms,
        ));
        let events = hub.subscribe();
        let scheduler = hub.scheduler();
        let (signal_tx, signals) = mpsc::unbounded_channel();

        let initial = settings
            .settings()
            .last_play_channel
            .clone()
            .filter(|channel| !channel.is_empty())
            .or_else(|| groups.channel_first().cloned())
            .unwrap_or_default();

        let mut controller = Self {
            player,
            settings,
            groups,
            favorites,
            options,
            scheduler,
            events,
            signal_tx,
            signals,
            current_channel: Channel::default(),
            current_line_idx: 0,
            current_programme: None,
            info_overlay_visible: false,
            overlay_hide_timer: None,
            overlay_generation: 0,
        };
        controller.change_current_channel(initial, None, None);
        controller
    }

    pub fn player(&self) -> &P {
        &self.player
    }

    pub fn player_mut(&mut self) -> &mut P {
        &mut self.player
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn current_channel(&self) -> &Channel {
        &self.current_channel
    }

    pub fn current_line_idx(&self) -> usize {
        self.current_line_idx
    }

    /// `None` only while the current channel has no lines
    pub fn current_line(&self) -> Option<&ChannelLine> {
        self.current_channel.line_list.get(self.current_line_idx)
    }

    pub fn current_playback_programme(&self) -> Option<&EpgProgramme> {
        self.current_programme.as_ref()
    }

    pub fn is_info_overlay_visible(&self) -> bool {
        self.info_overlay_visible
    }

    pub fn metadata(&self) -> Metadata {
        self.player.events().metadata()
    }

    pub fn channel_groups(&self) -> &ChannelGroupList {
        &self.groups
    }

    pub fn favorites(&self) -> &ChannelList {
        &self.favorites
    }

    /// Replace the playlist snapshot. The current channel keeps playing.
    pub fn set_channel_groups(&mut self, groups: ChannelGroupList) {
        self.groups = groups;
    }

    pub fn set_favorites(&mut self, favorites: ChannelList) {
        self.favorites = favorites;
    }

    pub fn navigation_policy(&self) -> NavigationPolicy {
        let settings = self.settings.settings();
        NavigationPolicy {
            favorites_visible: settings.favorite_list_visible,
            list_loop: settings.change_list_loop,
        }
    }

    /// Switch playback to `channel`.
    ///
    /// `line_idx` may be out of range, it wraps around the line count. With
    /// `programme` set the line is played as timeshift of that programme.
    /// The last played channel is recorded even when nothing changes.
    pub fn change_current_channel(
        &mut self,
        channel: Channel,
        line_idx: Option<i64>,
        programme: Option<EpgProgramme>,
    ) {
        self.settings
            .update(|s| s.last_play_channel = Some(channel.clone()));

        if channel == self.current_channel
            && line_idx == Some(self.current_line_idx as i64)
            && programme == self.current_programme
        {
            log::debug!(
                "Already playing {} line {}",
                channel.name,
                self.current_line_idx + 1
            );
            return;
        }

        self.switch_to(channel, line_idx, programme);
    }

    /// Prepare the current line again, even though nothing changed
    pub fn reload_current(&mut self) {
        let channel = self.current_channel.clone();
        log::info!(
            "Reload {} line {}",
            channel.name,
            self.current_line_idx + 1
        );
        self.settings
            .update(|s| s.last_play_channel = Some(channel.clone()));
        let line_idx = Some(self.current_line_idx as i64);
        let programme = self.current_programme.clone();
        self.switch_to(channel, line_idx, programme);
    }

    pub fn change_current_channel_to_prev(&mut self) {
        let channel = prev_channel(
            &self.current_channel,
            &self.groups,
            Some(&self.favorites),
            self.navigation_policy(),
        );
        self.change_current_channel(channel, None, None);
    }

    pub fn change_current_channel_to_next(&mut self) {
        let channel = next_channel(
            &self.current_channel,
            &self.groups,
            Some(&self.favorites),
            self.navigation_policy(),
        );
        self.change_current_channel(channel, None, None);
    }

    /// Whether the line that would be chosen for `channel` can play timeshift
    pub fn support_playback(&self, channel: &Channel, line_idx: Option<i64>) -> bool {
        let settings = self.settings.settings();
        let idx = select_line_idx(
            &channel.line_list,
            line_idx,
            &settings.playable_urls,
            &settings.playable_hosts,
        );
        channel
            .line_list
            .get(idx)
            .is_some_and(|line| url_support_playback(&line.url))
    }

    pub fn support_current_playback(&self) -> bool {
        self.support_playback(
            &self.current_channel,
            Some(self.current_line_idx as i64),
        )
    }

    /// Reserve `programme` or cancel the existing reservation for it
    pub fn toggle_programme_reserve(
        &mut self,
        channel: &Channel,
        programme: &EpgProgramme,
    ) -> ReserveToggle {
        let existing = self
            .settings
            .settings()
            .reserve_list
            .iter()
            .position(|reserve| reserve.matches(channel, programme));

        match existing {
            Some(pos) => {
                let mut removed = None;
                self.settings.update(|s| removed = Some(s.reserve_list.remove(pos)));
                let reserve = removed.unwrap_or_else(|| EpgProgrammeReserve::new(channel, programme));
                log::info!("Cancel reserve: {} - {}", reserve.channel, reserve.programme);
                ReserveToggle::Cancelled(reserve)
            }
            None => {
                let reserve = EpgProgrammeReserve::new(channel, programme);
                self.settings.update(|s| s.reserve_list.push(reserve.clone()));
                log::info!("Reserved: {} - {}", reserve.channel, reserve.programme);
                ReserveToggle::Reserved(reserve)
            }
        }
    }

    fn switch_to(
        &mut self,
        channel: Channel,
        line_idx: Option<i64>,
        programme: Option<EpgProgramme>,
    ) {
        // a manual line switch drops the "this line works" record of the old one
        if channel == self.current_channel && line_idx != Some(self.current_line_idx as i64) {
            self.evict_current_line();
        }

        self.cancel_overlay_hide();
        self.info_overlay_visible = true;

        let settings = self.settings.settings();
        self.current_line_idx = select_line_idx(
            &channel.line_list,
            line_idx,
            &settings.playable_urls,
            &settings.playable_hosts,
        );
        self.current_channel = channel;
        self.current_programme = programme;

        self.dispatch_current_line();
    }

    fn dispatch_current_line(&mut self) {
        self.discard_pending_events();

        let Some(mut line) = self.current_line().cloned() else {
            log::warn!(
                "Channel {:?} has no line to play",
                self.current_channel.name
            );
            self.player.stop();
            return;
        };

        if let Some(programme) = &self.current_programme {
            line.url = url_to_can_playback(&append_query(&line.url, &programme.playseek_query()));
        }

        log::info!(
            "Play {} ({}/{}): {}",
            self.current_channel.name,
            self.current_line_idx + 1,
            self.current_channel.line_list.len(),
            line.url
        );

        if line.hybrid_type == HybridType::WebView {
            self.player.events().set_metadata(Metadata::default());
            self.player.stop();
        } else {
            self.player.prepare(&line);
        }
    }

    /// Events still queued belong to the source being replaced
    fn discard_pending_events(&mut self) {
        let mut discarded = 0;
        while self.events.try_recv().is_ok() {
            discarded += 1;
        }
        if discarded > 0 {
            log::debug!("Dropped {} stale player events", discarded);
        }
    }

    fn evict_current_line(&mut self) {
        let Some(line) = self.current_line() else {
            return;
        };
        let url = line.url.clone();
        let host = line.host();
        log::debug!("Forget playable line: {}", url);
        self.settings.update(|s| s.evict_playable(&url, &host));
    }

    fn cancel_overlay_hide(&mut self) {
        self.overlay_generation += 1;
        if let Some(timer) = self.overlay_hide_timer.take() {
            timer.cancel();
        }
    }

    fn schedule_overlay_hide(&mut self) {
        self.cancel_overlay_hide();
        let signal = Signal::HideOverlay {
            generation: self.overlay_generation,
            channel_name: self.current_channel.name.clone(),
            line_idx: self.current_line_idx,
        };
        let tx = self.signal_tx.clone();
        let timer = self.scheduler.schedule_after(
            self.options.overlay_hide_delay,
            "overlay-hide",
            Box::new(move || {
                let _ = tx.send(signal);
            }),
        );
        self.overlay_hide_timer = Some(timer);
    }

    fn on_ready(&mut self) {
        let Some(line) = self.current_line() else {
            return;
        };
        let url = line.url.clone();
        let host = line.host();
        self.settings.update(|s| s.mark_playable(&url, host));
    }

    fn on_error(&mut self, error: PlaybackException) {
        if self.current_programme.is_some() {
            log::warn!("Timeshift playback failed with {}, keep current line", error);
            return;
        }

        self.evict_current_line();

        let line_count = self.current_channel.line_list.len();
        if self.current_line_idx + 1 < line_count {
            log::warn!(
                "Line {}/{} of {} failed with {}, try next line",
                self.current_line_idx + 1,
                line_count,
                self.current_channel.name,
                error
            );
            let channel = self.current_channel.clone();
            let next_idx = Some(self.current_line_idx as i64 + 1);
            self.change_current_channel(channel, next_idx, None);
        } else {
            log::error!(
                "All {} lines of {} failed, last error: {}",
                line_count,
                self.current_channel.name,
                error
            );
        }
    }

    fn on_buffering(&mut self, buffering: bool) {
        if buffering {
            self.cancel_overlay_hide();
            self.info_overlay_visible = true;
        } else {
            self.schedule_overlay_hide();
        }
    }

    fn handle_event(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::Ready => self.on_ready(),
            PlayerEvent::Error(error) => self.on_error(error),
            PlayerEvent::Interrupted => self.reload_current(),
            PlayerEvent::Buffering(buffering) => self.on_buffering(buffering),
            _ => {}
        }
    }

    fn handle_signal(&mut self, signal: Signal) {
        match signal {
            Signal::HideOverlay {
                generation,
                channel_name,
                line_idx,
            } => {
                if generation != self.overlay_generation {
                    return;
                }
                self.overlay_hide_timer = None;
                if channel_name == self.current_channel.name && line_idx == self.current_line_idx
                {
                    self.info_overlay_visible = false;
                }
            }
        }
    }

    /// Handle everything already queued, returns how many inputs were handled
    pub fn process_pending(&mut self) -> usize {
        let mut handled = 0;
        loop {
            if let Ok(signal) = self.signals.try_recv() {
                self.handle_signal(signal);
            } else if let Ok(event) = self.events.try_recv() {
                self.handle_event(event);
            } else {
                break;
            }
            handled += 1;
        }
        handled
    }

    /// Wait for one queued input and handle it.
    ///
    /// Returns `false` once the backend dropped its listeners.
    pub async fn next(&mut self) -> bool {
        tokio::select! {
            biased;
            Some(signal) = self.signals.recv() => {
                self.handle_signal(signal);
                true
            }
            event = self.events.recv() => match event {
                Some(event) => {
                    self.handle_event(event);
                    true
                }
                None => false,
            },
        }
    }

    pub async fn run(&mut self) {
        while self.next().await {}
        log::info!("Player released, playback controller stopped");
    }
}
