use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, Utc};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinSet;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use wallboard_core::config::EngineConfig;
use wallboard_core::{DisplayPreset, PanelKey, Preset, Resource};
use wallboard_display::{
    assemble, build_calendar, page_counts, AutoScroll, FrameInput, FrameStatus, HighlightCache,
    PanelRotation, ScrollState, WallboardFrame,
};
use wallboard_fusion::{DataFusion, Feeds, FusionError};
use wallboard_store::{AnnouncementRecord, ChangeBus, StoreError, WallboardSource};

use crate::debounce::Debouncer;
use crate::handle::EngineHandle;
use crate::subscriptions::ChangeSubscriptions;

/// Invoked once with the reason when the display credential is rejected.
pub type AccessDeniedCallback = Arc<dyn Fn(&str) + Send + Sync>;

const COMMAND_CAPACITY: usize = 32;

/// Requests from outside the engine loop.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    /// Replace the display preset. A changed panel order restarts rotation.
    SetPreset(Box<Preset>),
    /// Scrollable extent of a panel surface, as measured by the client.
    ReportExtent { panel: PanelKey, extent: f64 },
    /// Same as a change notification: debounced refresh.
    Refresh,
}

/// Results of background work spawned by the engine.
enum TaskOutput {
    Feeds(std::result::Result<Feeds, FusionError>),
    Announcements(std::result::Result<Vec<AnnouncementRecord>, StoreError>),
    Deactivated {
        count: usize,
        result: std::result::Result<(), StoreError>,
    },
}

/// Single owner of every piece of display state.
pub struct WallboardEngine {
    source: Arc<dyn WallboardSource>,
    fusion: DataFusion,
    config: EngineConfig,
    preset: DisplayPreset,

    rotation: PanelRotation,
    rotation_deadline: Option<Instant>,
    highlights: HighlightCache,
    scroll: AutoScroll,
    feeds: Feeds,
    status: FrameStatus,
    denied: bool,

    debouncer: Debouncer,
    subscriptions: ChangeSubscriptions,
    tasks: JoinSet<TaskOutput>,

    commands_tx: mpsc::Sender<EngineCommand>,
    commands_rx: mpsc::Receiver<EngineCommand>,
    frame_tx: watch::Sender<WallboardFrame>,
    scroll_tx: watch::Sender<ScrollState>,
    on_access_denied: Option<AccessDeniedCallback>,
}

impl WallboardEngine {
    /// Build an engine reading through `source` and listening on `bus`.
    /// Nothing runs until [`mount`](Self::mount) or [`run`](Self::run).
    pub fn new(
        source: Arc<dyn WallboardSource>,
        bus: &ChangeBus,
        config: EngineConfig,
        preset: &Preset,
        offset: FixedOffset,
    ) -> Self {
        let preset = preset.normalized();
        let rotation = PanelRotation::new(preset.panel_order.clone());
        let first = rotation.current();
        let scroll = AutoScroll::new(
            first,
            preset.scroll_speed_for(first),
            Duration::from_millis(preset.scroll_pause_ms),
        );
        let (commands_tx, commands_rx) = mpsc::channel(COMMAND_CAPACITY);
        let (frame_tx, _) = watch::channel(WallboardFrame::loading(first, Utc::now()));
        let (scroll_tx, _) = watch::channel(scroll.state());

        Self {
            fusion: DataFusion::new(Arc::clone(&source), offset),
            source,
            debouncer: Debouncer::new(Duration::from_millis(config.debounce_ms)),
            config,
            preset,
            rotation,
            rotation_deadline: None,
            highlights: HighlightCache::new(),
            scroll,
            feeds: Feeds::default(),
            status: FrameStatus::Loading,
            denied: false,
            subscriptions: ChangeSubscriptions::subscribe_all(bus),
            tasks: JoinSet::new(),
            commands_tx,
            commands_rx,
            frame_tx,
            scroll_tx,
            on_access_denied: None,
        }
    }

    pub fn with_access_denied_callback(mut self, callback: AccessDeniedCallback) -> Self {
        self.on_access_denied = Some(callback);
        self
    }

    /// Spawn the loop and return the handle that tears it down again.
    pub fn mount(self) -> EngineHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let commands = self.commands_tx.clone();
        let frames = self.frame_tx.subscribe();
        let scroll = self.scroll_tx.subscribe();
        let task = tokio::spawn(self.run(shutdown_rx));
        EngineHandle::new(commands, frames, scroll, shutdown_tx, task)
    }

    /// Main event loop. Runs until `shutdown` broadcasts `true`.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        info!(
            panels = self.preset.panel_order.len(),
            subscriptions = self.subscriptions.len(),
            "wallboard engine started"
        );

        let mut sweep = time::interval(Duration::from_secs(self.config.sweep_secs.max(1)));
        let scroll_period = Duration::from_millis(self.config.scroll_tick_ms.max(1));
        let mut scroll_tick = time::interval(scroll_period);
        scroll_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticker = self.ticker_interval();

        self.start_refresh();
        self.schedule_rotation();
        self.render();

        loop {
            tokio::select! {
                _ = sleep_until_opt(self.rotation_deadline) => {
                    self.on_rotation_timer();
                }
                _ = sleep_until_opt(self.debouncer.deadline()) => {
                    self.debouncer.fire();
                    self.start_refresh();
                }
                Some(joined) = self.tasks.join_next() => {
                    match joined {
                        Ok(output) => self.on_task(output),
                        Err(e) => error!("wallboard task failed: {e}"),
                    }
                }
                Some(resource) = self.subscriptions.next() => {
                    self.on_change(resource);
                }
                Some(command) = self.commands_rx.recv() => {
                    if self.on_command(command) {
                        ticker = self.ticker_interval();
                    }
                }
                _ = sweep.tick() => {
                    self.on_sweep();
                }
                _ = ticker.tick() => {
                    self.poll_announcements();
                }
                _ = scroll_tick.tick() => {
                    self.on_scroll_tick(scroll_period);
                }
                res = shutdown.changed() => {
                    if res.is_err() {
                        info!("engine handle dropped, wallboard engine shutting down");
                        break;
                    }
                    if *shutdown.borrow() {
                        info!("wallboard engine shutting down");
                        break;
                    }
                }
            }
        }

        self.debouncer.cancel();
        self.tasks.abort_all();
    }

    // --- timers -------------------------------------------------------------

    /// First tick lands one period out; the mount-time refresh already polls.
    fn ticker_interval(&self) -> Interval {
        let period = self.preset.ticker_poll();
        let mut interval = time::interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    }

    fn schedule_rotation(&mut self) {
        self.rotation_deadline = self
            .rotation
            .next_dwell_panel()
            .map(|panel| Instant::now() + self.preset.dwell(panel));
    }

    fn on_rotation_timer(&mut self) {
        let advance = self.rotation.advance();
        debug!(
            panel = %self.rotation.current(),
            page = self.rotation.page(),
            ?advance,
            "rotation advanced"
        );
        self.schedule_rotation();
        self.render();
    }

    fn on_sweep(&mut self) {
        let removed = self.highlights.sweep(Utc::now());
        if removed > 0 {
            debug!(removed, "expired highlights swept");
            self.render();
        }
    }

    fn on_scroll_tick(&mut self, elapsed: Duration) {
        let state = self.scroll.tick(elapsed);
        self.scroll_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }

    // --- change notifications and commands ---------------------------------

    fn on_change(&mut self, resource: Resource) {
        if self.denied {
            return;
        }
        if self.debouncer.trigger(Instant::now()) {
            debug!(%resource, "refresh scheduled");
        }
    }

    /// Returns true when the ticker poll interval changed.
    fn on_command(&mut self, command: EngineCommand) -> bool {
        match command {
            EngineCommand::SetPreset(preset) => self.apply_preset(preset.normalized()),
            EngineCommand::ReportExtent { panel, extent } => {
                if self.scroll.set_extent(panel, extent) {
                    debug!(%panel, extent, "scroll extent updated");
                }
                false
            }
            EngineCommand::Refresh => {
                if !self.denied {
                    self.debouncer.trigger(Instant::now());
                }
                false
            }
        }
    }

    fn apply_preset(&mut self, preset: DisplayPreset) -> bool {
        let ticker_changed = preset.ticker_poll_secs != self.preset.ticker_poll_secs;
        self.preset = preset;
        if self.rotation.set_order(self.preset.panel_order.clone()) {
            info!(order = ?self.preset.panel_order, "panel order changed, rotation reset");
        }
        self.rotation
            .set_page_counts(page_counts(&self.feeds, &self.preset));
        self.schedule_rotation();
        self.render();
        ticker_changed
    }

    // --- fetches ------------------------------------------------------------

    fn start_refresh(&mut self) {
        if self.denied {
            return;
        }
        let fusion = self.fusion.clone();
        self.tasks
            .spawn(async move { TaskOutput::Feeds(fusion.fuse(Utc::now()).await) });
        self.poll_announcements();
    }

    fn poll_announcements(&mut self) {
        if self.denied {
            return;
        }
        let source = Arc::clone(&self.source);
        let since = Utc::now() - self.preset.highlight_ttl();
        self.tasks
            .spawn(async move { TaskOutput::Announcements(source.announcements(since).await) });
    }

    fn on_task(&mut self, output: TaskOutput) {
        match output {
            TaskOutput::Feeds(Ok(feeds)) => self.apply_feeds(feeds),
            TaskOutput::Feeds(Err(e)) if e.is_fatal() => self.deny(&e.to_string()),
            TaskOutput::Feeds(Err(e)) => {
                error!("wallboard fetch failed, keeping previous snapshot: {e}");
                if !self.denied {
                    self.status = FrameStatus::Stale;
                    self.render();
                }
            }
            TaskOutput::Announcements(Ok(records)) => self.apply_announcements(&records),
            TaskOutput::Announcements(Err(e)) if e.is_fatal() => self.deny(&e.to_string()),
            TaskOutput::Announcements(Err(e)) => {
                warn!("announcement poll failed: {e}");
            }
            TaskOutput::Deactivated { count, result } => match result {
                Ok(()) => debug!(count, "stale announcements deactivated"),
                Err(e) => warn!(count, "failed to deactivate stale announcements: {e}"),
            },
        }
    }

    fn apply_feeds(&mut self, feeds: Feeds) {
        if self.denied {
            return;
        }
        self.feeds = feeds;
        self.status = FrameStatus::Live;
        self.rotation
            .set_page_counts(page_counts(&self.feeds, &self.preset));
        match self.rotation.next_dwell_panel() {
            None => self.rotation_deadline = None,
            Some(_) if self.rotation_deadline.is_none() => self.schedule_rotation(),
            Some(_) => {}
        }
        self.render();
    }

    fn apply_announcements(&mut self, records: &[AnnouncementRecord]) {
        let outcome = self
            .highlights
            .ingest(records, self.preset.highlight_ttl(), Utc::now());
        if !outcome.stale.is_empty() {
            let source = Arc::clone(&self.source);
            let ids = outcome.stale;
            self.tasks.spawn(async move {
                let count = ids.len();
                TaskOutput::Deactivated {
                    count,
                    result: source.deactivate_announcements(&ids).await,
                }
            });
        }
        self.render();
    }

    fn deny(&mut self, reason: &str) {
        if self.denied {
            return;
        }
        error!(reason, "display access denied, refresh stopped");
        self.denied = true;
        self.status = FrameStatus::AccessDenied;
        self.debouncer.cancel();
        if let Some(ref callback) = self.on_access_denied {
            callback(reason);
        }
        self.render();
    }

    // --- output -------------------------------------------------------------

    fn render(&mut self) {
        let now = Utc::now();
        let panel = self.rotation.current();
        self.scroll.reset(
            panel,
            self.rotation.page(),
            self.preset.scroll_speed_for(panel),
            Duration::from_millis(self.preset.scroll_pause_ms),
        );

        let highlight_ids = self.highlights.active_ids();
        let calendar = match (panel, self.feeds.generated_at) {
            (PanelKey::Calendar, Some(generated_at)) => Some(build_calendar(
                &self.feeds.calendar_jobs,
                &self.fusion.windows(generated_at),
                &highlight_ids,
            )),
            _ => None,
        };

        let frame = assemble(FrameInput {
            status: self.status,
            rotation: &self.rotation,
            feeds: &self.feeds,
            preset: &self.preset,
            calendar: calendar.as_ref(),
            highlights: highlight_ids.into_iter().collect(),
            ticker: self.highlights.ticker(),
            now,
        });
        self.frame_tx.send_replace(frame);
    }
}

async fn sleep_until_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => time::sleep_until(at).await,
        None => std::future::pending().await,
    }
}
