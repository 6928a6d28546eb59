use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{info, warn};
use wallboard_core::{PanelKey, Preset};
use wallboard_display::{ScrollState, WallboardFrame};

use crate::engine::EngineCommand;
use crate::error::{EngineError, Result};

/// Cloneable view of a mounted engine: read frames, send commands.
#[derive(Clone)]
pub struct EngineClient {
    commands: mpsc::Sender<EngineCommand>,
    frames: watch::Receiver<WallboardFrame>,
    scroll: watch::Receiver<ScrollState>,
}

impl EngineClient {
    pub fn frame(&self) -> WallboardFrame {
        self.frames.borrow().clone()
    }

    pub fn scroll(&self) -> ScrollState {
        *self.scroll.borrow()
    }

    pub fn subscribe_frames(&self) -> watch::Receiver<WallboardFrame> {
        self.frames.clone()
    }

    pub fn subscribe_scroll(&self) -> watch::Receiver<ScrollState> {
        self.scroll.clone()
    }

    pub async fn set_preset(&self, preset: Preset) -> Result<()> {
        self.send(EngineCommand::SetPreset(Box::new(preset))).await
    }

    pub async fn report_extent(&self, panel: PanelKey, extent: f64) -> Result<()> {
        self.send(EngineCommand::ReportExtent { panel, extent }).await
    }

    pub async fn refresh(&self) -> Result<()> {
        self.send(EngineCommand::Refresh).await
    }

    async fn send(&self, command: EngineCommand) -> Result<()> {
        self.commands
            .send(command)
            .await
            .map_err(|_| EngineError::Stopped)
    }
}

/// Owner handle returned by [`WallboardEngine::mount`](crate::WallboardEngine::mount).
///
/// [`unmount`](Self::unmount) signals shutdown and waits for the loop to exit;
/// every timer and subscription lives inside that loop and goes with it.
pub struct EngineHandle {
    client: EngineClient,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl EngineHandle {
    pub(crate) fn new(
        commands: mpsc::Sender<EngineCommand>,
        frames: watch::Receiver<WallboardFrame>,
        scroll: watch::Receiver<ScrollState>,
        shutdown: watch::Sender<bool>,
        task: JoinHandle<()>,
    ) -> Self {
        Self {
            client: EngineClient {
                commands,
                frames,
                scroll,
            },
            shutdown,
            task,
        }
    }

    pub fn client(&self) -> EngineClient {
        self.client.clone()
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    pub async fn unmount(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            warn!("wallboard engine task ended abnormally: {e}");
        }
        info!("wallboard engine unmounted");
    }
}
