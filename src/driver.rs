//! Real-time driver.
//!
//! Runs the engine on a tokio task: commands arrive over an mpsc channel and
//! between commands the task sleeps until the engine's next deadline, then
//! advances the virtual timeline to match wall-clock time. Only this task
//! touches the engine while it runs, so dispatches are serialised.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::engine::DispatchOptions;
use crate::error::CanvasError;
use crate::state::AppState;
use crate::types::CanvasSnapshot;

/// Commands queued before the driver starts pushing back.
const COMMAND_BUFFER: usize = 32;

pub enum EngineCommand {
    Dispatch {
        query: String,
        options: DispatchOptions,
    },
    Reset,
    Snapshot {
        reply: oneshot::Sender<CanvasSnapshot>,
    },
    /// Reply once nothing is left to reveal or type.
    WaitIdle {
        reply: oneshot::Sender<CanvasSnapshot>,
    },
    Shutdown,
}

/// Cheap, cloneable sender side.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub async fn dispatch(&self, query: impl Into<String>, options: DispatchOptions) -> Result<(), CanvasError> {
        self.send(EngineCommand::Dispatch {
            query: query.into(),
            options,
        })
        .await
    }

    pub async fn reset(&self) -> Result<(), CanvasError> {
        self.send(EngineCommand::Reset).await
    }

    pub async fn snapshot(&self) -> Result<CanvasSnapshot, CanvasError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot { reply }).await?;
        rx.await.map_err(|_| CanvasError::EngineUnavailable)
    }

    pub async fn wait_idle(&self) -> Result<CanvasSnapshot, CanvasError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::WaitIdle { reply }).await?;
        rx.await.map_err(|_| CanvasError::EngineUnavailable)
    }

    pub async fn shutdown(&self) -> Result<(), CanvasError> {
        self.send(EngineCommand::Shutdown).await
    }

    async fn send(&self, command: EngineCommand) -> Result<(), CanvasError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| CanvasError::EngineUnavailable)
    }
}

enum Wake {
    Command(Option<EngineCommand>),
    Timer,
}

pub struct EngineDriver {
    state: Arc<AppState>,
    receiver: mpsc::Receiver<EngineCommand>,
    idle_waiters: Vec<oneshot::Sender<CanvasSnapshot>>,
    started: Instant,
    /// Engine clock reading when the driver started.
    offset_ms: u64,
}

impl EngineDriver {
    pub fn new(state: Arc<AppState>, receiver: mpsc::Receiver<EngineCommand>) -> Self {
        let offset_ms = state.engine.lock().now_ms();
        Self {
            state,
            receiver,
            idle_waiters: Vec::new(),
            started: Instant::now(),
            offset_ms,
        }
    }

    /// Start the driver loop. Returns when shut down or every handle is dropped.
    pub async fn run(mut self) {
        log::info!("Canvas driver started");

        loop {
            let wakeup = self.state.engine.lock().next_wakeup();
            let wake = match wakeup {
                Some(delay) => tokio::select! {
                    cmd = self.receiver.recv() => Wake::Command(cmd),
                    _ = tokio::time::sleep(delay) => Wake::Timer,
                },
                None => Wake::Command(self.receiver.recv().await),
            };

            self.catch_up();

            match wake {
                Wake::Timer => {}
                Wake::Command(None) | Wake::Command(Some(EngineCommand::Shutdown)) => break,
                Wake::Command(Some(command)) => self.handle(command),
            }

            self.notify_if_idle();
        }

        log::info!("Canvas driver stopped");
    }

    fn handle(&mut self, command: EngineCommand) {
        let mut engine = self.state.engine.lock();
        match command {
            EngineCommand::Dispatch { query, options } => engine.dispatch(&query, options),
            EngineCommand::Reset => engine.reset(),
            EngineCommand::Snapshot { reply } => {
                let _ = reply.send(engine.snapshot());
            }
            EngineCommand::WaitIdle { reply } => self.idle_waiters.push(reply),
            EngineCommand::Shutdown => {}
        }
    }

    /// Advance the virtual timeline to wall-clock time.
    fn catch_up(&self) {
        let mut engine = self.state.engine.lock();
        let target = self.offset_ms + self.started.elapsed().as_millis() as u64;
        let now = engine.now_ms();
        if target > now {
            engine.advance(Duration::from_millis(target - now));
        }
    }

    fn notify_if_idle(&mut self) {
        if self.idle_waiters.is_empty() {
            return;
        }
        let engine = self.state.engine.lock();
        if !engine.is_idle() {
            return;
        }
        let snapshot = engine.snapshot();
        for waiter in self.idle_waiters.drain(..) {
            let _ = waiter.send(snapshot.clone());
        }
    }
}

/// Spawn the driver on the current runtime.
pub fn spawn(state: Arc<AppState>) -> (EngineHandle, JoinHandle<()>) {
    let (sender, receiver) = mpsc::channel(COMMAND_BUFFER);
    let driver = EngineDriver::new(state, receiver);
    let task = tokio::spawn(driver.run());
    (EngineHandle { sender }, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Config, GenerationStatus};

    fn state() -> Arc<AppState> {
        Arc::new(AppState::with_config(Config {
            rng_seed: Some(1),
            ..Config::default()
        }))
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatch_reveals_over_time() {
        let (handle, _task) = spawn(state());
        let start = Instant::now();

        handle
            .dispatch("Show pending approvals", DispatchOptions::default())
            .await
            .unwrap();
        let snapshot = handle.wait_idle().await.unwrap();

        assert!(start.elapsed() >= Duration::from_millis(700));
        assert_eq!(snapshot.status, GenerationStatus::Complete);
        assert_eq!(snapshot.sections[0].id, "focus-approvals");
        assert!(snapshot.messages.iter().all(|m| !m.is_typing));
    }

    #[tokio::test(start_paused = true)]
    async fn test_snapshot_mid_thinking_delay() {
        let (handle, _task) = spawn(state());
        handle
            .dispatch("add buy flowers to plan", DispatchOptions::default())
            .await
            .unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.status, GenerationStatus::Generating);
        assert!(snapshot.sections.is_empty());

        let done = handle.wait_idle().await.unwrap();
        assert_eq!(done.sections[0].visible_content, "[·] Buy flowers");
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_through_handle() {
        let (handle, _task) = spawn(state());
        handle
            .dispatch("Give me today's overview", DispatchOptions::default())
            .await
            .unwrap();
        handle.wait_idle().await.unwrap();
        handle.reset().await.unwrap();

        let snapshot = handle.snapshot().await.unwrap();
        assert_eq!(snapshot.status, GenerationStatus::Idle);
        assert!(snapshot.sections.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_handle_after_shutdown_is_unavailable() {
        let (handle, task) = spawn(state());
        handle.shutdown().await.unwrap();
        task.await.unwrap();

        let err = handle.snapshot().await.unwrap_err();
        assert!(matches!(err, CanvasError::EngineUnavailable));
    }
}
