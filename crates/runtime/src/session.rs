//! Host session: owns the simulation and everything around it
//!
//! The session is driven from one thread. Each call to [`Session::frame`] converts a
//! wall-clock delta into fixed steps, drains queued commands at every step boundary,
//! advances the state and republishes the render view. Saves are handed to a writer task
//! on the session's own tokio runtime, so the frame loop never waits on the filesystem.

use anyhow::Context;
use tokio::runtime::{Builder, Runtime};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use blockrise_core::{GameState, SaveBlob, Settings, TracingAudio};

use crate::commands::{CommandQueue, CommandSender};
use crate::config::RuntimeConfig;
use crate::persist::{PersistError, SaveStore};
use crate::timestep::FixedTimestep;
use crate::view::SharedView;

#[derive(Debug)]
enum SaveJob {
    Write(Box<SaveBlob>),
    Clear,
}

struct SaveWriter {
    tx: mpsc::UnboundedSender<SaveJob>,
    handle: JoinHandle<()>,
}

pub struct Session {
    rt: Runtime,
    state: GameState,
    clock: FixedTimestep,
    queue: CommandQueue,
    sender: CommandSender,
    view: SharedView,
    store: Option<SaveStore>,
    writer: Option<SaveWriter>,
    autosave_secs: f32,
    since_save: f32,
}

impl Session {
    pub fn new(config: RuntimeConfig) -> anyhow::Result<Self> {
        let rt = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("blockrise-io")
            .enable_all()
            .build()
            .context("failed to build tokio runtime")?;

        let settings = Settings::default().with_mode(config.mode);
        let state = GameState::with_settings(config.seed, settings).with_audio(Box::new(TracingAudio));

        let store = config.save_path.clone().map(SaveStore::new);
        let writer = store.clone().map(|store| spawn_writer(&rt, store));

        let (sender, queue) = CommandQueue::new();
        let view = SharedView::new();
        view.publish(&state);

        info!(
            seed = config.seed,
            mode = config.mode.as_str(),
            persistence = store.is_some(),
            "session started"
        );

        Ok(Self {
            rt,
            state,
            clock: FixedTimestep::default(),
            queue,
            sender,
            view,
            store,
            writer,
            autosave_secs: config.autosave_secs,
            since_save: 0.0,
        })
    }

    /// Load the stored save into the running state
    ///
    /// Returns whether a save was found. Malformed fields are recovered inside the core;
    /// only an unreadable or undecodable file is an error.
    pub fn restore_from_store(&mut self) -> Result<bool, PersistError> {
        let Some(store) = self.store.as_ref() else {
            return Ok(false);
        };
        let Some(blob) = self.rt.block_on(store.load())? else {
            debug!("no save to restore");
            return Ok(false);
        };
        self.state.restore(&blob);
        self.clock.reset();
        self.since_save = 0.0;
        self.view.publish(&self.state);
        Ok(true)
    }

    /// Run one host frame; returns how many fixed steps were simulated
    pub fn frame(&mut self, frame_secs: f32) -> u32 {
        let steps = self.clock.advance(frame_secs);
        let step = self.clock.step();
        for _ in 0..steps {
            let state = &mut self.state;
            self.queue.drain(|command| {
                state.apply_command(command);
            });
            state.update(step);
        }
        self.view.publish(&self.state);

        if self.writer.is_some() {
            self.since_save += step * steps as f32;
            if self.since_save >= self.autosave_secs {
                self.save_now();
            }
        }
        steps
    }

    /// Queue a save of the current state
    pub fn save_now(&mut self) {
        self.since_save = 0.0;
        let blob = self.state.to_blob();
        self.submit(SaveJob::Write(Box::new(blob)));
    }

    /// Start a fresh run with the current settings and drop the stored save
    pub fn restart(&mut self) {
        let settings = self.state.settings().clone();
        self.state.reset(settings);
        self.clock.reset();
        self.since_save = 0.0;
        self.view.publish(&self.state);
        self.submit(SaveJob::Clear);
    }

    fn submit(&self, job: SaveJob) {
        if let Some(writer) = &self.writer {
            if writer.tx.send(job).is_err() {
                warn!("save writer is gone");
            }
        }
    }

    /// Write a final save and wait for every queued write to land
    pub fn shutdown(mut self) {
        if self.writer.is_some() {
            self.save_now();
        }
        if let Some(SaveWriter { tx, handle }) = self.writer.take() {
            drop(tx);
            if let Err(e) = self.rt.block_on(handle) {
                warn!(error = %e, "save writer task failed");
            }
        }
        info!(score = self.state.score(), lines = self.state.lines(), "session ended");
    }

    pub fn sender(&self) -> CommandSender {
        self.sender.clone()
    }

    pub fn view(&self) -> SharedView {
        self.view.clone()
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut GameState {
        &mut self.state
    }

    pub fn store(&self) -> Option<&SaveStore> {
        self.store.as_ref()
    }
}

fn spawn_writer(rt: &Runtime, store: SaveStore) -> SaveWriter {
    let (tx, mut rx) = mpsc::unbounded_channel::<SaveJob>();
    let handle = rt.spawn(async move {
        while let Some(job) = rx.recv().await {
            let result = match &job {
                SaveJob::Write(blob) => store.save(blob).await,
                SaveJob::Clear => store.clear().await,
            };
            if let Err(e) = result {
                warn!(error = %e, "save job failed");
            }
        }
    });
    SaveWriter { tx, handle }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockrise_types::{Command, GameMode, TICK_SECS};
    use std::path::PathBuf;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("blockrise-session-{}-{}", std::process::id(), name))
            .join("save.json")
    }

    fn config(save_path: Option<PathBuf>) -> RuntimeConfig {
        RuntimeConfig {
            seed: 99,
            save_path,
            autosave_secs: 1000.0,
            run_secs: 0.0,
            mode: GameMode::Zen,
        }
    }

    #[test]
    fn test_frame_runs_fixed_steps() {
        let mut session = Session::new(config(None)).unwrap();
        assert_eq!(session.frame(TICK_SECS * 3.5), 3);

        let mut reference = FixedTimestep::default();
        reference.advance(TICK_SECS * 3.5);
        let clamped = reference.advance(10.0);
        assert!(clamped >= 14 && clamped <= 16);
        assert_eq!(session.frame(10.0), clamped);
        session.shutdown();
    }

    #[test]
    fn test_commands_apply_at_step_boundary() {
        let mut session = Session::new(config(None)).unwrap();
        let before = session.state().active().unwrap().x;
        let sender = session.sender();
        sender.send(Command::MoveLeft);
        sender.send(Command::MoveLeft);

        // no whole step yet, so nothing is applied
        session.frame(TICK_SECS * 0.5);
        assert_eq!(session.state().active().unwrap().x, before);

        session.frame(TICK_SECS * 0.6);
        assert_eq!(session.state().active().unwrap().x, before - 2);
        assert_eq!(session.view().read().active.unwrap().x, before - 2);
        session.shutdown();
    }

    #[test]
    fn test_pause_reaches_view() {
        let mut session = Session::new(config(None)).unwrap();
        session.sender().send(Command::TogglePause);
        session.frame(TICK_SECS);
        assert!(session.view().read().paused);
        session.shutdown();
    }

    #[test]
    fn test_shutdown_saves_and_restore_loads() {
        let path = scratch("roundtrip");
        let mut session = Session::new(config(Some(path.clone()))).unwrap();
        session.sender().send(Command::MoveRight);
        session.frame(TICK_SECS);
        let x = session.state().active().unwrap().x;
        session.shutdown();
        assert!(path.exists());

        let mut next = Session::new(config(Some(path.clone()))).unwrap();
        assert!(next.restore_from_store().unwrap());
        assert_eq!(next.state().active().unwrap().x, x);

        next.restart();
        next.shutdown();
        // restart clears, shutdown writes the fresh run back
        assert!(path.exists());
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_restore_without_store() {
        let mut session = Session::new(config(None)).unwrap();
        assert!(!session.restore_from_store().unwrap());
        session.shutdown();
    }

    #[test]
    fn test_restore_missing_file() {
        let path = scratch("missing");
        let mut session = Session::new(config(Some(path.clone()))).unwrap();
        assert!(!session.restore_from_store().unwrap());
        drop(session);
        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
