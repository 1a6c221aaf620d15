//! Headless blockrise runner (default binary).
//!
//! Drives a [`Session`] in real time for `BLOCKRISE_RUN_SECS`. A scripted input thread feeds
//! commands through the queue and a reader thread samples the shared render view, the same
//! way a real input device and renderer would sit around the simulation.
//!
//! Log level follows `RUST_LOG` (default `info`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use blockrise::runtime::{CommandSender, RuntimeConfig, Session, SharedView};
use blockrise::types::{Command, TICK_SECS};

const SCRIPT: [Command; 8] = [
    Command::MoveLeft,
    Command::MoveLeft,
    Command::RotateCw,
    Command::MoveRight,
    Command::MoveRight,
    Command::MoveRight,
    Command::RotateCw,
    Command::Hold,
];

const DEFAULT_LOG: &str = "info";

/// `RUST_LOG` wins when set and valid; otherwise everything logs at `info`
fn log_filter(rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|spec| !spec.trim().is_empty())
        .and_then(|spec| EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG))
}

fn main() -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref()))
        .init();

    let config = RuntimeConfig::from_env();
    let run_for = Duration::from_secs_f32(config.run_secs);
    let mut session = Session::new(config)?;

    match session.restore_from_store() {
        Ok(true) => info!(score = session.state().score(), "resumed saved run"),
        Ok(false) => {}
        Err(e) => warn!(error = %e, "could not restore save, starting fresh"),
    }

    let stop = Arc::new(AtomicBool::new(false));
    let input = spawn_input(session.sender(), stop.clone());
    let reader = spawn_reader(session.view(), stop.clone());

    let tick = Duration::from_secs_f32(TICK_SECS);
    let started = Instant::now();
    let mut last = started;
    while started.elapsed() < run_for {
        let now = Instant::now();
        session.frame((now - last).as_secs_f32());
        last = now;

        if session.state().game_over() {
            info!(score = session.state().score(), "game over, restarting");
            session.restart();
        }
        thread::sleep(tick);
    }

    stop.store(true, Ordering::Relaxed);
    let _ = input.join();
    let _ = reader.join();
    session.shutdown();
    Ok(())
}

fn spawn_input(sender: CommandSender, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut step = 0usize;
        while !stop.load(Ordering::Relaxed) {
            if !sender.send(SCRIPT[step % SCRIPT.len()]) {
                break;
            }
            step += 1;
            thread::sleep(Duration::from_millis(350));
        }
    })
}

fn spawn_reader(view: SharedView, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Relaxed) {
            thread::sleep(Duration::from_secs(2));
            let (score, lines, chain, phase) =
                view.with(|v| (v.score, v.lines, v.chain, v.phase));
            info!(score, lines, chain, phase = ?phase, "view");
            tracing::debug!("\n{}", view.read().ascii(12));
        }
    })
}
