//! FIFO command queue between the input side and the simulation thread
//!
//! Unbounded so a burst of input is never dropped; the simulation drains it at tick
//! boundaries without blocking.

use tokio::sync::mpsc;

use blockrise_types::Command;

/// Cloneable producer handle
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::UnboundedSender<Command>,
}

impl CommandSender {
    /// Queue a command. Returns false once the simulation side is gone.
    pub fn send(&self, command: Command) -> bool {
        self.tx.send(command).is_ok()
    }
}

#[derive(Debug)]
pub struct CommandQueue {
    rx: mpsc::UnboundedReceiver<Command>,
}

impl CommandQueue {
    pub fn new() -> (CommandSender, CommandQueue) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CommandSender { tx }, CommandQueue { rx })
    }

    pub fn try_recv(&mut self) -> Option<Command> {
        self.rx.try_recv().ok()
    }

    /// Hand every queued command to `apply` in arrival order; returns how many there were
    pub fn drain(&mut self, mut apply: impl FnMut(Command)) -> usize {
        let mut count = 0;
        while let Some(command) = self.try_recv() {
            apply(command);
            count += 1;
        }
        count
    }
}
