//! Host runtime for the simulation
//!
//! Everything that touches time, threads or the filesystem lives here; the core crate stays
//! pure. A [`Session`] owns the game state and a small tokio runtime for save I/O.
//!
//! - [`config`]: environment-driven settings
//! - [`timestep`]: wall-clock to fixed-step conversion
//! - [`commands`]: FIFO command queue fed from any thread
//! - [`view`]: lock-protected render view shared with readers
//! - [`persist`]: JSON save file with atomic replace
//! - [`session`]: the loop tying the above together

pub mod commands;
pub mod config;
pub mod persist;
pub mod session;
pub mod timestep;
pub mod view;

pub use commands::{CommandQueue, CommandSender};
pub use config::RuntimeConfig;
pub use persist::{PersistError, SaveStore};
pub use session::Session;
pub use timestep::FixedTimestep;
pub use view::SharedView;
