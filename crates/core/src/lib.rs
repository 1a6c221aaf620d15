//! Core simulation - pure, deterministic, and testable
//!
//! This crate contains the playfield rules and the state machine that drives them. It does
//! no I/O and installs no logging subscriber; the host supplies time, input and an audio sink.
//!
//! - **Deterministic**: a seed plus an input sequence reproduces a session exactly
//! - **Testable**: every rule is reachable without a renderer or clock
//! - **Allocation-light**: the avalanche BFS reuses buffers sized once per grid
//!
//! # Module Structure
//!
//! - [`tetromino`]: static rotation-cell table for the seven shapes
//! - [`grid`]: cell buffer with collision, line and garbage-rise primitives
//! - [`piece`]: the active piece, movement and kick-based rotation
//! - [`bag`]: 7-bag randomizer
//! - [`avalanche`]: line clears, floating-cluster gravity and chain scoring
//! - [`timers`]: gravity, lock, rise and difficulty scheduling
//! - [`animation`]: cosmetic progress clocks
//! - [`game_state`]: the aggregate root tying it all together
//! - [`snapshot`]: save blob and render projection
//!
//! # Example
//!
//! ```
//! use blockrise_core::GameState;
//! use blockrise_types::{Command, TICK_SECS};
//!
//! let mut game = GameState::new(12345);
//! game.apply_command(Command::MoveLeft);
//! game.apply_command(Command::RotateCw);
//! for _ in 0..60 {
//!     game.update(TICK_SECS);
//! }
//!
//! let view = game.render_view();
//! assert_eq!(view.cols, 24);
//! assert!(view.active.is_some());
//! ```

pub mod animation;
pub mod audio;
pub mod avalanche;
pub mod bag;
pub mod game_state;
pub mod grid;
pub mod piece;
pub mod rng;
pub mod settings;
pub mod snapshot;
pub mod tetromino;
pub mod timers;

pub use blockrise_types as types;

// Re-export commonly used types for convenience
pub use animation::{AnimationProgress, Animations};
pub use audio::{AudioSink, NullAudio, RecordingAudio, TracingAudio};
pub use avalanche::{resolve, AvalancheEngine, ChainStage, Resolution};
pub use bag::PieceBag;
pub use game_state::{BestScores, GameState, Phase};
pub use grid::{Grid, RiseOutcome};
pub use piece::Piece;
pub use rng::SimpleRng;
pub use settings::Settings;
pub use snapshot::{ActiveView, RenderView, SaveBlob};
pub use tetromino::{cells_at, shape_cells};
pub use timers::Timers;
