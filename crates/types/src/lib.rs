//! Core types module - shared data structures and constants
//!
//! This module defines the vocabulary shared by the simulation, the runtime host and any
//! presentation layer. Everything here is plain data: no I/O and no game rules.
//!
//! # Board Dimensions
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BOARD_COLS` | 24 | Playfield width |
//! | `BOARD_ROWS` | 80 | Visible rows |
//! | `HIDDEN_ROWS` | 2 | Overflow band above the visible rows |
//! | `BOARD_TOTAL_ROWS` | 82 | Visible + hidden |
//!
//! Row 0 is the top of the hidden band; rows grow downward. Visible row `v` is grid row
//! `v + HIDDEN_ROWS`.
//!
//! # Cell Values
//!
//! - `0`: empty
//! - `1..=7`: shape color id (I, J, L, O, S, T, Z)
//! - `8`: garbage pushed in by a rise
//!
//! # Timing Constants
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `TICK_SECS` | 1/60 | Fixed simulation step |
//! | `MAX_FRAME_SECS` | 0.25 | Per-update clamp before the accumulator |
//! | `LOCK_DELAY_MS` | 500 | Grace period before a grounded piece locks |
//! | `RISE_INTERVAL_SECS` | 6.0 | Starting garbage rise interval |
//! | `MIN_RISE_INTERVAL_SECS` | 2.5 | Rise interval floor |
//! | `RISE_DELAY_BONUS_SECS` | 3.0 | Added to the rise countdown on a multi-line clear |
//! | `CLASSIC_DIFFICULTY_STEP_SECS` | 90.0 | Classic-Relax ramp period |
//! | `CLASSIC_RISE_DECREMENT_SECS` | 0.5 | Rise interval reduction per ramp step |
//!
//! # Examples
//!
//! ```
//! use blockrise_types::{Command, GameMode, Rotation, ShapeKind};
//!
//! assert_eq!(ShapeKind::from_str("t"), Some(ShapeKind::T));
//! assert_eq!(ShapeKind::T.color_id(), 6);
//! assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
//! assert_eq!(Command::from_str("rotateCw"), Some(Command::RotateCw));
//! assert_eq!(GameMode::from_str("CLASSIC_RELAX"), Some(GameMode::ClassicRelax));
//! ```

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Playfield width in cells
pub const BOARD_COLS: usize = 24;

/// Visible playfield rows
pub const BOARD_ROWS: usize = 80;

/// Rows above the visible playfield used to detect overflow
pub const HIDDEN_ROWS: usize = 2;

/// Total rows stored by the grid
pub const BOARD_TOTAL_ROWS: usize = BOARD_ROWS + HIDDEN_ROWS;

/// A single grid cell value
pub type Cell = i8;

/// Empty cell
pub const EMPTY_CELL: Cell = 0;

/// Cell written by garbage rises
pub const GARBAGE_CELL: Cell = 8;

/// Sentinel returned for reads outside the grid
pub const OUT_OF_BOUNDS: Cell = -1;

/// Largest cell value a valid grid can hold
pub const MAX_CELL: Cell = GARBAGE_CELL;

/// Probability that a non-gap column of a garbage row is filled
pub const GARBAGE_FILL_CHANCE: f32 = 0.6;

/// Fixed simulation step (60 Hz)
pub const TICK_SECS: f32 = 1.0 / 60.0;

/// Largest frame delta fed into the accumulator per update
pub const MAX_FRAME_SECS: f32 = 0.25;

/// Lock delay when the piece cannot descend (milliseconds)
pub const LOCK_DELAY_MS: f32 = 500.0;

/// Starting rise interval (seconds)
pub const RISE_INTERVAL_SECS: f32 = 6.0;

/// Rise interval floor (seconds)
pub const MIN_RISE_INTERVAL_SECS: f32 = 2.5;

/// Countdown bonus for clearing two or more lines in one lock (seconds)
pub const RISE_DELAY_BONUS_SECS: f32 = 3.0;

/// Minimum countdown when a suspended rise resumes (seconds)
pub const RISE_RESUME_MIN_SECS: f32 = 0.5;

/// Classic-Relax difficulty ramp period (seconds)
pub const CLASSIC_DIFFICULTY_STEP_SECS: f32 = 90.0;

/// Rise interval reduction per difficulty step (seconds)
pub const CLASSIC_RISE_DECREMENT_SECS: f32 = 0.5;

/// Number of upcoming shapes exposed to the renderer
pub const PREVIEW_COUNT: usize = 3;

/// Lock pulse duration (seconds)
pub const LOCK_PULSE_SECS: f32 = 0.3;

/// Per-row line clear fade duration (seconds)
pub const LINE_CLEAR_FADE_SECS: f32 = 0.35;

/// Avalanche drop animation duration (seconds)
pub const AVALANCHE_ANIM_SECS: f32 = 0.3;

/// Rise push animation duration (seconds)
pub const RISE_ANIM_SECS: f32 = 0.35;

/// Largest number of difficulty steps before the rise interval hits its floor
pub const MAX_DIFFICULTY_STEPS: u32 =
    ((RISE_INTERVAL_SECS - MIN_RISE_INTERVAL_SECS) / CLASSIC_RISE_DECREMENT_SECS) as u32;

/// The seven shape kinds
///
/// Declaration order matches the color ids: I=1, J=2, L=3, O=4, S=5, T=6, Z=7.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShapeKind {
    I,
    J,
    L,
    O,
    S,
    T,
    Z,
}

impl ShapeKind {
    /// Every shape kind, in color id order
    pub const ALL: [ShapeKind; 7] = [
        ShapeKind::I,
        ShapeKind::J,
        ShapeKind::L,
        ShapeKind::O,
        ShapeKind::S,
        ShapeKind::T,
        ShapeKind::Z,
    ];

    /// Parse a shape kind from its name (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use blockrise_types::ShapeKind;
    ///
    /// assert_eq!(ShapeKind::from_str("I"), Some(ShapeKind::I));
    /// assert_eq!(ShapeKind::from_str("z"), Some(ShapeKind::Z));
    /// assert_eq!(ShapeKind::from_str(""), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "I" => Some(ShapeKind::I),
            "J" => Some(ShapeKind::J),
            "L" => Some(ShapeKind::L),
            "O" => Some(ShapeKind::O),
            "S" => Some(ShapeKind::S),
            "T" => Some(ShapeKind::T),
            "Z" => Some(ShapeKind::Z),
            _ => None,
        }
    }

    /// Persisted name (uppercase)
    pub fn as_str(&self) -> &'static str {
        match self {
            ShapeKind::I => "I",
            ShapeKind::J => "J",
            ShapeKind::L => "L",
            ShapeKind::O => "O",
            ShapeKind::S => "S",
            ShapeKind::T => "T",
            ShapeKind::Z => "Z",
        }
    }

    /// Table index in `0..7`
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Cell value written into the grid when this shape locks
    pub fn color_id(&self) -> Cell {
        self.index() as Cell + 1
    }

    /// Inverse of [`ShapeKind::color_id`]
    pub fn from_color_id(id: Cell) -> Option<Self> {
        if (1..=7).contains(&id) {
            Some(Self::ALL[(id - 1) as usize])
        } else {
            None
        }
    }
}

/// Rotation state, stored as an index in `0..4`
///
/// The rotation cycle goes: North → East → South → West → North
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Rotation {
    #[default]
    North,
    East,
    South,
    West,
}

impl Rotation {
    /// Rotate clockwise (90°)
    ///
    /// # Examples
    ///
    /// ```
    /// use blockrise_types::Rotation;
    ///
    /// assert_eq!(Rotation::North.rotate_cw(), Rotation::East);
    /// assert_eq!(Rotation::West.rotate_cw(), Rotation::North);
    /// ```
    pub fn rotate_cw(&self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Build from any index, wrapping modulo 4
    pub fn from_index(index: usize) -> Self {
        match index % 4 {
            0 => Rotation::North,
            1 => Rotation::East,
            2 => Rotation::South,
            _ => Rotation::West,
        }
    }
}

/// Game mode
///
/// - **Zen**: overflow suspends rising instead of ending the run
/// - **ClassicRelax**: overflow ends the run and the rise interval ramps down over time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameMode {
    #[default]
    Zen,
    ClassicRelax,
}

impl GameMode {
    /// Parse from the persisted name (case-insensitive, accepts short forms)
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zen" => Some(GameMode::Zen),
            "classic_relax" | "classicrelax" | "classic" => Some(GameMode::ClassicRelax),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Zen => "ZEN",
            GameMode::ClassicRelax => "CLASSIC_RELAX",
        }
    }
}

/// Gravity interval selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GravityProfile {
    #[default]
    Slow,
    Medium,
    Fast,
}

impl GravityProfile {
    /// Milliseconds per gravity row
    pub fn interval_ms(&self) -> f32 {
        match self {
            GravityProfile::Slow => 1200.0,
            GravityProfile::Medium => 800.0,
            GravityProfile::Fast => 500.0,
        }
    }

    /// Cycle Slow → Medium → Fast → Slow
    pub fn next(&self) -> Self {
        match self {
            GravityProfile::Slow => GravityProfile::Medium,
            GravityProfile::Medium => GravityProfile::Fast,
            GravityProfile::Fast => GravityProfile::Slow,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Some(GravityProfile::Slow),
            "medium" => Some(GravityProfile::Medium),
            "fast" => Some(GravityProfile::Fast),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GravityProfile::Slow => "SLOW",
            GravityProfile::Medium => "MEDIUM",
            GravityProfile::Fast => "FAST",
        }
    }
}

/// Discrete input commands produced by the input collaborator
///
/// Drained in FIFO order once per simulation tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Command {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Rotate piece 90° clockwise (with kicks)
    RotateCw,
    /// Swap the active piece with the held shape
    Hold,
    /// Toggle pause state
    TogglePause,
    /// Open or close the settings overlay
    ToggleSettings,
}

impl Command {
    /// Parse a command from its camelCase name
    ///
    /// # Examples
    ///
    /// ```
    /// use blockrise_types::Command;
    ///
    /// assert_eq!(Command::from_str("moveLeft"), Some(Command::MoveLeft));
    /// assert_eq!(Command::from_str("togglepause"), Some(Command::TogglePause));
    /// assert_eq!(Command::from_str("hardDrop"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(Command::MoveLeft),
            "moveright" => Some(Command::MoveRight),
            "rotatecw" => Some(Command::RotateCw),
            "hold" => Some(Command::Hold),
            "togglepause" => Some(Command::TogglePause),
            "togglesettings" => Some(Command::ToggleSettings),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Command::MoveLeft => "moveLeft",
            Command::MoveRight => "moveRight",
            Command::RotateCw => "rotateCw",
            Command::Hold => "hold",
            Command::TogglePause => "togglePause",
            Command::ToggleSettings => "toggleSettings",
        }
    }
}

/// Named fire-and-forget audio cues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AudioCue {
    Place,
    Clear,
    ClearChain,
    Rise,
    Chain,
    Pause,
}

impl AudioCue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AudioCue::Place => "place",
            AudioCue::Clear => "clear",
            AudioCue::ClearChain => "clear_chain",
            AudioCue::Rise => "rise",
            AudioCue::Chain => "chain",
            AudioCue::Pause => "pause",
        }
    }
}

/// Core-side event emitted after a piece locks.
///
/// Consumed by observers through `GameState::take_last_event`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LockEvent {
    pub lines_cleared: u32,
    pub score_gained: u64,
    pub chain: u32,
    pub chain_stages: u32,
    pub any_drop: bool,
    pub max_drop: u32,
    pub overflowed: bool,
}
