//! Game state module - the simulation's aggregate root
//!
//! Owns the grid, the active piece, hold and preview queues, scoring, timers and animation
//! clocks. The host drives it with [`GameState::update`] once per fixed step and feeds input
//! through [`GameState::apply_command`].
//!
//! # Update order
//!
//! 1. Cosmetic animations decay (always, even while paused)
//! 2. Stop here if paused or game over
//! 3. Session clock and Classic-Relax difficulty ramp
//! 4. Spawn a piece if none is active
//! 5. Gravity, then lock delay, then the garbage rise scheduler
//!
//! # Overflow
//!
//! Spawn collision, a rise that reaches the hidden rows, and a lock that leaves cells in the
//! hidden rows are all overflow. Classic-Relax ends the run; Zen suspends rising until the
//! hidden rows are clear again.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::animation::Animations;
use crate::audio::{AudioSink, NullAudio};
use crate::avalanche::AvalancheEngine;
use crate::bag::PieceBag;
use crate::grid::Grid;
use crate::piece::Piece;
use crate::rng::SimpleRng;
use crate::settings::Settings;
use crate::snapshot::{ActiveView, RenderView, SaveBlob, SAVE_VERSION};
use crate::timers::Timers;
use crate::types::{
    Command, GameMode, LockEvent, Rotation, ShapeKind, HIDDEN_ROWS, LOCK_DELAY_MS,
    MAX_DIFFICULTY_STEPS, PREVIEW_COUNT,
};

/// Salt separating the garbage stream from the bag stream of the same seed
const GARBAGE_RNG_SALT: u32 = 0x9E37_79B9;

/// Coarse state of the machine, derived from the flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// No active piece; one spawns on the next unpaused update
    Spawning,
    Falling,
    /// The piece cannot descend and the lock countdown is running
    LockPending,
    /// Zen overflow: no active piece and rising is on hold
    RiseSuspended,
    Paused,
    GameOver,
}

/// Best score per mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BestScores {
    pub zen: u64,
    pub classic_relax: u64,
}

impl BestScores {
    pub fn get(&self, mode: GameMode) -> u64 {
        match mode {
            GameMode::Zen => self.zen,
            GameMode::ClassicRelax => self.classic_relax,
        }
    }

    pub fn record(&mut self, mode: GameMode, score: u64) {
        let slot = match mode {
            GameMode::Zen => &mut self.zen,
            GameMode::ClassicRelax => &mut self.classic_relax,
        };
        *slot = (*slot).max(score);
    }
}

pub struct GameState {
    grid: Grid,
    engine: AvalancheEngine,
    bag: PieceBag,
    /// Upcoming shapes; keeps one more than the visible preview
    preview: VecDeque<ShapeKind>,
    garbage_rng: SimpleRng,
    active: Option<Piece>,
    hold: Option<ShapeKind>,
    hold_used: bool,
    score: u64,
    lines: u32,
    chain_display: u32,
    settings: Settings,
    mode: GameMode,
    paused: bool,
    game_over: bool,
    settings_open: bool,
    /// Whether opening the settings overlay is what paused the game
    paused_by_settings: bool,
    timers: Timers,
    animations: Animations,
    best: BestScores,
    last_event: Option<LockEvent>,
    audio: Box<dyn AudioSink>,
}

impl GameState {
    /// Create a new session with default settings
    pub fn new(seed: u32) -> Self {
        Self::with_settings(seed, Settings::default())
    }

    pub fn with_settings(seed: u32, settings: Settings) -> Self {
        Self::with_grid(seed, settings, Grid::new())
    }

    /// Start a session on a custom grid. The grid's contents are kept.
    pub fn with_grid(seed: u32, settings: Settings, grid: Grid) -> Self {
        let bag_rng = SimpleRng::new(seed);
        let garbage_rng = bag_rng.fork(GARBAGE_RNG_SALT);
        let settings = settings.clamped();
        let mut state = Self {
            engine: AvalancheEngine::for_grid(&grid),
            grid,
            bag: PieceBag::with_rng(bag_rng),
            preview: VecDeque::with_capacity(PREVIEW_COUNT + 1),
            garbage_rng,
            active: None,
            hold: None,
            hold_used: false,
            score: 0,
            lines: 0,
            chain_display: 1,
            mode: settings.mode,
            timers: Timers::new(settings.gravity_profile),
            settings,
            paused: false,
            game_over: false,
            settings_open: false,
            paused_by_settings: false,
            animations: Animations::new(),
            best: BestScores::default(),
            last_event: None,
            audio: Box::new(NullAudio),
        };
        state.refill_preview();
        state.spawn_next();
        state.apply_settings_internal();
        state
    }

    pub fn with_audio(mut self, sink: Box<dyn AudioSink>) -> Self {
        self.set_audio_sink(sink);
        self
    }

    pub fn set_audio_sink(&mut self, sink: Box<dyn AudioSink>) {
        self.audio = sink;
        self.push_volumes();
    }

    /// Start a fresh session with `settings`, keeping best scores and the RNG streams
    pub fn reset(&mut self, settings: Settings) {
        self.settings = settings.clamped();
        self.mode = self.settings.mode;
        self.score = 0;
        self.lines = 0;
        self.chain_display = 1;
        self.paused = false;
        self.game_over = false;
        self.settings_open = false;
        self.paused_by_settings = false;
        self.timers = Timers::new(self.settings.gravity_profile);
        self.active = None;
        self.hold = None;
        self.hold_used = false;
        self.animations.reset();
        self.last_event = None;
        self.grid.clear();
        self.preview.clear();
        self.bag.restore("");
        self.refill_preview();
        self.spawn_next();
        self.apply_settings_internal();
        info!(mode = self.mode.as_str(), "session reset");
    }

    /// Replace the settings in place; the run continues
    pub fn apply_settings(&mut self, settings: Settings) {
        self.settings = settings.clamped();
        self.mode = self.settings.mode;
        self.apply_settings_internal();
    }

    fn apply_settings_internal(&mut self) {
        self.timers.set_gravity_profile(self.settings.gravity_profile);
        self.timers.recompute_rise_interval();
        self.push_volumes();
    }

    fn push_volumes(&mut self) {
        self.audio
            .set_volumes(self.settings.music_volume, self.settings.sfx_volume);
    }

    // ---------------------------------------------------------------------
    // Per-step update
    // ---------------------------------------------------------------------

    /// Advance the simulation by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };

        if self.animations.update(dt) {
            self.grid.clear_drop_distances();
        }
        if self.game_over || self.paused {
            return;
        }

        self.timers.elapsed_secs += dt;
        if self.mode == GameMode::ClassicRelax && self.timers.advance_difficulty(dt) {
            debug!(
                steps = self.timers.difficulty_steps,
                interval = self.timers.rise_interval_secs,
                "difficulty step"
            );
        }

        self.ensure_active_piece();
        if self.game_over {
            return;
        }
        self.update_gravity(dt);
        self.update_lock(dt);
        // a lock that ended the game freezes the rest of the step
        if self.game_over {
            return;
        }
        self.update_rise(dt);
    }

    fn update_gravity(&mut self, dt: f32) {
        self.timers.accumulate_gravity(dt);
        while self.timers.take_gravity_step() {
            if !self.step_gravity() {
                break;
            }
        }
    }

    /// One row of gravity. A refused move arms the lock countdown.
    fn step_gravity(&mut self) -> bool {
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        if piece.move_down(&self.grid) {
            self.timers.reset_lock();
            return true;
        }
        self.timers.arm_lock();
        false
    }

    fn update_lock(&mut self, dt: f32) {
        let Some(piece) = self.active else {
            return;
        };
        let can_descend = piece.can_descend(&self.grid);
        if self.timers.tick_lock(dt, can_descend) {
            self.lock_active();
        }
    }

    fn update_rise(&mut self, dt: f32) {
        if self.timers.rise_suspended {
            if self.timers.try_resume_rise(self.grid.hidden_rows_clear()) {
                debug!(countdown = self.timers.rise_secs, "rise resumed");
            }
            return;
        }

        self.timers.countdown_rise(dt);
        while self.timers.rise_due() {
            let outcome = self.grid.rise_with_garbage(&mut self.garbage_rng);
            self.animations.start_rise();
            self.audio.rise();
            self.keep_active_clear_of_rise();
            debug!(overflowed = outcome.overflowed, "garbage rise");

            if outcome.overflowed {
                self.handle_overflow("rise");
                self.timers.restart_rise();
                break;
            }
            self.timers.rearm_rise();
        }
    }

    /// The stack moved up under the piece; move the piece up with it if they now overlap
    fn keep_active_clear_of_rise(&mut self) {
        if let Some(piece) = self.active.as_mut() {
            if !piece.fits(&self.grid) {
                piece.y -= 1;
            }
        }
    }

    fn handle_overflow(&mut self, cause: &'static str) {
        match self.mode {
            GameMode::ClassicRelax => self.trigger_game_over(cause),
            GameMode::Zen => {
                if !self.timers.rise_suspended {
                    debug!(cause, "rise suspended");
                }
                self.timers.rise_suspended = true;
            }
        }
    }

    fn trigger_game_over(&mut self, cause: &'static str) {
        self.game_over = true;
        self.paused = true;
        self.record_best();
        info!(cause, score = self.score, lines = self.lines, "game over");
    }

    fn record_best(&mut self) {
        self.best.record(self.mode, self.score);
    }

    // ---------------------------------------------------------------------
    // Spawning
    // ---------------------------------------------------------------------

    fn spawn_x(&self) -> i32 {
        (self.grid.cols() / 2) as i32 - 2
    }

    fn refill_preview(&mut self) {
        while self.preview.len() < PREVIEW_COUNT + 1 {
            self.preview.push_back(self.bag.next());
        }
    }

    fn ensure_active_piece(&mut self) {
        if self.active.is_some() || self.game_over {
            return;
        }
        self.spawn_next();
    }

    fn spawn_next(&mut self) {
        self.refill_preview();
        let kind = match self.preview.pop_front() {
            Some(kind) => kind,
            None => self.bag.next(),
        };
        if self.place_at_spawn(kind) {
            self.preview.push_back(self.bag.next());
        }
    }

    /// Put `kind` at the spawn position, handling a blocked spawn as overflow
    fn place_at_spawn(&mut self, kind: ShapeKind) -> bool {
        let piece = Piece::new(kind, self.spawn_x(), -(HIDDEN_ROWS as i32));
        if !piece.fits(&self.grid) {
            self.active = None;
            self.handle_overflow("spawn");
            return false;
        }
        self.active = Some(piece);
        self.timers.reset_piece_timers();
        true
    }

    // ---------------------------------------------------------------------
    // Commands
    // ---------------------------------------------------------------------

    /// Apply one input command. Returns whether it changed anything.
    ///
    /// While the settings overlay is open only [`Command::ToggleSettings`] is honoured.
    /// Piece commands are ignored while paused or after game over.
    pub fn apply_command(&mut self, command: Command) -> bool {
        if self.settings_open && command != Command::ToggleSettings {
            return false;
        }
        match command {
            Command::ToggleSettings => {
                self.toggle_settings();
                true
            }
            Command::TogglePause => self.toggle_pause(),
            _ if self.paused || self.game_over => false,
            Command::MoveLeft => self.move_horizontal(-1),
            Command::MoveRight => self.move_horizontal(1),
            Command::RotateCw => self.rotate_clockwise(),
            Command::Hold => self.hold(),
        }
    }

    /// Flip the pause flag. Ignored once the game is over.
    pub fn toggle_pause(&mut self) -> bool {
        if self.game_over {
            return false;
        }
        self.paused = !self.paused;
        if self.paused {
            self.audio.pause();
        }
        true
    }

    /// Open or close the settings overlay
    ///
    /// Opening pauses the game if it was running. Closing re-applies the current settings
    /// and resumes only if opening paused it.
    pub fn toggle_settings(&mut self) {
        if self.settings_open {
            self.settings_open = false;
            self.apply_settings(self.settings.clone());
            if self.paused_by_settings && self.paused {
                self.toggle_pause();
            }
            self.paused_by_settings = false;
        } else {
            self.paused_by_settings = !self.paused;
            if !self.paused {
                self.toggle_pause();
            }
            self.settings_open = true;
        }
    }

    pub fn move_horizontal(&mut self, direction: i32) -> bool {
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        let moved = piece.move_by(direction, 0, &self.grid);
        if moved {
            self.timers.reset_lock();
        }
        moved
    }

    pub fn rotate_clockwise(&mut self) -> bool {
        let Some(piece) = self.active.as_mut() else {
            return false;
        };
        let rotated = piece.rotate_clockwise(&self.grid);
        if rotated {
            self.timers.reset_lock();
        }
        rotated
    }

    /// Swap the active piece with the held shape
    ///
    /// Needs hold enabled in settings and is allowed once per piece. With nothing held yet the
    /// active shape is stashed and the next piece spawns.
    pub fn hold(&mut self) -> bool {
        if !self.settings.hold_enabled || self.hold_used {
            return false;
        }
        let Some(piece) = self.active else {
            return false;
        };
        let swapped = self.hold.replace(piece.kind);
        self.hold_used = true;
        self.active = None;
        self.timers.reset_piece_timers();
        match swapped {
            None => self.spawn_next(),
            Some(kind) => {
                self.place_at_spawn(kind);
            }
        }
        true
    }

    // ---------------------------------------------------------------------
    // Locking
    // ---------------------------------------------------------------------

    /// Commit the active piece and resolve the board
    pub fn lock_active(&mut self) {
        let Some(piece) = self.active.take() else {
            return;
        };
        let color = piece.kind.color_id();
        for (col, row) in piece.cells() {
            if row >= 0 {
                self.grid.set(col, row, color);
            }
        }
        self.audio.place();
        self.animations.pulse_lock();
        self.hold_used = false;
        self.timers.reset_piece_timers();

        let result = self.engine.resolve(&mut self.grid, 1);
        if result.total_lines > 0 {
            let chained = result.is_chain();
            self.audio.clear(chained);
            if chained {
                self.audio.chain();
            }
            self.lines += result.total_lines;
            self.score += result.score_gained;
            self.chain_display = result.last_chain.max(1);
            if result.total_lines >= 2 {
                self.timers.grant_rise_bonus();
            }
            for rows in result.stage_rows() {
                for &row in rows {
                    self.animations.push_line_clear(row);
                }
            }
        } else {
            self.chain_display = 1;
            if result.any_drop {
                self.audio.chain();
            }
        }
        if result.max_drop > 0 {
            self.animations.start_avalanche(result.max_drop);
        }
        debug!(
            kind = piece.kind.as_str(),
            lines = result.total_lines,
            score = result.score_gained,
            stages = result.chain_stages.len(),
            max_drop = result.max_drop,
            "piece locked"
        );

        self.record_best();
        let overflowed = self.grid.has_overflow();
        self.last_event = Some(LockEvent {
            lines_cleared: result.total_lines,
            score_gained: result.score_gained,
            chain: result.last_chain,
            chain_stages: result.chain_stages.len() as u32,
            any_drop: result.any_drop,
            max_drop: result.max_drop,
            overflowed,
        });
        if overflowed {
            self.handle_overflow("lock");
        }
    }

    /// Take and clear the last lock event
    pub fn take_last_event(&mut self) -> Option<LockEvent> {
        self.last_event.take()
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    pub fn phase(&self) -> Phase {
        if self.game_over {
            return Phase::GameOver;
        }
        if self.paused {
            return Phase::Paused;
        }
        match self.active {
            None if self.timers.rise_suspended => Phase::RiseSuspended,
            None => Phase::Spawning,
            Some(_) if self.timers.lock_pending => Phase::LockPending,
            Some(_) => Phase::Falling,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn active(&self) -> Option<Piece> {
        self.active
    }

    pub fn hold_piece(&self) -> Option<ShapeKind> {
        self.hold
    }

    pub fn hold_used(&self) -> bool {
        self.hold_used
    }

    /// The next [`PREVIEW_COUNT`] shapes
    pub fn preview(&self) -> Vec<ShapeKind> {
        self.preview.iter().copied().take(PREVIEW_COUNT).collect()
    }

    pub fn bag(&self) -> &PieceBag {
        &self.bag
    }

    pub fn score(&self) -> u64 {
        self.score
    }

    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn chain_display(&self) -> u32 {
        self.chain_display
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    pub fn settings_open(&self) -> bool {
        self.settings_open
    }

    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    pub fn animations(&self) -> &Animations {
        &self.animations
    }

    pub fn best_scores(&self) -> BestScores {
        self.best
    }

    pub fn gravity_progress(&self) -> f32 {
        self.timers.gravity_progress()
    }

    pub fn rise_countdown(&self) -> f32 {
        self.timers.rise_secs
    }

    pub fn rise_interval(&self) -> f32 {
        self.timers.rise_interval_secs
    }

    pub fn rise_suspended(&self) -> bool {
        self.timers.rise_suspended
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.timers.elapsed_secs
    }

    /// Build the renderer's projection
    pub fn render_view(&self) -> RenderView {
        let cols = self.grid.cols();
        let hidden = HIDDEN_ROWS * cols;
        RenderView {
            cols,
            visible_rows: self.grid.visible_rows(),
            cells: self.grid.cells()[hidden..].to_vec(),
            drop_distances: self.grid.drop_distances()[hidden..].to_vec(),
            active: self.active.map(|piece| ActiveView {
                kind: piece.kind,
                rotation: piece.rotation,
                x: piece.x,
                y: piece.y,
                cells: piece.cells(),
            }),
            hold: self.hold,
            hold_used: self.hold_used,
            preview: self.preview(),
            score: self.score,
            lines: self.lines,
            chain: self.chain_display,
            best_score: self.best.get(self.mode),
            mode: self.mode,
            phase: self.phase(),
            paused: self.paused,
            game_over: self.game_over,
            settings_open: self.settings_open,
            rise_suspended: self.timers.rise_suspended,
            rise_countdown: self.timers.rise_secs,
            rise_interval: self.timers.rise_interval_secs,
            gravity_progress: self.gravity_progress(),
            animations: self.animations.progress(),
        }
    }

    // ---------------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------------

    /// Capture the full mutable state
    pub fn to_blob(&self) -> SaveBlob {
        SaveBlob {
            version: SAVE_VERSION,
            grid: self.grid.serialize(),
            active_type: self.active.map(|p| p.kind.as_str().to_string()),
            active_x: self.active.map_or(0, |p| p.x),
            active_y: self.active.map_or(0, |p| p.y),
            active_rotation: self.active.map_or(0, |p| p.rotation.index() as i32),
            hold_type: self.hold.map(|k| k.as_str().to_string()),
            hold_used: self.hold_used,
            next_queue: join_shapes(self.preview.iter().copied()),
            bag_state: self.bag.serialize(),
            score: self.score,
            total_lines: self.lines,
            chain: self.chain_display,
            rise_interval: self.timers.rise_interval_secs,
            rise_timer: self.timers.rise_secs,
            gravity_timer: self.timers.gravity_ms,
            lock_timer: self.timers.lock_ms,
            lock_pending: self.timers.lock_pending,
            time_since_start: self.timers.elapsed_secs,
            difficulty_steps: self.timers.difficulty_steps,
            difficulty_timer: self.timers.difficulty_secs,
            rise_suspended: self.timers.rise_suspended,
            game_mode: self.mode.as_str().to_string(),
            is_paused: self.paused,
            game_over: self.game_over,
            best_zen: self.best.zen,
            best_classic: self.best.classic_relax,
            settings: self.settings.clone(),
            bag_rng: Some(self.bag.rng_state()),
            garbage_rng: Some(self.garbage_rng.state()),
        }
    }

    /// Decode a blob into a fresh state, recovering malformed fields with defaults
    ///
    /// A blob saved between a lock and the next spawn restores with no active piece; the next
    /// [`GameState::update`] spawns it. Returns the state and how many fields or tokens had to
    /// be recovered.
    pub fn from_blob(blob: &SaveBlob) -> (Self, usize) {
        let seed = blob.bag_rng.unwrap_or(1);
        let mut state = Self::with_settings(seed, blob.settings.clone());
        let mut recovered = 0;

        if !blob.game_mode.is_empty() && GameMode::from_str(&blob.game_mode).is_none() {
            warn!(mode = blob.game_mode.as_str(), "unknown game mode in save");
            recovered += 1;
        }

        state.timers.difficulty_steps = blob.difficulty_steps.min(MAX_DIFFICULTY_STEPS);
        state.timers.difficulty_secs = finite_or(blob.difficulty_timer, 0.0, &mut recovered);
        state.apply_settings_internal();

        recovered += state.grid.restore(&blob.grid);
        if let Some(rng) = blob.bag_rng {
            state.bag.set_rng_state(rng);
        }
        recovered += state.bag.restore(&blob.bag_state);
        if let Some(rng) = blob.garbage_rng {
            state.garbage_rng = SimpleRng::from_state(rng);
        }

        state.preview.clear();
        for token in blob.next_queue.split(',').filter(|t| !t.trim().is_empty()) {
            match ShapeKind::from_str(token) {
                Some(kind) if state.preview.len() <= PREVIEW_COUNT => state.preview.push_back(kind),
                _ => recovered += 1,
            }
        }

        state.hold = parse_shape(blob.hold_type.as_deref(), &mut recovered);
        state.hold_used = blob.hold_used;
        state.score = blob.score;
        state.lines = blob.total_lines;
        state.chain_display = blob.chain.max(1);

        let interval = state.timers.rise_interval_secs;
        state.timers.rise_secs = finite_or(blob.rise_timer, interval, &mut recovered);
        state.timers.gravity_ms = finite_or(blob.gravity_timer, 0.0, &mut recovered).max(0.0);
        state.timers.lock_ms = finite_or(blob.lock_timer, LOCK_DELAY_MS, &mut recovered);
        state.timers.lock_pending = blob.lock_pending;
        state.timers.elapsed_secs = finite_or(blob.time_since_start, 0.0, &mut recovered);
        state.timers.rise_suspended = blob.rise_suspended;

        state.paused = blob.is_paused;
        state.game_over = blob.game_over;
        state.best = BestScores {
            zen: blob.best_zen,
            classic_relax: blob.best_classic,
        };
        state.animations.reset();
        state.last_event = None;

        // a live queue holds at least PREVIEW_COUNT shapes; only short saves are topped up
        if state.preview.len() < PREVIEW_COUNT {
            state.refill_preview();
        }

        state.active = match parse_shape(blob.active_type.as_deref(), &mut recovered) {
            Some(kind) => {
                let rotation = Rotation::from_index(blob.active_rotation.rem_euclid(4) as usize);
                let piece = Piece::new(kind, blob.active_x, blob.active_y).with_rotation(rotation);
                if piece.fits(&state.grid) {
                    Some(piece)
                } else {
                    warn!(kind = kind.as_str(), "saved active piece overlaps the grid");
                    recovered += 1;
                    None
                }
            }
            None => None,
        };

        (state, recovered)
    }

    /// Replace the whole state with a decoded blob. The audio sink is kept.
    pub fn restore(&mut self, blob: &SaveBlob) -> usize {
        let (mut fresh, recovered) = Self::from_blob(blob);
        std::mem::swap(&mut fresh.audio, &mut self.audio);
        *self = fresh;
        self.push_volumes();
        if recovered > 0 {
            warn!(recovered, "restored save with malformed fields");
        } else {
            info!(score = self.score, mode = self.mode.as_str(), "restored save");
        }
        recovered
    }
}

impl fmt::Debug for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GameState")
            .field("active", &self.active)
            .field("hold", &self.hold)
            .field("preview", &self.preview)
            .field("score", &self.score)
            .field("lines", &self.lines)
            .field("chain_display", &self.chain_display)
            .field("mode", &self.mode)
            .field("paused", &self.paused)
            .field("game_over", &self.game_over)
            .field("timers", &self.timers)
            .finish_non_exhaustive()
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(1)
    }
}

fn join_shapes(shapes: impl Iterator<Item = ShapeKind>) -> String {
    shapes.map(|k| k.as_str()).collect::<Vec<_>>().join(",")
}

fn parse_shape(name: Option<&str>, recovered: &mut usize) -> Option<ShapeKind> {
    let name = name?.trim();
    if name.is_empty() {
        return None;
    }
    let kind = ShapeKind::from_str(name);
    if kind.is_none() {
        *recovered += 1;
    }
    kind
}

fn finite_or(value: f32, fallback: f32, recovered: &mut usize) -> f32 {
    if value.is_finite() {
        value
    } else {
        *recovered += 1;
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::RecordingAudio;
    use crate::types::{AudioCue, GravityProfile, RISE_DELAY_BONUS_SECS, TICK_SECS};

    fn run(state: &mut GameState, secs: f32) {
        let steps = (secs / TICK_SECS).round() as usize;
        for _ in 0..steps {
            state.update(TICK_SECS);
        }
    }

    #[test]
    fn test_new_game_has_active_piece_at_spawn() {
        let state = GameState::new(12345);
        let piece = state.active().unwrap();
        assert_eq!(piece.x, 10);
        assert_eq!(piece.y, -2);
        assert_eq!(state.preview().len(), PREVIEW_COUNT);
        assert_eq!(state.phase(), Phase::Falling);
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn test_move_commands() {
        let mut state = GameState::new(1);
        let x = state.active().unwrap().x;
        assert!(state.apply_command(Command::MoveLeft));
        assert_eq!(state.active().unwrap().x, x - 1);
        assert!(state.apply_command(Command::MoveRight));
        assert_eq!(state.active().unwrap().x, x);
    }

    #[test]
    fn test_gravity_moves_piece_down() {
        let mut state = GameState::with_settings(1, Settings::default().with_gravity(GravityProfile::Fast));
        let y = state.active().unwrap().y;
        state.update(0.5);
        assert_eq!(state.active().unwrap().y, y + 1);
        state.update(1.0);
        assert_eq!(state.active().unwrap().y, y + 3);
    }

    #[test]
    fn test_pause_freezes_gravity_and_fires_cue() {
        let recorder = RecordingAudio::new();
        let mut state = GameState::new(1).with_audio(Box::new(recorder.clone()));
        assert!(state.apply_command(Command::TogglePause));
        assert_eq!(state.phase(), Phase::Paused);
        assert_eq!(recorder.cues(), vec![AudioCue::Pause]);

        let y = state.active().unwrap().y;
        state.update(5.0);
        assert_eq!(state.active().unwrap().y, y);
        assert!(!state.apply_command(Command::MoveLeft));

        assert!(state.apply_command(Command::TogglePause));
        assert!(!state.paused());
    }

    #[test]
    fn test_piece_locks_after_delay() {
        let recorder = RecordingAudio::new();
        let mut state = GameState::with_settings(3, Settings::default().with_gravity(GravityProfile::Fast))
            .with_audio(Box::new(recorder.clone()));
        let mut event = None;
        for _ in 0..(60.0 / TICK_SECS) as usize {
            state.update(TICK_SECS);
            if let Some(locked) = state.take_last_event() {
                event = Some(locked);
                break;
            }
        }
        let event = event.expect("piece never locked");
        assert!(!event.overflowed);
        assert_eq!(event.chain, 1);
        assert_eq!(
            recorder.cues().iter().filter(|&&c| c == AudioCue::Place).count(),
            1
        );
        assert!(state.active().is_none());
        assert_eq!(state.phase(), Phase::Spawning);
    }

    #[test]
    fn test_hold_requires_setting() {
        let mut state = GameState::new(1);
        assert!(!state.apply_command(Command::Hold));

        let mut state = GameState::with_settings(1, Settings::default().with_hold(true));
        let first = state.active().unwrap().kind;
        let next = state.preview()[0];
        assert!(state.apply_command(Command::Hold));
        assert_eq!(state.hold_piece(), Some(first));
        assert_eq!(state.active().unwrap().kind, next);
        // Once per piece
        assert!(!state.apply_command(Command::Hold));
    }

    #[test]
    fn test_hold_swaps_after_lock() {
        let mut state = GameState::with_settings(9, Settings::default().with_hold(true));
        let first = state.active().unwrap().kind;
        assert!(state.hold());

        let mut piece = state.active().unwrap();
        while piece.move_down(state.grid()) {}
        state.active = Some(piece);
        state.lock_active();
        assert!(!state.hold_used());

        state.update(TICK_SECS);
        let current = state.active().unwrap().kind;
        assert!(state.hold());
        assert_eq!(state.hold_piece(), Some(current));
        assert_eq!(state.active().unwrap().kind, first);
        assert_eq!(state.active().unwrap().y, -2);
    }

    #[test]
    fn test_lock_delay_resets_on_move() {
        let mut state = GameState::new(5);
        // Drop the piece onto the floor by hand
        let mut piece = state.active().unwrap();
        while piece.move_down(state.grid()) {}
        state.active = Some(piece);
        state.update(0.3);
        assert!(state.timers().lock_pending);
        assert!(state.apply_command(Command::MoveLeft));
        assert!(!state.timers().lock_pending);
        assert_eq!(state.timers().lock_ms, LOCK_DELAY_MS);
    }

    #[test]
    fn test_settings_overlay_pauses_and_blocks_input() {
        let mut state = GameState::new(1);
        assert!(state.apply_command(Command::ToggleSettings));
        assert!(state.settings_open());
        assert!(state.paused());
        assert!(!state.apply_command(Command::TogglePause));
        assert!(!state.apply_command(Command::MoveLeft));

        state.apply_command(Command::ToggleSettings);
        assert!(!state.settings_open());
        assert!(!state.paused());
    }

    #[test]
    fn test_settings_overlay_keeps_manual_pause() {
        let mut state = GameState::new(1);
        state.toggle_pause();
        state.toggle_settings();
        state.toggle_settings();
        assert!(state.paused());
    }

    #[test]
    fn test_classic_spawn_collision_is_game_over() {
        // No shape fits a single column
        let classic = Settings::default().with_mode(GameMode::ClassicRelax);
        let state = GameState::with_grid(1, classic, Grid::with_size(1, 6));
        assert!(state.game_over());
        assert!(state.paused());
        assert!(state.active().is_none());
        assert_eq!(state.phase(), Phase::GameOver);
    }

    #[test]
    fn test_zen_spawn_collision_suspends_rise() {
        let mut state = GameState::with_grid(1, Settings::default(), Grid::with_size(1, 6));
        assert!(!state.game_over());
        assert!(state.rise_suspended());
        assert_eq!(state.phase(), Phase::RiseSuspended);
        // Retried every update, never fatal
        state.update(TICK_SECS);
        assert!(state.active().is_none());
        assert!(!state.game_over());
    }

    #[test]
    fn test_classic_lock_overflow_is_game_over() {
        let mut state = GameState::with_settings(1, Settings::default().with_mode(GameMode::ClassicRelax));
        let rows = state.grid().rows() as i32;
        // A grounded column reaching into the hidden band
        for row in 1..rows {
            state.grid_mut().set(0, row, 8);
        }
        state.lock_active();
        assert!(state.game_over());
        assert!(state.take_last_event().unwrap().overflowed);
        assert!(!state.toggle_pause());
        assert_eq!(state.best_scores().classic_relax, state.score());
    }

    #[test]
    fn test_zen_lock_overflow_suspends_rise() {
        let mut state = GameState::new(1);
        let rows = state.grid().rows() as i32;
        for row in 1..rows {
            state.grid_mut().set(0, row, 8);
        }
        state.lock_active();
        assert!(state.take_last_event().unwrap().overflowed);
        assert!(state.rise_suspended());
        assert!(!state.game_over());
        assert_eq!(state.phase(), Phase::RiseSuspended);
    }

    #[test]
    fn test_game_over_lock_skips_rise_in_same_step() {
        let recorder = RecordingAudio::new();
        let mut state = GameState::with_settings(1, Settings::default().with_mode(GameMode::ClassicRelax))
            .with_audio(Box::new(recorder.clone()));
        let rows = state.grid().rows() as i32;
        for row in 1..rows {
            state.grid_mut().set(0, row, 8);
        }
        let mut piece = state.active().unwrap();
        while piece.move_down(state.grid()) {}
        state.active = Some(piece);
        // lock and rise both fall due in the next step
        state.timers.lock_pending = true;
        state.timers.lock_ms = 1.0;
        state.timers.rise_secs = 0.001;

        state.update(TICK_SECS);
        assert!(state.game_over());
        assert!(state.take_last_event().unwrap().overflowed);
        assert!(!recorder.cues().contains(&AudioCue::Rise));
        assert_eq!(state.rise_countdown(), 0.001);
        // a rise would have lifted the column into row 0
        assert_eq!(state.grid().get(0, 0), 0);
        assert_eq!(state.grid().get(0, 1), 8);
    }

    #[test]
    fn test_double_clear_delays_rise() {
        let mut state = GameState::new(3);
        let mut piece = Piece::new(ShapeKind::O, 0, -(HIDDEN_ROWS as i32));
        while piece.move_down(state.grid()) {}
        let cells = piece.cells();
        let rows = state.grid().rows() as i32;
        let cols = state.grid().cols() as i32;
        // two bottom rows, full except where the O lands
        for row in rows - 2..rows {
            for col in 0..cols {
                if !cells.contains(&(col, row)) {
                    state.grid_mut().set(col, row, 8);
                }
            }
        }
        state.active = Some(piece);
        let before = state.rise_countdown();

        state.lock_active();
        assert_eq!(state.take_last_event().unwrap().lines_cleared, 2);
        assert_eq!(state.rise_countdown(), before + RISE_DELAY_BONUS_SECS);
        assert!(state.grid().cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_zen_rise_overflow_suspends_until_clear() {
        let mut state = GameState::new(1);
        let rows = state.grid().rows() as i32;
        for row in 2..rows {
            state.grid_mut().set(0, row, 8);
        }
        state.timers.rise_secs = 0.001;
        state.update(TICK_SECS);
        assert!(state.rise_suspended());
        assert!(!state.game_over());

        state.grid_mut().clear();
        state.update(TICK_SECS);
        assert!(!state.rise_suspended());
        assert!(state.rise_countdown() >= 0.5);
    }

    #[test]
    fn test_rise_pushes_garbage_row() {
        let recorder = RecordingAudio::new();
        let mut state = GameState::new(2).with_audio(Box::new(recorder.clone()));
        run(&mut state, 6.1);
        let bottom = state.grid().rows() as i32 - 1;
        let cols = state.grid().cols() as i32;
        let garbage = (0..cols).filter(|&c| state.grid().get(c, bottom) == 8).count();
        assert!(garbage < cols as usize);
        assert!(recorder.cues().contains(&AudioCue::Rise));
        assert!(state.rise_countdown() > 5.0);
    }

    #[test]
    fn test_classic_difficulty_ramp() {
        let mut state = GameState::with_settings(1, Settings::default().with_mode(GameMode::ClassicRelax));
        state.timers.difficulty_secs = 89.99;
        state.update(0.02);
        assert_eq!(state.timers().difficulty_steps, 1);
        assert_eq!(state.rise_interval(), 5.5);
    }

    #[test]
    fn test_blob_round_trip() {
        let mut state = GameState::with_settings(77, Settings::default().with_hold(true));
        run(&mut state, 3.0);
        state.hold();
        state.grid_mut().set(3, 70, 5);
        let blob = state.to_blob();

        let (restored, recovered) = GameState::from_blob(&blob);
        assert_eq!(recovered, 0);
        assert_eq!(restored.grid().cells(), state.grid().cells());
        assert_eq!(restored.active(), state.active());
        assert_eq!(restored.hold_piece(), state.hold_piece());
        assert_eq!(restored.preview(), state.preview());
        assert_eq!(restored.score(), state.score());
        assert_eq!(restored.settings(), state.settings());
        assert_eq!(restored.to_blob(), blob);
    }

    #[test]
    fn test_blob_between_lock_and_spawn_round_trips() {
        let mut state = GameState::new(7);
        let mut piece = state.active().unwrap();
        while piece.move_down(state.grid()) {}
        state.active = Some(piece);
        state.lock_active();
        assert!(state.active().is_none());

        let blob = state.to_blob();
        assert_eq!(blob.active_type, None);
        let (mut restored, recovered) = GameState::from_blob(&blob);
        assert_eq!(recovered, 0);
        assert!(restored.active().is_none());
        assert_eq!(restored.phase(), Phase::Spawning);
        assert_eq!(restored.to_blob(), blob);

        // both spawn the same piece on the next step
        state.update(TICK_SECS);
        restored.update(TICK_SECS);
        assert!(restored.active().is_some());
        assert_eq!(restored.to_blob(), state.to_blob());
    }

    #[test]
    fn test_restore_recovers_bad_tokens() {
        let mut blob = GameState::new(4).to_blob();
        blob.hold_type = Some("Q".into());
        blob.next_queue = "T,nope,I".into();
        blob.rise_timer = f32::NAN;

        let mut state = GameState::new(1);
        let recovered = state.restore(&blob);
        assert_eq!(recovered, 3);
        assert_eq!(state.hold_piece(), None);
        assert_eq!(&state.preview()[..2], &[ShapeKind::T, ShapeKind::I]);
        assert_eq!(state.rise_countdown(), state.rise_interval());
    }
}
