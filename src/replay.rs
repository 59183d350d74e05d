//! Match recording and replay.
//!
//! Because the engine is 100% deterministic, a recording needs only:
//! - the match setup (id, seed, players, territories, config)
//! - the ordered list of accepted commands
//!
//! No state deltas needed. To view the match after command N, re-run the
//! setup and the first N commands.
//!
//! # Time Travel
//!
//! - **Forward**: Apply the next recorded command
//! - **Backward**: Re-run from the start to (`position` - 1)
//! - **Jump to N**: Re-run from the start to N

mod text;

pub use text::render_text;

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::GameConfig;
use crate::error::GameError;
use crate::game::{Command, GameFsm, GameState, PlayerId, PlayerSetup, TerritorySetup};

/// One accepted command and who sent it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedCommand {
    /// Acting player.
    pub player_id: PlayerId,
    /// The command.
    pub command: Command,
}

/// Minimal recording - setup plus command log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    /// Match id.
    pub match_id: String,
    /// Random seed.
    pub seed: u32,
    /// Lobby entries in seat order.
    pub players: Vec<PlayerSetup>,
    /// Map.
    pub territories: Vec<TerritorySetup>,
    /// Rules.
    pub config: GameConfig,
    /// Accepted commands, in order.
    pub commands: Vec<RecordedCommand>,
}

/// Error type for replay operations.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// Reading or writing the recording failed.
    #[error("recording file {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },
    /// The recording is not valid JSON.
    #[error("malformed recording: {0}")]
    Json(#[from] serde_json::Error),
    /// The recorded setup cannot start a match.
    #[error("recorded match cannot start: {0}")]
    Start(#[source] GameError),
    /// A recorded command was rejected on replay.
    #[error("replay diverged at command {index}: {error}")]
    Diverged {
        /// Position of the command in the log.
        index: usize,
        /// Why it was rejected.
        #[source]
        error: GameError,
    },
    /// Requested position is past the end of the log.
    #[error("position {requested} out of bounds (log has {total} commands)")]
    OutOfBounds {
        /// Requested position.
        requested: usize,
        /// Number of recorded commands.
        total: usize,
    },
}

impl Recording {
    /// Empty recording for a match setup.
    #[must_use]
    pub fn new(
        match_id: impl Into<String>,
        seed: u32,
        players: Vec<PlayerSetup>,
        territories: Vec<TerritorySetup>,
        config: GameConfig,
    ) -> Self {
        Self {
            match_id: match_id.into(),
            seed,
            players,
            territories,
            config,
            commands: Vec::new(),
        }
    }

    /// Append an accepted command.
    pub fn push(&mut self, player_id: impl Into<PlayerId>, command: Command) {
        self.commands.push(RecordedCommand {
            player_id: player_id.into(),
            command,
        });
    }

    /// Fresh, started match for this setup.
    ///
    /// # Errors
    ///
    /// [`ReplayError::Start`] if the setup cannot start.
    pub fn start(&self) -> Result<GameFsm, ReplayError> {
        let mut fsm = GameFsm::new(
            self.match_id.clone(),
            self.seed,
            &self.players,
            &self.territories,
            self.config.clone(),
        );
        fsm.start_game().map_err(ReplayError::Start)?;
        Ok(fsm)
    }

    /// Re-apply every recorded command.
    ///
    /// # Errors
    ///
    /// [`ReplayError::Diverged`] if any command is rejected.
    pub fn replay(&self) -> Result<GameFsm, ReplayError> {
        Ok(ReplayEngine::new_at(self.clone(), self.commands.len())?.into_fsm())
    }

    /// Save as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if file operations fail.
    pub fn save(&self, path: &Path) -> Result<(), ReplayError> {
        let file = File::create(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), self)?;
        Ok(())
    }

    /// Load a recording saved by [`Recording::save`].
    ///
    /// # Errors
    ///
    /// Returns an error if file operations fail or the JSON is invalid.
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let file = File::open(path).map_err(|source| ReplayError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

/// Replay engine - steps through a recorded match deterministically.
#[derive(Debug)]
pub struct ReplayEngine {
    recording: Recording,
    fsm: GameFsm,
    position: usize,
}

impl ReplayEngine {
    /// Engine positioned before the first command.
    ///
    /// # Errors
    ///
    /// [`ReplayError::Start`] if the setup cannot start.
    pub fn new(recording: Recording) -> Result<Self, ReplayError> {
        Self::new_at(recording, 0)
    }

    /// Engine positioned after `position` commands.
    ///
    /// # Errors
    ///
    /// [`ReplayError::OutOfBounds`], [`ReplayError::Start`] or
    /// [`ReplayError::Diverged`].
    pub fn new_at(recording: Recording, position: usize) -> Result<Self, ReplayError> {
        if position > recording.commands.len() {
            return Err(ReplayError::OutOfBounds {
                requested: position,
                total: recording.commands.len(),
            });
        }
        let fsm = recording.start()?;
        let mut engine = Self {
            recording,
            fsm,
            position: 0,
        };
        while engine.position < position {
            engine.step_forward()?;
        }
        Ok(engine)
    }

    /// The recording being replayed.
    #[must_use]
    pub const fn recording(&self) -> &Recording {
        &self.recording
    }

    /// Commands applied so far.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> &GameState {
        self.fsm.state()
    }

    /// Whether every recorded command has been applied.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.position == self.recording.commands.len()
    }

    /// Apply the next command.
    ///
    /// # Errors
    ///
    /// [`ReplayError::OutOfBounds`] at the end of the log,
    /// [`ReplayError::Diverged`] if the command is rejected.
    pub fn step_forward(&mut self) -> Result<(), ReplayError> {
        let index = self.position;
        let Some(recorded) = self.recording.commands.get(index) else {
            return Err(ReplayError::OutOfBounds {
                requested: index + 1,
                total: self.recording.commands.len(),
            });
        };
        self.fsm
            .apply(&recorded.player_id, recorded.command.clone())
            .map_err(|error| ReplayError::Diverged { index, error })?;
        self.position += 1;
        Ok(())
    }

    /// Step back one command by replaying from the start.
    ///
    /// # Errors
    ///
    /// [`ReplayError::OutOfBounds`] at position 0.
    pub fn step_backward(&mut self) -> Result<(), ReplayError> {
        if self.position == 0 {
            return Err(ReplayError::OutOfBounds {
                requested: 0,
                total: self.recording.commands.len(),
            });
        }
        self.goto(self.position - 1)
    }

    /// Jump to a position by replaying from the start.
    ///
    /// # Errors
    ///
    /// Same as [`ReplayEngine::new_at`].
    pub fn goto(&mut self, position: usize) -> Result<(), ReplayError> {
        let recording = self.recording.clone();
        *self = Self::new_at(recording, position)?;
        Ok(())
    }

    /// Render current state as text.
    #[must_use]
    pub fn render(&self) -> String {
        render_text(self.fsm.state())
    }

    /// Take the underlying match.
    #[must_use]
    pub fn into_fsm(self) -> GameFsm {
        self.fsm
    }
}
