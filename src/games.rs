use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The games the hub knows about. Scores are only accepted for these.
///
/// The wire form is lowercase without separators ("candycrush"); the
/// hyphen/underscore spellings the old web client used are accepted on
/// input and normalized here.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    Snake,
    Memory,
    Tetris,
    #[serde(alias = "candy-crush", alias = "candy_crush")]
    CandyCrush,
}

impl Game {
    pub const ALL: [Game; 4] = [Game::Snake, Game::Memory, Game::Tetris, Game::CandyCrush];

    pub fn as_str(&self) -> &'static str {
        match self {
            Game::Snake => "snake",
            Game::Memory => "memory",
            Game::Tetris => "tetris",
            Game::CandyCrush => "candycrush",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown game: {0}")]
pub struct UnknownGame(pub String);

impl FromStr for Game {
    type Err = UnknownGame;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "snake" => Ok(Game::Snake),
            "memory" => Ok(Game::Memory),
            "tetris" => Ok(Game::Tetris),
            "candycrush" | "candy-crush" | "candy_crush" => Ok(Game::CandyCrush),
            other => Err(UnknownGame(other.to_string())),
        }
    }
}
