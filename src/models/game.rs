use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TcgSyncError};

// ---------------------------------------------------------------------------
// Game: discriminator shared by cards, decks and cache keys
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Game {
    Mtg,
    Pokemon,
    #[serde(rename = "onepiece")]
    OnePiece,
}

impl Game {
    pub const ALL: [Game; 3] = [Game::Mtg, Game::Pokemon, Game::OnePiece];

    /// Parse a game tag, accepting canonical and alias spellings in any case.
    pub fn parse(tag: &str) -> Result<Game> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "mtg" | "magic" => Ok(Game::Mtg),
            "pokemon" | "ptcg" => Ok(Game::Pokemon),
            "onepiece" | "opcg" => Ok(Game::OnePiece),
            _ => Err(TcgSyncError::UnknownGameKind(tag.to_string())),
        }
    }

    /// Canonical lowercase tag, as stored in the discriminator column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Game::Mtg => "mtg",
            Game::Pokemon => "pokemon",
            Game::OnePiece => "onepiece",
        }
    }
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Game {
    type Err = TcgSyncError;

    fn from_str(s: &str) -> Result<Self> {
        Game::parse(s)
    }
}

// ---------------------------------------------------------------------------
// NaturalKey: (game, set, number) identity independent of the opaque id
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NaturalKey {
    pub game: Game,
    pub set_code: String,
    pub number: String,
}

impl NaturalKey {
    pub fn new(game: Game, set_code: &str, number: &str) -> Self {
        let mut set_code = set_code.trim().to_string();
        let mut number = number.trim().to_string();
        if game == Game::OnePiece {
            // OPTCG spells set ids with a dash ("OP-01"); stored cards use "OP01".
            set_code.retain(|c| c != '-');
            // Numbers are often quoted in printed form, e.g. "OP01-001".
            if let Some((prefix, rest)) = number.rsplit_once('-') {
                if prefix.replace('-', "").eq_ignore_ascii_case(&set_code) {
                    number = rest.to_string();
                }
            }
        }
        Self {
            game,
            set_code,
            number,
        }
    }

    /// Lowercase `"{game}:{setCode}:{number}"`.
    pub fn cache_key(&self) -> String {
        format!("{}:{}:{}", self.game.as_str(), self.set_code, self.number).to_lowercase()
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.game, self.set_code, self.number)
    }
}
