use serde::{Deserialize, Serialize};

use super::card::Card;
use super::game::Game;
use crate::error::{Result, TcgSyncError};
use crate::validator::DeckValidator;

// ---------------------------------------------------------------------------
// Zone
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Zone {
    Main,
    Sideboard,
}

// ---------------------------------------------------------------------------
// ValidationState: cached result of the last validator run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ValidationState {
    #[default]
    Unvalidated,
    Valid,
    Invalid(Vec<String>),
}

impl ValidationState {
    pub fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            ValidationState::Valid
        } else {
            ValidationState::Invalid(errors)
        }
    }
}

// ---------------------------------------------------------------------------
// DeckCard
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct DeckCard {
    pub card: Card,
    pub quantity: u32,
    pub zone: Zone,
}

// ---------------------------------------------------------------------------
// Deck
// ---------------------------------------------------------------------------

/// A named card list for one game.
///
/// `game` is kept as the raw tag the deck was created with. Tags that do
/// not parse as a known [`Game`] get no rule checks from the validator.
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: String,
    pub name: String,
    pub game: String,
    pub format: Option<String>,
    pub cards: Vec<DeckCard>,
    pub validation: ValidationState,
}

impl Deck {
    pub fn new(name: &str, game: &str, format: Option<&str>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            game: game.to_string(),
            format: format.map(str::to_string),
            cards: Vec::new(),
            validation: ValidationState::Unvalidated,
        }
    }

    pub fn game_kind(&self) -> Option<Game> {
        Game::parse(&self.game).ok()
    }

    /// `true` only when the last validation passed.
    pub fn is_legal(&self) -> bool {
        matches!(self.validation, ValidationState::Valid)
    }

    pub fn validation_errors(&self) -> &[String] {
        match &self.validation {
            ValidationState::Invalid(errors) => errors,
            _ => &[],
        }
    }

    pub fn zone_count(&self, zone: Zone) -> u32 {
        self.cards
            .iter()
            .filter(|dc| dc.zone == zone)
            .fold(0u32, |total, dc| total.saturating_add(dc.quantity))
    }

    pub fn main_count(&self) -> u32 {
        self.zone_count(Zone::Main)
    }

    pub fn sideboard_count(&self) -> u32 {
        self.zone_count(Zone::Sideboard)
    }

    pub fn quantity_of(&self, card_id: &str, zone: Zone) -> u32 {
        self.cards
            .iter()
            .find(|dc| dc.card.id == card_id && dc.zone == zone)
            .map(|dc| dc.quantity)
            .unwrap_or(0)
    }

    /// Add copies of a card, merging into the existing row for the same zone.
    pub fn add_card(&mut self, card: &Card, quantity: u32, zone: Zone) -> Result<()> {
        if quantity == 0 {
            return Err(TcgSyncError::InvalidArgument(format!(
                "cannot add zero copies of '{}'",
                card.name
            )));
        }
        if let Some(game) = self.game_kind() {
            if card.game() != game {
                return Err(TcgSyncError::InvalidArgument(format!(
                    "cannot add {} card '{}' to a {} deck",
                    card.game(),
                    card.name,
                    game
                )));
            }
        }

        match self
            .cards
            .iter_mut()
            .find(|dc| dc.card.id == card.id && dc.zone == zone)
        {
            Some(row) => row.quantity = row.quantity.saturating_add(quantity),
            None => self.cards.push(DeckCard {
                card: card.clone(),
                quantity,
                zone,
            }),
        }
        self.validate();
        Ok(())
    }

    /// Remove copies of a card; the row disappears when its quantity hits zero.
    pub fn remove_card(&mut self, card_id: &str, quantity: u32, zone: Zone) -> Result<()> {
        let idx = self
            .cards
            .iter()
            .position(|dc| dc.card.id == card_id && dc.zone == zone)
            .ok_or_else(|| {
                TcgSyncError::NotFound(format!("card {} is not in the {:?} zone", card_id, zone))
            })?;

        let row = &mut self.cards[idx];
        row.quantity = row.quantity.saturating_sub(quantity);
        if row.quantity == 0 {
            self.cards.remove(idx);
        }
        self.validate();
        Ok(())
    }

    /// Overwrite the quantity of a card in a zone. Zero removes the row.
    pub fn set_quantity(&mut self, card: &Card, quantity: u32, zone: Zone) -> Result<()> {
        let current = self.quantity_of(&card.id, zone);
        if quantity > current {
            self.add_card(card, quantity - current, zone)
        } else if quantity < current {
            self.remove_card(&card.id, current - quantity, zone)
        } else {
            Ok(())
        }
    }

    /// Re-run the rules and store the outcome. Returns the current errors.
    pub fn validate(&mut self) -> &[String] {
        self.validation = ValidationState::from_errors(DeckValidator::validate(self));
        self.validation_errors()
    }
}
