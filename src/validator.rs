//! Per-game deck legality rules.
//!
//! Validation is a pure function of the deck's card rows. It never fails;
//! every violated rule contributes one human-readable message.

use crate::models::{Deck, DeckCard, Game, Zone};

pub const MAX_COPIES: u32 = 4;

pub const MTG_MIN_MAIN: u32 = 60;
pub const MTG_COMMANDER_MAIN: u32 = 100;
pub const MTG_MAX_SIDEBOARD: u32 = 15;
pub const POKEMON_MAIN: u32 = 60;
pub const ONEPIECE_MAIN: u32 = 50;
pub const ONEPIECE_LEADERS: u32 = 1;

pub struct DeckValidator;

impl DeckValidator {
    /// Check a deck against the rules for its game.
    ///
    /// Returns the list of violations; empty means legal. A deck whose game
    /// tag is not recognized gets no checks at all and is reported legal.
    pub fn validate(deck: &Deck) -> Vec<String> {
        let mut errors = Vec::new();
        match deck.game_kind() {
            Some(Game::Mtg) => validate_mtg(deck, &mut errors),
            Some(Game::Pokemon) => validate_pokemon(deck, &mut errors),
            Some(Game::OnePiece) => validate_onepiece(deck, &mut errors),
            None => {
                tracing::debug!(deck = %deck.id, game = %deck.game, "no rules for game; deck treated as legal");
            }
        }
        errors
    }
}

fn is_commander(deck: &Deck) -> bool {
    deck.format
        .as_deref()
        .is_some_and(|f| f.eq_ignore_ascii_case("Commander"))
}

fn validate_mtg(deck: &Deck, errors: &mut Vec<String>) {
    let main = deck.main_count();
    if is_commander(deck) {
        if main != MTG_COMMANDER_MAIN {
            errors.push(format!(
                "Commander decks must contain exactly {} cards in the main deck (found {})",
                MTG_COMMANDER_MAIN, main
            ));
        }
    } else if main < MTG_MIN_MAIN {
        errors.push(format!(
            "Main deck must contain at least {} cards (found {})",
            MTG_MIN_MAIN, main
        ));
    }

    let sideboard = deck.sideboard_count();
    if sideboard > MTG_MAX_SIDEBOARD {
        errors.push(format!(
            "Sideboard may contain at most {} cards (found {})",
            MTG_MAX_SIDEBOARD, sideboard
        ));
    }

    for row in rows_in(deck, Zone::Main) {
        if !row.card.is_basic_land() && row.quantity > MAX_COPIES {
            errors.push(too_many_copies(row));
        }
    }
}

fn validate_pokemon(deck: &Deck, errors: &mut Vec<String>) {
    let main = deck.main_count();
    if main != POKEMON_MAIN {
        errors.push(format!(
            "Deck must contain exactly {} cards (found {})",
            POKEMON_MAIN, main
        ));
    }

    for row in &deck.cards {
        if !row.card.is_basic_energy() && row.quantity > MAX_COPIES {
            errors.push(too_many_copies(row));
        }
    }
}

fn validate_onepiece(deck: &Deck, errors: &mut Vec<String>) {
    let main = deck.main_count();
    if main != ONEPIECE_MAIN {
        errors.push(format!(
            "Deck must contain exactly {} cards (found {})",
            ONEPIECE_MAIN, main
        ));
    }

    let leaders = deck
        .cards
        .iter()
        .filter(|row| row.card.is_leader())
        .fold(0u32, |total, row| total.saturating_add(row.quantity));
    if leaders != ONEPIECE_LEADERS {
        errors.push(format!(
            "Deck must contain exactly {} Leader card (found {})",
            ONEPIECE_LEADERS, leaders
        ));
    }

    for row in &deck.cards {
        if row.quantity > MAX_COPIES {
            errors.push(too_many_copies(row));
        }
    }
}

fn rows_in(deck: &Deck, zone: Zone) -> impl Iterator<Item = &DeckCard> {
    deck.cards.iter().filter(move |row| row.zone == zone)
}

fn too_many_copies(row: &DeckCard) -> String {
    format!(
        "Too many copies of {}: {} (maximum {})",
        row.card.name, row.quantity, MAX_COPIES
    )
}
