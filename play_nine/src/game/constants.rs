//! Game-wide constants.

use super::entities::Value;

/// Number of cards in a full Play Nine deck.
pub const DECK_SIZE: usize = 108;

/// Cards dealt to each player at the start of a hole.
pub const HAND_SIZE: usize = 8;

/// A hand is laid out as two rows of this many columns.
pub const COLUMNS: usize = HAND_SIZE / 2;

/// Cards each player flips during the reveal phase.
pub const CARDS_TO_REVEAL: u8 = 2;

/// Holes (rounds) in a full game.
pub const FINAL_ROUND: u8 = 9;

pub const MIN_PLAYERS: usize = 2;

/// One card is turned up for the discard pile, so 107 cards remain for hands.
pub const MAX_PLAYERS: usize = (DECK_SIZE - 1) / HAND_SIZE;

/// Value reported to clients in place of a face-down card.
pub const FACE_DOWN_MASK: Value = -99;

/// How many discard pile cards clients get to see.
pub const VISIBLE_DISCARDS: usize = 2;

pub const MAX_NAME_LENGTH: usize = 20;

/// (value, copies) for every card in the deck.
///
/// -5 is the Hole-in-One, 0 is the Mulligan.
pub const DECK_COMPOSITION: [(Value, usize); 14] = [
    (-5, 4),
    (0, 8),
    (1, 8),
    (2, 8),
    (3, 8),
    (4, 8),
    (5, 8),
    (6, 8),
    (7, 8),
    (8, 8),
    (9, 8),
    (10, 8),
    (11, 8),
    (12, 8),
];
