//! Hand scoring.
//!
//! A hand is two rows of four cards; column `i` pairs `hand[i]` with
//! `hand[i + 4]`. Matching columns cancel out (a pair of Hole-in-Ones is
//! worth -10), and several matching columns of the same value earn a bonus.

use std::collections::HashMap;

use super::{
    constants::{COLUMNS, HAND_SIZE},
    entities::{Card, Value},
};

const HOLE_IN_ONE: Value = -5;
const HOLE_IN_ONE_PAIR_SCORE: i32 = -10;
const TWO_PAIR_BONUS: i32 = -10;
const THREE_PAIR_BONUS: i32 = -15;

/// Score a hand. Lower is better.
///
/// Anything other than a full eight card hand scores only its face-up cards.
pub fn score_hand(hand: &[Card]) -> i32 {
    if hand.len() != HAND_SIZE {
        return hand
            .iter()
            .filter(|card| card.face_up)
            .map(|card| i32::from(card.value))
            .sum();
    }

    let mut total = 0;
    let mut pairs: HashMap<Value, usize> = HashMap::new();
    for col in 0..COLUMNS {
        let (top, bottom) = (hand[col].value, hand[col + COLUMNS].value);
        if top == bottom {
            *pairs.entry(top).or_default() += 1;
            if top == HOLE_IN_ONE {
                total += HOLE_IN_ONE_PAIR_SCORE;
            }
        } else {
            total += i32::from(top) + i32::from(bottom);
        }
    }

    total + pair_bonus(pairs.values().copied().max().unwrap_or(0))
}

fn pair_bonus(max_same: usize) -> i32 {
    match max_same {
        0 | 1 => 0,
        2 => TWO_PAIR_BONUS,
        _ => THREE_PAIR_BONUS,
    }
}
