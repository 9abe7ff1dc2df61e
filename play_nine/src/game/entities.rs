use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

use super::constants::{DECK_COMPOSITION, DECK_SIZE, MAX_NAME_LENGTH};

/// Placeholder for card values. Play Nine values run from -5 to 12.
pub type Value = i8;

/// Type alias for seat positions at the table. Seat order is turn order.
pub type SeatIndex = usize;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub value: Value,
    pub face_up: bool,
}

impl Card {
    pub fn face_down(value: Value) -> Self {
        Self {
            value,
            face_up: false,
        }
    }

    pub fn face_up(value: Value) -> Self {
        Self {
            value,
            face_up: true,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.face_up {
            write!(f, "{:>3}", self.value)
        } else {
            write!(f, "{:>3}", "##")
        }
    }
}

/// Build a freshly shuffled, face-down 108 card deck.
///
/// The top of the deck is the end of the returned vector.
pub fn build_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for (value, copies) in DECK_COMPOSITION {
        deck.extend(std::iter::repeat_n(Card::face_down(value), copies));
    }
    deck.shuffle(&mut rand::rng());
    deck
}

#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum NameError {
    #[error("Table name: lowercase letters, digits, -, _ only; max 20 characters")]
    InvalidTableName,
    #[error("Player name: letters, digits, space only; max 20 characters")]
    InvalidPlayerName,
}

/// Opaque player token handed out on join.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for PlayerId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for PlayerId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Table names double as storage keys, so they're restricted to
/// `[a-z0-9_-]{1,20}` after trimming and lower-casing.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableName(String);

impl TableName {
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let sanitized = s.trim().to_lowercase();
        let valid = !sanitized.is_empty()
            && sanitized.chars().count() <= MAX_NAME_LENGTH
            && sanitized
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_');
        if valid {
            Ok(Self(sanitized))
        } else {
            Err(NameError::InvalidTableName)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for TableName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TableName> for String {
    fn from(value: TableName) -> Self {
        value.0
    }
}

/// Display name of a seated player: `[A-Za-z0-9 ]{1,20}` after trimming.
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerName(String);

impl PlayerName {
    pub fn parse(s: &str) -> Result<Self, NameError> {
        let sanitized = s.trim();
        let valid = !sanitized.is_empty()
            && sanitized.chars().count() <= MAX_NAME_LENGTH
            && sanitized
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ' ');
        if valid {
            Ok(Self(sanitized.to_string()))
        } else {
            Err(NameError::InvalidPlayerName)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl TryFrom<String> for PlayerName {
    type Error = NameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PlayerName> for String {
    fn from(value: PlayerName) -> Self {
        value.0
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: PlayerName,
    /// Two rows of four; column `i` is `hand[i]` over `hand[i + 4]`.
    pub hand: Vec<Card>,
    /// Cards flipped during the reveal phase.
    pub revealed_count: u8,
}

impl Player {
    pub fn new(name: PlayerName) -> Self {
        Self {
            id: PlayerId::generate(),
            name,
            hand: Vec::new(),
            revealed_count: 0,
        }
    }

    /// A player has gone out once every card in a dealt hand is face-up.
    pub fn is_out(&self) -> bool {
        !self.hand.is_empty() && self.hand.iter().all(|card| card.face_up)
    }

    pub fn face_down_count(&self) -> usize {
        self.hand.iter().filter(|card| !card.face_up).count()
    }

    pub fn reveal_all(&mut self) {
        for card in &mut self.hand {
            card.face_up = true;
        }
    }
}

/// Where the card currently held by the active player came from.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DrawOrigin {
    Draw,
    Discard,
}

impl fmt::Display for DrawOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draw => write!(f, "draw"),
            Self::Discard => write!(f, "discard"),
        }
    }
}

/// Player actions accepted by a table.
///
/// The serde representation is the wire format: `{"type": "reveal", "card_index": 3}`.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Start,
    Reveal { card_index: usize },
    DrawFromDraw,
    DrawFromDiscard,
    PlayReplace { card_index: usize },
    PlayDiscardFlip { card_index: usize },
    PlayDiscardOnly,
    PlayPutBack,
    PlayFlipAfterDiscard { card_index: usize },
    AdvanceScoring,
    Restart,
    Leave,
}

impl Action {
    /// Every `type` tag the enum accepts.
    pub const TAGS: [&'static str; 12] = [
        "start",
        "reveal",
        "draw_from_draw",
        "draw_from_discard",
        "play_replace",
        "play_discard_flip",
        "play_discard_only",
        "play_put_back",
        "play_flip_after_discard",
        "advance_scoring",
        "restart",
        "leave",
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Reveal { .. } => "reveal",
            Self::DrawFromDraw => "draw_from_draw",
            Self::DrawFromDiscard => "draw_from_discard",
            Self::PlayReplace { .. } => "play_replace",
            Self::PlayDiscardFlip { .. } => "play_discard_flip",
            Self::PlayDiscardOnly => "play_discard_only",
            Self::PlayPutBack => "play_put_back",
            Self::PlayFlipAfterDiscard { .. } => "play_flip_after_discard",
            Self::AdvanceScoring => "advance_scoring",
            Self::Restart => "restart",
            Self::Leave => "leave",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Reveal { card_index }
            | Self::PlayReplace { card_index }
            | Self::PlayDiscardFlip { card_index }
            | Self::PlayFlipAfterDiscard { card_index } => {
                write!(f, "{} #{card_index}", self.tag())
            }
            _ => write!(f, "{}", self.tag()),
        }
    }
}
