//! Play Nine table state machine.
//!
//! A [`Table`] is the authoritative record for one table. Every operation
//! validates before it mutates, so a returned [`GameError`] means the table
//! is untouched.

use log::debug;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};
use thiserror::Error;

use super::{
    constants::{CARDS_TO_REVEAL, FINAL_ROUND, HAND_SIZE, MAX_PLAYERS, MIN_PLAYERS},
    entities::{Action, Card, DrawOrigin, Player, PlayerId, PlayerName, SeatIndex, TableName, build_deck},
    scoring::score_hand,
};

/// Errors returned by table operations. The display strings are sent to
/// the acting player as-is.
#[derive(Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("Game already started")]
    AlreadyStarted,
    #[error("Need at least 2 players")]
    NotEnoughPlayers,
    #[error("Not in reveal phase")]
    NotInRevealPhase,
    #[error("Not a player")]
    NotAPlayer,
    #[error("Already revealed 2 cards")]
    AlreadyRevealedTwo,
    #[error("Invalid card index")]
    InvalidCardIndex,
    #[error("Card already face-up")]
    AlreadyFaceUp,
    #[error("Not in play phase")]
    NotPlayPhase,
    #[error("Not your turn")]
    NotYourTurn,
    #[error("Already drew")]
    AlreadyDrew,
    #[error("{0} pile empty")]
    PileEmpty(DrawOrigin),
    #[error("No card drawn")]
    NoCardDrawn,
    #[error("No flip required")]
    NoFlipRequired,
    #[error("Can only put back when drawn from discard")]
    CannotPutBack,
    #[error("Cannot discard back to discard pile when drawn from discard")]
    CannotDiscardOnly,
    #[error("Not in scoring phase")]
    NotScoringPhase,
    #[error("Game in progress; join once it is back in the waiting room")]
    GameInProgress,
    #[error("Table is full")]
    TableFull,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Waiting,
    Reveal,
    Play,
    Scoring,
}

impl Phase {
    /// Cards are dealt in every phase but `Waiting`.
    pub fn is_round_active(&self) -> bool {
        !matches!(self, Self::Waiting)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Waiting => "waiting",
            Self::Reveal => "reveal",
            Self::Play => "play",
            Self::Scoring => "scoring",
        };
        write!(f, "{repr}")
    }
}

/// The card the current player is holding, if any.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DrawState {
    #[default]
    NoDrawPending,
    DrawPending { card: Card, origin: DrawOrigin },
}

/// Tracks the final lap after someone goes out.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum HoleEnd {
    #[default]
    NoHoleEnd,
    InProgress {
        finisher: SeatIndex,
        /// Seats still owed a final turn, in turn order. Never contains the finisher.
        remaining: Vec<SeatIndex>,
    },
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Table {
    pub name: TableName,
    /// Seat order is turn order.
    pub players: Vec<Player>,
    #[serde(default)]
    pub phase: Phase,
    #[serde(default)]
    pub round_num: u8,
    #[serde(default)]
    pub current_player_idx: SeatIndex,
    /// Top of the pile is the last element.
    #[serde(default)]
    pub draw_pile: Vec<Card>,
    /// Top of the pile is the last element.
    #[serde(default)]
    pub discard_pile: Vec<Card>,
    #[serde(default)]
    pub dealer_idx: SeatIndex,
    #[serde(default)]
    pub scores: BTreeMap<PlayerId, i32>,
    #[serde(default)]
    pub round_scores: BTreeMap<PlayerId, i32>,
    #[serde(default)]
    pub draw: DrawState,
    #[serde(default)]
    pub must_flip_after_discard: bool,
    #[serde(default)]
    pub hole_end: HoleEnd,
}

impl Table {
    pub fn new(name: TableName) -> Self {
        Self {
            name,
            players: Vec::new(),
            phase: Phase::Waiting,
            round_num: 0,
            current_player_idx: 0,
            draw_pile: Vec::new(),
            discard_pile: Vec::new(),
            dealer_idx: 0,
            scores: BTreeMap::new(),
            round_scores: BTreeMap::new(),
            draw: DrawState::NoDrawPending,
            must_flip_after_discard: false,
            hole_end: HoleEnd::NoHoleEnd,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn seat_of(&self, player_id: &PlayerId) -> Option<SeatIndex> {
        self.players.iter().position(|p| &p.id == player_id)
    }

    pub fn find_player_by_name(&self, name: &PlayerName) -> Option<&Player> {
        self.players.iter().find(|p| &p.name == name)
    }

    pub fn drawn_card(&self) -> Option<(Card, DrawOrigin)> {
        match self.draw {
            DrawState::NoDrawPending => None,
            DrawState::DrawPending { card, origin } => Some((card, origin)),
        }
    }

    /// Total cards across piles, hands, and the held drawn card.
    pub fn card_count(&self) -> usize {
        self.draw_pile.len()
            + self.discard_pile.len()
            + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
            + usize::from(self.drawn_card().is_some())
    }

    /// Clear everything but the name.
    pub fn reset_to_empty(&mut self) {
        self.players.clear();
        self.return_to_waiting();
    }

    /// Seat a new player. New players can only be seated in the waiting room.
    pub fn add_player(&mut self, name: PlayerName) -> Result<PlayerId, GameError> {
        if self.phase != Phase::Waiting {
            return Err(GameError::GameInProgress);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::TableFull);
        }
        let player = Player::new(name);
        let id = player.id.clone();
        debug!("{}: {} joined as {id}", self.name, player.name);
        self.players.push(player);
        Ok(id)
    }

    /// Remove a player, keeping every index and pile consistent.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Result<Player, GameError> {
        let seat = self.seat_of(player_id).ok_or(GameError::NotAPlayer)?;
        let mut leaver = self.players.remove(seat);
        self.scores.remove(player_id);
        self.round_scores.remove(player_id);
        debug!("{}: {} left from seat {seat}", self.name, leaver.name);

        let n = self.players.len();
        if n == 0 {
            self.reset_to_empty();
            return Ok(leaver);
        }

        let remap = |s: SeatIndex| if s > seat { s - 1 } else { s };
        let dealer = if self.dealer_idx == seat {
            (seat + n - 1) % n
        } else {
            remap(self.dealer_idx)
        };

        if !self.phase.is_round_active() {
            self.dealer_idx = dealer.min(n - 1);
            self.current_player_idx = remap(self.current_player_idx).min(n - 1);
            return Ok(leaver);
        }
        if n < MIN_PLAYERS {
            self.return_to_waiting();
            return Ok(leaver);
        }

        // The leaver's cards go face-down under the draw pile.
        let returned: Vec<Card> = leaver.hand.drain(..).map(|c| Card::face_down(c.value)).collect();
        self.draw_pile.splice(0..0, returned);

        let was_turn = self.current_player_idx == seat;
        if was_turn {
            if let DrawState::DrawPending { card, .. } = std::mem::take(&mut self.draw) {
                self.discard_pile.push(Card::face_up(card.value));
            }
            self.must_flip_after_discard = false;
        }
        self.dealer_idx = dealer;
        self.current_player_idx = if was_turn { seat % n } else { remap(self.current_player_idx) };

        match std::mem::take(&mut self.hole_end) {
            HoleEnd::NoHoleEnd => {}
            HoleEnd::InProgress { finisher, .. } if finisher == seat => self.finish_hole(),
            HoleEnd::InProgress { finisher, remaining } => {
                let remaining: Vec<SeatIndex> = remaining
                    .into_iter()
                    .filter(|&s| s != seat)
                    .map(remap)
                    .collect();
                match remaining.first() {
                    None => self.finish_hole(),
                    Some(&next) => {
                        if was_turn {
                            self.current_player_idx = next;
                        }
                        self.hole_end = HoleEnd::InProgress {
                            finisher: remap(finisher),
                            remaining,
                        };
                    }
                }
            }
        }

        if self.phase == Phase::Reveal && self.everyone_revealed() {
            self.phase = Phase::Play;
        }
        Ok(leaver)
    }

    pub fn start(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        self.deal_first_round();
        Ok(())
    }

    /// Abandon the current game and deal round one again.
    pub fn restart(&mut self) -> Result<(), GameError> {
        if self.players.len() < MIN_PLAYERS {
            return Err(GameError::NotEnoughPlayers);
        }
        self.scores.clear();
        self.round_scores.clear();
        self.deal_first_round();
        Ok(())
    }

    pub fn reveal(&mut self, player_id: &PlayerId, card_index: usize) -> Result<(), GameError> {
        if self.phase != Phase::Reveal {
            return Err(GameError::NotInRevealPhase);
        }
        let seat = self.seat_of(player_id).ok_or(GameError::NotAPlayer)?;
        let player = &mut self.players[seat];
        if player.revealed_count >= CARDS_TO_REVEAL {
            return Err(GameError::AlreadyRevealedTwo);
        }
        let card = player
            .hand
            .get_mut(card_index)
            .ok_or(GameError::InvalidCardIndex)?;
        if card.face_up {
            return Err(GameError::AlreadyFaceUp);
        }
        card.face_up = true;
        player.revealed_count += 1;

        if self.everyone_revealed() {
            debug!("{}: everyone revealed, round {} in play", self.name, self.round_num);
            self.phase = Phase::Play;
        }
        Ok(())
    }

    pub fn draw_from_draw_pile(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        self.draw_from(player_id, DrawOrigin::Draw)
    }

    pub fn draw_from_discard_pile(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        self.draw_from(player_id, DrawOrigin::Discard)
    }

    /// Swap the drawn card into the hand; the displaced card is discarded.
    pub fn play_replace(&mut self, player_id: &PlayerId, card_index: usize) -> Result<(), GameError> {
        let seat = self.acting_seat(player_id)?;
        let (card, _) = self.drawn_card().ok_or(GameError::NoCardDrawn)?;
        if card_index >= HAND_SIZE || card_index >= self.players[seat].hand.len() {
            return Err(GameError::InvalidCardIndex);
        }

        let old = std::mem::replace(&mut self.players[seat].hand[card_index], Card::face_up(card.value));
        self.discard_pile.push(Card::face_up(old.value));
        self.draw = DrawState::NoDrawPending;
        self.end_turn(seat);
        Ok(())
    }

    /// Discard the drawn card and flip one of the hand's face-down cards.
    pub fn play_discard_flip(&mut self, player_id: &PlayerId, card_index: usize) -> Result<(), GameError> {
        let seat = self.acting_seat(player_id)?;
        let (card, _) = self.drawn_card().ok_or(GameError::NoCardDrawn)?;
        let target = self.players[seat]
            .hand
            .get(card_index)
            .ok_or(GameError::InvalidCardIndex)?;
        if target.face_up {
            return Err(GameError::AlreadyFaceUp);
        }

        self.discard_pile.push(Card::face_up(card.value));
        self.draw = DrawState::NoDrawPending;
        self.players[seat].hand[card_index].face_up = true;
        self.end_turn(seat);
        Ok(())
    }

    /// The flip owed after [`Table::play_discard_only`].
    pub fn play_flip_after_discard(&mut self, player_id: &PlayerId, card_index: usize) -> Result<(), GameError> {
        if self.phase != Phase::Play {
            return Err(GameError::NotPlayPhase);
        }
        if !self.must_flip_after_discard {
            return Err(GameError::NoFlipRequired);
        }
        let seat = self.acting_seat(player_id)?;
        let card = self.players[seat]
            .hand
            .get_mut(card_index)
            .ok_or(GameError::InvalidCardIndex)?;
        if card.face_up {
            return Err(GameError::AlreadyFaceUp);
        }

        card.face_up = true;
        self.must_flip_after_discard = false;
        self.end_turn(seat);
        Ok(())
    }

    /// Return a card taken from the discard pile. The turn continues.
    pub fn play_put_back(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        self.acting_seat(player_id)?;
        match self.drawn_card() {
            None => Err(GameError::NoCardDrawn),
            Some((_, DrawOrigin::Draw)) => Err(GameError::CannotPutBack),
            Some((card, DrawOrigin::Discard)) => {
                self.discard_pile.push(card);
                self.draw = DrawState::NoDrawPending;
                Ok(())
            }
        }
    }

    /// Discard a card taken from the draw pile without using it.
    ///
    /// With two or more face-down cards left the player then owes a flip;
    /// otherwise the turn passes.
    pub fn play_discard_only(&mut self, player_id: &PlayerId) -> Result<(), GameError> {
        let seat = self.acting_seat(player_id)?;
        let card = match self.drawn_card() {
            None => return Err(GameError::NoCardDrawn),
            Some((_, DrawOrigin::Discard)) => return Err(GameError::CannotDiscardOnly),
            Some((card, DrawOrigin::Draw)) => card,
        };

        self.discard_pile.push(card);
        self.draw = DrawState::NoDrawPending;
        if self.players[seat].face_down_count() >= 2 {
            self.must_flip_after_discard = true;
        } else {
            self.advance_turn();
        }
        Ok(())
    }

    /// Leave the scoring screen: deal the next hole, or end the game after the ninth.
    pub fn advance_from_scoring(&mut self) -> Result<(), GameError> {
        if self.phase != Phase::Scoring {
            return Err(GameError::NotScoringPhase);
        }
        if self.round_num >= FINAL_ROUND {
            debug!("{}: game over", self.name);
            self.return_to_waiting();
            return Ok(());
        }

        let n = self.players.len();
        self.round_scores.clear();
        self.deal_round(self.round_num + 1);
        self.dealer_idx = (self.dealer_idx + 1) % n;
        self.current_player_idx = (self.dealer_idx + 1) % n;
        Ok(())
    }

    /// Apply an action on behalf of a seated player.
    pub fn apply(&mut self, player_id: &PlayerId, action: Action) -> Result<(), GameError> {
        match action {
            Action::Start => {
                self.require_seat(player_id)?;
                self.start()
            }
            Action::Reveal { card_index } => self.reveal(player_id, card_index),
            Action::DrawFromDraw => self.draw_from_draw_pile(player_id),
            Action::DrawFromDiscard => self.draw_from_discard_pile(player_id),
            Action::PlayReplace { card_index } => self.play_replace(player_id, card_index),
            Action::PlayDiscardFlip { card_index } => self.play_discard_flip(player_id, card_index),
            Action::PlayDiscardOnly => self.play_discard_only(player_id),
            Action::PlayPutBack => self.play_put_back(player_id),
            Action::PlayFlipAfterDiscard { card_index } => {
                self.play_flip_after_discard(player_id, card_index)
            }
            Action::AdvanceScoring => {
                self.require_seat(player_id)?;
                self.advance_from_scoring()
            }
            Action::Restart => {
                self.require_seat(player_id)?;
                self.restart()
            }
            Action::Leave => self.remove_player(player_id).map(|_| ()),
        }
    }

    fn require_seat(&self, player_id: &PlayerId) -> Result<SeatIndex, GameError> {
        self.seat_of(player_id).ok_or(GameError::NotAPlayer)
    }

    /// Seat of the player whose turn it is, in the play phase.
    fn acting_seat(&self, player_id: &PlayerId) -> Result<SeatIndex, GameError> {
        if self.phase != Phase::Play {
            return Err(GameError::NotPlayPhase);
        }
        let seat = self.require_seat(player_id)?;
        if seat != self.current_player_idx {
            return Err(GameError::NotYourTurn);
        }
        Ok(seat)
    }

    fn draw_from(&mut self, player_id: &PlayerId, origin: DrawOrigin) -> Result<(), GameError> {
        self.acting_seat(player_id)?;
        if self.drawn_card().is_some() || self.must_flip_after_discard {
            return Err(GameError::AlreadyDrew);
        }
        let pile = match origin {
            DrawOrigin::Draw => &mut self.draw_pile,
            DrawOrigin::Discard => &mut self.discard_pile,
        };
        let card = pile.pop().ok_or(GameError::PileEmpty(origin))?;
        self.draw = DrawState::DrawPending {
            card: Card::face_up(card.value),
            origin,
        };
        Ok(())
    }

    fn everyone_revealed(&self) -> bool {
        self.players
            .iter()
            .all(|p| p.revealed_count >= CARDS_TO_REVEAL)
    }

    fn deal_first_round(&mut self) {
        self.deal_round(1);
        self.dealer_idx = self.players.len() - 1;
        self.current_player_idx = 0;
    }

    /// Fresh deck, eight cards each, one card turned up to start the discard pile.
    fn deal_round(&mut self, round_num: u8) {
        let mut deck = build_deck();
        for player in &mut self.players {
            let at = deck.len() - HAND_SIZE;
            player.hand = deck.split_off(at);
            player.revealed_count = 0;
        }
        let top = deck.pop().map(|c| Card::face_up(c.value));
        self.draw_pile = deck;
        self.discard_pile = top.into_iter().collect();
        self.draw = DrawState::NoDrawPending;
        self.must_flip_after_discard = false;
        self.hole_end = HoleEnd::NoHoleEnd;
        self.round_num = round_num;
        self.phase = Phase::Reveal;
        debug!("{}: dealt round {round_num}", self.name);
    }

    /// Called after a turn-ending play by `seat`.
    fn end_turn(&mut self, seat: SeatIndex) {
        let went_out = self.players[seat].is_out();
        if !went_out || self.hole_end != HoleEnd::NoHoleEnd {
            self.advance_turn();
            return;
        }

        let n = self.players.len();
        let remaining: Vec<SeatIndex> = (1..n)
            .map(|offset| (seat + offset) % n)
            .filter(|&s| !self.players[s].is_out())
            .collect();
        debug!("{}: {} went out, final turns for {remaining:?}", self.name, self.players[seat].name);
        match remaining.first() {
            None => self.finish_hole(),
            Some(&next) => {
                self.current_player_idx = next;
                self.hole_end = HoleEnd::InProgress {
                    finisher: seat,
                    remaining,
                };
            }
        }
    }

    fn advance_turn(&mut self) {
        let n = self.players.len();
        let remaining = match &mut self.hole_end {
            HoleEnd::NoHoleEnd => {
                self.current_player_idx = (self.current_player_idx + 1) % n;
                return;
            }
            HoleEnd::InProgress { remaining, .. } => remaining,
        };

        let just_played = self.current_player_idx;
        remaining.retain(|&s| s != just_played);
        let next = remaining.first().copied();
        self.players[just_played].reveal_all();
        match next {
            Some(next) => self.current_player_idx = next,
            None => self.finish_hole(),
        }
    }

    fn finish_hole(&mut self) {
        for player in &mut self.players {
            player.reveal_all();
        }
        self.round_scores = self
            .players
            .iter()
            .map(|p| (p.id.clone(), score_hand(&p.hand)))
            .collect();
        for (id, score) in &self.round_scores {
            *self.scores.entry(id.clone()).or_default() += score;
        }
        self.phase = Phase::Scoring;
        self.draw = DrawState::NoDrawPending;
        self.must_flip_after_discard = false;
        self.hole_end = HoleEnd::NoHoleEnd;
        debug!("{}: round {} scored {:?}", self.name, self.round_num, self.round_scores);
    }

    /// Back to the waiting room with players kept and everything else cleared.
    fn return_to_waiting(&mut self) {
        for player in &mut self.players {
            player.hand.clear();
            player.revealed_count = 0;
        }
        self.phase = Phase::Waiting;
        self.round_num = 0;
        self.current_player_idx = 0;
        self.dealer_idx = 0;
        self.draw_pile.clear();
        self.discard_pile.clear();
        self.scores.clear();
        self.round_scores.clear();
        self.draw = DrawState::NoDrawPending;
        self.must_flip_after_discard = false;
        self.hole_end = HoleEnd::NoHoleEnd;
    }
}
