//! Redacted, client-facing projection of a [`Table`].

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::{
    constants::{DECK_SIZE, FACE_DOWN_MASK, VISIBLE_DISCARDS},
    entities::{Card, DrawOrigin, Player, PlayerId, PlayerName, SeatIndex, TableName, Value},
    state_machine::{HoleEnd, Phase, Table},
};

/// Phase as seen by clients; a table nobody sits at is `empty`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewPhase {
    Empty,
    Waiting,
    Reveal,
    Play,
    Scoring,
}

impl From<Phase> for ViewPhase {
    fn from(value: Phase) -> Self {
        match value {
            Phase::Waiting => Self::Waiting,
            Phase::Reveal => Self::Reveal,
            Phase::Play => Self::Play,
            Phase::Scoring => Self::Scoring,
        }
    }
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PublicCard {
    pub value: Value,
    pub face_up: bool,
}

impl From<&Card> for PublicCard {
    fn from(card: &Card) -> Self {
        Self {
            value: if card.face_up { card.value } else { FACE_DOWN_MASK },
            face_up: card.face_up,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub name: PlayerName,
    pub hand: Vec<PublicCard>,
    pub revealed_count: u8,
}

impl From<&Player> for PlayerView {
    fn from(player: &Player) -> Self {
        Self {
            id: player.id.clone(),
            name: player.name.clone(),
            hand: player.hand.iter().map(PublicCard::from).collect(),
            revealed_count: player.revealed_count,
        }
    }
}

/// What every viewer of a table receives. Never contains a face-down value.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct TableView {
    pub name: TableName,
    pub players: Vec<PlayerView>,
    pub phase: ViewPhase,
    pub round_num: u8,
    pub current_player_idx: SeatIndex,
    pub draw_pile_count: usize,
    pub discard_pile_count: usize,
    /// Most recent first.
    pub discard_pile_top: Vec<Value>,
    pub dealer_idx: SeatIndex,
    pub scores: BTreeMap<PlayerId, i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_card: Option<PublicCard>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub drawn_from: Option<DrawOrigin>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub must_flip_after_discard: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole_ended_by: Option<SeatIndex>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub final_turns_remaining: Vec<SeatIndex>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub round_scores: BTreeMap<PlayerId, i32>,
    #[serde(default)]
    pub active_player_ids: BTreeSet<PlayerId>,
}

impl TableView {
    /// View of a table nobody has joined yet.
    pub fn empty(name: TableName) -> Self {
        Self {
            name,
            players: Vec::new(),
            phase: ViewPhase::Empty,
            round_num: 0,
            current_player_idx: 0,
            draw_pile_count: DECK_SIZE,
            discard_pile_count: 0,
            discard_pile_top: Vec::new(),
            dealer_idx: 0,
            scores: BTreeMap::new(),
            drawn_card: None,
            drawn_from: None,
            must_flip_after_discard: false,
            hole_ended_by: None,
            final_turns_remaining: Vec::new(),
            round_scores: BTreeMap::new(),
            active_player_ids: BTreeSet::new(),
        }
    }

    pub fn with_active_players(mut self, active: BTreeSet<PlayerId>) -> Self {
        self.active_player_ids = active;
        self
    }
}

impl From<&Table> for TableView {
    fn from(table: &Table) -> Self {
        if table.is_empty() {
            return Self::empty(table.name.clone());
        }

        let drawn = table.drawn_card();
        let (hole_ended_by, final_turns_remaining) = match &table.hole_end {
            HoleEnd::NoHoleEnd => (None, Vec::new()),
            HoleEnd::InProgress {
                finisher,
                remaining,
            } => (Some(*finisher), remaining.clone()),
        };

        Self {
            name: table.name.clone(),
            players: table.players.iter().map(PlayerView::from).collect(),
            phase: table.phase.into(),
            round_num: table.round_num,
            current_player_idx: table.current_player_idx,
            draw_pile_count: table.draw_pile.len(),
            discard_pile_count: table.discard_pile.len(),
            discard_pile_top: table
                .discard_pile
                .iter()
                .rev()
                .take(VISIBLE_DISCARDS)
                .map(|c| c.value)
                .collect(),
            dealer_idx: table.dealer_idx,
            scores: table.scores.clone(),
            drawn_card: drawn.map(|(card, _)| PublicCard {
                value: card.value,
                face_up: true,
            }),
            drawn_from: drawn.map(|(_, origin)| origin),
            must_flip_after_discard: table.must_flip_after_discard,
            hole_ended_by,
            final_turns_remaining,
            round_scores: table.round_scores.clone(),
            active_player_ids: BTreeSet::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started_table() -> (Table, Vec<PlayerId>) {
        let mut table = Table::new(TableName::parse("view").unwrap());
        let ids: Vec<PlayerId> = ["alice", "bob", "carol"]
            .iter()
            .map(|n| table.add_player(PlayerName::parse(n).unwrap()).unwrap())
            .collect();
        table.start().unwrap();
        (table, ids)
    }

    #[test]
    fn test_empty_table_view() {
        let table = Table::new(TableName::parse("nobody").unwrap());
        let view = TableView::from(&table);
        assert_eq!(view.phase, ViewPhase::Empty);
        assert_eq!(view.draw_pile_count, DECK_SIZE);
        assert!(view.players.is_empty());

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["phase"], "empty");
    }

    #[test]
    fn test_face_down_values_never_leak() {
        let (mut table, ids) = started_table();
        table.reveal(&ids[0], 3).unwrap();
        let view = TableView::from(&table);

        for (player, public) in table.players.iter().zip(&view.players) {
            for (card, shown) in player.hand.iter().zip(&public.hand) {
                if card.face_up {
                    assert_eq!(shown.value, card.value);
                } else {
                    assert_eq!(shown.value, FACE_DOWN_MASK);
                }
            }
        }
        assert_eq!(view.players[0].hand[3].value, table.players[0].hand[3].value);
    }

    #[test]
    fn test_view_json_has_no_hidden_values() {
        let (table, _) = started_table();
        let json = serde_json::to_value(TableView::from(&table)).unwrap();
        assert!(json.get("draw_pile").is_none());
        for player in json["players"].as_array().unwrap() {
            for card in player["hand"].as_array().unwrap() {
                assert_eq!(card["value"], FACE_DOWN_MASK);
            }
        }
        assert!(json.get("drawn_card").is_none());
        assert!(json.get("must_flip_after_discard").is_none());
    }

    #[test]
    fn test_discard_top_most_recent_first() {
        let (mut table, _) = started_table();
        table.discard_pile = vec![Card::face_up(1), Card::face_up(2), Card::face_up(3)];
        let view = TableView::from(&table);
        assert_eq!(view.discard_pile_top, vec![3, 2]);
        assert_eq!(view.discard_pile_count, 3);
    }

    #[test]
    fn test_drawn_card_is_visible() {
        let (mut table, ids) = started_table();
        for id in &ids {
            table.reveal(id, 0).unwrap();
            table.reveal(id, 1).unwrap();
        }
        table.draw_from_draw_pile(&ids[0]).unwrap();
        let (card, _) = table.drawn_card().unwrap();
        let view = TableView::from(&table);
        assert_eq!(view.drawn_card, Some(PublicCard { value: card.value, face_up: true }));
        assert_eq!(view.drawn_from, Some(DrawOrigin::Draw));
        assert_eq!(view.phase, ViewPhase::Play);
    }

    #[test]
    fn test_active_players_attached() {
        let (table, ids) = started_table();
        let active: BTreeSet<PlayerId> = ids[..2].iter().cloned().collect();
        let view = TableView::from(&table).with_active_players(active.clone());
        assert_eq!(view.active_player_ids, active);
    }
}
