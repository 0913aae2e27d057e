//! Test assertion helpers - fluent API for verifying test expectations
#![allow(dead_code)] // Test utilities may not all be used in every test

use roshambo::websockets::{MessageType, WebSocketMessage};

use super::setup::TestSetup;

// ============================================================================
// Assertion Helpers
// ============================================================================

pub struct MessageAssertion<'a> {
    setup: &'a TestSetup,
    players: Vec<&'a str>,
}

impl<'a> MessageAssertion<'a> {
    /// Create an assertion for all players in the setup
    pub fn for_all_players(setup: &'a TestSetup) -> Self {
        let players = setup.players.iter().map(|s| s.as_str()).collect();
        Self { setup, players }
    }

    /// Create an assertion for specific players
    pub fn for_players(setup: &'a TestSetup, players: Vec<&'a str>) -> Self {
        Self { setup, players }
    }

    /// Assert that players received a specific message type (consumes the message from queue)
    pub async fn received_message_type(self, expected_type: MessageType) -> MessageContent {
        let mut messages = vec![];

        for player in &self.players {
            let message = self
                .setup
                .mock_conn_manager
                .consume_message_for(player)
                .await;
            let raw = message.unwrap_or_else(|| panic!("{} should have received a message", player));

            let msg: WebSocketMessage = serde_json::from_str(&raw).unwrap();
            assert_eq!(
                msg.message_type, expected_type,
                "{} received wrong message type",
                player
            );
            messages.push((raw, msg));
        }

        // Everyone in a room sees the same snapshot
        if messages.len() > 1 {
            let first_payload = &messages[0].1.payload;
            for (i, (_, msg)) in messages.iter().enumerate().skip(1) {
                assert_eq!(
                    &msg.payload, first_payload,
                    "Player {} payload differs from player {}",
                    self.players[i], self.players[0]
                );
            }
        }

        let (raw, msg) = messages.swap_remove(0);
        MessageContent {
            raw,
            payload: msg.payload,
        }
    }

    /// Assert that players have nothing left to read
    pub async fn received_no_messages(self) {
        for player in &self.players {
            let messages = self.setup.mock_conn_manager.get_messages_for(player).await;
            assert!(
                messages.is_empty(),
                "{} should not have received any messages, got {:?}",
                player,
                messages
            );
        }
    }

    /// Count how many messages of a specific type a player received (non-consuming)
    pub async fn count_message_type(&self, player: &str, msg_type: MessageType) -> usize {
        let messages = self.setup.mock_conn_manager.get_messages_for(player).await;
        messages
            .iter()
            .filter_map(|msg_str| serde_json::from_str::<WebSocketMessage>(msg_str).ok())
            .filter(|msg| msg.message_type == msg_type)
            .count()
    }

    /// Assert that players received a sequence of message types in order (consumes them)
    pub async fn received_message_sequence(self, expected_types: Vec<MessageType>) {
        for player in &self.players {
            for (i, expected_type) in expected_types.iter().enumerate() {
                let raw = self
                    .setup
                    .mock_conn_manager
                    .consume_message_for(player)
                    .await
                    .unwrap_or_else(|| panic!("{} is missing message {}", player, i));
                let msg: WebSocketMessage = serde_json::from_str(&raw).unwrap_or_else(|e| {
                    panic!("Failed to parse message {} for {}: {}", i, player, e)
                });

                assert_eq!(
                    msg.message_type, *expected_type,
                    "{} message {} has wrong type: expected {:?}, got {:?}",
                    player, i, expected_type, msg.message_type
                );
            }
        }
    }
}

// ============================================================================
// Message Content Assertions
// ============================================================================

pub struct MessageContent {
    raw: String,
    payload: serde_json::Value,
}

impl MessageContent {
    pub fn with_phase(self, expected_phase: &str) -> Self {
        assert_eq!(self.payload["room"]["phase"], expected_phase);
        self
    }

    pub fn with_round(self, expected_round: u64) -> Self {
        assert_eq!(self.payload["room"]["round"], expected_round);
        self
    }

    pub fn with_player_count(self, expected: usize) -> Self {
        let players = self.payload["room"]["players"].as_array().unwrap();
        assert_eq!(players.len(), expected);
        self
    }

    pub fn with_score(self, player_id: &str, expected: u64) -> Self {
        let players = self.payload["room"]["players"].as_array().unwrap();
        let player = players
            .iter()
            .find(|p| p["id"] == player_id)
            .unwrap_or_else(|| panic!("{} is not in the room", player_id));
        assert_eq!(player["score"], expected);
        self
    }

    pub fn with_player_id(self, expected: &str) -> Self {
        assert_eq!(self.payload["playerId"], expected);
        self
    }

    pub fn with_winner(self, expected: Option<&str>) -> Self {
        match expected {
            Some(id) => assert_eq!(self.payload["result"]["winnerId"], id),
            None => assert!(self.payload["result"]["winnerId"].is_null()),
        }
        self
    }

    pub fn with_error_code(self, expected: &str) -> Self {
        assert_eq!(self.payload["code"], expected);
        self
    }

    /// Assert the raw frame never mentions the text, e.g. a hidden move
    pub fn not_mentioning(self, text: &str) -> Self {
        assert!(
            !self.raw.contains(text),
            "message should not mention {:?}: {}",
            text,
            self.raw
        );
        self
    }
}
