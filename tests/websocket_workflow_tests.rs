use std::time::Duration;

use roshambo::websockets::MessageType;

mod utils;

use utils::*;

#[tokio::test]
async fn test_second_join_starts_the_game() {
    let setup = TestSetupBuilder::new().build().await;

    setup.join("alice").await;
    MessageAssertion::for_players(&setup, vec!["alice"])
        .received_message_type(MessageType::RoomUpdate)
        .await
        .with_phase("waiting")
        .with_player_count(1);

    setup.join("bob").await;
    MessageAssertion::for_players(&setup, vec!["alice", "bob"])
        .received_message_type(MessageType::RoomUpdate)
        .await
        .with_player_count(2);
    MessageAssertion::for_players(&setup, vec!["alice", "bob"])
        .received_message_type(MessageType::GameStart)
        .await
        .with_phase("playing")
        .with_round(1);
}

#[tokio::test]
async fn test_rejoin_sends_nothing_new() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.join("alice").await;

    MessageAssertion::for_all_players(&setup)
        .received_no_messages()
        .await;
}

#[tokio::test]
async fn test_third_player_is_not_seated() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.join("carol").await;

    MessageAssertion::for_players(&setup, vec!["alice", "bob", "carol"])
        .received_no_messages()
        .await;
    let room = setup.room_service.get_status(ROOM_ID).await.unwrap();
    assert_eq!(room.player_ids(), vec!["alice", "bob"]);
}

#[tokio::test]
async fn test_first_choice_is_announced_to_opponent_without_move() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.send_choice("alice", "stone").await;

    MessageAssertion::for_players(&setup, vec!["bob"])
        .received_message_type(MessageType::PlayerChose)
        .await
        .with_player_id("alice")
        .not_mentioning("stone");
    MessageAssertion::for_players(&setup, vec!["alice"])
        .received_message_type(MessageType::RoomUpdate)
        .await
        .with_phase("playing");
    MessageAssertion::for_all_players(&setup)
        .received_no_messages()
        .await;
}

#[tokio::test]
async fn test_second_choice_reveals_results() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.send_choice("alice", "stone").await;
    setup.clear_messages().await;
    setup.send_choice("bob", "scissors").await;

    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::RoundResults)
        .await
        .with_winner(Some("alice"))
        .with_phase("results")
        .with_score("alice", 1)
        .with_score("bob", 0);

    // The completing choice is not separately announced
    MessageAssertion::for_all_players(&setup)
        .received_no_messages()
        .await;
}

#[tokio::test]
async fn test_tie_scores_nobody() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.send_choice("alice", "paper").await;
    setup.send_choice("bob", "paper").await;

    let assertion = MessageAssertion::for_players(&setup, vec!["alice"]);
    assert_eq!(
        assertion
            .count_message_type("alice", MessageType::RoundResults)
            .await,
        1
    );
    let room = setup.room_service.get_status(ROOM_ID).await.unwrap();
    assert!(room.players.iter().all(|p| p.score == 0));
    assert!(room.last_result.unwrap().winner_id.is_none());
}

#[tokio::test]
async fn test_next_round_keeps_scores() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    setup.play_round(("alice", "paper"), ("bob", "stone")).await;

    setup.send_next_round("bob").await;

    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::NextRound)
        .await
        .with_round(2)
        .with_phase("playing")
        .with_score("alice", 1);

    // A duplicate request finds the room already playing
    setup.send_next_round("alice").await;
    MessageAssertion::for_all_players(&setup)
        .received_no_messages()
        .await;
}

#[tokio::test]
async fn test_choice_out_of_phase_errors_only_to_sender() {
    let setup = TestSetupBuilder::new().with_players(vec!["alice"]).build().await;

    setup.send_choice("alice", "rock").await;

    MessageAssertion::for_players(&setup, vec!["alice"])
        .received_message_type(MessageType::Error)
        .await
        .with_error_code("invalid-phase");
}

#[tokio::test]
async fn test_double_choice_errors_and_keeps_first_move() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    setup.send_choice("alice", "stone").await;
    setup.clear_messages().await;

    setup.send_choice("alice", "paper").await;
    MessageAssertion::for_players(&setup, vec!["alice"])
        .received_message_type(MessageType::Error)
        .await
        .with_error_code("invalid-phase");
    MessageAssertion::for_players(&setup, vec!["bob"])
        .received_no_messages()
        .await;

    setup.send_choice("bob", "scissors").await;
    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::RoundResults)
        .await
        .with_winner(Some("alice"));
}

#[tokio::test]
async fn test_leave_resets_the_remaining_player() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;
    setup.play_round(("alice", "paper"), ("bob", "stone")).await;

    setup.send_leave("bob").await;

    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::PlayerLeft)
        .await
        .with_player_id("bob")
        .with_phase("waiting")
        .with_round(0)
        .with_player_count(1)
        .with_score("alice", 1);
}

#[tokio::test]
async fn test_last_leave_closes_the_room() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    setup.send_leave("bob").await;
    setup.send_leave("alice").await;

    assert!(setup.room_service.get_status(ROOM_ID).await.is_err());
    assert!(!setup.subscriptions.is_running(ROOM_ID).await);
    assert!(!setup.event_bus.has_room_channel(ROOM_ID).await);
}

#[tokio::test]
async fn test_results_advance_automatically_after_display_window() {
    let setup = TestSetupBuilder::new()
        .with_two_players()
        .with_results_display(Duration::from_millis(50))
        .build()
        .await;

    setup.send_choice("alice", "scissors").await;
    setup.send_choice("bob", "paper").await;
    setup.clear_messages().await;

    tokio::time::sleep(Duration::from_millis(200)).await;

    MessageAssertion::for_all_players(&setup)
        .received_message_type(MessageType::NextRound)
        .await
        .with_round(2)
        .with_score("alice", 1);
    MessageAssertion::for_all_players(&setup)
        .received_no_messages()
        .await;
}

#[tokio::test]
async fn test_leaving_during_results_cancels_automatic_advance() {
    let setup = TestSetupBuilder::new()
        .with_two_players()
        .with_results_display(Duration::from_millis(50))
        .build()
        .await;

    setup.send_choice("alice", "scissors").await;
    setup.send_choice("bob", "paper").await;
    setup.send_leave("bob").await;
    setup.clear_messages().await;

    tokio::time::sleep(Duration::from_millis(200)).await;

    MessageAssertion::for_players(&setup, vec!["alice"])
        .received_no_messages()
        .await;
    let room = setup.room_service.get_status(ROOM_ID).await.unwrap();
    assert_eq!(room.round, 0);
}

#[tokio::test]
async fn test_each_join_delivers_one_room_update() {
    let setup = TestSetupBuilder::new().build().await;

    let (_, mut alice) = setup.connect("alice").await;
    assert_eq!(drain_types(&mut alice), vec![MessageType::RoomUpdate]);

    let (_, mut bob) = setup.connect("bob").await;
    assert_eq!(
        drain_types(&mut bob),
        vec![MessageType::RoomUpdate, MessageType::GameStart]
    );
    assert_eq!(
        drain_types(&mut alice),
        vec![MessageType::RoomUpdate, MessageType::GameStart]
    );
}

#[tokio::test]
async fn test_reconnect_gets_snapshot_directly() {
    let setup = TestSetupBuilder::new().with_two_players().build().await;

    let (_, mut alice) = setup.connect("alice").await;

    assert_eq!(drain_types(&mut alice), vec![MessageType::RoomUpdate]);
    MessageAssertion::for_all_players(&setup)
        .received_no_messages()
        .await;
}

#[tokio::test]
async fn test_old_socket_closing_after_reconnect_keeps_player_seated() {
    let setup = TestSetupBuilder::new().build().await;
    let (old_socket, _old_rx) = setup.connect("alice").await;
    let (_, _bob) = setup.connect("bob").await;
    let (new_socket, mut alice) = setup.connect("alice").await;
    drain_types(&mut alice);

    setup.disconnect("alice", old_socket).await;

    let room = setup.room_service.get_status(ROOM_ID).await.unwrap();
    assert_eq!(room.player_ids(), vec!["alice", "bob"]);
    assert_eq!(room.round, 1);
    assert!(setup.mock_conn_manager.is_connected("alice").await);

    setup.send_choice("bob", "stone").await;
    assert_eq!(drain_types(&mut alice), vec![MessageType::PlayerChose]);

    setup.disconnect("alice", new_socket).await;
    let room = setup.room_service.get_status(ROOM_ID).await.unwrap();
    assert_eq!(room.player_ids(), vec!["bob"]);
}

#[tokio::test]
async fn test_room_reopened_right_after_closing_still_pushes() {
    let setup = TestSetupBuilder::new().build().await;
    let (alice_socket, _alice) = setup.connect("alice").await;

    // No pause: the old subscription may still be draining the close
    roshambo::websockets::disconnect_player(&setup.app_state, ROOM_ID, "alice", alice_socket)
        .await;
    let (_, mut bob) = setup.connect("bob").await;
    setup.join_over_http("carol").await;

    assert!(setup.event_bus.has_room_channel(ROOM_ID).await);
    assert_eq!(
        drain_types(&mut bob),
        vec![
            MessageType::RoomUpdate,
            MessageType::RoomUpdate,
            MessageType::GameStart
        ]
    );
}
