//! Conversation Integration Tests
//!
//! Drive a logged-in client against the in-memory server through whole
//! conversations: sending, reactions, pins, threads, room switches,
//! failures, and reconnection.
//!
//! Run with: cargo test -p integration-tests --test conversation_tests

use chat_client::protocol::{ClientCommand, HistoryPayload, HistoryRequestPayload, ServerEvent};
use chat_client::{ClientEvent, ConnectionState, OutgoingContent, RoomFailure, RoomState, SearchFilter};
use chat_core::{MessageStatus, MessageType, ReactionChange, UserId};
use chrono::{TimeZone, Utc};
use integration_tests::{drain, fixtures::*, TestSession};

// ============================================================================
// Messages and reactions
// ============================================================================

#[tokio::test]
async fn test_double_toggle_leaves_no_reaction() {
    let mut session = TestSession::start("alice").await.unwrap();
    session.open_room("bob", Vec::new()).await.unwrap();

    let id = session.client.send(OutgoingContent::text("  Hi  ")).unwrap();
    let sent = session.sent_messages();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].content, "Hi");

    assert_eq!(session.client.toggle_reaction(&id, "👍"), Some(ReactionChange::Added));
    assert_eq!(session.client.toggle_reaction(&id, "👍"), Some(ReactionChange::Removed));

    let message = session.client.message(&id).unwrap();
    assert!(message.reactions.is_empty());
    assert_eq!(session.client.stats().reaction_count, 0);
}

#[tokio::test]
async fn test_peer_reactions_accumulate_per_user() {
    let mut session = TestSession::start("alice").await.unwrap();
    let incoming = text_message("bob", "alice", "party tonight?");
    let id = incoming.id.clone();
    session.open_room("bob", vec![incoming]).await.unwrap();

    session.client.toggle_reaction(&id, "🎉");
    session.deliver(reaction(&id, "🎉", "bob", "alice", true)).await.unwrap();
    session.deliver(reaction(&id, "🎉", "bob", "alice", true)).await.unwrap();

    let party = session.client.message(&id).unwrap().reaction("🎉").unwrap().clone();
    assert_eq!(party.count(), 2);
    assert!(party.has_reacted());

    session.deliver(reaction(&id, "🎉", "bob", "alice", false)).await.unwrap();
    let party = session.client.message(&id).unwrap().reaction("🎉").unwrap().clone();
    assert_eq!(party.count(), 1);
}

#[tokio::test]
async fn test_echo_is_reconciled_not_duplicated() {
    let mut session = TestSession::start("alice").await.unwrap();
    session.open_room("bob", Vec::new()).await.unwrap();
    let mut events = session.client.subscribe();

    let local_id = session.client.send(OutgoingContent::text("Hi")).unwrap();
    let mut echo = session.sent_messages().remove(0);
    echo.id = server_id();
    echo.status = Some("delivered".to_string());
    let server_id = echo.id.clone();

    session.deliver(receive(echo)).await.unwrap();

    assert_eq!(session.client.snapshot().len(), 1);
    assert!(session.client.message(&local_id).is_none());
    let message = session.client.message(&server_id).unwrap();
    assert_eq!(message.status, MessageStatus::Delivered);

    assert_eq!(
        drain(&mut events),
        vec![
            ClientEvent::MessageAppended(local_id),
            ClientEvent::MessageUpdated(server_id),
        ]
    );
}

// ============================================================================
// Pins and threads
// ============================================================================

#[tokio::test]
async fn test_pinned_view_shows_later_reactions() {
    let mut session = TestSession::start("alice").await.unwrap();
    let incoming = text_message("bob", "alice", "the address is 12 Elm St");
    let id = incoming.id.clone();
    session.open_room("bob", vec![incoming]).await.unwrap();

    assert!(session.client.pin(&id));
    assert!(!session.client.pin(&id));
    session.client.toggle_reaction(&id, "📌");

    let pinned = session.client.pinned();
    assert_eq!(pinned.len(), 1);
    assert!(pinned[0].is_pinned);
    assert_eq!(pinned[0].reaction("📌").map(|r| r.count()), Some(1));

    assert!(session.client.unpin(&id));
    assert!(session.client.pinned().is_empty());
}

#[tokio::test]
async fn test_thread_reply_survives_close_and_reopen() {
    let mut session = TestSession::start("alice").await.unwrap();
    let incoming = text_message("bob", "alice", "can you review my PR?");
    let id = incoming.id.clone();
    session.open_room("bob", vec![incoming]).await.unwrap();

    assert!(session.client.open_thread(&id));
    session.client.send_reply(&id, "on it").unwrap();
    assert_eq!(session.client.thread().unwrap().replies.len(), 1);

    session.client.close_thread();
    assert!(session.client.thread().is_none());

    assert!(session.client.open_thread(&id));
    let thread = session.client.thread().unwrap();
    assert_eq!(thread.parent.id, id);
    assert_eq!(thread.replies[0].content, "on it");

    assert!(session
        .sent()
        .iter()
        .any(|command| matches!(command, ClientCommand::ReplyUpdate(update) if update.parent_id == id)));
}

// ============================================================================
// Room switching
// ============================================================================

#[tokio::test]
async fn test_switching_peers_discards_late_results() {
    let mut session = TestSession::start("alice").await.unwrap();
    let bob_token = session.client.select_peer(UserId::new("bob")).unwrap();
    let carol_token = session.client.select_peer(UserId::new("carol")).unwrap();
    let mut events = session.client.subscribe();

    // Bob's snapshot and message arrive after the switch
    session
        .deliver(ServerEvent::ChatHistory(HistoryPayload {
            messages: vec![text_message("bob", "alice", "old news")],
            request_id: Some(bob_token.value()),
        }))
        .await
        .unwrap();
    session
        .deliver(receive(text_message("bob", "alice", "still there?")))
        .await
        .unwrap();

    assert!(session.client.snapshot().is_empty());
    assert_eq!(session.client.room_state(), Some(&RoomState::LoadingHistory));
    assert!(drain(&mut events)
        .iter()
        .all(|event| matches!(event, ClientEvent::StaleResultDiscarded { .. })));

    session
        .deliver(ServerEvent::ChatHistory(HistoryPayload {
            messages: vec![text_message("carol", "alice", "hello from carol")],
            request_id: Some(carol_token.value()),
        }))
        .await
        .unwrap();

    assert_eq!(session.client.room_state(), Some(&RoomState::Ready));
    assert_eq!(session.client.snapshot()[0].content, "hello from carol");
}

#[tokio::test]
async fn test_switch_clears_pins_and_thread() {
    let mut session = TestSession::start("alice").await.unwrap();
    let incoming = text_message("bob", "alice", "pin me");
    let id = incoming.id.clone();
    session.open_room("bob", vec![incoming]).await.unwrap();
    session.client.pin(&id);
    session.client.open_thread(&id);

    session.open_room("carol", Vec::new()).await.unwrap();

    assert!(session.client.pinned().is_empty());
    assert!(session.client.thread().is_none());
    assert!(session.client.snapshot().is_empty());
}

// ============================================================================
// Failures and recovery
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_send_survives_reconnect_and_resends() {
    let mut session = TestSession::start("alice").await.unwrap();
    session.open_room("bob", Vec::new()).await.unwrap();

    session.server.close_inbox();
    let id = session.client.send(OutgoingContent::text("lost")).unwrap();
    assert!(session.client.message(&id).unwrap().is_failed());

    session.server.drop_link("writer stopped");
    session.client.process_next().await;
    assert!(matches!(
        session.client.connection_state(),
        ConnectionState::Reconnecting { .. }
    ));

    // Backoff elapses and the link comes back
    session.client.process_next().await;
    assert!(session.client.connection_state().is_connected());

    let token = session.client.room().unwrap().token();
    session.sent();
    session
        .deliver(ServerEvent::ChatHistory(HistoryPayload {
            messages: vec![text_message("bob", "alice", "you there?")],
            request_id: Some(token.value()),
        }))
        .await
        .unwrap();

    let snapshot = session.client.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[1].id, id);
    assert!(snapshot[1].is_failed());

    assert!(session.client.resend(&id));
    let resent = session.sent_messages();
    assert_eq!(resent.len(), 1);
    assert_eq!(resent[0].content, "lost");
    assert_eq!(session.client.message(&id).unwrap().status, MessageStatus::Sent);
}

#[tokio::test(start_paused = true)]
async fn test_history_timeout_then_retry() {
    let mut session = TestSession::start("alice").await.unwrap();
    let mut events = session.client.subscribe();
    let first = session.client.select_peer(UserId::new("bob")).unwrap();

    session.client.process_next().await;
    assert!(matches!(
        session.client.room_state(),
        Some(RoomState::Failed(RoomFailure::HistoryLoad(_)))
    ));
    assert!(drain(&mut events)
        .iter()
        .any(|event| matches!(event, ClientEvent::RoomFailed { .. })));

    session.sent();
    let second = session.client.retry_room().unwrap();
    assert_ne!(first, second);
    assert!(session.sent().contains(&ClientCommand::GetHistory(HistoryRequestPayload {
        user_id: UserId::new("alice"),
        recipient_id: UserId::new("bob"),
        request_id: Some(second.value()),
    })));

    session
        .deliver(ServerEvent::ChatHistory(HistoryPayload {
            messages: Vec::new(),
            request_id: Some(second.value()),
        }))
        .await
        .unwrap();
    assert_eq!(session.client.room_state(), Some(&RoomState::Ready));
}

#[tokio::test(start_paused = true)]
async fn test_reconnect_rejoins_with_fresh_token() {
    let mut session = TestSession::start("alice").await.unwrap();
    let first = session
        .open_room("bob", vec![text_message("bob", "alice", "before")])
        .await
        .unwrap();

    session.server.refuse_connections(1);
    session.server.drop_link("server restart");
    session.client.process_next().await;
    session.client.process_next().await;
    assert_eq!(
        session.client.connection_state(),
        ConnectionState::Reconnecting { attempt: 2 }
    );

    session.client.process_next().await;
    assert!(session.client.connection_state().is_connected());
    assert_eq!(session.server.connect_count(), 3);

    let token = session.client.room().unwrap().token();
    assert!(token > first);
    let commands = session.sent();
    assert!(matches!(commands[0], ClientCommand::JoinRoom(_)));
    assert!(matches!(
        &commands[1],
        ClientCommand::GetHistory(request) if request.request_id == Some(token.value())
    ));

    session
        .deliver(ServerEvent::ChatHistory(HistoryPayload {
            messages: vec![
                text_message("bob", "alice", "before"),
                text_message("bob", "alice", "during"),
            ],
            request_id: Some(token.value()),
        }))
        .await
        .unwrap();
    assert_eq!(session.client.snapshot().len(), 2);
}

// ============================================================================
// Typing
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_peer_typing_expires_without_stop() {
    let mut session = TestSession::start("alice").await.unwrap();
    session.open_room("bob", Vec::new()).await.unwrap();
    let mut events = session.client.subscribe();

    session.deliver(typing_start("bob", "alice")).await.unwrap();
    assert!(session.client.is_peer_typing());

    session.client.process_next().await;
    assert!(!session.client.is_peer_typing());
    assert_eq!(
        drain(&mut events),
        vec![
            ClientEvent::PeerTyping { peer: UserId::new("bob"), active: true },
            ClientEvent::PeerTyping { peer: UserId::new("bob"), active: false },
        ]
    );
}

// ============================================================================
// Search, statistics, forwarding
// ============================================================================

#[tokio::test]
async fn test_search_and_stats() {
    let mut session = TestSession::start("alice").await.unwrap();
    let monday_noon = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    let tuesday_morning = Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap();
    let mut voice = voice_message("bob", "alice", 3.5);
    voice.timestamp = tuesday_morning;

    session
        .open_room(
            "bob",
            vec![
                text_message_at("alice", "bob", "Lunch at noon?", monday_noon),
                text_message_at("bob", "alice", "sure, lunch sounds good", monday_noon),
                voice,
                text_message_at("alice", "bob", "see you", tuesday_morning),
            ],
        )
        .await
        .unwrap();

    let client = &session.client;
    assert_eq!(client.search("LUNCH", SearchFilter::All).len(), 2);
    assert_eq!(client.search("lunch", SearchFilter::Sent)[0].content, "Lunch at noon?");
    assert_eq!(client.search("lunch", SearchFilter::Received).len(), 1);
    assert!(client.search("voice", SearchFilter::All).is_empty());
    assert!(client.search("   ", SearchFilter::All).is_empty());

    let stats = client.stats();
    assert_eq!(stats.total_messages, 4);
    assert_eq!(stats.sent_by_user, 2);
    assert_eq!(stats.received_by_user, 2);
    assert_eq!(stats.count_of(MessageType::Voice), 1);
    assert_eq!(stats.count_of(MessageType::Text), 3);
    assert_eq!(stats.daily_activity[1], 2);
    assert_eq!(stats.hourly_activity[12], 2);
    assert_eq!(stats.most_active_hour, Some(9));
}

#[tokio::test]
async fn test_forward_to_open_room_and_others() {
    let mut session = TestSession::start("alice").await.unwrap();
    let incoming = text_message("bob", "alice", "meme.png");
    let id = incoming.id.clone();
    session.open_room("bob", vec![incoming]).await.unwrap();

    let copies = session
        .client
        .forward(&id, &[UserId::new("bob"), UserId::new("carol")])
        .unwrap();
    assert_eq!(copies.len(), 2);
    assert!(!copies.contains(&id));

    // Only bob's copy joins the open timeline
    let snapshot = session.client.snapshot();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[1].id, copies[0]);
    assert_eq!(snapshot[1].sender_id, UserId::new("alice"));

    let sent = session.sent_messages();
    assert_eq!(sent.len(), 2);
    assert!(sent.iter().all(|message| message.content == "meme.png"));
}
