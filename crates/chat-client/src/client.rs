//! Chat client
//!
//! [`ChatClient`] owns the connection, the active room session and its
//! conversation store. It is a single owned value: UI actions call its
//! methods directly, and inbound traffic and timers are applied one at a
//! time by [`ChatClient::process_next`].

use crate::connection::{ConnectionManager, ConnectionState, Connector, TransportEvent};
use crate::dispatcher::{OutboundDispatcher, OutgoingContent};
use crate::events::{ClientEvent, EventBus};
use crate::protocol::{
    AckPayload, ChatEventType, ClientCommand, ErrorPayload, HistoryPayload,
    HistoryRequestPayload, MessagePayload, ReactionUpdatePayload, ReceivePayload, ReplyPayload,
    ReplyUpdatePayload, RoomPayload, ServerEvent,
};
use crate::session::{
    HistoryRequests, RoomFailure, RoomSession, RoomState, Routing, SessionToken, TokenSource,
    TypingState,
};
use crate::store::{
    search, AppendOutcome, ConversationStats, ConversationStore, SearchFilter, ThreadSnapshot,
};
use chat_common::{ClientConfig, ClientError, ClientResult};
use chat_core::{
    DomainError, Message, MessageId, MessageStatus, ReactionChange, SnowflakeGenerator, UserId,
};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Identity {
    id: UserId,
    name: String,
}

/// Client-side conversation engine for one logged-in user
pub struct ChatClient {
    config: ClientConfig,
    connection: ConnectionManager,
    identity: Option<Identity>,

    tokens: TokenSource,
    history_requests: HistoryRequests,
    room: Option<RoomSession>,

    store: ConversationStore,
    typing: TypingState,
    dispatcher: OutboundDispatcher,
    events: EventBus,
}

impl ChatClient {
    /// Create a client that opens its links through `connector`
    pub fn new(config: ClientConfig, connector: Arc<dyn Connector>) -> Self {
        let ids = match config.snowflake.worker_id {
            Some(worker_id) => SnowflakeGenerator::new(worker_id),
            None => SnowflakeGenerator::with_random_worker(),
        };

        Self {
            connection: ConnectionManager::new(connector, config.reconnect.clone()),
            identity: None,
            tokens: TokenSource::new(),
            history_requests: HistoryRequests::default(),
            room: None,
            store: ConversationStore::new(),
            typing: TypingState::new(config.timeouts.typing_ttl()),
            dispatcher: OutboundDispatcher::new(ids, config.limits.max_content_len),
            events: EventBus::default(),
            config,
        }
    }

    // === Accessors ===

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The logged-in user
    pub fn local_user(&self) -> Option<&UserId> {
        self.identity.as_ref().map(|identity| &identity.id)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn room(&self) -> Option<&RoomSession> {
        self.room.as_ref()
    }

    pub fn room_state(&self) -> Option<&RoomState> {
        self.room.as_ref().map(RoomSession::state)
    }

    pub fn active_peer(&self) -> Option<&UserId> {
        self.room.as_ref().map(RoomSession::peer)
    }

    /// Subscribe to notifications
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// The open room's timeline
    pub fn snapshot(&self) -> &[Message] {
        self.store.messages()
    }

    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.store.get(id)
    }

    // === Session lifecycle ===

    /// Log in and open the connection
    ///
    /// A connection failure is not an error: the client keeps retrying in
    /// the background and reports progress through notifications.
    #[tracing::instrument(skip(self, display_name), fields(user_id = %user_id))]
    pub async fn login(&mut self, user_id: UserId, display_name: impl Into<String> + Send) -> ClientResult<()> {
        if user_id.as_str().trim().is_empty() {
            return Err(DomainError::ValidationError("user id must not be empty".to_string()).into());
        }
        if self.identity.is_some() {
            self.logout();
        }

        self.identity = Some(Identity {
            id: user_id.clone(),
            name: display_name.into(),
        });
        self.events
            .publish(ClientEvent::ConnectionChanged(ConnectionState::Connecting));

        if let Err(e) = self.connection.connect(&user_id).await {
            tracing::warn!(error = %e, "Initial connection failed, will retry");
        }
        self.events
            .publish(ClientEvent::ConnectionChanged(self.connection.state()));
        Ok(())
    }

    /// Leave the room, drop the connection, and forget the user
    pub fn logout(&mut self) {
        self.end_room();
        self.connection.disconnect();
        self.history_requests.clear();

        if let Some(identity) = self.identity.take() {
            tracing::info!(user_id = %identity.id, "Logged out");
        }
        self.events
            .publish(ClientEvent::ConnectionChanged(self.connection.state()));
    }

    /// Open the conversation with `peer`
    ///
    /// Any other open room is left and torn down first. Selecting the peer of
    /// the current (not failed) room keeps it as is.
    pub fn select_peer(&mut self, peer: UserId) -> ClientResult<SessionToken> {
        let identity = self.identity.clone().ok_or(ClientError::NotConnected)?;
        if peer == identity.id {
            return Err(DomainError::ValidationError(
                "cannot open a conversation with yourself".to_string(),
            )
            .into());
        }

        if let Some(room) = &self.room {
            if room.peer() == &peer && !room.state().is_failed() {
                return Ok(room.token());
            }
        }

        self.end_room();
        let token = self.tokens.issue();
        self.room = Some(RoomSession::new(identity.id, peer, token));
        self.start_room(Instant::now());
        Ok(token)
    }

    /// Leave the current room and clear its state
    pub fn close_conversation(&mut self) {
        self.end_room();
    }

    /// Start a fresh session for the current peer
    ///
    /// Used after the room failed; the timeline is kept until the new
    /// snapshot replaces it.
    pub fn retry_room(&mut self) -> ClientResult<SessionToken> {
        let room = self.room.as_mut().ok_or(ClientError::NoActiveRoom)?;
        let token = self.tokens.issue();
        room.restart(token);
        tracing::info!(peer = %room.peer(), token = %token, "Retrying room");

        self.start_room(Instant::now());
        Ok(token)
    }

    fn start_room(&mut self, now: Instant) {
        let Some(room) = self.room.as_mut() else {
            return;
        };
        let token = room.token();
        let join = ClientCommand::JoinRoom(RoomPayload::new(room.local_user(), room.peer()));
        let history = ClientCommand::GetHistory(HistoryRequestPayload {
            user_id: room.local_user().clone(),
            recipient_id: room.peer().clone(),
            request_id: Some(token.value()),
        });

        if let Err(e) = self.connection.send(join) {
            room.await_connection(now + self.config.timeouts.join_timeout());
            tracing::debug!(peer = %room.peer(), error = %e, "Waiting for connection to join room");
            return;
        }

        match self.connection.send(history) {
            Ok(()) => {
                self.history_requests.push(token);
                room.await_history(now + self.config.timeouts.history_timeout());
                tracing::info!(peer = %room.peer(), room = %room.key(), token = %token, "Joined room");
                self.events.publish(ClientEvent::RoomJoined {
                    peer: room.peer().clone(),
                    token,
                });
            }
            // The reconnect rejoins under a fresh token
            Err(ClientError::NotConnected) => {
                room.await_connection(now + self.config.timeouts.join_timeout());
                tracing::debug!(peer = %room.peer(), "Link dropped before history request");
            }
            Err(e) => {
                let failure = RoomFailure::HistoryLoad(format!("history request not sent: {e}"));
                room.fail(failure.clone());
                tracing::warn!(peer = %room.peer(), error = %e, "History request not transmitted");
                self.events.publish(ClientEvent::RoomFailed {
                    peer: room.peer().clone(),
                    failure,
                });
            }
        }
    }

    fn end_room(&mut self) {
        if let Some(room) = self.room.take() {
            let payload = RoomPayload::new(room.local_user(), room.peer());
            if self.typing.is_local_active() {
                if let Err(e) = self.connection.send(ClientCommand::TypingStop(payload.clone())) {
                    tracing::debug!(peer = %room.peer(), error = %e, "Typing stop not transmitted");
                }
            }
            if let Err(e) = self.connection.send(ClientCommand::LeaveRoom(payload)) {
                tracing::debug!(peer = %room.peer(), error = %e, "Leave not transmitted");
            }
            tracing::info!(peer = %room.peer(), token = %room.token(), "Left room");
        }
        self.store.reset();
        self.typing.reset();
    }

    fn active_participants(&self) -> ClientResult<(Identity, UserId)> {
        let identity = self.identity.clone().ok_or(ClientError::NotConnected)?;
        let peer = self
            .room
            .as_ref()
            .map(|room| room.peer().clone())
            .ok_or(ClientError::NoActiveRoom)?;
        Ok((identity, peer))
    }

    // === Messages ===

    /// Send a message to the active peer
    ///
    /// The message is appended before it is handed to the transport. If the
    /// transport refuses it, it stays in the timeline with `failed` status
    /// (see [`ChatClient::resend`]); the id is returned either way.
    pub fn send(&mut self, content: OutgoingContent) -> ClientResult<MessageId> {
        let (identity, peer) = self.active_participants()?;
        let message = self
            .dispatcher
            .envelope(&identity.id, &identity.name, &peer, content)?;

        let id = message.id.clone();
        let command = OutboundDispatcher::send_command(&message, &peer);
        self.store.append(message);
        self.events.publish(ClientEvent::MessageAppended(id.clone()));

        self.submit(&id, command);
        Ok(id)
    }

    /// Resubmit a local message that failed
    ///
    /// Returns `true` if the transport accepted it this time.
    pub fn resend(&mut self, id: &MessageId) -> bool {
        let Ok((identity, peer)) = self.active_participants() else {
            return false;
        };
        let Some(message) = self.store.get(id) else {
            return false;
        };
        if !message.is_failed() || !message.is_from(&identity.id) {
            return false;
        }

        let mut retry = message.clone();
        retry.status = MessageStatus::Sent;
        let command = OutboundDispatcher::send_command(&retry, &peer);

        self.store.mutate(id, |m| m.status = MessageStatus::Sent);
        self.events.publish(ClientEvent::MessageUpdated(id.clone()));
        self.submit(id, command)
    }

    /// Forward a message to each of `peers`
    ///
    /// Every recipient gets a fresh copy. The copy for the active peer also
    /// lands in the open timeline. Returns the ids of the copies handed to
    /// the transport (plus the active-room copy, which may have failed).
    pub fn forward(&mut self, id: &MessageId, peers: &[UserId]) -> ClientResult<Vec<MessageId>> {
        let identity = self.identity.clone().ok_or(ClientError::NotConnected)?;
        let original = self
            .store
            .get(id)
            .cloned()
            .ok_or_else(|| DomainError::MessageNotFound(id.clone()))?;
        let active_peer = self.active_peer().cloned();

        let mut forwarded = Vec::with_capacity(peers.len());
        for peer in peers.iter().filter(|peer| **peer != identity.id) {
            let copy = self
                .dispatcher
                .forward_copy(&original, &identity.id, &identity.name, peer);
            let copy_id = copy.id.clone();
            let command = OutboundDispatcher::send_command(&copy, peer);

            if active_peer.as_ref() == Some(peer) {
                self.store.append(copy);
                self.events
                    .publish(ClientEvent::MessageAppended(copy_id.clone()));
                self.submit(&copy_id, command);
                forwarded.push(copy_id);
            } else {
                match self.connection.send(command) {
                    Ok(()) => forwarded.push(copy_id),
                    Err(e) => tracing::warn!(message_id = %id, peer = %peer, error = %e, "Forward not sent"),
                }
            }
        }

        tracing::debug!(message_id = %id, count = forwarded.len(), "Message forwarded");
        Ok(forwarded)
    }

    fn submit(&mut self, id: &MessageId, command: ClientCommand) -> bool {
        match self.connection.send(command) {
            Ok(()) => true,
            Err(e) => {
                self.mark_failed(id, &e.to_string());
                false
            }
        }
    }

    fn mark_failed(&mut self, id: &MessageId, reason: &str) {
        if self
            .store
            .mutate(id, |m| m.status = MessageStatus::Failed)
            .is_some()
        {
            tracing::warn!(message_id = %id, reason = %reason, "Message failed");
            self.events.publish(ClientEvent::MessageFailed {
                id: id.clone(),
                reason: reason.to_string(),
            });
        }
    }

    // === Reactions, pins, threads ===

    /// Toggle the local user's `emoji` reaction on a message
    ///
    /// Returns `None` if the message is not in the open room.
    pub fn toggle_reaction(&mut self, id: &MessageId, emoji: &str) -> Option<ReactionChange> {
        let local = self.identity.as_ref()?.id.clone();
        let change = self.store.mutate(id, |m| m.toggle_reaction(emoji, &local))?;
        self.events.publish(ClientEvent::MessageUpdated(id.clone()));

        let command = ClientCommand::ReactionUpdate(ReactionUpdatePayload {
            message_id: id.clone(),
            emoji: emoji.to_string(),
            user_id: local,
            recipient_id: self.active_peer().cloned(),
            active: change.is_active(),
        });
        if let Err(e) = self.connection.send(command) {
            tracing::debug!(message_id = %id, error = %e, "Reaction update not transmitted");
        }
        Some(change)
    }

    /// Pin a message; returns `true` if it was not pinned before
    pub fn pin(&mut self, id: &MessageId) -> bool {
        let changed = self.store.pin(id);
        if changed {
            self.events.publish(ClientEvent::MessageUpdated(id.clone()));
        }
        changed
    }

    /// Unpin a message; returns `true` if it was pinned before
    pub fn unpin(&mut self, id: &MessageId) -> bool {
        let changed = self.store.unpin(id);
        if changed {
            self.events.publish(ClientEvent::MessageUpdated(id.clone()));
        }
        changed
    }

    /// Pinned messages, oldest pin first
    pub fn pinned(&self) -> Vec<&Message> {
        self.store.pinned()
    }

    pub fn open_thread(&mut self, id: &MessageId) -> bool {
        self.store.open_thread(id)
    }

    pub fn close_thread(&mut self) {
        self.store.close_thread();
    }

    pub fn thread(&self) -> Option<ThreadSnapshot<'_>> {
        self.store.thread()
    }

    /// Reply to a message in its thread
    pub fn send_reply(&mut self, parent: &MessageId, content: &str) -> ClientResult<MessageId> {
        let (identity, peer) = self.active_participants()?;
        if self.store.get(parent).is_none() {
            return Err(DomainError::MessageNotFound(parent.clone()).into());
        }

        let reply = self
            .dispatcher
            .reply(&identity.id, &identity.name, content)?;
        let reply_id = reply.id.clone();
        let payload = ReplyPayload::from_reply(&reply);

        self.store.mutate(parent, |m| m.push_reply(reply));
        self.events.publish(ClientEvent::MessageUpdated(parent.clone()));

        let command = ClientCommand::ReplyUpdate(ReplyUpdatePayload {
            parent_id: parent.clone(),
            reply: payload,
            recipient_id: Some(peer),
        });
        if let Err(e) = self.connection.send(command) {
            tracing::debug!(message_id = %parent, error = %e, "Reply update not transmitted");
        }
        Ok(reply_id)
    }

    // === Typing ===

    /// Report whether the local user is typing
    ///
    /// Only transitions are transmitted; returns `true` on a transition.
    pub fn set_typing(&mut self, active: bool) -> bool {
        let Some(room) = &self.room else {
            return false;
        };
        if !self.typing.set_local(active) {
            return false;
        }

        let payload = RoomPayload::new(room.local_user(), room.peer());
        let command = if active {
            ClientCommand::TypingStart(payload)
        } else {
            ClientCommand::TypingStop(payload)
        };
        if let Err(e) = self.connection.send(command) {
            tracing::debug!(error = %e, "Typing signal not transmitted");
        }
        true
    }

    pub fn is_peer_typing(&self) -> bool {
        self.typing.is_peer_typing(Instant::now())
    }

    // === Projections ===

    /// Search the open timeline (see [`search`])
    pub fn search(&self, query: &str, filter: SearchFilter) -> Vec<&Message> {
        let Some(local) = self.local_user() else {
            return Vec::new();
        };
        search(
            self.store.messages(),
            local,
            query,
            filter,
            self.config.limits.search_result_limit,
        )
    }

    /// Statistics for the open timeline
    pub fn stats(&self) -> ConversationStats {
        self.local_user()
            .map(|local| ConversationStats::compute(self.store.messages(), local))
            .unwrap_or_default()
    }

    // === Event loop ===

    /// Apply the next inbound event or due timer
    ///
    /// Pends while there is nothing to wait for. Cancellation safe, so a
    /// driver can `select!` it against user input.
    pub async fn process_next(&mut self) {
        let deadline = self.next_deadline();

        tokio::select! {
            event = self.connection.next_event() => self.handle_transport_event(event),
            () = sleep_until(deadline) => self.poll_timeouts(Instant::now()).await,
        }
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.connection.retry_at(),
            self.room.as_ref().and_then(RoomSession::deadline),
            self.typing.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Fire everything due at `now`: reconnection, room deadlines, and
    /// typing expiry
    #[tracing::instrument(skip(self))]
    pub async fn poll_timeouts(&mut self, now: Instant) {
        let before = self.connection.state();
        if self.connection.reconnect_if_due(now).await {
            self.on_reconnected(now);
        }
        let after = self.connection.state();
        if after != before {
            self.events.publish(ClientEvent::ConnectionChanged(after));
        }

        if let Some(room) = self.room.as_mut() {
            if let Some(failure) = room.expire(now) {
                tracing::warn!(peer = %room.peer(), failure = %failure, "Room session failed");
                self.events.publish(ClientEvent::RoomFailed {
                    peer: room.peer().clone(),
                    failure,
                });
            }
        }

        if self.typing.expire(now) {
            if let Some(peer) = self.active_peer().cloned() {
                self.events
                    .publish(ClientEvent::PeerTyping { peer, active: false });
            }
        }
    }

    fn on_reconnected(&mut self, now: Instant) {
        self.history_requests.clear();

        let Some(room) = self.room.as_mut() else {
            return;
        };
        if room.state().is_failed() {
            return;
        }
        let token = self.tokens.issue();
        room.restart(token);
        tracing::info!(peer = %room.peer(), token = %token, "Rejoining room after reconnect");
        self.start_room(now);
    }

    /// Apply one event from the transport
    pub fn handle_transport_event(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Frame(frame) => self.handle_frame(frame),
            TransportEvent::Closed { reason } => self.handle_link_lost(&reason, Instant::now()),
        }
    }

    fn handle_link_lost(&mut self, reason: &str, now: Instant) {
        self.connection.handle_closed(reason, now);
        self.history_requests.clear();

        if let Some(room) = self.room.as_mut() {
            if matches!(room.state(), RoomState::LoadingHistory) {
                room.await_connection(now + self.config.timeouts.join_timeout());
            }
        }
        self.events
            .publish(ClientEvent::ConnectionChanged(self.connection.state()));
    }

    fn handle_frame(&mut self, frame: ServerEvent) {
        let Some(local) = self.local_user().cloned() else {
            tracing::debug!(event = %frame.event_type(), "Frame ignored while logged out");
            return;
        };
        tracing::trace!(event = %frame.event_type(), "Applying frame");

        match frame {
            ServerEvent::ChatHistory(history) => self.apply_history(history, &local),
            ServerEvent::ReceiveMessage(ReceivePayload { message }) => {
                self.apply_incoming(message, &local);
            }
            ServerEvent::MessageAck(ack) => self.apply_ack(ack),
            ServerEvent::ReactionUpdate(update) => self.apply_reaction_update(update, &local),
            ServerEvent::ReplyUpdate(update) => self.apply_reply_update(update),
            ServerEvent::TypingStart(payload) => self.apply_peer_typing(&payload, true),
            ServerEvent::TypingStop(payload) => self.apply_peer_typing(&payload, false),
            ServerEvent::Error(error) => self.apply_server_error(error),
        }
    }

    fn discard(&self, event: ChatEventType, token: Option<SessionToken>) {
        tracing::debug!(event = %event, token = ?token, "Discarding result for an inactive room");
        self.events
            .publish(ClientEvent::StaleResultDiscarded { event, token });
    }

    fn apply_history(&mut self, history: HistoryPayload, local: &UserId) {
        let token = self.history_requests.resolve(history.request_id);
        let accepted = self
            .room
            .as_ref()
            .is_some_and(|room| token.is_some_and(|token| room.accepts_history(token)));
        if !accepted {
            self.discard(ChatEventType::ChatHistory, token);
            return;
        }

        let messages: Vec<Message> = history
            .messages
            .into_iter()
            .filter_map(|payload| decode_message(payload, local))
            .collect();
        let carry = self.store.table().failed_from(local);
        self.store.replace_all(messages, carry);

        if let Some(room) = self.room.as_mut() {
            room.mark_ready();
            tracing::info!(peer = %room.peer(), count = self.store.len(), "History loaded");
            self.events.publish(ClientEvent::HistoryLoaded {
                peer: room.peer().clone(),
                count: self.store.len(),
            });
        }
    }

    fn route(&self, sender: &UserId, recipient: Option<&UserId>) -> Routing {
        self.room
            .as_ref()
            .map_or(Routing::Elsewhere, |room| room.route(sender, recipient))
    }

    fn apply_incoming(&mut self, payload: MessagePayload, local: &UserId) {
        let admitted = match self.route(&payload.sender_id, payload.recipient_id.as_ref()) {
            Routing::Room => true,
            Routing::LocalEcho => {
                let table = self.store.table();
                table.contains(&payload.id)
                    || payload
                        .correlation_id
                        .is_some_and(|c| table.find_by_correlation(&c).is_some())
            }
            Routing::Elsewhere => false,
        };
        if !admitted {
            self.discard(ChatEventType::ReceiveMessage, None);
            return;
        }

        let Some(message) = decode_message(payload, local) else {
            return;
        };
        let outcome = self.store.append(message);
        let event = match outcome {
            AppendOutcome::Appended(id) => ClientEvent::MessageAppended(id),
            AppendOutcome::Reconciled { id, .. } => ClientEvent::MessageUpdated(id),
        };
        self.events.publish(event);
    }

    fn apply_ack(&mut self, ack: AckPayload) {
        let Some(id) = self
            .store
            .table()
            .find_by_correlation(&ack.correlation_id)
            .cloned()
        else {
            tracing::debug!(correlation_id = %ack.correlation_id, "Ack for unknown message");
            return;
        };

        let reported = ack
            .status
            .as_deref()
            .map_or(MessageStatus::Sent, MessageStatus::parse_lenient);
        let status = self.store.mutate(&id, |m| {
            m.status = m.status.reconcile(reported);
            m.status
        });

        let id = match ack.id {
            Some(server_id) if server_id != id && self.store.rekey(&id, server_id.clone()) => {
                server_id
            }
            _ => id,
        };

        if status == Some(MessageStatus::Failed) {
            tracing::warn!(message_id = %id, "Message rejected by server");
            self.events.publish(ClientEvent::MessageFailed {
                id,
                reason: "rejected by server".to_string(),
            });
        } else {
            self.events.publish(ClientEvent::MessageUpdated(id));
        }
    }

    fn apply_reaction_update(&mut self, update: ReactionUpdatePayload, local: &UserId) {
        // Own updates were applied when toggled; an echo may be outdated
        if update.user_id == *local {
            return;
        }
        if self.route(&update.user_id, update.recipient_id.as_ref()) != Routing::Room {
            self.discard(ChatEventType::ReactionUpdate, None);
            return;
        }

        let changed = self
            .store
            .mutate(&update.message_id, |m| {
                m.set_reaction(&update.emoji, &update.user_id, update.active, local)
            })
            .unwrap_or(false);
        if changed {
            self.events
                .publish(ClientEvent::MessageUpdated(update.message_id));
        }
    }

    fn apply_reply_update(&mut self, update: ReplyUpdatePayload) {
        let admitted = match self.route(&update.reply.sender_id, update.recipient_id.as_ref()) {
            Routing::Room => true,
            Routing::LocalEcho => self.store.table().contains(&update.parent_id),
            Routing::Elsewhere => false,
        };
        if !admitted {
            self.discard(ChatEventType::ReplyUpdate, None);
            return;
        }

        let reply = update.reply.into_reply();
        let added = self
            .store
            .mutate(&update.parent_id, |m| m.push_reply(reply))
            .unwrap_or(false);
        if added {
            self.events
                .publish(ClientEvent::MessageUpdated(update.parent_id));
        }
    }

    fn apply_peer_typing(&mut self, payload: &RoomPayload, active: bool) {
        let Some(room) = &self.room else {
            return;
        };
        if room.peer() != &payload.user_id || room.local_user() != &payload.recipient_id {
            return;
        }

        let changed = if active {
            self.typing.peer_started(Instant::now())
        } else {
            self.typing.peer_stopped()
        };
        if changed {
            self.events.publish(ClientEvent::PeerTyping {
                peer: payload.user_id.clone(),
                active,
            });
        }
    }

    fn apply_server_error(&mut self, error: ErrorPayload) {
        tracing::warn!(code = %error.code, message = %error.message, "Server reported an error");

        if let Some(correlation_id) = error.correlation_id {
            if let Some(id) = self
                .store
                .table()
                .find_by_correlation(&correlation_id)
                .cloned()
            {
                self.mark_failed(&id, &error.message);
                return;
            }
        }

        if let Some(request_id) = error.request_id {
            let token = SessionToken::new(request_id);
            self.history_requests.forget(token);

            if let Some(room) = self.room.as_mut() {
                if room.token() == token && matches!(room.state(), RoomState::LoadingHistory) {
                    let failure = RoomFailure::HistoryLoad(error.message.clone());
                    room.fail(failure.clone());
                    self.events.publish(ClientEvent::RoomFailed {
                        peer: room.peer().clone(),
                        failure,
                    });
                    return;
                }
            }
        }

        self.events.publish(ClientEvent::ServerError {
            code: error.code,
            message: error.message,
        });
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("user", &self.local_user())
            .field("connection", &self.connection.state())
            .field("room", &self.room)
            .field("messages", &self.store.len())
            .finish_non_exhaustive()
    }
}

fn decode_message(payload: MessagePayload, local: &UserId) -> Option<Message> {
    let id = payload.id.clone();
    match payload.into_message(local) {
        Ok(message) => Some(message),
        Err(e) => {
            tracing::warn!(message_id = %id, error = %e, "Dropping invalid message");
            None
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
