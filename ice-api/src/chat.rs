//! Streaming conversation sub-protocol
//!
//! A stateful chat loop on top of the dispatcher. Each conversation keeps a
//! bounded FIFO of (user, assistant) pairs. A turn holds its conversation's
//! lock from transcript assembly through the history append, so turns on
//! one conversation id are serialized while different ids never contend.

use crate::emitter::EventEmitter;
use crate::responder::{resolve_system_responder, ChatMessage, ResponderProvider, SYSTEM_AGENT};
use dashmap::DashMap;
use ice_core::ConversationId;
use ice_ipc::{ApiError, ApiResult, ChatStreamEvent};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Action name routed to the streaming sub-protocol.
pub const CHAT_STREAM_ACTION: &str = "system.chat.stream";

/// Message that clears a conversation instead of producing a reply.
pub const RESET_TOKEN: &str = "__reset_memory__";

/// Acknowledgement carried by the `end` event of a reset.
pub const RESET_ACK: &str = "[System] Conversation reset.";

/// Conversation used when the caller names none.
pub const DEFAULT_CONVERSATION: &str = "default";

/// One completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatTurn {
    pub user: String,
    pub assistant: String,
}

type History = Arc<Mutex<VecDeque<ChatTurn>>>;

// ============================================================================
// CONVERSATION STORE
// ============================================================================

/// Per-conversation bounded histories.
#[derive(Debug)]
pub struct ConversationStore {
    capacity: usize,
    conversations: DashMap<ConversationId, History>,
}

impl ConversationStore {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            conversations: DashMap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn slot(&self, conversation_id: &str) -> History {
        self.conversations
            .entry(conversation_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::with_capacity(self.capacity))))
            .clone()
    }

    /// Snapshot of a conversation's history, oldest first.
    pub async fn history(&self, conversation_id: &str) -> Vec<ChatTurn> {
        let slot = self.conversations.get(conversation_id).map(|s| s.clone());
        match slot {
            Some(slot) => slot.lock().await.iter().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Clear a conversation's history. Waits for an in-flight turn to finish.
    ///
    /// The slot itself stays in place: a turn queued behind the reset holds
    /// the same slot and must append to the history later turns read.
    pub async fn reset(&self, conversation_id: &str) {
        let slot = self.conversations.get(conversation_id).map(|s| s.clone());
        if let Some(slot) = slot {
            slot.lock().await.clear();
        }
    }

    /// Number of conversations with stored state.
    pub fn len(&self) -> usize {
        self.conversations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.conversations.is_empty()
    }
}

fn push_bounded(history: &mut VecDeque<ChatTurn>, turn: ChatTurn, capacity: usize) {
    while history.len() >= capacity {
        history.pop_front();
    }
    history.push_back(turn);
}

/// Split a reply into `chunk` deltas on single spaces.
///
/// Every delta but the last keeps its trailing space, so concatenating the
/// deltas reproduces the reply exactly.
pub fn split_chunks(text: &str) -> Vec<String> {
    let tokens: Vec<&str> = text.split(' ').collect();
    let last = tokens.len().saturating_sub(1);
    tokens
        .into_iter()
        .enumerate()
        .map(|(i, tok)| if i < last { format!("{} ", tok) } else { tok.to_string() })
        .collect()
}

// ============================================================================
// STREAMING
// ============================================================================

/// One inbound chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatRequest {
    pub conversation_id: ConversationId,
    pub message: String,
    /// Caller correlation id echoed as `message_id`.
    pub request_id: Option<String>,
}

impl ChatRequest {
    pub fn new(conversation_id: impl Into<ConversationId>, message: impl Into<String>) -> Self {
        Self {
            conversation_id: conversation_id.into(),
            message: message.into(),
            request_id: None,
        }
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }
}

/// Run one chat turn, emitting its events.
///
/// - empty (after trimming) messages are ignored
/// - `RESET_TOKEN` clears history and emits a single `end` event
/// - otherwise the system responder is asked, history is updated, and the
///   reply is streamed as `chunk` events followed by one `end` event
pub async fn stream_chat(
    store: &ConversationStore,
    system_prompt: &str,
    responders: Option<&dyn ResponderProvider>,
    emitter: &dyn EventEmitter,
    request: ChatRequest,
) -> ApiResult<()> {
    let message = request.message.trim();
    let conversation_id = request.conversation_id.as_str();
    let message_id = request.request_id.clone();

    if message.is_empty() {
        debug!(conversation_id, "Ignoring empty chat message");
        return Ok(());
    }

    if message == RESET_TOKEN {
        store.reset(conversation_id).await;
        debug!(conversation_id, "Conversation reset");
        emitter
            .emit(ChatStreamEvent::end(conversation_id, message_id, RESET_ACK).into())
            .await?;
        return Ok(());
    }

    let reply = {
        let slot = store.slot(conversation_id);
        let mut history = slot.lock().await;

        let mut transcript = Vec::with_capacity(history.len() * 2 + 2);
        transcript.push(ChatMessage::system(system_prompt));
        for turn in history.iter() {
            transcript.push(ChatMessage::user(turn.user.clone()));
            transcript.push(ChatMessage::assistant(turn.assistant.clone()));
        }
        transcript.push(ChatMessage::user(message));

        let responder = resolve_system_responder(responders)?;
        let reply = responder
            .chat(&transcript, message)
            .await
            .map_err(|e| ApiError::execution(CHAT_STREAM_ACTION, SYSTEM_AGENT, &e, None))?;

        push_bounded(
            &mut history,
            ChatTurn {
                user: message.to_string(),
                assistant: reply.clone(),
            },
            store.capacity(),
        );
        reply
    };

    debug!(conversation_id, chars = reply.len(), "Streaming chat reply");
    for delta in split_chunks(&reply) {
        emitter
            .emit(ChatStreamEvent::chunk(conversation_id, message_id.clone(), delta).into())
            .await?;
    }
    emitter
        .emit(ChatStreamEvent::end(conversation_id, message_id, reply).into())
        .await?;
    Ok(())
}
