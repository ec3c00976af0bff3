//! Conversations and messages between the session user and counterparties.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};
use workit_shared::constants::{KEY_CONVERSATIONS, KEY_MESSAGES};
use workit_shared::types::{ConversationId, MessageId, UserId};
use workit_shared::ValidationError;
use workit_store::{Conversation, Message};

use crate::error::{ClientError, Result};
use crate::persist::{self, SharedDatabase};
use crate::seed;
use crate::stores::session::SessionAccessor;

#[derive(Default)]
struct ConversationState {
    /// Insertion order is the listing order.
    conversations: Vec<Conversation>,
    messages: HashMap<ConversationId, Vec<Message>>,
}

impl ConversationState {
    fn find(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    fn unread_for(&self, user: &UserId, only: Option<&ConversationId>) -> usize {
        self.messages
            .iter()
            .filter(|(id, _)| only.map_or(true, |only| *id == only))
            .flat_map(|(_, thread)| thread)
            .filter(|m| &m.receiver_id == user && !m.is_read)
            .count()
    }
}

pub struct ConversationStore {
    db: SharedDatabase,
    session: Arc<dyn SessionAccessor>,
    state: Mutex<ConversationState>,
}

impl ConversationStore {
    /// Hydrate conversations and messages from local storage.
    pub fn open(db: SharedDatabase, session: Arc<dyn SessionAccessor>) -> Self {
        let conversations: Vec<Conversation> =
            persist::load_json(&db, KEY_CONVERSATIONS).unwrap_or_default();
        let messages: HashMap<ConversationId, Vec<Message>> =
            persist::load_json(&db, KEY_MESSAGES).unwrap_or_default();

        debug!(
            conversations = conversations.len(),
            threads = messages.len(),
            "hydrated conversation store"
        );

        Self {
            db,
            session,
            state: Mutex::new(ConversationState {
                conversations,
                messages,
            }),
        }
    }

    /// Conversations the current user takes part in, in creation order.
    pub fn list_conversations(&self) -> Vec<Conversation> {
        let Some(me) = self.session.current_user_id() else {
            return Vec::new();
        };
        self.lock()
            .conversations
            .iter()
            .filter(|c| c.involves(&me))
            .cloned()
            .collect()
    }

    pub fn get_conversation(&self, id: &ConversationId) -> Option<Conversation> {
        self.lock().find(id).cloned()
    }

    /// Messages of a conversation, oldest first. Empty for unknown ids.
    pub fn get_messages(&self, id: &ConversationId) -> Vec<Message> {
        self.lock().messages.get(id).cloned().unwrap_or_default()
    }

    /// The participant on the other side from the current user.
    pub fn counterpart(&self, conversation: &Conversation) -> Option<UserId> {
        let me = self.session.current_user_id()?;
        conversation.other_participant(&me).cloned()
    }

    /// Conversations of the current user whose title contains `query`,
    /// ignoring case. A blank query matches everything.
    pub fn search_conversations(&self, query: &str) -> Vec<Conversation> {
        let needle = query.trim().to_lowercase();
        self.list_conversations()
            .into_iter()
            .filter(|c| {
                needle.is_empty()
                    || c.title
                        .as_deref()
                        .is_some_and(|t| t.to_lowercase().contains(&needle))
            })
            .collect()
    }

    pub fn send_message(&self, conversation_id: &ConversationId, text: &str) -> Result<Message> {
        let me = self
            .session
            .current_user_id()
            .ok_or(ClientError::Unauthenticated)?;

        let content = text.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }

        let mut guard = self.lock();
        let state = &mut *guard;
        let conversation = state
            .conversations
            .iter_mut()
            .find(|c| &c.id == conversation_id)
            .ok_or_else(|| ClientError::not_found("conversation", conversation_id))?;
        let receiver_id = conversation
            .other_participant(&me)
            .cloned()
            .ok_or_else(|| ClientError::not_found("conversation", conversation_id))?;

        let message = Message {
            id: MessageId::generate(),
            conversation_id: conversation_id.clone(),
            sender_id: me,
            receiver_id,
            content: content.to_string(),
            timestamp: Utc::now(),
            is_read: false,
        };

        conversation.last_message = Some(message.clone());
        state
            .messages
            .entry(conversation_id.clone())
            .or_default()
            .push(message.clone());

        self.save(state);
        info!(
            conversation_id = %conversation_id,
            message_id = %message.id,
            "message sent"
        );
        Ok(message)
    }

    /// Return the conversation between the current user and `other`,
    /// creating it if the pair has none yet.
    pub fn start_conversation(&self, other: &UserId, title: Option<&str>) -> Result<ConversationId> {
        let me = self
            .session
            .current_user_id()
            .ok_or(ClientError::Unauthenticated)?;
        if &me == other {
            return Err(ValidationError::SelfConversation.into());
        }

        let mut state = self.lock();
        if let Some(existing) = state.conversations.iter().find(|c| c.is_between(&me, other)) {
            debug!(conversation_id = %existing.id, "conversation already exists");
            return Ok(existing.id.clone());
        }

        let conversation = Conversation {
            id: ConversationId::generate(),
            participants: [me, other.clone()],
            title: title
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(String::from),
            last_message: None,
        };
        let id = conversation.id.clone();

        state.conversations.push(conversation);
        state.messages.entry(id.clone()).or_default();
        self.save(&state);

        info!(conversation_id = %id, with = %other, "conversation started");
        Ok(id)
    }

    /// Mark every message addressed to the current user in this
    /// conversation as read. Returns how many changed.
    pub fn mark_conversation_read(&self, conversation_id: &ConversationId) -> Result<usize> {
        let me = self
            .session
            .current_user_id()
            .ok_or(ClientError::Unauthenticated)?;

        let mut state = self.lock();
        let mut changed = 0;
        if let Some(thread) = state.messages.get_mut(conversation_id) {
            for message in thread.iter_mut().filter(|m| m.receiver_id == me && !m.is_read) {
                message.is_read = true;
                changed += 1;
            }
        }
        if changed == 0 {
            return Ok(0);
        }

        if let Some(conversation) = state
            .conversations
            .iter_mut()
            .find(|c| &c.id == conversation_id)
        {
            if let Some(last) = conversation.last_message.as_mut() {
                if last.receiver_id == me {
                    last.is_read = true;
                }
            }
        }

        self.save(&state);
        debug!(conversation_id = %conversation_id, changed, "conversation marked read");
        Ok(changed)
    }

    /// Unread messages addressed to the current user, across all conversations.
    pub fn unread_count(&self) -> usize {
        match self.session.current_user_id() {
            Some(me) => self.lock().unread_for(&me, None),
            None => 0,
        }
    }

    pub fn unread_count_for(&self, conversation_id: &ConversationId) -> usize {
        match self.session.current_user_id() {
            Some(me) => self.lock().unread_for(&me, Some(conversation_id)),
            None => 0,
        }
    }

    /// Load the demo conversations. Does nothing if any conversation data
    /// exists in memory or in storage. Returns whether data was seeded.
    pub fn seed_demo_data(&self) -> Result<bool> {
        let me = self
            .session
            .current_user_id()
            .ok_or(ClientError::Unauthenticated)?;

        let mut state = self.lock();
        if !state.conversations.is_empty()
            || !state.messages.is_empty()
            || persist::has_key(&self.db, KEY_CONVERSATIONS)
            || persist::has_key(&self.db, KEY_MESSAGES)
        {
            debug!("conversation data present, skipping demo seed");
            return Ok(false);
        }

        let (conversations, messages) = seed::conversations(&me);
        state.conversations = conversations;
        state.messages = messages;
        self.save(&state);

        info!(conversations = state.conversations.len(), "seeded demo conversations");
        Ok(true)
    }

    fn save(&self, state: &ConversationState) {
        persist::save_json(&self.db, KEY_CONVERSATIONS, &state.conversations);
        persist::save_json(&self.db, KEY_MESSAGES, &state.messages);
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}
