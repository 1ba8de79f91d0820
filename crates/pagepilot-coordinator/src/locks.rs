//! Per-chat serialization.

use std::collections::HashSet;

use pagepilot_protocol::ChatId;
use parking_lot::Mutex;
use tracing::trace;

/// Set of chats with an action in flight.
#[derive(Default)]
pub struct ChatLocks {
    held: Mutex<HashSet<ChatId>>,
}

impl ChatLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the chat, or `None` when another command holds it.
    pub fn try_acquire(&self, chat_id: &ChatId) -> Option<ChatGuard<'_>> {
        if !self.held.lock().insert(chat_id.clone()) {
            return None;
        }
        trace!(%chat_id, "Chat lock acquired");
        Some(ChatGuard {
            locks: self,
            chat_id: chat_id.clone(),
        })
    }

    pub fn is_held(&self, chat_id: &ChatId) -> bool {
        self.held.lock().contains(chat_id)
    }
}

/// Releases the chat on drop, including on timeout and cancellation.
pub struct ChatGuard<'a> {
    locks: &'a ChatLocks,
    chat_id: ChatId,
}

impl Drop for ChatGuard<'_> {
    fn drop(&mut self) {
        self.locks.held.lock().remove(&self.chat_id);
        trace!(chat_id = %self.chat_id, "Chat lock released");
    }
}
