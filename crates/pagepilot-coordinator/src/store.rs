//! Aggregate store.
//!
//! Owns every Project, Chat, Message and Image. Each mutation is applied to
//! a copy of the affected project record, written through the injected
//! [`KeyValueStore`], and only then installed in memory, so a failed write
//! leaves the in-memory state untouched.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use pagepilot_protocol::{
    project_key, Chat, ChatId, Image, KeyValueStore, Message, MessageId, Project, ProjectId,
    ProjectRecord, StateSnapshot, StoreError, PROJECT_INDEX_KEY,
};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Result of appending an exchange to a chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    /// Messages dropped to keep the chat within its history bound.
    pub evicted: usize,
}

pub struct AggregateStore {
    kv: Arc<dyn KeyValueStore>,
    order: Vec<ProjectId>,
    records: HashMap<ProjectId, ProjectRecord>,
    chat_index: HashMap<ChatId, ProjectId>,
    max_messages_per_chat: usize,
}

impl AggregateStore {
    /// Empty store that writes through `kv`.
    pub fn new(kv: Arc<dyn KeyValueStore>, max_messages_per_chat: usize) -> Self {
        Self {
            kv,
            order: Vec::new(),
            records: HashMap::new(),
            chat_index: HashMap::new(),
            max_messages_per_chat: max_messages_per_chat.max(2),
        }
    }

    /// Rehydrate everything `kv` holds.
    ///
    /// Index entries whose record is missing are skipped with a warning.
    pub async fn load(
        kv: Arc<dyn KeyValueStore>,
        max_messages_per_chat: usize,
    ) -> Result<Self, StoreError> {
        let mut store = Self::new(kv, max_messages_per_chat);

        let ids: Vec<ProjectId> = match store.kv.get(PROJECT_INDEX_KEY).await? {
            Some(value) => serde_json::from_value(value)?,
            None => Vec::new(),
        };

        for id in ids {
            let Some(value) = store.kv.get(&project_key(&id)).await? else {
                warn!(project_id = %id, "Project listed in index has no record");
                continue;
            };
            let record: ProjectRecord = serde_json::from_value(value)?;
            store.install(record);
        }

        info!(projects = store.order.len(), "Aggregate store loaded");
        Ok(store)
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.records.get(id).map(|r| &r.project)
    }

    pub fn chat(&self, id: &ChatId) -> Option<&Chat> {
        self.record_of_chat(id)?.chats.iter().find(|c| &c.id == id)
    }

    pub fn message(&self, chat_id: &ChatId, id: &MessageId) -> Option<&Message> {
        self.record_of_chat(chat_id)?
            .messages
            .iter()
            .find(|m| &m.id == id)
    }

    /// Messages of a chat in order.
    pub fn messages(&self, chat_id: &ChatId) -> Vec<&Message> {
        let Some(chat) = self.chat(chat_id) else {
            return Vec::new();
        };
        chat.message_ids
            .iter()
            .filter_map(|id| self.message(chat_id, id))
            .collect()
    }

    pub fn project_count(&self) -> usize {
        self.order.len()
    }

    /// Every project in creation order.
    pub fn snapshot(&self) -> StateSnapshot {
        StateSnapshot {
            projects: self
                .order
                .iter()
                .filter_map(|id| self.records.get(id).cloned())
                .collect(),
        }
    }

    pub async fn create_project(&mut self, name: String) -> Result<Project, StoreError> {
        let project = Project::new(name);
        let record = ProjectRecord {
            project: project.clone(),
            chats: Vec::new(),
            messages: Vec::new(),
            images: Vec::new(),
        };

        self.write_record(&record).await?;
        let mut order = self.order.clone();
        order.push(project.id.clone());
        self.kv
            .set(PROJECT_INDEX_KEY, serde_json::to_value(&order)?)
            .await?;

        self.order = order;
        self.install(record);
        debug!(project_id = %project.id, "Project created");
        Ok(project)
    }

    /// Apply `update` to a project and bump `updated_at`.
    pub async fn update_project(
        &mut self,
        id: &ProjectId,
        update: impl FnOnce(&mut Project),
    ) -> Result<Option<Project>, StoreError> {
        let Some(mut record) = self.records.get(id).cloned() else {
            return Ok(None);
        };
        update(&mut record.project);
        record.project.touch();

        let project = record.project.clone();
        self.commit(record).await?;
        Ok(Some(project))
    }

    /// Create a chat under `project_id`. `None` when the project is missing.
    pub async fn create_chat(
        &mut self,
        project_id: &ProjectId,
        title: String,
    ) -> Result<Option<Chat>, StoreError> {
        let Some(mut record) = self.records.get(project_id).cloned() else {
            return Ok(None);
        };

        let chat = Chat::new(project_id.clone(), title);
        record.project.attach_chat(chat.id.clone());
        record.project.touch();
        record.chats.push(chat.clone());

        self.commit(record).await?;
        Ok(Some(chat))
    }

    /// Append a user/assistant pair to a chat.
    ///
    /// An image-generation reply becomes the chat's `last_image_message_id`.
    /// History beyond the bound is evicted oldest first; the current image
    /// message and any message an Image was extracted from are kept.
    pub async fn append_exchange(
        &mut self,
        chat_id: &ChatId,
        user: Message,
        assistant: Message,
    ) -> Result<Option<Appended>, StoreError> {
        let Some(mut record) = self.record_of_chat(chat_id).cloned() else {
            return Ok(None);
        };
        let Some(chat) = record.chats.iter_mut().find(|c| &c.id == chat_id) else {
            return Ok(None);
        };

        chat.message_ids.push(user.id.clone());
        chat.message_ids.push(assistant.id.clone());
        if assistant.is_image_bearing() {
            chat.last_image_message_id = Some(assistant.id.clone());
        }

        let pinned: HashSet<MessageId> = record
            .images
            .iter()
            .filter(|i| &i.chat_id == chat_id)
            .map(|i| i.source_message_id.clone())
            .chain(chat.last_image_message_id.clone())
            .collect();
        let evicted = evict_oldest(&mut chat.message_ids, self.max_messages_per_chat, &pinned);

        record.messages.push(user);
        record.messages.push(assistant);
        if !evicted.is_empty() {
            record.messages.retain(|m| !evicted.contains(&m.id));
            debug!(chat_id = %chat_id, count = evicted.len(), "Evicted old messages");
        }

        self.commit(record).await?;
        Ok(Some(Appended {
            evicted: evicted.len(),
        }))
    }

    /// Record an extracted image. `None` when its chat is missing.
    pub async fn add_image(&mut self, image: Image) -> Result<Option<Image>, StoreError> {
        let Some(mut record) = self.record_of_chat(&image.chat_id).cloned() else {
            return Ok(None);
        };
        record.images.push(image.clone());
        self.commit(record).await?;
        Ok(Some(image))
    }

    fn record_of_chat(&self, chat_id: &ChatId) -> Option<&ProjectRecord> {
        let project_id = self.chat_index.get(chat_id)?;
        self.records.get(project_id)
    }

    async fn write_record(&self, record: &ProjectRecord) -> Result<(), StoreError> {
        let value: Value = serde_json::to_value(record)?;
        self.kv.set(&project_key(&record.project.id), value).await
    }

    async fn commit(&mut self, record: ProjectRecord) -> Result<(), StoreError> {
        self.write_record(&record).await?;
        self.install(record);
        Ok(())
    }

    fn install(&mut self, record: ProjectRecord) {
        let id = record.project.id.clone();
        for chat in &record.chats {
            self.chat_index.insert(chat.id.clone(), id.clone());
        }
        if !self.order.contains(&id) {
            self.order.push(id.clone());
        }
        self.records.insert(id, record);
    }
}

/// Drop the oldest unpinned ids until at most `bound` remain.
fn evict_oldest(
    ids: &mut Vec<MessageId>,
    bound: usize,
    pinned: &HashSet<MessageId>,
) -> HashSet<MessageId> {
    let mut excess = ids.len().saturating_sub(bound);
    let mut evicted = HashSet::new();
    ids.retain(|id| {
        if excess > 0 && !pinned.contains(id) {
            excess -= 1;
            evicted.insert(id.clone());
            false
        } else {
            true
        }
    });
    evicted
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
