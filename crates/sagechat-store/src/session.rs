use sagechat_types::{default_title, ChatHistory, ChatMessage, CURRENT_CHAT_KEY, HISTORIES_KEY};
use tracing::{debug, info};

use crate::kv::KeyValueStore;
use crate::summary::{HistorySummary, Transcript};
use crate::{Result, StoreError};

/// Chat histories plus the active chat, persisted on every mutation.
///
/// The active message list is the active history's own `messages`, so the
/// live view and the backing history cannot drift apart.
pub struct ChatSessionStore<S: KeyValueStore> {
    storage: S,
    histories: Vec<ChatHistory>,
    current_chat_id: Option<String>,
}

impl<S: KeyValueStore> ChatSessionStore<S> {
    /// Start with no histories, ignoring anything already in `storage`
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            histories: Vec::new(),
            current_chat_id: None,
        }
    }

    /// Restore histories and the active chat id from `storage`.
    ///
    /// A stored id that names no known history leaves no chat active.
    pub fn load(storage: S) -> Result<Self> {
        let histories: Vec<ChatHistory> = match storage.load(HISTORIES_KEY)? {
            Some(raw) => serde_json::from_str(&raw).map_err(|source| StoreError::Corrupt {
                key: HISTORIES_KEY.to_string(),
                source,
            })?,
            None => Vec::new(),
        };

        let current_chat_id = storage
            .load(CURRENT_CHAT_KEY)?
            .map(|id| id.trim().to_string())
            .filter(|id| histories.iter().any(|h| &h.id == id));

        info!(
            histories = histories.len(),
            active = current_chat_id.as_deref().unwrap_or("-"),
            "loaded chat sessions"
        );

        Ok(Self {
            storage,
            histories,
            current_chat_id,
        })
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Histories in creation order
    pub fn histories(&self) -> &[ChatHistory] {
        &self.histories
    }

    pub fn get(&self, id: &str) -> Option<&ChatHistory> {
        self.histories.iter().find(|h| h.id == id)
    }

    pub fn current_chat_id(&self) -> Option<&str> {
        self.current_chat_id.as_deref()
    }

    pub fn active_chat(&self) -> Option<&ChatHistory> {
        self.current_chat_id.as_deref().and_then(|id| self.get(id))
    }

    /// Messages of the active chat, or nothing when no chat is active
    pub fn messages(&self) -> &[ChatMessage] {
        self.active_chat().map(|h| h.messages.as_slice()).unwrap_or(&[])
    }

    /// Display order: starred first, newest first within each group
    pub fn sorted_histories(&self) -> Vec<&ChatHistory> {
        let mut sorted: Vec<&ChatHistory> = self.histories.iter().collect();
        sorted.sort_by(|a, b| {
            b.is_starred
                .cmp(&a.is_starred)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        sorted
    }

    /// Sidebar rows in display order
    pub fn summaries(&self) -> Vec<HistorySummary> {
        self.sorted_histories()
            .into_iter()
            .map(|h| HistorySummary::from_history(h, self.current_chat_id() == Some(h.id.as_str())))
            .collect()
    }

    /// Create a history seeded with the greeting and make it active
    pub fn create_chat(&mut self) -> Result<String> {
        let history = ChatHistory::new(default_title(self.histories.len() + 1));
        let id = history.id.clone();
        debug!(chat_id = %id, title = %history.title, "creating chat");

        self.histories.push(history);
        self.current_chat_id = Some(id.clone());
        self.persist()?;
        Ok(id)
    }

    /// Make `id` the active chat. Unknown ids are ignored.
    pub fn select_chat(&mut self, id: &str) -> Result<bool> {
        if self.get(id).is_none() {
            debug!(chat_id = %id, "ignoring selection of unknown chat");
            return Ok(false);
        }
        self.current_chat_id = Some(id.to_string());
        self.persist()?;
        Ok(true)
    }

    /// Rename a chat. Blank titles are ignored; others are stored trimmed.
    pub fn rename_chat(&mut self, id: &str, title: &str) -> Result<bool> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(false);
        }
        match self.histories.iter_mut().find(|h| h.id == id) {
            Some(history) => history.title = title.to_string(),
            None => return Ok(false),
        }
        self.persist()?;
        Ok(true)
    }

    pub fn toggle_star(&mut self, id: &str) -> Result<bool> {
        match self.histories.iter_mut().find(|h| h.id == id) {
            Some(history) => history.is_starred = !history.is_starred,
            None => return Ok(false),
        }
        self.persist()?;
        Ok(true)
    }

    /// Delete a chat.
    ///
    /// Deleting the active chat activates the most recently created remaining
    /// chat, or a freshly created one when none remain.
    pub fn delete_chat(&mut self, id: &str) -> Result<bool> {
        let before = self.histories.len();
        self.histories.retain(|h| h.id != id);
        if self.histories.len() == before {
            return Ok(false);
        }
        debug!(chat_id = %id, "deleted chat");

        if self.current_chat_id.as_deref() == Some(id) {
            let fallback = self
                .histories
                .iter()
                .max_by_key(|h| h.created_at)
                .map(|h| h.id.clone());
            match fallback {
                Some(next) => self.current_chat_id = Some(next),
                None => {
                    self.current_chat_id = None;
                    self.create_chat()?;
                    return Ok(true);
                }
            }
        }

        self.persist()?;
        Ok(true)
    }

    /// Append messages to the named chat. Unknown ids are ignored.
    pub fn append_messages<I>(&mut self, id: &str, messages: I) -> Result<bool>
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        match self.histories.iter_mut().find(|h| h.id == id) {
            Some(history) => history.messages.extend(messages),
            None => return Ok(false),
        }
        self.persist()?;
        Ok(true)
    }

    /// Guarantee an active chat: the newest history, or a new one
    pub fn ensure_active_chat(&mut self) -> Result<String> {
        if let Some(id) = self.current_chat_id.clone() {
            return Ok(id);
        }
        let newest = self
            .histories
            .iter()
            .max_by_key(|h| h.created_at)
            .map(|h| h.id.clone());
        match newest {
            Some(id) => {
                self.select_chat(&id)?;
                Ok(id)
            }
            None => self.create_chat(),
        }
    }

    pub fn export_chat(&self, id: &str) -> Option<Transcript> {
        self.get(id).map(Transcript::from_history)
    }

    fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.histories).map_err(StoreError::Serialize)?;
        self.storage.save(HISTORIES_KEY, &json)?;
        match &self.current_chat_id {
            Some(id) => self.storage.save(CURRENT_CHAT_KEY, id),
            None => self.storage.remove(CURRENT_CHAT_KEY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use chrono::{Duration, Utc};
    use pretty_assertions::assert_eq;
    use sagechat_types::{Role, GREETING};

    fn store() -> ChatSessionStore<MemoryStore> {
        ChatSessionStore::new(MemoryStore::new())
    }

    fn stored_histories(store: &ChatSessionStore<MemoryStore>) -> Vec<ChatHistory> {
        serde_json::from_str(store.storage().get(HISTORIES_KEY).unwrap()).unwrap()
    }

    #[test]
    fn create_chat_seeds_exactly_one_greeting() {
        let mut store = store();
        let id = store.create_chat().unwrap();

        assert_eq!(store.current_chat_id(), Some(id.as_str()));
        assert_eq!(store.messages().len(), 1);
        assert_eq!(store.messages()[0].role, Role::Assistant);
        assert_eq!(store.messages()[0].content, GREETING);
        assert_eq!(store.storage().get(CURRENT_CHAT_KEY), Some(id.as_str()));
        assert_eq!(stored_histories(&store).len(), 1);
    }

    #[test]
    fn default_titles_count_existing_chats() {
        let mut store = store();
        store.create_chat().unwrap();
        let second = store.create_chat().unwrap();

        assert_eq!(store.get(&second).unwrap().title, "新对话 2");
    }

    #[test]
    fn selecting_unknown_chat_is_a_no_op() {
        let mut store = store();
        let id = store.create_chat().unwrap();

        assert!(!store.select_chat("missing").unwrap());
        assert_eq!(store.current_chat_id(), Some(id.as_str()));
    }

    #[test]
    fn select_switches_active_messages() {
        let mut store = store();
        let first = store.create_chat().unwrap();
        store
            .append_messages(&first, [ChatMessage::user("first chat")])
            .unwrap();
        store.create_chat().unwrap();

        assert_eq!(store.messages().len(), 1);
        assert!(store.select_chat(&first).unwrap());
        assert_eq!(store.messages().len(), 2);
        assert_eq!(store.storage().get(CURRENT_CHAT_KEY), Some(first.as_str()));
    }

    #[test]
    fn blank_rename_is_ignored() {
        let mut store = store();
        let id = store.create_chat().unwrap();

        assert!(!store.rename_chat(&id, "   ").unwrap());
        assert_eq!(store.get(&id).unwrap().title, "新对话 1");

        assert!(store.rename_chat(&id, "  旅行  ").unwrap());
        assert_eq!(store.get(&id).unwrap().title, "旅行");
        assert_eq!(stored_histories(&store)[0].title, "旅行");
    }

    #[test]
    fn toggle_star_flips_and_persists() {
        let mut store = store();
        let id = store.create_chat().unwrap();

        store.toggle_star(&id).unwrap();
        assert!(stored_histories(&store)[0].is_starred);
        store.toggle_star(&id).unwrap();
        assert!(!stored_histories(&store)[0].is_starred);
    }

    #[test]
    fn deleting_active_chat_selects_most_recent_remaining() {
        let mut store = store();
        let oldest = store.create_chat().unwrap();
        let newer = store.create_chat().unwrap();
        let active = store.create_chat().unwrap();
        store.histories[0].created_at = Utc::now() - Duration::hours(2);
        store.histories[1].created_at = Utc::now() - Duration::hours(1);

        assert!(store.delete_chat(&active).unwrap());

        assert_eq!(store.current_chat_id(), Some(newer.as_str()));
        assert!(store.get(&oldest).is_some());
        assert_eq!(store.storage().get(CURRENT_CHAT_KEY), Some(newer.as_str()));
    }

    #[test]
    fn deleting_last_chat_creates_a_fresh_one() {
        let mut store = store();
        let only = store.create_chat().unwrap();

        store.delete_chat(&only).unwrap();

        assert_eq!(store.histories().len(), 1);
        let fresh = store.current_chat_id().unwrap().to_string();
        assert_ne!(fresh, only);
        assert_eq!(store.messages().len(), 1);
        assert_eq!(stored_histories(&store)[0].id, fresh);
    }

    #[test]
    fn deleting_inactive_chat_keeps_selection() {
        let mut store = store();
        let other = store.create_chat().unwrap();
        let active = store.create_chat().unwrap();

        store.delete_chat(&other).unwrap();

        assert_eq!(store.current_chat_id(), Some(active.as_str()));
        assert!(!store.delete_chat("missing").unwrap());
    }

    #[test]
    fn starred_sort_before_unstarred_then_newest_first() {
        let mut store = store();
        let old_starred = store.create_chat().unwrap();
        let new_plain = store.create_chat().unwrap();
        let old_plain = store.create_chat().unwrap();
        let new_starred = store.create_chat().unwrap();

        let now = Utc::now();
        for (id, age, starred) in [
            (&old_starred, 40, true),
            (&new_plain, 5, false),
            (&old_plain, 30, false),
            (&new_starred, 10, true),
        ] {
            let h = store.histories.iter_mut().find(|h| &h.id == id).unwrap();
            h.created_at = now - Duration::minutes(age);
            h.is_starred = starred;
        }

        let order: Vec<&str> = store.sorted_histories().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(
            order,
            vec![
                new_starred.as_str(),
                old_starred.as_str(),
                new_plain.as_str(),
                old_plain.as_str()
            ]
        );
    }

    #[test]
    fn append_to_unknown_chat_is_ignored() {
        let mut store = store();
        store.create_chat().unwrap();

        assert!(!store
            .append_messages("missing", [ChatMessage::user("lost")])
            .unwrap());
        assert_eq!(store.messages().len(), 1);
    }

    #[test]
    fn load_round_trips_histories_and_active_chat() {
        let mut store = store();
        let id = store.create_chat().unwrap();
        store
            .append_messages(&id, [ChatMessage::user("hello"), ChatMessage::assistant("hi")])
            .unwrap();

        let restored = ChatSessionStore::load(store.into_storage()).unwrap();

        assert_eq!(restored.current_chat_id(), Some(id.as_str()));
        assert_eq!(restored.messages().len(), 3);
        assert_eq!(restored.messages()[1].content, "hello");
    }

    #[test]
    fn load_drops_stale_active_chat_id() {
        let storage = MemoryStore::with_entries([
            (HISTORIES_KEY, "[]"),
            (CURRENT_CHAT_KEY, "gone"),
        ]);

        let store = ChatSessionStore::load(storage).unwrap();

        assert!(store.current_chat_id().is_none());
        assert!(store.messages().is_empty());
    }

    #[test]
    fn load_reports_corrupt_histories() {
        let storage = MemoryStore::with_entries([(HISTORIES_KEY, "{not json")]);

        let err = ChatSessionStore::load(storage).err().unwrap();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == HISTORIES_KEY));
    }

    #[test]
    fn ensure_active_chat_prefers_newest_existing() {
        let mut store = store();
        let newer = store.create_chat().unwrap();
        let older = store.create_chat().unwrap();
        store.histories[1].created_at = Utc::now() - Duration::days(1);
        store.current_chat_id = None;

        assert_eq!(store.ensure_active_chat().unwrap(), newer);
        assert_ne!(older, newer);
        assert_eq!(store.storage().get(CURRENT_CHAT_KEY), Some(newer.as_str()));

        let mut empty = ChatSessionStore::new(MemoryStore::new());
        let created = empty.ensure_active_chat().unwrap();
        assert_eq!(empty.histories().len(), 1);
        assert_eq!(empty.current_chat_id(), Some(created.as_str()));
    }
}
