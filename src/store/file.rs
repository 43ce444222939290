//! JSON Lines file store
//!
//! The list lives in memory behind a mutex and is written back to disk,
//! one item per line, after every mutation. A mutation only takes effect
//! in memory once the write succeeded.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, warn};

use super::ItemStore;
use crate::types::{Item, ItemId, TodoError, TodoResult};
use crate::utils::{atomic_write_with, remove_stale_temp};

struct StoreState {
    items: Vec<Item>,
    next_id: ItemId,
}

impl StoreState {
    fn from_items(items: Vec<Item>) -> Self {
        let next_id = items.iter().map(|i| i.id).max().unwrap_or(0).saturating_add(1);
        Self { items, next_id }
    }
}

/// File-backed item store (or purely in-memory when no path is given)
pub struct FileStore {
    path: Option<PathBuf>,
    state: Mutex<StoreState>,
}

impl FileStore {
    /// Open the store at `path`, loading existing items if the file exists
    pub fn open(path: impl Into<PathBuf>) -> TodoResult<Self> {
        let path = path.into();
        if remove_stale_temp(&path)? {
            warn!(path = %path.display(), "removed temp file left by an interrupted write");
        }

        let items = Self::load_items(&path)?;
        debug!(path = %path.display(), count = items.len(), "loaded items");

        Ok(Self {
            path: Some(path),
            state: Mutex::new(StoreState::from_items(items)),
        })
    }

    /// Store that never touches the filesystem
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: Mutex::new(StoreState::from_items(Vec::new())),
        }
    }

    fn load_items(path: &Path) -> TodoResult<Vec<Item>> {
        if !path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(path)?;
        let mut items: Vec<Item> = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<Item>(line) {
                // No id can follow it
                Ok(item) if item.id == ItemId::MAX => {
                    warn!(line = line_no + 1, id = item.id, "skipping item with out-of-range id");
                }
                Ok(item) if items.iter().any(|i| i.id == item.id) => {
                    warn!(line = line_no + 1, id = item.id, "skipping duplicate item id");
                }
                Ok(item) => items.push(item),
                Err(e) => {
                    warn!(line = line_no + 1, error = %e, "skipping unreadable line");
                }
            }
        }

        Ok(items)
    }

    /// Write `items` to disk (caller holds the state lock)
    fn persist(&self, items: &[Item]) -> TodoResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let mut content = String::new();
        for item in items {
            content.push_str(&serde_json::to_string(item)?);
            content.push('\n');
        }

        atomic_write_with(path, |file| file.write_all(content.as_bytes()))?;
        Ok(())
    }
}

impl ItemStore for FileStore {
    fn list_all(&self) -> TodoResult<Vec<Item>> {
        Ok(self.state.lock().items.clone())
    }

    fn create(&self, title: &str) -> TodoResult<Item> {
        let mut state = self.state.lock();
        let item = Item::new(state.next_id, title);
        let next_id = state
            .next_id
            .checked_add(1)
            .ok_or_else(|| TodoError::StoreUnavailable("item ids exhausted".to_string()))?;

        let mut items = state.items.clone();
        items.push(item.clone());
        self.persist(&items)?;

        state.items = items;
        state.next_id = next_id;
        Ok(item)
    }

    fn find_by_id(&self, id: ItemId) -> TodoResult<Option<Item>> {
        let state = self.state.lock();
        Ok(state.items.iter().find(|i| i.id == id).cloned())
    }

    fn update(&self, item: &Item) -> TodoResult<()> {
        let mut state = self.state.lock();
        let pos = state
            .items
            .iter()
            .position(|i| i.id == item.id)
            .ok_or(TodoError::NotFound(item.id))?;

        let mut items = state.items.clone();
        items[pos] = item.clone();
        self.persist(&items)?;

        state.items = items;
        Ok(())
    }

    fn delete(&self, item: &Item) -> TodoResult<()> {
        let mut state = self.state.lock();
        if !state.items.iter().any(|i| i.id == item.id) {
            return Err(TodoError::NotFound(item.id));
        }

        let items: Vec<Item> = state
            .items
            .iter()
            .filter(|i| i.id != item.id)
            .cloned()
            .collect();
        self.persist(&items)?;

        state.items = items;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = FileStore::in_memory();
        let a = store.create("a").unwrap();
        let b = store.create("b").unwrap();

        assert_eq!(a.id, 1);
        assert_eq!(b.id, 2);
        assert!(!a.is_complete);
        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_ids_are_not_reused_after_delete() {
        let store = FileStore::in_memory();
        let a = store.create("a").unwrap();
        let b = store.create("b").unwrap();
        store.delete(&b).unwrap();

        let c = store.create("c").unwrap();
        assert_eq!(c.id, 3);
        assert_eq!(store.find_by_id(a.id).unwrap(), Some(a));
    }

    #[test]
    fn test_persists_and_reloads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todos.jsonl");

        {
            let store = FileStore::open(&path).unwrap();
            let mut milk = store.create("Buy milk").unwrap();
            store.create("Walk dog").unwrap();
            milk.is_complete = true;
            store.update(&milk).unwrap();
        }

        let store = FileStore::open(&path).unwrap();
        let items = store.list_all().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Buy milk");
        assert!(items[0].is_complete);

        let next = store.create("Third").unwrap();
        assert_eq!(next.id, 3);
    }

    #[test]
    fn test_load_skips_bad_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todos.jsonl");
        fs::write(
            &path,
            "{\"id\":1,\"title\":\"ok\",\"isComplete\":false}\nnot json\n\n{\"id\":1,\"title\":\"dup\"}\n",
        )
        .unwrap();

        let store = FileStore::open(&path).unwrap();
        let items = store.list_all().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "ok");
    }

    #[test]
    fn test_load_skips_max_id() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todos.jsonl");
        fs::write(
            &path,
            format!(
                "{{\"id\":{},\"title\":\"edge\",\"isComplete\":false}}\n{{\"id\":5,\"title\":\"ok\",\"isComplete\":false}}\n",
                ItemId::MAX
            ),
        )
        .unwrap();

        let store = FileStore::open(&path).unwrap();
        let items = store.list_all().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, 5);
        assert_eq!(store.create("next").unwrap().id, 6);
    }

    #[test]
    fn test_create_fails_when_ids_run_out() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todos.jsonl");
        fs::write(
            &path,
            format!(
                "{{\"id\":{},\"title\":\"last\",\"isComplete\":false}}\n",
                ItemId::MAX - 1
            ),
        )
        .unwrap();

        let store = FileStore::open(&path).unwrap();
        let result = store.create("one too many");
        assert!(matches!(result, Err(TodoError::StoreUnavailable(_))));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }

    #[test]
    fn test_update_and_delete_missing_item() {
        let store = FileStore::in_memory();
        let ghost = Item::new(42, "ghost");

        assert!(matches!(store.update(&ghost), Err(TodoError::NotFound(42))));
        assert!(matches!(store.delete(&ghost), Err(TodoError::NotFound(42))));
        assert_eq!(store.find_by_id(42).unwrap(), None);
    }

    #[test]
    fn test_failed_write_leaves_state_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("todos.jsonl");
        let store = FileStore::open(&path).unwrap();
        store.create("kept").unwrap();

        // A directory where the temp file should go makes File::create fail
        fs::create_dir(path.with_extension("tmp")).unwrap();

        let result = store.create("lost");
        assert!(matches!(result, Err(TodoError::StoreUnavailable(_))));
        assert_eq!(store.list_all().unwrap().len(), 1);
    }
}
