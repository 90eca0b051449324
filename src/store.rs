use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::Serialize;
use tokio::sync::watch;

use crate::models::TimelineItem;

/// One published mutation of the store.
///
/// An upsert of an existing id lands in `updated`; a forced replace lists
/// the id in both `removed` and `added` so observers rebuild it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreChange {
    pub revision: u64,
    pub added: Vec<String>,
    pub updated: Vec<String>,
    pub removed: Vec<String>,
}

impl StoreChange {
    fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
struct StoreState {
    items: HashMap<String, TimelineItem>,
    revision: u64,
}

fn read(lock: &RwLock<StoreState>) -> RwLockReadGuard<'_, StoreState> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write(lock: &RwLock<StoreState>) -> RwLockWriteGuard<'_, StoreState> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn collect_sorted<F>(state: &StoreState, predicate: F) -> Vec<TimelineItem>
where
    F: Fn(&TimelineItem) -> bool,
{
    let mut items: Vec<TimelineItem> = state
        .items
        .values()
        .filter(|item| predicate(item))
        .cloned()
        .collect();
    items.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    items
}

/// Writable timeline item collection, keyed by item id.
///
/// Only the owner mutates it; renderers hold an [`ItemView`].
#[derive(Debug)]
pub struct ItemStore {
    state: Arc<RwLock<StoreState>>,
    changes: watch::Sender<StoreChange>,
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ItemStore {
    pub fn new() -> Self {
        let (changes, _) = watch::channel(StoreChange::default());
        Self {
            state: Arc::new(RwLock::new(StoreState::default())),
            changes,
        }
    }

    pub fn view(&self) -> ItemView {
        ItemView {
            state: Arc::clone(&self.state),
            changes: self.changes.subscribe(),
        }
    }

    /// Insert items, replacing any existing item with the same id in place.
    /// Items identical to what is stored are left alone.
    pub fn upsert(&self, items: impl IntoIterator<Item = TimelineItem>) -> StoreChange {
        let mut state = write(&self.state);
        let mut change = StoreChange::default();

        for item in items {
            match state.items.get(&item.id) {
                Some(existing) if *existing == item => {}
                Some(_) => {
                    change.updated.push(item.id.clone());
                    state.items.insert(item.id.clone(), item);
                }
                None => {
                    change.added.push(item.id.clone());
                    state.items.insert(item.id.clone(), item);
                }
            }
        }

        self.publish(&mut state, change)
    }

    /// Remove then re-insert each item so observers see a new identity even
    /// when no field changed.
    pub fn force_replace(&self, items: impl IntoIterator<Item = TimelineItem>) -> StoreChange {
        let mut state = write(&self.state);
        let mut change = StoreChange::default();

        for item in items {
            if state.items.remove(&item.id).is_some() {
                change.removed.push(item.id.clone());
            }
            change.added.push(item.id.clone());
            state.items.insert(item.id.clone(), item);
        }

        self.publish(&mut state, change)
    }

    pub fn remove<S: AsRef<str>>(&self, ids: &[S]) -> StoreChange {
        let mut state = write(&self.state);
        let mut change = StoreChange::default();

        for id in ids {
            if state.items.remove(id.as_ref()).is_some() {
                change.removed.push(id.as_ref().to_string());
            }
        }

        self.publish(&mut state, change)
    }

    pub fn remove_where<F>(&self, predicate: F) -> StoreChange
    where
        F: Fn(&TimelineItem) -> bool,
    {
        let mut state = write(&self.state);
        let mut change = StoreChange::default();

        state.items.retain(|id, item| {
            if predicate(item) {
                change.removed.push(id.clone());
                false
            } else {
                true
            }
        });
        change.removed.sort();

        self.publish(&mut state, change)
    }

    /// Atomically swap every item matching `predicate` for `replacement`,
    /// published as a single change.
    pub fn replace_where<F>(&self, predicate: F, replacement: Vec<TimelineItem>) -> StoreChange
    where
        F: Fn(&TimelineItem) -> bool,
    {
        let mut state = write(&self.state);
        let mut change = StoreChange::default();

        let incoming: HashSet<&str> = replacement.iter().map(|item| item.id.as_str()).collect();
        let mut previous: HashMap<String, TimelineItem> = HashMap::new();
        let stale: Vec<String> = state
            .items
            .iter()
            .filter(|(_, item)| predicate(item))
            .map(|(id, _)| id.clone())
            .collect();

        for id in stale {
            if let Some(item) = state.items.remove(&id) {
                if !incoming.contains(id.as_str()) {
                    change.removed.push(id.clone());
                }
                previous.insert(id, item);
            }
        }
        change.removed.sort();

        for item in replacement {
            match previous.get(&item.id).or_else(|| state.items.get(&item.id)) {
                Some(old) if *old == item => {}
                Some(_) => change.updated.push(item.id.clone()),
                None => change.added.push(item.id.clone()),
            }
            state.items.insert(item.id.clone(), item);
        }

        self.publish(&mut state, change)
    }

    pub fn clear(&self) -> StoreChange {
        self.remove_where(|_| true)
    }

    pub fn get<F>(&self, predicate: F) -> Vec<TimelineItem>
    where
        F: Fn(&TimelineItem) -> bool,
    {
        collect_sorted(&read(&self.state), predicate)
    }

    pub fn get_by_id(&self, id: &str) -> Option<TimelineItem> {
        read(&self.state).items.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn publish(&self, state: &mut StoreState, mut change: StoreChange) -> StoreChange {
        if change.is_empty() {
            change.revision = state.revision;
            return change;
        }
        state.revision += 1;
        change.revision = state.revision;
        self.changes.send_replace(change.clone());
        change
    }
}

/// Read-only handle onto an [`ItemStore`].
#[derive(Debug, Clone)]
pub struct ItemView {
    state: Arc<RwLock<StoreState>>,
    changes: watch::Receiver<StoreChange>,
}

impl ItemView {
    pub fn get<F>(&self, predicate: F) -> Vec<TimelineItem>
    where
        F: Fn(&TimelineItem) -> bool,
    {
        collect_sorted(&read(&self.state), predicate)
    }

    pub fn all(&self) -> Vec<TimelineItem> {
        self.get(|_| true)
    }

    pub fn get_by_id(&self, id: &str) -> Option<TimelineItem> {
        read(&self.state).items.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        read(&self.state).items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn revision(&self) -> u64 {
        read(&self.state).revision
    }

    /// Wait for the next published change. Returns `None` once the store is
    /// dropped. Changes published while not waiting collapse into the latest.
    pub async fn changed(&mut self) -> Option<StoreChange> {
        self.changes.changed().await.ok()?;
        Some(self.changes.borrow_and_update().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ItemKind;

    fn point(id: &str, group: &str, start: i64) -> TimelineItem {
        TimelineItem {
            id: id.into(),
            group: group.into(),
            start,
            end: None,
            kind: ItemKind::Point,
            payload: None,
        }
    }

    #[test]
    fn upsert_adds_then_updates_by_id() {
        let store = ItemStore::new();
        let first = store.upsert(vec![point("a", "cam", 10), point("b", "cam", 5)]);
        assert_eq!(first.added, vec!["a", "b"]);
        assert_eq!(first.revision, 1);

        let second = store.upsert(vec![point("a", "cam", 20)]);
        assert_eq!(second.updated, vec!["a"]);
        assert!(second.added.is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store.get_by_id("a").map(|i| i.start), Some(20));
    }

    #[test]
    fn identical_upsert_publishes_nothing() {
        let store = ItemStore::new();
        store.upsert(vec![point("a", "cam", 10)]);
        let change = store.upsert(vec![point("a", "cam", 10)]);
        assert!(change.is_empty());
        assert_eq!(change.revision, 1);
    }

    #[test]
    fn force_replace_churns_identity() {
        let store = ItemStore::new();
        store.upsert(vec![point("a", "cam", 10)]);
        let change = store.force_replace(vec![point("a", "cam", 10)]);
        assert_eq!(change.removed, vec!["a"]);
        assert_eq!(change.added, vec!["a"]);
        assert_eq!(change.revision, 2);
    }

    #[test]
    fn get_filters_and_orders_by_start() {
        let store = ItemStore::new();
        store.upsert(vec![
            point("late", "cam", 30),
            point("early", "cam", 10),
            point("other", "yard", 20),
        ]);
        let cam: Vec<String> = store.get(|i| i.group == "cam").into_iter().map(|i| i.id).collect();
        assert_eq!(cam, vec!["early", "late"]);
    }

    #[test]
    fn remove_reports_only_present_ids() {
        let store = ItemStore::new();
        store.upsert(vec![point("a", "cam", 1)]);
        let change = store.remove(&["a", "missing"]);
        assert_eq!(change.removed, vec!["a"]);
        assert!(store.is_empty());
    }

    #[test]
    fn replace_where_swaps_matching_set() {
        let store = ItemStore::new();
        store.upsert(vec![
            TimelineItem::background("r1", "cam", 0, 100),
            TimelineItem::background("r2", "cam", 200, 300),
            TimelineItem::background("y1", "yard", 0, 50),
            point("e1", "cam", 10),
        ]);

        let change = store.replace_where(
            |i| i.is_background() && i.group == "cam",
            vec![TimelineItem::background("r1", "cam", 0, 300)],
        );

        assert_eq!(change.removed, vec!["r2"]);
        assert_eq!(change.updated, vec!["r1"]);
        assert!(change.added.is_empty());
        assert_eq!(store.len(), 3);
        assert!(store.get_by_id("y1").is_some());
        assert!(store.get_by_id("e1").is_some());
    }

    #[test]
    fn view_sees_writes_and_clear() {
        let store = ItemStore::new();
        let view = store.view();
        store.upsert(vec![point("a", "cam", 1)]);
        assert_eq!(view.len(), 1);
        assert_eq!(view.revision(), 1);

        store.clear();
        assert!(view.is_empty());
        assert_eq!(view.revision(), 2);
    }

    #[tokio::test]
    async fn view_is_notified_of_changes() {
        let store = ItemStore::new();
        let mut view = store.view();

        store.upsert(vec![point("a", "cam", 1)]);
        let change = view.changed().await.expect("store alive");
        assert_eq!(change.added, vec!["a"]);

        drop(store);
        assert!(view.changed().await.is_none());
    }
}
