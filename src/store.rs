//! Persisted item store
//!
//! Owns the item collection, broadcasts it to subscribers and mirrors
//! every change to storage. Failures never reach callers of `subscribe`,
//! `set` or `update`: they are logged, optionally alerted, and delivered to
//! `on_failure` listeners.
//!
//! Lifecycle: uninitialized until `load` runs (explicitly, or implicitly on
//! the first `subscribe`/`update`), or until a `set` replaces the value
//! outright. After that every change is notify-then-persist.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::item::{Item, Items};
use crate::observable::{Listeners, Observable, Subscription};
use crate::persistence::{read_items, write_items};
use crate::platform::{LogNotifier, MemoryStorage, Notifier, Storage};

/// Result of a successful [`ItemStore::load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing was stored; the collection is empty
    Empty,
    /// This many items were restored from storage
    Restored(usize),
    /// The store was already initialized; nothing was read
    AlreadyLoaded,
}

struct StoreInner {
    items: Observable<Items>,
    failures: Listeners<StoreError>,
    storage: Rc<dyn Storage>,
    notifier: Rc<dyn Notifier>,
    config: StoreConfig,
    loaded: Cell<bool>,
}

/// Handle to a persisted item collection. Clones share the same state.
#[derive(Clone)]
pub struct ItemStore {
    inner: Rc<StoreInner>,
}

impl ItemStore {
    pub fn new(storage: Rc<dyn Storage>, notifier: Rc<dyn Notifier>, config: StoreConfig) -> Self {
        Self {
            inner: Rc::new(StoreInner {
                items: Observable::new(Vec::new()),
                failures: Listeners::new(),
                storage,
                notifier,
                config,
                loaded: Cell::new(false),
            }),
        }
    }

    /// Store over fresh in-memory storage, logging failures instead of alerting
    pub fn in_memory() -> Self {
        Self::new(
            Rc::new(MemoryStorage::new()),
            Rc::new(LogNotifier),
            StoreConfig::default(),
        )
    }

    /// Initialize the collection from storage. Idempotent.
    ///
    /// On failure the collection falls back to empty, the failure is
    /// reported through the side channels, and the error is also returned.
    ///
    /// Loading never writes. A malformed stored value stays in storage until
    /// the next successful `set`/`update` overwrites it; it is not reset to
    /// `[]` at load time.
    pub fn load(&self) -> Result<LoadOutcome, StoreError> {
        let inner = &self.inner;
        if inner.loaded.replace(true) {
            return Ok(LoadOutcome::AlreadyLoaded);
        }

        let key = inner.config.storage_key.as_str();
        match read_items(inner.storage.as_ref(), key) {
            Ok(None) => {
                log::info!("No stored items under '{}', starting empty", key);
                inner.items.set(Vec::new());
                Ok(LoadOutcome::Empty)
            }
            Ok(Some(items)) => {
                let count = items.len();
                log::info!("Loaded {} items from '{}'", count, key);
                inner.items.set(items);
                Ok(LoadOutcome::Restored(count))
            }
            Err(err) => {
                inner.items.set(Vec::new());
                self.report(&err);
                Err(err)
            }
        }
    }

    /// Receive the current collection now and on every change.
    ///
    /// Loads from storage first if the store is not yet initialized.
    pub fn subscribe(&self, callback: impl Fn(&[Item]) + 'static) -> Subscription<Items> {
        self.ensure_loaded();
        self.inner
            .items
            .subscribe(move |items: &Items| callback(items))
    }

    /// Replace the whole collection, notify subscribers, then persist
    pub fn set(&self, items: Items) {
        self.inner.loaded.set(true);
        self.inner.items.set(items);
        self.persist();
    }

    /// Edit the collection in place, notify subscribers, then persist.
    ///
    /// Loads from storage first if the store is not yet initialized, so an
    /// edit never overwrites stored items that were never read.
    pub fn update(&self, f: impl FnOnce(&mut Items)) {
        self.ensure_loaded();
        self.inner.items.update(f);
        self.persist();
    }

    /// Like `update`, but if `f` fails nothing is notified or persisted and
    /// the error is returned
    pub fn try_update<E>(&self, f: impl FnOnce(&mut Items) -> Result<(), E>) -> Result<(), E> {
        self.ensure_loaded();
        self.inner.items.try_update(f)?;
        self.persist();
        Ok(())
    }

    /// Receive every load or save failure
    pub fn on_failure(&self, callback: impl Fn(&StoreError) + 'static) -> Subscription<StoreError> {
        self.inner.failures.add(callback)
    }

    pub fn is_loaded(&self) -> bool {
        self.inner.loaded.get()
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.items.subscriber_count()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    fn ensure_loaded(&self) {
        if !self.is_loaded() {
            // Already reported through the side channels
            let _ = self.load();
        }
    }

    fn persist(&self) {
        let inner = &self.inner;
        let items = inner.items.get();
        if let Err(err) = write_items(inner.storage.as_ref(), &inner.config.storage_key, &items) {
            self.report(&err);
        }
    }

    fn report(&self, err: &StoreError) {
        let inner = &self.inner;
        inner.notifier.log_failure(err);
        if inner.config.alerts {
            if let Some(message) = err.user_message() {
                inner.notifier.alert(message);
            }
        }
        inner.failures.notify(err);
    }
}

impl fmt::Debug for ItemStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemStore")
            .field("config", &self.inner.config)
            .field("loaded", &self.inner.loaded.get())
            .field("items", &self.inner.items.get().len())
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{LOAD_FAILURE_MESSAGE, SAVE_FAILURE_MESSAGE};
    use crate::error::{FailureKind, StorageError};
    use proptest::prelude::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingNotifier {
        alerts: RefCell<Vec<String>>,
        logged: RefCell<Vec<String>>,
    }

    impl Notifier for RecordingNotifier {
        fn alert(&self, message: &str) {
            self.alerts.borrow_mut().push(message.to_string());
        }

        fn log_failure(&self, error: &StoreError) {
            self.logged.borrow_mut().push(error.to_string());
        }
    }

    struct Harness {
        store: ItemStore,
        storage: Rc<MemoryStorage>,
        notifier: Rc<RecordingNotifier>,
    }

    fn harness_with(storage: MemoryStorage, config: StoreConfig) -> Harness {
        let storage = Rc::new(storage);
        let notifier = Rc::new(RecordingNotifier::default());
        let store = ItemStore::new(storage.clone(), notifier.clone(), config);
        Harness {
            store,
            storage,
            notifier,
        }
    }

    fn harness(storage: MemoryStorage) -> Harness {
        harness_with(storage, StoreConfig::default())
    }

    /// Subscribe and collect every delivered collection
    fn collect(store: &ItemStore) -> Rc<RefCell<Vec<Items>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.subscribe(move |items| sink.borrow_mut().push(items.to_vec()));
        seen
    }

    fn stored(h: &Harness) -> Option<String> {
        h.storage.get_item("items").unwrap()
    }

    #[test]
    fn test_nothing_stored_loads_empty_without_alert() {
        let h = harness(MemoryStorage::new());
        assert_eq!(h.store.load().unwrap(), LoadOutcome::Empty);

        let seen = collect(&h.store);
        assert_eq!(*seen.borrow(), vec![Vec::<Item>::new()]);
        assert!(h.notifier.alerts.borrow().is_empty());
        assert!(h.notifier.logged.borrow().is_empty());
        // Loading never writes
        assert_eq!(stored(&h), None);
    }

    #[test]
    fn test_stored_items_are_restored() {
        let h = harness(MemoryStorage::new().with_item(
            "items",
            r#"[{"id":"1","toDo":"buy milk"},{"id":"2","toDo":"call mom"}]"#,
        ));
        assert_eq!(h.store.load().unwrap(), LoadOutcome::Restored(2));
        assert_eq!(h.store.load().unwrap(), LoadOutcome::AlreadyLoaded);

        let seen = collect(&h.store);
        assert_eq!(
            seen.borrow()[0],
            vec![Item::new("1", "buy milk"), Item::new("2", "call mom")]
        );
    }

    #[test]
    fn test_invalid_json_falls_back_to_empty_with_one_alert() {
        let h = harness(MemoryStorage::new().with_item("items", "not valid json"));
        let failures = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&failures);
        h.store.on_failure(move |err| sink.borrow_mut().push(err.kind()));

        // First subscription triggers the load; the second must not reload
        let seen = collect(&h.store);
        let _ = collect(&h.store);

        assert_eq!(*seen.borrow(), vec![Vec::<Item>::new()]);
        assert_eq!(*h.notifier.alerts.borrow(), vec![LOAD_FAILURE_MESSAGE]);
        assert_eq!(h.notifier.logged.borrow().len(), 1);
        assert!(h.notifier.logged.borrow()[0].starts_with("failed to decode stored items"));
        assert_eq!(*failures.borrow(), vec![FailureKind::Load]);
        // The bad value stays until the next save
        assert_eq!(stored(&h).as_deref(), Some("not valid json"));
    }

    #[test]
    fn test_explicit_load_returns_decode_error() {
        let h = harness(MemoryStorage::new().with_item("items", "[{]"));
        let err = h.store.load().unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
        assert!(h.store.is_loaded());
        assert_eq!(h.store.load().unwrap(), LoadOutcome::AlreadyLoaded);
        assert_eq!(h.notifier.alerts.borrow().len(), 1);
    }

    #[test]
    fn test_next_set_overwrites_bad_value() {
        let h = harness(MemoryStorage::new().with_item("items", "not valid json"));
        let _ = h.store.load();
        h.store.set(vec![Item::new("1", "x")]);
        assert_eq!(stored(&h).as_deref(), Some(r#"[{"id":"1","toDo":"x"}]"#));
    }

    #[test]
    fn test_unreadable_storage_is_reported_without_alert() {
        let storage = MemoryStorage::new();
        storage.set_unavailable(true);
        let h = harness(storage);

        let err = h.store.load().unwrap_err();
        assert!(matches!(err, StoreError::Read(StorageError::Unavailable(_))));
        assert!(h.notifier.alerts.borrow().is_empty());
        assert_eq!(h.notifier.logged.borrow().len(), 1);
    }

    #[test]
    fn test_set_writes_exact_json_and_notifies() {
        let h = harness(MemoryStorage::new());
        let a = collect(&h.store);
        let b = collect(&h.store);

        let items = vec![Item::new("1", "buy milk")];
        h.store.set(items.clone());

        assert_eq!(stored(&h).as_deref(), Some(r#"[{"id":"1","toDo":"buy milk"}]"#));
        assert_eq!(a.borrow().last(), Some(&items));
        assert_eq!(b.borrow().last(), Some(&items));
        assert_eq!(a.borrow().len(), 2);
    }

    #[test]
    fn test_set_twice_stores_same_value() {
        let h = harness(MemoryStorage::new());
        let items = vec![Item::new("1", "a"), Item::new("2", "b")];

        h.store.set(items.clone());
        let once = stored(&h);
        h.store.set(items);
        assert_eq!(stored(&h), once);
    }

    #[test]
    fn test_failed_write_keeps_value_in_memory() {
        // Room for "items" + "[]" but nothing bigger
        let h = harness(MemoryStorage::with_quota(8));
        let _ = collect(&h.store);

        let items = vec![Item::new("1", "does not fit")];
        h.store.set(items.clone());

        assert_eq!(*h.notifier.alerts.borrow(), vec![SAVE_FAILURE_MESSAGE]);
        assert_eq!(stored(&h), None);

        let later = collect(&h.store);
        assert_eq!(*later.borrow(), vec![items]);
    }

    #[test]
    fn test_failure_listener_sees_save_errors() {
        let h = harness(MemoryStorage::new());
        let failures = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&failures);
        h.store.on_failure(move |err| sink.borrow_mut().push(err.to_string()));

        h.storage.set_unavailable(true);
        h.store.set(vec![Item::new("1", "x")]);

        assert_eq!(failures.borrow().len(), 1);
        assert!(failures.borrow()[0].starts_with("failed to write items"));
    }

    #[test]
    fn test_alerts_can_be_disabled() {
        let h = harness_with(
            MemoryStorage::new().with_item("items", "not valid json"),
            StoreConfig::default().without_alerts(),
        );
        let _ = h.store.load();
        h.storage.set_unavailable(true);
        h.store.set(Vec::new());

        assert!(h.notifier.alerts.borrow().is_empty());
        assert_eq!(h.notifier.logged.borrow().len(), 2);
    }

    #[test]
    fn test_custom_key() {
        let h = harness_with(MemoryStorage::new(), StoreConfig::default().with_key("todos"));
        h.store.set(vec![Item::new("1", "x")]);
        assert_eq!(stored(&h), None);
        assert!(h.storage.get_item("todos").unwrap().is_some());
    }

    #[test]
    fn test_subscribers_notified_before_persist() {
        let h = harness(MemoryStorage::new());
        h.store.set(vec![Item::new("1", "old")]);

        let during = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&during);
        let storage = Rc::clone(&h.storage);
        h.store.subscribe(move |_| {
            sink.borrow_mut().push(storage.get_item("items").unwrap());
        });

        h.store.set(vec![Item::new("2", "new")]);

        let during = during.borrow();
        assert_eq!(during.len(), 2);
        assert_eq!(during[1].as_deref(), Some(r#"[{"id":"1","toDo":"old"}]"#));
        assert_eq!(stored(&h).as_deref(), Some(r#"[{"id":"2","toDo":"new"}]"#));
    }

    #[test]
    fn test_set_from_subscriber_reaches_later_subscribers() {
        let h = harness(MemoryStorage::new());
        let store = h.store.clone();
        h.store.subscribe(move |items| {
            if items.first().is_some_and(|item| item.id == "a") {
                store.set(vec![Item::new("b", "fixed")]);
            }
        });
        let seen = collect(&h.store);

        h.store.set(vec![Item::new("a", "draft")]);

        let fixed = vec![Item::new("b", "fixed")];
        assert_eq!(seen.borrow().last(), Some(&fixed));
        assert_eq!(stored(&h).as_deref(), Some(r#"[{"id":"b","toDo":"fixed"}]"#));

        let later = collect(&h.store);
        assert_eq!(*later.borrow(), vec![fixed]);
    }

    #[test]
    fn test_update_reads_stored_items_first() {
        let h = harness(MemoryStorage::new().with_item("items", r#"[{"id":"1","toDo":"a"}]"#));
        h.store.update(|items| items.push(Item::new("2", "b")));

        assert_eq!(
            stored(&h).as_deref(),
            Some(r#"[{"id":"1","toDo":"a"},{"id":"2","toDo":"b"}]"#)
        );
    }

    #[test]
    fn test_update_remove_by_id() {
        let h = harness(MemoryStorage::new());
        let seen = collect(&h.store);
        h.store.set(vec![Item::new("1", "a"), Item::new("2", "b")]);
        h.store.update(|items| items.retain(|item| item.id != "1"));

        assert_eq!(seen.borrow().last(), Some(&vec![Item::new("2", "b")]));
    }

    #[test]
    fn test_rejected_try_update_leaves_store_untouched() {
        let h = harness(MemoryStorage::new());
        h.store.set(vec![Item::new("1", "a")]);
        let seen = collect(&h.store);

        let result = h.store.try_update(|items| {
            if items.iter().any(|item| item.id == "1") {
                return Err("duplicate id");
            }
            items.push(Item::new("1", "again"));
            Ok(())
        });

        assert_eq!(result, Err("duplicate id"));
        assert_eq!(seen.borrow().len(), 1);
        assert_eq!(stored(&h).as_deref(), Some(r#"[{"id":"1","toDo":"a"}]"#));
    }

    #[test]
    fn test_set_before_load_is_authoritative() {
        let h = harness(MemoryStorage::new().with_item("items", r#"[{"id":"old","toDo":"x"}]"#));
        h.store.set(vec![Item::new("new", "y")]);

        let seen = collect(&h.store);
        assert_eq!(*seen.borrow(), vec![vec![Item::new("new", "y")]]);
        assert_eq!(h.store.load().unwrap(), LoadOutcome::AlreadyLoaded);
    }

    #[test]
    fn test_duplicate_ids_are_kept() {
        let h = harness(MemoryStorage::new());
        let items = vec![Item::new("1", "a"), Item::new("1", "b")];
        h.store.set(items.clone());
        let seen = collect(&h.store);
        assert_eq!(seen.borrow()[0], items);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let h = harness(MemoryStorage::new());
        let seen = Rc::new(RefCell::new(0));
        let sink = Rc::clone(&seen);
        let sub = h.store.subscribe(move |_| *sink.borrow_mut() += 1);
        assert_eq!(h.store.subscriber_count(), 1);

        h.store.set(Vec::new());
        assert!(sub.unsubscribe());
        h.store.set(Vec::new());

        assert_eq!(*seen.borrow(), 2);
        assert_eq!(h.store.subscriber_count(), 0);
    }

    #[test]
    fn test_in_memory_store_round_trips() {
        let store = ItemStore::in_memory();
        store.set(vec![Item::new("1", "x")]);
        let seen = collect(&store);
        assert_eq!(seen.borrow()[0], vec![Item::new("1", "x")]);
        assert!(store.config().alerts);
    }

    fn arb_items() -> impl Strategy<Value = Items> {
        prop::collection::vec(
            ("[a-z0-9]{1,4}", ".{0,12}").prop_map(|(id, to_do)| Item::new(id, to_do)),
            0..6,
        )
    }

    proptest! {
        #[test]
        fn prop_subscribers_track_latest_value(sets in prop::collection::vec(arb_items(), 1..8)) {
            let h = harness(MemoryStorage::new());
            let a = collect(&h.store);
            let b = collect(&h.store);

            for items in &sets {
                h.store.set(items.clone());
                let seen_a = a.borrow();
                let seen_b = b.borrow();
                prop_assert_eq!(seen_a.last(), Some(items));
                prop_assert_eq!(seen_b.last(), Some(items));
            }

            let latest = sets.last().unwrap();
            let expected = serde_json::to_string(latest).unwrap();
            prop_assert_eq!(stored(&h), Some(expected));
            prop_assert_eq!(a.borrow().len(), sets.len() + 1);
            prop_assert!(h.notifier.alerts.borrow().is_empty());
        }
    }
}
