//! JS-facing wrapper around [`ItemStore`]
//!
//! Collections cross the boundary as plain arrays of `{id, toDo}` objects.
//! Subscriptions are identified on the JS side by numeric handles.

use std::rc::Rc;

use serde::Serialize;
use wasm_bindgen::prelude::*;

use crate::config::StoreConfig;
use crate::error::{FailureKind, StoreError};
use crate::handles::{HandleTable, Released};
use crate::item::Items;
use crate::observable::Subscription;
use crate::platform::{BrowserNotifier, LocalStorage};
use crate::store::ItemStore;

#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
    if let Err(e) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::warn_1(&format!("logger already set: {}", e).into());
    }
}

/// Payload handed to `onFailure` callbacks
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FailureEvent {
    kind: &'static str,
    message: String,
    user_message: Option<&'static str>,
}

impl From<&StoreError> for FailureEvent {
    fn from(err: &StoreError) -> Self {
        Self {
            kind: match err.kind() {
                FailureKind::Load => "load",
                FailureKind::Save => "save",
            },
            message: err.to_string(),
            user_message: err.user_message(),
        }
    }
}

#[wasm_bindgen(js_name = ItemStore)]
pub struct JsItemStore {
    store: ItemStore,
    subscriptions: HandleTable<Subscription<Items>>,
    failure_subscriptions: HandleTable<Subscription<StoreError>>,
}

#[wasm_bindgen(js_class = ItemStore)]
impl JsItemStore {
    /// Open a store over `window.localStorage`.
    ///
    /// `config` is optional: `{ storageKey?: string, alerts?: boolean }`.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<JsItemStore, JsValue> {
        let config = if config.is_undefined() || config.is_null() {
            StoreConfig::default()
        } else {
            serde_wasm_bindgen::from_value::<StoreConfig>(config)?
        };
        let storage = LocalStorage::open().map_err(|e| js_error(&e))?;
        log::info!("Item store opened (key '{}')", config.storage_key);

        Ok(Self {
            store: ItemStore::new(Rc::new(storage), Rc::new(BrowserNotifier), config),
            subscriptions: HandleTable::new(),
            failure_subscriptions: HandleTable::new(),
        })
    }

    /// Initialize from storage. Throws on a load failure after falling back
    /// to an empty collection.
    pub fn load(&self) -> Result<(), JsValue> {
        self.store.load().map(|_| ()).map_err(|e| js_error(&e))
    }

    /// Call `callback(items, handle)` now and on every change. Returns the
    /// same handle for `unsubscribe`.
    ///
    /// The handle is passed to the callback so it can unsubscribe itself,
    /// including from the immediate first call.
    pub fn subscribe(&self, callback: js_sys::Function) -> u32 {
        let handle = self.subscriptions.reserve();
        let handle_value = JsValue::from(handle);

        let subscription = self.store.subscribe(move |items| {
            let result = serde_wasm_bindgen::to_value(items)
                .map_err(JsValue::from)
                .and_then(|value| callback.call2(&JsValue::NULL, &value, &handle_value));
            if let Err(e) = result {
                log::error!("Subscriber failed: {:?}", e);
            }
        });

        if let Some(released) = self.subscriptions.settle(handle, subscription) {
            released.unsubscribe();
        }
        handle
    }

    pub fn unsubscribe(&self, handle: u32) -> bool {
        match self.subscriptions.release(handle) {
            Released::Opening => true,
            Released::Active(subscription) => subscription.unsubscribe(),
            Released::Unknown => false,
        }
    }

    /// Replace the whole collection
    pub fn set(&self, items: JsValue) -> Result<(), JsValue> {
        let items: Items = serde_wasm_bindgen::from_value(items)?;
        self.store.set(items);
        Ok(())
    }

    /// Replace the collection with `f(currentItems)`.
    ///
    /// If `f` throws or returns something that is not an item array, the
    /// collection is left unchanged and the error is rethrown.
    pub fn update(&self, f: js_sys::Function) -> Result<(), JsValue> {
        self.store.try_update(|items| -> Result<(), JsValue> {
            let current = serde_wasm_bindgen::to_value(&*items)?;
            let next = f.call1(&JsValue::NULL, &current)?;
            *items = serde_wasm_bindgen::from_value(next)?;
            Ok(())
        })
    }

    /// Call `callback({kind, message, userMessage})` on every load or save
    /// failure. Returns a handle for `offFailure`.
    #[wasm_bindgen(js_name = onFailure)]
    pub fn on_failure(&self, callback: js_sys::Function) -> u32 {
        let subscription = self.store.on_failure(move |err| {
            let result = serde_wasm_bindgen::to_value(&FailureEvent::from(err))
                .map_err(JsValue::from)
                .and_then(|value| callback.call1(&JsValue::NULL, &value));
            if let Err(e) = result {
                log::error!("Failure listener failed: {:?}", e);
            }
        });
        let handle = self.failure_subscriptions.reserve();
        if let Some(released) = self.failure_subscriptions.settle(handle, subscription) {
            released.unsubscribe();
        }
        handle
    }

    #[wasm_bindgen(js_name = offFailure)]
    pub fn off_failure(&self, handle: u32) -> bool {
        match self.failure_subscriptions.release(handle) {
            Released::Opening => true,
            Released::Active(subscription) => subscription.unsubscribe(),
            Released::Unknown => false,
        }
    }

    #[wasm_bindgen(getter, js_name = isLoaded)]
    pub fn is_loaded(&self) -> bool {
        self.store.is_loaded()
    }

    #[wasm_bindgen(getter, js_name = subscriberCount)]
    pub fn subscriber_count(&self) -> usize {
        self.store.subscriber_count()
    }
}

fn js_error(err: &dyn std::fmt::Display) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}
