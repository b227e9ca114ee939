//! The shared, observable settings store.
//!
//! One `SettingsStore` handle is shared by both surfaces: the settings
//! surface writes fields, the render surface subscribes to them. Persistence
//! goes through the resolved scope backend; change delivery is push-based
//! via per-key `watch` channels plus the process-wide [`UpdateBus`].

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::events::{UpdateBus, UpdateEvent};
use crate::settings::{keys, CountdownSettings};

use super::backend::StoreBackend;
use super::scope::{resolve_backend, ScopeKind};

pub struct SettingsStore {
    backend: Arc<dyn StoreBackend>,
    bus: Arc<UpdateBus>,
    // Lazily created, one per key, alive for the store's lifetime. Dropping
    // a receiver is the unsubscribe; senders are never torn down, so a
    // subscriber re-appearing after an idle stretch still sees the current
    // value immediately.
    channels: Mutex<HashMap<String, watch::Sender<Value>>>,
}

impl SettingsStore {
    /// Resolve the backing scope (device, then instance, then in-memory)
    /// and bind the store to it for the process lifetime.
    pub fn resolve(device_db: &str, instance_db: &str, bus: Arc<UpdateBus>) -> Self {
        Self::with_backend(resolve_backend(device_db, instance_db), bus)
    }

    pub fn with_backend(backend: Arc<dyn StoreBackend>, bus: Arc<UpdateBus>) -> Self {
        Self {
            backend,
            bus,
            channels: Mutex::new(HashMap::new()),
        }
    }

    pub fn scope(&self) -> ScopeKind {
        self.backend.kind()
    }

    /// Number of persisted keys, for the status surface.
    pub fn key_count(&self) -> i64 {
        match self.backend.count() {
            Ok(n) => n,
            Err(e) => {
                tracing::warn!("Store: Failed to count keys: {}", e);
                0
            }
        }
    }

    /// Read a field. Backend failures are logged and read as absent.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self.backend.get(key) {
            Ok(v) => v,
            Err(e) => {
                tracing::warn!("Store: Read of {} failed: {}", key, e);
                None
            }
        }
    }

    /// Write a field and notify every subscriber.
    ///
    /// A backend write failure is logged and swallowed: subscribers are
    /// still notified so the UI stays live, at the cost of that write being
    /// lost from persistence.
    pub fn set(&self, key: &str, value: Value) {
        if let Err(e) = self.backend.set(key, &value) {
            tracing::warn!("Store: Write of {} failed (value kept in memory): {}", key, e);
        }

        self.channel(key).send_replace(value.clone());
        self.bus.publish(UpdateEvent::FieldChanged {
            key: key.to_string(),
            value,
        });
    }

    /// Subscribe to a field.
    ///
    /// The receiver's current value is immediately available (the persisted
    /// value, or `null` if the field was never set) and every subsequent
    /// `set` is observed. Dropping the receiver is the unsubscribe.
    pub fn subscribe(&self, key: &str) -> watch::Receiver<Value> {
        self.channel(key).subscribe()
    }

    /// Populate every unset field with its documented default.
    ///
    /// Backed by an insert-if-absent, so concurrent hydration calls (or an
    /// operator write racing hydration) never clobber an existing value.
    /// Idempotent.
    pub fn hydrate_defaults(&self) {
        let mut written = 0usize;
        for key in keys::ALL {
            let default = match CountdownSettings::default_value(key) {
                Some(v) => v,
                None => continue,
            };
            match self.backend.set_if_absent(key, &default) {
                Ok(true) => written += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!("Store: Hydration of {} failed: {}", key, e),
            }
        }
        if written > 0 {
            tracing::info!("Store: Hydrated {} default field(s)", written);
        }
    }

    /// Assemble the full record, falling back to field defaults on absent or
    /// malformed values.
    pub fn snapshot(&self) -> CountdownSettings {
        CountdownSettings::from_lookup(|key| self.get(key))
    }

    fn channel(&self, key: &str) -> watch::Sender<Value> {
        let mut channels = self.channels.lock().unwrap();
        if let Some(sender) = channels.get(key) {
            return sender.clone();
        }
        let initial = self.get(key).unwrap_or(Value::Null);
        let (sender, _) = watch::channel(initial);
        channels.insert(key.to_string(), sender.clone());
        sender
    }
}

/// Typed two-way binding for a single field.
///
/// Composes `get` + `set` + `subscribe` with serde conversion; independent
/// bindings are addressed by their own keys and do not interfere.
pub struct Binding<T> {
    store: Arc<SettingsStore>,
    key: &'static str,
    default: T,
}

impl<T> Binding<T>
where
    T: serde::Serialize + serde::de::DeserializeOwned + Clone,
{
    pub fn new(store: Arc<SettingsStore>, key: &'static str, default: T) -> Self {
        Self {
            store,
            key,
            default,
        }
    }

    /// Whether a persisted value exists for this field yet.
    pub fn loaded(&self) -> bool {
        self.store.get(self.key).is_some()
    }

    /// Current value, or the binding default on absent/malformed data.
    pub fn get(&self) -> T {
        match self.store.get(self.key) {
            Some(v) => serde_json::from_value(v).unwrap_or_else(|_| self.default.clone()),
            None => self.default.clone(),
        }
    }

    pub fn set(&self, value: &T) {
        match serde_json::to_value(value) {
            Ok(v) => self.store.set(self.key, v),
            Err(e) => tracing::warn!("Store: Cannot serialize {}: {}", self.key, e),
        }
    }

    pub fn watch(&self) -> watch::Receiver<Value> {
        self.store.subscribe(self.key)
    }
}
