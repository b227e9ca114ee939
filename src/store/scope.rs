//! Persistence scope resolution.
//!
//! Scopes are tried in priority order: device, instance, in-memory. Device
//! scope is shared across every widget instance on one physical display,
//! which is the sharing granularity signage wants; instance scope is the
//! narrower fallback; in-memory keeps the UI functional with no persistence
//! at all. The first scope that passes a write/read/delete round trip is
//! used for the remainder of the process, and failed candidates are never
//! retried.

use serde_json::json;
use std::fmt;
use std::sync::Arc;

use super::backend::{MemoryBackend, SqliteBackend, StoreBackend, StoreError};

/// The persistence granularity a store is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScopeKind {
    Device,
    Instance,
    Memory,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Device => "device",
            ScopeKind::Instance => "instance",
            ScopeKind::Memory => "memory",
        }
    }
}

impl fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolve the backing scope for this process.
///
/// Never fails: the in-memory scope is always available as the last resort.
pub fn resolve_backend(device_db: &str, instance_db: &str) -> Arc<dyn StoreBackend> {
    let candidates = [
        (ScopeKind::Device, device_db),
        (ScopeKind::Instance, instance_db),
    ];

    for (kind, path) in candidates {
        match SqliteBackend::open(kind, path) {
            Ok(backend) => match health_check(&backend) {
                Ok(()) => {
                    tracing::info!("Store: Resolved {} scope at {}", kind, path);
                    return Arc::new(backend);
                }
                Err(e) => {
                    tracing::warn!("Store: {} scope failed health check: {}", kind, e);
                }
            },
            Err(e) => {
                tracing::warn!("Store: Cannot open {} scope at {}: {}", kind, path, e);
            }
        }
    }

    tracing::warn!("Store: All persistent scopes unavailable, using in-memory scope");
    Arc::new(MemoryBackend::new())
}

/// Cheap write/read/delete round trip against a candidate scope.
///
/// The probe key is randomized so concurrent processes sharing one database
/// never race on the same row.
pub fn health_check(backend: &dyn StoreBackend) -> Result<(), StoreError> {
    let probe_key = format!("__scopeProbe:{:016x}", rand::random::<u64>());
    let probe_value = json!(true);

    backend.set(&probe_key, &probe_value)?;
    let read_back = backend.get(&probe_key)?;
    backend.delete(&probe_key)?;

    if read_back.as_ref() != Some(&probe_value) {
        return Err(StoreError::HealthCheck(format!(
            "probe value mismatch: {:?}",
            read_back
        )));
    }
    Ok(())
}
