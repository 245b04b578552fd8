//! Test fixtures: entities and stub collaborators.

use async_trait::async_trait;
use ladder_core::{EntityRef, IdentityProvider, MetricResolver, ResolveError};
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

/// Entity with a fixed, ordered id.
#[allow(dead_code)]
pub fn entity(n: u128, name: &str) -> EntityRef {
    EntityRef::new(Uuid::from_u128(n), name)
}

/// Resolver answering from a fixed key -> text table and recording lookups.
#[allow(dead_code)]
#[derive(Default)]
pub struct StubResolver {
    values: HashMap<String, String>,
    pub requested: Mutex<Vec<String>>,
}

#[allow(dead_code)]
impl StubResolver {
    pub fn with(mut self, key: &str, value: &str) -> Self {
        self.values.insert(key.to_string(), value.to_string());
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requested.lock().expect("resolver lock poisoned").clone()
    }
}

#[async_trait]
impl MetricResolver for StubResolver {
    async fn resolve(&self, _entity: &EntityRef, key: &str) -> Result<String, ResolveError> {
        self.requested
            .lock()
            .expect("resolver lock poisoned")
            .push(key.to_string());
        self.values.get(key).cloned().ok_or_else(|| ResolveError {
            key: key.to_string(),
            reason: "no such placeholder".to_string(),
        })
    }
}

/// Identity provider with a fixed rank prefix and suffix.
#[allow(dead_code)]
pub struct StubIdentity;

impl IdentityProvider for StubIdentity {
    fn prefix(&self, _entity: &EntityRef) -> String {
        "[VIP] ".to_string()
    }

    fn suffix(&self, _entity: &EntityRef) -> String {
        " *".to_string()
    }
}
