use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use actix_web::web::Bytes;
use moka::sync::Cache;

/// Tag shared by every cached todo listing.
pub const TODOS_TAG: &str = "todos";

const MAX_ENTRIES: u64 = 10_000;

#[derive(Debug)]
struct CachedResponse {
    body: Bytes,
    tags: Vec<(String, u64)>,
}

/// A cache slot claimed before the response is computed.
///
/// Records the generation of each tag at claim time, so a response computed
/// concurrently with an eviction is never served.
#[derive(Debug)]
pub struct PendingEntry {
    key: String,
    tags: Vec<(String, u64)>,
}

/// Response cache keyed by request and invalidated by tag.
///
/// Evicting a tag bumps its generation; entries stamped with an older
/// generation are treated as missing and left for moka to expire.
#[derive(Clone)]
pub struct OutputCache {
    entries: Cache<String, Arc<CachedResponse>>,
    generations: Arc<RwLock<HashMap<String, u64>>>,
}

impl OutputCache {
    pub fn new(ttl: Duration) -> Self {
        let entries = Cache::builder()
            .max_capacity(MAX_ENTRIES)
            .time_to_live(ttl)
            .build();
        Self {
            entries,
            generations: Arc::default(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Bytes> {
        let entry = self.entries.get(key)?;
        if entry
            .tags
            .iter()
            .all(|(tag, generation)| self.generation(tag) == *generation)
        {
            Some(entry.body.clone())
        } else {
            self.entries.invalidate(key);
            None
        }
    }

    pub fn claim(&self, key: String, tags: &[&str]) -> PendingEntry {
        let tags = tags
            .iter()
            .map(|tag| (tag.to_string(), self.generation(tag)))
            .collect();
        PendingEntry { key, tags }
    }

    pub fn fill(&self, pending: PendingEntry, body: Bytes) {
        let entry = CachedResponse {
            body,
            tags: pending.tags,
        };
        self.entries.insert(pending.key, Arc::new(entry));
    }

    pub fn evict_by_tag(&self, tag: &str) {
        let mut generations = match self.generations.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *generations.entry(tag.to_string()).or_insert(0) += 1;
        tracing::debug!(tag, "evicted output cache tag");
    }

    fn generation(&self, tag: &str) -> u64 {
        let generations = match self.generations.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        generations.get(tag).copied().unwrap_or(0)
    }
}

/// Cache key for a user's todo listing.
pub fn todo_list_key(owner: &str) -> String {
    format!("GET /api/todos#{owner}")
}
