//! Avatar memoization and concurrent backfill.

use crate::resolver::NameResolver;
use ensgraph_core::GraphView;
use futures::future::join_all;
use log::info;
use std::collections::HashMap;

/// Resolved avatars by name. A `None` entry records a completed lookup that
/// found nothing, so the name is not looked up again.
#[derive(Debug, Clone, Default)]
pub struct AvatarCache {
    entries: HashMap<String, Option<String>>,
}

impl AvatarCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Avatar URL for `name`, if one was resolved.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).and_then(|entry| entry.as_deref())
    }

    /// Whether a lookup for `name` already completed, with or without a result.
    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, avatar: Option<String>) {
        self.entries.insert(name.into(), avatar);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Resolves every name referenced by `view` that the cache has not seen yet.
///
/// Lookups run concurrently; results are merged once all of them finish.
/// Returns the number of names added, so a nonzero value means the visual
/// graph should be rebuilt.
pub async fn backfill_avatars<R>(view: &GraphView, cache: &mut AvatarCache, resolver: &R) -> usize
where
    R: NameResolver + ?Sized,
{
    let missing: Vec<String> = view
        .referenced_names()
        .into_iter()
        .filter(|name| !cache.contains(name))
        .map(str::to_string)
        .collect();
    if missing.is_empty() {
        return 0;
    }

    let resolved = join_all(missing.iter().map(|name| resolver.resolve_avatar(name))).await;
    let found = resolved.iter().filter(|avatar| avatar.is_some()).count();

    let added = missing.len();
    for (name, avatar) in missing.into_iter().zip(resolved) {
        cache.insert(name, avatar);
    }
    info!("event=avatar_backfill module=avatar status=ok looked_up={added} found={found}");
    added
}
