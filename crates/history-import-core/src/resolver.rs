use history_import_remote::{MetadataLookup, RemoteError, ShowCandidate};
use std::collections::HashMap;
use tracing::debug;

/// Maps show titles to external show ids, memoized for one run.
///
/// The memo is keyed on a normalized form of the title and caches
/// negative answers too, so a show that resolves to nothing costs one
/// search no matter how many episodes of it appear in the input. The
/// cache lives and dies with the resolver; nothing is persisted.
pub struct IdentityResolver<'a> {
    lookup: &'a dyn MetadataLookup,
    overrides: &'a HashMap<String, u32>,
    cache: HashMap<String, Option<u32>>,
}

impl<'a> IdentityResolver<'a> {
    pub fn new(lookup: &'a dyn MetadataLookup, overrides: &'a HashMap<String, u32>) -> Self {
        Self {
            lookup,
            overrides,
            cache: HashMap::new(),
        }
    }

    /// Resolve a show title to its external id.
    ///
    /// `Ok(None)` means the metadata service had no candidates; the
    /// caller marks the show's events unresolved and the run continues.
    /// A transport error is returned as-is.
    pub async fn resolve(&mut self, title: &str) -> Result<Option<u32>, RemoteError> {
        if let Some(&id) = self.overrides.get(title) {
            return Ok(Some(id));
        }

        let key = normalize_title(title);
        if let Some(&cached) = self.cache.get(&key) {
            return Ok(cached);
        }

        let candidates = self.lookup.search(title).await?;
        let resolved = pick_candidate(candidates);
        if resolved.is_none() {
            debug!(title, "No metadata candidates for show");
        }
        self.cache.insert(key, resolved);
        Ok(resolved)
    }
}

/// Highest relevance wins; ties go to the lowest id so identical
/// candidate lists always resolve identically.
fn pick_candidate(mut candidates: Vec<ShowCandidate>) -> Option<u32> {
    candidates.sort_by(|a, b| {
        b.relevance
            .total_cmp(&a.relevance)
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates.first().map(|c| c.id)
}

/// Cache key: whitespace-collapsed, lowercased title.
fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
