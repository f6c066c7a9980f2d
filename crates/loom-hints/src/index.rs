//! Hint Index: the latest analysis of each document, tagged with the
//! revision it was computed from.
//!
//! At most one analysis is kept per URI. Storing a newer revision evicts the
//! older one; an analysis whose revision is no longer current is refused.
//! Entries are matched on the whole [`Revision`], so a document closed and
//! reopened under the same client version never sees the old analysis.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use loom_common::position::Position;
use tracing::debug;

use crate::analysis::Analysis;
use crate::source::Revision;
use crate::HintResponse;

/// Outcome of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Hit(HintResponse),
    /// Nothing cached for this revision yet.
    Miss,
    /// The cache already holds a newer revision than the one asked for.
    Stale,
}

#[derive(Debug, Default)]
pub struct HintIndex {
    entries: DashMap<String, Arc<Analysis>>,
}

impl HintIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer a hint request for `revision` from the cache.
    pub fn lookup(&self, uri: &str, position: Position, revision: Revision) -> Lookup {
        let Some(analysis) = self.entries.get(uri) else {
            return Lookup::Miss;
        };
        if analysis.generation > revision.generation {
            return Lookup::Stale;
        }
        if analysis.revision() != revision {
            return Lookup::Miss;
        }
        let response = match analysis.hint_at(position) {
            Ok(hint) => HintResponse::Available(hint),
            Err(reason) => HintResponse::Unavailable { reason },
        };
        Lookup::Hit(response)
    }

    /// The cached analysis if it was computed for exactly `revision`.
    pub fn get(&self, uri: &str, revision: Revision) -> Option<Arc<Analysis>> {
        self.entries
            .get(uri)
            .filter(|analysis| analysis.revision() == revision)
            .map(|analysis| Arc::clone(&analysis))
    }

    /// Store `analysis` if it was computed from the document's `current`
    /// revision.
    ///
    /// Returns `false` when the analysis was discarded because the document
    /// has moved on or a newer analysis is already cached.
    pub fn store(&self, analysis: Arc<Analysis>, current: Option<Revision>) -> bool {
        if current != Some(analysis.revision()) {
            debug!(
                uri = %analysis.uri,
                version = analysis.version,
                generation = analysis.generation,
                ?current,
                "discarding superseded analysis"
            );
            return false;
        }
        match self.entries.entry(analysis.uri.clone()) {
            Entry::Occupied(mut entry) => {
                if entry.get().generation > analysis.generation {
                    return false;
                }
                entry.insert(analysis);
            }
            Entry::Vacant(entry) => {
                entry.insert(analysis);
            }
        }
        true
    }

    /// Drop the cached analysis of `uri` if it predates `current`.
    pub fn invalidate(&self, uri: &str, current: Revision) {
        if self
            .entries
            .remove_if(uri, |_, analysis| analysis.generation < current.generation)
            .is_some()
        {
            debug!(uri, version = current.version, "evicted superseded hints");
        }
    }

    pub fn remove(&self, uri: &str) {
        self.entries.remove(uri);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
