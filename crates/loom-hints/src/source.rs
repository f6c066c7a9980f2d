//! Source Model: the text, version and parse of every open document.
//!
//! Documents live in a `DashMap`, so edits to one document hold only that
//! document's shard lock and are applied one at a time, while other
//! documents stay available.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use loom_common::position::Range;
use loom_common::span::LineIndex;
use loom_parser::{Edit, Parse, Strategy};
use rowan::TextRange;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::EngineError;

/// One edit sent by the client. `range: None` replaces the whole text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextChange {
    pub range: Option<Range>,
    pub text: String,
}

impl TextChange {
    pub fn full(text: impl Into<String>) -> Self {
        Self {
            range: None,
            text: text.into(),
        }
    }

    pub fn replace(range: Range, text: impl Into<String>) -> Self {
        Self {
            range: Some(range),
            text: text.into(),
        }
    }
}

/// Identifies one state of a document's text.
///
/// `version` is the client's number and can repeat after a close and
/// reopen. `generation` is unique within a [`SourceModel`] and changes on
/// every open and edit, so two revisions are equal only when they describe
/// the same text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Revision {
    pub version: i32,
    pub generation: u64,
}

#[derive(Debug, Clone)]
struct Document {
    text: String,
    version: i32,
    generation: u64,
    parse: Parse,
    line_index: Arc<LineIndex>,
}

impl Document {
    fn new(text: String, version: i32, generation: u64) -> Self {
        let parse = loom_parser::parse(&text);
        let line_index = Arc::new(LineIndex::new(&text));
        Self {
            text,
            version,
            generation,
            parse,
            line_index,
        }
    }

    fn revision(&self) -> Revision {
        Revision {
            version: self.version,
            generation: self.generation,
        }
    }

    fn apply(&mut self, uri: &str, change: &TextChange) -> Result<Strategy, EngineError> {
        let Some(range) = change.range else {
            self.text = change.text.clone();
            self.parse = loom_parser::parse(&self.text);
            self.line_index = Arc::new(LineIndex::new(&self.text));
            return Ok(Strategy::Full);
        };

        let invalid = |reason: String| EngineError::InvalidEdit {
            uri: uri.to_string(),
            reason,
        };
        let start = self
            .line_index
            .offset(range.start)
            .ok_or_else(|| invalid(format!("start {:?} is outside the document", range.start)))?;
        let end = self
            .line_index
            .offset(range.end)
            .ok_or_else(|| invalid(format!("end {:?} is outside the document", range.end)))?;
        if start > end {
            return Err(invalid("range ends before it starts".to_string()));
        }

        let edit = Edit::new(TextRange::new(start.into(), end.into()), change.text.clone());
        edit.apply(&mut self.text);
        let (parse, strategy) = loom_parser::reparse(&self.parse, &edit, &self.text);
        self.parse = parse;
        self.line_index = Arc::new(LineIndex::new(&self.text));
        Ok(strategy)
    }
}

/// Immutable view of one document version, safe to send to a worker.
#[derive(Debug, Clone)]
pub struct DocumentSnapshot {
    pub uri: String,
    pub version: i32,
    pub generation: u64,
    pub text: Arc<str>,
    pub parse: Parse,
    pub line_index: Arc<LineIndex>,
}

impl DocumentSnapshot {
    pub fn revision(&self) -> Revision {
        Revision {
            version: self.version,
            generation: self.generation,
        }
    }
}

/// All open documents, keyed by URI.
#[derive(Debug, Default)]
pub struct SourceModel {
    documents: DashMap<String, Document>,
    last_generation: AtomicU64,
}

impl SourceModel {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_generation(&self) -> u64 {
        self.last_generation.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Open `uri`, replacing any document already open under that URI.
    pub fn open(&self, uri: &str, text: impl Into<String>, version: i32) {
        let generation = self.next_generation();
        debug!(uri, version, generation, "open document");
        self.documents.insert(
            uri.to_string(),
            Document::new(text.into(), version, generation),
        );
    }

    /// Apply one edit and bump the version by one.
    ///
    /// A range that does not fit the document is rejected and leaves the
    /// document untouched.
    pub fn apply_change(
        &self,
        uri: &str,
        range: Option<Range>,
        text: impl Into<String>,
    ) -> Result<i32, EngineError> {
        let mut doc = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| EngineError::UnknownDocument(uri.to_string()))?;
        let strategy = doc.apply(
            uri,
            &TextChange {
                range,
                text: text.into(),
            },
        )?;
        doc.version += 1;
        doc.generation = self.next_generation();
        debug!(uri, version = doc.version, ?strategy, "applied change");
        Ok(doc.version)
    }

    /// Apply a batch of edits stamped with the client's `version`.
    ///
    /// Versions only move forward: a batch whose version is not newer than
    /// the document's is rejected. The batch is all-or-nothing.
    pub fn change(
        &self,
        uri: &str,
        version: i32,
        changes: &[TextChange],
    ) -> Result<i32, EngineError> {
        let mut doc = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| EngineError::UnknownDocument(uri.to_string()))?;
        if version <= doc.version {
            return Err(EngineError::StaleChange {
                uri: uri.to_string(),
                current: doc.version,
                received: version,
            });
        }

        let mut next = doc.clone();
        for change in changes {
            let strategy = next.apply(uri, change)?;
            debug!(uri, ?strategy, "applied change");
        }
        next.version = version;
        next.generation = self.next_generation();
        *doc = next;
        Ok(version)
    }

    /// Apply a batch of edits, bumping the version once per edit.
    ///
    /// All-or-nothing like [`change`](Self::change): when one edit fails the
    /// document keeps its text and version.
    pub fn apply_changes(
        &self,
        uri: &str,
        changes: &[TextChange],
    ) -> Result<i32, EngineError> {
        let mut doc = self
            .documents
            .get_mut(uri)
            .ok_or_else(|| EngineError::UnknownDocument(uri.to_string()))?;
        if changes.is_empty() {
            return Ok(doc.version);
        }
        let mut next = doc.clone();
        for change in changes {
            let strategy = next.apply(uri, change)?;
            next.version += 1;
            debug!(uri, version = next.version, ?strategy, "applied change");
        }
        next.generation = self.next_generation();
        let version = next.version;
        *doc = next;
        Ok(version)
    }

    /// Forget `uri`. Returns whether it was open.
    pub fn close(&self, uri: &str) -> bool {
        debug!(uri, "close document");
        self.documents.remove(uri).is_some()
    }

    pub fn current_version(&self, uri: &str) -> Option<i32> {
        self.documents.get(uri).map(|doc| doc.version)
    }

    pub fn current_revision(&self, uri: &str) -> Option<Revision> {
        self.documents.get(uri).map(|doc| doc.revision())
    }

    pub fn snapshot(&self, uri: &str) -> Result<DocumentSnapshot, EngineError> {
        let doc = self
            .documents
            .get(uri)
            .ok_or_else(|| EngineError::UnknownDocument(uri.to_string()))?;
        Ok(DocumentSnapshot {
            uri: uri.to_string(),
            version: doc.version,
            generation: doc.generation,
            text: Arc::from(doc.text.as_str()),
            parse: doc.parse.clone(),
            line_index: Arc::clone(&doc.line_index),
        })
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
