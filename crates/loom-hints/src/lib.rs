//! The typeloom hint engine.
//!
//! [`Engine`] ties together the [`SourceModel`] (open documents), the
//! [`HintIndex`] (one cached analysis per document revision) and the
//! [`Dispatcher`] (answers requests, computing on a miss). It performs no
//! I/O of its own; the LSP adapter and the CLI drive it.

pub mod analysis;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod index;
pub mod source;

use std::sync::Arc;

use loom_common::position::{Position, Range};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub use analysis::{Analysis, Diagnostic, InlayHint, Severity};
pub use config::{ConfigOverrides, EngineConfig};
pub use dispatch::Dispatcher;
pub use error::EngineError;
pub use index::HintIndex;
pub use source::{DocumentSnapshot, Revision, SourceModel, TextChange};

/// A type hint as sent over the wire: `{ "type": ..., "range": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeHint {
    #[serde(rename = "type")]
    pub ty: String,
    pub range: Range,
}

/// Why no hint could be produced. None of these are errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unavailable {
    /// The position lies outside the document.
    OutOfRange,
    /// Nothing typed at the position (a keyword, a comment, ...).
    NoType,
    /// The request targets a version that is no longer current.
    StaleRequest,
    /// Inference ran out of budget or time.
    InferenceTimeout,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum HintResponse {
    Available(TypeHint),
    Unavailable { reason: Unavailable },
}

impl HintResponse {
    pub fn unavailable(reason: Unavailable) -> Self {
        HintResponse::Unavailable { reason }
    }

    pub fn hint(&self) -> Option<&TypeHint> {
        match self {
            HintResponse::Available(hint) => Some(hint),
            HintResponse::Unavailable { .. } => None,
        }
    }
}

/// Document lifecycle notifications, applied in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentEvent {
    Open {
        uri: String,
        text: String,
        version: i32,
    },
    /// `version: None` bumps the current version once per change. Either
    /// way the batch is applied whole or not at all.
    Change {
        uri: String,
        version: Option<i32>,
        changes: Vec<TextChange>,
    },
    Close {
        uri: String,
    },
}

/// Server context owning the documents, the hint cache and the config.
#[derive(Debug, Clone)]
pub struct Engine {
    documents: Arc<SourceModel>,
    index: Arc<HintIndex>,
    dispatcher: Dispatcher,
    config: EngineConfig,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        let documents = Arc::new(SourceModel::new());
        let index = Arc::new(HintIndex::new());
        let dispatcher = Dispatcher::new(
            Arc::clone(&documents),
            Arc::clone(&index),
            config.clone(),
        );
        info!(?config, "engine started");
        Self {
            documents,
            index,
            dispatcher,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn documents(&self) -> &SourceModel {
        &self.documents
    }

    pub fn index(&self) -> &HintIndex {
        &self.index
    }

    /// Apply one lifecycle event. Returns the document version afterwards,
    /// or `None` after a close.
    pub fn handle(&self, event: DocumentEvent) -> Result<Option<i32>, EngineError> {
        match event {
            DocumentEvent::Open { uri, text, version } => {
                self.open(&uri, text, version);
                Ok(Some(version))
            }
            DocumentEvent::Change {
                uri,
                version: Some(version),
                changes,
            } => {
                let version = self.documents.change(&uri, version, &changes)?;
                self.evict_superseded(&uri);
                Ok(Some(version))
            }
            DocumentEvent::Change {
                uri,
                version: None,
                changes,
            } => {
                let version = self.documents.apply_changes(&uri, &changes)?;
                self.evict_superseded(&uri);
                Ok(Some(version))
            }
            DocumentEvent::Close { uri } => {
                self.close(&uri);
                Ok(None)
            }
        }
    }

    pub fn open(&self, uri: &str, text: impl Into<String>, version: i32) {
        self.index.remove(uri);
        self.documents.open(uri, text, version);
    }

    /// Replace `range` (or everything, for `None`) with `text`.
    pub fn apply_change(
        &self,
        uri: &str,
        range: Option<Range>,
        text: impl Into<String>,
    ) -> Result<i32, EngineError> {
        let version = self.documents.apply_change(uri, range, text)?;
        self.evict_superseded(uri);
        Ok(version)
    }

    fn evict_superseded(&self, uri: &str) {
        if let Some(current) = self.documents.current_revision(uri) {
            self.index.invalidate(uri, current);
        }
    }

    pub fn close(&self, uri: &str) {
        self.documents.close(uri);
        self.index.remove(uri);
    }

    pub async fn get_type_hints(
        &self,
        uri: &str,
        position: Position,
    ) -> Result<HintResponse, EngineError> {
        let response = self.dispatcher.get_type_hints(uri, position).await?;
        debug!(uri, ?position, ?response, "type hint");
        Ok(response)
    }

    /// Like [`get_type_hints`](Self::get_type_hints) for a specific version.
    pub async fn lookup(
        &self,
        uri: &str,
        position: Position,
        version: i32,
    ) -> Result<HintResponse, EngineError> {
        self.dispatcher.lookup(uri, position, version).await
    }

    /// Syntax and type errors of the current version.
    ///
    /// When inference is unavailable only syntax errors are reported.
    pub async fn diagnostics(&self, uri: &str) -> Result<Vec<Diagnostic>, EngineError> {
        match self.dispatcher.analysis(uri).await? {
            Ok(analysis) => Ok(analysis.diagnostics()),
            Err(_) => {
                let snapshot = self.documents.snapshot(uri)?;
                Ok(analysis::parse_diagnostics(
                    &snapshot.parse,
                    &snapshot.line_index,
                ))
            }
        }
    }

    pub async fn inlay_hints(
        &self,
        uri: &str,
        range: Range,
    ) -> Result<Vec<InlayHint>, EngineError> {
        if !self.config.inlay_hints {
            return Ok(Vec::new());
        }
        Ok(match self.dispatcher.analysis(uri).await? {
            Ok(analysis) => analysis.inlay_hints(range),
            Err(_) => Vec::new(),
        })
    }

    /// The analysis of the current version, for callers that need the raw
    /// inference result (hover, CLI output).
    pub async fn analysis(
        &self,
        uri: &str,
    ) -> Result<Result<Arc<Analysis>, Unavailable>, EngineError> {
        self.dispatcher.analysis(uri).await
    }
}
