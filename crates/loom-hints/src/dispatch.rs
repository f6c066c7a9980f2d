//! Request Dispatcher: answers hint requests from the index and computes
//! missing analyses on a blocking worker, within a step budget and a
//! wall-clock timeout.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use loom_common::position::Position;
use loom_typeck::{Budget, Interrupted};
use tracing::{debug, warn};

use crate::analysis::{analyze, Analysis};
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::index::{HintIndex, Lookup};
use crate::source::SourceModel;
use crate::{HintResponse, Unavailable};

#[derive(Debug, Clone)]
pub struct Dispatcher {
    documents: Arc<SourceModel>,
    index: Arc<HintIndex>,
    config: EngineConfig,
}

impl Dispatcher {
    pub fn new(
        documents: Arc<SourceModel>,
        index: Arc<HintIndex>,
        config: EngineConfig,
    ) -> Self {
        Self {
            documents,
            index,
            config,
        }
    }

    /// Hint at `position` in the current revision of `uri`.
    pub async fn get_type_hints(
        &self,
        uri: &str,
        position: Position,
    ) -> Result<HintResponse, EngineError> {
        let version = self
            .documents
            .current_version(uri)
            .ok_or_else(|| EngineError::UnknownDocument(uri.to_string()))?;
        self.lookup(uri, position, version).await
    }

    /// Hint at `position` in `version` of `uri`.
    ///
    /// Versions other than the current one are answered with
    /// `StaleRequest`.
    pub async fn lookup(
        &self,
        uri: &str,
        position: Position,
        version: i32,
    ) -> Result<HintResponse, EngineError> {
        let current = self
            .documents
            .current_revision(uri)
            .ok_or_else(|| EngineError::UnknownDocument(uri.to_string()))?;
        if version != current.version {
            return Ok(HintResponse::unavailable(Unavailable::StaleRequest));
        }
        match self.index.lookup(uri, position, current) {
            Lookup::Hit(response) => {
                debug!(uri, version, "hint cache hit");
                return Ok(response);
            }
            Lookup::Stale => return Ok(HintResponse::unavailable(Unavailable::StaleRequest)),
            Lookup::Miss => {}
        }

        Ok(match self.analysis(uri).await? {
            Ok(analysis) if analysis.revision() == current => match analysis.hint_at(position) {
                Ok(hint) => HintResponse::Available(hint),
                Err(reason) => HintResponse::unavailable(reason),
            },
            Ok(_) => HintResponse::unavailable(Unavailable::StaleRequest),
            Err(reason) => HintResponse::unavailable(reason),
        })
    }

    /// The analysis of the current revision of `uri`, computing it on a miss.
    ///
    /// Dropping the returned future before it resolves stops the worker at
    /// its next cancellation check.
    pub async fn analysis(
        &self,
        uri: &str,
    ) -> Result<Result<Arc<Analysis>, Unavailable>, EngineError> {
        let snapshot = self.documents.snapshot(uri)?;
        let revision = snapshot.revision();
        let version = revision.version;
        if let Some(analysis) = self.index.get(uri, revision) {
            return Ok(Ok(analysis));
        }

        debug!(uri, version, generation = revision.generation, "computing analysis");
        let abandoned = Arc::new(AtomicBool::new(false));
        let budget = {
            let abandoned = Arc::clone(&abandoned);
            let documents = Arc::clone(&self.documents);
            let uri = uri.to_string();
            Budget::steps(self.config.inference_budget).with_cancel(move || {
                abandoned.load(Ordering::Relaxed)
                    || documents.current_revision(&uri) != Some(revision)
            })
        };
        let _abandon = AbandonOnDrop(abandoned);
        let task = tokio::task::spawn_blocking(move || analyze(snapshot, budget));

        let outcome = match tokio::time::timeout(self.config.request_timeout(), task).await {
            Err(_) => {
                warn!(
                    uri,
                    version,
                    timeout_ms = self.config.request_timeout_ms,
                    "inference timed out"
                );
                return Ok(Err(Unavailable::InferenceTimeout));
            }
            Ok(Err(join_error)) => {
                warn!(uri, version, error = %join_error, "analysis worker failed");
                return Err(EngineError::Worker(join_error.to_string()));
            }
            Ok(Ok(outcome)) => outcome,
        };

        match outcome {
            Ok(analysis) => {
                let analysis = Arc::new(analysis);
                let current = self.documents.current_revision(uri);
                if current.is_none() {
                    return Err(EngineError::UnknownDocument(uri.to_string()));
                }
                if self.index.store(Arc::clone(&analysis), current) {
                    Ok(Ok(analysis))
                } else {
                    Ok(Err(Unavailable::StaleRequest))
                }
            }
            Err(Interrupted::BudgetExhausted) => {
                warn!(
                    uri,
                    version,
                    budget = self.config.inference_budget,
                    "inference budget exhausted"
                );
                Ok(Err(Unavailable::InferenceTimeout))
            }
            Err(Interrupted::Cancelled) => {
                debug!(uri, version, "inference cancelled by a newer revision");
                Ok(Err(Unavailable::StaleRequest))
            }
        }
    }
}

/// Raises the worker's cancel flag when the awaiting request goes away,
/// whether it timed out, finished or was dropped by the caller.
struct AbandonOnDrop(Arc<AtomicBool>);

impl Drop for AbandonOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}
