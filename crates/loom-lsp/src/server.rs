//! Tower-lsp backend for the typeloom hint engine.
//!
//! Implements the `LanguageServer` trait with support for:
//! - textDocument/didOpen, didChange (incremental), didClose
//! - published diagnostics after every open and change
//! - textDocument/hover (type at the cursor)
//! - textDocument/inlayHint (types of unannotated bindings)
//! - the custom `loom/typeHints` request

use loom_hints::{
    ConfigOverrides, DocumentEvent, Engine, EngineConfig, HintResponse, TextChange,
};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{info, warn};

use crate::convert;

/// Params of `loom/typeHints`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeHintParams {
    pub text_document: TextDocumentIdentifier,
    pub position: Position,
}

pub struct LoomBackend {
    client: Client,
    /// Replaced once `initialize` delivers the client's options.
    engine: RwLock<Engine>,
    overrides: ConfigOverrides,
}

impl LoomBackend {
    pub fn new(client: Client, overrides: ConfigOverrides) -> Self {
        Self {
            client,
            engine: RwLock::new(Engine::new(overrides.apply(EngineConfig::default()))),
            overrides,
        }
    }

    async fn engine(&self) -> Engine {
        self.engine.read().await.clone()
    }

    /// Handler of the custom `loom/typeHints` request.
    pub async fn type_hints(&self, params: TypeHintParams) -> Result<HintResponse> {
        let uri = params.text_document.uri;
        self.engine()
            .await
            .get_type_hints(uri.as_str(), convert::position(params.position))
            .await
            .map_err(convert::to_rpc_error)
    }

    async fn apply(&self, event: DocumentEvent, uri: Url) {
        let engine = self.engine().await;
        let version = match engine.handle(event) {
            Ok(version) => version,
            Err(err) => {
                warn!(uri = %uri, error = %err, "rejected document event");
                self.client
                    .log_message(MessageType::WARNING, err.to_string())
                    .await;
                return;
            }
        };
        let diagnostics = match engine.diagnostics(uri.as_str()).await {
            Ok(diagnostics) => diagnostics.into_iter().map(convert::to_diagnostic).collect(),
            Err(err) => {
                warn!(uri = %uri, error = %err, "no diagnostics");
                return;
            }
        };
        self.client
            .publish_diagnostics(uri, diagnostics, version)
            .await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for LoomBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let config = match params.initialization_options {
            Some(options) => serde_json::from_value::<EngineConfig>(options).unwrap_or_else(|err| {
                warn!(error = %err, "ignoring malformed initializationOptions");
                EngineConfig::default()
            }),
            None => EngineConfig::default(),
        };
        *self.engine.write().await = Engine::new(self.overrides.apply(config));

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                hover_provider: Some(HoverProviderCapability::Simple(true)),
                inlay_hint_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "loom-lsp".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("language server initialized");
        self.client
            .log_message(MessageType::INFO, "loom LSP server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("language server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let doc = params.text_document;
        let event = DocumentEvent::Open {
            uri: doc.uri.to_string(),
            text: doc.text,
            version: doc.version,
        };
        self.apply(event, doc.uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let doc = params.text_document;
        let changes = params
            .content_changes
            .into_iter()
            .map(|change| TextChange {
                range: change.range.map(convert::range),
                text: change.text,
            })
            .collect();
        let event = DocumentEvent::Change {
            uri: doc.uri.to_string(),
            version: Some(doc.version),
            changes,
        };
        self.apply(event, doc.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        self.engine().await.close(uri.as_str());
        self.client.publish_diagnostics(uri, vec![], None).await;
    }

    async fn hover(&self, params: HoverParams) -> Result<Option<Hover>> {
        let params = params.text_document_position_params;
        let response = self
            .type_hints(TypeHintParams {
                text_document: params.text_document,
                position: params.position,
            })
            .await?;
        Ok(response.hint().map(|hint| Hover {
            contents: HoverContents::Markup(MarkupContent {
                kind: MarkupKind::Markdown,
                value: format!("```loom\n{}\n```", hint.ty),
            }),
            range: Some(convert::to_range(hint.range)),
        }))
    }

    async fn inlay_hint(&self, params: InlayHintParams) -> Result<Option<Vec<InlayHint>>> {
        let hints = self
            .engine()
            .await
            .inlay_hints(params.text_document.uri.as_str(), convert::range(params.range))
            .await
            .map_err(convert::to_rpc_error)?;
        Ok(Some(hints.into_iter().map(convert::to_inlay_hint).collect()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn server_capabilities() {
        let (service, _) = tower_lsp::LspService::new(|client| {
            LoomBackend::new(client, ConfigOverrides::default())
        });
        let server = service.inner();
        let result = server
            .initialize(InitializeParams::default())
            .await
            .unwrap();

        let caps = result.capabilities;
        assert!(caps.hover_provider.is_some());
        assert!(caps.inlay_hint_provider.is_some());
        assert_eq!(
            caps.text_document_sync,
            Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::INCREMENTAL))
        );
    }

    #[tokio::test]
    async fn initialization_options_configure_the_engine() {
        let (service, _) = tower_lsp::LspService::new(|client| {
            LoomBackend::new(
                client,
                ConfigOverrides {
                    inference_budget: Some(99),
                    request_timeout_ms: None,
                },
            )
        });
        let server = service.inner();
        let params = InitializeParams {
            initialization_options: Some(serde_json::json!({
                "inferenceBudget": 5,
                "requestTimeoutMs": 250,
                "inlayHints": false
            })),
            ..Default::default()
        };
        server.initialize(params).await.unwrap();

        let config = server.engine().await.config().clone();
        assert_eq!(config.inference_budget, 99);
        assert_eq!(config.request_timeout_ms, 250);
        assert!(!config.inlay_hints);
    }
}
