//! Language Server Protocol adapter for the typeloom hint engine.
//!
//! Editors get diagnostics, hover types, inlay hints and the custom
//! `loom/typeHints` request. The transport is `tower-lsp` over
//! stdin/stdout.

pub mod convert;
pub mod server;

use loom_hints::ConfigOverrides;
use tower_lsp::{LspService, Server};

pub use server::{LoomBackend, TypeHintParams};

/// Name of the custom hint request.
pub const TYPE_HINTS_METHOD: &str = "loom/typeHints";

/// Build the service with the custom request registered.
pub fn service(overrides: ConfigOverrides) -> (LspService<LoomBackend>, tower_lsp::ClientSocket) {
    LspService::build(move |client| LoomBackend::new(client, overrides))
        .custom_method(TYPE_HINTS_METHOD, LoomBackend::type_hints)
        .finish()
}

/// Run the LSP server on stdin/stdout until the client disconnects.
pub async fn run_server(overrides: ConfigOverrides) {
    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = service(overrides);
    Server::new(stdin, stdout, socket).serve(service).await;
}
