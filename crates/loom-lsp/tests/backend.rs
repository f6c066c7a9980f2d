use loom_hints::{HintResponse, Unavailable};
use loom_lsp::{LoomBackend, TypeHintParams};
use tower_lsp::jsonrpc::ErrorCode;
use tower_lsp::lsp_types::*;
use tower_lsp::LanguageServer;

fn uri(name: &str) -> Url {
    Url::parse(&format!("file:///tmp/{name}")).unwrap()
}

async fn open(server: &LoomBackend, name: &str, text: &str) {
    server
        .did_open(DidOpenTextDocumentParams {
            text_document: TextDocumentItem::new(
                uri(name),
                "loom".to_string(),
                0,
                text.to_string(),
            ),
        })
        .await;
}

fn params(name: &str, line: u32, character: u32) -> TypeHintParams {
    TypeHintParams {
        text_document: TextDocumentIdentifier::new(uri(name)),
        position: Position::new(line, character),
    }
}

#[tokio::test]
async fn type_hints_follow_edits() {
    let (service, _) = loom_lsp::service(Default::default());
    let server = service.inner();
    open(server, "a.loom", "let x = 1").await;

    let response = server.type_hints(params("a.loom", 0, 4)).await.unwrap();
    assert_eq!(response.hint().map(|h| h.ty.as_str()), Some("int"));

    server
        .did_change(DidChangeTextDocumentParams {
            text_document: VersionedTextDocumentIdentifier::new(uri("a.loom"), 1),
            content_changes: vec![TextDocumentContentChangeEvent {
                range: Some(Range::new(Position::new(0, 8), Position::new(0, 9))),
                range_length: None,
                text: "\"s\"".to_string(),
            }],
        })
        .await;
    let response = server.type_hints(params("a.loom", 0, 4)).await.unwrap();
    assert_eq!(response.hint().map(|h| h.ty.as_str()), Some("string"));
}

#[tokio::test]
async fn unknown_document_is_invalid_params() {
    let (service, _) = loom_lsp::service(Default::default());
    let err = service
        .inner()
        .type_hints(params("missing.txt", 0, 0))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidParams);
}

#[tokio::test]
async fn out_of_range_is_unavailable() {
    let (service, _) = loom_lsp::service(Default::default());
    let server = service.inner();
    open(server, "a.loom", "let x = 1").await;
    let response = server.type_hints(params("a.loom", 9, 0)).await.unwrap();
    assert_eq!(response, HintResponse::unavailable(Unavailable::OutOfRange));
}

#[tokio::test]
async fn hover_shows_the_type() {
    let (service, _) = loom_lsp::service(Default::default());
    let server = service.inner();
    open(server, "h.loom", "fn id(x) do x end").await;

    let hover = server
        .hover(HoverParams {
            text_document_position_params: TextDocumentPositionParams::new(
                TextDocumentIdentifier::new(uri("h.loom")),
                Position::new(0, 3),
            ),
            work_done_progress_params: Default::default(),
        })
        .await
        .unwrap()
        .expect("hover");
    match hover.contents {
        HoverContents::Markup(markup) => assert_eq!(markup.value, "```loom\n('a) -> 'a\n```"),
        other => panic!("unexpected hover {other:?}"),
    }
    assert_eq!(
        hover.range,
        Some(Range::new(Position::new(0, 3), Position::new(0, 5)))
    );
}

#[tokio::test]
async fn inlay_hints_for_bindings() {
    let (service, _) = loom_lsp::service(Default::default());
    let server = service.inner();
    open(server, "i.loom", "let s = \"a\" ++ \"b\"").await;

    let hints = server
        .inlay_hint(InlayHintParams {
            work_done_progress_params: Default::default(),
            text_document: TextDocumentIdentifier::new(uri("i.loom")),
            range: Range::new(Position::new(0, 0), Position::new(1, 0)),
        })
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hints.len(), 1);
    assert_eq!(hints[0].position, Position::new(0, 5));
    match &hints[0].label {
        InlayHintLabel::String(label) => assert_eq!(label, ": string"),
        other => panic!("unexpected label {other:?}"),
    }
}

#[tokio::test]
async fn closed_document_is_forgotten() {
    let (service, _) = loom_lsp::service(Default::default());
    let server = service.inner();
    open(server, "c.loom", "1").await;
    server
        .did_close(DidCloseTextDocumentParams {
            text_document: TextDocumentIdentifier::new(uri("c.loom")),
        })
        .await;
    assert!(server.type_hints(params("c.loom", 0, 0)).await.is_err());
}
