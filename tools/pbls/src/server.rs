// Protobuf LSP server implementation.

use dashmap::DashMap;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

/// Document state tracked by the server.
struct Document {
    /// Raw source text.
    text: String,
}

/// Protobuf language server.
pub struct ProtoLanguageServer {
    client: Client,
    documents: DashMap<Url, Document>,
}

impl ProtoLanguageServer {
    pub fn new(client: Client) -> Self {
        ProtoLanguageServer {
            client,
            documents: DashMap::new(),
        }
    }

    /// Parse a document and collect diagnostics.
    fn check_document(&self, text: &str) -> Vec<Diagnostic> {
        let parsed = pb_parse::parse(text);
        let mut diagnostics = Vec::new();
        for error in &parsed.lex_errors {
            diagnostics.push(diagnostic_at(line_col_of_lex(error), error.to_string()));
        }
        for error in &parsed.errors {
            diagnostics.push(diagnostic_at((error.line, error.col), error.to_string()));
        }
        diagnostics
    }

    async fn refresh_diagnostics(&self, uri: Url, text: &str) {
        let diagnostics = self.check_document(text);
        self.client
            .publish_diagnostics(uri, diagnostics, None)
            .await;
    }
}

fn line_col_of_lex(error: &pb_parse::LexError) -> (u32, u32) {
    match *error {
        pb_parse::LexError::UnexpectedChar { line, col, .. }
        | pb_parse::LexError::UnterminatedString { line, col }
        | pb_parse::LexError::UnterminatedComment { line, col } => (line, col),
    }
}

/// Build a diagnostic from 1-based line/column coordinates.
fn diagnostic_at((line, col): (u32, u32), message: String) -> Diagnostic {
    let start = Position::new(line.saturating_sub(1), col.saturating_sub(1));
    let end = Position::new(line.saturating_sub(1), col);
    Diagnostic {
        range: Range::new(start, end),
        severity: Some(DiagnosticSeverity::ERROR),
        source: Some("pbls".to_string()),
        message,
        ..Default::default()
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for ProtoLanguageServer {
    async fn initialize(&self, _: InitializeParams) -> Result<InitializeResult> {
        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::FULL,
                )),
                document_formatting_provider: Some(OneOf::Left(true)),
                ..Default::default()
            },
            server_info: Some(ServerInfo {
                name: "pbls".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!("pbls initialized");
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        let text = params.text_document.text;
        self.refresh_diagnostics(uri.clone(), &text).await;
        self.documents.insert(uri, Document { text });
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        // Full sync: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().last() else {
            return;
        };
        self.refresh_diagnostics(uri.clone(), &change.text).await;
        self.documents.insert(uri, Document { text: change.text });
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        self.documents.remove(&params.text_document.uri);
        self.client
            .publish_diagnostics(params.text_document.uri, Vec::new(), None)
            .await;
    }

    async fn formatting(&self, params: DocumentFormattingParams) -> Result<Option<Vec<TextEdit>>> {
        let uri = params.text_document.uri;
        let Some(document) = self.documents.get(&uri) else {
            return Ok(None);
        };
        let parsed = pb_parse::parse(&document.text);
        let result = pb_fmt::format_file(&parsed.file);
        if let Some(error) = &result.error {
            // A formatter error is a bug, not bad input; the partial
            // output is still safe to apply.
            tracing::error!(%uri, "formatter reported: {error}");
        }
        if result.text == document.text {
            return Ok(Some(Vec::new()));
        }
        let end = end_position(&document.text);
        Ok(Some(vec![TextEdit {
            range: Range::new(Position::new(0, 0), end),
            new_text: result.text,
        }]))
    }
}

/// Position one past the end of the document.
fn end_position(text: &str) -> Position {
    let mut line = 0u32;
    let mut col = 0u32;
    for c in text.chars() {
        if c == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
    }
    Position::new(line, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn end_position_of_multiline_text() {
        assert_eq!(end_position(""), Position::new(0, 0));
        assert_eq!(end_position("ab\nc"), Position::new(1, 1));
        assert_eq!(end_position("ab\n"), Position::new(1, 0));
    }

    #[test]
    fn diagnostic_positions_are_zero_based() {
        let d = diagnostic_at((3, 7), "boom".into());
        assert_eq!(d.range.start, Position::new(2, 6));
        assert_eq!(d.severity, Some(DiagnosticSeverity::ERROR));
    }
}
