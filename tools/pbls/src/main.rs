// Protobuf language server.
//
// Serves LSP over stdio by default:
// - parse diagnostics on open/change
// - whole-document formatting
//
// `pbls vet` instead compiles the working directory once and reports
// every diagnostic, exiting non-zero when any are found.

mod server;
mod vet;

use clap::{Parser, Subcommand};
use tower_lsp::{LspService, Server};

#[derive(Parser)]
#[command(name = "pbls", version, about = "Protobuf language server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Parse every .proto under the working directory and report errors.
    Vet,
}

#[tokio::main]
async fn main() {
    // Keep stdout clean for the protocol; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Vet) => std::process::exit(vet::run()),
        None => {
            let stdin = tokio::io::stdin();
            let stdout = tokio::io::stdout();
            let (service, socket) = LspService::new(server::ProtoLanguageServer::new);
            Server::new(stdin, stdout, socket).serve(service).await;
        }
    }
}
