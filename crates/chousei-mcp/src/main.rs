//! chousei-mcp: 調整さん自動化 MCP サーバー
//!
//! 自然言語による日程指定で調整さんのイベントを自動作成します。
//!
//! Usage:
//!   chousei-mcp           - Start MCP server on stdio
//!   chousei-mcp --help    - Show help

mod config;
mod server;

use config::Config;
use rmcp::{ServiceExt, transport::stdio};
use server::ChouseiServer;
use tracing_subscriber::EnvFilter;

/// Run mode
enum RunMode {
    /// MCP server on stdio
    Serve,
    /// Show help
    Help,
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match parse_args() {
        RunMode::Help => {
            print_help();
            return Ok(());
        }
        RunMode::Version => {
            println!("chousei-mcp {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        RunMode::Serve => {}
    }

    // stdout は MCP の通信路なので、ログはすべて stderr へ出す
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    // Load .env file
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    tracing::info!(engine = ?config.engine, "調整さん MCP サーバーを起動します");

    let server = ChouseiServer::new(config)?;
    let service = server.serve(stdio()).await?;

    tracing::info!("MCP サーバーを開始しました (stdio)");
    service.waiting().await?;

    tracing::info!("MCP サーバーを終了します");
    Ok(())
}

/// Parse command line arguments
fn parse_args() -> RunMode {
    let args: Vec<String> = std::env::args().collect();

    for arg in args.iter().skip(1) {
        match arg.as_str() {
            "--help" | "-h" => return RunMode::Help,
            "--version" | "-v" => return RunMode::Version,
            _ => {}
        }
    }

    RunMode::Serve
}

/// Print help message
fn print_help() {
    println!("chousei-mcp - 調整さん自動化 MCP サーバー");
    println!();
    println!("Usage:");
    println!("  chousei-mcp           Start MCP server on stdio");
    println!("  chousei-mcp --help    Show this help message");
    println!("  chousei-mcp --version Show version");
    println!();
    println!("Environment Variables:");
    println!("  CHOUSEI_ENGINE       Schedule engine: local or gemini (default: local)");
    println!("  GEMINI_API_KEY       Gemini API key (required when engine is gemini)");
    println!("  GEMINI_API_URL       Custom Gemini API endpoint");
    println!("  BROWSER_HEADLESS     Run Chrome headless (default: true)");
    println!("  RUST_LOG             Log filter (default: info)");
    println!();
    println!("Configuration File:");
    println!("  chousei-mcp.toml     Loaded from the current directory when present");
}
