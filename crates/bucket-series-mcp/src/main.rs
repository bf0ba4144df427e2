//! bucket-series MCP server entry point.

use std::sync::Arc;
use tokio::sync::Mutex;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use serde_json::json;

use bucket_series_mcp::config::resolve_store_path;
use bucket_series_mcp::protocol::ProtocolHandler;
use bucket_series_mcp::session::StoreSession;
use bucket_series_mcp::tools::events_ingest::{parse_events, RawEvent};
use bucket_series_mcp::tools::ToolRegistry;
use bucket_series_mcp::transport::StdioTransport;

#[derive(Parser)]
#[command(
    name = "bucket-series-mcp",
    about = "MCP server for bucket-series: zero-filled time-bucketed aggregation",
    version
)]
struct Cli {
    /// Path to .bkts store file.
    #[arg(short, long, global = true)]
    store: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start MCP server over stdio (default).
    Serve,

    /// Run one aggregation and print the series as JSON.
    Query {
        /// Range start, YYYY-MM-DDTHH:MM:SS.
        #[arg(long)]
        from: String,

        /// Range end (inclusive), YYYY-MM-DDTHH:MM:SS.
        #[arg(long)]
        upto: String,

        /// Bucket size: hour, day, or month.
        #[arg(long, default_value = "day")]
        group_type: String,
    },

    /// Append events from a JSON file (an array of {"dt", "value"} objects).
    Import {
        /// Path to the JSON file.
        file: String,
    },

    /// Validate a .bkts store file.
    Validate,

    /// Print server capabilities as JSON.
    Info,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   bucket-series-mcp completions bash > ~/.local/share/bash-completion/completions/bucket-series-mcp
    ///   bucket-series-mcp completions zsh > ~/.zfunc/_bucket-series-mcp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            let store_path = resolve_store_path(cli.store.as_deref());
            tracing::info!("bucket-series MCP server");
            tracing::info!("Store: {store_path}");
            let session = StoreSession::open(&store_path)?;
            let handler = ProtocolHandler::new(Arc::new(Mutex::new(session)));
            let transport = StdioTransport::new(handler);
            transport.run().await?;
        }

        Commands::Query {
            from,
            upto,
            group_type,
        } => {
            let store_path = resolve_store_path(cli.store.as_deref());
            let session = StoreSession::open(&store_path)?;
            let series = session.aggregate(&json!({
                "dt_from": from,
                "dt_upto": upto,
                "group_type": group_type,
            }))?;
            println!("{}", series.to_json()?);
        }

        Commands::Import { file } => {
            let store_path = resolve_store_path(cli.store.as_deref());
            let raw = std::fs::read_to_string(&file)?;
            let raw: Vec<RawEvent> = serde_json::from_str(&raw)?;
            let events = parse_events(raw)?;
            let mut session = StoreSession::open(&store_path)?;
            let result = session.ingest(events)?;
            session.save()?;
            println!(
                "Imported {} events into {store_path} ({} total)",
                result.inserted, result.total
            );
        }

        Commands::Validate => {
            let store_path = resolve_store_path(cli.store.as_deref());
            match bucket_series::EventFileReader::read_from_file(std::path::Path::new(&store_path))
            {
                Ok(store) => {
                    println!("Valid store file: {store_path}");
                    println!("  Events: {}", store.count());
                    if let Some((first, last)) = store.span() {
                        println!("  Span: {first} .. {last}");
                    }
                }
                Err(e) => {
                    eprintln!("Invalid store file: {e}");
                    std::process::exit(1);
                }
            }
        }

        Commands::Info => {
            let capabilities = bucket_series_mcp::types::InitializeResult::default_result();
            let tools = ToolRegistry::list_tools();
            let info = json!({
                "server": capabilities.server_info,
                "protocol_version": capabilities.protocol_version,
                "capabilities": capabilities.capabilities,
                "tools": tools.iter().map(|t| &t.name).collect::<Vec<_>>(),
                "tool_count": tools.len(),
            });
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "bucket-series-mcp", &mut std::io::stdout());
        }
    }

    Ok(())
}
