//! Command-line interface for inspecting the restkit exception taxonomy.

use clap::{Args, Parser, Subcommand, ValueEnum};
use reqwest::Url;
use restkit_storage::DEFAULT_DELIVERY_BASE_URL;
use uuid::Uuid;

use crate::client::{AppContext, CliResult};
use crate::commands::exceptions::{handle_catalog, handle_codes, handle_tree};
use crate::commands::media::handle_media_url;

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8000";

/// Parses CLI arguments and executes the requested command.
/// Returns the process exit code.
pub async fn run() -> i32 {
    let cli = Cli::parse();
    let trace_id = Uuid::new_v4().to_string();

    match dispatch(cli, &trace_id).await {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("error: {}", err.display_message());
            err.exit_code()
        }
    }
}

async fn dispatch(cli: Cli, trace_id: &str) -> CliResult<()> {
    match cli.command {
        Command::Tree(args) => handle_tree(args.format),
        Command::Codes(args) => handle_codes(&args),
        Command::MediaUrl(args) => handle_media_url(&args),
        Command::Catalog(args) => {
            let ctx = AppContext::new(cli.api_url, cli.timeout, trace_id)?;
            handle_catalog(&ctx, &args).await
        }
    }
}

#[derive(Parser)]
#[command(name = "restkit", about = "Operator CLI for restkit services")]
pub(crate) struct Cli {
    #[arg(
        long,
        global = true,
        env = "RESTKIT_API_URL",
        value_parser = parse_url,
        default_value = DEFAULT_API_URL
    )]
    pub(crate) api_url: Url,
    #[arg(
        long,
        global = true,
        env = "RESTKIT_HTTP_TIMEOUT_SECS",
        default_value_t = DEFAULT_TIMEOUT_SECS
    )]
    pub(crate) timeout: u64,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand)]
pub(crate) enum Command {
    /// Print the exception hierarchy with code uniqueness markers.
    Tree(TreeArgs),
    /// List every exception kind with its resolved code and status.
    Codes(CodesArgs),
    /// Fetch the exception catalog from a running server.
    Catalog(CatalogArgs),
    /// Build the delivery URL of a stored image.
    MediaUrl(MediaUrlArgs),
}

#[derive(Args)]
pub(crate) struct TreeArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

#[derive(Args)]
pub(crate) struct CodesArgs {
    #[arg(long, help = "Only list kinds whose code is shared with another kind")]
    pub(crate) ambiguous: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

#[derive(Args)]
pub(crate) struct CatalogArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub(crate) format: OutputFormat,
}

#[derive(Args)]
pub(crate) struct MediaUrlArgs {
    #[arg(help = "Object key, e.g. the owning record's id")]
    pub(crate) key: String,
    #[arg(long, help = "Directory the object was stored under")]
    pub(crate) directory: Option<String>,
    #[arg(long, help = "Stored version; defaults to the current time")]
    pub(crate) version: Option<i64>,
    #[arg(long, requires = "height")]
    pub(crate) width: Option<u32>,
    #[arg(long, requires = "width")]
    pub(crate) height: Option<u32>,
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    pub(crate) cloud_name: String,
    #[arg(long, value_parser = parse_url, default_value = DEFAULT_DELIVERY_BASE_URL)]
    pub(crate) base_url: Url,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    #[default]
    Table,
    Json,
}

fn parse_url(input: &str) -> Result<Url, String> {
    input
        .parse::<Url>()
        .map_err(|err| format!("invalid URL '{input}': {err}"))
}
