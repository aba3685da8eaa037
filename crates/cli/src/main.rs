mod echo;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use clap::{Args, CommandFactory, Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Serialize;
use sitelift_core::pipeline::{INVALID_CHAT_REQUEST, MISSING_CHAT_INPUT};
use sitelift_core::{
    ChatReply, CompletionAdapter, Config, ConfigBuilder, ContentType, DefaultFetcher, ExtractionRequest,
    ExtractionResult, Extractor, ReplayService, SiteliftError, WebsiteData, reply_for_error,
};
use tracing::warn;
use tracing_subscriber::EnvFilter;

pub(crate) const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Extract structured records from web pages with a language model
#[derive(Parser, Debug)]
#[command(name = "sitelift")]
#[command(author = "Sitelift Contributors")]
#[command(version)]
#[command(about = "Extract structured records from web pages", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging and progress output on stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract records of one content type from a page
    Extract(ExtractArgs),
    /// Answer a question from previously extracted website data
    Chat(ChatArgs),
    /// Print a shell completion script
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
struct ExtractArgs {
    /// URL to fetch, local HTML/Markdown file, or "-" for stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Comma-separated fields (default: the content type's field list)
    #[arg(value_name = "FIELDS")]
    fields: Option<String>,

    /// products, contact, about, faq, policies or generic
    #[arg(value_name = "CONTENT_TYPE", default_value = "generic")]
    content_type: String,

    /// HTTP timeout for fetching the page, in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    fetch_timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args, Debug)]
struct ChatArgs {
    /// JSON payload `{"query": ..., "websiteData": {...}}`, or "-" for stdin
    #[arg(value_name = "PAYLOAD")]
    payload: String,

    #[command(flatten)]
    model: ModelArgs,
}

/// Options shared by every command that calls the model
#[derive(Args, Debug)]
struct ModelArgs {
    /// Model name (overrides SITELIFT_MODEL)
    #[arg(long, value_name = "MODEL")]
    model: Option<String>,

    /// Completion request timeout in seconds (overrides SITELIFT_TIMEOUT)
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Answer every completion with the contents of FILE instead of calling the model
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Pretty-print the JSON result
    #[arg(long)]
    pretty: bool,
}

#[derive(serde::Deserialize, Debug)]
struct ChatPayload {
    #[serde(default)]
    query: String,
    #[serde(default, rename = "websiteData")]
    website_data: Option<WebsiteData>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    match cli.command {
        Command::Extract(args) => run_extract(args, cli.verbose).await,
        Command::Chat(args) => run_chat(args, cli.verbose).await,
        Command::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "sitelift", &mut io::stdout());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Diagnostics go to stderr; stdout carries only the JSON result.
fn init_tracing(verbose: bool) {
    let default = if verbose { "warn,sitelift_core=debug,sitelift=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

async fn run_extract(args: ExtractArgs, verbose: bool) -> anyhow::Result<ExitCode> {
    let Ok(content_type) = args.content_type.parse::<ContentType>();
    let request = ExtractionRequest::from_field_list(&args.input, args.fields.as_deref().unwrap_or(""), content_type);

    let mut builder = config_builder(&args.model).fetch_timeout(args.fetch_timeout);
    if let Some(user_agent) = &args.user_agent {
        builder = builder.user_agent(user_agent);
    }
    let config = builder.build();

    if verbose {
        echo::print_step(1, 2, &format!("Extracting {} from {}", content_type, args.input.bright_white().underline()));
        echo::print_detail("Fields", &request.requested_fields.join(", "));
        echo::print_detail("Model", &config.completion.model);
        eprintln!();
    }

    let start = Instant::now();
    let result = match build_extractor(&config, args.model.replay.as_deref())? {
        Ok(extractor) => extractor.extract(&request).await,
        Err(e) => {
            warn!(error = %e, "Extraction not started");
            ExtractionResult::failed(&request.source_url, content_type, e.user_message())
        }
    };

    if verbose {
        echo::print_step(2, 2, "Writing result");
        echo::print_timing("Extraction", start.elapsed());
        echo::print_extraction_summary(&result);
    }

    print_json(&result, args.model.pretty)?;
    Ok(ExitCode::SUCCESS)
}

async fn run_chat(args: ChatArgs, verbose: bool) -> anyhow::Result<ExitCode> {
    let raw = if args.payload == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer).context("Failed to read from stdin")?;
        buffer
    } else {
        args.payload.clone()
    };

    let payload: ChatPayload = match serde_json::from_str(&raw) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Invalid chat payload");
            let reply = ChatReply::failed(format!("Invalid JSON input: {}", e), INVALID_CHAT_REQUEST);
            print_json(&reply, args.model.pretty)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let data = match payload.website_data {
        Some(data) if !payload.query.trim().is_empty() && !data.is_empty() => data,
        _ => {
            let error = SiteliftError::InvalidInput(MISSING_CHAT_INPUT.to_string());
            print_json(&reply_for_error(&error), args.model.pretty)?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let config = config_builder(&args.model).build();
    if verbose {
        echo::print_step(1, 2, "Answering query");
        echo::print_detail("Query", &payload.query);
        echo::print_detail("Model", &config.completion.model);
        eprintln!();
    }

    let reply = match build_extractor(&config, args.model.replay.as_deref())? {
        Ok(extractor) => extractor.answer(&payload.query, &data).await,
        Err(e) => {
            warn!(error = %e, "Chat not started");
            reply_for_error(&e)
        }
    };

    if verbose {
        echo::print_step(2, 2, "Writing reply");
        echo::print_chat_summary(&reply);
    }

    print_json(&reply, args.model.pretty)?;
    Ok(ExitCode::SUCCESS)
}

/// Environment first, then command-line overrides.
fn config_builder(args: &ModelArgs) -> ConfigBuilder {
    let mut builder = ConfigBuilder::from_env();
    if let Some(model) = &args.model {
        builder = builder.model(model);
    }
    if let Some(timeout) = args.timeout {
        builder = builder.completion_timeout(timeout);
    }
    builder
}

/// The outer error is an unusable `--replay` file; the inner one is a
/// pipeline configuration error that still gets reported as JSON.
fn build_extractor(config: &Config, replay: Option<&Path>) -> anyhow::Result<sitelift_core::Result<Extractor>> {
    let Some(path) = replay else {
        return Ok(Extractor::from_config(config));
    };

    let service =
        ReplayService::from_file(path).with_context(|| format!("Failed to read replay file: {}", path.display()))?;
    let mut adapter = CompletionAdapter::new(Arc::new(service));
    if let Some(pricing) = config.completion.pricing {
        adapter = adapter.with_pricing(pricing);
    }

    Ok(Ok(Extractor::new(Arc::new(DefaultFetcher::new(config.fetch.clone())), adapter)))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> anyhow::Result<()> {
    let json = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    let json = json.context("Failed to serialize result")?;

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", json).context("Failed to write to stdout")?;
    stdout.flush().context("Failed to write to stdout")
}
