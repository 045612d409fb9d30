use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{web, App, HttpServer};
use chrono::{SecondsFormat, Utc};
use clap::{Arg, ArgMatches, Command};
use log::{info, warn};

use hintd::config::{
    EngineConfig, LengthPolicy, ProviderKeys, DEFAULT_GOOGLE_BASE_URL, DEFAULT_OPENAI_BASE_URL,
};
use hintd::handlers;
use hintd::models::AppState;
use hintd::services::engine::GameEngine;
use hintd::services::ledger::MemoryLedger;
use hintd::services::providers::HttpTextGenerator;

// Function to initialize logging
fn init_logging(log_file: Option<&String>) -> std::io::Result<()> {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format(|buf, record| {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        writeln!(buf, "[{} {} {}] {}", timestamp, record.level(), record.target(), record.args())
    });

    if let Some(file) = log_file {
        let log_output = OpenOptions::new().create(true).append(true).open(file)?;
        builder.target(env_logger::Target::Pipe(Box::new(log_output)));
    }
    builder.init();
    Ok(())
}

fn cli() -> Command {
    Command::new("hintd")
        .version("1.0")
        .author("Ron Straight <straightre@gmail.com>")
        .about("Puzzle word and hint generation service")
        .arg(
            Arg::new("listen-host")
                .long("listen-host")
                .env("HINTD_LISTEN")
                .num_args(1)
                .default_value("0.0.0.0:2346")
                .help("Specify the listen address (e.g., 0.0.0.0:2346)"),
        )
        .arg(
            Arg::new("log-file")
                .long("log-file")
                .env("HINTD_LOG_FILE")
                .num_args(1)
                .help("Specify a log file path (if omitted, logs to stderr)"),
        )
        .arg(
            Arg::new("model")
                .long("model")
                .env("GOOGLE_GENAI_MODEL")
                .num_args(1)
                .help("Model tried before any other (e.g., openai/gpt-4o)"),
        )
        .arg(
            Arg::new("model-candidates")
                .long("model-candidates")
                .env("GOOGLE_GENAI_MODEL_CANDIDATES")
                .num_args(1)
                .default_value("")
                .help("Comma-separated models tried before the built-in defaults"),
        )
        .arg(
            Arg::new("openai-api-key")
                .long("openai-api-key")
                .env("OPENAI_API_KEY")
                .hide_env_values(true)
                .num_args(1)
                .help("API key for openai/* models"),
        )
        .arg(
            Arg::new("google-api-key")
                .long("google-api-key")
                .env("GOOGLE_GENAI_API_KEY")
                .hide_env_values(true)
                .num_args(1)
                .help("API key for googleai/* models"),
        )
        .arg(
            Arg::new("openai-base-url")
                .long("openai-base-url")
                .env("OPENAI_BASE_URL")
                .num_args(1)
                .default_value(DEFAULT_OPENAI_BASE_URL),
        )
        .arg(
            Arg::new("google-base-url")
                .long("google-base-url")
                .env("GOOGLE_GENAI_BASE_URL")
                .num_args(1)
                .default_value(DEFAULT_GOOGLE_BASE_URL),
        )
        .arg(
            Arg::new("hint-timeout-ms")
                .long("hint-timeout-ms")
                .env("HINTD_HINT_TIMEOUT_MS")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("60000")
                .help("Per-model deadline for hint generation"),
        )
        .arg(
            Arg::new("word-timeout-ms")
                .long("word-timeout-ms")
                .env("HINTD_WORD_TIMEOUT_MS")
                .num_args(1)
                .value_parser(clap::value_parser!(u64))
                .default_value("30000")
                .help("Per-model deadline for word generation"),
        )
        .arg(
            Arg::new("length-policy")
                .long("length-policy")
                .env("HINTD_LENGTH_POLICY")
                .num_args(1)
                .value_parser(["repair", "regenerate"])
                .default_value("repair")
                .help("Pad/truncate hints of the wrong length, or ask the next model"),
        )
        .arg(
            Arg::new("starting-hints")
                .long("starting-hints")
                .env("HINTD_STARTING_HINTS")
                .num_args(1)
                .value_parser(clap::value_parser!(u32))
                .default_value("3")
                .help("Hint balance given to a player seen for the first time"),
        )
}

fn engine_config(matches: &ArgMatches) -> Result<EngineConfig, String> {
    let defaults = EngineConfig::default();
    let string = |name: &str| matches.get_one::<String>(name).cloned();
    let millis = |name: &str| matches.get_one::<u64>(name).copied().map(Duration::from_millis);

    Ok(EngineConfig {
        model_override: string("model").filter(|m| !m.trim().is_empty()),
        model_candidates: EngineConfig::parse_candidate_list(
            &string("model-candidates").unwrap_or_default(),
        ),
        api_keys: ProviderKeys {
            openai: string("openai-api-key"),
            google: string("google-api-key"),
        },
        openai_base_url: string("openai-base-url").unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
        google_base_url: string("google-base-url").unwrap_or_else(|| DEFAULT_GOOGLE_BASE_URL.to_string()),
        hint_timeout: millis("hint-timeout-ms").unwrap_or(defaults.hint_timeout),
        word_timeout: millis("word-timeout-ms").unwrap_or(defaults.word_timeout),
        length_policy: match string("length-policy") {
            Some(policy) => policy.parse::<LengthPolicy>()?,
            None => defaults.length_policy,
        },
        starting_hints: matches
            .get_one::<u32>("starting-hints")
            .copied()
            .unwrap_or(defaults.starting_hints),
        ..defaults
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let matches = cli().get_matches();

    let listen_host = matches
        .get_one::<String>("listen-host")
        .expect("listen-host argument must always have a default value")
        .clone();
    init_logging(matches.get_one::<String>("log-file"))?;

    let config = engine_config(&matches)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    if config.api_keys.openai.is_none() && config.api_keys.google.is_none() {
        warn!("No provider API keys configured; every model attempt will fail as unauthorized");
    }

    let config = Arc::new(config);
    let generator = Arc::new(HttpTextGenerator::new(&config));
    let ledger = Arc::new(MemoryLedger::new(config.starting_hints));
    let engine = GameEngine::new(config.clone(), generator, ledger);
    info!("Model candidates: {}", engine.candidates().join(", "));

    let shared_state = web::Data::new(AppState { engine });

    info!("Listening on {}", listen_host);
    HttpServer::new(move || {
        App::new()
            .app_data(shared_state.clone())
            .configure(handlers::configure)
    })
    .bind(&listen_host)?
    .run()
    .await
}
