mod settings;

use std::{io::Read, path::PathBuf};

use {
    clap::{Parser, Subcommand, ValueEnum},
    secrecy::ExposeSecret,
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use forumgram_notify::{Dispatcher, FormattingMode, SendResult, chunk};

#[derive(Parser)]
#[command(name = "forumgram", about = "Forumgram — forum-event Telegram notifier")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides the default search locations).
    #[arg(long, global = true, env = "FORUMGRAM_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a message to a channel.
    Send {
        /// Destination chat/channel id (e.g. "@mycourse" or "-1001234").
        #[arg(long)]
        to: String,
        /// Formatting mode.
        #[arg(long, value_enum, default_value_t = ModeArg::Plain)]
        mode: ModeArg,
        /// Message text; omit to read from --file or stdin.
        message: Option<String>,
        /// Read the message from a file instead.
        #[arg(long, conflicts_with = "message")]
        file: Option<PathBuf>,
    },
    /// Preview sanitization and segment boundaries without sending.
    Split {
        /// Formatting mode.
        #[arg(long, value_enum, default_value_t = ModeArg::Plain)]
        mode: ModeArg,
        /// Message text; omit to read from --file or stdin.
        message: Option<String>,
        /// Read the message from a file instead.
        #[arg(long, conflicts_with = "message")]
        file: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    Plain,
    Html,
}

impl From<ModeArg> for FormattingMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Plain => Self::Plain,
            ModeArg::Html => Self::Html,
        }
    }
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Resolve the message body from the positional arg, a file, or stdin.
fn read_message(message: Option<String>, file: Option<PathBuf>) -> anyhow::Result<String> {
    if let Some(text) = message {
        return Ok(text);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()));
    }
    let mut buf = String::new();
    std::io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    match cli.command {
        Commands::Send {
            to,
            mode,
            message,
            file,
        } => {
            let config = settings::load(cli.config.as_deref())?;
            if config.token.expose_secret().is_empty() {
                anyhow::bail!(
                    "no bot token configured; set `token` in forumgram.toml or FORUMGRAM_BOT_TOKEN"
                );
            }

            let mode = FormattingMode::from(mode);
            let text = read_message(message, file)?;
            let segments = chunk(&text, mode);
            info!(
                chat_id = %to,
                segment_count = segments.len(),
                "sending"
            );

            let dispatcher = Dispatcher::from_config(&config);
            let outcomes = dispatcher.dispatch(&to, &segments, mode).await;
            for outcome in &outcomes {
                match &outcome.result {
                    SendResult::Sent { message_id } => {
                        println!("sent {} chars as message {message_id}", outcome.len);
                    },
                    SendResult::Rejected {
                        error_code,
                        description,
                    } => {
                        eprintln!("rejected ({error_code}): {description}");
                    },
                    SendResult::Transport { description } => {
                        eprintln!("send failed: {description}");
                    },
                }
            }
            Ok(())
        },
        Commands::Split { mode, message, file } => {
            let mode = FormattingMode::from(mode);
            let text = read_message(message, file)?;
            let segments = chunk(&text, mode);
            for segment in &segments {
                let marker = if segment.is_final { "final" } else { "cont." };
                println!(
                    "--- segment {} ({} chars, {marker}) ---",
                    segment.index,
                    segment.len()
                );
                println!("{}", segment.text);
            }
            Ok(())
        },
    }
}
