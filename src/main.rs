use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use remote_notify::app::Config;
use remote_notify::notify::{self, ChatKind, ChatMessage, DesktopNotifier};

/// Remote Notify - show chat highlights from a remote host on this desktop
#[derive(Parser)]
#[command(name = "rnotify")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Configuration file (defaults to ~/.config/remote-notify/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Port to listen on, or `-` to read a single notification from stdin
    target: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay one chat message to the receiver
    Send {
        /// The message is a private conversation
        #[arg(long)]
        private: bool,
        /// The message highlights the local user
        #[arg(long)]
        highlight: bool,
        /// Nickname of the author
        #[arg(long)]
        sender: String,
        /// Buffer the message appeared in
        #[arg(long, default_value = "")]
        channel: String,
        /// Receiver host (overrides config)
        #[arg(long)]
        host: Option<String>,
        /// Receiver port (overrides config)
        #[arg(long)]
        port: Option<u16>,
        /// Deliver through this shell command instead of a socket
        #[arg(long)]
        command: Option<String>,
        /// Message text
        #[arg(required = true, trailing_var_arg = true)]
        body: Vec<String>,
    },
    /// Print the configuration path and effective settings
    Config,
}

/// Receiver mode picked from the positional argument
enum Mode {
    Server(Option<u16>),
    SingleShot,
}

fn parse_mode(target: Option<&str>) -> Result<Mode> {
    match target {
        None => Ok(Mode::Server(None)),
        Some("-") => Ok(Mode::SingleShot),
        Some(port) => port
            .parse::<u16>()
            .map(|p| Mode::Server(Some(p)))
            .with_context(|| format!("Invalid port: {}", port)),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ログ初期化
    init_logging(&cli.log_level);

    // 設定を読み込む（ファイルがなければ作成）
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;

    match cli.command {
        Some(Commands::Config) => show_config(&cli.config, &config),
        Some(Commands::Send {
            private,
            highlight,
            sender,
            channel,
            host,
            port,
            command,
            body,
        }) => {
            // CLI引数で設定を上書き
            let mut sender_config = config.sender;
            if let Some(host) = host {
                sender_config.host = host;
            }
            if let Some(port) = port {
                sender_config.port = port;
            }
            if command.is_some() {
                sender_config.command = command;
            }

            let message = ChatMessage {
                kind: if private {
                    ChatKind::Private
                } else {
                    ChatKind::Message
                },
                buffer_name: channel,
                is_highlight: highlight,
                sender,
                body: body.join(" "),
            };

            runtime.block_on(async {
                match notify::relay(&sender_config, &message).await {
                    Ok(true) => info!("Notification sent successfully"),
                    Ok(false) => info!("Message is neither private nor a highlight, skipped"),
                    Err(e) => {
                        tracing::warn!("Could not send notification: {}", e);
                        if sender_config.display_errors {
                            eprintln!("Could not send notification: {}", e);
                        }
                    }
                }
            });
            Ok(())
        }
        None => {
            let mut receiver_config = config.receiver;
            let notifier = DesktopNotifier::new(receiver_config.clone());

            match parse_mode(cli.target.as_deref())? {
                Mode::SingleShot => {
                    // 通知プロセスの終了を待ってから抜ける
                    runtime.block_on(async {
                        notify::run_stdin(&receiver_config, &notifier).await;
                        notifier.settle().await;
                    });
                    Ok(())
                }
                Mode::Server(port) => {
                    if let Some(port) = port {
                        receiver_config.port = port;
                    }
                    runtime.block_on(notify::run_listener(&receiver_config, notifier))
                }
            }
        }
    }
}

fn show_config(path: &Option<PathBuf>, config: &Config) -> Result<()> {
    let path = match path {
        Some(path) => path.clone(),
        None => Config::config_path()?,
    };
    println!("# {}", path.display());
    print!("{}", config.to_toml()?);
    Ok(())
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
