//! Command-line front end: one invocation runs one player command
//!
//! The topic a chat channel would carry is kept in a file per game and
//! player under the data directory, so chains survive between runs.

use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;

use byc::choice::IDLE_TOPIC;
use byc::core::StateUpdate;
use byc::driver::{ProcessSurfaceFactory, ScriptedGame};
use byc::{
    util, ChoiceTopic, Command, CommandContext, Config, Publisher, ReplayCore, ReplayError, Scope,
    SurfaceFactory, TopicUpdate,
};

/// Play By Your Command from the command line
#[derive(Parser)]
#[command(name = "byc")]
#[command(about = "Drive a By Your Command game one command at a time")]
#[command(version)]
struct Cli {
    /// Data directory (default: ~/.byc)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Game identifier
    #[arg(long, default_value_t = 1)]
    game: u64,

    /// Acting player (default: $BYC_USER, then $USER)
    #[arg(long)]
    user: Option<String>,

    /// Run in the player's private context instead of the game's public one
    #[arg(long)]
    private: bool,

    /// Use the built-in scripted game instead of the host program
    #[arg(long)]
    scripted: bool,

    /// Player mentioned by the command
    #[arg(long = "mention")]
    mentions: Vec<String>,

    /// Command: byc, ok, cancel, choose, commit, state, hand, undo, redo, reset, cleanup
    command: String,

    /// Command arguments
    args: Vec<String>,
}

/// Prints every published game state to stdout
struct ConsolePublisher;

#[async_trait]
impl Publisher for ConsolePublisher {
    async fn publish_state(&self, update: &StateUpdate) -> Result<()> {
        println!("--- game {} state posted by {} ---", update.game_id, update.user);
        println!("{}", update.blob.trim_end());
        if let Some(path) = &update.screenshot {
            println!("(screenshot: {})", path.display());
        }
        Ok(())
    }
}

fn init_logging() -> Result<()> {
    fs::create_dir_all(util::logs_dir())?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();
    Ok(())
}

fn topic_file(cli: &Cli, user: &str) -> PathBuf {
    if cli.private {
        util::topic_path(cli.game, user)
    } else {
        util::public_topic_path(cli.game)
    }
}

fn read_topic(path: &PathBuf) -> Option<ChoiceTopic> {
    let contents = fs::read_to_string(path).ok()?;
    ChoiceTopic::decode(contents.trim())
}

fn write_topic(path: &PathBuf, update: &TopicUpdate) -> Result<()> {
    let contents = match update {
        TopicUpdate::Keep => return Ok(()),
        TopicUpdate::Set(topic) => topic.encode(),
        TopicUpdate::Idle => IDLE_TOPIC.to_string(),
        TopicUpdate::Clear => {
            if path.exists() {
                fs::remove_file(path)?;
            }
            return Ok(());
        }
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents).with_context(|| format!("writing topic {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());
    init_logging()?;

    let config = Config::load();
    let user = cli.user.clone().unwrap_or_else(util::default_username);
    let Some(command) = Command::parse(&cli.command, &cli.args) else {
        eprintln!("Unknown command: {}", cli.command);
        std::process::exit(2);
    };

    let surfaces: Arc<dyn SurfaceFactory> = if cli.scripted {
        Arc::new(ScriptedGame::new())
    } else {
        Arc::new(
            ProcessSurfaceFactory::new(
                config.host_command.clone(),
                config.script_url.clone(),
                config.script_path.clone(),
                config.games_dir.clone(),
            )
            .with_args(config.host_args.clone()),
        )
    };
    let prefix = config.prefix.clone();
    let core = ReplayCore::new(config, surfaces, Arc::new(ConsolePublisher));

    let scope = if cli.private {
        Scope::Private
    } else {
        Scope::Public
    };
    let topic_path = topic_file(&cli, &user);
    let ctx = CommandContext::new(cli.game, &user, scope)
        .with_topic(read_topic(&topic_path))
        .with_mentions(cli.mentions.clone());

    match core.handle(&ctx, &command).await {
        Ok(outcome) => {
            for reply in &outcome.replies {
                println!("{reply}");
            }
            write_topic(&topic_path, &outcome.topic)?;
            Ok(())
        }
        Err(e) => {
            eprintln!("{}", e.user_message(&prefix));
            if matches!(e, ReplayError::NotPublic) {
                eprintln!(
                    "Your private context is {}; run again with --private.",
                    util::private_channel_name(&cli.game.to_string(), &user)
                );
            }
            std::process::exit(1);
        }
    }
}
