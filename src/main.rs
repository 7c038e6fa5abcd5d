mod action;
mod app;
mod auth;
mod config;
mod diff;
mod error;
mod event;
mod forge;
mod github;
mod metrics;
mod pipeline;
mod screen;
mod task;
mod tui;
mod types;
mod ui;
mod viewport;

use std::fs::File;
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::forge::Forge;
use crate::github::GitHub;
use crate::tui::EventHandler;
use crate::types::RepoRef;

/// Terminal dashboard for a GitHub repository
#[derive(Debug, Parser)]
#[command(name = "gitdash", version, about)]
struct Cli {
    /// Repository to browse, as owner/name
    #[arg(short, long)]
    repo: Option<String>,

    /// Config file to use instead of the default location
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Repository to include in the metrics tab (repeatable)
    #[arg(long = "metrics-repo", value_name = "OWNER/NAME")]
    metrics_repos: Vec<String>,
}

/// Log to a file; the terminal belongs to the UI.
fn init_logging(config: &Config) {
    let Some(dir) = dirs::cache_dir().map(|d| d.join("gitdash")) else {
        return;
    };
    if std::fs::create_dir_all(&dir).is_err() {
        return;
    }
    let Ok(file) = File::options()
        .create(true)
        .append(true)
        .open(dir.join("gitdash.log"))
    else {
        return;
    };

    let default_level = config.general.log_level.as_deref().unwrap_or("warn");
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file)),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut ignored = None;
    let config = match &cli.config {
        Some(path) => Config::from_path(path)?,
        None => Config::load().unwrap_or_else(|e| {
            ignored = Some(e);
            Config::default()
        }),
    };
    init_logging(&config);
    if let Some(e) = ignored {
        tracing::warn!(error = %e, "ignoring invalid config, using defaults");
    }

    let repo = config::resolve_repo(cli.repo.as_deref(), &config)?;
    let metrics_repos = if cli.metrics_repos.is_empty() {
        config.metrics_repos()?
    } else {
        cli.metrics_repos
            .iter()
            .map(|r| r.parse())
            .collect::<Result<Vec<RepoRef>, _>>()?
    };

    let token = auth::load_token(&config.github)?;
    let github = GitHub::new(token, &config.github)?;
    // Fail before taking over the terminal if the token is rejected.
    let user = github.get_current_user().await?;
    tracing::info!(%repo, %user, "starting");

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let tick_rate = Duration::from_millis(config.dashboard.tick_rate_ms.max(1));
    let result = run(Arc::new(github), repo, metrics_repos, user, tick_rate).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(
    forge: Arc<dyn Forge>,
    repo: RepoRef,
    metrics_repos: Vec<RepoRef>,
    user: String,
    tick_rate: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(forge, repo, metrics_repos, action_tx.clone());
    app.user = Some(user);
    let size = terminal.size()?;
    app.update(Action::Resize {
        width: size.width,
        height: size.height,
    });

    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
