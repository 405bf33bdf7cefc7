//! Scrollstory TUI Entry Point
//!
//! Reads a story document and presents it as a scrolling terminal story.
//!
//! Usage:
//!   scrollstory-tui <STORY> [OPTIONS]
//!
//! Logs go to a file, never to the terminal the story is drawn on.

use std::fs::File;
use std::io::{self, IsTerminal};
use std::panic;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scrollstory_core::load_config_from_path;
use scrollstory_tui::{App, Page, StoryDocument};

/// Scrollytelling in the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Story document (JSON)
    #[arg(value_name = "STORY")]
    story: PathBuf,

    /// Configuration file (defaults to the user config directory)
    #[arg(short, long, env = "SCROLLSTORY_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log file
    #[arg(long, env = "SCROLLSTORY_LOG_FILE", default_value = "scrollstory-tui.log")]
    log_file: PathBuf,

    /// Jump here once the story is shown (`section[:narration]`)
    #[arg(short, long, value_name = "TARGET")]
    start: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging
    let log_file = File::create(&args.log_file)
        .with_context(|| format!("Failed to create log file {}", args.log_file.display()))?;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(log_file)),
        )
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let settings = load_config_from_path(args.config.clone())?;
    info!(source = %settings.source(), "Configuration loaded");
    let document = StoryDocument::load(&args.story)?;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: scrollstory-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("Run it interactively, or over SSH with the -t flag.");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), DisableMouseCapture, LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, &document, settings, args.start.as_deref()).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    document: &StoryDocument,
    settings: scrollstory_core::StorySettings,
    start: Option<&str>,
) -> anyhow::Result<()> {
    let size = terminal.size()?;
    let page = Arc::new(Page::new(document.title.clone(), size.width, size.height));

    let keyboard = settings.keyboard;
    let story = document.render(&page, settings).await?;
    let mut app = App::new(Arc::clone(&page), story.controller(), keyboard);
    if let Some(start) = start {
        app.jump(start);
    }

    let result = app.run(terminal).await;
    story.teardown();
    result
}
