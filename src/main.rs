use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::prelude::*;
use tracing::{info, warn};

mod app;
mod config;
mod default_config;
mod enhancer;
mod events;
mod logging;
mod store;
mod text_layout;
mod theme;
mod todo;
mod ui;
mod worker;

use app::{App, Focus};
use config::TodoConfig;
use enhancer::GeminiEnhancer;
use events::AppEvent;
use store::SupabaseStore;
use theme::Theme;
use todo::Filter;
use worker::TodoWorker;

const MAX_WORKER_EVENTS_PER_LOOP: usize = 64;
const LOG_FILE_NAME: &str = "gemini-todo.log";
const THEME_FILE_NAME: &str = "theme.toml";

#[derive(Debug, Parser)]
#[command(
    name = "gemini-todo",
    version,
    about = "Terminal task list stored in Supabase with Gemini-enhanced titles"
)]
struct Cli {
    /// Config file (default: ~/.gemini-todo/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,
    /// Theme file (default: theme.toml next to the config file)
    #[arg(long)]
    theme: Option<PathBuf>,
    /// Log file (default: gemini-todo.log next to the config file)
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Initial filter: all, active or completed
    #[arg(long, default_value = "all", value_parser = parse_filter)]
    filter: Filter,
    /// Add this task as soon as the list opens
    #[arg(long)]
    add: Option<String>,
}

fn parse_filter(value: &str) -> Result<Filter, String> {
    Filter::parse(value).ok_or_else(|| format!("unknown filter '{value}' (use all, active or completed)"))
}

/// The UI's view of the background worker.
trait TodoCommands {
    fn fetch(&self);
    fn add(&self, raw: String);
    fn toggle(&self, id: String, is_completed: bool);
    fn delete(&self, id: String);
}

impl TodoCommands for TodoWorker {
    fn fetch(&self) {
        TodoWorker::fetch(self);
    }

    fn add(&self, raw: String) {
        TodoWorker::add(self, raw);
    }

    fn toggle(&self, id: String, is_completed: bool) {
        TodoWorker::toggle(self, id, is_completed);
    }

    fn delete(&self, id: String) {
        TodoWorker::delete(self, id);
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => config::default_config_path()?,
    };
    let config_dir = config_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let log_path = cli
        .log_file
        .clone()
        .unwrap_or_else(|| config_dir.join(LOG_FILE_NAME));
    logging::init_file_logging(&log_path)
        .with_context(|| format!("failed to open log file '{}'", log_path.display()))?;

    let config = TodoConfig::load(&config_path)?;
    config.validate()?;
    info!(config = %config_path.display(), "configuration loaded");

    let worker = build_worker(&config)?;
    let theme = Theme::load_or_default(
        cli.theme
            .clone()
            .unwrap_or_else(|| config_dir.join(THEME_FILE_NAME)),
    );

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(
        &mut terminal,
        App::with_filter(cli.filter),
        &theme,
        &worker,
        cli.add.as_deref(),
    );

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result.context("terminal UI failed")
}

fn build_worker(config: &TodoConfig) -> Result<TodoWorker> {
    let timeout = config.http.timeout();
    let store = SupabaseStore::new(&config.supabase, timeout)
        .context("failed to build Supabase client")?;
    let enhancer =
        GeminiEnhancer::new(&config.gemini, timeout).context("failed to build Gemini client")?;
    if config.gemini.api_key.trim().is_empty() {
        warn!("no Gemini API key configured; tasks will be saved as typed");
    }
    info!(table = store.table_url(), endpoint = enhancer.endpoint(), "clients ready");
    Ok(TodoWorker::new(Arc::new(store), Arc::new(enhancer)))
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    theme: &Theme,
    worker: &TodoWorker,
    startup_task: Option<&str>,
) -> io::Result<()> {
    app.begin_fetch();
    worker.fetch();
    if let Some(task) = startup_task {
        queue_startup_task(&mut app, worker, task);
    }

    while app.running {
        for event in worker.drain_events_limited(MAX_WORKER_EVENTS_PER_LOOP) {
            app.apply_event(event);
        }
        terminal.draw(|frame| ui::render(frame, &app, theme))?;
        handle_event(&mut app, worker, events::next_event()?);
    }
    info!("exiting");
    Ok(())
}

fn queue_startup_task(app: &mut App, commands: &impl TodoCommands, task: &str) {
    for ch in task.chars().filter(|ch| !ch.is_control()) {
        app.input_char(ch);
    }
    app.cursor_end();
    if let Some(raw) = app.submit_input() {
        commands.add(raw);
    }
}

fn handle_event(app: &mut App, commands: &impl TodoCommands, event: AppEvent) {
    match event {
        AppEvent::Tick => app.on_tick(),
        AppEvent::Quit => app.quit(),
        AppEvent::SwitchFocus => app.toggle_focus(),
        AppEvent::Refresh => {
            app.begin_fetch();
            commands.fetch();
        }
        AppEvent::CycleFilter => app.cycle_filter(),
        AppEvent::MoveUp => app.select_prev(),
        AppEvent::MoveDown => app.select_next(),
        _ => match app.focus {
            Focus::Input => handle_input_event(app, commands, event),
            Focus::List => handle_list_event(app, commands, event),
        },
    }
}

fn handle_input_event(app: &mut App, commands: &impl TodoCommands, event: AppEvent) {
    match event {
        AppEvent::CursorLeft => app.cursor_left(),
        AppEvent::CursorRight => app.cursor_right(),
        AppEvent::CursorHome => app.cursor_home(),
        AppEvent::CursorEnd => app.cursor_end(),
        AppEvent::InputChar(c) => app.input_char(c),
        AppEvent::Backspace => app.backspace(),
        AppEvent::Delete => app.delete_forward(),
        AppEvent::Submit => {
            if let Some(raw) = app.submit_input() {
                commands.add(raw);
            }
        }
        _ => {}
    }
}

fn handle_list_event(app: &mut App, commands: &impl TodoCommands, event: AppEvent) {
    match event {
        AppEvent::Submit | AppEvent::InputChar(' ') => {
            if let Some(todo) = app.selected_todo() {
                commands.toggle(todo.id.clone(), todo.is_completed);
            }
        }
        AppEvent::Delete | AppEvent::InputChar('d') => {
            if let Some(todo) = app.selected_todo() {
                commands.delete(todo.id.clone());
            }
        }
        AppEvent::InputChar('1') => app.set_filter(Filter::All),
        AppEvent::InputChar('2') => app.set_filter(Filter::Active),
        AppEvent::InputChar('3') => app.set_filter(Filter::Completed),
        _ => {}
    }
}
