//! Terminal UI for wastemap: an interactive map of bins and collection routes.

mod app;
mod input;
mod ui;

use std::{
    fs::{self, File},
    io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
    time::{Duration as StdDuration, Instant},
};

use anyhow::{Context as _, Result};
use clap::Parser;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event as CEvent, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend, layout::Rect};
use reqwest::Client;
use tracing_subscriber::EnvFilter;
use wastemap_core::{MapConfig, Palette, ViewportSize, service::FleetService};
use wastemap_provider_fixture as fixture;
use wastemap_provider_rest as rest;

use crate::app::App;
use crate::input::Action;

/// Upper bound on how long the loop waits for input.
const FRAME_INTERVAL: StdDuration = StdDuration::from_millis(100);
/// Tighter wait while the camera is easing.
const ANIMATION_INTERVAL: StdDuration = StdDuration::from_millis(16);

#[derive(Debug, Parser)]
#[command(name = "wastemap", version, about = "Interactive map of bins and collection routes")]
struct Args {
    /// Base URL of the REST backend, e.g. `http://localhost:5000/api`.
    #[arg(long, env = "WASTEMAP_API_URL")]
    api_url: Option<String>,

    /// Snapshot file used when no API URL is given.
    #[arg(long, env = "WASTEMAP_FIXTURE", default_value = "fixtures/demo.json")]
    fixture: PathBuf,

    /// Where log output goes; the terminal belongs to the UI.
    #[arg(long, default_value = "wastemap.log")]
    log_file: PathBuf,

    /// JSON file overriding palette colors.
    #[arg(long)]
    palette: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(&args.log_file)?;

    // HTTP + service setup
    let client = Client::builder().user_agent("wastemap/0.1").build()?;
    let port = match &args.api_url {
        Some(url) => rest::port(client, url.as_str()),
        None => fixture::port(args.fixture.clone()),
    };
    let service = Arc::new(FleetService::new(port));
    tracing::info!(source = %service.source().name, "starting");

    let config = MapConfig {
        palette: load_palette(args.palette.as_deref())?,
        ..MapConfig::default()
    };

    // App state
    let mut app = App::new(service, config);
    reload(&mut app).await;

    // Terminal init
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run event loop
    let res = run(&mut terminal, app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn init_tracing(path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .init();
    Ok(())
}

fn load_palette(path: Option<&Path>) -> Result<Palette> {
    let Some(path) = path else {
        return Ok(Palette::default());
    };
    let raw = fs::read(path)
        .with_context(|| format!("cannot read palette {}", path.display()))?;
    let palette = serde_json::from_slice(&raw)
        .with_context(|| format!("invalid palette {}", path.display()))?;
    Ok(palette)
}

async fn reload(app: &mut App) {
    app.is_loading = true;
    app.error_message = None;
    let res = app.service.load().await;
    app.is_loading = false;
    match res {
        Ok(snapshot) => app.apply_snapshot(snapshot, Instant::now()),
        Err(err) => {
            app.error_message = Some(format!("Failed to load snapshot: {err}"));
        }
    }
}

async fn run(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, mut app: App) -> Result<()> {
    loop {
        app.tick(Instant::now());

        // Draw current UI
        let mut map_area = Rect::default();
        terminal.draw(|frame| map_area = ui::draw(frame, &app))?;
        if map_area != app.map_area {
            app.map_area = map_area;
            app.canvas.set_size(ui_size(map_area));
        }

        let timeout = if app.camera.is_animating() {
            ANIMATION_INTERVAL
        } else {
            app.canvas
                .next_deadline()
                .map_or(FRAME_INTERVAL, |deadline| {
                    deadline
                        .saturating_duration_since(Instant::now())
                        .min(FRAME_INTERVAL)
                })
        };

        // Poll for input (non-blocking, small timeout to keep CPU low)
        if !event::poll(timeout)? {
            continue;
        }
        match event::read()? {
            CEvent::Key(key) if key.kind == KeyEventKind::Press => {
                match input::handle_key_event(key, &mut app, Instant::now()) {
                    Action::Quit => break,
                    Action::Reload => {
                        app.is_loading = true;
                        terminal.draw(|frame| {
                            ui::draw(frame, &app);
                        })?;
                        reload(&mut app).await;
                    }
                    _ => {}
                }
            }
            CEvent::Mouse(mouse) => input::handle_mouse_event(mouse, &mut app, Instant::now()),
            _ => {}
        }
    }

    app.canvas.teardown();
    Ok(())
}

/// Rendered size hint for padding math, one cell counted as 8x16 logical pixels.
fn ui_size(area: Rect) -> ViewportSize {
    ViewportSize {
        width: f64::from(area.width) * 8.0,
        height: f64::from(area.height) * 16.0,
    }
}
