use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::net::TcpStream;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use floodwatch::app::{write_export, App};
use floodwatch::config::Settings;
use floodwatch::ui::{self, Theme};
use floodwatch::{
    events, DashboardView, FileStore, FirebaseStore, StreamIngestor, StreamStore, TelemetryStore,
};

/// Database export read when no source is given.
const DEFAULT_FILE: &str = "database.json";

#[derive(Parser, Debug)]
#[command(name = "floodwatch")]
#[command(about = "Terminal dashboard for a river water-level sensor")]
struct Args {
    /// Path to a database export (JSON) to watch
    #[arg(short, long, conflicts_with_all = ["connect", "firebase"])]
    file: Option<PathBuf>,

    /// Connect to a TCP endpoint streaming newline-delimited snapshots (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "firebase"])]
    connect: Option<String>,

    /// Firebase Realtime Database URL to stream from
    #[arg(long, conflicts_with_all = ["file", "connect"])]
    firebase: Option<String>,

    /// Database path holding the readings
    #[arg(long)]
    path: Option<String>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log entries per page (10, 25, 50 or 100)
    #[arg(long)]
    page_size: Option<usize>,

    /// Offset from UTC in minutes for typed dates and displayed times
    #[arg(long, allow_hyphen_values = true)]
    utc_offset: Option<i32>,

    /// Refresh interval in seconds (only used with --file)
    #[arg(short, long)]
    refresh: Option<u64>,

    /// Write logs to this file (the dashboard owns the terminal)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Export readings to a JSON file and exit
    #[arg(short, long)]
    export: Option<PathBuf>,

    /// Start of the exported range, e.g. 2024-03-01 or "2024-03-01 06:00"
    #[arg(long, requires = "export")]
    start: Option<String>,

    /// End of the exported range (inclusive)
    #[arg(long, requires = "export")]
    end: Option<String>,

    /// Seconds to wait for the first snapshot when exporting
    #[arg(long, default_value = "10", requires = "export")]
    timeout: u64,
}

/// Where readings come from.
enum Feed {
    File(PathBuf),
    Tcp(String),
    Firebase(String),
}

impl Args {
    /// Merge command line flags over the layered settings.
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(ref path) = self.path {
            settings.feed.path = path.clone();
        }
        if let Some(ref url) = self.firebase {
            settings.feed.database_url = Some(url.clone());
        }
        if let Some(secs) = self.refresh {
            settings.feed.refresh_secs = secs;
        }
        if let Some(size) = self.page_size {
            settings.view.page_size = size;
        }
        if let Some(minutes) = self.utc_offset {
            settings.view.utc_offset_minutes = minutes;
        }
    }

    fn feed(&self, settings: &Settings) -> Feed {
        if let Some(ref file) = self.file {
            return Feed::File(file.clone());
        }
        if let Some(ref addr) = self.connect {
            return Feed::Tcp(addr.clone());
        }
        match settings.feed.database_url {
            Some(ref url) => Feed::Firebase(url.clone()),
            None => Feed::File(PathBuf::from(DEFAULT_FILE)),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load(args.config.as_deref())?;
    args.apply_to(&mut settings);

    init_logging(args.log_file.as_deref(), args.export.is_some())?;

    let rt = Runtime::new()?;
    let _guard = rt.enter();

    let store = rt.block_on(open_store(args.feed(&settings), &settings))?;
    let view = DashboardView::new(settings.view.page_size, settings.utc_offset());

    // Handle export mode (non-interactive)
    if let Some(ref export_path) = args.export {
        return rt.block_on(export_to_file(store, &settings, view, &args, export_path));
    }

    let refresh = Duration::from_millis(100);
    run_tui(store, &settings, view, refresh)
}

/// Send logs to `log_file`, or to stderr when `to_stderr` is set.
///
/// Without either, logs are discarded so they don't corrupt the dashboard.
fn init_logging(log_file: Option<&Path>, to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if let Some(path) = log_file {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init();
    } else if to_stderr {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .try_init();
    }
    Ok(())
}

/// Build the store for `feed`.
async fn open_store(feed: Feed, settings: &Settings) -> Result<Box<dyn TelemetryStore>> {
    match feed {
        Feed::File(path) => {
            let refresh = Duration::from_secs(settings.feed.refresh_secs.max(1));
            Ok(Box::new(FileStore::new(&path).with_refresh(refresh)))
        }
        Feed::Tcp(addr) => {
            info!(%addr, "connecting");
            let stream = TcpStream::connect(&addr)
                .await
                .with_context(|| format!("Failed to connect to {}", addr))?;
            Ok(Box::new(StreamStore::new(stream, &addr)))
        }
        Feed::Firebase(url) => {
            let mut store = FirebaseStore::new(&url);
            if let Some(ref token) = settings.feed.auth_token {
                store = store.with_auth(token.as_str());
            }
            Ok(Box::new(store))
        }
    }
}

/// Subscribe `store` to the configured path.
fn subscribe(store: &mut dyn TelemetryStore, settings: &Settings) -> Result<StreamIngestor> {
    let mut ingestor = StreamIngestor::new(&settings.feed.path);
    ingestor
        .subscribe(store)
        .with_context(|| format!("Failed to subscribe to {}", store.description()))?;
    Ok(ingestor)
}

/// Run the TUI over the given store
fn run_tui(
    mut store: Box<dyn TelemetryStore>,
    settings: &Settings,
    view: DashboardView,
    refresh_interval: Duration,
) -> Result<()> {
    let ingestor = subscribe(store.as_mut(), settings)?;

    // Detect the theme before the alternate screen takes over
    let theme = Theme::auto_detect();

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    // Create app and load initial data
    let mut app = App::new(store, ingestor, view).with_theme(theme);
    app.reload_data();

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, refresh_interval);
    app.shutdown();

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    refresh_interval: Duration,
) -> Result<()> {
    let mut last_refresh = Instant::now();

    while app.running {
        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with a short timeout
        if let Some(event) = events::poll_event(Duration::from_millis(100))? {
            match event {
                Event::Key(key) => events::handle_key_event(app, key),
                Event::Resize(_, _) => {
                    // Terminal will redraw on next iteration
                }
                _ => {}
            }
        }

        // Pick up new snapshots periodically
        if last_refresh.elapsed() >= refresh_interval {
            app.reload_data();
            last_refresh = Instant::now();
        }
    }

    Ok(())
}

/// Wait for the first snapshot, apply the requested range and write it as JSON
async fn export_to_file(
    mut store: Box<dyn TelemetryStore>,
    settings: &Settings,
    mut view: DashboardView,
    args: &Args,
    export_path: &Path,
) -> Result<()> {
    let mut ingestor = subscribe(store.as_mut(), settings)?;

    let wait = Duration::from_secs(args.timeout);
    match tokio::time::timeout(wait, ingestor.next_update()).await {
        Ok(true) => {}
        Ok(false) => bail!("Feed closed before any snapshot arrived"),
        Err(_) => bail!("No snapshot received within {}s", args.timeout),
    }
    ingestor.unsubscribe();

    view.replace_dataset(ingestor.dataset());
    let start = args.start.as_deref().unwrap_or("");
    let end = args.end.as_deref().unwrap_or("");
    let count = view.apply_filter_text(start, end).filtered.len();
    if count == 0 {
        warn!("no readings in the requested range");
    }

    write_export(&view, export_path)?;
    println!("Exported {} readings to: {}", count, export_path.display());
    Ok(())
}
