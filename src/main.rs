use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use driftdeck::{
    app_dirs::AppDirs,
    assets::{builtin_tiles, load_image_dir, populate_grid, ColumnContent},
    config::{ConfigStore, FileConfigStore},
    error::KioskError,
    host::{AudioSink, BellAudio, SilentAudio, SimulatedVideoHost},
    kiosk::Kiosk,
    logging,
    runtime::{apply_event, CrosstermEventSource, FixedTicker, Flow, KioskEvent, Runner},
    timing::{Clock, Millis, MonotonicClock},
    ui::NodeView,
};
use itertools::Itertools;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::{info, warn};

/// touch-swipe kiosk for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A kiosk that walks visitors through a fixed sequence of screens by swiping, over a drifting tile background, and quietly returns to the start when left alone."
)]
pub struct Cli {
    /// JSON file overriding the built-in timings and counts
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// directory of images whose names label the background tiles
    #[clap(short = 'a', long)]
    assets: Option<PathBuf>,

    /// where to append the log (the terminal is owned by the kiosk)
    #[clap(long)]
    log_file: Option<PathBuf>,

    /// height of one terminal row in touch pixels
    #[clap(long, default_value_t = 32.0)]
    cell_height_px: f64,

    /// repaint interval in milliseconds
    #[clap(long, default_value_t = 16)]
    frame_ms: u64,

    /// do not ring the bell for swipes and taps
    #[clap(long)]
    mute: bool,

    /// log at debug level unless RUST_LOG says otherwise
    #[clap(short = 'v', long)]
    verbose: bool,
}

pub struct App {
    pub kiosk: Kiosk<SimulatedVideoHost, Box<dyn AudioSink>>,
    pub columns: Vec<ColumnContent>,
    pub cell_height_px: f64,
}

impl App {
    pub fn new(cli: &Cli) -> Result<Self, KioskError> {
        let store = match &cli.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        };
        let config = store.load()?;

        let tiles = load_tiles(cli.assets.as_deref());
        let columns = populate_grid(&tiles, config.column_count(), config.featured_tiles);
        let heights = columns
            .iter()
            .map(|c| c.cycle_height(config.tile_height_px))
            .collect_vec();

        let audio: Box<dyn AudioSink> = if cli.mute {
            Box::new(SilentAudio)
        } else {
            Box::new(BellAudio)
        };
        let kiosk = Kiosk::new(config, &heights, SimulatedVideoHost::new(), audio)?;

        Ok(Self {
            kiosk,
            columns,
            cell_height_px: cli.cell_height_px,
        })
    }
}

/// Tile labels from the asset directory, or the built-in set when there is
/// none or it holds no images.
fn load_tiles(dir: Option<&Path>) -> Vec<String> {
    let Some(dir) = dir else {
        return builtin_tiles();
    };
    match load_image_dir(dir) {
        Ok(tiles) if !tiles.is_empty() => {
            info!(count = tiles.len(), dir = %dir.display(), "loaded tiles");
            tiles
        }
        Ok(_) => {
            warn!(dir = %dir.display(), "no images found, using built-in tiles");
            builtin_tiles()
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "could not read assets, using built-in tiles");
            builtin_tiles()
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let log_path = cli.log_file.clone().unwrap_or_else(AppDirs::log_path);
    if let Err(e) = logging::init(&log_path, cli.verbose) {
        eprintln!("driftdeck: logging disabled: {e}");
    }

    let mut app = App::new(&cli)?;
    info!(nodes = app.kiosk.config().node_count, "kiosk starting");

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, cli.frame_ms);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    info!("kiosk stopped");
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    frame_ms: u64,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(app.cell_height_px),
        FixedTicker::new(Duration::from_millis(frame_ms)),
    );
    let clock = MonotonicClock::new();
    let mut last_frame: Millis = 0;

    terminal.draw(|f| ui(app, f, 0))?;

    loop {
        let event = runner.step();
        let now = clock.now_ms();

        // Input can arrive faster than the frame interval; frames still run on time.
        let flow = match event {
            KioskEvent::Frame => Flow::Continue,
            other => apply_event(&mut app.kiosk, other, now),
        };
        if flow == Flow::Quit {
            break;
        }

        let frame_due = now.saturating_sub(last_frame) >= frame_ms;
        if frame_due {
            last_frame = now;
            apply_event(&mut app.kiosk, KioskEvent::Frame, now);
        }
        if frame_due || flow == Flow::Redraw {
            terminal.draw(|f| ui(app, f, now))?;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame, now: Millis) {
    let view = NodeView::capture(&app.kiosk, &app.columns, app.cell_height_px, now);
    f.render_widget(&view, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftdeck::config::KioskConfig;
    use ratatui::backend::TestBackend;
    use std::fs;

    fn cli_with(args: &[&str]) -> Cli {
        let mut argv = vec!["driftdeck"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_cli_defaults() {
        let cli = cli_with(&[]);
        assert_eq!(cli.cell_height_px, 32.0);
        assert_eq!(cli.frame_ms, 16);
        assert!(!cli.mute);
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_flags() {
        let cli = cli_with(&[
            "--config",
            "/tmp/k.json",
            "--assets",
            "/tmp/img",
            "--cell-height-px",
            "20",
            "--frame-ms",
            "33",
            "--mute",
            "-v",
        ]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/k.json")));
        assert_eq!(cli.assets, Some(PathBuf::from("/tmp/img")));
        assert_eq!(cli.cell_height_px, 20.0);
        assert_eq!(cli.frame_ms, 33);
        assert!(cli.mute);
        assert!(cli.verbose);
    }

    #[test]
    fn test_app_new_uses_config_file_and_assets() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        let config = KioskConfig {
            lockout_ms: 1000,
            ..KioskConfig::default()
        };
        FileConfigStore::with_path(&config_path)
            .save(&config)
            .unwrap();

        let assets = dir.path().join("img");
        fs::create_dir(&assets).unwrap();
        for name in ["b.png", "a.jpg", "notes.txt"] {
            fs::write(assets.join(name), b"").unwrap();
        }

        let cli = cli_with(&[
            "--config",
            config_path.to_str().unwrap(),
            "--assets",
            assets.to_str().unwrap(),
            "--mute",
        ]);
        let app = App::new(&cli).unwrap();
        assert_eq!(app.kiosk.config().lockout_ms, 1000);
        let tiles: Vec<&String> = app.columns.iter().flat_map(|c| &c.tiles).collect();
        assert!(tiles.iter().any(|t| t.as_str() == "a"));
        assert!(!tiles.iter().any(|t| t.as_str() == "notes"));
    }

    #[test]
    fn test_app_new_rejects_bad_config() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{"node_count": 2}"#).unwrap();
        let cli = cli_with(&["--config", config_path.to_str().unwrap()]);
        assert!(App::new(&cli).is_err());
    }

    #[test]
    fn test_load_tiles_falls_back_to_builtin() {
        assert_eq!(load_tiles(None), builtin_tiles());
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_tiles(Some(dir.path())), builtin_tiles());
        assert_eq!(
            load_tiles(Some(dir.path().join("missing").as_path())),
            builtin_tiles()
        );
    }

    #[test]
    fn test_ui_function_attract_screen() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli_with(&[
            "--config",
            dir.path().join("none.json").to_str().unwrap(),
            "--mute",
        ]);
        let app = App::new(&cli).unwrap();

        let backend = TestBackend::new(80, 24);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|f| ui(&app, f, 0)).unwrap();

        let buffer = terminal.backend().buffer();
        let content: String = buffer.content.iter().map(|c| c.symbol()).collect();
        assert!(content.contains("Swipe up to begin"));
    }
}
