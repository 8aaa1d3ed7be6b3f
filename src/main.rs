pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use handmate::{
    app_dirs::AppDirs,
    classifier::GestureLabel,
    config::{Config, ConfigStore, FileConfigStore},
    engine::StandardChess,
    error::EngineError,
    picker::{MovePicker, RandomPicker},
    pipeline::GesturePipeline,
    recording::ExportFormat,
    replay::replay,
    runtime::{
        spawn_frame_reader, spawn_terminal_reader, AppEvent, AppEventSource, ChannelEventSource,
        Runner,
    },
    status::Locale,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File, OpenOptions},
    io::{self, stdin, BufRead, BufReader},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const TICK_RATE_MS: u64 = 100;
const LOG_ENV: &str = "HANDMATE_LOG";

/// play chess with hand gestures from a landmark stream
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Play chess in the terminal by raising, lowering and pinching your hand. Reads 21-point hand landmarks as JSON lines, turns them into debounced gestures and drives a move state machine. Can also record labeled landmark windows and export them as a training dataset."
)]
pub struct Cli {
    /// landmark stream (JSON lines), `-` reads stdin
    #[clap(short = 'l', long, default_value = "-")]
    landmarks: String,

    /// config file to use instead of the platform default
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// starting position in FEN
    #[clap(long)]
    fen: Option<String>,

    /// language for status messages
    #[clap(long, value_enum)]
    locale: Option<Locale>,

    /// seed the square picker for reproducible games
    #[clap(long)]
    seed: Option<u64>,

    /// minimum time between two accepted gestures
    #[clap(long)]
    cooldown_ms: Option<u64>,

    /// length of one recording window
    #[clap(long)]
    record_window_ms: Option<u64>,

    /// process the stream without the terminal UI and print every accepted gesture
    #[clap(long)]
    replay: bool,

    /// where recorded datasets are written
    #[clap(long)]
    export_dir: Option<PathBuf>,

    /// dataset file format
    #[clap(long, value_enum, default_value_t = ExportFormat::Json)]
    export_format: ExportFormat,
}

impl Cli {
    /// Flags given on the command line win over the config file.
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(locale) = self.locale {
            config.locale = locale;
        }
        if let Some(ms) = self.cooldown_ms {
            config.cooldown_ms = ms;
        }
        if let Some(ms) = self.record_window_ms {
            config.recording_window_ms = ms;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }

    fn picker(&self) -> Box<dyn MovePicker> {
        match self.seed {
            Some(seed) => Box::new(RandomPicker::seeded(seed)),
            None => Box::new(RandomPicker::new()),
        }
    }
}

fn build_engine(fen: Option<&str>) -> Result<StandardChess, EngineError> {
    match fen {
        Some(fen) => StandardChess::from_fen(fen),
        None => Ok(StandardChess::new()),
    }
}

fn open_landmarks(path: &str) -> io::Result<Box<dyn BufRead + Send>> {
    if path == "-" {
        Ok(Box::new(BufReader::new(stdin())))
    } else {
        Ok(Box::new(BufReader::new(File::open(path)?)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Play,
    Record,
}

impl AppState {
    fn toggled(self) -> Self {
        match self {
            AppState::Play => AppState::Record,
            AppState::Record => AppState::Play,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyOutcome {
    Continue,
    Quit,
}

pub struct App {
    pub pipeline: GesturePipeline<StandardChess>,
    pub state: AppState,
    pub clock: Instant,
    pub stream_ended: bool,
    /// One-line feedback for the last key action.
    pub notice: Option<String>,
    fen: Option<String>,
    export_dir: PathBuf,
    export_format: ExportFormat,
}

impl App {
    pub fn new(cli: &Cli, config: &Config) -> Result<Self, Box<dyn Error>> {
        let engine = build_engine(cli.fen.as_deref())?;
        let pipeline = GesturePipeline::new(engine, cli.picker(), config)?;
        Ok(Self {
            pipeline,
            state: AppState::Play,
            clock: Instant::now(),
            stream_ended: false,
            notice: None,
            fen: cli.fen.clone(),
            export_dir: cli.export_dir.clone().unwrap_or_else(AppDirs::dataset_dir),
            export_format: cli.export_format,
        })
    }

    pub fn now(&self) -> Duration {
        self.clock.elapsed()
    }

    fn new_game(&mut self) {
        match build_engine(self.fen.as_deref()) {
            Ok(engine) => {
                self.pipeline.new_game(engine);
                self.notice = Some("new game".to_string());
            }
            Err(err) => self.notice = Some(err.to_string()),
        }
    }

    fn start_recording(&mut self, label: GestureLabel) {
        let now = self.now();
        self.notice = if self.pipeline.start_recording(label.as_str(), now) {
            Some(format!("recording '{}'", label.as_str()))
        } else {
            Some("a recording is already running".to_string())
        };
    }

    fn export(&mut self) {
        let dataset = self.pipeline.recorder().export_dataset();
        if dataset.frame_count() == 0 {
            self.notice = Some("nothing recorded yet".to_string());
            return;
        }
        self.notice = match dataset.save(&self.export_dir, self.export_format) {
            Ok(path) => Some(format!(
                "saved {} frames to {}",
                dataset.frame_count(),
                path.display()
            )),
            Err(err) => {
                error!(%err, "dataset export failed");
                Some(format!("export failed: {err}"))
            }
        };
    }

    fn on_key(&mut self, key: KeyEvent) -> KeyOutcome {
        if key.kind != KeyEventKind::Press {
            return KeyOutcome::Continue;
        }
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if ctrl_c || matches!(key.code, KeyCode::Esc | KeyCode::Char('q')) {
            return KeyOutcome::Quit;
        }

        match (self.state, key.code) {
            (_, KeyCode::Tab) => {
                self.state = self.state.toggled();
                self.notice = None;
            }
            (AppState::Play, KeyCode::Char('n')) => self.new_game(),
            (AppState::Record, KeyCode::Char(c @ '1'..='4')) => {
                let idx = c as usize - '1' as usize;
                self.start_recording(GestureLabel::ALL[idx]);
            }
            (AppState::Record, KeyCode::Char('e')) => self.export(),
            (AppState::Record, KeyCode::Char('x')) => {
                self.pipeline.recorder_mut().reset();
                self.notice = Some("recordings cleared".to_string());
            }
            _ => {}
        }
        KeyOutcome::Continue
    }
}

fn init_tracing(to_stderr: bool) -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    if to_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(io::stderr))
            .try_init()?;
        return Ok(());
    }

    // the terminal belongs to the UI, so logs go to a file
    let path = AppDirs::log_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .try_init()?;
    Ok(())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.replay)?;

    let config = cli.apply_to(cli.config_store().load());
    if let Err(err) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
    }
    if let Err(err) = build_engine(cli.fen.as_deref()) {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, err.to_string()).exit();
    }

    if cli.replay {
        return run_replay(&cli, &config);
    }

    if !io::stdout().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdout must be a tty, use --replay for headless runs")
            .exit();
    }
    if cli.landmarks == "-" && stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::Io,
            "pipe the landmark stream into stdin or pass --landmarks <PATH>",
        )
        .exit();
    }

    let reader = open_landmarks(&cli.landmarks)?;
    let mut app = App::new(&cli, &config)?;

    let source = ChannelEventSource::new();
    spawn_terminal_reader(source.sender());
    spawn_frame_reader(reader, source.sender(), app.clock);
    let runner = Runner::new(source, Duration::from_millis(TICK_RATE_MS));

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    info!(locale = %config.locale, cooldown_ms = config.cooldown_ms, "session started");
    let res = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_replay(cli: &Cli, config: &Config) -> Result<(), Box<dyn Error>> {
    let engine = build_engine(cli.fen.as_deref())?;
    let mut pipeline = GesturePipeline::new(engine, cli.picker(), config)?;
    let reader = open_landmarks(&cli.landmarks)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = replay(&mut pipeline, reader, &mut out)?;
    info!(
        frames = summary.frames,
        hands = summary.hands,
        skipped = summary.skipped,
        events = summary.events,
        moves = summary.moves,
        "replay finished"
    );
    Ok(())
}

fn start_tui<B: Backend, S: AppEventSource>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    runner: &Runner<S>,
) -> Result<(), Box<dyn Error>> {
    terminal.draw(|f| ui::draw(app, f))?;

    loop {
        let redraw = match runner.step() {
            AppEvent::Tick => {
                let finished = app.pipeline.on_tick(app.now());
                if let Some(label) = &finished {
                    app.notice = Some(format!("recording '{label}' finished"));
                }
                // countdown needs a refresh while a window is open
                finished.is_some() || app.pipeline.recorder().is_recording()
            }
            AppEvent::Resize => true,
            AppEvent::StreamEnded => {
                info!("landmark stream ended");
                app.stream_ended = true;
                true
            }
            AppEvent::Frame(frame) => {
                let outcome = app.pipeline.on_frame(&frame);
                if let Some(label) = &outcome.recording_finished {
                    app.notice = Some(format!("recording '{label}' finished"));
                }
                outcome.needs_redraw()
            }
            AppEvent::Key(key) => match app.on_key(key) {
                KeyOutcome::Quit => break,
                KeyOutcome::Continue => true,
            },
        };

        if redraw {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    Ok(())
}
