mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, ValueEnum};
use crossterm::{
    event::{DisableFocusChange, EnableFocusChange, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use log::{info, warn};
use morse_learn::{
    analytics::{AnalyticsScheduler, CsvReporter, PlaytimeTracker, ProgressSnapshot},
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore, SessionSettings},
    course::CourseName,
    hint::HintLevel,
    morse::{Keyed, MorseKeyer, Signal},
    progress::{BackgroundStore, MemoryProgressStore, ProgressStore, SqliteProgressStore},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, Runner},
    selector::PoolSelector,
    session::{Outcome, SessionController, SessionEvent},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin, Write},
    sync::Arc,
    time::Duration,
};

const TICK_RATE_MS: u64 = 100;
const CORRECT_FEEDBACK_TICKS: u32 = 3;
const INCORRECT_FEEDBACK_TICKS: u32 = 8;
/// Play time stops counting after this long without a key press
const IDLE_AFTER: Duration = Duration::from_secs(30);

/// learn morse code one letter at a time
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "An adaptive Morse code trainer. Type the letters of each word; new letters join the practice pool as you master the ones you have."
)]
pub struct Cli {
    /// course to practice
    #[clap(short = 'c', long, value_enum)]
    course: Option<CourseName>,

    /// score at which a letter counts as learned
    #[clap(long)]
    learned_threshold: Option<i32>,

    /// correct answers in a row needed before a new letter is introduced
    #[clap(long)]
    consecutive_correct: Option<u32>,

    /// number of words kept queued, the current one included
    #[clap(short = 'l', long)]
    lookahead: Option<usize>,

    /// hide morse patterns and mnemonics
    #[clap(long)]
    no_visual_hints: bool,

    /// do not ring the terminal bell on mistakes
    #[clap(long)]
    no_sound: bool,

    /// show the spoken name of each letter with its hint
    #[clap(long)]
    speech_hints: bool,

    /// seed word shuffling for a repeatable session
    #[clap(long)]
    seed: Option<u64>,

    /// forget all saved progress for the course before starting
    #[clap(long)]
    reset: bool,

    /// seconds between progress log entries, 0 to disable
    #[clap(long)]
    report_interval: Option<u64>,
}

impl Cli {
    /// Overlay command line choices onto the stored configuration
    fn apply(&self, cfg: &mut Config) {
        if let Some(course) = self.course {
            cfg.course = course.to_string();
        }
        if let Some(threshold) = self.learned_threshold {
            cfg.learned_threshold = threshold;
        }
        if let Some(n) = self.consecutive_correct {
            cfg.consecutive_correct = n;
        }
        if let Some(n) = self.lookahead {
            cfg.how_many_words_to_start = n;
        }
        if self.no_visual_hints {
            cfg.visual_hints = false;
        }
        if self.no_sound {
            cfg.sound = false;
        }
        if self.speech_hints {
            cfg.speech_hints = true;
        }
        if let Some(secs) = self.report_interval {
            cfg.report_interval_secs = secs;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    /// Type the letter itself
    Letters,
    /// Key dots and dashes
    Morse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub letter: char,
    pub level: HintLevel,
}

pub struct App {
    pub session: SessionController,
    pub config: Config,
    pub mode: InputMode,
    pub keyer: MorseKeyer,
    pub hint: Option<Hint>,
    /// Outcome being shown and ticks until input reopens
    pub feedback: Option<(Outcome, u32)>,
    pub newest_letter: Option<char>,
    pub out_of_words: bool,
    pub playtime: PlaytimeTracker,
    store: Arc<dyn ProgressStore>,
    analytics: AnalyticsScheduler,
    idle_for: Duration,
    focused: bool,
    bell: bool,
}

impl App {
    pub fn new(
        session: SessionController,
        config: Config,
        store: Arc<dyn ProgressStore>,
        analytics: AnalyticsScheduler,
    ) -> Self {
        let played = store.load_playtime().unwrap_or_else(|e| {
            warn!("play time unavailable: {e}");
            0
        });

        let mut app = Self {
            session,
            config,
            mode: InputMode::Letters,
            keyer: MorseKeyer::default(),
            hint: None,
            feedback: None,
            newest_letter: None,
            out_of_words: false,
            playtime: PlaytimeTracker::new(played),
            store,
            analytics,
            idle_for: Duration::ZERO,
            focused: true,
            bell: false,
        };
        app.session.start();
        app.absorb_events();
        app
    }

    /// Returns true when the user asked to quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            return true;
        }

        self.idle_for = Duration::ZERO;
        if self.focused {
            self.playtime.resume();
        }

        match (self.mode, key.code) {
            (_, KeyCode::Tab) => self.toggle_mode(),
            (InputMode::Letters, KeyCode::Char(c)) if c.is_alphanumeric() => {
                self.submit(Keyed::Letter(c.to_ascii_lowercase()));
            }
            (InputMode::Morse, KeyCode::Char('.')) => self.keyer.push(Signal::Dot),
            (InputMode::Morse, KeyCode::Char('-')) => self.keyer.push(Signal::Dash),
            (InputMode::Morse, KeyCode::Char(' ') | KeyCode::Enter) => {
                if let Some(keyed) = self.keyer.commit() {
                    self.submit(keyed);
                }
            }
            (InputMode::Morse, KeyCode::Backspace) => self.keyer.backspace(),
            _ => {}
        }
        false
    }

    pub fn on_tick(&mut self, elapsed: Duration) {
        if let Some(keyed) = self.keyer.on_tick(elapsed) {
            self.submit(keyed);
        }

        if let Some((_, ticks_left)) = &mut self.feedback {
            *ticks_left = ticks_left.saturating_sub(1);
            if *ticks_left == 0 {
                self.session.feedback_complete();
            }
        }
        self.session.on_tick();
        self.absorb_events();

        self.idle_for += elapsed;
        if self.idle_for >= IDLE_AFTER || self.out_of_words {
            self.playtime.pause();
        }
        if self.playtime.on_tick(elapsed) {
            if let Err(e) = self.store.save_playtime(self.playtime.total_ms()) {
                warn!("play time not saved: {e}");
            }
        }

        let (session, config, played) = (&self.session, &self.config, self.playtime.total_ms());
        self.analytics
            .on_tick(elapsed, || ProgressSnapshot::capture(session, config, played));
    }

    pub fn on_focus(&mut self, focused: bool) {
        self.focused = focused;
        if focused {
            self.playtime.resume();
        } else {
            self.playtime.pause();
        }
    }

    /// Report once more before exiting
    pub fn finish(&mut self) {
        let snapshot = ProgressSnapshot::capture(&self.session, &self.config, self.playtime.total_ms());
        self.analytics.flush(&snapshot);
        info!(
            "leaving at {}% with pool [{}]",
            snapshot.progress_percent,
            self.session.pool()
        );
    }

    /// A mistake happened since the last call and sound is on
    pub fn take_bell(&mut self) -> bool {
        std::mem::take(&mut self.bell)
    }

    fn toggle_mode(&mut self) {
        self.keyer = MorseKeyer::default();
        self.mode = match self.mode {
            InputMode::Letters => InputMode::Morse,
            InputMode::Morse => InputMode::Letters,
        };
    }

    fn submit(&mut self, keyed: Keyed) {
        let accepted = match keyed {
            Keyed::Letter(l) => self.session.submit_input(l),
            Keyed::Unrecognized => self.session.submit_unrecognized(),
        };
        if accepted {
            self.absorb_events();
        }
    }

    fn absorb_events(&mut self) {
        for event in self.session.drain_events() {
            match event {
                SessionEvent::LetterAdvanced { .. } => {
                    self.hint = None;
                    self.feedback = Some((Outcome::Correct, CORRECT_FEEDBACK_TICKS));
                }
                SessionEvent::Mistake { .. } => {
                    self.feedback = Some((Outcome::Incorrect, INCORRECT_FEEDBACK_TICKS));
                    self.bell |= self.config.sound;
                }
                SessionEvent::HintNeeded { letter, level, .. } => {
                    self.hint = Some(Hint { letter, level });
                }
                SessionEvent::CorrectFeedbackDone | SessionEvent::IncorrectFeedbackDone => {
                    self.feedback = None;
                }
                SessionEvent::PoolExpanded { letter } => {
                    self.newest_letter = Some(letter);
                }
                SessionEvent::OutOfWords => {
                    self.out_of_words = true;
                }
                SessionEvent::WordCompleted { .. } => {}
            }
        }
        if self.session.current_word().is_some() {
            self.out_of_words = false;
        }
    }
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    if let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();
    }
}

fn open_store() -> Arc<dyn ProgressStore> {
    match SqliteProgressStore::new() {
        Ok(store) => Arc::new(BackgroundStore::spawn(store)),
        Err(e) => {
            warn!("progress database unavailable, nothing will be saved: {e}");
            Arc::new(MemoryProgressStore::new())
        }
    }
}

fn build_app(cli: &Cli) -> Result<App, Box<dyn Error>> {
    let config_store = FileConfigStore::new();
    let mut config = config_store.load();
    cli.apply(&mut config);
    if let Err(e) = config_store.save(&config) {
        warn!("config not saved to {}: {e}", config_store.path().display());
    }

    let course_name = CourseName::from_str(&config.course, true).unwrap_or(CourseName::English);
    let course = course_name.load()?;

    let store = open_store();
    if cli.reset {
        info!("clearing progress for '{}'", course.storage_key);
        store.clear(&course.storage_key)?;
    }

    let selector = match cli.seed {
        Some(seed) => PoolSelector::seeded(seed),
        None => PoolSelector::from_entropy(),
    };
    let session = SessionController::create(
        course,
        SessionSettings::from(&config),
        selector,
        Box::new(Arc::clone(&store)),
    );

    let analytics = AnalyticsScheduler::new(
        Duration::from_secs(config.report_interval_secs),
        Box::new(CsvReporter::new()),
    );

    Ok(App::new(session, config, store, analytics))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_logging();
    let mut app = build_app(&cli)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);
    app.finish();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableFocusChange,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(TICK_RATE_MS)),
    );

    loop {
        terminal.draw(|f| ui(app, f))?;

        match runner.step() {
            GameEvent::Tick => app.on_tick(runner.tick_interval()),
            GameEvent::Resize => {}
            GameEvent::FocusLost => app.on_focus(false),
            GameEvent::FocusGained => app.on_focus(true),
            GameEvent::Key(key) => {
                if app.handle_key(key) {
                    break;
                }
            }
        }

        if app.take_bell() {
            let mut out = io::stdout();
            out.write_all(b"\x07")?;
            out.flush()?;
        }
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}
