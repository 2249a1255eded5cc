mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use itertools::Itertools;
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use randofun::{
    app_dirs::AppDirs,
    clock::{Clock, SystemClock},
    coin::{CoinConfig, CoinEvent, CoinFlip, CoinStyle},
    config::{FileSettingsStore, Settings, SettingsStore},
    finger::{
        clamp_orbit_secs, FingerEvent, ParticipantTracker, Position, SessionId, WinnerSelector,
    },
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    spinner::{SpinEvent, SpinOption, SpinResult, SpinnerConfig, WeightedSpinner},
    store::{GameDb, GameRecord},
    usage::{GameKind, MemoryUsageStore, UsageGate, UsageStore},
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{info, warn, Level};

/// Environment variable holding the log level
const LOG_ENV: &str = "RANDOFUN_LOG";
/// Results kept on screen per game
const RECENT_RESULTS: usize = 5;

/// pocket randomizer games for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Pocket randomizer games for the terminal: spin a weighted wheel, let everyone hold a key and pick the winners, or flip a coin."
)]
pub struct Cli {
    /// game to open first
    #[clap(value_enum)]
    game: Option<GameKind>,

    /// number of winners picked by the finger game (1-4)
    #[clap(short = 'w', long)]
    winners: Option<usize>,

    /// seconds the spotlight wanders before winners are revealed (1-10)
    #[clap(short = 'o', long)]
    orbit_secs: Option<f64>,

    /// title shown above the wheel
    #[clap(short = 't', long)]
    title: Option<String>,

    /// wheel option as LABEL or LABEL:WEIGHT, repeat for each slice
    #[clap(short = 'O', long = "option", value_parser = parse_spin_option)]
    options: Vec<SpinOption>,

    /// coin artwork
    #[clap(short = 'c', long, value_enum)]
    coin_style: Option<CoinStyle>,

    /// free plays per game
    #[clap(long)]
    limit: Option<u32>,

    /// lift the free play limit
    #[clap(long)]
    unlocked: bool,

    /// write the settings given on the command line back to the settings file
    #[clap(long)]
    save: bool,

    /// keep play counts and results in memory only
    #[clap(long)]
    no_persist: bool,

    /// settings file to use instead of the default location
    #[clap(long)]
    settings: Option<PathBuf>,
}

impl Cli {
    /// Overlay command line overrides on loaded settings
    fn apply(&self, settings: &mut Settings) {
        if let Some(winners) = self.winners {
            settings.max_winners = winners;
        }
        if let Some(secs) = self.orbit_secs {
            settings.orbit_secs = secs;
        }
        if let Some(title) = &self.title {
            settings.spinner_title = title.clone();
        }
        if !self.options.is_empty() {
            settings.set_wheel_options(&self.options);
        }
        if let Some(style) = self.coin_style {
            settings.coin_style = style;
        }
        if let Some(limit) = self.limit {
            settings.usage_limit = limit;
        }
        if self.unlocked {
            settings.unlocked = true;
        }
    }

    fn settings_store(&self) -> FileSettingsStore {
        self.settings
            .as_ref()
            .map(FileSettingsStore::with_path)
            .unwrap_or_default()
    }
}

fn parse_spin_option(s: &str) -> Result<SpinOption, String> {
    let (label, weight) = match s.rsplit_once(':') {
        Some((label, weight)) => match weight.trim().parse::<f64>() {
            Ok(weight) => (label, weight),
            Err(_) => (s, 1.0),
        },
        None => (s, 1.0),
    };
    let label = label.trim();
    if label.is_empty() {
        return Err("option label must not be empty".to_string());
    }
    if !weight.is_finite() || weight <= 0.0 {
        return Err(format!("weight must be a positive number, got {weight}"));
    }
    Ok(SpinOption::new(label, weight))
}

fn log_level(value: Option<&str>) -> Level {
    value
        .and_then(|v| v.trim().parse::<Level>().ok())
        .unwrap_or(Level::INFO)
}

/// Send logs to a file in the state dir; the terminal belongs to the TUI
fn init_tracing() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };
    let level = log_level(std::env::var(LOG_ENV).ok().as_deref());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
}

/// Where play counts and results go
#[derive(Debug)]
pub enum Backing {
    Db(GameDb),
    Memory(MemoryUsageStore),
}

impl Backing {
    fn usage(&self) -> &dyn UsageStore {
        match self {
            Backing::Db(db) => db,
            Backing::Memory(mem) => mem,
        }
    }

    fn usage_mut(&mut self) -> &mut dyn UsageStore {
        match self {
            Backing::Db(db) => db,
            Backing::Memory(mem) => mem,
        }
    }

    fn record_result(&self, record: &GameRecord) -> randofun::Result<()> {
        match self {
            Backing::Db(db) => db.record_result(record),
            Backing::Memory(_) => Ok(()),
        }
    }

    fn clear_results(&self, kind: GameKind) -> randofun::Result<()> {
        match self {
            Backing::Db(db) => db.clear_results(kind),
            Backing::Memory(_) => Ok(()),
        }
    }

    /// Oldest first, so later results can be appended
    fn recent_results(&self) -> Vec<GameRecord> {
        let Backing::Db(db) = self else {
            return Vec::new();
        };
        GameKind::ALL
            .into_iter()
            .flat_map(|kind| {
                db.recent_results(kind, RECENT_RESULTS)
                    .unwrap_or_default()
                    .into_iter()
                    .rev()
            })
            .collect()
    }
}

const KEY_ROWS: [&str; 3] = ["qwertyuiop", "asdfghjkl", "zxcvbnm"];

/// Where a letter sits on a QWERTY board, scaled to `[0, 1]`
pub fn key_position(c: char) -> Option<Position> {
    KEY_ROWS.iter().enumerate().find_map(|(row, keys)| {
        keys.find(c).map(|col| {
            Position::new(
                (col as f32 + row as f32 * 0.5) / 10.0,
                row as f32 / 2.0,
            )
        })
    })
}

pub fn finger_id(c: char) -> SessionId {
    SessionId::from(u32::from(c))
}

pub fn finger_label(id: SessionId) -> String {
    u32::try_from(id)
        .ok()
        .and_then(char::from_u32)
        .map(|c| c.to_string())
        .unwrap_or_else(|| id.to_string())
}

#[derive(Debug)]
pub struct App<C: Clock = SystemClock> {
    pub tab: GameKind,
    pub settings: Settings,
    pub finger: ParticipantTracker<C>,
    pub spinner: WeightedSpinner<C>,
    pub coin: CoinFlip<C>,
    /// Participant lit up during the selection
    pub spotlight: Option<SessionId>,
    pub last_spin: Option<SpinResult>,
    pub notice: Option<String>,
    pub recent: Vec<GameRecord>,
    pub should_quit: bool,
    gate: UsageGate,
    backing: Backing,
}

impl App {
    pub fn new(settings: Settings, backing: Backing) -> randofun::Result<Self> {
        Self::with_clock(settings, backing, SystemClock, None)
    }
}

impl<C: Clock + Clone> App<C> {
    /// Build the app on an explicit clock. A seed makes every game replayable.
    pub fn with_clock(
        settings: Settings,
        backing: Backing,
        clock: C,
        seed: Option<u64>,
    ) -> randofun::Result<Self> {
        let rng = |stream: u64| match seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream)),
            None => StdRng::from_entropy(),
        };

        let finger = ParticipantTracker::new(
            settings.finger_config(),
            clock.clone(),
            WinnerSelector::new(rng(0)),
        );
        let spinner = WeightedSpinner::new(
            settings.wheel_options(),
            SpinnerConfig::default(),
            clock.clone(),
            rng(1),
        )?;
        let coin = CoinFlip::new(CoinConfig::default(), settings.coin_style, clock, rng(2));

        Ok(Self {
            tab: GameKind::Spinner,
            gate: UsageGate::new(settings.usage_limit, settings.unlocked),
            recent: backing.recent_results(),
            settings,
            finger,
            spinner,
            coin,
            spotlight: None,
            last_spin: None,
            notice: None,
            should_quit: false,
            backing,
        })
    }
}

impl<C: Clock> App<C> {
    pub fn on_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::Esc
            || (key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c'))
        {
            self.should_quit = true;
            return;
        }
        self.notice = None;

        match key.code {
            KeyCode::Tab => self.tab = next_tab(self.tab, 1),
            KeyCode::BackTab => self.tab = next_tab(self.tab, GameKind::ALL.len() - 1),
            KeyCode::Delete => self.clear_recent(self.tab),
            code => match self.tab {
                GameKind::Coin => self.on_coin_key(code),
                GameKind::Finger => self.on_finger_key(code),
                GameKind::Spinner => self.on_spinner_key(code),
            },
        }
        self.pump();
    }

    pub fn on_tick(&mut self) {
        self.finger.tick();
        self.spinner.tick();
        self.coin.tick();
        self.pump();
    }

    /// Plays left for `kind`, `None` when unlimited
    pub fn remaining_plays(&self, kind: GameKind) -> Option<u32> {
        self.gate
            .remaining(self.backing.usage(), kind)
            .ok()
            .flatten()
    }

    /// Newest first
    pub fn recent(&self, kind: GameKind) -> impl Iterator<Item = &GameRecord> {
        self.recent
            .iter()
            .rev()
            .filter(move |r| r.kind == kind)
            .take(RECENT_RESULTS)
    }

    fn clear_recent(&mut self, kind: GameKind) {
        if let Err(err) = self.backing.clear_results(kind) {
            warn!(%err, %kind, "could not clear results");
        }
        self.recent.retain(|r| r.kind != kind);
        info!(%kind, "results cleared");
    }

    fn on_finger_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(' ') => self.finger.stop(),
            KeyCode::Char(c @ '1'..='4') => {
                self.settings.max_winners = c as usize - '0' as usize;
                self.finger.set_config(self.settings.finger_config());
            }
            KeyCode::Char('+') | KeyCode::Char('=') => self.adjust_orbit(1.0),
            KeyCode::Char('-') => self.adjust_orbit(-1.0),
            KeyCode::Char(c) => self.toggle_finger(c),
            _ => {}
        }
    }

    fn adjust_orbit(&mut self, by: f64) {
        self.settings.orbit_secs = clamp_orbit_secs(self.settings.orbit_secs + by);
        self.finger.set_config(self.settings.finger_config());
    }

    /// Key presses stand in for touches: first press puts the finger down,
    /// the next lifts it.
    fn toggle_finger(&mut self, c: char) {
        let Some(position) = key_position(c) else {
            return;
        };
        let id = finger_id(c);
        if self.finger.participant(id).is_some() {
            self.finger.end(id);
            return;
        }
        let new_round = self.finger.state().is_idle() && self.finger.participants().is_empty();
        if new_round && !self.gate_allows(GameKind::Finger) {
            return;
        }
        self.finger.begin(id, position);
    }

    fn on_spinner_key(&mut self, code: KeyCode) {
        if matches!(code, KeyCode::Enter | KeyCode::Char(' '))
            && !self.spinner.is_spinning()
            && self.gate_allows(GameKind::Spinner)
        {
            self.spinner.spin_to_random_option();
        }
    }

    fn on_coin_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter | KeyCode::Char(' ') => {
                if !self.coin.is_flipping() && self.gate_allows(GameKind::Coin) {
                    self.coin.flip();
                }
            }
            KeyCode::Char('r') => self.coin.reset_counts(),
            KeyCode::Char('s') => {
                let style = self.coin.style().next();
                self.coin.set_style(style);
                self.settings.coin_style = style;
            }
            _ => {}
        }
    }

    fn gate_allows(&mut self, kind: GameKind) -> bool {
        match self.gate.is_limit_reached(self.backing.usage(), kind) {
            Ok(false) => true,
            Ok(true) => {
                self.notice = Some(format!(
                    "All {} free {kind} plays used. Run with --unlocked to keep playing.",
                    self.gate.limit
                ));
                false
            }
            Err(err) => {
                warn!(%err, %kind, "usage check failed, allowing play");
                true
            }
        }
    }

    /// React to whatever the games reported since the last call
    fn pump(&mut self) {
        for event in self.finger.drain_events() {
            match event {
                FingerEvent::SelectionTick { highlighted } => self.spotlight = Some(highlighted),
                FingerEvent::SelectionStarted { .. } | FingerEvent::RoundReset => {
                    self.spotlight = None
                }
                FingerEvent::SelectionSkipped => {
                    self.notice =
                        Some("Nobody held on long enough, lift every key and try again".to_string());
                }
                FingerEvent::Finished { winners } => {
                    self.spotlight = None;
                    let summary = winners.iter().map(|id| finger_label(*id)).join(", ");
                    self.record(GameKind::Finger, summary);
                }
                _ => {}
            }
        }

        for event in self.spinner.drain_events() {
            if let SpinEvent::Finished(result) = event {
                self.record(GameKind::Spinner, result.label.clone());
                self.last_spin = Some(result);
            }
        }

        for event in self.coin.drain_events() {
            if let CoinEvent::FlipFinished { face } = event {
                self.record(GameKind::Coin, face.to_string());
            }
        }
    }

    fn record(&mut self, kind: GameKind, summary: String) {
        info!(%kind, %summary, "game finished");
        if let Err(err) = self.backing.usage_mut().increment_usage(kind) {
            warn!(%err, %kind, "could not count play");
        }
        let record = GameRecord::new(kind, summary);
        if let Err(err) = self.backing.record_result(&record) {
            warn!(%err, %kind, "could not store result");
        }
        self.recent.push(record);
    }
}

fn next_tab(tab: GameKind, step: usize) -> GameKind {
    let idx = GameKind::ALL.iter().position(|k| *k == tab).unwrap_or(0);
    GameKind::ALL[(idx + step) % GameKind::ALL.len()]
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    init_tracing();

    let store = cli.settings_store();
    let mut settings = store.load();
    cli.apply(&mut settings);
    if cli.save {
        store.save(&settings)?;
        info!(path = %store.path().display(), "settings saved");
    }

    let backing = if cli.no_persist {
        Backing::Memory(MemoryUsageStore::new())
    } else {
        Backing::Db(GameDb::open_default()?)
    };
    let mut app = App::new(settings, backing)?;
    if let Some(game) = cli.game {
        app.tab = game;
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::default());
    let result = start_tui(&mut terminal, &mut app, &runner);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn start_tui<B, C, E, T>(
    terminal: &mut Terminal<B>,
    app: &mut App<C>,
    runner: &Runner<E, T>,
) -> Result<(), Box<dyn Error>>
where
    B: Backend,
    C: Clock,
    E: GameEventSource,
    T: Ticker,
{
    terminal.draw(|f| ui::draw(app, f))?;

    while !app.should_quit {
        match runner.step() {
            GameEvent::Tick => app.on_tick(),
            GameEvent::Resize => {}
            GameEvent::Key(key) => {
                app.on_key(key);
                // steady typing never times out the runner
                app.on_tick();
            }
        }
        if !app.should_quit {
            terminal.draw(|f| ui::draw(app, f))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use randofun::clock::ManualClock;
    use randofun::coin::CoinFace;
    use randofun::finger::RoundState;
    use randofun::runtime::TestEventSource;
    use randofun::spinner::StoredOption;
    use ratatui::backend::TestBackend;
    use std::sync::mpsc;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app(settings: Settings) -> (App<ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let app = App::with_clock(
            settings,
            Backing::Memory(MemoryUsageStore::new()),
            clock.clone(),
            Some(7),
        )
        .unwrap();
        (app, clock)
    }

    fn run_for(app: &mut App<ManualClock>, clock: &ManualClock, secs: f64) {
        let steps = (secs / 0.05).round() as usize;
        for _ in 0..steps {
            clock.advance(Duration::from_millis(50));
            app.on_tick();
        }
    }

    fn screen(app: &App<ManualClock>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();
        terminal.draw(|f| ui::draw(app, f)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer.content.iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["randofun"]);
        assert!(cli.game.is_none());
        assert!(cli.options.is_empty());
        assert!(!cli.save);
        assert!(!cli.no_persist);
    }

    #[test]
    fn test_cli_game_and_overrides() {
        let cli = Cli::parse_from([
            "randofun",
            "finger",
            "-w",
            "3",
            "--orbit-secs",
            "6.5",
            "-O",
            "Tea:2",
            "--option",
            "Coffee",
            "--coin-style",
            "japanese",
            "--limit",
            "20",
            "--unlocked",
        ]);
        assert_eq!(cli.game, Some(GameKind::Finger));

        let mut settings = Settings::default();
        cli.apply(&mut settings);
        assert_eq!(settings.max_winners, 3);
        assert_eq!(settings.orbit_secs, 6.5);
        assert_eq!(settings.coin_style, CoinStyle::Japanese);
        assert_eq!(settings.usage_limit, 20);
        assert!(settings.unlocked);
        assert_eq!(
            settings.spinner_options,
            vec![
                StoredOption::new("Tea", Some(667)),
                StoredOption::new("Coffee", Some(333)),
            ]
        );
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(Cli::try_parse_from(["randofun", "dice"]).is_err());
        assert!(Cli::try_parse_from(["randofun", "-O", ":3"]).is_err());
        assert!(Cli::try_parse_from(["randofun", "-O", "Tea:-1"]).is_err());
        assert!(Cli::try_parse_from(["randofun", "--coin-style", "gold"]).is_err());
    }

    #[test]
    fn test_parse_spin_option() {
        assert_eq!(parse_spin_option("Tea:2").unwrap(), SpinOption::new("Tea", 2.0));
        assert_eq!(parse_spin_option(" Tea ").unwrap(), SpinOption::new("Tea", 1.0));
        // a colon that is not followed by a number belongs to the label
        assert_eq!(
            parse_spin_option("Plan: B").unwrap(),
            SpinOption::new("Plan: B", 1.0)
        );
        assert!(parse_spin_option("").is_err());
        assert!(parse_spin_option("Tea:0").is_err());
    }

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(None), Level::INFO);
        assert_eq!(log_level(Some("debug")), Level::DEBUG);
        assert_eq!(log_level(Some("TRACE")), Level::TRACE);
        assert_eq!(log_level(Some("loud")), Level::INFO);
    }

    #[test]
    fn test_key_positions() {
        assert_eq!(key_position('q'), Some(Position::new(0.0, 0.0)));
        assert_eq!(key_position('a'), Some(Position::new(0.05, 0.5)));
        assert!(key_position('1').is_none());
        assert_eq!(finger_label(finger_id('k')), "k");
    }

    #[test]
    fn test_tabs_cycle_and_quit() {
        let (mut app, _clock) = test_app(Settings::default());
        assert_eq!(app.tab, GameKind::Spinner);
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.tab, GameKind::Coin);
        app.on_key(key(KeyCode::Tab));
        assert_eq!(app.tab, GameKind::Finger);
        app.on_key(key(KeyCode::BackTab));
        assert_eq!(app.tab, GameKind::Coin);

        app.on_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);
    }

    #[test]
    fn test_spin_records_result_and_usage() {
        let (mut app, clock) = test_app(Settings::default());
        app.on_key(key(KeyCode::Enter));
        assert!(app.spinner.is_spinning());
        // a second Enter mid-spin is ignored
        app.on_key(key(KeyCode::Enter));
        run_for(&mut app, &clock, 3.2);

        let result = app.last_spin.clone().unwrap();
        let recent: Vec<&str> = app
            .recent(GameKind::Spinner)
            .map(|r| r.summary.as_str())
            .collect();
        assert_eq!(recent, vec![result.label.as_str()]);
        assert_eq!(app.remaining_plays(GameKind::Spinner), Some(9));
        assert!(screen(&app).contains(&result.label));
    }

    #[test]
    fn test_usage_limit_blocks_new_games() {
        let settings = Settings {
            usage_limit: 1,
            ..Settings::default()
        };
        let (mut app, clock) = test_app(settings);
        app.tab = GameKind::Coin;
        app.on_key(key(KeyCode::Enter));
        run_for(&mut app, &clock, 1.2);
        assert_eq!(app.coin.heads() + app.coin.tails(), 1);

        app.on_key(key(KeyCode::Enter));
        assert!(!app.coin.is_flipping());
        assert!(app.notice.as_deref().unwrap_or_default().contains("free coin plays"));
        assert_eq!(app.remaining_plays(GameKind::Coin), Some(0));
        // other games keep their own allowance
        assert_eq!(app.remaining_plays(GameKind::Spinner), Some(1));
    }

    #[test]
    fn test_unlocked_app_has_no_limit() {
        let settings = Settings {
            usage_limit: 0,
            unlocked: true,
            ..Settings::default()
        };
        let (mut app, clock) = test_app(settings);
        app.tab = GameKind::Coin;
        for _ in 0..3 {
            app.on_key(key(KeyCode::Enter));
            run_for(&mut app, &clock, 1.2);
        }
        assert_eq!(app.coin.heads() + app.coin.tails(), 3);
        assert_eq!(app.remaining_plays(GameKind::Coin), None);
    }

    #[test]
    fn test_coin_keys() {
        let (mut app, clock) = test_app(Settings::default());
        app.tab = GameKind::Coin;
        app.on_key(key(KeyCode::Char(' ')));
        run_for(&mut app, &clock, 1.2);
        let face = if app.coin.heads() == 1 {
            CoinFace::Heads
        } else {
            CoinFace::Tails
        };
        assert_eq!(
            app.recent(GameKind::Coin).next().map(|r| r.summary.clone()),
            Some(face.to_string())
        );

        app.on_key(key(KeyCode::Char('r')));
        assert_eq!(app.coin.heads() + app.coin.tails(), 0);

        app.on_key(key(KeyCode::Char('s')));
        assert_eq!(app.coin.style(), CoinStyle::Funny);
        assert_eq!(app.settings.coin_style, CoinStyle::Funny);
    }

    #[test]
    fn test_finger_round_picks_winners() {
        let (mut app, clock) = test_app(Settings::default());
        app.tab = GameKind::Finger;
        app.on_key(key(KeyCode::Char('2')));
        app.on_key(key(KeyCode::Char('a')));
        app.on_key(key(KeyCode::Char('s')));
        app.on_key(key(KeyCode::Char('d')));
        assert_eq!(app.finger.participants().len(), 3);
        assert!(matches!(app.finger.state(), RoundState::Counting { .. }));

        // 3 s countdown then 4 s of spotlight
        run_for(&mut app, &clock, 3.1);
        assert!(matches!(app.finger.state(), RoundState::Selecting { .. }));
        run_for(&mut app, &clock, 4.5);

        let RoundState::Finished { winners } = app.finger.state().clone() else {
            panic!("round should be finished");
        };
        assert_eq!(winners.len(), 2);
        let summary = app.recent(GameKind::Finger).next().unwrap().summary.clone();
        assert_eq!(summary.split(", ").count(), 2);

        // lifting everyone resets the round
        app.on_key(key(KeyCode::Char(' ')));
        assert!(app.finger.state().is_idle());
        assert!(app.finger.participants().is_empty());
    }

    #[test]
    fn test_finger_toggle_lifts_a_key() {
        let (mut app, _clock) = test_app(Settings::default());
        app.tab = GameKind::Finger;
        app.on_key(key(KeyCode::Char('j')));
        assert!(app.finger.participant(finger_id('j')).is_some());
        app.on_key(key(KeyCode::Char('j')));
        assert!(app.finger.participant(finger_id('j')).is_none());
        assert!(app.finger.state().is_idle());
    }

    #[test]
    fn test_early_lift_abandons_the_round() {
        let (mut app, clock) = test_app(Settings::default());
        app.tab = GameKind::Finger;
        app.on_key(key(KeyCode::Char('a')));
        run_for(&mut app, &clock, 1.0);
        app.on_key(key(KeyCode::Char('a')));
        assert!(app.finger.state().is_idle());

        run_for(&mut app, &clock, 8.0);
        assert!(app.finger.state().is_idle());
        assert_eq!(app.recent(GameKind::Finger).count(), 0);
        assert_eq!(app.remaining_plays(GameKind::Finger), Some(10));
    }

    #[test]
    fn test_orbit_keys_stay_in_range() {
        let (mut app, _clock) = test_app(Settings::default());
        app.tab = GameKind::Finger;
        for _ in 0..20 {
            app.on_key(key(KeyCode::Char('+')));
        }
        assert_eq!(app.settings.orbit_secs, 10.0);
        for _ in 0..20 {
            app.on_key(key(KeyCode::Char('-')));
        }
        assert_eq!(app.settings.orbit_secs, 1.0);
        assert_eq!(app.finger.config().orbit, Duration::from_secs(1));
    }

    #[test]
    fn test_every_tab_renders() {
        let (mut app, _clock) = test_app(Settings::default());
        let content = screen(&app);
        assert!(content.contains("What to eat?"));
        assert!(content.contains("Sushi"));

        app.tab = GameKind::Coin;
        let content = screen(&app);
        assert!(content.contains("HEADS"));
        assert!(content.contains("Heads 0"));

        app.tab = GameKind::Finger;
        app.on_key(key(KeyCode::Char('q')));
        let content = screen(&app);
        assert!(content.contains("Hold on"));
    }

    #[test]
    fn test_start_tui_runs_until_esc() {
        let (mut app, _clock) = test_app(Settings::default());
        let (tx, rx) = mpsc::channel();
        tx.send(GameEvent::Key(key(KeyCode::Tab))).unwrap();
        tx.send(GameEvent::Resize).unwrap();
        tx.send(GameEvent::Key(key(KeyCode::Esc))).unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        start_tui(&mut terminal, &mut app, &runner).unwrap();
        assert!(app.should_quit);
        assert_eq!(app.tab, GameKind::Coin);
    }

    #[test]
    fn test_delete_clears_history_of_current_game() {
        let clock = ManualClock::new();
        let mut app = App::with_clock(
            Settings::default(),
            Backing::Db(GameDb::open_in_memory().unwrap()),
            clock.clone(),
            Some(7),
        )
        .unwrap();
        app.tab = GameKind::Coin;
        app.on_key(key(KeyCode::Enter));
        run_for(&mut app, &clock, 1.2);
        app.tab = GameKind::Spinner;
        app.on_key(key(KeyCode::Enter));
        run_for(&mut app, &clock, 3.2);
        assert_eq!(app.recent(GameKind::Spinner).count(), 1);

        app.on_key(key(KeyCode::Delete));
        assert_eq!(app.recent(GameKind::Spinner).count(), 0);
        assert_eq!(app.recent(GameKind::Coin).count(), 1);
        let stored = app.backing.recent_results();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].kind, GameKind::Coin);
        // plays stay counted
        assert_eq!(app.remaining_plays(GameKind::Spinner), Some(9));
    }

    #[test]
    fn test_timers_advance_during_key_bursts() {
        let (mut app, clock) = test_app(Settings::default());
        app.tab = GameKind::Coin;
        assert!(app.coin.flip().is_some());
        clock.advance(Duration::from_secs(2));

        let (tx, rx) = mpsc::channel();
        for c in ['x', 'y', 'z'] {
            tx.send(GameEvent::Key(key(KeyCode::Char(c)))).unwrap();
        }
        tx.send(GameEvent::Key(key(KeyCode::Esc))).unwrap();
        let runner = Runner::new(
            TestEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(5)),
        );
        let mut terminal = Terminal::new(TestBackend::new(80, 24)).unwrap();

        start_tui(&mut terminal, &mut app, &runner).unwrap();
        assert!(!app.coin.is_flipping());
        assert_eq!(app.coin.heads() + app.coin.tails(), 1);
    }
}
