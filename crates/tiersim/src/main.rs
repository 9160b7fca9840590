use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout},
    DefaultTerminal, Frame,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tiersim_engine::prelude::*;
use tiersim_engine::pricing::DEFAULT_REGION;
use tiersim_engine::{MonthlyResult, Scenario};
use tokio::time::interval;
use tracing::{debug, warn};

mod output;
mod widgets;
use output::OutputFormat;
use widgets::*;

#[derive(Debug, Clone, PartialEq)]
pub enum PopupType {
    MonthDetail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyChoice {
    Autoclass,
    Lifecycle,
    Compare,
}

#[derive(Parser, Debug)]
#[clap(author = "Red", version, about)]
struct Args {
    #[arg(short = 'v')]
    verbose: bool,

    /// Scenario JSON file. Defaults to 10 TiB over 12 months.
    #[arg(short = 's', long = "scenario")]
    scenario: Option<String>,

    /// Pricing region; remembered for later runs.
    #[arg(short = 'r', long = "region")]
    region: Option<String>,

    #[arg(short = 'p', long = "policy", value_enum, default_value = "compare")]
    policy: PolicyChoice,

    /// Overrides the scenario's horizon.
    #[arg(short = 'm', long = "months")]
    months: Option<u32>,

    #[arg(short = 'f', long = "format", value_enum, default_value = "table")]
    format: OutputFormat,

    /// Live dashboard that re-runs the scenario when it changes.
    #[arg(short = 'w', long = "watch")]
    watch: bool,
}

#[derive(Serialize, Deserialize, Debug)]
struct TiersimSettings {
    region: String,
}

impl Default for TiersimSettings {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
        }
    }
}

fn get_settings_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.tiersim.json").as_ref())
}

fn load_settings() -> Result<TiersimSettings> {
    load_settings_from(&get_settings_path())
}

fn load_settings_from(settings_path: &Path) -> Result<TiersimSettings> {
    if settings_path.exists() {
        let content = fs::read_to_string(settings_path)
            .with_context(|| format!("Failed to read {}", settings_path.display()))?;
        let settings: TiersimSettings = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", settings_path.display()))?;
        Ok(settings)
    } else {
        Ok(TiersimSettings::default())
    }
}

fn save_settings(settings: &TiersimSettings) -> Result<()> {
    save_settings_to(&get_settings_path(), settings)
}

fn save_settings_to(settings_path: &Path, settings: &TiersimSettings) -> Result<()> {
    let content = serde_json::to_string_pretty(settings)?;
    fs::write(settings_path, content)
        .with_context(|| format!("Failed to write {}", settings_path.display()))?;
    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr))
        .init();
}

/// Where a simulation's inputs come from. Shared by both modes.
#[derive(Debug, Clone)]
pub struct RunSource {
    scenario_path: Option<String>,
    /// Explicit `--region`, wins over the scenario's own region.
    region_override: Option<String>,
    /// Remembered region, used when neither names one.
    fallback_region: String,
    months: Option<u32>,
}

impl RunSource {
    fn load(&self, loader: &ScenarioLoader) -> Result<(Scenario, Simulator)> {
        let mut scenario = match &self.scenario_path {
            Some(path) => {
                let path = shellexpand::tilde(path).to_string();
                loader.load_scenario(&path)?
            }
            None => Scenario::default(),
        };
        if let Some(months) = self.months {
            scenario.simulation.horizon_months = months;
        }

        let region = self
            .region_override
            .as_deref()
            .or(scenario.region.as_deref())
            .unwrap_or(&self.fallback_region);
        debug!(region, scenario = scenario.display_name(), "building simulator");
        let simulator = loader.build_simulator(&scenario, Some(region))?;
        Ok((scenario, simulator))
    }
}

pub struct AppState {
    pub source: RunSource,
    pub loader: ScenarioLoader,
    pub scenario_name: String,
    pub region: String,
    pub comparison: Option<Comparison>,
    pub last_update: DateTime<Utc>,
    pub is_loading: bool,
    pub spinner_state: usize,
    pub error_message: Option<String>,
    pub active_popup: Option<PopupType>,
    pub selected_month: usize,
    pub view: Strategy,
}

impl AppState {
    fn new(source: RunSource) -> Self {
        Self {
            source,
            loader: ScenarioLoader::new(),
            scenario_name: "Unnamed scenario".to_string(),
            region: String::new(),
            comparison: None,
            last_update: Utc::now(),
            is_loading: false,
            spinner_state: 0,
            error_message: None,
            active_popup: None,
            selected_month: 0,
            view: Strategy::Autoclass,
        }
    }

    fn load_comparison(&mut self) -> Result<()> {
        self.is_loading = true;
        self.error_message = None;

        let result = self
            .source
            .load(&self.loader)
            .and_then(|(scenario, simulator)| {
                let region = simulator.pricing().region().to_string();
                let comparison = Comparator::new(simulator).compare()?;
                Ok((scenario.display_name().to_string(), region, comparison))
            });

        let outcome = match result {
            Ok((name, region, comparison)) => {
                let last = comparison.deltas.len().saturating_sub(1);
                if self.comparison.is_none() || self.selected_month > last {
                    self.selected_month = last;
                }
                self.scenario_name = name;
                self.region = region;
                self.comparison = Some(comparison);
                Ok(())
            }
            Err(e) => {
                warn!("scenario run failed: {:#}", e);
                self.error_message = Some(format!("{:#}", e));
                Err(e)
            }
        };

        self.is_loading = false;
        self.last_update = Utc::now();

        outcome
    }

    fn update_spinner(&mut self) {
        self.spinner_state = (self.spinner_state + 1) % 10;
    }

    pub fn get_spinner_char(&self) -> char {
        match self.spinner_state {
            0 => '⠋',
            1 => '⠙',
            2 => '⠹',
            3 => '⠸',
            4 => '⠼',
            5 => '⠴',
            6 => '⠦',
            7 => '⠧',
            8 => '⠇',
            9 => '⠏',
            _ => '⠋',
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn month_count(&self) -> usize {
        self.comparison
            .as_ref()
            .map(|comparison| comparison.deltas.len())
            .unwrap_or(0)
    }

    /// Row of the selected month for `strategy`.
    pub fn selected_row(&self, strategy: Strategy) -> Option<&MonthlyResult> {
        self.comparison
            .as_ref()
            .and_then(|comparison| comparison.run(strategy).rows().get(self.selected_month))
    }

    pub fn selected_delta(&self) -> Option<&tiersim_engine::DeltaRow> {
        self.comparison
            .as_ref()
            .and_then(|comparison| comparison.deltas.get(self.selected_month))
    }

    fn select_previous_month(&mut self) {
        self.selected_month = self.selected_month.saturating_sub(1);
    }

    fn select_next_month(&mut self) {
        if self.selected_month + 1 < self.month_count() {
            self.selected_month += 1;
        }
    }

    fn toggle_view(&mut self) {
        self.view = match self.view {
            Strategy::Autoclass => Strategy::Lifecycle,
            Strategy::Lifecycle => Strategy::Autoclass,
        };
    }
}

pub struct App {
    state: Arc<Mutex<AppState>>,
    exit: bool,
}

impl App {
    pub fn new(source: RunSource) -> Self {
        let mut app_state = AppState::new(source);

        if let Err(e) = app_state.load_comparison() {
            app_state.error_message = Some(format!("Initial load failed: {:#}", e));
        }

        Self {
            state: Arc::new(Mutex::new(app_state)),
            exit: false,
        }
    }

    pub async fn run(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        let state_clone = Arc::clone(&self.state);

        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(5));
            loop {
                interval.tick().await;

                if let Ok(mut state) = state_clone.lock() {
                    // Picks up edits to the scenario file
                    let _ = state.load_comparison();
                }
            }
        });

        let mut tick_interval = interval(Duration::from_millis(100));

        loop {
            tokio::select! {
                _ = tick_interval.tick() => {
                    if let Ok(mut state) = self.state.lock() {
                        state.update_spinner();
                    }

                    terminal.draw(|frame| self.draw(frame))?;
                }

                _ = async {
                    if event::poll(Duration::from_millis(0)).unwrap_or(false) {
                        if let Ok(event) = event::read() {
                            self.handle_event(event);
                        }
                    }
                } => {}
            }

            if self.exit {
                break;
            }
        }

        Ok(())
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(6),
                Constraint::Min(6),
                Constraint::Length(1),
            ])
            .split(area);

        if let Ok(state) = self.state.lock() {
            HeaderWidget::render(frame, chunks[0], &state);
            TierBarsWidget::render(frame, chunks[1], &state);
            StatisticsWidget::render(frame, chunks[2], &state);
            ComparisonWidget::render(frame, chunks[3], &state);
            ShortcutsWidget::render(frame, chunks[4], &state);

            match &state.active_popup {
                Some(PopupType::MonthDetail) => {
                    PopupWidget::render(frame, area, &state);
                }
                None => {}
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key_event) = event {
            if key_event.kind == KeyEventKind::Press {
                match key_event.code {
                    KeyCode::Char('q') => self.exit = true,
                    KeyCode::Char('r') => {
                        if let Ok(mut state) = self.state.lock() {
                            let _ = state.load_comparison();
                        }
                    }
                    KeyCode::Char('d') => {
                        if let Ok(mut state) = self.state.lock() {
                            state.active_popup =
                                if state.active_popup == Some(PopupType::MonthDetail) {
                                    None
                                } else {
                                    Some(PopupType::MonthDetail)
                                };
                        }
                    }
                    KeyCode::Char('t') => {
                        if let Ok(mut state) = self.state.lock() {
                            state.toggle_view();
                        }
                    }
                    KeyCode::Left => {
                        if let Ok(mut state) = self.state.lock() {
                            state.select_previous_month();
                        }
                    }
                    KeyCode::Right => {
                        if let Ok(mut state) = self.state.lock() {
                            state.select_next_month();
                        }
                    }
                    KeyCode::Esc => {
                        if let Ok(mut state) = self.state.lock() {
                            state.active_popup = None;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

fn run_once(source: &RunSource, policy: PolicyChoice, format: OutputFormat) -> Result<()> {
    let loader = ScenarioLoader::new();
    let (_, simulator) = source.load(&loader)?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    match policy {
        PolicyChoice::Autoclass => {
            let run = simulator.run(Strategy::Autoclass)?;
            output::write_run(&mut out, &run, format)
        }
        PolicyChoice::Lifecycle => {
            let run = simulator.run(Strategy::Lifecycle)?;
            output::write_run(&mut out, &run, format)
        }
        PolicyChoice::Compare => {
            let comparison = Comparator::new(simulator).compare()?;
            output::write_comparison(&mut out, &comparison, format)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // The dashboard owns the terminal, so only plain runs log
    if !args.watch {
        init_logging(args.verbose);
    }

    let mut settings = load_settings().unwrap_or_else(|e| {
        warn!("ignoring unreadable settings: {:#}", e);
        TiersimSettings::default()
    });

    // An explicit region is remembered for later runs
    if let Some(region) = &args.region {
        settings.region = region.clone();
        if let Err(e) = save_settings(&settings) {
            warn!("could not save settings: {:#}", e);
        }
    }

    let source = RunSource {
        scenario_path: args.scenario.clone(),
        region_override: args.region.clone(),
        fallback_region: settings.region,
        months: args.months,
    };

    if !args.watch {
        return run_once(&source, args.policy, args.format);
    }

    let mut terminal = ratatui::init();
    let mut app = App::new(source);

    let result = app.run(&mut terminal).await;

    ratatui::restore();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("tiersim-{}-{}", std::process::id(), name))
    }

    #[test]
    fn test_settings_round_trip() {
        let path = scratch_path("settings.json");
        let settings = TiersimSettings {
            region: "europe-west2".to_string(),
        };

        save_settings_to(&path, &settings).unwrap();
        let loaded = load_settings_from(&path).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(loaded.region, "europe-west2");
    }

    #[test]
    fn test_missing_settings_fall_back_to_default_region() {
        let loaded = load_settings_from(&scratch_path("absent.json")).unwrap();
        assert_eq!(loaded.region, DEFAULT_REGION);
    }

    #[test]
    fn test_unwritable_settings_report_the_path() {
        let path = scratch_path("no-such-dir").join("settings.json");
        let err = save_settings_to(&path, &TiersimSettings::default())
            .err()
            .unwrap();

        assert!(format!("{:#}", err).contains("no-such-dir"));
    }

    #[test]
    fn test_region_precedence() {
        let loader = ScenarioLoader::new();
        let mut source = RunSource {
            scenario_path: None,
            region_override: None,
            fallback_region: "europe-west2".to_string(),
            months: Some(6),
        };

        let (_, simulator) = source.load(&loader).unwrap();
        assert_eq!(simulator.pricing().region(), "europe-west2");
        assert_eq!(simulator.config().horizon_months, 6);

        source.region_override = Some("us-east1".to_string());
        let (_, simulator) = source.load(&loader).unwrap();
        assert_eq!(simulator.pricing().region(), "us-east1");
    }
}
