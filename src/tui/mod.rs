//! Ratatui-based terminal UI.
//!
//! The TUI provides a settings panel for choosing a country, forecast
//! horizon, and intervention scenario, then renders the anchored forecast
//! against the observed points.

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Terminal,
};

use crate::app::pipeline::{self, RunOutput};
use crate::cli::ForecastArgs;
use crate::data::csse::{ConfirmedTable, CsseClient};
use crate::data::population::resolve_population;
use crate::data::sample::{synthetic_series, SampleSpec};
use crate::domain::{comp, CountrySeries, ForecastConfig, InterventionSpec};
use crate::error::AppError;
use crate::io::config::ModelConfig;

mod plotters_chart;

use plotters_chart::EpiPlottersChart;

const FIELD_COUNT: usize = 4;

/// Start the TUI.
pub fn run(args: ForecastArgs) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::config(format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(args)?;
    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode()
            .map_err(|e| AppError::config(format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::config(format!(
                "Failed to enter alternate screen: {e}"
            )));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

struct App {
    config: ForecastConfig,
    model_config: ModelConfig,
    /// Country names offered by the Country field.
    available: Vec<String>,
    country_idx: usize,
    /// `None` in offline mode.
    table: Option<ConfirmedTable>,
    series: Option<CountrySeries>,
    run: Option<RunOutput>,
    selected_field: usize,
    status: String,
}

impl App {
    fn new(args: ForecastArgs) -> Result<Self, AppError> {
        let config = crate::app::forecast_config_from_args(&args);
        let model_config = pipeline::resolve_model_config(&config)?;

        let mut app = Self {
            config,
            model_config,
            available: Vec::new(),
            country_idx: 0,
            table: None,
            series: None,
            run: None,
            selected_field: 0,
            status: "Loading data...".to_string(),
        };
        app.refresh_data()?;
        Ok(app)
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::config(format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::config(format!("Event poll error: {e}")))?
            {
                continue;
            }

            match event::read().map_err(|e| AppError::config(format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the app should quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Up => {
                if self.selected_field > 0 {
                    self.selected_field -= 1;
                }
            }
            KeyCode::Down => {
                if self.selected_field < FIELD_COUNT - 1 {
                    self.selected_field += 1;
                }
            }
            KeyCode::Left => self.adjust_field(-1),
            KeyCode::Right => self.adjust_field(1),
            KeyCode::Char('i') => {
                self.toggle_intervention();
                self.refit();
            }
            KeyCode::Char('r') => {
                self.refit();
                self.status = "Refit.".to_string();
            }
            KeyCode::Char('f') => {
                if let Err(e) = self.refresh_data() {
                    self.status = format!("Fetch failed: {e}");
                }
            }
            KeyCode::Char('d') => {
                match (&self.run, &self.config) {
                    (Some(run), config) => {
                        match crate::debug::write_debug_bundle(run, config) {
                            Ok(path) => {
                                self.status = format!("Wrote debug bundle: {}", path.display());
                            }
                            Err(err) => {
                                self.status = format!("Debug write failed: {err}");
                            }
                        }
                    }
                    _ => {
                        self.status = "No finished run to dump.".to_string();
                    }
                }
            }
            _ => {}
        }

        false
    }

    fn adjust_field(&mut self, delta: i32) {
        match self.selected_field {
            0 => {
                if self.available.is_empty() {
                    return;
                }
                let len = self.available.len() as i32;
                let idx = (self.country_idx as i32 + delta).rem_euclid(len);
                self.country_idx = idx as usize;
                self.reload_series_and_refit();
                self.status = format!("country: {}", self.current_country());
            }
            1 => {
                let next = (self.config.horizon_days + 7.0 * delta as f64).max(0.0);
                self.config.horizon_days = next;
                self.refit();
                self.status = format!("horizon: {next:.0}d");
            }
            2 => {
                self.toggle_intervention();
                self.refit();
            }
            3 => {
                let Some(spec) = &mut self.config.intervention else {
                    self.status = "Enable the intervention first (i).".to_string();
                    return;
                };
                spec.isolated_recovery =
                    (spec.isolated_recovery + 0.05 * delta as f64).max(0.05);
                let value = spec.isolated_recovery;
                self.refit();
                self.status = format!("intervention g_1: {value:.2}");
            }
            _ => {}
        }
    }

    fn toggle_intervention(&mut self) {
        if self.config.intervention.take().is_none() {
            self.config.intervention = Some(InterventionSpec {
                pivot_day: None,
                isolated_recovery: 1.0,
                extend_days: 60.0,
            });
            self.status = "intervention: on".to_string();
        } else {
            self.status = "intervention: off".to_string();
        }
    }

    fn current_country(&self) -> &str {
        self.available
            .get(self.country_idx)
            .map(String::as_str)
            .unwrap_or("-")
    }

    /// Fetch (or synthesize) the data and refit.
    fn refresh_data(&mut self) -> Result<(), AppError> {
        if self.config.offline {
            self.available = self.config.countries.clone();
        } else {
            self.status = "Fetching case series...".to_string();
            let table = CsseClient::from_env().fetch_confirmed()?;
            self.available = table.countries();
            self.table = Some(table);

            // Start from the first requested country when it exists upstream.
            if let Some(first) = self.config.countries.first() {
                if let Some(idx) = self.available.iter().position(|c| c == first) {
                    self.country_idx = idx;
                }
            }
        }

        self.reload_series_and_refit();
        Ok(())
    }

    /// Rebuild the current country's series, then refit.
    fn reload_series_and_refit(&mut self) {
        let country = self.current_country().to_string();

        let series = if self.config.offline {
            synthetic_series(&SampleSpec {
                name: country,
                population: self
                    .config
                    .population_override
                    .unwrap_or(self.config.sample_population),
                days: self.config.sample_days,
                seed: self.config.sample_seed,
            })
        } else {
            let Some(table) = &self.table else {
                self.status = "No case series fetched yet.".to_string();
                return;
            };
            resolve_population(&self.config, &country)
                .and_then(|population| table.country_series(&country, population))
        };

        match series {
            Ok(series) => {
                self.series = Some(series);
                self.refit();
            }
            Err(e) => {
                self.status = format!("Load failed: {e}");
            }
        }
    }

    /// Re-run the pipeline on the cached series (no refetch).
    fn refit(&mut self) {
        let Some(series) = self.series.clone() else {
            self.status = "No data to fit.".to_string();
            return;
        };

        match pipeline::run_forecast_with_series(&self.model_config, series, &self.config) {
            Ok(run) => {
                self.run = Some(run);
            }
            Err(e) => {
                self.status = format!("Fit failed: {e}");
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(5), Constraint::Min(0), Constraint::Length(3)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("epi", Style::default().fg(Color::Cyan)),
            Span::raw(" — SEQIJR forecast vs observed cases"),
        ]));

        let intervention = match &self.config.intervention {
            Some(spec) => format!("g_1 -> {:.2}", spec.isolated_recovery),
            None => "off".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!(
                "country: {} | horizon: {:.0}d | step: {} | intervention: {intervention}",
                self.current_country(),
                self.config.horizon_days,
                self.config.step,
            ),
            Style::default().fg(Color::Gray),
        )));

        if let Some(run) = &self.run {
            lines.push(Line::from(Span::styled(
                format!(
                    "R_0={:.2} R_c={:.2} | anchor: seed day {:.1} | rmse={:.1}",
                    run.basic_reproduction_number,
                    run.controlled_reproduction_number,
                    run.aligned.anchor.sim_day,
                    run.rmse,
                ),
                Style::default().fg(Color::Gray),
            )));
        }

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(8)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_settings(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Cumulative cases").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let Some(run) = &self.run else {
            let msg = Paragraph::new("Waiting for data...")
                .style(Style::default().fg(Color::Yellow))
                .block(Block::default());
            frame.render_widget(msg, inner);
            return;
        };

        let series = chart_series(run);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = EpiPlottersChart {
            forecast: &series.forecast,
            observed: &series.observed,
            intervention: series.intervention.as_deref(),
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
            x_label: "day",
            y_label: "cases".to_string(),
            fmt_x: fmt_axis_day,
            fmt_y: fmt_axis_cases,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_settings(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let intervention = match &self.config.intervention {
            Some(spec) => format!("on (extend {:.0}d)", spec.extend_days),
            None => "off".to_string(),
        };
        let recovery = match &self.config.intervention {
            Some(spec) => format!("{:.2}", spec.isolated_recovery),
            None => "-".to_string(),
        };

        let items = vec![
            ListItem::new(format!("Country: {}", self.current_country())),
            ListItem::new(format!("Horizon: {:.0} days", self.config.horizon_days)),
            ListItem::new(format!("Intervention: {intervention}")),
            ListItem::new(format!("Intervention g_1: {recovery}")),
        ];

        let list = List::new(items)
            .block(Block::default().title("Settings").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");

        let mut state = ratatui::widgets::ListState::default();
        state.select(Some(self.selected_field));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "↑/↓ select  ←/→ adjust  i intervention  r refit  f refetch  d debug  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

struct ChartSeries {
    forecast: Vec<(f64, f64)>,
    observed: Vec<(f64, f64)>,
    intervention: Option<Vec<(f64, f64)>>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters.
fn chart_series(run: &RunOutput) -> ChartSeries {
    let forecast_traj = &run.aligned.forecast;
    let forecast: Vec<(f64, f64)> = forecast_traj
        .times()
        .iter()
        .zip(forecast_traj.series(comp::AJ))
        .map(|(&t, v)| (t, v))
        .collect();

    let observed: Vec<(f64, f64)> = run
        .residuals
        .iter()
        .map(|r| (r.day_offset as f64, r.observed))
        .collect();

    let intervention: Option<Vec<(f64, f64)>> = run.aligned.intervention.as_ref().map(|b| {
        b.trajectory
            .times()
            .iter()
            .zip(b.trajectory.series(comp::AJ))
            .map(|(&t, v)| (t, v))
            .collect()
    });

    let mut x_max = forecast_traj.end();
    if let Some(branch) = &intervention {
        if let Some(&(t, _)) = branch.last() {
            x_max = x_max.max(t);
        }
    }
    let x_bounds = [forecast_traj.start(), x_max.max(forecast_traj.start() + 1.0)];

    let (mut y_min, mut y_max) = (f64::INFINITY, f64::NEG_INFINITY);
    for &(_, y) in forecast
        .iter()
        .chain(observed.iter())
        .chain(intervention.iter().flatten())
    {
        y_min = y_min.min(y);
        y_max = y_max.max(y);
    }

    if !y_min.is_finite() || !y_max.is_finite() || y_max <= y_min {
        y_min = 0.0;
        y_max = 1.0;
    }

    let pad = ((y_max - y_min).abs() * 0.05).max(1e-12);
    let y_bounds = [y_min - pad, y_max + pad];

    ChartSeries {
        forecast,
        observed,
        intervention,
        x_bounds,
        y_bounds,
    }
}

fn fmt_axis_day(v: f64) -> String {
    format!("{v:.0}")
}

fn fmt_axis_cases(v: f64) -> String {
    format!("{v:.0}")
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 8,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = format!("{x_val:.0}");
        let label_len = label.len() as u16;
        let start = x.saturating_sub((label.len() / 2) as u16);
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.0}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label.len() as u16);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("day")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }

    let y_label = Paragraph::new("cases")
        .style(Style::default().fg(Color::Gray).add_modifier(Modifier::BOLD));
    let y_rect = Rect {
        x: inner.x,
        y: inner.y,
        width: insets.left.saturating_sub(1),
        height: 1,
    };
    frame.render_widget(y_label, y_rect);
}
