//! Interactive terminal dashboard.
//!
//! The fetch pipeline runs on a worker thread and reports through the
//! progress sink; the draw loop renders whatever is in the shared state.

use std::io;
use std::sync::mpsc::{Receiver, channel};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use crossterm::ExecutableCommand;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use miette::IntoDiagnostic;
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{
    Bar, BarChart, BarGroup, Block, Borders, Cell, Gauge, Paragraph, Row, Table, TableState, Tabs,
    Wrap,
};

use crate::cache::CachedPipeline;
use crate::config::ResolvedConfig;
use crate::domain::{Limit, QueryParams, SearchTerm, Year};
use crate::export;
use crate::nfz::NfzClient;
use crate::pipeline::{FetchOutcome, ProgressEvent, ProgressSink};
use crate::session::{FilterMode, SessionState};
use crate::table::DiseaseTable;

const CHART_BAR_WIDTH: u16 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum View {
    Results,
    Errors,
    Info,
}

impl View {
    fn index(self) -> usize {
        match self {
            View::Results => 0,
            View::Errors => 1,
            View::Info => 2,
        }
    }

    fn next(self) -> Self {
        match self {
            View::Results => View::Errors,
            View::Errors => View::Info,
            View::Info => View::Results,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    None,
    Term,
    YearField,
    LimitField,
    CodeFilter,
    NameFilter,
}

struct AppState {
    params: QueryParams,
    session: SessionState,
    view: View,
    running: bool,
    progress: Option<(Option<f64>, String)>,
    status: String,
}

pub struct Dashboard<C: NfzClient + 'static> {
    pipeline: Arc<CachedPipeline<C>>,
    state: Arc<Mutex<AppState>>,
    focus: Focus,
    draft: String,
    table_state: TableState,
    error_scroll: usize,
    rx: Option<Receiver<(FetchOutcome, Duration)>>,
}

struct TuiProgress {
    state: Arc<Mutex<AppState>>,
}

impl ProgressSink for TuiProgress {
    fn event(&self, event: ProgressEvent) {
        if let Ok(mut state) = self.state.lock() {
            state.progress = Some((event.fraction, event.message));
        }
    }
}

impl<C: NfzClient + 'static> Dashboard<C> {
    pub fn new(pipeline: CachedPipeline<C>, config: &ResolvedConfig, mode: FilterMode) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
            state: Arc::new(Mutex::new(AppState {
                params: QueryParams {
                    term: config.term.clone(),
                    year: config.year,
                    limit: config.limit,
                },
                session: SessionState::new(mode),
                view: View::Results,
                running: false,
                progress: None,
                status: "ready - press r to fetch".to_string(),
            })),
            focus: Focus::None,
            draft: String::new(),
            table_state: TableState::default(),
            error_scroll: 0,
            rx: None,
        }
    }

    pub fn run(&mut self) -> miette::Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().into_diagnostic()?;
        stdout.execute(EnterAlternateScreen).into_diagnostic()?;

        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).into_diagnostic()?;
        terminal.clear().into_diagnostic()?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().into_diagnostic()?;
        let mut stdout = io::stdout();
        stdout.execute(LeaveAlternateScreen).into_diagnostic()?;
        result
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    ) -> miette::Result<()> {
        loop {
            self.poll_completion();

            if let Ok(state) = self.state.lock() {
                let focus = self.focus;
                let draft = self.draft.clone();
                let error_scroll = self.error_scroll;
                let mut table_state = self.table_state.clone();
                terminal
                    .draw(|frame| {
                        draw_ui(frame, &state, focus, &draft, &mut table_state, error_scroll);
                    })
                    .into_diagnostic()?;
                self.table_state = table_state;
            }

            if event::poll(Duration::from_millis(120)).into_diagnostic()? {
                if let Event::Key(key) = event::read().into_diagnostic()? {
                    if self.handle_key(key) {
                        return Ok(());
                    }
                }
            }
        }
    }

    fn poll_completion(&mut self) {
        let Some(rx) = &self.rx else { return };
        if let Ok((outcome, runtime)) = rx.try_recv() {
            self.rx = None;
            if let Ok(mut state) = self.state.lock() {
                let rows = outcome.diseases.len();
                let errors = outcome.errors.len();
                state.session.set_outcome(outcome, runtime);
                state.running = false;
                state.progress = None;
                state.status = if errors == 0 {
                    format!("fetched {rows} ICD-10 rows in {:.1} s", runtime.as_secs_f64())
                } else {
                    format!(
                        "fetched {rows} ICD-10 rows in {:.1} s ({errors} errors, see Errors tab)",
                        runtime.as_secs_f64()
                    )
                };
            }
            self.table_state.select(Some(0));
        }
    }

    fn start_fetch(&mut self) {
        let params = {
            let Ok(mut state) = self.state.lock() else {
                return;
            };
            if state.running {
                return;
            }
            state.running = true;
            state.status = "fetching data from NFZ...".to_string();
            state.params.clone()
        };

        let (tx, rx) = channel();
        self.rx = Some(rx);
        let pipeline = self.pipeline.clone();
        let sink_state = self.state.clone();
        thread::spawn(move || {
            let sink = TuiProgress { state: sink_state };
            let start = Instant::now();
            let outcome = pipeline.fetch(&params, &sink);
            let _ = tx.send((outcome, start.elapsed()));
        });
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if self.focus != Focus::None {
            self.handle_input_key(key);
            return false;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                if let Ok(mut state) = self.state.lock() {
                    state.view = state.view.next();
                }
            }
            KeyCode::Char('1') => self.set_view(View::Results),
            KeyCode::Char('2') => self.set_view(View::Errors),
            KeyCode::Char('3') => self.set_view(View::Info),
            KeyCode::Char('r') => self.start_fetch(),
            KeyCode::Char('t') => self.begin_edit(Focus::Term),
            KeyCode::Char('y') => self.begin_edit(Focus::YearField),
            KeyCode::Char('l') => self.begin_edit(Focus::LimitField),
            KeyCode::Char('/') => self.begin_edit(Focus::CodeFilter),
            KeyCode::Char('n') => self.begin_edit(Focus::NameFilter),
            KeyCode::Char('a') => {
                if let Ok(mut state) = self.state.lock() {
                    state.session.apply_filters();
                    state.status = "filters applied".to_string();
                }
            }
            KeyCode::Char('c') => {
                if let Ok(mut state) = self.state.lock() {
                    state.session.clear_filters();
                    state.status = "filters cleared".to_string();
                }
            }
            KeyCode::Char('d') => {
                if let Ok(mut state) = self.state.lock() {
                    state.session.filter_mode = state.session.filter_mode.toggled();
                    state.status = format!("filter mode: {}", state.session.filter_mode.label());
                }
            }
            KeyCode::Char('m') => {
                if let Ok(mut state) = self.state.lock() {
                    state.session.cycle_metric(true);
                }
            }
            KeyCode::Char('e') => self.export_csv(),
            KeyCode::Char('x') => self.export_xlsx(),
            KeyCode::Down => self.scroll(1),
            KeyCode::Up => self.scroll(-1),
            _ => {}
        }
        false
    }

    fn handle_input_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.focus = Focus::None;
                self.draft.clear();
            }
            KeyCode::Enter => self.commit_input(),
            KeyCode::Backspace => {
                self.draft.pop();
                self.sync_live_filter();
            }
            KeyCode::Char(ch) => {
                self.draft.push(ch);
                self.sync_live_filter();
            }
            _ => {}
        }
    }

    // In immediate mode filter edits take effect while still typing.
    fn sync_live_filter(&mut self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        match self.focus {
            Focus::CodeFilter => state.session.edit_code_input(self.draft.clone()),
            Focus::NameFilter => state.session.edit_name_input(self.draft.clone()),
            _ => {}
        }
    }

    fn commit_input(&mut self) {
        let draft = std::mem::take(&mut self.draft);
        let focus = self.focus;
        self.focus = Focus::None;
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        match focus {
            Focus::Term => match draft.parse::<SearchTerm>() {
                Ok(term) => state.params.term = term,
                Err(err) => state.status = err.to_string(),
            },
            Focus::YearField => match draft.parse::<Year>() {
                Ok(year) => state.params.year = year,
                Err(err) => state.status = err.to_string(),
            },
            Focus::LimitField => match draft.parse::<Limit>() {
                Ok(limit) => state.params.limit = limit,
                Err(err) => state.status = err.to_string(),
            },
            Focus::CodeFilter => state.session.edit_code_input(draft),
            Focus::NameFilter => state.session.edit_name_input(draft),
            Focus::None => {}
        }
    }

    fn begin_edit(&mut self, focus: Focus) {
        if let Ok(state) = self.state.lock() {
            self.draft = match focus {
                Focus::Term => state.params.term.to_string(),
                Focus::YearField => state.params.year.to_string(),
                Focus::LimitField => state.params.limit.to_string(),
                Focus::CodeFilter => state.session.code_input.clone(),
                Focus::NameFilter => state.session.name_input.clone(),
                Focus::None => String::new(),
            };
        }
        self.focus = focus;
    }

    fn set_view(&mut self, view: View) {
        if let Ok(mut state) = self.state.lock() {
            state.view = view;
        }
    }

    fn scroll(&mut self, delta: isize) {
        let Ok(state) = self.state.lock() else { return };
        match state.view {
            View::Results => {
                let len = state.session.visible().len();
                if len == 0 {
                    return;
                }
                let current = self.table_state.selected().unwrap_or(0) as isize;
                let next = (current + delta).clamp(0, len as isize - 1) as usize;
                self.table_state.select(Some(next));
            }
            View::Errors => {
                let len = state
                    .session
                    .outcome
                    .as_ref()
                    .map(|o| o.errors.len())
                    .unwrap_or(0);
                if len == 0 {
                    return;
                }
                let current = self.error_scroll as isize;
                self.error_scroll = (current + delta).clamp(0, len as isize - 1) as usize;
            }
            View::Info => {}
        }
    }

    fn export_csv(&mut self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let term = state.params.term.clone();
        let year = state.params.year;
        let message = match state.view {
            View::Errors => {
                let Some(outcome) = &state.session.outcome else {
                    state.status = "nothing to export yet".to_string();
                    return;
                };
                let path = Utf8PathBuf::from(export::errors_csv_name(&term, year));
                export::error_csv_bytes(&outcome.errors)
                    .and_then(|bytes| export::write_bytes(&path, &bytes))
                    .map(|_| format!("saved {path}"))
            }
            _ => {
                let visible = state.session.visible();
                if visible.is_empty() {
                    state.status = "nothing to export yet".to_string();
                    return;
                }
                let path = Utf8PathBuf::from(export::disease_csv_name(&term, year));
                export::disease_csv_bytes(&visible)
                    .and_then(|bytes| export::write_bytes(&path, &bytes))
                    .map(|_| format!("saved {path}"))
            }
        };
        state.status = message.unwrap_or_else(|err| err.to_string());
    }

    // Spreadsheet export is best-effort: on failure fall back to CSV-only.
    fn export_xlsx(&mut self) {
        let Ok(mut state) = self.state.lock() else {
            return;
        };
        let visible = state.session.visible();
        if visible.is_empty() {
            state.status = "nothing to export yet".to_string();
            return;
        }
        let term = state.params.term.clone();
        let year = state.params.year;
        let xlsx_path = Utf8PathBuf::from(export::disease_xlsx_name(&term, year));
        let csv_path = Utf8PathBuf::from(export::disease_csv_name(&term, year));
        state.status = match export::write_spreadsheet_or_csv(&visible, &xlsx_path, &csv_path) {
            Ok(path) if path == xlsx_path => format!("saved {path}"),
            Ok(path) => format!("spreadsheet export unavailable, saved {path} instead"),
            Err(err) => err.to_string(),
        };
    }
}

fn draw_ui(
    frame: &mut ratatui::Frame,
    state: &AppState,
    focus: Focus,
    draft: &str,
    table_state: &mut TableState,
    error_scroll: usize,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(2),
        ])
        .split(frame.area());

    draw_header(frame, state, chunks[0]);
    draw_controls(frame, state, chunks[1]);
    match state.view {
        View::Results => draw_results(frame, state, chunks[2], table_state),
        View::Errors => draw_errors(frame, state, chunks[2], error_scroll),
        View::Info => draw_info(frame, state, chunks[2]),
    }
    draw_footer(frame, state, focus, draft, chunks[3]);
}

fn draw_header(frame: &mut ratatui::Frame, state: &AppState, area: Rect) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(25),
            Constraint::Percentage(35),
        ])
        .split(area);

    let record_count = state
        .session
        .outcome
        .as_ref()
        .map(|outcome| outcome.diseases.len())
        .unwrap_or(0);

    let card = |title: &'static str, value: String| {
        Paragraph::new(Line::from(Span::styled(
            value,
            Style::default().add_modifier(Modifier::BOLD),
        )))
        .block(Block::default().title(title).borders(Borders::ALL))
    };
    frame.render_widget(
        card("benefit", format!("\"{}\"", state.params.term)),
        cards[0],
    );
    frame.render_widget(card("year", state.params.year.to_string()), cards[1]);
    frame.render_widget(
        card("ICD-10 records", record_count.to_string()),
        cards[2],
    );
}

fn draw_controls(frame: &mut ratatui::Frame, state: &AppState, area: Rect) {
    let controls = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(34), Constraint::Min(20)])
        .split(area);

    let tabs = Tabs::new(vec![
        Line::from("1 Results"),
        Line::from("2 Errors"),
        Line::from("3 Info"),
    ])
    .select(state.view.index())
    .block(Block::default().title("Tabs").borders(Borders::ALL))
    .highlight_style(
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    );
    frame.render_widget(tabs, controls[0]);

    let (ratio, label) = match &state.progress {
        Some((fraction, message)) if state.running => {
            (fraction.unwrap_or(0.0), message.clone())
        }
        _ => {
            if state.running {
                (0.0, "starting...".to_string())
            } else {
                (0.0, state.status.clone())
            }
        }
    };
    let gauge = Gauge::default()
        .block(Block::default().title("Progress").borders(Borders::ALL))
        .gauge_style(Style::default().fg(if state.running {
            Color::Cyan
        } else {
            Color::Green
        }))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label);
    frame.render_widget(gauge, controls[1]);
}

fn draw_results(
    frame: &mut ratatui::Frame,
    state: &AppState,
    area: Rect,
    table_state: &mut TableState,
) {
    let visible = state.session.visible();

    if state.session.outcome.is_none() || visible_source_empty(state) {
        let message = if state.session.outcome.is_none() {
            "No ICD-10 data yet - press r to run the query."
        } else {
            "The last run returned no ICD-10 rows - check the Errors tab."
        };
        let info = Paragraph::new(message)
            .block(Block::default().title("Results").borders(Borders::ALL))
            .wrap(Wrap { trim: true });
        frame.render_widget(info, area);
        return;
    }

    let rows_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(10),
        ])
        .split(area);

    draw_filter_banner(frame, state, rows_area[0]);
    draw_result_table(frame, state, &visible, rows_area[1], table_state);
    draw_charts(frame, state, &visible, rows_area[2]);
}

fn visible_source_empty(state: &AppState) -> bool {
    state
        .session
        .outcome
        .as_ref()
        .map(|outcome| outcome.diseases.is_empty())
        .unwrap_or(true)
}

fn draw_filter_banner(frame: &mut ratatui::Frame, state: &AppState, area: Rect) {
    let mut spans = vec![Span::styled(
        "Filters: ",
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if state.session.has_active_filters() {
        if !state.session.applied_code_filter().is_empty() {
            spans.push(Span::raw(format!(
                "code contains \"{}\"  ",
                state.session.applied_code_filter()
            )));
        }
        if !state.session.applied_name_filter().is_empty() {
            spans.push(Span::raw(format!(
                "name contains \"{}\"  ",
                state.session.applied_name_filter()
            )));
        }
    } else {
        spans.push(Span::raw("none - all records shown  "));
    }
    spans.push(Span::styled(
        format!("[{} mode]", state.session.filter_mode.label()),
        Style::default().fg(Color::DarkGray),
    ));
    let banner = Paragraph::new(Line::from(spans))
        .block(Block::default().title("Active filters").borders(Borders::ALL));
    frame.render_widget(banner, area);
}

fn draw_result_table(
    frame: &mut ratatui::Frame,
    state: &AppState,
    visible: &DiseaseTable,
    area: Rect,
    table_state: &mut TableState,
) {
    let metric = state.session.chart_metric.clone();
    let rows = visible.rows.iter().map(|row| {
        let metric_cell = metric
            .as_ref()
            .and_then(|name| row.metric(name))
            .map(|value| value.to_string())
            .unwrap_or_default();
        Row::new(vec![
            Cell::from(row.disease_code().unwrap_or_default()),
            Cell::from(row.disease_name().unwrap_or_default()),
            Cell::from(row.benefit_code.clone()),
            Cell::from(metric_cell),
        ])
    });
    let metric_header = metric.clone().unwrap_or_else(|| "metric".to_string());
    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Min(30),
            Constraint::Length(12),
            Constraint::Length(16),
        ],
    )
    .header(
        Row::new(vec!["disease-code", "disease-name", "benefit-code", metric_header.as_str()])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .row_highlight_style(Style::default().bg(Color::DarkGray))
    .block(
        Block::default()
            .title(format!("ICD-10 rows after filters: {}", visible.len()))
            .borders(Borders::ALL),
    )
    .column_spacing(1);
    frame.render_stateful_widget(table, area, table_state);
}

fn draw_charts(frame: &mut ratatui::Frame, state: &AppState, visible: &DiseaseTable, area: Rect) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let Some(metric) = state.session.chart_metric.clone() else {
        let info = Paragraph::new("No numeric columns in the data - charts unavailable.")
            .block(Block::default().title("Charts").borders(Borders::ALL));
        frame.render_widget(info, area);
        return;
    };

    render_bar_chart(
        frame,
        halves[0],
        format!("Top ICD-10 codes (sum: {metric})"),
        visible.sum_by_disease_code(&metric),
    );
    render_bar_chart(
        frame,
        halves[1],
        format!("Sum of {metric} by benefit"),
        visible.sum_by_benefit_code(&metric),
    );
}

fn render_bar_chart(
    frame: &mut ratatui::Frame,
    area: Rect,
    title: String,
    series: Vec<(String, f64)>,
) {
    if series.is_empty() {
        let info = Paragraph::new("No data to chart.")
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(info, area);
        return;
    }

    // The series is ascending; show the largest bars first in the limited width.
    let capacity = (area.width / (CHART_BAR_WIDTH + 1)).max(1) as usize;
    let bars: Vec<Bar> = series
        .iter()
        .rev()
        .take(capacity)
        .map(|(label, value)| {
            Bar::default()
                .value(value.round() as u64)
                .label(Line::from(label.clone()))
        })
        .collect();
    let chart = BarChart::default()
        .data(BarGroup::default().bars(&bars))
        .bar_width(CHART_BAR_WIDTH)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan))
        .value_style(Style::default().fg(Color::Black).bg(Color::Cyan))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(chart, area);
}

fn draw_errors(frame: &mut ratatui::Frame, state: &AppState, area: Rect, scroll: usize) {
    let Some(outcome) = &state.session.outcome else {
        let info = Paragraph::new("No errors (no query has been run in this session).")
            .block(Block::default().title("Errors").borders(Borders::ALL));
        frame.render_widget(info, area);
        return;
    };

    if outcome.errors.is_empty() {
        let info = Paragraph::new("No errors in the last run.")
            .block(Block::default().title("Errors").borders(Borders::ALL))
            .style(Style::default().fg(Color::Green));
        frame.render_widget(info, area);
        return;
    }

    let rows = outcome.errors.records.iter().skip(scroll).map(|record| {
        Row::new(vec![
            Cell::from(record.stage.label()).style(Style::default().fg(Color::Yellow)),
            Cell::from(record.item_id.clone().unwrap_or_default()),
            Cell::from(record.message.clone()),
        ])
    });
    let table = Table::new(
        rows,
        [
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Min(40),
        ],
    )
    .header(
        Row::new(vec!["etap", "kod/ID", "komunikat"])
            .style(Style::default().add_modifier(Modifier::BOLD)),
    )
    .block(
        Block::default()
            .title(format!("Errors during fetch: {}", outcome.errors.len()))
            .borders(Borders::ALL),
    )
    .column_spacing(1);
    frame.render_widget(table, area);
}

fn draw_info(frame: &mut ratatui::Frame, state: &AppState, area: Rect) {
    let runtime_line = match state.session.last_runtime {
        Some(runtime) => format!("last fetch took about {:.1} s", runtime.as_secs_f64()),
        None => "no data fetched yet in this session".to_string(),
    };
    let fetched_at = state
        .session
        .outcome
        .as_ref()
        .map(|outcome| outcome.fetched_at.clone())
        .unwrap_or_else(|| "-".to_string());
    let lines = vec![
        Line::from(Span::styled(
            "Query parameters",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("  benefit = \"{}\"", state.params.term)),
        Line::from(format!("  year    = {}", state.params.year)),
        Line::from(format!("  limit   = {}", state.params.limit)),
        Line::from(""),
        Line::from(Span::styled(
            "Timing",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("  {runtime_line}")),
        Line::from(format!("  fetched at: {fetched_at}")),
        Line::from(""),
        Line::from(
            "Queries go to the public NFZ JGP statistics API. With many benefits the \
             fetch can take a while; repeated runs with the same parameters are served \
             from the in-memory cache and issue no remote calls.",
        ),
    ];
    let info = Paragraph::new(lines)
        .block(Block::default().title("Info / Parameters").borders(Borders::ALL))
        .wrap(Wrap { trim: true });
    frame.render_widget(info, area);
}

fn draw_footer(
    frame: &mut ratatui::Frame,
    state: &AppState,
    focus: Focus,
    draft: &str,
    area: Rect,
) {
    let line = match focus {
        Focus::None => Line::from(vec![
            Span::styled("r", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" fetch  "),
            Span::styled("t/y/l", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" term/year/limit  "),
            Span::styled("/", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" code  "),
            Span::styled("n", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" name  "),
            Span::styled("a", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" apply  "),
            Span::styled("c", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" clear  "),
            Span::styled("d", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" mode  "),
            Span::styled("m", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" metric  "),
            Span::styled("e", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" csv  "),
            Span::styled("x", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" xlsx  "),
            Span::styled("q", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" quit"),
        ]),
        Focus::Term => input_line("benefit fragment", draft),
        Focus::YearField => input_line("year", draft),
        Focus::LimitField => input_line("limit", draft),
        Focus::CodeFilter => input_line("filter disease-code contains", draft),
        Focus::NameFilter => input_line("filter disease-name contains", draft),
    };
    let status = Line::from(Span::styled(
        state.status.clone(),
        Style::default().fg(Color::DarkGray),
    ));
    let footer = Paragraph::new(vec![status, line]);
    frame.render_widget(footer, area);
}

fn input_line(label: &str, draft: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(draft.to_string()),
        Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
        Span::styled(
            "  (Enter to confirm, Esc to cancel)",
            Style::default().fg(Color::DarkGray),
        ),
    ])
}
