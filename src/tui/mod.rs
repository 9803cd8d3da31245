use std::io;
use std::panic;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap};

use crate::core::{BreakdownEntry, ChartSlice, Charts, ClassifiedRecord, Readiness, StoredReport};
use crate::store::{ReportStore, group_by_company};

/// Browses saved reports. `initial` opens that report directly.
pub fn run(store: &dyn ReportStore, initial: Option<&str>, color: bool) -> Result<()> {
    let mut app = App::new(color, store.list()?);
    if let Some(id) = initial {
        let Some(idx) = app.entries.iter().position(|r| r.id == id) else {
            return Err(crate::exit::invalid_args(format!("report not found: {id}")));
        };
        app.history_state.select(Some(idx));
        app.open_selected();
    }

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;

    let mut tui = Tui {
        terminal: Terminal::new(CrosstermBackend::new(stdout))
            .context("failed to initialize terminal")?,
    };
    tui.terminal.clear().ok();

    let res = panic::catch_unwind(panic::AssertUnwindSafe(|| {
        run_app(&mut tui.terminal, store, &mut app)
    }));

    let _ = tui.terminal.show_cursor();
    let _ = disable_raw_mode();
    let mut stdout = io::stdout();
    let _ = execute!(stdout, LeaveAlternateScreen);

    match res {
        Ok(res) => res,
        Err(_) => Err(anyhow::anyhow!(
            "the dashboard panicked (terminal state has been restored)"
        )),
    }
}

struct Tui {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    History,
    Report,
    Error,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Overview = 0,
    Workstations = 1,
    Sites = 2,
}

impl Tab {
    fn next(self) -> Self {
        match self {
            Tab::Overview => Tab::Workstations,
            Tab::Workstations => Tab::Sites,
            Tab::Sites => Tab::Overview,
        }
    }

    fn prev(self) -> Self {
        match self {
            Tab::Overview => Tab::Sites,
            Tab::Workstations => Tab::Overview,
            Tab::Sites => Tab::Workstations,
        }
    }
}

struct OpenReport {
    report: StoredReport,
    charts: Charts,
}

impl OpenReport {
    fn new(report: StoredReport) -> Self {
        let agg = crate::aggregate::aggregate(&report.data);
        let charts = crate::export::charts(&agg);
        Self { report, charts }
    }
}

struct App {
    color: bool,
    screen: Screen,
    help_return_to: Screen,
    /// Reports in display order: grouped by company, newest first.
    entries: Vec<StoredReport>,
    history_state: ListState,
    open: Option<OpenReport>,
    tab: Tab,
    records_state: ListState,
    filter: String,
    filter_mode: bool,
    error: Option<String>,
}

impl App {
    fn new(color: bool, reports: Vec<StoredReport>) -> Self {
        let mut app = Self {
            color,
            screen: Screen::History,
            help_return_to: Screen::History,
            entries: Vec::new(),
            history_state: ListState::default(),
            open: None,
            tab: Tab::Overview,
            records_state: ListState::default(),
            filter: String::new(),
            filter_mode: false,
            error: None,
        };
        app.set_reports(reports);
        app
    }

    fn set_reports(&mut self, reports: Vec<StoredReport>) {
        self.entries = group_by_company(&reports)
            .into_iter()
            .flat_map(|g| g.reports)
            .collect();
        let len = self.entries.len();
        if len == 0 {
            self.history_state.select(None);
        } else {
            let sel = self.history_state.selected().unwrap_or(0).min(len - 1);
            self.history_state.select(Some(sel));
        }
    }

    fn open_selected(&mut self) {
        let Some(report) = self
            .history_state
            .selected()
            .and_then(|i| self.entries.get(i))
        else {
            return;
        };
        self.open = Some(OpenReport::new(report.clone()));
        self.screen = Screen::Report;
        self.tab = Tab::Overview;
        self.filter.clear();
        self.records_state.select(Some(0));
    }

    fn move_list_selection(state: &mut ListState, len: usize, delta: i32) {
        if len == 0 {
            state.select(None);
            return;
        }
        let selected = state.selected().unwrap_or(0) as i32;
        let next = (selected + delta).clamp(0, (len as i32).saturating_sub(1));
        state.select(Some(next as usize));
    }
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    store: &dyn ReportStore,
    app: &mut App,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);

    loop {
        terminal.draw(|f| draw(f, app)).context("failed to draw")?;

        if event::poll(tick_rate).context("failed to poll events")? {
            if let Event::Key(key) = event::read().context("failed to read event")? {
                if key.kind == KeyEventKind::Press && handle_key(app, store, key) {
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Returns true when the dashboard should exit.
fn handle_key(app: &mut App, store: &dyn ReportStore, key: KeyEvent) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    if app.filter_mode {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => {
                app.filter_mode = false;
                app.filter = app.filter.trim().to_string();
            }
            KeyCode::Backspace => {
                app.filter.pop();
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                app.filter.clear();
            }
            KeyCode::Char(c) => app.filter.push(c),
            _ => {}
        }
        app.records_state.select(Some(0));
        return false;
    }

    match app.screen {
        Screen::Help => {
            app.screen = app.help_return_to;
            return false;
        }
        Screen::Error => {
            app.error = None;
            app.screen = Screen::History;
            return false;
        }
        _ => {}
    }

    if key.code == KeyCode::Char('?') {
        app.help_return_to = app.screen;
        app.screen = Screen::Help;
        return false;
    }
    if key.code == KeyCode::Char('q') {
        return true;
    }

    match app.screen {
        Screen::History => match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                App::move_list_selection(&mut app.history_state, app.entries.len(), -1)
            }
            KeyCode::Down | KeyCode::Char('j') => {
                App::move_list_selection(&mut app.history_state, app.entries.len(), 1)
            }
            KeyCode::Enter => app.open_selected(),
            KeyCode::Char('r') => match store.list() {
                Ok(reports) => app.set_reports(reports),
                Err(err) => {
                    app.error = Some(format!("{err:#}"));
                    app.screen = Screen::Error;
                }
            },
            _ => {}
        },
        Screen::Report => match key.code {
            KeyCode::Tab => app.tab = app.tab.next(),
            KeyCode::BackTab => app.tab = app.tab.prev(),
            KeyCode::Char('b') | KeyCode::Esc => {
                app.screen = Screen::History;
                app.filter.clear();
            }
            KeyCode::Char('/') if app.tab == Tab::Workstations => app.filter_mode = true,
            KeyCode::Up | KeyCode::Char('k') if app.tab == Tab::Workstations => {
                let len = filtered_count(app);
                App::move_list_selection(&mut app.records_state, len, -1);
            }
            KeyCode::Down | KeyCode::Char('j') if app.tab == Tab::Workstations => {
                let len = filtered_count(app);
                App::move_list_selection(&mut app.records_state, len, 1);
            }
            _ => {}
        },
        Screen::Error | Screen::Help => {}
    }
    false
}

fn filtered_count(app: &App) -> usize {
    app.open
        .as_ref()
        .map(|o| filtered_record_indices(&o.report.data, &app.filter).len())
        .unwrap_or(0)
}

fn draw(f: &mut ratatui::Frame, app: &mut App) {
    let size = f.size();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(2),
        ])
        .split(size);

    draw_header(f, chunks[0], app);
    draw_footer(f, chunks[2], app);

    match app.screen {
        Screen::History => draw_history(f, chunks[1], app),
        Screen::Report => draw_report(f, chunks[1], app),
        Screen::Error => draw_error(f, chunks[1], app),
        Screen::Help => draw_help(f, chunks[1]),
    }
}

fn draw_header(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let title = match (app.screen, app.open.as_ref()) {
        (Screen::Report, Some(open)) => format!(
            "win11ready | {} ({})",
            open.report.company_info.name, open.report.timestamp
        ),
        (Screen::Error, _) => "win11ready | error".to_string(),
        (Screen::Help, _) => "win11ready | help".to_string(),
        _ => "win11ready | report history".to_string(),
    };
    let right = format!("v{}", env!("CARGO_PKG_VERSION"));

    let line = Line::from(vec![
        Span::styled(title, Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(" "),
        Span::styled(right, Style::default().fg(Color::DarkGray)),
    ]);

    let w = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
    f.render_widget(w, area);
}

fn draw_footer(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let line = if app.filter_mode {
        Line::from(vec![
            Span::styled("filter: ", Style::default().fg(Color::DarkGray)),
            Span::styled(
                format!("{}_", truncate_chars(&app.filter, 60)),
                Style::default().fg(Color::Yellow),
            ),
            Span::styled(
                "  Enter/Esc: done  Ctrl-U: clear",
                Style::default().fg(Color::DarkGray),
            ),
        ])
    } else {
        let hint = match app.screen {
            Screen::History => "↑↓/j/k: select  Enter: open  r: reload  ?: help  q: quit",
            Screen::Report => "Tab: switch view  ↑↓/j/k: select  /: filter  b: back  q: quit",
            Screen::Error | Screen::Help => "any key: back",
        };
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray)))
    };
    f.render_widget(Paragraph::new(line), area);
}

fn draw_history(f: &mut ratatui::Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let items: Vec<ListItem> = if app.entries.is_empty() {
        vec![ListItem::new(Line::from(
            "No saved reports. Run `win11ready process` first.",
        ))]
    } else {
        app.entries
            .iter()
            .map(|r| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        r.company_info.name.clone(),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                    Span::raw(" "),
                    Span::styled(r.timestamp.clone(), Style::default().fg(Color::DarkGray)),
                    Span::raw(format!(
                        "  {}/{} ready",
                        r.summary.compatible, r.summary.total
                    )),
                ]))
            })
            .collect()
    };

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Reports ({})", app.entries.len())),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, chunks[0], &mut app.history_state);

    let detail = app
        .history_state
        .selected()
        .and_then(|i| app.entries.get(i))
        .map(report_detail)
        .unwrap_or_else(|| Text::from("No report selected."));
    let w = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title("Summary"))
        .wrap(Wrap { trim: false });
    f.render_widget(w, chunks[1]);
}

fn report_detail(r: &StoredReport) -> Text<'static> {
    let s = &r.summary;
    let sb = &r.secure_boot_stats;
    let mut lines = vec![
        Line::from(Span::styled(
            r.company_info.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(format!("tenant: {}", r.company_info.tenant)),
    ];
    if !r.company_info.site.trim().is_empty() {
        lines.push(Line::from(format!("site: {}", r.company_info.site)));
    }
    lines.extend([
        Line::from(format!("id: {}", r.id)),
        Line::from(format!("saved: {}", r.timestamp)),
        Line::from(""),
        Line::from(format!("workstations: {}", s.total)),
        Line::from(format!(
            "ready: {} ({}%)",
            s.compatible, s.compatible_percentage
        )),
        Line::from(format!(
            "not ready: {} ({}%)",
            s.not_compatible, s.not_compatible_percentage
        )),
        Line::from(format!(
            "unsupported: {} ({}%)",
            s.unsupported, s.unsupported_percentage
        )),
        Line::from(format!("offline: {} ({}%)", s.offline, s.offline_percentage)),
        Line::from(""),
        Line::from(format!(
            "secure boot: {} enabled / {} disabled / {} not capable / {} offline",
            sb.capable_enabled, sb.capable_disabled, sb.not_capable, sb.offline
        )),
    ]);
    Text::from(lines)
}

fn draw_report(f: &mut ratatui::Frame, area: Rect, app: &mut App) {
    let Some(open) = app.open.as_ref() else {
        return;
    };
    let color = app.color;
    let filter = app.filter.as_str();
    let records_state = &mut app.records_state;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(1)])
        .split(area);

    let tabs = Tabs::new(["Overview", "Workstations", "Sites"])
        .select(app.tab as usize)
        .block(Block::default().borders(Borders::ALL).title("Report"))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, chunks[0]);

    match app.tab {
        Tab::Overview => draw_overview(f, chunks[1], &open.charts, color),
        Tab::Workstations => {
            draw_workstations(f, chunks[1], &open.report.data, filter, records_state, color)
        }
        Tab::Sites => draw_sites(f, chunks[1], &open.charts),
    }
}

fn draw_overview(f: &mut ratatui::Frame, area: Rect, charts: &Charts, color: bool) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(cols[0]);

    let bar_width = (left[0].width as usize).saturating_sub(32).max(4);
    let w = Paragraph::new(slice_lines(&charts.readiness, bar_width, color))
        .block(Block::default().borders(Borders::ALL).title("Windows 11 readiness"));
    f.render_widget(w, left[0]);
    let w = Paragraph::new(slice_lines(&charts.secure_boot, bar_width, color))
        .block(Block::default().borders(Borders::ALL).title("Secure Boot"));
    f.render_widget(w, left[1]);

    let mut lines = Vec::new();
    for (title, entries) in [
        ("OS versions", &charts.os_versions),
        ("CPU generations", &charts.cpu_generations),
        ("RAM sizes", &charts.ram_sizes),
    ] {
        if !lines.is_empty() {
            lines.push(Line::from(""));
        }
        lines.push(Line::from(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        lines.extend(breakdown_lines(entries));
    }
    let w = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Inventory"))
        .wrap(Wrap { trim: false });
    f.render_widget(w, cols[1]);
}

fn slice_lines(slices: &[ChartSlice], width: usize, color: bool) -> Text<'static> {
    let max = slices.iter().map(|s| s.value).max().unwrap_or(0);
    let lines: Vec<Line> = slices
        .iter()
        .map(|s| {
            let style = if color {
                hex_color(&s.color)
                    .map(|c| Style::default().fg(c))
                    .unwrap_or_default()
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::raw(format!("{:<22}", s.name)),
                Span::styled(bar(s.value, max, width), style),
                Span::raw(format!(" {}", s.value)),
            ])
        })
        .collect();
    Text::from(lines)
}

fn breakdown_lines(entries: &[BreakdownEntry]) -> Vec<Line<'static>> {
    let mut sorted: Vec<&BreakdownEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| std::cmp::Reverse(e.count));
    sorted
        .into_iter()
        .take(8)
        .map(|e| Line::from(format!("  {:>4}  {}", e.count, e.label)))
        .collect()
}

fn draw_workstations(
    f: &mut ratatui::Frame,
    area: Rect,
    records: &[ClassifiedRecord],
    filter: &str,
    state: &mut ListState,
    color: bool,
) {
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(area);

    let indices = filtered_record_indices(records, filter);
    App::move_list_selection(state, indices.len(), 0);

    let items: Vec<ListItem> = if indices.is_empty() {
        vec![ListItem::new(Line::from("No matching workstations."))]
    } else {
        indices
            .iter()
            .filter_map(|idx| records.get(*idx))
            .map(|r| {
                ListItem::new(Line::from(vec![
                    Span::styled(
                        format!("{:<12}", r.win11_ready.as_str()),
                        readiness_style(r.win11_ready, color),
                    ),
                    Span::raw(r.workstation.clone()),
                ]))
            })
            .collect()
    };

    let title = if filter.trim().is_empty() {
        format!("Workstations ({})", records.len())
    } else {
        format!("Workstations ({}/{})", indices.len(), records.len())
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(list, body[0], state);

    let detail = state
        .selected()
        .and_then(|sel| indices.get(sel))
        .and_then(|idx| records.get(*idx))
        .map(record_detail)
        .unwrap_or_else(|| Text::from("No workstation selected."));
    let w = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title("Details"))
        .wrap(Wrap { trim: false });
    f.render_widget(w, body[1]);
}

fn record_detail(r: &ClassifiedRecord) -> Text<'static> {
    let columns = crate::export::EXPORT_COLUMNS;
    let values = crate::export::export_row(r);
    let lines: Vec<Line> = columns
        .iter()
        .zip(values)
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(format!("{k:<18}"), Style::default().fg(Color::DarkGray)),
                Span::raw(v),
            ])
        })
        .collect();
    Text::from(lines)
}

fn draw_sites(f: &mut ratatui::Frame, area: Rect, charts: &Charts) {
    let mut lines = vec![Line::from(Span::styled(
        format!(
            "{:<24} {:>6} {:>6} {:>10} {:>12} {:>8}",
            "SITE", "TOTAL", "READY", "NOT READY", "UNSUPPORTED", "OFFLINE"
        ),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for s in &charts.site_breakdown {
        lines.push(Line::from(format!(
            "{:<24} {:>6} {:>6} {:>10} {:>12} {:>8}",
            truncate_chars(&s.site, 23),
            s.total,
            s.compatible,
            s.not_compatible,
            s.unsupported,
            s.offline
        )));
    }
    let w = Paragraph::new(Text::from(lines))
        .block(Block::default().borders(Borders::ALL).title("Sites"));
    f.render_widget(w, area);
}

fn draw_error(f: &mut ratatui::Frame, area: Rect, app: &App) {
    let msg = app.error.as_deref().unwrap_or("unknown error").to_string();
    let w = Paragraph::new(msg)
        .block(Block::default().borders(Borders::ALL).title("Error"))
        .wrap(Wrap { trim: false });
    f.render_widget(w, area);
}

fn draw_help(f: &mut ratatui::Frame, area: Rect) {
    let text = Text::from(vec![
        Line::from(Span::styled(
            "win11ready dashboard",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("History:"),
        Line::from("  ↑↓ / j/k : select a report"),
        Line::from("  Enter    : open"),
        Line::from("  r        : reload from the history file"),
        Line::from(""),
        Line::from("Report:"),
        Line::from("  Tab / Shift-Tab : switch view"),
        Line::from("  ↑↓ / j/k        : select a workstation"),
        Line::from("  /               : filter workstations"),
        Line::from("  b / Esc         : back to history"),
        Line::from(""),
        Line::from("Anywhere: q quits, Ctrl-C quits immediately."),
    ]);
    let w = Paragraph::new(text)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: false });
    f.render_widget(w, centered_rect(70, 70, area));
}

fn readiness_style(readiness: Readiness, enabled: bool) -> Style {
    if !enabled {
        return Style::default();
    }
    match readiness {
        Readiness::Pass => Style::default().fg(Color::Green),
        Readiness::Fail => Style::default().fg(Color::Red),
        Readiness::Unsupported => Style::default().fg(Color::Yellow),
        Readiness::Offline | Readiness::Unknown => Style::default().fg(Color::DarkGray),
    }
}

fn hex_color(hex: &str) -> Option<Color> {
    let hex = hex.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn bar(value: u64, max: u64, width: usize) -> String {
    if max == 0 || value == 0 {
        return String::new();
    }
    let filled = ((value as u128 * width as u128).div_ceil(max as u128)) as usize;
    "█".repeat(filled.min(width))
}

fn filter_tokens(input: &str) -> Vec<String> {
    input
        .split_whitespace()
        .map(|s| s.to_lowercase())
        .collect()
}

fn matches_filter(haystack: &str, tokens: &[String]) -> bool {
    if tokens.is_empty() {
        return true;
    }
    let hay = haystack.to_lowercase();
    tokens.iter().all(|t| hay.contains(t))
}

fn filtered_record_indices(records: &[ClassifiedRecord], filter: &str) -> Vec<usize> {
    let tokens = filter_tokens(filter);
    records
        .iter()
        .enumerate()
        .filter(|(_, r)| {
            let hay = format!(
                "{} {} {} {} {}",
                r.workstation, r.friendly_name, r.site, r.win11_ready, r.cpu
            );
            matches_filter(&hay, &tokens)
        })
        .map(|(i, _)| i)
        .collect()
}

fn truncate_chars(input: &str, max_chars: usize) -> String {
    let mut s = String::new();
    for (i, ch) in input.chars().enumerate() {
        if i >= max_chars {
            s.push('…');
            break;
        }
        s.push(ch);
    }
    s
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{
        CompanyInfo, InventoryRow, ParsedDiagnostics, ReportSummary, SecureBootStats,
    };
    use std::cell::RefCell;

    struct MemoryStore {
        reports: RefCell<Vec<StoredReport>>,
    }

    impl ReportStore for MemoryStore {
        fn list(&self) -> Result<Vec<StoredReport>> {
            Ok(self.reports.borrow().clone())
        }

        fn append(&self, report: StoredReport) -> Result<()> {
            self.reports.borrow_mut().insert(0, report);
            Ok(())
        }

        fn delete(&self, id: &str) -> Result<bool> {
            let mut reports = self.reports.borrow_mut();
            let before = reports.len();
            reports.retain(|r| r.id != id);
            Ok(reports.len() != before)
        }
    }

    fn record(name: &str, readiness: Readiness) -> ClassifiedRecord {
        let row = InventoryRow {
            machine_name: name.to_string(),
            site: "HQ".to_string(),
            ..InventoryRow::default()
        };
        let mut diag = ParsedDiagnostics::unknown();
        diag.win11_ready = readiness;
        ClassifiedRecord::from_inventory(&row, diag)
    }

    fn stored(id: &str, company: &str, timestamp: &str) -> StoredReport {
        StoredReport {
            id: id.to_string(),
            timestamp: timestamp.to_string(),
            company_info: CompanyInfo {
                name: company.to_string(),
                site: String::new(),
                tenant: "t".to_string(),
            },
            summary: ReportSummary::default(),
            secure_boot_stats: SecureBootStats::default(),
            data: vec![
                record("WS-01", Readiness::Pass),
                record("LAPTOP-7", Readiness::Fail),
            ],
        }
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn history_is_grouped_by_company() {
        let app = App::new(
            false,
            vec![
                stored("a", "Acme", "2026-01-01T00:00:00Z"),
                stored("g", "Globex", "2026-02-01T00:00:00Z"),
                stored("b", "Acme", "2026-01-15T00:00:00Z"),
            ],
        );
        let ids: Vec<&str> = app.entries.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["g", "b", "a"]);
        assert_eq!(app.history_state.selected(), Some(0));
    }

    #[test]
    fn navigation_opens_reports_and_returns() {
        let store = MemoryStore {
            reports: RefCell::new(vec![
                stored("a", "Acme", "2026-01-01T00:00:00Z"),
                stored("b", "Acme", "2026-01-02T00:00:00Z"),
            ]),
        };
        let mut app = App::new(false, store.list().expect("list"));

        assert!(!handle_key(&mut app, &store, key(KeyCode::Down)));
        assert!(!handle_key(&mut app, &store, key(KeyCode::Enter)));
        assert_eq!(app.screen, Screen::Report);
        assert_eq!(app.open.as_ref().map(|o| o.report.id.as_str()), Some("a"));

        handle_key(&mut app, &store, key(KeyCode::Tab));
        assert_eq!(app.tab, Tab::Workstations);
        handle_key(&mut app, &store, key(KeyCode::Char('/')));
        for c in "laptop".chars() {
            handle_key(&mut app, &store, key(KeyCode::Char(c)));
        }
        handle_key(&mut app, &store, key(KeyCode::Enter));
        assert_eq!(app.filter, "laptop");
        assert_eq!(filtered_count(&app), 1);

        handle_key(&mut app, &store, key(KeyCode::Char('b')));
        assert_eq!(app.screen, Screen::History);
        assert!(app.filter.is_empty());

        store.delete("b").expect("delete");
        handle_key(&mut app, &store, key(KeyCode::Char('r')));
        assert_eq!(app.entries.len(), 1);
        assert_eq!(app.history_state.selected(), Some(0));

        assert!(handle_key(&mut app, &store, key(KeyCode::Char('q'))));
    }

    #[test]
    fn help_returns_to_previous_screen() {
        let store = MemoryStore {
            reports: RefCell::new(Vec::new()),
        };
        let mut app = App::new(false, Vec::new());
        handle_key(&mut app, &store, key(KeyCode::Char('?')));
        assert_eq!(app.screen, Screen::Help);
        assert!(!handle_key(&mut app, &store, key(KeyCode::Char('q'))));
        assert_eq!(app.screen, Screen::History);
        handle_key(&mut app, &store, key(KeyCode::Enter));
        assert!(app.open.is_none());
    }

    #[test]
    fn chart_helpers() {
        assert_eq!(hex_color("#4CAF50"), Some(Color::Rgb(0x4C, 0xAF, 0x50)));
        assert_eq!(hex_color("4CAF50"), None);
        assert_eq!(hex_color("#ZZZZZZ"), None);
        assert_eq!(bar(0, 10, 20), "");
        assert_eq!(bar(10, 10, 20).chars().count(), 20);
        assert_eq!(bar(1, 3, 10).chars().count(), 4);
        assert_eq!(truncate_chars("Headquarters", 4), "Head…");
    }
}
