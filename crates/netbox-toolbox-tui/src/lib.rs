// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use netbox_toolbox_app::{
    AppCommand, AppEvent, AppState, QueryKind, QueryOutcome, QueryPhase, QueryRequest,
    ResultTable,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap};
use std::io;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use tracing::debug;

const APP_TITLE: &str = "Netbox-Toolbox";
const QUESTION: &str = "What information would you like to see?";
const SPINNER_TEXT: &str =
    "Executing API calls and collecting responses. This may take a moment...";
const IDLE_HINT: &str = "press enter to run the selected query";
const PAGE_ROWS: usize = 20;
const MAX_COLUMN_WIDTH: usize = 48;
const STATUS_CLEAR_AFTER: Duration = Duration::from_secs(4);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// What the front end needs from the rest of the program: a way to run one
/// query and get back something renderable.
pub trait AppRuntime {
    fn run_query(&mut self, request: &QueryRequest) -> QueryOutcome;

    fn endpoint_label(&self) -> String {
        String::new()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InternalEvent {
    ClearStatus { token: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct ViewData {
    outcome: Option<QueryOutcome>,
    pending: Option<QueryRequest>,
    scroll: usize,
    status_token: u64,
    help_visible: bool,
    endpoint: String,
}

pub fn run_app<R: AppRuntime>(state: &mut AppState, runtime: &mut R) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, terminal::EnterAlternateScreen).context("enter alternate screen")?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;

    let mut view_data = ViewData {
        endpoint: runtime.endpoint_label(),
        ..ViewData::default()
    };
    let (internal_tx, internal_rx) = mpsc::channel();

    let result = event_loop(
        &mut terminal,
        state,
        runtime,
        &mut view_data,
        &internal_tx,
        &internal_rx,
    );

    disable_raw_mode().context("disable raw mode")?;
    execute!(io::stdout(), terminal::LeaveAlternateScreen).context("leave alternate screen")?;
    result
}

fn event_loop<R: AppRuntime>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    internal_rx: &Receiver<InternalEvent>,
) -> Result<()> {
    loop {
        process_internal_events(state, view_data, internal_rx);

        terminal
            .draw(|frame| render(frame, state, view_data))
            .context("draw frame")?;

        // The fetching frame is on screen; run the query now so the next
        // draw shows its outcome. Keys pressed meanwhile queue up in the
        // terminal and are handled afterwards.
        if let Some(request) = view_data.pending.take() {
            execute_pending(state, runtime, view_data, internal_tx, &request);
            continue;
        }

        if !event::poll(POLL_INTERVAL).context("poll event")? {
            continue;
        }
        if let Event::Key(key) = event::read().context("read event")?
            && key.kind != KeyEventKind::Release
            && handle_key_event(state, view_data, internal_tx, key)
        {
            return Ok(());
        }
    }
}

fn process_internal_events(
    state: &mut AppState,
    view_data: &ViewData,
    rx: &Receiver<InternalEvent>,
) {
    while let Ok(event) = rx.try_recv() {
        match event {
            InternalEvent::ClearStatus { token } if token == view_data.status_token => {
                state.dispatch(AppCommand::ClearStatus);
            }
            InternalEvent::ClearStatus { .. } => {}
        }
    }
}

fn execute_pending<R: AppRuntime>(
    state: &mut AppState,
    runtime: &mut R,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    request: &QueryRequest,
) {
    debug!(query = request.kind().label(), "dispatching query");
    let outcome = runtime.run_query(request);
    let status = outcome_status(&outcome);
    state.dispatch(AppCommand::FetchFinished);
    view_data.scroll = 0;
    view_data.outcome = Some(outcome);
    emit_status(state, view_data, internal_tx, status);
}

fn outcome_status(outcome: &QueryOutcome) -> String {
    match outcome {
        QueryOutcome::Rendered(table) => format!(
            "{} {}",
            table.row_count(),
            table.kind.label().to_lowercase()
        ),
        QueryOutcome::NotFound { .. } => "not found".to_owned(),
        QueryOutcome::Failed { .. } => "request failed".to_owned(),
    }
}

fn schedule_status_clear(internal_tx: &Sender<InternalEvent>, token: u64) {
    let sender = internal_tx.clone();
    thread::spawn(move || {
        thread::sleep(STATUS_CLEAR_AFTER);
        let _ = sender.send(InternalEvent::ClearStatus { token });
    });
}

fn emit_status(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    message: impl Into<String>,
) {
    state.dispatch(AppCommand::SetStatus(message.into()));
    view_data.status_token = view_data.status_token.saturating_add(1);
    schedule_status_clear(internal_tx, view_data.status_token);
}

/// Returns true when the app should exit.
fn handle_key_event(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    key: KeyEvent,
) -> bool {
    if key.modifiers.contains(KeyModifiers::CONTROL)
        && matches!(key.code, KeyCode::Char('q') | KeyCode::Char('c'))
    {
        return true;
    }

    if view_data.help_visible {
        if matches!(key.code, KeyCode::Esc | KeyCode::Char('?')) {
            view_data.help_visible = false;
        }
        return false;
    }

    if state.phase == QueryPhase::Prompting {
        let command = match key.code {
            KeyCode::Enter => AppCommand::Submit,
            KeyCode::Esc => AppCommand::CancelInput,
            KeyCode::Backspace => AppCommand::InputBackspace,
            KeyCode::Char(ch) => AppCommand::InputChar(ch),
            _ => return false,
        };
        dispatch(state, view_data, internal_tx, command);
        return false;
    }

    match key.code {
        KeyCode::Char('q') => return true,
        KeyCode::Char('?') => view_data.help_visible = true,
        KeyCode::Char('j') | KeyCode::Down => {
            dispatch(state, view_data, internal_tx, AppCommand::SelectNext);
        }
        KeyCode::Char('k') | KeyCode::Up => {
            dispatch(state, view_data, internal_tx, AppCommand::SelectPrev);
        }
        KeyCode::Enter => dispatch(state, view_data, internal_tx, AppCommand::Start),
        KeyCode::Esc => dispatch(state, view_data, internal_tx, AppCommand::Reset),
        KeyCode::PageDown => scroll_by(view_data, PAGE_ROWS as isize),
        KeyCode::PageUp => scroll_by(view_data, -(PAGE_ROWS as isize)),
        KeyCode::Home => view_data.scroll = 0,
        KeyCode::End => scroll_by(view_data, isize::MAX),
        _ => {}
    }
    false
}

fn dispatch(
    state: &mut AppState,
    view_data: &mut ViewData,
    internal_tx: &Sender<InternalEvent>,
    command: AppCommand,
) {
    for event in state.dispatch(command) {
        match event {
            AppEvent::FetchRequested(request) => {
                view_data.outcome = None;
                view_data.scroll = 0;
                view_data.pending = Some(request);
            }
            AppEvent::PhaseChanged(QueryPhase::Idle) => {
                view_data.outcome = None;
                view_data.scroll = 0;
            }
            AppEvent::StatusUpdated(_) => {
                view_data.status_token = view_data.status_token.saturating_add(1);
                schedule_status_clear(internal_tx, view_data.status_token);
            }
            AppEvent::SelectionChanged(_)
            | AppEvent::PhaseChanged(_)
            | AppEvent::InputChanged(_)
            | AppEvent::StatusCleared => {}
        }
    }
}

fn scroll_by(view_data: &mut ViewData, delta: isize) {
    let Some(table) = view_data.outcome.as_ref().and_then(QueryOutcome::table) else {
        return;
    };
    let max = table.row_count().saturating_sub(1);
    let next = if delta.is_negative() {
        view_data.scroll.saturating_sub(delta.unsigned_abs())
    } else {
        view_data.scroll.saturating_add(delta.unsigned_abs())
    };
    view_data.scroll = next.min(max);
}

fn render(frame: &mut ratatui::Frame<'_>, state: &AppState, view_data: &ViewData) {
    let layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(QueryKind::ALL.len() as u16 + 3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let title = if view_data.endpoint.is_empty() {
        APP_TITLE.to_owned()
    } else {
        format!("{APP_TITLE} · {}", view_data.endpoint)
    };
    let selection = Paragraph::new(render_selection_text(state))
        .block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(selection, layout[0]);

    let prompt_title = state
        .selected
        .parameter()
        .map(|parameter| parameter.label())
        .unwrap_or("parameter");
    let prompt_style = if state.phase == QueryPhase::Prompting {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };
    let prompt = Paragraph::new(render_prompt_text(state))
        .style(prompt_style)
        .block(Block::default().title(prompt_title).borders(Borders::ALL));
    frame.render_widget(prompt, layout[1]);

    match (&view_data.outcome, state.phase) {
        (Some(QueryOutcome::Rendered(table)), _) => {
            render_table(frame, layout[2], table, view_data.scroll);
        }
        (outcome, phase) => {
            let body = Paragraph::new(body_text(phase, outcome.as_ref()))
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .title(state.selected.record_kind().label())
                        .borders(Borders::ALL),
                );
            frame.render_widget(body, layout[2]);
        }
    }

    let status = Paragraph::new(status_text(state))
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(status, layout[3]);

    if view_data.help_visible {
        let area = centered_rect(60, 50, frame.area());
        frame.render_widget(Clear, area);
        let help = Paragraph::new(help_overlay_text())
            .block(Block::default().title("help").borders(Borders::ALL));
        frame.render_widget(help, area);
    }
}

fn render_selection_text(state: &AppState) -> String {
    let mut lines = vec![QUESTION.to_owned()];
    for kind in QueryKind::ALL {
        let marker = if kind == state.selected { ">" } else { " " };
        lines.push(format!("{marker} {}", kind.label()));
    }
    lines.join("\n")
}

fn render_prompt_text(state: &AppState) -> String {
    match (state.phase, state.selected.parameter()) {
        (QueryPhase::Prompting, Some(parameter)) if state.input.is_empty() => {
            format!("{}_", parameter.placeholder())
        }
        (QueryPhase::Prompting, Some(_)) => format!("Querying: {}_", state.input),
        (_, Some(_)) if !state.input.is_empty() => format!("Querying: {}", state.input),
        (_, Some(parameter)) => format!("press enter to enter a {}", parameter.label()),
        (_, None) => "no parameter needed".to_owned(),
    }
}

fn body_text(phase: QueryPhase, outcome: Option<&QueryOutcome>) -> String {
    if phase == QueryPhase::Fetching {
        return SPINNER_TEXT.to_owned();
    }
    match outcome.and_then(QueryOutcome::message) {
        Some(message) => message.to_owned(),
        None => IDLE_HINT.to_owned(),
    }
}

fn render_table(frame: &mut ratatui::Frame<'_>, area: Rect, table: &ResultTable, scroll: usize) {
    let widths = column_widths(table)
        .into_iter()
        .map(|width| Constraint::Length(width as u16))
        .collect::<Vec<_>>();

    let header = Row::new(table.columns.iter().map(|column| {
        Cell::from(column.as_str()).style(
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
    }));

    let rows = table
        .rows
        .iter()
        .skip(scroll)
        .map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.as_str()))));

    let widget = Table::new(rows, widths)
        .header(header)
        .column_spacing(2)
        .block(
            Block::default()
                .title(table_title(table, scroll))
                .borders(Borders::ALL),
        );
    frame.render_widget(widget, area);
}

fn column_widths(table: &ResultTable) -> Vec<usize> {
    table
        .columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            table
                .rows
                .iter()
                .filter_map(|row| row.get(index))
                .map(|cell| cell.chars().count())
                .chain(std::iter::once(column.chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect()
}

fn table_title(table: &ResultTable, scroll: usize) -> String {
    let total = table.row_count();
    if total == 0 {
        return format!("{} (no rows)", table.kind.label());
    }
    if scroll == 0 {
        return format!("{} ({total})", table.kind.label());
    }
    format!("{} ({total}, from row {})", table.kind.label(), scroll + 1)
}

fn status_text(state: &AppState) -> String {
    let phase = match state.phase {
        QueryPhase::Idle => "IDLE",
        QueryPhase::Prompting => "INPUT",
        QueryPhase::Fetching => "FETCHING",
        QueryPhase::Rendered => "RESULT",
    };
    let keys = match state.phase {
        QueryPhase::Prompting => "enter submit | esc cancel",
        QueryPhase::Fetching => "waiting for response",
        QueryPhase::Idle | QueryPhase::Rendered => {
            "j/k select | enter start | esc clear | pgup/pgdn scroll | ? help | q quit"
        }
    };
    match &state.status_line {
        Some(status) => format!("{phase} | {status} | {keys}"),
        None => format!("{phase} | {keys}"),
    }
}

fn help_overlay_text() -> &'static str {
    "j / down      next query\n\
     k / up        previous query\n\
     enter         start the selected query (or submit the parameter)\n\
     esc           cancel input / clear results\n\
     pgup / pgdn   scroll results\n\
     home / end    first / last row\n\
     ?             toggle this help\n\
     q / ctrl+q    quit"
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
