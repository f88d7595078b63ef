use std::io;
use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Terminal;
use tracing::debug;

use confnotes_core::{
    init, reduce, render, ActionKind, BodyView, Config, DraftField, EditFormView, NoteItemView,
    NotesEvent, NotesState, NotesView, RatingTier, SummaryView, UiTheme, UserEvent,
};
use confnotes_exec::{EffectDispatcher, EffectExecutor};

use crate::CliError;

struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

pub fn run(config: &Config, executor: EffectExecutor) -> Result<(), CliError> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, crossterm::cursor::Hide)?;
    let _guard = TuiGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    run_app(&mut terminal, config, executor).map_err(CliError::from)
}

/// Cursor and look of the screen. Lives next to the reducer state, never in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct UiState {
    selected: usize,
    field: DraftField,
    theme: UiTheme,
}

impl UiState {
    fn new(theme: UiTheme) -> Self {
        Self {
            selected: 0,
            field: DraftField::Title,
            theme,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum KeyHandlerResult {
    Continue(Option<UserEvent>),
    Exit,
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    config: &Config,
    executor: EffectExecutor,
) -> io::Result<()> {
    let (tx, rx) = mpsc::channel::<NotesEvent>();
    let dispatcher = EffectDispatcher::new(executor, tx);
    let (mut state, initial) = init(config.behavior);
    let mut ui_state = UiState::new(config.ui.theme);
    let mut in_flight = 1_usize;
    dispatcher.dispatch(initial);

    loop {
        while let Ok(event) = rx.try_recv() {
            in_flight = in_flight.saturating_sub(1);
            reduce(&mut state, event);
        }

        let view = render(&state);
        clamp_selection(&mut ui_state, &view);
        terminal.draw(|f| ui(f, &view, &ui_state, in_flight))?;

        if !event::poll(Duration::from_millis(16))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        match handle_key_event(key, &mut ui_state, &view) {
            KeyHandlerResult::Exit => return Ok(()),
            KeyHandlerResult::Continue(None) => {}
            KeyHandlerResult::Continue(Some(event)) => {
                debug!(event = event.label(), "user event");
                if let Some(effect) = reduce(&mut state, event.into()) {
                    in_flight += 1;
                    dispatcher.dispatch(effect);
                }
            }
        }
    }
}

fn items(view: &NotesView) -> &[NoteItemView] {
    match &view.body {
        BodyView::Ready { items, .. } => items,
        _ => &[],
    }
}

fn open_form(view: &NotesView) -> Option<&EditFormView> {
    let BodyView::Ready {
        creation_form,
        items,
    } = &view.body
    else {
        return None;
    };
    creation_form.as_ref().or_else(|| {
        items.iter().find_map(|item| match item {
            NoteItemView::Editing(form) => Some(form),
            NoteItemView::Summary(_) => None,
        })
    })
}

fn selected_summary<'a>(view: &'a NotesView, ui_state: &UiState) -> Option<&'a SummaryView> {
    match items(view).get(ui_state.selected) {
        Some(NoteItemView::Summary(summary)) => Some(summary),
        _ => None,
    }
}

fn clamp_selection(ui_state: &mut UiState, view: &NotesView) {
    let len = items(view).len();
    ui_state.selected = ui_state.selected.min(len.saturating_sub(1));
}

fn handle_key_event(key: KeyEvent, ui_state: &mut UiState, view: &NotesView) -> KeyHandlerResult {
    if key.kind != KeyEventKind::Press {
        return KeyHandlerResult::Continue(None);
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return KeyHandlerResult::Exit;
    }
    match open_form(view) {
        Some(form) => handle_form_keys(key, ui_state, form),
        None => handle_list_keys(key, ui_state, view),
    }
}

fn handle_form_keys(key: KeyEvent, ui_state: &mut UiState, form: &EditFormView) -> KeyHandlerResult {
    let field = ui_state.field;
    let event = match key.code {
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(form.save.event.clone())
        }
        KeyCode::Esc => Some(form.cancel.event.clone()),
        KeyCode::Tab => {
            ui_state.field = field.next();
            None
        }
        KeyCode::BackTab => {
            ui_state.field = field.prev();
            None
        }
        KeyCode::Enter if field.is_multiline() => {
            Some(form.with_text(field, format!("{}\n", form.field_value(field))))
        }
        KeyCode::Enter => {
            ui_state.field = field.next();
            None
        }
        KeyCode::Char('+') | KeyCode::Right | KeyCode::Up if field == DraftField::Rating => {
            Some(form.with_rating_step(1))
        }
        KeyCode::Char('-') | KeyCode::Left | KeyCode::Down if field == DraftField::Rating => {
            Some(form.with_rating_step(-1))
        }
        KeyCode::Char(c) if field == DraftField::Rating && c.is_ascii_digit() => {
            // '0' stands for 10 so every rating is one key away.
            let value = if c == '0' { "10".to_string() } else { c.to_string() };
            Some(form.with_text(field, value))
        }
        KeyCode::Char(c) if field != DraftField::Rating => {
            let mut value = form.field_value(field);
            value.push(c);
            Some(form.with_text(field, value))
        }
        KeyCode::Backspace if field != DraftField::Rating => {
            let mut value = form.field_value(field);
            value.pop();
            Some(form.with_text(field, value))
        }
        _ => None,
    };
    KeyHandlerResult::Continue(event)
}

fn handle_list_keys(key: KeyEvent, ui_state: &mut UiState, view: &NotesView) -> KeyHandlerResult {
    let summary = selected_summary(view, ui_state);
    let confirming = summary.is_some_and(|summary| summary.confirming_delete);
    let summary_action =
        |kind: ActionKind| summary.and_then(|summary| summary.action(kind)).map(|a| a.event.clone());

    let event = match key.code {
        KeyCode::Char('q') => return KeyHandlerResult::Exit,
        KeyCode::Char('y') if confirming => summary_action(ActionKind::ConfirmDelete),
        KeyCode::Char('n') | KeyCode::Esc if confirming => summary_action(ActionKind::KeepNote),
        KeyCode::Char('n') => {
            let event = view.header.add_note.as_ref().map(|action| action.event.clone());
            if event.is_some() {
                ui_state.field = DraftField::Title;
            }
            event
        }
        KeyCode::Char('e') | KeyCode::Enter => {
            let event = summary_action(ActionKind::Edit);
            if event.is_some() {
                ui_state.field = DraftField::Title;
            }
            event
        }
        KeyCode::Char('d') | KeyCode::Delete => summary_action(ActionKind::Delete),
        KeyCode::Char('r') => match &view.body {
            BodyView::Failed { retry, .. } => Some(retry.event.clone()),
            _ => Some(UserEvent::ReloadNotes),
        },
        KeyCode::Char('x') => view.notice.as_ref().map(|notice| notice.dismiss.event.clone()),
        KeyCode::Char('t') => {
            ui_state.theme = ui_state.theme.next();
            None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            if ui_state.selected + 1 < items(view).len() {
                ui_state.selected += 1;
            }
            None
        }
        KeyCode::Up | KeyCode::Char('k') => {
            ui_state.selected = ui_state.selected.saturating_sub(1);
            None
        }
        _ => None,
    };
    KeyHandlerResult::Continue(event)
}

#[derive(Clone, Copy)]
struct UiPalette {
    accent: Color,
    success: Color,
    warning: Color,
    danger: Color,
    muted: Color,
    border: Color,
    selected_bg: Color,
}

fn palette_for(theme: UiTheme) -> UiPalette {
    match theme {
        UiTheme::Classic => UiPalette {
            accent: Color::Cyan,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
            muted: Color::DarkGray,
            border: Color::Gray,
            selected_bg: Color::DarkGray,
        },
        UiTheme::HighContrast => UiPalette {
            accent: Color::White,
            success: Color::LightGreen,
            warning: Color::LightYellow,
            danger: Color::LightRed,
            muted: Color::Gray,
            border: Color::White,
            selected_bg: Color::Blue,
        },
    }
}

fn tier_color(tier: RatingTier, palette: UiPalette) -> Color {
    match tier {
        RatingTier::High => palette.success,
        RatingTier::Medium => palette.warning,
        RatingTier::Low => palette.danger,
    }
}

fn ui(f: &mut ratatui::Frame, view: &NotesView, ui_state: &UiState, in_flight: usize) {
    let palette = palette_for(ui_state.theme);
    let notice_h = if view.notice.is_some() { 3 } else { 0 };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(3),        // Header
            Constraint::Length(notice_h), // Notice
            Constraint::Min(0),           // Notes
            Constraint::Length(1),        // Footer
        ])
        .split(f.area());

    render_header(f, chunks[0], view, ui_state, in_flight, palette);
    if let Some(notice) = &view.notice {
        let text = Line::from(vec![
            Span::styled(notice.message.clone(), Style::default().fg(palette.danger)),
            Span::styled("  [x] ", Style::default().fg(palette.accent)),
            Span::styled(notice.dismiss.label(), Style::default().fg(palette.muted)),
        ]);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(palette.danger));
        f.render_widget(Paragraph::new(text).block(block), chunks[1]);
    }
    render_body(f, chunks[2], view, ui_state, palette);
    render_footer(f, chunks[3], view, ui_state, palette);

    if let Some(form) = open_form(view) {
        render_form(f, form, ui_state, palette);
    }
}

fn render_header(
    f: &mut ratatui::Frame,
    area: Rect,
    view: &NotesView,
    ui_state: &UiState,
    in_flight: usize,
    palette: UiPalette,
) {
    let activity = if in_flight > 0 {
        format!("{in_flight} pending")
    } else {
        "idle".to_string()
    };
    let header_text = format!(
        "{} | {} notes | Theme:{} | {}",
        view.header.title,
        items(view).len(),
        ui_state.theme.label(),
        activity
    );
    let header = Paragraph::new(header_text)
        .style(Style::default().fg(palette.accent))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(palette.border)),
        );
    f.render_widget(header, area);
}

fn render_body(
    f: &mut ratatui::Frame,
    area: Rect,
    view: &NotesView,
    ui_state: &UiState,
    palette: UiPalette,
) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.border))
        .title("Notes");
    match &view.body {
        BodyView::Loading { placeholder } => {
            let p = Paragraph::new(*placeholder)
                .style(Style::default().fg(palette.muted))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(p, area);
        }
        BodyView::Failed { message, retry } => {
            let lines = vec![
                Line::from(Span::styled(
                    message.to_string(),
                    Style::default().fg(palette.danger),
                )),
                Line::from(vec![
                    Span::styled("[r] ", Style::default().fg(palette.accent)),
                    Span::styled(retry.label(), Style::default().fg(palette.muted)),
                ]),
            ];
            let p = Paragraph::new(lines)
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(block);
            f.render_widget(p, area);
        }
        BodyView::Ready { items, .. } if items.is_empty() => {
            let p = Paragraph::new("No notes yet. Press n to add one.")
                .style(Style::default().fg(palette.muted))
                .alignment(Alignment::Center)
                .block(block);
            f.render_widget(p, area);
        }
        BodyView::Ready { items, .. } => {
            let list_items: Vec<ListItem> = items
                .iter()
                .map(|item| ListItem::new(item_lines(item, palette)))
                .collect();
            let list = List::new(list_items)
                .block(block)
                .highlight_style(
                    Style::default()
                        .bg(palette.selected_bg)
                        .add_modifier(Modifier::BOLD),
                )
                .highlight_symbol("> ");
            let mut list_state = ListState::default().with_selected(Some(ui_state.selected));
            f.render_stateful_widget(list, area, &mut list_state);
        }
    }
}

fn item_lines(item: &NoteItemView, palette: UiPalette) -> Vec<Line<'static>> {
    let summary = match item {
        NoteItemView::Summary(summary) => summary,
        NoteItemView::Editing(form) => {
            return vec![Line::from(Span::styled(
                format!("{} (editing)", form.draft.title),
                Style::default().fg(palette.accent),
            ))];
        }
    };

    let mut lines = vec![Line::from(vec![
        Span::styled(
            format!("{:>2} ", summary.rating.value),
            Style::default()
                .fg(tier_color(summary.rating.tier, palette))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(summary.title.clone()),
        Span::styled(
            format!("  {}", summary.presenter),
            Style::default().fg(palette.muted),
        ),
    ])];
    if let Some(first) = summary.body.lines().next() {
        lines.push(Line::from(Span::styled(
            format!("   {first}"),
            Style::default().fg(palette.muted),
        )));
    }
    if summary.confirming_delete {
        lines.push(Line::from(vec![
            Span::styled("   Delete this note? ", Style::default().fg(palette.warning)),
            Span::styled("[y] ", Style::default().fg(palette.accent)),
            Span::raw(ActionKind::ConfirmDelete.label()),
            Span::styled("  [n] ", Style::default().fg(palette.accent)),
            Span::raw(ActionKind::KeepNote.label()),
        ]));
    }
    lines
}

fn render_form(f: &mut ratatui::Frame, form: &EditFormView, ui_state: &UiState, palette: UiPalette) {
    let area = centered_rect(60, 60, f.area());
    let title = if form.is_new() {
        "New note".to_string()
    } else {
        format!("Edit note {}", form.draft.id)
    };

    let mut lines = Vec::new();
    for field in DraftField::ALL {
        let focused = field == ui_state.field;
        let label_style = if focused {
            Style::default().fg(palette.accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(palette.muted)
        };
        lines.push(Line::from(Span::styled(field.label(), label_style)));
        if field == DraftField::Rating {
            let rating = form.draft.rating;
            lines.push(Line::from(vec![
                Span::raw("  < "),
                Span::styled(
                    rating.to_string(),
                    Style::default().fg(tier_color(RatingTier::for_rating(rating), palette)),
                ),
                Span::raw(" > "),
                Span::styled(
                    format!(
                        "({}-{})",
                        form.rating_choices.start(),
                        form.rating_choices.end()
                    ),
                    Style::default().fg(palette.muted),
                ),
            ]));
        } else {
            let value = form.field_value(field);
            let cursor = if focused { "_" } else { "" };
            let mut value_lines: Vec<&str> = value.split('\n').collect();
            let last = value_lines.pop().unwrap_or_default();
            for line in value_lines {
                lines.push(Line::from(format!("  {line}")));
            }
            lines.push(Line::from(format!("  {last}{cursor}")));
        }
    }
    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled("[Ctrl+S] ", Style::default().fg(palette.accent)),
        Span::raw(form.save.label()),
        Span::styled("  [Esc] ", Style::default().fg(palette.accent)),
        Span::raw(form.cancel.label()),
    ]));

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(palette.accent))
        .title(title);
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: false }),
        area,
    );
}

fn render_footer(
    f: &mut ratatui::Frame,
    area: Rect,
    view: &NotesView,
    ui_state: &UiState,
    palette: UiPalette,
) {
    let hints: &[(&str, &str)] = if open_form(view).is_some() {
        &[
            ("Tab", "next field"),
            ("+/-", "rating"),
            ("Ctrl+S", "save"),
            ("Esc", "cancel"),
        ]
    } else if selected_summary(view, ui_state).is_some_and(|s| s.confirming_delete) {
        &[("y", "confirm delete"), ("n", "keep")]
    } else {
        &[
            ("n", "new"),
            ("e", "edit"),
            ("d", "delete"),
            ("r", "reload"),
            ("x", "dismiss"),
            ("t", "theme"),
            ("q", "quit"),
        ]
    };
    let mut spans = Vec::new();
    for (key, label) in hints {
        spans.push(Span::styled(*key, Style::default().fg(palette.accent)));
        spans.push(Span::styled(
            format!(" {label}  "),
            Style::default().fg(palette.muted),
        ));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)).alignment(Alignment::Center),
        area,
    );
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
