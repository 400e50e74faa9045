use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Padding, Paragraph};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus, NoticeKind};
use crate::text_layout::{input_viewport, truncate_with_ellipsis};
use crate::theme::Theme;
use crate::todo::{Filter, Todo};

const HEADER_HEIGHT: u16 = 3;
const INPUT_HEIGHT: u16 = 3;
const FILTER_BAR_HEIGHT: u16 = 1;
const STATUS_HEIGHT: u16 = 2;
const TEXT_PADDING: u16 = 1;
const SPINNER_FRAMES: [&str; 4] = ["|", "/", "-", "\\"];
const APP_TITLE: &str = "Gemini Todo";
const APP_SUBTITLE: &str = "Tasks kept in Supabase, tidied up by Gemini";
const INPUT_PLACEHOLDER: &str = "What needs doing? AI will analyze it for you.";
const AI_PROCESSING_TEXT: &str = "AI is analyzing your task...";
const EMPTY_LIST_TEXT: &str = "No items.";
const INPUT_HELP_TEXT: &str =
    "Enter add | Tab list | Ctrl+F filter | Ctrl+R refresh | Esc quit";
const LIST_HELP_TEXT: &str =
    "Space/Enter toggle | d delete | 1/2/3 filter | Tab input | Esc quit";

struct Areas {
    header: Rect,
    input: Rect,
    filter_bar: Rect,
    list: Rect,
    status: Rect,
}

fn layout(screen: Rect) -> Areas {
    let [header, input, _gap, filter_bar, list, status] = Layout::vertical([
        Constraint::Length(HEADER_HEIGHT),
        Constraint::Length(INPUT_HEIGHT),
        Constraint::Length(1),
        Constraint::Length(FILTER_BAR_HEIGHT),
        Constraint::Min(0),
        Constraint::Length(STATUS_HEIGHT),
    ])
    .areas(screen);
    Areas {
        header,
        input,
        filter_bar,
        list,
        status,
    }
}

pub fn render(frame: &mut Frame, app: &App, theme: &Theme) {
    let areas = layout(frame.area());
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background)),
        frame.area(),
    );
    render_header(frame, areas.header, theme);
    render_input(frame, areas.input, app, theme);
    render_filter_bar(frame, areas.filter_bar, app, theme);
    render_list(frame, areas.list, app, theme);
    render_status(frame, areas.status, app, theme);
}

fn render_header(frame: &mut Frame, area: Rect, theme: &Theme) {
    let lines = vec![
        Line::from(Span::styled(
            APP_TITLE,
            Style::default()
                .fg(theme.text_fg)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(APP_SUBTITLE, Style::default().fg(theme.muted_fg))),
    ];
    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().style(Style::default().bg(theme.background))),
        area,
    );
}

fn render_input(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let active = app.focus == Focus::Input;
    let block = Block::default()
        .style(Style::default().bg(theme.input_bg))
        .padding(Padding::uniform(TEXT_PADDING));
    let inner = block.inner(area);

    let line = if app.is_ai_processing() {
        Line::from(vec![
            Span::styled(
                format!("{} ", spinner_frame(app.ticks)),
                Style::default().fg(theme.accent),
            ),
            Span::styled(AI_PROCESSING_TEXT, Style::default().fg(theme.accent)),
        ])
    } else if app.input().is_empty() {
        Line::from(Span::styled(
            INPUT_PLACEHOLDER,
            Style::default().fg(theme.muted_fg),
        ))
    } else {
        let view = input_viewport(app.input(), app.cursor(), inner.width);
        Line::from(Span::styled(view.visible, Style::default().fg(theme.text_fg)))
    };
    frame.render_widget(Paragraph::new(line).block(block), area);

    if active && !app.is_ai_processing() && inner.width > 0 && inner.height > 0 {
        let view = input_viewport(app.input(), app.cursor(), inner.width);
        frame.set_cursor_position(Position::new(inner.x + view.cursor_col, inner.y));
    }
}

fn render_filter_bar(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let mut spans = Vec::new();
    for (idx, filter) in Filter::ALL.into_iter().enumerate() {
        let style = if filter == app.filter() {
            Style::default()
                .bg(theme.accent)
                .fg(theme.text_fg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.muted_fg)
        };
        spans.push(Span::styled(format!(" {} {} ", idx + 1, filter.label()), style));
        spans.push(Span::raw(" "));
    }
    let count = Span::styled(
        format!("{} items", app.filtered_count()),
        Style::default().fg(theme.muted_fg),
    );
    let [filters_area, count_area] =
        Layout::horizontal([Constraint::Min(0), Constraint::Length(12)]).areas(area);
    frame.render_widget(
        Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.panel_bg)),
        filters_area,
    );
    frame.render_widget(
        Paragraph::new(Line::from(count))
            .alignment(Alignment::Right)
            .style(Style::default().bg(theme.panel_bg)),
        count_area,
    );
}

fn render_list(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let block = Block::default()
        .style(Style::default().bg(theme.panel_bg))
        .padding(Padding::uniform(TEXT_PADDING));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    if inner.height == 0 || inner.width == 0 {
        return;
    }

    if app.is_loading() {
        let text = format!("{} Loading...", spinner_frame(app.ticks));
        frame.render_widget(
            Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(theme.accent)),
            inner,
        );
        return;
    }

    let todos = app.filtered_todos();
    if todos.is_empty() {
        frame.render_widget(
            Paragraph::new(EMPTY_LIST_TEXT)
                .alignment(Alignment::Center)
                .style(Style::default().fg(theme.muted_fg)),
            inner,
        );
        return;
    }

    let visible = usize::from(inner.height);
    let offset = app.selected_index().saturating_sub(visible.saturating_sub(1));
    let lines: Vec<Line> = todos
        .iter()
        .enumerate()
        .skip(offset)
        .take(visible)
        .map(|(idx, todo)| {
            let selected = app.focus == Focus::List && idx == app.selected_index();
            todo_line(todo, selected, inner.width, theme)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn todo_line(todo: &Todo, selected: bool, width: u16, theme: &Theme) -> Line<'static> {
    let mark = if todo.is_completed { "[x] " } else { "[ ] " };
    let priority = format!(" {} ", todo.priority.as_str().to_ascii_uppercase());
    let category = format!(" {} ", todo.category);
    let reserved = mark.width() + priority.width() + category.width() + 2;
    let title_width = usize::from(width).saturating_sub(reserved).max(1);
    let title = truncate_with_ellipsis(&todo.title, title_width);

    let mark_style = if todo.is_completed {
        Style::default().fg(theme.done_fg)
    } else {
        Style::default().fg(theme.muted_fg)
    };
    let title_style = if todo.is_completed {
        Style::default()
            .fg(theme.muted_fg)
            .add_modifier(Modifier::CROSSED_OUT)
    } else {
        Style::default().fg(theme.text_fg)
    };
    let mut line = Line::from(vec![
        Span::styled(mark, mark_style),
        Span::styled(title, title_style),
        Span::raw(" "),
        Span::styled(
            priority,
            Style::default()
                .fg(theme.priority_color(todo.priority))
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(category, Style::default().fg(theme.muted_fg)),
    ]);
    if selected {
        line = line.style(Style::default().bg(theme.input_bg));
    }
    line
}

fn render_status(frame: &mut Frame, area: Rect, app: &App, theme: &Theme) {
    let help = match app.focus {
        Focus::Input => INPUT_HELP_TEXT,
        Focus::List => LIST_HELP_TEXT,
    };
    let mut lines = vec![Line::from(Span::styled(
        help,
        Style::default().fg(theme.muted_fg),
    ))];
    if let Some(notice) = app.notice() {
        let color = match notice.kind {
            NoticeKind::Info => theme.accent,
            NoticeKind::Error => theme.priority_high,
        };
        lines.push(Line::from(Span::styled(
            notice.text.clone(),
            Style::default().fg(color),
        )));
    }
    frame.render_widget(
        Paragraph::new(lines).style(Style::default().bg(theme.status_bg)),
        area,
    );
}

fn spinner_frame(ticks: u64) -> &'static str {
    SPINNER_FRAMES[(ticks / 4 % SPINNER_FRAMES.len() as u64) as usize]
}
