use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEvent {
    Tick,
    Quit,
    SwitchFocus,
    Refresh,
    CycleFilter,
    MoveUp,
    MoveDown,
    CursorLeft,
    CursorRight,
    CursorHome,
    CursorEnd,
    InputChar(char),
    Backspace,
    Delete,
    Submit,
}

fn map_key_event(key_event: KeyEvent) -> AppEvent {
    if key_event.kind != KeyEventKind::Press {
        return AppEvent::Tick;
    }

    if key_event.modifiers.contains(KeyModifiers::CONTROL) {
        return match key_event.code {
            KeyCode::Char('c') => AppEvent::Quit,
            KeyCode::Char('r') => AppEvent::Refresh,
            KeyCode::Char('f') => AppEvent::CycleFilter,
            _ => AppEvent::Tick,
        };
    }

    match key_event.code {
        KeyCode::Esc => AppEvent::Quit,
        KeyCode::Tab | KeyCode::BackTab => AppEvent::SwitchFocus,
        KeyCode::Up => AppEvent::MoveUp,
        KeyCode::Down => AppEvent::MoveDown,
        KeyCode::Left => AppEvent::CursorLeft,
        KeyCode::Right => AppEvent::CursorRight,
        KeyCode::Home => AppEvent::CursorHome,
        KeyCode::End => AppEvent::CursorEnd,
        KeyCode::Backspace => AppEvent::Backspace,
        KeyCode::Delete => AppEvent::Delete,
        KeyCode::Enter => AppEvent::Submit,
        KeyCode::Char(c) => AppEvent::InputChar(c),
        _ => AppEvent::Tick,
    }
}

pub fn next_event() -> io::Result<AppEvent> {
    if event::poll(Duration::from_millis(16))?
        && let Event::Key(key_event) = event::read()?
    {
        return Ok(map_key_event(key_event));
    }
    Ok(AppEvent::Tick)
}
