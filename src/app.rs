use tracing::error;

use crate::text_layout::char_to_byte_idx;
use crate::todo::{Filter, Todo};
use crate::worker::{TodoAction, TodoEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

#[derive(Debug)]
pub struct App {
    pub running: bool,
    pub ticks: u64,
    pub focus: Focus,
    todos: Vec<Todo>,
    filter: Filter,
    selected: usize,
    input: String,
    cursor: usize,
    is_loading: bool,
    is_ai_processing: bool,
    is_saving: bool,
    notice: Option<Notice>,
}

impl Default for App {
    fn default() -> Self {
        Self {
            running: true,
            ticks: 0,
            focus: Focus::Input,
            todos: Vec::new(),
            filter: Filter::All,
            selected: 0,
            input: String::new(),
            cursor: 0,
            is_loading: false,
            is_ai_processing: false,
            is_saving: false,
            notice: None,
        }
    }
}

impl App {
    pub fn with_filter(filter: Filter) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    pub fn on_tick(&mut self) {
        self.ticks = self.ticks.saturating_add(1);
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Input => Focus::List,
            Focus::List => Focus::Input,
        };
    }

    #[cfg(test)]
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    pub fn filter(&self) -> Filter {
        self.filter
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn is_ai_processing(&self) -> bool {
        self.is_ai_processing
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn set_notice(&mut self, kind: NoticeKind, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            text: text.into(),
        });
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    pub fn filtered_todos(&self) -> Vec<&Todo> {
        self.todos
            .iter()
            .filter(|todo| self.filter.matches(todo))
            .collect()
    }

    pub fn filtered_count(&self) -> usize {
        self.todos
            .iter()
            .filter(|todo| self.filter.matches(todo))
            .count()
    }

    pub fn selected_todo(&self) -> Option<&Todo> {
        self.filtered_todos().get(self.selected).copied()
    }

    pub fn set_filter(&mut self, filter: Filter) {
        self.filter = filter;
        self.selected = 0;
    }

    pub fn cycle_filter(&mut self) {
        self.set_filter(self.filter.next());
    }

    pub fn select_next(&mut self) {
        let count = self.filtered_count();
        if count > 0 {
            self.selected = (self.selected + 1).min(count - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn begin_fetch(&mut self) {
        self.is_loading = true;
    }

    /// Returns the trimmed input to send for enhancement, or `None` when the
    /// input is blank or a previous add has not finished. The input stays in
    /// place until the insert succeeds.
    pub fn submit_input(&mut self) -> Option<String> {
        if self.is_ai_processing || self.is_saving {
            return None;
        }
        let text = self.input.trim();
        if text.is_empty() {
            return None;
        }
        let text = text.to_string();
        self.is_ai_processing = true;
        self.is_saving = true;
        self.clear_notice();
        Some(text)
    }

    pub fn apply_event(&mut self, event: TodoEvent) {
        match event {
            TodoEvent::Loaded(todos) => {
                self.todos = todos;
                self.is_loading = false;
                self.clamp_selection();
            }
            TodoEvent::Enhanced { used_ai } => {
                self.is_ai_processing = false;
                if !used_ai {
                    self.set_notice(NoticeKind::Info, "AI analysis unavailable, saved as typed.");
                }
            }
            TodoEvent::Added(todo) => {
                self.is_ai_processing = false;
                self.is_saving = false;
                // A refresh may already have delivered the new row.
                if !self.todos.iter().any(|existing| existing.id == todo.id) {
                    self.todos.insert(0, todo);
                }
                self.input.clear();
                self.cursor = 0;
            }
            TodoEvent::Toggled { id, is_completed } => {
                if let Some(todo) = self.todos.iter_mut().find(|todo| todo.id == id) {
                    todo.is_completed = is_completed;
                }
                self.clamp_selection();
            }
            TodoEvent::Deleted(id) => {
                self.todos.retain(|todo| todo.id != id);
                self.clamp_selection();
            }
            TodoEvent::Failed { action, message } => {
                error!(?action, %message, "todo operation failed");
                match action {
                    TodoAction::Fetch => self.is_loading = false,
                    TodoAction::Add => {
                        self.is_ai_processing = false;
                        self.is_saving = false;
                    }
                    TodoAction::Toggle | TodoAction::Delete => {}
                }
                let text = match action {
                    TodoAction::Add => format!("Save failed: {message}"),
                    other => format!("{} failed: {message}", other.label()),
                };
                self.set_notice(NoticeKind::Error, text);
            }
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.is_ai_processing {
            return;
        }
        let byte_idx = char_to_byte_idx(&self.input, self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor = self.cursor.saturating_add(1);
    }

    pub fn backspace(&mut self) {
        if self.is_ai_processing || self.cursor == 0 {
            return;
        }
        let start = char_to_byte_idx(&self.input, self.cursor - 1);
        let end = char_to_byte_idx(&self.input, self.cursor);
        self.input.drain(start..end);
        self.cursor -= 1;
    }

    pub fn delete_forward(&mut self) {
        if self.is_ai_processing || self.cursor >= self.input.chars().count() {
            return;
        }
        let start = char_to_byte_idx(&self.input, self.cursor);
        let end = char_to_byte_idx(&self.input, self.cursor + 1);
        self.input.drain(start..end);
    }

    pub fn cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }

    pub fn cursor_home(&mut self) {
        self.cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor = self.input.chars().count();
    }

    fn clamp_selection(&mut self) {
        let count = self.filtered_count();
        self.selected = self.selected.min(count.saturating_sub(1));
    }
}

#[cfg(test)]
#[path = "../tests/unit/app_tests.rs"]
mod tests;
