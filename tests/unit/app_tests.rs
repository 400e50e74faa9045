use super::*;
use crate::todo::Priority;

fn todo(id: &str, title: &str, done: bool) -> Todo {
    Todo {
        id: id.to_string(),
        title: title.to_string(),
        is_completed: done,
        created_at: String::new(),
        category: "Work".to_string(),
        priority: Priority::Medium,
    }
}

fn loaded_app() -> App {
    let mut app = App::default();
    app.begin_fetch();
    app.apply_event(TodoEvent::Loaded(vec![
        todo("3", "Newest", false),
        todo("2", "Middle", true),
        todo("1", "Oldest", false),
    ]));
    app
}

fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        app.input_char(ch);
    }
}

#[test]
fn loaded_event_replaces_list_and_clears_loading() {
    let app = loaded_app();
    assert!(!app.is_loading());
    assert_eq!(app.todos().len(), 3);
    assert_eq!(app.todos()[0].title, "Newest");
}

#[test]
fn filters_split_active_and_completed() {
    let mut app = loaded_app();
    assert_eq!(app.filtered_count(), 3);
    app.set_filter(Filter::Active);
    let titles: Vec<_> = app.filtered_todos().iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["Newest", "Oldest"]);
    app.set_filter(Filter::Completed);
    assert_eq!(app.filtered_count(), 1);
    assert_eq!(app.selected_todo().map(|t| t.id.as_str()), Some("2"));
}

#[test]
fn cycle_filter_resets_selection() {
    let mut app = loaded_app();
    app.select_next();
    app.select_next();
    assert_eq!(app.selected_index(), 2);
    app.cycle_filter();
    assert_eq!(app.filter(), Filter::Active);
    assert_eq!(app.selected_index(), 0);
}

#[test]
fn selection_stays_within_filtered_view() {
    let mut app = loaded_app();
    for _ in 0..10 {
        app.select_next();
    }
    assert_eq!(app.selected_index(), 2);
    app.select_prev();
    assert_eq!(app.selected_index(), 1);
    for _ in 0..10 {
        app.select_prev();
    }
    assert_eq!(app.selected_index(), 0);
}

#[test]
fn blank_input_is_not_submitted() {
    let mut app = App::default();
    type_text(&mut app, "   ");
    assert_eq!(app.submit_input(), None);
    assert!(!app.is_ai_processing());
}

#[test]
fn submit_trims_and_marks_ai_processing_but_keeps_input() {
    let mut app = App::default();
    type_text(&mut app, "  buy milk ");
    assert_eq!(app.submit_input().as_deref(), Some("buy milk"));
    assert!(app.is_ai_processing());
    assert_eq!(app.input(), "  buy milk ");
}

#[test]
fn input_is_locked_while_ai_is_processing() {
    let mut app = App::default();
    type_text(&mut app, "plan trip");
    app.submit_input();
    app.input_char('!');
    app.backspace();
    assert_eq!(app.input(), "plan trip");
    assert_eq!(app.submit_input(), None);
}

#[test]
fn added_todo_is_prepended_and_input_cleared() {
    let mut app = loaded_app();
    type_text(&mut app, "dentist");
    app.submit_input();
    app.apply_event(TodoEvent::Enhanced { used_ai: true });
    assert!(!app.is_ai_processing());
    app.apply_event(TodoEvent::Added(todo("4", "Book dentist appointment", false)));
    assert_eq!(app.todos()[0].id, "4");
    assert_eq!(app.input(), "");
    assert_eq!(app.cursor(), 0);
    assert!(app.notice().is_none());
}

#[test]
fn second_submit_is_refused_until_insert_finishes() {
    let mut app = App::default();
    type_text(&mut app, "pay rent");
    assert!(app.submit_input().is_some());
    app.apply_event(TodoEvent::Enhanced { used_ai: true });
    assert_eq!(app.input(), "pay rent");
    assert_eq!(app.submit_input(), None);

    app.apply_event(TodoEvent::Added(todo("9", "Pay rent", false)));
    type_text(&mut app, "water plants");
    assert_eq!(app.submit_input().as_deref(), Some("water plants"));
}

#[test]
fn added_row_already_delivered_by_refresh_is_not_duplicated() {
    let mut app = loaded_app();
    type_text(&mut app, "dentist");
    app.submit_input();
    app.apply_event(TodoEvent::Enhanced { used_ai: true });
    app.apply_event(TodoEvent::Loaded(vec![
        todo("4", "Book dentist appointment", false),
        todo("3", "Newest", false),
    ]));
    app.apply_event(TodoEvent::Added(todo("4", "Book dentist appointment", false)));
    let ids: Vec<_> = app.todos().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["4", "3"]);
    assert_eq!(app.input(), "");
}

#[test]
fn fallback_enhancement_leaves_info_notice() {
    let mut app = App::default();
    type_text(&mut app, "x");
    app.submit_input();
    app.apply_event(TodoEvent::Enhanced { used_ai: false });
    assert_eq!(app.notice().map(|n| n.kind), Some(NoticeKind::Info));
}

#[test]
fn failed_add_keeps_input_and_reports_save_failure() {
    let mut app = App::default();
    type_text(&mut app, "call bank");
    app.submit_input();
    app.apply_event(TodoEvent::Enhanced { used_ai: true });
    app.apply_event(TodoEvent::Failed {
        action: TodoAction::Add,
        message: "Invalid API key".to_string(),
    });
    assert_eq!(app.input(), "call bank");
    assert!(!app.is_ai_processing());
    let notice = app.notice().expect("notice should be set");
    assert_eq!(notice.kind, NoticeKind::Error);
    assert_eq!(notice.text, "Save failed: Invalid API key");
    assert_eq!(app.submit_input().as_deref(), Some("call bank"));
}

#[test]
fn failed_fetch_clears_loading_and_keeps_existing_rows() {
    let mut app = loaded_app();
    app.begin_fetch();
    app.apply_event(TodoEvent::Failed {
        action: TodoAction::Fetch,
        message: "offline".to_string(),
    });
    assert!(!app.is_loading());
    assert_eq!(app.todos().len(), 3);
    assert_eq!(
        app.notice().map(|n| n.text.as_str()),
        Some("Loading tasks failed: offline")
    );
}

#[test]
fn toggled_event_updates_only_matching_row() {
    let mut app = loaded_app();
    app.apply_event(TodoEvent::Toggled {
        id: "1".to_string(),
        is_completed: true,
    });
    let states: Vec<_> = app.todos().iter().map(|t| t.is_completed).collect();
    assert_eq!(states, vec![false, true, true]);
}

#[test]
fn failed_toggle_leaves_rows_untouched() {
    let mut app = loaded_app();
    app.apply_event(TodoEvent::Failed {
        action: TodoAction::Toggle,
        message: "nope".to_string(),
    });
    let states: Vec<_> = app.todos().iter().map(|t| t.is_completed).collect();
    assert_eq!(states, vec![false, true, false]);
}

#[test]
fn toggling_out_of_active_filter_clamps_selection() {
    let mut app = loaded_app();
    app.set_filter(Filter::Active);
    app.select_next();
    assert_eq!(app.selected_todo().map(|t| t.id.as_str()), Some("1"));
    app.apply_event(TodoEvent::Toggled {
        id: "1".to_string(),
        is_completed: true,
    });
    assert_eq!(app.selected_index(), 0);
    assert_eq!(app.selected_todo().map(|t| t.id.as_str()), Some("3"));
}

#[test]
fn deleted_event_removes_row() {
    let mut app = loaded_app();
    app.select_next();
    app.select_next();
    app.apply_event(TodoEvent::Deleted("1".to_string()));
    assert_eq!(app.todos().len(), 2);
    assert_eq!(app.selected_index(), 1);
    app.apply_event(TodoEvent::Deleted("missing".to_string()));
    assert_eq!(app.todos().len(), 2);
}

#[test]
fn cursor_editing_handles_multibyte_input() {
    let mut app = App::default();
    type_text(&mut app, "할일");
    app.cursor_left();
    app.input_char('X');
    assert_eq!(app.input(), "할X일");
    app.cursor_home();
    app.delete_forward();
    assert_eq!(app.input(), "X일");
    app.cursor_end();
    app.backspace();
    assert_eq!(app.input(), "X");
    app.cursor_right();
    assert_eq!(app.cursor(), 1);
}

#[test]
fn focus_toggles_between_input_and_list() {
    let mut app = App::default();
    assert_eq!(app.focus, Focus::Input);
    app.toggle_focus();
    assert_eq!(app.focus, Focus::List);
    app.toggle_focus();
    assert_eq!(app.focus, Focus::Input);
}
