use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use tracing::{info, warn};

use crate::enhancer::{TaskEnhancer, enhance_or_fallback};
use crate::store::TodoStore;
use crate::todo::{NewTodo, Todo};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoAction {
    Fetch,
    Add,
    Toggle,
    Delete,
}

impl TodoAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Fetch => "Loading tasks",
            Self::Add => "Saving task",
            Self::Toggle => "Updating task",
            Self::Delete => "Deleting task",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodoEvent {
    Loaded(Vec<Todo>),
    Enhanced { used_ai: bool },
    Added(Todo),
    Toggled { id: String, is_completed: bool },
    Deleted(String),
    Failed { action: TodoAction, message: String },
}

/// Runs store and AI calls off the UI thread; results come back through
/// [`TodoWorker::drain_events_limited`].
pub struct TodoWorker {
    store: Arc<dyn TodoStore>,
    enhancer: Arc<dyn TaskEnhancer>,
    event_tx: Sender<TodoEvent>,
    event_rx: Receiver<TodoEvent>,
}

impl TodoWorker {
    pub fn new(store: Arc<dyn TodoStore>, enhancer: Arc<dyn TaskEnhancer>) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            store,
            enhancer,
            event_tx,
            event_rx,
        }
    }

    pub fn fetch(&self) {
        self.spawn(|store, _enhancer, tx| {
            let event = match store.fetch_all() {
                Ok(todos) => {
                    info!(count = todos.len(), "loaded todos");
                    TodoEvent::Loaded(todos)
                }
                Err(err) => failed(TodoAction::Fetch, err),
            };
            let _ = tx.send(event);
        });
    }

    pub fn add(&self, raw: String) {
        self.spawn(move |store, enhancer, tx| {
            let (draft, used_ai) = enhance_or_fallback(enhancer.as_ref(), &raw);
            let _ = tx.send(TodoEvent::Enhanced { used_ai });
            let event = match store.insert(&NewTodo::from(draft)) {
                Ok(todo) => {
                    info!(id = %todo.id, used_ai, "added todo");
                    TodoEvent::Added(todo)
                }
                Err(err) => failed(TodoAction::Add, err),
            };
            let _ = tx.send(event);
        });
    }

    pub fn toggle(&self, id: String, is_completed: bool) {
        self.spawn(move |store, _enhancer, tx| {
            let target = !is_completed;
            let event = match store.set_completed(&id, target) {
                Ok(()) => TodoEvent::Toggled {
                    id,
                    is_completed: target,
                },
                Err(err) => failed(TodoAction::Toggle, err),
            };
            let _ = tx.send(event);
        });
    }

    pub fn delete(&self, id: String) {
        self.spawn(move |store, _enhancer, tx| {
            let event = match store.delete(&id) {
                Ok(()) => TodoEvent::Deleted(id),
                Err(err) => failed(TodoAction::Delete, err),
            };
            let _ = tx.send(event);
        });
    }

    #[cfg(test)]
    pub fn drain_events(&self) -> Vec<TodoEvent> {
        self.drain_events_limited(usize::MAX)
    }

    pub fn drain_events_limited(&self, max_events: usize) -> Vec<TodoEvent> {
        let mut events = Vec::new();
        while events.len() < max_events {
            let Ok(event) = self.event_rx.try_recv() else {
                break;
            };
            events.push(event);
        }
        events
    }

    fn spawn<F>(&self, job: F)
    where
        F: FnOnce(&dyn TodoStore, &Arc<dyn TaskEnhancer>, &Sender<TodoEvent>) + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let enhancer = Arc::clone(&self.enhancer);
        let tx = self.event_tx.clone();
        thread::spawn(move || job(store.as_ref(), &enhancer, &tx));
    }
}

fn failed(action: TodoAction, err: impl std::fmt::Display) -> TodoEvent {
    let message = err.to_string();
    warn!(?action, %message, "todo request failed");
    TodoEvent::Failed { action, message }
}

#[cfg(test)]
#[path = "../tests/unit/worker_tests.rs"]
mod tests;
