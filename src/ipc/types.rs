use serde::Deserialize;

use crate::store::{self, Action, State};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Handler-facing wrapper around the store. All mutations funnel through
/// [`AppState::dispatch`], one action at a time.
pub struct AppState {
    pub store: State,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            store: State::default(),
        }
    }

    pub fn dispatch(&mut self, action: Action) {
        self.store = store::reduce(&self.store, action);
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
