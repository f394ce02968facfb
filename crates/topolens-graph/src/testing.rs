//! Scripted in-memory store and dialer for exercising sessions without Neo4j.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use topolens_core::{Record, Statement};

use crate::client::{Dialer, GraphConfig, GraphError, GraphStore};

#[derive(Default)]
struct StoreState {
    responses: VecDeque<Result<Vec<Record>, GraphError>>,
    statements: Vec<Statement>,
    closed: usize,
}

/// Answers statements from a queue of canned responses, in order.
/// An exhausted queue answers with no rows. Clones share state.
#[derive(Clone, Default)]
pub struct ScriptedStore {
    state: Arc<Mutex<StoreState>>,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, rows: Vec<Record>) -> Self {
        self.push(Ok(rows));
        self
    }

    pub fn fail(self, error: GraphError) -> Self {
        self.push(Err(error));
        self
    }

    /// Every statement fetched so far.
    pub fn statements(&self) -> Vec<Statement> {
        self.lock().statements.clone()
    }

    pub fn close_count(&self) -> usize {
        self.lock().closed
    }

    fn push(&self, response: Result<Vec<Record>, GraphError>) {
        self.lock().responses.push_back(response);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl GraphStore for ScriptedStore {
    async fn fetch(&self, statement: &Statement) -> Result<Vec<Record>, GraphError> {
        let mut state = self.lock();
        state.statements.push(statement.clone());
        state.responses.pop_front().unwrap_or_else(|| Ok(Vec::new()))
    }

    fn close(&self) {
        self.lock().closed += 1;
    }
}

/// Hands out one shared [`ScriptedStore`], refusing configured URIs.
#[derive(Clone)]
pub struct ScriptedDialer {
    store: ScriptedStore,
    refusals: Arc<Mutex<HashMap<String, GraphError>>>,
    attempts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedDialer {
    pub fn new(store: ScriptedStore) -> Self {
        Self {
            store,
            refusals: Arc::default(),
            attempts: Arc::default(),
        }
    }

    /// Fail every dial to `uri` with `error`.
    pub fn refuse(self, uri: &str, error: GraphError) -> Self {
        self.refusals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(uri.to_string(), error);
        self
    }

    /// URIs dialed so far, in order.
    pub fn attempts(&self) -> Vec<String> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl Dialer for ScriptedDialer {
    type Store = ScriptedStore;

    async fn dial(&self, _config: &GraphConfig, uri: &str) -> Result<ScriptedStore, GraphError> {
        self.attempts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(uri.to_string());

        let refusal = self
            .refusals
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(uri)
            .cloned();
        match refusal {
            Some(error) => Err(error),
            None => Ok(self.store.clone()),
        }
    }
}
