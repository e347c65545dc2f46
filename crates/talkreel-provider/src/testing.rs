//! Scripted transport for deterministic testing.

use crate::error::TransportError;
use crate::transport::{Transport, TransportResponse};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
}

type Reply = Result<TransportResponse, TransportError>;

/// Record of a call made through [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct CallRecord {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Transport that answers from per-route scripts.
///
/// Each route holds a queue of replies; the last reply in a queue repeats
/// forever. Unscripted routes answer with the fallback (404 by default).
#[derive(Debug, Clone)]
pub struct ScriptedTransport {
    state: Arc<Mutex<ScriptState>>,
}

#[derive(Debug)]
struct ScriptState {
    routes: HashMap<(Method, String), VecDeque<Reply>>,
    fallback: Reply,
    calls: Vec<CallRecord>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                routes: HashMap::new(),
                fallback: Ok(TransportResponse::json(404, json!({ "error": "not found" }))),
                calls: Vec::new(),
            })),
        }
    }

    /// Append a reply to the route's queue.
    pub fn on(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.lock()
            .routes
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn on_post(&self, path: &str, status: u16, body: Value) -> &Self {
        self.on(Method::Post, path, Ok(TransportResponse::json(status, body)))
    }

    pub fn on_get(&self, path: &str, status: u16, body: Value) -> &Self {
        self.on(Method::Get, path, Ok(TransportResponse::json(status, body)))
    }

    /// Reply used for every unscripted route.
    pub fn fallback(&self, reply: Reply) -> &Self {
        self.lock().fallback = reply;
        self
    }

    pub fn calls(&self) -> Vec<CallRecord> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    /// Paths called so far, in order.
    pub fn paths(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.path.clone()).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn reply(&self, method: Method, path: &str, body: Option<&Value>) -> Reply {
        let mut guard = self.lock();
        let state = &mut *guard;
        state.calls.push(CallRecord {
            method,
            path: path.to_string(),
            body: body.cloned(),
        });

        match state.routes.get_mut(&(method, path.to_string())) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(|| state.fallback.clone()),
            Some(queue) => queue.front().cloned().unwrap_or_else(|| state.fallback.clone()),
            None => state.fallback.clone(),
        }
    }
}

impl Default for ScriptedTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<TransportResponse, TransportError> {
        self.reply(Method::Post, path, Some(body))
    }

    async fn get(&self, path: &str) -> Result<TransportResponse, TransportError> {
        self.reply(Method::Get, path, None)
    }
}
