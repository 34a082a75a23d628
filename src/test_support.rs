//! Test support utilities shared across unit and integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::Value;

use crate::softlayer::{Method, Transport, TransportError, TransportFuture};
use crate::ui::Ui;

/// Records a single request made through [`ScriptedTransport`].
#[derive(Clone, Debug, PartialEq)]
pub struct RecordedCall {
    /// HTTP verb used.
    pub method: Method,
    /// API path as passed by the client.
    pub path: String,
    /// JSON body, when one was sent.
    pub body: Option<Value>,
}

impl RecordedCall {
    /// Returns `"<METHOD> <path>"` for compact assertions.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.path)
    }
}

type Key = (Method, String);

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<Key, VecDeque<Result<Value, TransportError>>>,
    calls: Vec<RecordedCall>,
}

/// Scripted transport returning pre-seeded replies per method and path.
///
/// Replies for a given route are served in FIFO order; the final reply is
/// repeated for every later call so polling loops can be scripted with a
/// handful of entries. Calls to unscripted routes fail with
/// [`TransportError::Http`].
#[derive(Clone, Debug, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    /// Creates a transport with no scripted replies.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a successful reply for `method` on `path`.
    pub fn respond(&self, method: Method, path: impl Into<String>, value: Value) {
        self.push(method, path.into(), Ok(value));
    }

    /// Queues a failing reply for `method` on `path`.
    pub fn fail(&self, method: Method, path: impl Into<String>, error: TransportError) {
        self.push(method, path.into(), Err(error));
    }

    fn push(&self, method: Method, path: String, reply: Result<Value, TransportError>) {
        self.lock()
            .responses
            .entry((method, path))
            .or_default()
            .push_back(reply);
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Returns the recorded calls as `"<METHOD> <path>"` strings.
    #[must_use]
    pub fn call_log(&self) -> Vec<String> {
        self.lock().calls.iter().map(RecordedCall::describe).collect()
    }

    /// Counts recorded calls for `method` on `path`.
    #[must_use]
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| call.method == method && call.path == path)
            .count()
    }

    fn next_reply(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, TransportError> {
        let mut script = self.lock();
        script.calls.push(RecordedCall {
            method,
            path: path.to_owned(),
            body,
        });
        let Some(queue) = script.responses.get_mut(&(method, path.to_owned())) else {
            return Err(TransportError::Http {
                path: path.to_owned(),
                message: format!("no scripted response for {method} {path}"),
            });
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap_or(Ok(Value::Null))
        } else {
            queue.front().cloned().unwrap_or(Ok(Value::Null))
        }
    }
}

impl Transport for ScriptedTransport {
    fn call<'a>(
        &'a self,
        path: &'a str,
        method: Method,
        body: Option<Value>,
    ) -> TransportFuture<'a> {
        let reply = self.next_reply(method, path, body);
        Box::pin(async move { reply })
    }
}

/// Message captured by [`RecordingUi`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum UiMessage {
    /// Progress line.
    Say(String),
    /// Error line.
    Error(String),
}

/// [`Ui`] that stores every message for later assertions.
#[derive(Clone, Debug, Default)]
pub struct RecordingUi {
    messages: Arc<Mutex<Vec<UiMessage>>>,
}

impl RecordingUi {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<UiMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns every message in the order it was reported.
    #[must_use]
    pub fn messages(&self) -> Vec<UiMessage> {
        self.lock().clone()
    }

    /// Returns only the error messages.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|message| match message {
                UiMessage::Error(text) => Some(text.clone()),
                UiMessage::Say(_) => None,
            })
            .collect()
    }
}

impl Ui for RecordingUi {
    fn say(&self, message: &str) {
        self.lock().push(UiMessage::Say(message.to_owned()));
    }

    fn error(&self, message: &str) {
        self.lock().push(UiMessage::Error(message.to_owned()));
    }
}
