//! In-memory fakes of the REST and shell seams

use async_trait::async_trait;
use boxflow_cloud::{
    ApiError, ApiErrorKind, CloudApi, CloudError, Deadline, RemoteShell, Result, ShellCredentials,
    ShellSession,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

type Response = std::result::Result<Value, ApiError>;

#[derive(Default)]
struct FakeApiState {
    responses: HashMap<(Method, String), VecDeque<Response>>,
    calls: Vec<Call>,
}

/// Scripted [`CloudApi`]. Responses for a `(method, path)` are consumed in
/// order; the last one keeps being returned.
#[derive(Default)]
pub struct FakeApi {
    state: Mutex<FakeApiState>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: Method, path: &str, body: Value) -> &Self {
        self.push(method, path, Ok(body))
    }

    pub fn fail(&self, method: Method, path: &str, status: u16, message: &str) -> &Self {
        self.push(method, path, Err(ApiError::from_status(status, message)))
    }

    fn push(&self, method: Method, path: &str, response: Response) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, method: Method) -> usize {
        self.calls().iter().filter(|c| c.method == method).count()
    }

    pub fn count_path(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    /// POST and DELETE calls
    pub fn mutations(&self) -> usize {
        self.count(Method::Post) + self.count(Method::Delete)
    }

    fn call(&self, method: Method, path: &str, body: Option<Value>) -> Response {
        let mut state = self.state.lock().unwrap();
        state.calls.push(Call {
            method,
            path: path.to_string(),
            body,
        });

        let Some(queue) = state.responses.get_mut(&(method, path.to_string())) else {
            return Err(ApiError::new(
                ApiErrorKind::Server,
                Some(500),
                format!("no response scripted for {:?} {}", method, path),
            ));
        };
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue.front().cloned().unwrap()
        }
    }
}

#[async_trait]
impl CloudApi for FakeApi {
    async fn get(&self, path: &str, _: Deadline) -> std::result::Result<Vec<u8>, ApiError> {
        self.call(Method::Get, path, None)
            .map(|v| serde_json::to_vec(&v).unwrap())
    }

    async fn post(
        &self,
        path: &str,
        body: &Value,
        _: Deadline,
    ) -> std::result::Result<Vec<u8>, ApiError> {
        self.call(Method::Post, path, Some(body.clone()))
            .map(|v| serde_json::to_vec(&v).unwrap())
    }

    async fn delete(&self, path: &str, _: Deadline) -> std::result::Result<(), ApiError> {
        self.call(Method::Delete, path, None).map(|_| ())
    }
}

/// Shell that records every command line instead of running it
#[derive(Default)]
pub struct FakeShell {
    pub fail_run: bool,
    pub hosts: Mutex<Vec<String>>,
    pub runs: Arc<Mutex<Vec<String>>>,
}

pub struct FakeSession {
    fail: bool,
    runs: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl RemoteShell for FakeShell {
    type Session = FakeSession;

    async fn connect(&self, _: &ShellCredentials, host: &str) -> Result<FakeSession> {
        self.hosts.lock().unwrap().push(host.to_string());
        Ok(FakeSession {
            fail: self.fail_run,
            runs: Arc::clone(&self.runs),
        })
    }
}

#[async_trait]
impl ShellSession for FakeSession {
    async fn run(&self, commands: &[String]) -> Result<String> {
        self.runs
            .lock()
            .unwrap()
            .push(boxflow_cloud::join_commands(commands));
        if self.fail {
            return Err(CloudError::CommandFailed("exit status 1".to_string()));
        }
        Ok(String::new())
    }
}
