//! [`FakeConnection`], a build tool that answers from a script.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use model_fs::ModulePath;
use model_loader::{BuildConnection, Error, FetchRequest, FetchedModels, Result};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

#[derive(Clone)]
enum Response {
    Models(FetchedModels),
    Fail(String),
}

/// A [`BuildConnection`] returning canned responses.
///
/// Like a real build tool, it answers with the module the request was
/// issued for as the default module, when the bundle contains it.
///
/// Scripted responses (see [`then`](Self::then)) are used once each, in
/// order; after that every call gets the fallback response. A gated
/// connection holds every fetch until [`release`](Self::release) or
/// [`open_gate`](Self::open_gate) lets it through, which is how tests keep
/// a fetch "in flight".
///
/// # Example
///
/// ```rust,no_run
/// use model_test_utils::{FakeConnection, TestBuild};
///
/// let connection = FakeConnection::new(TestBuild::new("/work/app").build()).gated();
/// // ... start a load, observe it is in flight ...
/// connection.release(1);
/// ```
pub struct FakeConnection {
    script: Mutex<VecDeque<Response>>,
    fallback: Mutex<Response>,
    gate: Option<Semaphore>,
    requests: Mutex<Vec<FetchRequest>>,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_progress: AtomicUsize,
    max_in_progress: AtomicUsize,
}

impl FakeConnection {
    /// Answer every fetch with `models`.
    pub fn new(models: FetchedModels) -> Self {
        Self::with_fallback(Response::Models(models))
    }

    /// Fail every fetch with a connection error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with_fallback(Response::Fail(message.into()))
    }

    fn with_fallback(fallback: Response) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            fallback: Mutex::new(fallback),
            gate: None,
            requests: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_progress: AtomicUsize::new(0),
            max_in_progress: AtomicUsize::new(0),
        }
    }

    /// Hold every fetch until released.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Answer the next unscripted fetch with `models`.
    pub fn then(self, models: FetchedModels) -> Self {
        self.script.lock().push_back(Response::Models(models));
        self
    }

    /// Fail the next unscripted fetch.
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(Response::Fail(message.into()));
        self
    }

    /// Answer every later fetch (once the script is exhausted) with `models`.
    pub fn set_models(&self, models: FetchedModels) {
        *self.fallback.lock() = Response::Models(models);
    }

    /// Fail every later fetch (once the script is exhausted).
    pub fn set_failing(&self, message: impl Into<String>) {
        *self.fallback.lock() = Response::Fail(message.into());
    }

    /// Let `count` held fetches through.
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Let every current and future fetch through.
    pub fn open_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.close();
        }
    }

    /// Number of fetches started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of fetches that returned.
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// The largest number of fetches ever running at once.
    pub fn max_concurrent(&self) -> usize {
        self.max_in_progress.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<FetchRequest> {
        self.requests.lock().clone()
    }

    /// Block the calling thread until at least `count` fetches have started.
    ///
    /// Returns `false` on timeout.
    pub fn wait_for_calls(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.calls() >= count)
    }

    /// Block the calling thread until at least `count` fetches have returned.
    pub fn wait_for_completed(&self, count: usize, timeout: Duration) -> bool {
        wait_until(timeout, || self.completed() >= count)
    }
}

fn wait_until(timeout: Duration, condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while !condition() {
        if Instant::now() >= deadline {
            return false;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    true
}

/// `models` with the module rooted at `dir`, if any, as the default module.
pub fn rooted_at(models: FetchedModels, dir: &ModulePath) -> FetchedModels {
    let FetchedModels {
        default_project,
        mut other_projects,
    } = models;
    match other_projects.iter().position(|other| other.project_dir() == dir) {
        Some(index) => {
            let requested = std::mem::replace(&mut other_projects[index], default_project);
            FetchedModels {
                default_project: requested,
                other_projects,
            }
        }
        None => FetchedModels {
            default_project,
            other_projects,
        },
    }
}

#[async_trait]
impl BuildConnection for FakeConnection {
    async fn fetch_models(&self, request: &FetchRequest) -> Result<FetchedModels> {
        self.requests.lock().push(request.clone());
        let running = self.in_progress.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_progress.fetch_max(running, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(gate) = &self.gate {
            // A closed gate is an open one.
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        let response = match self.script.lock().pop_front() {
            Some(response) => response,
            None => self.fallback.lock().clone(),
        };

        self.in_progress.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);
        match response {
            Response::Models(models) => Ok(rooted_at(models, &request.project_dir)),
            Response::Fail(message) => Err(Error::connection(message)),
        }
    }
}
