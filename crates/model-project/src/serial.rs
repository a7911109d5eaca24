//! Serialized execution context

use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, ThreadId};

use model_loader::panic_message;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::{Error, Result};

/// A unit of work for a [`SerialContext`].
pub type Task = Box<dyn FnOnce() + Send + 'static>;

/// A FIFO executor with exactly one worker.
///
/// Tasks run one at a time, in submission order. Every model install and
/// every listener notification of a project goes through its context.
pub trait SerialContext: Send + Sync {
    /// Queue `task`. Never runs it inline.
    fn execute(&self, task: Task);

    /// Whether the calling thread is the context's worker.
    fn is_current(&self) -> bool;
}

/// A [`SerialContext`] backed by a dedicated thread draining an unbounded
/// channel.
///
/// The thread exits once the worker is dropped and the queue is empty.
/// A panicking task is logged; the worker keeps going.
#[derive(Debug)]
pub struct SerialWorker {
    name: String,
    sender: mpsc::UnboundedSender<Task>,
    thread_id: ThreadId,
}

impl SerialWorker {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, mut receiver) = mpsc::unbounded_channel::<Task>();

        let worker_name = name.clone();
        let handle = thread::Builder::new()
            .name(name.clone())
            .spawn(move || {
                while let Some(task) = receiver.blocking_recv() {
                    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(task)) {
                        error!(
                            worker = %worker_name,
                            panic = %panic_message(payload.as_ref()),
                            "Serial task panicked"
                        );
                    }
                }
                debug!(worker = %worker_name, "Serial worker stopped");
            })
            .map_err(|source| Error::WorkerSpawn {
                name: name.clone(),
                source,
            })?;

        Ok(Self {
            name,
            sender,
            thread_id: handle.thread().id(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SerialContext for SerialWorker {
    fn execute(&self, task: Task) {
        if self.sender.send(task).is_err() {
            warn!(worker = %self.name, "Serial worker is gone; task dropped");
        }
    }

    fn is_current(&self) -> bool {
        thread::current().id() == self.thread_id
    }
}
