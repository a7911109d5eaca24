//! Operations issued before a project has its extensions

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use model_loader::panic_message;
use parking_lot::Mutex;
use tracing::error;

type DeferredOp = Box<dyn FnOnce() + Send + 'static>;

/// Buffers operations until [`drain`](Self::drain) runs them, then closes
/// for good.
///
/// While open, [`enqueue_or_run`](Self::enqueue_or_run) appends. Once
/// closed it runs the operation at once, on the calling thread. Every
/// operation runs exactly once, in FIFO order among the queued ones,
/// including those queued while a drain is in progress.
pub struct DeferredInitQueue {
    pending: Mutex<Option<Vec<DeferredOp>>>,
    draining: AtomicBool,
}

impl DeferredInitQueue {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(Some(Vec::new())),
            draining: AtomicBool::new(false),
        }
    }

    pub fn enqueue_or_run(&self, op: impl FnOnce() + Send + 'static) {
        {
            let mut pending = self.pending.lock();
            if let Some(queue) = pending.as_mut() {
                queue.push(Box::new(op));
                return;
            }
        }
        op();
    }

    /// Run every queued operation on the calling thread and close the queue.
    ///
    /// Only the first call drains; later (or concurrent) calls return 0.
    /// Returns the number of operations run.
    pub fn drain(&self) -> usize {
        if self.draining.swap(true, Ordering::AcqRel) {
            return 0;
        }

        let mut ran = 0;
        loop {
            let batch = {
                let mut pending = self.pending.lock();
                match pending.as_mut() {
                    Some(queue) if !queue.is_empty() => std::mem::take(queue),
                    _ => {
                        *pending = None;
                        return ran;
                    }
                }
            };
            for op in batch {
                if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(op)) {
                    error!(panic = %panic_message(payload.as_ref()), "Deferred operation panicked");
                }
                ran += 1;
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().is_none()
    }

    /// Operations waiting for the drain.
    pub fn len(&self) -> usize {
        self.pending.lock().as_ref().map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DeferredInitQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DeferredInitQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredInitQueue")
            .field("pending", &self.len())
            .field("closed", &self.is_closed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    fn recorder() -> (Arc<Mutex<Vec<usize>>>, impl Fn(usize) -> DeferredOp) {
        let log = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&log);
        (log, move |i: usize| -> DeferredOp {
            let sink = Arc::clone(&sink);
            Box::new(move || sink.lock().push(i))
        })
    }

    #[test]
    fn test_queued_ops_run_in_order_on_drain() {
        let queue = DeferredInitQueue::new();
        let (log, op) = recorder();

        for i in 0..5 {
            queue.enqueue_or_run(op(i));
        }
        assert!(log.lock().is_empty());
        assert_eq!(queue.len(), 5);

        assert_eq!(queue.drain(), 5);
        assert_eq!(*log.lock(), vec![0, 1, 2, 3, 4]);
        assert!(queue.is_closed());
    }

    #[test]
    fn test_closed_queue_runs_inline() {
        let queue = DeferredInitQueue::new();
        queue.drain();
        let (log, op) = recorder();

        queue.enqueue_or_run(op(7));

        assert_eq!(*log.lock(), vec![7]);
        assert_eq!(queue.drain(), 0);
    }

    #[test]
    fn test_op_enqueued_during_drain_runs_after_earlier_ones() {
        let queue = Arc::new(DeferredInitQueue::new());
        let (log, op) = recorder();
        let op = Arc::new(op);

        let inner_queue = Arc::clone(&queue);
        let inner_op = Arc::clone(&op);
        queue.enqueue_or_run(move || inner_queue.enqueue_or_run(inner_op(2)));
        queue.enqueue_or_run(op(1));

        queue.drain();
        assert_eq!(*log.lock(), vec![1, 2]);
    }

    #[test]
    fn test_panicking_op_does_not_lose_others() {
        let queue = DeferredInitQueue::new();
        let (log, op) = recorder();
        queue.enqueue_or_run(|| panic!("deferred bug"));
        queue.enqueue_or_run(op(1));

        assert_eq!(queue.drain(), 2);
        assert_eq!(*log.lock(), vec![1]);
    }

    #[test]
    fn test_each_op_runs_once_under_racing_enqueues() {
        let queue = Arc::new(DeferredInitQueue::new());
        let count = Arc::new(AtomicUsize::new(0));

        let producers: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                let count = Arc::clone(&count);
                thread::spawn(move || {
                    for _ in 0..250 {
                        let count = Arc::clone(&count);
                        queue.enqueue_or_run(move || {
                            count.fetch_add(1, Ordering::SeqCst);
                        });
                    }
                })
            })
            .collect();

        queue.drain();
        for producer in producers {
            producer.join().unwrap();
        }

        assert!(queue.is_closed());
        assert_eq!(count.load(Ordering::SeqCst), 1000);
    }
}
