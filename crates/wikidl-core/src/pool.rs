//! Fixed-size worker pool.
//!
//! `capacity` OS threads pull jobs from a shared queue and send each result
//! back on a completion channel. The pool can be shut down (no new jobs,
//! queued jobs still run) and awaited with an upper bound; workers still busy
//! when the bound passes are handed back as [`DetachedWorkers`], never
//! interrupted. They keep draining the queue until it is empty.

use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};
use thiserror::Error;

type Job<T> = Box<dyn FnOnce() -> T + Send + 'static>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("worker pool is shut down; not accepting new jobs")]
    ShutDown,
    #[error("cannot spawn worker thread")]
    Spawn(#[source] io::Error),
}

enum Completion<T> {
    Done(T),
    Panicked,
}

/// What `await_termination` observed before returning.
#[derive(Debug)]
pub struct Termination<T> {
    /// Results of jobs that returned normally, in completion order.
    pub completed: Vec<T>,
    /// Jobs that panicked (the worker survived).
    pub panicked: usize,
    /// Jobs submitted but not finished when the wait ended.
    pub unfinished: usize,
    pub timed_out: bool,
    /// Workers still busy when the wait ended. Join them before the process
    /// exits, or their jobs die with it.
    pub detached: DetachedWorkers,
}

/// Worker threads left running after a timed-out wait.
#[derive(Debug, Default)]
pub struct DetachedWorkers {
    handles: Vec<thread::JoinHandle<()>>,
}

impl DetachedWorkers {
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Blocks until every detached worker has run out of jobs.
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                tracing::warn!("worker thread exited with a panic");
            }
        }
    }
}

pub struct WorkerPool<T> {
    job_tx: Option<mpsc::Sender<Job<T>>>,
    done_rx: mpsc::Receiver<Completion<T>>,
    workers: Vec<thread::JoinHandle<()>>,
    submitted: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Spawns `capacity` workers (at least one).
    pub fn new(capacity: usize) -> Result<Self, PoolError> {
        let capacity = capacity.max(1);
        let (job_tx, job_rx) = mpsc::channel::<Job<T>>();
        let (done_tx, done_rx) = mpsc::channel();
        let job_rx = Arc::new(Mutex::new(job_rx));

        let mut workers = Vec::with_capacity(capacity);
        for i in 0..capacity {
            let jobs = Arc::clone(&job_rx);
            let done = done_tx.clone();
            let handle = thread::Builder::new()
                .name(format!("wikidl-worker-{}", i))
                .spawn(move || worker_loop(jobs, done))
                .map_err(PoolError::Spawn)?;
            workers.push(handle);
        }

        Ok(Self {
            job_tx: Some(job_tx),
            done_rx,
            workers,
            submitted: 0,
        })
    }

    pub fn capacity(&self) -> usize {
        self.workers.len()
    }

    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Queues a job. Fails once `shutdown` has been called.
    pub fn submit<F>(&mut self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce() -> T + Send + 'static,
    {
        let tx = self.job_tx.as_ref().ok_or(PoolError::ShutDown)?;
        tx.send(Box::new(job)).map_err(|_| PoolError::ShutDown)?;
        self.submitted += 1;
        Ok(())
    }

    /// Stops accepting jobs. Already queued jobs still run.
    pub fn shutdown(&mut self) {
        self.job_tx.take();
    }

    /// Shuts down (if not already) and waits up to `timeout` for every submitted job.
    pub fn await_termination(mut self, timeout: Duration) -> Termination<T> {
        self.shutdown();
        let deadline = Instant::now() + timeout;
        let mut completed = Vec::with_capacity(self.submitted);
        let mut panicked = 0usize;
        let mut timed_out = false;

        while completed.len() + panicked < self.submitted {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.done_rx.recv_timeout(remaining) {
                Ok(Completion::Done(value)) => completed.push(value),
                Ok(Completion::Panicked) => panicked += 1,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    timed_out = true;
                    break;
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        let unfinished = self.submitted - completed.len() - panicked;
        let mut detached = DetachedWorkers::default();
        for handle in self.workers.drain(..) {
            if timed_out && !handle.is_finished() {
                detached.handles.push(handle);
                continue;
            }
            if handle.join().is_err() {
                tracing::warn!("worker thread exited with a panic");
            }
        }
        if !detached.is_empty() {
            tracing::warn!(
                "await timed out with {} job(s) unfinished; leaving {} worker(s) running",
                unfinished,
                detached.len()
            );
        }

        Termination {
            completed,
            panicked,
            unfinished,
            timed_out,
            detached,
        }
    }
}

fn worker_loop<T>(jobs: Arc<Mutex<mpsc::Receiver<Job<T>>>>, done: mpsc::Sender<Completion<T>>) {
    loop {
        let next = match jobs.lock() {
            Ok(rx) => rx.recv(),
            Err(poisoned) => poisoned.into_inner().recv(),
        };
        let Ok(job) = next else {
            break;
        };
        let completion = match panic::catch_unwind(AssertUnwindSafe(job)) {
            Ok(value) => Completion::Done(value),
            Err(_) => {
                tracing::error!("job panicked; worker continues");
                Completion::Panicked
            }
        };
        // Nobody may be awaiting anymore; queued jobs still run to completion.
        let _ = done.send(completion);
    }
}
