//! A module for thread pool.
//!
//! The server hands every accepted connection to a pool job, so one slow or
//! failing client never blocks or takes down another.
use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Mutex, mpsc},
    thread::{self},
};

use log::{debug, error};

use crate::error::{CalcError, Result};

/// A trait for thread pools.
pub trait ThreadPool: Sized {
    /// Create a new thread pool with `threads` workers.
    fn new(threads: u32) -> Result<Self>;
    /// Queue a job on the thread pool.
    fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static;
}

/// A job is a function that can be executed by a worker.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    NewJob(Job),
    Terminate,
}

/// Workers pulling jobs from one shared queue.
pub struct SharedQueueThreadPool {
    workers: Vec<Worker>,
    sender: mpsc::Sender<Message>,
}

impl ThreadPool for SharedQueueThreadPool {
    fn new(threads: u32) -> Result<Self> {
        if threads == 0 {
            return Err(CalcError::ThreadPool("pool needs at least one worker".into()));
        }
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));
        let mut workers = Vec::with_capacity(threads as usize);
        for id in 0..threads {
            workers.push(Worker::new(id, receiver.clone())?);
        }
        Ok(Self { workers, sender })
    }

    fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.sender
            .send(Message::NewJob(Box::new(job)))
            .map_err(|_| CalcError::ThreadPool("all workers have exited".into()))
    }
}

impl SharedQueueThreadPool {
    /// Number of workers.
    pub fn size(&self) -> usize {
        self.workers.len()
    }
}

impl Drop for SharedQueueThreadPool {
    fn drop(&mut self) {
        // Queued jobs run before the terminate messages reach the workers.
        for _ in &self.workers {
            let _ = self.sender.send(Message::Terminate);
        }

        for worker in &mut self.workers {
            if let Some(thread) = worker.thread.take() {
                if let Err(e) = thread.join() {
                    error!("Worker {} join failed: {:?}", worker.id, e);
                }
            }
        }
    }
}

struct Worker {
    id: u32,
    thread: Option<thread::JoinHandle<()>>,
}

impl Worker {
    fn new(id: u32, receiver: Arc<Mutex<mpsc::Receiver<Message>>>) -> Result<Self> {
        let thread = thread::Builder::new()
            .name(format!("netcalc-worker-{id}"))
            .spawn(move || {
                loop {
                    let msg = match receiver.lock() {
                        Ok(receiver) => receiver.recv(),
                        Err(_) => break,
                    };
                    match msg {
                        Ok(Message::NewJob(job)) => {
                            if let Err(e) = catch_unwind(AssertUnwindSafe(job)) {
                                error!("Worker {} job panicked: {:?}", id, e);
                            }
                        }
                        Ok(Message::Terminate) | Err(_) => break,
                    }
                }
                debug!("Worker {} exiting", id);
            })?;
        Ok(Self {
            id,
            thread: Some(thread),
        })
    }
}
