//! # Pool de Workers
//! src/server/pool.rs
//!
//! Pool de tamaño fijo: cada worker toma trabajos de un canal acotado y los
//! ejecuta de principio a fin. Un panic dentro de un trabajo se captura y se
//! registra; el worker sigue vivo para el siguiente.

use crate::error::ServerError;
use crossbeam::channel::{self, Receiver, Sender};
use std::any::Any;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, JoinHandle};

type Job = Box<dyn FnOnce() + Send + 'static>;

/// Pool de threads de tamaño fijo
#[derive(Debug)]
pub struct WorkerPool {
    sender: Option<Sender<Job>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Inicia `size` workers (mínimo 1)
    pub fn new(size: usize) -> io::Result<Self> {
        let size = size.max(1);
        let (sender, receiver) = channel::bounded::<Job>(size);

        let workers = (0..size)
            .map(|id| {
                let receiver = receiver.clone();
                thread::Builder::new()
                    .name(format!("worker-{}", id))
                    .spawn(move || worker_loop(id, receiver))
            })
            .collect::<io::Result<Vec<_>>>()?;

        tracing::debug!(workers = size, "worker pool started");

        Ok(Self {
            sender: Some(sender),
            workers,
        })
    }

    /// Cantidad de workers
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Cierra el canal y espera a que cada worker termine su trabajo actual
    pub fn shutdown(mut self) -> Result<(), ServerError> {
        self.stop()
    }

    /// Encola un trabajo; bloquea si el canal está lleno
    pub fn execute<F>(&self, job: F) -> Result<(), ServerError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or_else(pool_closed)?;
        sender.send(Box::new(job)).map_err(|_| pool_closed())
    }
}

impl WorkerPool {
    fn stop(&mut self) -> Result<(), ServerError> {
        // Cerrar el canal hace que cada worker salga de su loop
        drop(self.sender.take());

        let panicked = self
            .workers
            .drain(..)
            .map(JoinHandle::join)
            .filter(Result::is_err)
            .count();

        if panicked > 0 {
            return Err(ServerError::WorkerPanic(format!(
                "{} worker thread(s) exited abnormally",
                panicked
            )));
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::error!(error = %e, "worker pool shutdown");
        }
    }
}

fn pool_closed() -> ServerError {
    ServerError::Io(io::Error::other("worker pool is closed"))
}

/// Loop principal del worker
fn worker_loop(id: usize, receiver: Receiver<Job>) {
    while let Ok(job) = receiver.recv() {
        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            tracing::error!(worker = id, panic = %panic_message(payload.as_ref()), "job panicked");
        }
    }

    tracing::debug!(worker = id, "worker stopped");
}

/// Texto de un payload de panic (`&str` o `String`)
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{mpsc, Arc};
    use std::time::Duration;

    #[test]
    fn test_pool_runs_all_jobs() {
        let pool = WorkerPool::new(3).unwrap();
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = mpsc::channel();

        for _ in 0..10 {
            let counter = Arc::clone(&counter);
            let tx = tx.clone();
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                tx.send(()).unwrap();
            })
            .unwrap();
        }

        for _ in 0..10 {
            rx.recv_timeout(Duration::from_secs(5)).unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 10);
        assert_eq!(pool.size(), 3);
    }

    #[test]
    fn test_worker_survives_panic() {
        let pool = WorkerPool::new(1).unwrap();
        let (tx, rx) = mpsc::channel();

        pool.execute(|| panic!("boom")).unwrap();
        pool.execute(move || tx.send(42).unwrap()).unwrap();

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
    }

    #[test]
    fn test_drop_joins_workers() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(2).unwrap();
            for _ in 0..4 {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    thread::sleep(Duration::from_millis(10));
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        assert_eq!(counter.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn test_shutdown_after_job_panic_is_clean() {
        let pool = WorkerPool::new(2).unwrap();
        pool.execute(|| panic!("caught at the worker boundary")).unwrap();

        assert!(pool.shutdown().is_ok());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static str");
        assert_eq!(panic_message(payload.as_ref()), "static str");

        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
