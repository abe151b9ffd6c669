//! # Servidor TCP Concurrente
//! src/server/tcp.rs
//!
//! Acepta conexiones en un loop y las despacha a un pool fijo de workers.
//! Antes de despachar toma un permiso de admisión: con `maxThreads` requests
//! en curso el acceptor espera, y los clientes extra quedan en cola en vez
//! de ser rechazados.

use super::admission::AdmissionControl;
use super::connection::ConnectionHandler;
use super::pool::WorkerPool;
use crate::config::ServerConfig;
use crate::error::ServerError;
use crate::observer::{RequestObserver, TracingObserver};
use crate::router::{DiskStore, FileStore, Router};
use std::net::TcpListener;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Espera tras el primer error de `accept`
const ACCEPT_BACKOFF_MIN: Duration = Duration::from_millis(10);

/// Tope de la espera entre errores de `accept` consecutivos
const ACCEPT_BACKOFF_MAX: Duration = Duration::from_secs(1);

/// Servidor HTTP de archivos estáticos
pub struct Server {
    config: ServerConfig,
    store: Arc<dyn FileStore>,
    observer: Arc<dyn RequestObserver>,
    admission: Arc<AdmissionControl>,
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("admission", &self.admission)
            .finish_non_exhaustive()
    }
}

impl Server {
    /// Servidor sobre el disco local que registra con `tracing`
    pub fn new(config: ServerConfig) -> Self {
        let admission = AdmissionControl::new(config.max_threads);

        Self {
            config,
            store: Arc::new(DiskStore),
            observer: Arc::new(TracingObserver),
            admission,
        }
    }

    /// Reemplaza el almacén de archivos
    pub fn with_store(mut self, store: Arc<dyn FileStore>) -> Self {
        self.store = store;
        self
    }

    /// Reemplaza el observador de requests
    pub fn with_observer(mut self, observer: Arc<dyn RequestObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Semáforo de admisión compartido con los workers
    pub fn admission(&self) -> Arc<AdmissionControl> {
        Arc::clone(&self.admission)
    }

    /// Hace bind en `host:port` y atiende conexiones indefinidamente
    pub fn run(&self) -> Result<(), ServerError> {
        let address = self.config.address();
        let listener = TcpListener::bind(&address).map_err(|source| ServerError::Bind {
            address: address.clone(),
            source,
        })?;

        tracing::info!(address = %address, "server listening");
        self.serve(listener)
    }

    /// Atiende conexiones de un listener ya abierto
    pub fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let pool = WorkerPool::new(self.config.max_threads)?;
        let handler = Arc::new(self.connection_handler());

        tracing::info!(
            workers = pool.size(),
            capacity = self.admission.capacity(),
            "accepting connections"
        );

        let mut backoff = AcceptBackoff::default();

        for stream in listener.incoming() {
            match stream {
                Ok(stream) => {
                    backoff.reset();
                    let permit = self.admission.acquire();
                    let handler = Arc::clone(&handler);

                    pool.execute(move || {
                        let _permit = permit;
                        handler.handle(stream);
                    })?;
                }
                Err(e) => {
                    // Errores como EMFILE se repiten en seguida
                    let delay = backoff.next_delay();
                    tracing::warn!(
                        error = %e,
                        retry_in_ms = delay.as_millis() as u64,
                        "failed to accept connection"
                    );
                    thread::sleep(delay);
                }
            }
        }

        pool.shutdown()
    }

    fn connection_handler(&self) -> ConnectionHandler {
        ConnectionHandler::new(
            self.config.request_parser(),
            Router::new(self.config.root.clone(), Arc::clone(&self.store)),
            Arc::clone(&self.observer),
            self.config.read_timeout(),
        )
    }
}

/// Backoff exponencial entre errores de `accept` consecutivos
#[derive(Debug)]
struct AcceptBackoff {
    next: Duration,
}

impl Default for AcceptBackoff {
    fn default() -> Self {
        Self {
            next: ACCEPT_BACKOFF_MIN,
        }
    }
}

impl AcceptBackoff {
    /// Espera a aplicar ahora; la siguiente se duplica hasta el tope
    fn next_delay(&mut self) -> Duration {
        let delay = self.next;
        self.next = (self.next * 2).min(ACCEPT_BACKOFF_MAX);
        delay
    }

    fn reset(&mut self) {
        self.next = ACCEPT_BACKOFF_MIN;
    }
}
