//! # Módulo del Servidor HTTP
//! src/server/mod.rs
//!
//! Este módulo implementa el servidor TCP que:
//! 1. Escucha en `host:port`
//! 2. Acepta conexiones y toma un permiso de admisión por cada una
//! 3. Despacha la conexión a un pool fijo de workers
//! 4. Lee, parsea, rutea y responde un único request por conexión

pub mod admission;
pub mod connection;
pub mod pool;
pub mod tcp;

// Re-exportar para facilitar el uso
pub use admission::{AdmissionControl, Permit};
pub use connection::{ConnectionHandler, Reply};
pub use pool::WorkerPool;
pub use tcp::Server;
