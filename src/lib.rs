//! # Static HTTP Server
//! src/lib.rs
//!
//! Servidor HTTP/1.x mínimo que sirve archivos estáticos desde un directorio
//! raíz. Una conexión lleva un único request; la respuesta siempre cierra
//! la conexión.
//!
//! ## Arquitectura
//!
//! El servidor está dividido en módulos especializados:
//! - `config`: Carga de `config.ini` y overrides de CLI/entorno
//! - `http`: Parser de requests, categorías de contenido y serialización de respuestas
//! - `router`: Decisión de estado/body y acceso a archivos
//! - `server`: Acceptor TCP, control de admisión y pool de workers
//! - `observer`: Hook de logging por request
//! - `error`: Errores de arranque y de transporte
//!
//! ## Ejemplo de uso
//!
//! ```no_run
//! use static_http_server::config::ServerConfig;
//! use static_http_server::server::Server;
//!
//! let config = ServerConfig::default();
//! let server = Server::new(config);
//! server.run().expect("Error al iniciar servidor");
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod observer;
pub mod router;
pub mod server;

pub use config::{Cli, ServerConfig};
pub use error::{ConfigError, ServerError};
pub use server::Server;
