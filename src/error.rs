//! # Errores del Servidor
//! src/error.rs
//!
//! Errores de arranque (configuración, bind) y de transporte. Los errores de
//! protocolo viven en [`crate::http::ParseError`] y nunca llegan hasta aquí:
//! se convierten en una respuesta 400/505.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Problemas al cargar o validar la configuración
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid value for `{key}`: {value:?}")]
    InvalidValue { key: String, value: String },

    #[error("{0}")]
    Invalid(String),
}

/// Errores del servidor y de una conexión
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("worker panicked: {0}")]
    WorkerPanic(String),
}
