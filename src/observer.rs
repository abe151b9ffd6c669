//! # Observadores de Requests
//! src/observer.rs
//!
//! El log de cada request/respuesta no es parte del motor de protocolo: se
//! engancha aquí. El servidor usa [`TracingObserver`] por defecto y
//! [`NoopObserver`] lo silencia.

use crate::http::StatusCode;
use std::net::SocketAddr;
use std::time::Duration;

/// Hook opcional llamado por cada conexión
///
/// Todos los métodos tienen implementación vacía; un observador implementa
/// solo los que le interesan.
pub trait RequestObserver: Send + Sync {
    /// Se leyó un request; `head` es el bloque de headers crudo
    fn on_request(&self, _peer: Option<SocketAddr>, _head: &str) {}

    /// Se escribió la respuesta completa
    fn on_response(&self, _peer: Option<SocketAddr>, _status: StatusCode, _elapsed: Duration) {}

    /// La conexión terminó con un error de transporte
    fn on_transport_error(&self, _peer: Option<SocketAddr>, _error: &std::io::Error) {}
}

/// Observador que no hace nada
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RequestObserver for NoopObserver {}

/// Observador que registra con `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl RequestObserver for TracingObserver {
    fn on_request(&self, peer: Option<SocketAddr>, head: &str) {
        let request_line = head.lines().next().unwrap_or_default();
        tracing::info!(peer = ?peer, request = %request_line, "request received");
        tracing::debug!(peer = ?peer, "request head:\n{}", head);
    }

    fn on_response(&self, peer: Option<SocketAddr>, status: StatusCode, elapsed: Duration) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;

        if status.is_server_error() {
            tracing::warn!(peer = ?peer, status = status.as_u16(), elapsed_ms, "response sent");
        } else {
            tracing::info!(peer = ?peer, status = status.as_u16(), elapsed_ms, "response sent");
        }
    }

    fn on_transport_error(&self, peer: Option<SocketAddr>, error: &std::io::Error) {
        tracing::warn!(peer = ?peer, error = %error, "transport error");
    }
}
