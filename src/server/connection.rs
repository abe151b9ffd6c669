//! # Manejo de Conexiones
//! src/server/connection.rs
//!
//! Una conexión = un request = una respuesta. El handler lee el bloque de
//! headers (y el body si hay `Content-Length`), parsea, rutea, escribe la
//! respuesta y cierra. Ningún error sale de aquí: los de protocolo se
//! convierten en respuestas, los de transporte se reportan al observador y
//! los panics se atrapan por etapa.

use super::pool::panic_message;
use crate::http::request::{declared_content_length, find_head_end};
use crate::http::{Method, ParseError, RequestParser, ResponseDescriptor, StatusCode};
use crate::observer::RequestObserver;
use crate::router::{Outcome, Router};
use std::borrow::Cow;
use std::io::{self, BufWriter, ErrorKind, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Tope del bloque de headers
pub const MAX_HEAD_BYTES: usize = 16 * 1024;

/// Tope del body leído por `Content-Length`
pub const MAX_BODY_BYTES: usize = 1024 * 1024;

const READ_CHUNK: usize = 4096;

/// Respuesta lista para escribir, con el contexto del request que la pidió
#[derive(Debug)]
pub struct Reply {
    pub response: ResponseDescriptor,

    /// `None` si el request no se pudo parsear
    pub method: Option<Method>,

    /// Bloque de headers original, para el eco de TRACE
    pub request_head: Option<String>,
}

impl Reply {
    pub fn status(&self) -> StatusCode {
        self.response.status()
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        self.response
            .write_to(out, self.method.as_ref(), self.request_head.as_deref())
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.response
            .to_bytes(self.method.as_ref(), self.request_head.as_deref())
    }
}

/// Procesa conexiones aceptadas; se comparte entre workers
pub struct ConnectionHandler {
    parser: RequestParser,
    router: Router,
    observer: Arc<dyn RequestObserver>,
    read_timeout: Option<Duration>,
}

impl std::fmt::Debug for ConnectionHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandler")
            .field("parser", &self.parser)
            .field("router", &self.router)
            .field("read_timeout", &self.read_timeout)
            .finish_non_exhaustive()
    }
}

impl ConnectionHandler {
    pub fn new(
        parser: RequestParser,
        router: Router,
        observer: Arc<dyn RequestObserver>,
        read_timeout: Option<Duration>,
    ) -> Self {
        Self {
            parser,
            router,
            observer,
            read_timeout,
        }
    }

    /// Atiende una conexión completa y la cierra
    ///
    /// Un panic antes de escribir la respuesta se contesta con 500; uno
    /// durante o después de la escritura solo se registra.
    pub fn handle(&self, stream: TcpStream) {
        let started = Instant::now();
        let peer = stream.peer_addr().ok();

        if let Err(e) = stream.set_read_timeout(self.read_timeout) {
            guarded("observer", || self.observer.on_transport_error(peer, &e));
        }

        let raw = match read_request(&mut &stream) {
            Ok(raw) => raw,
            Err(e) => {
                guarded("observer", || self.observer.on_transport_error(peer, &e));
                self.write_internal_error(&stream, peer, started);
                close(&stream);
                return;
            }
        };

        let reply = guarded("respond", || {
            self.observer.on_request(peer, &head_text(&raw));
            self.respond(&raw)
        });

        match reply {
            Some(reply) => {
                guarded("write", || match reply.write_to(&mut BufWriter::new(&stream)) {
                    Ok(()) => self.observer.on_response(peer, reply.status(), started.elapsed()),
                    Err(e) => self.observer.on_transport_error(peer, &e),
                });
            }
            None => self.write_internal_error(&stream, peer, started),
        }

        close(&stream);
    }

    /// Calcula la respuesta para los bytes crudos de un request
    ///
    /// Un panic del parser cuenta como request inválido (400) y uno del
    /// router como 500.
    pub fn respond(&self, raw: &[u8]) -> Reply {
        let parsed = guarded("parse", || self.parser.parse(raw))
            .unwrap_or(Err(ParseError::MalformedLine));

        let outcome = guarded("route", || self.router.route(&parsed))
            .unwrap_or(Outcome::InternalError);

        let (method, request_head) = match &parsed {
            Ok(request) => (Some(request.method().clone()), Some(request.head().to_string())),
            Err(_) => (None, None),
        };

        Reply {
            response: outcome.into_response(),
            method,
            request_head,
        }
    }

    /// 500 de mejor esfuerzo: el cliente puede ya no estar
    fn write_internal_error(&self, stream: &TcpStream, peer: Option<SocketAddr>, started: Instant) {
        let response = ResponseDescriptor::error(StatusCode::InternalServerError);

        if response.write_to(&mut BufWriter::new(stream), None, None).is_ok() {
            guarded("observer", || {
                self.observer.on_response(peer, response.status(), started.elapsed())
            });
        }
    }
}

/// Ejecuta `f` atrapando un panic; `None` si hubo panic
fn guarded<T>(stage: &'static str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            tracing::error!(stage, panic = %panic_message(payload.as_ref()), "connection handler panicked");
            None
        }
    }
}

/// Lee un request: headers hasta la línea vacía y luego `Content-Length` bytes
///
/// Termina antes si el peer cierra. Los topes [`MAX_HEAD_BYTES`] y
/// [`MAX_BODY_BYTES`] acotan la memoria por conexión.
pub fn read_request<R: Read>(reader: &mut R) -> io::Result<Vec<u8>> {
    let mut buffer = Vec::with_capacity(READ_CHUNK);
    let mut chunk = [0u8; READ_CHUNK];

    let body_start = loop {
        if let Some((_, body_start)) = find_head_end(&buffer) {
            break body_start;
        }
        if buffer.len() >= MAX_HEAD_BYTES {
            return Ok(buffer);
        }

        let n = read_some(reader, &mut chunk)?;
        if n == 0 {
            return Ok(buffer);
        }
        buffer.extend_from_slice(&chunk[..n]);
    };

    let wanted = declared_content_length(&buffer[..body_start]).min(MAX_BODY_BYTES);
    let total = body_start + wanted;

    while buffer.len() < total {
        let n = read_some(reader, &mut chunk)?;
        if n == 0 {
            break;
        }
        buffer.extend_from_slice(&chunk[..n]);
    }

    buffer.truncate(total);
    Ok(buffer)
}

fn read_some<R: Read>(reader: &mut R, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match reader.read(chunk) {
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Bloque de headers como texto, para el observador
fn head_text(raw: &[u8]) -> Cow<'_, str> {
    let head = match find_head_end(raw) {
        Some((head_len, _)) => &raw[..head_len],
        None => raw,
    };
    String::from_utf8_lossy(head)
}

fn close(stream: &TcpStream) {
    // El peer puede haber cerrado antes; no hay nada más que hacer
    let _ = stream.shutdown(Shutdown::Write);
}
