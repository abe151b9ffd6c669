//! # Framing de Respuestas HTTP
//! src/http/response.rs
//!
//! Convierte un [`ResponseDescriptor`] (estado, categoría, body, framing) en
//! bytes correctos para el cable, escribiéndolos directamente sobre el socket.
//!
//! ## Respuesta normal
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: text/html\r\n
//! Content-Length: 13\r\n
//! Connection: close\r\n
//! \r\n
//! <html></html>
//! ```
//!
//! ## Respuesta chunked
//!
//! ```text
//! HTTP/1.1 200 OK\r\n
//! Content-Type: image\r\n
//! Transfer-Encoding: chunked\r\n
//! Connection: close\r\n
//! \r\n
//! 400\r\n<1024 bytes>\r\n
//! 5\r\n<5 bytes>\r\n
//! 0\r\n
//! \r\n
//! ```
//!
//! Reglas por método:
//! - **HEAD**: solo headers; `Content-Length` sigue siendo el largo del body no enviado
//! - **TRACE**: después del body se agrega `\n` + el bloque de headers original

use super::{ContentCategory, Method, StatusCode};
use std::io::{self, Write};

/// Tamaño fijo de cada chunk
pub const CHUNK_SIZE: usize = 1024;

const CRLF: &[u8] = b"\r\n";
const HTTP_VERSION: &str = "HTTP/1.1";

/// Cómo se delimita el body en el cable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// `Content-Length` + body completo
    #[default]
    Whole,

    /// `Transfer-Encoding: chunked`
    Chunked,
}

/// Respuesta lista para escribir, construida por request
///
/// Para cualquier estado distinto de 200 el body es siempre vacío: los
/// constructores no permiten otra combinación.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseDescriptor {
    status: StatusCode,
    category: ContentCategory,
    body: Vec<u8>,
    framing: Framing,
}

impl ResponseDescriptor {
    /// 200 OK con body completo
    pub fn ok(category: ContentCategory, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::Ok,
            category,
            body,
            framing: Framing::Whole,
        }
    }

    /// 200 OK con el body partido en chunks
    pub fn chunked(category: ContentCategory, body: Vec<u8>) -> Self {
        Self {
            status: StatusCode::Ok,
            category,
            body,
            framing: Framing::Chunked,
        }
    }

    /// Respuesta de error: body vacío y `application/octet-stream`
    ///
    /// # Ejemplo
    /// ```
    /// use static_http_server::http::{ResponseDescriptor, StatusCode};
    ///
    /// let response = ResponseDescriptor::error(StatusCode::NotFound);
    /// let text = String::from_utf8(response.to_bytes(None, None)).unwrap();
    ///
    /// assert!(text.starts_with("HTTP/1.1 404 Not Found\r\n"));
    /// assert!(text.contains("Content-Length: 0\r\n"));
    /// ```
    pub fn error(status: StatusCode) -> Self {
        debug_assert!(status != StatusCode::Ok, "error response built with 200");
        Self {
            status,
            category: ContentCategory::Default,
            body: Vec::new(),
            framing: Framing::Whole,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn category(&self) -> ContentCategory {
        self.category
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    /// Status line + headers + línea vacía
    pub fn head_bytes(&self) -> Vec<u8> {
        let mut head = format!(
            "{} {}\r\nContent-Type: {}\r\n",
            HTTP_VERSION,
            self.status,
            self.category.content_type()
        );

        match self.framing {
            Framing::Whole => head.push_str(&format!("Content-Length: {}\r\n", self.body.len())),
            Framing::Chunked => head.push_str("Transfer-Encoding: chunked\r\n"),
        }

        head.push_str("Connection: close\r\n\r\n");
        head.into_bytes()
    }

    /// Escribe la respuesta completa sobre `out` y hace flush
    ///
    /// `method` decide las reglas de HEAD/TRACE; `request_head` es el bloque
    /// de headers original que TRACE devuelve como eco. Los errores de I/O se
    /// propagan tal cual: son errores de transporte, no de framing.
    pub fn write_to<W: Write>(
        &self,
        out: &mut W,
        method: Option<&Method>,
        request_head: Option<&str>,
    ) -> io::Result<()> {
        let is_head = matches!(method, Some(Method::HEAD));
        let is_trace = matches!(method, Some(Method::TRACE));

        out.write_all(&self.head_bytes())?;

        match self.framing {
            Framing::Whole => {
                if !is_head {
                    out.write_all(&self.body)?;
                }

                if is_trace {
                    if let Some(echo) = request_head {
                        out.write_all(b"\n")?;
                        out.write_all(echo.as_bytes())?;
                    }
                }
            }
            Framing::Chunked => {
                if !is_head {
                    write_chunks(out, &self.body)?;
                }
            }
        }

        out.flush()
    }

    /// Igual que [`write_to`](Self::write_to) pero a un buffer en memoria
    pub fn to_bytes(&self, method: Option<&Method>, request_head: Option<&str>) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(self.body.len() + 128);
        // Escribir a un Vec no falla
        let _ = self.write_to(&mut bytes, method, request_head);
        bytes
    }
}

/// Escribe `body` como secuencia de chunks de [`CHUNK_SIZE`] bytes
///
/// Cada chunk: tamaño en hexadecimal, CRLF, datos, CRLF. Termina con el
/// chunk de tamaño cero y un trailer vacío. Los cortes son por tamaño, sin
/// mirar el contenido.
pub fn write_chunks<W: Write>(out: &mut W, body: &[u8]) -> io::Result<()> {
    for chunk in body.chunks(CHUNK_SIZE) {
        write!(out, "{:x}", chunk.len())?;
        out.write_all(CRLF)?;
        out.write_all(chunk)?;
        out.write_all(CRLF)?;
    }

    out.write_all(b"0")?;
    out.write_all(CRLF)?;
    out.write_all(CRLF)
}
