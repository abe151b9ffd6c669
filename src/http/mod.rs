//! # Módulo HTTP
//!
//! Implementa el motor de protocolo desde cero, sin librerías de alto nivel:
//!
//! - Parsing y validación de requests HTTP/1.x
//! - Framing de respuestas (completas o chunked, reglas de HEAD/TRACE)
//! - Códigos de estado
//! - Categorías de contenido para `Content-Type`
//!
//! Una conexión atiende exactamente un request y se cierra: no hay
//! keep-alive ni pipelining.

pub mod content;   // Categorías de contenido
pub mod request;   // Parsing de requests
pub mod response;  // Framing de respuestas
pub mod status;    // Códigos de estado HTTP

// Re-exportamos los tipos principales para facilitar su uso
pub use content::ContentCategory;
pub use request::{HttpVersion, Method, ParseError, Request, RequestParser};
pub use response::{Framing, ResponseDescriptor};
pub use status::StatusCode;
