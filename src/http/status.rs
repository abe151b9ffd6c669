//! # Códigos de Estado HTTP
//! src/http/status.rs
//!
//! Conjunto cerrado de códigos que el servidor puede emitir. Cualquier otro
//! código no es representable: el framer nunca recibe un estado desconocido.
//!
//! - **2xx**: 200 OK
//! - **4xx**: 400, 404
//! - **5xx**: 500, 501 y 505 (versión HTTP no soportada)

/// Representa los códigos de estado HTTP que soporta nuestro servidor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    /// 200 OK - La petición fue exitosa
    Ok = 200,

    /// 400 Bad Request - Request line vacía o malformada
    BadRequest = 400,

    /// 404 Not Found - El archivo no existe bajo la raíz
    NotFound = 404,

    /// 500 Internal Server Error - Falla de I/O o inesperada
    InternalServerError = 500,

    /// 501 Not Implemented - Método reconocido pero no servido
    NotImplemented = 501,

    /// 505 HTTP Version Not Supported - Prefijo `HTTP/` con versión desconocida
    HttpVersionNotSupported = 505,
}

impl StatusCode {
    /// Convierte el código a su valor numérico
    ///
    /// # Ejemplo
    /// ```
    /// use static_http_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// ```
    pub fn as_u16(&self) -> u16 {
        *self as u16
    }

    /// Retorna el texto de razón (reason phrase) asociado al código
    ///
    /// # Ejemplo
    /// ```
    /// use static_http_server::http::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotImplemented.reason_phrase(), "Not Implemented");
    /// ```
    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::InternalServerError => "Internal Server Error",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }

    /// Verifica si el código indica error del servidor (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.as_u16())
    }
}

impl std::fmt::Display for StatusCode {
    /// Formato: "200 OK"
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
