//! # Sistema de Routing
//! src/router/mod.rs
//!
//! Decide cómo responder a un request ya parseado. La decisión es una
//! función sin efectos secundarios (fuera de leer el [`FileStore`]) que
//! devuelve un [`Outcome`] etiquetado.
//!
//! ## Orden de decisión (gana el primero que aplica)
//!
//! ```text
//! request inválido / vacío           → 400
//! versión HTTP desconocida           → 505
//! método fuera de GET/POST/HEAD/TRACE → 501
//! POST /params_info.html             → 200 con eco HTML del formulario
//! archivo inexistente                → 404
//! archivo existente                  → 200 (chunked si `Chunked: yes`)
//! error al leer                      → 500
//! ```

pub mod store;

pub use store::{DiskStore, FileStore, MemoryStore};

use crate::http::{ContentCategory, Method, ParseError, Request, ResponseDescriptor, StatusCode};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

/// Ruta reservada que hace eco de los campos de un formulario POST
pub const PARAMS_INFO_PATH: &str = "/params_info.html";

/// Resultado de rutear un request: una variante por combinación estado/body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    BadRequest,
    VersionNotSupported,
    NotImplemented,
    /// Página HTML generada para `POST /params_info.html`
    ParamsInfo(Vec<u8>),
    NotFound,
    File {
        category: ContentCategory,
        body: Vec<u8>,
        chunked: bool,
    },
    InternalError,
}

impl Outcome {
    pub fn status(&self) -> StatusCode {
        match self {
            Outcome::BadRequest => StatusCode::BadRequest,
            Outcome::VersionNotSupported => StatusCode::HttpVersionNotSupported,
            Outcome::NotImplemented => StatusCode::NotImplemented,
            Outcome::ParamsInfo(_) | Outcome::File { .. } => StatusCode::Ok,
            Outcome::NotFound => StatusCode::NotFound,
            Outcome::InternalError => StatusCode::InternalServerError,
        }
    }

    /// Convierte el resultado en la respuesta a escribir
    pub fn into_response(self) -> ResponseDescriptor {
        match self {
            Outcome::ParamsInfo(body) => ResponseDescriptor::ok(ContentCategory::Html, body),
            Outcome::File { category, body, chunked: false } => ResponseDescriptor::ok(category, body),
            Outcome::File { category, body, chunked: true } => ResponseDescriptor::chunked(category, body),
            other => ResponseDescriptor::error(other.status()),
        }
    }
}

/// Router de archivos estáticos bajo una raíz
#[derive(Clone)]
pub struct Router {
    root: PathBuf,
    store: Arc<dyn FileStore>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router").field("root", &self.root).finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(root: impl Into<PathBuf>, store: Arc<dyn FileStore>) -> Self {
        Self {
            root: root.into(),
            store,
        }
    }

    /// Ruta en disco para un target ya normalizado
    ///
    /// El target nunca contiene `..` (ver [`crate::http::request::normalize_target`]),
    /// así que el resultado siempre queda debajo de la raíz.
    pub fn resolve(&self, target: &str) -> PathBuf {
        self.root.join(target.trim_start_matches('/'))
    }

    /// Decide la respuesta para un resultado de parseo
    ///
    /// # Ejemplo
    /// ```
    /// use static_http_server::http::{RequestParser, StatusCode};
    /// use static_http_server::router::{MemoryStore, Router};
    /// use std::sync::Arc;
    ///
    /// let store = MemoryStore::new().with_file("/www/index.html", "<h1>hi</h1>");
    /// let router = Router::new("/www", Arc::new(store));
    /// let parser = RequestParser::new("index.html", vec![]);
    ///
    /// let outcome = router.route(&parser.parse(b"GET / HTTP/1.1\r\n\r\n"));
    /// assert_eq!(outcome.status(), StatusCode::Ok);
    /// ```
    pub fn route(&self, parsed: &Result<Request, ParseError>) -> Outcome {
        let request = match parsed {
            Ok(request) => request,
            Err(ParseError::UnsupportedVersion(_)) => return Outcome::VersionNotSupported,
            Err(ParseError::EmptyRequest | ParseError::MalformedLine) => return Outcome::BadRequest,
        };

        if !request.method().is_served() {
            return Outcome::NotImplemented;
        }

        if *request.method() == Method::POST && request.target() == PARAMS_INFO_PATH {
            return Outcome::ParamsInfo(params_info_page(request.form_body()).into_bytes());
        }

        let path = self.resolve(request.target());
        if !self.store.exists(&path) {
            return Outcome::NotFound;
        }

        match self.store.read_all(&path) {
            Ok(body) => Outcome::File {
                category: request.category(),
                body,
                chunked: request.wants_chunked(),
            },
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to read file");
                Outcome::InternalError
            }
        }
    }
}

/// Página HTML con un `<p>` por cada par del formulario
fn params_info_page(form: &BTreeMap<String, String>) -> String {
    let mut content = String::from("<html><body>");
    for (key, value) in form {
        content.push_str("<p>");
        content.push_str(&escape_html(key));
        content.push_str(": ");
        content.push_str(&escape_html(value));
        content.push_str("</p>");
    }
    content.push_str("</body></html>");
    content
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{Framing, RequestParser};
    use std::io;
    use std::path::Path;

    fn parser() -> RequestParser {
        RequestParser::new("index.html", vec!["png".to_string(), "jpg".to_string()])
    }

    fn router() -> Router {
        let store = MemoryStore::new()
            .with_file("/www/index.html", "<h1>home</h1>")
            .with_file("/www/img/cat.png", vec![0x89, b'P', b'N', b'G'])
            .with_file("/www/etc/passwd", "not the real one");
        Router::new("/www", Arc::new(store))
    }

    fn route(raw: &[u8]) -> Outcome {
        router().route(&parser().parse(raw))
    }

    #[test]
    fn test_invalid_requests_are_400() {
        for raw in [&b""[..], b"GET\r\n\r\n", b"GET /index.html\r\n\r\n", b"GET / FTP/1.0\r\n\r\n"] {
            assert_eq!(route(raw), Outcome::BadRequest);
        }
    }

    #[test]
    fn test_unsupported_version_is_505_not_400() {
        let outcome = route(b"GET /a.html HTTP/9.9\r\n\r\n");
        assert_eq!(outcome, Outcome::VersionNotSupported);
        assert_eq!(outcome.status(), StatusCode::HttpVersionNotSupported);
    }

    #[test]
    fn test_unserved_methods_are_501() {
        for method in ["PUT", "DELETE", "OPTIONS", "PATCH", "BREW"] {
            for target in ["/index.html", "/missing.html"] {
                let raw = format!("{} {} HTTP/1.1\r\n\r\n", method, target);
                assert_eq!(route(raw.as_bytes()), Outcome::NotImplemented, "{}", method);
            }
        }
    }

    #[test]
    fn test_get_default_page() {
        match route(b"GET / HTTP/1.1\r\n\r\n") {
            Outcome::File { category, body, chunked } => {
                assert_eq!(category, ContentCategory::Html);
                assert_eq!(body, b"<h1>home</h1>");
                assert!(!chunked);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_missing_file_is_404() {
        assert_eq!(route(b"GET /missing.png HTTP/1.1\r\n\r\n"), Outcome::NotFound);
        assert_eq!(route(b"HEAD /nope.html HTTP/1.1\r\n\r\n"), Outcome::NotFound);
    }

    #[test]
    fn test_chunked_request() {
        let outcome = route(b"GET /img/cat.png HTTP/1.1\r\nChunked: yes\r\n\r\n");
        let response = outcome.into_response();

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.framing(), Framing::Chunked);
        assert_eq!(response.category(), ContentCategory::Image);
    }

    #[test]
    fn test_params_info_echo() {
        let outcome = route(b"POST /params_info.html HTTP/1.1\r\nContent-Length: 17\r\n\r\nname=Ada&lang=x86");
        let response = outcome.into_response();
        let body = String::from_utf8(response.body().to_vec()).unwrap();

        assert_eq!(response.status(), StatusCode::Ok);
        assert_eq!(response.category(), ContentCategory::Html);
        assert_eq!(body, "<html><body><p>lang: x86</p><p>name: Ada</p></body></html>");
    }

    #[test]
    fn test_params_info_escapes_html() {
        let outcome = route(b"POST /params_info.html HTTP/1.1\r\n\r\nx=%3Cb%3E%26");
        let Outcome::ParamsInfo(body) = outcome else {
            panic!("expected params info");
        };
        assert_eq!(String::from_utf8(body).unwrap(), "<html><body><p>x: &lt;b&gt;&amp;</p></body></html>");
    }

    #[test]
    fn test_get_params_info_is_a_plain_file_lookup() {
        assert_eq!(route(b"GET /params_info.html HTTP/1.1\r\n\r\n"), Outcome::NotFound);
    }

    #[test]
    fn test_dot_dot_stays_under_root() {
        let router = router();
        for target in ["/../../etc/passwd", "/a/../../etc/passwd", "/..", "/./../x"] {
            let raw = format!("GET {} HTTP/1.1\r\n\r\n", target);
            let request = parser().parse(raw.as_bytes()).unwrap();
            let path = router.resolve(request.target());

            assert!(path.starts_with("/www"), "{} escaped to {}", target, path.display());
            assert!(!path.components().any(|c| c == std::path::Component::ParentDir));
        }

        // El passwd "real" del almacén es el que está bajo la raíz
        match route(b"GET /../../etc/passwd HTTP/1.1\r\n\r\n") {
            Outcome::File { body, .. } => assert_eq!(body, b"not the real one"),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    struct UnreadableStore;

    impl FileStore for UnreadableStore {
        fn exists(&self, _path: &Path) -> bool {
            true
        }

        fn read_all(&self, _path: &Path) -> io::Result<Vec<u8>> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))
        }
    }

    #[test]
    fn test_read_failure_is_500() {
        let router = Router::new("/www", Arc::new(UnreadableStore));
        let outcome = router.route(&parser().parse(b"GET /index.html HTTP/1.1\r\n\r\n"));

        assert_eq!(outcome, Outcome::InternalError);
        assert!(outcome.into_response().body().is_empty());
    }

    #[test]
    fn test_non_200_outcomes_have_empty_bodies() {
        for outcome in [
            Outcome::BadRequest,
            Outcome::VersionNotSupported,
            Outcome::NotImplemented,
            Outcome::NotFound,
            Outcome::InternalError,
        ] {
            let status = outcome.status();
            let response = outcome.into_response();
            assert_eq!(response.status(), status);
            assert!(response.body().is_empty());
        }
    }
}
