//! # Parsing de Requests HTTP/1.x
//! src/http/request.rs
//!
//! Este módulo convierte los bytes crudos de una conexión en un [`Request`]
//! validado, o en un [`ParseError`] que dice por qué se rechazó.
//!
//! ## Formato de un Request
//!
//! ```text
//! POST /params_info.html?lang=es HTTP/1.1\r\n
//! Content-Length: 17\r\n
//! Chunked: no\r\n
//! \r\n
//! name=Ada&lang=x86
//! ```
//!
//! ## Componentes
//!
//! 1. **Request Line**: `METHOD TARGET VERSION`
//! 2. **Headers**: solo se reconocen `Content-Length`, `Referer`,
//!    `User-Agent` y `Chunked` (comparación sensible a mayúsculas); el resto
//!    se ignora
//! 3. **Línea vacía**
//! 4. **Body**: pares `clave=valor` separados por `&`

use super::ContentCategory;
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

pub const CONTENT_LENGTH: &str = "Content-Length";
pub const REFERER: &str = "Referer";
pub const USER_AGENT: &str = "User-Agent";
pub const CHUNKED: &str = "Chunked";

const RECOGNIZED_HEADERS: [&str; 4] = [CONTENT_LENGTH, REFERER, USER_AGENT, CHUNKED];

/// Métodos HTTP reconocidos por el parser
///
/// PUT, DELETE y OPTIONS son sintácticamente válidos pero el router no los
/// sirve. Cualquier otro token queda como `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    HEAD,
    TRACE,
    PUT,
    DELETE,
    OPTIONS,
    Unknown(String),
}

impl Method {
    fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::GET,
            "POST" => Method::POST,
            "HEAD" => Method::HEAD,
            "TRACE" => Method::TRACE,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            "OPTIONS" => Method::OPTIONS,
            other => Method::Unknown(other.to_string()),
        }
    }

    /// Convierte el método a string
    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::HEAD => "HEAD",
            Method::TRACE => "TRACE",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::OPTIONS => "OPTIONS",
            Method::Unknown(token) => token,
        }
    }

    /// `true` para los métodos que el router atiende: GET, POST, HEAD y TRACE
    pub fn is_served(&self) -> bool {
        matches!(self, Method::GET | Method::POST | Method::HEAD | Method::TRACE)
    }
}

/// Versiones HTTP reconocidas (comparación literal del token completo)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpVersion {
    Http09,
    Http10,
    Http11,
    Http20,
    Http30,
}

impl HttpVersion {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "HTTP/0.9" => Some(HttpVersion::Http09),
            "HTTP/1.0" => Some(HttpVersion::Http10),
            "HTTP/1.1" => Some(HttpVersion::Http11),
            "HTTP/2.0" => Some(HttpVersion::Http20),
            "HTTP/3.0" => Some(HttpVersion::Http30),
            _ => None,
        }
    }
}

/// Motivos de rechazo de un request
///
/// `UnsupportedVersion` se mantiene aparte de `MalformedLine`: el primero es
/// un 505, el segundo un 400.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// Request vacío (o solo espacios)
    #[error("Empty request")]
    EmptyRequest,

    /// Menos de 3 tokens, versión sin prefijo `HTTP/` o bytes no UTF-8 en el head
    #[error("Invalid request line format")]
    MalformedLine,

    /// Prefijo `HTTP/` con una versión que no conocemos
    #[error("Unsupported HTTP version: {0}")]
    UnsupportedVersion(String),
}

/// Representa un request parseado. Inmutable una vez construido.
#[derive(Debug, Clone)]
pub struct Request {
    method: Method,

    /// Path normalizado, sin query string, nunca vacío
    target: String,

    version: HttpVersion,

    /// Solo los headers reconocidos (el último valor gana)
    headers: HashMap<String, String>,

    query_params: BTreeMap<String, String>,

    /// Pares decodificados del body; vacío si no hay body
    form_body: BTreeMap<String, String>,

    content_length: usize,

    wants_chunked: bool,

    category: ContentCategory,

    /// Bloque de headers original, usado para el eco de TRACE
    head: String,

    body: Vec<u8>,
}

/// Parser configurado con la página por defecto y las extensiones de imagen
#[derive(Debug, Clone)]
pub struct RequestParser {
    default_page: String,
    image_extensions: Vec<String>,
}

impl RequestParser {
    pub fn new(default_page: impl Into<String>, image_extensions: Vec<String>) -> Self {
        Self {
            default_page: default_page.into(),
            image_extensions,
        }
    }

    /// Parsea un request desde bytes
    ///
    /// # Retorna
    ///
    /// * `Ok(Request)` - Request válido
    /// * `Err(ParseError)` - Vacío, línea malformada o versión no soportada
    ///
    /// # Ejemplo
    ///
    /// ```
    /// use static_http_server::http::{Method, RequestParser};
    ///
    /// let parser = RequestParser::new("index.html", vec!["png".to_string()]);
    /// let request = parser.parse(b"GET /?lang=es HTTP/1.1\r\n\r\n").unwrap();
    ///
    /// assert_eq!(request.method(), &Method::GET);
    /// assert_eq!(request.target(), "/index.html");
    /// assert_eq!(request.query_param("lang"), Some("es"));
    /// ```
    pub fn parse(&self, raw: &[u8]) -> Result<Request, ParseError> {
        if raw.iter().all(u8::is_ascii_whitespace) {
            return Err(ParseError::EmptyRequest);
        }

        let (head, body) = split_head(raw);
        let head = std::str::from_utf8(head).map_err(|_| ParseError::MalformedLine)?;

        let mut lines = head.lines();

        // Se toleran líneas vacías antes de la request line
        let request_line = lines
            .by_ref()
            .find(|line| !line.trim().is_empty())
            .ok_or(ParseError::EmptyRequest)?;

        let (method, raw_target, version) = parse_request_line(request_line)?;

        let (path, query) = raw_target.split_once('?').unwrap_or((raw_target, ""));
        let query_params = decode_pairs(query);

        let mut target = normalize_target(path);
        if target == "/" {
            target = normalize_target(&self.default_page);
        }

        let headers = parse_headers(lines);

        let content_length = headers
            .get(CONTENT_LENGTH)
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(0);

        let wants_chunked = headers
            .get(CHUNKED)
            .is_some_and(|value| value.eq_ignore_ascii_case("yes"));

        let form_body = if body.is_empty() {
            BTreeMap::new()
        } else {
            decode_pairs(&String::from_utf8_lossy(body))
        };

        // La categoría se calcula cuando el target ya es definitivo
        let category = if method == Method::TRACE {
            ContentCategory::Message
        } else {
            ContentCategory::from_target(&target, &self.image_extensions)
        };

        Ok(Request {
            method,
            target,
            version,
            headers,
            query_params,
            form_body,
            content_length,
            wants_chunked,
            category,
            head: head.trim_end().to_string(),
            body: body.to_vec(),
        })
    }
}

/// Busca el fin del bloque de headers
///
/// Retorna `(largo_del_head, inicio_del_body)` si encuentra `\r\n\r\n` o `\n\n`.
pub fn find_head_end(buffer: &[u8]) -> Option<(usize, usize)> {
    let crlf = buffer.windows(4).position(|w| w == b"\r\n\r\n");
    let lf = buffer.windows(2).position(|w| w == b"\n\n");

    match (crlf, lf) {
        (Some(c), Some(l)) if l < c => Some((l, l + 2)),
        (Some(c), _) => Some((c, c + 4)),
        (None, Some(l)) => Some((l, l + 2)),
        (None, None) => None,
    }
}

/// `Content-Length` declarado en un bloque de headers crudo (0 si falta o es inválido)
///
/// Lo usa la conexión para saber cuántos bytes de body leer antes de parsear.
pub fn declared_content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .skip(1)
        .filter_map(|line| line.split_once(':'))
        .filter(|(name, _)| name.trim() == CONTENT_LENGTH)
        .filter_map(|(_, value)| value.trim().parse::<usize>().ok())
        .last()
        .unwrap_or(0)
}

fn split_head(raw: &[u8]) -> (&[u8], &[u8]) {
    match find_head_end(raw) {
        Some((head_len, body_start)) => (&raw[..head_len], &raw[body_start..]),
        None => (raw, &[]),
    }
}

/// Parsea la request line
///
/// Formato: `GET /path?query HTTP/1.1`. Tokens extra se ignoran.
fn parse_request_line(line: &str) -> Result<(Method, &str, HttpVersion), ParseError> {
    let parts: Vec<&str> = line.split_whitespace().collect();

    if parts.len() < 3 {
        return Err(ParseError::MalformedLine);
    }

    let version_token = parts[2];
    if !version_token.starts_with("HTTP/") {
        return Err(ParseError::MalformedLine);
    }

    let version = HttpVersion::from_token(version_token)
        .ok_or_else(|| ParseError::UnsupportedVersion(version_token.to_string()))?;

    Ok((Method::from_token(parts[0]), parts[1], version))
}

/// Resuelve `.`/`..` y separadores redundantes
///
/// Un `..` en la raíz se colapsa a la raíz: el resultado nunca sale de `/`.
/// `\` se trata como separador para que tampoco sirva para escapar.
///
/// # Ejemplo
/// ```
/// use static_http_server::http::request::normalize_target;
///
/// assert_eq!(normalize_target("/a/./b//../c.html"), "/a/c.html");
/// assert_eq!(normalize_target("/../../etc/passwd"), "/etc/passwd");
/// ```
pub fn normalize_target(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    format!("/{}", segments.join("/"))
}

/// Parsea los headers reconocidos; líneas sin `:` o desconocidas se ignoran
fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> HashMap<String, String> {
    let mut headers = HashMap::new();

    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        let name = name.trim();
        if RECOGNIZED_HEADERS.contains(&name) {
            headers.insert(name.to_string(), value.trim().to_string());
        }
    }

    headers
}

/// Decodifica `k1=v1&k2=v2` (URL-encoded); el último valor de una clave gana
///
/// Una clave sin `=` queda con valor vacío. Un par inválido nunca aborta el
/// parseo completo.
fn decode_pairs(input: &str) -> BTreeMap<String, String> {
    if input.is_empty() {
        return BTreeMap::new();
    }

    match serde_urlencoded::from_str::<Vec<(String, String)>>(input) {
        Ok(pairs) => pairs.into_iter().collect(),
        Err(e) => {
            tracing::debug!(error = %e, "form pairs could not be decoded, ignoring");
            BTreeMap::new()
        }
    }
}

impl Request {
    /// Obtiene el método HTTP del request
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Target normalizado (ya reescrito a la página por defecto si era `/`)
    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn version(&self) -> HttpVersion {
        self.version
    }

    /// Headers reconocidos
    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(|s| s.as_str())
    }

    pub fn referer(&self) -> Option<&str> {
        self.header(REFERER)
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.header(USER_AGENT)
    }

    pub fn query_params(&self) -> &BTreeMap<String, String> {
        &self.query_params
    }

    /// Obtiene un query parameter específico
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query_params.get(name).map(|s| s.as_str())
    }

    /// Pares `clave=valor` decodificados del body
    pub fn form_body(&self) -> &BTreeMap<String, String> {
        &self.form_body
    }

    /// `Content-Length` declarado (0 si falta o no es numérico)
    pub fn content_length(&self) -> usize {
        self.content_length
    }

    /// `true` si el cliente envió `Chunked: yes`
    pub fn wants_chunked(&self) -> bool {
        self.wants_chunked
    }

    pub fn category(&self) -> ContentCategory {
        self.category
    }

    /// Bloque de headers tal como llegó (request line incluida)
    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}
