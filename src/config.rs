//! # Configuración del Servidor
//! src/config.rs
//!
//! La configuración se carga una sola vez al arrancar desde un archivo
//! `clave=valor` y puede sobrescribirse desde la línea de comandos o con
//! variables de entorno.
//!
//! ## Archivo
//! ```text
//! # config.ini
//! port=8080
//! root=./www
//! defaultPage=index.html
//! maxThreads=10
//! imageExtensions=jpg,png,gif,bmp
//! readTimeoutMs=30000
//! ```
//!
//! ## CLI
//! ```bash
//! ./static_http_server --config config.ini --port 9090
//! HTTP_ROOT=/srv/www ./static_http_server
//! ```

use crate::error::ConfigError;
use crate::http::RequestParser;
use clap::Parser;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Argumentos de línea de comandos
#[derive(Debug, Clone, Parser)]
#[command(name = "static_http_server")]
#[command(about = "Servidor HTTP/1.x mínimo para archivos estáticos")]
#[command(version = "0.1.0")]
pub struct Cli {
    /// Archivo de configuración `clave=valor`
    #[arg(short, long, default_value = "config.ini", env = "HTTP_CONFIG")]
    pub config: PathBuf,

    /// Sobrescribe `port`
    #[arg(short, long, env = "HTTP_PORT")]
    pub port: Option<u16>,

    /// Sobrescribe `host`
    #[arg(long, env = "HTTP_HOST")]
    pub host: Option<String>,

    /// Sobrescribe `root`
    #[arg(long, env = "HTTP_ROOT")]
    pub root: Option<PathBuf>,
}

/// Configuración efectiva del servidor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Host/IP en el que escucha
    pub host: String,

    /// Puerto en el que escucha
    pub port: u16,

    /// Raíz de los archivos estáticos
    pub root: PathBuf,

    /// Documento servido para `/`
    pub default_page: String,

    /// Límite de requests procesados a la vez (y tamaño del pool)
    pub max_threads: usize,

    /// Extensiones que se sirven como `image`
    pub image_extensions: Vec<String>,

    /// Timeout de lectura por conexión en milisegundos (0 = sin timeout)
    pub read_timeout_ms: u64,
}

impl ServerConfig {
    /// Lee y parsea un archivo de configuración (sin validar)
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        text.parse()
    }

    /// Carga el archivo indicado en la CLI, aplica los overrides y valida
    pub fn from_cli(cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::load(&cli.config)?;

        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(host) = &cli.host {
            config.host = host.clone();
        }
        if let Some(root) = &cli.root {
            config.root = root.clone();
        }

        config.validate()?;
        Ok(config)
    }

    /// Obtiene la dirección completa para bind (host:port)
    ///
    /// # Ejemplo
    /// ```rust
    /// use static_http_server::config::ServerConfig;
    ///
    /// let config = ServerConfig::default();
    /// assert_eq!(config.address(), "127.0.0.1:8080");
    /// ```
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        (self.read_timeout_ms > 0).then(|| Duration::from_millis(self.read_timeout_ms))
    }

    /// Parser configurado con la página por defecto y las extensiones de imagen
    pub fn request_parser(&self) -> RequestParser {
        RequestParser::new(self.default_page.clone(), self.image_extensions.clone())
    }

    /// Valida la configuración
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == 0 {
            return Err(ConfigError::Invalid("maxThreads must be >= 1".to_string()));
        }

        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("root must not be empty".to_string()));
        }

        let page = self.default_page.trim_matches('/');
        if page.is_empty() {
            return Err(ConfigError::Invalid("defaultPage must not be empty".to_string()));
        }
        if page.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(ConfigError::Invalid(
                "defaultPage must not contain `..`".to_string(),
            ));
        }

        Ok(())
    }

    /// Registra un resumen de la configuración
    pub fn log_summary(&self) {
        tracing::info!(
            address = %self.address(),
            root = %self.root.display(),
            default_page = %self.default_page,
            max_threads = self.max_threads,
            image_extensions = %self.image_extensions.join(","),
            read_timeout_ms = self.read_timeout_ms,
            "configuration loaded"
        );
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "host" => self.host = value.to_string(),
            "port" => self.port = parse_value(key, value)?,
            "root" => self.root = PathBuf::from(value),
            "defaultPage" => self.default_page = value.to_string(),
            "maxThreads" => self.max_threads = parse_value(key, value)?,
            "imageExtensions" => {
                self.image_extensions = value
                    .split(',')
                    .map(str::trim)
                    .filter(|ext| !ext.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "readTimeoutMs" => self.read_timeout_ms = parse_value(key, value)?,
            _ => tracing::warn!(key, "unknown configuration key ignored"),
        }

        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl FromStr for ServerConfig {
    type Err = ConfigError;

    /// Parsea líneas `clave=valor` partiendo en el primer `=`
    ///
    /// Las líneas vacías, las que empiezan con `#` o `;` y las que no tienen
    /// `=` se ignoran. Las claves ausentes conservan su valor por defecto.
    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut config = ServerConfig::default();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }

            if let Some((key, value)) = line.split_once('=') {
                config.apply(key.trim(), value.trim())?;
            }
        }

        Ok(config)
    }
}

impl Default for ServerConfig {
    /// Configuración por defecto
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            root: PathBuf::from("./www"),
            default_page: "index.html".to_string(),
            max_threads: 10,
            image_extensions: vec![
                "jpg".to_string(),
                "png".to_string(),
                "gif".to_string(),
                "bmp".to_string(),
            ],
            read_timeout_ms: 30_000,
        }
    }
}
