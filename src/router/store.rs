//! # Almacén de Archivos Estáticos
//! src/router/store.rs
//!
//! Colaborador del router para acceder al sistema de archivos. Es un trait
//! para que los tests puedan inyectar un almacén en memoria o instrumentado.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};

/// Contrato mínimo: existencia y lectura completa
pub trait FileStore: Send + Sync {
    /// `true` si `path` es un archivo servible
    fn exists(&self, path: &Path) -> bool;

    /// Lee todos los bytes del archivo
    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>>;
}

/// Almacén respaldado por el disco local
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    // Los directorios no cuentan como existentes: terminan en 404
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}

/// Almacén en memoria, indexado por ruta completa
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl Into<PathBuf>, contents: impl Into<Vec<u8>>) -> Self {
        self.files.insert(path.into(), contents.into());
        self
    }
}

impl FileStore for MemoryStore {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    fn read_all(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, path.display().to_string()))
    }
}
