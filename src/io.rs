// File-level I/O helpers for documents and conversion tables.
//
// Documents are read and written whole. When the `file-io` feature is
// enabled, a SHA-256 of the bytes is reported alongside the size.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[cfg(feature = "file-io")]
use sha2::Digest;
use thiserror::Error;

use crate::charmap::{CharMap, GlyphTable};
use crate::table::{self, TableError};

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Statistics returned by `load_document()` and `save_document()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentStats {
    /// Document size in bytes.
    pub size: u64,
    /// SHA-256 of the document (if `file-io` feature is enabled).
    pub sha256: Option<[u8; 32]>,
}

impl DocumentStats {
    fn of(bytes: &[u8]) -> Self {
        Self {
            size: bytes.len() as u64,
            sha256: digest(bytes),
        }
    }
}

#[cfg(feature = "file-io")]
fn digest(bytes: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(bytes).into())
}

#[cfg(not(feature = "file-io"))]
fn digest(_bytes: &[u8]) -> Option<[u8; 32]> {
    None
}

/// Lowercase hex rendering of a digest.
pub fn hex_digest(sha: &[u8; 32]) -> String {
    sha.iter().map(|b| format!("{b:02x}")).collect()
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("table error: {0}")]
    Table(#[from] TableError),
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

pub fn load_document(path: &Path) -> Result<(Vec<u8>, DocumentStats), IoError> {
    let data = std::fs::read(path)?;
    let stats = DocumentStats::of(&data);
    log::debug!("read {} bytes from {}", stats.size, path.display());
    Ok((data, stats))
}

pub fn save_document(path: &Path, data: &[u8]) -> Result<DocumentStats, IoError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::with_capacity(BUF_SIZE, file);
    writer.write_all(data)?;
    writer.flush()?;
    log::debug!("wrote {} bytes to {}", data.len(), path.display());
    Ok(DocumentStats::of(data))
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

/// Read a `.tbl` file. Bytes it does not mention get their default glyph.
pub fn load_table(path: &Path) -> Result<GlyphTable, IoError> {
    let bytes = std::fs::read(path)?;
    Ok(table::decode_table(&bytes)?)
}

pub fn save_table(path: &Path, map: &CharMap) -> Result<(), IoError> {
    std::fs::write(path, table::format_table(map))?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
