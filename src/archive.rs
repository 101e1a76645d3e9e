//! ZIP container access for OOXML packages.
//!
//! Two interchangeable implementations sit behind [`SheetArchive`]: a
//! from-scratch reader over raw bytes ([`RawArchive`]) and a thin wrapper
//! around the `zip` crate ([`LibraryArchive`]). The import pipeline only
//! needs membership tests and text reads, so the trait surface stays small.

use std::collections::HashMap;
use std::io::{Cursor, Read};

use flate2::read::DeflateDecoder;
use zip::ZipArchive;

use crate::error::{ImportError, Result};

const EOCD_SIGNATURE: &[u8; 4] = b"PK\x05\x06";
const CENTRAL_DIR_SIGNATURE: &[u8; 4] = b"PK\x01\x02";
const LOCAL_HEADER_SIGNATURE: &[u8; 4] = b"PK\x03\x04";

/// Fixed EOCD record size, excluding the optional trailing comment.
const EOCD_MIN_SIZE: usize = 22;
/// The EOCD comment length field is 16 bits, so the record can sit at most
/// this far from the end of the archive.
const EOCD_SCAN_WINDOW: usize = EOCD_MIN_SIZE + 0xFFFF;

const METHOD_STORED: u16 = 0;
const METHOD_DEFLATE: u16 = 8;

/// Read access to an OOXML package, by archive-internal path.
///
/// Paths are normalized before lookup: backslashes become `/` and `.`/`..`
/// segments are resolved. Lookup falls back to a case-insensitive match when
/// the exact path is absent.
pub trait SheetArchive {
    /// Whether the archive contains an entry at `path`.
    fn has(&self, path: &str) -> bool;

    /// Decompress the entry at `path` and decode it as UTF-8 text.
    fn read_text(&mut self, path: &str) -> Result<String>;
}

/// Normalize an archive-internal path: separators to `/`, empty and `.`
/// segments dropped, `..` resolved against the segments seen so far.
pub fn normalize_zip_path(path: &str) -> String {
    let forward = path.replace('\\', "/");
    let mut segments: Vec<&str> = Vec::new();
    for part in forward.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            _ => segments.push(part),
        }
    }
    segments.join("/")
}

fn read_u16(data: &[u8], offset: usize) -> Option<u16> {
    let end = offset.checked_add(2)?;
    let bytes: [u8; 2] = data.get(offset..end)?.try_into().ok()?;
    Some(u16::from_le_bytes(bytes))
}

fn read_u32(data: &[u8], offset: usize) -> Option<u32> {
    let end = offset.checked_add(4)?;
    let bytes: [u8; 4] = data.get(offset..end)?.try_into().ok()?;
    Some(u32::from_le_bytes(bytes))
}

fn signature_at(data: &[u8], offset: usize, signature: &[u8; 4]) -> bool {
    data.get(offset..offset.saturating_add(4))
        .is_some_and(|bytes| bytes == signature)
}

/// One central-directory entry, immutable once the index is built.
#[derive(Debug, Clone, Copy)]
struct EntryRecord {
    compression_method: u16,
    compressed_size: usize,
    local_header_offset: usize,
}

/// From-scratch ZIP reader over a borrowed byte slice.
///
/// The index is built once from the central directory; entry payloads are
/// located and decompressed on demand in [`SheetArchive::read_text`].
#[derive(Debug)]
pub struct RawArchive<'a> {
    data: &'a [u8],
    entries: HashMap<String, EntryRecord>,
    /// lowercase normalized path -> canonical index key
    lowercase: HashMap<String, String>,
}

impl<'a> RawArchive<'a> {
    /// Build the entry index by locating the end-of-central-directory record
    /// and walking the central directory.
    pub fn new(data: &'a [u8]) -> Result<Self> {
        let eocd = find_eocd(data).ok_or(ImportError::ArchiveCorrupt)?;
        let entry_count = read_u16(data, eocd + 10).ok_or(ImportError::ArchiveCorrupt)?;
        let directory_offset = read_u32(data, eocd + 16)
            .and_then(|v| usize::try_from(v).ok())
            .ok_or(ImportError::ArchiveCorrupt)?;

        let mut entries = HashMap::new();
        let mut lowercase = HashMap::new();
        let mut offset = directory_offset;

        for _ in 0..entry_count {
            if !signature_at(data, offset, CENTRAL_DIR_SIGNATURE) {
                return Err(ImportError::CentralDirectoryCorrupt);
            }
            let field =
                |at: usize| read_u16(data, offset + at).ok_or(ImportError::CentralDirectoryCorrupt);
            let compression_method = field(10)?;
            let compressed_size = read_u32(data, offset + 20)
                .and_then(|v| usize::try_from(v).ok())
                .ok_or(ImportError::CentralDirectoryCorrupt)?;
            let name_len = usize::from(field(28)?);
            let extra_len = usize::from(field(30)?);
            let comment_len = usize::from(field(32)?);
            let local_header_offset = read_u32(data, offset + 42)
                .and_then(|v| usize::try_from(v).ok())
                .ok_or(ImportError::CentralDirectoryCorrupt)?;

            let name_start = offset + 46;
            let name_bytes = data
                .get(name_start..name_start + name_len)
                .ok_or(ImportError::CentralDirectoryCorrupt)?;
            let name = normalize_zip_path(&String::from_utf8_lossy(name_bytes));
            if !name.is_empty() {
                lowercase.insert(name.to_lowercase(), name.clone());
                entries.insert(
                    name,
                    EntryRecord {
                        compression_method,
                        compressed_size,
                        local_header_offset,
                    },
                );
            }

            offset = name_start + name_len + extra_len + comment_len;
        }

        Ok(Self {
            data,
            entries,
            lowercase,
        })
    }

    fn lookup(&self, path: &str) -> Option<EntryRecord> {
        let normalized = normalize_zip_path(path);
        if let Some(entry) = self.entries.get(&normalized) {
            return Some(*entry);
        }
        self.lowercase
            .get(&normalized.to_lowercase())
            .and_then(|canonical| self.entries.get(canonical))
            .copied()
    }

    fn decompress(&self, path: &str, entry: EntryRecord) -> Result<Vec<u8>> {
        let local = entry.local_header_offset;
        if !signature_at(self.data, local, LOCAL_HEADER_SIGNATURE) {
            return Err(ImportError::LocalHeaderCorrupt);
        }
        let name_len =
            usize::from(read_u16(self.data, local + 26).ok_or(ImportError::LocalHeaderCorrupt)?);
        let extra_len =
            usize::from(read_u16(self.data, local + 28).ok_or(ImportError::LocalHeaderCorrupt)?);

        let payload_start = local + 30 + name_len + extra_len;
        let payload = self
            .data
            .get(payload_start..payload_start.saturating_add(entry.compressed_size))
            .ok_or(ImportError::ArchiveTruncated)?;

        match entry.compression_method {
            METHOD_STORED => Ok(payload.to_vec()),
            METHOD_DEFLATE => {
                let mut decoder = DeflateDecoder::new(payload);
                let mut inflated = Vec::new();
                decoder
                    .read_to_end(&mut inflated)
                    .map_err(|source| ImportError::PartUnreadable {
                        path: path.to_string(),
                        source,
                    })?;
                Ok(inflated)
            }
            method => Err(ImportError::UnsupportedCompression { method }),
        }
    }
}

impl SheetArchive for RawArchive<'_> {
    fn has(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    fn read_text(&mut self, path: &str) -> Result<String> {
        let entry = self
            .lookup(path)
            .ok_or_else(|| ImportError::EntryMissing(path.to_string()))?;
        let bytes = self.decompress(path, entry)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// Scan backwards for the EOCD signature, bounded to the maximum distance an
/// optional archive comment allows.
fn find_eocd(data: &[u8]) -> Option<usize> {
    let start = data.len().checked_sub(EOCD_MIN_SIZE)?;
    let floor = data.len().saturating_sub(EOCD_SCAN_WINDOW);
    (floor..=start)
        .rev()
        .find(|&offset| signature_at(data, offset, EOCD_SIGNATURE))
}

/// [`SheetArchive`] backed by the `zip` crate.
///
/// Kept alongside [`RawArchive`] so either reader can satisfy the pipeline;
/// lookup semantics (normalization, case-insensitive fallback) match.
pub struct LibraryArchive {
    archive: ZipArchive<Cursor<Vec<u8>>>,
    /// normalized path -> name as stored in the archive
    names: HashMap<String, String>,
    lowercase: HashMap<String, String>,
}

impl LibraryArchive {
    /// Open the archive and index its entry names.
    pub fn new(data: Vec<u8>) -> Result<Self> {
        let archive = ZipArchive::new(Cursor::new(data))?;
        let mut names = HashMap::new();
        let mut lowercase = HashMap::new();
        for stored in archive.file_names() {
            let normalized = normalize_zip_path(stored);
            if normalized.is_empty() {
                continue;
            }
            lowercase.insert(normalized.to_lowercase(), normalized.clone());
            names.insert(normalized, stored.to_string());
        }
        Ok(Self {
            archive,
            names,
            lowercase,
        })
    }

    fn stored_name(&self, path: &str) -> Option<String> {
        let normalized = normalize_zip_path(path);
        if let Some(name) = self.names.get(&normalized) {
            return Some(name.clone());
        }
        self.lowercase
            .get(&normalized.to_lowercase())
            .and_then(|canonical| self.names.get(canonical))
            .cloned()
    }
}

impl SheetArchive for LibraryArchive {
    fn has(&self, path: &str) -> bool {
        self.stored_name(path).is_some()
    }

    fn read_text(&mut self, path: &str) -> Result<String> {
        let stored = self
            .stored_name(path)
            .ok_or_else(|| ImportError::EntryMissing(path.to_string()))?;
        let mut file = self.archive.by_name(&stored)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|source| ImportError::PartUnreadable {
                path: path.to_string(),
                source,
            })?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_dot_segments() {
        assert_eq!(normalize_zip_path("xl\\worksheets\\sheet1.xml"), "xl/worksheets/sheet1.xml");
        assert_eq!(normalize_zip_path("xl/./workbook.xml"), "xl/workbook.xml");
        assert_eq!(normalize_zip_path("xl/worksheets/../workbook.xml"), "xl/workbook.xml");
        assert_eq!(normalize_zip_path("../../etc/passwd"), "etc/passwd");
        assert_eq!(normalize_zip_path(""), "");
    }

    #[test]
    fn rejects_bytes_without_eocd() {
        let err = RawArchive::new(b"not a zip file at all").unwrap_err();
        assert!(matches!(err, ImportError::ArchiveCorrupt));
    }

    #[test]
    fn empty_input_is_corrupt() {
        assert!(matches!(
            RawArchive::new(&[]).unwrap_err(),
            ImportError::ArchiveCorrupt
        ));
    }
}
