//! Pack building.
//!
//! [`PackBuilder`] collects entry descriptors and serializes them in one pass.
//! Entry bytes are pulled through a data-provider callback, one entry at a
//! time, so large source trees never need to be resident in memory at once:
//! the provider typically reads a loose file or a base-container entry on
//! demand, and the buffer is dropped as soon as the entry is written.

use binrw::BinWrite;
use byteorder::{WriteBytesExt, LE};
use std::collections::HashSet;
use std::io::{self, BufWriter, Cursor, Seek, SeekFrom, Write};
use xxhash_rust::xxh3::xxh3_64;

use crate::entry::{PackCompression, PackEntry};

#[derive(Debug, thiserror::Error)]
pub enum PackBuilderError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("binary write error: {0}")]
    BinWrite(#[from] binrw::Error),

    #[error("pack error: {0}")]
    Pack(#[from] crate::error::PackError),

    #[error("duplicate entry path: {0}")]
    DuplicatePath(String),

    #[error("invalid entry path: {0}")]
    InvalidEntryPath(String),

    #[error("no data source for entry: {0}")]
    MissingDataSource(String),
}

/// Builder for one pack entry: logical path plus storage options.
#[derive(Debug, Clone)]
pub struct PackEntryBuilder {
    path: String,
    compression: PackCompression,
}

impl PackEntryBuilder {
    /// Create an entry builder for a logical path.
    ///
    /// Paths must be non-empty, forward-slash relative paths; backslashes and
    /// leading slashes are rejected so the stored form is canonical.
    pub fn new(path: &str) -> Result<Self, PackBuilderError> {
        if path.is_empty() || path.starts_with('/') || path.contains('\\') {
            return Err(PackBuilderError::InvalidEntryPath(path.to_string()));
        }
        Ok(Self {
            path: path.to_string(),
            compression: PackCompression::None,
        })
    }

    pub fn with_compression(mut self, compression: PackCompression) -> Self {
        self.compression = compression;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn compression(&self) -> PackCompression {
        self.compression
    }
}

/// Builds a pack from an ordered list of entries.
///
/// Entries are serialized in insertion order; callers that need a specific
/// on-disk order (the overlay engine sorts by logical path) insert in that
/// order.
#[derive(Debug, Clone, Default)]
pub struct PackBuilder {
    entries: Vec<PackEntryBuilder>,
}

impl PackBuilder {
    /// Add an entry to the builder.
    pub fn with_entry(mut self, entry: PackEntryBuilder) -> Self {
        self.entries.push(entry);
        self
    }

    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    /// Build the pack and write it to the given writer.
    ///
    /// * `writer` - destination for the serialized pack
    /// * `provide_entry_data` - called once per entry, in insertion order, to
    ///   produce that entry's uncompressed bytes
    pub fn build_to_writer<TWriter, TProvider>(
        self,
        writer: &mut TWriter,
        mut provide_entry_data: TProvider,
    ) -> Result<(), PackBuilderError>
    where
        TWriter: io::Write + io::Seek,
        TProvider: FnMut(&PackEntryBuilder, &mut Cursor<Vec<u8>>) -> Result<(), PackBuilderError>,
    {
        let mut seen = HashSet::new();
        for entry in &self.entries {
            if !seen.insert(entry.path.as_str()) {
                return Err(PackBuilderError::DuplicatePath(entry.path.clone()));
            }
        }

        let mut writer = BufWriter::new(writer);

        Self::write_header(&mut writer, self.entries.len())?;
        Self::write_paths(&mut writer, &self.entries)?;
        Self::write_alignment(&mut writer)?;

        // Reserve space for the TOC, backpatched once entry data is written
        let toc_offset = writer.stream_position()?;
        writer.write_all(&vec![0; self.entries.len() * PackEntry::size_of()])?;

        let mut toc = Vec::with_capacity(self.entries.len());
        for (index, entry) in self.entries.iter().enumerate() {
            let mut data_writer = Cursor::new(Vec::new());
            provide_entry_data(entry, &mut data_writer)?;

            let uncompressed = data_writer.into_inner();
            let uncompressed_size = uncompressed.len() as u64;
            let checksum = xxh3_64(&uncompressed);

            let stored = match entry.compression {
                PackCompression::None => uncompressed,
                PackCompression::Zstd => compress_zstd(&uncompressed)?,
            };

            let data_offset = writer.stream_position()?;
            writer.write_all(&stored)?;

            toc.push(PackEntry {
                path_index: index as u32,
                compression: entry.compression,
                data_offset,
                compressed_size: stored.len() as u64,
                uncompressed_size,
                checksum,
            });
        }

        writer.seek(SeekFrom::Start(toc_offset))?;
        for entry in &toc {
            entry.write(&mut writer)?;
        }

        writer.flush()?;
        Ok(())
    }

    fn write_header<W: io::Write>(writer: &mut W, entry_count: usize) -> io::Result<()> {
        writer.write_all(b"_nxpack_")?;
        writer.write_u32::<LE>(1)?;
        writer.write_u32::<LE>(entry_count as u32)?;
        Ok(())
    }

    fn write_paths<W: io::Write>(
        writer: &mut W,
        entries: &[PackEntryBuilder],
    ) -> io::Result<()> {
        writer.write_u32::<LE>(entries.len() as u32)?;
        for entry in entries {
            writer.write_all(entry.path.as_bytes())?;
            writer.write_all(&[0])?;
        }
        Ok(())
    }

    fn write_alignment<W: io::Write + io::Seek>(writer: &mut W) -> io::Result<()> {
        let position = writer.stream_position()?;
        let padding = (8 - (position % 8)) % 8;
        for _ in 0..padding {
            writer.write_all(&[0])?;
        }
        Ok(())
    }
}

fn compress_zstd(data: &[u8]) -> Result<Vec<u8>, PackBuilderError> {
    let mut out = Vec::new();
    let mut encoder = zstd::Encoder::new(&mut out, 3)?;
    encoder.write_all(data)?;
    encoder.finish()?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_path_validation() {
        assert!(PackEntryBuilder::new("data/file.bin").is_ok());
        assert!(PackEntryBuilder::new("").is_err());
        assert!(PackEntryBuilder::new("/rooted").is_err());
        assert!(PackEntryBuilder::new("data\\file.bin").is_err());
    }

    #[test]
    fn test_duplicate_path_rejected() {
        let builder = PackBuilder::default()
            .with_entry(PackEntryBuilder::new("a").unwrap())
            .with_entry(PackEntryBuilder::new("a").unwrap());

        let mut cursor = Cursor::new(Vec::new());
        let result = builder.build_to_writer(&mut cursor, |_, out| {
            out.write_all(b"x")?;
            Ok(())
        });
        assert!(matches!(result, Err(PackBuilderError::DuplicatePath(_))));
    }
}
