//! Packed content container codec for nx-mod.
//!
//! A pack is a flat archive mapping logical file paths to byte blobs. The
//! overlay engine consumes packs as base/overlay containers and serializes its
//! merged result into a new pack via [`PackBuilder`]. Entry data is only read
//! when asked for: mounting parses the header and table of contents, and
//! [`Pack::load_entry`] seeks into the source on demand.
//!
//! Logical paths are forward-slash relative paths compared byte-wise; the
//! codec stores them verbatim and never case-folds.

use entry::PackEntry;
use error::PackError;
use std::{
    collections::HashMap,
    io::{Read, Seek, SeekFrom},
};

pub mod builder;
mod entry;
mod error;
mod loose;
mod read;

pub use builder::{PackBuilder, PackBuilderError, PackEntryBuilder};
pub use entry::PackCompression;
pub use error::PackError as Error;
pub use loose::{LooseFile, LooseFileStore};

/// A mounted pack: parsed table of contents plus the underlying byte source.
#[derive(Debug)]
pub struct Pack<TSource: Read + Seek> {
    /// Entry paths in stored order, indexed by each entry's `path_index`.
    paths: Vec<String>,

    /// Logical path -> table-of-contents record.
    entries: HashMap<String, PackEntry>,

    /// The original byte source.
    source: TSource,
}

impl<TSource: Read + Seek> Pack<TSource> {
    /// Number of entries in the pack.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    /// Look up the table-of-contents record for a logical path.
    pub fn entry(&self, path: &str) -> Option<&PackEntryInfo> {
        self.entries.get(path)
    }

    /// All entry paths in stored order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// All entry paths in byte-wise ascending order.
    pub fn sorted_paths(&self) -> Vec<String> {
        let mut paths = self.paths.clone();
        paths.sort_unstable();
        paths
    }

    /// Load an entry's raw (possibly compressed) bytes.
    pub fn load_entry_raw(&mut self, path: &str) -> Result<Box<[u8]>, PackError> {
        let entry = *self
            .entries
            .get(path)
            .ok_or_else(|| PackError::MissingEntry(path.to_string()))?;

        self.source.seek(SeekFrom::Start(entry.data_offset))?;
        let mut data = vec![0u8; entry.compressed_size as usize];
        self.source.read_exact(&mut data)?;
        Ok(data.into_boxed_slice())
    }

    /// Load and decompress an entry, verifying its checksum.
    pub fn load_entry(&mut self, path: &str) -> Result<Box<[u8]>, PackError> {
        let entry = *self
            .entries
            .get(path)
            .ok_or_else(|| PackError::MissingEntry(path.to_string()))?;
        let raw = self.load_entry_raw(path)?;

        let data = match entry.compression {
            PackCompression::None => raw,
            PackCompression::Zstd => zstd::decode_all(&raw[..])?.into_boxed_slice(),
        };

        let checksum = xxhash_rust::xxh3::xxh3_64(&data);
        if checksum != entry.checksum {
            return Err(PackError::ChecksumMismatch {
                path: path.to_string(),
                expected: entry.checksum,
                actual: checksum,
            });
        }

        Ok(data)
    }
}

/// Public view of a table-of-contents record.
pub type PackEntryInfo = entry::PackEntry;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{PackBuilder, PackEntryBuilder};
    use std::io::{Cursor, Write};

    fn build_test_pack(entries: &[(&str, &[u8], PackCompression)]) -> Cursor<Vec<u8>> {
        let mut builder = PackBuilder::default();
        for (path, _, compression) in entries {
            builder = builder.with_entry(
                PackEntryBuilder::new(path)
                    .unwrap()
                    .with_compression(*compression),
            );
        }

        let mut cursor = Cursor::new(Vec::new());
        let data: HashMap<&str, &[u8]> = entries.iter().map(|(p, d, _)| (*p, *d)).collect();
        builder
            .build_to_writer(&mut cursor, |entry, out| {
                out.write_all(data[entry.path()])?;
                Ok(())
            })
            .expect("failed to build pack");

        cursor.set_position(0);
        cursor
    }

    #[test]
    fn test_mount_and_load() {
        let cursor = build_test_pack(&[
            ("data/a.bin", b"alpha", PackCompression::None),
            ("data/b.bin", b"beta", PackCompression::Zstd),
        ]);

        let mut pack = Pack::mount_from_reader(cursor).unwrap();
        assert_eq!(pack.len(), 2);
        assert!(pack.contains("data/a.bin"));

        assert_eq!(&pack.load_entry("data/a.bin").unwrap()[..], b"alpha");
        assert_eq!(&pack.load_entry("data/b.bin").unwrap()[..], b"beta");
    }

    #[test]
    fn test_load_missing_entry() {
        let cursor = build_test_pack(&[("a", b"x", PackCompression::None)]);
        let mut pack = Pack::mount_from_reader(cursor).unwrap();

        assert!(matches!(
            pack.load_entry("nope"),
            Err(PackError::MissingEntry(_))
        ));
    }

    #[test]
    fn test_sorted_paths() {
        let cursor = build_test_pack(&[
            ("zeta", b"1", PackCompression::None),
            ("alpha", b"2", PackCompression::None),
            ("beta/x", b"3", PackCompression::None),
        ]);
        let pack = Pack::mount_from_reader(cursor).unwrap();

        assert_eq!(pack.sorted_paths(), vec!["alpha", "beta/x", "zeta"]);
    }

    #[test]
    fn test_zstd_entry_is_smaller_on_disk() {
        let long = b"repetition ".repeat(200);
        let cursor = build_test_pack(&[("big", &long, PackCompression::Zstd)]);
        let mut pack = Pack::mount_from_reader(cursor).unwrap();

        let entry = *pack.entry("big").unwrap();
        assert!(entry.compressed_size < entry.uncompressed_size);
        assert_eq!(&pack.load_entry("big").unwrap()[..], &long[..]);
    }

    #[test]
    fn test_deterministic_output() {
        let entries: &[(&str, &[u8], PackCompression)] = &[
            ("data/a.bin", b"alpha", PackCompression::None),
            ("data/b.bin", b"beta", PackCompression::None),
        ];
        let first = build_test_pack(entries).into_inner();
        let second = build_test_pack(entries).into_inner();
        assert_eq!(first, second);
    }
}
