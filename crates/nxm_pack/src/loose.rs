//! Loose-file store: a directory treated as a content source.
//!
//! Enumeration produces [`LooseFile`] handles bound to `(root, relative path)`.
//! No file is opened during enumeration; [`LooseFile::read`] opens, reads, and
//! closes the file only when the pack serializer asks for its bytes, so the
//! number of concurrently open descriptors stays bounded regardless of tree
//! size.

use crate::error::PackError;
use camino::{Utf8Path, Utf8PathBuf};

/// A directory whose files are addressed by forward-slash relative paths.
#[derive(Debug, Clone)]
pub struct LooseFileStore {
    root: Utf8PathBuf,
}

impl LooseFileStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Enumerate all files under the root, sorted byte-wise by relative path.
    ///
    /// Non-UTF-8 paths are skipped with a warning.
    pub fn enumerate(&self) -> Result<Vec<LooseFile>, PackError> {
        let mut files = Vec::new();
        let mut stack = vec![self.root.clone()];

        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(dir.as_std_path())? {
                let entry = entry?;
                let path = match Utf8PathBuf::from_path_buf(entry.path()) {
                    Ok(p) => p,
                    Err(p) => {
                        tracing::warn!("Skipping non-UTF-8 path: {}", p.display());
                        continue;
                    }
                };

                if path.as_std_path().is_dir() {
                    stack.push(path);
                    continue;
                }

                let rel = path
                    .strip_prefix(&self.root)
                    .unwrap_or(&path)
                    .as_str()
                    .replace('\\', "/");

                files.push(LooseFile {
                    root: self.root.clone(),
                    rel,
                });
            }
        }

        files.sort_unstable_by(|a, b| a.rel.cmp(&b.rel));
        Ok(files)
    }
}

/// A deferred-read handle to one file inside a [`LooseFileStore`].
#[derive(Debug, Clone)]
pub struct LooseFile {
    root: Utf8PathBuf,
    rel: String,
}

impl LooseFile {
    /// The file's logical path relative to the store root.
    pub fn rel_path(&self) -> &str {
        &self.rel
    }

    pub fn full_path(&self) -> Utf8PathBuf {
        self.root.join(&self.rel)
    }

    /// Read the file's bytes. The file is opened on demand and closed on
    /// return.
    pub fn read(&self) -> std::io::Result<Vec<u8>> {
        std::fs::read(self.full_path().as_std_path())
    }
}
