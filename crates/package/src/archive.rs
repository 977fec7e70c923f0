//! Read-only access to the zip container behind a `.var` file.

use crate::consts::{MANIFEST_ENTRY, normalize_entry_path};
use crate::error::{ErrorKind, Result};
use crate::manifest::Manifest;
use exn::ResultExt;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tracing::instrument;
use zip::ZipArchive;

/// An opened package archive.
///
/// Entry names are normalized to forward slashes on open, so lookups work
/// the same regardless of which OS the package was built on.
pub struct Archive<R = BufReader<File>> {
    zip: ZipArchive<R>,
    /// Normalized names of file entries, in archive order.
    names: Vec<String>,
    /// Normalized name to zip index.
    index: HashMap<String, usize>,
}

impl Archive {
    /// Open a package file from disk.
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).or_raise(|| ErrorKind::Archive(format!("cannot open {}", path.display())))?;
        Self::from_reader(BufReader::new(file))
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Wrap any seekable reader holding a zip container.
    pub fn from_reader(reader: R) -> Result<Self> {
        let zip = ZipArchive::new(reader).or_raise(|| ErrorKind::Archive("not a zip container".to_string()))?;
        let mut names = Vec::with_capacity(zip.len());
        let mut index = HashMap::with_capacity(zip.len());
        for i in 0..zip.len() {
            let Some(raw) = zip.name_for_index(i) else { continue };
            let name = normalize_entry_path(raw);
            if name.ends_with('/') {
                continue;
            }
            // First entry wins if a broken archive lists a name twice.
            if !index.contains_key(&name) {
                index.insert(name.clone(), i);
                names.push(name);
            }
        }
        Ok(Self { zip, names, index })
    }

    /// Names of every file entry (directories excluded), forward-slashed.
    pub fn entries(&self) -> &[String] {
        &self.names
    }

    /// Read an entry's bytes. Backslashes in `name` are accepted.
    pub fn read(&mut self, name: &str) -> Result<Vec<u8>> {
        let normalized = normalize_entry_path(name);
        let Some(&i) = self.index.get(&normalized) else {
            exn::bail!(ErrorKind::EntryNotFound(normalized));
        };
        let mut file = self.zip.by_index(i).or_raise(|| ErrorKind::Archive(format!("cannot read {normalized}")))?;
        let mut buffer = Vec::with_capacity(usize::try_from(file.size()).unwrap_or_default());
        file.read_to_end(&mut buffer).or_raise(|| ErrorKind::Archive(format!("cannot read {normalized}")))?;
        Ok(buffer)
    }

    /// Read and parse the package manifest.
    pub fn manifest(&mut self) -> Result<Manifest> {
        if !self.index.contains_key(MANIFEST_ENTRY) {
            exn::bail!(ErrorKind::ManifestMissing);
        }
        let bytes = self.read(MANIFEST_ENTRY)?;
        Manifest::from_slice(&bytes)
    }
}
