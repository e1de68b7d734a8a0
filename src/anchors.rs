//! Loading trust anchors and untrusted intermediates from disk.

use std::path::Path;

use crate::cert::Certificate;
use crate::error::{PkiError, Result};
use crate::pem_utils::split_pem_objects;
use crate::resolver::{ImportLimits, RawInput, read_input};

/// Reads every certificate of a concatenated PEM bundle, in file order.
pub fn load_certificate_bundle(path: impl AsRef<Path>) -> Result<Vec<Certificate>> {
    load_certificate_bundle_with(path, &ImportLimits::default())
}

/// Like [`load_certificate_bundle`], with the whole file held to
/// `limits.certificate`.
pub fn load_certificate_bundle_with(
    path: impl AsRef<Path>,
    limits: &ImportLimits,
) -> Result<Vec<Certificate>> {
    let path = path.as_ref();
    let raw = read_input(RawInput::from(path), limits.certificate)?;
    let text = std::str::from_utf8(&raw)
        .map_err(|e| PkiError::ImportError(format!("{}: {e}", path.display())))?;
    split_pem_objects(text)?
        .iter()
        .map(|block| Certificate::import_with(block.as_str(), limits))
        .collect()
}

/// Imports each file of `dir` as one PEM or DER certificate.
///
/// Files are read in name order. Any file that does not import aborts the
/// whole load.
pub fn load_anchors_from_dir(dir: impl AsRef<Path>) -> Result<Vec<Certificate>> {
    let dir = dir.as_ref();
    let unreadable = |e: std::io::Error| PkiError::ImportError(format!("{}: {e}", dir.display()));

    let mut paths = std::fs::read_dir(dir)
        .map_err(unreadable)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(unreadable)?;
    paths.sort();

    let limits = ImportLimits::default();
    paths
        .iter()
        .filter(|path| path.is_file())
        .map(|path| {
            log::debug!("Loading anchor {}", path.display());
            Certificate::import_with(path, &limits)
        })
        .collect()
}
