//! Classifies opaque input without format hints.
//!
//! The encoding is sniffed from the bytes, then each structural form allowed
//! for the requested category is tried in a fixed priority order. The first
//! form that decodes wins. Failed attempts are logged at debug level and
//! never surface individually: callers only see an `ImportError` once every
//! candidate is exhausted.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use bon::Builder;

use crate::cert::Certificate;
use crate::crl::Crl;
use crate::error::{PkiError, Result};
use crate::key::{KeyAlgorithm, PrivateKey, PublicKey};
use crate::pem_utils::{contains_pem_marker, decode_pem, split_pem_objects};

/// Serialization of an object on the wire or on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Pem,
    Der,
}

impl Encoding {
    /// PEM for paths ending in `.pem`, DER otherwise.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("pem") => Encoding::Pem,
            _ => Encoding::Der,
        }
    }
}

/// What the caller expects the input to contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectCategory {
    PublicKey,
    PrivateKey,
    Certificate,
    Crl,
}

impl fmt::Display for ObjectCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ObjectCategory::PublicKey => "public key",
            ObjectCategory::PrivateKey => "private key",
            ObjectCategory::Certificate => "certificate",
            ObjectCategory::Crl => "CRL",
        };
        f.write_str(name)
    }
}

/// The concrete kind a resolved object was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    RsaPublicKey,
    EcdsaPublicKey,
    EdDsaPublicKey,
    RsaPrivateKey,
    EcdsaPrivateKey,
    EdDsaPrivateKey,
    Certificate,
    Crl,
}

impl ObjectKind {
    fn public(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::Rsa => ObjectKind::RsaPublicKey,
            KeyAlgorithm::Ecdsa(_) => ObjectKind::EcdsaPublicKey,
            KeyAlgorithm::Ed25519 => ObjectKind::EdDsaPublicKey,
        }
    }

    fn private(algorithm: KeyAlgorithm) -> Self {
        match algorithm {
            KeyAlgorithm::Rsa => ObjectKind::RsaPrivateKey,
            KeyAlgorithm::Ecdsa(_) => ObjectKind::EcdsaPrivateKey,
            KeyAlgorithm::Ed25519 => ObjectKind::EdDsaPrivateKey,
        }
    }
}

/// Raw input: a file to read or bytes already in memory.
#[derive(Debug, Clone)]
pub enum RawInput<'a> {
    Path(PathBuf),
    Bytes(&'a [u8]),
}

impl<'a> From<&'a [u8]> for RawInput<'a> {
    fn from(bytes: &'a [u8]) -> Self {
        RawInput::Bytes(bytes)
    }
}

impl<'a> From<&'a Vec<u8>> for RawInput<'a> {
    fn from(bytes: &'a Vec<u8>) -> Self {
        RawInput::Bytes(bytes.as_slice())
    }
}

impl<'a> From<&'a str> for RawInput<'a> {
    /// Text is PEM content, not a path. Use `Path` for files.
    fn from(text: &'a str) -> Self {
        RawInput::Bytes(text.as_bytes())
    }
}

impl From<&Path> for RawInput<'_> {
    fn from(path: &Path) -> Self {
        RawInput::Path(path.to_path_buf())
    }
}

impl From<PathBuf> for RawInput<'_> {
    fn from(path: PathBuf) -> Self {
        RawInput::Path(path)
    }
}

impl From<&PathBuf> for RawInput<'_> {
    fn from(path: &PathBuf) -> Self {
        RawInput::Path(path.clone())
    }
}

/// Maximum file sizes accepted per category.
///
/// Only file input is bounded; in-memory bytes are already loaded.
#[derive(Debug, Clone, Copy, Builder)]
pub struct ImportLimits {
    #[builder(default = 50 * 1024)]
    pub public_key: u64,
    #[builder(default = 50 * 1024)]
    pub private_key: u64,
    #[builder(default = 50 * 1024)]
    pub certificate: u64,
    #[builder(default = 10 * 1024 * 1024)]
    pub crl: u64,
}

impl Default for ImportLimits {
    fn default() -> Self {
        ImportLimits::builder().build()
    }
}

impl ImportLimits {
    pub fn for_category(&self, category: ObjectCategory) -> u64 {
        match category {
            ObjectCategory::PublicKey => self.public_key,
            ObjectCategory::PrivateKey => self.private_key,
            ObjectCategory::Certificate => self.certificate,
            ObjectCategory::Crl => self.crl,
        }
    }
}

/// Structural forms a public key may take, in trial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublicKeyForm {
    /// `SubjectPublicKeyInfo` wrapping an RSA, EC or Ed25519 key.
    Spki,
    /// Bare PKCS#1 `RSAPublicKey`.
    Pkcs1Rsa,
}

impl PublicKeyForm {
    pub const PRIORITY: [PublicKeyForm; 2] = [PublicKeyForm::Spki, PublicKeyForm::Pkcs1Rsa];

    pub fn pem_label(self) -> &'static str {
        match self {
            PublicKeyForm::Spki => "PUBLIC KEY",
            PublicKeyForm::Pkcs1Rsa => "RSA PUBLIC KEY",
        }
    }

    fn decode(self, der: &[u8]) -> Result<PublicKey> {
        match self {
            PublicKeyForm::Spki => PublicKey::from_spki_der(der),
            PublicKeyForm::Pkcs1Rsa => PublicKey::from_pkcs1_der(der),
        }
    }
}

/// Structural forms a private key may take, in trial order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrivateKeyForm {
    Pkcs8Rsa,
    /// PKCS#8 EC key, or the `ECParameters` + `ECPrivateKey` concatenation.
    OpenSslEcdsa,
    Pkcs1Rsa,
    Sec1Ecdsa,
    Pkcs8Ed25519,
}

impl PrivateKeyForm {
    pub const PRIORITY: [PrivateKeyForm; 5] = [
        PrivateKeyForm::Pkcs8Rsa,
        PrivateKeyForm::OpenSslEcdsa,
        PrivateKeyForm::Pkcs1Rsa,
        PrivateKeyForm::Sec1Ecdsa,
        PrivateKeyForm::Pkcs8Ed25519,
    ];

    pub fn pem_label(self) -> &'static str {
        match self {
            PrivateKeyForm::Pkcs8Rsa | PrivateKeyForm::OpenSslEcdsa | PrivateKeyForm::Pkcs8Ed25519 => {
                "PRIVATE KEY"
            }
            PrivateKeyForm::Pkcs1Rsa => "RSA PRIVATE KEY",
            PrivateKeyForm::Sec1Ecdsa => "EC PRIVATE KEY",
        }
    }

    fn decode(self, der: &[u8]) -> Result<PrivateKey> {
        match self {
            PrivateKeyForm::Pkcs8Rsa => PrivateKey::from_pkcs8_rsa_der(der),
            PrivateKeyForm::OpenSslEcdsa => PrivateKey::from_openssl_ecdsa_der(der),
            PrivateKeyForm::Pkcs1Rsa => PrivateKey::from_pkcs1_der(der),
            PrivateKeyForm::Sec1Ecdsa => PrivateKey::from_sec1_der(der),
            PrivateKeyForm::Pkcs8Ed25519 => PrivateKey::from_pkcs8_ed25519_der(der),
        }
    }
}

/// A fully typed object produced by the resolver.
#[derive(Debug, Clone)]
pub enum PkiObject {
    PublicKey(PublicKey),
    PrivateKey(PrivateKey),
    Certificate(Box<Certificate>),
    Crl(Box<Crl>),
}

impl PkiObject {
    pub fn kind(&self) -> ObjectKind {
        match self {
            PkiObject::PublicKey(key) => ObjectKind::public(key.algorithm()),
            PkiObject::PrivateKey(key) => ObjectKind::private(key.algorithm()),
            PkiObject::Certificate(_) => ObjectKind::Certificate,
            PkiObject::Crl(_) => ObjectKind::Crl,
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone)]
pub struct Resolved {
    pub object: PkiObject,
    pub encoding: Encoding,
    /// PEM label matching the structural form that decoded.
    pub marker: &'static str,
}

/// Reads the input, refusing files that hold more than `max_size` bytes.
pub(crate) fn read_input(input: RawInput<'_>, max_size: u64) -> Result<Vec<u8>> {
    match input {
        RawInput::Bytes(bytes) => Ok(bytes.to_vec()),
        RawInput::Path(path) => {
            let unreadable = |e: std::io::Error| PkiError::ImportError(format!("{}: {e}", path.display()));
            let mut bytes = Vec::new();
            File::open(&path)
                .map_err(unreadable)?
                .take(max_size.saturating_add(1))
                .read_to_end(&mut bytes)
                .map_err(unreadable)?;
            if bytes.len() as u64 > max_size {
                return Err(PkiError::ImportError(format!(
                    "{}: file exceeds the {max_size} byte limit",
                    path.display()
                )));
            }
            Ok(bytes)
        }
    }
}

/// Detects the encoding and returns DER. PEM bundles decode to the
/// concatenation of their blocks, in order.
pub(crate) fn decode_input(raw: &[u8]) -> Result<(Encoding, Vec<u8>)> {
    if !contains_pem_marker(raw) {
        return Ok((Encoding::Der, raw.to_vec()));
    }
    let text = std::str::from_utf8(raw)
        .map_err(|e| PkiError::FormatError(format!("PEM input is not UTF-8: {e}")))?;
    let mut der = Vec::new();
    for block in split_pem_objects(text)? {
        der.extend(decode_pem(&block)?);
    }
    Ok((Encoding::Pem, der))
}

/// Tries each form in order and returns the first that decodes.
fn first_match<F, T>(
    der: &[u8],
    forms: &[F],
    decode: impl Fn(F, &[u8]) -> Result<T>,
) -> Option<(F, T)>
where
    F: Copy + fmt::Debug,
{
    forms.iter().find_map(|&form| match decode(form, der) {
        Ok(object) => Some((form, object)),
        Err(e) => {
            log::debug!("Candidate {form:?} rejected: {e}");
            None
        }
    })
}

/// Resolve raw input into a typed object of the expected category.
pub fn resolve<'a>(
    input: impl Into<RawInput<'a>>,
    limits: &ImportLimits,
    category: ObjectCategory,
) -> Result<Resolved> {
    let raw = read_input(input.into(), limits.for_category(category))?;
    let (encoding, der) = decode_input(&raw)
        .map_err(|e| PkiError::ImportError(format!("unable to import {category}: {e}")))?;
    resolve_der(&der, encoding, category)
}

fn resolve_der(der: &[u8], encoding: Encoding, category: ObjectCategory) -> Result<Resolved> {
    let unable = || PkiError::ImportError(format!("unable to import {category}"));
    let (object, marker) = match category {
        ObjectCategory::PublicKey => {
            let (form, key) =
                first_match(der, &PublicKeyForm::PRIORITY, PublicKeyForm::decode).ok_or_else(unable)?;
            (PkiObject::PublicKey(key), form.pem_label())
        }
        ObjectCategory::PrivateKey => {
            let (form, key) = first_match(der, &PrivateKeyForm::PRIORITY, PrivateKeyForm::decode)
                .ok_or_else(unable)?;
            (PkiObject::PrivateKey(key), form.pem_label())
        }
        ObjectCategory::Certificate => {
            let cert = Certificate::from_der(der)
                .map_err(|e| PkiError::ImportError(format!("unable to import certificate: {e}")))?;
            (PkiObject::Certificate(Box::new(cert)), "CERTIFICATE")
        }
        ObjectCategory::Crl => {
            let crl = Crl::from_der(der)
                .map_err(|e| PkiError::ImportError(format!("unable to import CRL: {e}")))?;
            (PkiObject::Crl(Box::new(crl)), "X509 CRL")
        }
    };
    log::debug!("Resolved {category} as {:?} ({encoding:?})", object.kind());
    Ok(Resolved {
        object,
        encoding,
        marker,
    })
}

macro_rules! import_helpers {
    ($ty:ty, $category:expr, $variant:ident, $unwrap:expr) => {
        impl $ty {
            /// Import from a file or bytes, PEM or DER, with default size limits.
            pub fn import<'a>(input: impl Into<RawInput<'a>>) -> Result<Self> {
                Self::import_with(input, &ImportLimits::default())
            }

            pub fn import_with<'a>(
                input: impl Into<RawInput<'a>>,
                limits: &ImportLimits,
            ) -> Result<Self> {
                match resolve(input, limits, $category)?.object {
                    PkiObject::$variant(object) => Ok($unwrap(object)),
                    other => Err(PkiError::ImportError(format!(
                        "expected {}, resolved {:?}",
                        $category,
                        other.kind()
                    ))),
                }
            }
        }
    };
}

import_helpers!(PublicKey, ObjectCategory::PublicKey, PublicKey, |k| k);
import_helpers!(PrivateKey, ObjectCategory::PrivateKey, PrivateKey, |k| k);
import_helpers!(Certificate, ObjectCategory::Certificate, Certificate, |c: Box<Certificate>| *c);
import_helpers!(Crl, ObjectCategory::Crl, Crl, |c: Box<Crl>| *c);
