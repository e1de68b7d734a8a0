//! Asymmetric keys: RSA, ECDSA (P-256, P-384, P-521) and Ed25519.
//!
//! Both [`PublicKey`] and [`PrivateKey`] are closed sets of variants. The
//! variant is chosen once, when the key is generated or imported, and never
//! changes afterwards.

mod private;
mod public;

pub use private::{EcdsaPrivateKey, PrivateKey};
pub use public::{EcdsaPublicKey, PublicKey};

use const_oid::ObjectIdentifier;
use sha1::{Digest, Sha1};

use crate::oid;
use crate::signature::HashAlgorithm;

/// The algorithm family of a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAlgorithm {
    Rsa,
    Ecdsa(EcCurve),
    Ed25519,
}

/// NIST curves supported for ECDSA keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    P256,
    P384,
    P521,
}

impl EcCurve {
    pub fn oid(self) -> ObjectIdentifier {
        match self {
            EcCurve::P256 => oid::CURVE_P256,
            EcCurve::P384 => oid::CURVE_P384,
            EcCurve::P521 => oid::CURVE_P521,
        }
    }

    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        match *oid {
            oid::CURVE_P256 => Some(EcCurve::P256),
            oid::CURVE_P384 => Some(EcCurve::P384),
            oid::CURVE_P521 => Some(EcCurve::P521),
            _ => None,
        }
    }

    /// Digest matching the curve's security level.
    pub fn default_hash(self) -> HashAlgorithm {
        match self {
            EcCurve::P256 => HashAlgorithm::Sha256,
            EcCurve::P384 => HashAlgorithm::Sha384,
            EcCurve::P521 => HashAlgorithm::Sha512,
        }
    }
}

impl KeyAlgorithm {
    /// Hash used when nothing else determines one; `None` for Ed25519.
    pub fn default_hash(self) -> Option<HashAlgorithm> {
        match self {
            KeyAlgorithm::Rsa => Some(HashAlgorithm::Sha256),
            KeyAlgorithm::Ecdsa(curve) => Some(curve.default_hash()),
            KeyAlgorithm::Ed25519 => None,
        }
    }
}

/// RFC 5280 key identifier (method 1): SHA-1 over the subjectPublicKey bits.
pub fn key_identifier(key: &PublicKey) -> crate::error::Result<Vec<u8>> {
    let spki = key.to_spki()?;
    Ok(Sha1::digest(spki.subject_public_key.raw_bytes()).to_vec())
}
