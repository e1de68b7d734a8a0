//! Signature algorithm identifiers, digest selection and the signed-object seam
//! shared by certificates and CRLs.

use const_oid::ObjectIdentifier;
use rsa::{Oaep, Pkcs1v15Sign, Pss};
use sha1::Sha1;
use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};
use x509_cert::spki::AlgorithmIdentifierOwned;

use crate::error::Result;
use crate::fields::NameHash;
use crate::key::KeyAlgorithm;
use crate::oid;

/// Digest algorithms that can back a certificate or CRL signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Sha1,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
}

impl HashAlgorithm {
    /// Digest `data` with this algorithm.
    pub fn digest(self, data: &[u8]) -> Vec<u8> {
        match self {
            HashAlgorithm::Sha1 => Sha1::digest(data).to_vec(),
            HashAlgorithm::Sha224 => Sha224::digest(data).to_vec(),
            HashAlgorithm::Sha256 => Sha256::digest(data).to_vec(),
            HashAlgorithm::Sha384 => Sha384::digest(data).to_vec(),
            HashAlgorithm::Sha512 => Sha512::digest(data).to_vec(),
        }
    }

    /// The hash implied by a signature algorithm OID, if it names one.
    pub fn from_signature_oid(oid: &ObjectIdentifier) -> Option<Self> {
        SignatureAlgorithm::from_oid(oid).and_then(SignatureAlgorithm::hash)
    }

    pub(crate) fn pkcs1v15_sign(self) -> Pkcs1v15Sign {
        match self {
            HashAlgorithm::Sha1 => Pkcs1v15Sign::new::<Sha1>(),
            HashAlgorithm::Sha224 => Pkcs1v15Sign::new::<Sha224>(),
            HashAlgorithm::Sha256 => Pkcs1v15Sign::new::<Sha256>(),
            HashAlgorithm::Sha384 => Pkcs1v15Sign::new::<Sha384>(),
            HashAlgorithm::Sha512 => Pkcs1v15Sign::new::<Sha512>(),
        }
    }

    pub(crate) fn pss(self) -> Pss {
        match self {
            HashAlgorithm::Sha1 => Pss::new::<Sha1>(),
            HashAlgorithm::Sha224 => Pss::new::<Sha224>(),
            HashAlgorithm::Sha256 => Pss::new::<Sha256>(),
            HashAlgorithm::Sha384 => Pss::new::<Sha384>(),
            HashAlgorithm::Sha512 => Pss::new::<Sha512>(),
        }
    }

    pub(crate) fn oaep(self) -> Oaep {
        match self {
            HashAlgorithm::Sha1 => Oaep::new::<Sha1>(),
            HashAlgorithm::Sha224 => Oaep::new::<Sha224>(),
            HashAlgorithm::Sha256 => Oaep::new::<Sha256>(),
            HashAlgorithm::Sha384 => Oaep::new::<Sha384>(),
            HashAlgorithm::Sha512 => Oaep::new::<Sha512>(),
        }
    }
}

/// RSA signature padding. ECDSA and EdDSA keys ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureScheme {
    #[default]
    Pkcs1v15,
    Pss,
}

/// RSA encryption padding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EncryptionScheme {
    #[default]
    Pkcs1v15,
    Oaep(HashAlgorithm),
}

/// Represents the supported signature algorithms for certificates and CRLs.
///
/// This enum provides a mapping to the corresponding OIDs for each algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// RSA PKCS#1 v1.5 with the given digest.
    Rsa(HashAlgorithm),
    /// ECDSA with the given digest.
    Ecdsa(HashAlgorithm),
    /// Pure Ed25519.
    Ed25519,
}

impl SignatureAlgorithm {
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        let algorithm = match *oid {
            oid::SHA1_WITH_RSA => SignatureAlgorithm::Rsa(HashAlgorithm::Sha1),
            oid::SHA224_WITH_RSA => SignatureAlgorithm::Rsa(HashAlgorithm::Sha224),
            oid::SHA256_WITH_RSA => SignatureAlgorithm::Rsa(HashAlgorithm::Sha256),
            oid::SHA384_WITH_RSA => SignatureAlgorithm::Rsa(HashAlgorithm::Sha384),
            oid::SHA512_WITH_RSA => SignatureAlgorithm::Rsa(HashAlgorithm::Sha512),
            oid::ECDSA_WITH_SHA1 => SignatureAlgorithm::Ecdsa(HashAlgorithm::Sha1),
            oid::ECDSA_WITH_SHA224 => SignatureAlgorithm::Ecdsa(HashAlgorithm::Sha224),
            oid::ECDSA_WITH_SHA256 => SignatureAlgorithm::Ecdsa(HashAlgorithm::Sha256),
            oid::ECDSA_WITH_SHA384 => SignatureAlgorithm::Ecdsa(HashAlgorithm::Sha384),
            oid::ECDSA_WITH_SHA512 => SignatureAlgorithm::Ecdsa(HashAlgorithm::Sha512),
            oid::ED25519 => SignatureAlgorithm::Ed25519,
            _ => return None,
        };
        Some(algorithm)
    }

    pub fn oid(self) -> ObjectIdentifier {
        match self {
            SignatureAlgorithm::Rsa(hash) => match hash {
                HashAlgorithm::Sha1 => oid::SHA1_WITH_RSA,
                HashAlgorithm::Sha224 => oid::SHA224_WITH_RSA,
                HashAlgorithm::Sha256 => oid::SHA256_WITH_RSA,
                HashAlgorithm::Sha384 => oid::SHA384_WITH_RSA,
                HashAlgorithm::Sha512 => oid::SHA512_WITH_RSA,
            },
            SignatureAlgorithm::Ecdsa(hash) => match hash {
                HashAlgorithm::Sha1 => oid::ECDSA_WITH_SHA1,
                HashAlgorithm::Sha224 => oid::ECDSA_WITH_SHA224,
                HashAlgorithm::Sha256 => oid::ECDSA_WITH_SHA256,
                HashAlgorithm::Sha384 => oid::ECDSA_WITH_SHA384,
                HashAlgorithm::Sha512 => oid::ECDSA_WITH_SHA512,
            },
            SignatureAlgorithm::Ed25519 => oid::ED25519,
        }
    }

    /// What a key of the given family signs with unless told otherwise.
    pub fn default_for(key: KeyAlgorithm) -> Self {
        match key {
            KeyAlgorithm::Rsa => SignatureAlgorithm::Rsa(HashAlgorithm::Sha256),
            KeyAlgorithm::Ecdsa(curve) => SignatureAlgorithm::Ecdsa(curve.default_hash()),
            KeyAlgorithm::Ed25519 => SignatureAlgorithm::Ed25519,
        }
    }

    /// The digest applied before signing; `None` for pure EdDSA.
    pub fn hash(self) -> Option<HashAlgorithm> {
        match self {
            SignatureAlgorithm::Rsa(hash) | SignatureAlgorithm::Ecdsa(hash) => Some(hash),
            SignatureAlgorithm::Ed25519 => None,
        }
    }
}

impl From<SignatureAlgorithm> for AlgorithmIdentifierOwned {
    /// Converts a `SignatureAlgorithm` into an `AlgorithmIdentifierOwned`.
    fn from(value: SignatureAlgorithm) -> Self {
        AlgorithmIdentifierOwned {
            oid: value.oid(),
            parameters: None,
        }
    }
}

/// An object carrying an issuer name and a signature over a to-be-signed body.
///
/// Certificates and CRLs both implement it, which lets one issuer check serve
/// chain building and CRL verification alike.
pub trait SignedObject {
    /// Hash of the issuer's string form.
    fn issuer_hash(&self) -> &NameHash;

    /// DER encoding of the signed body.
    fn tbs_der(&self) -> Result<Vec<u8>>;

    /// Signature algorithm declared inside the signed body.
    fn declared_signature_algorithm(&self) -> &ObjectIdentifier;

    /// Raw signature bytes.
    fn signature_bytes(&self) -> &[u8];
}
