use der::{Decode, Encode};
use ecdsa::signature::hazmat::PrehashVerifier;
use ed25519_dalek::Verifier;
use ed25519_dalek::VerifyingKey as Ed25519VerifyingKey;
use pkcs8::{DecodePublicKey, EncodePublicKey};
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::traits::PublicKeyParts;
use rsa::{BigUint, Pkcs1v15Encrypt, RsaPublicKey};
use x509_cert::spki::{SubjectPublicKeyInfoOwned, SubjectPublicKeyInfoRef};

use super::{EcCurve, KeyAlgorithm};
use crate::cert::Certificate;
use crate::error::{PkiError, Result};
use crate::oid;
use crate::signature::{EncryptionScheme, HashAlgorithm, SignatureScheme, SignedObject};

/// An ECDSA public key on one of the supported curves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EcdsaPublicKey {
    P256(p256::PublicKey),
    P384(p384::PublicKey),
    P521(p521::PublicKey),
}

impl EcdsaPublicKey {
    pub fn curve(&self) -> EcCurve {
        match self {
            EcdsaPublicKey::P256(_) => EcCurve::P256,
            EcdsaPublicKey::P384(_) => EcCurve::P384,
            EcdsaPublicKey::P521(_) => EcCurve::P521,
        }
    }

    fn from_spki_der(curve: EcCurve, der: &[u8]) -> Result<Self> {
        let key = match curve {
            EcCurve::P256 => EcdsaPublicKey::P256(p256::PublicKey::from_public_key_der(der)?),
            EcCurve::P384 => EcdsaPublicKey::P384(p384::PublicKey::from_public_key_der(der)?),
            EcCurve::P521 => EcdsaPublicKey::P521(p521::PublicKey::from_public_key_der(der)?),
        };
        Ok(key)
    }

    fn to_spki_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            EcdsaPublicKey::P256(key) => key.to_public_key_der()?,
            EcdsaPublicKey::P384(key) => key.to_public_key_der()?,
            EcdsaPublicKey::P521(key) => key.to_public_key_der()?,
        };
        Ok(document.as_bytes().to_vec())
    }

    /// Verify a DER-encoded (RFC 3279) ECDSA signature over `prehash`.
    fn verify_prehash(&self, prehash: &[u8], signature: &[u8]) -> Result<bool> {
        let outcome = match self {
            EcdsaPublicKey::P256(key) => {
                let Ok(sig) = p256::ecdsa::Signature::from_der(signature) else {
                    return Ok(false);
                };
                p256::ecdsa::VerifyingKey::from(key).verify_prehash(prehash, &sig)
            }
            EcdsaPublicKey::P384(key) => {
                let Ok(sig) = p384::ecdsa::Signature::from_der(signature) else {
                    return Ok(false);
                };
                p384::ecdsa::VerifyingKey::from(key).verify_prehash(prehash, &sig)
            }
            EcdsaPublicKey::P521(key) => {
                let Ok(sig) = p521::ecdsa::Signature::from_der(signature) else {
                    return Ok(false);
                };
                p521::ecdsa::VerifyingKey::from_sec1_bytes(&key.to_sec1_bytes())?
                    .verify_prehash(prehash, &sig)
            }
        };
        Ok(outcome.is_ok())
    }
}

/// Supported public key types.
#[derive(Debug, Clone, PartialEq)]
pub enum PublicKey {
    Rsa(RsaPublicKey),
    Ecdsa(EcdsaPublicKey),
    Ed25519(Ed25519VerifyingKey),
}

impl PublicKey {
    /// Decodes a DER `SubjectPublicKeyInfo`, dispatching on its algorithm OID.
    pub fn from_spki_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoRef::from_der(der)?;
        match spki.algorithm.oid {
            oid::RSA_ENCRYPTION => Ok(PublicKey::Rsa(RsaPublicKey::from_public_key_der(der)?)),
            oid::EC_PUBLIC_KEY => {
                let curve_oid = spki.algorithm.parameters_oid()?;
                let curve = EcCurve::from_oid(&curve_oid).ok_or_else(|| {
                    PkiError::UnsupportedOperation(format!("unsupported curve {curve_oid}"))
                })?;
                Ok(PublicKey::Ecdsa(EcdsaPublicKey::from_spki_der(curve, der)?))
            }
            oid::ED25519 => Ok(PublicKey::Ed25519(
                Ed25519VerifyingKey::from_public_key_der(der)?,
            )),
            other => Err(PkiError::UnsupportedOperation(format!(
                "unsupported public key algorithm {other}"
            ))),
        }
    }

    /// Converts an X.509 `SubjectPublicKeyInfo` into a `PublicKey`.
    pub fn from_spki(spki: &SubjectPublicKeyInfoOwned) -> Result<Self> {
        Self::from_spki_der(&spki.to_der()?)
    }

    /// Decodes a bare PKCS#1 `RSAPublicKey`.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        Ok(PublicKey::Rsa(RsaPublicKey::from_pkcs1_der(der)?))
    }

    /// Builds an RSA key from big-endian modulus and exponent bytes.
    pub fn from_rsa_components(modulus: &[u8], exponent: &[u8]) -> Result<Self> {
        let key = RsaPublicKey::new(
            BigUint::from_bytes_be(modulus),
            BigUint::from_bytes_be(exponent),
        )?;
        Ok(PublicKey::Rsa(key))
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PublicKey::Rsa(_) => KeyAlgorithm::Rsa,
            PublicKey::Ecdsa(key) => KeyAlgorithm::Ecdsa(key.curve()),
            PublicKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// Key size in bits (the modulus length for RSA).
    pub fn key_size(&self) -> usize {
        match self {
            PublicKey::Rsa(key) => key.n().bits(),
            PublicKey::Ecdsa(key) => match key.curve() {
                EcCurve::P256 => 256,
                EcCurve::P384 => 384,
                EcCurve::P521 => 521,
            },
            PublicKey::Ed25519(_) => 256,
        }
    }

    /// RSA modulus and public exponent, big-endian.
    pub fn rsa_components(&self) -> Option<(Vec<u8>, Vec<u8>)> {
        match self {
            PublicKey::Rsa(key) => Some((key.n().to_bytes_be(), key.e().to_bytes_be())),
            _ => None,
        }
    }

    /// DER encoding under `SubjectPublicKeyInfo` framing.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            PublicKey::Rsa(key) => key.to_public_key_der()?.as_bytes().to_vec(),
            PublicKey::Ecdsa(key) => key.to_spki_der()?,
            PublicKey::Ed25519(key) => key.to_public_key_der()?.as_bytes().to_vec(),
        };
        Ok(der)
    }

    pub fn to_spki(&self) -> Result<SubjectPublicKeyInfoOwned> {
        Ok(SubjectPublicKeyInfoOwned::from_der(&self.to_der()?)?)
    }

    /// Verify `signature` over `data`.
    ///
    /// `hash` is ignored for Ed25519. RSA and ECDSA fall back to the key's
    /// default digest when it is `None`, as [`PrivateKey::sign`] does. A
    /// signature that does not match yields `Ok(false)`.
    ///
    /// [`PrivateKey::sign`]: super::PrivateKey::sign
    pub fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        hash: Option<HashAlgorithm>,
        scheme: SignatureScheme,
    ) -> Result<bool> {
        match self {
            PublicKey::Rsa(key) => {
                let hash = hash.unwrap_or(HashAlgorithm::Sha256);
                let hashed = hash.digest(data);
                let outcome = match scheme {
                    SignatureScheme::Pkcs1v15 => key.verify(hash.pkcs1v15_sign(), &hashed, signature),
                    SignatureScheme::Pss => key.verify(hash.pss(), &hashed, signature),
                };
                Ok(outcome.is_ok())
            }
            PublicKey::Ecdsa(key) => {
                let hash = hash.unwrap_or(key.curve().default_hash());
                key.verify_prehash(&hash.digest(data), signature)
            }
            PublicKey::Ed25519(key) => {
                let Ok(sig) = ed25519_dalek::Signature::from_slice(signature) else {
                    return Ok(false);
                };
                Ok(key.verify(data, &sig).is_ok())
            }
        }
    }

    /// Verify the signature of a certificate or CRL against this key, using
    /// the digest named by the object's declared signature algorithm.
    pub fn verify_signed<S: SignedObject + ?Sized>(&self, object: &S) -> Result<bool> {
        let declared = object.declared_signature_algorithm();
        let hash = HashAlgorithm::from_signature_oid(declared);
        if hash.is_none() && !matches!(self, PublicKey::Ed25519(_)) {
            return Err(PkiError::UnsupportedOperation(format!(
                "no digest known for signature algorithm {declared}"
            )));
        }
        self.verify(
            &object.tbs_der()?,
            object.signature_bytes(),
            hash,
            SignatureScheme::Pkcs1v15,
        )
    }

    /// Verify that `cert` was signed by this key.
    pub fn verify_certificate_signature(&self, cert: &Certificate) -> Result<bool> {
        self.verify_signed(cert)
    }

    /// Encrypt `message` for the holder of the matching private key.
    ///
    /// Only RSA keys can encrypt.
    pub fn encrypt(&self, message: &[u8], scheme: EncryptionScheme) -> Result<Vec<u8>> {
        match self {
            PublicKey::Rsa(key) => {
                let mut rng = rand_core::OsRng;
                let ciphertext = match scheme {
                    EncryptionScheme::Pkcs1v15 => key.encrypt(&mut rng, Pkcs1v15Encrypt, message)?,
                    EncryptionScheme::Oaep(hash) => key.encrypt(&mut rng, hash.oaep(), message)?,
                };
                Ok(ciphertext)
            }
            PublicKey::Ecdsa(_) => Err(PkiError::UnsupportedOperation(
                "no ECDSA encryption support".to_string(),
            )),
            PublicKey::Ed25519(_) => Err(PkiError::UnsupportedOperation(
                "no EdDSA encryption support".to_string(),
            )),
        }
    }
}
