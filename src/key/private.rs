use der::asn1::{BitString, BitStringRef, OctetStringRef};
use der::{Decode, Reader, SliceReader, TagMode, TagNumber};
use const_oid::ObjectIdentifier;
use ecdsa::signature::hazmat::PrehashSigner;
use ed25519_dalek::Signer;
use ed25519_dalek::SigningKey as Ed25519SigningKey;
use pkcs8::{DecodePrivateKey, EncodePrivateKey, PrivateKeyInfo};
use rand_core::OsRng;
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::{Pkcs1v15Encrypt, RsaPrivateKey};
use x509_cert::certificate::TbsCertificateInner;

use super::public::EcdsaPublicKey;
use super::{EcCurve, KeyAlgorithm, PublicKey};
use crate::cert::Certificate;
use crate::error::{PkiError, Result};
use crate::oid;
use crate::signature::{EncryptionScheme, HashAlgorithm, SignatureScheme};

/// An ECDSA private key on one of the supported curves.
#[derive(Clone)]
pub enum EcdsaPrivateKey {
    P256(p256::SecretKey),
    P384(p384::SecretKey),
    P521(p521::SecretKey),
}

impl std::fmt::Debug for EcdsaPrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("EcdsaPrivateKey").field(&self.curve()).finish()
    }
}

impl EcdsaPrivateKey {
    pub fn curve(&self) -> EcCurve {
        match self {
            EcdsaPrivateKey::P256(_) => EcCurve::P256,
            EcdsaPrivateKey::P384(_) => EcCurve::P384,
            EcdsaPrivateKey::P521(_) => EcCurve::P521,
        }
    }

    pub fn generate(curve: EcCurve) -> Self {
        match curve {
            EcCurve::P256 => EcdsaPrivateKey::P256(p256::SecretKey::random(&mut OsRng)),
            EcCurve::P384 => EcdsaPrivateKey::P384(p384::SecretKey::random(&mut OsRng)),
            EcCurve::P521 => EcdsaPrivateKey::P521(p521::SecretKey::random(&mut OsRng)),
        }
    }

    fn from_sec1_der(curve: EcCurve, der: &[u8]) -> Result<Self> {
        let key = match curve {
            EcCurve::P256 => EcdsaPrivateKey::P256(p256::SecretKey::from_sec1_der(der)?),
            EcCurve::P384 => EcdsaPrivateKey::P384(p384::SecretKey::from_sec1_der(der)?),
            EcCurve::P521 => EcdsaPrivateKey::P521(p521::SecretKey::from_sec1_der(der)?),
        };
        Ok(key)
    }

    fn from_pkcs8_der(curve: EcCurve, der: &[u8]) -> Result<Self> {
        let key = match curve {
            EcCurve::P256 => EcdsaPrivateKey::P256(p256::SecretKey::from_pkcs8_der(der)?),
            EcCurve::P384 => EcdsaPrivateKey::P384(p384::SecretKey::from_pkcs8_der(der)?),
            EcCurve::P521 => EcdsaPrivateKey::P521(p521::SecretKey::from_pkcs8_der(der)?),
        };
        Ok(key)
    }

    fn public_key(&self) -> EcdsaPublicKey {
        match self {
            EcdsaPrivateKey::P256(key) => EcdsaPublicKey::P256(key.public_key()),
            EcdsaPrivateKey::P384(key) => EcdsaPublicKey::P384(key.public_key()),
            EcdsaPrivateKey::P521(key) => EcdsaPublicKey::P521(key.public_key()),
        }
    }

    fn to_pkcs8_der(&self) -> Result<Vec<u8>> {
        let document = match self {
            EcdsaPrivateKey::P256(key) => key.to_pkcs8_der()?,
            EcdsaPrivateKey::P384(key) => key.to_pkcs8_der()?,
            EcdsaPrivateKey::P521(key) => key.to_pkcs8_der()?,
        };
        Ok(document.as_bytes().to_vec())
    }

    /// DER-encoded (RFC 3279) ECDSA signature over an already hashed message.
    fn sign_prehash(&self, prehash: &[u8]) -> Result<Vec<u8>> {
        let der = match self {
            EcdsaPrivateKey::P256(key) => {
                let signer = p256::ecdsa::SigningKey::from(key);
                let sig: p256::ecdsa::Signature = signer.sign_prehash(prehash)?;
                sig.to_der().as_bytes().to_vec()
            }
            EcdsaPrivateKey::P384(key) => {
                let signer = p384::ecdsa::SigningKey::from(key);
                let sig: p384::ecdsa::Signature = signer.sign_prehash(prehash)?;
                sig.to_der().as_bytes().to_vec()
            }
            EcdsaPrivateKey::P521(key) => {
                let signer = p521::ecdsa::SigningKey::from_bytes(&key.to_bytes())?;
                let sig: p521::ecdsa::Signature = signer.sign_prehash(prehash)?;
                sig.to_der().as_bytes().to_vec()
            }
        };
        Ok(der)
    }
}

/// Supported private key types.
///
/// The public half is never stored: [`PrivateKey::public_key`] derives it
/// from the private material on every call.
#[derive(Clone)]
pub enum PrivateKey {
    Rsa(Box<RsaPrivateKey>),
    Ecdsa(EcdsaPrivateKey),
    Ed25519(Ed25519SigningKey),
}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PrivateKey({:?})", self.algorithm())
    }
}

impl PrivateKey {
    /// Generates a new RSA private key of the given modulus size.
    pub fn generate_rsa(bits: usize) -> Result<Self> {
        let key = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| PkiError::KeyGenerationError(e.to_string()))?;
        Ok(PrivateKey::Rsa(Box::new(key)))
    }

    pub fn generate_ecdsa(curve: EcCurve) -> Self {
        PrivateKey::Ecdsa(EcdsaPrivateKey::generate(curve))
    }

    pub fn generate_ed25519() -> Self {
        PrivateKey::Ed25519(Ed25519SigningKey::generate(&mut OsRng))
    }

    /// PKCS#8 `PrivateKeyInfo` carrying an RSA key.
    pub fn from_pkcs8_rsa_der(der: &[u8]) -> Result<Self> {
        Ok(PrivateKey::Rsa(Box::new(RsaPrivateKey::from_pkcs8_der(der)?)))
    }

    /// The forms OpenSSL writes for EC keys: PKCS#8 with `id-ecPublicKey`, or
    /// an `ECParameters` named curve immediately followed by a SEC1
    /// `ECPrivateKey` (the "EC PARAMETERS" + "EC PRIVATE KEY" PEM pair).
    pub fn from_openssl_ecdsa_der(der: &[u8]) -> Result<Self> {
        if let Ok(info) = PrivateKeyInfo::from_der(der) {
            if info.algorithm.oid != oid::EC_PUBLIC_KEY {
                return Err(PkiError::DecodingError(format!(
                    "PKCS#8 algorithm {} is not id-ecPublicKey",
                    info.algorithm.oid
                )));
            }
            let curve = curve_from_oid(&info.algorithm.parameters_oid()?)?;
            return Ok(PrivateKey::Ecdsa(EcdsaPrivateKey::from_pkcs8_der(curve, der)?));
        }

        let mut reader = SliceReader::new(der)?;
        let curve = curve_from_oid(&ObjectIdentifier::decode(&mut reader)?)?;
        let remaining = reader.remaining_len();
        let sec1 = reader.read_slice(remaining)?;
        if sec1.is_empty() {
            return Err(PkiError::DecodingError(
                "EC parameters without a private key".to_string(),
            ));
        }
        Ok(PrivateKey::Ecdsa(EcdsaPrivateKey::from_sec1_der(curve, sec1)?))
    }

    /// Bare PKCS#1 `RSAPrivateKey`.
    pub fn from_pkcs1_der(der: &[u8]) -> Result<Self> {
        Ok(PrivateKey::Rsa(Box::new(RsaPrivateKey::from_pkcs1_der(der)?)))
    }

    /// Bare SEC1 `ECPrivateKey`. The structure must name its curve.
    pub fn from_sec1_der(der: &[u8]) -> Result<Self> {
        let curve = sec1_named_curve(der)?;
        Ok(PrivateKey::Ecdsa(EcdsaPrivateKey::from_sec1_der(curve, der)?))
    }

    /// PKCS#8 `PrivateKeyInfo` carrying an Ed25519 key.
    pub fn from_pkcs8_ed25519_der(der: &[u8]) -> Result<Self> {
        Ok(PrivateKey::Ed25519(Ed25519SigningKey::from_pkcs8_der(der)?))
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        match self {
            PrivateKey::Rsa(_) => KeyAlgorithm::Rsa,
            PrivateKey::Ecdsa(key) => KeyAlgorithm::Ecdsa(key.curve()),
            PrivateKey::Ed25519(_) => KeyAlgorithm::Ed25519,
        }
    }

    /// The matching public key, derived from the private material.
    pub fn public_key(&self) -> PublicKey {
        match self {
            PrivateKey::Rsa(key) => PublicKey::Rsa(key.to_public_key()),
            PrivateKey::Ecdsa(key) => PublicKey::Ecdsa(key.public_key()),
            PrivateKey::Ed25519(key) => PublicKey::Ed25519(key.verifying_key()),
        }
    }

    pub fn default_hash(&self) -> Option<HashAlgorithm> {
        self.algorithm().default_hash()
    }

    /// PKCS#8 DER, unencrypted.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        let der = match self {
            PrivateKey::Rsa(key) => key.to_pkcs8_der()?.as_bytes().to_vec(),
            PrivateKey::Ecdsa(key) => key.to_pkcs8_der()?,
            PrivateKey::Ed25519(key) => key.to_pkcs8_der()?.as_bytes().to_vec(),
        };
        Ok(der)
    }

    /// Sign `data`.
    ///
    /// RSA and ECDSA fall back to the key's default digest when `hash` is
    /// `None`; Ed25519 ignores both `hash` and `scheme`.
    pub fn sign(
        &self,
        data: &[u8],
        hash: Option<HashAlgorithm>,
        scheme: SignatureScheme,
    ) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Rsa(key) => {
                let hash = hash.unwrap_or(HashAlgorithm::Sha256);
                let hashed = hash.digest(data);
                let signature = match scheme {
                    SignatureScheme::Pkcs1v15 => key.sign(hash.pkcs1v15_sign(), &hashed)?,
                    SignatureScheme::Pss => key.sign_with_rng(&mut OsRng, hash.pss(), &hashed)?,
                };
                Ok(signature)
            }
            PrivateKey::Ecdsa(key) => {
                let hash = hash.unwrap_or_else(|| key.curve().default_hash());
                key.sign_prehash(&hash.digest(data))
            }
            PrivateKey::Ed25519(key) => Ok(key.sign(data).to_bytes().to_vec()),
        }
    }

    pub fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        hash: Option<HashAlgorithm>,
        scheme: SignatureScheme,
    ) -> Result<bool> {
        self.public_key().verify(data, signature, hash, scheme)
    }

    /// Decrypt a message encrypted to the matching public key. RSA only.
    pub fn decrypt(&self, ciphertext: &[u8], scheme: EncryptionScheme) -> Result<Vec<u8>> {
        match self {
            PrivateKey::Rsa(key) => {
                let plaintext = match scheme {
                    EncryptionScheme::Pkcs1v15 => key.decrypt(Pkcs1v15Encrypt, ciphertext)?,
                    EncryptionScheme::Oaep(hash) => key.decrypt(hash.oaep(), ciphertext)?,
                };
                Ok(plaintext)
            }
            PrivateKey::Ecdsa(_) => Err(PkiError::UnsupportedOperation(
                "no ECDSA decryption support".to_string(),
            )),
            PrivateKey::Ed25519(_) => Err(PkiError::UnsupportedOperation(
                "no EdDSA decryption support".to_string(),
            )),
        }
    }

    /// Sign DER under the digest named by `declared`, unless `hash_override`
    /// is given. Unknown algorithms fall back to the key's default digest.
    pub(crate) fn sign_declared(
        &self,
        tbs_der: &[u8],
        declared: &ObjectIdentifier,
        hash_override: Option<HashAlgorithm>,
    ) -> Result<Vec<u8>> {
        let hash = hash_override
            .or_else(|| HashAlgorithm::from_signature_oid(declared))
            .or_else(|| self.default_hash());
        self.sign(tbs_der, hash, SignatureScheme::Pkcs1v15)
    }

    /// Sign a certificate body and assemble the certificate.
    ///
    /// The outer `signatureAlgorithm` is copied from the body's `signature`
    /// field as is, even when `hash_override` signs with a different digest.
    pub fn sign_tbs_certificate(
        &self,
        tbs: TbsCertificateInner,
        hash_override: Option<HashAlgorithm>,
    ) -> Result<Certificate> {
        let tbs_der = der::Encode::to_der(&tbs)?;
        let signature = self.sign_declared(&tbs_der, &tbs.signature.oid, hash_override)?;
        let inner = x509_cert::Certificate {
            signature_algorithm: tbs.signature.clone(),
            tbs_certificate: tbs,
            signature: BitString::from_bytes(&signature)?,
        };
        Certificate::from_x509(inner)
    }

    /// Replace only the signature of `cert`, keeping its body.
    pub fn resign_certificate(&self, cert: &Certificate) -> Result<Certificate> {
        self.sign_tbs_certificate(cert.as_x509().tbs_certificate.clone(), None)
    }

    pub fn verify_certificate_signature(&self, cert: &Certificate) -> Result<bool> {
        self.public_key().verify_certificate_signature(cert)
    }
}

impl From<&PrivateKey> for PublicKey {
    fn from(key: &PrivateKey) -> Self {
        key.public_key()
    }
}

impl From<PrivateKey> for PublicKey {
    fn from(key: PrivateKey) -> Self {
        key.public_key()
    }
}

fn curve_from_oid(oid: &ObjectIdentifier) -> Result<EcCurve> {
    EcCurve::from_oid(oid)
        .ok_or_else(|| PkiError::UnsupportedOperation(format!("unsupported curve {oid}")))
}

/// Reads the `parameters [0]` named curve out of a SEC1 `ECPrivateKey`.
fn sec1_named_curve(der: &[u8]) -> Result<EcCurve> {
    let mut reader = SliceReader::new(der)?;
    let parameters = reader.sequence(|seq| {
        let _version = u8::decode(seq)?;
        let _private_key = OctetStringRef::decode(seq)?;
        let parameters =
            seq.context_specific::<ObjectIdentifier>(TagNumber::N0, TagMode::Explicit)?;
        let _public_key = seq.context_specific::<BitStringRef<'_>>(TagNumber::N1, TagMode::Explicit)?;
        Ok(parameters)
    })?;
    let curve = parameters.ok_or_else(|| {
        PkiError::DecodingError("ECPrivateKey does not name its curve".to_string())
    })?;
    curve_from_oid(&curve)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_key_is_derived() {
        let key = PrivateKey::generate_ecdsa(EcCurve::P256);
        assert_eq!(key.public_key(), PublicKey::from(&key));
        assert_eq!(key.public_key().algorithm(), KeyAlgorithm::Ecdsa(EcCurve::P256));
    }

    #[test]
    fn test_sign_and_verify_each_family() {
        let keys = [
            PrivateKey::generate_rsa(1024).unwrap(),
            PrivateKey::generate_ecdsa(EcCurve::P256),
            PrivateKey::generate_ecdsa(EcCurve::P384),
            PrivateKey::generate_ecdsa(EcCurve::P521),
            PrivateKey::generate_ed25519(),
        ];
        for key in keys {
            let signature = key.sign(b"payload", None, SignatureScheme::Pkcs1v15).unwrap();
            let hash = key.default_hash();
            let public = key.public_key();
            assert!(public.verify(b"payload", &signature, hash, SignatureScheme::Pkcs1v15).unwrap());
            assert!(!public.verify(b"tampered", &signature, hash, SignatureScheme::Pkcs1v15).unwrap());
        }
    }

    #[test]
    fn test_verify_defaults_digest_like_sign() {
        let keys = [
            PrivateKey::generate_rsa(1024).unwrap(),
            PrivateKey::generate_ecdsa(EcCurve::P384),
            PrivateKey::generate_ecdsa(EcCurve::P521),
        ];
        for key in keys {
            let signature = key.sign(b"payload", None, SignatureScheme::Pkcs1v15).unwrap();
            let public = key.public_key();
            assert!(public.verify(b"payload", &signature, None, SignatureScheme::Pkcs1v15).unwrap());
            assert!(!public
                .verify(b"payload", &signature, Some(HashAlgorithm::Sha1), SignatureScheme::Pkcs1v15)
                .unwrap());
        }
    }

    #[test]
    fn test_rsa_pss_signature() {
        let key = PrivateKey::generate_rsa(1024).unwrap();
        let signature = key
            .sign(b"payload", Some(HashAlgorithm::Sha384), SignatureScheme::Pss)
            .unwrap();
        assert!(key
            .verify(b"payload", &signature, Some(HashAlgorithm::Sha384), SignatureScheme::Pss)
            .unwrap());
        assert!(!key
            .verify(b"payload", &signature, Some(HashAlgorithm::Sha384), SignatureScheme::Pkcs1v15)
            .unwrap());
    }

    #[test]
    fn test_rsa_encrypt_decrypt() {
        let key = PrivateKey::generate_rsa(1024).unwrap();
        for scheme in [EncryptionScheme::Pkcs1v15, EncryptionScheme::Oaep(HashAlgorithm::Sha256)] {
            let ciphertext = key.public_key().encrypt(b"secret", scheme).unwrap();
            assert_eq!(key.decrypt(&ciphertext, scheme).unwrap(), b"secret");
        }
    }

    #[test]
    fn test_non_rsa_encryption_is_unsupported() {
        let ec = PrivateKey::generate_ecdsa(EcCurve::P256);
        assert!(matches!(
            ec.public_key().encrypt(b"x", EncryptionScheme::Pkcs1v15),
            Err(PkiError::UnsupportedOperation(_))
        ));
        let ed = PrivateKey::generate_ed25519();
        assert!(matches!(
            ed.decrypt(b"x", EncryptionScheme::Pkcs1v15),
            Err(PkiError::UnsupportedOperation(_))
        ));
    }

    /// `ECPrivateKey` with `[0] prime256v1`, the shape OpenSSL writes.
    fn sec1_with_named_curve(key: &p256::SecretKey) -> Vec<u8> {
        let plain = key.to_sec1_der().unwrap();
        // version and privateKey come first, then the [1] publicKey
        let (head, public) = plain[2..].split_at(3 + 2 + 32);
        let mut curve = vec![0xa0, 0x0a];
        curve.extend_from_slice(&der::Encode::to_der(&oid::CURVE_P256).unwrap());
        let body = [head, curve.as_slice(), public].concat();
        let mut der = vec![0x30, body.len() as u8];
        der.extend_from_slice(&body);
        der
    }

    #[test]
    fn test_sec1_requires_named_curve() {
        let key = p256::SecretKey::random(&mut OsRng);
        let der = sec1_with_named_curve(&key);
        let imported = PrivateKey::from_sec1_der(&der).unwrap();
        assert_eq!(imported.algorithm(), KeyAlgorithm::Ecdsa(EcCurve::P256));

        // version 1, 32-byte key, no parameters
        let mut bare = vec![0x30, 0x25, 0x02, 0x01, 0x01, 0x04, 0x20];
        bare.extend_from_slice(&key.to_bytes());
        assert!(PrivateKey::from_sec1_der(&bare).is_err());
        // RustCrypto leaves the parameters out.
        assert!(PrivateKey::from_sec1_der(&key.to_sec1_der().unwrap()).is_err());
    }

    #[test]
    fn test_ec_parameters_followed_by_sec1() {
        let key = p384::SecretKey::random(&mut OsRng);
        let mut der = der::Encode::to_der(&oid::CURVE_P384).unwrap();
        der.extend_from_slice(&key.to_sec1_der().unwrap());
        let imported = PrivateKey::from_openssl_ecdsa_der(&der).unwrap();
        assert_eq!(imported.algorithm(), KeyAlgorithm::Ecdsa(EcCurve::P384));
    }
}
