pub mod extensions;
pub mod params;

use std::fmt;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use extensions::{
    AuthorityKeyIdentifier, BasicConstraints, ExtendedKeyUsage, KeyUsage, SubjectKeyIdentifier,
    find_extension,
};
use params::{CertificationRequestInfo, Validity};
use sha2::{Digest, Sha256};
use x509_cert::spki::SubjectPublicKeyInfoOwned;

use crate::crl::Crl;
use crate::error::{PkiError, Result};
use crate::fields::{NameHash, NameInfo, ReferenceTime, Timestamp, normalize_serial};
use crate::issuer::{Issuer, SelfIssuer};
use crate::key::{PrivateKey, PublicKey};
use crate::oid;
use crate::signature::{EncryptionScheme, HashAlgorithm, SignatureScheme, SignedObject};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Represents an X.509 certificate.
///
/// Every derived field is computed from the held structure when the
/// certificate is built. Mutating operations replace the structure and
/// recompute them all.
#[derive(Debug, Clone)]
pub struct Certificate {
    inner: x509_cert::Certificate,
    tbs_der: Vec<u8>,
    fingerprint: [u8; 32],
    version: u8,
    serial: Vec<u8>,
    issuer: NameInfo,
    subject: NameInfo,
    not_before: Timestamp,
    not_after: Timestamp,
    signature_algorithm: ObjectIdentifier,
    signature: Vec<u8>,
    basic_constraints: Option<BasicConstraints>,
    key_usage: Option<KeyUsage>,
    extended_key_usage: Option<ExtendedKeyUsage>,
    authority_key_id: Option<Vec<u8>>,
    subject_key_id: Option<Vec<u8>>,
    public_key: PublicKey,
}

impl Certificate {
    /// Decodes a DER certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_x509(x509_cert::Certificate::from_der(der)?)
    }

    /// Builds a certificate from its decoded structure, deriving every field.
    pub fn from_x509(inner: x509_cert::Certificate) -> Result<Self> {
        let tbs = &inner.tbs_certificate;
        let extensions = tbs.extensions.as_deref();

        let authority_key_id = find_extension::<AuthorityKeyIdentifier>(extensions)?
            .and_then(|akid| akid.key_identifier);
        let subject_key_id = find_extension::<SubjectKeyIdentifier>(extensions)?.map(|skid| skid.0);
        let signature = inner
            .signature
            .as_bytes()
            .ok_or_else(|| PkiError::DecodingError("signature is not octet aligned".to_string()))?
            .to_vec();

        Ok(Self {
            tbs_der: tbs.to_der()?,
            fingerprint: Sha256::digest(inner.to_der()?).into(),
            version: tbs.version as u8 + 1,
            serial: normalize_serial(tbs.serial_number.as_bytes()),
            issuer: NameInfo::from_name(&tbs.issuer),
            subject: NameInfo::from_name(&tbs.subject),
            not_before: Timestamp::from_x509(&tbs.validity.not_before)?,
            not_after: Timestamp::from_x509(&tbs.validity.not_after)?,
            signature_algorithm: tbs.signature.oid,
            signature,
            basic_constraints: find_extension(extensions)?,
            key_usage: find_extension(extensions)?,
            extended_key_usage: find_extension(extensions)?,
            authority_key_id,
            subject_key_id,
            public_key: PublicKey::from_spki(&tbs.subject_public_key_info)?,
            inner,
        })
    }

    /// Creates a new self-signed certificate.
    pub fn new_self_signed(
        cert_info: &CertificationRequestInfo,
        key: &PrivateKey,
        validity: Validity,
    ) -> Result<Self> {
        // For self-signed certificates, the issuer is the same as the subject
        let self_issuer = SelfIssuer {
            name: cert_info.subject.to_x509_name()?,
            key,
        };
        self_issuer.issue(cert_info, validity)
    }

    /// The decoded structure.
    pub fn as_x509(&self) -> &x509_cert::Certificate {
        &self.inner
    }

    /// Encodes the certificate into DER by re-serializing the held structure.
    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| PkiError::EncodingError(e.to_string()))
    }

    /// SHA-256 over the DER encoding.
    pub fn fingerprint(&self) -> &[u8; 32] {
        &self.fingerprint
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    /// Serial number magnitude, big-endian.
    pub fn serial(&self) -> &[u8] {
        &self.serial
    }

    pub fn issuer(&self) -> &NameInfo {
        &self.issuer
    }

    pub fn subject(&self) -> &NameInfo {
        &self.subject
    }

    pub fn subject_hash(&self) -> &NameHash {
        &self.subject.hash
    }

    pub fn not_before(&self) -> &Timestamp {
        &self.not_before
    }

    pub fn not_after(&self) -> &Timestamp {
        &self.not_after
    }

    /// Signature algorithm declared in the signed body.
    pub fn signature_algorithm(&self) -> &ObjectIdentifier {
        &self.signature_algorithm
    }

    /// Digest implied by the declared signature algorithm.
    pub fn signature_hash(&self) -> Option<HashAlgorithm> {
        HashAlgorithm::from_signature_oid(&self.signature_algorithm)
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// The CA flag of BasicConstraints, if the extension is present.
    pub fn is_ca(&self) -> Option<bool> {
        self.basic_constraints.map(|bc| bc.is_ca)
    }

    pub fn basic_constraints(&self) -> Option<&BasicConstraints> {
        self.basic_constraints.as_ref()
    }

    pub fn key_usage(&self) -> Option<&KeyUsage> {
        self.key_usage.as_ref()
    }

    pub fn extended_key_usage(&self) -> Option<&ExtendedKeyUsage> {
        self.extended_key_usage.as_ref()
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    pub fn subject_key_id(&self) -> Option<&[u8]> {
        self.subject_key_id.as_deref()
    }

    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }

    /// True if `self` issued `other`: the names chain and `other`'s signature
    /// verifies under this certificate's key.
    pub fn is_issuer_of<S: SignedObject + ?Sized>(&self, other: &S) -> bool {
        if self.subject.hash != *other.issuer_hash() {
            return false;
        }
        match self.public_key.verify_signed(other) {
            Ok(valid) => valid,
            Err(e) => {
                log::debug!("Signature check against {} failed: {e}", self.subject.text);
                false
            }
        }
    }

    pub fn is_self_signed(&self) -> bool {
        self.issuer.hash == self.subject.hash && self.is_issuer_of(self)
    }

    /// Days between the reference time and `notAfter`. Negative once expired.
    pub fn remaining_days<'a>(&self, reference: impl Into<ReferenceTime<'a>>) -> f64 {
        let reference = reference.into().resolve();
        (self.not_after.time - reference).as_seconds_f64() / SECONDS_PER_DAY
    }

    /// Whether any of `crls` lists this certificate's serial.
    ///
    /// A CRL whose AuthorityKeyIdentifier matches the certificate's decides
    /// the answer, as does the first CRL whose issuer matches when either
    /// side lacks the identifier. Freshness is not compared: a serial listed
    /// by an old CRL stays revoked even if a newer one no longer lists it.
    pub fn is_revoked_by<'a>(&self, crls: impl IntoIterator<Item = &'a Crl>) -> bool {
        for crl in crls {
            let akid_match = matches!(
                (self.authority_key_id(), crl.authority_key_id()),
                (Some(ours), Some(theirs)) if ours == theirs
            );
            if akid_match || self.issuer.text == crl.issuer().text {
                return crl.lists_serial(&self.serial);
            }
        }
        false
    }

    /// Overwrites the body's SubjectPublicKeyInfo. The old signature no
    /// longer matches afterwards; re-sign before relying on the certificate.
    pub fn replace_public_key(&mut self, key: impl Into<PublicKey>) -> Result<()> {
        let spki: SubjectPublicKeyInfoOwned = key.into().to_spki()?;
        let mut inner = self.inner.clone();
        inner.tbs_certificate.subject_public_key_info = spki;
        *self = Self::from_x509(inner)?;
        Ok(())
    }

    /// Re-signs the body with `key`, replacing the signature in place.
    pub fn resign_with(&mut self, key: &PrivateKey) -> Result<()> {
        *self = key.resign_certificate(self)?;
        Ok(())
    }

    /// Encrypt to the subject's key. RSA only.
    pub fn encrypt(&self, message: &[u8], scheme: EncryptionScheme) -> Result<Vec<u8>> {
        self.public_key.encrypt(message, scheme)
    }

    /// Verify a signature made by the subject's key.
    pub fn verify(
        &self,
        data: &[u8],
        signature: &[u8],
        hash: Option<HashAlgorithm>,
        scheme: SignatureScheme,
    ) -> Result<bool> {
        self.public_key.verify(data, signature, hash, scheme)
    }

    /// Multi-line human readable summary.
    pub fn summary(&self) -> String {
        format!(
            "Serial: {}\nIssuer: {}\nSubject: {}\nValidity: {} to {}\nSignature algorithm: {}",
            hex::encode(&self.serial),
            self.issuer.text,
            self.subject.text,
            self.not_before.encoded,
            self.not_after.encoded,
            oid::name_of(&self.signature_algorithm),
        )
    }
}

impl SignedObject for Certificate {
    fn issuer_hash(&self) -> &NameHash {
        &self.issuer.hash
    }

    fn tbs_der(&self) -> Result<Vec<u8>> {
        Ok(self.tbs_der.clone())
    }

    fn declared_signature_algorithm(&self) -> &ObjectIdentifier {
        &self.signature_algorithm
    }

    fn signature_bytes(&self) -> &[u8] {
        &self.signature
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for Certificate {}

impl fmt::Display for Certificate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[X.509 Cert. Subject:{}, Issuer:{}]",
            self.subject.text, self.issuer.text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::params::DistinguishedName;
    use super::*;
    use crate::key::EcCurve;
    use time::{Duration, OffsetDateTime};

    fn self_signed(key: &PrivateKey, name: &str, validity: Validity) -> Certificate {
        let info = CertificationRequestInfo::builder()
            .subject(DistinguishedName::builder().common_name(name.to_string()).build())
            .subject_public_key(key.public_key())
            .is_ca(true)
            .build();
        Certificate::new_self_signed(&info, key, validity).unwrap()
    }

    #[test]
    fn test_self_signed_derived_fields() {
        let key = PrivateKey::generate_ecdsa(EcCurve::P256);
        let cert = self_signed(&key, "Root", Validity::for_days(30));

        assert!(cert.is_self_signed());
        assert_eq!(cert.version(), 3);
        assert_eq!(cert.is_ca(), Some(true));
        assert_eq!(cert.subject().text, "CN=Root");
        assert_eq!(cert.issuer_hash(), cert.subject_hash());
        assert_eq!(cert.signature_algorithm(), &oid::ECDSA_WITH_SHA256);
        assert_eq!(cert.signature_hash(), Some(HashAlgorithm::Sha256));
        assert_eq!(cert.authority_key_id(), cert.subject_key_id());
        assert_eq!(cert.to_string(), "[X.509 Cert. Subject:CN=Root, Issuer:CN=Root]");
        assert!(key.verify_certificate_signature(&cert).unwrap());
    }

    #[test]
    fn test_der_roundtrip_preserves_fields() {
        let key = PrivateKey::generate_ed25519();
        let cert = self_signed(&key, "Ed Root", Validity::for_days(30));
        let again = Certificate::from_der(&cert.to_der().unwrap()).unwrap();
        assert_eq!(cert, again);
        assert_eq!(cert.serial(), again.serial());
        assert_eq!(cert.not_after(), again.not_after());
        assert!(again.is_self_signed());
    }

    #[test]
    fn test_remaining_days_boundary() {
        let key = PrivateKey::generate_ecdsa(EcCurve::P256);
        let now = OffsetDateTime::from_unix_timestamp(OffsetDateTime::now_utc().unix_timestamp()).unwrap();
        let validity = Validity {
            not_before: now - Duration::days(1),
            not_after: now + Duration::days(10),
        };
        let cert = self_signed(&key, "Root", validity.clone());

        assert_eq!(cert.remaining_days(validity.not_after), 0.0);
        assert_eq!(cert.remaining_days(validity.not_after + Duration::days(1)), -1.0);
        assert!((cert.remaining_days(ReferenceTime::Now) - 10.0).abs() < 0.01);
    }

    #[test]
    fn test_replace_key_then_resign() {
        let key = PrivateKey::generate_ecdsa(EcCurve::P256);
        let other = PrivateKey::generate_ecdsa(EcCurve::P384);
        let mut cert = self_signed(&key, "Root", Validity::for_days(30));

        cert.replace_public_key(&other).unwrap();
        assert_eq!(cert.public_key(), &other.public_key());
        assert!(!cert.is_self_signed());

        cert.resign_with(&other).unwrap();
        assert!(cert.is_self_signed());
        // The declared algorithm is kept as it was.
        assert_eq!(cert.signature_algorithm(), &oid::ECDSA_WITH_SHA256);
    }

    #[test]
    fn test_hash_override_keeps_declared_algorithm() {
        let key = PrivateKey::generate_rsa(1024).unwrap();
        let cert = self_signed(&key, "RSA Root", Validity::for_days(30));
        let tbs = cert.as_x509().tbs_certificate.clone();

        let resigned = key.sign_tbs_certificate(tbs, Some(HashAlgorithm::Sha512)).unwrap();
        assert_eq!(resigned.signature_algorithm(), &oid::SHA256_WITH_RSA);
        // Verification follows the declared digest, so it no longer matches.
        assert!(!resigned.is_self_signed());
    }
}
