//! Certificate revocation lists.

use std::fmt;

use const_oid::ObjectIdentifier;
use der::{Decode, Encode};
use x509_cert::crl::CertificateList;

use crate::cert::Certificate;
use crate::cert::extensions::{AuthorityKeyIdentifier, CrlNumber, find_extension};
use crate::error::{PkiError, Result};
use crate::fields::{NameHash, NameInfo, Timestamp, normalize_serial};
use crate::oid;
use crate::signature::SignedObject;

/// One entry of a CRL's revoked certificate list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevokedEntry {
    /// Serial number magnitude, big-endian.
    pub serial: Vec<u8>,
    /// The revocation date as encoded, without the trailing `Z`.
    pub revocation_date: String,
}

/// A decoded X.509 CRL with its derived fields.
#[derive(Debug, Clone)]
pub struct Crl {
    inner: CertificateList,
    tbs_der: Vec<u8>,
    version: u8,
    signature_algorithm: ObjectIdentifier,
    issuer: NameInfo,
    last_update: Timestamp,
    next_update: Option<Timestamp>,
    number: Option<Vec<u8>>,
    revoked: Vec<RevokedEntry>,
    authority_key_id: Option<Vec<u8>>,
    signature: Vec<u8>,
}

impl Crl {
    pub fn from_der(der: &[u8]) -> Result<Self> {
        Self::from_x509(CertificateList::from_der(der)?)
    }

    pub fn from_x509(inner: CertificateList) -> Result<Self> {
        let tbs = &inner.tbs_cert_list;
        let extensions = tbs.crl_extensions.as_deref();

        let revoked = tbs
            .revoked_certificates
            .iter()
            .flatten()
            .map(|entry| {
                let date = Timestamp::from_x509(&entry.revocation_date)?;
                Ok(RevokedEntry {
                    serial: normalize_serial(entry.serial_number.as_bytes()),
                    revocation_date: date.encoded.trim_end_matches('Z').to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let signature = inner
            .signature
            .as_bytes()
            .ok_or_else(|| PkiError::DecodingError("signature is not octet aligned".to_string()))?
            .to_vec();

        Ok(Self {
            tbs_der: tbs.to_der()?,
            version: tbs.version as u8 + 1,
            signature_algorithm: tbs.signature.oid,
            issuer: NameInfo::from_name(&tbs.issuer),
            last_update: Timestamp::from_x509(&tbs.this_update)?,
            next_update: tbs.next_update.as_ref().map(Timestamp::from_x509).transpose()?,
            number: find_extension::<CrlNumber>(extensions)?.map(|n| n.0),
            revoked,
            authority_key_id: find_extension::<AuthorityKeyIdentifier>(extensions)?
                .and_then(|akid| akid.key_identifier),
            signature,
            inner,
        })
    }

    pub fn as_x509(&self) -> &CertificateList {
        &self.inner
    }

    pub fn to_der(&self) -> Result<Vec<u8>> {
        self.inner
            .to_der()
            .map_err(|e| PkiError::EncodingError(e.to_string()))
    }

    pub fn version(&self) -> u8 {
        self.version
    }

    pub fn signature_algorithm(&self) -> &ObjectIdentifier {
        &self.signature_algorithm
    }

    pub fn issuer(&self) -> &NameInfo {
        &self.issuer
    }

    pub fn last_update(&self) -> &Timestamp {
        &self.last_update
    }

    pub fn next_update(&self) -> Option<&Timestamp> {
        self.next_update.as_ref()
    }

    /// The CRLNumber extension value, big-endian.
    pub fn number(&self) -> Option<&[u8]> {
        self.number.as_deref()
    }

    /// Revoked entries in the order the CRL lists them.
    pub fn revoked(&self) -> &[RevokedEntry] {
        &self.revoked
    }

    pub fn authority_key_id(&self) -> Option<&[u8]> {
        self.authority_key_id.as_deref()
    }

    pub fn lists_serial(&self, serial: &[u8]) -> bool {
        let serial = normalize_serial(serial);
        self.revoked.iter().any(|entry| entry.serial == serial)
    }

    /// True iff one of `anchors` issued this CRL.
    pub fn verify<'a>(&self, anchors: impl IntoIterator<Item = &'a Certificate>) -> bool {
        anchors.into_iter().any(|anchor| anchor.is_issuer_of(self))
    }
}

impl SignedObject for Crl {
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

impl fmt::Display for Crl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Version: {}", self.version)?;
        writeln!(f, "sigAlg: {}", oid::name_of(&self.signature_algorithm))?;
        writeln!(f, "Issuer: {}", self.issuer.text)?;
        writeln!(f, "lastUpdate: {}", self.last_update.encoded)?;
        match &self.next_update {
            Some(next) => write!(f, "nextUpdate: {}", next.encoded),
            None => write!(f, "nextUpdate: None"),
        }
    }
}
