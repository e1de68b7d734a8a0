use x509_cert::Version;
use x509_cert::certificate::TbsCertificateInner;
use x509_cert::crl::{RevokedCert, TbsCertList};
use x509_cert::ext::Extension;
use x509_cert::name::Name;
use x509_cert::serial_number::SerialNumber;
use x509_cert::spki::AlgorithmIdentifierOwned;
use time::OffsetDateTime;

use crate::cert::params::Validity;
use crate::error::Result;
use crate::fields::to_x509_time;
use crate::key::PublicKey;
use crate::signature::SignatureAlgorithm;

/// Represents the "To Be Signed" (TBS) portion of an X.509 certificate.
///
/// # Fields
/// * `serial_number` - The unique identifier for the certificate.
/// * `signature_algorithm` - The algorithm used to sign the certificate.
/// * `issuer` - The distinguished name of the certificate issuer.
/// * `validity` - The certificate's validity period.
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `extensions` - Additional X.509 extensions for the certificate.
pub struct TbsCertificate {
    pub serial_number: Vec<u8>,
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub validity: Validity,
    pub subject: Name,
    pub subject_public_key: PublicKey,
    pub extensions: Vec<Extension>,
}

impl TbsCertificate {
    /// Converts the `TbsCertificate` into a `TbsCertificateInner` for DER encoding.
    pub fn to_tbs_certificate_inner(&self) -> Result<TbsCertificateInner> {
        let algorithm_id: AlgorithmIdentifierOwned = self.signature_algorithm.into();

        Ok(TbsCertificateInner {
            version: Version::V3,
            serial_number: SerialNumber::new(&self.serial_number)?,
            signature: algorithm_id,
            issuer: self.issuer.clone(),
            validity: self.validity.to_x509_validity()?,
            subject: self.subject.clone(),
            subject_public_key_info: self.subject_public_key.to_spki()?,
            issuer_unique_id: None,
            subject_unique_id: None,
            extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
        })
    }
}

/// The "To Be Signed" portion of a v2 CRL.
pub struct TbsCrl {
    pub signature_algorithm: SignatureAlgorithm,
    pub issuer: Name,
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    /// `(serial, revocation date)` pairs, kept in the given order.
    pub revoked: Vec<(Vec<u8>, OffsetDateTime)>,
    pub extensions: Vec<Extension>,
}

impl TbsCrl {
    pub fn to_tbs_cert_list(&self) -> Result<TbsCertList> {
        let revoked = self
            .revoked
            .iter()
            .map(|(serial, date)| {
                Ok(RevokedCert {
                    serial_number: SerialNumber::new(serial)?,
                    revocation_date: to_x509_time(*date)?,
                    crl_entry_extensions: None,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(TbsCertList {
            version: Version::V2,
            signature: self.signature_algorithm.into(),
            issuer: self.issuer.clone(),
            this_update: to_x509_time(self.this_update)?,
            next_update: self.next_update.map(to_x509_time).transpose()?,
            revoked_certificates: (!revoked.is_empty()).then_some(revoked),
            crl_extensions: (!self.extensions.is_empty()).then(|| self.extensions.clone()),
        })
    }
}
