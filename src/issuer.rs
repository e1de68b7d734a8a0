use bon::Builder;
use der::Encode;
use der::asn1::BitString;
use der::flagset::FlagSet;
use time::OffsetDateTime;
use x509_cert::crl::CertificateList;
use x509_cert::name::Name;

use crate::cert::Certificate;
use crate::cert::extensions::{
    AuthorityKeyIdentifier, BasicConstraints, CrlNumber, ExtendedKeyUsage,
    ExtendedKeyUsageOption, KeyUsage, KeyUsages, SubjectKeyIdentifier, ToAndFromX509Extension,
};
use crate::cert::params::{CertificationRequestInfo, Validity};
use crate::crl::Crl;
use crate::error::Result;
use crate::key::{PrivateKey, key_identifier};
use crate::signature::SignatureAlgorithm;
use crate::tbs_certificate::{TbsCertificate, TbsCrl};

/// Parameters for issuing a CRL.
#[derive(Clone, Debug, Builder)]
pub struct CrlParams {
    #[builder(default = OffsetDateTime::now_utc())]
    pub this_update: OffsetDateTime,
    pub next_update: Option<OffsetDateTime>,
    /// Value of the CRLNumber extension, big-endian.
    pub number: Option<Vec<u8>>,
    /// `(serial, revocation date)` pairs.
    #[builder(default)]
    pub revoked: Vec<(Vec<u8>, OffsetDateTime)>,
}

/// Represents an entity capable of issuing certificates and CRLs.
pub trait Issuer {
    /// Returns the distinguished name of the issuer.
    fn issuer_name(&self) -> Name;

    /// Returns the signing key of the issuer.
    fn signing_key(&self) -> &PrivateKey;

    /// Signature algorithm for everything this issuer signs.
    fn signature_algorithm(&self) -> SignatureAlgorithm {
        SignatureAlgorithm::default_for(self.signing_key().algorithm())
    }

    /// Issues a certificate based on the provided certification request information.
    ///
    /// The result carries BasicConstraints, SubjectKeyIdentifier,
    /// AuthorityKeyIdentifier, KeyUsage when any usage applies, and
    /// ExtendedKeyUsage when the request names usages.
    fn issue(&self, cert_request: &CertificationRequestInfo, validity: Validity) -> Result<Certificate> {
        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: Some(key_identifier(&self.signing_key().public_key())?),
        };
        let subject_key_id = SubjectKeyIdentifier(key_identifier(&cert_request.subject_public_key)?);

        let basic_constraints = BasicConstraints {
            is_ca: cert_request.is_ca,
            max_path_length: cert_request.max_path_length.filter(|_| cert_request.is_ca),
        };

        let mut extensions = cert_request
            .extensions
            .iter()
            .map(|ext| ext.to_x509_extension())
            .collect::<Result<Vec<_>>>()?;
        extensions.push(basic_constraints.to_extension(true)?);
        extensions.push(subject_key_id.to_extension(false)?);
        extensions.push(authority_key_id.to_extension(false)?);

        let mut key_usage_flags: FlagSet<KeyUsages> = FlagSet::empty();

        if cert_request.is_ca {
            key_usage_flags |= KeyUsages::DigitalSignature;
            key_usage_flags |= KeyUsages::KeyCertSign;
            key_usage_flags |= KeyUsages::CRLSign;
        }

        for usage in &cert_request.usages {
            match usage {
                ExtendedKeyUsageOption::ClientAuth
                | ExtendedKeyUsageOption::ServerAuth
                | ExtendedKeyUsageOption::EmailProtection => {
                    key_usage_flags |= KeyUsages::DigitalSignature;
                    key_usage_flags |= KeyUsages::KeyEncipherment;
                }
                ExtendedKeyUsageOption::CodeSigning
                | ExtendedKeyUsageOption::TimeStamping
                | ExtendedKeyUsageOption::OcspSigning => {
                    key_usage_flags |= KeyUsages::DigitalSignature;
                }
            }
        }

        if !key_usage_flags.is_empty() {
            extensions.push(KeyUsage(key_usage_flags).to_extension(true)?);
        }

        if !cert_request.usages.is_empty() {
            let extended_key_usage = ExtendedKeyUsage::from(cert_request.usages.as_slice());
            extensions.push(extended_key_usage.to_extension(false)?);
        }

        let serial_number = cert_request
            .serial_number
            .clone()
            .unwrap_or_else(random_serial);

        let tbs_cert = TbsCertificate {
            serial_number,
            signature_algorithm: self.signature_algorithm(),
            issuer: self.issuer_name(),
            validity,
            subject: cert_request.subject.to_x509_name()?,
            subject_public_key: cert_request.subject_public_key.clone(),
            extensions,
        };

        log::debug!("Issuing certificate for {}", tbs_cert.subject);
        self.signing_key()
            .sign_tbs_certificate(tbs_cert.to_tbs_certificate_inner()?, None)
    }

    /// Issues a v2 CRL carrying AuthorityKeyIdentifier and, when given, CRLNumber.
    fn issue_crl(&self, params: &CrlParams) -> Result<Crl> {
        let authority_key_id = AuthorityKeyIdentifier {
            key_identifier: Some(key_identifier(&self.signing_key().public_key())?),
        };
        let mut extensions = vec![authority_key_id.to_extension(false)?];
        if let Some(number) = &params.number {
            extensions.push(CrlNumber(number.clone()).to_extension(false)?);
        }

        let tbs = TbsCrl {
            signature_algorithm: self.signature_algorithm(),
            issuer: self.issuer_name(),
            this_update: params.this_update,
            next_update: params.next_update,
            revoked: params.revoked.clone(),
            extensions,
        }
        .to_tbs_cert_list()?;

        let signature = self
            .signing_key()
            .sign_declared(&tbs.to_der()?, &tbs.signature.oid, None)?;

        Crl::from_x509(CertificateList {
            signature_algorithm: tbs.signature.clone(),
            tbs_cert_list: tbs,
            signature: BitString::from_bytes(&signature)?,
        })
    }
}

fn random_serial() -> Vec<u8> {
    // Positive and never zero.
    let serial = (rand::random::<u64>() >> 1) | 1;
    serial.to_be_bytes().to_vec()
}

/// Issues self-signed certificates: the subject names itself as issuer.
pub(crate) struct SelfIssuer<'a> {
    pub(crate) name: Name,
    pub(crate) key: &'a PrivateKey,
}

impl Issuer for SelfIssuer<'_> {
    fn issuer_name(&self) -> Name {
        self.name.clone()
    }

    fn signing_key(&self) -> &PrivateKey {
        self.key
    }
}

/// A certificate together with the private key matching its public key.
#[derive(Debug, Clone)]
pub struct CertificateWithPrivateKey {
    pub cert: Certificate,
    pub key: PrivateKey,
}

impl Issuer for CertificateWithPrivateKey {
    fn issuer_name(&self) -> Name {
        // The name of the issuer is the subject of the certificate
        self.cert.subject().name.clone()
    }

    fn signing_key(&self) -> &PrivateKey {
        &self.key
    }
}
