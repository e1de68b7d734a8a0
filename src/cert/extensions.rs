use const_oid::AssociatedOid;
use der::{
    Decode, Encode,
    asn1::OctetString,
    oid::ObjectIdentifier,
};
use x509_cert::ext::Extension;

use crate::error::PkiError;

/// Trait for converting to and from X.509 extensions.
///
/// This trait provides methods to encode and decode X.509 extension values.
///
/// # Example
/// ```
/// use pkitrust::cert::extensions::{BasicConstraints, ToAndFromX509Extension};
/// let bc = BasicConstraints { is_ca: true, max_path_length: Some(0) };
/// let encoded = bc.to_x509_extension_value().unwrap();
/// let decoded = BasicConstraints::from_x509_extension_value(&encoded).unwrap();
/// assert_eq!(decoded.max_path_length, Some(0));
/// ```
pub trait ToAndFromX509Extension {
    /// The Object Identifier (OID) for the extension.
    const OID: ObjectIdentifier;

    /// Encodes the extension into a DER-encoded byte vector.
    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError>;

    /// Decodes the extension from a DER-encoded byte slice.
    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError>
    where
        Self: Sized;

    /// Wraps the encoded value as an X.509 `Extension`.
    fn to_extension(&self, critical: bool) -> Result<Extension, PkiError> {
        Ok(Extension {
            extn_id: Self::OID,
            critical,
            extn_value: OctetString::new(self.to_x509_extension_value()?)?,
        })
    }
}

/// Decodes the first extension with `E`'s OID, if present.
pub(crate) fn find_extension<E: ToAndFromX509Extension>(
    extensions: Option<&[Extension]>,
) -> Result<Option<E>, PkiError> {
    extensions
        .unwrap_or_default()
        .iter()
        .find(|ext| ext.extn_id == E::OID)
        .map(|ext| E::from_x509_extension_value(ext.extn_value.as_bytes()))
        .transpose()
}

/// Represents the Basic Constraints extension.
///
/// This extension indicates whether the certificate is a CA certificate and its path length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BasicConstraints {
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
}

impl ToAndFromX509Extension for BasicConstraints {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::BasicConstraints::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let bc = x509_cert::ext::pkix::BasicConstraints {
            ca: self.is_ca,
            path_len_constraint: self.max_path_length,
        };

        Ok(bc.to_der()?)
    }

    fn from_x509_extension_value(der_bytes: &[u8]) -> Result<Self, PkiError> {
        let bc = x509_cert::ext::pkix::BasicConstraints::from_der(der_bytes)?;
        Ok(Self {
            is_ca: bc.ca,
            max_path_length: bc.path_len_constraint,
        })
    }
}

pub use der::flagset::FlagSet;
use x509_cert::ext::pkix::KeyUsage as X509KeyUsage;
pub use x509_cert::ext::pkix::KeyUsages;

/// Represents the Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyUsage(pub FlagSet<KeyUsages>);

impl ToAndFromX509Extension for KeyUsage {
    const OID: ObjectIdentifier = <X509KeyUsage as AssociatedOid>::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        Ok(X509KeyUsage::from(self.0).to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let ku = X509KeyUsage::from_der(extension)?;
        Ok(Self(ku.0))
    }
}

/// Represents the Extended Key Usage extension.
///
/// Purposes are kept as raw OIDs so that certificates naming purposes
/// outside [`ExtendedKeyUsageOption`] still import.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedKeyUsage {
    pub usage: Vec<ObjectIdentifier>,
}

impl ExtendedKeyUsage {
    /// The purposes this crate has names for.
    pub fn known_options(&self) -> Vec<ExtendedKeyUsageOption> {
        self.usage
            .iter()
            .filter_map(ExtendedKeyUsageOption::from_oid)
            .collect()
    }
}

impl From<&[ExtendedKeyUsageOption]> for ExtendedKeyUsage {
    fn from(options: &[ExtendedKeyUsageOption]) -> Self {
        Self {
            usage: options.iter().map(|&v| v.into()).collect(),
        }
    }
}

impl ToAndFromX509Extension for ExtendedKeyUsage {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::ExtendedKeyUsage::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage(self.usage.clone());
        Ok(eku.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let eku = x509_cert::ext::pkix::ExtendedKeyUsage::from_der(extension)?;
        Ok(Self { usage: eku.0 })
    }
}

/// Represents an option for the Extended Key Usage extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtendedKeyUsageOption {
    ServerAuth,
    ClientAuth,
    CodeSigning,
    EmailProtection,
    TimeStamping,
    OcspSigning,
}

impl ExtendedKeyUsageOption {
    pub fn from_oid(oid: &ObjectIdentifier) -> Option<Self> {
        use const_oid::db::rfc5912::*;
        match *oid {
            ID_KP_SERVER_AUTH => Some(Self::ServerAuth),
            ID_KP_CLIENT_AUTH => Some(Self::ClientAuth),
            ID_KP_CODE_SIGNING => Some(Self::CodeSigning),
            ID_KP_EMAIL_PROTECTION => Some(Self::EmailProtection),
            ID_KP_TIME_STAMPING => Some(Self::TimeStamping),
            ID_KP_OCSP_SIGNING => Some(Self::OcspSigning),
            _ => None,
        }
    }
}

impl From<ExtendedKeyUsageOption> for ObjectIdentifier {
    fn from(value: ExtendedKeyUsageOption) -> Self {
        use const_oid::db::rfc5912::*;
        match value {
            ExtendedKeyUsageOption::ServerAuth => ID_KP_SERVER_AUTH,
            ExtendedKeyUsageOption::ClientAuth => ID_KP_CLIENT_AUTH,
            ExtendedKeyUsageOption::CodeSigning => ID_KP_CODE_SIGNING,
            ExtendedKeyUsageOption::EmailProtection => ID_KP_EMAIL_PROTECTION,
            ExtendedKeyUsageOption::TimeStamping => ID_KP_TIME_STAMPING,
            ExtendedKeyUsageOption::OcspSigning => ID_KP_OCSP_SIGNING,
        }
    }
}

/// Represents the Authority Key Identifier (AKI) extension.
///
/// Only the `keyIdentifier` field takes part in revocation matching; the
/// issuer/serial alternative is not produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthorityKeyIdentifier {
    pub key_identifier: Option<Vec<u8>>,
}

impl ToAndFromX509Extension for AuthorityKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::AuthorityKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier {
            key_identifier: self
                .key_identifier
                .as_deref()
                .map(OctetString::new)
                .transpose()?,
            authority_cert_issuer: None,
            authority_cert_serial_number: None,
        };

        Ok(aki.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let aki = x509_cert::ext::pkix::AuthorityKeyIdentifier::from_der(extension)?;
        Ok(Self {
            key_identifier: aki.key_identifier.map(|id| id.as_bytes().to_vec()),
        })
    }
}

/// Represents the Subject Key Identifier extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubjectKeyIdentifier(pub Vec<u8>);

impl ToAndFromX509Extension for SubjectKeyIdentifier {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::SubjectKeyIdentifier::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let skid = x509_cert::ext::pkix::SubjectKeyIdentifier(OctetString::new(self.0.clone())?);
        Ok(skid.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let skid = x509_cert::ext::pkix::SubjectKeyIdentifier::from_der(extension)?;
        Ok(Self(skid.0.as_bytes().to_vec()))
    }
}

/// Represents the CRL Number extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrlNumber(pub Vec<u8>);

impl ToAndFromX509Extension for CrlNumber {
    const OID: ObjectIdentifier = x509_cert::ext::pkix::CrlNumber::OID;

    fn to_x509_extension_value(&self) -> Result<Vec<u8>, PkiError> {
        let number = x509_cert::ext::pkix::CrlNumber(der::asn1::Uint::new(&self.0)?);
        Ok(number.to_der()?)
    }

    fn from_x509_extension_value(extension: &[u8]) -> Result<Self, PkiError> {
        let number = x509_cert::ext::pkix::CrlNumber::from_der(extension)?;
        Ok(Self(number.0.as_bytes().to_vec()))
    }
}
