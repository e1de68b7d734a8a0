use std::str::FromStr;

use bon::Builder;
use const_oid::ObjectIdentifier;
use der::asn1::{Ia5StringRef, OctetString, PrintableStringRef, Utf8StringRef};
use time::Duration;
use time::OffsetDateTime;
use x509_cert::attr::AttributeTypeAndValue;
use x509_cert::ext::Extension;
use x509_cert::name::{Name, RdnSequence};

pub use crate::cert::extensions::ExtendedKeyUsageOption;
use crate::error::{PkiError, Result};
use crate::fields::to_x509_time;
use crate::key::PublicKey;
use crate::oid;

/// Parameters for building an X.509 certificate.
///
/// # Fields
/// * `subject` - The distinguished name of the certificate subject.
/// * `subject_public_key` - The public key of the certificate subject.
/// * `usages` - A list of extended key usage options.
/// * `is_ca` - Indicates if the certificate is a CA.
/// * `max_path_length` - Path length constraint for CA certificates.
/// * `serial_number` - Serial to use; a random one is drawn when absent.
/// * `extensions` - Additional X.509 extensions, placed before the generated ones.
#[derive(Clone, Debug, Builder)]
pub struct CertificationRequestInfo {
    pub subject: DistinguishedName,
    pub subject_public_key: PublicKey,
    #[builder(default)]
    pub usages: Vec<ExtendedKeyUsageOption>,
    #[builder(default)]
    pub is_ca: bool,
    pub max_path_length: Option<u8>,
    pub serial_number: Option<Vec<u8>>,
    #[builder(default)]
    pub extensions: Vec<ExtensionParam>,
}

/// Distinguished name parameters for building an X.509 certificate.
///
/// Only the attributes that are set end up in the encoded name.
#[derive(Clone, Debug, Builder, Default, PartialEq, Eq)]
pub struct DistinguishedName {
    pub common_name: String,
    pub country: Option<String>,
    pub state: Option<String>,
    pub locality: Option<String>,
    pub organization: Option<String>,
    pub organization_unit: Option<String>,
}

impl DistinguishedName {
    /// Converts the distinguished name to an X.509 `Name`.
    pub fn to_x509_name(&self) -> Result<Name> {
        let parts = [
            ("CN", Some(self.common_name.as_str())),
            ("OU", self.organization_unit.as_deref()),
            ("O", self.organization.as_deref()),
            ("L", self.locality.as_deref()),
            ("ST", self.state.as_deref()),
            ("C", self.country.as_deref()),
        ];
        let rfc4514_name = parts
            .iter()
            .filter_map(|(key, value)| {
                value
                    .filter(|v| !v.is_empty())
                    .map(|v| format!("{key}={}", escape_rfc4514(v)))
            })
            .collect::<Vec<_>>()
            .join(",");
        RdnSequence::from_str(&rfc4514_name)
            .map_err(|e| PkiError::EncodingError(format!("invalid name {rfc4514_name:?}: {e}")))
    }

    /// Reads the attributes this type knows about out of an X.509 `Name`.
    /// Others are ignored, as are values in string types other than UTF8,
    /// Printable and IA5.
    pub fn from_x509_name(name: &Name) -> Self {
        let mut dn = DistinguishedName::default();
        for attr in name.0.iter().flat_map(|rdn| rdn.0.iter()) {
            let Some(value) = attribute_text(attr) else {
                continue;
            };
            match attr.oid {
                oid::ATTR_COMMON_NAME => dn.common_name = value,
                oid::ATTR_COUNTRY => dn.country = Some(value),
                oid::ATTR_STATE => dn.state = Some(value),
                oid::ATTR_LOCALITY => dn.locality = Some(value),
                oid::ATTR_ORGANIZATION => dn.organization = Some(value),
                oid::ATTR_ORGANIZATION_UNIT => dn.organization_unit = Some(value),
                _ => {}
            }
        }
        dn
    }
}

fn attribute_text(attr: &AttributeTypeAndValue) -> Option<String> {
    if let Ok(s) = attr.value.decode_as::<Utf8StringRef<'_>>() {
        return Some(s.as_str().to_string());
    }
    if let Ok(s) = attr.value.decode_as::<PrintableStringRef<'_>>() {
        return Some(s.as_str().to_string());
    }
    attr.value
        .decode_as::<Ia5StringRef<'_>>()
        .ok()
        .map(|s| s.as_str().to_string())
}

fn escape_rfc4514(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for (i, c) in value.chars().enumerate() {
        let leading = i == 0 && (c == ' ' || c == '#');
        if leading || matches!(c, ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Certificate validity period.
///
/// This struct represents the `notBefore` and `notAfter` fields in a certificate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Validity {
    pub not_before: OffsetDateTime,
    pub not_after: OffsetDateTime,
}

impl Validity {
    /// Creates a validity period starting now for the given number of days.
    pub fn for_days(days: i64) -> Self {
        let now = OffsetDateTime::now_utc();
        Self {
            not_before: now,
            not_after: now + Duration::days(days),
        }
    }

    pub fn to_x509_validity(&self) -> Result<x509_cert::time::Validity> {
        Ok(x509_cert::time::Validity {
            not_before: to_x509_time(self.not_before)?,
            not_after: to_x509_time(self.not_after)?,
        })
    }
}

/// Represents an X.509 extension.
///
/// # Fields
/// * `oid` - The object identifier of the extension.
/// * `critical` - Indicates if the extension is critical.
/// * `value` - The DER-encoded value of the extension.
#[derive(Clone, Debug)]
pub struct ExtensionParam {
    pub oid: ObjectIdentifier,
    pub critical: bool,
    /// DER-encoded extension value
    pub value: Vec<u8>,
}

impl ExtensionParam {
    pub fn to_x509_extension(&self) -> Result<Extension> {
        Ok(Extension {
            extn_id: self.oid,
            critical: self.critical,
            extn_value: OctetString::new(self.value.clone())?,
        })
    }
}
