#![allow(dead_code)]

use pkitrust::cert::Certificate;
use pkitrust::cert::extensions::ExtendedKeyUsageOption;
use pkitrust::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use pkitrust::issuer::{CertificateWithPrivateKey, Issuer};
use pkitrust::key::{EcCurve, PrivateKey};
use time::{Duration, OffsetDateTime};

fn request(common_name: &str, key: &PrivateKey, is_ca: bool) -> CertificationRequestInfo {
    CertificationRequestInfo::builder()
        .subject(
            DistinguishedName::builder()
                .common_name(common_name.to_string())
                .organization("pkitrust tests".to_string())
                .build(),
        )
        .subject_public_key(key.public_key())
        .is_ca(is_ca)
        .usages(if is_ca {
            vec![]
        } else {
            vec![ExtendedKeyUsageOption::ServerAuth]
        })
        .build()
}

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    generate_named_ca("myca.local")
}

pub fn generate_named_ca(common_name: &str) -> CertificateWithPrivateKey {
    let ca_key = PrivateKey::generate_ecdsa(EcCurve::P256);
    let info = request(common_name, &ca_key, true);

    CertificateWithPrivateKey {
        cert: Certificate::new_self_signed(&info, &ca_key, Validity::for_days(3650)).unwrap(),
        key: ca_key,
    }
}

pub fn issue_intermediate(parent: &CertificateWithPrivateKey, common_name: &str) -> CertificateWithPrivateKey {
    let key = PrivateKey::generate_ecdsa(EcCurve::P384);
    let cert = parent
        .issue(&request(common_name, &key, true), Validity::for_days(1825))
        .unwrap();
    CertificateWithPrivateKey { cert, key }
}

pub fn issue_leaf(parent: &CertificateWithPrivateKey, common_name: &str) -> CertificateWithPrivateKey {
    issue_leaf_valid_for(parent, common_name, Validity::for_days(365))
}

/// A leaf whose validity ended yesterday.
pub fn issue_expired_leaf(parent: &CertificateWithPrivateKey, common_name: &str) -> CertificateWithPrivateKey {
    let now = OffsetDateTime::now_utc();
    let validity = Validity {
        not_before: now - Duration::days(30),
        not_after: now - Duration::days(1),
    };
    issue_leaf_valid_for(parent, common_name, validity)
}

fn issue_leaf_valid_for(
    parent: &CertificateWithPrivateKey,
    common_name: &str,
    validity: Validity,
) -> CertificateWithPrivateKey {
    let key = PrivateKey::generate_ed25519();
    let cert = parent.issue(&request(common_name, &key, false), validity).unwrap();
    CertificateWithPrivateKey { cert, key }
}

/// Root, intermediate and leaf, each issued by the one before.
pub struct Hierarchy {
    pub root: CertificateWithPrivateKey,
    pub intermediate: CertificateWithPrivateKey,
    pub leaf: CertificateWithPrivateKey,
}

pub fn generate_hierarchy() -> Hierarchy {
    let root = generate_named_ca("Test Root CA");
    let intermediate = issue_intermediate(&root, "Test Intermediate CA");
    let leaf = issue_leaf(&intermediate, "leaf.example.com");
    Hierarchy {
        root,
        intermediate,
        leaf,
    }
}

/// Bare SEC1 `ECPrivateKey` carrying `[0] prime256v1`, the shape OpenSSL writes.
pub fn sec1_p256_named(key: &p256::SecretKey) -> Vec<u8> {
    let plain = key.to_sec1_der().unwrap();
    // version and privateKey, then the [1] publicKey
    let (head, public) = plain[2..].split_at(3 + 2 + 32);
    let mut curve = vec![0xa0, 0x0a];
    curve.extend_from_slice(&der::Encode::to_der(&pkitrust::oid::CURVE_P256).unwrap());
    let body = [head, curve.as_slice(), public].concat();
    let mut der = vec![0x30, body.len() as u8];
    der.extend_from_slice(&body);
    der
}
