mod util;

use botan::Certificate as BotanCertificate;

use pkitrust::cert::Certificate;
use pkitrust::cert::params::{CertificationRequestInfo, DistinguishedName, Validity};
use pkitrust::issuer::{CrlParams, Issuer};
use pkitrust::key::{EcCurve, PrivateKey};
use time::OffsetDateTime;

fn default_params(key: &PrivateKey) -> CertificationRequestInfo {
    let subject = DistinguishedName::builder()
        .common_name("crabs.crabs".to_string())
        .organization("Crab widgits SE".to_string())
        .build();
    CertificationRequestInfo::builder()
        .subject(subject)
        .subject_public_key(key.public_key())
        .build()
}

fn check_self_signed(key: PrivateKey) {
    let cert = Certificate::new_self_signed(&default_params(&key), &key, Validity::for_days(30)).unwrap();
    // Use botan crate to parse the DER and assert it succeeds
    BotanCertificate::load(&cert.to_der().unwrap()).expect("Botan failed to parse certificate");
}

#[test]
#[ignore]
fn test_botan_ecdsa_p256() {
    check_self_signed(PrivateKey::generate_ecdsa(EcCurve::P256));
}

#[test]
#[ignore]
fn test_botan_ed25519() {
    check_self_signed(PrivateKey::generate_ed25519());
}

#[test]
#[ignore]
fn test_botan_ecdsa_p384() {
    check_self_signed(PrivateKey::generate_ecdsa(EcCurve::P384));
}

#[test]
#[ignore]
fn test_botan_ecdsa_p521() {
    check_self_signed(PrivateKey::generate_ecdsa(EcCurve::P521));
}

#[test]
#[ignore]
fn test_botan_rsa() {
    check_self_signed(PrivateKey::generate_rsa(2048).unwrap());
}

#[test]
#[ignore]
fn test_botan_crl_revokes_leaf() {
    let pki = util::generate_hierarchy();
    let params = CrlParams::builder()
        .revoked(vec![(pki.leaf.cert.serial().to_vec(), OffsetDateTime::now_utc())])
        .build();
    let crl = pki.intermediate.issue_crl(&params).unwrap();

    let botan_crl = botan::CRL::load(&crl.to_der().unwrap()).expect("Botan failed to parse CRL");
    let leaf = BotanCertificate::load(&pki.leaf.cert.to_der().unwrap()).unwrap();
    assert!(botan_crl.is_revoked(&leaf).unwrap());
}
