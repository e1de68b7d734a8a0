mod util;

use pkitrust::crl::Crl;
use pkitrust::issuer::{CertificateWithPrivateKey, CrlParams, Issuer};
use time::OffsetDateTime;

fn crl_listing(issuer: &CertificateWithPrivateKey, serials: &[&[u8]]) -> Crl {
    let now = OffsetDateTime::now_utc();
    let params = CrlParams::builder()
        .revoked(serials.iter().map(|s| (s.to_vec(), now)).collect())
        .build();
    issuer.issue_crl(&params).unwrap()
}

#[test]
fn test_matching_authority_key_id_revokes() {
    let pki = util::generate_hierarchy();
    let crl = crl_listing(&pki.intermediate, &[pki.leaf.cert.serial()]);

    assert_eq!(crl.authority_key_id(), pki.leaf.cert.authority_key_id());
    assert!(pki.leaf.cert.is_revoked_by([&crl]));
    // The intermediate is not listed by its own CRL.
    assert!(!pki.intermediate.cert.is_revoked_by([&crl]));
}

#[test]
fn test_crl_from_other_issuer_does_not_revoke() {
    let pki = util::generate_hierarchy();
    let other = util::generate_named_ca("Other CA");
    let crl = crl_listing(&other, &[pki.leaf.cert.serial()]);

    assert_ne!(crl.issuer().text, pki.leaf.cert.issuer().text);
    assert!(!pki.leaf.cert.is_revoked_by([&crl]));
    assert!(!pki.leaf.cert.is_revoked_by(std::iter::empty::<&Crl>()));
}

#[test]
fn test_issuer_name_match_without_key_id_match() {
    let pki = util::generate_hierarchy();
    // Same subject name as the real intermediate, different key.
    let namesake = util::issue_intermediate(&pki.root, "Test Intermediate CA");
    let crl = crl_listing(&namesake, &[pki.leaf.cert.serial()]);

    assert_ne!(crl.authority_key_id(), pki.leaf.cert.authority_key_id());
    assert_eq!(crl.issuer().text, pki.leaf.cert.issuer().text);
    assert!(pki.leaf.cert.is_revoked_by([&crl]));
}

#[test]
fn test_first_matching_crl_decides() {
    let pki = util::generate_hierarchy();
    let serial = pki.leaf.cert.serial();
    let unrelated = crl_listing(&util::generate_named_ca("Other CA"), &[]);
    let newer_without = crl_listing(&pki.intermediate, &[]);
    let older_with = crl_listing(&pki.intermediate, &[serial]);

    assert!(pki.leaf.cert.is_revoked_by([&unrelated, &older_with]));
    assert!(!pki.leaf.cert.is_revoked_by([&newer_without, &older_with]));
    assert!(pki.leaf.cert.is_revoked_by([&older_with, &newer_without]));
}

#[test]
fn test_serial_comparison_ignores_leading_zeros() {
    let pki = util::generate_hierarchy();
    let mut padded = vec![0x00];
    padded.extend_from_slice(pki.leaf.cert.serial());
    let crl = crl_listing(&pki.intermediate, &[&padded]);

    assert!(crl.lists_serial(pki.leaf.cert.serial()));
    assert!(pki.leaf.cert.is_revoked_by([&crl]));
}

#[test]
fn test_crl_survives_der_round_trip() {
    let pki = util::generate_hierarchy();
    let crl = crl_listing(&pki.intermediate, &[pki.leaf.cert.serial()]);
    let decoded = Crl::from_der(&crl.to_der().unwrap()).unwrap();

    assert_eq!(decoded.revoked(), crl.revoked());
    assert!(decoded.verify([&pki.intermediate.cert]));
    assert!(!decoded.verify([&pki.root.cert]));
    assert!(pki.leaf.cert.is_revoked_by([&decoded]));
}
