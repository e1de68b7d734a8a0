mod util;

use pkitrust::cert::Certificate;
use pkitrust::crl::Crl;
use pkitrust::error::PkiError;
use pkitrust::export::PkiExport;
use pkitrust::issuer::{CrlParams, Issuer};
use pkitrust::key::{EcCurve, KeyAlgorithm, PrivateKey, PublicKey};
use pkitrust::pem_utils::{decode_pem, encode_pem};
use pkitrust::resolver::{Encoding, ImportLimits, ObjectCategory, ObjectKind, PkiObject, resolve};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey};

#[test]
fn test_public_key_pem_and_der_resolve_alike() {
    let key = PrivateKey::generate_ecdsa(EcCurve::P384).public_key();
    let pem = key.to_pem().unwrap();
    let der = PkiExport::to_der(&key).unwrap();

    let from_pem = resolve(pem.as_str(), &ImportLimits::default(), ObjectCategory::PublicKey).unwrap();
    assert_eq!(from_pem.encoding, Encoding::Pem);
    assert_eq!(from_pem.marker, "PUBLIC KEY");
    assert_eq!(from_pem.object.kind(), ObjectKind::EcdsaPublicKey);

    let from_der = resolve(&der, &ImportLimits::default(), ObjectCategory::PublicKey).unwrap();
    assert_eq!(from_der.encoding, Encoding::Der);
    match (from_pem.object, from_der.object) {
        (PkiObject::PublicKey(a), PkiObject::PublicKey(b)) => {
            assert_eq!(a, key);
            assert_eq!(b, key);
        }
        other => panic!("unexpected objects: {other:?}"),
    }
}

#[test]
fn test_rsa_pkcs1_forms() {
    let key = PrivateKey::generate_rsa(2048).unwrap();
    let PrivateKey::Rsa(inner) = &key else {
        unreachable!()
    };

    let pkcs1 = encode_pem(inner.to_pkcs1_der().unwrap().as_bytes(), "RSA PRIVATE KEY");
    let resolved = resolve(pkcs1.as_str(), &ImportLimits::default(), ObjectCategory::PrivateKey).unwrap();
    assert_eq!(resolved.marker, "RSA PRIVATE KEY");
    assert_eq!(resolved.object.kind(), ObjectKind::RsaPrivateKey);

    let pkcs8 = resolve(&key.to_der().unwrap(), &ImportLimits::default(), ObjectCategory::PrivateKey).unwrap();
    assert_eq!(pkcs8.marker, "PRIVATE KEY");

    let public = key.public_key();
    let PublicKey::Rsa(rsa_public) = &public else {
        unreachable!()
    };
    let pkcs1_public = rsa_public.to_pkcs1_der().unwrap();
    let resolved = resolve(pkcs1_public.as_bytes(), &ImportLimits::default(), ObjectCategory::PublicKey).unwrap();
    assert_eq!(resolved.marker, "RSA PUBLIC KEY");
    assert_eq!(PublicKey::import(pkcs1_public.as_bytes()).unwrap(), public);
    assert_eq!(public.key_size(), 2048);
}

#[test]
fn test_ed25519_private_key() {
    let key = PrivateKey::generate_ed25519();
    let imported = PrivateKey::import(key.to_pem().unwrap().as_str()).unwrap();
    assert_eq!(imported.algorithm(), KeyAlgorithm::Ed25519);
    assert_eq!(imported.public_key(), key.public_key());
}

#[test]
fn test_ec_parameters_bundle() {
    let key = PrivateKey::generate_ecdsa(EcCurve::P256);
    // Named curve prime256v1, as OpenSSL writes it before the key.
    let params = [0x06, 0x08, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07];
    let sec1 = match &key {
        PrivateKey::Ecdsa(pkitrust::key::EcdsaPrivateKey::P256(secret)) => util::sec1_p256_named(secret),
        _ => unreachable!(),
    };
    let bundle = format!(
        "{}{}",
        encode_pem(&params, "EC PARAMETERS"),
        encode_pem(&sec1, "EC PRIVATE KEY")
    );

    let resolved = resolve(bundle.as_str(), &ImportLimits::default(), ObjectCategory::PrivateKey).unwrap();
    assert_eq!(resolved.object.kind(), ObjectKind::EcdsaPrivateKey);
    let PkiObject::PrivateKey(imported) = resolved.object else {
        unreachable!()
    };
    assert_eq!(imported.public_key(), key.public_key());

    // The EC key alone still names its curve.
    let alone = PrivateKey::import(encode_pem(&sec1, "EC PRIVATE KEY").as_str()).unwrap();
    assert_eq!(alone.algorithm(), KeyAlgorithm::Ecdsa(EcCurve::P256));
}

#[test]
fn test_certificate_and_crl_files() {
    let pki = util::generate_hierarchy();
    let dir = tempfile::tempdir().unwrap();

    let pem_path = dir.path().join("leaf.pem");
    let der_path = dir.path().join("leaf.cer");
    pki.leaf.cert.export(&pem_path, None).unwrap();
    pki.leaf.cert.export(&der_path, None).unwrap();
    assert_eq!(Certificate::import(&pem_path).unwrap(), pki.leaf.cert);
    let reimported = Certificate::import(&der_path).unwrap();
    assert_eq!(reimported.serial(), pki.leaf.cert.serial());
    assert_eq!(reimported.subject_hash(), pki.leaf.cert.subject_hash());
    assert_eq!(reimported.issuer().hash, pki.leaf.cert.issuer().hash);
    assert_eq!(reimported.not_before(), pki.leaf.cert.not_before());
    assert_eq!(reimported.not_after(), pki.leaf.cert.not_after());

    let crl = pki.intermediate.issue_crl(&CrlParams::builder().build()).unwrap();
    let crl_path = dir.path().join("intermediate.crl");
    crl.export(&crl_path, Some(Encoding::Pem)).unwrap();
    let imported = Crl::import(&crl_path).unwrap();
    assert_eq!(imported.to_der().unwrap(), crl.to_der().unwrap());
    assert!(std::fs::read_to_string(&crl_path).unwrap().starts_with("-----BEGIN X509 CRL-----"));
}

#[test]
fn test_export_import_is_stable() {
    let key = PrivateKey::generate_ecdsa(EcCurve::P521);
    let once = PrivateKey::import(&key.to_der().unwrap()).unwrap();
    let twice = PrivateKey::import(&once.to_der().unwrap()).unwrap();
    assert_eq!(once.to_der().unwrap(), twice.to_der().unwrap());
    assert_eq!(twice.public_key(), key.public_key());
}

#[test]
fn test_wrong_category_fails() {
    let pki = util::generate_hierarchy();
    let der = pki.leaf.cert.to_der().unwrap();

    let err = PrivateKey::import(&der).unwrap_err();
    assert!(matches!(&err, PkiError::ImportError(msg) if msg.contains("unable to import private key")));
    assert!(matches!(Crl::import(&der), Err(PkiError::ImportError(_))));
}

#[test]
fn test_oversized_private_key_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("huge.key");
    std::fs::write(&path, vec![b'A'; 51 * 1024]).unwrap();

    let err = PrivateKey::import(&path).unwrap_err();
    assert!(matches!(err, PkiError::ImportError(_)));

    // Under a raised limit the size check passes and decoding fails instead.
    let limits = ImportLimits::builder().private_key(64 * 1024).build();
    let err = PrivateKey::import_with(&path, &limits).unwrap_err();
    assert!(matches!(&err, PkiError::ImportError(msg) if msg.contains("unable to import")));
}

#[test]
fn test_decode_pem_rejects_bundles() {
    let pki = util::generate_hierarchy();
    let bundle = format!(
        "{}{}",
        pki.leaf.cert.to_pem().unwrap(),
        pki.intermediate.cert.to_pem().unwrap()
    );
    assert!(matches!(decode_pem(&bundle), Err(PkiError::FormatError(_))));
    assert_eq!(
        decode_pem(&pki.leaf.cert.to_pem().unwrap()).unwrap(),
        pki.leaf.cert.to_der().unwrap()
    );
}
