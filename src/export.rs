//! Serialization of keys, certificates and CRLs to DER, PEM and files.

use std::path::Path;

use crate::cert::Certificate;
use crate::crl::Crl;
use crate::error::{PkiError, Result};
use crate::key::{PrivateKey, PublicKey};
use crate::pem_utils::encode_pem;
use crate::resolver::Encoding;

/// Common export surface of every PKI object.
pub trait PkiExport {
    /// Label used in the PEM armor.
    const PEM_LABEL: &'static str;

    fn to_der(&self) -> Result<Vec<u8>>;

    fn to_pem(&self) -> Result<String> {
        Ok(encode_pem(&self.to_der()?, Self::PEM_LABEL))
    }

    /// Writes the object to `path`. Without an explicit encoding, paths
    /// ending in `.pem` get PEM and everything else DER.
    fn export(&self, path: impl AsRef<Path>, encoding: Option<Encoding>) -> Result<()> {
        let path = path.as_ref();
        let bytes = match encoding.unwrap_or_else(|| Encoding::for_path(path)) {
            Encoding::Pem => self.to_pem()?.into_bytes(),
            Encoding::Der => self.to_der()?,
        };
        std::fs::write(path, bytes)
            .map_err(|e| PkiError::ExportError(format!("{}: {e}", path.display())))
    }
}

impl PkiExport for PublicKey {
    const PEM_LABEL: &'static str = "PUBLIC KEY";

    fn to_der(&self) -> Result<Vec<u8>> {
        PublicKey::to_der(self)
    }
}

impl PkiExport for PrivateKey {
    const PEM_LABEL: &'static str = "PRIVATE KEY";

    fn to_der(&self) -> Result<Vec<u8>> {
        PrivateKey::to_der(self)
    }
}

impl PkiExport for Certificate {
    const PEM_LABEL: &'static str = "CERTIFICATE";

    fn to_der(&self) -> Result<Vec<u8>> {
        Certificate::to_der(self)
    }
}

impl PkiExport for Crl {
    const PEM_LABEL: &'static str = "X509 CRL";

    fn to_der(&self) -> Result<Vec<u8>> {
        Crl::to_der(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::EcCurve;

    #[test]
    fn test_export_picks_encoding_from_extension() {
        let dir = tempfile::tempdir().unwrap();
        let key = PrivateKey::generate_ecdsa(EcCurve::P256).public_key();

        let pem_path = dir.path().join("key.pem");
        let der_path = dir.path().join("key.der");
        key.export(&pem_path, None).unwrap();
        key.export(&der_path, None).unwrap();

        let pem = std::fs::read_to_string(&pem_path).unwrap();
        assert!(pem.starts_with("-----BEGIN PUBLIC KEY-----\n"));
        assert_eq!(std::fs::read(&der_path).unwrap(), key.to_der().unwrap());

        let forced = dir.path().join("forced.pem");
        key.export(&forced, Some(Encoding::Der)).unwrap();
        assert_eq!(std::fs::read(&forced).unwrap(), key.to_der().unwrap());
    }

    #[test]
    fn test_export_to_missing_directory_fails() {
        let key = PrivateKey::generate_ed25519();
        let err = key.export("/nonexistent/dir/key.der", None).unwrap_err();
        assert!(matches!(err, PkiError::ExportError(_)));
    }
}
