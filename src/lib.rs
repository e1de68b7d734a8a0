//! # pkitrust - PKI Object Import and Trust Chain Verification
//!
//! pkitrust accepts keys, certificates and CRLs in whatever shape they arrive,
//! PEM or DER, without being told what they are, and decides whether a
//! certificate should be trusted. It is built entirely on RustCrypto crates.
//!
//! ## Supported Key Types
//!
//! - **RSA**: PKCS#8, PKCS#1 and SubjectPublicKeyInfo encodings
//! - **ECDSA**: P-256, P-384 and P-521 in PKCS#8, SEC1 and the OpenSSL
//!   `EC PARAMETERS` + `EC PRIVATE KEY` bundle
//! - **Ed25519**: PKCS#8 and SubjectPublicKeyInfo
//!
//! ## How Input Is Classified
//!
//! The encoding is sniffed from the bytes (a PEM `-----BEGIN` marker anywhere
//! means PEM; multi-block PEM is decoded block by block and concatenated).
//! The structural forms allowed for the requested category are then tried in
//! a fixed priority order, and the first that decodes wins. See
//! [`resolver`] for the orders.
//!
//! ## Quick Start
//!
//! ### Importing Objects
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pkitrust::{cert::Certificate, key::PrivateKey};
//!
//! # fn main() -> Result<(), pkitrust::error::PkiError> {
//! // Paths are read with per-category size limits.
//! let cert = Certificate::import(Path::new("server.pem"))?;
//! println!("{cert}");
//! println!("{}", cert.summary());
//!
//! // Any supported private key form, PEM or DER.
//! let key = PrivateKey::import(Path::new("server.key"))?;
//! assert!(key.verify_certificate_signature(&cert).is_ok());
//! # Ok(())
//! # }
//! ```
//!
//! ### Verifying a Certificate Chain
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pkitrust::{anchors::load_certificate_bundle, cert::Certificate, chain::Chain};
//!
//! # fn main() -> Result<(), pkitrust::error::PkiError> {
//! let leaf = Certificate::import(Path::new("leaf.pem"))?;
//! let anchors = load_certificate_bundle("roots.pem")?;
//! let untrusted = load_certificate_bundle("intermediates.pem")?;
//!
//! let chain = Chain::build(Vec::new(), Some(leaf));
//! match chain.verify(&anchors, &untrusted) {
//!     Some(path) => println!("Trusted:\n{path}"),
//!     None => println!("No trust path"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ### Checking Revocation
//!
//! ```rust,no_run
//! use std::path::Path;
//! use pkitrust::{cert::Certificate, chain::{Chain, VerifyPolicy}, crl::Crl};
//!
//! # fn main() -> Result<(), pkitrust::error::PkiError> {
//! let leaf = Certificate::import(Path::new("leaf.pem"))?;
//! let root = Certificate::import(Path::new("root.pem"))?;
//! let crl = Crl::import(Path::new("root.crl"))?;
//!
//! println!("revoked: {}", leaf.is_revoked_by([&crl]));
//!
//! let policy = VerifyPolicy::builder()
//!     .reference_time("Jan 30 07:38:59 2030 GMT".into())
//!     .crls(vec![crl])
//!     .build();
//! let verified = Chain::build(Vec::new(), Some(leaf)).verify_with(&[root], &[], &policy);
//! println!("trusted: {}", verified.is_some());
//! # Ok(())
//! # }
//! ```
//!
//! ### Issuing Certificates
//!
//! ```rust,no_run
//! use pkitrust::{
//!     cert::{Certificate, params::{CertificationRequestInfo, DistinguishedName, Validity}},
//!     export::PkiExport,
//!     issuer::{CertificateWithPrivateKey, Issuer},
//!     key::{EcCurve, PrivateKey},
//! };
//!
//! # fn main() -> Result<(), pkitrust::error::PkiError> {
//! let ca_key = PrivateKey::generate_ecdsa(EcCurve::P256);
//! let ca_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("Example CA".to_string()).build())
//!     .subject_public_key(ca_key.public_key())
//!     .is_ca(true)
//!     .build();
//! let ca_cert = Certificate::new_self_signed(&ca_info, &ca_key, Validity::for_days(365))?;
//! let ca = CertificateWithPrivateKey { cert: ca_cert, key: ca_key };
//!
//! let server_key = PrivateKey::generate_ed25519();
//! let server_info = CertificationRequestInfo::builder()
//!     .subject(DistinguishedName::builder().common_name("server.example.com".to_string()).build())
//!     .subject_public_key(server_key.public_key())
//!     .build();
//! let server_cert = ca.issue(&server_info, Validity::for_days(90))?;
//! server_cert.export("server.pem", None)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Every fallible operation returns [`error::PkiError`]. A signature that does
//! not match is not an error (`Ok(false)`), and neither is a missing trust
//! path (`None`).
//!
//! ```rust
//! use pkitrust::{error::PkiError, key::PrivateKey};
//!
//! match PrivateKey::import("not a key") {
//!     Ok(_) => println!("Key imported successfully"),
//!     Err(PkiError::ImportError(msg)) => println!("Unable to import: {}", msg),
//!     Err(PkiError::FormatError(msg)) => println!("Bad PEM: {}", msg),
//!     Err(e) => println!("Other error: {}", e),
//! }
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade: rejected
//! resolver candidates and chain-building steps at `debug`, accepted trust
//! paths at `info`, and unparsable reference times at `warn`. Install any
//! logger to see them.
//!
//! ## Module Organization
//!
//! - [`resolver`]: Encoding detection and trial decoding into typed objects
//! - [`key`]: Public and private keys, signing, verification and RSA encryption
//! - [`cert`]: Certificates, their extensions and issuance parameters
//! - [`crl`]: Certificate revocation lists
//! - [`chain`]: Chain construction and verification
//! - [`anchors`]: Loading trust anchors from bundles and directories
//! - [`issuer`]: Certificate and CRL issuing
//! - [`export`]: DER, PEM and file output
//! - [`pem_utils`]: PEM framing helpers
//! - [`error`]: Error types

pub mod anchors;
pub mod cert;
pub mod chain;
pub mod crl;
pub mod error;
pub mod export;
pub mod fields;
pub mod issuer;
pub mod key;
pub mod oid;
pub mod pem_utils;
pub mod resolver;
pub mod signature;
pub mod tbs_certificate;
