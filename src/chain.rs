//! Greedy trust-chain construction and anchor-based verification.
//!
//! A chain runs from its first element (an anchor, or a self-signed root
//! found in the pool) down to the certificate issued last. Construction is a
//! repeated linear scan of the pool that appends the first certificate the
//! current tail issued. There is no backtracking: when several chains are
//! possible, pool order decides which one is built.

use std::fmt;
use std::path::Path;

use bon::Builder;

use crate::anchors::{load_anchors_from_dir, load_certificate_bundle};
use crate::cert::Certificate;
use crate::crl::Crl;
use crate::error::Result;
use crate::fields::ReferenceTime;

/// Options for [`Chain::verify_with`].
#[derive(Debug, Clone, Default, Builder)]
pub struct VerifyPolicy<'a> {
    /// Instant expiry is evaluated against.
    #[builder(default)]
    pub reference_time: ReferenceTime<'a>,
    /// CRLs to check each member against. A CRL is only consulted when a
    /// member of the candidate chain issued it.
    #[builder(default)]
    pub crls: Vec<Crl>,
}

/// An ordered issuance chain, optionally terminated by a CRL.
#[derive(Debug, Clone, Default)]
pub struct Chain {
    certificates: Vec<Certificate>,
    crl: Option<Crl>,
}

impl Chain {
    /// Build a chain from `pool`, seeded with `start` or, when absent, with
    /// the first self-signed certificate in the pool.
    ///
    /// The seed is never appended again, and neither is any certificate
    /// already in the chain. The result is empty when no seed exists.
    pub fn build(pool: Vec<Certificate>, start: Option<Certificate>) -> Self {
        let mut pool = pool;
        let seed = match start {
            Some(start) => Some(start),
            None => pool
                .iter()
                .position(Certificate::is_self_signed)
                .map(|index| pool.remove(index)),
        };

        let Some(seed) = seed else {
            log::debug!("No starting point for chain construction");
            return Chain::default();
        };
        pool.retain(|candidate| candidate != &seed);

        let mut certificates = vec![seed];
        while !pool.is_empty() {
            let Some(tail) = certificates.last() else {
                break;
            };
            let Some(index) = pool.iter().position(|candidate| tail.is_issuer_of(candidate)) else {
                break;
            };
            let next = pool.remove(index);
            log::debug!("Chain: {} issued {}", tail.subject().text, next.subject().text);
            pool.retain(|candidate| candidate != &next);
            certificates.push(next);
        }

        Chain {
            certificates,
            crl: None,
        }
    }

    /// Terminate the chain with `crl` if the current tail issued it.
    /// Returns whether the CRL was attached.
    pub fn attach_crl(&mut self, crl: Crl) -> bool {
        match self.certificates.last() {
            Some(tail) if tail.is_issuer_of(&crl) => {
                self.crl = Some(crl);
                true
            }
            _ => false,
        }
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn crl(&self) -> Option<&Crl> {
        self.crl.as_ref()
    }

    pub fn len(&self) -> usize {
        self.certificates.len() + usize::from(self.crl.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn first(&self) -> Option<&Certificate> {
        self.certificates.first()
    }

    pub fn last(&self) -> Option<&Certificate> {
        self.certificates.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Certificate> {
        self.certificates.iter()
    }

    /// Find a trust path for this chain's certificates, checking expiry
    /// against the current time.
    pub fn verify(&self, anchors: &[Certificate], untrusted: &[Certificate]) -> Option<Chain> {
        self.verify_with(anchors, untrusted, &VerifyPolicy::default())
    }

    /// Try each anchor in turn and return the first chain that is longer than
    /// the anchor alone, contains at least one of this chain's own
    /// certificates past the anchor, and has no expired or revoked member.
    pub fn verify_with(
        &self,
        anchors: &[Certificate],
        untrusted: &[Certificate],
        policy: &VerifyPolicy<'_>,
    ) -> Option<Chain> {
        let reference = policy.reference_time.resolve();
        let pool: Vec<Certificate> = self
            .certificates
            .iter()
            .chain(untrusted)
            .cloned()
            .collect();

        for anchor in anchors {
            let candidate = Chain::build(pool.clone(), Some(anchor.clone()));
            if candidate.certificates.len() < 2 {
                log::debug!("Anchor {} yields no path", anchor.subject().text);
                continue;
            }
            if !candidate.certificates[1..]
                .iter()
                .any(|c| self.certificates.contains(c))
            {
                log::debug!(
                    "Path from {} uses only untrusted certificates",
                    anchor.subject().text
                );
                continue;
            }
            if let Some(expired) = candidate
                .iter()
                .find(|c| c.remaining_days(reference) < 0.0)
            {
                log::debug!("Path from {} has expired member {expired}", anchor.subject().text);
                continue;
            }
            if !policy.crls.is_empty() {
                let trusted_crls: Vec<&Crl> = policy
                    .crls
                    .iter()
                    .filter(|crl| candidate.iter().any(|c| c.is_issuer_of(*crl)))
                    .collect();
                if let Some(revoked) = candidate
                    .iter()
                    .find(|c| c.is_revoked_by(trusted_crls.iter().copied()))
                {
                    log::debug!("Path from {} has revoked member {revoked}", anchor.subject().text);
                    continue;
                }
            }
            log::info!("Trust path found from anchor {}", anchor.subject().text);
            return Some(candidate);
        }
        None
    }

    /// Like [`Chain::verify`], with anchors (and optionally untrusted
    /// certificates) read from PEM bundle files.
    pub fn verify_from_ca_file(
        &self,
        ca_file: impl AsRef<Path>,
        untrusted_file: Option<&Path>,
    ) -> Result<Option<Chain>> {
        let anchors = load_certificate_bundle(ca_file)?;
        let untrusted = load_untrusted(untrusted_file)?;
        Ok(self.verify(&anchors, &untrusted))
    }

    /// Like [`Chain::verify`], with one anchor per file in `ca_path`.
    pub fn verify_from_ca_path(
        &self,
        ca_path: impl AsRef<Path>,
        untrusted_file: Option<&Path>,
    ) -> Result<Option<Chain>> {
        let anchors = load_anchors_from_dir(ca_path)?;
        let untrusted = load_untrusted(untrusted_file)?;
        Ok(self.verify(&anchors, &untrusted))
    }
}

fn load_untrusted(path: Option<&Path>) -> Result<Vec<Certificate>> {
    path.map(load_certificate_bundle)
        .transpose()
        .map(Option::unwrap_or_default)
}

impl From<Vec<Certificate>> for Chain {
    /// Builds a chain from the given certificates, as [`Chain::build`] without a start.
    fn from(pool: Vec<Certificate>) -> Self {
        Chain::build(pool, None)
    }
}

impl<'a> IntoIterator for &'a Chain {
    type Item = &'a Certificate;
    type IntoIter = std::slice::Iter<'a, Certificate>;

    fn into_iter(self) -> Self::IntoIter {
        self.certificates.iter()
    }
}

impl fmt::Display for Chain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(first) = self.certificates.first() else {
            return Ok(());
        };
        let marker = if first.is_self_signed() {
            "Self Signed"
        } else {
            "Not Self Signed"
        };
        write!(f, "__ {} [{marker}]", first.subject().text)?;

        let rest = self.certificates[1..]
            .iter()
            .map(|c| c.subject().text.as_str())
            .chain(self.crl.iter().map(|crl| crl.issuer().text.as_str()));
        for (depth, name) in rest.enumerate() {
            write!(f, "\n{}_ {name}", " ".repeat((depth + 1) * 2))?;
        }
        Ok(())
    }
}
