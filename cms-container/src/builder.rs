// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Pluggable ASN.1 encoding and digest strategy.

use {
    crate::{algorithm::DigestAlgorithm, CmsError},
    bcder::{Mode, Oid},
    std::{convert::TryFrom, fmt::Debug, sync::Arc},
};

/// Strategy used by containers and signer infos for ASN.1 output and digests.
///
/// Instances are shared between a container and its signer info, so they
/// must be usable from behind an [Arc].
pub trait Asn1Builder: Debug + Send + Sync {
    /// Encoding rules for emitted structures.
    fn mode(&self) -> Mode;

    /// Encoding rules accepted when parsing.
    fn read_mode(&self) -> Mode {
        Mode::Ber
    }

    /// Digest data with the algorithm identified by `algorithm`.
    fn digest(&self, algorithm: &Oid, data: &[u8]) -> Result<Vec<u8>, CmsError>;
}

/// [Asn1Builder] backed by `bcder` and `ring`.
#[derive(Clone, Copy, Debug)]
pub struct BcderAsn1Builder {
    mode: Mode,
}

impl Default for BcderAsn1Builder {
    fn default() -> Self {
        Self::der()
    }
}

impl BcderAsn1Builder {
    /// Emit DER.
    pub fn der() -> Self {
        Self { mode: Mode::Der }
    }

    /// Emit BER.
    pub fn ber() -> Self {
        Self { mode: Mode::Ber }
    }
}

impl Asn1Builder for BcderAsn1Builder {
    fn mode(&self) -> Mode {
        self.mode
    }

    fn digest(&self, algorithm: &Oid, data: &[u8]) -> Result<Vec<u8>, CmsError> {
        Ok(DigestAlgorithm::try_from(algorithm)?.digest(data))
    }
}

pub(crate) fn default_builder() -> Arc<dyn Asn1Builder> {
    Arc::new(BcderAsn1Builder::default())
}
