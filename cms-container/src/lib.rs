// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Incremental construction of CMS `SignedData` for document signatures

This crate builds and parses the
[RFC 5652](https://tools.ietf.org/rfc/rfc5652.txt) `SignedData` structure
as it is embedded in document signatures, such as PDF signature fields.

Computing digests of the document and producing the signature itself are
the caller's job. What this crate handles is the lifecycle of the binary
structure around the signature:

* Signer fields are mutable while the signer assembles them.
* Once the signed attributes are serialized (so they can be digested and
  signed) they are frozen. Every attempt to change them afterwards fails
  with [CmsError::SignedAttributesFrozen].
* The exact size of the final structure can be estimated before the real
  signature exists, using a [SIGNATURE_PLACEHOLDER_LEN] byte placeholder.
  Document formats reserve the space for the signature ahead of time.

A typical signing flow looks like:

1. Create a [CmsContainer], add certificates.
2. Configure its [SignerInfo]: digest algorithm, signing certificate,
   message digest and other signed attributes.
3. Call [CmsContainer::size_estimation] to reserve space in the document.
4. Call [SignerInfo::serialize_signed_attributes] and sign those bytes
   externally.
5. Install the signature with [SignerInfo::set_signature], optionally add a
   time-stamp token as an unsigned attribute.
6. Call [CmsContainer::serialize].

Existing containers can be parsed with [CmsContainer::from_der]. Parsed
containers have frozen signed attributes but still accept unsigned
attributes.

# Technical Notes

Only a single signer per container is supported. Encrypted content types
are not supported.

Parsing accepts BER. Output uses the encoding rules of the configured
[Asn1Builder], DER by default. Values carried opaquely, such as
certificates and attribute values, are emitted exactly as they were
received.
*/

pub mod asn1;
mod algorithm;
mod attribute;
mod builder;
mod certificate;
mod container;
mod content_info;
mod revocation;
mod signer_info;

#[cfg(test)]
mod testutil;

pub use {
    algorithm::{AlgorithmIdentifier, DigestAlgorithm},
    asn1::Asn1Value,
    attribute::CmsAttribute,
    bcder::Oid,
    builder::{Asn1Builder, BcderAsn1Builder},
    bytes::Bytes,
    certificate::Certificate,
    container::CmsContainer,
    content_info::EncapsulatedContentInfo,
    revocation::RevocationInfo,
    signer_info::{SignerInfo, SIGNATURE_PLACEHOLDER_LEN},
};

use {bcder::decode::DecodeError, std::convert::Infallible, thiserror::Error};

/// Malformed wire input.
#[derive(Debug, Error)]
pub enum StructureError {
    #[error("ASN.1 decode error: {0}")]
    Decode(DecodeError<Infallible>),

    #[error("SignedData does not contain any certificates")]
    MissingCertificates,

    #[error("SignedData must describe exactly one signer")]
    TooManySigners,

    #[error("SignedData does not contain a signer info")]
    MissingSignerInfo,

    #[error("unsupported SignerInfo version: {0}")]
    UnsupportedSignerInfoVersion(u8),

    #[error("SignerInfo version does not match its signer identifier")]
    SignerIdentifierMismatch,

    #[error("unexpected content type: {0}")]
    UnexpectedContentType(String),
}

/// Unified error type for this crate.
#[derive(Debug, Error)]
pub enum CmsError {
    #[error("invalid CMS structure: {0}")]
    Structure(#[from] StructureError),

    #[error("signed attributes are frozen and cannot be modified")]
    SignedAttributesFrozen,

    #[error("signing certificate not found in certificate set")]
    CertificateNotFound,

    #[error("unknown digest algorithm: {0}")]
    UnknownDigestAlgorithm(String),

    #[error("signer info does not have a signing certificate")]
    MissingSigningCertificate,

    #[error("signer info does not have a digest algorithm")]
    MissingDigestAlgorithm,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PEM error: {0}")]
    Pem(pem::PemError),
}

impl From<DecodeError<Infallible>> for CmsError {
    fn from(e: DecodeError<Infallible>) -> Self {
        Self::Structure(StructureError::Decode(e))
    }
}
