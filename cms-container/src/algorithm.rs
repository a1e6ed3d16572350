// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Algorithm identifiers and the digest algorithms we know how to compute.

use {
    crate::{asn1::Asn1Value, CmsError},
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode,
        encode::{PrimitiveContent, Values},
        ConstOid, Mode, Oid, Tag,
    },
    bytes::Bytes,
    ring::digest,
    std::{
        convert::TryFrom,
        fmt::{Debug, Formatter},
        io::Write,
    },
};

/// SHA-1 digest algorithm.
///
/// 1.3.14.3.2.26
pub const OID_SHA1: ConstOid = Oid(&[43, 14, 3, 2, 26]);

/// SHA-256 digest algorithm.
///
/// 2.16.840.1.101.3.4.2.1
pub const OID_SHA256: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 1]);

/// SHA-384 digest algorithm.
///
/// 2.16.840.1.101.3.4.2.2
pub const OID_SHA384: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 2]);

/// SHA-512 digest algorithm.
///
/// 2.16.840.1.101.3.4.2.3
pub const OID_SHA512: ConstOid = Oid(&[96, 134, 72, 1, 101, 3, 4, 2, 3]);

/// An algorithm OID with optional parameters.
///
/// ```ASN.1
/// AlgorithmIdentifier  ::=  SEQUENCE  {
///      algorithm               OBJECT IDENTIFIER,
///      parameters              ANY DEFINED BY algorithm OPTIONAL  }
/// ```
///
/// Parameters are opaque. An absent parameter is omitted on output; an
/// explicit `NULL` parameter is a distinct value and is preserved.
#[derive(Clone, Eq, PartialEq)]
pub struct AlgorithmIdentifier {
    algorithm: Oid,
    parameters: Option<Asn1Value>,
}

impl Debug for AlgorithmIdentifier {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("AlgorithmIdentifier");
        s.field("algorithm", &format_args!("{}", self.algorithm));
        s.field("parameters", &self.parameters);
        s.finish()
    }
}

impl AlgorithmIdentifier {
    /// Construct an instance without parameters.
    pub fn new(algorithm: Oid) -> Self {
        Self {
            algorithm,
            parameters: None,
        }
    }

    /// Construct an instance with already encoded parameters.
    pub fn with_parameters(algorithm: Oid, parameters: Asn1Value) -> Self {
        Self {
            algorithm,
            parameters: Some(parameters),
        }
    }

    /// Construct an instance with an explicit `NULL` parameter.
    pub fn with_null_parameters(algorithm: Oid) -> Self {
        Self::with_parameters(algorithm, Asn1Value::from_values(().encode_as(Tag::NULL)))
    }

    /// Decode an instance from the DER of an `AlgorithmIdentifier` sequence.
    pub fn from_der(data: &[u8]) -> Result<Self, CmsError> {
        let value = Asn1Value::from_der(data)?;

        Ok(Constructed::decode(value.as_slice(), Mode::Der, Self::take_from)?)
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| Self::take_sequence(cons))
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| Self::take_sequence(cons))
    }

    fn take_sequence<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        let algorithm = Oid::take_from(cons)?;
        let parameters = cons.capture_all()?;

        let parameters = if parameters.is_empty() {
            None
        } else {
            Some(Asn1Value::from(parameters))
        };

        Ok(Self {
            algorithm,
            parameters,
        })
    }

    /// The algorithm OID.
    pub fn oid(&self) -> &Oid {
        &self.algorithm
    }

    /// The algorithm OID in dotted decimal form.
    pub fn algorithm_oid(&self) -> String {
        self.algorithm.to_string()
    }

    /// The encoded parameters, if present.
    pub fn parameters(&self) -> Option<&Asn1Value> {
        self.parameters.as_ref()
    }

    pub fn has_null_parameters(&self) -> bool {
        matches!(&self.parameters, Some(value) if value.as_slice() == [5, 0])
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.algorithm.encode_ref(), self.parameters.as_ref()))
    }

    /// Encode this instance as a DER `SEQUENCE`.
    pub fn to_der(&self) -> Vec<u8> {
        Asn1Value::from_values(self.encode_ref()).as_slice().to_vec()
    }
}

impl Values for AlgorithmIdentifier {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// A hashing algorithm used for digesting data.
///
/// Instances can be converted to and from [Oid] via `From`/`TryFrom`
/// implementations and into a [digest::Context] capable of computing digests.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum DigestAlgorithm {
    /// SHA-1.
    ///
    /// Corresponds to OID 1.3.14.3.2.26.
    Sha1,
    /// SHA-256.
    ///
    /// Corresponds to OID 2.16.840.1.101.3.4.2.1.
    Sha256,
    /// SHA-384.
    ///
    /// Corresponds to OID 2.16.840.1.101.3.4.2.2.
    Sha384,
    /// SHA-512.
    ///
    /// Corresponds to OID 2.16.840.1.101.3.4.2.3.
    Sha512,
}

impl DigestAlgorithm {
    /// Digest data in one shot.
    pub fn digest(&self, data: &[u8]) -> Vec<u8> {
        let mut context = digest::Context::from(*self);
        context.update(data);

        context.finish().as_ref().to_vec()
    }
}

impl From<DigestAlgorithm> for Oid {
    fn from(alg: DigestAlgorithm) -> Self {
        Oid(Bytes::copy_from_slice(match alg {
            DigestAlgorithm::Sha1 => OID_SHA1.as_ref(),
            DigestAlgorithm::Sha256 => OID_SHA256.as_ref(),
            DigestAlgorithm::Sha384 => OID_SHA384.as_ref(),
            DigestAlgorithm::Sha512 => OID_SHA512.as_ref(),
        }))
    }
}

impl TryFrom<&Oid> for DigestAlgorithm {
    type Error = CmsError;

    fn try_from(v: &Oid) -> Result<Self, Self::Error> {
        if v == &OID_SHA1 {
            Ok(Self::Sha1)
        } else if v == &OID_SHA256 {
            Ok(Self::Sha256)
        } else if v == &OID_SHA384 {
            Ok(Self::Sha384)
        } else if v == &OID_SHA512 {
            Ok(Self::Sha512)
        } else {
            Err(CmsError::UnknownDigestAlgorithm(v.to_string()))
        }
    }
}

impl TryFrom<&AlgorithmIdentifier> for DigestAlgorithm {
    type Error = CmsError;

    fn try_from(v: &AlgorithmIdentifier) -> Result<Self, Self::Error> {
        Self::try_from(v.oid())
    }
}

impl From<DigestAlgorithm> for AlgorithmIdentifier {
    fn from(alg: DigestAlgorithm) -> Self {
        Self::new(alg.into())
    }
}

impl From<DigestAlgorithm> for digest::Context {
    fn from(alg: DigestAlgorithm) -> Self {
        digest::Context::new(match alg {
            DigestAlgorithm::Sha1 => &digest::SHA1_FOR_LEGACY_USE_ONLY,
            DigestAlgorithm::Sha256 => &digest::SHA256,
            DigestAlgorithm::Sha384 => &digest::SHA384,
            DigestAlgorithm::Sha512 => &digest::SHA512,
        })
    }
}
