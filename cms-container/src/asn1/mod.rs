// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Holds Rust struct definitions for various ASN.1 primitives.

Modules are named after the RFC defining the types they hold. The `adobe`
module holds the vendor-defined revocation archival attribute.
*/

pub mod adobe;
pub mod rfc5035;
pub mod rfc5280;
pub mod rfc5652;

use {
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode::Values,
        Captured, ConstOid, Mode, Oid,
    },
    bytes::Bytes,
    std::{
        convert::Infallible,
        fmt::{Debug, Formatter},
        io::Write,
    },
};

/// Obtain an owned [Oid] from a constant.
pub(crate) fn oid(value: ConstOid) -> Oid {
    Oid(Bytes::copy_from_slice(value.as_ref()))
}

/// An opaque, already encoded ASN.1 value.
///
/// Holds the complete tag, length and content octets of a single value.
/// The bytes are written verbatim when encoding, regardless of the requested
/// encoding mode, so values parsed from BER input keep their exact form.
#[derive(Clone, Eq, Hash, PartialEq)]
pub struct Asn1Value(Bytes);

impl Asn1Value {
    /// Construct an instance by DER encoding ASN.1 values.
    pub fn from_values(values: impl Values) -> Self {
        Self::from(Captured::from_values(Mode::Der, values))
    }

    /// Construct an instance from the raw encoding of a single value.
    ///
    /// The data must contain exactly one DER encoded value.
    pub fn from_der(data: &[u8]) -> Result<Self, DecodeError<Infallible>> {
        Self::decode_single(data, Mode::Der)
    }

    /// Capture the single value `data` consists of.
    ///
    /// Errors if anything follows the value.
    pub(crate) fn decode_single(data: &[u8], mode: Mode) -> Result<Self, DecodeError<Infallible>> {
        Constructed::decode(data, mode, |cons| {
            let captured = cons.capture_one()?;

            if captured.as_slice().len() != data.len() {
                return Err(cons.content_err("trailing data after value"));
            }

            Ok(captured)
        })
        .map(Self::from)
    }

    /// Wrap bytes already known to hold exactly one encoded value.
    pub(crate) fn from_encoded(data: Bytes) -> Self {
        Self(data)
    }

    /// Capture the next value, whatever it is.
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.capture_one().map(Self::from)
    }

    /// Capture the next value if it is a SEQUENCE.
    pub fn take_opt_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        let captured = cons.capture(|cons| {
            cons.take_opt_sequence(|cons| cons.skip_all())?;

            Ok(())
        })?;

        if captured.is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self::from(captured)))
        }
    }

    /// The raw encoded bytes of this value.
    pub fn as_slice(&self) -> &[u8] {
        self.0.as_ref()
    }

    pub fn to_bytes(&self) -> Bytes {
        self.0.clone()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Captured> for Asn1Value {
    fn from(captured: Captured) -> Self {
        Self(Bytes::copy_from_slice(captured.as_slice()))
    }
}

impl AsRef<[u8]> for Asn1Value {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Debug for Asn1Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&hex::encode(&self.0))
    }
}

impl Values for Asn1Value {
    fn encoded_len(&self, _: Mode) -> usize {
        self.0.len()
    }

    fn write_encoded<W: Write>(&self, _: Mode, target: &mut W) -> Result<(), std::io::Error> {
        target.write_all(&self.0)
    }
}
