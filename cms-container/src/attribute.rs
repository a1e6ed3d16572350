// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{asn1::Asn1Value, CmsError},
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode,
        encode::{PrimitiveContent, Values},
        Mode, Oid,
    },
    std::{
        fmt::{Debug, Formatter},
        io::Write,
    },
};

/// A CMS attribute.
///
/// ```ASN.1
/// Attribute ::= SEQUENCE {
///   attrType OBJECT IDENTIFIER,
///   attrValues SET OF AttributeValue }
/// ```
///
/// The value is the complete encoded `SET OF AttributeValue`. It is carried
/// opaquely and never interpreted.
#[derive(Clone, Eq, PartialEq)]
pub struct CmsAttribute {
    typ: Oid,
    value: Asn1Value,
}

impl Debug for CmsAttribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("CmsAttribute");
        s.field("type", &format_args!("{}", self.typ));
        s.field("value", &self.value);
        s.finish()
    }
}

impl CmsAttribute {
    /// Construct an instance from an already encoded `SET OF AttributeValue`.
    pub fn new(typ: Oid, value: Asn1Value) -> Self {
        Self { typ, value }
    }

    /// Construct an instance whose value set holds the given values.
    pub fn from_values(typ: Oid, values: impl Values) -> Self {
        Self::new(typ, Asn1Value::from_values(encode::set(values)))
    }

    /// Decode an instance from the DER of an `Attribute` sequence.
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
        let typ = Oid::take_from(cons)?;
        let value = cons.capture(|cons| {
            cons.take_set(|cons| cons.skip_all())?;

            Ok(())
        })?;

        Ok(Self {
            typ,
            value: Asn1Value::from(value),
        })
    }

    /// The attribute type.
    pub fn typ(&self) -> &Oid {
        &self.typ
    }

    /// The encoded `SET OF AttributeValue`.
    pub fn value(&self) -> &Asn1Value {
        &self.value
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.typ.encode_ref(), &self.value))
    }

    /// Encode this attribute as a DER `SEQUENCE`.
    pub fn to_der(&self) -> Vec<u8> {
        Asn1Value::from_values(self.encode_ref()).as_slice().to_vec()
    }
}

impl Values for CmsAttribute {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}
