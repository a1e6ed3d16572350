// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        asn1::{oid, rfc5652::OID_ID_DATA, Asn1Value},
        CmsError,
    },
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode,
        encode::{PrimitiveContent, Values},
        Mode, OctetString, Oid, Tag,
    },
    bytes::Bytes,
    std::{
        fmt::{Debug, Formatter},
        io::Write,
    },
};

/// Encapsulated content info.
///
/// ```ASN.1
/// EncapsulatedContentInfo ::= SEQUENCE {
///   eContentType ContentType,
///   eContent [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
///
/// Signatures over external data, such as a PDF byte range, leave the
/// content absent.
#[derive(Clone, Eq, PartialEq)]
pub struct EncapsulatedContentInfo {
    content_type: Oid,
    content: Option<OctetString>,
}

impl Debug for EncapsulatedContentInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("EncapsulatedContentInfo");
        s.field("content_type", &format_args!("{}", self.content_type));
        s.field(
            "content",
            &format_args!("{:?}", self.content.as_ref().map(|c| hex::encode(c.to_bytes()))),
        );
        s.finish()
    }
}

impl Default for EncapsulatedContentInfo {
    fn default() -> Self {
        Self {
            content_type: oid(OID_ID_DATA),
            content: None,
        }
    }
}

impl EncapsulatedContentInfo {
    pub fn new(content_type: Oid, content: Option<Bytes>) -> Self {
        Self {
            content_type,
            content: content.map(OctetString::new),
        }
    }

    /// Decode an instance from the DER of an `EncapsulatedContentInfo`.
    pub fn from_der(data: &[u8]) -> Result<Self, CmsError> {
        let value = Asn1Value::from_der(data)?;

        Ok(Constructed::decode(value.as_slice(), Mode::Der, Self::take_from)?)
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let content_type = Oid::take_from(cons)?;
            let content =
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| OctetString::take_from(cons))?;

            Ok(Self {
                content_type,
                content,
            })
        })
    }

    pub fn content_type(&self) -> &Oid {
        &self.content_type
    }

    /// The encapsulated content octets, if the content is attached.
    pub fn content(&self) -> Option<Bytes> {
        self.content.as_ref().map(|content| content.to_bytes())
    }

    pub fn is_detached(&self) -> bool {
        self.content.is_none()
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.content_type.encode_ref(),
            self.content
                .as_ref()
                .map(|content| encode::Constructed::new(Tag::CTX_0, content.encode_ref())),
        ))
    }
}

impl Values for EncapsulatedContentInfo {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detached_id_data() {
        let info = EncapsulatedContentInfo::default();
        let encoded = Asn1Value::from_values(info.encode_ref());

        assert_eq!(hex::encode(encoded.as_slice()), "300b06092a864886f70d010701");
        assert!(info.is_detached());
        assert_eq!(info.content_type().to_string(), "1.2.840.113549.1.7.1");

        let parsed = EncapsulatedContentInfo::from_der(encoded.as_slice()).unwrap();
        assert_eq!(parsed, info);

        let mut trailing = encoded.as_slice().to_vec();
        trailing.push(0);
        assert!(EncapsulatedContentInfo::from_der(&trailing).is_err());
    }

    #[test]
    fn attached_content() {
        let info = EncapsulatedContentInfo::new(
            oid(OID_ID_DATA),
            Some(Bytes::from_static(b"hello")),
        );
        let encoded = Asn1Value::from_values(info.encode_ref());

        assert_eq!(
            hex::encode(encoded.as_slice()),
            "301406092a864886f70d010701a007040568656c6c6f"
        );

        let parsed = EncapsulatedContentInfo::from_der(encoded.as_slice()).unwrap();
        assert_eq!(parsed.content(), Some(Bytes::from_static(b"hello")));
        assert!(!parsed.is_detached());
    }
}
