// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! ASN.1 data structures defined by RFC 5652.

The types defined in this module are intended to be extremely low-level
and only to be used for (de)serialization. See types outside the
`asn1` module tree for higher-level functionality.
*/

use {
    crate::{
        algorithm::AlgorithmIdentifier,
        asn1::{rfc5280::Name, Asn1Value},
        attribute::CmsAttribute,
        content_info::EncapsulatedContentInfo,
    },
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode,
        encode::{PrimitiveContent, Values},
        ConstOid, Integer, Mode, OctetString, Oid, Tag,
    },
    bytes::Bytes,
    std::io::Write,
};

/// The data content type.
///
/// `id-data` in RFC 5652.
///
/// 1.2.840.113549.1.7.1
pub const OID_ID_DATA: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 1]);

/// The signed-data content type.
///
/// 1.2.840.113549.1.7.2
pub const OID_ID_SIGNED_DATA: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 2]);

/// Identifies the content-type attribute.
///
/// 1.2.840.113549.1.9.3
pub const OID_CONTENT_TYPE: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 3]);

/// Identifies the message-digest attribute.
///
/// 1.2.840.113549.1.9.4
pub const OID_MESSAGE_DIGEST: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 4]);

/// Identifies the time-stamp token unsigned attribute.
///
/// 1.2.840.113549.1.9.16.2.14
pub const OID_TIME_STAMP_TOKEN: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 14]);

/// OCSP responses carried as an "other" revocation info format (RFC 5940).
///
/// 1.3.6.1.5.5.7.16.2
pub const OID_RI_OCSP_RESPONSE: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 16, 2]);

/// Content info.
///
/// ```ASN.1
/// ContentInfo ::= SEQUENCE {
///   contentType ContentType,
///   content [0] EXPLICIT ANY DEFINED BY contentType }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ContentInfo {
    pub content_type: Oid,
    pub content: Asn1Value,
}

impl ContentInfo {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let content_type = Oid::take_from(cons)?;
            let content = cons.take_constructed_if(Tag::CTX_0, Asn1Value::take_from)?;

            Ok(Self {
                content_type,
                content,
            })
        })
    }
}

/// Represents signed data.
///
/// ASN.1 type specification:
///
/// ```ASN.1
/// SignedData ::= SEQUENCE {
///   version CMSVersion,
///   digestAlgorithms DigestAlgorithmIdentifiers,
///   encapContentInfo EncapsulatedContentInfo,
///   certificates [0] IMPLICIT CertificateSet OPTIONAL,
///   crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///   signerInfos SignerInfos }
///
/// DigestAlgorithmIdentifiers ::= SET OF DigestAlgorithmIdentifier
/// SignerInfos ::= SET OF SignerInfo
/// ```
///
/// Certificates are retained in their encoded form. Only the plain
/// `Certificate` choice of `CertificateChoices` is accepted.
#[derive(Clone, Debug)]
pub struct SignedData {
    pub version: CmsVersion,
    pub digest_algorithms: Vec<AlgorithmIdentifier>,
    pub content_info: EncapsulatedContentInfo,
    pub certificates: Option<Vec<Asn1Value>>,
    pub crls: Option<Vec<RevocationInfoChoice>>,
    pub signer_infos: Vec<SignerInfo>,
}

impl SignedData {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = CmsVersion::take_from(cons)?;
            let digest_algorithms = cons.take_set(|cons| {
                let mut algorithms = Vec::new();

                while let Some(algorithm) = AlgorithmIdentifier::take_opt_from(cons)? {
                    algorithms.push(algorithm);
                }

                Ok(algorithms)
            })?;
            let content_info = EncapsulatedContentInfo::take_from(cons)?;
            let certificates = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                let mut certificates = Vec::new();

                while let Some(certificate) = Asn1Value::take_opt_sequence(cons)? {
                    certificates.push(certificate);
                }

                Ok(certificates)
            })?;
            let crls = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
                let mut choices = Vec::new();

                while let Some(choice) = RevocationInfoChoice::take_opt_from(cons)? {
                    choices.push(choice);
                }

                Ok(choices)
            })?;
            let signer_infos = cons.take_set(|cons| {
                let mut signer_infos = Vec::new();

                while let Some(signer_info) = SignerInfo::take_opt_from(cons)? {
                    signer_infos.push(signer_info);
                }

                Ok(signer_infos)
            })?;

            Ok(Self {
                version,
                digest_algorithms,
                content_info,
                certificates,
                crls,
                signer_infos,
            })
        })
    }
}

/// Revocation info choice.
///
/// ```ASN.1
/// RevocationInfoChoice ::= CHOICE {
///   crl CertificateList,
///   other [1] IMPLICIT OtherRevocationInfoFormat }
///
/// OtherRevocationInfoFormat ::= SEQUENCE {
///   otherRevInfoFormat OBJECT IDENTIFIER,
///   otherRevInfo ANY DEFINED BY otherRevInfoFormat }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RevocationInfoChoice {
    Crl(Asn1Value),
    Other { format: Oid, info: Asn1Value },
}

impl RevocationInfoChoice {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        if let Some(crl) = Asn1Value::take_opt_sequence(cons)? {
            Ok(Some(Self::Crl(crl)))
        } else {
            cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
                let format = Oid::take_from(cons)?;
                let info = Asn1Value::take_from(cons)?;

                Ok(Self::Other { format, info })
            })
        }
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        match self {
            Self::Crl(crl) => (Some(crl), None),
            Self::Other { format, info } => (
                None,
                Some(encode::Constructed::new(
                    Tag::CTX_1,
                    (format.encode_ref(), info),
                )),
            ),
        }
    }
}

impl Values for RevocationInfoChoice {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encode_ref().encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encode_ref().write_encoded(mode, target)
    }
}

/// Per-signer information.
///
/// ```ASN.1
/// SignerInfo ::= SEQUENCE {
///   version CMSVersion,
///   sid SignerIdentifier,
///   digestAlgorithm DigestAlgorithmIdentifier,
///   signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///   signatureAlgorithm SignatureAlgorithmIdentifier,
///   signature SignatureValue,
///   unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
/// ```
///
/// Signed attributes are held as the content octets of the `[0]` element.
/// Those octets are what the signature covers once re-tagged as a `SET`.
#[derive(Clone, Debug)]
pub struct SignerInfo {
    pub version: CmsVersion,
    pub sid: SignerIdentifier,
    pub digest_algorithm: AlgorithmIdentifier,
    pub signed_attributes: Option<Bytes>,
    pub signature_algorithm: AlgorithmIdentifier,
    pub signature: OctetString,
    pub unsigned_attributes: Option<Vec<CmsAttribute>>,
}

impl SignerInfo {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| Self::from_sequence(cons))
    }

    fn from_sequence<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        let version = CmsVersion::take_from(cons)?;
        let sid = SignerIdentifier::take_from(cons)?;
        let digest_algorithm = AlgorithmIdentifier::take_from(cons)?;
        let signed_attributes = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
            let captured = cons.capture_all()?;

            Ok(Bytes::copy_from_slice(captured.as_slice()))
        })?;
        let signature_algorithm = AlgorithmIdentifier::take_from(cons)?;
        let signature = OctetString::take_from(cons)?;
        let unsigned_attributes = cons.take_opt_constructed_if(Tag::CTX_1, |cons| {
            let mut attributes = Vec::new();

            while let Some(attribute) = CmsAttribute::take_opt_from(cons)? {
                attributes.push(attribute);
            }

            Ok(attributes)
        })?;

        Ok(Self {
            version,
            sid,
            digest_algorithm,
            signed_attributes,
            signature_algorithm,
            signature,
            unsigned_attributes,
        })
    }
}

/// Identifies the signer.
///
/// ```ASN.1
/// SignerIdentifier ::= CHOICE {
///   issuerAndSerialNumber IssuerAndSerialNumber,
///   subjectKeyIdentifier [0] SubjectKeyIdentifier }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum SignerIdentifier {
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    SubjectKeyIdentifier(Bytes),
}

impl SignerIdentifier {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        if let Some(identifier) =
            cons.take_opt_primitive_if(Tag::CTX_0, |prim| prim.take_all())?
        {
            Ok(Self::SubjectKeyIdentifier(identifier))
        } else {
            Ok(Self::IssuerAndSerialNumber(
                IssuerAndSerialNumber::take_from(cons)?,
            ))
        }
    }
}

/// Issuer and serial number.
///
/// ```ASN.1
/// IssuerAndSerialNumber ::= SEQUENCE {
///   issuer Name,
///   serialNumber CertificateSerialNumber }
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssuerAndSerialNumber {
    pub issuer: Name,
    pub serial_number: Integer,
}

impl IssuerAndSerialNumber {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let issuer = Name::take_from(cons)?;
            let serial_number = Integer::take_from(cons)?;

            Ok(Self {
                issuer,
                serial_number,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((self.issuer.encode_ref(), (&self.serial_number).encode()))
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmsVersion {
    V0 = 0,
    V1 = 1,
    V2 = 2,
    V3 = 3,
    V4 = 4,
    V5 = 5,
}

impl CmsVersion {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        match cons.take_primitive_if(Tag::INTEGER, Integer::i8_from_primitive)? {
            0 => Ok(Self::V0),
            1 => Ok(Self::V1),
            2 => Ok(Self::V2),
            3 => Ok(Self::V3),
            4 => Ok(Self::V4),
            5 => Ok(Self::V5),
            _ => Err(cons.content_err("unexpected CMSVersion")),
        }
    }

    pub fn encode(self) -> impl Values {
        u8::from(self).encode()
    }
}

impl From<CmsVersion> for u8 {
    fn from(v: CmsVersion) -> u8 {
        match v {
            CmsVersion::V0 => 0,
            CmsVersion::V1 => 1,
            CmsVersion::V2 => 2,
            CmsVersion::V3 => 3,
            CmsVersion::V4 => 4,
            CmsVersion::V5 => 5,
        }
    }
}
