// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adobe's revocation information archival signed attribute.
//!
//! PDF signatures embed the revocation evidence for the signing certificate
//! inside the signed attributes using this structure.

use {
    crate::asn1::Asn1Value,
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode,
        encode::{PrimitiveContent, Values},
        ConstOid, OctetString, Oid, Tag,
    },
};

/// Identifies the `adbe-revocationInfoArchival` signed attribute.
///
/// 1.2.840.113583.1.1.8
pub const OID_ADOBE_REVOCATION_INFO_ARCHIVAL: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 47, 1, 1, 8]);

/// Basic OCSP response type.
///
/// `id-pkix-ocsp-basic`, 1.3.6.1.5.5.7.48.1.1
pub const OID_PKIX_OCSP_BASIC: ConstOid = Oid(&[43, 6, 1, 5, 5, 7, 48, 1, 1]);

/// Revocation information archival.
///
/// ```ASN.1
/// RevocationInfoArchival ::= SEQUENCE {
///   crl [0] EXPLICIT SEQUENCE of CRLs OPTIONAL,
///   ocsp [1] EXPLICIT SEQUENCE of OCSPResponse OPTIONAL,
///   otherRevInfo [2] EXPLICIT SEQUENCE of OtherRevInfo OPTIONAL
/// }
/// ```
///
/// `otherRevInfo` is never emitted and is skipped when decoding.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationInfoArchival {
    pub crls: Vec<Asn1Value>,
    pub ocsp_responses: Vec<OcspResponse>,
}

impl RevocationInfoArchival {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let crls = cons
                .take_opt_constructed_if(Tag::CTX_0, |cons| {
                    cons.take_sequence(|cons| {
                        let mut crls = Vec::new();

                        while let Some(crl) = Asn1Value::take_opt_sequence(cons)? {
                            crls.push(crl);
                        }

                        Ok(crls)
                    })
                })?
                .unwrap_or_default();
            let ocsp_responses = cons
                .take_opt_constructed_if(Tag::CTX_1, |cons| {
                    cons.take_sequence(|cons| {
                        let mut responses = Vec::new();

                        while let Some(response) = OcspResponse::take_opt_from(cons)? {
                            responses.push(response);
                        }

                        Ok(responses)
                    })
                })?
                .unwrap_or_default();
            cons.take_opt_constructed_if(Tag::CTX_2, |cons| cons.skip_all())?;

            Ok(Self {
                crls,
                ocsp_responses,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            if self.crls.is_empty() {
                None
            } else {
                Some(encode::Constructed::new(
                    Tag::CTX_0,
                    encode::sequence(&self.crls),
                ))
            },
            if self.ocsp_responses.is_empty() {
                None
            } else {
                Some(encode::Constructed::new(
                    Tag::CTX_1,
                    encode::sequence(
                        self.ocsp_responses
                            .iter()
                            .map(|response| response.encode_ref())
                            .collect::<Vec<_>>(),
                    ),
                ))
            },
        ))
    }
}

/// A successful OCSP response wrapping a basic OCSP response.
///
/// ```ASN.1
/// OCSPResponse ::= SEQUENCE {
///   responseStatus         OCSPResponseStatus,
///   responseBytes          [0] EXPLICIT ResponseBytes OPTIONAL }
///
/// ResponseBytes ::=       SEQUENCE {
///   responseType   OBJECT IDENTIFIER,
///   response       OCTET STRING }
/// ```
///
/// `basic_response` holds the DER of the `BasicOCSPResponse`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OcspResponse {
    pub status: u8,
    pub basic_response: Option<OctetString>,
}

impl OcspResponse {
    /// A `successful` response carrying the given `BasicOCSPResponse`.
    pub fn successful(basic_response: OctetString) -> Self {
        Self {
            status: 0,
            basic_response: Some(basic_response),
        }
    }

    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let status = cons.take_primitive_if(Tag::ENUMERATED, |prim| prim.to_u8())?;
            let basic_response = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
                cons.take_sequence(|cons| {
                    let response_type = Oid::take_from(cons)?;
                    if response_type != OID_PKIX_OCSP_BASIC {
                        return Err(cons.content_err("unsupported OCSP response type"));
                    }

                    OctetString::take_from(cons)
                })
            })?;

            Ok(Self {
                status,
                basic_response,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.status.encode_as(Tag::ENUMERATED),
            self.basic_response.as_ref().map(|response| {
                encode::Constructed::new(
                    Tag::CTX_0,
                    encode::sequence((OID_PKIX_OCSP_BASIC.encode_ref(), response.encode_ref())),
                )
            }),
        ))
    }
}
