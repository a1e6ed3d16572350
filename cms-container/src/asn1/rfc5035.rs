// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASN.1 types defined by RFC 5035 (ESS update for `SigningCertificateV2`).

use {
    crate::{algorithm::AlgorithmIdentifier, asn1::rfc5280::Name},
    bcder::{
        decode::{Constructed, DecodeError, Source},
        encode,
        encode::{PrimitiveContent, Values},
        ConstOid, Integer, OctetString, Oid, Tag,
    },
};

/// Identifies the signing certificate v2 signed attribute.
///
/// 1.2.840.113549.1.9.16.2.47
pub const OID_SIGNING_CERTIFICATE_V2: ConstOid =
    Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 16, 2, 47]);

/// Signing certificate v2.
///
/// ```ASN.1
/// SigningCertificateV2 ::=  SEQUENCE {
///   certs        SEQUENCE OF ESSCertIDv2,
///   policies     SEQUENCE OF PolicyInformation OPTIONAL
/// }
/// ```
///
/// Policies are never emitted and are skipped when decoding.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SigningCertificateV2 {
    pub certs: Vec<EssCertIdV2>,
}

impl SigningCertificateV2 {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let certs = cons.take_sequence(|cons| {
                let mut certs = Vec::new();

                while let Some(cert) = EssCertIdV2::take_opt_from(cons)? {
                    certs.push(cert);
                }

                Ok(certs)
            })?;
            cons.skip_all()?;

            Ok(Self { certs })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence(encode::sequence(
            self.certs.iter().map(|cert| cert.encode_ref()).collect::<Vec<_>>(),
        ))
    }
}

/// ESS certificate identifier, version 2.
///
/// ```ASN.1
/// ESSCertIDv2 ::=  SEQUENCE {
///   hashAlgorithm           AlgorithmIdentifier
///                           DEFAULT {algorithm id-sha256},
///   certHash                Hash,
///   issuerSerial            IssuerSerial OPTIONAL
/// }
///
/// Hash ::= OCTET STRING
/// ```
///
/// A `hash_algorithm` of `None` means SHA-256.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EssCertIdV2 {
    pub hash_algorithm: Option<AlgorithmIdentifier>,
    pub cert_hash: OctetString,
    pub issuer_serial: Option<IssuerSerial>,
}

impl EssCertIdV2 {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let hash_algorithm = AlgorithmIdentifier::take_opt_from(cons)?;
            let cert_hash = OctetString::take_from(cons)?;
            let issuer_serial = IssuerSerial::take_opt_from(cons)?;

            Ok(Self {
                hash_algorithm,
                cert_hash,
                issuer_serial,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            self.hash_algorithm.as_ref(),
            self.cert_hash.encode_ref(),
            self.issuer_serial.as_ref().map(|serial| serial.encode_ref()),
        ))
    }
}

/// Issuer serial.
///
/// ```ASN.1
/// IssuerSerial ::= SEQUENCE {
///   issuer                   GeneralNames,
///   serialNumber             CertificateSerialNumber
/// }
///
/// GeneralNames ::= SEQUENCE SIZE (1..MAX) OF GeneralName
/// ```
///
/// Only a single `directoryName` general name is supported.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct IssuerSerial {
    pub issuer: Name,
    pub serial_number: Integer,
}

impl IssuerSerial {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let issuer = cons.take_sequence(|cons| {
                cons.take_constructed_if(Tag::CTX_4, Name::take_from)
            })?;
            let serial_number = Integer::take_from(cons)?;

            Ok(Self {
                issuer,
                serial_number,
            })
        })
    }

    pub fn encode_ref(&self) -> impl Values + '_ {
        encode::sequence((
            encode::sequence(encode::Constructed::new(
                Tag::CTX_4,
                self.issuer.encode_ref(),
            )),
            (&self.serial_number).encode(),
        ))
    }
}
