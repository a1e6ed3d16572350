// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! X.509 certificates as consumed by signers.

use {
    crate::{
        algorithm::AlgorithmIdentifier,
        asn1::{
            oid,
            rfc5280::{self, Extension, Name, TbsCertificate, OID_SUBJECT_KEY_IDENTIFIER},
            rfc5652::IssuerAndSerialNumber,
            Asn1Value,
        },
        CmsError,
    },
    bcder::{decode::Constructed, encode::Values, Integer, Mode, OctetString, Oid},
    bytes::Bytes,
    std::{
        fmt::{Debug, Formatter},
        io::Write,
    },
};

/// An X.509 certificate.
///
/// The encoding the certificate was constructed from is retained and is what
/// gets digested and emitted. Equality is defined over that encoding.
#[derive(Clone)]
pub struct Certificate {
    encoded: Asn1Value,
    inner: rfc5280::Certificate,
}

impl Debug for Certificate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("Certificate");
        s.field("serial_number", self.serial_number());
        s.field("issuer", &format_args!("{}", hex::encode(self.issuer_name().as_slice())));
        s.field("subject", &format_args!("{}", hex::encode(self.subject_name().as_slice())));
        s.finish()
    }
}

impl PartialEq for Certificate {
    fn eq(&self, other: &Self) -> bool {
        self.encoded == other.encoded
    }
}

impl Eq for Certificate {}

impl Certificate {
    /// Construct an instance from DER encoded data.
    pub fn from_der(data: impl AsRef<[u8]>) -> Result<Self, CmsError> {
        Self::from_encoded(data.as_ref(), Mode::Der)
    }

    /// Construct an instance from BER encoded data.
    ///
    /// Certificates embedded in parsed containers go through here.
    pub fn from_ber(data: impl AsRef<[u8]>) -> Result<Self, CmsError> {
        Self::from_encoded(data.as_ref(), Mode::Ber)
    }

    /// Construct an instance by parsing PEM encoded ASN.1 data.
    ///
    /// The data is a human readable string likely containing
    /// `--------- BEGIN CERTIFICATE ----------`.
    pub fn from_pem(data: impl AsRef<[u8]>) -> Result<Self, CmsError> {
        let data = pem::parse(data.as_ref()).map_err(CmsError::Pem)?;

        Self::from_der(&data.contents)
    }

    fn from_encoded(data: &[u8], mode: Mode) -> Result<Self, CmsError> {
        let encoded = Asn1Value::decode_single(data, mode)?;
        let inner = Constructed::decode(encoded.as_slice(), mode, rfc5280::Certificate::take_from)?;

        Ok(Self { encoded, inner })
    }

    /// The encoding this instance was constructed from.
    pub fn encoded(&self) -> &[u8] {
        self.encoded.as_slice()
    }

    pub fn tbs_certificate(&self) -> &TbsCertificate {
        &self.inner.tbs_certificate
    }

    pub fn serial_number(&self) -> &Integer {
        &self.inner.tbs_certificate.serial_number
    }

    pub fn issuer_name(&self) -> &Name {
        &self.inner.tbs_certificate.issuer
    }

    pub fn subject_name(&self) -> &Name {
        &self.inner.tbs_certificate.subject
    }

    /// The algorithm identifier of the subject public key.
    pub fn public_key_algorithm(&self) -> &AlgorithmIdentifier {
        &self
            .inner
            .tbs_certificate
            .subject_public_key_info
            .algorithm
    }

    /// The raw public key data.
    pub fn public_key_data(&self) -> Bytes {
        self.inner
            .tbs_certificate
            .subject_public_key_info
            .subject_public_key
            .octet_bytes()
    }

    /// Find an extension by its OID.
    pub fn extension(&self, oid: &Oid) -> Option<&Extension> {
        self.inner
            .tbs_certificate
            .extensions
            .as_ref()
            .and_then(|extensions| extensions.iter().find(|extension| &extension.id == oid))
    }

    /// The subject key identifier extension value.
    ///
    /// Errors if the extension is present but isn't a DER `OCTET STRING`.
    pub fn subject_key_identifier(&self) -> Result<Option<Bytes>, CmsError> {
        if let Some(extension) = self.extension(&oid(OID_SUBJECT_KEY_IDENTIFIER)) {
            let data = extension.value.to_bytes();
            let identifier =
                Constructed::decode(data.as_ref(), Mode::Der, |cons| OctetString::take_from(cons))?;

            Ok(Some(identifier.to_bytes()))
        } else {
            Ok(None)
        }
    }

    /// The `IssuerAndSerialNumber` identifying this certificate.
    pub fn issuer_and_serial_number(&self) -> IssuerAndSerialNumber {
        IssuerAndSerialNumber {
            issuer: self.issuer_name().clone(),
            serial_number: self.serial_number().clone(),
        }
    }
}

impl Values for Certificate {
    fn encoded_len(&self, mode: Mode) -> usize {
        self.encoded.encoded_len(mode)
    }

    fn write_encoded<W: Write>(&self, mode: Mode, target: &mut W) -> Result<(), std::io::Error> {
        self.encoded.write_encoded(mode, target)
    }
}
