// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use {
    crate::{
        asn1::{
            adobe::{OcspResponse, RevocationInfoArchival, OID_ADOBE_REVOCATION_INFO_ARCHIVAL},
            oid, Asn1Value,
        },
        attribute::CmsAttribute,
        CmsError,
    },
    bcder::{decode::Constructed, Mode, OctetString},
    bytes::Bytes,
};

/// Revocation evidence carried in the signed attributes.
///
/// CRLs are DER encoded `CertificateList` values. OCSP responses are DER
/// encoded `BasicOCSPResponse` values.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RevocationInfo {
    crls: Vec<Bytes>,
    ocsp_responses: Vec<Bytes>,
}

impl RevocationInfo {
    pub fn new(crls: Vec<Bytes>, ocsp_responses: Vec<Bytes>) -> Self {
        Self {
            crls,
            ocsp_responses,
        }
    }

    pub fn crls(&self) -> &[Bytes] {
        &self.crls
    }

    pub fn ocsp_responses(&self) -> &[Bytes] {
        &self.ocsp_responses
    }

    pub fn is_empty(&self) -> bool {
        self.crls.is_empty() && self.ocsp_responses.is_empty()
    }

    pub fn with_crls(self, crls: Vec<Bytes>) -> Self {
        Self { crls, ..self }
    }

    pub fn with_ocsp_responses(self, ocsp_responses: Vec<Bytes>) -> Self {
        Self {
            ocsp_responses,
            ..self
        }
    }

    /// Build the `adbe-revocationInfoArchival` attribute for this evidence.
    ///
    /// Returns `None` when there is no evidence. Errors if a CRL isn't a
    /// single DER value.
    pub fn archival_attribute(&self) -> Result<Option<CmsAttribute>, CmsError> {
        if self.is_empty() {
            return Ok(None);
        }

        let archival = RevocationInfoArchival {
            crls: self
                .crls
                .iter()
                .map(|crl| Asn1Value::from_der(crl))
                .collect::<Result<Vec<_>, _>>()?,
            ocsp_responses: self
                .ocsp_responses
                .iter()
                .map(|response| OcspResponse::successful(OctetString::new(response.clone())))
                .collect(),
        };

        Ok(Some(CmsAttribute::from_values(
            oid(OID_ADOBE_REVOCATION_INFO_ARCHIVAL),
            archival.encode_ref(),
        )))
    }

    /// Recover evidence from an `adbe-revocationInfoArchival` attribute.
    pub fn from_archival_attribute(attribute: &CmsAttribute) -> Result<Self, CmsError> {
        let archival = Constructed::decode(attribute.value().as_slice(), Mode::Ber, |cons| {
            cons.take_set(RevocationInfoArchival::take_from)
        })?;

        Ok(Self {
            crls: archival.crls.iter().map(|crl| crl.to_bytes()).collect(),
            ocsp_responses: archival
                .ocsp_responses
                .iter()
                .filter_map(|response| response.basic_response.as_ref())
                .map(|response| response.to_bytes())
                .collect(),
        })
    }
}
