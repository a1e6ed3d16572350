// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The top-level `SignedData` container.

use {
    crate::{
        algorithm::AlgorithmIdentifier,
        asn1::{
            rfc5652::{
                CmsVersion, ContentInfo, RevocationInfoChoice, SignedData, OID_ID_DATA,
                OID_ID_SIGNED_DATA, OID_RI_OCSP_RESPONSE,
            },
            oid, Asn1Value,
        },
        builder::{default_builder, Asn1Builder},
        certificate::Certificate,
        content_info::EncapsulatedContentInfo,
        signer_info::SignerInfo,
        CmsError, StructureError,
    },
    bcder::{
        decode::Constructed,
        encode::{self, PrimitiveContent, Values},
        Tag,
    },
    bytes::Bytes,
    log::{debug, warn},
    std::sync::Arc,
};

/// A CMS `SignedData` wrapped in a `ContentInfo`, with a single signer.
///
/// Certificates are kept in insertion order without duplicates. The
/// certificate referenced by the signer info must be among them for the
/// result to be parseable again.
#[derive(Clone, Debug)]
pub struct CmsContainer {
    builder: Arc<dyn Asn1Builder>,
    certificates: Vec<Certificate>,
    encapsulated_content_info: EncapsulatedContentInfo,
    signer_info: SignerInfo,
    revocation_info: Vec<RevocationInfoChoice>,
}

impl Default for CmsContainer {
    fn default() -> Self {
        Self::new(default_builder())
    }
}

impl CmsContainer {
    /// Construct an empty container using the given ASN.1 strategy.
    pub fn new(builder: Arc<dyn Asn1Builder>) -> Self {
        Self {
            signer_info: SignerInfo::new(builder.clone()),
            builder,
            certificates: vec![],
            encapsulated_content_info: EncapsulatedContentInfo::default(),
            revocation_info: vec![],
        }
    }

    /// Parse a BER encoded `ContentInfo` holding `SignedData`.
    pub fn from_der(data: &[u8]) -> Result<Self, CmsError> {
        Self::from_der_with_builder(default_builder(), data)
    }

    /// Parse a `ContentInfo` holding `SignedData` using the given strategy.
    ///
    /// The signed attributes of the resulting signer info are frozen.
    pub fn from_der_with_builder(
        builder: Arc<dyn Asn1Builder>,
        data: &[u8],
    ) -> Result<Self, CmsError> {
        let mode = builder.read_mode();

        let data = Asn1Value::decode_single(data, mode)?;
        let content_info = Constructed::decode(data.as_slice(), mode, ContentInfo::take_from)?;
        if content_info.content_type != OID_ID_SIGNED_DATA {
            return Err(
                StructureError::UnexpectedContentType(content_info.content_type.to_string()).into(),
            );
        }

        let signed_data =
            Constructed::decode(content_info.content.as_slice(), mode, SignedData::take_from)?;

        if signed_data.digest_algorithms.len() > 1 {
            return Err(StructureError::TooManySigners.into());
        }

        let certificates = signed_data
            .certificates
            .filter(|certificates| !certificates.is_empty())
            .ok_or(StructureError::MissingCertificates)?
            .iter()
            .map(|certificate| Certificate::from_ber(certificate.as_slice()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut signer_infos = signed_data.signer_infos.into_iter();
        let raw_signer_info = match (signer_infos.next(), signer_infos.next()) {
            (Some(signer_info), None) => signer_info,
            (None, _) => return Err(StructureError::MissingSignerInfo.into()),
            (Some(_), Some(_)) => return Err(StructureError::TooManySigners.into()),
        };
        let signer_info = SignerInfo::from_asn1(builder.clone(), raw_signer_info, &certificates)?;

        let revocation_info = signed_data
            .crls
            .unwrap_or_default()
            .into_iter()
            .filter(|choice| match choice {
                RevocationInfoChoice::Crl(_) => true,
                RevocationInfoChoice::Other { format, .. } if format == &OID_RI_OCSP_RESPONSE => {
                    true
                }
                RevocationInfoChoice::Other { format, .. } => {
                    warn!("skipping revocation info of unknown format {}", format);
                    false
                }
            })
            .collect::<Vec<_>>();

        debug!(
            "parsed SignedData: {} certificates, {} revocation entries, content type {}",
            certificates.len(),
            revocation_info.len(),
            signed_data.content_info.content_type()
        );

        Ok(Self {
            builder,
            certificates,
            encapsulated_content_info: signed_data.content_info,
            signer_info,
            revocation_info,
        })
    }

    /// Add a certificate to the `certificates` set.
    ///
    /// A certificate already present is not added again.
    pub fn add_certificate(&mut self, certificate: Certificate) {
        if !self.certificates.contains(&certificate) {
            self.certificates.push(certificate);
        }
    }

    pub fn add_certificates(&mut self, certificates: impl IntoIterator<Item = Certificate>) {
        for certificate in certificates {
            self.add_certificate(certificate);
        }
    }

    pub fn certificates(&self) -> &[Certificate] {
        &self.certificates
    }

    pub fn signer_info(&self) -> &SignerInfo {
        &self.signer_info
    }

    pub fn signer_info_mut(&mut self) -> &mut SignerInfo {
        &mut self.signer_info
    }

    pub fn set_signer_info(&mut self, signer_info: SignerInfo) {
        self.signer_info = signer_info;
    }

    pub fn encapsulated_content_info(&self) -> &EncapsulatedContentInfo {
        &self.encapsulated_content_info
    }

    pub fn set_encapsulated_content_info(&mut self, info: EncapsulatedContentInfo) {
        self.encapsulated_content_info = info;
    }

    /// The certificate of the signer.
    pub fn signing_certificate(&self) -> Option<&Certificate> {
        self.signer_info.signing_certificate()
    }

    /// The digest algorithm of the signer.
    pub fn digest_algorithm(&self) -> Option<&AlgorithmIdentifier> {
        self.signer_info.digest_algorithm()
    }

    /// CRLs in the `crls` field of `SignedData`.
    pub fn crls(&self) -> Vec<Bytes> {
        self.revocation_info
            .iter()
            .filter_map(|choice| match choice {
                RevocationInfoChoice::Crl(crl) => Some(crl.to_bytes()),
                RevocationInfoChoice::Other { .. } => None,
            })
            .collect()
    }

    /// OCSP responses in the `crls` field of `SignedData` (RFC 5940).
    pub fn ocsp_responses(&self) -> Vec<Bytes> {
        self.revocation_info
            .iter()
            .filter_map(|choice| match choice {
                RevocationInfoChoice::Other { format, info } if format == &OID_RI_OCSP_RESPONSE => {
                    Some(info.to_bytes())
                }
                _ => None,
            })
            .collect()
    }

    /// Add a DER encoded `CertificateList`.
    pub fn add_crl(&mut self, crl: &[u8]) -> Result<(), CmsError> {
        self.revocation_info
            .push(RevocationInfoChoice::Crl(Asn1Value::from_der(crl)?));

        Ok(())
    }

    /// Add a DER encoded `OCSPResponse`.
    pub fn add_ocsp_response(&mut self, response: &[u8]) -> Result<(), CmsError> {
        self.revocation_info.push(RevocationInfoChoice::Other {
            format: oid(OID_RI_OCSP_RESPONSE),
            info: Asn1Value::from_der(response)?,
        });

        Ok(())
    }

    /// The `SignedData` version implied by the current content.
    pub fn version(&self) -> CmsVersion {
        if self
            .revocation_info
            .iter()
            .any(|choice| matches!(choice, RevocationInfoChoice::Other { .. }))
        {
            CmsVersion::V5
        } else if self.encapsulated_content_info.content_type() != &OID_ID_DATA {
            CmsVersion::V3
        } else {
            CmsVersion::V1
        }
    }

    fn encode_ref<'a>(&'a self, signer_info: impl Values + 'a) -> impl Values + 'a {
        let certificates = if self.certificates.is_empty() {
            None
        } else {
            Some(encode::set_as(Tag::CTX_0, &self.certificates))
        };

        let crls = if self.revocation_info.is_empty() {
            None
        } else {
            Some(encode::set_as(Tag::CTX_1, &self.revocation_info))
        };

        encode::sequence((
            Asn1Value::from_values(OID_ID_SIGNED_DATA.encode_ref()),
            encode::Constructed::new(
                Tag::CTX_0,
                encode::sequence((
                    self.version().encode(),
                    encode::set(self.signer_info.digest_algorithm()),
                    &self.encapsulated_content_info,
                    certificates,
                    crls,
                    encode::set(signer_info),
                )),
            ),
        ))
    }

    /// The size of the serialized container.
    ///
    /// Computed with a placeholder signature if none is set. Never fails and
    /// never changes state.
    pub fn size_estimation(&self) -> usize {
        let size = self
            .encode_ref(self.signer_info.encode_ref(true))
            .encoded_len(self.builder.mode());

        debug!("estimated SignedData size: {} bytes", size);

        size
    }

    /// Serialize to a `ContentInfo` holding the `SignedData`.
    pub fn serialize(&self) -> Result<Vec<u8>, CmsError> {
        if self.certificates.is_empty() {
            return Err(StructureError::MissingCertificates.into());
        }
        self.signer_info.check_complete()?;

        let mut der = Vec::new();
        self.encode_ref(self.signer_info.encode_ref(false))
            .write_encoded(self.builder.mode(), &mut der)?;

        Ok(der)
    }
}
