// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-signer record and its signed attribute lifecycle.

use {
    crate::{
        algorithm::{AlgorithmIdentifier, OID_SHA256},
        asn1::{
            adobe::OID_ADOBE_REVOCATION_INFO_ARCHIVAL,
            oid,
            rfc5035::{EssCertIdV2, IssuerSerial, SigningCertificateV2, OID_SIGNING_CERTIFICATE_V2},
            rfc5652::{
                self, CmsVersion, SignerIdentifier, OID_CONTENT_TYPE, OID_MESSAGE_DIGEST,
                OID_TIME_STAMP_TOKEN,
            },
            Asn1Value,
        },
        attribute::CmsAttribute,
        builder::{default_builder, Asn1Builder},
        certificate::Certificate,
        revocation::RevocationInfo,
        CmsError, StructureError,
    },
    bcder::{
        decode::Constructed,
        encode,
        encode::{PrimitiveContent, Values},
        OctetString, Oid, Tag,
    },
    bytes::Bytes,
    log::{debug, warn},
    std::sync::Arc,
};

/// Size in bytes of the zeroed signature emitted when no signature is set.
///
/// Size estimates are computed with a placeholder of this size, so a real
/// signature of this size or smaller fits in the reserved space.
pub const SIGNATURE_PLACEHOLDER_LEN: usize = 1024;

/// DER `SET OF` ordering: encodings sorted as octet strings.
fn der_sorted(attributes: &[CmsAttribute]) -> Vec<Asn1Value> {
    let mut encoded = attributes
        .iter()
        .map(|attribute| Asn1Value::from_values(attribute.encode_ref()))
        .collect::<Vec<_>>();
    encoded.sort_by(|a, b| a.as_slice().cmp(b.as_slice()));

    encoded
}

#[derive(Clone, Debug)]
enum SignedAttributes {
    Building(Vec<CmsAttribute>),
    /// Attributes have been serialized for signing.
    ///
    /// `encoded` is the exact `SET` the signature covers. `content` holds its
    /// content octets, which are re-tagged `[0]` inside the signer info.
    Frozen {
        attributes: Vec<CmsAttribute>,
        encoded: Asn1Value,
        content: Asn1Value,
    },
}

impl SignedAttributes {
    fn attributes(&self) -> &[CmsAttribute] {
        match self {
            Self::Building(attributes) => attributes,
            Self::Frozen { attributes, .. } => attributes,
        }
    }
}

/// Information about the signer of a `SignedData`.
///
/// Signed attributes can be modified until they are serialized for signing,
/// either through [Self::serialize_signed_attributes] or by installing
/// already encoded attributes with [Self::set_serialized_signed_attributes].
/// After that, every operation changing signed attributes fails with
/// [CmsError::SignedAttributesFrozen].
///
/// Algorithms, the signing certificate, the signature and unsigned
/// attributes can be changed at any time.
#[derive(Clone, Debug)]
pub struct SignerInfo {
    builder: Arc<dyn Asn1Builder>,
    signing_certificate: Option<Certificate>,
    digest_algorithm: Option<AlgorithmIdentifier>,
    signature_algorithm: Option<AlgorithmIdentifier>,
    signed_attributes: SignedAttributes,
    signature: Option<Bytes>,
    unsigned_attributes: Vec<CmsAttribute>,
    revocation: RevocationInfo,
}

impl Default for SignerInfo {
    fn default() -> Self {
        Self::new(default_builder())
    }
}

impl SignerInfo {
    /// Construct an empty instance using the given ASN.1 strategy.
    pub fn new(builder: Arc<dyn Asn1Builder>) -> Self {
        Self {
            builder,
            signing_certificate: None,
            digest_algorithm: None,
            signature_algorithm: None,
            signed_attributes: SignedAttributes::Building(vec![]),
            signature: None,
            unsigned_attributes: vec![],
            revocation: RevocationInfo::default(),
        }
    }

    /// Parse a `SignerInfo` sequence.
    ///
    /// The signing certificate is resolved against `certificates`.
    pub fn from_der(
        builder: Arc<dyn Asn1Builder>,
        data: &[u8],
        certificates: &[Certificate],
    ) -> Result<Self, CmsError> {
        let mode = builder.read_mode();
        let data = Asn1Value::decode_single(data, mode)?;
        let raw = Constructed::decode(data.as_slice(), mode, rfc5652::SignerInfo::take_from)?;

        Self::from_asn1(builder, raw, certificates)
    }

    pub(crate) fn from_asn1(
        builder: Arc<dyn Asn1Builder>,
        raw: rfc5652::SignerInfo,
        certificates: &[Certificate],
    ) -> Result<Self, CmsError> {
        let signing_certificate = match (raw.version, &raw.sid) {
            (CmsVersion::V1, SignerIdentifier::IssuerAndSerialNumber(sid)) => {
                certificates.iter().find(|cert| {
                    cert.serial_number() == &sid.serial_number && cert.issuer_name() == &sid.issuer
                })
            }
            (CmsVersion::V3, SignerIdentifier::SubjectKeyIdentifier(identifier)) => {
                certificates.iter().find(|cert| {
                    matches!(cert.subject_key_identifier(), Ok(Some(ski)) if &ski == identifier)
                })
            }
            (CmsVersion::V1, _) | (CmsVersion::V3, _) => {
                return Err(StructureError::SignerIdentifierMismatch.into());
            }
            (version, _) => {
                return Err(StructureError::UnsupportedSignerInfoVersion(u8::from(version)).into());
            }
        }
        .cloned()
        .ok_or(CmsError::CertificateNotFound)?;

        let mut signer_info = Self::new(builder);
        signer_info.signing_certificate = Some(signing_certificate);
        signer_info.digest_algorithm = Some(raw.digest_algorithm);
        signer_info.signature_algorithm = Some(raw.signature_algorithm);
        signer_info.signature = Some(raw.signature.to_bytes());
        signer_info.unsigned_attributes = raw.unsigned_attributes.unwrap_or_default();

        if let Some(content) = raw.signed_attributes {
            let encoded = Asn1Value::from_values(encode::set(Asn1Value::from_encoded(content)));
            signer_info.install_serialized_signed_attributes(encoded)?;

            let archival = oid(OID_ADOBE_REVOCATION_INFO_ARCHIVAL);
            if let Some(attribute) = signer_info.signed_attribute(&archival) {
                match RevocationInfo::from_archival_attribute(attribute) {
                    Ok(revocation) => signer_info.revocation = revocation,
                    Err(e) => warn!("ignoring malformed revocation info archival: {}", e),
                }
            }
        }

        Ok(signer_info)
    }

    pub fn signing_certificate(&self) -> Option<&Certificate> {
        self.signing_certificate.as_ref()
    }

    /// Set the certificate of the signer.
    ///
    /// If no signature algorithm is set, it is derived from the algorithm of
    /// the certificate's public key, parameters included. An already set
    /// signature algorithm is never replaced.
    pub fn set_signing_certificate(&mut self, certificate: Certificate) {
        if self.signature_algorithm.is_none() {
            self.signature_algorithm = Some(certificate.public_key_algorithm().clone());
        }

        self.signing_certificate = Some(certificate);
    }

    pub fn digest_algorithm(&self) -> Option<&AlgorithmIdentifier> {
        self.digest_algorithm.as_ref()
    }

    pub fn set_digest_algorithm(&mut self, algorithm: AlgorithmIdentifier) {
        self.digest_algorithm = Some(algorithm);
    }

    pub fn signature_algorithm(&self) -> Option<&AlgorithmIdentifier> {
        self.signature_algorithm.as_ref()
    }

    /// Set the signature algorithm, replacing any previous value.
    pub fn set_signature_algorithm(&mut self, algorithm: AlgorithmIdentifier) {
        self.signature_algorithm = Some(algorithm);
    }

    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    pub fn set_signature(&mut self, signature: impl Into<Bytes>) {
        self.signature = Some(signature.into());
    }

    pub fn signed_attributes(&self) -> &[CmsAttribute] {
        self.signed_attributes.attributes()
    }

    /// Find a signed attribute by its type.
    pub fn signed_attribute(&self, typ: &Oid) -> Option<&CmsAttribute> {
        self.signed_attributes()
            .iter()
            .find(|attribute| attribute.typ() == typ)
    }

    pub fn unsigned_attributes(&self) -> &[CmsAttribute] {
        &self.unsigned_attributes
    }

    /// Find an unsigned attribute by its type.
    pub fn unsigned_attribute(&self, typ: &Oid) -> Option<&CmsAttribute> {
        self.unsigned_attributes
            .iter()
            .find(|attribute| attribute.typ() == typ)
    }

    pub fn ocsp_responses(&self) -> &[Bytes] {
        self.revocation.ocsp_responses()
    }

    pub fn crl_responses(&self) -> &[Bytes] {
        self.revocation.crls()
    }

    /// Whether signed attributes can no longer be modified.
    pub fn is_frozen(&self) -> bool {
        matches!(self.signed_attributes, SignedAttributes::Frozen { .. })
    }

    fn building_attributes(&mut self) -> Result<&mut Vec<CmsAttribute>, CmsError> {
        match &mut self.signed_attributes {
            SignedAttributes::Building(attributes) => Ok(attributes),
            SignedAttributes::Frozen { .. } => Err(CmsError::SignedAttributesFrozen),
        }
    }

    fn replace_signed_attribute(&mut self, attribute: CmsAttribute) -> Result<(), CmsError> {
        let attributes = self.building_attributes()?;
        attributes.retain(|existing| existing.typ() != attribute.typ());
        attributes.push(attribute);

        Ok(())
    }

    /// Add a signed attribute.
    ///
    /// Adding an attribute equal to one already present does nothing.
    pub fn add_signed_attribute(&mut self, attribute: CmsAttribute) -> Result<(), CmsError> {
        let attributes = self.building_attributes()?;

        if !attributes.contains(&attribute) {
            attributes.push(attribute);
        }

        Ok(())
    }

    /// Set the `content-type` signed attribute.
    pub fn set_content_type(&mut self, content_type: &Oid) -> Result<(), CmsError> {
        self.replace_signed_attribute(CmsAttribute::from_values(
            oid(OID_CONTENT_TYPE),
            content_type.encode_ref(),
        ))
    }

    /// Set the `message-digest` signed attribute.
    pub fn set_message_digest(&mut self, digest: &[u8]) -> Result<(), CmsError> {
        self.replace_signed_attribute(CmsAttribute::from_values(
            oid(OID_MESSAGE_DIGEST),
            digest.encode(),
        ))
    }

    /// Replace the OCSP responses archived in the signed attributes.
    ///
    /// Each entry is a DER encoded `BasicOCSPResponse`.
    pub fn set_ocsp_responses(&mut self, responses: Vec<Bytes>) -> Result<(), CmsError> {
        let revocation = self.revocation.clone().with_ocsp_responses(responses);

        self.set_revocation(revocation)
    }

    /// Replace the CRLs archived in the signed attributes.
    ///
    /// Each entry is a DER encoded `CertificateList`.
    pub fn set_crl_responses(&mut self, crls: Vec<Bytes>) -> Result<(), CmsError> {
        let revocation = self.revocation.clone().with_crls(crls);

        self.set_revocation(revocation)
    }

    fn set_revocation(&mut self, revocation: RevocationInfo) -> Result<(), CmsError> {
        // Nothing may change if the attributes are frozen or the evidence is malformed.
        self.building_attributes()?;
        let attribute = revocation.archival_attribute()?;

        let archival = oid(OID_ADOBE_REVOCATION_INFO_ARCHIVAL);
        let attributes = self.building_attributes()?;
        attributes.retain(|existing| existing.typ() != &archival);
        attributes.extend(attribute);

        self.revocation = revocation;

        Ok(())
    }

    /// Add an ESS `signing-certificate-v2` signed attribute for a certificate.
    ///
    /// The certificate is digested with `digest_algorithm`. Any previous
    /// `signing-certificate-v2` attribute is replaced.
    pub fn add_signer_certificate_to_signed_attributes(
        &mut self,
        certificate: &Certificate,
        digest_algorithm: &Oid,
    ) -> Result<(), CmsError> {
        self.building_attributes()?;

        let cert_hash = self.builder.digest(digest_algorithm, certificate.encoded())?;

        let cert_id = EssCertIdV2 {
            // SHA-256 is the DEFAULT and must be omitted under DER.
            hash_algorithm: if digest_algorithm == &OID_SHA256 {
                None
            } else {
                Some(AlgorithmIdentifier::new(digest_algorithm.clone()))
            },
            cert_hash: OctetString::new(Bytes::from(cert_hash)),
            issuer_serial: Some(IssuerSerial {
                issuer: certificate.issuer_name().clone(),
                serial_number: certificate.serial_number().clone(),
            }),
        };
        let signing_certificate = SigningCertificateV2 {
            certs: vec![cert_id],
        };

        self.replace_signed_attribute(CmsAttribute::from_values(
            oid(OID_SIGNING_CERTIFICATE_V2),
            signing_certificate.encode_ref(),
        ))
    }

    /// Set the signing certificate and reference it from the signed attributes.
    pub fn set_signing_certificate_and_add_to_signed_attributes(
        &mut self,
        certificate: Certificate,
        digest_algorithm: &Oid,
    ) -> Result<(), CmsError> {
        self.add_signer_certificate_to_signed_attributes(&certificate, digest_algorithm)?;
        self.set_signing_certificate(certificate);

        Ok(())
    }

    /// Add an unsigned attribute.
    ///
    /// Adding an attribute equal to one already present does nothing.
    pub fn add_unsigned_attribute(&mut self, attribute: CmsAttribute) {
        if !self.unsigned_attributes.contains(&attribute) {
            self.unsigned_attributes.push(attribute);
        }
    }

    /// Attach an RFC 3161 time-stamp token as an unsigned attribute.
    ///
    /// `token` is the DER encoded `TimeStampToken` (a `ContentInfo`).
    pub fn add_time_stamp_token(&mut self, token: &[u8]) -> Result<(), CmsError> {
        let token = Asn1Value::from_der(token)?;

        self.add_unsigned_attribute(CmsAttribute::from_values(
            oid(OID_TIME_STAMP_TOKEN),
            token,
        ));

        Ok(())
    }

    /// Serialize the signed attributes and freeze them.
    ///
    /// Returns the DER encoded `SET OF Attribute` the signature must cover.
    /// Once frozen, the same bytes are returned on every call.
    pub fn serialize_signed_attributes(&mut self) -> Vec<u8> {
        let attributes = match &mut self.signed_attributes {
            SignedAttributes::Frozen { encoded, .. } => return encoded.as_slice().to_vec(),
            SignedAttributes::Building(attributes) => std::mem::take(attributes),
        };

        let sorted = der_sorted(&attributes);
        let encoded = Asn1Value::from_values(encode::set(&sorted));
        let content = Asn1Value::from_values(&sorted);

        debug!(
            "freezing {} signed attributes ({} bytes)",
            attributes.len(),
            encoded.len()
        );

        let der = encoded.as_slice().to_vec();
        self.signed_attributes = SignedAttributes::Frozen {
            attributes,
            encoded,
            content,
        };

        der
    }

    /// Install already serialized signed attributes and freeze them.
    ///
    /// `data` is a single encoded `SET OF Attribute`. It is kept verbatim and
    /// is what gets emitted from then on.
    pub fn set_serialized_signed_attributes(&mut self, data: &[u8]) -> Result<(), CmsError> {
        let encoded = Asn1Value::decode_single(data, self.builder.read_mode())?;

        self.install_serialized_signed_attributes(encoded)
    }

    fn install_serialized_signed_attributes(&mut self, encoded: Asn1Value) -> Result<(), CmsError> {
        if self.is_frozen() {
            return Err(CmsError::SignedAttributesFrozen);
        }

        let mut attributes = Vec::new();
        let content = Constructed::decode(encoded.as_slice(), self.builder.read_mode(), |cons| {
            cons.take_set(|cons| {
                cons.capture(|cons| {
                    while let Some(attribute) = CmsAttribute::take_opt_from(cons)? {
                        attributes.push(attribute);
                    }

                    Ok(())
                })
            })
        })?;

        debug!(
            "installing {} serialized signed attributes ({} bytes)",
            attributes.len(),
            encoded.len()
        );

        self.signed_attributes = SignedAttributes::Frozen {
            attributes,
            encoded,
            content: Asn1Value::from(content),
        };

        Ok(())
    }

    /// The frozen signed attributes, if they have been serialized.
    pub fn serialized_signed_attributes(&self) -> Option<&[u8]> {
        match &self.signed_attributes {
            SignedAttributes::Frozen { encoded, .. } => Some(encoded.as_slice()),
            SignedAttributes::Building(_) => None,
        }
    }

    fn signed_attributes_element(&self, estimation: bool) -> Option<Asn1Value> {
        match &self.signed_attributes {
            SignedAttributes::Frozen { content, .. } if !estimation => Some(
                Asn1Value::from_values(encode::Constructed::new(Tag::CTX_0, content)),
            ),
            SignedAttributes::Building(attributes) if attributes.is_empty() => None,
            state => Some(Asn1Value::from_values(encode::set_as(
                Tag::CTX_0,
                der_sorted(state.attributes()),
            ))),
        }
    }

    /// Ensure everything a final encoding requires is present.
    pub(crate) fn check_complete(&self) -> Result<(), CmsError> {
        if self.signing_certificate.is_none() {
            Err(CmsError::MissingSigningCertificate)
        } else if self.digest_algorithm.is_none() {
            Err(CmsError::MissingDigestAlgorithm)
        } else {
            Ok(())
        }
    }

    /// The `SignerInfo` sequence.
    ///
    /// With `estimation`, signed attributes are always encoded from the
    /// current list and missing fields are omitted rather than reported.
    pub(crate) fn encode_ref(&self, estimation: bool) -> impl Values + '_ {
        let sid = self
            .signing_certificate
            .as_ref()
            .map(|cert| Asn1Value::from_values(cert.issuer_and_serial_number().encode_ref()));

        let signature = match &self.signature {
            Some(signature) => Asn1Value::from_values((&signature[..]).encode()),
            None => {
                Asn1Value::from_values((&[0u8; SIGNATURE_PLACEHOLDER_LEN][..]).encode())
            }
        };

        let unsigned_attributes = if self.unsigned_attributes.is_empty() {
            None
        } else {
            Some(encode::set_as(
                Tag::CTX_1,
                der_sorted(&self.unsigned_attributes),
            ))
        };

        encode::sequence((
            CmsVersion::V1.encode(),
            sid,
            self.digest_algorithm.as_ref(),
            self.signed_attributes_element(estimation),
            self.signature_algorithm.as_ref(),
            signature,
            unsigned_attributes,
        ))
    }

    /// Encode this signer info as a `SignerInfo` sequence.
    ///
    /// A final encoding requires a signing certificate and a digest
    /// algorithm. An estimation run never fails.
    pub fn as_der_sequence(&self, estimation: bool) -> Result<Vec<u8>, CmsError> {
        if !estimation {
            self.check_complete()?;
        }

        let mut der = Vec::new();
        self.encode_ref(estimation)
            .write_encoded(self.builder.mode(), &mut der)?;

        Ok(der)
    }

    /// The size of the encoded signer info, with a placeholder signature if
    /// none is set.
    pub fn estimated_size(&self) -> usize {
        self.encode_ref(true).encoded_len(self.builder.mode())
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{
            algorithm::{DigestAlgorithm, OID_SHA512},
            builder::BcderAsn1Builder,
            testutil::*,
        },
        bcder::Mode,
    };

    fn sha256() -> Oid {
        DigestAlgorithm::Sha256.into()
    }

    fn building_signer_info() -> SignerInfo {
        let mut signer_info = SignerInfo::default();
        signer_info.set_digest_algorithm(DigestAlgorithm::Sha256.into());
        signer_info.set_signing_certificate(rsa_cert());
        signer_info.set_content_type(&oid(rfc5652::OID_ID_DATA)).unwrap();
        signer_info.set_message_digest(&[0x42; 32]).unwrap();

        signer_info
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle)
    }

    #[test]
    fn frozen_rejects_signed_attribute_mutation() {
        let mut signer_info = building_signer_info();
        signer_info.serialize_signed_attributes();
        assert!(signer_info.is_frozen());

        let cert = rsa_cert();
        let attribute = CmsAttribute::from_values(oid(OID_CONTENT_TYPE), sha256().encode_ref());

        assert!(matches!(
            signer_info.add_signed_attribute(attribute),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_message_digest(&[0; 32]),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_content_type(&sha256()),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_ocsp_responses(vec![Bytes::from_static(&[0x30, 0x00])]),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_crl_responses(vec![Bytes::from_static(&[0x30, 0x00])]),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.add_signer_certificate_to_signed_attributes(&cert, &sha256()),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_serialized_signed_attributes(&[0x31, 0x00]),
            Err(CmsError::SignedAttributesFrozen)
        ));

        assert!(signer_info.ocsp_responses().is_empty());
        assert!(signer_info.crl_responses().is_empty());
        assert_eq!(signer_info.signed_attributes().len(), 2);
    }

    #[test]
    fn frozen_allows_other_mutation() {
        let mut signer_info = building_signer_info();
        signer_info.serialize_signed_attributes();

        signer_info.set_digest_algorithm(DigestAlgorithm::Sha512.into());
        signer_info.set_signature_algorithm(ed25519_key_algorithm());
        signer_info.set_signing_certificate(rsa_cert());
        signer_info.set_signature(vec![1, 2, 3]);
        signer_info.add_unsigned_attribute(CmsAttribute::from_values(
            oid(OID_CONTENT_TYPE),
            sha256().encode_ref(),
        ));
        signer_info
            .add_time_stamp_token(&[0x30, 0x03, 0x02, 0x01, 0x01])
            .unwrap();

        assert_eq!(signer_info.signature(), Some(&[1u8, 2, 3][..]));
        assert_eq!(signer_info.unsigned_attributes().len(), 2);
        assert!(signer_info
            .unsigned_attribute(&oid(OID_TIME_STAMP_TOKEN))
            .is_some());
        assert_eq!(
            signer_info.signature_algorithm(),
            Some(&ed25519_key_algorithm())
        );
    }

    #[test]
    fn unsigned_attributes_der_ordered() {
        let content_type =
            CmsAttribute::from_values(oid(OID_CONTENT_TYPE), sha256().encode_ref());
        let token = [0x30, 0x03, 0x02, 0x01, 0x01];

        let mut signer_info = building_signer_info();
        signer_info.add_unsigned_attribute(content_type.clone());
        signer_info.add_time_stamp_token(&token).unwrap();

        // Insertion order is kept for the in-memory list.
        assert_eq!(signer_info.unsigned_attributes()[0], content_type);

        let time_stamp = signer_info
            .unsigned_attribute(&oid(OID_TIME_STAMP_TOKEN))
            .unwrap()
            .to_der();
        let content_type = content_type.to_der();
        assert!(time_stamp < content_type);

        let sequence = signer_info.as_der_sequence(false).unwrap();
        let mut expected = time_stamp;
        expected.extend_from_slice(&content_type);
        assert!(contains(&sequence, &expected));
    }

    #[test]
    fn time_stamp_token_must_be_single_value() {
        let mut signer_info = SignerInfo::default();

        assert!(signer_info
            .add_time_stamp_token(&[0x30, 0x03, 0x02, 0x01, 0x01, 0x00])
            .is_err());
        assert!(signer_info.unsigned_attributes().is_empty());
    }

    #[test]
    fn serialize_signed_attributes_idempotent() {
        let mut signer_info = building_signer_info();
        assert!(signer_info.serialized_signed_attributes().is_none());

        let first = signer_info.serialize_signed_attributes();
        let second = signer_info.serialize_signed_attributes();

        assert_eq!(first, second);
        assert_eq!(first[0], 0x31);
        assert_eq!(signer_info.serialized_signed_attributes(), Some(first.as_slice()));
    }

    #[test]
    fn signed_attributes_der_ordered() {
        let mut signer_info = SignerInfo::default();
        // message-digest (…9.4) is added first but sorts after content-type (…9.3).
        signer_info.set_message_digest(&[1; 32]).unwrap();
        signer_info.set_content_type(&oid(rfc5652::OID_ID_DATA)).unwrap();

        let der = signer_info.serialize_signed_attributes();
        let attributes = Constructed::decode(der.as_slice(), Mode::Der, |cons| {
            cons.take_set(|cons| {
                let mut attributes = Vec::new();
                while let Some(attribute) = CmsAttribute::take_opt_from(cons)? {
                    attributes.push(attribute);
                }
                Ok(attributes)
            })
        })
        .unwrap();

        assert_eq!(attributes.len(), 2);
        assert_eq!(attributes[0].typ(), &OID_CONTENT_TYPE);
        assert_eq!(attributes[1].typ(), &OID_MESSAGE_DIGEST);
        // Insertion order is kept for the in-memory list.
        assert_eq!(signer_info.signed_attributes()[0].typ(), &OID_MESSAGE_DIGEST);
    }

    #[test]
    fn frozen_bytes_reproduced() {
        let mut signer_info = building_signer_info();
        let frozen = signer_info.serialize_signed_attributes();

        let sequence = signer_info.as_der_sequence(false).unwrap();
        let mut tagged = frozen.clone();
        tagged[0] = 0xa0;

        assert!(contains(&sequence, &tagged));
    }

    #[test]
    fn installed_bytes_kept_verbatim() {
        // Not in DER order: message-digest before content-type.
        let message_digest = CmsAttribute::from_values(
            oid(OID_MESSAGE_DIGEST),
            (&[7u8; 32][..]).encode(),
        );
        let content_type = CmsAttribute::from_values(
            oid(OID_CONTENT_TYPE),
            oid(rfc5652::OID_ID_DATA).encode_ref(),
        );
        let installed =
            Asn1Value::from_values(encode::set((&message_digest, &content_type)));

        let mut signer_info = building_signer_info();
        signer_info
            .set_serialized_signed_attributes(installed.as_slice())
            .unwrap();

        assert!(signer_info.is_frozen());
        assert_eq!(
            signer_info.signed_attributes(),
            &[message_digest, content_type.clone()][..]
        );
        assert_eq!(
            signer_info.serialize_signed_attributes(),
            installed.as_slice().to_vec()
        );

        let sequence = signer_info.as_der_sequence(false).unwrap();
        assert!(contains(&sequence, &installed.as_slice()[2..]));

        // Estimation encodes the list afresh, which only reorders.
        assert_eq!(signer_info.estimated_size(), sequence.len());

        assert!(matches!(
            signer_info.add_signed_attribute(content_type),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_ocsp_responses(vec![Bytes::from_static(&[0x30, 0x00])]),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_crl_responses(vec![Bytes::from_static(&[0x30, 0x00])]),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.add_signer_certificate_to_signed_attributes(&rsa_cert(), &sha256()),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert!(matches!(
            signer_info.set_serialized_signed_attributes(installed.as_slice()),
            Err(CmsError::SignedAttributesFrozen)
        ));
        assert_eq!(
            signer_info.serialized_signed_attributes(),
            Some(installed.as_slice())
        );
    }

    #[test]
    fn installed_bytes_must_be_single_set() {
        let content_type = CmsAttribute::from_values(
            oid(OID_CONTENT_TYPE),
            oid(rfc5652::OID_ID_DATA).encode_ref(),
        );
        let installed = Asn1Value::from_values(encode::set(&content_type));

        let mut trailing = installed.as_slice().to_vec();
        trailing.extend_from_slice(&[0x05, 0x00]);

        let mut signer_info = SignerInfo::default();
        assert!(matches!(
            signer_info.set_serialized_signed_attributes(&trailing),
            Err(CmsError::Structure(_))
        ));
        assert!(matches!(
            signer_info.set_serialized_signed_attributes(content_type.to_der().as_slice()),
            Err(CmsError::Structure(_))
        ));
        assert!(!signer_info.is_frozen());

        signer_info
            .set_serialized_signed_attributes(installed.as_slice())
            .unwrap();
        assert_eq!(signer_info.signed_attributes(), &[content_type][..]);
    }

    #[test]
    fn estimation_on_empty_signer_info() {
        let signer_info = SignerInfo::default();

        let size = signer_info.estimated_size();
        assert!(size > SIGNATURE_PLACEHOLDER_LEN);
        assert_eq!(signer_info.as_der_sequence(true).unwrap().len(), size);
        assert!(!signer_info.is_frozen());

        assert!(matches!(
            signer_info.as_der_sequence(false),
            Err(CmsError::MissingSigningCertificate)
        ));

        let mut signer_info = signer_info;
        signer_info.set_signing_certificate(rsa_cert());
        assert!(matches!(
            signer_info.as_der_sequence(false),
            Err(CmsError::MissingDigestAlgorithm)
        ));
    }

    #[test]
    fn estimation_does_not_freeze() {
        let signer_info = building_signer_info();

        let estimate = signer_info.estimated_size();
        assert!(!signer_info.is_frozen());

        let mut signer_info = signer_info;
        signer_info.serialize_signed_attributes();
        signer_info.set_signature(vec![0xff; SIGNATURE_PLACEHOLDER_LEN]);

        assert_eq!(signer_info.estimated_size(), estimate);
        assert_eq!(signer_info.as_der_sequence(false).unwrap().len(), estimate);
    }

    #[test]
    fn signature_algorithm_derived_from_certificate() {
        for key_algorithm in [
            rsa_key_algorithm(),
            ec_key_algorithm(),
            ed25519_key_algorithm(),
        ] {
            let mut signer_info = SignerInfo::default();
            signer_info.set_signing_certificate(certificate_with(
                1,
                "issuer",
                key_algorithm.clone(),
                None,
            ));

            assert_eq!(signer_info.signature_algorithm(), Some(&key_algorithm));
        }

        let mut signer_info = SignerInfo::default();
        signer_info.set_signing_certificate(certificate_with(1, "a", rsa_key_algorithm(), None));
        assert!(signer_info.signature_algorithm().unwrap().has_null_parameters());

        signer_info.set_signing_certificate(certificate_with(2, "b", ec_key_algorithm(), None));
        assert_eq!(signer_info.signature_algorithm(), Some(&rsa_key_algorithm()));
    }

    #[test]
    fn explicit_signature_algorithm_wins() {
        let explicit = AlgorithmIdentifier::with_null_parameters(oid(OID_SHA256_RSA));

        let mut before = SignerInfo::default();
        before.set_signature_algorithm(explicit.clone());
        before.set_signing_certificate(certificate_with(1, "a", ec_key_algorithm(), None));
        assert_eq!(before.signature_algorithm(), Some(&explicit));

        let mut after = SignerInfo::default();
        after.set_signing_certificate(certificate_with(1, "a", ec_key_algorithm(), None));
        after.set_signature_algorithm(explicit.clone());
        assert_eq!(after.signature_algorithm(), Some(&explicit));
    }

    fn signing_certificate_v2(signer_info: &SignerInfo) -> SigningCertificateV2 {
        let attribute = signer_info
            .signed_attribute(&oid(OID_SIGNING_CERTIFICATE_V2))
            .unwrap();

        Constructed::decode(attribute.value().as_slice(), Mode::Der, |cons| {
            cons.take_set(SigningCertificateV2::take_from)
        })
        .unwrap()
    }

    #[test]
    fn ess_signing_certificate_sha256() {
        let cert = rsa_cert();
        let mut signer_info = SignerInfo::default();
        signer_info
            .set_signing_certificate_and_add_to_signed_attributes(cert.clone(), &sha256())
            .unwrap();

        assert_eq!(signer_info.signing_certificate(), Some(&cert));

        let value = signing_certificate_v2(&signer_info);
        assert_eq!(value.certs.len(), 1);

        let cert_id = &value.certs[0];
        assert!(cert_id.hash_algorithm.is_none());
        assert_eq!(
            &cert_id.cert_hash.to_bytes()[..],
            DigestAlgorithm::Sha256.digest(cert.encoded()).as_slice()
        );

        let issuer_serial = cert_id.issuer_serial.as_ref().unwrap();
        assert_eq!(&issuer_serial.issuer, cert.issuer_name());
        assert_eq!(&issuer_serial.serial_number, cert.serial_number());
    }

    #[test]
    fn ess_signing_certificate_sha512() {
        let cert = rsa_cert();
        let mut signer_info = SignerInfo::default();
        signer_info
            .add_signer_certificate_to_signed_attributes(&cert, &oid(OID_SHA512))
            .unwrap();
        // A second call replaces the first.
        signer_info
            .add_signer_certificate_to_signed_attributes(&cert, &oid(OID_SHA512))
            .unwrap();
        assert_eq!(signer_info.signed_attributes().len(), 1);

        let cert_id = signing_certificate_v2(&signer_info).certs.remove(0);
        let hash_algorithm = cert_id.hash_algorithm.unwrap();
        assert_eq!(
            DigestAlgorithm::try_from(&hash_algorithm).unwrap(),
            DigestAlgorithm::Sha512
        );
        assert!(hash_algorithm.parameters().is_none());
        assert_eq!(cert_id.cert_hash.to_bytes().len(), 64);
    }

    #[test]
    fn unknown_ess_digest_rejected() {
        let mut signer_info = SignerInfo::default();

        assert!(matches!(
            signer_info.add_signer_certificate_to_signed_attributes(
                &rsa_cert(),
                &Oid(Bytes::from_static(&[42, 3, 4]))
            ),
            Err(CmsError::UnknownDigestAlgorithm(_))
        ));
        assert!(signer_info.signed_attributes().is_empty());
    }

    fn archival_attributes(signer_info: &SignerInfo) -> Vec<&CmsAttribute> {
        signer_info
            .signed_attributes()
            .iter()
            .filter(|attribute| attribute.typ() == &OID_ADOBE_REVOCATION_INFO_ARCHIVAL)
            .collect()
    }

    #[test]
    fn ocsp_responses_replaced() {
        let mut signer_info = building_signer_info();
        let first = Bytes::from_static(&[0x30, 0x01, 0x01]);
        let second = Bytes::from_static(&[0x30, 0x01, 0x02]);

        signer_info.set_ocsp_responses(vec![first]).unwrap();
        signer_info.set_ocsp_responses(vec![second.clone()]).unwrap();

        let archival = archival_attributes(&signer_info);
        assert_eq!(archival.len(), 1);

        let revocation = RevocationInfo::from_archival_attribute(archival[0]).unwrap();
        assert_eq!(revocation.ocsp_responses(), &[second.clone()][..]);
        assert!(revocation.crls().is_empty());
        assert_eq!(signer_info.ocsp_responses(), &[second][..]);

        // The rebuilt attribute goes to the end.
        assert_eq!(
            signer_info.signed_attributes().last().unwrap().typ(),
            &OID_ADOBE_REVOCATION_INFO_ARCHIVAL
        );
    }

    #[test]
    fn revocation_lists_combined_and_cleared() {
        let mut signer_info = SignerInfo::default();
        let crl = Bytes::from_static(&[0x30, 0x03, 0x02, 0x01, 0x05]);
        let ocsp = Bytes::from_static(&[0x30, 0x00]);

        signer_info.set_crl_responses(vec![crl.clone()]).unwrap();
        signer_info.set_ocsp_responses(vec![ocsp.clone()]).unwrap();

        let archival = archival_attributes(&signer_info);
        assert_eq!(archival.len(), 1);
        assert_eq!(
            RevocationInfo::from_archival_attribute(archival[0]).unwrap(),
            RevocationInfo::new(vec![crl], vec![ocsp])
        );

        signer_info.set_crl_responses(vec![]).unwrap();
        signer_info.set_ocsp_responses(vec![]).unwrap();
        assert!(archival_attributes(&signer_info).is_empty());
        assert!(signer_info.signed_attributes().is_empty());
    }

    #[test]
    fn malformed_crl_leaves_state_untouched() {
        let mut signer_info = SignerInfo::default();
        signer_info
            .set_ocsp_responses(vec![Bytes::from_static(&[0x30, 0x00])])
            .unwrap();

        assert!(signer_info
            .set_crl_responses(vec![Bytes::from_static(&[0x30, 0x09])])
            .is_err());
        assert!(signer_info.crl_responses().is_empty());
        assert_eq!(archival_attributes(&signer_info).len(), 1);
    }

    #[test]
    fn resolve_by_issuer_and_serial() {
        let cert = rsa_cert();
        let other = certificate_with(5, "someone else", rsa_key_algorithm(), None);

        let mut signer_info = building_signer_info();
        signer_info.serialize_signed_attributes();
        let der = signer_info.as_der_sequence(false).unwrap();

        let parsed = SignerInfo::from_der(
            Arc::new(BcderAsn1Builder::default()),
            &der,
            &[other.clone(), cert.clone()],
        )
        .unwrap();

        assert_eq!(parsed.signing_certificate(), Some(&cert));
        assert!(parsed.is_frozen());
        assert_eq!(parsed.signed_attributes(), signer_info.signed_attributes());
        assert_eq!(
            parsed.serialized_signed_attributes(),
            signer_info.serialized_signed_attributes()
        );
        assert_eq!(parsed.signature(), Some(&[0u8; SIGNATURE_PLACEHOLDER_LEN][..]));
        assert_eq!(parsed.as_der_sequence(false).unwrap(), der);

        let mut trailing = der.clone();
        trailing.push(0);
        assert!(matches!(
            SignerInfo::from_der(
                Arc::new(BcderAsn1Builder::default()),
                &trailing,
                &[cert.clone()]
            ),
            Err(CmsError::Structure(StructureError::Decode(_)))
        ));

        assert!(matches!(
            SignerInfo::from_der(Arc::new(BcderAsn1Builder::default()), &der, &[other]),
            Err(CmsError::CertificateNotFound)
        ));
    }

    fn v3_signer_info(identifier: &[u8]) -> Asn1Value {
        Asn1Value::from_values(encode::sequence((
            3u8.encode(),
            identifier.encode_as(Tag::CTX_0),
            AlgorithmIdentifier::from(DigestAlgorithm::Sha256),
            rsa_key_algorithm(),
            (&[1u8, 2, 3][..]).encode(),
        )))
    }

    #[test]
    fn resolve_by_subject_key_identifier() {
        let wanted = certificate_with(1, "issuer", rsa_key_algorithm(), Some(&[1u8, 1][..]));
        let other = certificate_with(1, "issuer", rsa_key_algorithm(), Some(&[2u8, 2][..]));
        let plain = certificate_with(1, "issuer", rsa_key_algorithm(), None);
        let certificates = [plain, other, wanted.clone()];

        let parsed = SignerInfo::from_der(
            Arc::new(BcderAsn1Builder::default()),
            v3_signer_info(&[1, 1]).as_slice(),
            &certificates,
        )
        .unwrap();

        assert_eq!(parsed.signing_certificate(), Some(&wanted));
        assert!(!parsed.is_frozen());
        assert_eq!(parsed.signature(), Some(&[1u8, 2, 3][..]));
        assert_eq!(parsed.digest_algorithm().unwrap().algorithm_oid(), "2.16.840.1.101.3.4.2.1");

        assert!(matches!(
            SignerInfo::from_der(
                Arc::new(BcderAsn1Builder::default()),
                v3_signer_info(&[3, 3]).as_slice(),
                &certificates,
            ),
            Err(CmsError::CertificateNotFound)
        ));
    }

    #[test]
    fn version_must_match_identifier() {
        let der = Asn1Value::from_values(encode::sequence((
            1u8.encode(),
            (&[1u8, 1][..]).encode_as(Tag::CTX_0),
            AlgorithmIdentifier::from(DigestAlgorithm::Sha256),
            rsa_key_algorithm(),
            (&[1u8, 2, 3][..]).encode(),
        )));

        assert!(matches!(
            SignerInfo::from_der(Arc::new(BcderAsn1Builder::default()), der.as_slice(), &[]),
            Err(CmsError::Structure(StructureError::SignerIdentifierMismatch))
        ));
    }
}
