use std::sync::Arc;
use std::time::Duration;

use csr_gateway_common::is_global::IsGlobal;
use csr_gateway_common::x509::key::DEFAULT_RSA_KEY_BITS;
use csr_gateway_common::x509::name::CertificateName;
use openssl::hash::MessageDigest;
use serde::Deserialize;
use serde::Serialize;

use crate::authority::CertificateAuthority;
use crate::authority::SigningAlgorithm;

/// The subject of the generated certificate requests when none is configured.
pub const DEFAULT_SUBJECT: CertificateName<'static> = CertificateName {
    country: Some(['Z', 'A']),
    state_or_province: Some("Cape Town"),
    locality: Some("South Africa"),
    organization: Some("Code Corner"),
    organizational_unit: Some("Development"),
    common_name: Some("codecornersoftwares.co.za"),
};

/// Placeholder: real deployments must configure the ARN of their private CA.
pub const DEFAULT_CERTIFICATE_AUTHORITY_ARN: &str =
    "arn:aws:acm-pca:region:account-id:certificate-authority/CA-ID";

/// Placeholder: real deployments must configure the region of their private CA.
pub const DEFAULT_REGION: &str = "your-region";

pub const DEFAULT_VALIDITY_DAYS: i64 = 365;

/// The configuration of the CSR gateway server.
pub trait CsrServiceConfig: IsGlobal {
    fn enable_tracing(&self) -> bool {
        true
    }

    fn host(&self) -> &str {
        "0.0.0.0"
    }

    fn port(&self) -> u16 {
        8080
    }

    /// The identity written in every certificate request.
    fn subject(&self) -> CertificateName<'_> {
        DEFAULT_SUBJECT
    }

    fn key_bits(&self) -> u32 {
        DEFAULT_RSA_KEY_BITS
    }

    /// The digest used to sign the certificate requests with the generated key.
    fn csr_digest(&self) -> CsrDigest {
        CsrDigest::default()
    }

    fn key_generation_timeout(&self) -> Duration {
        Duration::from_secs(30)
    }

    /// How long a generated key and certificate request can be used to issue a certificate.
    fn session_ttl(&self) -> Duration {
        Duration::from_secs(3600)
    }

    fn certificate_authority_arn(&self) -> &str {
        DEFAULT_CERTIFICATE_AUTHORITY_ARN
    }

    fn signing_algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::default()
    }

    fn validity_days(&self) -> i64 {
        DEFAULT_VALIDITY_DAYS
    }

    /// Deadline for loading the authority client and issuing the certificate.
    fn issuance_timeout(&self) -> Duration {
        Duration::from_secs(60)
    }

    type Authority: CertificateAuthority;
    fn authority(&self) -> Self::Authority;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CsrDigest {
    #[default]
    Sha256,
    Sha384,
    Sha512,
}

impl CsrDigest {
    pub fn message_digest(self) -> MessageDigest {
        match self {
            Self::Sha256 => MessageDigest::sha256(),
            Self::Sha384 => MessageDigest::sha384(),
            Self::Sha512 => MessageDigest::sha512(),
        }
    }
}

impl<T: CsrServiceConfig> CsrServiceConfig for Arc<T> {
    fn enable_tracing(&self) -> bool {
        let this: &T = self.as_ref();
        this.enable_tracing()
    }
    fn host(&self) -> &str {
        let this: &T = self.as_ref();
        this.host()
    }
    fn port(&self) -> u16 {
        let this: &T = self.as_ref();
        this.port()
    }
    fn subject(&self) -> CertificateName<'_> {
        let this: &T = self.as_ref();
        this.subject()
    }
    fn key_bits(&self) -> u32 {
        let this: &T = self.as_ref();
        this.key_bits()
    }
    fn csr_digest(&self) -> CsrDigest {
        let this: &T = self.as_ref();
        this.csr_digest()
    }
    fn key_generation_timeout(&self) -> Duration {
        let this: &T = self.as_ref();
        this.key_generation_timeout()
    }
    fn session_ttl(&self) -> Duration {
        let this: &T = self.as_ref();
        this.session_ttl()
    }
    fn certificate_authority_arn(&self) -> &str {
        let this: &T = self.as_ref();
        this.certificate_authority_arn()
    }
    fn signing_algorithm(&self) -> SigningAlgorithm {
        let this: &T = self.as_ref();
        this.signing_algorithm()
    }
    fn validity_days(&self) -> i64 {
        let this: &T = self.as_ref();
        this.validity_days()
    }
    fn issuance_timeout(&self) -> Duration {
        let this: &T = self.as_ref();
        this.issuance_timeout()
    }

    type Authority = T::Authority;
    fn authority(&self) -> Self::Authority {
        let this: &T = self.as_ref();
        this.authority()
    }
}
