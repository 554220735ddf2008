//! The certificate authority that signs the generated certificate requests.

use serde::Deserialize;
use serde::Serialize;

use csr_gateway_common::is_global::IsGlobal;

pub mod acm_pca;
mod poll;

/// A service that issues certificates from certificate signing requests.
///
/// Issuance happens in two steps so that failures to set up the client
/// (credentials, configuration) can be told apart from failures of the
/// issuance call itself.
pub trait CertificateAuthority: IsGlobal + std::fmt::Debug {
    type Client: Send + Sync;
    type LoadError: std::error::Error + Send + 'static;
    type IssueError: std::error::Error + Send + 'static;

    /// Loads the configuration and credentials needed to talk to the authority.
    fn load(&self) -> impl Future<Output = Result<Self::Client, Self::LoadError>> + Send;

    /// Submits the certificate request and returns the identifier of the issued certificate.
    fn issue(
        &self,
        client: &Self::Client,
        request: IssueCertificateRequest<'_>,
    ) -> impl Future<Output = Result<String, Self::IssueError>> + Send;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IssueCertificateRequest<'t> {
    pub certificate_authority_arn: &'t str,

    /// The PEM-armored certificate signing request.
    pub csr: &'t [u8],

    pub signing_algorithm: SigningAlgorithm,
    pub validity_days: i64,
}

/// The algorithm the certificate authority uses to sign the certificate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    Sha256WithRsa,
    Sha384WithRsa,
    #[default]
    Sha512WithRsa,
    Sha256WithEcdsa,
    Sha384WithEcdsa,
    Sha512WithEcdsa,
}

impl SigningAlgorithm {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sha256WithRsa => "SHA256WITHRSA",
            Self::Sha384WithRsa => "SHA384WITHRSA",
            Self::Sha512WithRsa => "SHA512WITHRSA",
            Self::Sha256WithEcdsa => "SHA256WITHECDSA",
            Self::Sha384WithEcdsa => "SHA384WITHECDSA",
            Self::Sha512WithEcdsa => "SHA512WITHECDSA",
        }
    }
}

impl std::fmt::Display for SigningAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::SigningAlgorithm;

    #[test]
    fn serde_names_match_display() {
        for algorithm in [
            SigningAlgorithm::Sha256WithRsa,
            SigningAlgorithm::Sha384WithRsa,
            SigningAlgorithm::Sha512WithRsa,
            SigningAlgorithm::Sha256WithEcdsa,
            SigningAlgorithm::Sha384WithEcdsa,
            SigningAlgorithm::Sha512WithEcdsa,
        ] {
            let value = toml::Value::try_from(algorithm).unwrap();
            assert_eq!(Some(algorithm.as_str()), value.as_str());
        }
    }

    #[test]
    fn default() {
        assert_eq!("SHA512WITHRSA", SigningAlgorithm::default().to_string());
    }
}
