//! The configuration file of the CSR gateway.
//!
//! Every field is optional, missing fields take the documented defaults:
//!
//! ```toml
//! host = "0.0.0.0"
//! port = 8080
//!
//! [subject]
//! common_name = "codecornersoftwares.co.za"
//! organization = "Code Corner"
//! organizational_unit = "Development"
//! country = "ZA"
//! state_or_province = "Cape Town"
//! locality = "South Africa"
//!
//! [key]
//! bits = 2048
//! digest = "SHA256"
//! generation_timeout = "30s"
//!
//! [sessions]
//! ttl = "1h"
//!
//! [authority]
//! region = "your-region"
//! certificate_authority_arn = "arn:aws:acm-pca:region:account-id:certificate-authority/CA-ID"
//! signing_algorithm = "SHA512WITHRSA"
//! validity_days = 365
//! timeout = "60s"
//! wait_for_issuance = false
//! poll_tries = 5
//! poll_delay = "250ms"
//! ```

use std::path::Path;
use std::time::Duration;

use csr_gateway_common::x509::key::DEFAULT_RSA_KEY_BITS;
use csr_gateway_common::x509::name::CertificateName;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use serde::Deserialize;

use crate::authority::SigningAlgorithm;
use crate::authority::acm_pca::AcmPcaAuthority;
use crate::authority::acm_pca::WaitForIssuance;
use crate::server::service_config::CsrDigest;
use crate::server::service_config::CsrServiceConfig;
use crate::server::service_config::DEFAULT_CERTIFICATE_AUTHORITY_ARN;
use crate::server::service_config::DEFAULT_REGION;
use crate::server::service_config::DEFAULT_SUBJECT;
use crate::server::service_config::DEFAULT_VALIDITY_DAYS;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfiguration {
    pub enable_tracing: bool,
    pub host: String,
    pub port: u16,
    pub subject: SubjectConfiguration,
    pub key: KeyConfiguration,
    pub sessions: SessionsConfiguration,
    pub authority: AuthorityConfiguration,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SubjectConfiguration {
    pub common_name: String,
    pub organization: String,
    pub organizational_unit: String,
    pub country: CountryCode,
    pub state_or_province: String,
    pub locality: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct KeyConfiguration {
    pub bits: u32,
    pub digest: CsrDigest,
    #[serde(deserialize_with = "duration::deserialize")]
    pub generation_timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionsConfiguration {
    #[serde(deserialize_with = "duration::deserialize")]
    pub ttl: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorityConfiguration {
    pub region: String,
    pub certificate_authority_arn: String,
    pub signing_algorithm: SigningAlgorithm,
    pub validity_days: i64,
    #[serde(deserialize_with = "duration::deserialize")]
    pub timeout: Duration,
    pub wait_for_issuance: bool,
    pub poll_tries: i32,
    #[serde(deserialize_with = "duration::deserialize")]
    pub poll_delay: Duration,
}

/// A two-letter ISO 3166 country code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct CountryCode([char; 2]);

impl TryFrom<String> for CountryCode {
    type Error = InvalidCountryCode;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let mut chars = value.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(a), Some(b), None) if a.is_ascii_alphabetic() && b.is_ascii_alphabetic() => {
                Ok(Self([a.to_ascii_uppercase(), b.to_ascii_uppercase()]))
            }
            _ => Err(InvalidCountryCode(value)),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("Invalid country code '{0}', expected two letters")]
pub struct InvalidCountryCode(String);

impl ServiceConfiguration {
    /// Loads the configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadConfigurationError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|error| {
            LoadConfigurationError::Read {
                path: path.display().to_string(),
                error,
            }
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, LoadConfigurationError> {
        Ok(toml::from_str(content)?)
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum LoadConfigurationError {
    #[error("[{n}] Failed to read '{path}': {error}", n = self.name())]
    Read {
        path: String,
        error: std::io::Error,
    },

    #[error("[{n}] {0}", n = self.name())]
    Parse(#[from] toml::de::Error),
}

impl CsrServiceConfig for ServiceConfiguration {
    fn enable_tracing(&self) -> bool {
        self.enable_tracing
    }

    fn host(&self) -> &str {
        &self.host
    }

    fn port(&self) -> u16 {
        self.port
    }

    fn subject(&self) -> CertificateName<'_> {
        let subject = &self.subject;
        CertificateName {
            country: Some(subject.country.0),
            state_or_province: non_empty(&subject.state_or_province),
            locality: non_empty(&subject.locality),
            organization: non_empty(&subject.organization),
            organizational_unit: non_empty(&subject.organizational_unit),
            common_name: non_empty(&subject.common_name),
        }
    }

    fn key_bits(&self) -> u32 {
        self.key.bits
    }

    fn csr_digest(&self) -> CsrDigest {
        self.key.digest
    }

    fn key_generation_timeout(&self) -> Duration {
        self.key.generation_timeout
    }

    fn session_ttl(&self) -> Duration {
        self.sessions.ttl
    }

    fn certificate_authority_arn(&self) -> &str {
        &self.authority.certificate_authority_arn
    }

    fn signing_algorithm(&self) -> SigningAlgorithm {
        self.authority.signing_algorithm
    }

    fn validity_days(&self) -> i64 {
        self.authority.validity_days
    }

    fn issuance_timeout(&self) -> Duration {
        self.authority.timeout
    }

    type Authority = AcmPcaAuthority;
    fn authority(&self) -> Self::Authority {
        let authority = &self.authority;
        AcmPcaAuthority {
            region: authority.region.clone(),
            wait_for_issuance: authority.wait_for_issuance.then_some(WaitForIssuance {
                tries: authority.poll_tries,
                delay: authority.poll_delay,
            }),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    Some(value).filter(|value| !value.is_empty())
}

impl Default for ServiceConfiguration {
    fn default() -> Self {
        Self {
            enable_tracing: true,
            host: "0.0.0.0".into(),
            port: 8080,
            subject: SubjectConfiguration::default(),
            key: KeyConfiguration::default(),
            sessions: SessionsConfiguration::default(),
            authority: AuthorityConfiguration::default(),
        }
    }
}

impl Default for SubjectConfiguration {
    fn default() -> Self {
        let owned = |value: Option<&str>| value.unwrap_or_default().to_owned();
        Self {
            common_name: owned(DEFAULT_SUBJECT.common_name),
            organization: owned(DEFAULT_SUBJECT.organization),
            organizational_unit: owned(DEFAULT_SUBJECT.organizational_unit),
            country: CountryCode::default(),
            state_or_province: owned(DEFAULT_SUBJECT.state_or_province),
            locality: owned(DEFAULT_SUBJECT.locality),
        }
    }
}

impl Default for CountryCode {
    fn default() -> Self {
        Self(DEFAULT_SUBJECT.country.unwrap_or(['Z', 'A']))
    }
}

impl Default for KeyConfiguration {
    fn default() -> Self {
        Self {
            bits: DEFAULT_RSA_KEY_BITS,
            digest: CsrDigest::default(),
            generation_timeout: Duration::from_secs(30),
        }
    }
}

impl Default for SessionsConfiguration {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(3600),
        }
    }
}

impl Default for AuthorityConfiguration {
    fn default() -> Self {
        Self {
            region: DEFAULT_REGION.into(),
            certificate_authority_arn: DEFAULT_CERTIFICATE_AUTHORITY_ARN.into(),
            signing_algorithm: SigningAlgorithm::default(),
            validity_days: DEFAULT_VALIDITY_DAYS,
            timeout: Duration::from_secs(60),
            wait_for_issuance: false,
            poll_tries: 5,
            poll_delay: Duration::from_millis(250),
        }
    }
}

/// Durations are written in [humantime] format, e.g. `"30s"` or `"1h 30m"`.
mod duration {
    use std::time::Duration;

    use serde::Deserialize as _;
    use serde::Deserializer;
    use serde::de::Error as _;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        humantime::parse_duration(&value).map_err(D::Error::custom)
    }
}
