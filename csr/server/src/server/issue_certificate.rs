use std::sync::Arc;
use std::time::Duration;

use axum::extract::Query;
use axum::http::StatusCode;
use csr_gateway_common::http_error::HttpError;
use csr_gateway_common::http_error::IsHttpError;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use serde::Deserialize;
use tracing::debug;
use tracing::info;

use super::Server;
use super::service_config::CsrServiceConfig;
use super::sessions::SessionId;
use crate::authority::CertificateAuthority;
use crate::authority::IssueCertificateRequest;

#[derive(Clone, Copy, Debug, Default, Deserialize)]
pub struct IssueCertificateQuery {
    /// Issue the certificate for this session instead of the latest one.
    pub session: Option<SessionId>,
}

impl<C: CsrServiceConfig> Server<C> {
    /// Submits a stored certificate request to the certificate authority.
    pub async fn issue_certificate(
        self: Arc<Self>,
        Query(query): Query<IssueCertificateQuery>,
    ) -> Result<String, HttpError<IssueCertificateError<C::Authority>>> {
        let certificate_arn = self.issue_stored_csr(query.session).await?;
        Ok(format!("Certificate issued: {certificate_arn}"))
    }

    async fn issue_stored_csr(
        &self,
        session_id: Option<SessionId>,
    ) -> Result<String, IssueCertificateError<C::Authority>> {
        let session = self
            .sessions
            .get(session_id)
            .ok_or(IssueCertificateError::NoCsr)?;
        let timeout = self.config.issuance_timeout();
        tokio::time::timeout(timeout, async {
            let authority = &self.authority;
            let client = authority
                .load()
                .await
                .map_err(IssueCertificateError::LoadConfig)?;
            let request = IssueCertificateRequest {
                certificate_authority_arn: self.config.certificate_authority_arn(),
                csr: session.csr_pem.as_bytes(),
                signing_algorithm: self.config.signing_algorithm(),
                validity_days: self.config.validity_days(),
            };
            debug!(
                "Issue certificate with {} for {} days",
                request.signing_algorithm, request.validity_days
            );
            let certificate_arn = authority
                .issue(&client, request)
                .await
                .map_err(IssueCertificateError::Issue)?;
            info!("Certificate issued: {certificate_arn}");
            Ok::<_, IssueCertificateError<C::Authority>>(certificate_arn)
        })
        .await
        .map_err(|_| IssueCertificateError::Timeout(timeout))?
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum IssueCertificateError<A: CertificateAuthority> {
    #[error("No CSR available. Please call /generate-csr first.")]
    NoCsr,

    #[error("Failed to load AWS config: {0}")]
    LoadConfig(A::LoadError),

    #[error("Error issuing certificate: {0}")]
    Issue(A::IssueError),

    #[error("Error issuing certificate: [{n}] Timed out after {0:?}", n = self.name())]
    Timeout(Duration),
}

impl<A: CertificateAuthority> IsHttpError for IssueCertificateError<A> {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::NoCsr => StatusCode::BAD_REQUEST,
            Self::LoadConfig { .. } | Self::Issue { .. } | Self::Timeout { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
