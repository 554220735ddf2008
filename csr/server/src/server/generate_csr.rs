use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::response::Response;
use csr_gateway_common::http_error::HttpError;
use csr_gateway_common::http_error::IsHttpError;
use csr_gateway_common::x509::csr::MakeCsrError;
use csr_gateway_common::x509::csr::csr_to_pem;
use csr_gateway_common::x509::csr::make_csr;
use csr_gateway_common::x509::key::MakeKeyError;
use csr_gateway_common::x509::key::make_rsa_key;
use mime::TEXT_PLAIN;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use tokio::task::JoinError;
use tracing::debug;
use tracing::info;

use super::SESSION_ID_HEADER;
use super::Server;
use super::service_config::CsrServiceConfig;
use super::sessions::SessionId;

impl<C: CsrServiceConfig> Server<C> {
    /// Generates a new key pair and certificate request, and makes them the latest session.
    ///
    /// The response is the PEM-armored certificate request.
    pub async fn generate_csr(self: Arc<Self>) -> Result<Response, HttpError<GenerateCsrError>> {
        let (session_id, csr_pem) = self.make_csr_session().await?;
        let headers = [
            (CONTENT_TYPE, TEXT_PLAIN.to_string()),
            (
                HeaderName::from_static(SESSION_ID_HEADER),
                session_id.to_string(),
            ),
        ];
        Ok((StatusCode::OK, headers, csr_pem).into_response())
    }

    async fn make_csr_session(&self) -> Result<(SessionId, String), GenerateCsrError> {
        let key_bits = self.config.key_bits();
        let timeout = self.config.key_generation_timeout();
        let private_key = tokio::time::timeout(
            timeout,
            tokio::task::spawn_blocking(move || make_rsa_key(key_bits)),
        )
        .await
        .map_err(|_| GenerateCsrError::KeyGenerationTimeout(timeout))?
        .map_err(GenerateCsrError::KeyGenerationTask)??;
        debug!("Generated {key_bits}-bit RSA key");

        let csr = make_csr(
            self.config.subject(),
            &private_key,
            self.config.csr_digest().message_digest(),
        )
        .map_err(GenerateCsrError::MakeCsr)?;
        let csr_pem = csr_to_pem(&csr).map_err(GenerateCsrError::MakeCsr)?;

        let session_id = self.sessions.insert(private_key, csr_pem.clone());
        info!("Generated CSR {session_id}");
        Ok((session_id, csr_pem))
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum GenerateCsrError {
    #[error("Failed to generate private key: {0}")]
    MakeKey(#[from] MakeKeyError),

    #[error("Failed to generate private key: [{n}] Timed out after {0:?}", n = self.name())]
    KeyGenerationTimeout(Duration),

    #[error("Failed to generate private key: [{n}] {0}", n = self.name())]
    KeyGenerationTask(JoinError),

    #[error("Failed to generate CSR: {0}")]
    MakeCsr(MakeCsrError),
}

impl IsHttpError for GenerateCsrError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MakeKey { .. }
            | Self::KeyGenerationTimeout { .. }
            | Self::KeyGenerationTask { .. }
            | Self::MakeCsr { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::http::StatusCode;
    use csr_gateway_common::http_error::IsHttpError as _;
    use csr_gateway_common::x509::csr::make_csr;
    use csr_gateway_common::x509::key::make_rsa_key;
    use csr_gateway_common::x509::name::CertificateName;
    use openssl::hash::MessageDigest;

    use super::GenerateCsrError;

    #[test]
    fn messages() {
        let Err(error) = make_rsa_key(512) else {
            panic!("512-bit keys must be rejected");
        };
        let error = GenerateCsrError::from(error);
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, error.status_code());
        assert_eq!(
            "Failed to generate private key: [TooSmall] RSA keys must have at least 2048 bits, got 512",
            error.to_string()
        );

        let error = GenerateCsrError::KeyGenerationTimeout(Duration::from_secs(30));
        assert_eq!(
            "Failed to generate private key: [KeyGenerationTimeout] Timed out after 30s",
            error.to_string()
        );
    }

    #[test]
    fn csr_message() -> Result<(), Box<dyn std::error::Error>> {
        let key = make_rsa_key(2048)?;
        let too_long: String = (0..200).map(|_| 'X').collect();
        let name = CertificateName {
            common_name: Some(&too_long),
            ..Default::default()
        };
        let Err(error) = make_csr(name, &key, MessageDigest::sha256()) else {
            panic!("Common names are limited to 64 characters");
        };
        let error = GenerateCsrError::MakeCsr(error);
        assert_eq!(StatusCode::INTERNAL_SERVER_ERROR, error.status_code());
        assert!(error.to_string().starts_with(&format!(
            "Failed to generate CSR: [MakeName] [InvalidValue] Failed to set LDAP field commonName = '{too_long}': "
        )));
        Ok(())
    }
}
