//! [CertificateAuthority] backed by AWS Private CA.

use std::ops::ControlFlow;
use std::time::Duration;

use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_credential_types::provider::ProvideCredentials as _;
use aws_credential_types::provider::error::CredentialsError;
use aws_sdk_acmpca::Client;
use aws_sdk_acmpca::error::BuildError;
use aws_sdk_acmpca::error::DisplayErrorContext;
use aws_sdk_acmpca::error::SdkError;
use aws_sdk_acmpca::operation::get_certificate::GetCertificateError;
use aws_sdk_acmpca::operation::issue_certificate::IssueCertificateError;
use aws_sdk_acmpca::primitives::Blob;
use aws_sdk_acmpca::types::Validity;
use aws_sdk_acmpca::types::ValidityPeriodType;
use nameth::NamedEnumValues as _;
use nameth::nameth;
use tracing::debug;
use tracing::info;

use super::CertificateAuthority;
use super::IssueCertificateRequest;
use super::SigningAlgorithm;
use super::poll::poll;

#[derive(Clone, Debug)]
pub struct AcmPcaAuthority {
    /// Overrides the region found in the environment.
    pub region: String,

    /// Wait until the certificate is issued before returning its ARN.
    pub wait_for_issuance: Option<WaitForIssuance>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitForIssuance {
    pub tries: i32,
    pub delay: Duration,
}

impl CertificateAuthority for AcmPcaAuthority {
    type Client = Client;
    type LoadError = LoadAwsConfigError;
    type IssueError = AcmPcaIssueError;

    async fn load(&self) -> Result<Client, LoadAwsConfigError> {
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(self.region.clone()))
            .load()
            .await;
        let credentials_provider = sdk_config
            .credentials_provider()
            .ok_or(LoadAwsConfigError::NoCredentialsProvider)?;
        let _credentials = credentials_provider
            .provide_credentials()
            .await
            .map_err(LoadAwsConfigError::Credentials)?;
        debug!("Loaded AWS config for region {}", self.region);
        Ok(Client::new(&sdk_config))
    }

    async fn issue(
        &self,
        client: &Client,
        request: IssueCertificateRequest<'_>,
    ) -> Result<String, AcmPcaIssueError> {
        let validity = Validity::builder()
            .r#type(ValidityPeriodType::Days)
            .value(request.validity_days)
            .build()
            .map_err(AcmPcaIssueError::Validity)?;
        let response = client
            .issue_certificate()
            .certificate_authority_arn(request.certificate_authority_arn)
            .csr(Blob::new(request.csr))
            .signing_algorithm(to_sdk_signing_algorithm(request.signing_algorithm))
            .validity(validity)
            .send()
            .await
            .map_err(AcmPcaIssueError::IssueCertificate)?;
        let certificate_arn = response
            .certificate_arn()
            .ok_or(AcmPcaIssueError::MissingCertificateArn)?
            .to_owned();
        info!("Requested certificate {certificate_arn}");

        if let Some(wait) = self.wait_for_issuance {
            wait_for_issuance(
                client,
                request.certificate_authority_arn,
                &certificate_arn,
                wait,
            )
            .await?;
        }
        Ok(certificate_arn)
    }
}

fn to_sdk_signing_algorithm(
    signing_algorithm: SigningAlgorithm,
) -> aws_sdk_acmpca::types::SigningAlgorithm {
    aws_sdk_acmpca::types::SigningAlgorithm::from(signing_algorithm.as_str())
}

/// Polls `GetCertificate` while the authority reports the request is in progress.
async fn wait_for_issuance(
    client: &Client,
    certificate_authority_arn: &str,
    certificate_arn: &str,
    wait: WaitForIssuance,
) -> Result<(), AcmPcaIssueError> {
    let poll_task = poll(
        move |()| async move {
            let response = client
                .get_certificate()
                .certificate_authority_arn(certificate_authority_arn)
                .certificate_arn(certificate_arn)
                .send()
                .await;
            match response {
                Ok(_) => ControlFlow::Break(Ok(())),
                Err(error)
                    if error
                        .as_service_error()
                        .is_some_and(|error| error.is_request_in_progress_exception()) =>
                {
                    debug!("Certificate {certificate_arn} is still being issued");
                    ControlFlow::Continue(())
                }
                Err(error) => ControlFlow::Break(Err(AcmPcaIssueError::GetCertificate(error))),
            }
        },
        (),
        wait.tries,
        wait.delay,
    );
    match poll_task.await {
        Ok(result) => result,
        Err(()) => Err(AcmPcaIssueError::NotIssued { tries: wait.tries }),
    }
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum LoadAwsConfigError {
    #[error("[{n}] No credentials provider found in the environment", n = self.name())]
    NoCredentialsProvider,

    #[error("[{n}] {e}", n = self.name(), e = DisplayErrorContext(.0))]
    Credentials(CredentialsError),
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum AcmPcaIssueError {
    #[error("[{n}] Invalid validity: {0}", n = self.name())]
    Validity(BuildError),

    #[error("[{n}] {e}", n = self.name(), e = DisplayErrorContext(.0))]
    IssueCertificate(SdkError<IssueCertificateError>),

    #[error("[{n}] The response did not include the certificate ARN", n = self.name())]
    MissingCertificateArn,

    #[error("[{n}] {e}", n = self.name(), e = DisplayErrorContext(.0))]
    GetCertificate(SdkError<GetCertificateError>),

    #[error("[{n}] The certificate was still not issued after {tries} attempts", n = self.name())]
    NotIssued { tries: i32 },
}
