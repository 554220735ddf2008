use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::PKeyRef;
use openssl::pkey::Private;
use openssl::x509::X509Req;
use openssl::x509::X509ReqBuilder;

use super::PemAsStringError;
use super::PemString as _;
use super::name::CertificateName;
use super::name::MakeNameError;
use super::name::make_name;

/// Makes a PKCS#10 certificate signing request for the public half of `key`,
/// signed with `key`.
pub fn make_csr(
    name: CertificateName,
    key: &PKeyRef<Private>,
    digest: MessageDigest,
) -> Result<X509Req, MakeCsrError> {
    let mut builder = X509ReqBuilder::new().map_err(MakeCsrError::NewBuilder)?;

    // PKCS#10 only defines version 1, encoded as 0.
    builder.set_version(0).map_err(MakeCsrError::SetVersion)?;

    let name = make_name(name)?;
    builder
        .set_subject_name(&name)
        .map_err(MakeCsrError::SetSubjectName)?;
    builder.set_pubkey(key).map_err(MakeCsrError::SetPublicKey)?;
    builder.sign(key, digest).map_err(MakeCsrError::Sign)?;
    Ok(builder.build())
}

/// PEM-encodes a certificate signing request: `-----BEGIN CERTIFICATE REQUEST-----`.
pub fn csr_to_pem(csr: &X509Req) -> Result<String, MakeCsrError> {
    Ok(csr.to_pem().pem_string()?)
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum MakeCsrError {
    #[error("[{n}] Failed to create a new X509 Request builder: {0}", n = self.name())]
    NewBuilder(ErrorStack),

    #[error("[{n}] Failed to set the version: {0}", n = self.name())]
    SetVersion(ErrorStack),

    #[error("[{n}] {0}", n = self.name())]
    MakeName(#[from] MakeNameError),

    #[error("[{n}] Failed to set the subject name: {0}", n = self.name())]
    SetSubjectName(ErrorStack),

    #[error("[{n}] Failed to set the public key: {0}", n = self.name())]
    SetPublicKey(ErrorStack),

    #[error("[{n}] Failed to sign the request: {0}", n = self.name())]
    Sign(ErrorStack),

    #[error("[{n}] {0}", n = self.name())]
    ToPem(#[from] PemAsStringError),
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use openssl::hash::MessageDigest;
    use openssl::nid::Nid;
    use openssl::x509::X509Req;
    use x509_parser::certification_request::X509CertificationRequest;
    use x509_parser::prelude::FromDer as _;

    use super::csr_to_pem;
    use super::make_csr;
    use crate::x509::CSR_PEM_LABEL;
    use crate::x509::key::make_rsa_key;
    use crate::x509::name::CertificateName;

    const SUBJECT: CertificateName<'static> = CertificateName {
        country: Some(['Z', 'A']),
        state_or_province: Some("Cape Town"),
        locality: Some("South Africa"),
        organization: Some("Code Corner"),
        organizational_unit: Some("Development"),
        common_name: Some("codecornersoftwares.co.za"),
    };

    #[test]
    fn pem_csr() -> Result<(), Box<dyn Error>> {
        let key = make_rsa_key(2048)?;
        let csr = make_csr(SUBJECT, &key, MessageDigest::sha256())?;
        let pem = csr_to_pem(&csr)?;
        let _debug = scopeguard::guard_on_unwind((), |_| println!("CSR is\n{pem}"));

        assert!(pem.starts_with("-----BEGIN CERTIFICATE REQUEST-----\n"));
        assert!(pem.ends_with("-----END CERTIFICATE REQUEST-----\n"));

        let (rest, parsed) = x509_parser::pem::parse_x509_pem(pem.as_bytes())?;
        assert!(rest.is_empty());
        assert_eq!(CSR_PEM_LABEL, parsed.label);

        let (_, request) = X509CertificationRequest::from_der(&parsed.contents)?;
        assert_eq!(
            "C=ZA, ST=Cape Town, L=South Africa, O=Code Corner, OU=Development, CN=codecornersoftwares.co.za",
            request.certification_request_info.subject.to_string()
        );
        Ok(())
    }

    #[test]
    fn signed_by_key() -> Result<(), Box<dyn Error>> {
        let key = make_rsa_key(2048)?;
        let csr = make_csr(SUBJECT, &key, MessageDigest::sha256())?;
        let csr = X509Req::from_pem(csr_to_pem(&csr)?.as_bytes())?;

        let public_key = csr.public_key()?;
        assert_eq!(2048, public_key.bits());
        assert!(public_key.public_eq(&key));
        assert!(csr.verify(&public_key)?);
        assert_eq!(0, csr.version());

        let other_key = make_rsa_key(2048)?;
        assert!(!csr.verify(&other_key)?);
        Ok(())
    }

    #[test]
    fn common_name() -> Result<(), Box<dyn Error>> {
        let key = make_rsa_key(2048)?;
        let csr = make_csr(SUBJECT, &key, MessageDigest::sha512())?;
        let common_name = csr
            .subject_name()
            .entries_by_nid(Nid::COMMONNAME)
            .next()
            .ok_or("No common name")?;
        let common_name = std::str::from_utf8(common_name.data().as_slice())?;
        assert_eq!("codecornersoftwares.co.za", common_name);
        Ok(())
    }
}
