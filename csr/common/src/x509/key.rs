use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::pkey::PKey;
use openssl::pkey::Private;
use openssl::rsa::Rsa;

/// Size of RSA keys when none is configured.
pub const DEFAULT_RSA_KEY_BITS: u32 = 2048;

/// Smallest RSA modulus we agree to generate.
pub const MIN_RSA_KEY_BITS: u32 = 2048;

/// Generates a new RSA key pair using OpenSSL's CSPRNG.
pub fn make_rsa_key(bits: u32) -> Result<PKey<Private>, MakeKeyError> {
    if bits < MIN_RSA_KEY_BITS {
        return Err(MakeKeyError::TooSmall { bits });
    }
    let rsa = Rsa::generate(bits).map_err(MakeKeyError::Generate)?;
    let key = PKey::from_rsa(rsa).map_err(MakeKeyError::ToKey)?;
    Ok(key)
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum MakeKeyError {
    #[error("[{n}] RSA keys must have at least {MIN_RSA_KEY_BITS} bits, got {bits}", n = self.name())]
    TooSmall { bits: u32 },

    #[error("[{n}] Failed to generate an RSA key: {0}", n = self.name())]
    Generate(ErrorStack),

    #[error("[{n}] Failed to convert the RSA key: {0}", n = self.name())]
    ToKey(ErrorStack),
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use openssl::pkey::Id;
    use openssl::pkey::PKey;

    use super::DEFAULT_RSA_KEY_BITS;
    use crate::x509::PemString as _;

    #[test]
    fn make_rsa_key() -> Result<(), Box<dyn Error>> {
        Ok({
            let private_key = super::make_rsa_key(DEFAULT_RSA_KEY_BITS)?;
            let public_key = private_key.public_key_to_pem().pem_string()?;
            let _debug = scopeguard::guard_on_unwind((), |_| {
                println!("Public key is\n{public_key}");
            });
            assert!(public_key.starts_with("-----BEGIN PUBLIC KEY-----"));
            let public_key = PKey::public_key_from_pem(public_key.as_bytes())?;
            assert_eq!(Id::RSA, public_key.id());
            assert_eq!(
                (2048, 112, 256),
                (
                    public_key.bits(),
                    public_key.security_bits(),
                    public_key.size()
                )
            );
            assert!(public_key.public_eq(&private_key));
        })
    }

    #[test]
    fn fresh_keys() -> Result<(), Box<dyn Error>> {
        let a = super::make_rsa_key(DEFAULT_RSA_KEY_BITS)?;
        let b = super::make_rsa_key(DEFAULT_RSA_KEY_BITS)?;
        assert!(!a.public_eq(&b));
        Ok(())
    }

    #[test]
    fn too_small() {
        let Err(error) = super::make_rsa_key(1024) else {
            panic!("1024-bit keys must be rejected");
        };
        assert_eq!(
            "[TooSmall] RSA keys must have at least 2048 bits, got 1024",
            error.to_string()
        );
    }
}
