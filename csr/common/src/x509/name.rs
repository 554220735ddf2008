use nameth::NamedEnumValues as _;
use nameth::nameth;
use openssl::error::ErrorStack;
use openssl::nid::Nid;
use openssl::x509::X509Name;
use openssl::x509::X509NameBuilder;

/// Builds the distinguished name of a certificate or certificate request.
///
/// Fields are appended in the order C, ST, L, O, OU, CN. Missing fields are skipped.
pub fn make_name(args: CertificateName) -> Result<X509Name, MakeNameError> {
    let mut name = X509NameBuilder::new().map_err(MakeNameError::NewBuilder)?;
    let mut set = |nid: Nid, value: Option<&str>| {
        let Some(value) = value else { return Ok(()) };
        match name.append_entry_by_nid(nid, value) {
            Ok(()) => Ok(()),
            Err(error) => {
                let nid = nid
                    .long_name()
                    .map_err(|error| MakeNameError::InvalidField { error, nid })?
                    .to_owned();
                let value = value.to_owned();
                Err(MakeNameError::InvalidValue { error, nid, value })
            }
        }
    };
    let country = args.country.map(String::from_iter);
    set(Nid::COUNTRYNAME, country.as_deref())?;
    set(Nid::STATEORPROVINCENAME, args.state_or_province)?;
    set(Nid::LOCALITYNAME, args.locality)?;
    set(Nid::ORGANIZATIONNAME, args.organization)?;
    set(Nid::ORGANIZATIONALUNITNAME, args.organizational_unit)?;
    set(Nid::COMMONNAME, args.common_name)?;
    Ok(name.build())
}

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
pub struct CertificateName<'t> {
    pub country: Option<[char; 2]>,
    pub state_or_province: Option<&'t str>,
    pub locality: Option<&'t str>,
    pub organization: Option<&'t str>,
    pub organizational_unit: Option<&'t str>,
    pub common_name: Option<&'t str>,
}

#[nameth]
#[derive(thiserror::Error, Debug)]
pub enum MakeNameError {
    #[error("[{n}] Failed to create a new LDAP Name builder: {0}", n = self.name())]
    NewBuilder(ErrorStack),

    #[error("[{n}] Failed to set LDAP field {nid} = '{value}': {error}", n = self.name())]
    InvalidValue {
        error: ErrorStack,
        nid: String,
        value: String,
    },

    #[error("[{n}] Invalid LDAP field NID={nid}: {error}", n = self.name(), nid = nid.as_raw())]
    InvalidField { error: ErrorStack, nid: Nid },
}

#[cfg(test)]
mod tests {
    use super::CertificateName;

    fn entries(name: CertificateName) -> String {
        let name = super::make_name(name).unwrap();
        name.entries()
            .map(|entry| format!("{entry:?}"))
            .collect::<Vec<_>>()
            .join(", ")
    }

    #[test]
    fn common_name() {
        let name = entries(CertificateName {
            common_name: Some("Test cert"),
            ..Default::default()
        });
        assert_eq!("commonName = \"Test cert\"", name);
    }

    #[test]
    fn full_subject() {
        let name = entries(CertificateName {
            country: Some(['Z', 'A']),
            state_or_province: Some("Cape Town"),
            locality: Some("South Africa"),
            organization: Some("Code Corner"),
            organizational_unit: Some("Development"),
            common_name: Some("codecornersoftwares.co.za"),
        });
        assert_eq!(
            [
                "countryName = \"ZA\"",
                "stateOrProvinceName = \"Cape Town\"",
                "localityName = \"South Africa\"",
                "organizationName = \"Code Corner\"",
                "organizationalUnitName = \"Development\"",
                "commonName = \"codecornersoftwares.co.za\"",
            ]
            .join(", "),
            name
        );
    }

    #[test]
    fn error() {
        let too_long: String = (0..200).map(|_| 'X').collect();
        let Err(error) = super::make_name(CertificateName {
            common_name: Some(&too_long),
            ..Default::default()
        }) else {
            panic!();
        };
        let super::MakeNameError::InvalidValue { nid, value, .. } = &error else {
            panic!();
        };
        assert_eq!(&too_long, value);
        assert_eq!("commonName", nid);
        assert!(error.to_string().starts_with(&format!(
            "[InvalidValue] Failed to set LDAP field commonName = '{too_long}': "
        )));
    }
}
