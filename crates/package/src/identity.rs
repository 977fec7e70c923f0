use crate::error::{ErrorKind, Result};
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Identity of a package, derived purely from its file name.
///
/// `Creator.Package.Version.var` is the naming convention every package
/// follows, and `Creator.Package.Version` is the key used to decide whether a
/// package has been imported before.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackageIdentity {
    pub creator_name: String,
    pub package_name: String,
    pub version: u32,
    pub id: String,
}
impl Display for PackageIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.id)
    }
}

/// Parse a package file name (with or without the `.var` extension).
///
/// Segments are taken as-is, without trimming. Anything past the third
/// segment is ignored.
///
/// # Examples
///
/// ```
/// use varstash_package::parse_identity;
///
/// let identity = parse_identity("Alice.MyScene.3.var").unwrap();
/// assert_eq!(identity.creator_name, "Alice");
/// assert_eq!(identity.package_name, "MyScene");
/// assert_eq!(identity.version, 3);
/// assert_eq!(identity.id, "Alice.MyScene.3");
///
/// assert!(parse_identity(".MyScene.3.var").is_err());
/// ```
pub fn parse_identity(base_name: &str) -> Result<PackageIdentity> {
    let mut segments = base_name.split('.');
    let creator_name = segments.next().filter(|s| !s.is_empty());
    let Some(creator_name) = creator_name else {
        exn::bail!(ErrorKind::InvalidCreatorName(base_name.to_string()));
    };
    let Some(package_name) = segments.next().filter(|s| !s.is_empty()) else {
        exn::bail!(ErrorKind::InvalidPackageName(base_name.to_string()));
    };
    let raw_version = segments.next().unwrap_or_default();
    let Ok(version) = raw_version.parse::<u32>() else {
        exn::bail!(ErrorKind::InvalidVersion(base_name.to_string()));
    };
    Ok(PackageIdentity {
        creator_name: creator_name.to_string(),
        package_name: package_name.to_string(),
        version,
        id: format!("{creator_name}.{package_name}.{raw_version}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_with_extension() {
        let identity = parse_identity("Alice.MyScene.3.var").unwrap();
        assert_eq!(
            identity,
            PackageIdentity {
                creator_name: "Alice".to_string(),
                package_name: "MyScene".to_string(),
                version: 3,
                id: "Alice.MyScene.3".to_string(),
            }
        );
        assert_eq!(identity.to_string(), "Alice.MyScene.3");
    }

    #[test]
    fn test_parse_without_extension() {
        let identity = parse_identity("Bob.Outfit_Pack.12").unwrap();
        assert_eq!(identity.creator_name, "Bob");
        assert_eq!(identity.package_name, "Outfit_Pack");
        assert_eq!(identity.version, 12);
    }

    #[test]
    fn test_segments_are_not_trimmed() {
        let identity = parse_identity(" Alice.My Scene.1.var").unwrap();
        assert_eq!(identity.creator_name, " Alice");
        assert_eq!(identity.package_name, "My Scene");
    }

    #[rstest]
    #[case(".MyScene.3.var")]
    #[case("")]
    fn test_empty_creator(#[case] name: &str) {
        let err = parse_identity(name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidCreatorName(_)));
    }

    #[rstest]
    #[case("Alice..3.var")]
    #[case("Alice")]
    fn test_empty_package(#[case] name: &str) {
        let err = parse_identity(name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidPackageName(_)));
    }

    #[rstest]
    #[case("Alice.MyScene.latest.var")]
    #[case("Alice.MyScene")]
    #[case("Alice.MyScene..var")]
    #[case("Alice.MyScene.-1.var")]
    fn test_bad_version(#[case] name: &str) {
        let err = parse_identity(name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidVersion(_)));
    }
}
