//! The `meta.json` document embedded in every package.
//!
//! Package authors write these by hand (or with tools of varying quality),
//! so every field is optional and a field with the wrong JSON type is
//! treated as absent rather than failing the whole document.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Parsed package manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    pub license_type: Option<String>,
    pub creator_name: Option<String>,
    pub package_name: Option<String>,
    pub description: Option<String>,
    pub credits: Option<String>,
    pub instructions: Option<String>,
    pub promotional_link: Option<String>,
    pub program_version: Option<String>,
    /// Logical paths of bundled content, in the order the author listed them.
    pub content_list: Vec<String>,
    pub dependencies: BTreeMap<String, Dependency>,
    pub had_reference_issues: bool,
    pub reference_issues: Vec<String>,
}

/// A package this package depends on, keyed by its id in the parent map.
///
/// Recorded for display only; dependencies are never resolved or fetched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_type: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, Dependency>,
}

impl Manifest {
    /// Parse manifest bytes.
    ///
    /// An empty (or whitespace-only) document is
    /// [`ManifestMissing`](ErrorKind::ManifestMissing); anything that is not
    /// a JSON object is [`ManifestInvalid`](ErrorKind::ManifestInvalid).
    ///
    /// # Examples
    ///
    /// ```
    /// use varstash_package::Manifest;
    ///
    /// let manifest = Manifest::from_slice(br#"{"contentList": ["Saves/scene/a.json"], "credits": 42}"#).unwrap();
    /// assert_eq!(manifest.content_list, vec!["Saves/scene/a.json"]);
    /// assert_eq!(manifest.credits, None);
    /// ```
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        // Plenty of manifests are saved by Windows editors with a BOM.
        let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            exn::bail!(ErrorKind::ManifestMissing);
        }
        let value: Value =
            serde_json::from_slice(bytes).or_raise(|| ErrorKind::ManifestInvalid("not valid JSON".to_string()))?;
        let Value::Object(object) = value else {
            exn::bail!(ErrorKind::ManifestInvalid(format!("expected an object, found {}", json_type(&value))));
        };
        Ok(Self::from_object(&object))
    }

    fn from_object(object: &Map<String, Value>) -> Self {
        Self {
            license_type: text(object, "licenseType"),
            creator_name: text(object, "creatorName"),
            package_name: text(object, "packageName"),
            description: text(object, "description"),
            credits: text(object, "credits"),
            instructions: text(object, "instructions"),
            promotional_link: text(object, "promotionalLink"),
            program_version: text(object, "programVersion"),
            content_list: strings(object, "contentList"),
            dependencies: dependencies(object.get("dependencies")),
            had_reference_issues: flag(object, "hadReferenceIssues"),
            reference_issues: strings(object, "referenceIssues"),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn text(object: &Map<String, Value>, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn strings(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items.iter().filter_map(|item| item.as_str().map(str::to_string)).collect(),
        _ => Vec::new(),
    }
}

fn flag(object: &Map<String, Value>, key: &str) -> bool {
    match object.get(key) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

fn dependencies(value: Option<&Value>) -> BTreeMap<String, Dependency> {
    let Some(Value::Object(map)) = value else {
        return BTreeMap::new();
    };
    map.iter()
        .map(|(id, entry)| {
            let dependency = match entry {
                Value::Object(inner) => Dependency {
                    license_type: text(inner, "licenseType"),
                    dependencies: dependencies(inner.get("dependencies")),
                },
                _ => Dependency::default(),
            };
            (id.clone(), dependency)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const FULL: &str = r#"{
        "licenseType": "CC BY",
        "creatorName": "Alice",
        "packageName": "MyScene",
        "description": "A scene",
        "credits": "Thanks Bob",
        "instructions": "Load it",
        "promotionalLink": "https://example.com/alice",
        "programVersion": "1.20.0.10",
        "contentList": ["Saves/scene/MyScene.json", "Saves/scene/MyScene.jpg"],
        "dependencies": {
            "Bob.Outfit.2": {
                "licenseType": "FC",
                "dependencies": { "Carol.Hair.1": { "licenseType": "PC" } }
            }
        },
        "hadReferenceIssues": "true",
        "referenceIssues": ["missing Dan.Morphs.latest"]
    }"#;

    #[test]
    fn test_full_manifest() {
        let manifest = Manifest::from_slice(FULL.as_bytes()).unwrap();
        assert_eq!(manifest.license_type.as_deref(), Some("CC BY"));
        assert_eq!(manifest.creator_name.as_deref(), Some("Alice"));
        assert_eq!(manifest.package_name.as_deref(), Some("MyScene"));
        assert_eq!(manifest.description.as_deref(), Some("A scene"));
        assert_eq!(manifest.credits.as_deref(), Some("Thanks Bob"));
        assert_eq!(manifest.instructions.as_deref(), Some("Load it"));
        assert_eq!(manifest.promotional_link.as_deref(), Some("https://example.com/alice"));
        assert_eq!(manifest.program_version.as_deref(), Some("1.20.0.10"));
        assert_eq!(manifest.content_list.len(), 2);
        assert!(manifest.had_reference_issues);
        assert_eq!(manifest.reference_issues, vec!["missing Dan.Morphs.latest"]);
        let outfit = &manifest.dependencies["Bob.Outfit.2"];
        assert_eq!(outfit.license_type.as_deref(), Some("FC"));
        assert_eq!(outfit.dependencies["Carol.Hair.1"].license_type.as_deref(), Some("PC"));
    }

    #[test]
    fn test_dependencies_serialize_compactly() {
        let manifest = Manifest::from_slice(FULL.as_bytes()).unwrap();
        assert_eq!(
            serde_json::to_string(&manifest.dependencies).unwrap(),
            r#"{"Bob.Outfit.2":{"licenseType":"FC","dependencies":{"Carol.Hair.1":{"licenseType":"PC"}}}}"#
        );
    }

    #[test]
    fn test_empty_object_is_valid() {
        let manifest = Manifest::from_slice(b"{}").unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_wrong_types_become_absent() {
        let manifest = Manifest::from_slice(
            br#"{"description": ["x"], "programVersion": 1.2, "contentList": ["a.json", 3, null, "b.jpg"], "dependencies": [], "hadReferenceIssues": 1}"#,
        )
        .unwrap();
        assert_eq!(manifest.description, None);
        assert_eq!(manifest.program_version, None);
        assert_eq!(manifest.content_list, vec!["a.json", "b.jpg"]);
        assert!(manifest.dependencies.is_empty());
        assert!(!manifest.had_reference_issues);
    }

    #[test]
    fn test_content_list_not_an_array() {
        let manifest = Manifest::from_slice(br#"{"contentList": "Saves/scene/a.json"}"#).unwrap();
        assert!(manifest.content_list.is_empty());
    }

    #[rstest]
    #[case(br#"{"hadReferenceIssues": true}"#, true)]
    #[case(br#"{"hadReferenceIssues": "true"}"#, true)]
    #[case(br#"{"hadReferenceIssues": "false"}"#, false)]
    #[case(br#"{"hadReferenceIssues": false}"#, false)]
    #[case(br#"{}"#, false)]
    fn test_reference_issue_flag(#[case] input: &[u8], #[case] expected: bool) {
        assert_eq!(Manifest::from_slice(input).unwrap().had_reference_issues, expected);
    }

    #[test]
    fn test_byte_order_mark_is_skipped() {
        let manifest = Manifest::from_slice(b"\xEF\xBB\xBF{\"credits\": \"me\"}").unwrap();
        assert_eq!(manifest.credits.as_deref(), Some("me"));
    }

    #[rstest]
    #[case(b"")]
    #[case(b"  \n\t")]
    fn test_blank_is_missing(#[case] input: &[u8]) {
        let err = Manifest::from_slice(input).unwrap_err();
        assert_eq!(*err, ErrorKind::ManifestMissing);
    }

    #[rstest]
    #[case(b"{not json")]
    #[case(b"[1, 2, 3]")]
    #[case(b"\"meta\"")]
    #[case(b"null")]
    fn test_invalid(#[case] input: &[u8]) {
        let err = Manifest::from_slice(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::ManifestInvalid(_)));
    }
}
