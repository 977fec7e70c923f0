//! Content-type classification from manifest content paths.

use crate::consts::{CLASSIFY_MAX_ENTRIES, extension, normalize_entry_path};
use crate::manifest::Manifest;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Kind of content a package carries.
///
/// The numeric ids are what gets persisted and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    AddonPackage,
    Appearance,
    AssetBundle,
    Clothing,
    Favorite,
    Hair,
    LegacyScene,
    Manifest,
    Morph,
    Pose,
    Preset,
    Scene,
    Script,
}
impl ContentType {
    pub const ALL: [ContentType; 13] = [
        Self::AddonPackage,
        Self::Appearance,
        Self::AssetBundle,
        Self::Clothing,
        Self::Favorite,
        Self::Hair,
        Self::LegacyScene,
        Self::Manifest,
        Self::Morph,
        Self::Pose,
        Self::Preset,
        Self::Scene,
        Self::Script,
    ];

    pub fn id(&self) -> i64 {
        match self {
            Self::AddonPackage => 1,
            Self::Appearance => 2,
            Self::AssetBundle => 3,
            Self::Clothing => 4,
            Self::Favorite => 5,
            Self::Hair => 6,
            Self::LegacyScene => 7,
            Self::Manifest => 8,
            Self::Morph => 9,
            Self::Pose => 10,
            Self::Preset => 11,
            Self::Scene => 12,
            Self::Script => 13,
        }
    }

    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AddonPackage => "Addon Package",
            Self::Appearance => "Appearance",
            Self::AssetBundle => "Asset Bundle",
            Self::Clothing => "Clothing",
            Self::Favorite => "Favorite",
            Self::Hair => "Hair",
            Self::LegacyScene => "Legacy Scene",
            Self::Manifest => "Manifest",
            Self::Morph => "Morph",
            Self::Pose => "Pose",
            Self::Preset => "Preset",
            Self::Scene => "Scene",
            Self::Script => "Script",
        }
    }
}
impl Display for ContentType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// One classification rule. Paths are already normalized to forward slashes.
struct Rule {
    content_type: ContentType,
    matches: fn(&str) -> bool,
}

/// Evaluated top to bottom; the first rule that matches wins.
const RULES: &[Rule] = &[
    Rule {
        content_type: ContentType::AssetBundle,
        matches: |path| path.contains("Custom/Assets") && extension(path).as_deref() == Some("assetbundle"),
    },
    Rule {
        content_type: ContentType::Clothing,
        matches: |path| path.contains("Custom/Clothing"),
    },
    Rule {
        content_type: ContentType::Pose,
        matches: |path| path.contains("Custom/Atom/Person/Pose"),
    },
    Rule {
        content_type: ContentType::Scene,
        matches: |path| path.contains("Saves/scene"),
    },
    Rule {
        content_type: ContentType::Script,
        matches: |path| path.contains("Custom/Scripts"),
    },
];

/// Infer what a package contains from the first few entries of its content
/// list.
///
/// Only the first three entries are looked at, so a package whose telling
/// entry comes later stays unclassified.
///
/// # Examples
///
/// ```
/// use varstash_package::{ContentType, Manifest, classify};
///
/// let manifest = Manifest {
///     content_list: vec!["Custom\\Scripts\\Alice\\Tool.cs".to_string()],
///     ..Default::default()
/// };
/// assert_eq!(classify(&manifest), Some(ContentType::Script));
/// assert_eq!(classify(&Manifest::default()), None);
/// ```
pub fn classify(manifest: &Manifest) -> Option<ContentType> {
    manifest.content_list.iter().take(CLASSIFY_MAX_ENTRIES).find_map(|entry| {
        let path = normalize_entry_path(entry);
        RULES.iter().find(|rule| (rule.matches)(&path)).map(|rule| rule.content_type)
    })
}
