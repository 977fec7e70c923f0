mod row;

pub(crate) use self::row::{CreatorRow, ImageRow, PackageRow, dependencies_to_json, timestamp};
use std::collections::BTreeMap;
use time::UtcDateTime;
use uuid::Uuid;
use varstash_package::{ContentType, Dependency};

/// A package author, identified by the name in the package file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Creator {
    pub id: Uuid,
    pub name: String,
}

/// The `.var` file a package was imported from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFile {
    pub path: String,
    pub name: String,
    pub size: u64,
    /// When the package was imported.
    pub created_at: UtcDateTime,
    /// When the file was created on disk.
    pub birthtime: UtcDateTime,
}

/// A preview image saved for a package. Higher `sort` ranks first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageImage {
    pub id: Uuid,
    /// Relative to the image store root, e.g. `Alice/myscene.jpg`.
    pub path: String,
    pub sort: i32,
}

/// A package as recorded in the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedPackage {
    /// `Creator.Package.Version`
    pub id: String,
    pub version: u32,
    pub description: Option<String>,
    pub package_type: Option<ContentType>,
    pub credits: Option<String>,
    pub has_reference_issues: bool,
    pub license_type: Option<String>,
    pub instructions: Option<String>,
    pub promotional_link: Option<String>,
    pub dependencies: BTreeMap<String, Dependency>,
    pub creator: Creator,
    pub file: PackageFile,
    /// Highest sort weight first.
    pub images: Vec<PackageImage>,
}
impl ImportedPackage {
    /// The image to show first, if any were saved.
    pub fn primary_image(&self) -> Option<&PackageImage> {
        self.images.first()
    }
}

/// File details captured when the package was listed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPackageFile {
    pub path: String,
    pub name: String,
    pub size: u64,
    pub birthtime: UtcDateTime,
}

/// Everything needed to record a newly imported package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPackage {
    pub id: String,
    pub version: u32,
    pub creator_name: String,
    pub description: Option<String>,
    pub package_type: Option<ContentType>,
    pub credits: Option<String>,
    pub has_reference_issues: bool,
    pub license_type: Option<String>,
    pub instructions: Option<String>,
    pub promotional_link: Option<String>,
    pub dependencies: BTreeMap<String, Dependency>,
    pub file: NewPackageFile,
    pub images: Vec<PackageImage>,
}

/// Page of results for [`Repository::find_many`](crate::Repository::find_many).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub take: u32,
    pub skip: u32,
}
impl Default for Pagination {
    fn default() -> Self {
        Self { take: 20, skip: 0 }
    }
}
