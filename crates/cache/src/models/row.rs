use super::{Creator, ImportedPackage, PackageFile, PackageImage};
use crate::error::{Error, ErrorKind};
use exn::{OptionExt, ResultExt};
use std::collections::BTreeMap;
use time::UtcDateTime;
use uuid::Uuid;
use varstash_package::{ContentType, Dependency};

#[derive(sqlx::FromRow)]
pub(crate) struct CreatorRow {
    pub(crate) id: String,
    pub(crate) name: String,
}
impl TryFrom<CreatorRow> for Creator {
    type Error = Error;
    fn try_from(row: CreatorRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&row.id).or_raise(|| ErrorKind::InvalidData("creator id"))?,
            name: row.name,
        })
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct ImageRow {
    id: String,
    path: String,
    sort: i64,
}
impl TryFrom<ImageRow> for PackageImage {
    type Error = Error;
    fn try_from(row: ImageRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&row.id).or_raise(|| ErrorKind::InvalidData("image id"))?,
            path: row.path,
            sort: i32::try_from(row.sort).or_raise(|| ErrorKind::InvalidData("image sort"))?,
        })
    }
}

/// A package joined with its creator and file.
#[derive(sqlx::FromRow)]
pub(crate) struct PackageRow {
    id: String,
    version: i64,
    description: Option<String>,
    package_type_id: Option<i64>,
    credits: Option<String>,
    has_reference_issues: bool,
    license_type: Option<String>,
    instructions: Option<String>,
    promotional_link: Option<String>,
    dependencies: String,
    #[sqlx(flatten)]
    creator: PrefixedCreator,
    #[sqlx(flatten)]
    file: FileColumns,
}
impl PackageRow {
    pub(crate) fn id(&self) -> &str {
        &self.id
    }
}

#[derive(sqlx::FromRow)]
struct PrefixedCreator {
    creator_id: String,
    creator_name: String,
}

#[derive(sqlx::FromRow)]
struct FileColumns {
    file_path: String,
    file_name: String,
    file_size: i64,
    file_created_at: i64,
    file_birthtime: i64,
}

pub(crate) fn timestamp(value: i64, field: &'static str) -> Result<UtcDateTime, Error> {
    UtcDateTime::from_unix_timestamp(value).or_raise(|| ErrorKind::InvalidData(field))
}

pub(crate) fn dependencies_from_json(json: &str) -> Result<BTreeMap<String, Dependency>, Error> {
    serde_json::from_str(json).or_raise(|| ErrorKind::InvalidData("dependencies"))
}

pub(crate) fn dependencies_to_json(dependencies: &BTreeMap<String, Dependency>) -> Result<String, Error> {
    serde_json::to_string(dependencies).or_raise(|| ErrorKind::InvalidData("dependencies"))
}

impl TryFrom<(PackageRow, Vec<ImageRow>)> for ImportedPackage {
    type Error = Error;
    fn try_from((row, images): (PackageRow, Vec<ImageRow>)) -> Result<Self, Self::Error> {
        let package_type = match row.package_type_id {
            Some(id) => Some(ContentType::from_id(id).ok_or_raise(|| ErrorKind::InvalidData("package type"))?),
            None => None,
        };
        let creator = CreatorRow { id: row.creator.creator_id, name: row.creator.creator_name };
        Ok(Self {
            id: row.id,
            version: u32::try_from(row.version).or_raise(|| ErrorKind::InvalidData("version"))?,
            description: row.description,
            package_type,
            credits: row.credits,
            has_reference_issues: row.has_reference_issues,
            license_type: row.license_type,
            instructions: row.instructions,
            promotional_link: row.promotional_link,
            dependencies: dependencies_from_json(&row.dependencies)?,
            creator: creator.try_into()?,
            file: PackageFile {
                path: row.file.file_path,
                name: row.file.file_name,
                size: u64::try_from(row.file.file_size).or_raise(|| ErrorKind::InvalidData("file size"))?,
                created_at: timestamp(row.file.file_created_at, "file created at")?,
                birthtime: timestamp(row.file.file_birthtime, "file birthtime")?,
            },
            images: images.into_iter().map(PackageImage::try_from).collect::<Result<_, _>>()?,
        })
    }
}
