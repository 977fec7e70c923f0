//! Repository for packages and everything hanging off them.
//!
//! A package, its file record, its creator link and its images are written
//! together in one transaction: a package is either fully recorded or not at
//! all. Separate packages are independent of each other.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{
    Creator, CreatorRow, ImageRow, ImportedPackage, NewPackage, PackageFile, PackageRow, Pagination, dependencies_to_json,
    timestamp,
};
use exn::ResultExt;
use sqlx::{SqliteConnection, SqlitePool};
use time::UtcDateTime;
use tracing::instrument;
use uuid::Uuid;

/// Repository for imported packages.
///
/// # Relationships
///
/// - Many packages can share a creator; creators are never deleted.
/// - Deleting a package cascades to its file record and image rows, but not
///   to image files on disk. Those belong to whoever owns the image store.
#[derive(Debug, Clone)]
pub struct Repository {
    pool: SqlitePool,
}
impl From<&Database> for Repository {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // =========================================================================
    // Insert
    // =========================================================================

    /// Record a newly imported package.
    ///
    /// The creator is looked up by name and created if missing. Fails with
    /// [`ErrorKind::Database`] if a package with the same id (or a file with
    /// the same path) is already recorded; nothing is written in that case.
    #[instrument(skip_all, fields(id = %package.id))]
    pub async fn create(&self, package: &NewPackage) -> Result<ImportedPackage> {
        // Stored with second precision, so drop the rest now to hand back
        // exactly what a later read would return.
        let imported_at = timestamp(UtcDateTime::now().unix_timestamp(), "import time")?;
        let dependencies = dependencies_to_json(&package.dependencies)?;
        let size = i64::try_from(package.file.size).or_raise(|| ErrorKind::InvalidData("file size"))?;

        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let creator = Self::get_or_create_creator(&mut tx, &package.creator_name).await?;
        sqlx::query(include_str!("../queries/insert_package.sql"))
            .bind(package.id.as_str())
            .bind(i64::from(package.version))
            .bind(package.description.as_deref())
            .bind(package.package_type.map(|t| t.id()))
            .bind(package.credits.as_deref())
            .bind(package.has_reference_issues)
            .bind(package.license_type.as_deref())
            .bind(package.instructions.as_deref())
            .bind(package.promotional_link.as_deref())
            .bind(dependencies.as_str())
            .bind(creator.id.to_string())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/insert_package_file.sql"))
            .bind(package.id.as_str())
            .bind(package.file.path.as_str())
            .bind(package.file.name.as_str())
            .bind(size)
            .bind(imported_at.unix_timestamp())
            .bind(package.file.birthtime.unix_timestamp())
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        for image in &package.images {
            sqlx::query(include_str!("../queries/insert_package_image.sql"))
                .bind(image.id.to_string())
                .bind(package.id.as_str())
                .bind(image.path.as_str())
                .bind(image.sort)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;

        let mut images = package.images.clone();
        images.sort_by(|a, b| b.sort.cmp(&a.sort).then_with(|| a.path.cmp(&b.path)));
        Ok(ImportedPackage {
            id: package.id.clone(),
            version: package.version,
            description: package.description.clone(),
            package_type: package.package_type,
            credits: package.credits.clone(),
            has_reference_issues: package.has_reference_issues,
            license_type: package.license_type.clone(),
            instructions: package.instructions.clone(),
            promotional_link: package.promotional_link.clone(),
            dependencies: package.dependencies.clone(),
            creator,
            file: PackageFile {
                path: package.file.path.clone(),
                name: package.file.name.clone(),
                size: package.file.size,
                created_at: imported_at,
                birthtime: timestamp(package.file.birthtime.unix_timestamp(), "file birthtime")?,
            },
            images,
        })
    }

    async fn get_or_create_creator(conn: &mut SqliteConnection, name: &str) -> Result<Creator> {
        sqlx::query(include_str!("../queries/insert_creator.sql"))
            .bind(Uuid::new_v4().to_string())
            .bind(name)
            .execute(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let row: CreatorRow = sqlx::query_as(include_str!("../queries/get_creator_by_name.sql"))
            .bind(name)
            .fetch_one(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.try_into()
    }

    // =========================================================================
    // Get/Fetch
    // =========================================================================

    /// Paths of every package file recorded so far.
    pub async fn find_existing_paths(&self) -> Result<Vec<String>> {
        sqlx::query_scalar(include_str!("../queries/find_existing_paths.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Whether a package with this id has been recorded.
    pub async fn exists(&self, id: &str) -> Result<bool> {
        sqlx::query_scalar(include_str!("../queries/package_exists.sql"))
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Get a package by id.
    pub async fn get(&self, id: &str) -> Result<Option<ImportedPackage>> {
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        Self::load(&mut conn, id).await
    }

    async fn load(conn: &mut SqliteConnection, id: &str) -> Result<Option<ImportedPackage>> {
        let row: Option<PackageRow> = sqlx::query_as(include_str!("../queries/get_package.sql"))
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let images = Self::images(&mut *conn, row.id()).await?;
        Ok(Some((row, images).try_into()?))
    }

    async fn images(conn: &mut SqliteConnection, id: &str) -> Result<Vec<ImageRow>> {
        sqlx::query_as(include_str!("../queries/list_images_for_package.sql"))
            .bind(id)
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Number of image rows pointing at the given stored image path.
    pub async fn count_image_references(&self, path: &str) -> Result<u64> {
        let count: i64 = sqlx::query_scalar(include_str!("../queries/count_image_references.sql"))
            .bind(path)
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u64::try_from(count).or_raise(|| ErrorKind::InvalidData("image reference count"))
    }

    // =========================================================================
    // Listing
    // =========================================================================

    /// A page of packages, most recently imported first.
    pub async fn find_many(&self, page: Pagination) -> Result<Vec<ImportedPackage>> {
        let mut conn = self.pool.acquire().await.or_raise(|| ErrorKind::Database)?;
        let rows: Vec<PackageRow> = sqlx::query_as(include_str!("../queries/list_packages.sql"))
            .bind(i64::from(page.take))
            .bind(i64::from(page.skip))
            .fetch_all(&mut *conn)
            .await
            .or_raise(|| ErrorKind::Database)?;
        let mut packages = Vec::with_capacity(rows.len());
        for row in rows {
            let images = Self::images(&mut conn, row.id()).await?;
            packages.push((row, images).try_into()?);
        }
        Ok(packages)
    }

    // =========================================================================
    // Delete
    // =========================================================================

    /// Delete a package along with its file record and image rows.
    ///
    /// Returns the deleted package so the caller can clean up image files,
    /// or `None` if there was nothing to delete.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Option<ImportedPackage>> {
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        let Some(package) = Self::load(&mut tx, id).await? else {
            return Ok(None);
        };
        sqlx::query(include_str!("../queries/delete_package.sql"))
            .bind(id)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(Some(package))
    }
}
