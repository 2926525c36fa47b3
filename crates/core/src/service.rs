//! Product operations.
//!
//! [`ProductService`] ties the store and the upload directory together. Every mutating
//! operation follows the same sequence:
//!
//! 1. load the product (`NotFound` before anything changes)
//! 2. compute the next image list with [`crate::images`]
//! 3. persist the record
//! 4. remove the files that left the list, collecting failures as warnings
//!
//! Files are removed only after the record no longer references them. When an operation fails,
//! the images uploaded for it are discarded so they are not left unreferenced on disk.

use crate::config::CoreConfig;
use crate::images::{self, ImageChange, Replacement};
use crate::product::{NewProduct, Product, ProductFields, ProductUpdate};
use crate::store::{JsonProductStore, ProductStore};
use crate::{CatalogError, CatalogResult, ProductId};
use catalog_files::{ImageFiles, RemovalWarning, StoredImage};
use chrono::Utc;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A successfully persisted change plus any files that could not be removed.
#[derive(Debug, Clone)]
pub struct Mutation {
    pub product: Product,
    pub warnings: Vec<RemovalWarning>,
}

/// Result of a batch replace: the mutation and what happened to each pair.
#[derive(Debug, Clone)]
pub struct BatchReplace {
    pub mutation: Mutation,
    pub replacements: Vec<Replacement>,
}

/// Result of removing unreferenced image files.
#[derive(Debug, Clone, Default)]
pub struct OrphanPrune {
    pub removed: Vec<String>,
    pub warnings: Vec<RemovalWarning>,
}

#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn ProductStore>,
    files: ImageFiles,
}

impl ProductService {
    /// Creates a service backed by [`JsonProductStore`] and the configured upload directory.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Files`] if the upload directory is unusable.
    pub fn new(cfg: Arc<CoreConfig>) -> CatalogResult<Self> {
        let files = ImageFiles::new(cfg.upload_dir(), cfg.max_file_size())?;
        Ok(Self::with_store(Arc::new(JsonProductStore::new(cfg)), files))
    }

    pub fn with_store(store: Arc<dyn ProductStore>, files: ImageFiles) -> Self {
        Self { store, files }
    }

    pub fn files(&self) -> &ImageFiles {
        &self.files
    }

    /// Creates a product whose images are exactly the uploaded files, in upload order.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::InvalidInput`] for missing or malformed fields
    /// - [`CatalogError::Conflict`] if the name is taken
    pub fn add(&self, fields: &ProductFields, uploads: Vec<StoredImage>) -> CatalogResult<Product> {
        self.discard_on_error(&uploads, || {
            let new = NewProduct::parse(fields)?;

            if self.store.find_by_name(new.product_name.as_str())?.is_some() {
                return Err(CatalogError::Conflict(new.product_name.to_string()));
            }

            let product = self.store.create(new, upload_paths(&uploads))?;
            tracing::info!(id = %product.id, name = %product.product_name, images = product.images.len(), "product created");
            Ok(product)
        })
    }

    pub fn list(&self) -> CatalogResult<Vec<Product>> {
        self.store.find_all()
    }

    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] for unknown or malformed ids.
    pub fn get(&self, id: &str) -> CatalogResult<Product> {
        self.load(id)
    }

    /// Merges the present fields and, if files were uploaded, replaces every image.
    pub fn update(
        &self,
        id: &str,
        fields: &ProductFields,
        uploads: Vec<StoredImage>,
    ) -> CatalogResult<Mutation> {
        self.discard_on_error(&uploads, || {
            let update = ProductUpdate::parse(fields)?;
            let product = self.load(id)?;
            let change = images::replace_all(&product.images, &upload_paths(&uploads));
            self.commit(product, update, change)
        })
    }

    /// Removes every image file of the product, then the record.
    ///
    /// Returns warnings for files that could not be removed.
    pub fn delete(&self, id: &str) -> CatalogResult<Vec<RemovalWarning>> {
        let product = self.load(id)?;
        let warnings = self.files.remove_all(&product.images);

        if !self.store.delete(&product.id)? {
            return Err(CatalogError::NotFound(id.to_string()));
        }

        tracing::info!(id = %product.id, removed_images = product.images.len(), "product deleted");
        Ok(warnings)
    }

    /// Appends the uploaded images after the existing ones, also merging any present fields.
    pub fn append_images(
        &self,
        id: &str,
        fields: &ProductFields,
        uploads: Vec<StoredImage>,
    ) -> CatalogResult<Mutation> {
        self.discard_on_error(&uploads, || {
            let update = ProductUpdate::parse(fields)?;
            let product = self.load(id)?;
            let change = images::append(&product.images, &upload_paths(&uploads));
            self.commit(product, update, change)
        })
    }

    /// Replaces the image at `index`.
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidIndex`] unless `0 <= index < images.len()`.
    pub fn replace_image(
        &self,
        id: &str,
        index: i64,
        upload: StoredImage,
    ) -> CatalogResult<Mutation> {
        let uploads = [upload];
        self.discard_on_error(&uploads, || {
            let product = self.load(id)?;
            let change = images::replace_at(&product.images, index, uploads[0].path.clone())?;
            self.commit(product, ProductUpdate::default(), change)
        })
    }

    /// Replaces the image at each `indexes[i]` with `uploads[i]`, skipping out-of-range pairs.
    ///
    /// Uploads belonging to skipped pairs are removed along with the replaced files.
    ///
    /// # Errors
    ///
    /// [`CatalogError::CountMismatch`] if the counts differ; nothing changes in that case.
    pub fn replace_images(
        &self,
        id: &str,
        indexes: &[i64],
        uploads: Vec<StoredImage>,
    ) -> CatalogResult<BatchReplace> {
        self.discard_on_error(&uploads, || {
            let product = self.load(id)?;
            let (mut change, replacements) =
                images::replace_at_indexes(&product.images, indexes, &upload_paths(&uploads))?;

            let skipped = replacements.iter().filter(|r| !r.is_applied());
            change.to_delete.extend(skipped.map(|r| r.path.clone()));

            if replacements.iter().any(|r| !r.is_applied()) {
                tracing::info!(
                    id = %product.id,
                    skipped = replacements.iter().filter(|r| !r.is_applied()).count(),
                    "batch replace skipped out-of-range indexes"
                );
            }

            let mutation = self.commit(product, ProductUpdate::default(), change)?;
            Ok(BatchReplace {
                mutation,
                replacements,
            })
        })
    }

    /// Deletes the image at `index`; later images shift down by one.
    ///
    /// # Errors
    ///
    /// [`CatalogError::InvalidIndex`] unless `0 <= index < images.len()`.
    pub fn delete_image(&self, id: &str, index: i64) -> CatalogResult<Mutation> {
        let product = self.load(id)?;
        let change = images::delete_at(&product.images, index)?;
        self.commit(product, ProductUpdate::default(), change)
    }

    /// Image files in the upload directory that no product references.
    ///
    /// Files are matched by filename, so records written under a different upload directory
    /// path still count as references.
    pub fn orphaned_images(&self) -> CatalogResult<Vec<PathBuf>> {
        let referenced: HashSet<OsString> = self
            .list()?
            .iter()
            .flat_map(|product| product.images.iter())
            .filter_map(|image| Path::new(image).file_name().map(|name| name.to_os_string()))
            .collect();

        Ok(self
            .files
            .list()?
            .into_iter()
            .filter(|path| path.file_name().is_some_and(|name| !referenced.contains(name)))
            .collect())
    }

    /// Removes every orphaned image file.
    ///
    /// Uploads of requests still in flight are indistinguishable from orphans, so run this
    /// while the server is stopped.
    pub fn prune_orphans(&self) -> CatalogResult<OrphanPrune> {
        let paths: Vec<String> = self
            .orphaned_images()?
            .iter()
            .map(|path| path.to_string_lossy().into_owned())
            .collect();

        let warnings = self.files.remove_all(&paths);
        let removed: Vec<String> = paths
            .into_iter()
            .filter(|path| !warnings.iter().any(|w| &w.path == path))
            .collect();

        tracing::info!(removed = removed.len(), failed = warnings.len(), "pruned orphaned images");
        Ok(OrphanPrune { removed, warnings })
    }

    fn load(&self, id: &str) -> CatalogResult<Product> {
        let not_found = || CatalogError::NotFound(id.to_string());
        let parsed = ProductId::parse(id).map_err(|_| not_found())?;
        self.store.find_by_id(&parsed)?.ok_or_else(not_found)
    }

    fn commit(
        &self,
        mut product: Product,
        update: ProductUpdate,
        change: ImageChange,
    ) -> CatalogResult<Mutation> {
        update.apply_to(&mut product);
        product.images = change.images;
        product.updated_at = Utc::now();

        let id = product.id.to_string();
        let product = self
            .store
            .update(product)?
            .ok_or(CatalogError::NotFound(id))?;

        let warnings = self.files.remove_all(&change.to_delete);
        Ok(Mutation { product, warnings })
    }

    fn discard_on_error<T>(
        &self,
        uploads: &[StoredImage],
        op: impl FnOnce() -> CatalogResult<T>,
    ) -> CatalogResult<T> {
        let result = op();
        if result.is_err() && !uploads.is_empty() {
            self.files.discard(uploads);
        }
        result
    }
}

fn upload_paths(uploads: &[StoredImage]) -> Vec<String> {
    uploads.iter().map(|upload| upload.path.clone()).collect()
}
