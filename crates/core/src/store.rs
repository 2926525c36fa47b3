//! Product persistence.
//!
//! [`ProductStore`] is the seam between the service layer and whatever holds the documents. It
//! offers single-document operations only; merging partial updates is the caller's job.
//!
//! ## Storage Layout
//!
//! [`JsonProductStore`] keeps one JSON document per product in a sharded tree, plus a name
//! index used to enforce unique product names:
//!
//! ```text
//! <data_dir>/
//!   products/
//!     <s1>/
//!       <s2>/
//!         <id>/
//!           product.json
//!   names/
//!     <sha256(productName)>     # contains the owning product id
//! ```
//!
//! Name index entries are hard-linked into place fully written, so two concurrent claims of a
//! free name cannot both succeed. An entry stays live while its owner's record directory
//! exists. Replacing a stale entry or releasing one happens under `<sha256>.lock`.

use crate::config::CoreConfig;
use crate::constants::PRODUCT_JSON_FILENAME;
use crate::product::{NewProduct, Product};
use crate::{CatalogError, CatalogResult, NonEmptyText, ProductId};
use chrono::Utc;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Single-collection document store for products.
pub trait ProductStore: Send + Sync {
    /// Inserts a new product and assigns its id.
    ///
    /// Fails with [`CatalogError::Conflict`] if the name is already taken.
    fn create(&self, new: NewProduct, images: Vec<String>) -> CatalogResult<Product>;

    /// Finds the product with exactly this (trimmed) name.
    fn find_by_name(&self, name: &str) -> CatalogResult<Option<Product>>;

    /// Finds a product by id. Unknown ids yield `Ok(None)`.
    fn find_by_id(&self, id: &ProductId) -> CatalogResult<Option<Product>>;

    /// Returns every stored product.
    fn find_all(&self) -> CatalogResult<Vec<Product>>;

    /// Replaces the stored record with `product`. Returns `Ok(None)` if no record has its id.
    fn update(&self, product: Product) -> CatalogResult<Option<Product>>;

    /// Deletes a record. Returns `Ok(false)` if no record has this id.
    fn delete(&self, id: &ProductId) -> CatalogResult<bool>;
}

/// File-backed [`ProductStore`] using a sharded directory tree.
#[derive(Clone, Debug)]
pub struct JsonProductStore {
    cfg: Arc<CoreConfig>,
}

impl JsonProductStore {
    pub fn new(cfg: Arc<CoreConfig>) -> Self {
        Self { cfg }
    }

    fn record_dir(&self, id: &ProductId) -> PathBuf {
        id.sharded_dir(&self.cfg.products_dir())
    }

    fn record_path(&self, id: &ProductId) -> PathBuf {
        self.record_dir(id).join(PRODUCT_JSON_FILENAME)
    }

    fn name_path(&self, name: &NonEmptyText) -> PathBuf {
        let digest = Sha256::digest(name.as_str().as_bytes());
        self.cfg.names_dir().join(hex::encode(digest))
    }

    fn read_record(path: &Path) -> CatalogResult<Product> {
        let contents = fs::read_to_string(path).map_err(CatalogError::FileRead)?;
        serde_json::from_str(&contents).map_err(CatalogError::Deserialization)
    }

    /// Writes via a sibling temp file and rename so readers never observe a partial document.
    fn write_record(&self, product: &Product) -> CatalogResult<()> {
        let path = self.record_path(&product.id);
        let tmp = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(product).map_err(CatalogError::Serialization)?;

        fs::write(&tmp, json).map_err(CatalogError::FileWrite)?;
        fs::rename(&tmp, &path).map_err(CatalogError::FileWrite)
    }

    /// Claims `name` for `id` in the name index.
    ///
    /// The entry is written in full to a private file and hard-linked into place, so it is
    /// never observed empty. An existing entry is live while its owner's record directory
    /// exists; [`ProductStore::create`] makes that directory before claiming. Entries whose
    /// owner is gone are replaced under the name lock.
    fn claim_name(&self, name: &NonEmptyText, id: &ProductId) -> CatalogResult<()> {
        let names_dir = self.cfg.names_dir();
        fs::create_dir_all(&names_dir).map_err(CatalogError::NameIndex)?;
        let path = self.name_path(name);
        let conflict = || CatalogError::Conflict(name.to_string());

        match self.link_entry(&path, id) {
            Ok(()) => return Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
            Err(e) => return Err(CatalogError::NameIndex(e)),
        }

        if !self.is_stale(&path, name, id)? {
            return Ok(());
        }

        // Another request is reclaiming or releasing this name.
        let Some(_lock) = NameLock::try_acquire(&path).map_err(CatalogError::NameIndex)? else {
            return Err(conflict());
        };

        match fs::read_to_string(&path) {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return match self.link_entry(&path, id) {
                    Ok(()) => Ok(()),
                    Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(conflict()),
                    Err(e) => Err(CatalogError::NameIndex(e)),
                };
            }
            Err(e) => return Err(CatalogError::NameIndex(e)),
            Ok(_) => {}
        }

        if !self.is_stale(&path, name, id)? {
            return Ok(());
        }

        tracing::warn!(name = %name, "reclaiming stale name index entry");
        let tmp = self.entry_tmp_path(&path, id);
        fs::write(&tmp, id.to_string()).map_err(CatalogError::NameIndex)?;
        fs::rename(&tmp, &path).map_err(CatalogError::NameIndex)
    }

    /// `Ok(false)` if the entry at `path` is held by `id`, `Ok(true)` if it is missing or its
    /// owner is gone.
    ///
    /// Fails with [`CatalogError::Conflict`] when another live product holds it.
    fn is_stale(&self, path: &Path, name: &NonEmptyText, id: &ProductId) -> CatalogResult<bool> {
        let owner = match fs::read_to_string(path) {
            Ok(owner) => owner,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(true),
            Err(e) => return Err(CatalogError::NameIndex(e)),
        };
        let owner = owner.trim();
        if owner == id.to_string() {
            return Ok(false);
        }

        let live = ProductId::parse(owner)
            .map(|owner| self.record_dir(&owner).is_dir())
            .unwrap_or(false);
        if live {
            return Err(CatalogError::Conflict(name.to_string()));
        }
        Ok(true)
    }

    fn entry_tmp_path(&self, path: &Path, id: &ProductId) -> PathBuf {
        path.with_extension(format!("{id}.tmp"))
    }

    /// Creates the entry at `path` holding `id`. Fails with `AlreadyExists` if one is there.
    fn link_entry(&self, path: &Path, id: &ProductId) -> io::Result<()> {
        let tmp = self.entry_tmp_path(path, id);
        fs::write(&tmp, id.to_string())?;
        let linked = fs::hard_link(&tmp, path);
        let _ = fs::remove_file(&tmp);
        linked
    }

    /// Releases `name` if (and only if) it is held by `id`.
    fn release_name(&self, name: &NonEmptyText, id: &ProductId) -> CatalogResult<()> {
        let path = self.name_path(name);
        let _lock = NameLock::acquire(&path).map_err(CatalogError::NameIndex)?;

        match fs::read_to_string(&path) {
            Ok(owner) if owner.trim() == id.to_string() => match fs::remove_file(&path) {
                Ok(()) => Ok(()),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
                Err(e) => Err(CatalogError::NameIndex(e)),
            },
            Ok(_) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CatalogError::NameIndex(e)),
        }
    }

    /// Allocates a fresh id whose record directory does not exist yet, and creates it.
    fn create_unique_record_dir(&self) -> CatalogResult<(ProductId, PathBuf)> {
        for _attempt in 0..5 {
            let id = ProductId::new();
            let candidate = self.record_dir(&id);

            if candidate.exists() {
                continue;
            }

            if let Some(parent) = candidate.parent() {
                fs::create_dir_all(parent).map_err(CatalogError::ProductDirCreation)?;
            }

            match fs::create_dir(&candidate) {
                Ok(()) => return Ok((id, candidate)),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                Err(e) => return Err(CatalogError::ProductDirCreation(e)),
            }
        }

        Err(CatalogError::ProductDirCreation(io::Error::new(
            ErrorKind::AlreadyExists,
            "failed to allocate a unique product directory after 5 attempts",
        )))
    }
}

/// Exclusive hold on one name index entry, held as `<entry>.lock`.
///
/// Replacing or removing an existing entry happens only under this lock. Creating a missing
/// entry does not need it, since the hard link fails if the entry already exists.
struct NameLock {
    path: PathBuf,
}

impl NameLock {
    const ATTEMPTS: u32 = 50;
    const BACKOFF: Duration = Duration::from_millis(10);

    /// Returns `Ok(None)` if the lock is held elsewhere.
    fn try_acquire(entry: &Path) -> io::Result<Option<Self>> {
        let path = entry.with_extension("lock");
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Some(Self { path })),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Waits briefly for the lock.
    fn acquire(entry: &Path) -> io::Result<Self> {
        for _attempt in 0..Self::ATTEMPTS {
            if let Some(lock) = Self::try_acquire(entry)? {
                return Ok(lock);
            }
            thread::sleep(Self::BACKOFF);
        }

        Err(io::Error::new(
            ErrorKind::WouldBlock,
            format!("name index entry is locked: {}", entry.display()),
        ))
    }
}

impl Drop for NameLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!("failed to remove name lock: {} - {}", self.path.display(), e);
        }
    }
}

impl ProductStore for JsonProductStore {
    fn create(&self, new: NewProduct, images: Vec<String>) -> CatalogResult<Product> {
        let (id, dir) = self.create_unique_record_dir()?;

        if let Err(e) = self.claim_name(&new.product_name, &id) {
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }

        let now = Utc::now();
        let product = Product {
            id,
            product_name: new.product_name,
            description: new.description,
            price: new.price,
            quantity: new.quantity,
            images,
            created_at: now,
            updated_at: now,
        };

        if let Err(e) = self.write_record(&product) {
            let _ = self.release_name(&product.product_name, &product.id);
            let _ = fs::remove_dir_all(&dir);
            return Err(e);
        }

        Ok(product)
    }

    fn find_by_name(&self, name: &str) -> CatalogResult<Option<Product>> {
        let Ok(name) = NonEmptyText::new(name) else {
            return Ok(None);
        };

        let owner = match fs::read_to_string(self.name_path(&name)) {
            Ok(owner) => owner,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CatalogError::NameIndex(e)),
        };

        let Ok(id) = ProductId::parse(owner.trim()) else {
            return Ok(None);
        };

        Ok(self
            .find_by_id(&id)?
            .filter(|product| product.product_name == name))
    }

    fn find_by_id(&self, id: &ProductId) -> CatalogResult<Option<Product>> {
        let path = self.record_path(id);
        if !path.is_file() {
            return Ok(None);
        }
        Self::read_record(&path).map(Some)
    }

    /// Walks `products/<s1>/<s2>/<id>/product.json`.
    ///
    /// Records that cannot be parsed are logged and skipped. Results are ordered by creation
    /// time.
    fn find_all(&self) -> CatalogResult<Vec<Product>> {
        let mut products = Vec::new();

        let s1_iter = match fs::read_dir(self.cfg.products_dir()) {
            Ok(it) => it,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(products),
            Err(e) => return Err(CatalogError::FileRead(e)),
        };

        for s1 in s1_iter.flatten() {
            let s1_path = s1.path();
            if !s1_path.is_dir() {
                continue;
            }

            let Ok(s2_iter) = fs::read_dir(&s1_path) else {
                continue;
            };

            for s2 in s2_iter.flatten() {
                let s2_path = s2.path();
                if !s2_path.is_dir() {
                    continue;
                }

                let Ok(id_iter) = fs::read_dir(&s2_path) else {
                    continue;
                };

                for id_ent in id_iter.flatten() {
                    let record_path = id_ent.path().join(PRODUCT_JSON_FILENAME);
                    if !record_path.is_file() {
                        continue;
                    }

                    match Self::read_record(&record_path) {
                        Ok(product) => products.push(product),
                        Err(e) => {
                            tracing::warn!(
                                "failed to read product record: {} - {}",
                                record_path.display(),
                                e
                            );
                        }
                    }
                }
            }
        }

        products.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.to_string().cmp(&b.id.to_string()))
        });
        Ok(products)
    }

    fn update(&self, product: Product) -> CatalogResult<Option<Product>> {
        let Some(existing) = self.find_by_id(&product.id)? else {
            return Ok(None);
        };

        let renamed = existing.product_name != product.product_name;
        if renamed {
            self.claim_name(&product.product_name, &product.id)?;
        }

        if let Err(e) = self.write_record(&product) {
            if renamed {
                let _ = self.release_name(&product.product_name, &product.id);
            }
            return Err(e);
        }

        if renamed {
            if let Err(e) = self.release_name(&existing.product_name, &product.id) {
                tracing::warn!(
                    id = %product.id,
                    old_name = %existing.product_name,
                    "failed to release old product name: {e}"
                );
            }
        }

        Ok(Some(product))
    }

    fn delete(&self, id: &ProductId) -> CatalogResult<bool> {
        let Some(existing) = self.find_by_id(id)? else {
            return Ok(false);
        };

        fs::remove_dir_all(self.record_dir(id)).map_err(CatalogError::FileRemove)?;
        // The record directory is gone, so a leftover entry is reclaimable.
        if let Err(e) = self.release_name(&existing.product_name, id) {
            tracing::warn!(id = %id, "failed to release product name: {e}");
        }

        Ok(true)
    }
}
