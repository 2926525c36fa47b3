//! Image collection bookkeeping.
//!
//! Every function here is pure: it takes a product's current image paths plus the requested
//! mutation and returns an [`ImageChange`] holding the next list and the paths whose files must
//! be removed. Nothing touches the filesystem, so the caller decides when removal happens
//! relative to persisting the record.
//!
//! Single-slot operations ([`replace_at`], [`delete_at`]) fail on an out-of-range index.
//! [`replace_at_indexes`] is lenient instead: out-of-range pairs are skipped and reported in
//! the returned [`Replacement`] list.

use crate::{CatalogError, CatalogResult};

/// Result of an image mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageChange {
    /// Image paths after the mutation, in display order.
    pub images: Vec<String>,
    /// Paths that left the list and whose files must be removed.
    pub to_delete: Vec<String>,
}

impl ImageChange {
    fn unchanged(current: &[String]) -> Self {
        Self {
            images: current.to_vec(),
            to_delete: Vec::new(),
        }
    }
}

/// Outcome of one `(index, path)` pair in a batch replace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub index: i64,
    pub path: String,
    pub status: ReplacementStatus,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplacementStatus {
    /// The slot was overwritten; `replaced` is the path it held at that moment.
    Applied { replaced: String },
    /// The index was outside the list; nothing changed for this pair.
    Skipped,
}

impl Replacement {
    pub fn is_applied(&self) -> bool {
        matches!(self.status, ReplacementStatus::Applied { .. })
    }
}

/// `current ++ new`. Nothing is deleted.
pub fn append(current: &[String], new: &[String]) -> ImageChange {
    let mut images = Vec::with_capacity(current.len() + new.len());
    images.extend_from_slice(current);
    images.extend_from_slice(new);

    ImageChange {
        images,
        to_delete: Vec::new(),
    }
}

/// All-or-nothing replace: a non-empty `new` replaces the whole list and every current path is
/// deleted. An empty `new` leaves the list untouched.
pub fn replace_all(current: &[String], new: &[String]) -> ImageChange {
    if new.is_empty() {
        return ImageChange::unchanged(current);
    }

    ImageChange {
        images: new.to_vec(),
        to_delete: current.to_vec(),
    }
}

/// Overwrites the slot at `index` with `path`.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidIndex`] unless `0 <= index < current.len()`.
pub fn replace_at(current: &[String], index: i64, path: String) -> CatalogResult<ImageChange> {
    let slot = checked_index(current, index)?;

    let mut images = current.to_vec();
    let replaced = std::mem::replace(&mut images[slot], path);

    Ok(ImageChange {
        images,
        to_delete: vec![replaced],
    })
}

/// Applies `(indexes[i], paths[i])` pairs in input order.
///
/// Out-of-range pairs are skipped. With duplicate indexes the last pair wins and each applied
/// pair deletes whatever the slot held when it was applied.
///
/// # Errors
///
/// Returns [`CatalogError::CountMismatch`] if the two slices differ in length; nothing is
/// applied in that case.
pub fn replace_at_indexes(
    current: &[String],
    indexes: &[i64],
    paths: &[String],
) -> CatalogResult<(ImageChange, Vec<Replacement>)> {
    if indexes.len() != paths.len() {
        return Err(CatalogError::CountMismatch {
            indexes: indexes.len(),
            files: paths.len(),
        });
    }

    let mut images = current.to_vec();
    let mut to_delete = Vec::new();
    let mut replacements = Vec::with_capacity(indexes.len());

    for (&index, path) in indexes.iter().zip(paths) {
        let status = match checked_index(&images, index) {
            Ok(slot) => {
                let replaced = std::mem::replace(&mut images[slot], path.clone());
                to_delete.push(replaced.clone());
                ReplacementStatus::Applied { replaced }
            }
            Err(_) => ReplacementStatus::Skipped,
        };

        replacements.push(Replacement {
            index,
            path: path.clone(),
            status,
        });
    }

    Ok((ImageChange { images, to_delete }, replacements))
}

/// Removes the slot at `index`; later images shift down by one.
///
/// # Errors
///
/// Returns [`CatalogError::InvalidIndex`] unless `0 <= index < current.len()`.
pub fn delete_at(current: &[String], index: i64) -> CatalogResult<ImageChange> {
    let slot = checked_index(current, index)?;

    let mut images = current.to_vec();
    let removed = images.remove(slot);

    Ok(ImageChange {
        images,
        to_delete: vec![removed],
    })
}

fn checked_index(images: &[String], index: i64) -> CatalogResult<usize> {
    usize::try_from(index)
        .ok()
        .filter(|&slot| slot < images.len())
        .ok_or(CatalogError::InvalidIndex {
            index,
            len: images.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_append_preserves_order() {
        let change = append(&paths(&["p0", "p1"]), &paths(&["n0", "n1"]));

        assert_eq!(change.images, paths(&["p0", "p1", "n0", "n1"]));
        assert!(change.to_delete.is_empty());
    }

    #[test]
    fn test_append_to_empty_and_nothing() {
        assert_eq!(append(&[], &paths(&["n0"])).images, paths(&["n0"]));
        assert_eq!(append(&paths(&["p0"]), &[]).images, paths(&["p0"]));
    }

    #[test]
    fn test_replace_all_with_new_files() {
        let change = replace_all(&paths(&["p0", "p1"]), &paths(&["n0"]));

        assert_eq!(change.images, paths(&["n0"]));
        assert_eq!(change.to_delete, paths(&["p0", "p1"]));
    }

    #[test]
    fn test_replace_all_without_new_files_is_noop() {
        let current = paths(&["p0", "p1"]);
        let change = replace_all(&current, &[]);

        assert_eq!(change.images, current);
        assert!(change.to_delete.is_empty());
    }

    #[test]
    fn test_replace_all_on_empty_list_deletes_nothing() {
        let change = replace_all(&[], &paths(&["n0", "n1"]));

        assert_eq!(change.images, paths(&["n0", "n1"]));
        assert!(change.to_delete.is_empty());
    }

    #[test]
    fn test_replace_at_overwrites_single_slot() {
        let change = replace_at(&paths(&["p0", "p1", "p2"]), 1, "n".into()).unwrap();

        assert_eq!(change.images, paths(&["p0", "n", "p2"]));
        assert_eq!(change.to_delete, paths(&["p1"]));
    }

    #[test]
    fn test_replace_at_rejects_out_of_range() {
        let current = paths(&["p0", "p1"]);

        for index in [-1, 2, 100] {
            let err = replace_at(&current, index, "n".into()).expect_err("should fail");
            assert!(matches!(
                err,
                CatalogError::InvalidIndex { index: i, len: 2 } if i == index
            ));
        }
    }

    #[test]
    fn test_replace_at_on_empty_list_fails() {
        assert!(replace_at(&[], 0, "n".into()).is_err());
    }

    #[test]
    fn test_replace_at_indexes_example() {
        let (change, replacements) = replace_at_indexes(
            &paths(&["p0", "p1", "p2"]),
            &[2, 0],
            &paths(&["fa", "fb"]),
        )
        .unwrap();

        assert_eq!(change.images, paths(&["fb", "p1", "fa"]));
        assert_eq!(change.to_delete, paths(&["p2", "p0"]));
        assert!(replacements.iter().all(Replacement::is_applied));
    }

    #[test]
    fn test_replace_at_indexes_count_mismatch() {
        let err = replace_at_indexes(&paths(&["p0"]), &[0, 1], &paths(&["fa"]))
            .expect_err("should fail");

        assert!(matches!(
            err,
            CatalogError::CountMismatch {
                indexes: 2,
                files: 1
            }
        ));
    }

    #[test]
    fn test_replace_at_indexes_skips_out_of_range() {
        let (change, replacements) = replace_at_indexes(
            &paths(&["p0", "p1"]),
            &[5, 1, -1],
            &paths(&["fa", "fb", "fc"]),
        )
        .unwrap();

        assert_eq!(change.images, paths(&["p0", "fb"]));
        assert_eq!(change.to_delete, paths(&["p1"]));
        assert_eq!(
            replacements
                .iter()
                .map(|r| (r.index, r.status.clone()))
                .collect::<Vec<_>>(),
            vec![
                (5, ReplacementStatus::Skipped),
                (
                    1,
                    ReplacementStatus::Applied {
                        replaced: "p1".into()
                    }
                ),
                (-1, ReplacementStatus::Skipped),
            ]
        );
    }

    #[test]
    fn test_replace_at_indexes_duplicate_index_last_wins() {
        let (change, _) =
            replace_at_indexes(&paths(&["p0", "p1"]), &[0, 0], &paths(&["fa", "fb"])).unwrap();

        assert_eq!(change.images, paths(&["fb", "p1"]));
        assert_eq!(change.to_delete, paths(&["p0", "fa"]));
    }

    #[test]
    fn test_replace_at_indexes_empty_batch() {
        let (change, replacements) = replace_at_indexes(&paths(&["p0"]), &[], &[]).unwrap();

        assert_eq!(change.images, paths(&["p0"]));
        assert!(change.to_delete.is_empty());
        assert!(replacements.is_empty());
    }

    #[test]
    fn test_delete_at_shifts_following_images() {
        let change = delete_at(&paths(&["p0", "p1", "p2"]), 0).unwrap();

        assert_eq!(change.images, paths(&["p1", "p2"]));
        assert_eq!(change.to_delete, paths(&["p0"]));
    }

    #[test]
    fn test_delete_at_twice_targets_shifted_list() {
        let first = delete_at(&paths(&["p0", "p1"]), 0).unwrap();
        let second = delete_at(&first.images, 0).unwrap();

        assert_eq!(second.to_delete, paths(&["p1"]));
        assert!(second.images.is_empty());
    }

    #[test]
    fn test_delete_at_rejects_out_of_range() {
        let err = delete_at(&paths(&["p0"]), 1).expect_err("should fail");
        assert!(matches!(err, CatalogError::InvalidIndex { index: 1, len: 1 }));

        assert!(delete_at(&paths(&["p0"]), -1).is_err());
    }
}
