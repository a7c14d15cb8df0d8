//! Display ordering for columns and keys

use crate::error::StructureError;
use crate::structure::key::{compare_keys, Key};
use crate::structure::model::Column;

/// Sort columns by name.
///
/// Every column takes the subject side of some comparison once there are two
/// or more, so an unnamed column fails the whole sort and the slice is left
/// untouched.
pub fn sort_columns(columns: &mut [Column]) -> Result<(), StructureError> {
    if columns.len() < 2 {
        return Ok(());
    }

    if let Some(position) = columns.iter().position(|c| c.name.value().is_none()) {
        return Err(StructureError::InvalidState(format!(
            "column at position {} has no name",
            position
        )));
    }

    columns.sort_by(|a, b| a.name.as_deref().cmp(&b.name.as_deref()));
    Ok(())
}

/// Stable sort by `compare_keys`.
///
/// Insertion sort: placeholder keys make the order non-transitive, which the
/// std sorts are allowed to panic on.
pub fn sort_keys(keys: &mut [Key]) {
    for i in 1..keys.len() {
        let mut j = i;
        while j > 0 && compare_keys(&keys[j - 1], &keys[j]).is_gt() {
            keys.swap(j - 1, j);
            j -= 1;
        }
    }
}
