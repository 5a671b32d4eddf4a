//! Folds a freshly fetched gallery into the stored history.
//!
//! Both lists are newest-first. The newest stored record is the anchor: everything fetched
//! before the first record sharing its date is new, everything from there on is already known.

use crate::gallery::{History, WallpaperRecord};

/// Index in `fresh` of the first record dated like the anchor, if any.
pub fn anchor_position(fresh: &[WallpaperRecord], old: &[WallpaperRecord]) -> Option<usize> {
  let anchor = old.first()?;
  fresh.iter().position(|r| r.date == anchor.date)
}

/// Number of leading records of `fresh` that are newer than the anchor.
/// With no anchor, or an anchor absent from `fresh`, all of them are.
pub fn count_new(fresh: &[WallpaperRecord], old: &[WallpaperRecord]) -> usize {
  anchor_position(fresh, old).unwrap_or(fresh.len())
}

/// `fresh[..count_new] ++ old`. Every record of `old` is kept, in order.
pub fn merge(fresh: &[WallpaperRecord], old: &[WallpaperRecord]) -> History {
  let new_records = count_new(fresh, old);
  fresh[..new_records].iter()
    .chain(old.iter())
    .cloned()
    .collect()
}
