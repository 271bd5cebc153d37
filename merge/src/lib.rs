//! Layered defaulting.
//!
//! A value built from fallbacks is merged with the value a caller supplied,
//! and whatever the caller set wins. Nothing is mutated in place.
use std::collections::BTreeMap;

pub trait Merge {
    /// Merge another instance into this one.
    ///
    /// Values defined in `other` take precedence over values defined in `self`.
    fn merge(self, other: Self) -> Self;
}

impl<T> Merge for Option<T> {
    #[inline]
    fn merge(self, other: Self) -> Self {
        other.or(self)
    }
}

/// Keys present in both maps take the value from `other`.
impl<K: Ord, V> Merge for BTreeMap<K, V> {
    fn merge(self, other: Self) -> Self {
        let mut merged = self;
        merged.extend(other);
        merged
    }
}
