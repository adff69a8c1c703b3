//! Typed column keys.
//!
//! A key names a column of one result set together with the Rust type the
//! caller expects from it. Nullability is part of the key's type:
//! [`ColumnKey`] reads fail on `NULL`, [`NullableColumnKey`] reads yield
//! `Option<V>`.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use crate::query::ResultSetId;

/// Location of a column within a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnId {
    index: usize,
    name: Option<Arc<str>>,
}

impl ColumnId {
    pub fn at(index: usize) -> Self {
        Self { index, name: None }
    }

    pub fn named(index: usize, name: impl Into<Arc<str>>) -> Self {
        Self {
            index,
            name: Some(name.into()),
        }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}

impl fmt::Display for ColumnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{:?}", name),
            None => write!(f, "#{}", self.index),
        }
    }
}

/// Key for a column that must not be `NULL` when read.
pub struct ColumnKey<V> {
    result_set: ResultSetId,
    column: ColumnId,
    _value: PhantomData<fn() -> V>,
}

impl<V> ColumnKey<V> {
    pub(crate) fn new(result_set: ResultSetId, column: ColumnId) -> Self {
        Self {
            result_set,
            column,
            _value: PhantomData,
        }
    }

    #[inline]
    pub fn column(&self) -> &ColumnId {
        &self.column
    }

    #[inline]
    pub fn result_set(&self) -> ResultSetId {
        self.result_set
    }

    /// The same column read as `Option<V>`.
    pub fn nullable(self) -> NullableColumnKey<V> {
        NullableColumnKey::new(self)
    }

    /// The same column read as another type.
    pub fn cast<U>(self) -> ColumnKey<U> {
        ColumnKey::new(self.result_set, self.column)
    }
}

// Manual impls: `V` is only a marker and needn't be Clone/Eq/Debug itself.
impl<V> Clone for ColumnKey<V> {
    fn clone(&self) -> Self {
        Self::new(self.result_set, self.column.clone())
    }
}

impl<V> PartialEq for ColumnKey<V> {
    fn eq(&self, other: &Self) -> bool {
        self.result_set == other.result_set && self.column == other.column
    }
}

impl<V> Eq for ColumnKey<V> {}

impl<V> Hash for ColumnKey<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.result_set.hash(state);
        self.column.hash(state);
    }
}

impl<V> fmt::Debug for ColumnKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnKey")
            .field("result_set", &self.result_set)
            .field("column", &self.column)
            .field("value", &short_type_name::<V>())
            .finish()
    }
}

impl<V> fmt::Display for ColumnKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} as {}", self.column, short_type_name::<V>())
    }
}

/// Key for a column that may be `NULL`; reads yield `Option<V>`.
///
/// The underlying fetch goes through the embedded [`ColumnKey`].
pub struct NullableColumnKey<V> {
    non_null: ColumnKey<V>,
}

impl<V> NullableColumnKey<V> {
    pub fn new(non_null: ColumnKey<V>) -> Self {
        Self { non_null }
    }

    #[inline]
    pub fn non_null(&self) -> &ColumnKey<V> {
        &self.non_null
    }

    pub fn into_non_null(self) -> ColumnKey<V> {
        self.non_null
    }

    #[inline]
    pub fn column(&self) -> &ColumnId {
        self.non_null.column()
    }

    #[inline]
    pub fn result_set(&self) -> ResultSetId {
        self.non_null.result_set()
    }
}

impl<V> Clone for NullableColumnKey<V> {
    fn clone(&self) -> Self {
        Self::new(self.non_null.clone())
    }
}

impl<V> PartialEq for NullableColumnKey<V> {
    fn eq(&self, other: &Self) -> bool {
        self.non_null == other.non_null
    }
}

impl<V> Eq for NullableColumnKey<V> {}

impl<V> Hash for NullableColumnKey<V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.non_null.hash(state);
    }
}

impl<V> fmt::Debug for NullableColumnKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NullableColumnKey")
            .field("non_null", &self.non_null)
            .finish()
    }
}

impl<V> fmt::Display for NullableColumnKey<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} as Option<{}>",
            self.non_null.column,
            short_type_name::<V>()
        )
    }
}

impl<V> From<ColumnKey<V>> for NullableColumnKey<V> {
    fn from(key: ColumnKey<V>) -> Self {
        NullableColumnKey::new(key)
    }
}

/// `type_name` with module paths stripped, e.g. `Option<String>`.
fn short_type_name<V>() -> String {
    let full = std::any::type_name::<V>();
    let mut out = String::with_capacity(full.len());
    let mut segment_start = 0;
    for c in full.chars() {
        if c == ':' {
            out.truncate(segment_start);
        } else if c.is_alphanumeric() || c == '_' {
            out.push(c);
        } else {
            out.push(c);
            segment_start = out.len();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key<V>(column: ColumnId) -> ColumnKey<V> {
        ColumnKey::new(ResultSetId::next(), column)
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name::<String>(), "String");
        assert_eq!(short_type_name::<Option<String>>(), "Option<String>");
        assert_eq!(short_type_name::<Vec<u8>>(), "Vec<u8>");
        assert_eq!(short_type_name::<i64>(), "i64");
    }

    #[test]
    fn test_key_display() {
        let named: ColumnKey<String> = key(ColumnId::named(1, "email"));
        assert_eq!(named.to_string(), "\"email\" as String");

        let positional: ColumnKey<i64> = key(ColumnId::at(3));
        assert_eq!(positional.to_string(), "#3 as i64");
        assert_eq!(positional.nullable().to_string(), "#3 as Option<i64>");
    }

    #[test]
    fn test_nullable_wraps_same_column() {
        let k: ColumnKey<i32> = key(ColumnId::named(0, "id"));
        let nullable = k.clone().nullable();
        assert_eq!(nullable.non_null(), &k);
        assert_eq!(nullable.column().index(), 0);
        assert_eq!(nullable.result_set(), k.result_set());
    }

    #[test]
    fn test_cast_keeps_identity() {
        let k: ColumnKey<i32> = key(ColumnId::named(2, "score"));
        let result_set = k.result_set();
        let cast: ColumnKey<f64> = k.cast();
        assert_eq!(cast.column(), &ColumnId::named(2, "score"));
        assert_eq!(cast.result_set(), result_set);
    }
}
