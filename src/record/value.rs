//! Tagged field values and the legend-keyed field table.

use super::format::*;
use crate::util::{Error, Result};

/// One field value as stored in a record body.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    F64Array(Vec<f64>),
    I64Array(Vec<i64>),
    StrArray(Vec<String>),
    Str(String),
    I64(i64),
    F64(f64),
    Bool(bool),
    /// Value with a tag this reader does not know; payload was skipped.
    Unknown(u8),
}

impl FieldValue {
    /// Wire tag of this value.
    pub fn tag(&self) -> u8 {
        match self {
            Self::F64Array(_) => TAG_F64_ARRAY,
            Self::I64Array(_) => TAG_I64_ARRAY,
            Self::StrArray(_) => TAG_STR_ARRAY,
            Self::Str(_) => TAG_STR,
            Self::I64(_) => TAG_I64,
            Self::F64(_) => TAG_F64,
            Self::Bool(_) => TAG_BOOL,
            Self::Unknown(tag) => *tag,
        }
    }

    pub fn type_name(&self) -> &'static str {
        tag_name(self.tag())
    }
}

/// Decoded `(legend name, value)` pairs in file order.
///
/// Lookups go through [`canonical_field_name`], so files written with the
/// legacy legend resolve to the same fields.
#[derive(Debug, Default)]
pub struct FieldTable {
    entries: Vec<(String, FieldValue)>,
}

impl FieldTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: String, value: FieldValue) {
        self.entries.push((name, value));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Legend names in file order.
    pub fn legend(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// `(legend name, value)` pairs in file order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// First value whose legend name resolves to `field`.
    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.entries
            .iter()
            .find(|(name, _)| canonical_field_name(name) == field)
            .map(|(_, v)| v)
    }

    fn require(&self, field: &str) -> Result<&FieldValue> {
        self.get(field).ok_or_else(|| Error::MissingField(field.to_string()))
    }

    pub fn f64_array(&self, field: &str) -> Result<Vec<f64>> {
        match self.require(field)? {
            FieldValue::F64Array(v) => Ok(v.clone()),
            FieldValue::I64Array(v) => Ok(v.iter().map(|&x| x as f64).collect()),
            other => Err(Error::mismatch(field, "f64[]", other.type_name())),
        }
    }

    /// Non-negative integer array (counts and indices).
    pub fn index_array(&self, field: &str) -> Result<Vec<usize>> {
        let to_index = |x: i64| usize::try_from(x).map_err(|_| Error::mismatch(field, "index", "negative integer"));
        match self.require(field)? {
            FieldValue::I64Array(v) => v.iter().map(|&x| to_index(x)).collect(),
            FieldValue::F64Array(v) => v
                .iter()
                .map(|&x| {
                    if x.fract() == 0.0 && x >= 0.0 && x <= i64::MAX as f64 {
                        Ok(x as usize)
                    } else {
                        Err(Error::mismatch(field, "i64[]", "non-integral f64[]"))
                    }
                })
                .collect(),
            other => Err(Error::mismatch(field, "i64[]", other.type_name())),
        }
    }

    pub fn str_array(&self, field: &str) -> Result<Vec<String>> {
        match self.require(field)? {
            FieldValue::StrArray(v) => Ok(v.clone()),
            other => Err(Error::mismatch(field, "string[]", other.type_name())),
        }
    }

    pub fn string(&self, field: &str) -> Result<String> {
        match self.require(field)? {
            FieldValue::Str(s) => Ok(s.clone()),
            other => Err(Error::mismatch(field, "string", other.type_name())),
        }
    }

    pub fn i64(&self, field: &str) -> Result<i64> {
        match self.require(field)? {
            FieldValue::I64(v) => Ok(*v),
            FieldValue::Bool(b) => Ok(i64::from(*b)),
            FieldValue::F64(x) if x.fract() == 0.0 => Ok(*x as i64),
            other => Err(Error::mismatch(field, "i64", other.type_name())),
        }
    }

    pub fn f64(&self, field: &str) -> Result<f64> {
        match self.require(field)? {
            FieldValue::F64(x) => Ok(*x),
            FieldValue::I64(v) => Ok(*v as f64),
            other => Err(Error::mismatch(field, "f64", other.type_name())),
        }
    }

    pub fn bool(&self, field: &str) -> Result<bool> {
        match self.require(field)? {
            FieldValue::Bool(b) => Ok(*b),
            FieldValue::I64(0) => Ok(false),
            FieldValue::I64(1) => Ok(true),
            other => Err(Error::mismatch(field, "bool", other.type_name())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> FieldTable {
        let mut t = FieldTable::new();
        t.push("vtxCount".into(), FieldValue::I64(3));
        t.push("weights".into(), FieldValue::I64Array(vec![1, 0]));
        t.push("useComponents".into(), FieldValue::I64(1));
        t.push("envelope".into(), FieldValue::I64(1));
        t.push("offsets_as_f64".into(), FieldValue::F64Array(vec![0.0, 1.5]));
        t
    }

    #[test]
    fn test_legacy_lookup() {
        let t = table();
        assert_eq!(t.i64(field::VERTEX_COUNT).unwrap(), 3);
        assert!(t.bool(field::USE_COMPONENTS).unwrap());
    }

    #[test]
    fn test_lossless_coercion() {
        let t = table();
        assert_eq!(t.f64_array(field::WEIGHTS).unwrap(), vec![1.0, 0.0]);
        assert_eq!(t.f64(field::ENVELOPE).unwrap(), 1.0);
        assert!(t.index_array("offsets_as_f64").is_err());
    }

    #[test]
    fn test_missing_and_mismatch() {
        let t = table();
        assert!(matches!(t.string(field::NAME), Err(Error::MissingField(_))));
        assert!(matches!(t.string(field::VERTEX_COUNT), Err(Error::SchemaMismatch { .. })));
    }
}
