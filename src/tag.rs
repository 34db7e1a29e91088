use crate::{Hashable, WriteFailure};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::{io, slice};

/// A typed scalar tag value.
///
/// The closed set of kinds carries a fixed rank (string, bool, int, float,
/// binary) used both as the tiebreak in the canonical tag order and as the
/// kind frame in the hash byte layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum TagValue {
    String(String),
    Bool(bool),
    Int(i64),
    Float(f64),
    Binary(#[serde(with = "base64_bytes")] Bytes),
}

/// A single tag: a key paired with a typed scalar value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeyValue {
    pub key: String,
    #[serde(flatten)]
    pub value: TagValue,
}

/// An owned, ordered sequence of tags.
///
/// Sequence operations (equality, hashing) are defined over the stored
/// order. [`Tags::sort`] puts the sequence into canonical order; records
/// built through [`crate::Process::new`] always hold sorted tags.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tags(Vec<KeyValue>);

// === impl TagValue ===

impl TagValue {
    /// Rank of the value kind in the canonical order and hash frame.
    fn kind(&self) -> u8 {
        match self {
            TagValue::String(_) => 0,
            TagValue::Bool(_) => 1,
            TagValue::Int(_) => 2,
            TagValue::Float(_) => 3,
            TagValue::Binary(_) => 4,
        }
    }

    /// Total order over values: kind rank first, then the value within the
    /// kind. Floats use `total_cmp` so the order is total even for NaN,
    /// while `==` keeps IEEE semantics.
    fn cmp_canonical(&self, other: &Self) -> Ordering {
        use self::TagValue::*;
        match (self, other) {
            (String(a), String(b)) => a.cmp(b),
            (Bool(a), Bool(b)) => a.cmp(b),
            (Int(a), Int(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (Binary(a), Binary(b)) => a.cmp(b),
            _ => self.kind().cmp(&other.kind()),
        }
    }
}

impl From<&str> for TagValue {
    fn from(s: &str) -> Self {
        TagValue::String(s.to_owned())
    }
}

impl From<String> for TagValue {
    fn from(s: String) -> Self {
        TagValue::String(s)
    }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> Self {
        TagValue::Bool(b)
    }
}

impl From<i64> for TagValue {
    fn from(i: i64) -> Self {
        TagValue::Int(i)
    }
}

impl From<f64> for TagValue {
    fn from(f: f64) -> Self {
        TagValue::Float(f)
    }
}

impl From<Bytes> for TagValue {
    fn from(b: Bytes) -> Self {
        TagValue::Binary(b)
    }
}

impl From<Vec<u8>> for TagValue {
    fn from(b: Vec<u8>) -> Self {
        TagValue::Binary(b.into())
    }
}

// === impl KeyValue ===

impl KeyValue {
    pub fn new(key: impl Into<String>, value: impl Into<TagValue>) -> Self {
        KeyValue {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Canonical total order over tags: key ascending, then the value
    /// order. Used to sort tag sequences into canonical form.
    pub fn cmp_canonical(&self, other: &Self) -> Ordering {
        self.key
            .cmp(&other.key)
            .then_with(|| self.value.cmp_canonical(&other.value))
    }
}

impl Hashable for KeyValue {
    /// Byte layout: raw key bytes, the kind rank as a big-endian `u16`,
    /// then the value bytes (string and binary raw, bool as one byte,
    /// int and float as 8 big-endian bytes, float via its IEEE-754 bit
    /// pattern). The layout matches the deployed descriptor hash and must
    /// not change without a coordinated migration of stored hashes.
    fn hash<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), WriteFailure> {
        w.write_all(self.key.as_bytes())?;
        w.write_all(&u16::from(self.value.kind()).to_be_bytes())?;
        match &self.value {
            TagValue::String(s) => w.write_all(s.as_bytes())?,
            TagValue::Bool(b) => w.write_all(&[u8::from(*b)])?,
            TagValue::Int(i) => w.write_all(&i.to_be_bytes())?,
            TagValue::Float(f) => w.write_all(&f.to_be_bytes())?,
            TagValue::Binary(b) => w.write_all(b)?,
        }
        Ok(())
    }
}

// === impl Tags ===

impl Tags {
    /// Sorts the sequence in place into canonical order.
    pub fn sort(&mut self) {
        self.0.sort_by(KeyValue::cmp_canonical);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> slice::Iter<'_, KeyValue> {
        self.0.iter()
    }
}

impl Hashable for Tags {
    fn hash<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<(), WriteFailure> {
        for kv in &self.0 {
            kv.hash(w)?;
        }
        Ok(())
    }
}

impl From<Vec<KeyValue>> for Tags {
    fn from(tags: Vec<KeyValue>) -> Self {
        Tags(tags)
    }
}

impl FromIterator<KeyValue> for Tags {
    fn from_iter<I: IntoIterator<Item = KeyValue>>(iter: I) -> Self {
        Tags(iter.into_iter().collect())
    }
}

impl std::ops::Deref for Tags {
    type Target = [KeyValue];

    fn deref(&self) -> &[KeyValue] {
        &self.0
    }
}

impl<'a> IntoIterator for &'a Tags {
    type Item = &'a KeyValue;
    type IntoIter = slice::Iter<'a, KeyValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

mod base64_bytes {
    use bytes::Bytes;
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(bytes: &Bytes, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&base64::encode(bytes))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Bytes, D::Error> {
        let s = String::deserialize(d)?;
        base64::decode(&s)
            .map(Bytes::from)
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds() -> Vec<TagValue> {
        vec![
            TagValue::String("a".into()),
            TagValue::Bool(true),
            TagValue::Int(1),
            TagValue::Float(1.0),
            TagValue::Binary(Bytes::from_static(b"a")),
        ]
    }

    #[test]
    fn kind_order_is_total() {
        let kinds = kinds();
        for (i, a) in kinds.iter().enumerate() {
            for (j, b) in kinds.iter().enumerate() {
                assert_eq!(a.cmp_canonical(b), i.cmp(&j), "{a:?} vs {b:?}");
            }
        }
    }

    #[test]
    fn order_by_key_then_value() {
        let cases = &[
            (
                KeyValue::new("a", "x"),
                KeyValue::new("b", "x"),
                Ordering::Less,
            ),
            (
                KeyValue::new("a", "x"),
                KeyValue::new("a", "y"),
                Ordering::Less,
            ),
            (
                KeyValue::new("a", 2i64),
                KeyValue::new("a", 10i64),
                Ordering::Less,
            ),
            (
                KeyValue::new("a", "x"),
                KeyValue::new("a", true),
                Ordering::Less,
            ),
            (
                KeyValue::new("a", 1i64),
                KeyValue::new("a", 1i64),
                Ordering::Equal,
            ),
        ];
        for (a, b, expected) in cases {
            assert_eq!(a.cmp_canonical(b), *expected, "{a:?} vs {b:?}");
            assert_eq!(b.cmp_canonical(a), expected.reverse(), "{b:?} vs {a:?}");
        }
    }

    #[test]
    fn sort_canonicalizes() {
        let mut tags: Tags = vec![
            KeyValue::new("region", "us-east"),
            KeyValue::new("env", "prod"),
            KeyValue::new("env", true),
        ]
        .into();
        tags.sort();
        let keys: Vec<_> = tags.iter().map(|kv| kv.key.as_str()).collect();
        assert_eq!(keys, vec!["env", "env", "region"]);
        // String ranks below bool on equal keys.
        assert_eq!(tags[0].value, TagValue::String("prod".into()));
        assert_eq!(tags[1].value, TagValue::Bool(true));
    }

    #[test]
    fn hash_byte_layout() {
        let cases: &[(KeyValue, &[u8])] = &[
            (
                KeyValue::new("k", "v"),
                b"k\x00\x00v",
            ),
            (
                KeyValue::new("k", true),
                b"k\x00\x01\x01",
            ),
            (
                KeyValue::new("k", 1i64),
                b"k\x00\x02\x00\x00\x00\x00\x00\x00\x00\x01",
            ),
            (
                KeyValue::new("k", 1.0f64),
                b"k\x00\x03\x3f\xf0\x00\x00\x00\x00\x00\x00",
            ),
            (
                KeyValue::new("k", Bytes::from_static(b"\x00\xff")),
                b"k\x00\x04\x00\xff",
            ),
        ];
        for (kv, expected) in cases {
            let mut buf = Vec::new();
            kv.hash(&mut buf).unwrap();
            assert_eq!(buf.as_slice(), *expected, "{kv:?}");
        }
    }

    #[test]
    fn binary_round_trips_as_base64() {
        let kv = KeyValue::new("blob", Bytes::from_static(b"\x01\x02\x03"));
        let json = serde_json::to_value(&kv).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"key": "blob", "type": "binary", "value": "AQID"})
        );
        let back: KeyValue = serde_json::from_value(json).unwrap();
        assert_eq!(back, kv);
    }
}
