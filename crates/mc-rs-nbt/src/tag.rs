//! NBT tag types.
//!
//! Only the tag kinds needed to persist structure pieces are modelled:
//! booleans travel as `TAG_Byte`, positions and boxes as `TAG_Int_Array`.

use std::collections::BTreeMap;
use std::fmt;

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;

/// Any NBT value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NbtTag {
    Byte(i8),
    Int(i32),
    Long(i64),
    String(String),
    List(Vec<NbtTag>),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
}

impl NbtTag {
    pub fn tag_type_id(&self) -> u8 {
        match self {
            NbtTag::Byte(_) => TAG_BYTE,
            NbtTag::Int(_) => TAG_INT,
            NbtTag::Long(_) => TAG_LONG,
            NbtTag::String(_) => TAG_STRING,
            NbtTag::List(_) => TAG_LIST,
            NbtTag::Compound(_) => TAG_COMPOUND,
            NbtTag::IntArray(_) => TAG_INT_ARRAY,
        }
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            NbtTag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_int_array(&self) -> Option<&[i32]> {
        match self {
            NbtTag::IntArray(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NbtTag::Byte(v) => write!(f, "{v}b"),
            NbtTag::Int(v) => write!(f, "{v}"),
            NbtTag::Long(v) => write!(f, "{v}L"),
            NbtTag::String(v) => write!(f, "\"{v}\""),
            NbtTag::List(v) => write!(f, "[{} elements]", v.len()),
            NbtTag::Compound(v) => write!(f, "{{{} entries}}", v.len()),
            NbtTag::IntArray(v) => write!(f, "[I; {} elements]", v.len()),
        }
    }
}

/// A compound tag with sorted keys, so identical documents always encode
/// to identical bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NbtCompound {
    entries: BTreeMap<String, NbtTag>,
}

impl NbtCompound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&NbtTag> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, tag: NbtTag) -> Option<NbtTag> {
        self.entries.insert(key.into(), tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NbtTag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn put_bool(&mut self, key: &str, value: bool) {
        self.insert(key, NbtTag::Byte(i8::from(value)));
    }

    pub fn put_int(&mut self, key: &str, value: i32) {
        self.insert(key, NbtTag::Int(value));
    }

    pub fn put_long(&mut self, key: &str, value: i64) {
        self.insert(key, NbtTag::Long(value));
    }

    pub fn put_string(&mut self, key: &str, value: impl Into<String>) {
        self.insert(key, NbtTag::String(value.into()));
    }

    pub fn put_int_array(&mut self, key: &str, value: Vec<i32>) {
        self.insert(key, NbtTag::IntArray(value));
    }

    pub fn put_list(&mut self, key: &str, value: Vec<NbtTag>) {
        self.insert(key, NbtTag::List(value));
    }

    pub fn put_compound(&mut self, key: &str, value: NbtCompound) {
        self.insert(key, NbtTag::Compound(value));
    }

    /// Reads a `TAG_Byte` as a boolean. Any non-zero byte is `true`.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.entries.get(key)? {
            NbtTag::Byte(v) => Some(*v != 0),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i32> {
        match self.entries.get(key)? {
            NbtTag::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_long(&self, key: &str) -> Option<i64> {
        match self.entries.get(key)? {
            NbtTag::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.entries.get(key)? {
            NbtTag::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_int_array(&self, key: &str) -> Option<&[i32]> {
        self.entries.get(key)?.as_int_array()
    }

    pub fn get_list(&self, key: &str) -> Option<&[NbtTag]> {
        match self.entries.get(key)? {
            NbtTag::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_compound(&self, key: &str) -> Option<&NbtCompound> {
        self.entries.get(key)?.as_compound()
    }
}

impl FromIterator<(String, NbtTag)> for NbtCompound {
    fn from_iter<I: IntoIterator<Item = (String, NbtTag)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

/// A named root compound (the root always has a name, often empty string).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NbtRoot {
    pub name: String,
    pub compound: NbtCompound,
}

impl NbtRoot {
    pub fn new(name: impl Into<String>, compound: NbtCompound) -> Self {
        Self {
            name: name.into(),
            compound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bool_is_stored_as_byte() {
        let mut c = NbtCompound::new();
        c.put_bool("Chest", true);
        assert_eq!(c.get("Chest"), Some(&NbtTag::Byte(1)));
        assert_eq!(c.get_bool("Chest"), Some(true));
    }

    #[test]
    fn typed_getters_reject_other_tags() {
        let mut c = NbtCompound::new();
        c.put_int("GD", 3);
        c.put_string("id", "NeBS");
        assert_eq!(c.get_bool("GD"), None);
        assert_eq!(c.get_int("id"), None);
        assert_eq!(c.get_str("id"), Some("NeBS"));
        assert_eq!(c.get_int("missing"), None);
    }

    #[test]
    fn keys_iterate_in_sorted_order() {
        let mut c = NbtCompound::new();
        c.put_int("O", 2);
        c.put_int("BB", 0);
        c.put_int("GD", 1);
        let keys: Vec<&str> = c.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["BB", "GD", "O"]);
    }
}
