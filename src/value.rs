//! Tree value model.
//!
//! A configuration tree holds values from a closed set of kinds: scalars
//! (null, bool, integer, float, complex, string), sequences, and nested
//! mappings. Mappings are always [`Config`] nodes, including inside
//! sequences, so the dual access surfaces hold at every depth.

use crate::config::Config;
use crate::error::TreeError;
use serde::ser::{Serialize, SerializeSeq, Serializer};
use std::fmt;

/// Complex scalar, kept as its own kind so identity and serialization treat
/// it separately from floats.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    pub re: f64,
    pub im: f64,
}

impl Complex {
    pub fn new(re: f64, im: f64) -> Self {
        Complex { re, im }
    }

    /// Parse the textual form emitted by the serializer: `2+3j`, `1.5-2j`,
    /// or the pure-imaginary `3j`. Returns `None` for anything else.
    pub fn parse(text: &str) -> Option<Complex> {
        let body = text.strip_suffix('j')?;
        if body.is_empty() {
            return None;
        }
        let bytes = body.as_bytes();
        // Split at the last sign that is neither leading nor part of an
        // exponent.
        let mut split = None;
        for i in (1..bytes.len()).rev() {
            if matches!(bytes[i], b'+' | b'-') && !matches!(bytes[i - 1], b'e' | b'E') {
                split = Some(i);
                break;
            }
        }
        match split {
            Some(i) => {
                let re: f64 = body[..i].parse().ok()?;
                let im: f64 = body[i + 1..].parse().ok()?;
                let im = if bytes[i] == b'-' { -im } else { im };
                Some(Complex { re, im })
            }
            None => {
                let im: f64 = body.parse().ok()?;
                Some(Complex { re: 0.0, im })
            }
        }
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // f64's Display drops a zero fraction, matching the `2+3j` form.
        if self.im.is_sign_negative() {
            write!(f, "{}-{}j", self.re, -self.im)
        } else {
            write!(f, "{}+{}j", self.re, self.im)
        }
    }
}

/// Render a float so the textual form parses back as a float, never an
/// integer: `2.0`, `3.14`, `.inf`, `-.inf`, `.nan`.
pub(crate) fn format_float(value: f64) -> String {
    if value.is_nan() {
        ".nan".to_string()
    } else if value == f64::INFINITY {
        ".inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-.inf".to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else if value.fract() == 0.0 {
        // Integral but too large for the `{:.1}` form; keep a mantissa dot so
        // the exponent notation still reads as a float.
        let s = format!("{value:e}");
        if s.contains('.') {
            s
        } else {
            s.replacen('e', ".0e", 1)
        }
    } else {
        format!("{value}")
    }
}

/// A value held by a configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Complex(Complex),
    Str(String),
    Seq(Sequence),
    Map(Config),
}

impl Value {
    /// Human-readable kind name, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Complex(_) => "complex",
            Value::Str(_) => "string",
            Value::Seq(_) => "sequence",
            Value::Map(_) => "mapping",
        }
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_seq(&self) -> bool {
        matches!(self, Value::Seq(_))
    }

    pub fn as_map(&self) -> Option<&Config> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_map_mut(&mut self) -> Option<&mut Config> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&Sequence> {
        match self {
            Value::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_seq_mut(&mut self) -> Option<&mut Sequence> {
        match self {
            Value::Seq(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        match self {
            Value::Map(map) => map.set_frozen(frozen),
            Value::Seq(seq) => seq.set_frozen(frozen),
            _ => {}
        }
    }
}

impl fmt::Display for Value {
    /// Compact flow form, used in error messages and for scalar literals.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(value) => write!(f, "{value}"),
            Value::Int(value) => write!(f, "{value}"),
            Value::Float(value) => f.write_str(&format_float(*value)),
            Value::Complex(value) => write!(f, "{value}"),
            Value::Str(text) => f.write_str(text),
            Value::Seq(seq) => {
                f.write_str("[")?;
                for (i, item) in seq.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                f.write_str("}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(value) => serializer.serialize_bool(*value),
            Value::Int(value) => serializer.serialize_i64(*value),
            Value::Float(value) => serializer.serialize_f64(*value),
            Value::Complex(value) => serializer.serialize_str(&value.to_string()),
            Value::Str(text) => serializer.serialize_str(text),
            Value::Seq(seq) => seq.serialize(serializer),
            Value::Map(map) => map.serialize(serializer),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<Complex> for Value {
    fn from(value: Complex) -> Self {
        Value::Complex(value)
    }
}

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Str(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Str(text)
    }
}

impl From<Sequence> for Value {
    fn from(seq: Sequence) -> Self {
        Value::Seq(seq)
    }
}

impl From<Config> for Value {
    fn from(map: Config) -> Self {
        Value::Map(map)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::Seq(Sequence::from_values(
            items.into_iter().map(Into::into).collect(),
        ))
    }
}

/// Ordered sequence node. Mutable by default; once frozen it is fixed-length
/// and rejects item assignment and deletion.
#[derive(Debug, Clone, Default)]
pub struct Sequence {
    items: Vec<Value>,
    frozen: bool,
}

impl Sequence {
    pub fn new() -> Self {
        Sequence::default()
    }

    pub fn from_values(items: Vec<Value>) -> Self {
        Sequence {
            items,
            frozen: false,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn frozen(&self) -> bool {
        self.frozen
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.items.iter()
    }

    /// Assign `value` at `index`. Fails when the sequence is frozen or the
    /// index is out of range.
    pub fn set(&mut self, index: usize, value: Value) -> Result<(), TreeError> {
        if self.frozen {
            return Err(TreeError::FrozenSequenceSet {
                index,
                value: value.to_string(),
            });
        }
        let len = self.items.len();
        match self.items.get_mut(index) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(TreeError::IndexOutOfRange { index, len }),
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut Value, TreeError> {
        if self.frozen {
            return Err(TreeError::FrozenSequenceEdit {
                op: "mutable access",
                index,
            });
        }
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or(TreeError::IndexOutOfRange { index, len })
    }

    pub fn push(&mut self, value: Value) -> Result<(), TreeError> {
        if self.frozen {
            return Err(TreeError::FrozenSequenceEdit {
                op: "insertion",
                index: self.items.len(),
            });
        }
        self.items.push(value);
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<Value, TreeError> {
        if self.frozen {
            return Err(TreeError::FrozenSequenceEdit {
                op: "deletion",
                index,
            });
        }
        if index >= self.items.len() {
            return Err(TreeError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    /// Engine access that skips the frozen gate; used by the freeze engine
    /// and the transform walkers, which run before freezing.
    pub(crate) fn items_mut(&mut self) -> &mut Vec<Value> {
        &mut self.items
    }

    pub(crate) fn set_frozen(&mut self, frozen: bool) {
        self.frozen = frozen;
        for item in &mut self.items {
            item.set_frozen(frozen);
        }
    }
}

impl PartialEq for Sequence {
    /// Structural equality: the frozen mode does not participate.
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl<'a> IntoIterator for &'a Sequence {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl FromIterator<Value> for Sequence {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Sequence::from_values(iter.into_iter().collect())
    }
}

impl Serialize for Sequence {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.items.len()))?;
        for item in &self.items {
            seq.serialize_element(item)?;
        }
        seq.end()
    }
}
