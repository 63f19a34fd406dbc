//! Datum - the JSON-like value carried through query execution.
//!
//! A `Datum` represents any value a data service can hand back: an entity
//! (as an object), a primitive property value, a key, or a count.
//!
//! # Supported Types
//!
//! - **Null**: Absence of a value
//! - **Boolean**: true or false
//! - **Number**: f64 floating point numbers
//! - **String**: UTF-8 encoded text
//! - **Array**: Ordered list of datums
//! - **Object**: Key-value map (an entity or complex value)
//!
//! # Example
//!
//! ```rust,ignore
//! use odata_query::Datum;
//! use std::collections::HashMap;
//!
//! let mut product = HashMap::new();
//! product.insert("ID".to_string(), Datum::Number(7.0));
//! product.insert("Name".to_string(), Datum::String("Bread".into()));
//! let entity = Datum::Object(product);
//!
//! assert_eq!(Datum::Number(7.0).to_literal(), "7");
//! assert_eq!(Datum::from("Bread").to_literal(), "'Bread'");
//! ```

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Datum represents a value returned by or passed to a data service.
///
/// It's JSON-compatible with serde serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Datum {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    Array(Vec<Datum>),
    Object(HashMap<String, Datum>),
}

impl Datum {
    /// Check if datum is null
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Get as string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Datum::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Datum::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as a non-negative integer, rejecting fractions and negatives
    pub fn as_count(&self) -> Option<usize> {
        match self {
            Datum::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
            _ => None,
        }
    }

    /// Get as boolean
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Datum::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as array
    pub fn as_array(&self) -> Option<&Vec<Datum>> {
        match self {
            Datum::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Get as object
    pub fn as_object(&self) -> Option<&HashMap<String, Datum>> {
        match self {
            Datum::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Look up a property on an object datum
    pub fn get(&self, field: &str) -> Option<&Datum> {
        self.as_object().and_then(|obj| obj.get(field))
    }

    /// Render as a protocol literal, as used in key predicates and filters.
    ///
    /// Strings are single-quoted with embedded quotes doubled; integral
    /// numbers drop the fractional part.
    pub fn to_literal(&self) -> String {
        match self {
            Datum::Null => "null".to_string(),
            Datum::Boolean(b) => b.to_string(),
            Datum::Number(n) => n.to_string(),
            Datum::String(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_string(),
        }
    }

    /// Ordering used when sorting result sets.
    ///
    /// Values of different types order as null < boolean < number < string
    /// < array < object. Arrays and objects compare equal among themselves.
    pub fn compare(&self, other: &Datum) -> Ordering {
        match (self, other) {
            (Datum::Boolean(a), Datum::Boolean(b)) => a.cmp(b),
            (Datum::Number(a), Datum::Number(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
            (Datum::String(a), Datum::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Datum::Null => 0,
            Datum::Boolean(_) => 1,
            Datum::Number(_) => 2,
            Datum::String(_) => 3,
            Datum::Array(_) => 4,
            Datum::Object(_) => 5,
        }
    }
}

// Conversions
impl From<bool> for Datum {
    fn from(b: bool) -> Self {
        Datum::Boolean(b)
    }
}

impl From<i32> for Datum {
    fn from(n: i32) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<i64> for Datum {
    fn from(n: i64) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<usize> for Datum {
    fn from(n: usize) -> Self {
        Datum::Number(n as f64)
    }
}

impl From<f64> for Datum {
    fn from(n: f64) -> Self {
        Datum::Number(n)
    }
}

impl From<String> for Datum {
    fn from(s: String) -> Self {
        Datum::String(s)
    }
}

impl From<&str> for Datum {
    fn from(s: &str) -> Self {
        Datum::String(s.to_string())
    }
}

impl From<Vec<Datum>> for Datum {
    fn from(items: Vec<Datum>) -> Self {
        Datum::Array(items)
    }
}

impl From<serde_json::Value> for Datum {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Datum::Null,
            serde_json::Value::Bool(b) => Datum::Boolean(b),
            serde_json::Value::Number(n) => Datum::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => Datum::String(s),
            serde_json::Value::Array(arr) => {
                Datum::Array(arr.into_iter().map(Datum::from).collect())
            }
            serde_json::Value::Object(obj) => {
                Datum::Object(obj.into_iter().map(|(k, v)| (k, Datum::from(v))).collect())
            }
        }
    }
}

impl From<Datum> for serde_json::Value {
    fn from(datum: Datum) -> Self {
        match datum {
            Datum::Null => serde_json::Value::Null,
            Datum::Boolean(b) => serde_json::Value::Bool(b),
            Datum::Number(n) => {
                // Integral values go out as JSON integers so keys and counts
                // print as `7`, not `7.0`.
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    serde_json::Value::from(n as i64)
                } else {
                    serde_json::Number::from_f64(n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Datum::String(s) => serde_json::Value::String(s),
            Datum::Array(arr) => {
                serde_json::Value::Array(arr.into_iter().map(serde_json::Value::from).collect())
            }
            Datum::Object(obj) => serde_json::Value::Object(
                obj.into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl std::fmt::Display for Datum {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Datum::Null => write!(f, "null"),
            Datum::Boolean(b) => write!(f, "{}", b),
            Datum::Number(n) => write!(f, "{}", n),
            Datum::String(s) => write!(f, "\"{}\"", s),
            Datum::Array(arr) => {
                write!(f, "[")?;
                for (i, item) in arr.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Datum::Object(obj) => {
                write!(f, "{{")?;
                for (i, (key, value)) in obj.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "\"{}\": {}", key, value)?;
                }
                write!(f, "}}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_rendering() {
        assert_eq!(Datum::Number(7.0).to_literal(), "7");
        assert_eq!(Datum::Number(2.5).to_literal(), "2.5");
        assert_eq!(Datum::from("O'Brien").to_literal(), "'O''Brien'");
        assert_eq!(Datum::Boolean(true).to_literal(), "true");
        assert_eq!(Datum::Null.to_literal(), "null");
    }

    #[test]
    fn test_compare_orders_mixed_types() {
        let mut values = vec![
            Datum::from("b"),
            Datum::Number(3.0),
            Datum::Null,
            Datum::from("a"),
            Datum::Boolean(false),
            Datum::Number(-1.0),
        ];
        values.sort_by(|a, b| a.compare(b));

        assert_eq!(
            values,
            vec![
                Datum::Null,
                Datum::Boolean(false),
                Datum::Number(-1.0),
                Datum::Number(3.0),
                Datum::from("a"),
                Datum::from("b"),
            ]
        );
    }

    #[test]
    fn test_as_count_rejects_fractions_and_negatives() {
        assert_eq!(Datum::Number(5.0).as_count(), Some(5));
        assert_eq!(Datum::Number(0.0).as_count(), Some(0));
        assert_eq!(Datum::Number(-1.0).as_count(), None);
        assert_eq!(Datum::Number(1.5).as_count(), None);
        assert_eq!(Datum::from("5").as_count(), None);
    }

    #[test]
    fn test_json_integers_stay_integral() {
        let json = serde_json::Value::from(Datum::Number(7.0));
        assert_eq!(json.to_string(), "7");

        let back = Datum::from(serde_json::json!({"ID": 7, "Name": "Bread"}));
        assert_eq!(back.get("ID"), Some(&Datum::Number(7.0)));
        assert_eq!(back.get("Name").and_then(|d| d.as_string()), Some("Bread"));
    }
}
