use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::entity_catalog::JdbcType;

/// Identity of a persistent object: entity name plus primary key snapshot
/// keyed by db column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectId {
    pub entity_name: String,
    pub snapshot: BTreeMap<String, Value>,
}

impl ObjectId {
    pub fn new(entity_name: impl Into<String>) -> Self {
        ObjectId {
            entity_name: entity_name.into(),
            snapshot: BTreeMap::new(),
        }
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.snapshot.insert(column.into(), value.into());
        self
    }
}

/// A reference to an already-fetched persistent object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistentRef {
    pub object_id: ObjectId,
}

/// Value of an embeddable, keyed by embeddable property name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddedValue {
    pub embeddable: String,
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    Bytes(Vec<u8>),
    Array(Vec<Value>),
    ObjectId(ObjectId),
    Persistent(PersistentRef),
    Embedded(EmbeddedValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Primary key snapshot carried by object references.
    pub fn id_snapshot(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::ObjectId(id) => Some(&id.snapshot),
            Value::Persistent(p) => Some(&p.object_id.snapshot),
            _ => None,
        }
    }

    /// JDBC type used for a binding when no attribute is bound.
    pub fn jdbc_type(&self) -> JdbcType {
        match self {
            Value::Null => JdbcType::Null,
            Value::Bool(_) => JdbcType::Boolean,
            Value::Int(_) => JdbcType::BigInt,
            Value::Float(_) => JdbcType::Double,
            Value::String(_) => JdbcType::VarChar,
            Value::Date(_) => JdbcType::Date,
            Value::Time(_) => JdbcType::Time,
            Value::Timestamp(_) => JdbcType::Timestamp,
            Value::Bytes(_) => JdbcType::VarBinary,
            _ => JdbcType::Other,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(i) => write!(f, "{}", i),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "'{}'", s),
            Value::Date(d) => write!(f, "{}", d),
            Value::Time(t) => write!(f, "{}", t),
            Value::Timestamp(ts) => write!(f, "{}", ts),
            Value::Bytes(b) => write!(f, "<{} bytes>", b.len()),
            Value::Array(items) => {
                let parts: Vec<String> = items.iter().map(|v| v.to_string()).collect();
                write!(f, "({})", parts.join(", "))
            }
            Value::ObjectId(id) => write!(f, "<ObjectId:{}>", id.entity_name),
            Value::Persistent(p) => write!(f, "<{}>", p.object_id.entity_name),
            Value::Embedded(e) => write!(f, "<{}>", e.embeddable),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<NaiveDate> for Value {
    fn from(v: NaiveDate) -> Self {
        Value::Date(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Value::ObjectId(v)
    }
}
