//! Member values stored in prototypes, instances and statics

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{ClassError, Instance, Table};

/// A callable member. The instance is the receiver.
pub type Method = Arc<dyn Fn(&Instance, &[Value]) -> Result<Value, ClassError> + Send + Sync>;

/// Members keyed by name, the unit of every shallow merge
pub type Properties = HashMap<String, Value>;

/// A member value
#[derive(Clone)]
pub enum Value {
    /// Plain data
    Data(serde_json::Value),
    /// A callable member
    Method(Method),
    /// A nested delegating table (e.g. the options object)
    Table(Table),
    /// A reference to an instance
    Instance(Instance),
}

impl Value {
    /// The "no result" value
    pub fn null() -> Self {
        Value::Data(serde_json::Value::Null)
    }

    /// Wrap a closure as a method value
    pub fn method<F>(f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value, ClassError> + Send + Sync + 'static,
    {
        Value::Method(Arc::new(f))
    }

    /// Check for the "no result" value
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Data(serde_json::Value::Null))
    }

    /// Get the plain data, if this is data
    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Value::Data(v) => Some(v),
            _ => None,
        }
    }

    /// Get the callable, if this is a method
    pub fn as_method(&self) -> Option<&Method> {
        match self {
            Value::Method(m) => Some(m),
            _ => None,
        }
    }

    /// Get the nested table, if this is one
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            Value::Table(t) => Some(t),
            _ => None,
        }
    }

    /// Get the referenced instance, if this is one
    pub fn as_instance(&self) -> Option<&Instance> {
        match self {
            Value::Instance(i) => Some(i),
            _ => None,
        }
    }

    /// Get data as i64
    pub fn as_i64(&self) -> Option<i64> {
        self.as_data().and_then(|v| v.as_i64())
    }

    /// Get data as str
    pub fn as_str(&self) -> Option<&str> {
        self.as_data().and_then(|v| v.as_str())
    }

    /// Get data as bool
    pub fn as_bool(&self) -> Option<bool> {
        self.as_data().and_then(|v| v.as_bool())
    }

    /// Truthiness of a data value; methods, tables and instances are always truthy
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Data(serde_json::Value::Null) => false,
            Value::Data(serde_json::Value::Bool(b)) => *b,
            Value::Data(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Value::Data(serde_json::Value::String(s)) => !s.is_empty(),
            _ => true,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Data(v) => write!(f, "Data({v})"),
            Value::Method(_) => f.write_str("Method(..)"),
            Value::Table(t) => f.debug_tuple("Table").field(t).finish(),
            Value::Instance(i) => f.debug_tuple("Instance").field(i).finish(),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        Value::Data(v)
    }
}

impl From<Table> for Value {
    fn from(t: Table) -> Self {
        Value::Table(t)
    }
}

impl From<Instance> for Value {
    fn from(i: Instance) -> Self {
        Value::Instance(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Data(b.into())
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Data(n.into())
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Data(s.into())
    }
}

/// Build `Properties` from `(name, value)` pairs
pub fn props<K, V, I>(pairs: I) -> Properties
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
