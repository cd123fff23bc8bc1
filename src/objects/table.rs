//! Delegating member tables
//!
//! A table owns its own members and optionally delegates lookups of
//! unset members to another table. Delegation is live: members added to
//! a delegate later are visible through every table that delegates to it
//! and has not overridden them.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeMap, Serializer};

use super::{ClassError, Properties, Value};

struct TableInner {
    delegate: Option<Table>,
    own: RwLock<Properties>,
}

/// Shared handle to a delegating member table
#[derive(Clone)]
pub struct Table {
    inner: Arc<TableInner>,
}

impl Table {
    /// Create an empty table with no delegate
    pub fn new() -> Self {
        Self::with_delegate(None, Properties::new())
    }

    /// Create an empty table that delegates to `delegate`
    pub fn create(delegate: &Table) -> Self {
        Self::with_delegate(Some(delegate.clone()), Properties::new())
    }

    /// Create a table with no delegate holding `props` as its own members
    pub fn from_props(props: Properties) -> Self {
        Self::with_delegate(None, props)
    }

    fn with_delegate(delegate: Option<Table>, own: Properties) -> Self {
        Self {
            inner: Arc::new(TableInner {
                delegate,
                own: RwLock::new(own),
            }),
        }
    }

    /// Build a table from a JSON object; nested objects become nested tables
    pub fn from_json(value: serde_json::Value) -> Result<Self, ClassError> {
        match value {
            serde_json::Value::Object(map) => {
                let mut props = Properties::new();
                for (k, v) in map {
                    let member = if v.is_object() {
                        Value::Table(Self::from_json(v)?)
                    } else {
                        Value::Data(v)
                    };
                    props.insert(k, member);
                }
                Ok(Self::from_props(props))
            }
            other => Err(ClassError::InvalidJson(other.to_string())),
        }
    }

    /// The table unset lookups fall through to
    pub fn delegate(&self) -> Option<&Table> {
        self.inner.delegate.as_ref()
    }

    /// Look up a member on this table, then along the delegate chain
    pub fn get(&self, key: &str) -> Option<Value> {
        let mut current = Some(self);
        while let Some(table) = current {
            if let Some(v) = table.get_own(key) {
                return Some(v);
            }
            current = table.delegate();
        }
        None
    }

    /// Look up an own member only
    pub fn get_own(&self, key: &str) -> Option<Value> {
        self.inner.own.read().get(key).cloned()
    }

    /// Check for a member here or along the delegate chain
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Check for an own member only
    pub fn has_own(&self, key: &str) -> bool {
        self.inner.own.read().contains_key(key)
    }

    /// Set an own member, shadowing any delegated one
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.inner.own.write().insert(key.to_string(), value.into());
    }

    /// Remove an own member; delegated members become visible again
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.own.write().remove(key)
    }

    /// Shallow-merge `props` into the own members, later keys overriding
    pub fn extend(&self, props: Properties) {
        self.inner.own.write().extend(props);
    }

    /// Snapshot of the own members
    pub fn own_props(&self) -> Properties {
        self.inner.own.read().clone()
    }

    /// Own member names, sorted
    pub fn own_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.inner.own.read().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// All visible member names (own and delegated), sorted and deduplicated
    pub fn keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        let mut current = Some(self);
        while let Some(table) = current {
            keys.extend(table.inner.own.read().keys().cloned());
            current = table.delegate();
        }
        keys.sort();
        keys.dedup();
        keys
    }

    /// Check whether `other` is reachable from this table by delegation
    /// (excluding the table itself)
    pub fn delegates_to(&self, other: &Table) -> bool {
        let mut current = self.delegate();
        while let Some(table) = current {
            if table.ptr_eq(other) {
                return true;
            }
            current = table.delegate();
        }
        false
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Table) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Resolved view of the data members as a JSON object
    pub fn to_json(&self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        for key in self.keys() {
            match self.get(&key) {
                Some(Value::Data(v)) => {
                    map.insert(key, v);
                }
                Some(Value::Table(t)) => {
                    map.insert(key, t.to_json());
                }
                _ => {}
            }
        }
        serde_json::Value::Object(map)
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("own", &self.own_keys())
            .field("delegates", &self.delegate().is_some())
            .finish()
    }
}

impl Serialize for Table {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let resolved = self.to_json();
        let serde_json::Value::Object(map) = resolved else {
            return serializer.serialize_map(Some(0))?.end();
        };
        let mut out = serializer.serialize_map(Some(map.len()))?;
        for (k, v) in &map {
            out.serialize_entry(k, v)?;
        }
        out.end()
    }
}
