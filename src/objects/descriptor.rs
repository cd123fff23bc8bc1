//! Class descriptors passed to `Class::extend`

use std::sync::Arc;

use super::{ClassError, Instance, Method, Properties, Table, Value};

/// The definition of a new class
///
/// Consumed by [`Class::extend`](super::Class::extend). Statics are hoisted
/// onto the class, mixins and members onto its prototype, and options are
/// merged over the parent's defaults.
#[derive(Default)]
pub struct ClassDescriptor {
    pub(crate) name: Option<String>,
    pub(crate) statics: Option<Properties>,
    pub(crate) includes: Vec<Properties>,
    pub(crate) options: Option<Properties>,
    pub(crate) initialize: Option<Method>,
    pub(crate) members: Properties,
}

impl ClassDescriptor {
    /// Create an empty descriptor
    pub fn new() -> Self {
        Self::default()
    }

    /// Name used in logs and debug output
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Merge static members onto the class
    pub fn statics(mut self, statics: Properties) -> Self {
        self.statics.get_or_insert_with(Properties::new).extend(statics);
        self
    }

    /// Set a single static member
    pub fn with_static(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.statics
            .get_or_insert_with(Properties::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Append a mixin; later mixins override earlier ones
    pub fn include(mut self, mixin: Properties) -> Self {
        self.includes.push(mixin);
        self
    }

    /// Merge default options
    pub fn options(mut self, options: Properties) -> Self {
        self.options.get_or_insert_with(Properties::new).extend(options);
        self
    }

    /// Set a single default option
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options
            .get_or_insert_with(Properties::new)
            .insert(key.to_string(), value.into());
        self
    }

    /// Merge default options from a JSON object
    pub fn options_json(self, options: serde_json::Value) -> Result<Self, ClassError> {
        let table = Table::from_json(options)?;
        Ok(self.options(table.own_props()))
    }

    /// Set the constructor body
    pub fn initialize<F>(mut self, f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value, ClassError> + Send + Sync + 'static,
    {
        self.initialize = Some(Arc::new(f));
        self
    }

    /// Set a prototype member
    pub fn member(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.members.insert(key.to_string(), value.into());
        self
    }

    /// Set a prototype method
    pub fn method<F>(self, key: &str, f: F) -> Self
    where
        F: Fn(&Instance, &[Value]) -> Result<Value, ClassError> + Send + Sync + 'static,
    {
        self.member(key, Value::method(f))
    }

    /// Merge several prototype members
    pub fn members(mut self, members: Properties) -> Self {
        self.members.extend(members);
        self
    }
}
