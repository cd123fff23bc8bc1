//! Instances and construction

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

use super::hooks::{run_chain, HookKind};
use super::{Class, ClassError, Properties, Table, Value};

struct InstanceInner {
    class: Class,
    fields: RwLock<Properties>,
    init_hooks_called: AtomicBool,
    destroy_hooks_called: AtomicBool,
}

/// An object created from a class
///
/// Own fields are checked first; anything unset resolves through the
/// class prototype chain.
#[derive(Clone)]
pub struct Instance {
    inner: Arc<InstanceInner>,
}

impl Instance {
    fn alloc(class: &Class) -> Self {
        Self {
            inner: Arc::new(InstanceInner {
                class: class.clone(),
                fields: RwLock::new(Properties::new()),
                init_hooks_called: AtomicBool::new(false),
                destroy_hooks_called: AtomicBool::new(false),
            }),
        }
    }

    /// The class this instance was allocated from
    pub fn class(&self) -> &Class {
        &self.inner.class
    }

    /// Look up a member: own fields, then the prototype chain
    pub fn get(&self, key: &str) -> Option<Value> {
        self.get_own(key)
            .or_else(|| self.inner.class.prototype().get(key))
    }

    /// Look up an own field only
    pub fn get_own(&self, key: &str) -> Option<Value> {
        self.inner.fields.read().get(key).cloned()
    }

    /// Check for a member here or along the prototype chain
    pub fn has(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Set an own field, shadowing any prototype member
    pub fn set(&self, key: &str, value: impl Into<Value>) {
        self.inner.fields.write().insert(key.to_string(), value.into());
    }

    /// Invoke the member `name` with this instance as receiver
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value, ClassError> {
        match self.get(name) {
            Some(Value::Method(method)) => method(self, args),
            _ => Err(ClassError::NotCallable(name.to_string())),
        }
    }

    /// The options table visible to this instance, if any
    pub fn options(&self) -> Option<Table> {
        self.get("options").and_then(|v| v.as_table().cloned())
    }

    /// Check prototype-chain membership
    pub fn is_instance_of(&self, class: &Class) -> bool {
        let own = self.inner.class.prototype();
        own.ptr_eq(class.prototype()) || own.delegates_to(class.prototype())
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Instance) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Run the init hooks of every class level, ancestors first, once
    pub fn call_init_hooks(&self) -> Result<(), ClassError> {
        run_chain(self.class(), self, HookKind::Init)
    }

    /// Run the destroy hooks of every class level, ancestors first, once
    pub fn call_destroy_hooks(&self) -> Result<(), ClassError> {
        run_chain(self.class(), self, HookKind::Destroy)
    }

    /// Whether the init chain has run (or is running) on this instance
    pub fn init_hooks_called(&self) -> bool {
        self.hooks_called(HookKind::Init)
    }

    /// Whether the destroy chain has run (or is running) on this instance
    pub fn destroy_hooks_called(&self) -> bool {
        self.hooks_called(HookKind::Destroy)
    }

    fn flag(&self, kind: HookKind) -> &AtomicBool {
        match kind {
            HookKind::Init => &self.inner.init_hooks_called,
            HookKind::Destroy => &self.inner.destroy_hooks_called,
        }
    }

    pub(crate) fn hooks_called(&self, kind: HookKind) -> bool {
        self.flag(kind).load(Ordering::Acquire)
    }

    /// Atomically mark the chain as run; false if it already was
    pub(crate) fn claim_hooks(&self, kind: HookKind) -> bool {
        self.flag(kind)
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<String> = self.inner.fields.read().keys().cloned().collect();
        fields.sort();
        f.debug_struct("Instance")
            .field("class", &self.inner.class.name())
            .field("fields", &fields)
            .finish()
    }
}

/// Construct an instance of `class`
///
/// Every instantiation path ends here. The initializer is resolved through
/// the prototype chain and called with `args`; the init-hook chain then
/// runs on the freshly allocated instance. If the initializer returns an
/// instance, that instance is the result instead.
pub fn construct(class: &Class, args: &[Value]) -> Result<Instance, ClassError> {
    let instance = Instance::alloc(class);
    trace!(class = %class.name(), args = args.len(), "constructing instance");

    let returned = match instance.get("initialize") {
        Some(Value::Method(init)) => init(&instance, args)?,
        Some(_) => return Err(ClassError::NotCallable("initialize".to_string())),
        None => Value::null(),
    };

    instance.call_init_hooks()?;

    match returned {
        Value::Instance(other) => Ok(other),
        _ => Ok(instance),
    }
}
