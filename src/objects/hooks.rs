//! Init and destroy hook chains
//!
//! Each class keeps its own ordered hook lists. Running a chain on an
//! instance walks to the root first, so ancestors' hooks fire before
//! descendants', and marks the instance so the chain runs at most once.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use super::{Class, ClassError, Instance, Value};

/// A registered hook, invoked with the instance as receiver
pub type HookFn = Arc<dyn Fn(&Instance) -> Result<(), ClassError> + Send + Sync>;

/// Lifecycle event a hook chain belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    Init,
    Destroy,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::Init => f.write_str("init"),
            HookKind::Destroy => f.write_str("destroy"),
        }
    }
}

/// Hook registration: a callable, or a member name plus bound arguments
#[derive(Clone)]
pub enum Hook {
    Direct(HookFn),
    Named { method: String, args: Vec<Value> },
}

impl Hook {
    /// A hook that calls `f` with the instance
    pub fn direct<F>(f: F) -> Self
    where
        F: Fn(&Instance) -> Result<(), ClassError> + Send + Sync + 'static,
    {
        Hook::Direct(Arc::new(f))
    }

    /// A hook that invokes the instance member `method` with `args`
    pub fn named(method: &str, args: Vec<Value>) -> Self {
        Hook::Named {
            method: method.to_string(),
            args,
        }
    }

    /// Resolve into a uniform callable. Named hooks look the member up
    /// on the instance when they run, not when registered.
    pub(crate) fn into_fn(self) -> HookFn {
        match self {
            Hook::Direct(f) => f,
            Hook::Named { method, args } => {
                let f: HookFn = Arc::new(move |instance: &Instance| {
                    instance.call(&method, &args).map(|_| ())
                });
                f
            }
        }
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hook::Direct(_) => f.write_str("Hook::Direct(..)"),
            Hook::Named { method, args } => f
                .debug_struct("Hook::Named")
                .field("method", method)
                .field("args", args)
                .finish(),
        }
    }
}

impl From<&str> for Hook {
    fn from(method: &str) -> Self {
        Hook::named(method, Vec::new())
    }
}

/// Run `kind` hooks of `class` (and, first, of its ancestors) on `instance`
///
/// The instance flag is claimed atomically before any hook runs, so
/// concurrent callers on the same instance run the chain once between them.
pub(crate) fn run_chain(class: &Class, instance: &Instance, kind: HookKind) -> Result<(), ClassError> {
    // The root has no runner of its own.
    if class.parent().is_none() {
        return Ok(());
    }

    if !instance.claim_hooks(kind) {
        return Ok(());
    }

    run_levels(class, instance, kind)
}

fn run_levels(class: &Class, instance: &Instance, kind: HookKind) -> Result<(), ClassError> {
    let Some(parent) = class.parent() else {
        return Ok(());
    };
    run_levels(parent, instance, kind)?;

    // Snapshot so hooks may register further hooks without holding the lock.
    let hooks = class.hooks(kind);
    trace!(class = %class.name(), %kind, count = hooks.len(), "running hooks");
    for hook in hooks {
        hook(instance)?;
    }

    Ok(())
}
