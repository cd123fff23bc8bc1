//! protoclass - classical inheritance over delegating member tables
//!
//! Classes are built with [`Class::extend`] from a parent class and a
//! [`ClassDescriptor`]. Instances look members up on themselves, then along
//! the prototype chain. Each class may carry default options that delegate
//! to its parent's, and init/destroy hooks that run ancestor-first, once
//! per instance.
//!
//! ```
//! use protoclass::{Class, ClassDescriptor, Value};
//! use serde_json::json;
//!
//! let base = Class::root()
//!     .extend(
//!         ClassDescriptor::new()
//!             .name("Base")
//!             .option("a", json!(1))
//!             .initialize(|this, _| {
//!                 this.set("seen", json!(true));
//!                 Ok(Value::null())
//!             }),
//!     )
//!     .unwrap();
//! let child = base
//!     .extend(ClassDescriptor::new().name("Child").option("b", json!(2)))
//!     .unwrap();
//!
//! let obj = child.new_instance(&[]).unwrap();
//! assert_eq!(obj.get("seen").and_then(|v| v.as_bool()), Some(true));
//! let options = obj.options().unwrap();
//! assert_eq!(options.get("a").and_then(|v| v.as_i64()), Some(1));
//! assert_eq!(options.get("b").and_then(|v| v.as_i64()), Some(2));
//! ```

pub mod objects;

pub use objects::{
    construct, props, Class, ClassDescriptor, ClassError, Hook, HookFn, HookKind, Instance,
    Method, Properties, Table, Value,
};
