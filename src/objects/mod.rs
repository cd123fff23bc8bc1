//! Object system - classes over delegating member tables

mod class;
mod descriptor;
mod error;
mod hooks;
mod object;
mod table;
mod value;

pub use class::Class;
pub use descriptor::ClassDescriptor;
pub use error::ClassError;
pub use hooks::{Hook, HookFn, HookKind};
pub use object::{construct, Instance};
pub use table::Table;
pub use value::{props, Method, Properties, Value};
