//! Class system with inheritance

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use super::hooks::{Hook, HookFn, HookKind};
use super::object::construct;
use super::{ClassDescriptor, ClassError, Instance, Properties, Table, Value};

const ROOT_NAME: &str = "Class";
const ANONYMOUS_NAME: &str = "anonymous";

struct ClassInner {
    name: String,
    /// Immediate parent (None for the root). Only used to walk hook chains
    /// and class ancestry; member lookup goes through the prototype.
    parent: Option<Class>,
    prototype: Table,
    statics: RwLock<Properties>,
    init_hooks: RwLock<Vec<HookFn>>,
    destroy_hooks: RwLock<Vec<HookFn>>,
}

/// A class: a prototype table, static members and lifecycle hooks
///
/// Cloning yields another handle to the same class.
#[derive(Clone)]
pub struct Class {
    inner: Arc<ClassInner>,
}

impl Class {
    /// Create a new root class
    ///
    /// The root has an empty prototype, no statics and no hook runner. Each
    /// call returns an independent root; there is no global class table.
    pub fn root() -> Self {
        Self::from_parts(ROOT_NAME.to_string(), None, Table::new(), Properties::new())
    }

    fn from_parts(name: String, parent: Option<Class>, prototype: Table, statics: Properties) -> Self {
        Self {
            inner: Arc::new(ClassInner {
                name,
                parent,
                prototype,
                statics: RwLock::new(statics),
                init_hooks: RwLock::new(Vec::new()),
                destroy_hooks: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Derive a new class from this one
    ///
    /// The new prototype delegates to this class's prototype. Statics are
    /// copied (a snapshot), then overridden by the descriptor's statics.
    /// Mixins are merged onto the prototype in order, then the options
    /// object is rebuilt to delegate to the inherited one, then the
    /// remaining members are merged on top. Hook lists start empty.
    ///
    /// This class and its prototype are never modified.
    pub fn extend(&self, descriptor: ClassDescriptor) -> Result<Class, ClassError> {
        let ClassDescriptor {
            name,
            statics,
            includes,
            options,
            initialize,
            mut members,
        } = descriptor;

        let prototype = Table::create(self.prototype());

        let mut class_statics = self.statics();
        let static_count = statics.as_ref().map_or(0, |s| s.len());
        if let Some(statics) = statics {
            class_statics.extend(statics);
        }

        let mixin_count = includes.len();
        for mixin in includes {
            prototype.extend(mixin);
        }

        // An `options` member and the descriptor's options feed the same
        // merge; a member table contributes its own keys first.
        let member_options = members.remove("options");

        // Looked up after mixins are applied, so a mixin can supply options.
        match prototype.get("options") {
            Some(Value::Table(inherited)) => {
                let merged = Table::create(&inherited);
                if let Some(Value::Table(table)) = &member_options {
                    merged.extend(table.own_props());
                }
                if let Some(options) = options {
                    merged.extend(options);
                }
                members.insert("options".to_string(), Value::Table(merged));
            }
            Some(v) if v.is_truthy() => return Err(ClassError::NotATable("options".to_string())),
            _ => match (member_options, options) {
                (Some(Value::Table(table)), Some(options)) => {
                    table.extend(options);
                    members.insert("options".to_string(), Value::Table(table));
                }
                (_, Some(options)) => {
                    members.insert("options".to_string(), Value::Table(Table::from_props(options)));
                }
                (Some(member), None) => {
                    members.insert("options".to_string(), member);
                }
                (None, None) => {}
            },
        }

        if let Some(initialize) = initialize {
            members.insert("initialize".to_string(), Value::Method(initialize));
        }

        let member_count = members.len();
        prototype.extend(members);

        let class = Self::from_parts(
            name.unwrap_or_else(|| ANONYMOUS_NAME.to_string()),
            Some(self.clone()),
            prototype,
            class_statics,
        );

        debug!(
            class = %class.name(),
            parent = %self.name(),
            statics = static_count,
            mixins = mixin_count,
            members = member_count,
            "extended class"
        );

        Ok(class)
    }

    /// Merge members into the prototype of this already-defined class
    ///
    /// Existing instances see the new members immediately.
    pub fn include(&self, props: Properties) {
        debug!(class = %self.name(), members = props.len(), "including mixin");
        self.inner.prototype.extend(props);
    }

    /// Merge new default options into this class's options object
    pub fn merge_options(&self, options: Properties) -> Result<(), ClassError> {
        match self.inner.prototype.get("options") {
            Some(Value::Table(table)) => {
                table.extend(options);
                Ok(())
            }
            Some(v) if v.is_truthy() => Err(ClassError::NotATable("options".to_string())),
            _ => Err(ClassError::NoOptions),
        }
    }

    /// Register a hook to run at the end of construction
    pub fn add_init_hook(&self, hook: impl Into<Hook>) {
        self.add_hook(HookKind::Init, hook.into());
    }

    /// Register a hook to run when an instance's destroy chain is invoked
    pub fn add_destroy_hook(&self, hook: impl Into<Hook>) {
        self.add_hook(HookKind::Destroy, hook.into());
    }

    fn add_hook(&self, kind: HookKind, hook: Hook) {
        debug!(class = %self.name(), %kind, hook = ?hook, "adding hook");
        self.hook_list(kind).write().push(hook.into_fn());
    }

    fn hook_list(&self, kind: HookKind) -> &RwLock<Vec<HookFn>> {
        match kind {
            HookKind::Init => &self.inner.init_hooks,
            HookKind::Destroy => &self.inner.destroy_hooks,
        }
    }

    /// Snapshot of this class's own hooks (ancestors' are not included)
    pub(crate) fn hooks(&self, kind: HookKind) -> Vec<HookFn> {
        self.hook_list(kind).read().clone()
    }

    /// Number of hooks registered directly on this class
    pub fn hook_count(&self, kind: HookKind) -> usize {
        self.hook_list(kind).read().len()
    }

    /// Instantiate the class
    pub fn new_instance(&self, args: &[Value]) -> Result<Instance, ClassError> {
        construct(self, args)
    }

    /// Call the class as a plain function; identical to `new_instance`
    pub fn call(&self, args: &[Value]) -> Result<Instance, ClassError> {
        construct(self, args)
    }

    /// Class name (e.g., "Class", "Layer")
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The class this one was extended from (None for the root)
    pub fn parent(&self) -> Option<&Class> {
        self.inner.parent.as_ref()
    }

    /// The shared member table instances delegate to
    pub fn prototype(&self) -> &Table {
        &self.inner.prototype
    }

    /// The default options visible through the prototype, if any
    pub fn options(&self) -> Option<Table> {
        self.inner
            .prototype
            .get("options")
            .and_then(|v| v.as_table().cloned())
    }

    /// Get a static member
    pub fn get_static(&self, key: &str) -> Option<Value> {
        self.inner.statics.read().get(key).cloned()
    }

    /// Set a static member. Classes already extended from this one keep
    /// the statics they copied.
    pub fn set_static(&self, key: &str, value: impl Into<Value>) {
        self.inner.statics.write().insert(key.to_string(), value.into());
    }

    /// Check for a static member
    pub fn has_static(&self, key: &str) -> bool {
        self.inner.statics.read().contains_key(key)
    }

    /// Snapshot of all static members
    pub fn statics(&self) -> Properties {
        self.inner.statics.read().clone()
    }

    /// Get the inheritance chain of names (child -> ... -> root)
    pub fn chain(&self) -> Vec<String> {
        let mut chain = Vec::new();
        let mut current = Some(self);
        while let Some(class) = current {
            chain.push(class.name().to_string());
            current = class.parent();
        }
        chain
    }

    /// Check if this class strictly descends from `ancestor`
    pub fn is_subclass_of(&self, ancestor: &Class) -> bool {
        self.prototype().delegates_to(ancestor.prototype())
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Class) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Class")
            .field("name", &self.inner.name)
            .field("parent", &self.parent().map(|p| p.name().to_string()))
            .field("prototype", &self.inner.prototype)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::props;
    use serde_json::json;

    fn base_classes() -> (Class, Class, Class, Class) {
        let thing = Class::root()
            .extend(
                ClassDescriptor::new()
                    .name("thing")
                    .member("name", json!(""))
                    .member("description", json!("")),
            )
            .unwrap();
        let item = thing
            .extend(
                ClassDescriptor::new()
                    .name("item")
                    .member("weight", json!(0))
                    .member("fixed", json!(false)),
            )
            .unwrap();
        let weapon = item
            .extend(
                ClassDescriptor::new()
                    .name("weapon")
                    .member("damage_dice", json!("1d6")),
            )
            .unwrap();
        let living = thing
            .extend(ClassDescriptor::new().name("living").member("hp", json!(100)))
            .unwrap();
        (thing, item, weapon, living)
    }

    #[test]
    fn test_class_creation() {
        let (thing, item, _, _) = base_classes();
        assert_eq!(item.name(), "item");
        assert!(item.parent().unwrap().ptr_eq(&thing));
        assert!(Class::root().parent().is_none());
        assert_eq!(Class::root().name(), "Class");
    }

    #[test]
    fn test_inheritance_chain() {
        let (_, _, weapon, living) = base_classes();
        assert_eq!(weapon.chain(), vec!["weapon", "item", "thing", "Class"]);
        assert_eq!(living.chain(), vec!["living", "thing", "Class"]);
    }

    #[test]
    fn test_is_subclass_of() {
        let (thing, item, weapon, living) = base_classes();

        assert!(weapon.is_subclass_of(&item));
        assert!(weapon.is_subclass_of(&thing));
        assert!(living.is_subclass_of(&thing));
        assert!(!weapon.is_subclass_of(&living));
        assert!(!thing.is_subclass_of(&weapon));
        assert!(!weapon.is_subclass_of(&weapon));
    }

    #[test]
    fn test_resolve_members() {
        let (_, _, weapon, _) = base_classes();
        let keys = weapon.prototype().keys();

        assert!(keys.contains(&"name".to_string()));
        assert!(keys.contains(&"weight".to_string()));
        assert!(keys.contains(&"damage_dice".to_string()));
        assert_eq!(weapon.prototype().own_keys(), vec!["damage_dice"]);
    }

    #[test]
    fn test_extend_leaves_parent_untouched() {
        let (thing, item, _, _) = base_classes();
        let before = thing.prototype().own_keys();

        item.extend(
            ClassDescriptor::new()
                .with_static("s", json!(1))
                .include(props([("mixed", json!(true))]))
                .option("o", json!(1))
                .member("m", json!(1)),
        )
        .unwrap();

        assert_eq!(thing.prototype().own_keys(), before);
        assert_eq!(item.prototype().own_keys(), vec!["fixed", "weight"]);
        assert!(!item.has_static("s"));
        assert!(item.options().is_none());
    }

    #[test]
    fn test_static_snapshot() {
        let parent = Class::root()
            .extend(ClassDescriptor::new().with_static("bla", json!(1)))
            .unwrap();
        let child = parent.extend(ClassDescriptor::new()).unwrap();

        parent.set_static("late", json!(true));
        parent.set_static("bla", json!(9));

        assert!(!child.has_static("late"));
        assert_eq!(child.get_static("bla").and_then(|v| v.as_i64()), Some(1));
    }

    #[test]
    fn test_root_statics_are_inherited() {
        let root = Class::root();
        root.set_static("version", json!("1.0"));
        let child = root.extend(ClassDescriptor::new()).unwrap();
        assert_eq!(
            child.get_static("version").and_then(|v| v.as_str().map(String::from)),
            Some("1.0".to_string())
        );
    }

    #[test]
    fn test_own_initialize_overrides_inherited() {
        let parent = Class::root()
            .extend(ClassDescriptor::new().initialize(|this, _| {
                this.set("who", json!("parent"));
                Ok(Value::null())
            }))
            .unwrap();
        let child = parent
            .extend(ClassDescriptor::new().initialize(|this, _| {
                this.set("who", json!("child"));
                Ok(Value::null())
            }))
            .unwrap();
        let inherits = parent.extend(ClassDescriptor::new()).unwrap();

        let c = child.new_instance(&[]).unwrap();
        assert_eq!(c.get("who").and_then(|v| v.as_str().map(String::from)), Some("child".to_string()));
        let i = inherits.new_instance(&[]).unwrap();
        assert_eq!(i.get("who").and_then(|v| v.as_str().map(String::from)), Some("parent".to_string()));
    }

    #[test]
    fn test_mixin_supplies_options() {
        let class = Class::root()
            .extend(ClassDescriptor::new().include(props([(
                "options",
                Value::Table(Table::from_props(props([("a", json!(1))]))),
            )])))
            .unwrap();
        let child = class.extend(ClassDescriptor::new().option("b", json!(2))).unwrap();
        let options = child.options().unwrap();
        assert_eq!(options.get("a").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(options.get("b").and_then(|v| v.as_i64()), Some(2));
    }

    #[test]
    fn test_non_table_options_rejected() {
        let class = Class::root()
            .extend(ClassDescriptor::new().member("options", json!(5)))
            .unwrap();
        assert!(matches!(
            class.extend(ClassDescriptor::new()),
            Err(ClassError::NotATable(_))
        ));
        assert!(matches!(
            class.merge_options(Properties::new()),
            Err(ClassError::NotATable(_))
        ));
    }

    #[test]
    fn test_member_options_merge_over_inherited() {
        let parent = Class::root()
            .extend(ClassDescriptor::new().option("a", json!(1)).option("c", json!(1)))
            .unwrap();
        let member_table = Table::from_props(props([("b", json!(2)), ("c", json!(2))]));
        let child = parent
            .extend(
                ClassDescriptor::new()
                    .member("options", member_table.clone())
                    .option("c", json!(3)),
            )
            .unwrap();

        let options = child.options().unwrap();
        assert_eq!(options.get("a").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(options.get("b").and_then(|v| v.as_i64()), Some(2));
        assert_eq!(options.get("c").and_then(|v| v.as_i64()), Some(3));
        assert!(options.delegates_to(&parent.options().unwrap()));
        assert!(!options.ptr_eq(&member_table));
    }

    #[test]
    fn test_members_options_merge_over_inherited() {
        let parent = Class::root()
            .extend(ClassDescriptor::new().option("a", json!(1)))
            .unwrap();
        let child = parent
            .extend(ClassDescriptor::new().members(props([(
                "options",
                Value::Table(Table::from_props(props([("b", json!(2))]))),
            )])))
            .unwrap();

        let options = child.options().unwrap();
        assert_eq!(options.get("a").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(options.get("b").and_then(|v| v.as_i64()), Some(2));
    }

    #[test]
    fn test_member_options_without_inherited_options() {
        let table = Table::from_props(props([("b", json!(2))]));
        let class = Class::root()
            .extend(ClassDescriptor::new().member("options", table.clone()))
            .unwrap();
        assert!(class.options().unwrap().ptr_eq(&table));

        let child = class.extend(ClassDescriptor::new().option("c", json!(3))).unwrap();
        let options = child.options().unwrap();
        assert_eq!(options.get("b").and_then(|v| v.as_i64()), Some(2));
        assert_eq!(options.get("c").and_then(|v| v.as_i64()), Some(3));
    }

    #[test]
    fn test_falsy_options_skip_merge() {
        for falsy in [json!(null), json!(false), json!(0), json!("")] {
            let class = Class::root()
                .extend(ClassDescriptor::new().member("options", falsy.clone()))
                .unwrap();

            let plain = class.extend(ClassDescriptor::new()).unwrap();
            assert!(plain.options().is_none());
            assert_eq!(plain.prototype().get("options").and_then(|v| v.as_data().cloned()), Some(falsy.clone()));

            let child = class.extend(ClassDescriptor::new().option("x", json!(1))).unwrap();
            let options = child.options().unwrap();
            assert_eq!(options.get("x").and_then(|v| v.as_i64()), Some(1));
            assert!(options.delegate().is_none());

            assert!(matches!(
                class.merge_options(props([("x", json!(1))])),
                Err(ClassError::NoOptions)
            ));
        }
    }

    #[test]
    fn test_merge_options_without_options() {
        let class = Class::root().extend(ClassDescriptor::new()).unwrap();
        assert!(matches!(
            class.merge_options(props([("a", json!(1))])),
            Err(ClassError::NoOptions)
        ));
    }

    #[test]
    fn test_merge_options_in_place() {
        let class = Class::root()
            .extend(ClassDescriptor::new().option("a", json!(1)).option("b", json!(2)))
            .unwrap();
        let before = class.options().unwrap();

        class.merge_options(props([("b", json!(3)), ("c", json!(4))])).unwrap();

        let after = class.options().unwrap();
        assert!(before.ptr_eq(&after));
        assert_eq!(after.get("a").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(after.get("b").and_then(|v| v.as_i64()), Some(3));
        assert_eq!(after.get("c").and_then(|v| v.as_i64()), Some(4));
    }

    #[test]
    fn test_hook_lists_are_per_class() {
        let parent = Class::root().extend(ClassDescriptor::new()).unwrap();
        parent.add_init_hook(Hook::direct(|_| Ok(())));
        let child = parent.extend(ClassDescriptor::new()).unwrap();

        assert_eq!(child.hook_count(HookKind::Init), 0);
        child.add_init_hook("missing");
        child.add_destroy_hook("missing");
        assert_eq!(parent.hook_count(HookKind::Init), 1);
        assert_eq!(parent.hook_count(HookKind::Destroy), 0);
        assert_eq!(child.hook_count(HookKind::Init), 1);
        assert_eq!(child.hook_count(HookKind::Destroy), 1);
    }
}
