//! Named types: the alias registry and late binding.
//!
//! A parser building a type expression may reference names whose types
//! are constructed later in the same batch, including the type being
//! built itself. It emits [`Type::alias`] placeholders and, once the
//! batch is constructed, calls [`resolve`] with a provider (usually an
//! [`AliasMap`]). Every placeholder is bound exactly once; published
//! types are immutable thereafter.
//!
//! A placeholder whose target (transitively) contains the placeholder
//! itself would form a reference cycle, so such bindings are made
//! through a weak edge; the registry's strong reference keeps the type
//! alive for as long as the name is published.

use std::sync::{Arc, OnceLock, Weak};

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::string::Str;
use crate::ty::{Type, TypeKind};
use crate::value::Value;

/// The one-shot binding of an alias placeholder.
pub(crate) enum AliasBinding {
    /// The common case: the alias owns a reference to its target.
    Bound(Type),
    /// A self-referential alias: the target contains this placeholder,
    /// so the edge is weak to avoid a reference cycle.
    Cyclic(Weak<TypeKind>),
}

/// A named placeholder inside a type, bound once by [`resolve`].
pub struct AliasData {
    name: Str,
    binding: OnceLock<AliasBinding>,
}

impl AliasData {
    pub(crate) fn new(name: Str) -> AliasData {
        AliasData {
            name,
            binding: OnceLock::new(),
        }
    }

    /// The alias name.
    #[inline]
    pub fn name(&self) -> &Str {
        &self.name
    }

    /// The bound target, when resolution has happened and the target
    /// is still alive.
    pub fn resolved(&self) -> Option<Type> {
        match self.binding.get()? {
            AliasBinding::Bound(t) => Some(t.clone()),
            AliasBinding::Cyclic(weak) => weak.upgrade().map(Type::from_arc),
        }
    }

    fn bind(&self, binding: AliasBinding) {
        let _ = self.binding.set(binding);
    }
}

/// Supplies concrete types for alias names during resolution.
pub trait AliasProvider {
    /// The type registered under `name`, when one exists.
    fn replace(&self, name: &str) -> Option<Type>;
}

/// Bind every unresolved alias placeholder reachable from `t` using
/// `provider`. Runs once per placeholder; placeholders whose name the
/// provider does not know are left unbound.
pub fn resolve(t: &Type, provider: &dyn AliasProvider) {
    let mut seen = FxHashSet::default();
    resolve_walk(t, provider, &mut seen);
}

fn resolve_walk(t: &Type, provider: &dyn AliasProvider, seen: &mut FxHashSet<usize>) {
    if !seen.insert(t.ptr_id()) {
        return;
    }
    match t.kind() {
        TypeKind::Alias(alias) => {
            if let Some(existing) = alias.resolved() {
                resolve_walk(&existing, provider, seen);
                return;
            }
            let Some(target) = provider.replace(alias.name()) else {
                return;
            };
            // A name bound to its own placeholder denotes nothing.
            if target.ptr_eq(t) {
                return;
            }
            if occurs(&target, t.ptr_id()) {
                tracing::debug!(name = %alias.name(), "alias bound through weak edge");
                alias.bind(AliasBinding::Cyclic(Arc::downgrade(target.arc())));
            } else {
                alias.bind(AliasBinding::Bound(target.clone()));
            }
            resolve_walk(&target, provider, seen);
        }
        TypeKind::ArraySized { elem, .. } => resolve_walk(elem, provider, seen),
        TypeKind::Tuple { types, .. } => {
            for t in types {
                resolve_walk(t, provider, seen);
            }
        }
        TypeKind::MapSized { key, value, .. } => {
            resolve_walk(key, provider, seen);
            resolve_walk(value, provider, seen);
        }
        TypeKind::StructMap { entries, .. } => {
            for e in entries {
                resolve_walk(e.key(), provider, seen);
                resolve_walk(e.value(), provider, seen);
            }
        }
        TypeKind::AllOf(ts) | TypeKind::AnyOf(ts) | TypeKind::OneOf(ts) => {
            for t in ts {
                resolve_walk(t, provider, seen);
            }
        }
        TypeKind::Not(inner) => resolve_walk(inner, provider, seen),
        TypeKind::Meta(Some(op)) => resolve_walk(op, provider, seen),
        TypeKind::Exact(Value::Type(inner)) => resolve_walk(inner, provider, seen),
        _ => {}
    }
}

/// Whether the placeholder with identity `alias_id` occurs inside
/// `t`'s reachable graph.
fn occurs(t: &Type, alias_id: usize) -> bool {
    fn walk(t: &Type, alias_id: usize, seen: &mut FxHashSet<usize>) -> bool {
        if t.ptr_id() == alias_id {
            return true;
        }
        if !seen.insert(t.ptr_id()) {
            return false;
        }
        match t.kind() {
            TypeKind::Alias(alias) => match alias.resolved() {
                Some(target) => walk(&target, alias_id, seen),
                None => false,
            },
            TypeKind::ArraySized { elem, .. } => walk(elem, alias_id, seen),
            TypeKind::Tuple { types, .. } => {
                types.iter().any(|t| walk(t, alias_id, seen))
            }
            TypeKind::MapSized { key, value, .. } => {
                walk(key, alias_id, seen) || walk(value, alias_id, seen)
            }
            TypeKind::StructMap { entries, .. } => entries.iter().any(|e| {
                walk(e.key(), alias_id, seen) || walk(e.value(), alias_id, seen)
            }),
            TypeKind::AllOf(ts) | TypeKind::AnyOf(ts) | TypeKind::OneOf(ts) => {
                ts.iter().any(|t| walk(t, alias_id, seen))
            }
            TypeKind::Not(inner) => walk(inner, alias_id, seen),
            TypeKind::Meta(Some(op)) => walk(op, alias_id, seen),
            TypeKind::Exact(Value::Type(inner)) => walk(inner, alias_id, seen),
            _ => false,
        }
    }
    walk(t, alias_id, &mut FxHashSet::default())
}

struct AliasMapInner {
    by_name: FxHashMap<Str, Type>,
    by_type: FxHashMap<Type, Str>,
}

/// A registry mapping names to types and back.
///
/// Reads and writes are reader-writer guarded; once a type is published
/// here it is treated as immutable. A process-wide default instance is
/// available through [`AliasMap::default_instance`].
pub struct AliasMap {
    inner: RwLock<AliasMapInner>,
}

static DEFAULT: Lazy<AliasMap> = Lazy::new(AliasMap::new);

impl AliasMap {
    pub fn new() -> AliasMap {
        AliasMap {
            inner: RwLock::new(AliasMapInner {
                by_name: FxHashMap::default(),
                by_type: FxHashMap::default(),
            }),
        }
    }

    /// The process-wide default registry.
    pub fn default_instance() -> &'static AliasMap {
        &DEFAULT
    }

    /// Publish `t` under `name`, replacing any previous binding of the
    /// name.
    pub fn add(&self, t: Type, name: impl Into<Str>) {
        let name = name.into();
        tracing::debug!(%name, "alias registered");
        let mut inner = self.inner.write();
        inner.by_type.insert(t.clone(), name.clone());
        inner.by_name.insert(name, t);
    }

    /// The type registered under `name`.
    pub fn get_type(&self, name: &str) -> Option<Type> {
        self.inner.read().by_name.get(name).cloned()
    }

    /// The name `t` was registered under.
    pub fn get_name(&self, t: &Type) -> Option<Str> {
        self.inner.read().by_type.get(t).cloned()
    }
}

impl Default for AliasMap {
    fn default() -> Self {
        AliasMap::new()
    }
}

impl AliasProvider for AliasMap {
    fn replace(&self, name: &str) -> Option<Type> {
        self.get_type(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::StructMapEntry;

    #[test]
    fn resolves_forward_references() {
        let aliases = AliasMap::new();
        aliases.add(Type::integer(), "Port");
        let t = Type::array_of(Type::alias("Port"));
        resolve(&t, &aliases);
        assert!(t.instance(&Value::array(vec![Value::from(80)])));
        assert!(!t.instance(&Value::array(vec![Value::from("http")])));
    }

    #[test]
    fn unknown_names_stay_unbound() {
        let aliases = AliasMap::new();
        let t = Type::alias("Missing");
        resolve(&t, &aliases);
        assert!(!t.instance(&Value::from(1)));
    }

    #[test]
    fn self_referential_alias_binds_weakly() {
        let aliases = AliasMap::new();
        let placeholder = Type::alias("Tree");
        let tree = Type::struct_map(
            vec![
                StructMapEntry::named("value", Type::integer(), true),
                StructMapEntry::named("left", placeholder.clone(), false),
            ],
            false,
        )
        .expect("valid struct map");
        aliases.add(tree.clone(), "Tree");
        resolve(&tree, &aliases);

        let leaf = Value::map(vec![(Value::from("value"), Value::from(1))]);
        let node = Value::map(vec![
            (Value::from("value"), Value::from(2)),
            (Value::from("left"), leaf),
        ]);
        assert!(tree.instance(&node));
        let bad = Value::map(vec![
            (Value::from("value"), Value::from(2)),
            (Value::from("left"), Value::from(3)),
        ]);
        assert!(!tree.instance(&bad));
    }

    #[test]
    fn registry_maps_both_directions() {
        let aliases = AliasMap::new();
        aliases.add(Type::string(), "Name");
        assert_eq!(aliases.get_type("Name"), Some(Type::string()));
        assert_eq!(
            aliases.get_name(&Type::string()).as_deref(),
            Some("Name")
        );
    }
}
