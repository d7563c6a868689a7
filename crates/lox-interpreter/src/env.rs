use std::ops::Deref;

use gc::{Finalize, Gc, GcCell, Trace};
use rustc_hash::FxHashMap;

use crate::object::Object;

/// A scope of variable bindings, shared between every closure that captured
/// it. Cloning an `Env` clones the handle, not the bindings.
#[derive(Clone, Debug, Default, Finalize, Trace)]
pub struct Env(Gc<GcCell<EnvImpl>>);

impl Deref for Env {
    type Target = Gc<GcCell<EnvImpl>>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Env {
    pub fn with_parent(parent: &Env) -> Self {
        let env = EnvImpl { map: FxHashMap::default(), parent: Some(parent.clone()) };
        Self(Gc::new(GcCell::new(env)))
    }

    /// Binds `name` in this scope, replacing any previous binding.
    pub fn define(&self, name: &str, value: Object) {
        self.borrow_mut().map.insert(name.to_string(), value);
    }

    /// Looks `name` up in this scope only.
    pub fn get(&self, name: &str) -> Option<Object> {
        self.borrow().map.get(name).cloned()
    }

    /// Looks `name` up exactly `depth` scopes out from this one.
    pub fn get_at(&self, name: &str, depth: usize) -> Option<Object> {
        self.ancestor(depth)?.get(name)
    }

    /// Rebinds an existing `name` in this scope. Returns `false` if the name
    /// was never defined here.
    pub fn assign(&self, name: &str, value: Object) -> bool {
        match self.borrow_mut().map.get_mut(name) {
            Some(entry) => {
                *entry = value;
                true
            }
            None => false,
        }
    }

    pub fn assign_at(&self, name: &str, value: Object, depth: usize) -> bool {
        match self.ancestor(depth) {
            Some(env) => env.assign(name, value),
            None => false,
        }
    }

    fn ancestor(&self, depth: usize) -> Option<Env> {
        let mut env = self.clone();
        for _ in 0..depth {
            let parent = env.borrow().parent.clone()?;
            env = parent;
        }
        Some(env)
    }
}

#[derive(Debug, Default, Finalize, Trace)]
pub struct EnvImpl {
    map: FxHashMap<String, Object>,
    parent: Option<Env>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn define_and_get() {
        let env = Env::default();
        env.define("a", Object::Number(1.0));
        assert_eq!(env.get("a"), Some(Object::Number(1.0)));
        assert_eq!(env.get("b"), None);

        env.define("a", Object::Nil);
        assert_eq!(env.get("a"), Some(Object::Nil));
    }

    #[test]
    fn get_at_walks_parents() {
        let globals = Env::default();
        globals.define("a", Object::Bool(true));
        let inner = Env::with_parent(&Env::with_parent(&globals));

        assert_eq!(inner.get_at("a", 2), Some(Object::Bool(true)));
        assert_eq!(inner.get_at("a", 1), None);
        assert_eq!(inner.get_at("a", 3), None);
    }

    #[test]
    fn assign_requires_existing_binding() {
        let globals = Env::default();
        let inner = Env::with_parent(&globals);
        assert!(!inner.assign("a", Object::Nil));

        globals.define("a", Object::Number(1.0));
        assert!(inner.assign_at("a", Object::Number(2.0), 1));
        assert_eq!(globals.get("a"), Some(Object::Number(2.0)));
    }

    #[test]
    fn clones_share_bindings() {
        let env = Env::default();
        let alias = env.clone();
        alias.define("a", Object::String("shared".to_string()));
        assert_eq!(env.get("a"), Some(Object::String("shared".to_string())));
    }
}
