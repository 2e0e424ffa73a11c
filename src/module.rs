//! A Module: target info, globals, function declarations/definitions, and
//! the set of external names.

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::function::Function;
use crate::global::Global;
use crate::ref_id::Ref;

/// A compilation unit. Any Ref not present in `externals` is internal and
/// subject to renaming during linking.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Module {
    pub datalayout: String,
    pub triple: String,
    pub comdats: Vec<Ref>,
    pub globals: Vec<Global>,
    pub decls: Vec<Function>,
    pub defs: Vec<Function>,
    pub externals: IndexSet<Ref>,
}

impl Module {
    pub fn new() -> Module {
        Module {
            datalayout: String::new(),
            triple: String::new(),
            comdats: Vec::new(),
            globals: Vec::new(),
            decls: Vec::new(),
            defs: Vec::new(),
            externals: IndexSet::new(),
        }
    }

    pub fn is_external(&self, r: &Ref) -> bool {
        self.externals.contains(r)
    }

    /// Externals in deterministic order, per §3.1's Ref ordering.
    pub fn sorted_externals(&self) -> Vec<Ref> {
        let mut v: Vec<Ref> = self.externals.iter().cloned().collect();
        v.sort();
        v
    }

    pub fn find_global(&self, r: &Ref) -> Option<&Global> {
        self.globals.iter().find(|g| g.reference() == r)
    }

    pub fn find_decl(&self, r: &Ref) -> Option<&Function> {
        self.decls.iter().find(|f| f.reference() == r)
    }

    pub fn find_def(&self, r: &Ref) -> Option<&Function> {
        self.defs.iter().find(|f| f.reference() == r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::int_const;
    use crate::types::int_ty;

    #[test]
    fn new_module_is_empty() {
        let m = Module::new();
        assert!(m.globals.is_empty());
        assert!(m.defs.is_empty());
        assert!(m.externals.is_empty());
    }

    #[test]
    fn externals_sort_deterministically() {
        let mut m = Module::new();
        m.externals.insert(Ref::name("b"));
        m.externals.insert(Ref::num(1));
        m.externals.insert(Ref::name("a"));
        let sorted = m.sorted_externals();
        assert_eq!(sorted, vec![Ref::num(1), Ref::name("a"), Ref::name("b")]);
    }

    #[test]
    fn find_global_looks_up_by_ref() {
        let mut m = Module::new();
        m.globals.push(Global::new(int_ty(32), Ref::name("g"), Some(int_const(int_ty(32), 0))));
        assert!(m.find_global(&Ref::name("g")).is_some());
        assert!(m.find_global(&Ref::name("missing")).is_none());
    }

    #[test]
    fn serde_round_trip_preserves_globals_and_externals() {
        let mut m = Module::new();
        m.triple = "x86_64-unknown-linux-gnu".into();
        m.globals.push(Global::new(int_ty(32), Ref::name("g"), Some(int_const(int_ty(32), 0))));
        m.externals.insert(Ref::name("g"));

        let json = serde_json::to_string(&m).unwrap();
        let back: Module = serde_json::from_str(&json).unwrap();
        assert_eq!(back.triple, m.triple);
        assert_eq!(back.globals, m.globals);
        assert_eq!(back.externals, m.externals);
    }
}
