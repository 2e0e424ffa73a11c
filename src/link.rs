//! Module linking: renaming internals, merging externals, and updating
//! references to follow the merge.

use std::collections::HashMap;

use crate::error::LinkError;
use crate::function::Function;
use crate::global::Global;
use crate::module::Module;
use crate::ref_id::Ref;
use crate::subst;
use crate::term::{self, Term};

/// Copies the first non-empty datalayout/triple found across `modules` into
/// `context`, failing if any two modules disagree. Does not overwrite a
/// pre-existing non-empty value in `context`.
pub fn link_target_info(modules: &[Module], context: &mut Module) -> Result<(), LinkError> {
    if modules.is_empty() {
        return Ok(());
    }

    let mut first_datalayout: Option<&str> = None;
    let mut first_triple: Option<&str> = None;

    for m in modules {
        if !m.datalayout.is_empty() {
            match first_datalayout {
                None => first_datalayout = Some(&m.datalayout),
                Some(existing) if existing != m.datalayout => {
                    return Err(LinkError::InconsistentTargetInfo {
                        what: "datalayout".into(),
                        first: existing.to_string(),
                        second: m.datalayout.clone(),
                    });
                }
                _ => {}
            }
        }
        if !m.triple.is_empty() {
            match first_triple {
                None => first_triple = Some(&m.triple),
                Some(existing) if existing != m.triple => {
                    return Err(LinkError::InconsistentTargetInfo {
                        what: "target triple".into(),
                        first: existing.to_string(),
                        second: m.triple.clone(),
                    });
                }
                _ => {}
            }
        }
    }

    if let Some(dl) = first_datalayout {
        if context.datalayout.is_empty() {
            context.datalayout = dl.to_string();
        }
    }
    if let Some(tr) = first_triple {
        if context.triple.is_empty() {
            context.triple = tr.to_string();
        }
    }
    Ok(())
}

/// Renames every internal (non-external) top-level Ref in `m` to a fresh
/// numeric index drawn from `next_id`, rewriting all references.
fn rename_internals(m: &Module, next_id: &mut u64) -> Module {
    let mut ref_map: HashMap<Ref, Ref> = HashMap::new();
    let mut fresh = |r: &Ref, map: &mut HashMap<Ref, Ref>| {
        if !m.is_external(r) && !map.contains_key(r) {
            let id = *next_id;
            *next_id += 1;
            map.insert(r.clone(), Ref::num(id));
        }
    };
    for g in &m.globals {
        fresh(g.reference(), &mut ref_map);
    }
    for f in m.decls.iter().chain(m.defs.iter()) {
        fresh(f.reference(), &mut ref_map);
    }

    rename_module(m, &ref_map)
}

fn rename_module(m: &Module, ref_map: &HashMap<Ref, Ref>) -> Module {
    let mut term_map: HashMap<Term, Term> = HashMap::new();
    for g in &m.globals {
        if let Some(new_ref) = ref_map.get(g.reference()) {
            term_map.insert(term::global_ref(g.ty(), g.reference().clone()), term::global_ref(g.ty(), new_ref.clone()));
        }
    }
    for f in m.decls.iter().chain(m.defs.iter()) {
        if let Some(new_ref) = ref_map.get(f.reference()) {
            let fty = f.fn_type();
            term_map.insert(term::global_ref(fty.clone(), f.reference().clone()), term::global_ref(fty, new_ref.clone()));
        }
    }

    let rename_ref = |r: &Ref| ref_map.get(r).cloned().unwrap_or_else(|| r.clone());

    Module {
        datalayout: m.datalayout.clone(),
        triple: m.triple.clone(),
        comdats: m.comdats.clone(),
        globals: m
            .globals
            .iter()
            .map(|g| {
                let renamed = Global::new(g.ty(), rename_ref(g.reference()), g.initializer().cloned());
                subst::replace_global(&renamed, &term_map)
            })
            .collect(),
        decls: m
            .decls
            .iter()
            .map(|f| {
                let renamed = Function::new(f.rty(), rename_ref(f.reference()), f.params().to_vec(), vec![]);
                subst::replace_function(&renamed, &term_map)
            })
            .collect(),
        defs: m
            .defs
            .iter()
            .map(|f| {
                let renamed = Function::new(f.rty(), rename_ref(f.reference()), f.params().to_vec(), f.body().to_vec());
                subst::replace_function(&renamed, &term_map)
            })
            .collect(),
        externals: m.externals.iter().map(rename_ref).collect(),
    }
}

/// Links `modules` into a single context module: internals are renamed to
/// fresh, unique numeric indices first; externals with matching Refs are
/// then coalesced (checked for type/signature compatibility), and all
/// references are updated to follow the merge.
pub fn link(modules: &[Module]) -> Result<Module, LinkError> {
    let mut next_id: u64 = 0;
    let renamed: Vec<Module> = modules.iter().map(|m| rename_internals(m, &mut next_id)).collect();

    let mut context = Module::new();
    let mut global_refs: HashMap<Ref, Ref> = HashMap::new();

    for m in &renamed {
        context.comdats.extend(m.comdats.iter().cloned());

        for g in &m.globals {
            let original_ref = g.reference().clone();
            let is_external = m.is_external(&original_ref);
            let existing = if is_external { context.find_global(&original_ref).cloned() } else { None };
            if let Some(found) = existing {
                if found.ty() != g.ty() {
                    return Err(LinkError::GlobalTypeMismatch {
                        reference: original_ref.to_string(),
                    });
                }
                global_refs.insert(original_ref, found.reference().clone());
            } else {
                context.globals.push(g.clone());
                if is_external {
                    context.externals.insert(original_ref);
                }
            }
        }

        for decl in &m.decls {
            let original_ref = decl.reference().clone();
            let existing = context.find_decl(&original_ref).cloned();
            if let Some(found) = existing {
                if found.rty() != decl.rty() || found.params().len() != decl.params().len() {
                    return Err(LinkError::SignatureMismatch {
                        reference: original_ref.to_string(),
                    });
                }
                for (a, b) in found.params().iter().zip(decl.params()) {
                    if a.ty() != b.ty() {
                        return Err(LinkError::SignatureMismatch {
                            reference: original_ref.to_string(),
                        });
                    }
                }
                global_refs.insert(original_ref.clone(), found.reference().clone());
            } else {
                context.decls.push(decl.clone());
                if m.is_external(&original_ref) {
                    context.externals.insert(original_ref);
                }
            }
        }

        for def in &m.defs {
            let original_ref = def.reference().clone();
            if context.find_def(&original_ref).is_some() {
                return Err(LinkError::DuplicateDefinition {
                    reference: original_ref.to_string(),
                });
            }
            context.defs.push(def.clone());
            if m.is_external(&original_ref) {
                context.externals.insert(original_ref);
            }
        }
    }

    if !global_refs.is_empty() {
        let mut term_map: HashMap<Term, Term> = HashMap::new();
        for (old_ref, new_ref) in &global_refs {
            let ty = context
                .find_global(old_ref)
                .map(Global::ty)
                .or_else(|| context.find_global(new_ref).map(Global::ty))
                .or_else(|| context.find_decl(new_ref).map(Function::fn_type))
                .or_else(|| context.find_def(new_ref).map(Function::fn_type));
            if let Some(ty) = ty {
                term_map.insert(term::global_ref(ty.clone(), old_ref.clone()), term::global_ref(ty, new_ref.clone()));
            }
        }
        context.globals = context.globals.iter().map(|g| subst::replace_global(g, &term_map)).collect();
        context.defs = context.defs.iter().map(|f| subst::replace_function(f, &term_map)).collect();
    }

    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::int_ty;

    #[test]
    fn conflicting_external_declarations_fail_to_link() {
        let mut a = Module::new();
        a.decls.push(Function::new(int_ty(32), Ref::name("g"), vec![], vec![]));
        a.externals.insert(Ref::name("g"));

        let mut b = Module::new();
        b.decls.push(Function::new(int_ty(64), Ref::name("g"), vec![], vec![]));
        b.externals.insert(Ref::name("g"));

        let err = link(&[a, b]).unwrap_err();
        assert!(matches!(err, LinkError::SignatureMismatch { .. }));
    }

    #[test]
    fn target_info_disagreement_is_rejected() {
        let mut a = Module::new();
        a.triple = "x86_64-unknown-linux-gnu".into();
        let mut b = Module::new();
        b.triple = "aarch64-unknown-linux-gnu".into();
        let mut ctx = Module::new();
        let err = link_target_info(&[a, b], &mut ctx).unwrap_err();
        assert!(matches!(err, LinkError::InconsistentTargetInfo { .. }));

        a = Module::new();
        b = Module::new();
        let _ = (&mut a, &mut b);
    }

    #[test]
    fn matching_externals_coalesce() {
        let mut a = Module::new();
        a.decls.push(Function::new(int_ty(32), Ref::name("g"), vec![], vec![]));
        a.externals.insert(Ref::name("g"));

        let mut b = Module::new();
        b.decls.push(Function::new(int_ty(32), Ref::name("g"), vec![], vec![]));
        b.externals.insert(Ref::name("g"));

        let ctx = link(&[a, b]).unwrap();
        assert_eq!(ctx.decls.len(), 1);
    }
}
