//! Term substitution: `replace` rewrites every subterm matching a key in a
//! map, recursively, preserving sharing when nothing changed underneath.

use std::collections::HashMap;

use crate::function::Function;
use crate::global::Global;
use crate::instruction::Instruction;
use crate::term::Term;

/// Replaces every subterm of `t` that appears as a key in `map` with its
/// mapped value. Children are rewritten bottom-up; atomic terms are looked
/// up directly; when a compound term's children are unchanged, the
/// original term is returned unchanged (no fresh allocation, preserving
/// sharing).
pub fn replace_term(t: &Term, map: &HashMap<Term, Term>) -> Term {
    if t.is_empty() {
        if let Some(replacement) = map.get(t) {
            return replacement.clone();
        }
        return t.clone();
    }
    let mut changed = false;
    let mut new_children = Vec::with_capacity(t.size());
    for c in t.iter() {
        let replaced = replace_term(c, map);
        if replaced != *c {
            changed = true;
        }
        new_children.push(replaced);
    }
    let rebuilt = if changed { t.with_children(new_children) } else { t.clone() };
    match map.get(&rebuilt) {
        Some(replacement) => replacement.clone(),
        None => rebuilt,
    }
}

pub fn replace_instruction(inst: &Instruction, map: &HashMap<Term, Term>) -> Instruction {
    let operands = inst.operands().iter().map(|t| replace_term(t, map)).collect();
    inst.with_operands(operands)
}

pub fn replace_global(g: &Global, map: &HashMap<Term, Term>) -> Global {
    let new_init = g.initializer().map(|t| replace_term(t, map));
    g.with_initializer(new_init)
}

pub fn replace_function(f: &Function, map: &HashMap<Term, Term>) -> Function {
    let params = f.params().iter().map(|t| replace_term(t, map)).collect();
    let body = f.body().iter().map(|i| replace_instruction(i, map)).collect();
    Function::new(f.rty(), f.reference().clone(), params, body)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ref_id::Ref;
    use crate::term::*;
    use crate::types::int_ty;

    #[test]
    fn replace_substitutes_atomic_term() {
        let x = var(int_ty(32), Ref::name("x"));
        let five = int_const(int_ty(32), 5);
        let mut map = HashMap::new();
        map.insert(x.clone(), five.clone());
        assert_eq!(replace_term(&x, &map), five);
    }

    #[test]
    fn replace_rebuilds_compound_terms_bottom_up() {
        let x = var(int_ty(32), Ref::name("x"));
        let expr = add(x.clone(), int_const(int_ty(32), 1));
        let mut map = HashMap::new();
        map.insert(x, int_const(int_ty(32), 9));
        let got = replace_term(&expr, &map);
        assert_eq!(got, add(int_const(int_ty(32), 9), int_const(int_ty(32), 1)));
    }

    #[test]
    fn replace_preserves_identity_when_nothing_matches() {
        let expr = add(int_const(int_ty(32), 1), int_const(int_ty(32), 2));
        let map = HashMap::new();
        assert_eq!(replace_term(&expr, &map), expr);
    }
}
