//! Phi elimination: lowers `Phi` instructions to predecessor-side `Assign`
//! copies, producing an equivalent phi-free function.

use std::collections::HashMap;

use crate::function::Function;
use crate::instruction::{self, Instruction, Opcode};
use crate::ref_id::Ref;
use crate::term::Term;

struct PhiInfo {
    target: Term,
    incoming: Vec<(Term, Term)>,
}

/// Removes every `Phi` from `f`'s body, inserting one `Assign` before each
/// predecessor's terminator for every phi whose table names that
/// terminator's destination label(s). Collection order (and thus emission
/// order for multiple phis in one block) is stable: the order `Phi`
/// instructions appear in the original body.
pub fn eliminate_phi_nodes(f: &Function) -> Function {
    if f.is_declaration() {
        return f.clone();
    }

    let mut phi_nodes: Vec<PhiInfo> = Vec::new();
    for inst in f.iter() {
        if inst.opcode() == Opcode::Phi {
            let (target, pairs) = instruction::phi_pairs(inst);
            phi_nodes.push(PhiInfo {
                target: target.clone(),
                incoming: pairs.into_iter().map(|(v, l)| (v.clone(), l.clone())).collect(),
            });
        }
    }

    if phi_nodes.is_empty() {
        return f.clone();
    }

    let assigns_for = |dest: &Ref| -> Vec<Instruction> {
        phi_nodes
            .iter()
            .filter_map(|p| {
                p.incoming
                    .iter()
                    .find(|(_, label)| label.reference() == Some(dest))
                    .map(|(value, _)| instruction::assign(p.target.clone(), value.clone()))
            })
            .collect()
    };

    let mut result = Vec::with_capacity(f.size());
    for inst in f.iter() {
        match inst.opcode() {
            Opcode::Block => {
                result.push(inst.clone());
            }
            Opcode::Phi => {
                // Dropped; materialized as assigns at predecessor terminators.
            }
            Opcode::Br => {
                if let Some(dest) = inst.get(1).reference() {
                    result.extend(assigns_for(dest));
                }
                if let Some(dest) = inst.get(2).reference() {
                    result.extend(assigns_for(dest));
                }
                result.push(inst.clone());
            }
            Opcode::Jmp => {
                if let Some(dest) = inst.get(0).reference() {
                    result.extend(assigns_for(dest));
                }
                result.push(inst.clone());
            }
            _ => result.push(inst.clone()),
        }
    }

    f.with_body(result)
}
