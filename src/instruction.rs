//! Opcode + operand list. Instructions carry no value of their own; they
//! sequence side effects and control flow.

use serde::{Deserialize, Serialize};

use crate::ref_id::Ref;
use crate::term::Term;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Opcode {
    Assign,
    Alloca,
    Store,
    Block,
    Br,
    Jmp,
    Phi,
    Switch,
    Ret,
    RetVoid,
    Drop,
    Unreachable,
}

impl Opcode {
    pub fn is_terminator(self) -> bool {
        matches!(
            self,
            Opcode::Ret | Opcode::RetVoid | Opcode::Br | Opcode::Jmp | Opcode::Switch | Opcode::Unreachable
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Instruction {
    opcode: Opcode,
    operands: Vec<Term>,
}

impl Instruction {
    pub fn new(opcode: Opcode, operands: Vec<Term>) -> Instruction {
        Instruction { opcode, operands }
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn operands(&self) -> &[Term] {
        &self.operands
    }

    pub fn size(&self) -> usize {
        self.operands.len()
    }

    pub fn get(&self, i: usize) -> &Term {
        &self.operands[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.operands.iter()
    }

    pub fn with_operands(&self, operands: Vec<Term>) -> Instruction {
        Instruction {
            opcode: self.opcode,
            operands,
        }
    }
}

pub fn assign(lhs: Term, rhs: Term) -> Instruction {
    Instruction::new(Opcode::Assign, vec![lhs, rhs])
}

pub fn alloca(lhs: Term, type_witness: Term, count: Term) -> Instruction {
    Instruction::new(Opcode::Alloca, vec![lhs, type_witness, count])
}

pub fn store(value: Term, pointer: Term) -> Instruction {
    Instruction::new(Opcode::Store, vec![value, pointer])
}

pub fn block(label_ref: Ref) -> Instruction {
    Instruction::new(Opcode::Block, vec![crate::term::label(label_ref)])
}

pub fn br(cond: Term, if_true: Term, if_false: Term) -> Instruction {
    Instruction::new(Opcode::Br, vec![cond, if_true, if_false])
}

pub fn jmp(target: Term) -> Instruction {
    Instruction::new(Opcode::Jmp, vec![target])
}

/// `(target, (value, label)+)` — a phi must have at least one incoming
/// pair.
pub fn phi(target: Term, incoming: Vec<(Term, Term)>) -> Instruction {
    assert!(!incoming.is_empty(), "phi: at least one incoming pair is required");
    let mut operands = vec![target];
    for (value, label_term) in incoming {
        operands.push(value);
        operands.push(label_term);
    }
    Instruction::new(Opcode::Phi, operands)
}

/// Decomposes a `Phi` instruction's operand list back into
/// `(target, [(value, label)])`.
pub fn phi_pairs(inst: &Instruction) -> (&Term, Vec<(&Term, &Term)>) {
    assert_eq!(inst.opcode(), Opcode::Phi);
    let target = inst.get(0);
    let mut pairs = Vec::new();
    let mut i = 1;
    while i + 1 < inst.size() {
        pairs.push((inst.get(i), inst.get(i + 1)));
        i += 2;
    }
    (target, pairs)
}

pub fn switch(value: Term, default_label: Term, cases: Vec<(Term, Term)>) -> Instruction {
    let mut operands = vec![value, default_label];
    for (case, label_term) in cases {
        operands.push(case);
        operands.push(label_term);
    }
    Instruction::new(Opcode::Switch, operands)
}

pub fn ret(value: Term) -> Instruction {
    Instruction::new(Opcode::Ret, vec![value])
}

pub fn ret_void() -> Instruction {
    Instruction::new(Opcode::RetVoid, vec![])
}

pub fn drop(value: Term) -> Instruction {
    Instruction::new(Opcode::Drop, vec![value])
}

pub fn unreachable() -> Instruction {
    Instruction::new(Opcode::Unreachable, vec![])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::{int_const, var};
    use crate::types::int_ty;

    #[test]
    fn phi_pairs_round_trips_incoming_edges() {
        let target = var(int_ty(32), Ref::name("t"));
        let v1 = int_const(int_ty(32), 1);
        let l1 = crate::term::label(Ref::name("a"));
        let v2 = int_const(int_ty(32), 2);
        let l2 = crate::term::label(Ref::name("b"));
        let inst = phi(target.clone(), vec![(v1.clone(), l1.clone()), (v2.clone(), l2.clone())]);
        let (t, pairs) = phi_pairs(&inst);
        assert_eq!(*t, target);
        assert_eq!(pairs, vec![(&v1, &l1), (&v2, &l2)]);
    }

    #[test]
    fn terminators_are_identified_correctly() {
        assert!(Opcode::Ret.is_terminator());
        assert!(Opcode::Unreachable.is_terminator());
        assert!(!Opcode::Assign.is_terminator());
    }
}
