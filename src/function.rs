//! Function declarations and definitions.

use serde::{Deserialize, Serialize};

use crate::instruction::Instruction;
use crate::ref_id::Ref;
use crate::term::Term;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Function {
    rty: Type,
    reference: Ref,
    params: Vec<Term>,
    body: Vec<Instruction>,
}

impl Function {
    pub fn new(rty: Type, reference: Ref, params: Vec<Term>, body: Vec<Instruction>) -> Function {
        Function {
            rty,
            reference,
            params,
            body,
        }
    }

    pub fn rty(&self) -> Type {
        self.rty.clone()
    }

    pub fn reference(&self) -> &Ref {
        &self.reference
    }

    pub fn params(&self) -> &[Term] {
        &self.params
    }

    pub fn body(&self) -> &[Instruction] {
        &self.body
    }

    pub fn size(&self) -> usize {
        self.body.len()
    }

    pub fn is_declaration(&self) -> bool {
        self.body.is_empty()
    }

    pub fn get(&self, i: usize) -> &Instruction {
        &self.body[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.body.iter()
    }

    pub fn fn_type(&self) -> Type {
        crate::types::fn_ty(self.rty.clone(), self.params.iter().map(Term::ty).collect())
    }

    pub fn with_body(&self, body: Vec<Instruction>) -> Function {
        Function {
            rty: self.rty.clone(),
            reference: self.reference.clone(),
            params: self.params.clone(),
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::term::var;
    use crate::types::int_ty;

    #[test]
    fn declaration_has_empty_body() {
        let f = Function::new(int_ty(32), Ref::name("f"), vec![var(int_ty(32), Ref::name("x"))], vec![]);
        assert!(f.is_declaration());
    }

    #[test]
    fn fn_type_matches_signature() {
        let f = Function::new(
            int_ty(32),
            Ref::name("f"),
            vec![var(int_ty(32), Ref::name("x")), var(int_ty(64), Ref::name("y"))],
            vec![],
        );
        let ft = f.fn_type();
        assert_eq!(ft.fn_return(), Some(int_ty(32)));
        assert_eq!(ft.fn_params().unwrap(), &[int_ty(32), int_ty(64)]);
    }
}
