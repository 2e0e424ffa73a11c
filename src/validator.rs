//! Structural and typing validation for terms, instructions, and functions.

use std::collections::HashMap;

use crate::error::ValidationError;
use crate::function::Function;
use crate::instruction::{Instruction, Opcode};
use crate::module::Module;
use crate::ref_id::Ref;
use crate::term::{Tag, Term};
use crate::types::{Kind, Type};

type VResult<T = ()> = Result<T, ValidationError>;

fn fail(msg: impl Into<String>) -> ValidationError {
    ValidationError::new(msg)
}

fn is_integral(t: &Type) -> bool {
    t.kind() == Kind::Int
}

fn types_match(a: &Term, b: &Term) -> VResult {
    if a.ty() != b.ty() {
        return Err(fail("type mismatch between operands"));
    }
    Ok(())
}

fn operand_count(a: &Term, expected: usize) -> VResult {
    if a.size() != expected {
        return Err(fail(format!(
            "incorrect number of operands: expected {expected}, found {}",
            a.size()
        )));
    }
    Ok(())
}

/// Checks a single term's own shape: operand arity, operand type agreement,
/// and the tag's result-type relation. Does not recurse into children.
pub fn check_term(a: &Term) -> VResult {
    match a.tag() {
        Tag::NullPtr => {
            if a.ty().kind() != Kind::Ptr {
                return Err(fail("NullPtr must have pointer type"));
            }
        }
        Tag::Int => {
            if !is_integral(&a.ty()) {
                return Err(fail("Int constant must have integer type"));
            }
        }
        Tag::Float => {
            if !a.ty().is_float() {
                return Err(fail("Float constant must have float or double type"));
            }
        }
        Tag::Add | Tag::Sub | Tag::Mul | Tag::And | Tag::Or | Tag::Xor => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if !is_integral(&a.ty()) || a.ty() != a.get(0).ty() {
                return Err(fail("invalid types for integer arithmetic"));
            }
        }
        Tag::Shl | Tag::LShr | Tag::AShr => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if !is_integral(&a.ty()) || a.ty() != a.get(0).ty() {
                return Err(fail("invalid types for shift"));
            }
        }
        Tag::SDiv | Tag::SRem | Tag::UDiv | Tag::URem => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if !is_integral(&a.ty()) || a.ty() != a.get(0).ty() {
                return Err(fail("invalid types for division"));
            }
        }
        Tag::FAdd | Tag::FDiv | Tag::FMul | Tag::FRem | Tag::FSub => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if !a.ty().is_float() || a.ty() != a.get(0).ty() {
                return Err(fail("invalid types for floating-point arithmetic"));
            }
        }
        Tag::FNeg => {
            operand_count(a, 1)?;
            if !a.ty().is_float() || a.ty() != a.get(0).ty() {
                return Err(fail("invalid types for floating-point negation"));
            }
        }
        Tag::Eq => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if a.ty().kind() != Kind::Int || a.ty().len() != 1 {
                return Err(fail("equality must return bool type"));
            }
        }
        Tag::FEq => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if !a.get(0).ty().is_float() {
                return Err(fail("FEq requires floating-point operands"));
            }
            if a.ty().kind() != Kind::Int || a.ty().len() != 1 {
                return Err(fail("FEq must return bool type"));
            }
        }
        Tag::SLe | Tag::SLt | Tag::ULe | Tag::ULt => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if !is_integral(&a.get(0).ty()) {
                return Err(fail("comparison requires integer operands"));
            }
            if a.ty().kind() != Kind::Int || a.ty().len() != 1 {
                return Err(fail("comparison must return bool type"));
            }
        }
        Tag::FLe | Tag::FLt => {
            operand_count(a, 2)?;
            types_match(a.get(0), a.get(1))?;
            if !a.get(0).ty().is_float() {
                return Err(fail("FLt/FLe requires floating-point operands"));
            }
            if a.ty().kind() != Kind::Int || a.ty().len() != 1 {
                return Err(fail("floating comparison must return bool type"));
            }
        }
        Tag::Not => {
            operand_count(a, 1)?;
            if a.get(0).ty().kind() != Kind::Int || a.get(0).ty().len() != 1 {
                return Err(fail("not requires bool operand"));
            }
            if a.ty() != a.get(0).ty() {
                return Err(fail("not must return bool type"));
            }
        }
        Tag::Cast | Tag::SCast => {
            operand_count(a, 1)?;
            let sk = a.get(0).ty().kind();
            let dk = a.ty().kind();
            let numeric = |k: Kind| matches!(k, Kind::Int | Kind::Float | Kind::Double) || k == Kind::Ptr;
            if !numeric(sk) || !numeric(dk) {
                return Err(fail("cast requires numeric or pointer types"));
            }
        }
        Tag::Load => {
            operand_count(a, 1)?;
            if a.get(0).ty().kind() != Kind::Ptr {
                return Err(fail("load requires pointer operand"));
            }
        }
        Tag::ElementPtr | Tag::FieldPtr => {
            operand_count(a, 3)?;
            if a.get(1).ty().kind() != Kind::Ptr {
                return Err(fail("ElementPtr/FieldPtr requires pointer base"));
            }
            if !is_integral(&a.get(2).ty()) {
                return Err(fail("ElementPtr/FieldPtr requires integer index"));
            }
            if a.ty().kind() != Kind::Ptr {
                return Err(fail("ElementPtr/FieldPtr must return pointer type"));
            }
        }
        Tag::Array => {
            if a.ty().kind() != Kind::Array {
                return Err(fail("Array term must have array type"));
            }
            if let Some(elem_ty) = a.ty().component(0) {
                for e in a.iter() {
                    if e.ty() != elem_ty {
                        return Err(fail("array elements must have consistent type"));
                    }
                }
            }
        }
        Tag::Tuple => {
            if a.ty().kind() != Kind::Struct {
                return Err(fail("tuple term must have struct type"));
            }
            if a.size() != a.ty().size() {
                return Err(fail("tuple size must match type size"));
            }
            for i in 0..a.size() {
                if a.get(i).ty() != a.ty().component(i).unwrap() {
                    return Err(fail("tuple element type mismatch"));
                }
            }
        }
        Tag::Vec => {
            if a.ty().kind() != Kind::Vec {
                return Err(fail("Vec term must have vector type"));
            }
            if let Some(elem_ty) = a.ty().component(0) {
                for e in a.iter() {
                    if e.ty() != elem_ty {
                        return Err(fail("vector elements must have consistent type"));
                    }
                }
            }
        }
        Tag::Call => {
            if a.size() < 1 {
                return Err(fail("call must have at least one operand (function)"));
            }
            if a.get(0).ty().kind() != Kind::Fn {
                return Err(fail("first operand of call must be a function"));
            }
            if a.ty() != a.get(0).ty().component(0).unwrap() {
                return Err(fail("call return type must match function return type"));
            }
            let param_count = a.get(0).ty().size() - 1;
            if a.size() - 1 != param_count {
                return Err(fail("call argument count must match function parameter count"));
            }
            for i in 1..a.size() {
                if a.get(i).ty() != a.get(0).ty().component(i).unwrap() {
                    return Err(fail("call argument type mismatch"));
                }
            }
        }
        Tag::GlobalRef | Tag::Label | Tag::Var => {}
    }
    Ok(())
}

/// `check_term` followed by recursion into children, with extra structural
/// checks for Array/Tuple/Call/ElementPtr/FieldPtr.
pub fn check_recursive(a: &Term) -> VResult {
    check_term(a)?;
    match a.tag() {
        Tag::Float | Tag::GlobalRef | Tag::Int | Tag::Label | Tag::NullPtr | Tag::Var => Ok(()),
        Tag::Array | Tag::Vec => {
            if let Some(first) = a.children().first() {
                let elem_ty = first.ty();
                for e in a.iter() {
                    if e.ty() != elem_ty {
                        return Err(fail("aggregate elements must all have the same type"));
                    }
                    check_recursive(e)?;
                }
            }
            Ok(())
        }
        Tag::Tuple => {
            for i in 0..a.size() {
                check_recursive(a.get(i))?;
            }
            Ok(())
        }
        Tag::Call => {
            for (i, operand) in a.iter().enumerate() {
                if i > 0 && operand.ty() != a.get(0).ty().component(i).unwrap() {
                    return Err(fail("call argument type mismatch"));
                }
                check_recursive(operand)?;
            }
            Ok(())
        }
        Tag::ElementPtr | Tag::FieldPtr => {
            for operand in a.iter() {
                check_recursive(operand)?;
            }
            Ok(())
        }
        _ => {
            for operand in a.iter() {
                check_recursive(operand)?;
            }
            Ok(())
        }
    }
}

/// Validates all operands recursively, then the opcode-specific shape.
pub fn check_instruction(inst: &Instruction) -> VResult {
    for term in inst.operands() {
        check_recursive(term)?;
    }
    match inst.opcode() {
        Opcode::Alloca => {
            operand_count_inst(inst, 3)?;
            if inst.get(0).tag() != Tag::Var {
                return Err(fail("first operand of Alloca must be a variable"));
            }
            if inst.get(2).ty().kind() != Kind::Int {
                return Err(fail("third operand of Alloca must be an integer"));
            }
            if inst.get(0).ty().kind() != Kind::Ptr {
                return Err(fail("result of Alloca must be a pointer type"));
            }
        }
        Opcode::Assign => {
            operand_count_inst(inst, 2)?;
            if inst.get(0).tag() != Tag::Var {
                return Err(fail("left hand side of Assign must be a variable"));
            }
            if inst.get(0).ty() != inst.get(1).ty() {
                return Err(fail("Assign operands must have matching types"));
            }
        }
        Opcode::Store => {
            operand_count_inst(inst, 2)?;
            if inst.get(1).ty().kind() != Kind::Ptr {
                return Err(fail("second operand of Store must be a pointer"));
            }
        }
        Opcode::Block => {
            operand_count_inst(inst, 1)?;
            if inst.get(0).tag() != Tag::Label {
                return Err(fail("Block operand must be a label"));
            }
        }
        Opcode::Br => {
            operand_count_inst(inst, 3)?;
            if inst.get(0).ty() != crate::types::bool_ty() {
                return Err(fail("branch condition must be boolean"));
            }
            if inst.get(1).tag() != Tag::Label || inst.get(2).tag() != Tag::Label {
                return Err(fail("branch targets must be labels"));
            }
        }
        Opcode::Jmp => {
            operand_count_inst(inst, 1)?;
            if inst.get(0).tag() != Tag::Label {
                return Err(fail("jump target must be a label"));
            }
        }
        Opcode::Phi => {
            if inst.size() < 3 || inst.size() % 2 == 0 {
                return Err(fail("phi must have a target and at least one incoming pair"));
            }
            let target_ty = inst.get(0).ty();
            let mut i = 1;
            while i + 1 < inst.size() {
                if inst.get(i).ty() != target_ty {
                    return Err(fail("phi incoming value type must match target type"));
                }
                if inst.get(i + 1).tag() != Tag::Label {
                    return Err(fail("phi incoming label must be a Label term"));
                }
                i += 2;
            }
        }
        Opcode::Switch => {
            if inst.size() < 2 || inst.size() % 2 != 0 {
                return Err(fail("switch must have a value, a default label, and paired cases"));
            }
            if inst.get(1).tag() != Tag::Label {
                return Err(fail("switch default must be a label"));
            }
            let value_ty = inst.get(0).ty();
            let mut i = 2;
            while i + 1 < inst.size() {
                if inst.get(i).ty() != value_ty {
                    return Err(fail("switch case type must match value type"));
                }
                if inst.get(i + 1).tag() != Tag::Label {
                    return Err(fail("switch case target must be a label"));
                }
                i += 2;
            }
        }
        Opcode::Ret => {
            operand_count_inst(inst, 1)?;
        }
        Opcode::RetVoid | Opcode::Unreachable => {
            operand_count_inst(inst, 0)?;
        }
        Opcode::Drop => {
            operand_count_inst(inst, 1)?;
        }
    }
    Ok(())
}

fn operand_count_inst(inst: &Instruction, expected: usize) -> VResult {
    if inst.size() != expected {
        return Err(fail(format!(
            "{:?} must have exactly {expected} operands, found {}",
            inst.opcode(),
            inst.size()
        )));
    }
    Ok(())
}

/// Enforces the function-level invariants: defined labels cover every
/// branch/jump/switch target, each `Var` is used at one consistent type, no
/// `Phi` remains, and the body ends in a terminator.
pub fn check_function(f: &Function) -> VResult {
    if f.is_declaration() {
        return Ok(());
    }
    if f.size() == 0 {
        return Err(fail("function body must not be empty"));
    }

    let mut labels: std::collections::HashSet<Ref> = std::collections::HashSet::new();
    for inst in f.iter() {
        if inst.opcode() == Opcode::Block {
            if let Some(r) = inst.get(0).reference() {
                labels.insert(r.clone());
            }
        }
    }

    let mut var_types: HashMap<Ref, Type> = HashMap::new();
    for p in f.params() {
        if let Some(r) = p.reference() {
            var_types.insert(r.clone(), p.ty());
        }
    }

    for inst in f.iter() {
        check_instruction(inst)?;
        if inst.opcode() == Opcode::Phi {
            return Err(fail("Phi is not permitted in the internal (phi-free) form"));
        }
        match inst.opcode() {
            Opcode::Br => {
                check_label_defined(inst.get(1), &labels)?;
                check_label_defined(inst.get(2), &labels)?;
            }
            Opcode::Jmp => check_label_defined(inst.get(0), &labels)?,
            Opcode::Switch => {
                check_label_defined(inst.get(1), &labels)?;
                let mut i = 2;
                while i + 1 < inst.size() {
                    check_label_defined(inst.get(i + 1), &labels)?;
                    i += 2;
                }
            }
            _ => {}
        }
        collect_var_uses(inst, &mut var_types)?;
    }

    let last = f.get(f.size() - 1);
    if !last.opcode().is_terminator() {
        return Err(fail("function body must end in a terminator"));
    }
    match last.opcode() {
        Opcode::Ret => {
            if last.get(0).ty() != f.rty() {
                return Err(fail("Ret operand type must match the function's return type"));
            }
        }
        Opcode::RetVoid => {
            if f.rty().kind() != Kind::Void {
                return Err(fail("RetVoid used when return type is not Void"));
            }
        }
        _ => {}
    }
    Ok(())
}

fn check_label_defined(target: &Term, labels: &std::collections::HashSet<Ref>) -> VResult {
    match target.reference() {
        Some(r) if labels.contains(r) => Ok(()),
        _ => Err(fail(format!(
            "branch/jump target {} is not defined by a Block in this function",
            target.reference().map(|r| r.to_string()).unwrap_or_default()
        ))),
    }
}

fn collect_var_uses(inst: &Instruction, var_types: &mut HashMap<Ref, Type>) -> VResult {
    for operand in walk_vars(inst) {
        if let (Tag::Var, Some(r)) = (operand.tag(), operand.reference()) {
            match var_types.get(r) {
                Some(existing) if *existing != operand.ty() => {
                    return Err(fail(format!("variable {r} used at two different types")));
                }
                Some(_) => {}
                None => {
                    var_types.insert(r.clone(), operand.ty());
                }
            }
        }
    }
    Ok(())
}

fn walk_vars(inst: &Instruction) -> Vec<&Term> {
    fn walk<'a>(t: &'a Term, out: &mut Vec<&'a Term>) {
        out.push(t);
        for c in t.iter() {
            walk(c, out);
        }
    }
    let mut out = Vec::new();
    for operand in inst.operands() {
        walk(operand, &mut out);
    }
    out
}

/// Validates every function declaration and definition in a module.
pub fn check_module(m: &Module) -> VResult {
    for f in m.decls.iter().chain(m.defs.iter()) {
        check_function(f)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::*;
    use crate::term::*;
    use crate::types::int_ty;

    #[test]
    fn add_requires_matching_integer_operands() {
        let t = add(int_const(int_ty(32), 1), int_const(int_ty(32), 2));
        assert!(check_term(&t).is_ok());
    }

    #[test]
    fn call_argument_count_mismatch_is_rejected() {
        let fty = crate::types::fn_ty(int_ty(32), vec![int_ty(32)]);
        let f = global_ref(fty, Ref::name("f"));
        let t = call(f, vec![int_const(int_ty(32), 1)]);
        assert!(check_recursive(&t).is_ok());
    }

    #[test]
    fn function_without_terminator_fails() {
        let f = Function::new(int_ty(32), Ref::name("f"), vec![], vec![assign(
            var(int_ty(32), Ref::name("x")),
            int_const(int_ty(32), 1),
        )]);
        assert!(check_function(&f).is_err());
    }

    #[test]
    fn phi_in_body_is_rejected() {
        let target = var(int_ty(32), Ref::name("t"));
        let v = int_const(int_ty(32), 1);
        let l = label(Ref::name("entry"));
        let f = Function::new(
            int_ty(32),
            Ref::name("f"),
            vec![],
            vec![block(Ref::name("entry")), phi(target.clone(), vec![(v, l)]), ret(target)],
        );
        assert!(check_function(&f).is_err());
    }

    #[test]
    fn unknown_branch_target_is_rejected() {
        let f = Function::new(
            int_ty(32),
            Ref::name("f"),
            vec![],
            vec![
                block(Ref::name("entry")),
                jmp(label(Ref::name("missing"))),
            ],
        );
        assert!(check_function(&f).is_err());
    }

    #[test]
    fn well_formed_function_passes() {
        let x = var(int_ty(32), Ref::name("x"));
        let f = Function::new(int_ty(32), Ref::name("f"), vec![x.clone()], vec![ret(x)]);
        assert!(check_function(&f).is_ok());
    }
}
