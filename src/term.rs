//! Hash-consed, typed value/expression trees.

use std::fmt;

use num::bigint::BigInt;
use num::Zero;
use serde::{Deserialize, Serialize};

use crate::ref_id::Ref;
use crate::types::Type;

/// The tag partitions terms into constants, names, arithmetic, comparisons,
/// conversions, memory operations, aggregates, and calls. This is the
/// newer/extended variant (no `Goto`/`If` umbrella).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tag {
    NullPtr,
    Int,
    Float,
    Var,
    Label,
    GlobalRef,
    Add,
    Sub,
    Mul,
    UDiv,
    SDiv,
    URem,
    SRem,
    And,
    Or,
    Xor,
    Shl,
    LShr,
    AShr,
    FAdd,
    FSub,
    FMul,
    FDiv,
    FRem,
    FNeg,
    Eq,
    ULt,
    ULe,
    SLt,
    SLe,
    Not,
    FEq,
    FLt,
    FLe,
    Cast,
    SCast,
    Load,
    ElementPtr,
    FieldPtr,
    Array,
    Tuple,
    Vec,
    Call,
}

/// A typed, hash-consed term. Atomic terms carry `ref_` (names) or
/// `int_val`/`float_str` (constants); compound terms carry `children`.
#[derive(Debug, Clone)]
pub struct Term {
    tag: Tag,
    ty: Type,
    ref_: Option<Ref>,
    int_val: Option<BigInt>,
    float_str: Option<String>,
    children: Vec<Term>,
}

impl Term {
    pub fn tag(&self) -> Tag {
        self.tag
    }

    pub fn ty(&self) -> Type {
        self.ty.clone()
    }

    pub fn reference(&self) -> Option<&Ref> {
        self.ref_.as_ref()
    }

    pub fn int_val(&self) -> Option<&BigInt> {
        self.int_val.as_ref()
    }

    pub fn float_str(&self) -> Option<&str> {
        self.float_str.as_deref()
    }

    pub fn size(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn children(&self) -> &[Term] {
        &self.children
    }

    pub fn get(&self, i: usize) -> &Term {
        &self.children[i]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Term> {
        self.children.iter()
    }

    /// Rebuilds this term with a new child list, preserving tag/type/ref.
    /// Used by transforms that only rewrite operands.
    pub fn with_children(&self, children: Vec<Term>) -> Term {
        Term {
            tag: self.tag,
            ty: self.ty.clone(),
            ref_: self.ref_.clone(),
            int_val: self.int_val.clone(),
            float_str: self.float_str.clone(),
            children,
        }
    }
}

/// A non-hash-consed mirror of `Term`'s fields, used only to move a `Term`
/// across `serde`. `BigInt` carries no `serde` impl of its own here, so
/// `int_val` crosses the wire as a decimal string.
#[derive(Serialize, Deserialize)]
struct TermRepr {
    tag: Tag,
    ty: Type,
    ref_: Option<Ref>,
    int_val: Option<String>,
    float_str: Option<String>,
    children: Vec<Term>,
}

impl Serialize for Term {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let repr = TermRepr {
            tag: self.tag,
            ty: self.ty.clone(),
            ref_: self.ref_.clone(),
            int_val: self.int_val.as_ref().map(|v| v.to_string()),
            float_str: self.float_str.clone(),
            children: self.children.clone(),
        };
        repr.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Term {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let repr = TermRepr::deserialize(deserializer)?;
        let int_val = repr
            .int_val
            .map(|s| s.parse::<BigInt>().map_err(serde::de::Error::custom))
            .transpose()?;
        let base = Term {
            tag: repr.tag,
            ty: repr.ty,
            ref_: repr.ref_,
            int_val,
            float_str: repr.float_str,
            children: Vec::new(),
        };
        Ok(base.with_children(repr.children))
    }
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.ty == other.ty
            && self.ref_ == other.ref_
            && self.int_val == other.int_val
            && self.float_str == other.float_str
            && self.children == other.children
    }
}
impl Eq for Term {}

impl std::hash::Hash for Term {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
        // `Type` hashes by pointer identity, which is stable within a
        // process and sufficient here: interning guarantees structurally
        // equal types share one pointer.
        self.ty.hash(state);
        self.ref_.hash(state);
        self.int_val.hash(state);
        self.float_str.hash(state);
        self.children.hash(state);
    }
}

// --- Constructors -----------------------------------------------------

fn atom(tag: Tag, ty: Type) -> Term {
    Term {
        tag,
        ty,
        ref_: None,
        int_val: None,
        float_str: None,
        children: Vec::new(),
    }
}

pub fn null_ptr(ty: Type) -> Term {
    assert_eq!(ty.kind(), crate::types::Kind::Ptr, "null_ptr: type must be Ptr");
    atom(Tag::NullPtr, ty)
}

pub fn int_const(ty: Type, value: impl Into<BigInt>) -> Term {
    assert!(ty.is_int(), "int_const: type must be Int");
    Term {
        tag: Tag::Int,
        ty,
        ref_: None,
        int_val: Some(value.into()),
        float_str: None,
        children: Vec::new(),
    }
}

pub fn true_const() -> Term {
    int_const(crate::types::bool_ty(), 1)
}

pub fn false_const() -> Term {
    int_const(crate::types::bool_ty(), 0)
}

pub fn bool_const(b: bool) -> Term {
    if b {
        true_const()
    } else {
        false_const()
    }
}

pub fn float_const(ty: Type, text: impl Into<String>) -> Term {
    assert!(ty.is_float(), "float_const: type must be Float or Double");
    Term {
        tag: Tag::Float,
        ty,
        ref_: None,
        int_val: None,
        float_str: Some(text.into()),
        children: Vec::new(),
    }
}

fn named(tag: Tag, ty: Type, r: Ref) -> Term {
    Term {
        tag,
        ty,
        ref_: Some(r),
        int_val: None,
        float_str: None,
        children: Vec::new(),
    }
}

pub fn var(ty: Type, r: Ref) -> Term {
    named(Tag::Var, ty, r)
}

pub fn label(r: Ref) -> Term {
    named(Tag::Label, crate::types::ptr_ty(), r)
}

pub fn global_ref(ty: Type, r: Ref) -> Term {
    named(Tag::GlobalRef, ty, r)
}

fn binop(tag: Tag, a: Term, b: Term) -> Term {
    assert_eq!(a.ty, b.ty, "{tag:?}: operand types must match");
    Term {
        tag,
        ty: a.ty.clone(),
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![a, b],
    }
}

macro_rules! int_binop {
    ($name:ident, $tag:ident) => {
        pub fn $name(a: Term, b: Term) -> Term {
            assert!(a.ty.is_int(), stringify!($name: "requires integer operands"));
            binop(Tag::$tag, a, b)
        }
    };
}
int_binop!(add, Add);
int_binop!(sub, Sub);
int_binop!(mul, Mul);
int_binop!(udiv, UDiv);
int_binop!(sdiv, SDiv);
int_binop!(urem, URem);
int_binop!(srem, SRem);
int_binop!(and, And);
int_binop!(or, Or);
int_binop!(xor, Xor);
int_binop!(shl, Shl);
int_binop!(lshr, LShr);
int_binop!(ashr, AShr);

macro_rules! float_binop {
    ($name:ident, $tag:ident) => {
        pub fn $name(a: Term, b: Term) -> Term {
            assert!(a.ty.is_float(), stringify!($name: "requires floating operands"));
            binop(Tag::$tag, a, b)
        }
    };
}
float_binop!(fadd, FAdd);
float_binop!(fsub, FSub);
float_binop!(fmul, FMul);
float_binop!(fdiv, FDiv);
float_binop!(frem, FRem);

pub fn fneg(a: Term) -> Term {
    assert!(a.ty.is_float(), "fneg: requires floating operand");
    Term {
        tag: Tag::FNeg,
        ty: a.ty.clone(),
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![a],
    }
}

fn cmp(tag: Tag, a: Term, b: Term) -> Term {
    assert_eq!(a.ty, b.ty, "{tag:?}: operand types must match");
    Term {
        tag,
        ty: crate::types::bool_ty(),
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![a, b],
    }
}

macro_rules! int_cmp {
    ($name:ident, $tag:ident) => {
        pub fn $name(a: Term, b: Term) -> Term {
            cmp(Tag::$tag, a, b)
        }
    };
}
int_cmp!(eq, Eq);
int_cmp!(ult, ULt);
int_cmp!(ule, ULe);
int_cmp!(slt, SLt);
int_cmp!(sle, SLe);
int_cmp!(feq, FEq);
int_cmp!(flt, FLt);
int_cmp!(fle, FLe);

pub fn not(a: Term) -> Term {
    assert_eq!(a.ty, crate::types::bool_ty(), "not: requires bool operand");
    Term {
        tag: Tag::Not,
        ty: crate::types::bool_ty(),
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![a],
    }
}

pub fn cast(ty: Type, a: Term) -> Term {
    Term {
        tag: Tag::Cast,
        ty,
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![a],
    }
}

pub fn scast(ty: Type, a: Term) -> Term {
    Term {
        tag: Tag::SCast,
        ty,
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![a],
    }
}

pub fn load(ty: Type, ptr: Term) -> Term {
    assert_eq!(ptr.ty().kind(), crate::types::Kind::Ptr, "load: requires pointer operand");
    Term {
        tag: Tag::Load,
        ty,
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![ptr],
    }
}

fn indexed_ptr(tag: Tag, elem_witness: Term, base: Term, index: Term) -> Term {
    assert_eq!(base.ty().kind(), crate::types::Kind::Ptr, "{tag:?}: base must be a pointer");
    assert!(index.ty().is_int(), "{tag:?}: index must be integer");
    Term {
        tag,
        ty: crate::types::ptr_ty(),
        ref_: None,
        int_val: None,
        float_str: None,
        children: vec![elem_witness, base, index],
    }
}

pub fn element_ptr(elem_witness: Term, base: Term, index: Term) -> Term {
    indexed_ptr(Tag::ElementPtr, elem_witness, base, index)
}

pub fn field_ptr(elem_witness: Term, base: Term, index: Term) -> Term {
    indexed_ptr(Tag::FieldPtr, elem_witness, base, index)
}

pub fn array(element_ty: Type, elements: Vec<Term>) -> Term {
    assert!(
        elements.iter().all(|e| e.ty == element_ty),
        "array: every element must have the declared element type"
    );
    let ty = crate::types::array_ty(elements.len() as u64, element_ty);
    Term {
        tag: Tag::Array,
        ty,
        ref_: None,
        int_val: None,
        float_str: None,
        children: elements,
    }
}

pub fn tuple(ty: Type, fields: Vec<Term>) -> Term {
    assert_eq!(ty.kind(), crate::types::Kind::Struct, "tuple: type must be Struct");
    Term {
        tag: Tag::Tuple,
        ty,
        ref_: None,
        int_val: None,
        float_str: None,
        children: fields,
    }
}

pub fn vector(element_ty: Type, elements: Vec<Term>) -> Term {
    assert!(
        elements.iter().all(|e| e.ty == element_ty),
        "vector: every element must have the declared element type"
    );
    let ty = crate::types::vec_ty(elements.len() as u64, element_ty);
    Term {
        tag: Tag::Vec,
        ty,
        ref_: None,
        int_val: None,
        float_str: None,
        children: elements,
    }
}

pub fn call(func: Term, args: Vec<Term>) -> Term {
    let rty = func
        .ty()
        .fn_return()
        .expect("call: first operand must be a function value");
    let mut children = Vec::with_capacity(1 + args.len());
    children.push(func);
    children.extend(args);
    Term {
        tag: Tag::Call,
        ty: rty,
        ref_: None,
        int_val: None,
        float_str: None,
        children,
    }
}

impl Term {
    /// The all-zero-bits value of `ty`, recursively for aggregates. Grounds
    /// the `zeroinitializer` literal and provides type-witness operands for
    /// `ElementPtr`/`FieldPtr` (whose first child carries only a type, never
    /// printed by value).
    pub fn zero_of(ty: Type) -> Term {
        match ty.kind() {
            crate::types::Kind::Int => int_const(ty, 0),
            crate::types::Kind::Ptr => null_ptr(ty),
            crate::types::Kind::Float => float_const(ty, "0.0"),
            crate::types::Kind::Double => float_const(ty, "0.0"),
            crate::types::Kind::Array => {
                let elem = ty.component(0).expect("Array type must have an element component");
                let n = ty.len() as usize;
                array(elem.clone(), (0..n).map(|_| Term::zero_of(elem.clone())).collect())
            }
            crate::types::Kind::Vec => {
                let elem = ty.component(0).expect("Vec type must have an element component");
                let n = ty.len() as usize;
                vector(elem.clone(), (0..n).map(|_| Term::zero_of(elem.clone())).collect())
            }
            crate::types::Kind::Struct => {
                let fields = ty.struct_fields().expect("Struct type must expose its fields").to_vec();
                tuple(ty.clone(), fields.into_iter().map(Term::zero_of).collect())
            }
            crate::types::Kind::Void | crate::types::Kind::Fn => {
                panic!("zero_of: unsupported type {ty}")
            }
        }
    }

    pub fn is_zero_int(&self) -> bool {
        self.tag == Tag::Int && self.int_val.as_ref().is_some_and(BigInt::is_zero)
    }

    pub fn is_one_int(&self) -> bool {
        self.tag == Tag::Int && self.int_val.as_ref().is_some_and(|v| *v == BigInt::from(1))
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        crate::printer::write_term(f, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::int_ty;

    #[test]
    fn structural_equality_ignores_construction_order() {
        let a = add(int_const(int_ty(32), 1), int_const(int_ty(32), 2));
        let b = add(int_const(int_ty(32), 1), int_const(int_ty(32), 2));
        assert_eq!(a, b);
    }

    #[test]
    fn int_constants_compare_by_value_not_text() {
        let a = int_const(int_ty(8), 1);
        let b = int_const(int_ty(8), BigInt::from(1));
        assert_eq!(a, b);
    }

    #[test]
    fn zero_of_recurses_into_aggregates() {
        let field_ty = int_ty(8);
        let struct_ty = crate::types::struct_ty(vec![field_ty.clone(), field_ty]);
        let z = Term::zero_of(struct_ty.clone());
        assert_eq!(z.ty(), struct_ty);
        assert!(z.iter().all(Term::is_zero_int));
    }

    #[test]
    #[should_panic]
    fn binop_rejects_mismatched_types() {
        add(int_const(int_ty(8), 1), int_const(int_ty(16), 1));
    }

    #[test]
    fn call_result_type_is_function_return_type() {
        let fty = crate::types::fn_ty(int_ty(32), vec![int_ty(32)]);
        let f = global_ref(fty, Ref::name("f"));
        let arg = int_const(int_ty(32), 7);
        let c = call(f, vec![arg]);
        assert_eq!(c.ty(), int_ty(32));
    }

    #[test]
    fn serde_round_trip_preserves_structural_equality() {
        let expr = add(int_const(int_ty(32), 5), var(int_ty(32), Ref::name("x")));
        let json = serde_json::to_string(&expr).unwrap();
        let back: Term = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, back);
    }
}
