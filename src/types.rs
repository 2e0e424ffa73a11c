//! Interned structural types. Equality and hashing are pointer-identity
//! after interning, and construction is O(1) amortized via a process-wide
//! pool.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};

use serde::{Deserialize, Serialize};

/// The structural shape of a type. Never exposed directly; always reached
/// through the interned `Type` handle.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum TypeData {
    Void,
    Int(u32),
    Float,
    Double,
    Ptr,
    Array(u64, Type),
    Vec(u64, Type),
    Struct(Vec<Type>),
    Fn(Type, Vec<Type>),
}

/// An interned, structural type. Cheap to clone; equality and hashing are
/// pointer identity on the shared data.
#[derive(Debug, Clone)]
pub struct Type(Arc<TypeData>);

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
impl Eq for Type {}

impl std::hash::Hash for Type {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        (Arc::as_ptr(&self.0) as usize).hash(state);
    }
}

/// The kind of a type, exposed for matching by callers without exposing
/// `TypeData`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Void,
    Int,
    Float,
    Double,
    Ptr,
    Array,
    Vec,
    Struct,
    Fn,
}

struct Pool {
    table: HashMap<TypeData, Type>,
}

fn pool() -> &'static Mutex<Pool> {
    static POOL: OnceLock<Mutex<Pool>> = OnceLock::new();
    POOL.get_or_init(|| {
        Mutex::new(Pool {
            table: HashMap::new(),
        })
    })
}

fn intern(data: TypeData) -> Type {
    let mut p = pool().lock().expect("type pool poisoned");
    if let Some(existing) = p.table.get(&data) {
        return existing.clone();
    }
    let ty = Type(Arc::new(data.clone()));
    p.table.insert(data, ty.clone());
    ty
}

impl Type {
    pub fn kind(&self) -> Kind {
        match &*self.0 {
            TypeData::Void => Kind::Void,
            TypeData::Int(_) => Kind::Int,
            TypeData::Float => Kind::Float,
            TypeData::Double => Kind::Double,
            TypeData::Ptr => Kind::Ptr,
            TypeData::Array(..) => Kind::Array,
            TypeData::Vec(..) => Kind::Vec,
            TypeData::Struct(_) => Kind::Struct,
            TypeData::Fn(..) => Kind::Fn,
        }
    }

    /// Bit width (Int) or element count (Array/Vec); 0 for other kinds.
    pub fn len(&self) -> u64 {
        match &*self.0 {
            TypeData::Int(n) => *n as u64,
            TypeData::Array(n, _) | TypeData::Vec(n, _) => *n,
            _ => 0,
        }
    }

    /// Count of structural components: scalars 0; Array/Vec 1; Struct
    /// number of fields; Fn 1 + number of parameters.
    pub fn size(&self) -> usize {
        match &*self.0 {
            TypeData::Array(..) | TypeData::Vec(..) => 1,
            TypeData::Struct(fields) => fields.len(),
            TypeData::Fn(_, params) => 1 + params.len(),
            _ => 0,
        }
    }

    /// Component `i`: for Array/Vec, the element type; for Struct, field
    /// `i`; for Fn, component 0 is the return type and the rest are
    /// parameters.
    pub fn component(&self, i: usize) -> Option<Type> {
        match &*self.0 {
            TypeData::Array(_, t) | TypeData::Vec(_, t) if i == 0 => Some(t.clone()),
            TypeData::Struct(fields) => fields.get(i).cloned(),
            TypeData::Fn(rty, params) => {
                if i == 0 {
                    Some(rty.clone())
                } else {
                    params.get(i - 1).cloned()
                }
            }
            _ => None,
        }
    }

    pub fn is_int(&self) -> bool {
        self.kind() == Kind::Int
    }

    pub fn is_float(&self) -> bool {
        matches!(self.kind(), Kind::Float | Kind::Double)
    }

    pub fn fn_return(&self) -> Option<Type> {
        match &*self.0 {
            TypeData::Fn(rty, _) => Some(rty.clone()),
            _ => None,
        }
    }

    pub fn fn_params(&self) -> Option<&[Type]> {
        match &*self.0 {
            TypeData::Fn(_, params) => Some(params.as_slice()),
            _ => None,
        }
    }

    pub fn struct_fields(&self) -> Option<&[Type]> {
        match &*self.0 {
            TypeData::Struct(fields) => Some(fields.as_slice()),
            _ => None,
        }
    }
}

pub fn void_ty() -> Type {
    intern(TypeData::Void)
}

pub fn int_ty(bits: u32) -> Type {
    assert!(bits >= 1, "int_ty: bit width must be >= 1");
    intern(TypeData::Int(bits))
}

pub fn bool_ty() -> Type {
    int_ty(1)
}

pub fn float_ty() -> Type {
    intern(TypeData::Float)
}

pub fn double_ty() -> Type {
    intern(TypeData::Double)
}

pub fn ptr_ty() -> Type {
    intern(TypeData::Ptr)
}

pub fn array_ty(len: u64, element: Type) -> Type {
    assert!(element.kind() != Kind::Void, "array_ty: element must not be void");
    intern(TypeData::Array(len, element))
}

pub fn vec_ty(len: u64, element: Type) -> Type {
    assert!(element.kind() != Kind::Void, "vec_ty: element must not be void");
    intern(TypeData::Vec(len, element))
}

pub fn struct_ty(fields: Vec<Type>) -> Type {
    assert!(
        fields.iter().all(|f| f.kind() != Kind::Void),
        "struct_ty: no field may be void"
    );
    intern(TypeData::Struct(fields))
}

pub fn fn_ty(rty: Type, params: Vec<Type>) -> Type {
    assert!(
        params.iter().all(|p| p.kind() != Kind::Void),
        "fn_ty: no parameter may be void"
    );
    intern(TypeData::Fn(rty, params))
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &*self.0 {
            TypeData::Void => write!(f, "void"),
            TypeData::Int(n) => write!(f, "i{n}"),
            TypeData::Float => write!(f, "float"),
            TypeData::Double => write!(f, "double"),
            TypeData::Ptr => write!(f, "ptr"),
            TypeData::Array(n, t) => write!(f, "[{n} x {t}]"),
            TypeData::Vec(n, t) => write!(f, "<{n} x {t}>"),
            TypeData::Struct(fields) => {
                write!(f, "{{")?;
                for (i, t) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, "}}")
            }
            TypeData::Fn(rty, params) => {
                write!(f, "{rty} (")?;
                for (i, t) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{t}")?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A non-interned mirror of `TypeData`, used only to move a `Type` across
/// `serde`; deserializing one re-interns through the ordinary constructors
/// so the result compares equal (by pointer identity) to any other `Type`
/// of the same shape.
#[derive(Serialize, Deserialize)]
enum TypeRepr {
    Void,
    Int(u32),
    Float,
    Double,
    Ptr,
    Array(u64, Box<TypeRepr>),
    Vec(u64, Box<TypeRepr>),
    Struct(Vec<TypeRepr>),
    Fn(Box<TypeRepr>, Vec<TypeRepr>),
}

impl From<&Type> for TypeRepr {
    fn from(t: &Type) -> TypeRepr {
        match &*t.0 {
            TypeData::Void => TypeRepr::Void,
            TypeData::Int(n) => TypeRepr::Int(*n),
            TypeData::Float => TypeRepr::Float,
            TypeData::Double => TypeRepr::Double,
            TypeData::Ptr => TypeRepr::Ptr,
            TypeData::Array(n, e) => TypeRepr::Array(*n, Box::new(TypeRepr::from(e))),
            TypeData::Vec(n, e) => TypeRepr::Vec(*n, Box::new(TypeRepr::from(e))),
            TypeData::Struct(fields) => TypeRepr::Struct(fields.iter().map(TypeRepr::from).collect()),
            TypeData::Fn(rty, params) => {
                TypeRepr::Fn(Box::new(TypeRepr::from(rty)), params.iter().map(TypeRepr::from).collect())
            }
        }
    }
}

impl TypeRepr {
    fn into_type(self) -> Type {
        match self {
            TypeRepr::Void => void_ty(),
            TypeRepr::Int(n) => int_ty(n),
            TypeRepr::Float => float_ty(),
            TypeRepr::Double => double_ty(),
            TypeRepr::Ptr => ptr_ty(),
            TypeRepr::Array(n, e) => array_ty(n, e.into_type()),
            TypeRepr::Vec(n, e) => vec_ty(n, e.into_type()),
            TypeRepr::Struct(fields) => struct_ty(fields.into_iter().map(TypeRepr::into_type).collect()),
            TypeRepr::Fn(rty, params) => fn_ty(rty.into_type(), params.into_iter().map(TypeRepr::into_type).collect()),
        }
    }
}

impl Serialize for Type {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TypeRepr::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Type {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(TypeRepr::deserialize(deserializer)?.into_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_equality_implies_interning_identity() {
        let a = array_ty(3, int_ty(32));
        let b = array_ty(3, int_ty(32));
        assert!(Arc::ptr_eq(&a.0, &b.0));
        assert_eq!(a, b);
    }

    #[test]
    fn distinct_shapes_intern_distinctly() {
        assert_ne!(int_ty(32), int_ty(64));
        assert_ne!(array_ty(2, int_ty(8)), vec_ty(2, int_ty(8)));
    }

    #[test]
    fn size_matches_component_count() {
        assert_eq!(void_ty().size(), 0);
        assert_eq!(int_ty(32).size(), 0);
        assert_eq!(array_ty(4, int_ty(8)).size(), 1);
        let s = struct_ty(vec![int_ty(8), int_ty(16)]);
        assert_eq!(s.size(), 2);
        let f = fn_ty(int_ty(32), vec![int_ty(32), int_ty(32)]);
        assert_eq!(f.size(), 3);
        assert_eq!(f.component(0), Some(int_ty(32)));
    }

    #[test]
    fn is_int_and_is_float_helpers() {
        assert!(int_ty(1).is_int());
        assert!(float_ty().is_float());
        assert!(double_ty().is_float());
        assert!(!ptr_ty().is_float());
    }

    #[test]
    fn display_matches_llvm_spellings() {
        assert_eq!(int_ty(32).to_string(), "i32");
        assert_eq!(array_ty(3, int_ty(8)).to_string(), "[3 x i8]");
        assert_eq!(vec_ty(4, float_ty()).to_string(), "<4 x float>");
        let f = fn_ty(void_ty(), vec![int_ty(32), ptr_ty()]);
        assert_eq!(f.to_string(), "void (i32, ptr)");
    }

    #[test]
    fn serde_round_trip_reinterns_to_an_equal_type() {
        let s = struct_ty(vec![int_ty(32), array_ty(2, ptr_ty())]);
        let json = serde_json::to_string(&s).unwrap();
        let back: Type = serde_json::from_str(&json).unwrap();
        assert_eq!(s, back);
    }
}
