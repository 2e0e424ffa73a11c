//! Global variable declarations.

use serde::{Deserialize, Serialize};

use crate::ref_id::Ref;
use crate::term::Term;
use crate::types::Type;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Global {
    ty: Type,
    reference: Ref,
    initializer: Option<Term>,
}

impl Global {
    pub fn new(ty: Type, reference: Ref, initializer: Option<Term>) -> Global {
        if let Some(init) = &initializer {
            assert_eq!(init.ty(), ty, "Global::new: initializer type must match declared type");
        }
        Global {
            ty,
            reference,
            initializer,
        }
    }

    pub fn ty(&self) -> Type {
        self.ty.clone()
    }

    pub fn reference(&self) -> &Ref {
        &self.reference
    }

    pub fn initializer(&self) -> Option<&Term> {
        self.initializer.as_ref()
    }

    pub fn with_initializer(&self, initializer: Option<Term>) -> Global {
        Global {
            ty: self.ty.clone(),
            reference: self.reference.clone(),
            initializer,
        }
    }
}
