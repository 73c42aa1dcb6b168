//!
//! Typed trees produced by a successful check.
//!
//! A witness records the statically proven type of a term together with
//! everything the compiler needs to lay it out later. It embeds no
//! behaviour: code generation is a separate walk in [`crate::compile`].

use std::sync::{Arc, LazyLock};

use smallvec::SmallVec;

use crate::{
    Error, Result,
    ty::Type,
    utils::{Dismantle, Name, Span, WithSpan, detach, dismantle, with_span},
};

pub type WitnessPtr = Arc<WithSpan<Witness>>;

#[derive(Debug, Clone, PartialEq)]
pub struct Witness {
    ty: Type,
    evidence: Evidence,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Evidence {
    Var(Name),
    If {
        cond: WitnessPtr,
        then_branch: WitnessPtr,
        else_branch: WitnessPtr,
    },
    App(WitnessPtr, SmallVec<WitnessPtr, 4>),
    Lambda {
        params: Box<[Name]>,
        body: WitnessPtr,
    },
}

impl Witness {
    pub fn new(ty: Type, evidence: Evidence) -> Self {
        Self { ty, evidence }
    }
    pub fn ty(&self) -> &Type {
        &self.ty
    }
    pub fn evidence(&self) -> &Evidence {
        &self.evidence
    }
}

static WITNESS_PLACEHOLDER: LazyLock<WitnessPtr> = LazyLock::new(|| {
    let name = crate::utils::name("_");
    with_span(Witness::new(Type::Base(name), Evidence::Var(name)), Span::default())
});

impl Dismantle for Witness {
    fn placeholder() -> WitnessPtr {
        WITNESS_PLACEHOLDER.clone()
    }
    fn detach_children(&mut self, pending: &mut Vec<WitnessPtr>) {
        match &mut self.evidence {
            Evidence::Var(_) => {}
            Evidence::If {
                cond,
                then_branch,
                else_branch,
            } => {
                detach(cond, pending);
                detach(then_branch, pending);
                detach(else_branch, pending);
            }
            Evidence::App(rator, rands) => {
                detach(rator, pending);
                rands.iter_mut().for_each(|rand| detach(rand, pending));
            }
            Evidence::Lambda { body, .. } => detach(body, pending),
        }
    }
}

impl Drop for Witness {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl WithSpan<Witness> {
    /// Passes the witness through unchanged unless `expected` is present and
    /// structurally different from the proven type.
    pub fn matches(self: Arc<Self>, expected: Option<&Type>) -> Result<Arc<Self>> {
        match expected {
            Some(expected) if *expected != self.ty => Err(Error::type_mismatch(
                self.ty.clone(),
                expected.clone(),
                self.span,
            )),
            _ => Ok(self),
        }
    }
}
