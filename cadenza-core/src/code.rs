//!
//! Executable expression trees handed to the evaluator.
//!
//! Every node records the type the checker proved for it. Slots refer to the
//! frame the tree was compiled against (or, inside a lambda body, to the
//! body's own frame).

use std::sync::{Arc, LazyLock};

use crate::{
    frame::Slot,
    ty::Type,
    utils::{Dismantle, Span, WithSpan, detach, dismantle, with_span},
};

pub type ExprPtr = Arc<WithSpan<Expr>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// Read a slot of the current frame
    Var { ty: Type, slot: Slot },
    If {
        ty: Type,
        cond: ExprPtr,
        then_branch: ExprPtr,
        else_branch: ExprPtr,
    },
    /// Apply `rator` to all of `rands` at once
    App {
        ty: Type,
        rator: ExprPtr,
        rands: Box<[ExprPtr]>,
    },
    /// Allocate a closure
    Lambda {
        ty: Type,
        arity: usize,
        closure_size: usize,
        captures: Box<[Capture]>,
        body: Arc<LambdaBody>,
    },
}

/// Copies `parent` of the enclosing frame into `closure` of the new closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capture {
    pub closure: Slot,
    pub parent: Slot,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LambdaBody {
    pub frame_size: usize,
    /// Body slots loaded from the captured environment on entry.
    pub env_preamble: Box<[EnvLoad]>,
    /// Body slots loaded from call arguments on entry.
    pub arg_preamble: Box<[ArgLoad]>,
    pub body: ExprPtr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvLoad {
    pub slot: Slot,
    pub closure: Slot,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArgLoad {
    pub slot: Slot,
    pub arg: usize,
}

impl Expr {
    pub fn ty(&self) -> &Type {
        match self {
            Expr::Var { ty, .. }
            | Expr::If { ty, .. }
            | Expr::App { ty, .. }
            | Expr::Lambda { ty, .. } => ty,
        }
    }
}

static EXPR_PLACEHOLDER: LazyLock<ExprPtr> = LazyLock::new(|| {
    let ty = Type::base("_");
    with_span(Expr::Var { ty, slot: Slot::new(0) }, Span::default())
});

impl Dismantle for Expr {
    fn placeholder() -> ExprPtr {
        EXPR_PLACEHOLDER.clone()
    }
    fn detach_children(&mut self, pending: &mut Vec<ExprPtr>) {
        match self {
            Expr::Var { .. } => {}
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                detach(cond, pending);
                detach(then_branch, pending);
                detach(else_branch, pending);
            }
            Expr::App { rator, rands, .. } => {
                detach(rator, pending);
                rands.iter_mut().for_each(|rand| detach(rand, pending));
            }
            Expr::Lambda { body, .. } => {
                if let Some(body) = Arc::get_mut(body) {
                    detach(&mut body.body, pending);
                }
            }
        }
    }
}

impl Drop for Expr {
    fn drop(&mut self) {
        dismantle(self);
    }
}

impl std::fmt::Display for Expr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Var { slot, .. } => write!(f, "{slot}"),
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => write!(f, "if {cond} then {then_branch} else {else_branch}"),
            Expr::App { rator, rands, .. } => {
                write!(f, "({rator}")?;
                for rand in rands.iter() {
                    write!(f, " {rand}")?;
                }
                write!(f, ")")
            }
            Expr::Lambda {
                arity,
                captures,
                body,
                ..
            } => {
                write!(f, "closure/{arity}[")?;
                for (i, capture) in captures.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}<-{}", capture.closure, capture.parent)?;
                }
                write!(f, "] {{ {} }}", body.body)
            }
        }
    }
}
