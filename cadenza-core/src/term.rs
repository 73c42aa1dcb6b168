use std::sync::{Arc, LazyLock};

use smallvec::SmallVec;

use crate::{
    ty::Type,
    utils::{Dismantle, Name, Span, WithSpan, detach, dismantle, with_span},
};

pub type TermPtr = Arc<WithSpan<Term>>;

/// Operands of an application. Most calls in practice take a handful.
pub type Operands = SmallVec<TermPtr, 4>;

/// Surface terms, as handed over by the parser. Never mutated by the checker.
#[derive(Debug, Clone, PartialEq)]
pub enum Term {
    /// Variable reference
    Var(Name),
    /// Conditional, both branches must agree on a type
    If {
        cond: TermPtr,
        then_branch: TermPtr,
        else_branch: TermPtr,
    },
    /// Curried application of an operator to zero or more operands
    App(TermPtr, Operands),
    /// Function literal with annotated parameters
    Lambda {
        params: Box<[(Name, Type)]>,
        body: TermPtr,
    },
}

impl Term {
    pub fn at(self, span: Span) -> TermPtr {
        with_span(self, span)
    }
    /// The outermost constructor alone, cheap to print at any depth.
    pub fn head(&self) -> Head<'_> {
        Head(self)
    }
}

static TERM_PLACEHOLDER: LazyLock<TermPtr> =
    LazyLock::new(|| Term::Var(crate::utils::name("_")).at(Span::default()));

impl Dismantle for Term {
    fn placeholder() -> TermPtr {
        TERM_PLACEHOLDER.clone()
    }
    fn detach_children(&mut self, pending: &mut Vec<TermPtr>) {
        match self {
            Term::Var(_) => {}
            Term::If {
                cond,
                then_branch,
                else_branch,
            } => {
                detach(cond, pending);
                detach(then_branch, pending);
                detach(else_branch, pending);
            }
            Term::App(rator, rands) => {
                detach(rator, pending);
                rands.iter_mut().for_each(|rand| detach(rand, pending));
            }
            Term::Lambda { body, .. } => detach(body, pending),
        }
    }
}

impl Drop for Term {
    fn drop(&mut self) {
        dismantle(self);
    }
}

pub fn var<S: AsRef<str>>(name: S) -> TermPtr {
    Term::Var(crate::utils::name(name)).at(Span::default())
}

pub fn if_then_else(cond: TermPtr, then_branch: TermPtr, else_branch: TermPtr) -> TermPtr {
    Term::If {
        cond,
        then_branch,
        else_branch,
    }
    .at(Span::default())
}

pub fn app<I>(rator: TermPtr, rands: I) -> TermPtr
where
    I: IntoIterator<Item = TermPtr>,
{
    Term::App(rator, rands.into_iter().collect()).at(Span::default())
}

pub fn lambda<I, S>(params: I, body: TermPtr) -> TermPtr
where
    I: IntoIterator<Item = (S, Type)>,
    S: AsRef<str>,
{
    let params = params
        .into_iter()
        .map(|(name, ty)| (crate::utils::name(name), ty))
        .collect();
    Term::Lambda { params, body }.at(Span::default())
}

impl std::fmt::Display for Term {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Term::Var(name) => write!(f, "{name}"),
            Term::If {
                cond,
                then_branch,
                else_branch,
            } => write!(f, "if {cond} then {then_branch} else {else_branch}"),
            Term::App(rator, rands) => {
                write!(f, "({rator}")?;
                for rand in rands.iter() {
                    write!(f, " {rand}")?;
                }
                write!(f, ")")
            }
            Term::Lambda { params, body } => {
                write!(f, "\\")?;
                for (name, ty) in params.iter() {
                    write!(f, "({name} : {ty}) ")?;
                }
                write!(f, "-> {body}")
            }
        }
    }
}

pub struct Head<'a>(&'a Term);

impl std::fmt::Display for Head<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Term::Var(name) => write!(f, "{name}"),
            Term::If { .. } => write!(f, "conditional"),
            Term::App(_, rands) => write!(f, "application to {} operands", rands.len()),
            Term::Lambda { params, .. } => write!(f, "lambda of {} parameters", params.len()),
        }
    }
}
