//!
//! Bidirectional Type Checking
//!
//! Every rule runs in a single pass: expected types flow down where they are
//! known, types are inferred bottom-up where they are not, and the two meet
//! in the witness match funnel. There is no unification and nothing
//! is ever revisited.

use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::{
    Error, Result,
    ctx::Ctx,
    term::{Term, TermPtr},
    ty::Type,
    utils::with_span_as,
    witness::{Evidence, Witness, WitnessPtr},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    /// Remaining stack below which a recursive step moves to a fresh segment.
    pub stack_red_zone: usize,
    /// Size of each freshly allocated stack segment.
    pub stack_growth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            stack_red_zone: 32 * 1024,
            stack_growth: 1024 * 1024,
        }
    }
}

#[derive(Debug, Default, Clone)]
pub struct Elaborator {
    options: Options,
}

impl Elaborator {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }
    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn infer(&self, ctx: &Ctx, term: &TermPtr) -> Result<WitnessPtr> {
        self.elaborate(ctx, term, None)
    }

    pub fn check(&self, ctx: &Ctx, term: &TermPtr, expected: &Type) -> Result<WitnessPtr> {
        self.elaborate(ctx, term, Some(expected))
    }

    /// Checks `term` against `expected`, or infers it when `expected` is
    /// absent. Whatever the rule, the resulting witness is matched against
    /// the expectation before it is returned.
    pub fn elaborate(
        &self,
        ctx: &Ctx,
        term: &TermPtr,
        expected: Option<&Type>,
    ) -> Result<WitnessPtr> {
        let Options {
            stack_red_zone,
            stack_growth,
        } = self.options;
        stacker::maybe_grow(stack_red_zone, stack_growth, || {
            match expected {
                Some(ty) => {
                    trace!(span = ?term.span, "checking {} against {ty}", term.head())
                }
                None => trace!(span = ?term.span, "inferring {}", term.head()),
            }
            self.elaborate_term(ctx, term, expected)
                .and_then(|witness| witness.matches(expected))
                .inspect_err(|e| {
                    debug!(span = ?term.span, "failed to check {}: {e}", term.head())
                })
        })
    }

    fn elaborate_term(
        &self,
        ctx: &Ctx,
        term: &TermPtr,
        expected: Option<&Type>,
    ) -> Result<WitnessPtr> {
        match term.data() {
            Term::Var(name) => {
                let ty = ctx.lookup(*name).map_err(|e| e.located(term.span))?;
                Ok(with_span_as(
                    Witness::new(ty.clone(), Evidence::Var(*name)),
                    term,
                ))
            }
            Term::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.check(ctx, cond, &Type::bool())?;
                let then_branch = self.elaborate(ctx, then_branch, expected)?;
                let actual = then_branch.ty().clone();
                let else_branch = self.check(ctx, else_branch, &actual)?;
                Ok(with_span_as(
                    Witness::new(
                        actual,
                        Evidence::If {
                            cond,
                            then_branch,
                            else_branch,
                        },
                    ),
                    term,
                ))
            }
            Term::App(rator, rands) => {
                let rator = self.infer(ctx, rator)?;
                let mut current = rator.ty().clone();
                let mut checked = SmallVec::<WitnessPtr, 4>::with_capacity(rands.len());
                for rand in rands.iter() {
                    let Some((argument, result)) = current
                        .as_arrow()
                        .map(|(argument, result)| (argument.clone(), result.clone()))
                    else {
                        return Err(Error::not_a_function(current, rator.span));
                    };
                    checked.push(self.check(ctx, rand, &argument)?);
                    current = result;
                }
                Ok(with_span_as(
                    Witness::new(current, Evidence::App(rator, checked)),
                    term,
                ))
            }
            Term::Lambda { params, body } => {
                if params.is_empty() {
                    return Err(Error::NullaryLambda { span: term.span });
                }
                let inner = params
                    .iter()
                    .fold(ctx.clone(), |ctx, (name, ty)| ctx.extend(*name, ty.clone()));
                let mut body_expected = expected;
                for (_, param) in params.iter() {
                    body_expected = body_expected
                        .and_then(Type::as_arrow)
                        .and_then(|(argument, result)| (argument == param).then_some(result));
                }
                let body = self.elaborate(&inner, body, body_expected)?;
                let ty = Type::curried(params.iter().map(|(_, ty)| ty.clone()), body.ty().clone());
                let params = params.iter().map(|(name, _)| *name).collect();
                Ok(with_span_as(
                    Witness::new(ty, Evidence::Lambda { params, body }),
                    term,
                ))
            }
        }
    }
}

pub fn infer(ctx: &Ctx, term: &TermPtr) -> Result<WitnessPtr> {
    Elaborator::new().infer(ctx, term)
}

pub fn check(ctx: &Ctx, term: &TermPtr, expected: &Type) -> Result<WitnessPtr> {
    Elaborator::new().check(ctx, term, expected)
}
