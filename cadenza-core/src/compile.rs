//!
//! Second phase: lay a checked witness tree out against a frame.
//!
//! Nothing here can fail, all decisions were made while checking.

use std::sync::Arc;

use tracing::trace;

use crate::{
    code::{ArgLoad, Capture, EnvLoad, Expr, ExprPtr, LambdaBody},
    elab::Options,
    frame::Frame,
    ty::Type,
    utils::{Name, with_span_as},
    witness::{Evidence, WitnessPtr},
};

#[derive(Debug, Default, Clone)]
pub struct Compiler {
    options: Options,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_options(options: Options) -> Self {
        Self { options }
    }

    pub fn compile(&self, witness: &WitnessPtr, frame: &mut Frame) -> ExprPtr {
        let Options {
            stack_red_zone,
            stack_growth,
        } = self.options;
        stacker::maybe_grow(stack_red_zone, stack_growth, || {
            self.compile_witness(witness, frame)
        })
    }

    fn compile_witness(&self, witness: &WitnessPtr, frame: &mut Frame) -> ExprPtr {
        let ty = witness.ty().clone();
        let expr = match witness.evidence() {
            Evidence::Var(name) => Expr::Var {
                ty,
                slot: frame.find_or_add(*name),
            },
            Evidence::If {
                cond,
                then_branch,
                else_branch,
            } => Expr::If {
                ty,
                cond: self.compile(cond, frame),
                then_branch: self.compile(then_branch, frame),
                else_branch: self.compile(else_branch, frame),
            },
            Evidence::App(rator, rands) => Expr::App {
                ty,
                rator: self.compile(rator, frame),
                rands: rands.iter().map(|rand| self.compile(rand, frame)).collect(),
            },
            Evidence::Lambda { params, body } => self.compile_lambda(params, body, frame, ty),
        };
        with_span_as(expr, witness)
    }

    /// Closure conversion. The body gets a frame of its own; every name it
    /// uses is either a parameter, loaded from the call arguments, or a
    /// capture, copied out of `frame` when the closure is built.
    fn compile_lambda(
        &self,
        params: &[Name],
        body: &WitnessPtr,
        frame: &mut Frame,
        ty: Type,
    ) -> Expr {
        let mut body_frame = Frame::new();
        let body = self.compile(body, &mut body_frame);
        let captures_any = body_frame
            .identifiers()
            .any(|(name, _)| !params.contains(&name));
        // Argument 0 carries the captured environment, if there is one.
        let offset = usize::from(captures_any);

        let mut closure_frame = Frame::new();
        let mut captures = Vec::new();
        let mut env_preamble = Vec::new();
        let mut arg_preamble = Vec::new();
        for (name, slot) in body_frame.identifiers() {
            match params.iter().rposition(|param| *param == name) {
                Some(index) => arg_preamble.push(ArgLoad {
                    slot,
                    arg: index + offset,
                }),
                None => {
                    let closure = closure_frame.find_or_add(name);
                    let parent = frame.find_or_add(name);
                    captures.push(Capture { closure, parent });
                    env_preamble.push(EnvLoad { slot, closure });
                }
            }
        }
        trace!(
            "closure of arity {} captures {} of {} body slots",
            params.len(),
            captures.len(),
            body_frame.len()
        );
        Expr::Lambda {
            ty,
            arity: params.len(),
            closure_size: closure_frame.len(),
            captures: captures.into(),
            body: Arc::new(LambdaBody {
                frame_size: body_frame.len(),
                env_preamble: env_preamble.into(),
                arg_preamble: arg_preamble.into(),
                body,
            }),
        }
    }
}

pub fn compile(witness: &WitnessPtr, frame: &mut Frame) -> ExprPtr {
    Compiler::new().compile(witness, frame)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        ctx::Ctx,
        elab::infer,
        frame::Slot,
        term::{app, if_then_else, lambda, test::int, var},
        utils::name,
    };

    fn ctx() -> Ctx {
        [
            (name("b"), Type::bool()),
            (name("x"), int()),
            (name("add"), Type::curried([int(), int()], int())),
        ]
        .into_iter()
        .collect()
    }

    fn slot(frame: &Frame, n: &str) -> Slot {
        frame.find(name(n)).unwrap()
    }

    #[test]
    fn it_compiles_conditionals_over_shared_slots() {
        _ = tracing_subscriber::fmt::try_init();
        let term = if_then_else(var("b"), var("x"), var("x"));
        let witness = infer(&ctx(), &term).unwrap();
        let mut frame = Frame::new();
        let expr = compile(&witness, &mut frame);
        let x = Arc::new(crate::utils::WithSpan::new(
            Expr::Var {
                ty: int(),
                slot: slot(&frame, "x"),
            },
            (0, 0),
        ));
        let Expr::If {
            ty,
            cond,
            then_branch,
            else_branch,
        } = expr.data()
        else {
            panic!("expected a conditional, got {expr}");
        };
        assert_eq!(ty, &int());
        assert_eq!(cond.ty(), &Type::bool());
        assert_eq!(then_branch, &x);
        assert_eq!(else_branch, &x);
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn it_compiles_applications_with_full_arity() {
        let term = app(var("add"), [var("x"), var("x")]);
        let witness = infer(&ctx(), &term).unwrap();
        let mut frame = Frame::new();
        let expr = compile(&witness, &mut frame);
        let Expr::App { ty, rator, rands } = expr.data() else {
            panic!("expected an application, got {expr}");
        };
        assert_eq!(ty, &int());
        assert_eq!(rator.ty(), &Type::curried([int(), int()], int()));
        assert_eq!(rands.len(), 2);
        assert_eq!(rands[0], rands[1]);
        assert_eq!(expr.to_string(), "(#0 #1 #1)");
    }

    #[test]
    fn compilation_is_idempotent() {
        let term = if_then_else(
            var("b"),
            app(var("add"), [var("x")]),
            lambda([("y", int())], app(var("add"), [var("y"), var("x")])),
        );
        let witness = infer(&ctx(), &term).unwrap();
        let mut first = Frame::new();
        let mut second = Frame::new();
        let lhs = compile(&witness, &mut first);
        let rhs = compile(&witness, &mut second);
        assert_eq!(lhs, rhs);
        assert_eq!(first, second);
        let again = compile(&witness, &mut first);
        assert_eq!(lhs, again);
        assert_eq!(first, second);
    }

    #[test]
    fn closures_capture_free_names() {
        _ = tracing_subscriber::fmt::try_init();
        let term = lambda([("y", int())], app(var("add"), [var("x"), var("y")]));
        let witness = infer(&ctx(), &term).unwrap();
        let mut frame = Frame::new();
        frame.find_or_add(name("b"));
        let expr = compile(&witness, &mut frame);
        let Expr::Lambda {
            ty,
            arity,
            closure_size,
            captures,
            body,
        } = expr.data()
        else {
            panic!("expected a closure, got {expr}");
        };
        assert_eq!(ty, &Type::arrow(int(), int()));
        assert_eq!(*arity, 1);
        assert_eq!(*closure_size, 2);
        // body frame: add #0, x #1, y #2
        assert_eq!(body.frame_size, 3);
        assert_eq!(
            &*body.arg_preamble,
            &[ArgLoad {
                slot: Slot::new(2),
                arg: 1
            }]
        );
        assert_eq!(
            &*body.env_preamble,
            &[
                EnvLoad {
                    slot: Slot::new(0),
                    closure: Slot::new(0)
                },
                EnvLoad {
                    slot: Slot::new(1),
                    closure: Slot::new(1)
                },
            ]
        );
        assert_eq!(
            &**captures,
            &[
                Capture {
                    closure: Slot::new(0),
                    parent: slot(&frame, "add")
                },
                Capture {
                    closure: Slot::new(1),
                    parent: slot(&frame, "x")
                },
            ]
        );
        assert_eq!(slot(&frame, "b"), Slot::new(0));
        assert!(frame.find(name("y")).is_none());
    }

    #[test]
    fn closed_lambdas_take_arguments_from_zero() {
        let term = lambda([("p", int()), ("q", Type::bool())], var("p"));
        let witness = infer(&Ctx::empty(), &term).unwrap();
        let mut frame = Frame::new();
        let expr = compile(&witness, &mut frame);
        let Expr::Lambda {
            arity,
            closure_size,
            captures,
            body,
            ..
        } = expr.data()
        else {
            panic!("expected a closure, got {expr}");
        };
        assert_eq!(*arity, 2);
        assert_eq!(*closure_size, 0);
        assert!(captures.is_empty());
        assert!(body.env_preamble.is_empty());
        assert_eq!(
            &*body.arg_preamble,
            &[ArgLoad {
                slot: Slot::new(0),
                arg: 0
            }]
        );
        assert!(frame.is_empty());
    }

    #[test]
    fn duplicate_parameters_bind_the_last_occurrence() {
        let term = lambda([("p", int()), ("p", int())], var("p"));
        let witness = infer(&Ctx::empty(), &term).unwrap();
        let expr = compile(&witness, &mut Frame::new());
        let Expr::Lambda { body, .. } = expr.data() else {
            panic!("expected a closure, got {expr}");
        };
        assert_eq!(body.arg_preamble[0].arg, 1);
    }
}
