use thiserror::Error;
use ty::Type;
use utils::{Name, Span};

pub mod code;
pub mod compile;
pub mod ctx;
pub mod diag;
pub mod elab;
pub mod frame;
pub mod term;
pub mod ty;
pub mod utils;
pub mod witness;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unknown variable `{name}`")]
    UnknownVariable { name: Name, span: Span },
    #[error("type mismatch: expected `{expected}`, found `{actual}`")]
    TypeMismatch {
        actual: Type,
        expected: Type,
        span: Span,
    },
    #[error("not a function type: `{actual}`")]
    NotAFunction { actual: Type, span: Span },
    #[error("lambda must bind at least one parameter")]
    NullaryLambda { span: Span },
}

impl Error {
    pub fn unknown_variable(name: Name) -> Self {
        Self::UnknownVariable {
            name,
            span: Span::default(),
        }
    }
    pub fn type_mismatch(actual: Type, expected: Type, span: Span) -> Self {
        Self::TypeMismatch {
            actual,
            expected,
            span,
        }
    }
    pub fn not_a_function(actual: Type, span: Span) -> Self {
        Self::NotAFunction { actual, span }
    }
    /// Moves the error onto `span`.
    pub fn located(mut self, at: Span) -> Self {
        match &mut self {
            Self::UnknownVariable { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::NotAFunction { span, .. }
            | Self::NullaryLambda { span } => *span = at,
        }
        self
    }
    pub fn span(&self) -> Span {
        match self {
            Self::UnknownVariable { span, .. }
            | Self::TypeMismatch { span, .. }
            | Self::NotAFunction { span, .. }
            | Self::NullaryLambda { span } => *span,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
