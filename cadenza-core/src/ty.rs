use std::sync::Arc;

use crate::utils::{Name, name};

pub type TypePtr = Arc<Type>;

/// Simple types: nominal base types and (curried) function types.
///
/// Equivalence is structural. `A -> B -> C` is `Arrow(A, Arrow(B, C))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    Base(Name),
    Arrow(TypePtr, TypePtr),
}

impl Type {
    pub fn base<S: AsRef<str>>(label: S) -> Self {
        Self::Base(name(label))
    }
    pub fn bool() -> Self {
        Self::base("Bool")
    }
    pub fn arrow(argument: Type, result: Type) -> Self {
        Self::Arrow(Arc::new(argument), Arc::new(result))
    }
    /// Builds `a1 -> a2 -> ... -> result`.
    pub fn curried<I>(arguments: I, result: Type) -> Self
    where
        I: IntoIterator<Item = Type>,
        I::IntoIter: DoubleEndedIterator,
    {
        arguments
            .into_iter()
            .rev()
            .fold(result, |acc, arg| Self::arrow(arg, acc))
    }
    pub fn as_arrow(&self) -> Option<(&Type, &Type)> {
        match self {
            Type::Arrow(argument, result) => Some((argument, result)),
            Type::Base(_) => None,
        }
    }
    pub fn is_arrow(&self) -> bool {
        matches!(self, Type::Arrow(..))
    }
}

impl std::fmt::Display for Type {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Type::Base(label) => write!(f, "{label}"),
            Type::Arrow(argument, result) if argument.is_arrow() => {
                write!(f, "({argument}) -> {result}")
            }
            Type::Arrow(argument, result) => write!(f, "{argument} -> {result}"),
        }
    }
}
