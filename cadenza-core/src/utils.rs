use std::{fmt::Display, ops::Deref, sync::Arc};

/// Byte offsets `(start, end)` into the source the term was parsed from.
pub type Span = (usize, usize);

/// Interned identifier. Equality is by content: two names spelled the same
/// way are the same name no matter where they were produced.
pub type Name = ustr::Ustr;

pub fn name<S: AsRef<str>>(text: S) -> Name {
    ustr::ustr(text.as_ref())
}

#[derive(Debug, Clone)]
pub struct WithSpan<T> {
    data: T,
    pub span: Span,
}

impl<T: PartialEq> PartialEq for WithSpan<T> {
    fn eq(&self, other: &Self) -> bool {
        self.data == other.data
    }
}

impl<T: Eq> Eq for WithSpan<T> {}

impl<T> Deref for WithSpan<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.data
    }
}

impl<T: Display> Display for WithSpan<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.data.fmt(f)
    }
}

impl<T> WithSpan<T> {
    pub fn new(data: T, span: Span) -> Self {
        Self { data, span }
    }
    pub fn data(&self) -> &T {
        &self.data
    }
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }
    pub fn start(&self) -> usize {
        self.span.0
    }
    pub fn end(&self) -> usize {
        self.span.1
    }
}

pub fn with_span<T>(data: T, span: Span) -> Arc<WithSpan<T>> {
    Arc::new(WithSpan { data, span })
}

pub fn with_span_as<T, X, Y>(data: T, target: X) -> Arc<WithSpan<T>>
where
    X: AsRef<WithSpan<Y>>,
{
    Arc::new(WithSpan {
        data,
        span: target.as_ref().span,
    })
}

/// Span-carrying trees whose drop runs off an explicit worklist instead of
/// the native stack.
pub(crate) trait Dismantle: Sized {
    /// Shared stand-in left behind in a node whose child was taken out.
    fn placeholder() -> Arc<WithSpan<Self>>;
    /// Moves every uniquely owned child of `self` onto `pending`.
    fn detach_children(&mut self, pending: &mut Vec<Arc<WithSpan<Self>>>);
}

/// Takes `child` out of its parent when nothing else holds it. Shared
/// children stay put and are released by their last owner.
pub(crate) fn detach<T: Dismantle>(
    child: &mut Arc<WithSpan<T>>,
    pending: &mut Vec<Arc<WithSpan<T>>>,
) {
    if Arc::get_mut(child).is_some() {
        pending.push(std::mem::replace(child, T::placeholder()));
    }
}

/// Called from `Drop`. Every node reached this way has lost its children by
/// the time it is released, so no drop glue recurses.
pub(crate) fn dismantle<T: Dismantle>(node: &mut T) {
    let mut pending = Vec::new();
    node.detach_children(&mut pending);
    while let Some(child) = pending.pop() {
        if let Ok(mut child) = Arc::try_unwrap(child) {
            child.data_mut().detach_children(&mut pending);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn names_compare_by_content() {
        let owned = String::from("x");
        assert_eq!(name("x"), name(owned));
        assert_ne!(name("x"), name("y"));
    }

    #[test]
    fn spans_do_not_affect_equality() {
        let a = with_span(1, (0, 1));
        let b = with_span(1, (5, 9));
        assert_eq!(a, b);
        assert_eq!(b.start(), 5);
        assert_eq!(b.end(), 9);
    }
}
