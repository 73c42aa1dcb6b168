use archery::ArcK;
use rpds::List;

use crate::{Error, Result, ty::Type, utils::Name};

/// Typing environment: a persistent cons-list of `(name, type)` bindings.
///
/// Extending shares the tail with the parent, so one `Ctx` can be handed to
/// several branches without any of them observing the others' bindings.
/// Nodes are atomically counted, so those branches may run on other threads.
#[derive(Debug, Clone)]
pub struct Ctx(List<(Name, Type), ArcK>);

impl Default for Ctx {
    fn default() -> Self {
        Self::empty()
    }
}

impl Ctx {
    pub fn empty() -> Self {
        Self(List::new_with_ptr_kind())
    }
    pub fn extend(&self, name: Name, ty: Type) -> Self {
        Self(self.0.push_front((name, ty)))
    }
    /// Innermost binding of `name`, scanning from the head.
    pub fn lookup(&self, name: Name) -> Result<&Type> {
        self.0
            .iter()
            .find(|(bound, _)| *bound == name)
            .map(|(_, ty)| ty)
            .ok_or_else(|| Error::unknown_variable(name))
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn depth(&self) -> usize {
        self.0.len()
    }
    pub fn bindings(&self) -> impl Iterator<Item = (Name, &Type)> {
        self.0.iter().map(|(name, ty)| (*name, ty))
    }
}

impl FromIterator<(Name, Type)> for Ctx {
    /// Later pairs shadow earlier ones.
    fn from_iter<T: IntoIterator<Item = (Name, Type)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::empty(), |ctx, (name, ty)| ctx.extend(name, ty))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::name;

    #[test]
    fn lookup_in_empty_context_fails() {
        let ctx = Ctx::empty();
        assert!(ctx.is_empty());
        assert_eq!(
            ctx.lookup(name("x")),
            Err(Error::unknown_variable(name("x")))
        );
    }

    #[test]
    fn lookup_finds_innermost_binding() {
        let int = Type::base("Int");
        let ctx = Ctx::empty().extend(name("x"), int.clone());
        assert_eq!(ctx.lookup(name("x")), Ok(&int));
        let shadowed = ctx.extend(name("x"), Type::bool());
        assert_eq!(shadowed.lookup(name("x")), Ok(&Type::bool()));
        assert_eq!(shadowed.depth(), 2);
    }

    #[test]
    fn extension_leaves_parent_untouched() {
        let parent = Ctx::empty().extend(name("b"), Type::bool());
        let left = parent.extend(name("x"), Type::base("Int"));
        let right = parent.extend(name("x"), Type::bool());
        assert!(parent.lookup(name("x")).is_err());
        assert_eq!(left.lookup(name("x")), Ok(&Type::base("Int")));
        assert_eq!(right.lookup(name("x")), Ok(&Type::bool()));
        assert_eq!(left.lookup(name("b")), Ok(&Type::bool()));
    }

    #[test]
    fn collected_bindings_shadow_in_order() {
        let ctx: Ctx = [
            (name("x"), Type::base("Int")),
            (name("y"), Type::bool()),
            (name("x"), Type::bool()),
        ]
        .into_iter()
        .collect();
        assert_eq!(ctx.lookup(name("x")), Ok(&Type::bool()));
        let names: Vec<_> = ctx.bindings().map(|(name, _)| name).collect();
        assert_eq!(names, [name("x"), name("y"), name("x")]);
    }
}
