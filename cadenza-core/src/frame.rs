use rustc_hash::FxHashMapRand;
use tracing::trace;

use crate::utils::Name;

/// Storage slot of a variable within one frame.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct Slot(usize);

impl Slot {
    pub const fn new(index: usize) -> Self {
        Self(index)
    }
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for Slot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Compilation environment: assigns each name a stable slot, densely and in
/// first-seen order.
///
/// A frame is filled in while a single witness tree is compiled. Independent
/// compilations need independent frames.
#[derive(Debug, Default, Clone)]
pub struct Frame {
    slots: FxHashMapRand<Name, Slot>,
    identifiers: Vec<Name>,
}

impl PartialEq for Frame {
    fn eq(&self, other: &Self) -> bool {
        self.identifiers == other.identifiers
    }
}

impl Eq for Frame {}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn find(&self, name: Name) -> Option<Slot> {
        self.slots.get(&name).copied()
    }
    pub fn find_or_add(&mut self, name: Name) -> Slot {
        if let Some(slot) = self.find(name) {
            return slot;
        }
        let slot = Slot(self.identifiers.len());
        trace!("allocating slot {slot} for {name}");
        self.slots.insert(name, slot);
        self.identifiers.push(name);
        slot
    }
    pub fn len(&self) -> usize {
        self.identifiers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.identifiers.is_empty()
    }
    /// Names paired with their slots, in allocation order.
    pub fn identifiers(&self) -> impl Iterator<Item = (Name, Slot)> + '_ {
        self.identifiers
            .iter()
            .enumerate()
            .map(|(index, name)| (*name, Slot(index)))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::utils::name;

    #[test]
    fn it_reuses_slots_for_known_names() {
        let mut frame = Frame::new();
        let x = frame.find_or_add(name("x"));
        let y = frame.find_or_add(name("y"));
        assert_eq!(frame.find_or_add(name("x")), x);
        assert_ne!(x, y);
        assert_eq!((x.index(), y.index()), (0, 1));
        assert_eq!(frame.len(), 2);
    }

    #[test]
    fn it_lists_identifiers_in_allocation_order() {
        let mut frame = Frame::new();
        assert!(frame.is_empty());
        for n in ["c", "a", "c", "b"] {
            frame.find_or_add(name(n));
        }
        let names: Vec<_> = frame.identifiers().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
        assert_eq!(frame.find(name("b")).map(Slot::index), Some(2));
        assert_eq!(frame.find(name("z")), None);
    }
}
