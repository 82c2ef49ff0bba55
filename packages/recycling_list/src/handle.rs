use std::fmt;

/// Identifies one node of a [`RecyclingList`][crate::RecyclingList].
///
/// A handle is a slot index tagged with the generation the node received when it was linked.
/// Removing the node invalidates the handle; if the slot is later reissued for a new value, the
/// new node receives a different generation, so the old handle keeps being rejected.
///
/// Handles are plain values: they can be copied, compared and hashed, which makes them suitable
/// as keys in auxiliary lookup tables maintained next to the list.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct NodeHandle {
    index: usize,
    generation: u64,
}

impl NodeHandle {
    #[must_use]
    pub(crate) fn new(index: usize, generation: u64) -> Self {
        Self { index, generation }
    }

    #[must_use]
    pub(crate) fn index(self) -> usize {
        self.index
    }

    #[must_use]
    pub(crate) fn generation(self) -> u64 {
        self.generation
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.index, self.generation)
    }
}
