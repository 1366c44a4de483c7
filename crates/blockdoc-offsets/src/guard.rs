//! Reentrancy guard for the block attributor.

/// Whether the attributor is currently delegating a block to the rest of the
/// handler chain.
///
/// While `Prerendering`, the attributor's activation test rejects every
/// block, so text it resubmitted is parsed by the grammar handlers and never
/// captured a second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecursionGuard {
    #[default]
    Idle,
    Prerendering,
}

impl RecursionGuard {
    pub fn is_prerendering(&self) -> bool {
        matches!(self, RecursionGuard::Prerendering)
    }

    /// `Idle -> Prerendering`.
    pub fn enter(&mut self) {
        debug_assert_eq!(*self, RecursionGuard::Idle, "attributor re-entered while delegating");
        tracing::trace!("Offsets guard: Idle -> Prerendering");
        *self = RecursionGuard::Prerendering;
    }

    /// `Prerendering -> Idle`.
    pub fn exit(&mut self) {
        tracing::trace!("Offsets guard: Prerendering -> Idle");
        *self = RecursionGuard::Idle;
    }
}
