use std::cell::Cell;

/// Outcome of asking a controller to start a new request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The request ran to completion and state was updated.
    Accepted,
    /// Another request on the same flow is still outstanding.
    Busy,
    /// Nothing to send: blank text or an empty image.
    EmptyInput,
}

impl Admission {
    pub fn is_accepted(self) -> bool {
        self == Self::Accepted
    }
}

/// Per-flow in-flight flag acting as a non-blocking try-lock.
///
/// Only meaningful on a single thread: the check and the set happen without
/// an intervening await, so no two logical requests can both observe `false`.
#[derive(Debug, Default)]
pub struct BusyFlag {
    busy: Cell<bool>,
}

impl BusyFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.get()
    }

    /// Marks the flow busy, or returns `None` if it already is.
    pub fn try_acquire(&self) -> Option<BusyGuard<'_>> {
        if self.busy.replace(true) {
            return None;
        }
        Some(BusyGuard { flag: self })
    }
}

/// Clears its [`BusyFlag`] when dropped, including when the owning future is
/// dropped before the request resolves.
#[derive(Debug)]
pub struct BusyGuard<'a> {
    flag: &'a BusyFlag,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.busy.set(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_until_guard_drops() {
        let flag = BusyFlag::new();
        let guard = flag.try_acquire().expect("first acquire");
        assert!(flag.is_busy());
        assert!(flag.try_acquire().is_none());
        assert!(flag.is_busy(), "rejected acquire must not clear the flag");

        drop(guard);
        assert!(!flag.is_busy());
        assert!(flag.try_acquire().is_some());
    }
}
