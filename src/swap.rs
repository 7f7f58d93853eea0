// ============================================================================
// swap.rs — accelwave
// Two-slot ping-pong registry: one slot is "current", the other "past".
// ============================================================================

/// Owns exactly two slots and a 1-bit index naming the current one.
/// `swap` relabels the roles; slot contents are never moved or dropped.
#[derive(Debug)]
pub struct SwapRegistry<T> {
    slots: [T; 2],
    current: usize,
}

impl<T> SwapRegistry<T> {
    /// `a` starts as current, `b` as past.
    pub fn new(a: T, b: T) -> Self {
        Self {
            slots: [a, b],
            current: 0,
        }
    }

    pub fn swap(&mut self) {
        self.current ^= 1;
    }

    /// Index (0 or 1) of the current slot.
    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn past_index(&self) -> usize {
        self.current ^ 1
    }

    pub fn current(&self) -> &T {
        &self.slots[self.current]
    }

    pub fn past(&self) -> &T {
        &self.slots[self.current ^ 1]
    }

    /// Both slots in allocation order, independent of roles.
    pub fn slots(&self) -> &[T; 2] {
        &self.slots
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_with_first_slot_current() {
        let reg = SwapRegistry::new("a", "b");
        assert_eq!(*reg.current(), "a");
        assert_eq!(*reg.past(), "b");
        assert_eq!(reg.current_index(), 0);
        assert_eq!(reg.past_index(), 1);
    }

    #[test]
    fn swap_exchanges_roles() {
        let mut reg = SwapRegistry::new("a", "b");
        reg.swap();
        assert_eq!(*reg.current(), "b");
        assert_eq!(*reg.past(), "a");
    }

    #[test]
    fn double_swap_is_identity() {
        let mut reg = SwapRegistry::new(vec![1, 2, 3], vec![4, 5, 6]);
        reg.swap();
        reg.swap();
        assert_eq!(reg.current_index(), 0);
        assert_eq!(reg.current(), &vec![1, 2, 3]);
        assert_eq!(reg.past(), &vec![4, 5, 6]);
    }

    #[test]
    fn slots_keep_allocation_order() {
        let mut reg = SwapRegistry::new(10, 20);
        reg.swap();
        assert_eq!(reg.slots(), &[10, 20]);
    }
}
