use crate::{process::table::IDLE_SLOT, symbols::NCPUS};

/// Which table slot every core is executing.
/// A core with nothing assigned points at the idle placeholder slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoreMap {
    current: [usize; NCPUS],
}

impl CoreMap {
    pub const fn new() -> Self {
        Self {
            current: [IDLE_SLOT; NCPUS],
        }
    }

    pub fn current(&self, core: usize) -> usize {
        assert!(core < NCPUS, "CoreMap::current: bad core id {}", core);
        self.current[core]
    }

    pub fn set_current(&mut self, core: usize, slot: usize) {
        assert!(core < NCPUS, "CoreMap::set_current: bad core id {}", core);
        self.current[core] = slot;
    }

    pub fn is_idle(&self, core: usize) -> bool {
        self.current(core) == IDLE_SLOT
    }

    /// (core, slot) pairs
    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.current.iter().copied().enumerate()
    }
}

impl Default for CoreMap {
    fn default() -> Self {
        Self::new()
    }
}
