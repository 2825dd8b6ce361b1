use core::ops::{Index, IndexMut};

use super::process::ProcessControlBlock;
use crate::symbols::{Pid, MAX_NPROCESS};

/// Slot 0 is shared by every idle core and never holds a process
pub const IDLE_SLOT: usize = 0;

/// Fixed-capacity table of process records, indexed by slot.
/// Processes live in slots `1..=MAX_NPROCESS`.
pub struct ProcessTable {
    slots: [ProcessControlBlock; MAX_NPROCESS + 1],
}

impl ProcessTable {
    pub const fn new() -> Self {
        Self {
            slots: [ProcessControlBlock::unused(); MAX_NPROCESS + 1],
        }
    }

    /// indices of the slots that can hold a process
    pub fn slot_indices() -> impl Iterator<Item = usize> {
        1..=MAX_NPROCESS
    }

    pub fn find_unused(&self) -> Option<usize> {
        Self::slot_indices().find(|&idx| !self.slots[idx].is_live())
    }

    /// slot of the live process `pid`
    pub fn find_live(&self, pid: Pid) -> Option<usize> {
        Self::slot_indices().find(|&idx| {
            let pcb = &self.slots[idx];
            pcb.is_live() && pcb.pid == pid
        })
    }

    pub fn get_live(&self, pid: Pid) -> Option<&ProcessControlBlock> {
        self.find_live(pid).map(|idx| &self.slots[idx])
    }

    pub fn get_live_mut(&mut self, pid: Pid) -> Option<&mut ProcessControlBlock> {
        self.find_live(pid).map(move |idx| &mut self.slots[idx])
    }

    pub fn live(&self) -> impl Iterator<Item = &ProcessControlBlock> {
        self.slots[1..].iter().filter(|pcb| pcb.is_live())
    }

    pub fn live_mut(&mut self) -> impl Iterator<Item = &mut ProcessControlBlock> {
        self.slots[1..].iter_mut().filter(|pcb| pcb.is_live())
    }

    /// Every process slot once, starting right after `current` and
    /// ending with `current` itself. Starting from the idle slot yields 1, 2, ...
    pub fn round_robin_from(current: usize) -> impl Iterator<Item = usize> {
        (1..=MAX_NPROCESS).map(move |i| (current + i - 1) % MAX_NPROCESS + 1)
    }
}

impl Index<usize> for ProcessTable {
    type Output = ProcessControlBlock;

    fn index(&self, idx: usize) -> &Self::Output {
        &self.slots[idx]
    }
}

impl IndexMut<usize> for ProcessTable {
    fn index_mut(&mut self, idx: usize) -> &mut Self::Output {
        &mut self.slots[idx]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::process::ProcStatus;
    use std::vec::Vec;

    #[test]
    fn round_robin_covers_every_slot_once() {
        let order: Vec<usize> = ProcessTable::round_robin_from(3).collect();
        assert_eq!(order.len(), MAX_NPROCESS);
        assert_eq!(order[0], 4);
        assert_eq!(*order.last().unwrap(), 3);
        assert!(!order.contains(&IDLE_SLOT));

        let from_idle: Vec<usize> = ProcessTable::round_robin_from(IDLE_SLOT).collect();
        assert_eq!(from_idle[0], 1);
        assert_eq!(*from_idle.last().unwrap(), MAX_NPROCESS);

        let from_last: Vec<usize> = ProcessTable::round_robin_from(MAX_NPROCESS).collect();
        assert_eq!(from_last[0], 1);
    }

    #[test]
    fn lookups_ignore_unused_slots() {
        let mut table = ProcessTable::new();
        assert_eq!(table.find_unused(), Some(1));

        table[1] = ProcessControlBlock::allocate(9, 0);
        // a stale pid left behind in a freed slot
        table[2].pid = 9;
        assert_eq!(table.find_live(9), Some(1));
        assert_eq!(table.find_unused(), Some(2));

        table[1].status = ProcStatus::Unused;
        assert_eq!(table.find_live(9), None);
        assert_eq!(table.live().count(), 0);
    }
}
