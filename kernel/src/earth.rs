//! The hardware abstraction layer the process core runs on.
//!
//! Everything that touches registers, page tables or devices lives behind
//! [`Earth`]. The core only ever calls these services; it never performs
//! memory-mapped I/O itself.

use spin::Once;

use crate::symbols::Pid;

pub trait Earth {
    /// physical address backing `vaddr` in the address space of `pid`
    fn mmu_translate(&self, pid: Pid, vaddr: usize) -> usize;
    /// install the address space of `pid` on the calling core
    fn mmu_switch(&self, pid: Pid);
    fn mmu_flush_cache(&self);
    /// release every frame held for `pid`
    fn mmu_free(&self, pid: Pid);

    /// arm the next timer interrupt of `core`
    fn timer_reset(&self, core: usize);
    /// wall-clock time in microseconds, monotonic
    fn mtime_get(&self) -> u64;

    fn tty_input_empty(&self) -> bool;
    fn tty_write(&self, s: &str);
}

static EARTH: Once<&'static (dyn Earth + Sync)> = Once::new();

/// Called once by the boot path before the first trap is taken
pub fn install(earth: &'static (dyn Earth + Sync)) {
    EARTH.call_once(|| earth);
}

pub fn get() -> Option<&'static (dyn Earth + Sync)> {
    EARTH.get().copied()
}

pub fn earth() -> &'static (dyn Earth + Sync) {
    get().expect("earth::earth: hardware layer not installed")
}
