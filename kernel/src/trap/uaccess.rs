//! Copying values between the kernel and a process's address space.
//!
//! The kernel does not walk page tables itself: every access resolves the
//! user address through [`Earth::mmu_translate`] for the owning pid and then
//! copies the bytes at the returned physical address.

use core::marker::PhantomData;

use crate::{earth::Earth, symbols::Pid};

/// A pointer to a `T` living at `addr` in the address space of `pid`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserPtr<T: Copy> {
    pid: Pid,
    addr: usize,
    _ty: PhantomData<T>,
}

impl<T: Copy> UserPtr<T> {
    pub fn new(pid: Pid, addr: usize) -> Self {
        Self {
            pid,
            addr,
            _ty: PhantomData,
        }
    }

    pub fn read(&self, earth: &dyn Earth) -> T {
        let pa = earth.mmu_translate(self.pid, self.addr);
        // safety: the earth layer maps `addr` for `pid`; user memory carries no alignment promise
        unsafe { core::ptr::read_unaligned(pa as *const T) }
    }

    pub fn write(&self, earth: &dyn Earth, value: &T) {
        let pa = earth.mmu_translate(self.pid, self.addr);
        unsafe { core::ptr::write_unaligned(pa as *mut T, *value) }
    }
}
