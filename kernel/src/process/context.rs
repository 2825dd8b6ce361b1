use crate::{
    layout::{APPS_ARG, APPS_ENTRY},
    symbols::SAVED_REGISTER_NUM,
};

// register indices in the saved file (x-register numbering)
const A0: usize = 10;
const A1: usize = 11;

/// Suspended execution context of a process.
/// The trap glue saves x0..x31 below the kernel stack top and the kernel
/// copies them in and out verbatim; only `pc` and the argument registers
/// are ever interpreted here.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrapContext {
    pub regs: [usize; SAVED_REGISTER_NUM],
    /// where `mret` resumes execution
    pub pc: usize,
}

impl TrapContext {
    pub const fn empty() -> Self {
        Self {
            regs: [0; SAVED_REGISTER_NUM],
            pc: 0,
        }
    }

    /// skip the `ecall` so the process resumes after the system call
    pub fn incr_pc(&mut self, step: usize) {
        self.pc += step;
    }

    /// Entry convention of a freshly loaded application:
    /// argc at `APPS_ARG`, argv right after it, execution starts at `APPS_ENTRY`
    pub fn set_entry(&mut self) {
        self.regs[A0] = APPS_ARG;
        self.regs[A1] = APPS_ARG + core::mem::size_of::<usize>();
        self.pc = APPS_ENTRY;
    }
}

impl Default for TrapContext {
    fn default() -> Self {
        Self::empty()
    }
}
