// Fixed addresses shared between the kernel, the trap-entry glue and user applications.
// Every process sees its own copy of the user region at the same virtual addresses;
// `Earth::mmu_translate` resolves them for a given pid.

use crate::symbols::SAVED_REGISTER_NUM;

/// top of the stack used by the trap glue; the saved registers sit right below it
pub const KERNEL_STACK_TOP: usize = 0x8020_0000;

/// register file saved by the trap glue: x0..x31, one word each
pub const SAVED_REGISTER_SIZE: usize = SAVED_REGISTER_NUM * core::mem::size_of::<usize>();
pub const SAVED_REGISTER_ADDR: usize = KERNEL_STACK_TOP - SAVED_REGISTER_SIZE;

// user region
pub const APPS_ENTRY: usize = 0x0800_5000;
/// argc lives here, argv right after it
pub const APPS_ARG: usize = 0x0800_0000;
/// a process places its `Syscall` record here before `ecall`
pub const SYSCALL_ARG: usize = 0x0800_0800;
