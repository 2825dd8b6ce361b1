use riscv::register::{mcause, mepc, mhartid};

/// The kernel runs in machine mode, so the hart id is read straight from `mhartid`
pub fn hart_id() -> usize {
    mhartid::read()
}

/// raw `mcause` of the trap being handled
pub fn trap_cause() -> usize {
    mcause::read().bits()
}

/// program counter of the trapped instruction
pub fn trap_pc() -> usize {
    mepc::read()
}

/// where `mret` resumes
pub fn set_trap_pc(pc: usize) {
    #[allow(unused_unsafe)]
    unsafe {
        mepc::write(pc)
    };
}

pub fn wait_forever() -> ! {
    loop {
        #[allow(unused_unsafe)]
        unsafe {
            riscv::asm::wfi()
        };
    }
}
