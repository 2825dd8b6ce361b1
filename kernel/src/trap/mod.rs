// Every trap taken on any core ends up in `kernel_entry`, which holds the
// kernel lock for the whole of the handling. The assembly glue has already
// saved x0..x31 at `SAVED_REGISTER_ADDR` and restores them from there on `mret`.

use log::debug;
use primitive_enum::primitive_enum;

use crate::{
    earth::Earth,
    process::{context::TrapContext, manager::ProcessManager, process::ProcStatus},
};

pub mod syscall;
pub mod uaccess;

/// set in `mcause` for interrupts
pub const INTERRUPT_BIT: usize = 1 << (usize::BITS - 1);
const CAUSE_CODE_MASK: usize = 0x3FF;

primitive_enum! {
Interrupt usize;
    SupervisorSoft = 1,
    MachineSoft = 3,
    SupervisorTimer = 5,
    MachineTimer = 7,
    SupervisorExternal = 9,
    MachineExternal = 11,
}

primitive_enum! {
Exception usize;
    InstructionMisaligned = 0,
    InstructionFault = 1,
    IllegalInstruction = 2,
    Breakpoint = 3,
    LoadMisaligned = 4,
    LoadFault = 5,
    StoreMisaligned = 6,
    StoreFault = 7,
    UserEnvCall = 8,
    SupervisorEnvCall = 9,
    MachineEnvCall = 11,
    InstructionPageFault = 12,
    LoadPageFault = 13,
    StorePageFault = 15,
}

/// width of the `ecall` instruction
const ECALL_SIZE: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrapCause {
    Interrupt(usize),
    Exception(usize),
}

impl TrapCause {
    pub fn decode(mcause: usize) -> Self {
        if mcause & INTERRUPT_BIT != 0 {
            TrapCause::Interrupt(mcause & CAUSE_CODE_MASK)
        } else {
            TrapCause::Exception(mcause)
        }
    }
}

fn is_ecall(id: usize) -> bool {
    (Exception::UserEnvCall as usize..=Exception::MachineEnvCall as usize).contains(&id)
}

impl ProcessManager {
    /// Handle one trap taken on `core`.
    /// `frame` holds the interrupted context on entry and the context to
    /// resume on return, which may belong to a different process.
    pub fn handle_trap(
        &mut self,
        earth: &dyn Earth,
        core: usize,
        mcause: usize,
        frame: &mut TrapContext,
    ) {
        let curr = self.cpus.current(core);
        self.table[curr].context = *frame;

        match TrapCause::decode(mcause) {
            TrapCause::Interrupt(id) => self.intr_entry(earth, core, id),
            TrapCause::Exception(id) => self.excp_entry(earth, core, id),
        }

        *frame = self.table[self.cpus.current(core)].context;
    }

    fn excp_entry(&mut self, earth: &dyn Earth, core: usize, id: usize) {
        if !is_ecall(id) {
            panic!("ProcessManager::excp_entry: kernel got exception {}", id);
        }
        let idx = self.cpus.current(core);
        let pid = self.table[idx].pid;

        self.fetch_syscall(earth, idx);
        self.set_status(earth, pid, ProcStatus::PendingSyscall);
        self.table[idx].context.incr_pc(ECALL_SIZE);
        // the partner may already be waiting
        self.try_syscall(earth, idx);
        self.yield_cpu(earth, core);
    }

    fn intr_entry(&mut self, earth: &dyn Earth, core: usize, id: usize) {
        if !matches!(Interrupt::from(id), Some(Interrupt::MachineTimer)) {
            panic!("ProcessManager::intr_entry: kernel got non-timer interrupt {}", id);
        }

        let pcb = &mut self.table[self.cpus.current(core)];
        if pcb.status == ProcStatus::Running {
            let ran = earth
                .mtime_get()
                .saturating_sub(pcb.latest_running_start_time);
            pcb.stats.t_cpu += ran;
            pcb.stats.num_interrupts += 1;
            let demoted = pcb.mlfq.update(ran);
            if !pcb.is_privileged() {
                debug!(
                    "INTR: pid {} ran {}us, t_cpu={} level={} t_remaining={}{}",
                    pcb.pid,
                    ran,
                    pcb.stats.t_cpu,
                    pcb.mlfq.level(),
                    pcb.mlfq.t_remaining(),
                    if demoted { " (quantum used up)" } else { "" }
                );
            }
        }
        self.yield_cpu(earth, core);
    }
}

/// Trap entry called by the assembly glue with the kernel lock held.
#[cfg(not(test))]
#[no_mangle]
pub extern "C" fn kernel_entry() {
    use crate::{
        arch, earth,
        layout::SAVED_REGISTER_ADDR,
        process::manager::PROCESS_MANAGER,
        symbols::SAVED_REGISTER_NUM,
    };

    let core = arch::hart_id();
    // safety: the glue reserves this area below the kernel stack top for the saved registers
    let saved = unsafe { &mut *(SAVED_REGISTER_ADDR as *mut [usize; SAVED_REGISTER_NUM]) };
    let mut frame = TrapContext {
        regs: *saved,
        pc: arch::trap_pc(),
    };

    PROCESS_MANAGER
        .lock()
        .handle_trap(earth::earth(), core, arch::trap_cause(), &mut frame);

    arch::set_trap_pc(frame.pc);
    *saved = frame.regs;
}
