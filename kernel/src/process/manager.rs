use lazy_static::lazy_static;
use log::{info, warn};
use spin::Mutex;

use super::{
    process::{ProcStatus, ProcessControlBlock, StatsReport},
    table::{ProcessTable, IDLE_SLOT},
};
use crate::{
    cpu::CoreMap,
    earth::Earth,
    symbols::{Pid, GPID_ALL, MAX_NPROCESS, NCPUS},
};

lazy_static! {
    /// All kernel state. Holding this lock is holding the big kernel lock:
    /// the trap entry takes it before dispatching and releases it on return.
    pub static ref PROCESS_MANAGER: Mutex<ProcessManager> = Mutex::new(ProcessManager::new());
}

pub struct ProcessManager {
    pub(crate) table: ProcessTable,
    pub(crate) cpus: CoreMap,
    /// last pid handed out; pids are never reused
    next_pid: Pid,
    /// wall-clock time of the last periodic MLFQ reset
    pub(crate) last_reset: u64,
}

impl ProcessManager {
    pub const fn new() -> Self {
        Self {
            table: ProcessTable::new(),
            cpus: CoreMap::new(),
            next_pid: 0,
            last_reset: 0,
        }
    }

    /// Take the first free slot for a new process in LOADING state.
    /// A full table is fatal.
    pub fn allocate(&mut self, earth: &dyn Earth) -> Pid {
        let idx = match self.table.find_unused() {
            Some(idx) => idx,
            None => panic!(
                "ProcessManager::allocate: reach the limit of {} processes",
                MAX_NPROCESS
            ),
        };
        self.next_pid += 1;
        let pid = self.next_pid;
        // the slot is written in one go, never observed half-initialised
        self.table[idx] = ProcessControlBlock::allocate(pid, earth.mtime_get());
        info!("ProcessManager::allocate: pid {} in slot {}", pid, idx);
        pid
    }

    /// Tear down `pid`, or every user process if `pid` is `GPID_ALL`.
    /// Safe while the process is blocked or sleeping: an unused slot matches nothing.
    pub fn free(&mut self, earth: &dyn Earth, pid: Pid) {
        if pid == GPID_ALL {
            return self.free_all(earth);
        }
        match self.table.find_live(pid) {
            Some(idx) => self.release(earth, idx),
            None => warn!("ProcessManager::free: no live process with pid {}", pid),
        }
    }

    /// Whole-system teardown of user processes; kernel servers stay
    pub fn free_all(&mut self, earth: &dyn Earth) {
        for idx in ProcessTable::slot_indices() {
            let pcb = &self.table[idx];
            if pcb.is_live() && !pcb.is_privileged() {
                self.release(earth, idx);
            }
        }
    }

    fn release(&mut self, earth: &dyn Earth, idx: usize) {
        let pcb = &mut self.table[idx];
        pcb.stats.t_finished = earth.mtime_get();
        info!(
            "{}",
            StatsReport {
                pid: pcb.pid,
                stats: &pcb.stats
            }
        );
        earth.mmu_free(pcb.pid);
        pcb.status = ProcStatus::Unused;

        // no core keeps pointing at a slot that can be reused
        for core in 0..NCPUS {
            if self.cpus.current(core) == idx {
                self.cpus.set_current(core, IDLE_SLOT);
            }
        }
    }

    /// Assign `status` to the live process `pid`.
    /// Entering RUNNING stamps the dispatch time, and the start time the first time round.
    pub fn set_status(&mut self, earth: &dyn Earth, pid: Pid, status: ProcStatus) {
        let pcb = match self.table.get_live_mut(pid) {
            Some(pcb) => pcb,
            None => {
                warn!(
                    "ProcessManager::set_status: no live process with pid {} (to {:?})",
                    pid, status
                );
                return;
            }
        };
        let previous = pcb.status;
        pcb.status = status;

        if status == ProcStatus::Running && previous != ProcStatus::Running {
            let now = earth.mtime_get();
            if !pcb.stats.has_started {
                pcb.stats.has_started = true;
                pcb.stats.t_started = now;
            }
            pcb.latest_running_start_time = now;
        }
    }

    /// called by the loader once the image of `pid` is in place
    pub fn set_ready(&mut self, earth: &dyn Earth, pid: Pid) {
        self.set_status(earth, pid, ProcStatus::Ready);
    }

    /// Park `pid` until `usec` microseconds from now
    pub fn sleep(&mut self, earth: &dyn Earth, pid: Pid, usec: u64) {
        let now = earth.mtime_get();
        match self.table.get_live_mut(pid) {
            Some(pcb) => {
                pcb.wake_time = now + usec;
                pcb.status = ProcStatus::Sleeping;
            }
            None => warn!("ProcessManager::sleep: no live process with pid {}", pid),
        }
    }

    /// pid running on `core`, `None` if the core is idle
    pub fn current_pid(&self, core: usize) -> Option<Pid> {
        if self.cpus.is_idle(core) {
            return None;
        }
        let pcb = &self.table[self.cpus.current(core)];
        pcb.is_live().then_some(pcb.pid)
    }

    pub fn cores_info(&self) {
        for (core, _) in self.cpus.iter() {
            match self.current_pid(core) {
                Some(pid) => info!("core {}: running pid {}", core, pid),
                None => info!("core {}: idle", core),
            }
        }
    }
}

impl Default for ProcessManager {
    fn default() -> Self {
        Self::new()
    }
}
