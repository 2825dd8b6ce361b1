use log::debug;

use super::{manager::ProcessManager, process::ProcStatus, table::ProcessTable};
use crate::{earth::Earth, symbols::MLFQ_NLEVELS};

impl ProcessManager {
    /// Pick the next process for `core` and switch to it.
    /// Runs at the end of every trap, with the kernel lock held.
    pub fn yield_cpu(&mut self, earth: &dyn Earth, core: usize) {
        let curr_idx = self.cpus.current(core);
        let curr = &self.table[curr_idx];
        if curr.status == ProcStatus::Running {
            let pid = curr.pid;
            self.set_status(earth, pid, ProcStatus::Runnable);
        }

        self.mlfq_reset_check(earth);
        self.advance_blocked(earth);

        let next_idx = match self.select_next(curr_idx) {
            Some(idx) => idx,
            None => panic!("ProcessManager::yield_cpu: no runnable process on core {}", core),
        };

        let (curr_pid, next) = (self.table[curr_idx].pid, &self.table[next_idx]);
        if !next.is_privileged() || !self.table[curr_idx].is_privileged() {
            debug!(
                "SCHED: core {} switching from pid {} to pid {} (level {})",
                core,
                curr_pid,
                next.pid,
                next.mlfq.level()
            );
        }
        self.switch_to(earth, core, next_idx);
    }

    /// Retry pending system calls and wake sleepers whose time has come
    fn advance_blocked(&mut self, earth: &dyn Earth) {
        for idx in ProcessTable::slot_indices() {
            match self.table[idx].status {
                ProcStatus::PendingSyscall => self.try_syscall(earth, idx),
                ProcStatus::Sleeping if earth.mtime_get() >= self.table[idx].wake_time => {
                    self.table[idx].status = ProcStatus::Runnable;
                }
                _ => {}
            }
        }
    }

    /// Round-robin from the slot after `curr_idx`. A dispatchable kernel
    /// server always wins; otherwise the first dispatchable process of the
    /// highest non-empty level does.
    pub(crate) fn select_next(&self, curr_idx: usize) -> Option<usize> {
        let dispatchable = |idx: &usize| self.table[*idx].status.is_dispatchable();

        let privileged = ProcessTable::round_robin_from(curr_idx)
            .filter(dispatchable)
            .find(|&idx| self.table[idx].is_privileged());
        if privileged.is_some() {
            return privileged;
        }

        (0..MLFQ_NLEVELS).find_map(|level| {
            ProcessTable::round_robin_from(curr_idx)
                .filter(dispatchable)
                .find(|&idx| self.table[idx].mlfq.level() == level)
        })
    }

    fn switch_to(&mut self, earth: &dyn Earth, core: usize, idx: usize) {
        self.cpus.set_current(core, idx);
        let pcb = &mut self.table[idx];
        let pid = pcb.pid;
        earth.mmu_switch(pid);
        earth.mmu_flush_cache();
        if pcb.status == ProcStatus::Ready {
            // first dispatch: start at the application entry with argc/argv
            pcb.context.set_entry();
        }
        self.set_status(earth, pid, ProcStatus::Running);
        earth.timer_reset(core);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        earth::mock::MockEarth,
        layout::APPS_ENTRY,
        process::{manager::tests::spawn_users, mlfq::quantum},
        symbols::{Pid, GPID_ALL, GPID_USER_START},
        trap::syscall::Syscall,
    };
    use std::vec::Vec;

    fn running(pm: &ProcessManager, core: usize) -> Pid {
        pm.current_pid(core).unwrap()
    }

    #[test]
    fn first_dispatch_seeds_entry() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 1);
        earth.advance(10);
        pm.yield_cpu(&earth, 0);

        assert_eq!(running(&pm, 0), users[0]);
        let pcb = pm.table.get_live(users[0]).unwrap();
        assert_eq!(pcb.status, ProcStatus::Running);
        assert_eq!(pcb.context.pc, APPS_ENTRY);
        assert_eq!(pcb.stats.t_started, 10);
        assert_eq!(*earth.switched.borrow(), [users[0]]);
        assert_eq!(*earth.timer_resets.borrow(), [0]);
        assert_eq!(earth.flushes.get(), 1);

        // a resumed process keeps its context
        pm.table.get_live_mut(users[0]).unwrap().context.pc = 0x1234;
        pm.yield_cpu(&earth, 0);
        assert_eq!(pm.table.get_live(users[0]).unwrap().context.pc, 0x1234);
    }

    #[test]
    fn equal_level_alternates() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 2);

        let picks: Vec<Pid> = (0..6)
            .map(|_| {
                pm.yield_cpu(&earth, 0);
                running(&pm, 0)
            })
            .collect();
        let (a, b) = (users[0], users[1]);
        assert_eq!(picks, [a, b, a, b, a, b]);
        // the one not picked stays eligible
        assert_eq!(pm.table.get_live(a).unwrap().status, ProcStatus::Runnable);
    }

    #[test]
    fn higher_level_goes_first() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 2);
        let (demoted, fresh) = (users[0], users[1]);
        pm.table.get_live_mut(demoted).unwrap().mlfq.update(quantum(0));

        for _ in 0..3 {
            pm.yield_cpu(&earth, 0);
            assert_eq!(running(&pm, 0), fresh);
        }
        // a lone lower-level process still runs
        pm.free(&earth, fresh);
        pm.yield_cpu(&earth, 0);
        assert_eq!(running(&pm, 0), demoted);
    }

    #[test]
    fn kernel_server_preempts_users() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 2);
        // a kernel server can only come from the low pids; fake one in a free slot
        let idx = pm.table.find_unused().unwrap();
        pm.table[idx] = crate::process::process::ProcessControlBlock::allocate(GPID_USER_START - 1, 0);
        pm.table[idx].status = ProcStatus::Runnable;
        pm.table[idx].mlfq.update(quantum(0));
        let server = pm.table[idx].pid;

        for _ in 0..3 {
            pm.yield_cpu(&earth, 0);
            assert_eq!(running(&pm, 0), server);
        }
        pm.free(&earth, server);
        pm.yield_cpu(&earth, 0);
        assert!(users.contains(&running(&pm, 0)));
    }

    #[test]
    #[should_panic(expected = "no runnable process")]
    fn nothing_to_run_is_fatal() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        pm.allocate(&earth); // still loading
        pm.yield_cpu(&earth, 0);
    }

    #[test]
    fn sleeper_wakes_on_time() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 2);
        let (sleeper, busy) = (users[0], users[1]);
        pm.sleep(&earth, sleeper, 1_000);

        pm.yield_cpu(&earth, 0);
        assert_eq!(running(&pm, 0), busy);
        earth.advance(999);
        pm.yield_cpu(&earth, 0);
        assert_eq!(running(&pm, 0), busy);

        earth.advance(1);
        pm.yield_cpu(&earth, 0);
        assert_eq!(running(&pm, 0), sleeper);
    }

    #[test]
    fn two_cores_never_share_a_process() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 3);
        for _ in 0..4 {
            pm.yield_cpu(&earth, 0);
            pm.yield_cpu(&earth, 1);
            let (p0, p1) = (running(&pm, 0), running(&pm, 1));
            assert_ne!(p0, p1);
            assert!(users.contains(&p0) && users.contains(&p1));
            let live_running = pm
                .table
                .live()
                .filter(|pcb| pcb.status == ProcStatus::Running)
                .count();
            assert_eq!(live_running, 2);
        }
    }

    #[test]
    fn blocked_receive_completes_on_next_pass() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 3);
        let (rx, tx, filler) = (users[0], users[1], users[2]);

        let rx_idx = pm.table.find_live(rx).unwrap();
        earth.put_syscall(rx, Syscall::recv(GPID_ALL));
        pm.fetch_syscall(&earth, rx_idx);
        pm.set_status(&earth, rx, ProcStatus::PendingSyscall);

        pm.yield_cpu(&earth, 0);
        assert_eq!(running(&pm, 0), tx);
        assert_eq!(pm.table[rx_idx].status, ProcStatus::PendingSyscall);

        // tx traps with a SEND to rx
        let tx_idx = pm.table.find_live(tx).unwrap();
        earth.put_syscall(tx, Syscall::send(rx, b"wake up"));
        pm.fetch_syscall(&earth, tx_idx);
        pm.set_status(&earth, tx, ProcStatus::PendingSyscall);

        pm.yield_cpu(&earth, 0);
        // delivered during this pass, released on the next one
        assert_eq!(running(&pm, 0), filler);
        assert_eq!(pm.table[rx_idx].status, ProcStatus::PendingSyscall);
        assert!(pm.table[rx_idx].syscall.is_done());

        pm.yield_cpu(&earth, 0);
        assert_eq!(running(&pm, 0), rx);
        assert_eq!(pm.table[tx_idx].status, ProcStatus::Runnable);
        assert!(pm.table[tx_idx].syscall.is_done());
        assert_eq!(&earth.user_syscall(rx).content[..7], b"wake up");
        assert_eq!(earth.user_syscall(rx).sender, tx);
    }
}
