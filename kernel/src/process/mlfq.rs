//! Multilevel feedback queue policy.
//!
//! A process starts at level 0 and drops one level each time it uses up the
//! quantum of its level. Lower levels get longer quanta. Two mechanisms move
//! processes back to the top: pending keyboard input boosts the shell, and
//! every `MLFQ_RESET_PERIOD` all user processes are reset.

use log::debug;

use super::manager::ProcessManager;
use crate::{
    earth::Earth,
    symbols::{GPID_SHELL, MLFQ_BASE_QUANTUM, MLFQ_NLEVELS, MLFQ_RESET_PERIOD},
};

/// time quantum of `level`, in microseconds
pub const fn quantum(level: usize) -> u64 {
    (level as u64 + 1) * MLFQ_BASE_QUANTUM
}

/// Level and remaining budget of one process.
/// `t_remaining` is reset to the quantum of the level whenever the level changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MlfqState {
    level: usize,
    t_remaining: u64,
}

impl MlfqState {
    pub const fn new() -> Self {
        Self {
            level: 0,
            t_remaining: quantum(0),
        }
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn t_remaining(&self) -> u64 {
        self.t_remaining
    }

    /// Charge `runtime` microseconds of CPU to the process.
    /// Returns true if it was demoted (or, at the bottom level, got a fresh quantum).
    pub fn update(&mut self, runtime: u64) -> bool {
        if runtime >= self.t_remaining {
            self.level = (self.level + 1).min(MLFQ_NLEVELS - 1);
            self.t_remaining = quantum(self.level);
            true
        } else {
            self.t_remaining -= runtime;
            false
        }
    }

    /// back to level 0 with a full quantum
    pub fn boost(&mut self) {
        self.level = 0;
        self.t_remaining = quantum(0);
    }
}

impl Default for MlfqState {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcessManager {
    /// Run on every scheduling decision.
    pub fn mlfq_reset_check(&mut self, earth: &dyn Earth) {
        let now = earth.mtime_get();

        if !earth.tty_input_empty() {
            if let Some(shell) = self.table.get_live_mut(GPID_SHELL) {
                shell.mlfq.boost();
                debug!("MLFQ: pending input, shell pid {} boosted", GPID_SHELL);
            }
        }

        if now.saturating_sub(self.last_reset) >= MLFQ_RESET_PERIOD {
            self.last_reset = now;
            for pcb in self.table.live_mut().filter(|pcb| !pcb.is_privileged()) {
                pcb.mlfq.boost();
                debug!("MLFQ: periodic reset, pid {} moved to level 0", pcb.pid);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        earth::mock::MockEarth,
        process::manager::tests::spawn_users,
    };

    #[test]
    fn quantum_grows_with_level() {
        assert_eq!(quantum(0), MLFQ_BASE_QUANTUM);
        assert!((1..MLFQ_NLEVELS).all(|l| quantum(l) > quantum(l - 1)));
    }

    #[test]
    fn partial_run_keeps_level() {
        let mut state = MlfqState::new();
        assert!(!state.update(30_000));
        assert_eq!(state.level(), 0);
        assert_eq!(state.t_remaining(), quantum(0) - 30_000);
        // exhausting what is left demotes
        assert!(state.update(quantum(0) - 30_000));
        assert_eq!(state.level(), 1);
        assert_eq!(state.t_remaining(), quantum(1));
    }

    #[test]
    fn demotion_saturates() {
        let mut state = MlfqState::new();
        for _ in 0..MLFQ_NLEVELS * 3 {
            let q = quantum(state.level());
            state.update(q);
            assert!(state.level() < MLFQ_NLEVELS);
            assert_eq!(state.t_remaining(), quantum(state.level()));
        }
        assert_eq!(state.level(), MLFQ_NLEVELS - 1);
    }

    #[test]
    fn periodic_reset_moves_users_to_top() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let users = spawn_users(&mut pm, &earth, 2);

        for &pid in &users {
            let pcb = pm.table.get_live_mut(pid).unwrap();
            pcb.mlfq.update(quantum(0));
            pcb.mlfq.update(quantum(1));
        }
        earth.advance(MLFQ_RESET_PERIOD - 1);
        pm.mlfq_reset_check(&earth);
        assert!(users.iter().all(|&pid| pm.table.get_live(pid).unwrap().mlfq.level() == 2));

        earth.advance(1);
        pm.mlfq_reset_check(&earth);
        for &pid in &users {
            let pcb = pm.table.get_live(pid).unwrap();
            assert_eq!(pcb.mlfq.level(), 0);
            assert_eq!(pcb.mlfq.t_remaining(), quantum(0));
        }
    }

    #[test]
    fn pending_input_boosts_shell_only() {
        let earth = MockEarth::new();
        let mut pm = ProcessManager::new();
        let pids: std::vec::Vec<_> = (0..GPID_SHELL + 1).map(|_| pm.allocate(&earth)).collect();
        let user = *pids.last().unwrap();
        pm.mlfq_reset_check(&earth);

        for &pid in &pids {
            pm.table.get_live_mut(pid).unwrap().mlfq.update(quantum(0));
        }
        earth.tty_pending.set(true);
        earth.advance(1_000);
        pm.mlfq_reset_check(&earth);

        assert_eq!(pm.table.get_live(GPID_SHELL).unwrap().mlfq.level(), 0);
        assert_eq!(pm.table.get_live(user).unwrap().mlfq.level(), 1);
    }
}
