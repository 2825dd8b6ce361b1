use core::fmt;

use super::{context::TrapContext, mlfq::MlfqState};
use crate::{
    symbols::{Pid, GPID_USER_START},
    trap::syscall::Syscall,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcStatus {
    Unused,
    Loading,
    Ready,
    Running,
    Runnable,
    PendingSyscall,
    Sleeping,
}

impl ProcStatus {
    /// may be picked by the scheduler
    pub fn is_dispatchable(self) -> bool {
        matches!(self, ProcStatus::Ready | ProcStatus::Runnable)
    }
}

/// Timestamps and counters kept over a process lifetime, in microseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcStats {
    pub t_created: u64,
    /// only meaningful once `has_started` is set
    pub t_started: u64,
    pub t_finished: u64,
    /// time actually spent running
    pub t_cpu: u64,
    pub num_interrupts: u64,
    pub has_started: bool,
}

impl ProcStats {
    pub fn new(now: u64) -> Self {
        Self {
            t_created: now,
            ..Self::default()
        }
    }

    pub fn turnaround(&self) -> u64 {
        self.t_finished.saturating_sub(self.t_created)
    }

    /// `None` if the process never got the CPU
    pub fn response(&self) -> Option<u64> {
        self.has_started
            .then(|| self.t_started.saturating_sub(self.t_created))
    }
}

/// One slot of the process table.
/// Every field other than `status` is garbage while `status` is `Unused`.
#[derive(Debug, Clone, Copy)]
pub struct ProcessControlBlock {
    pub pid: Pid,
    pub status: ProcStatus,
    pub syscall: Syscall,
    pub context: TrapContext,
    pub stats: ProcStats,
    pub mlfq: MlfqState,
    /// when the process was last dispatched
    pub latest_running_start_time: u64,
    /// a sleeping process becomes runnable again at this time
    pub wake_time: u64,
}

impl ProcessControlBlock {
    pub const fn unused() -> Self {
        Self {
            pid: 0,
            status: ProcStatus::Unused,
            syscall: Syscall::empty(),
            context: TrapContext::empty(),
            stats: ProcStats {
                t_created: 0,
                t_started: 0,
                t_finished: 0,
                t_cpu: 0,
                num_interrupts: 0,
                has_started: false,
            },
            mlfq: MlfqState::new(),
            latest_running_start_time: 0,
            wake_time: 0,
        }
    }

    /// Fresh record for a process that is being loaded
    pub fn allocate(pid: Pid, now: u64) -> Self {
        Self {
            pid,
            status: ProcStatus::Loading,
            stats: ProcStats::new(now),
            ..Self::unused()
        }
    }

    pub fn is_live(&self) -> bool {
        self.status != ProcStatus::Unused
    }

    /// kernel servers, scheduled ahead of every user process
    pub fn is_privileged(&self) -> bool {
        is_privileged(self.pid)
    }
}

pub fn is_privileged(pid: Pid) -> bool {
    pid < GPID_USER_START
}

/// The statistics line reported when a process is freed
pub struct StatsReport<'a> {
    pub pid: Pid,
    pub stats: &'a ProcStats,
}

impl fmt::Display for StatsReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        write!(
            f,
            "pid {} finished: created={} started={} finished={} | turnaround={} response=",
            self.pid,
            s.t_created,
            s.t_started,
            s.t_finished,
            s.turnaround()
        )?;
        match s.response() {
            Some(response) => write!(f, "{}", response)?,
            None => write!(f, "-")?,
        }
        write!(f, " cpu={} interrupts={}", s.t_cpu, s.num_interrupts)
    }
}
