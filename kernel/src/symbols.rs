/// Maximum supported CPU on machine
/// Note that it is bounded by the boot stacks laid out by the earth layer
pub const NCPUS: usize = 4;

/// Number of process slots, not counting the idle placeholder at slot 0
pub const MAX_NPROCESS: usize = 16;

/// Number of MLFQ priority levels, level 0 being the highest
pub const MLFQ_NLEVELS: usize = 5;

/// Time quantum of level 0 in microseconds; level `l` gets `(l + 1)` times this
pub const MLFQ_BASE_QUANTUM: u64 = 100_000; // 100ms

/// Every user process goes back to level 0 once per period (microseconds)
pub const MLFQ_RESET_PERIOD: u64 = 10_000_000; // 10s

/// Process identifier. Negative values are reserved for wildcards.
pub type Pid = i32;

/// Wildcard pid: "any sender" for RECV, "every user process" for free
pub const GPID_ALL: Pid = -1;
pub const GPID_PROCESS: Pid = 1;
pub const GPID_FILE: Pid = 2;
pub const GPID_DIR: Pid = 3;
/// The interactive process boosted whenever keyboard input is pending
pub const GPID_SHELL: Pid = 4;
/// Pids below this one belong to kernel servers and are always scheduled first
pub const GPID_USER_START: Pid = 5;

/// Size of the message payload carried by SEND/RECV
pub const SYSCALL_MSG_LEN: usize = 256;

/// Number of general purpose registers saved by the trap glue
pub const SAVED_REGISTER_NUM: usize = 32;
