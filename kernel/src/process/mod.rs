use crate::{earth, symbols::Pid};

use self::manager::PROCESS_MANAGER;

pub mod context;
pub mod manager;
pub mod mlfq;
pub mod process;
pub mod scheduler;
pub mod table;

// Entry points for callers outside of a trap (boot path, loader).
// Each takes the kernel lock for the duration of the call.

pub fn alloc() -> Pid {
    PROCESS_MANAGER.lock().allocate(earth::earth())
}

pub fn free(pid: Pid) {
    PROCESS_MANAGER.lock().free(earth::earth(), pid);
}

pub fn set_ready(pid: Pid) {
    PROCESS_MANAGER.lock().set_ready(earth::earth(), pid);
}

pub fn sleep(pid: Pid, usec: u64) {
    PROCESS_MANAGER.lock().sleep(earth::earth(), pid, usec);
}

pub fn cores_info() {
    PROCESS_MANAGER.lock().cores_info();
}
