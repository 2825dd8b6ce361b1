//! SEND/RECV rendezvous.
//!
//! Message passing is synchronous and unbuffered. A sender stays in
//! PENDING_SYSCALL until the receiver is blocked in a matching RECV; the
//! payload is then copied straight into the receiver's record. Neither side
//! wakes the other: both are retried on every scheduling pass, so a message
//! is delivered at most one quantum after its partner shows up.

use log::debug;
use primitive_enum::primitive_enum;

use super::uaccess::UserPtr;
use crate::{
    earth::Earth,
    layout::SYSCALL_ARG,
    process::{manager::ProcessManager, process::ProcStatus},
    symbols::{Pid, GPID_ALL, SYSCALL_MSG_LEN},
};

primitive_enum! {
SyscallType u32;
    SysUnused = 0,
    SysRecv = 1,
    SysSend = 2,
}

primitive_enum! {
SyscallStatus u32;
    Pending = 0,
    Done = 1,
}

/// The system call record shared with user space at `SYSCALL_ARG`.
/// Fields stay raw integers so any bit pattern a process writes can be decoded.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Syscall {
    pub kind: u32,
    /// for RECV: accepted sender or `GPID_ALL`; filled with the actual sender on delivery
    pub sender: Pid,
    pub receiver: Pid,
    pub content: [u8; SYSCALL_MSG_LEN],
    pub status: u32,
}

impl Syscall {
    pub const fn empty() -> Self {
        Self {
            kind: SyscallType::SysUnused as u32,
            sender: 0,
            receiver: 0,
            content: [0; SYSCALL_MSG_LEN],
            status: SyscallStatus::Pending as u32,
        }
    }

    /// What a process fills in for SEND; `msg` is truncated to the payload size
    pub fn send(receiver: Pid, msg: &[u8]) -> Self {
        let mut syscall = Self {
            kind: SyscallType::SysSend as u32,
            receiver,
            ..Self::empty()
        };
        let len = msg.len().min(SYSCALL_MSG_LEN);
        syscall.content[..len].copy_from_slice(&msg[..len]);
        syscall
    }

    /// What a process fills in for RECV, `from` being a pid or `GPID_ALL`
    pub fn recv(from: Pid) -> Self {
        Self {
            kind: SyscallType::SysRecv as u32,
            sender: from,
            ..Self::empty()
        }
    }

    pub fn kind(&self) -> Option<SyscallType> {
        SyscallType::from(self.kind)
    }

    pub fn is_pending(&self) -> bool {
        matches!(SyscallStatus::from(self.status), Some(SyscallStatus::Pending))
    }

    pub fn is_done(&self) -> bool {
        matches!(SyscallStatus::from(self.status), Some(SyscallStatus::Done))
    }

    fn accepts(&self, sender: Pid) -> bool {
        self.sender == GPID_ALL || self.sender == sender
    }
}

impl ProcessManager {
    /// Copy the record a process left at `SYSCALL_ARG` into its slot and mark it pending
    pub fn fetch_syscall(&mut self, earth: &dyn Earth, idx: usize) {
        let pcb = &mut self.table[idx];
        pcb.syscall = UserPtr::<Syscall>::new(pcb.pid, SYSCALL_ARG).read(earth);
        pcb.syscall.status = SyscallStatus::Pending as u32;
    }

    /// Attempt the in-flight system call of the process in slot `idx`
    pub fn try_syscall(&mut self, earth: &dyn Earth, idx: usize) {
        let syscall = &self.table[idx].syscall;
        match syscall.kind() {
            Some(SyscallType::SysRecv) => self.try_recv(earth, idx),
            Some(SyscallType::SysSend) => self.try_send(idx),
            _ => panic!(
                "ProcessManager::try_syscall: unknown syscall type={}",
                syscall.kind
            ),
        }
    }

    /// Hand the payload over if the receiver is blocked in a RECV accepting us.
    /// Otherwise nothing happens and the send is retried on the next pass.
    pub fn try_send(&mut self, idx: usize) {
        let sender = &self.table[idx];
        let (pid, receiver) = (sender.pid, sender.syscall.receiver);
        let content = sender.syscall.content;

        let dst = match self.table.find_live(receiver) {
            Some(dst) => dst,
            None => panic!("ProcessManager::try_send: unknown receiver pid={}", receiver),
        };
        let dst = &mut self.table[dst].syscall;
        if !matches!(dst.kind(), Some(SyscallType::SysRecv)) || !dst.is_pending() {
            return;
        }
        if !dst.accepts(pid) {
            return;
        }

        dst.content = content;
        dst.sender = pid;
        dst.receiver = receiver;
        dst.status = SyscallStatus::Done as u32;
        debug!("IPC: pid {} -> pid {} delivered", pid, receiver);
    }

    /// Once a sender has filled our record, return it to user space and
    /// release both sides.
    pub fn try_recv(&mut self, earth: &dyn Earth, idx: usize) {
        let receiver = &self.table[idx];
        if !receiver.syscall.is_done() {
            return;
        }
        let (pid, syscall) = (receiver.pid, receiver.syscall);
        UserPtr::<Syscall>::new(pid, SYSCALL_ARG).write(earth, &syscall);

        // the sender may have been freed in the meantime
        if let Some(sender) = self.table.get_live_mut(syscall.sender) {
            if sender.status == ProcStatus::PendingSyscall {
                sender.syscall.status = SyscallStatus::Done as u32;
            }
        }
        self.set_status(earth, pid, ProcStatus::Runnable);
        self.set_status(earth, syscall.sender, ProcStatus::Runnable);
    }
}
