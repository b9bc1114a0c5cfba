//! Process liveness probing and signalling

use crate::errors::DaemonError;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// Answers whether a process id currently refers to a live process
pub trait ProcessProbe: Send + Sync {
    fn is_alive(&self, pid: u32) -> bool;
}

/// Probe backed by signal 0, which checks existence without delivering anything
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalProbe;

impl ProcessProbe for SignalProbe {
    fn is_alive(&self, pid: u32) -> bool {
        match to_pid(pid) {
            Some(pid) => kill(pid, None).is_ok(),
            None => false,
        }
    }
}

/// Pid 0 addresses the whole process group and ids past i32::MAX wrap negative,
/// so neither may ever reach `kill`.
fn to_pid(pid: u32) -> Option<Pid> {
    if pid == 0 {
        return None;
    }
    i32::try_from(pid).ok().map(Pid::from_raw)
}

/// Deliver `signal` to `pid`
pub fn send_signal(pid: u32, signal: Signal) -> Result<(), DaemonError> {
    let target = to_pid(pid).ok_or_else(|| DaemonError::InvalidPid(pid.to_string()))?;
    kill(target, signal).map_err(|source| DaemonError::Signal { pid, source })
}

/// Ask `pid` to shut down gracefully
pub fn terminate(pid: u32) -> Result<(), DaemonError> {
    send_signal(pid, Signal::SIGTERM)
}
