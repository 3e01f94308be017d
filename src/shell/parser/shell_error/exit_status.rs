use nix::sys::wait::WaitStatus;

pub trait ExitStatusExt {
    fn code(&self) -> i32;
}

impl ExitStatusExt for WaitStatus {
    /// Normal exit reports its code, death by signal reports 128 + signal.
    fn code(&self) -> i32 {
        match self {
            WaitStatus::Exited(_, code) => *code,
            WaitStatus::Signaled(_, signal, _) => 128 + *signal as i32,
            WaitStatus::Stopped(_, signal) => 128 + *signal as i32,
            _ => 1,
        }
    }
}
