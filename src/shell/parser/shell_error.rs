use std::{fmt, io, path::PathBuf};

use nix::errno::Errno;
use thiserror::Error;

pub mod exit_status;

/// Errors raised while wiring or running a stage. None of them end the shell.
#[derive(Debug, Error)]
pub enum ShellErrorKind {
    CommandNotFound(String),
    Redirect(PathBuf, io::Error),
    Pipe(Errno),
    Fork(Errno),
    Dup(Errno),
    Exec(String, Errno),
    Wait(Errno),
    NulByte(String),
}

impl ShellErrorKind {
    /// Status a stage reports when it is abandoned because of this error.
    pub fn status(&self) -> i32 {
        match self {
            ShellErrorKind::CommandNotFound(_) => 127,
            ShellErrorKind::Exec(..) => 126,
            _ => 1,
        }
    }
}

impl fmt::Display for ShellErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use ShellErrorKind::*;
        match self {
            CommandNotFound(name) => write!(f, "{name}: command not found"),
            Redirect(path, error) => write!(f, "{}: {}", path.display(), io_reason(error)),
            Pipe(errno) => write!(f, "pipe: {}", errno.desc()),
            Fork(errno) => write!(f, "fork: {}", errno.desc()),
            Dup(errno) => write!(f, "dup2: {}", errno.desc()),
            Exec(name, errno) => write!(f, "{name}: {}", errno.desc()),
            Wait(errno) => write!(f, "wait: {}", errno.desc()),
            NulByte(arg) => write!(f, "{arg}: argument contains a nul byte"),
        }
    }
}

/// The OS description of an io error without the trailing `(os error N)`.
pub fn io_reason(error: &io::Error) -> String {
    match error.raw_os_error() {
        Some(code) => Errno::from_raw(code).desc().to_string(),
        None => error.to_string(),
    }
}
