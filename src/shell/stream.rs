use std::{
    collections::VecDeque,
    fs::OpenOptions,
    io::{self, Write},
    os::{
        fd::{AsFd, AsRawFd, BorrowedFd, IntoRawFd, OwnedFd, RawFd},
        unix::fs::OpenOptionsExt,
    },
};

use nix::{
    fcntl::{fcntl, FcntlArg, FdFlag},
    libc, unistd,
};
use tracing::debug;

use crate::shell::parser::{
    ast::{Pipeline, Redirect, RedirectMode, Stage, Stream},
    shell_error::ShellErrorKind,
};

/// The descriptors the shell itself was started with.
#[derive(Debug, Clone, Copy)]
pub struct Inherited<'a> {
    pub stdin: BorrowedFd<'a>,
    pub stdout: BorrowedFd<'a>,
    pub stderr: BorrowedFd<'a>,
}

impl Inherited<'static> {
    pub fn standard() -> Self {
        // SAFETY: 0, 1 and 2 are never closed by the shell
        unsafe {
            Self {
                stdin: BorrowedFd::borrow_raw(libc::STDIN_FILENO),
                stdout: BorrowedFd::borrow_raw(libc::STDOUT_FILENO),
                stderr: BorrowedFd::borrow_raw(libc::STDERR_FILENO),
            }
        }
    }
}

/// Where one standard stream of a stage is connected.
/// Owned variants are closed when the endpoint is dropped.
#[derive(Debug)]
pub enum Endpoint<'a> {
    Inherited(BorrowedFd<'a>),
    Pipe(OwnedFd),
    File(OwnedFd),
}

impl Endpoint<'_> {
    pub fn writer(&self) -> FdWriter<'_> {
        FdWriter::new(self.as_fd())
    }

    /// Puts this endpoint on `target` and releases the original descriptor.
    fn install(self, target: RawFd) -> Result<(), ShellErrorKind> {
        match self {
            Endpoint::Inherited(fd) => {
                if fd.as_raw_fd() != target {
                    unistd::dup2(fd.as_raw_fd(), target).map_err(ShellErrorKind::Dup)?;
                }
            }
            Endpoint::Pipe(fd) | Endpoint::File(fd) => {
                if fd.as_raw_fd() == target {
                    // already in place, it only has to survive exec
                    fcntl(target, FcntlArg::F_SETFD(FdFlag::empty()))
                        .map_err(ShellErrorKind::Dup)?;
                    let _ = fd.into_raw_fd();
                } else {
                    unistd::dup2(fd.as_raw_fd(), target).map_err(ShellErrorKind::Dup)?;
                }
            }
        }
        Ok(())
    }
}

impl AsFd for Endpoint<'_> {
    fn as_fd(&self) -> BorrowedFd<'_> {
        match self {
            Endpoint::Inherited(fd) => *fd,
            Endpoint::Pipe(fd) | Endpoint::File(fd) => fd.as_fd(),
        }
    }
}

/// Unbuffered writer straight onto a descriptor.
pub struct FdWriter<'a>(BorrowedFd<'a>);

impl<'a> FdWriter<'a> {
    pub fn new(fd: BorrowedFd<'a>) -> Self {
        Self(fd)
    }
}

impl Write for FdWriter<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        unistd::write(self.0, buf).map_err(io::Error::from)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Resolved standard streams of one stage.
#[derive(Debug)]
pub struct StageIo<'a> {
    pub stdin: Endpoint<'a>,
    pub stdout: Endpoint<'a>,
    pub stderr: Endpoint<'a>,
}

impl<'a> StageIo<'a> {
    pub fn out(&self) -> FdWriter<'_> {
        self.stdout.writer()
    }

    pub fn err(&self) -> FdWriter<'_> {
        self.stderr.writer()
    }

    /// Installs the endpoints as descriptors 0, 1 and 2.
    /// Only ever called in a forked child.
    pub fn install(self) -> Result<(), ShellErrorKind> {
        self.stdin.install(Stream::Stdin.fd())?;
        self.stdout.install(Stream::Stdout.fd())?;
        self.stderr.install(Stream::Stderr.fd())
    }
}

/// Stage wiring that failed only abandons its own stage.
pub type Wiring<'a> = Result<StageIo<'a>, ShellErrorKind>;

/// The pipe ends of one stage, before its redirections are applied.
#[derive(Debug, Default)]
pub struct StagePipes {
    pub stdin: Option<OwnedFd>,
    pub stdout: Option<OwnedFd>,
}

impl StagePipes {
    /// Opens the redirect files of `stage` and settles its three streams.
    /// Redirections take precedence over pipes; a superseded pipe end is
    /// closed here so the stage on the other side sees end of file.
    ///
    /// Called right before the stage launches, so relative paths resolve
    /// against the directory left by any earlier `cd`.
    pub fn wire<'a>(self, stage: &Stage, inherited: Inherited<'a>) -> Wiring<'a> {
        Ok(StageIo {
            stdin: resolve(stage.redirect(Stream::Stdin), self.stdin, inherited.stdin)?,
            stdout: resolve(stage.redirect(Stream::Stdout), self.stdout, inherited.stdout)?,
            stderr: resolve(stage.redirect(Stream::Stderr), None, inherited.stderr)?,
        })
    }
}

/// Allocates the pipes connecting the stages of `pipeline` and hands each
/// stage its ends: stage i reads pipe i-1 and writes pipe i.
pub fn allocate(pipeline: &Pipeline) -> Result<Vec<StagePipes>, ShellErrorKind> {
    let mut pipes = (0..pipeline.pipe_count())
        .map(|_| pipe())
        .collect::<Result<VecDeque<_>, _>>()?;
    debug!(pipes = pipes.len(), "allocated pipes");

    let mut stages = Vec::with_capacity(pipeline.len());
    let mut read_end: Option<OwnedFd> = None;
    for _ in &pipeline.stages {
        let (next_read, write_end) = match pipes.pop_front() {
            Some((read, write)) => (Some(read), Some(write)),
            None => (None, None),
        };
        stages.push(StagePipes {
            stdin: read_end.take(),
            stdout: write_end,
        });
        read_end = next_read;
    }

    Ok(stages)
}

fn resolve<'a>(
    redirect: Option<&Redirect>,
    pipe: Option<OwnedFd>,
    inherited: BorrowedFd<'a>,
) -> Result<Endpoint<'a>, ShellErrorKind> {
    match (redirect, pipe) {
        (Some(redirect), _) => open(redirect).map(Endpoint::File),
        (None, Some(pipe)) => Ok(Endpoint::Pipe(pipe)),
        (None, None) => Ok(Endpoint::Inherited(inherited)),
    }
}

pub fn open(redirect: &Redirect) -> Result<OwnedFd, ShellErrorKind> {
    let mut options = OpenOptions::new();
    match redirect.mode {
        RedirectMode::Read => options.read(true),
        RedirectMode::Truncate => options.write(true).create(true).truncate(true),
        RedirectMode::Append => options.append(true).create(true),
    };
    options
        .mode(0o644)
        .open(&redirect.path)
        .map(OwnedFd::from)
        .map_err(|e| ShellErrorKind::Redirect(redirect.path.clone(), e))
}

/// A close-on-exec pipe, returned as (read, write).
pub fn pipe() -> Result<(OwnedFd, OwnedFd), ShellErrorKind> {
    let (read, write) = unistd::pipe().map_err(ShellErrorKind::Pipe)?;
    for fd in [&read, &write] {
        fcntl(fd.as_raw_fd(), FcntlArg::F_SETFD(FdFlag::FD_CLOEXEC)).map_err(ShellErrorKind::Pipe)?;
    }
    Ok((read, write))
}
