use std::{
    collections::VecDeque,
    ffi::CString,
    io::{self, Write},
    os::unix::ffi::OsStrExt,
};

use nix::{
    errno::Errno,
    sys::{
        signal::{signal, SigHandler, Signal},
        wait::waitpid,
    },
    unistd::{self, fork, ForkResult, Pid},
};
use tracing::{debug, warn};

use super::{
    builtins::{get_builtin, Builtin, Context, ExitRequest},
    parser::{
        ast::{Pipeline, Stage},
        shell_error::{exit_status::ExitStatusExt, ShellErrorKind},
    },
    path::find_executable,
    stream::{self, FdWriter, Inherited, StageIo, StagePipes},
    ShellState,
};

/// Result of running one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Status(i32),
    /// `exit` was run; the shell must terminate with this status.
    Exit(i32),
}

/// What a stage turns into once its name is looked up.
enum Program {
    Builtin(Builtin),
    External { path: CString, argv: Vec<CString> },
    NotFound,
}

enum Job {
    Running(Pid),
    Done(i32),
}

/// Runs every stage of `pipeline` and reports the status of the last one.
///
/// `cd` and `exit` run inside the shell process, everything else is forked.
/// Pipes are allocated up front but a stage's redirect files are opened only
/// when it launches. Children are launched left to right without blocking and
/// only waited on once the whole pipeline is running. `exit` returns at once:
/// remaining stages are never wired or started and running ones are not
/// waited on.
pub fn execute(pipeline: &Pipeline, state: &ShellState, inherited: Inherited) -> Outcome {
    if pipeline.is_empty() {
        return Outcome::Status(0);
    }

    let pipes = match stream::allocate(pipeline) {
        Ok(pipes) => pipes,
        Err(e) => {
            report(inherited, &e);
            return Outcome::Status(e.status());
        }
    };

    let mut pending: VecDeque<(&Stage, StagePipes)> = pipeline.stages.iter().zip(pipes).collect();
    let mut jobs = Vec::with_capacity(pipeline.len());

    while let Some((stage, pipes)) = pending.pop_front() {
        let io = match pipes.wire(stage, inherited) {
            Ok(io) => io,
            Err(e) => {
                report(inherited, &e);
                jobs.push(Job::Done(e.status()));
                continue;
            }
        };

        let job = match get_builtin(stage.name()) {
            Some(builtin) if builtin.in_process() => {
                let (mut out, mut err) = (io.out(), io.err());
                let mut ctx = Context {
                    state,
                    args: stage.params(),
                    out: &mut out,
                    err: &mut err,
                };
                if builtin != Builtin::Exit {
                    Job::Done(builtin.run(&mut ctx))
                } else {
                    match Builtin::exit(&mut ctx) {
                        ExitRequest::Terminate(status) => {
                            debug!(status, "exit requested");
                            return Outcome::Exit(status);
                        }
                        ExitRequest::Refuse(status) => Job::Done(status),
                    }
                }
            }
            _ => match resolve(stage).and_then(|program| spawn(stage, program, io, state, &mut pending)) {
                Ok(pid) => Job::Running(pid),
                Err(e) => {
                    report(inherited, &e);
                    Job::Done(e.status())
                }
            },
        };
        jobs.push(job);
    }

    Outcome::Status(wait_all(jobs, inherited))
}

fn resolve(stage: &Stage) -> Result<Program, ShellErrorKind> {
    if let Some(builtin) = get_builtin(stage.name()) {
        return Ok(Program::Builtin(builtin));
    }

    let Some(path) = find_executable(stage.name()) else {
        return Ok(Program::NotFound);
    };

    let path = CString::new(path.as_os_str().as_bytes())
        .map_err(|_| ShellErrorKind::NulByte(path.display().to_string()))?;
    let argv = stage
        .args
        .iter()
        .map(|arg| CString::new(arg.as_str()).map_err(|_| ShellErrorKind::NulByte(arg.clone())))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Program::External { path, argv })
}

/// Forks a child for `stage`. The parent gets the pid back and its copies of
/// the stage's descriptors are closed when `io` goes out of scope.
fn spawn(
    stage: &Stage,
    program: Program,
    io: StageIo,
    state: &ShellState,
    pending: &mut VecDeque<(&Stage, StagePipes)>,
) -> Result<Pid, ShellErrorKind> {
    // anything still buffered would otherwise be written twice
    let _ = io::stdout().flush();
    let _ = io::stderr().flush();

    // SAFETY: the child only rewires descriptors and then either execs or runs
    // a builtin and leaves through `_exit`
    match unsafe { fork() }.map_err(ShellErrorKind::Fork)? {
        ForkResult::Parent { child } => {
            debug!(pid = %child, command = stage.name(), "spawned");
            Ok(child)
        }
        ForkResult::Child => {
            // descriptors of stages this child does not own
            pending.clear();
            let status = run_child(stage, program, io, state);
            // SAFETY: `_exit` never returns and skips atexit handlers, as intended in a forked child
            unsafe { nix::libc::_exit(status) }
        }
    }
}

fn run_child(stage: &Stage, program: Program, io: StageIo, state: &ShellState) -> i32 {
    let std = Inherited::standard();
    let mut err = FdWriter::new(std.stderr);

    // SAFETY: restoring default dispositions in a single threaded child
    unsafe {
        let _ = signal(Signal::SIGPIPE, SigHandler::SigDfl);
        let _ = signal(Signal::SIGINT, SigHandler::SigDfl);
    }

    if let Err(e) = io.install() {
        let _ = writeln!(err, "{e}");
        return e.status();
    }

    match program {
        Program::Builtin(builtin) => builtin.run(&mut Context {
            state,
            args: stage.params(),
            out: &mut FdWriter::new(std.stdout),
            err: &mut err,
        }),
        Program::External { path, argv } => {
            let errno = match unistd::execv(&path, &argv) {
                Ok(never) => match never {},
                Err(errno) => errno,
            };
            let e = ShellErrorKind::Exec(stage.name().to_string(), errno);
            let _ = writeln!(err, "{e}");
            e.status()
        }
        Program::NotFound => {
            let e = ShellErrorKind::CommandNotFound(stage.name().to_string());
            let _ = writeln!(err, "{e}");
            e.status()
        }
    }
}

/// Reaps every child. The status of the last stage is returned.
fn wait_all(jobs: Vec<Job>, inherited: Inherited) -> i32 {
    let mut last = 0;
    for job in jobs {
        last = match job {
            Job::Done(status) => status,
            Job::Running(pid) => match wait(pid) {
                Ok(status) => status,
                Err(e) => {
                    warn!(%pid, error = %e, "failed to reap child");
                    report(inherited, &e);
                    e.status()
                }
            },
        };
    }
    last
}

fn wait(pid: Pid) -> Result<i32, ShellErrorKind> {
    loop {
        match waitpid(pid, None) {
            Ok(status) => {
                debug!(%pid, ?status, "reaped");
                return Ok(status.code());
            }
            Err(Errno::EINTR) => continue,
            Err(errno) => return Err(ShellErrorKind::Wait(errno)),
        }
    }
}

fn report(inherited: Inherited, error: &ShellErrorKind) {
    let _ = writeln!(FdWriter::new(inherited.stderr), "{error}");
}
