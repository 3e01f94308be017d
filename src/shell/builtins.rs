use std::io::Write;

use phf::*;

use super::ShellState;
use crate::shell::parser::shell_error::io_reason;

mod cd;
mod echo;
mod exit;
mod history;
mod pwd;
mod type_;

pub use exit::ExitRequest;

/// Everything a builtin gets to see.
pub struct Context<'a> {
    pub state: &'a ShellState,
    pub args: &'a [String],
    pub out: &'a mut dyn Write,
    pub err: &'a mut dyn Write,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Cd,
    Pwd,
    Echo,
    Type,
    History,
    Exit,
}

static BUILTINS: phf::Map<&'static str, Builtin> = phf_map! {
    "cd" => Builtin::Cd,
    "pwd" => Builtin::Pwd,
    "echo" => Builtin::Echo,
    "type" => Builtin::Type,
    "history" => Builtin::History,
    "exit" => Builtin::Exit,
};

pub fn get_builtin(command: &str) -> Option<Builtin> {
    BUILTINS.get(command).copied()
}

impl Builtin {
    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Cd => "cd",
            Builtin::Pwd => "pwd",
            Builtin::Echo => "echo",
            Builtin::Type => "type",
            Builtin::History => "history",
            Builtin::Exit => "exit",
        }
    }

    /// Builtins that change the shell itself and so never run in a child.
    pub fn in_process(&self) -> bool {
        matches!(self, Builtin::Cd | Builtin::Exit)
    }

    /// Runs a stream producing builtin and returns its status.
    /// A failed write is reported on `err` and gives status 1.
    pub fn run(self, ctx: &mut Context) -> i32 {
        let result = match self {
            Builtin::Cd => cd::cd(ctx),
            Builtin::Pwd => pwd::pwd(ctx),
            Builtin::Echo => echo::echo(ctx),
            Builtin::Type => type_::type_(ctx),
            Builtin::History => history::history(ctx),
            // in process only, dispatched through `Builtin::exit`
            Builtin::Exit => unreachable!("exit never runs as a stream builtin"),
        };

        match result {
            Ok(status) => status,
            Err(e) => {
                let _ = writeln!(ctx.err, "{}: write error: {}", self.name(), io_reason(&e));
                1
            }
        }
    }

    /// `exit` needs the shell to act on its answer, so it gets its own entry point.
    pub fn exit(ctx: &mut Context) -> ExitRequest {
        exit::exit(ctx)
    }
}

#[cfg(test)]
mod tests {
    use std::{env, io, path::PathBuf};

    use super::*;

    struct Output {
        status: i32,
        out: String,
        err: String,
    }

    fn run(state: &ShellState, builtin: Builtin, args: &[&str]) -> Output {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        let mut out = Vec::new();
        let mut err = Vec::new();
        let status = builtin.run(&mut Context {
            state,
            args: &args,
            out: &mut out,
            err: &mut err,
        });
        Output {
            status,
            out: String::from_utf8(out).unwrap(),
            err: String::from_utf8(err).unwrap(),
        }
    }

    #[test]
    fn registry_is_closed() {
        let mut names: Vec<_> = BUILTINS.keys().copied().collect();
        names.sort();
        assert_eq!(names, ["cd", "echo", "exit", "history", "pwd", "type"]);
        for name in names {
            assert_eq!(get_builtin(name).unwrap().name(), name);
        }
        assert_eq!(get_builtin("ls"), None);
        assert!(get_builtin("cd").unwrap().in_process());
        assert!(get_builtin("exit").unwrap().in_process());
        assert!(!get_builtin("pwd").unwrap().in_process());
    }

    #[test]
    fn echo_joins_with_single_spaces() {
        let state = ShellState::default();
        let output = run(&state, Builtin::Echo, &["hello   world", "again"]);
        assert_eq!(output.out, "hello   world again\n");
        assert_eq!(output.status, 0);
        assert_eq!(run(&state, Builtin::Echo, &[]).out, "\n");
    }

    #[test]
    fn type_reports_builtins_and_missing() {
        let state = ShellState::default();
        let output = run(&state, Builtin::Type, &["cd"]);
        assert_eq!(output.out, "cd is a shell builtin\n");
        assert_eq!(output.status, 0);

        let output = run(&state, Builtin::Type, &["nonexistent_xyz"]);
        assert_eq!(output.err, "nonexistent_xyz: not found\n");
        assert_eq!(output.status, 1);
    }

    #[test]
    fn type_reports_external_path() {
        let state = ShellState::default();
        let output = run(&state, Builtin::Type, &["sh"]);
        let path = output.out.trim().strip_prefix("sh is ").unwrap();
        assert!(PathBuf::from(path).ends_with("sh"));
    }

    #[test]
    fn history_lists_entries() {
        let mut state = ShellState::default();
        for line in ["ls", "echo hi", "history"] {
            state.history.push(line);
        }
        let output = run(&state, Builtin::History, &[]);
        assert_eq!(output.out, "    1  ls\n    2  echo hi\n    3  history\n");

        let output = run(&state, Builtin::History, &["2"]);
        assert_eq!(output.out, "    2  echo hi\n    3  history\n");

        let output = run(&state, Builtin::History, &["10"]);
        assert_eq!(output.out.lines().count(), 3);

        let output = run(&state, Builtin::History, &["x"]);
        assert_eq!(output.status, 1);
        assert_eq!(output.err, "history: x: numeric argument required\n");
    }

    #[test]
    fn exit_requests() {
        let state = ShellState::default();
        let exit = |args: &[&str]| {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            let mut sink = Vec::new();
            let mut err = Vec::new();
            Builtin::exit(&mut Context {
                state: &state,
                args: &args,
                out: &mut sink,
                err: &mut err,
            })
        };
        assert_eq!(exit(&[]), ExitRequest::Terminate(0));
        assert_eq!(exit(&["3"]), ExitRequest::Terminate(3));
        assert_eq!(exit(&["256"]), ExitRequest::Terminate(0));
        assert_eq!(exit(&["-1"]), ExitRequest::Terminate(255));
        assert_eq!(exit(&["abc"]), ExitRequest::Terminate(2));
        assert_eq!(exit(&["1", "2"]), ExitRequest::Refuse(1));
    }

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::from_raw_os_error(28))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn exit_request_ignores_failed_diagnostics() {
        let state = ShellState::default();
        let exit = |args: &[&str]| {
            let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
            Builtin::exit(&mut Context {
                state: &state,
                args: &args,
                out: &mut BrokenWriter,
                err: &mut BrokenWriter,
            })
        };
        assert_eq!(exit(&["1", "2"]), ExitRequest::Refuse(1));
        assert_eq!(exit(&["abc"]), ExitRequest::Terminate(2));
    }

    #[test]
    fn write_errors_give_status_one() {
        let state = ShellState::default();
        let args = vec![String::from("hi")];
        let mut err = Vec::new();
        let status = Builtin::Echo.run(&mut Context {
            state: &state,
            args: &args,
            out: &mut BrokenWriter,
            err: &mut err,
        });
        assert_eq!(status, 1);
        assert_eq!(
            String::from_utf8(err).unwrap(),
            "echo: write error: No space left on device\n"
        );
    }

    #[test]
    fn cd_errors() {
        let _guard = crate::test::CWD.lock().unwrap_or_else(|e| e.into_inner());
        let state = ShellState::default();
        let before = env::current_dir().unwrap();

        let output = run(&state, Builtin::Cd, &["/no/such/dir"]);
        assert_eq!(output.status, 1);
        assert_eq!(output.err, "cd: /no/such/dir: No such file or directory\n");

        let output = run(&state, Builtin::Cd, &["a", "b"]);
        assert_eq!(output.status, 1);
        assert_eq!(output.err, "cd: too many arguments\n");

        assert_eq!(env::current_dir().unwrap(), before);
    }
}
