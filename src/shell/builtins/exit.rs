use std::io::Write;

use super::Context;

/// What `exit` asks of the shell.
#[derive(Debug, PartialEq, Eq)]
pub enum ExitRequest {
    Terminate(i32),
    /// The shell keeps running and the stage reports this status.
    Refuse(i32),
}

/// The request does not depend on whether the diagnostic could be written.
pub fn exit(ctx: &mut Context) -> ExitRequest {
    match ctx.args {
        [] => ExitRequest::Terminate(0),
        [status] => match status.trim().parse::<i64>() {
            Ok(status) => ExitRequest::Terminate(status.rem_euclid(256) as i32),
            Err(_) => {
                let _ = writeln!(ctx.err, "exit: {status}: numeric argument required");
                ExitRequest::Terminate(2)
            }
        },
        _ => {
            let _ = writeln!(ctx.err, "exit: too many arguments");
            ExitRequest::Refuse(1)
        }
    }
}
