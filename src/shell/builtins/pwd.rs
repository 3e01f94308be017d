use std::io::{self, Write};

use super::Context;
use crate::shell::parser::shell_error::io_reason;

pub fn pwd(ctx: &mut Context) -> io::Result<i32> {
    match std::env::current_dir() {
        Ok(dir) => {
            writeln!(ctx.out, "{}", dir.display())?;
            Ok(0)
        }
        Err(e) => {
            writeln!(ctx.err, "pwd: {}", io_reason(&e))?;
            Ok(1)
        }
    }
}
