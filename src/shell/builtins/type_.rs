use std::io::{self, Write};

use super::{get_builtin, Context};
use crate::shell::path::find_executable;

pub fn type_(ctx: &mut Context) -> io::Result<i32> {
    let mut status = 0;
    for name in ctx.args {
        if get_builtin(name).is_some() {
            writeln!(ctx.out, "{name} is a shell builtin")?;
        } else if let Some(path) = find_executable(name) {
            writeln!(ctx.out, "{name} is {}", path.display())?;
        } else {
            writeln!(ctx.err, "{name}: not found")?;
            status = 1;
        }
    }
    Ok(status)
}
