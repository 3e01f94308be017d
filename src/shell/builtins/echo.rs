use std::io::{self, Write};

use super::Context;

pub fn echo(ctx: &mut Context) -> io::Result<i32> {
    writeln!(ctx.out, "{}", ctx.args.join(" "))?;
    Ok(0)
}
