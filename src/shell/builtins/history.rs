use std::io::{self, Write};

use super::Context;

pub fn history(ctx: &mut Context) -> io::Result<i32> {
    let limit = match ctx.args {
        [] => None,
        [count] => match count.parse::<usize>() {
            Ok(count) => Some(count),
            Err(_) => {
                writeln!(ctx.err, "history: {count}: numeric argument required")?;
                return Ok(1);
            }
        },
        _ => {
            writeln!(ctx.err, "history: too many arguments")?;
            return Ok(1);
        }
    };

    let history = &ctx.state.history;
    let skip = match limit {
        Some(count) => history.len().saturating_sub(count),
        None => 0,
    };
    for (index, line) in history.iter().skip(skip) {
        writeln!(ctx.out, "{index:>5}  {line}")?;
    }
    Ok(0)
}
