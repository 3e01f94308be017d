use std::{
    env,
    io::{self, Write},
    path::PathBuf,
};

use directories::BaseDirs;
use tracing::debug;

use super::Context;
use crate::shell::parser::shell_error::io_reason;

/// Always runs inside the shell process so the new directory sticks.
pub fn cd(ctx: &mut Context) -> io::Result<i32> {
    let (shown, target) = match ctx.args {
        [] => ("~", home_dir()),
        [dir] => (dir.as_str(), expand_home(dir)),
        _ => {
            writeln!(ctx.err, "cd: too many arguments")?;
            return Ok(1);
        }
    };

    let Some(target) = target else {
        writeln!(ctx.err, "cd: HOME not set")?;
        return Ok(1);
    };

    match env::set_current_dir(&target) {
        Ok(()) => {
            debug!(dir = %target.display(), "changed directory");
            Ok(0)
        }
        Err(e) => {
            writeln!(ctx.err, "cd: {shown}: {}", io_reason(&e))?;
            Ok(1)
        }
    }
}

pub fn home_dir() -> Option<PathBuf> {
    match env::var_os("HOME") {
        Some(home) if !home.is_empty() => Some(PathBuf::from(home)),
        _ => BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf()),
    }
}

fn expand_home(dir: &str) -> Option<PathBuf> {
    if dir == "~" {
        home_dir()
    } else if let Some(rest) = dir.strip_prefix("~/") {
        home_dir().map(|home| home.join(rest))
    } else {
        Some(PathBuf::from(dir))
    }
}
