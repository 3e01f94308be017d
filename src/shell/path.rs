use std::{env, ffi::OsStr, path::PathBuf};

/// Looks `name` up in `PATH`, first executable match wins.
/// Names containing a `/` are checked as given.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    find_in(name, env::var_os("PATH").as_deref())
}

pub fn find_in(name: &str, search_path: Option<&OsStr>) -> Option<PathBuf> {
    if name.is_empty() {
        return None;
    }
    // only consulted for relative names containing a `/`
    let cwd = env::current_dir().ok()?;
    which::which_in(name, search_path, cwd).ok()
}
