#[cfg(not(unix))]
compile_error!("krill only runs on unix-like systems");

mod shell;

use shell::Shell;
use tracing_subscriber::EnvFilter;

pub type P<T> = Box<T>;

fn main() {
    init_logging();

    // the shell survives ^C, children get the default disposition back
    if let Err(err) = ctrlc::set_handler(|| {}) {
        tracing::warn!(%err, "could not install the interrupt handler");
    }

    let status = Shell::new().run();
    std::process::exit(status);
}

/// Logging is off unless `KRILL_LOG` holds a filter such as `debug`.
fn init_logging() {
    let filter = EnvFilter::try_from_env("KRILL_LOG").unwrap_or_else(|_| EnvFilter::new("off"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
