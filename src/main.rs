use detach::cli::{output, Cli};
use detach::error::DetachError;
use tracing_subscriber::EnvFilter;

/// Exit status when the command cannot be executed, as a shell reports it
const EXIT_EXEC_FAILED: i32 = 127;

fn main() {
    // No threads or runtimes before the fork: the subscriber writes synchronously
    let filter = EnvFilter::try_from_env("DETACH_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = Cli::run() {
        output::print_error(&e.to_string());
        let code = match e {
            DetachError::ExecFailed(_) => EXIT_EXEC_FAILED,
            _ => 1,
        };
        std::process::exit(code);
    }
}
