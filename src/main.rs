use colored::*;
use std::process;

mod cli;

/// Exit status for errors that are not path lookups (bad input, I/O,
/// validation failures, usage).
const EXIT_ERROR: i32 = 127;

fn main() {
    // Die quietly when stdout is closed early (`yedit keys | head -1`)
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let status = match cli::run() {
        Ok(true) => 0,
        // Path error silenced by `--quiet`
        Ok(false) => 1,
        Err(e) => {
            eprintln!("{}: {}", "Error".bright_red(), e);
            EXIT_ERROR
        }
    };
    process::exit(status);
}
