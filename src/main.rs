//! autoplan CLI binary.
//!
//! This is the minimal entrypoint; all logic lives in the library. `main`
//! only maps the returned `ExitCode` to a process exit.

fn main() {
    if let Err(code) = autoplan::cli::run() {
        std::process::exit(code.as_i32());
    }
}
