//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

fn main() {
    if let Err(err) = culvert_cli::run() {
        eprintln!("culvert: {err}");
        std::process::exit(1);
    }
}
