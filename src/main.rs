use std::process;

fn main() {
    process::exit(echelon::cli::run());
}
