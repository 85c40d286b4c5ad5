use std::process::ExitCode;

fn main() -> ExitCode {
    instantmc_lib::run()
}
