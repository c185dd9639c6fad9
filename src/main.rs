use std::process::ExitCode;

fn main() -> ExitCode {
    match skillmeta::run() {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::from(skillmeta::EXIT_OPERATIONAL as u8)
        }
    }
}
