use bolt::ui::Printer;
use std::process;

fn main() {
    match bolt::cli::run() {
        Ok(code) => process::exit(code),
        Err(e) => {
            Printer::default().error(&e.to_string());
            process::exit(1);
        }
    }
}
