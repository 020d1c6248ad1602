use std::process;

fn main() {
    if let Err(err) = ferris_leech::run() {
        eprintln!("Error: {}", err);
        process::exit(1);
    }
}
