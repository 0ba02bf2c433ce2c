fn main() {
    if let Err(e) = medboard_lib::run() {
        eprintln!("medboard: {e}");
        std::process::exit(1);
    }
}
