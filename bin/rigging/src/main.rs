fn main() {
    if let Err(err) = rigging::cli::run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}
