fn main() {
    if let Err(err) = classloom_cli::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
