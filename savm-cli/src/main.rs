fn main() {
    if let Err(err) = savm_cli::main_impl() {
        eprintln!("savm: error: {}", err);
        std::process::exit(1);
    }
}
