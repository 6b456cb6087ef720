use trainer_core::cli::run_cli;

fn main() {
    trainer_core::init();

    if let Err(err) = run_cli() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
