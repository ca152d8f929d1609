//! Command-line entry point.

fn main() {
    env_logger::init();
    log::info!("Starting Vectra");

    match vectra_app::run_cli(std::env::args().skip(1)) {
        Ok(report) => println!("{report}"),
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}
