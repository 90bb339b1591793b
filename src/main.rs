use clap::Parser;
use hpgl_plotter::cli::Cli;

fn main() {
    env_logger::init();

    if let Err(e) = Cli::parse().run() {
        log::error!("{e}");
        eprintln!("hpgl-plotter: {e}");
        std::process::exit(1);
    }
}
