//! The `lumen` command-line compositor.

use clap::Parser;
use lumen_config::CliArgs;

fn main() {
    let args = CliArgs::parse();
    if let Err(e) = lumen_app::run(args) {
        eprintln!("lumen: {e:#}");
        std::process::exit(1);
    }
}
