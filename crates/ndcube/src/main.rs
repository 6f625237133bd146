//! Command-line tool for building, scrambling, and replaying 3D and 4D twisty
//! puzzles.

mod cli;

fn main() -> eyre::Result<()> {
    use clap::Parser;

    color_eyre::install()?;
    env_logger::builder().init();

    let args = cli::Args::parse();
    cli::exec(args)
}
