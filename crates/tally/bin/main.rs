#[macro_use]
extern crate tracing;

use clap::Parser;
use eyre::Result;
use tally_cli::{handler, utils};

mod args;
mod cmd;

use args::{Tally, TallySubcommand};

fn main() -> Result<()> {
    handler::install();
    utils::load_dotenv();
    utils::subscriber();
    utils::enable_paint();
    let args = Tally::parse();
    main_args(args)
}

#[tokio::main]
async fn main_args(args: Tally) -> Result<()> {
    debug!(cmd = args.cmd.name(), "running");
    match args.cmd {
        TallySubcommand::Read(cmd) => cmd.run().await,
        TallySubcommand::Connect(cmd) => cmd.run().await,
        TallySubcommand::Increment(cmd) => cmd.run().await,
        TallySubcommand::Set(cmd) => cmd.run().await,
        TallySubcommand::Console(cmd) => cmd.run().await,
    }
}
