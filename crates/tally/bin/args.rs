use crate::cmd::{
    console::ConsoleArgs,
    counter::{ConnectArgs, IncrementArgs, ReadArgs, SetArgs},
};
use clap::{Parser, Subcommand};

/// Read and update an on-chain counter through your wallet.
#[derive(Parser)]
#[command(name = "tally", version, next_display_order = None)]
pub struct Tally {
    #[command(subcommand)]
    pub cmd: TallySubcommand,
}

#[derive(Subcommand)]
pub enum TallySubcommand {
    /// Reads the current value of the counter.
    #[command(visible_alias = "r")]
    Read(ReadArgs),

    /// Connects the wallet and prints the account it exposes.
    #[command(visible_alias = "c")]
    Connect(ConnectArgs),

    /// Increments the counter, then prints the value read back from the chain.
    #[command(visible_alias = "i")]
    Increment(IncrementArgs),

    /// Sets the counter to VALUE, then prints the value read back from the chain.
    #[command(visible_alias = "s")]
    Set(SetArgs),

    /// Starts an interactive session.
    Console(ConsoleArgs),
}

impl TallySubcommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Read(_) => "read",
            Self::Connect(_) => "connect",
            Self::Increment(_) => "increment",
            Self::Set(_) => "set",
            Self::Console(_) => "console",
        }
    }
}
