use super::build_controller;
use clap::Parser;
use eyre::Result;
use tally_cli::opts::EthereumOpts;
use yansi::Paint;

/// CLI arguments for `tally read`.
#[derive(Clone, Debug, Parser)]
pub struct ReadArgs {
    #[command(flatten)]
    pub eth: EthereumOpts,
}

impl ReadArgs {
    pub async fn run(self) -> Result<()> {
        let (_, controller) = build_controller(&self.eth).await?;
        let value = controller.refresh().await?;
        println!("{value}");
        Ok(())
    }
}

/// CLI arguments for `tally connect`.
#[derive(Clone, Debug, Parser)]
pub struct ConnectArgs {
    #[command(flatten)]
    pub eth: EthereumOpts,
}

impl ConnectArgs {
    pub async fn run(self) -> Result<()> {
        let (chain, controller) = build_controller(&self.eth).await?;
        let address = controller.connect().await?;
        println!("connected as {} on {}", address.green(), chain.display_name());
        Ok(())
    }
}

/// CLI arguments for `tally increment`.
#[derive(Clone, Debug, Parser)]
pub struct IncrementArgs {
    #[command(flatten)]
    pub eth: EthereumOpts,
}

impl IncrementArgs {
    pub async fn run(self) -> Result<()> {
        let (_, controller) = build_controller(&self.eth).await?;
        controller.connect().await?;
        let value = controller.increment().await?;
        println!("{value}");
        Ok(())
    }
}

/// CLI arguments for `tally set`.
#[derive(Clone, Debug, Parser)]
pub struct SetArgs {
    /// The new value, in decimal or `0x` prefixed hex.
    #[arg(allow_hyphen_values = true)]
    pub value: String,

    #[command(flatten)]
    pub eth: EthereumOpts,
}

impl SetArgs {
    pub async fn run(self) -> Result<()> {
        let (_, controller) = build_controller(&self.eth).await?;
        // reject bad input before prompting the wallet
        tally::parse_requested_value(&self.value)?;
        controller.connect().await?;
        let value = controller.set_value(&self.value).await?;
        println!("{value}");
        Ok(())
    }
}
