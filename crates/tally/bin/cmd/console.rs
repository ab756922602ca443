use super::{build_controller, render, trace_transitions};
use clap::Parser;
use eyre::Result;
use std::sync::Arc;
use tally::RpcController;
use tally_cli::opts::EthereumOpts;
use tokio::io::{AsyncBufReadExt, BufReader};
use yansi::Paint;

const HELP: &str = "\
commands:
  connect        connect the wallet
  refresh        re-read the counter
  increment      increment the counter
  set <VALUE>    set the counter
  state          print the current state
  help           print this message
  quit           leave the console";

/// CLI arguments for `tally console`.
#[derive(Clone, Debug, Parser)]
pub struct ConsoleArgs {
    #[command(flatten)]
    pub eth: EthereumOpts,
}

/// A console line, parsed.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Connect,
    Refresh,
    Increment,
    Set(&'a str),
    State,
    Help,
    Quit,
    Empty,
    Unknown(&'a str),
}

impl<'a> Line<'a> {
    fn parse(line: &'a str) -> Self {
        let mut words = line.split_whitespace();
        let Some(cmd) = words.next() else { return Self::Empty };
        match cmd {
            "connect" | "c" => Self::Connect,
            "refresh" | "r" | "read" => Self::Refresh,
            "increment" | "i" | "inc" => Self::Increment,
            "set" | "s" => Self::Set(line.trim_start()[cmd.len()..].trim()),
            "state" | "status" => Self::State,
            "help" | "h" | "?" => Self::Help,
            "quit" | "q" | "exit" => Self::Quit,
            _ => Self::Unknown(cmd),
        }
    }
}

impl ConsoleArgs {
    pub async fn run(self) -> Result<()> {
        let (chain, controller) = build_controller(&self.eth).await?;
        let controller = Arc::new(controller);
        trace_transitions(&controller);

        println!(
            "counter {} on {}, type `help` for commands",
            controller.contract().address(),
            chain.display_name()
        );
        // read the counter straight away, like opening the page would
        spawn_op(&controller, Line::Refresh);

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match Line::parse(&line) {
                Line::Quit => break,
                Line::Empty => {}
                Line::Help => println!("{HELP}"),
                Line::State => println!("{}", render(&controller.snapshot())),
                Line::Unknown(cmd) => {
                    println!("{} `{cmd}`, try `help`", "unknown command".red());
                }
                op => spawn_op(&controller, op),
            }
        }

        if controller.snapshot().busy {
            warn!("leaving with a transaction in flight, it may still confirm");
        }
        Ok(())
    }
}

/// Runs a controller operation in the background and reports its outcome.
///
/// Operations are not awaited, so a second write typed while one is in flight is rejected by the
/// controller rather than queued.
fn spawn_op(controller: &Arc<RpcController>, op: Line<'_>) {
    let controller = controller.clone();
    let op = match op {
        Line::Connect => Op::Connect,
        Line::Refresh => Op::Refresh,
        Line::Increment => Op::Increment,
        Line::Set(value) => Op::Set(value.to_string()),
        _ => return,
    };
    tokio::spawn(async move {
        let result = match &op {
            Op::Connect => controller.connect().await.map(|address| address.to_string()),
            Op::Refresh => controller.refresh().await.map(|value| value.to_string()),
            Op::Increment => controller.increment().await.map(|value| value.to_string()),
            Op::Set(value) => controller.set_value(value).await.map(|value| value.to_string()),
        };
        match result {
            Ok(out) => println!("{} {out}", op.label().green()),
            Err(err) => println!("{} {err}", op.label().red()),
        }
    });
}

#[derive(Debug)]
enum Op {
    Connect,
    Refresh,
    Increment,
    Set(String),
}

impl Op {
    fn label(&self) -> &'static str {
        match self {
            Self::Connect => "connect:",
            Self::Refresh => "counter:",
            Self::Increment => "increment:",
            Self::Set(_) => "set:",
        }
    }
}
