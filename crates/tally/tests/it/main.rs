mod connection;
mod controller;
mod rpc;
pub mod utils;
