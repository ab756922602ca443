mod contract;
mod rpc;

pub use contract::*;
pub use rpc::*;
