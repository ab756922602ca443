//! Common types and helpers for building and using the tally tools.

#![cfg_attr(not(test), warn(unused_crate_dependencies))]

#[macro_use]
extern crate tracing;

pub mod chain;
pub mod constants;
pub mod contract;
pub mod errors;
pub mod provider;

pub use chain::{ChainDescriptor, NativeCurrency};
pub use constants::*;
pub use contract::{ContractDescriptor, FunctionInput, FunctionSignature, Mutability};
pub use errors::{ControllerError, DescriptorError};
pub use provider::{ProviderBuilder, RpcProvider, try_get_http_provider};
