/// Errors raised while building a chain or contract descriptor.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("invalid address `{0}`: expected `0x` followed by 40 hex characters")]
    InvalidAddress(String),
    #[error("function `{0}` is declared more than once")]
    DuplicateFunction(String),
    #[error("unsupported type `{ty}` in function `{function}`: {reason}")]
    UnsupportedType { function: String, ty: String, reason: String },
    #[error("chain {0} has no rpc endpoints")]
    NoEndpoints(u64),
    #[error("invalid rpc endpoint `{url}`: {reason}")]
    InvalidEndpoint { url: String, reason: String },
    #[error("failed to load abi: {0}")]
    Abi(String),
}
