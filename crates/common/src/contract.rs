//! Static binding of a deployed contract's address and callable functions.

use crate::{
    constants::COUNTER_ABI,
    errors::{ControllerError, DescriptorError},
};
use alloy_dyn_abi::{DynSolType, DynSolValue, Specifier};
use alloy_json_abi::{Function, JsonAbi, Param, StateMutability};
use alloy_primitives::{Address, Selector, keccak256};
use itertools::Itertools;
use std::{collections::BTreeMap, fmt, path::Path, str::FromStr};
use tally_config::Config;

/// Whether calling a function needs a signed transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// Only queries state. Executed with `eth_call`.
    ReadOnly,
    /// Modifies state. Requires a wallet signature and a transaction.
    StateChanging,
}

impl From<StateMutability> for Mutability {
    fn from(value: StateMutability) -> Self {
        match value {
            StateMutability::Pure | StateMutability::View => Self::ReadOnly,
            StateMutability::NonPayable | StateMutability::Payable => Self::StateChanging,
        }
    }
}

impl fmt::Display for Mutability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadOnly => f.write_str("read-only"),
            Self::StateChanging => f.write_str("state-changing"),
        }
    }
}

/// A named, typed function parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionInput {
    pub name: String,
    pub ty: DynSolType,
}

impl FunctionInput {
    pub fn new(name: impl Into<String>, ty: DynSolType) -> Self {
        Self { name: name.into(), ty }
    }
}

/// The callable schema of a single contract function.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FunctionSignature {
    pub name: String,
    pub inputs: Vec<FunctionInput>,
    pub outputs: Vec<DynSolType>,
    pub mutability: Mutability,
}

impl FunctionSignature {
    pub fn new(
        name: impl Into<String>,
        inputs: Vec<FunctionInput>,
        outputs: Vec<DynSolType>,
        mutability: Mutability,
    ) -> Self {
        Self { name: name.into(), inputs, outputs, mutability }
    }

    /// Converts a JSON ABI function item, resolving every parameter type.
    pub fn from_abi(function: &Function) -> Result<Self, DescriptorError> {
        let resolve = |param: &Param| -> Result<DynSolType, DescriptorError> {
            param.resolve().map_err(|err| DescriptorError::UnsupportedType {
                function: function.name.clone(),
                ty: param.ty.clone(),
                reason: err.to_string(),
            })
        };
        let inputs = function
            .inputs
            .iter()
            .map(|param| Ok(FunctionInput::new(param.name.clone(), resolve(param)?)))
            .collect::<Result<Vec<_>, DescriptorError>>()?;
        let outputs = function.outputs.iter().map(resolve).collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(function.name.clone(), inputs, outputs, function.state_mutability.into()))
    }

    /// The canonical signature, e.g. `setNumber(uint256)`.
    pub fn signature(&self) -> String {
        let inputs = self.inputs.iter().map(|input| input.ty.sol_type_name()).join(",");
        format!("{}({inputs})", self.name)
    }

    /// The 4-byte function selector.
    pub fn selector(&self) -> Selector {
        Selector::from_slice(&keccak256(self.signature())[..4])
    }

    /// ABI-encodes a call to this function.
    ///
    /// Arguments are checked positionally against the declared inputs before encoding.
    pub fn encode_call(&self, args: &[DynSolValue]) -> Result<Vec<u8>, ControllerError> {
        if args.len() != self.inputs.len() {
            return Err(ControllerError::InvalidInput(format!(
                "`{}` expects {} argument(s), got {}",
                self.name,
                self.inputs.len(),
                args.len()
            )));
        }
        for (position, (input, arg)) in self.inputs.iter().zip(args).enumerate() {
            if !input.ty.matches(arg) {
                let got = arg.sol_type_name().map(|ty| ty.into_owned());
                return Err(ControllerError::InvalidInput(format!(
                    "argument {position} of `{}` must be {}, got {}",
                    self.name,
                    input.ty,
                    got.as_deref().unwrap_or("an untyped value"),
                )));
            }
        }

        let mut data = self.selector().to_vec();
        data.extend(DynSolValue::Tuple(args.to_vec()).abi_encode_params());
        Ok(data)
    }

    /// Decodes return data into the declared outputs.
    pub fn decode_output(&self, data: &[u8]) -> Result<Vec<DynSolValue>, ControllerError> {
        if data.is_empty() && !self.outputs.is_empty() {
            return Err(ControllerError::DecodingError(format!(
                "`{}` returned no data; is the contract deployed at this address?",
                self.name
            )));
        }
        let decoded = DynSolType::Tuple(self.outputs.clone())
            .abi_decode_params(data)
            .map_err(|err| ControllerError::DecodingError(format!("`{}`: {err}", self.name)))?;
        match decoded {
            DynSolValue::Tuple(values) => Ok(values),
            value => Ok(vec![value]),
        }
    }
}

impl fmt::Display for FunctionSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())?;
        if !self.outputs.is_empty() {
            write!(f, " returns ({})", self.outputs.iter().format(","))?;
        }
        Ok(())
    }
}

/// A deployed contract: its address and the functions it can be called with.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContractDescriptor {
    address: Address,
    functions: BTreeMap<String, FunctionSignature>,
}

impl ContractDescriptor {
    /// Creates a descriptor, validating the address format and name uniqueness.
    pub fn new(
        address: &str,
        functions: impl IntoIterator<Item = FunctionSignature>,
    ) -> Result<Self, DescriptorError> {
        let address = parse_address(address)?;
        let mut map = BTreeMap::new();
        for function in functions {
            let name = function.name.clone();
            if map.insert(name.clone(), function).is_some() {
                return Err(DescriptorError::DuplicateFunction(name));
            }
        }
        Ok(Self { address, functions: map })
    }

    /// Creates a descriptor from a parsed JSON ABI.
    ///
    /// Overloaded functions are rejected since calls select functions by name.
    pub fn from_abi(address: &str, abi: &JsonAbi) -> Result<Self, DescriptorError> {
        let mut functions = Vec::new();
        for (name, overloads) in &abi.functions {
            if overloads.len() > 1 {
                return Err(DescriptorError::DuplicateFunction(name.clone()));
            }
            for function in overloads {
                functions.push(FunctionSignature::from_abi(function)?);
            }
        }
        Self::new(address, functions)
    }

    /// Creates a descriptor from JSON ABI text.
    pub fn from_abi_json(address: &str, json: &str) -> Result<Self, DescriptorError> {
        let abi: JsonAbi =
            serde_json::from_str(json).map_err(|err| DescriptorError::Abi(err.to_string()))?;
        Self::from_abi(address, &abi)
    }

    /// Reads a JSON ABI file and creates a descriptor from it.
    pub fn from_abi_file(address: &str, path: &Path) -> Result<Self, DescriptorError> {
        let json = std::fs::read_to_string(path)
            .map_err(|err| DescriptorError::Abi(format!("{}: {err}", path.display())))?;
        Self::from_abi_json(address, &json)
    }

    /// The bundled Counter contract deployed at `address`.
    pub fn counter(address: &str) -> Result<Self, DescriptorError> {
        Self::from_abi_json(address, COUNTER_ABI)
    }

    /// Builds the descriptor from the loaded configuration, falling back to the bundled ABI.
    pub fn from_config(config: &Config) -> Result<Self, DescriptorError> {
        match &config.abi_path {
            Some(path) => {
                debug!(path = %path.display(), "loading contract abi");
                Self::from_abi_file(&config.contract_address, path)
            }
            None => Self::counter(&config.contract_address),
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSignature> {
        self.functions.get(name)
    }

    pub fn functions(&self) -> impl Iterator<Item = &FunctionSignature> {
        self.functions.values()
    }

    /// Looks up `name` and checks that it is invoked through the right path.
    ///
    /// Fails with [`ControllerError::ConfigurationMismatch`], before any network call, if the
    /// function is unknown or declared with a different mutability.
    pub fn resolve(
        &self,
        name: &str,
        mutability: Mutability,
    ) -> Result<&FunctionSignature, ControllerError> {
        let function = self.function(name).ok_or_else(|| {
            ControllerError::mismatch(name, format!("is not declared by contract {}", self.address))
        })?;
        if function.mutability != mutability {
            return Err(ControllerError::mismatch(
                name,
                format!("is {} but was invoked as {mutability}", function.mutability),
            ));
        }
        Ok(function)
    }
}

/// Parses a `0x`-prefixed, 40 hex character account address.
pub fn parse_address(s: &str) -> Result<Address, DescriptorError> {
    let invalid = || DescriptorError::InvalidAddress(s.to_string());
    let hex = s.strip_prefix("0x").ok_or_else(invalid)?;
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    Address::from_str(s).map_err(|_| invalid())
}
