use crate::{WalletCall, WalletError, WalletProvider, error::PrivateKeyError};
use alloy_network::EthereumWallet;
use alloy_primitives::{Address, B256, TxHash, hex::FromHex};
use alloy_provider::{Provider, ProviderBuilder};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use eyre::Result;
use tally_common::RpcProvider;

/// Signs transactions with an in-memory private key and submits them with
/// `eth_sendRawTransaction`.
///
/// Meant for development nodes such as anvil.
#[derive(Clone, Debug)]
pub struct LocalWallet {
    address: Address,
    provider: RpcProvider,
}

impl LocalWallet {
    /// Wraps `provider` with a signing layer for `signer`.
    ///
    /// Nonce, gas and chain id are filled from the node before signing.
    pub fn new(signer: PrivateKeySigner, provider: RpcProvider) -> Self {
        let address = Signer::address(&signer);
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_provider(provider)
            .erased();
        Self { address, provider }
    }

    /// Validates and sanitizes the user supplied private key.
    pub fn from_private_key(private_key: &str, provider: RpcProvider) -> Result<Self> {
        Ok(Self::new(create_private_key_signer(private_key)?, provider))
    }

    pub fn address(&self) -> Address {
        self.address
    }
}

#[async_trait]
impl WalletProvider for LocalWallet {
    async fn request_addresses(&self) -> Result<Vec<Address>, WalletError> {
        Ok(vec![self.address])
    }

    async fn sign_and_submit(&self, call: WalletCall) -> Result<TxHash, WalletError> {
        if call.from != self.address {
            return Err(WalletError::Rejected {
                operation: "Transaction",
                reason: format!("no key for {}", call.from),
            });
        }
        let pending = self
            .provider
            .send_transaction(call.into_request())
            .await
            .map_err(|err| WalletError::from_rpc("Transaction", err))?;
        let hash = *pending.tx_hash();
        debug!(%hash, from = %self.address, "submitted signed transaction");
        Ok(hash)
    }
}

fn ensure_pk_not_env(pk: &str) -> Result<()> {
    if !pk.starts_with("0x") && std::env::var(pk).is_ok() {
        return Err(PrivateKeyError::ExistsAsEnvVar(pk.to_string()).into());
    }
    Ok(())
}

/// Parses a hex private key, with or without the `0x` prefix.
pub fn create_private_key_signer(private_key_str: &str) -> Result<PrivateKeySigner> {
    let private_key_str = private_key_str.trim();
    let private_key = match B256::from_hex(private_key_str) {
        Ok(private_key) => private_key,
        Err(err) => {
            ensure_pk_not_env(private_key_str)?;
            return Err(PrivateKeyError::InvalidHex(err).into());
        }
    };
    match PrivateKeySigner::from_bytes(&private_key) {
        Ok(pk) => Ok(pk),
        Err(err) => {
            ensure_pk_not_env(private_key_str)?;
            eyre::bail!("Failed to create wallet from private key: {err}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    // anvil's first dev account
    const PK: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    #[test]
    fn parses_private_keys() {
        let signer = create_private_key_signer(PK).unwrap();
        assert_eq!(
            Signer::address(&signer),
            address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266")
        );

        let signer = create_private_key_signer(PK.trim_start_matches("0x")).unwrap();
        assert_eq!(Signer::address(&signer), address!("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266"));
    }

    #[test]
    fn rejects_bad_private_keys() {
        let err = create_private_key_signer("0xnothex").unwrap_err();
        assert!(err.to_string().contains("invalid hex"), "{err}");

        let err = create_private_key_signer(&format!("0x{}", "00".repeat(32))).unwrap_err();
        assert!(err.to_string().contains("Failed to create wallet"), "{err}");
    }

    #[test]
    fn detects_env_var_names() {
        let var = "TALLY_TEST_PRIVATE_KEY_VAR";
        // SAFETY: this test is the only user of the variable
        unsafe { std::env::set_var(var, PK) };
        let err = create_private_key_signer(var).unwrap_err();
        assert!(err.to_string().contains("anchor missing"), "{err}");
        unsafe { std::env::remove_var(var) };
    }

    #[tokio::test]
    async fn only_signs_for_its_own_address() {
        let provider = tally_common::try_get_http_provider("http://127.0.0.1:1").unwrap();
        let wallet = LocalWallet::from_private_key(PK, provider).unwrap();
        assert_eq!(wallet.request_addresses().await.unwrap(), vec![wallet.address()]);

        let call = WalletCall {
            from: Address::with_last_byte(1),
            to: Address::with_last_byte(2),
            input: Default::default(),
            chain_id: None,
        };
        let err = wallet.sign_and_submit(call).await.unwrap_err();
        assert!(matches!(err, WalletError::Rejected { .. }), "{err:?}");
    }
}
