//! Wallet trait and in-memory implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::WalletError;

/// Browser wallet operations used by token checkouts.
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Connects the wallet and returns the account address.
    async fn connect_wallet(&self) -> Result<String, WalletError>;

    /// Switches the wallet to `chain_id`.
    async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError>;

    /// Signs `message` with the connected account.
    async fn sign_message(&self, message: &str) -> Result<String, WalletError>;

    /// Stakes `amount` tokens and returns the transaction hash.
    async fn stake_tokens(&self, amount: u64) -> Result<String, WalletError>;

    /// Returns the connected account, if any.
    async fn address(&self) -> Option<String>;

    /// Returns the chain the wallet is on.
    async fn chain_id(&self) -> u64;
}

#[derive(Debug, Default)]
struct InMemoryWalletState {
    account: String,
    connected: bool,
    chain_id: u64,
    staking_chain_id: u64,
    balance: u64,
    staked: u64,
    next_tx: u64,
    reject_requests: bool,
}

impl InMemoryWalletState {
    fn connected_account(&self) -> Result<&str, WalletError> {
        if self.connected {
            Ok(&self.account)
        } else {
            Err(WalletError::NotConnected)
        }
    }
}

/// In-memory wallet for testing and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWallet {
    state: Arc<RwLock<InMemoryWalletState>>,
}

impl InMemoryWallet {
    /// Creates a disconnected wallet holding `balance` tokens, already on the
    /// chain its staking contract lives on.
    pub fn new(account: impl Into<String>, staking_chain_id: u64, balance: u64) -> Self {
        Self::on_chain(account, staking_chain_id, staking_chain_id, balance)
    }

    /// Creates a disconnected wallet on `chain_id` whose staking contract lives
    /// on `staking_chain_id`.
    pub fn on_chain(
        account: impl Into<String>,
        chain_id: u64,
        staking_chain_id: u64,
        balance: u64,
    ) -> Self {
        let state = InMemoryWalletState {
            account: account.into(),
            chain_id,
            staking_chain_id,
            balance,
            ..InMemoryWalletState::default()
        };
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Makes the wallet decline every subsequent request.
    pub async fn set_reject_requests(&self, reject: bool) {
        self.state.write().await.reject_requests = reject;
    }

    pub async fn balance(&self) -> u64 {
        self.state.read().await.balance
    }

    pub async fn staked(&self) -> u64 {
        self.state.read().await.staked
    }
}

#[async_trait]
impl Wallet for InMemoryWallet {
    async fn connect_wallet(&self) -> Result<String, WalletError> {
        let mut state = self.state.write().await;
        if state.reject_requests {
            return Err(WalletError::Rejected);
        }
        state.connected = true;
        Ok(state.account.clone())
    }

    async fn switch_network(&self, chain_id: u64) -> Result<(), WalletError> {
        let mut state = self.state.write().await;
        if state.reject_requests {
            return Err(WalletError::Rejected);
        }
        state.chain_id = chain_id;
        Ok(())
    }

    async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        let state = self.state.read().await;
        let account = state.connected_account()?;
        if state.reject_requests {
            return Err(WalletError::Rejected);
        }
        Ok(format!("{account}:{}:{message}", state.chain_id))
    }

    async fn stake_tokens(&self, amount: u64) -> Result<String, WalletError> {
        let mut state = self.state.write().await;
        state.connected_account()?;
        if state.reject_requests {
            return Err(WalletError::Rejected);
        }
        if state.chain_id != state.staking_chain_id {
            return Err(WalletError::WrongNetwork {
                expected: state.staking_chain_id,
                actual: state.chain_id,
            });
        }
        if amount > state.balance {
            return Err(WalletError::InsufficientBalance {
                required: amount,
                available: state.balance,
            });
        }

        state.balance -= amount;
        state.staked += amount;
        state.next_tx += 1;
        Ok(format!("0x{:064x}", state.next_tx))
    }

    async fn address(&self) -> Option<String> {
        let state = self.state.read().await;
        state.connected.then(|| state.account.clone())
    }

    async fn chain_id(&self) -> u64 {
        self.state.read().await.chain_id
    }
}
