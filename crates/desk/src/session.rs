use alloy_primitives::Address;
use tokio::sync::watch;
use tracing::info;

/// Handle to the connected wallet.
///
/// Clones share the same underlying state. Anything that depends on the
/// connected account either asks [`WalletSession::current_address`] or
/// subscribes to connect/disconnect events.
#[derive(Debug, Clone)]
pub struct WalletSession {
    account: watch::Sender<Option<Address>>,
}

impl WalletSession {
    pub fn new() -> Self {
        let (account, _) = watch::channel(None);
        Self { account }
    }

    pub fn connected(address: Address) -> Self {
        let session = Self::new();
        session.connect(address);
        session
    }

    pub fn connect(&self, address: Address) {
        info!(%address, "wallet connected");
        self.account.send_replace(Some(address));
    }

    pub fn disconnect(&self) {
        if self.account.send_replace(None).is_some() {
            info!("wallet disconnected");
        }
    }

    pub fn current_address(&self) -> Option<Address> {
        *self.account.borrow()
    }

    /// Receives every connect and disconnect.
    pub fn subscribe(&self) -> watch::Receiver<Option<Address>> {
        self.account.subscribe()
    }
}

impl Default for WalletSession {
    fn default() -> Self {
        Self::new()
    }
}
