use async_trait::async_trait;

use crate::device::Asset;

/// Wallet data fetchers owned by the host (balance and history services).
#[async_trait]
pub trait DataFetchPort: Send + Sync {
    async fn fetch_balances(&self, asset: Asset) -> anyhow::Result<()>;

    /// `contexts` are account xpubs. `reset` drops the cached list first.
    async fn fetch_transactions(
        &self,
        asset: Asset,
        contexts: Vec<String>,
        reset: bool,
    ) -> anyhow::Result<()>;
}
