//! Wallet data refresh for registered lockboxes.
//!
//! Fetch failures are logged and swallowed: a slow balance service must
//! never fail a pairing run or a dashboard load.

use std::sync::Arc;

use lb_core::ports::{DataFetchPort, DeviceRegistryPort};
use lb_core::Asset;
use tracing::{debug, info_span, warn, Instrument};

pub struct RefreshDeviceData {
    registry: Arc<dyn DeviceRegistryPort>,
    fetcher: Arc<dyn DataFetchPort>,
}

impl RefreshDeviceData {
    pub fn new(registry: Arc<dyn DeviceRegistryPort>, fetcher: Arc<dyn DataFetchPort>) -> Self {
        Self { registry, fetcher }
    }

    /// Balances for every asset, then a full transaction reload.
    pub async fn after_device_added(&self) {
        let span = info_span!("usecase.refresh_device_data.after_device_added");
        async {
            for asset in Asset::ALL {
                if let Err(err) = self.fetcher.fetch_balances(asset).await {
                    warn!(%asset, error = %err, "failed to fetch lockbox balances");
                }
            }
            self.load_transactions(true).await;
        }
        .instrument(span)
        .await
    }

    /// Reset and reload transaction lists for every asset.
    pub async fn initialize_dashboard(&self) {
        self.load_transactions(true)
            .instrument(info_span!("usecase.refresh_device_data.initialize_dashboard"))
            .await
    }

    /// Fetch newer transactions without dropping the loaded ones.
    pub async fn update_transaction_list(&self) {
        self.load_transactions(false)
            .instrument(info_span!("usecase.refresh_device_data.update_transaction_list"))
            .await
    }

    async fn load_transactions(&self, reset: bool) {
        let devices = match self.registry.list().await {
            Ok(devices) => devices,
            Err(err) => {
                warn!(error = %err, "cannot list lockboxes for transaction refresh");
                return;
            }
        };

        for asset in Asset::ALL {
            let contexts: Vec<String> = devices
                .iter()
                .flat_map(|device| device.accounts.active_contexts(asset))
                .collect();
            debug!(%asset, contexts = contexts.len(), reset, "fetching lockbox transactions");
            if let Err(err) = self
                .fetcher
                .fetch_transactions(asset, contexts, reset)
                .await
            {
                warn!(%asset, error = %err, "failed to fetch lockbox transactions");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use lb_core::{AccountEntry, AccountsMetadata};

    use super::*;
    use crate::usecases::registry::test_support::{device, FakeRegistry};

    #[derive(Default)]
    struct RecordingFetcher {
        balances: Mutex<Vec<Asset>>,
        transactions: Mutex<Vec<(Asset, Vec<String>, bool)>>,
        fail_balances: bool,
    }

    #[async_trait]
    impl DataFetchPort for RecordingFetcher {
        async fn fetch_balances(&self, asset: Asset) -> anyhow::Result<()> {
            self.balances.lock().unwrap().push(asset);
            if self.fail_balances {
                anyhow::bail!("rate limited");
            }
            Ok(())
        }

        async fn fetch_transactions(
            &self,
            asset: Asset,
            contexts: Vec<String>,
            reset: bool,
        ) -> anyhow::Result<()> {
            self.transactions
                .lock()
                .unwrap()
                .push((asset, contexts, reset));
            Ok(())
        }
    }

    fn account(xpub: &str, archived: bool) -> AccountEntry {
        AccountEntry {
            label: "Wallet".to_string(),
            archived,
            xpub: xpub.to_string(),
        }
    }

    fn registry() -> Arc<FakeRegistry> {
        let mut first = device("a", "First");
        first.accounts = AccountsMetadata {
            btc: vec![account("xpub-a-btc", false), account("xpub-a-old", true)],
            bch: vec![account("xpub-a-bch", false)],
            eth: vec![],
        };
        let mut second = device("b", "Second");
        second.accounts.btc = vec![account("xpub-b-btc", false)];
        Arc::new(FakeRegistry::with(vec![first, second]))
    }

    #[tokio::test]
    async fn dashboard_load_resets_with_active_contexts_of_all_devices() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let uc = RefreshDeviceData::new(registry(), fetcher.clone());

        uc.initialize_dashboard().await;

        let calls = fetcher.transactions.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(
            calls[0],
            (
                Asset::Btc,
                vec!["xpub-a-btc".to_string(), "xpub-b-btc".to_string()],
                true
            )
        );
        assert_eq!(calls[1], (Asset::Bch, vec!["xpub-a-bch".to_string()], true));
        assert_eq!(calls[2], (Asset::Eth, vec![], true));
    }

    #[tokio::test]
    async fn update_keeps_loaded_transactions() {
        let fetcher = Arc::new(RecordingFetcher::default());
        let uc = RefreshDeviceData::new(registry(), fetcher.clone());

        uc.update_transaction_list().await;

        assert!(fetcher
            .transactions
            .lock()
            .unwrap()
            .iter()
            .all(|(_, _, reset)| !reset));
    }

    #[tokio::test]
    async fn balance_failures_do_not_stop_the_refresh() {
        let fetcher = Arc::new(RecordingFetcher {
            fail_balances: true,
            ..Default::default()
        });
        let uc = RefreshDeviceData::new(registry(), fetcher.clone());

        uc.after_device_added().await;

        assert_eq!(*fetcher.balances.lock().unwrap(), Asset::ALL.to_vec());
        assert_eq!(fetcher.transactions.lock().unwrap().len(), 3);
    }
}
