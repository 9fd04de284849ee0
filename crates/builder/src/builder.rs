// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use crate::{get_in_mem_store, setup_datastore, AdMetricsHandle};
use actix::{Actor, Addr};
use adm_config::AppConfig;
use adm_data::{DataStore, RepositoriesFactory};
use adm_events::{AdmEvent, EventBus, EventBusConfig};
use adm_fhe::CiphertextOps;
use adm_ledger::{
    policy_for, DecryptionCoordinator, DecryptionPolicy, Ledger, LedgerRepositoryFactory,
};
use adm_logger::{init_tracing, SimpleLogger};
use adm_oracle::DecryptionOracle;
use anyhow::{bail, Result};
use derivative::Derivative;
use std::sync::Arc;
use tracing::{info, warn};

/// Assemble a ledger and decryption coordinator around the given capabilities.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct AdMetricsBuilder {
    #[derivative(Debug = "ignore")]
    ciphertexts: Arc<dyn CiphertextOps>,
    #[derivative(Debug = "ignore")]
    oracle: Arc<dyn DecryptionOracle>,
    #[derivative(Debug = "ignore")]
    policy: Option<Arc<dyn DecryptionPolicy>>,
    config: Option<AppConfig>,
    datastore: Option<DataStore>,
    bus: Option<Addr<EventBus<AdmEvent>>>,
    logging: bool,
    testmode_history: bool,
}

impl AdMetricsBuilder {
    pub fn new(ciphertexts: Arc<dyn CiphertextOps>, oracle: Arc<dyn DecryptionOracle>) -> Self {
        Self {
            ciphertexts,
            oracle,
            policy: None,
            config: None,
            datastore: None,
            bus: None,
            logging: false,
            testmode_history: false,
        }
    }

    /// Storage, policy, event deduplication and the trusted oracle address come from here
    pub fn with_config(mut self, config: &AppConfig) -> Self {
        self.config = Some(config.clone());
        self
    }

    /// Use this store instead of the one named in the config
    pub fn with_datastore(mut self, store: DataStore) -> Self {
        self.datastore = Some(store);
        self
    }

    /// Publish on an existing bus. No new bus is created.
    pub fn with_bus(mut self, bus: &Addr<EventBus<AdmEvent>>) -> Self {
        self.bus = Some(bus.clone());
        self
    }

    /// Override the policy named in the config
    pub fn with_policy(mut self, policy: Arc<dyn DecryptionPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Install a tracing subscriber filtered by the config's `log_level` and log every bus
    /// event. A subscriber that is already installed is kept. An invalid `log_level` fails
    /// the build.
    pub fn with_logging(mut self) -> Self {
        self.logging = true;
        self
    }

    /// Attach a history collecting test module.
    /// This is conspicuously named so we understand that this should only be used when testing
    pub fn testmode_with_history(mut self) -> Self {
        self.testmode_history = true;
        self
    }

    fn check_oracle(&self, config: &AppConfig) -> Result<()> {
        let Some(expected) = config.oracle_address else {
            return Ok(());
        };
        match self.oracle.signer() {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => bail!(
                "Oracle signs as {actual} but the configured oracle address is {expected}"
            ),
            None => {
                warn!("Oracle does not expose a signer, cannot check it against {expected}");
                Ok(())
            }
        }
    }

    pub async fn build(self) -> Result<AdMetricsHandle> {
        let explicit_config = self.config.is_some();
        let config = self.config.clone().unwrap_or_default();
        self.check_oracle(&config)?;

        let bus = match self.bus {
            Some(ref bus) => bus.clone(),
            None => EventBus::<AdmEvent>::new(EventBusConfig {
                deduplicate: config.deduplicate_events,
            })
            .start(),
        };

        // History collector for taking historical events for analysis and testing
        let history = if self.testmode_history {
            info!("Setting up history collector");
            Some(EventBus::<AdmEvent>::history(&bus))
        } else {
            None
        };

        if self.logging {
            if !init_tracing(&config.log_level)? {
                info!("Tracing subscriber already installed, ignoring log_level");
            }
            SimpleLogger::<AdmEvent>::attach(&config.name, bus.clone());
        }

        let store = match self.datastore {
            Some(ref store) => store.clone(),
            None if explicit_config => setup_datastore(&config, &bus)?,
            None => get_in_mem_store(self.logging),
        };

        let repositories = store.repositories();
        let policy = self
            .policy
            .clone()
            .unwrap_or_else(|| policy_for(config.decryption_policy));

        let ledger = Ledger::attach(&bus, &repositories.ledger(), self.ciphertexts.clone()).await?;
        let coordinator = DecryptionCoordinator::attach(
            &bus,
            &repositories.decryption_requests(),
            ledger.clone(),
            self.oracle.clone(),
            policy,
        )
        .await?;

        info!("{} ready", config.name);
        Ok(AdMetricsHandle {
            bus,
            ledger,
            coordinator,
            store,
            history,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adm_config::{PolicyKind, StorageKind};
    use adm_events::{Address, Event, GetEvents};
    use adm_ledger::{GetRecordCount, MetricsError, RequestDecryption, SubmitRecord};
    use adm_test_helpers::{MockCiphertexts, MockOracle};

    fn capabilities() -> (Arc<MockCiphertexts>, Arc<MockOracle>) {
        (Arc::new(MockCiphertexts::new()), Arc::new(MockOracle::new()))
    }

    #[actix::test]
    async fn test_build_in_memory() -> Result<()> {
        let (ops, oracle) = capabilities();
        let handle = AdMetricsBuilder::new(ops.clone(), oracle)
            .testmode_with_history()
            .build()
            .await?;

        handle
            .ledger
            .send(SubmitRecord {
                impressions: ops.encrypt(1),
                clicks: ops.encrypt(2),
                conversions: ops.encrypt(3),
                submitter: Address::ZERO,
            })
            .await??;

        assert_eq!(handle.ledger.send(GetRecordCount).await?, 1);
        let events = handle.history()?.send(GetEvents::new()).await?;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "RecordSubmitted");
        Ok(())
    }

    #[actix::test]
    async fn test_history_requires_testmode() -> Result<()> {
        let (ops, oracle) = capabilities();
        let handle = AdMetricsBuilder::new(ops, oracle).build().await?;
        assert!(handle.history().is_err());
        Ok(())
    }

    #[actix::test]
    async fn test_rejects_untrusted_oracle() -> Result<()> {
        let (ops, oracle) = capabilities();
        let config = AppConfig {
            storage: StorageKind::Memory,
            oracle_address: Some(Address::repeat_byte(0x42)),
            ..AppConfig::default()
        };
        let result = AdMetricsBuilder::new(ops.clone(), oracle.clone())
            .with_config(&config)
            .build()
            .await;
        assert!(result.is_err());

        let config = AppConfig {
            oracle_address: Some(oracle.address()),
            ..config
        };
        AdMetricsBuilder::new(ops, oracle)
            .with_config(&config)
            .build()
            .await?;
        Ok(())
    }

    #[actix::test]
    async fn test_policy_from_config() -> Result<()> {
        let (ops, oracle) = capabilities();
        let config = AppConfig {
            storage: StorageKind::Memory,
            decryption_policy: PolicyKind::SubmitterOnly,
            ..AppConfig::default()
        };
        let handle = AdMetricsBuilder::new(ops.clone(), oracle)
            .with_config(&config)
            .build()
            .await?;

        let record_id = handle
            .ledger
            .send(SubmitRecord {
                impressions: ops.encrypt(1),
                clicks: ops.encrypt(1),
                conversions: ops.encrypt(1),
                submitter: Address::repeat_byte(1),
            })
            .await??;
        let refused = handle
            .coordinator
            .send(RequestDecryption {
                record_id,
                requester: Address::repeat_byte(2),
            })
            .await?;
        assert!(matches!(refused, Err(MetricsError::Unauthorized { .. })));
        Ok(())
    }

    #[actix::test]
    async fn test_sled_storage_from_config() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let (ops, oracle) = capabilities();
        let config = AppConfig {
            data_dir: Some(dir.path().to_path_buf()),
            storage: StorageKind::Sled,
            ..AppConfig::default()
        };
        let handle = AdMetricsBuilder::new(ops.clone(), oracle)
            .with_config(&config)
            .build()
            .await?;

        handle
            .ledger
            .send(SubmitRecord {
                impressions: ops.encrypt(9),
                clicks: ops.encrypt(9),
                conversions: ops.encrypt(9),
                submitter: Address::ZERO,
            })
            .await??;

        assert!(dir.path().join("db").exists());
        Ok(())
    }

    #[actix::test]
    async fn test_logging_uses_configured_level() -> Result<()> {
        let (ops, oracle) = capabilities();
        let bad = AppConfig {
            storage: StorageKind::Memory,
            log_level: String::from("adm_ledger=notalevel"),
            ..AppConfig::default()
        };
        let result = AdMetricsBuilder::new(ops.clone(), oracle.clone())
            .with_config(&bad)
            .with_logging()
            .build()
            .await;
        assert!(result.is_err());

        let config = AppConfig {
            log_level: String::from("adm_ledger=debug,info"),
            ..bad
        };
        for _ in 0..2 {
            AdMetricsBuilder::new(ops.clone(), oracle.clone())
                .with_config(&config)
                .with_logging()
                .build()
                .await?;
        }
        Ok(())
    }
}
