// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_config::AppConfig;
use adm_data::{DataStore, RepositoriesFactory};
use adm_fhe::{Fhe, FheRepositoryFactory};
use adm_utils::SharedRng;
use anyhow::{Context, Result};
use tracing::info;

/// BFV capability for the configured `fhe_preset`, with its ciphertext registry kept in
/// `store`. Pass the same store to [`crate::AdMetricsBuilder::with_datastore`] so record
/// handles and the ciphertexts behind them are restored together.
pub async fn setup_fhe(
    config: &AppConfig,
    store: &DataStore,
    public_key: &[u8],
    rng: SharedRng,
) -> Result<Fhe> {
    let preset = config.fhe_preset;
    let params = preset.build_params()?;
    let fhe = Fhe::load_or_new(store.repositories().fhe(), params, public_key, rng)
        .await
        .with_context(|| format!("Could not set up {} ciphertexts", preset.name()))?;
    info!("Using {} ciphertexts", preset.name());
    Ok(fhe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::get_in_mem_store;
    use adm_fhe::{FheKeys, FhePreset};
    use adm_utils::create_shared_rng_from_u64;

    fn config(fhe_preset: FhePreset) -> AppConfig {
        AppConfig {
            fhe_preset,
            ..AppConfig::default()
        }
    }

    #[actix::test]
    async fn test_setup_fhe_follows_preset_and_restores() -> Result<()> {
        let config = config(FhePreset::Insecure512);
        let rng = create_shared_rng_from_u64(11);
        let params = FhePreset::Insecure512.build_params()?;
        let keys = FheKeys::generate(&params, &rng)?;
        let public_key = Fhe::new(params, keys.public_key.clone(), rng.clone()).public_key_bytes();
        let store = get_in_mem_store(false);

        let fhe = setup_fhe(&config, &store, &public_key, rng.clone()).await?;
        assert_eq!(fhe.params.degree(), 512);
        let handle = fhe.encrypt(12)?;

        let restored = setup_fhe(&config, &store, &public_key, rng).await?;
        assert_eq!(restored.decrypt(&keys.secret_key, &handle)?, 12);
        Ok(())
    }

    #[actix::test]
    async fn test_setup_fhe_rejects_key_from_other_preset() -> Result<()> {
        let rng = create_shared_rng_from_u64(11);
        let params = FhePreset::Insecure512.build_params()?;
        let keys = FheKeys::generate(&params, &rng)?;
        let public_key = Fhe::new(params, keys.public_key, rng.clone()).public_key_bytes();

        let result = setup_fhe(
            &config(FhePreset::Secure8192),
            &get_in_mem_store(false),
            &public_key,
            rng,
        )
        .await;
        assert!(result.is_err());
        Ok(())
    }
}
