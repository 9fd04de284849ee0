// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_builder::AdMetricsBuilder;
use adm_events::{Address, CallbackSelector};
use adm_fhe::{Fhe, FheKeys, FhePreset};
use adm_ledger::{
    AggregateRecords, DecryptionCallback, GetResult, MetricsError, RequestDecryption, SubmitRecord,
};
use adm_oracle::{Counters, DecryptionOracle, LocalOracle};
use adm_utils::create_shared_rng_from_u64;
use alloy::signers::local::PrivateKeySigner;
use anyhow::Result;
use std::sync::Arc;

fn setup() -> Result<(Fhe, Arc<LocalOracle>)> {
    let rng = create_shared_rng_from_u64(42);
    let params = FhePreset::Insecure512.build_params()?;
    let keys = FheKeys::generate(&params, &rng)?;
    let fhe = Fhe::new(params, keys.public_key, rng.clone());
    let oracle = LocalOracle::new(
        fhe.clone(),
        keys.secret_key,
        PrivateKeySigner::random(),
        rng,
    );
    Ok((fhe, Arc::new(oracle)))
}

#[actix::test]
async fn test_bfv_reveal_through_local_oracle() -> Result<()> {
    let (fhe, oracle) = setup()?;
    let system = AdMetricsBuilder::new(Arc::new(fhe.clone()), oracle.clone())
        .build()
        .await?;
    let submitter = Address::repeat_byte(0x01);

    let record_id = system
        .ledger
        .send(SubmitRecord {
            impressions: fhe.encrypt(100)?,
            clicks: fhe.encrypt(10)?,
            conversions: fhe.encrypt(2)?,
            submitter,
        })
        .await??;

    let request_id = system
        .coordinator
        .send(RequestDecryption {
            record_id,
            requester: submitter,
        })
        .await??;
    assert_eq!(oracle.pending()?, vec![request_id]);

    let response = oracle.fulfill(&request_id)?;
    let callback = DecryptionCallback::from(response);
    assert_eq!(system.coordinator.send(callback.clone()).await??, record_id);

    let result = system.ledger.send(GetResult(record_id)).await?;
    assert!(result.revealed);
    assert_eq!(result.counters(), Counters::new(100, 10, 2));

    assert!(matches!(
        system.coordinator.send(callback).await?,
        Err(MetricsError::InvalidRequest(_))
    ));
    Ok(())
}

#[actix::test]
async fn test_bfv_aggregate_decrypts_to_sum() -> Result<()> {
    let (fhe, oracle) = setup()?;
    let system = AdMetricsBuilder::new(Arc::new(fhe.clone()), oracle.clone())
        .build()
        .await?;

    let mut ids = vec![];
    for (i, c, v) in [(100, 10, 2), (50, 5, 1), (7, 3, 0)] {
        ids.push(
            system
                .ledger
                .send(SubmitRecord {
                    impressions: fhe.encrypt(i)?,
                    clicks: fhe.encrypt(c)?,
                    conversions: fhe.encrypt(v)?,
                    submitter: Address::ZERO,
                })
                .await??,
        );
    }

    let totals = system.ledger.send(AggregateRecords(ids.clone())).await??;
    for id in ids {
        assert!(!system.ledger.send(GetResult(id)).await?.revealed);
    }

    let request_id = oracle
        .request_decryption(
            vec![totals.impressions, totals.clicks, totals.conversions],
            CallbackSelector::decryption_callback(),
        )
        .await?;
    let response = oracle.fulfill(&request_id)?;
    assert_eq!(
        Counters::from_abi(&response.cleartexts)?,
        Counters::new(157, 18, 3)
    );

    let empty = system.ledger.send(AggregateRecords(vec![])).await??;
    let request_id = oracle
        .request_decryption(
            vec![empty.impressions, empty.clicks, empty.conversions],
            CallbackSelector::decryption_callback(),
        )
        .await?;
    let response = oracle.fulfill(&request_id)?;
    assert_eq!(Counters::from_abi(&response.cleartexts)?, Counters::default());
    Ok(())
}
