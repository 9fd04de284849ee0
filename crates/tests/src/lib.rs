// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_builder::{AdMetricsBuilder, AdMetricsHandle};
use adm_config::AppConfig;
use adm_events::{Address, RecordId, RequestId};
use adm_ledger::{
    DecryptedResult, DecryptionCallback, GetResult, MetricsResult, RequestDecryption, SubmitRecord,
};
use adm_oracle::Counters;
use adm_test_helpers::{MockCiphertexts, MockOracle};
use anyhow::Result;
use std::sync::Arc;

/// A running instance wired to mock capabilities
pub struct TestSystem {
    pub handle: AdMetricsHandle,
    pub ciphertexts: Arc<MockCiphertexts>,
    pub oracle: Arc<MockOracle>,
}

/// In-memory instance with history collection
pub async fn test_system() -> Result<TestSystem> {
    let ciphertexts = Arc::new(MockCiphertexts::new());
    let oracle = Arc::new(MockOracle::new());
    test_system_with(ciphertexts, oracle, None).await
}

pub async fn test_system_with(
    ciphertexts: Arc<MockCiphertexts>,
    oracle: Arc<MockOracle>,
    config: Option<&AppConfig>,
) -> Result<TestSystem> {
    let mut builder =
        AdMetricsBuilder::new(ciphertexts.clone(), oracle.clone()).testmode_with_history();
    if let Some(config) = config {
        builder = builder.with_config(config);
    }

    Ok(TestSystem {
        handle: builder.build().await?,
        ciphertexts,
        oracle,
    })
}

impl TestSystem {
    pub async fn submit(&self, submitter: Address, counters: Counters) -> Result<RecordId> {
        Ok(self
            .handle
            .ledger
            .send(SubmitRecord {
                impressions: self.ciphertexts.encrypt(counters.impressions),
                clicks: self.ciphertexts.encrypt(counters.clicks),
                conversions: self.ciphertexts.encrypt(counters.conversions),
                submitter,
            })
            .await??)
    }

    pub async fn request(&self, record_id: RecordId, requester: Address) -> Result<MetricsResult<RequestId>> {
        Ok(self
            .handle
            .coordinator
            .send(RequestDecryption {
                record_id,
                requester,
            })
            .await?)
    }

    /// Have the oracle answer `request_id` with `counters`
    pub async fn deliver(
        &self,
        request_id: &RequestId,
        counters: Counters,
    ) -> Result<MetricsResult<RecordId>> {
        let response = self.oracle.respond(request_id, counters)?;
        Ok(self
            .handle
            .coordinator
            .send(DecryptionCallback::from(response))
            .await?)
    }

    pub async fn result(&self, record_id: RecordId) -> Result<DecryptedResult> {
        Ok(self.handle.ledger.send(GetResult(record_id)).await?)
    }
}
