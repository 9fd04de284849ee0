// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_config::{AppConfig, StorageKind};
use adm_events::Address;
use adm_ledger::{DecryptionStatus, GetDecryptionStatus, GetPendingRequest, GetRecordCount};
use adm_oracle::Counters;
use adm_test_helpers::{MockCiphertexts, MockOracle};
use adm_tests::test_system_with;
use anyhow::Result;
use std::{sync::Arc, time::Duration};
use tokio::time::sleep;

fn sled_config(dir: &std::path::Path) -> AppConfig {
    AppConfig {
        name: "restart".to_string(),
        data_dir: Some(dir.to_path_buf()),
        storage: StorageKind::Sled,
        ..AppConfig::default()
    }
}

#[actix::test]
#[serial_test::serial]
async fn test_pending_request_survives_restart() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = sled_config(dir.path());
    let ciphertexts = Arc::new(MockCiphertexts::new());
    let oracle = Arc::new(MockOracle::new());
    let owner = Address::repeat_byte(7);

    let first = test_system_with(ciphertexts.clone(), oracle.clone(), Some(&config)).await?;
    let revealed = first.submit(owner, Counters::new(3, 2, 1)).await?;
    let pending = first.submit(owner, Counters::new(30, 20, 10)).await?;

    let req = first.request(revealed, owner).await??;
    first.deliver(&req, Counters::new(3, 2, 1)).await??;
    let pending_req = first.request(pending, owner).await??;

    first.handle.shutdown();
    sleep(Duration::from_millis(100)).await;

    let second = test_system_with(ciphertexts, oracle, Some(&config)).await?;
    assert_eq!(second.handle.ledger.send(GetRecordCount).await?, 2);
    assert_eq!(
        second.result(revealed).await?.counters(),
        Counters::new(3, 2, 1)
    );
    assert_eq!(
        second
            .handle
            .ledger
            .send(GetDecryptionStatus(pending))
            .await?,
        Some(DecryptionStatus::Pending(pending_req))
    );
    assert_eq!(
        second
            .handle
            .coordinator
            .send(GetPendingRequest(pending_req))
            .await?,
        Some(pending)
    );

    // the oracle answers after the restart
    assert_eq!(
        second
            .deliver(&pending_req, Counters::new(30, 20, 10))
            .await??,
        pending
    );
    assert!(second.result(pending).await?.revealed);

    // ids keep counting from where they were
    let next = second.submit(owner, Counters::default()).await?;
    assert_eq!(next.0, 3);
    Ok(())
}
