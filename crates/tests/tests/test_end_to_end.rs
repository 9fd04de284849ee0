// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use adm_events::{Address, Event, GetEvents, RecordId};
use adm_ledger::{AggregateRecords, DecryptedResult, MetricsError};
use adm_oracle::Counters;
use adm_tests::test_system;
use anyhow::Result;

fn advertiser() -> Address {
    Address::repeat_byte(0xad)
}

#[actix::test]
async fn test_submit_request_reveal() -> Result<()> {
    let system = test_system().await?;
    let counters = Counters::new(100, 10, 2);

    let record_id = system.submit(advertiser(), counters).await?;
    assert_eq!(record_id, RecordId(1));
    assert_eq!(system.result(record_id).await?, DecryptedResult::default());

    let request_id = system.request(record_id, advertiser()).await??;
    assert_eq!(system.result(record_id).await?, DecryptedResult::default());

    assert_eq!(system.deliver(&request_id, counters).await??, record_id);
    assert_eq!(
        system.result(record_id).await?,
        DecryptedResult::revealed(counters)
    );

    // replaying the callback is refused
    assert!(matches!(
        system.deliver(&request_id, counters).await?,
        Err(MetricsError::InvalidRequest(id)) if id == request_id
    ));
    // and the record cannot be decrypted again
    assert!(matches!(
        system.request(record_id, advertiser()).await?,
        Err(MetricsError::AlreadyRevealed(id)) if id == record_id
    ));

    let events = system.handle.history()?.send(GetEvents::new()).await?;
    let names: Vec<_> = events.iter().map(|e| e.event_type()).collect();
    assert_eq!(
        names,
        vec!["RecordSubmitted", "DecryptionRequested", "RecordDecrypted"]
    );
    Ok(())
}

#[actix::test]
async fn test_records_are_independent() -> Result<()> {
    let system = test_system().await?;
    let a = system.submit(advertiser(), Counters::new(1, 2, 3)).await?;
    let b = system.submit(advertiser(), Counters::new(4, 5, 6)).await?;

    let req_a = system.request(a, advertiser()).await??;
    let req_b = system.request(b, advertiser()).await??;
    assert_ne!(req_a, req_b);

    // callbacks may arrive in any order
    assert_eq!(system.deliver(&req_b, Counters::new(4, 5, 6)).await??, b);
    assert!(!system.result(a).await?.revealed);
    assert_eq!(system.deliver(&req_a, Counters::new(1, 2, 3)).await??, a);

    assert_eq!(system.result(a).await?.counters(), Counters::new(1, 2, 3));
    assert_eq!(system.result(b).await?.counters(), Counters::new(4, 5, 6));
    Ok(())
}

#[actix::test]
async fn test_aggregate_never_reveals() -> Result<()> {
    let system = test_system().await?;
    let ops = &system.ciphertexts;
    let ids = vec![
        system.submit(advertiser(), Counters::new(100, 10, 2)).await?,
        system.submit(advertiser(), Counters::new(50, 5, 1)).await?,
        system.submit(advertiser(), Counters::new(25, 0, 0)).await?,
    ];

    let totals = system
        .handle
        .ledger
        .send(AggregateRecords(ids.clone()))
        .await??;
    assert_eq!(ops.value_of(&totals.impressions)?, 175);
    assert_eq!(ops.value_of(&totals.clicks)?, 15);
    assert_eq!(ops.value_of(&totals.conversions)?, 3);

    let reversed: Vec<_> = ids.iter().rev().copied().collect();
    let again = system.handle.ledger.send(AggregateRecords(reversed)).await??;
    assert_eq!(ops.value_of(&again.impressions)?, 175);

    for id in ids {
        assert!(!system.result(id).await?.revealed);
    }
    assert!(system.oracle.requests()?.is_empty());
    Ok(())
}
