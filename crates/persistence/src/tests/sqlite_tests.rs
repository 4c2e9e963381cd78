// Copyright (C) 2026 ParkWise Contributors
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::sync::Arc;

use parkwise_domain::{ParkingZone, ZoneId};

use super::contract_tests::store_contract_tests;
use super::create_test_zone;
use crate::{DocumentStore, PersistenceError, Precondition, SqliteStore, WriteBatch};

store_contract_tests!(SqliteStore::new_in_memory().unwrap());

#[test]
fn test_persistence_initialization() {
    let result: Result<SqliteStore, PersistenceError> = SqliteStore::new_in_memory();
    assert!(result.is_ok());
}

#[tokio::test]
async fn test_multiple_in_memory_instances_are_isolated() {
    let db1: SqliteStore = SqliteStore::new_in_memory().unwrap();
    let db2: SqliteStore = SqliteStore::new_in_memory().unwrap();

    db1.commit(WriteBatch::new().put_zone(create_test_zone("z1", 2), Precondition::Absent))
        .await
        .unwrap();

    assert_eq!(db1.list_zones().await.unwrap().len(), 1);
    assert!(db2.list_zones().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_invalid_zone_rejected_by_schema() {
    let store: SqliteStore = SqliteStore::new_in_memory().unwrap();
    let mut zone: ParkingZone = create_test_zone("z1", 2);
    zone.available_slots = 3;

    let result = store
        .commit(WriteBatch::new().put_zone(zone, Precondition::Absent))
        .await;
    assert!(matches!(
        result,
        Err(PersistenceError::ConstraintViolation(_) | PersistenceError::DatabaseError(_))
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_conditional_updates_admit_one_winner() {
    let store: Arc<SqliteStore> = Arc::new(SqliteStore::new_in_memory().unwrap());
    store
        .commit(WriteBatch::new().put_zone(create_test_zone("z1", 8), Precondition::Absent))
        .await
        .unwrap();

    let mut handles = Vec::new();
    for n in 0..8_u32 {
        let store: Arc<SqliteStore> = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let mut zone: ParkingZone = create_test_zone("z1", 8);
            zone.available_slots = n;
            store
                .commit(WriteBatch::new().put_zone(zone, Precondition::Version(1)))
                .await
                .is_ok()
        }));
    }

    let mut winners: usize = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1);

    let stored = store.get_zone(&ZoneId::new("z1")).await.unwrap().unwrap();
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir: std::path::PathBuf = std::env::temp_dir().join(format!(
        "parkwise-test-{}",
        parkwise_domain::ZoneId::generate()
    ));
    std::fs::create_dir_all(&dir).unwrap();
    let path: std::path::PathBuf = dir.join("parkwise.db");

    {
        let store: SqliteStore = SqliteStore::new_with_file(&path).unwrap();
        store
            .commit(WriteBatch::new().put_zone(create_test_zone("z1", 2), Precondition::Absent))
            .await
            .unwrap();
    }

    let reopened: SqliteStore = SqliteStore::new_with_file(&path).unwrap();
    let stored = reopened
        .get_zone(&ZoneId::new("z1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.version, 1);

    drop(reopened);
    let _ = std::fs::remove_dir_all(&dir);
}
