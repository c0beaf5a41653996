#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::cargo_bin;
use common::{commands_csv, config_file};
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let config = config_file(dir.path());
    let db_path = dir.path().join("test_db");

    // 1. First run: register a holder and issue two cards
    let csv1 = commands_csv(&[
        "register, alice",
        "create, alice, , , , 4000123412341234, , 2099-01-31",
        "create, alice, , , , 4000567856785678, , 2099-01-31",
    ]);
    let output1 = Command::new(cargo_bin!("bankcards"))
        .arg(csv1.path())
        .arg("--config")
        .arg(&config)
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("2,**** **** **** 5678,alice,2099-01-31,1000.00,ACTIVE"));

    // 2. Second run: the same holder, cards and number index are recovered
    let csv2 = commands_csv(&[
        "moderate, , , , , 4000567856785678, BLOCKED",
        "create, alice, , , , 4000999999999999, , 2099-01-31",
        "transfer, alice, 1, 3, 10.00",
    ]);
    let output2 = Command::new(cargo_bin!("bankcards"))
        .arg(csv2.path())
        .arg("--config")
        .arg(&config)
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);
    assert!(stdout2.contains("2,**** **** **** 5678,alice,2099-01-31,1000.00,BLOCKED"));
    assert!(stdout2.contains("3,**** **** **** 9999,alice,2099-01-31,1000.00,ACTIVE"));

    // 3. The ledger survives as well
    let csv3 = commands_csv(&[]);
    let output3 = Command::new(cargo_bin!("bankcards"))
        .arg(csv3.path())
        .arg("--config")
        .arg(&config)
        .arg("--db-path")
        .arg(&db_path)
        .arg("--report")
        .arg("transactions")
        .output()
        .expect("Failed to execute command");
    assert!(output3.status.success());
    let stdout3 = String::from_utf8_lossy(&output3.stdout);
    assert!(stdout3.contains(",10.00,"));
    assert!(stdout3.contains("PENDING"));
}
