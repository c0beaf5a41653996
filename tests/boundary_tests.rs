mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{commands_csv, config_file};
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_boundary_amounts() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path());
    let input = commands_csv(&[
        "register, alice",
        "create, alice, , , , 4000000000000001, , 2099-01-31",
        "create, alice, , , , 4000000000000002, , 2099-01-31",
        // Ten integer digits is the largest accepted amount
        "transfer, alice, 1, 2, 9999999999.99",
        "transfer, alice, 1, 2, 10000000000.00",
        "transfer, alice, 1, 2, 0.001",
        "transfer, alice, 1, 2, 0",
        "transfer, alice, 1, 2, 1000.00",
        "transfer, alice, 1, 2, 1000.01",
    ]);

    let mut cmd = Command::new(cargo_bin!("bankcards"));
    cmd.arg(input.path())
        .arg("--config")
        .arg(&config)
        .arg("--report")
        .arg("transactions");

    cmd.assert()
        .success()
        .stdout(predicate::str::is_match(r"1,[^\n]*,9999999999\.99,[^,]+,FAILED").unwrap())
        .stdout(predicate::str::is_match(r"2,[^\n]*,1000\.00,[^,]+,PENDING").unwrap())
        .stdout(predicate::str::is_match(r"3,[^\n]*,1000\.01,[^,]+,FAILED").unwrap())
        .stdout(predicate::str::contains("10000000000").not())
        .stderr(predicate::str::contains("Amount must have up to 10 integer and 2 fraction digits").count(2))
        .stderr(predicate::str::contains("Amount must be positive"));
}

#[test]
fn test_boundary_card_numbers() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_file(dir.path());
    let input = commands_csv(&[
        "register, alice",
        "create, alice, , , , 400000000000000, , 2099-01-31",
        "create, alice, , , , 40000000000000001, , 2099-01-31",
        "create, alice, , , , 4000-0000-0000-01, , 2099-01-31",
        "create, alice, , , , 0000000000000000, , 2099-01-31",
    ]);

    let mut cmd = Command::new(cargo_bin!("bankcards"));
    cmd.arg(input.path()).arg("--config").arg(&config);

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("The card number must contain 16 digits").count(3))
        .stdout(predicate::str::contains("1,**** **** **** 0000,alice"));
}
