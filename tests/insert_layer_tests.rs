//! `dst layer` and `dst insert` tests - standard layers and single measurements

mod common;

use common::TestEnv;
use predicates::prelude::*;

const STANDARD_HEADER: &str = "strike_azimuth,dip_azimuth,dip_value,geo_type,age,lithology,notes";

fn new_layer(env: &TestEnv, name: &str) {
    env.dst().args(["layer", "new", name]).assert().success();
}

// ============================================================================
// Layer
// ============================================================================

#[test]
fn test_layer_new_writes_header_and_mapping() {
    let env = TestEnv::new();
    env.dst()
        .args(["layer", "new", "field.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created standard layer"));

    assert_eq!(env.read("field.csv").trim(), STANDARD_HEADER);

    // The saved mapping is immediately usable
    env.dst()
        .args(["-f", "csv", "fields", "show", "field.csv"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Strike Azimuth,strike_azimuth,yes"))
        .stdout(predicate::str::contains("Notes,notes,no"));
}

#[test]
fn test_layer_new_shapefile_names() {
    let env = TestEnv::new();
    env.dst()
        .args(["layer", "new", "field.csv", "--naming", "shapefile"])
        .assert()
        .success();

    assert_eq!(
        env.read("field.csv").trim(),
        "strike_az,dip_az,dip_val,geo_type,age,lithology,notes"
    );
}

#[test]
fn test_layer_new_refuses_overwrite() {
    let env = TestEnv::new();
    env.write("field.csv", "a,b\n1,2\n");

    env.dst()
        .args(["layer", "new", "field.csv"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
    assert_eq!(env.read("field.csv"), "a,b\n1,2\n");

    env.dst()
        .args(["layer", "new", "field.csv", "--force"])
        .assert()
        .success();
    assert_eq!(env.read("field.csv").trim(), STANDARD_HEADER);
}

#[test]
fn test_layer_schema() {
    let env = TestEnv::new();
    env.dst()
        .args(["-f", "csv", "layer", "schema", "--naming", "shp"])
        .assert()
        .success()
        .stdout(predicate::str::contains("name,role,type,length,precision"))
        .stdout(predicate::str::contains("strike_az,Strike Azimuth,numeric,10,2"))
        .stdout(predicate::str::contains("notes,Notes,text,255,"));
}

// ============================================================================
// Insert
// ============================================================================

#[test]
fn test_insert_from_strike() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args([
            "insert", "field.csv", "--azimuth", "30", "--dip", "45", "--geo-type", "Fault",
            "--notes", "outcrop A",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created feature 1"));

    let rows = env.rows("field.csv");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0], vec!["30", "120", "45", "3", "", "", "outcrop A"]);
}

#[test]
fn test_insert_from_dip_direction_with_correction() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args([
            "insert", "field.csv", "-a", "95", "--mode", "dip-direction", "--dip", "20",
            "--correction=-10",
        ])
        .assert()
        .success();

    let rows = env.rows("field.csv");
    assert_eq!(&rows[0][..3], &["355", "85", "20"]);
}

#[test]
fn test_insert_geo_type_as_description() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args(["insert", "field.csv", "-a", "10", "--dip", "5", "-t", "2"])
        .env("DST_GEO_TYPE_STORAGE_MODE", "description")
        .assert()
        .success();

    assert_eq!(env.rows("field.csv")[0][3], "Foliation");
}

#[test]
fn test_insert_unknown_geo_type_fails() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args(["insert", "field.csv", "-a", "10", "--dip", "5", "-t", "Dyke"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));

    assert!(env.rows("field.csv").is_empty());
}

#[test]
fn test_insert_out_of_range_dip_refused() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args(["insert", "field.csv", "-a", "10", "--dip", "95"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("outside the range"));

    assert!(env.rows("field.csv").is_empty());
}

#[test]
fn test_insert_out_of_range_with_continue() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args([
            "insert",
            "field.csv",
            "-a",
            "370",
            "--dip",
            "95",
            "--continue-on-range-warning",
        ])
        .assert()
        .success()
        .stderr(predicate::str::contains("azimuth 370 is outside 0-360"))
        .stderr(predicate::str::contains("dip 95 is outside 0-90"));

    assert_eq!(&env.rows("field.csv")[0][..3], &["10", "100", "95"]);
}

#[test]
fn test_insert_non_finite_refused_even_when_continuing() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args([
            "insert",
            "field.csv",
            "--azimuth",
            "nan",
            "--dip",
            "10",
            "--continue-on-range-warning",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-numeric input 'NaN'"));

    assert!(env.rows("field.csv").is_empty());
}

#[test]
fn test_insert_requires_values_without_interactive_terminal() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args(["insert", "field.csv", "-a", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--dip is required"));
}

#[test]
fn test_insert_requires_saved_mapping() {
    let env = TestEnv::new();
    env.write("loose.csv", "strike_azimuth,dip_azimuth,dip_value\n");

    env.dst()
        .args(["insert", "loose.csv", "-a", "10", "--dip", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No field mapping stored"));
}

#[test]
fn test_insert_into_custom_mapping() {
    let env = TestEnv::new();
    env.configured_csv(
        "survey.csv",
        "Bearing,DipDir,Inclination,Remarks\n100,190,30,old\n",
        &["strike=Bearing", "dip_azimuth=DipDir"],
    );

    env.dst()
        .args(["insert", "survey.csv", "-a", "200", "--dip", "12", "-n", "new"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created feature 2"));

    let rows = env.rows("survey.csv");
    assert_eq!(rows[1], vec!["200", "290", "12", "new"]);
}

#[test]
fn test_insert_json_output() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    let output = env
        .dst()
        .args(["-f", "json", "insert", "field.csv", "-a", "359.999", "--dip", "45.678"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["strike_azimuth"], 0.0);
    assert_eq!(value["dip_azimuth"], 90.0);
    assert_eq!(value["dip_value"], 45.68);
}

// ============================================================================
// Update
// ============================================================================

#[test]
fn test_update_existing_feature() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");
    env.dst()
        .args(["insert", "field.csv", "-a", "10", "--dip", "5", "-n", "keep me"])
        .assert()
        .success();
    env.dst()
        .args(["insert", "field.csv", "-a", "20", "--dip", "6"])
        .assert()
        .success();

    env.dst()
        .args(["insert", "field.csv", "--update", "1", "-a", "90", "--dip", "10"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Updated feature 1"));

    let rows = env.rows("field.csv");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0], vec!["90", "180", "10", "", "", "", "keep me"]);
    assert_eq!(&rows[1][..3], &["20", "110", "6"]);
}

#[test]
fn test_update_missing_feature_fails() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");

    env.dst()
        .args(["insert", "field.csv", "--update", "7", "-a", "90", "--dip", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("feature 7 not found"));
}

// ============================================================================
// Layer -> insert -> recalc round trip
// ============================================================================

#[test]
fn test_recalc_after_manual_strike_edit() {
    let env = TestEnv::new();
    new_layer(&env, "field.csv");
    env.dst()
        .args(["insert", "field.csv", "-a", "10", "--dip", "5"])
        .assert()
        .success();

    // Someone edits the strike by hand; recalc brings the dip azimuth back in line
    let edited = env.read("field.csv").replacen("\n10,100,", "\n40,100,", 1);
    env.write("field.csv", &edited);

    env.dst()
        .args(["recalc", "field.csv", "-D", "strike-to-dip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 processed"));

    assert_eq!(&env.rows("field.csv")[0][..2], &["40", "130"]);
}
