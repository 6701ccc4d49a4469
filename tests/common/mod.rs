//! Shared test helpers for integration tests
//!
//! Every test runs against its own temp directory: config, mapping store and type
//! store all live there, so tests never see the user's real settings.

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Environment variables that would leak user settings into a test run
const CLEARED_VARS: [&str; 5] = [
    "DST_DECIMAL_PLACES",
    "DST_CONTINUE_ON_RANGE_WARNING",
    "DST_GEO_TYPE_STORAGE_MODE",
    "DST_DEBUG_MODE",
    "RUST_LOG",
];

pub struct TestEnv {
    pub dir: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// A dst command isolated to this environment
    pub fn dst(&self) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("dst"));
        cmd.current_dir(self.dir.path())
            .env("DST_CONFIG", self.path("config.yaml"))
            .env("DST_MAPPING_STORE", self.path("mappings.yaml"))
            .env("DST_TYPE_STORE", self.path("types.yaml"));
        for var in CLEARED_VARS {
            cmd.env_remove(var);
        }
        cmd
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, content).unwrap();
        path
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.path(name)).unwrap()
    }

    /// Parsed CSV rows (header excluded)
    pub fn rows(&self, name: &str) -> Vec<Vec<String>> {
        let mut reader = csv::Reader::from_path(self.path(name)).unwrap();
        reader
            .records()
            .map(|r| r.unwrap().iter().map(|s| s.to_string()).collect())
            .collect()
    }

    /// Write a CSV and save a field mapping for it through `fields configure`
    pub fn configured_csv(&self, name: &str, content: &str, assignments: &[&str]) -> PathBuf {
        let path = self.write(name, content);
        let mut cmd = self.dst();
        cmd.args(["fields", "configure", name]);
        for assignment in assignments {
            cmd.args(["--set", assignment]);
        }
        cmd.assert().success();
        path
    }
}

/// A dataset whose columns auto-detect to the three required roles
pub const STANDARD_CSV: &str = "\
id,strike_azimuth,dip_azimuth,dip_value,geo_type,notes
1,0,,30,1,first
2,45,,40,2,
3,,,50,,missing strike
";
