#![allow(dead_code)]

use tempfile::TempDir;

fn patterns_bin() -> &'static str {
    env!("CARGO_BIN_EXE_patterns")
}

/// An isolated home directory for running the CLI.
pub struct HomeFixture {
    pub home: TempDir,
}

impl HomeFixture {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().unwrap(),
        }
    }

    pub fn config_path(&self) -> std::path::PathBuf {
        self.home.path().join("config/config.toml")
    }

    pub fn write_config(&self, contents: &str) {
        let path = self.config_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    /// Build an assert_cmd::Command that reads config from this home.
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::new(patterns_bin());
        cmd.env("PATTERNS_HOME", self.home.path());
        cmd.env_remove("PATTERNS_DEBUG");
        cmd.env_remove("XDG_CONFIG_HOME");
        cmd
    }
}

pub fn stdout_lines(output: &std::process::Output) -> Vec<String> {
    String::from_utf8(output.stdout.clone())
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}
