use std::path::{Path, PathBuf};

use crate::singleton::LazySingleton;

static CONFIG_DIR: LazySingleton<PathBuf> = LazySingleton::new();

#[derive(Default, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub demo: DemoConfig,
}

/// Who gets subscribed and what gets sent by `patterns demo`.
#[derive(serde::Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DemoConfig {
    pub subscribers: Vec<String>,
    pub first_message: String,
    pub second_message: String,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            subscribers: vec![
                "nirojshah@gmail.com".to_string(),
                "suraj@gmail.com".to_string(),
            ],
            first_message: "new product came".to_string(),
            second_message: "ehh boi fooled.".to_string(),
        }
    }
}

/// Where `config.toml` is looked up, fixed by the first call in the process.
///
/// `home` comes from `--home` or `PATTERNS_HOME`. Without it the XDG config
/// directory is used, then `~/.config`, then the working directory.
pub fn config_dir(home: Option<&Path>) -> &'static Path {
    CONFIG_DIR.get_or_init(|| resolve_config_dir(home))
}

fn resolve_config_dir(home: Option<&Path>) -> PathBuf {
    if let Some(home) = home {
        return home.join("config");
    }

    let base = std::env::var_os("XDG_CONFIG_HOME")
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .unwrap_or_default();

    base.join("patterns")
}

pub fn load(home: Option<&Path>) -> anyhow::Result<Config> {
    let path = config_dir(home).join("config.toml");

    match std::fs::read_to_string(&path) {
        Ok(contents) => parse(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Config::default()),
        Err(e) => Err(e.into()),
    }
}

fn parse(contents: &str) -> anyhow::Result<Config> {
    Ok(toml::from_str(contents)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse("").unwrap();
        assert!(!config.debug);
        assert_eq!(
            config.demo.subscribers,
            vec!["nirojshah@gmail.com", "suraj@gmail.com"]
        );
        assert_eq!(config.demo.first_message, "new product came");
        assert_eq!(config.demo.second_message, "ehh boi fooled.");
    }

    #[test]
    fn test_partial_demo_section_keeps_other_defaults() {
        let config = parse(
            r#"
debug = true

[demo]
subscribers = ["ops@example.com"]
"#,
        )
        .unwrap();
        assert!(config.debug);
        assert_eq!(config.demo.subscribers, vec!["ops@example.com"]);
        assert_eq!(config.demo.first_message, "new product came");
    }

    #[test]
    fn test_kebab_case_keys() {
        let config = parse(
            r#"
[demo]
first-message = "sale"
second-message = "sale over"
"#,
        )
        .unwrap();
        assert_eq!(config.demo.first_message, "sale");
        assert_eq!(config.demo.second_message, "sale over");
    }

    #[test]
    fn test_home_override_wins() {
        let dir = resolve_config_dir(Some(Path::new("/srv/patterns")));
        assert_eq!(dir, Path::new("/srv/patterns/config"));
    }

    #[test]
    fn test_default_dir_is_named_after_the_tool() {
        assert!(resolve_config_dir(None).ends_with("patterns"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(parse("debug = ").is_err());
    }
}
