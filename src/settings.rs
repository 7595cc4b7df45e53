use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_URL: &str = "https://web.bdij.com.br/wiki/Project_talk:Minist%C3%A9rios";
pub const DEFAULT_ENDPOINT: &str = "https://web.bdij.com.br/query/sparql";
pub const DEFAULT_ENTITY_BASE: &str = "https://web.bdij.com.br/entity/";
const DEFAULT_CONFIG_FILE: &str = "bdij_tables";
const ENV_PREFIX: &str = "BDIJ";

/// How the table is post-processed and styled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Raw entity URIs, `N/A` for missing cells, plain wikitable.
    #[default]
    Plain,
    /// Entity URIs become wiki links, empty missing cells, sortable full-width table.
    Linked,
}

impl Profile {
    pub fn as_str(self) -> &'static str {
        match self {
            Profile::Plain => "plain",
            Profile::Linked => "linked",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub page_url: String,
    pub endpoint: String,
    /// CSS selector for the element holding the query.
    pub selector: String,
    pub output: PathBuf,
    pub profile: Profile,
    pub entity_base: String,
    pub link_namespace: String,
    pub user_agent: String,
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub page_url: Option<String>,
    pub endpoint: Option<String>,
    pub selector: Option<String>,
    pub output: Option<PathBuf>,
    pub profile: Option<Profile>,
}

impl Settings {
    /// Defaults, then the config file, then `BDIJ_*` variables, then `overrides`.
    ///
    /// Without an explicit `file`, `bdij_tables.{toml,json,yaml}` in the
    /// working directory is read when present.
    pub fn load(file: Option<&Path>, overrides: Overrides) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .set_default("page_url", DEFAULT_PAGE_URL)?
            .set_default("endpoint", DEFAULT_ENDPOINT)?
            .set_default("selector", "pre")?
            .set_default("output", "dump.txt")?
            .set_default("profile", Profile::default().as_str())?
            .set_default("entity_base", DEFAULT_ENTITY_BASE)?
            .set_default("link_namespace", "Item")?
            .set_default("user_agent", concat!("bdij_tables/", env!("CARGO_PKG_VERSION")))?;

        let builder = match file {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        builder
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .set_override_option("page_url", overrides.page_url)?
            .set_override_option("endpoint", overrides.endpoint)?
            .set_override_option("selector", overrides.selector)?
            .set_override_option(
                "output",
                overrides.output.map(|p| p.to_string_lossy().into_owned()),
            )?
            .set_override_option("profile", overrides.profile.map(Profile::as_str))?
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::{Mutex, MutexGuard};

    // `load` reads the process environment; tests touching it run one at a time.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Sets variables for the life of the guard.
    struct ScopedEnv(Vec<&'static str>);

    impl ScopedEnv {
        fn set(vars: &[(&'static str, &str)]) -> Self {
            for (k, v) in vars {
                std::env::set_var(k, v);
            }
            ScopedEnv(vars.iter().map(|(k, _)| *k).collect())
        }
    }

    impl Drop for ScopedEnv {
        fn drop(&mut self) {
            for k in &self.0 {
                std::env::remove_var(k);
            }
        }
    }

    #[test]
    fn defaults_apply_without_sources() {
        let _lock = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        // An explicit file must exist.
        assert!(Settings::load(Some(&missing), Overrides::default()).is_err());

        let s = Settings::load(None, Overrides::default()).unwrap();
        assert_eq!(s.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(s.selector, "pre");
        assert_eq!(s.profile, Profile::Plain);
        assert_eq!(s.link_namespace, "Item");
    }

    #[test]
    fn file_then_overrides() {
        let _lock = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "endpoint = \"http://localhost:9999/sparql\"\nprofile = \"linked\"\noutput = \"/tmp/from-file.txt\""
        )
        .unwrap();

        let s = Settings::load(Some(file.path()), Overrides::default()).unwrap();
        assert_eq!(s.endpoint, "http://localhost:9999/sparql");
        assert_eq!(s.profile, Profile::Linked);
        assert_eq!(s.output, PathBuf::from("/tmp/from-file.txt"));

        let s = Settings::load(
            Some(file.path()),
            Overrides {
                profile: Some(Profile::Plain),
                output: Some(PathBuf::from("out/table.txt")),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(s.profile, Profile::Plain);
        assert_eq!(s.output, PathBuf::from("out/table.txt"));
        assert_eq!(s.endpoint, "http://localhost:9999/sparql");
    }

    #[test]
    fn unknown_profile_is_rejected() {
        let _lock = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "profile = \"fancy\"").unwrap();
        assert!(Settings::load(Some(file.path()), Overrides::default()).is_err());
    }

    #[test]
    fn environment_beats_file_and_loses_to_overrides() {
        let _lock = env_lock();
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "endpoint = \"http://from-file/sparql\"\nselector = \"pre.sparql\""
        )
        .unwrap();

        let _env = ScopedEnv::set(&[
            ("BDIJ_ENDPOINT", "http://from-env/sparql"),
            ("BDIJ_PROFILE", "linked"),
            ("BDIJ_LINK_NAMESPACE", "Entidade"),
        ]);

        let s = Settings::load(Some(file.path()), Overrides::default()).unwrap();
        assert_eq!(s.endpoint, "http://from-env/sparql");
        assert_eq!(s.profile, Profile::Linked);
        assert_eq!(s.link_namespace, "Entidade");
        assert_eq!(s.selector, "pre.sparql");

        let s = Settings::load(
            Some(file.path()),
            Overrides {
                endpoint: Some("http://from-cli/sparql".to_string()),
                profile: Some(Profile::Plain),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(s.endpoint, "http://from-cli/sparql");
        assert_eq!(s.profile, Profile::Plain);
        assert_eq!(s.link_namespace, "Entidade");
    }
}
