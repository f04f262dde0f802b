use super::args::*;
use anyhow::{bail, Context};
use consent_core::config::StorageBackend;
use consent_core::{ConsentConfig, ConsentStore};
use std::path::Path;

pub(crate) mod output;
pub(crate) mod purge;
pub(crate) mod query;
pub(crate) mod record;

use crate::exit_codes::EXIT_SUCCESS;

/// Resolve the effective configuration. `--db` selects the sqlite backend at that path.
///
/// The memory backend is refused: every invocation is a fresh process, so
/// writes would be reported as successful and then lost.
pub(crate) fn load_config(
    config: Option<&Path>,
    db: Option<&Path>,
) -> anyhow::Result<ConsentConfig> {
    let mut cfg = ConsentConfig::discover(config)?;
    if let Some(db) = db {
        cfg.storage.backend = StorageBackend::Sqlite;
        cfg.storage.path = db.to_path_buf();
    }
    if cfg.storage.backend == StorageBackend::Memory {
        bail!(
            "storage.backend `memory` does not persist between `consent` invocations; \
             use `sqlite` or pass --db"
        );
    }
    Ok(cfg)
}

pub fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    if matches!(cli.cmd, Command::Version) {
        println!("{}", env!("CARGO_PKG_VERSION"));
        return Ok(EXIT_SUCCESS);
    }

    let config = load_config(cli.config.as_deref(), cli.db.as_deref())?;
    crate::logging::init_logging(&config.logging)?;
    let store = ConsentStore::from_config(&config).with_context(|| {
        format!(
            "failed to open consent store at {}",
            config.storage.path.display()
        )
    })?;

    let format = cli.format;
    match cli.cmd {
        Command::Add(args) => record::add(&store, &args, format),
        Command::Update(args) => record::update(&store, &args, format),
        Command::Remove(pair) => record::remove(&store, &pair, format),
        Command::Exists(pair) => query::exists(&store, &pair, format),
        Command::Check(pair) => query::check(&store, &pair, format),
        Command::Show(pair) => query::show(&store, &pair, format),
        Command::List(args) => query::list(&store, &args, format),
        Command::PurgeUser(args) => purge::run(&store, &args, format),
        Command::Version => Ok(EXIT_SUCCESS),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn db_flag_overrides_configured_backend() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("consent.yaml");
        std::fs::write(&cfg_path, "storage:\n  backend: memory\n").unwrap();

        let db = dir.path().join("override.db");
        let cfg = load_config(Some(&cfg_path), Some(&db)).unwrap();
        assert_eq!(cfg.storage.backend, StorageBackend::Sqlite);
        assert_eq!(cfg.storage.path, db);
    }

    #[test]
    fn memory_backend_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let cfg_path = dir.path().join("consent.yaml");
        std::fs::write(&cfg_path, "storage:\n  backend: memory\n").unwrap();

        let err = load_config(Some(&cfg_path), None).unwrap_err();
        assert!(err.to_string().contains("does not persist"));
    }

    #[test]
    fn explicit_missing_config_is_an_error() {
        let missing = PathBuf::from("/nonexistent/consent.yaml");
        assert!(load_config(Some(&missing), None).is_err());
    }
}
