use std::{env, path::PathBuf, str::FromStr};

use crate::{
  prelude::*,
  store::{File, Sql, Store},
  sv,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
  Sql { url: String, timeout: Duration },
  File { path: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Config {
  pub policy: Policy,
  pub backend: Backend,
  pub default_capacity: u32,
  pub uppercase_keys: bool,
  pub port: u16,
  /// Delay before a crashed service is restarted
  pub restart_delay: Duration,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      policy: Policy::Device,
      backend: Backend::Sql {
        url: String::from("sqlite:licenses.db?mode=rwc"),
        timeout: Duration::from_secs(5),
      },
      default_capacity: 2,
      uppercase_keys: false,
      port: 3000,
      restart_delay: Duration::from_secs(5),
    }
  }
}

fn var<T: FromStr>(name: &str) -> anyhow::Result<Option<T>>
where
  T::Err: std::fmt::Display,
{
  match env::var(name) {
    Ok(raw) if !raw.trim().is_empty() => raw
      .trim()
      .parse()
      .map(Some)
      .map_err(|err| anyhow::anyhow!("Invalid {name} `{raw}`: {err}")),
    _ => Ok(None),
  }
}

fn duration(name: &str) -> anyhow::Result<Option<Duration>> {
  match env::var(name) {
    Ok(raw) if !raw.trim().is_empty() => humantime::parse_duration(raw.trim())
      .map(Some)
      .with_context(|| format!("Invalid {name} `{raw}`")),
    _ => Ok(None),
  }
}

impl Config {
  pub fn from_env() -> anyhow::Result<Self> {
    let default = Self::default();

    let backend = match env::var("STORE").as_deref().unwrap_or("sql") {
      "file" => Backend::File {
        path: env::var("STORE_PATH")
          .unwrap_or_else(|_| "db.json".into())
          .into(),
      },
      "sql" => {
        let url = env::var("DATABASE_URL")
          .unwrap_or_else(|_| "sqlite:licenses.db?mode=rwc".into());
        let timeout =
          duration("DATABASE_TIMEOUT")?.unwrap_or(Duration::from_secs(5));
        Backend::Sql { url, timeout }
      }
      other => anyhow::bail!("Unknown STORE `{other}`, expected sql or file"),
    };

    let default_capacity =
      var("DEFAULT_CAPACITY")?.unwrap_or(default.default_capacity);
    if default_capacity == 0 {
      anyhow::bail!("DEFAULT_CAPACITY must be positive");
    }

    Ok(Self {
      policy: var("IDENTITY_MODE")?.unwrap_or(default.policy),
      backend,
      default_capacity,
      uppercase_keys: var("UPPERCASE_KEYS")?.unwrap_or(default.uppercase_keys),
      port: var("PORT")?.unwrap_or(default.port),
      restart_delay: duration("RESTART_DELAY")?
        .unwrap_or(default.restart_delay),
    })
  }
}

pub struct Services<'a> {
  pub admission: sv::Admission<'a>,
  pub keys: sv::Keys<'a>,
  pub bans: sv::Bans<'a>,
}

pub struct AppState {
  pub store: Arc<dyn Store>,
  pub secret: String,
  pub config: Config,
}

impl AppState {
  pub async fn new(secret: String, config: Config) -> Result<Self> {
    let store: Arc<dyn Store> = match &config.backend {
      Backend::Sql { url, timeout } => {
        Arc::new(Sql::connect(url, config.policy, Some(*timeout)).await?)
      }
      Backend::File { path } => {
        info!("Opening store {}", path.display());
        Arc::new(File::open(path.clone(), config.policy).await?)
      }
    };

    Ok(Self::with_store(store, secret, config))
  }

  pub fn with_store(
    store: Arc<dyn Store>,
    secret: String,
    config: Config,
  ) -> Self {
    Self { store, secret, config }
  }

  pub fn sv(&self) -> Services<'_> {
    Services {
      admission: sv::Admission::new(&*self.store),
      keys: sv::Keys::new(&*self.store, &self.config),
      bans: sv::Bans::new(&*self.store),
    }
  }
}
