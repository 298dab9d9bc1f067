use serde::{Deserialize, Serialize};

use crate::error::NotifyError;
use crate::types::Credential;

/// Global Notifo defaults, persisted by the build host.
///
/// Jobs that leave their own service user blank fall back to this pair, and
/// jobs with the append flag set pull in the global recipient list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Default Notifo service user
    pub service_user: String,

    /// API token paired with `service_user`
    pub api_token: String,

    /// Comma-separated default recipient list
    pub user_names: String,
}

impl GlobalConfig {
    /// Load the global defaults from environment variables.
    pub fn from_env() -> Result<Self, NotifyError> {
        dotenvy::dotenv().ok();

        Ok(Self {
            service_user: std::env::var("NOTIFO_SERVICE_USER").map_err(|_| {
                NotifyError::Config("NOTIFO_SERVICE_USER environment variable is required".into())
            })?,
            api_token: std::env::var("NOTIFO_API_TOKEN").map_err(|_| {
                NotifyError::Config("NOTIFO_API_TOKEN environment variable is required".into())
            })?,
            user_names: std::env::var("NOTIFO_USER_NAMES").unwrap_or_default(),
        })
    }
}

/// Per-job notification settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Job-level service user; blank means "use the global pair"
    pub service_user: String,

    /// Job-level API token, only meaningful alongside `service_user`
    pub api_token: String,

    /// Comma-separated job recipient list
    pub user_names: String,

    /// Also notify when the build succeeds (failures always notify)
    pub notify_on_success: bool,

    /// Append the global recipient list after the job's own
    pub append_global_user_names: bool,
}

/// Load/save surface for the global configuration.
///
/// The build host owns the persistence lifecycle: it loads the stored
/// configuration at startup and saves when the operator submits the global
/// settings form. This trait is what the publisher sees instead of a
/// process-wide mutable singleton.
pub trait ConfigStore {
    fn load(&self) -> Result<GlobalConfig, NotifyError>;

    fn save(&mut self, config: &GlobalConfig) -> Result<(), NotifyError>;
}

/// Store backed by environment variables.
///
/// Read-only: the environment is not a writable configuration surface, so
/// `save` reports that persistence belongs to the host.
#[derive(Debug, Default)]
pub struct EnvConfigStore;

impl ConfigStore for EnvConfigStore {
    fn load(&self) -> Result<GlobalConfig, NotifyError> {
        GlobalConfig::from_env()
    }

    fn save(&mut self, _config: &GlobalConfig) -> Result<(), NotifyError> {
        Err(NotifyError::Config(
            "global configuration is persisted by the build host, not the environment".into(),
        ))
    }
}

/// In-memory store for embedding hosts and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigStore {
    config: GlobalConfig,
}

impl MemoryConfigStore {
    pub fn new(config: GlobalConfig) -> Self {
        Self { config }
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<GlobalConfig, NotifyError> {
        Ok(self.config.clone())
    }

    fn save(&mut self, config: &GlobalConfig) -> Result<(), NotifyError> {
        self.config = config.clone();
        Ok(())
    }
}

/// Split a comma-separated recipient value into identifiers.
///
/// Whitespace around entries is trimmed, empty entries are dropped, order is
/// preserved, duplicates are kept.
pub fn split_user_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Effective credential + recipient list for one build-step invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub credential: Credential,
    pub recipients: Vec<String>,
}

impl ResolvedConfig {
    /// Resolve the effective configuration for a job.
    ///
    /// A blank job service user falls back to the global service user AND
    /// the global API token — the pair is a couple, never mixed. The
    /// recipient list is the job's own, with the global list appended after
    /// it when `append_global_user_names` is set. The global store is only
    /// consulted when one of those two paths needs it.
    pub fn resolve(job: &JobConfig, store: &dyn ConfigStore) -> Result<Self, NotifyError> {
        let blank_user = job.service_user.trim().is_empty();
        let global = if blank_user || job.append_global_user_names {
            Some(store.load()?)
        } else {
            None
        };

        let credential = match (blank_user, &global) {
            (true, Some(global)) => {
                Credential::new(global.service_user.clone(), global.api_token.clone())
            }
            _ => Credential::new(job.service_user.clone(), job.api_token.clone()),
        };

        let mut recipients = split_user_names(&job.user_names);
        if let (true, Some(global)) = (job.append_global_user_names, &global) {
            recipients.extend(split_user_names(&global.user_names));
        }

        tracing::debug!(
            service_user = %credential.service_user,
            recipients = recipients.len(),
            "Resolved notification configuration"
        );

        Ok(Self {
            credential,
            recipients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global_store() -> MemoryConfigStore {
        MemoryConfigStore::new(GlobalConfig {
            service_user: "global-user".to_string(),
            api_token: "global-token".to_string(),
            user_names: "b, c".to_string(),
        })
    }

    #[test]
    fn test_split_trims_and_drops_empties() {
        assert_eq!(split_user_names(" a, b ,,c "), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_split_keeps_duplicates_and_order() {
        assert_eq!(split_user_names("x,y,x"), vec!["x", "y", "x"]);
    }

    #[test]
    fn test_split_empty_input() {
        assert!(split_user_names("").is_empty());
        assert!(split_user_names(" , ,").is_empty());
    }

    #[test]
    fn test_blank_job_user_falls_back_to_global_pair() {
        let job = JobConfig {
            service_user: "  ".to_string(),
            api_token: "job-token".to_string(),
            user_names: "a".to_string(),
            ..Default::default()
        };
        let resolved = ResolvedConfig::resolve(&job, &global_store()).unwrap();

        // The global user comes with the global token, never the job's.
        assert_eq!(
            resolved.credential,
            Credential::new("global-user", "global-token")
        );
    }

    #[test]
    fn test_job_user_keeps_job_token() {
        let job = JobConfig {
            service_user: "job-user".to_string(),
            api_token: "job-token".to_string(),
            user_names: "a".to_string(),
            ..Default::default()
        };
        let resolved = ResolvedConfig::resolve(&job, &global_store()).unwrap();

        assert_eq!(resolved.credential, Credential::new("job-user", "job-token"));
        assert_eq!(resolved.recipients, vec!["a"]);
    }

    #[test]
    fn test_append_global_user_names_job_list_first() {
        let job = JobConfig {
            service_user: "job-user".to_string(),
            api_token: "job-token".to_string(),
            user_names: "a".to_string(),
            append_global_user_names: true,
            ..Default::default()
        };
        let resolved = ResolvedConfig::resolve(&job, &global_store()).unwrap();

        assert_eq!(resolved.recipients, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_self_contained_job_never_touches_store() {
        struct FailingStore;
        impl ConfigStore for FailingStore {
            fn load(&self) -> Result<GlobalConfig, NotifyError> {
                Err(NotifyError::Config("store should not be consulted".into()))
            }
            fn save(&mut self, _config: &GlobalConfig) -> Result<(), NotifyError> {
                Err(NotifyError::Config("store should not be consulted".into()))
            }
        }

        let job = JobConfig {
            service_user: "job-user".to_string(),
            api_token: "job-token".to_string(),
            user_names: "a,b".to_string(),
            ..Default::default()
        };
        let resolved = ResolvedConfig::resolve(&job, &FailingStore).unwrap();
        assert_eq!(resolved.recipients, vec!["a", "b"]);
    }

    #[test]
    fn test_store_load_error_propagates() {
        let job = JobConfig {
            // Blank user forces a global load.
            user_names: "a".to_string(),
            ..Default::default()
        };

        struct BrokenStore;
        impl ConfigStore for BrokenStore {
            fn load(&self) -> Result<GlobalConfig, NotifyError> {
                Err(NotifyError::Config("boom".into()))
            }
            fn save(&mut self, _config: &GlobalConfig) -> Result<(), NotifyError> {
                Ok(())
            }
        }

        assert!(ResolvedConfig::resolve(&job, &BrokenStore).is_err());
    }

    #[test]
    fn test_memory_store_round_trip() {
        let mut store = MemoryConfigStore::default();
        let config = GlobalConfig {
            service_user: "u".to_string(),
            api_token: "t".to_string(),
            user_names: "a".to_string(),
        };
        store.save(&config).unwrap();
        assert_eq!(store.load().unwrap(), config);
    }

    #[test]
    fn test_env_store_refuses_save() {
        let mut store = EnvConfigStore;
        assert!(store.save(&GlobalConfig::default()).is_err());
    }
}
