use super::error::{SupabaseDaoError, SupabaseResult};

/// Runtime configuration describing how to reach the hosted Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://xyzcompany.supabase.co`.
    pub base_url: String,
    /// Service-role key used by the backend for table access.
    pub service_key: String,
}

impl SupabaseConfig {
    /// Construct a configuration from explicit project URL and key.
    pub fn new(base_url: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            service_key: service_key.into(),
        }
    }

    /// Build a configuration by reading the expected environment variables.
    pub fn from_env() -> SupabaseResult<Self> {
        let base_url = std::env::var("SUPABASE_URL").map_err(|_| {
            SupabaseDaoError::MissingEnvVar {
                var: "SUPABASE_URL",
            }
        })?;
        let service_key = std::env::var("SUPABASE_SERVICE_KEY").map_err(|_| {
            SupabaseDaoError::MissingEnvVar {
                var: "SUPABASE_SERVICE_KEY",
            }
        })?;

        Ok(Self::new(base_url, service_key))
    }

    /// Whether the environment names a Supabase project at all.
    pub fn is_configured() -> bool {
        std::env::var_os("SUPABASE_URL").is_some_and(|value| !value.is_empty())
    }
}
