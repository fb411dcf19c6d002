use config::{Config, ConfigError, Environment, File, Map};
use kapso_client::{AuthScheme, KapsoClient};
use kapso_supabase::SupabaseLeadStore;
use serde::{Deserialize, Serialize};
use std::env;

/// Plain environment variables the Kapso and Supabase tooling uses,
/// mapped onto configuration keys. They win over every other source.
const PROVIDER_ENV: [(&str, &str); 6] = [
    ("KAPSO_API_KEY", "kapso.api_key"),
    ("KAPSO_PHONE_NUMBER_ID", "kapso.phone_number_id"),
    ("KAPSO_BASE_URL", "kapso.base_url"),
    ("KAPSO_WEBHOOK_VERIFY_TOKEN", "webhook.verify_token"),
    ("SUPABASE_URL", "supabase.url"),
    ("SUPABASE_SERVICE_ROLE_KEY", "supabase.service_role_key"),
];

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Kapso provider configuration
    pub kapso: KapsoConfig,
    /// Webhook endpoint configuration
    pub webhook: WebhookConfig,
    /// Lead datastore configuration
    pub supabase: SupabaseConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
}

/// Kapso provider configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct KapsoConfig {
    /// API key (required)
    pub api_key: Option<String>,
    /// Sending phone number id (required by the sender demo)
    pub phone_number_id: Option<String>,
    /// API base URL (default: https://api.kapso.ai/meta/whatsapp)
    pub base_url: String,
    /// Graph API version path segment; empty disables it (default: v21.0)
    pub api_version: String,
    /// Send the key as `Authorization: Bearer` instead of `X-API-Key` (default: false)
    pub bearer_auth: bool,
}

/// Webhook endpoint configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WebhookConfig {
    /// Route path (default: /webhook)
    pub path: String,
    /// Expected `hub.verify_token` (default: KAPSO_WEBHOOK_TOKEN)
    pub verify_token: String,
}

/// Supabase configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SupabaseConfig {
    /// Project URL (required by the webhook)
    pub url: Option<String>,
    /// Service-role key (required by the webhook)
    pub service_role_key: Option<String>,
    /// Leads table (default: leads)
    pub table: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for KapsoConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            phone_number_id: None,
            base_url: kapso_client::DEFAULT_BASE_URL.to_string(),
            api_version: kapso_client::DEFAULT_API_VERSION.to_string(),
            bearer_auth: false,
        }
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            path: "/webhook".to_string(),
            verify_token: kapso_web_generic::DEFAULT_VERIFY_TOKEN.to_string(),
        }
    }
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            service_role_key: None,
            table: kapso_supabase::DEFAULT_TABLE.to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

fn require<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str, ConfigError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ConfigError::NotFound(what.to_string()))
}

impl KapsoConfig {
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        require(&self.api_key, "kapso.api_key (KAPSO_API_KEY)")
    }

    pub fn require_phone_number_id(&self) -> Result<&str, ConfigError> {
        require(&self.phone_number_id, "kapso.phone_number_id (KAPSO_PHONE_NUMBER_ID)")
    }

    /// Provider client for these settings.
    pub fn client(&self) -> Result<KapsoClient, ConfigError> {
        let auth = if self.bearer_auth {
            AuthScheme::Bearer
        } else {
            AuthScheme::ApiKeyHeader
        };
        Ok(
            KapsoClient::with_base_url(self.require_api_key()?, self.base_url.clone())
                .api_version(Some(self.api_version.clone()))
                .auth_scheme(auth),
        )
    }
}

impl SupabaseConfig {
    /// Lead store for these settings.
    pub fn store(&self) -> Result<SupabaseLeadStore, ConfigError> {
        let url = require(&self.url, "supabase.url (SUPABASE_URL)")?;
        let key = require(
            &self.service_role_key,
            "supabase.service_role_key (SUPABASE_SERVICE_ROLE_KEY)",
        )?;
        Ok(SupabaseLeadStore::new(url, key).with_table(self.table.clone()))
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::build(None)
    }

    /// Same layering as [`AppConfig::load`], reading variables from `vars`
    /// instead of the process environment.
    pub fn from_vars(vars: Map<String, String>) -> Result<Self, ConfigError> {
        Self::build(Some(vars))
    }

    fn build(vars: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let lookup = |key: &str| match &vars {
            Some(map) => map.get(key).cloned(),
            None => env::var(key).ok(),
        };
        let run_mode = lookup("RUN_MODE").unwrap_or_else(|| "development".into());

        let mut builder = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with KAPSOKIT__)
            .add_source(
                Environment::with_prefix("KAPSOKIT")
                    .separator("__")
                    .try_parsing(true)
                    .source(vars.clone()),
            );

        for (var, key) in PROVIDER_ENV {
            builder = builder.set_override_option(key, lookup(var).filter(|v| !v.is_empty()))?;
        }

        builder.build()?.try_deserialize()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            kapso: KapsoConfig::default(),
            webhook: WebhookConfig::default(),
            supabase: SupabaseConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Map<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_vars(Map::new()).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.kapso.base_url, "https://api.kapso.ai/meta/whatsapp");
        assert_eq!(config.kapso.api_version, "v21.0");
        assert_eq!(config.webhook.path, "/webhook");
        assert_eq!(config.webhook.verify_token, "KAPSO_WEBHOOK_TOKEN");
        assert_eq!(config.supabase.table, "leads");
        assert!(config.kapso.api_key.is_none());
    }

    #[test]
    fn provider_variables_are_mapped() {
        let config = AppConfig::from_vars(vars(&[
            ("KAPSO_API_KEY", "key-1"),
            ("KAPSO_PHONE_NUMBER_ID", "pnid-1"),
            ("KAPSO_BASE_URL", "http://localhost:9000"),
            ("SUPABASE_URL", "https://xyz.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "service"),
            ("KAPSO_WEBHOOK_VERIFY_TOKEN", "verify-me"),
        ]))
        .unwrap();

        assert_eq!(config.kapso.require_api_key().unwrap(), "key-1");
        assert_eq!(config.kapso.require_phone_number_id().unwrap(), "pnid-1");
        assert_eq!(config.kapso.base_url, "http://localhost:9000");
        assert_eq!(config.webhook.verify_token, "verify-me");

        let client = config.kapso.client().unwrap();
        assert_eq!(client.messages_url("p"), "http://localhost:9000/v21.0/p/messages");
        let store = config.supabase.store().unwrap();
        assert_eq!(store.base_url, "https://xyz.supabase.co");
    }

    #[test]
    fn prefixed_variables_override_defaults() {
        let config = AppConfig::from_vars(vars(&[
            ("KAPSOKIT__SERVER__PORT", "8080"),
            ("KAPSOKIT__LOGGING__FORMAT", "pretty"),
            ("KAPSOKIT__KAPSO__BEARER_AUTH", "true"),
        ]))
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.format, "pretty");
        assert!(config.kapso.bearer_auth);
    }

    #[test]
    fn missing_required_values_are_not_found_errors() {
        let config = AppConfig::from_vars(vars(&[("KAPSO_API_KEY", "")])).unwrap();
        assert!(matches!(
            config.kapso.require_api_key(),
            Err(ConfigError::NotFound(_))
        ));
        assert!(matches!(config.kapso.client(), Err(ConfigError::NotFound(_))));
        assert!(matches!(config.supabase.store(), Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn empty_api_version_uses_bare_path() {
        let mut config = AppConfig::default();
        config.kapso.api_key = Some("k".into());
        config.kapso.api_version = String::new();
        let client = config.kapso.client().unwrap();
        assert!(client.api_version.is_none());
    }
}
