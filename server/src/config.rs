use serde::{Deserialize, Serialize};
use signet_auth::AuthConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub http_port: u16,
    pub https_port: u16,
    pub enable_http: bool,
    pub enable_https: bool,
    pub ssl_cert_path: Option<String>,
    pub ssl_key_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory holding `css/`, `js/` and the fork-me ribbon
    #[serde(default = "default_assets_dir")]
    pub dir: String,

    /// Status page template; `{dir}/index.html` when unset
    pub template: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_assets_dir() -> String {
    "server/static".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            dir: default_assets_dir(),
            template: None,
        }
    }
}

impl AssetsConfig {
    pub fn template_path(&self) -> String {
        self.template
            .clone()
            .unwrap_or_else(|| format!("{}/index.html", self.dir.trim_end_matches('/')))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            http_port: 3002,
            https_port: 3443,
            enable_http: true,
            enable_https: false,
            ssl_cert_path: None,
            ssl_key_path: None,
        }
    }
}

impl Config {
    /// Layered load: optional `signet_config.toml`, then `SIGNET__*` environment
    /// variables, then the plain `cookie_password` / `{provider}_id` /
    /// `{provider}_secret` variables for anything still unset.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("signet_config")
    }

    pub fn load_from(file: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name(file).required(false))
            .add_source(config::Environment::with_prefix("SIGNET").separator("__"))
            .build()?;

        let mut config: Self = config.try_deserialize()?;
        config.auth = config.auth.with_env_fallbacks();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.http_port, 3002);
        assert!(config.server.enable_http);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.assets.template_path(), "server/static/index.html");
        assert_eq!(config.auth.providers.len(), 4);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
http_port = 8080

[assets]
dir = "/srv/signet/"

[auth]
location = "https://signet.example.com"

[[auth.providers]]
name = "github"

[[auth.providers]]
name = "auth0"
config = {{ domain = "tenant.auth0.com" }}

[auth.credentials.github]
client_id = "file-id"
client_secret = "file-secret"
"#
        )
        .unwrap();

        let path = file.path().to_str().unwrap();
        let config = Config::load_from(path.trim_end_matches(".toml")).unwrap();

        assert_eq!(config.server.http_port, 8080);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.assets.template_path(), "/srv/signet/index.html");
        assert_eq!(config.auth.location, "https://signet.example.com");
        let names: Vec<_> = config.auth.providers.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["github", "auth0"]);
        assert_eq!(
            config.auth.providers[1].config.get("domain"),
            Some(&serde_json::Value::from("tenant.auth0.com"))
        );
        assert_eq!(
            config.auth.client_credentials("github"),
            Some(("file-id", "file-secret"))
        );
    }
}
