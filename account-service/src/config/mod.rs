use secrecy::Secret;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth_provider: AuthProviderSettings,
    pub database: DatabaseSettings,
    pub paddle: PaddleSettings,
    pub bridge: BridgeSettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Origin the portal is served from. Inbound bridge messages must carry
    /// this exact origin or they are discarded.
    pub public_origin: String,
}

#[derive(Deserialize, Clone)]
pub struct AuthProviderSettings {
    /// Base URL of the GoTrue-compatible authentication provider.
    pub url: String,
    /// Publishable API key sent with every provider request.
    pub anon_key: Secret<String>,
}

#[derive(Deserialize, Clone)]
pub struct DatabaseSettings {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Deserialize, Clone)]
pub struct PaddleSettings {
    #[serde(default = "default_paddle_api_base_url")]
    pub api_base_url: String,
    pub api_key: Secret<String>,
}

fn default_paddle_api_base_url() -> String {
    "https://sandbox-api.paddle.com".to_string()
}

#[derive(Deserialize, Clone)]
pub struct BridgeSettings {
    /// Endpoint of the external session consumer, if one is attached.
    /// Leaving it unset turns outbound broadcasts into no-ops.
    pub consumer_url: Option<String>,
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    // Works both from the workspace root and from inside account-service
    let configuration_directory = if base_path.ends_with("account-service") {
        base_path.join("config")
    } else {
        base_path.join("account-service").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
