use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::telemetry::LogFormat;

#[derive(Parser, Debug, Default)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Address to bind
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Storage backend (`sqlite` or `postgres`)
    #[arg(long, env = "PERSISTENCE_PROVIDER")]
    pub provider: Option<String>,

    /// Connection string of the run store
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Disable timeout middleware
    #[arg(long, env = "TIMEOUT_DISABLED")]
    pub timeout_disabled: Option<bool>,

    /// Print the GraphQL schema and exit
    #[arg(long)]
    pub print_schema: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub graphql: GraphqlConfig,
    pub resilience: ResilienceConfig,
    pub persistence: PersistenceConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    /// Origins allowed by CORS. Empty means any origin.
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GraphqlConfig {
    pub path: String,
    pub graphiql_enabled: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ResilienceConfig {
    pub timeout_disabled: bool,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PersistenceConfig {
    pub provider: String,
    pub database_url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    pub format: LogFormat,
}

impl AppConfig {
    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Self::from_cli(&cli)
    }

    /// Priority: CLI flag (or its env var) > `RUNS_` env vars > config file > defaults.
    pub fn from_cli(cli: &Cli) -> Result<Self, config::ConfigError> {
        let mut builder = Config::builder()
            .set_default("server.port", 4141)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.cors_allowed_origins", Vec::<String>::new())?
            .set_default("graphql.path", "/graphql")?
            .set_default("graphql.graphiql_enabled", true)?
            .set_default("resilience.timeout_disabled", false)?
            .set_default("resilience.request_timeout_secs", 30)?
            .set_default("persistence.provider", "sqlite")?
            .set_default("persistence.database_url", "sqlite://session_store.db")?
            .set_default("persistence.max_connections", 5)?
            .set_default("persistence.run_migrations", false)?
            .set_default("telemetry.format", "compact")?;

        builder = match &cli.config {
            Some(path) => builder.add_source(File::with_name(path)),
            None => builder.add_source(File::with_name("config").required(false)),
        };

        // E.g. RUNS_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("RUNS")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        if let Some(host) = &cli.host {
            builder = builder.set_override("server.host", host.as_str())?;
        }
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(provider) = &cli.provider {
            builder = builder.set_override("persistence.provider", provider.as_str())?;
        }
        if let Some(url) = &cli.database_url {
            builder = builder.set_override("persistence.database_url", url.as_str())?;
        }
        if let Some(td) = cli.timeout_disabled {
            builder = builder.set_override("resilience.timeout_disabled", td)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
