use anyhow::{bail, Context, Result};
use cbrest_rs::{
    BucketSettings, Client, ClusterInitSettings, ConnectionConfig, QueryParams, QueryRequest,
    UserSettings,
};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

mod telemetry;

const DEFAULT_CONFIG_PATH: &str = "cbrest.json";

#[derive(Parser, Debug)]
#[command(
    name = "cbrest",
    version,
    about = "Cluster administration and query CLI",
    long_about = None
)]
struct Cli {
    /// JSON connection config (defaults to ./cbrest.json when present)
    #[arg(long)]
    config: Option<PathBuf>,

    #[arg(long, help = "http or https")]
    scheme: Option<String>,
    #[arg(long)]
    host: Option<String>,
    #[arg(long, help = "Admin/data port (default 8091)")]
    admin_port: Option<u16>,
    #[arg(long, help = "Query service port (default 8093)")]
    query_port: Option<u16>,
    #[arg(long, short = 'u')]
    username: Option<String>,
    #[arg(long, short = 'p')]
    password: Option<String>,

    /// Also write JSON logs to this directory
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Check whether the admin port answers")]
    Ping,
    #[command(about = "Bootstrap a fresh single-node cluster")]
    InitCluster {
        #[arg(long, value_delimiter = ',', default_value = "kv,n1ql,index")]
        services: Vec<String>,
        #[arg(long, default_value_t = 1024)]
        memory_quota_mb: u64,
        #[arg(long, default_value = "forestdb")]
        index_storage_mode: String,
    },
    /// Bucket management
    #[command(subcommand)]
    Bucket(BucketCommand),
    /// Local RBAC users
    #[command(subcommand)]
    User(UserCommand),
    /// Document access
    #[command(subcommand)]
    Doc(DocCommand),
    #[command(about = "Run a N1QL statement")]
    Query {
        statement: String,
        #[arg(
            long = "arg",
            value_parser = parse_json_arg,
            allow_hyphen_values = true,
            help = "Positional parameter ($1, $2, ...), as JSON"
        )]
        args: Vec<Value>,
        #[arg(
            long = "param",
            value_parser = parse_key_value,
            help = "Named parameter NAME=JSON, e.g. '$r=9.5'"
        )]
        params: Vec<(String, String)>,
    },
}

#[derive(Subcommand, Debug)]
enum BucketCommand {
    Create {
        name: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        ram_quota_mb: Option<u64>,
        #[arg(long)]
        proxy_port: Option<u16>,
        #[arg(long = "set", value_parser = parse_key_value, help = "Extra REST field KEY=VALUE")]
        fields: Vec<(String, String)>,
    },
    Get {
        name: String,
    },
    Edit {
        name: String,
        #[arg(long = "set", value_parser = parse_key_value, required = true)]
        fields: Vec<(String, String)>,
    },
    Delete {
        name: String,
    },
    List,
    Flush {
        name: String,
    },
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        id: String,
        #[arg(long)]
        password: String,
        #[arg(long = "role", value_delimiter = ',', required = true)]
        roles: Vec<String>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum DocCommand {
    Get {
        bucket: String,
        key: String,
    },
    Insert {
        bucket: String,
        key: String,
        #[arg(value_parser = parse_json_strict)]
        document: Value,
    },
    InsertFile {
        bucket: String,
        key: String,
        path: PathBuf,
    },
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    raw.split_once('=')
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got `{}`", raw))
}

/// JSON if it parses, otherwise the raw text as a string
fn parse_json_arg(raw: &str) -> std::result::Result<Value, String> {
    Ok(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

fn parse_json_strict(raw: &str) -> std::result::Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

/// Precedence: flags > config file > defaults
fn load_config(cli: &Cli) -> Result<ConnectionConfig> {
    let mut config = match &cli.config {
        Some(path) => ConnectionConfig::load(&path.to_string_lossy())
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => load_default_config(Path::new(DEFAULT_CONFIG_PATH)),
    };

    if let Some(scheme) = &cli.scheme {
        config.scheme = scheme.clone();
    }
    if let Some(host) = &cli.host {
        config.host = host.clone();
    }
    if let Some(port) = cli.admin_port {
        config.admin_port = port;
    }
    if let Some(port) = cli.query_port {
        config.query_port = port;
    }
    if let Some(username) = &cli.username {
        config.username = username.clone();
    }
    if let Some(password) = &cli.password {
        config.password = password.clone();
    }

    Ok(config)
}

/// A missing default file is normal; an unreadable one is worth a warning
fn load_default_config(path: &Path) -> ConnectionConfig {
    if !path.exists() {
        tracing::debug!("No {} found, using defaults", path.display());
        return ConnectionConfig::default();
    }
    ConnectionConfig::load(&path.to_string_lossy()).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load {}, using defaults", path.display());
        ConnectionConfig::default()
    })
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn run(client: &Client, command: Commands) -> Result<()> {
    match command {
        Commands::Ping => {
            if !client.is_connected().await {
                bail!("Cluster at {} is unreachable", client.connection().admin_base_url());
            }
            println!("Cluster at {} is reachable", client.connection().admin_base_url());
        }
        Commands::InitCluster {
            services,
            memory_quota_mb,
            index_storage_mode,
        } => {
            let settings = ClusterInitSettings {
                services,
                memory_quota_mb,
                index_storage_mode,
            };
            client.init_cluster_with(&settings).await?;
            tracing::info!("✓ Cluster setup sequence sent");
        }
        Commands::Bucket(command) => run_bucket(client, command).await?,
        Commands::User(command) => match command {
            UserCommand::Create { id, password, roles } => {
                client
                    .create_user(&id, &UserSettings::new(password, roles))
                    .await?;
                tracing::info!("✓ User {} saved", id);
            }
            UserCommand::Delete { id } => {
                client.delete_user(&id).await?;
                tracing::info!("✓ User {} deleted", id);
            }
        },
        Commands::Doc(command) => match command {
            DocCommand::Get { bucket, key } => {
                print_json(&client.get_document(&bucket, &key).await?)?;
            }
            DocCommand::Insert {
                bucket,
                key,
                document,
            } => {
                client.insert_document(&bucket, &key, &document).await?;
                tracing::info!("✓ Document {} stored in {}", key, bucket);
            }
            DocCommand::InsertFile { bucket, key, path } => {
                client.insert_document_from_file(&bucket, &key, &path).await?;
                tracing::info!("✓ Document {} stored in {} from {}", key, bucket, path.display());
            }
        },
        Commands::Query {
            statement,
            args,
            params,
        } => {
            let named: Map<String, Value> = params
                .into_iter()
                .map(|(name, raw)| {
                    let value = serde_json::from_str(&raw).unwrap_or(Value::String(raw));
                    (name, value)
                })
                .collect();
            let params = QueryParams::resolve(Some(args), Some(named));
            let request = QueryRequest::new(statement, params);
            let results = client.try_n1ql_query(&request).await?;
            print_json(&Value::Array(results))?;
        }
    }

    Ok(())
}

async fn run_bucket(client: &Client, command: BucketCommand) -> Result<()> {
    match command {
        BucketCommand::Create {
            name,
            password,
            ram_quota_mb,
            proxy_port,
            fields,
        } => {
            let mut settings = BucketSettings::new(name.clone(), password);
            if let Some(quota) = ram_quota_mb {
                settings = settings.with_ram_quota_mb(quota);
            }
            if let Some(port) = proxy_port {
                settings = settings.with_proxy_port(port);
            }
            let settings = settings.with_overrides(fields)?;
            client.create_bucket(&settings).await?;
            tracing::info!("✓ Bucket {} created", name);
        }
        BucketCommand::Get { name } => print_json(&client.get_bucket(&name).await?)?,
        BucketCommand::Edit { name, fields } => {
            client.edit_bucket(&name, fields).await?;
            tracing::info!("✓ Bucket {} updated", name);
        }
        BucketCommand::Delete { name } => {
            client.delete_bucket(&name).await?;
            tracing::info!("✓ Bucket {} deleted", name);
        }
        BucketCommand::List => print_json(&Value::Array(client.list_buckets().await?))?,
        BucketCommand::Flush { name } => {
            client.flush_bucket(&name).await?;
            tracing::info!("✓ Bucket {} flushed", name);
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Keep the guard alive so file logs are flushed on exit
    let _guard = telemetry::init_telemetry(cli.log_dir.as_deref())?;

    let config = load_config(&cli)?;
    tracing::debug!(
        admin = %config.admin_base_url(),
        query = %config.query_base_url(),
        username = %config.username,
        "Connection configured"
    );

    let client = Client::new(config)?;
    run(&client, cli.command).await
}
