use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};
use vidspace_api::TokenIssuer;
use vidspace_core::config::Config;
use vidspace_core::core_access::{
    AccessSqlStore, Channel, ChannelId, ChannelRole, ChannelStore, TenantId, TenantRole, TenantStore,
    UserId,
};
use vidspace_core::logging::{init_logging_with_config, LogConfig, LogLevel};

#[derive(Parser, Debug)]
#[command(name = "vidspace")]
#[command(author, version, about = "vidspace admin tool", long_about = None)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, env = "VIDSPACE_CONFIG")]
    config: Option<PathBuf>,

    /// Override store.database_path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create or upgrade the database schema
    Migrate,

    /// Manage tenant memberships
    #[command(subcommand)]
    Tenant(TenantCommand),

    /// Manage channels and channel roles
    #[command(subcommand)]
    Channel(ChannelCommand),

    /// Mint an access token for local testing
    Token {
        #[arg(long)]
        user: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Lifetime such as `30m` or `2h`; defaults to auth.dev_token_ttl
        #[arg(long)]
        ttl: Option<humantime::Duration>,
    },
}

#[derive(Subcommand, Debug)]
enum TenantCommand {
    /// Add a user to a tenant, or change their tenant role
    AddMember {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        user: String,
        /// member or super_admin
        #[arg(long, default_value = "member")]
        role: TenantRole,
    },
}

#[derive(Subcommand, Debug)]
enum ChannelCommand {
    /// Create a channel and print its id
    Create {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        name: String,
        /// Grant this user the owner role on the new channel
        #[arg(long)]
        owner: Option<String>,
    },

    /// Give a user a role on a channel, replacing any previous role
    AddMember {
        #[arg(long)]
        tenant: String,
        #[arg(long)]
        channel: String,
        #[arg(long)]
        user: String,
        /// owner, uploader or viewer
        #[arg(long)]
        role: ChannelRole,
    },
}

fn open_store(config: &Config, database: Option<&Path>) -> Result<AccessSqlStore> {
    let path = database.unwrap_or(&config.store.database_path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    debug!(path = %path.display(), "opening store");
    AccessSqlStore::open(path).with_context(|| format!("opening database {}", path.display()))
}

fn non_empty(field: &str, value: &str) -> Result<String> {
    let value = value.trim();
    if value.is_empty() {
        bail!("{field} must not be empty");
    }
    Ok(value.to_string())
}

fn add_tenant_member(store: &AccessSqlStore, tenant: &str, user: &str, role: TenantRole) -> Result<()> {
    let tenant = TenantId::from(non_empty("tenant", tenant)?);
    let user = UserId::from(non_empty("user", user)?);

    store.add_tenant_member(&tenant, &user, role)?;
    info!(tenant.id = %tenant, user.id = %user, %role, "tenant member added");
    Ok(())
}

fn create_channel(store: &AccessSqlStore, tenant: &str, name: &str, owner: Option<&str>) -> Result<Channel> {
    let tenant = TenantId::from(non_empty("tenant", tenant)?);
    let channel = Channel::new(tenant, non_empty("name", name)?);
    store.create_channel(&channel)?;

    if let Some(owner) = owner {
        let owner = UserId::from(non_empty("owner", owner)?);
        store.add_channel_member(&channel.id, &owner, ChannelRole::Owner)?;
    }

    info!(channel.id = %channel.id, tenant.id = %channel.tenant_id, "channel created");
    Ok(channel)
}

fn add_channel_member(
    store: &AccessSqlStore,
    tenant: &str,
    channel: &str,
    user: &str,
    role: ChannelRole,
) -> Result<()> {
    let tenant = TenantId::from(non_empty("tenant", tenant)?);
    let channel_id = ChannelId::from(non_empty("channel", channel)?);
    let user = UserId::from(non_empty("user", user)?);

    if store.get_channel(&channel_id, &tenant)?.is_none() {
        bail!("channel {channel_id} not found in tenant {tenant}");
    }

    store.add_channel_member(&channel_id, &user, role)?;
    info!(channel.id = %channel_id, user.id = %user, %role, "channel member added");
    Ok(())
}

fn mint_token(
    config: &Config,
    user: &str,
    name: Option<&str>,
    email: Option<&str>,
    ttl: Option<humantime::Duration>,
) -> Result<String> {
    let user = non_empty("user", user)?;
    let ttl = ttl.map(Into::into).unwrap_or(config.auth.dev_token_ttl);

    let issuer = TokenIssuer::from_config(&config.auth)?;
    Ok(issuer.issue(&user, name, email, ttl)?)
}

fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = LogLevel::from_str(&args.log_level).unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', using 'warn'", args.log_level);
        LogLevel::Warn
    });
    init_logging_with_config(LogConfig::new(log_level).json_format(args.json_logs))?;

    let config = Config::load(args.config.as_deref())?;
    let database = args.database.as_deref();

    match args.command {
        Command::Migrate => {
            let store = open_store(&config, database)?;
            println!("schema version {}", store.schema_version()?);
        }
        Command::Tenant(TenantCommand::AddMember { tenant, user, role }) => {
            let store = open_store(&config, database)?;
            add_tenant_member(&store, &tenant, &user, role)?;
        }
        Command::Channel(ChannelCommand::Create { tenant, name, owner }) => {
            let store = open_store(&config, database)?;
            let channel = create_channel(&store, &tenant, &name, owner.as_deref())?;
            println!("{}", channel.id);
        }
        Command::Channel(ChannelCommand::AddMember { tenant, channel, user, role }) => {
            let store = open_store(&config, database)?;
            add_channel_member(&store, &tenant, &channel, &user, role)?;
        }
        Command::Token { user, name, email, ttl } => {
            let token = mint_token(&config, &user, name.as_deref(), email.as_deref(), ttl)?;
            println!("{token}");
        }
    }

    Ok(())
}
