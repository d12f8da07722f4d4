use std::path::PathBuf;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use pulso::config::{ConfigError, PulsoConfig, resolve_base_url};
use pulso::net::types::BillingCycle;
use pulso::state::profile::MAX_PROFILES;
use pulso::storage::StorageError;
use pulso::{ApiClient, ApiError, AuthSession, SessionBroadcaster, TokenStore};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("credential storage error: {0}")]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not signed in; run `pulso-cli login` first")]
    NotSignedIn,
    #[error("no profile with id `{0}`")]
    UnknownProfile(String),
    #[error("profile limit reached ({max})", max = MAX_PROFILES)]
    ProfileLimit,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "pulso-cli", about = "Pulso account, profile and billing CLI")]
struct Cli {
    /// Absolute URL, or a path joined onto `--origin`.
    #[arg(long, env = "PULSO_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "PULSO_ORIGIN", default_value = pulso::config::DEFAULT_ORIGIN)]
    origin: String,

    #[arg(long, env = "PULSO_STATE_DIR")]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PULSO_PASSWORD", hide_env_values = true)]
        password: String,
        /// Keep tokens for this process only.
        #[arg(long, default_value_t = false)]
        no_remember: bool,
    },
    Signup {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PULSO_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        confirm_password: String,
        #[arg(long, default_value_t = false)]
        no_remember: bool,
    },
    Logout,
    Whoami,
    /// Print the Google sign-in URL.
    GoogleUrl,
    /// Adopt the tokens returned by the Google sign-in redirect.
    OauthComplete {
        #[arg(long)]
        access_token: String,
        #[arg(long)]
        refresh_token: Option<String>,
        #[arg(long, default_value_t = false)]
        no_remember: bool,
    },
    Password(PasswordCommand),
    Profiles(ProfilesCommand),
    Subscription(SubscriptionCommand),
}

#[derive(Args, Debug)]
struct PasswordCommand {
    #[command(subcommand)]
    command: PasswordSubcommand,
}

#[derive(Subcommand, Debug)]
enum PasswordSubcommand {
    Request {
        #[arg(long)]
        email: String,
    },
    Reset {
        #[arg(long)]
        token: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm_password: String,
    },
}

#[derive(Args, Debug)]
struct ProfilesCommand {
    #[command(subcommand)]
    command: ProfilesSubcommand,
}

#[derive(Subcommand, Debug)]
enum ProfilesSubcommand {
    List,
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        profile_id: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    Delete {
        profile_id: String,
    },
    Select {
        profile_id: String,
    },
    Clear,
}

#[derive(Args, Debug)]
struct SubscriptionCommand {
    #[command(subcommand)]
    command: SubscriptionSubcommand,
}

#[derive(Subcommand, Debug)]
enum SubscriptionSubcommand {
    Show,
    Invoices,
    Cancel {
        /// Cancel now instead of at the end of the billing period.
        #[arg(long, default_value_t = false)]
        now: bool,
    },
    Resume,
    ChangePlan {
        #[arg(long)]
        plan: String,
        #[arg(long, default_value = "monthly")]
        cycle: BillingCycle,
    },
    Portal,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let tokens = Arc::new(TokenStore::open(&config.state_dir)?);
    let api = ApiClient::from_config(&config, tokens, SessionBroadcaster::new())?;
    let session = AuthSession::new(api);
    let listener = session.spawn_expiry_listener();

    let result = run(&session, &config, cli.command).await;
    listener.abort();
    result
}

fn load_config(cli: &Cli) -> Result<PulsoConfig, CliError> {
    let mut config = PulsoConfig::from_env()?;
    if let Some(api_url) = &cli.api_url {
        config.api_base_url = resolve_base_url(api_url, &cli.origin)?;
    }
    if let Some(state_dir) = &cli.state_dir {
        config.state_dir.clone_from(state_dir);
    }
    tracing::debug!(api = %config.api_base_url, state_dir = %config.state_dir.display(), "config loaded");
    Ok(config)
}

async fn run(session: &AuthSession, config: &PulsoConfig, command: Command) -> Result<(), CliError> {
    match command {
        Command::Login { email, password, no_remember } => {
            let user = session
                .login(&email, &password, config.remember_me && !no_remember)
                .await?;
            print_json(&user)
        }
        Command::Signup { name, email, password, confirm_password, no_remember } => {
            let user = session
                .signup(&name, &email, &password, &confirm_password, config.remember_me && !no_remember)
                .await?;
            print_json(&user)
        }
        Command::Logout => {
            session.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => {
            let state = require_session(session).await?;
            print_json(&serde_json::json!({
                "user": state.user,
                "current_profile": state.current_profile,
            }))
        }
        Command::GoogleUrl => {
            println!("{}", session.google_login_url());
            Ok(())
        }
        Command::OauthComplete { access_token, refresh_token, no_remember } => {
            let user = session
                .complete_oauth(&access_token, refresh_token.as_deref(), config.remember_me && !no_remember)
                .await?;
            print_json(&user)
        }
        Command::Password(password) => run_password(session, password).await,
        Command::Profiles(profiles) => run_profiles(session, profiles).await,
        Command::Subscription(subscription) => run_subscription(session, subscription).await,
    }
}

async fn run_password(session: &AuthSession, password: PasswordCommand) -> Result<(), CliError> {
    let response = match password.command {
        PasswordSubcommand::Request { email } => session.request_password_reset(&email).await?,
        PasswordSubcommand::Reset { token, password, confirm_password } => {
            session
                .reset_password(&token, &password, &confirm_password)
                .await?
        }
    };
    println!("{}", response.message);
    Ok(())
}

async fn run_profiles(session: &AuthSession, profiles: ProfilesCommand) -> Result<(), CliError> {
    let state = require_session(session).await?;
    match profiles.command {
        ProfilesSubcommand::List => {
            let current = state.current_profile.as_ref().map(|p| p.id.as_str());
            for profile in &state.profiles {
                let marker = if Some(profile.id.as_str()) == current { "*" } else { " " };
                println!("{marker} {}  {}", profile.id, profile.name);
            }
            Ok(())
        }
        ProfilesSubcommand::Create { name, description } => {
            if !session.can_create_profile() {
                return Err(CliError::ProfileLimit);
            }
            let profile = session
                .create_profile(&name, description.as_deref())
                .await?;
            print_json(&profile)
        }
        ProfilesSubcommand::Update { profile_id, name, description } => {
            let profile = session
                .update_profile(&profile_id, &name, description.as_deref())
                .await?;
            print_json(&profile)
        }
        ProfilesSubcommand::Delete { profile_id } => {
            session.delete_profile(&profile_id).await?;
            eprintln!("deleted profile {profile_id}");
            Ok(())
        }
        ProfilesSubcommand::Select { profile_id } => {
            let profile = state
                .profiles
                .iter()
                .find(|p| p.id == profile_id)
                .cloned()
                .ok_or(CliError::UnknownProfile(profile_id))?;
            session.set_current_profile(Some(profile.clone()));
            print_json(&profile)
        }
        ProfilesSubcommand::Clear => {
            session.set_current_profile(None);
            eprintln!("profile selection cleared");
            Ok(())
        }
    }
}

async fn run_subscription(session: &AuthSession, subscription: SubscriptionCommand) -> Result<(), CliError> {
    require_session(session).await?;
    let api = session.api();
    match subscription.command {
        SubscriptionSubcommand::Show => print_json(&api.subscription().await?),
        SubscriptionSubcommand::Invoices => print_json(&api.invoices().await?),
        SubscriptionSubcommand::Cancel { now } => print_json(&api.cancel_subscription(now).await?),
        SubscriptionSubcommand::Resume => print_json(&api.resume_subscription().await?),
        SubscriptionSubcommand::ChangePlan { plan, cycle } => print_json(&api.change_plan(&plan, cycle).await?),
        SubscriptionSubcommand::Portal => {
            let portal = api.billing_portal().await?;
            println!("{}", portal.url);
            Ok(())
        }
    }
}

async fn require_session(session: &AuthSession) -> Result<pulso::AuthState, CliError> {
    let state = session.bootstrap().await;
    if !state.is_authenticated {
        return Err(CliError::NotSignedIn);
    }
    Ok(state)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
