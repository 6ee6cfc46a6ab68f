//! Account Administration CLI
//!
//! Creates superusers and regular accounts, verifies accounts by hand and
//! shows account details without going through the HTTP API.

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;

use account_service::{
    config::env,
    database::{AccountRepository, DatabaseConfig, PgAccountRepository},
    models::UserAccount,
    service::{check_password_policy, CredentialStore},
    utils::security::DEFAULT_BCRYPT_COST,
};

/// Account administration CLI
#[derive(Parser)]
#[command(name = "account-admin", about = "Account administration CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a verified staff superuser
    CreateSuperuser(SuperuserArgs),
    /// Create a regular account
    CreateUser(UserArgs),
    /// Mark an account as verified
    Verify(EmailArgs),
    /// Show account details
    Show(EmailArgs),
}

#[derive(Args)]
struct Credentials {
    /// Account email address
    #[arg(short, long)]
    email: String,

    /// Account password
    #[arg(short, long, env = "ACCOUNT_PASSWORD", hide_env_values = true)]
    password: String,
}

#[derive(Args)]
struct SuperuserArgs {
    #[command(flatten)]
    credentials: Credentials,

    /// Must be true if given
    #[arg(long)]
    is_staff: Option<bool>,

    /// Must be true if given
    #[arg(long)]
    is_superuser: Option<bool>,
}

#[derive(Args)]
struct UserArgs {
    #[command(flatten)]
    credentials: Credentials,

    /// Create the account already verified
    #[arg(long)]
    verified: bool,
}

#[derive(Args)]
struct EmailArgs {
    /// Account email address
    email: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    let pool = DatabaseConfig::from_env()?.create_migrated_pool().await?;
    let repository: Arc<dyn AccountRepository> = Arc::new(PgAccountRepository::new(pool));
    let store = CredentialStore::with_bcrypt_cost(
        repository,
        env::get_u32("BCRYPT_COST", DEFAULT_BCRYPT_COST),
    );

    match cli.command {
        Commands::CreateSuperuser(args) => create_superuser(&store, args).await?,
        Commands::CreateUser(args) => create_user(&store, args).await?,
        Commands::Verify(args) => verify_account(&store, args).await?,
        Commands::Show(args) => show_account(&store, args).await?,
    }

    Ok(())
}

async fn create_superuser(
    store: &CredentialStore,
    args: SuperuserArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let Credentials { email, password } = args.credentials;
    check_password_policy("password", &password, Some(&email))?;

    let account = store
        .create_superuser(&email, &password, args.is_staff, args.is_superuser)
        .await?;

    println!("Superuser created successfully.");
    print_account(&account);
    Ok(())
}

async fn create_user(
    store: &CredentialStore,
    args: UserArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let Credentials { email, password } = args.credentials;
    check_password_policy("password", &password, Some(&email))?;

    let mut account = store.create_account(&email, &password).await?;
    if args.verified {
        store.mark_verified(account.id).await?;
        account.is_verified = true;
    }

    println!("Account created successfully.");
    print_account(&account);
    Ok(())
}

async fn verify_account(
    store: &CredentialStore,
    args: EmailArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let account = store
        .find_by_email(&args.email)
        .await?
        .ok_or_else(|| format!("No account with email {}", args.email))?;

    if store.mark_verified(account.id).await? {
        println!("Account {} is now verified.", account.email);
    } else {
        println!("Account {} was already verified.", account.email);
    }
    Ok(())
}

async fn show_account(
    store: &CredentialStore,
    args: EmailArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let account = store
        .find_by_email(&args.email)
        .await?
        .ok_or_else(|| format!("No account with email {}", args.email))?;

    print_account(&account);

    let profile = store.repository().get_or_create_profile(account.id).await?;
    if let Some(name) = profile.display_name() {
        println!("   Name: {}", name);
    }
    Ok(())
}

fn print_account(account: &UserAccount) {
    println!("   ID: {}", account.id);
    println!("   Email: {}", account.email);
    println!("   Active: {}", yes_no(account.is_active));
    println!("   Verified: {}", yes_no(account.is_verified));
    println!("   Staff: {}", yes_no(account.is_staff));
    println!("   Superuser: {}", yes_no(account.is_superuser));
    println!("   Created: {}", account.created_at.format("%Y-%m-%d %H:%M"));
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}
