//! `givehub` command-line client.
//!
//! Every invocation resolves the stored session first, then runs one
//! subcommand against it. Logs go to stderr; stdout carries the output.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use givehub_auth::Role;
use givehub_client::{
    AuthError, ClientConfig, LoginCredentials, RegistrationProfile, SessionManager, SessionStatus,
};

#[derive(Parser, Debug)]
#[command(name = "givehub", about = "GiveHub donation platform client", version)]
struct Cli {
    /// Base URL of the platform API.
    #[arg(long, env = "GIVEHUB_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current session and the surface it routes to.
    Status,

    /// Sign in with an existing account.
    Login(LoginArgs),

    /// Register a new account and sign in with it.
    Register(RegisterArgs),

    /// Ask the platform which account the session credential belongs to.
    Whoami,

    /// End the current session.
    Logout,
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    /// Account role: donor, ngo or admin.
    #[arg(long)]
    role: String,

    #[arg(long)]
    name: String,

    #[arg(long)]
    email: String,

    #[arg(long)]
    password: String,

    /// Organization name, for NGO accounts.
    #[arg(long)]
    organization: Option<String>,

    /// Official registration number, for NGO accounts.
    #[arg(long)]
    registration_number: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    givehub_observability::init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url;
    }

    let manager =
        SessionManager::from_config(&config).context("failed to open the credential store")?;
    manager
        .initialize()
        .await
        .context("failed to resolve the stored session")?;

    match cli.command {
        Command::Status => {
            print_status(&manager.status());
            Ok(())
        }
        Command::Login(args) => {
            let status = manager
                .login(LoginCredentials {
                    email: args.email,
                    password: args.password,
                })
                .await?;
            println!("signed in");
            print_status(&status);
            Ok(())
        }
        Command::Register(args) => {
            let role = Role::from(args.role.to_uppercase());
            let profile = RegistrationProfile {
                name: args.name,
                email: args.email,
                password: args.password,
                organization: args.organization,
                registration_number: args.registration_number,
            };
            let status = manager.register(profile, role).await?;
            println!("account registered");
            print_status(&status);
            Ok(())
        }
        Command::Whoami => match manager.account().await {
            Ok(account) => {
                println!("email:   {}", account.email);
                println!("role:    {}", account.role);
                println!("user id: {}", account.user_id);
                Ok(())
            }
            Err(err @ AuthError::Unauthorized) => {
                print_status(&manager.status());
                Err(err.into())
            }
            Err(err) => Err(err.into()),
        },
        Command::Logout => {
            let status = manager.logout().await;
            println!("signed out");
            print_status(&status);
            Ok(())
        }
    }
}

fn print_status(status: &SessionStatus) {
    match status {
        SessionStatus::Loading => println!("session: loading"),
        SessionStatus::Unauthenticated => println!("session: signed out"),
        SessionStatus::Authenticated(principal) => {
            println!("session: {} ({})", principal.email, principal.role);
        }
    }
    if let Some(surface) = status.surface() {
        println!("surface: {surface}");
    }
}
