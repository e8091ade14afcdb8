use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use bestof_api::{
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::user,
    services::users::UserService,
};
use uuid::Uuid;

const ADMIN_PASSWORD_ENV: &str = "BESTOF_ADMIN_PASSWORD";

#[derive(Parser)]
#[command(name = "bestof-cli", about = "Administrative tasks for the BestOf API")]
struct Cli {
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Create an ADMIN account, or promote an existing one and reset its password
    CreateAdmin(CreateAdminArgs),
    /// List ADMIN accounts
    ListAdmins,
}

#[derive(Args)]
struct CreateAdminArgs {
    #[arg(long)]
    email: String,
    #[arg(long)]
    name: Option<String>,
    /// Falls back to the BESTOF_ADMIN_PASSWORD environment variable
    #[arg(long)]
    password: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AdminSummary {
    id: Uuid,
    email: String,
    name: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<&user::Model> for AdminSummary {
    fn from(user: &user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
struct CreateAdminOutcome {
    created: bool,
    admin: AdminSummary,
}

struct CliContext {
    _config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;

        Ok(Self {
            _config: config,
            db: Arc::new(db_pool),
        })
    }

    fn user_service(&self) -> UserService {
        UserService::new(self.db.clone())
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => handle_migrate(&context, cli.json).await?,
        Commands::CreateAdmin(args) => handle_create_admin(&context, args, cli.json).await?,
        Commands::ListAdmins => handle_list_admins(&context, cli.json).await?,
    }

    Ok(())
}

async fn handle_migrate(context: &CliContext, json: bool) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("failed to apply migrations")?;

    if json {
        print_json(&serde_json::json!({ "migrated": true }))?;
    } else {
        println!("Migrations applied");
    }
    Ok(())
}

async fn handle_create_admin(context: &CliContext, args: CreateAdminArgs, json: bool) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => std::env::var(ADMIN_PASSWORD_ENV).map_err(|_| {
            anyhow!("password required: pass --password or set {ADMIN_PASSWORD_ENV}")
        })?,
    };

    let (admin, created) = context
        .user_service()
        .upsert_admin(&args.email, args.name, &password)
        .await
        .context("failed to save admin user")?;

    if json {
        print_json(&CreateAdminOutcome {
            created,
            admin: AdminSummary::from(&admin),
        })?;
    } else if created {
        println!("Created admin {} ({})", admin.email, admin.id);
    } else {
        println!("Promoted {} to admin and reset the password", admin.email);
    }
    Ok(())
}

async fn handle_list_admins(context: &CliContext, json: bool) -> Result<()> {
    let admins = context
        .user_service()
        .list_admins()
        .await
        .context("failed to list admins")?;

    if json {
        let summaries: Vec<AdminSummary> = admins.iter().map(AdminSummary::from).collect();
        return print_json(&summaries);
    }

    if admins.is_empty() {
        println!("No admin accounts");
        return Ok(());
    }
    for admin in &admins {
        println!(
            "- {} • {} • since {}",
            admin.email,
            admin.name.as_deref().unwrap_or("(no name)"),
            admin.created_at.format("%Y-%m-%d")
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
