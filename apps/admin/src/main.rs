//! Veritrail operational command line.
//!
//! Covers the deployment chores that do not belong in the API process:
//! running migrations, seeding the platform permission matrix, managing
//! user records, and minting API tokens.

#![forbid(unsafe_code)]

use std::env;

use clap::{Args, Parser, Subcommand};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;
use veritrail_application::token_digest;
use veritrail_core::{AppError, UserRole};
use veritrail_domain::Permission;

#[derive(Parser, Debug)]
#[command(
    name = "veritrail-admin",
    about = "Operate a Veritrail deployment from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply pending database migrations
    Migrate,
    /// Seed the platform-default role-permission matrix
    SeedDefaults,
    /// Create or update a user record
    AssignUser(AssignUserArgs),
    /// Mint an API token for an existing user
    IssueToken(IssueTokenArgs),
    /// Normalize stored workflow stage values
    BackfillStages,
}

#[derive(Args, Debug)]
struct AssignUserArgs {
    /// Stable subject identifier, for example an IdP subject claim
    #[arg(long)]
    subject: String,
    /// Human-readable display name
    #[arg(long)]
    display_name: String,
    /// Contact email address
    #[arg(long)]
    email: String,
    /// Role name, for example tenant_admin or end_user
    #[arg(long)]
    role: String,
    /// Tenant slug; omit for platform-scoped users
    #[arg(long)]
    tenant: Option<String>,
}

#[derive(Args, Debug)]
struct IssueTokenArgs {
    /// Subject of the user the token authenticates as
    #[arg(long)]
    subject: String,
    /// Operator-facing label for the token
    #[arg(long)]
    label: String,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let database_url = env::var("DATABASE_URL")
        .map_err(|_| AppError::Internal("DATABASE_URL is not set".to_owned()))?;
    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    match cli.command {
        Command::Migrate => {
            println!("migrations applied");
            Ok(())
        }
        Command::SeedDefaults => seed_defaults(&pool).await,
        Command::AssignUser(args) => assign_user(&pool, args).await,
        Command::IssueToken(args) => issue_token(&pool, args).await,
        Command::BackfillStages => backfill_stages(&pool).await,
    }
}

/// Permissions granted to every seeded working role.
fn baseline_permissions() -> Vec<Permission> {
    vec![
        Permission::VendorRead,
        Permission::AgentRead,
        Permission::AssessmentRead,
        Permission::OnboardingRead,
        Permission::MasterDataRead,
        Permission::MessageRead,
        Permission::MessagePost,
    ]
}

fn default_grants(role: UserRole) -> Vec<Permission> {
    match role {
        UserRole::PlatformAdmin | UserRole::TenantAdmin => Permission::all().to_vec(),
        UserRole::RiskManager => {
            let mut grants = baseline_permissions();
            grants.extend([
                Permission::AssessmentAssign,
                Permission::VendorStageAdvance,
                Permission::AgentStageAdvance,
                Permission::AssessmentStageAdvance,
            ]);
            grants
        }
        UserRole::Approver => {
            let mut grants = baseline_permissions();
            grants.extend([
                Permission::OnboardingDecide,
                Permission::VendorStageAdvance,
                Permission::AgentStageAdvance,
            ]);
            grants
        }
        UserRole::VendorManager => {
            let mut grants = baseline_permissions();
            grants.extend([
                Permission::VendorCreate,
                Permission::VendorUpdate,
                Permission::VendorDelete,
                Permission::AgentCreate,
                Permission::AgentUpdate,
                Permission::AgentDelete,
            ]);
            grants
        }
        UserRole::EndUser => {
            let mut grants = baseline_permissions();
            grants.extend([Permission::AssessmentSubmit, Permission::OnboardingSubmit]);
            grants
        }
    }
}

/// Inserts the platform-default grant rows, leaving tenant overrides alone.
async fn seed_defaults(pool: &PgPool) -> Result<(), AppError> {
    let mut seeded = 0_u64;

    for role in UserRole::all() {
        for permission in default_grants(*role) {
            let result = sqlx::query(
                r"
                INSERT INTO role_permissions (tenant_id, role, category, permission_key, allowed)
                VALUES (NULL, $1, $2, $3, TRUE)
                ON CONFLICT (tenant_id, role, permission_key)
                DO UPDATE SET allowed = TRUE, category = EXCLUDED.category, updated_at = now()
                ",
            )
            .bind(role.as_str())
            .bind(permission.category().as_str())
            .bind(permission.as_str())
            .execute(pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to seed role permissions: {error}"))
            })?;

            seeded += result.rows_affected();
        }
    }

    println!("seeded {seeded} platform-default permission grants");
    Ok(())
}

async fn assign_user(pool: &PgPool, args: AssignUserArgs) -> Result<(), AppError> {
    let role: UserRole = args.role.parse()?;

    let tenant_id = match args.tenant {
        Some(slug) => {
            let row = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM tenants WHERE slug = $1")
                .bind(&slug)
                .fetch_optional(pool)
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to look up tenant: {error}"))
                })?;

            let Some((id,)) = row else {
                return Err(AppError::NotFound(format!("tenant '{slug}' not found")));
            };

            Some(id)
        }
        None => None,
    };

    sqlx::query(
        r"
        INSERT INTO users (subject, display_name, email, role, tenant_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (subject)
        DO UPDATE SET
            display_name = EXCLUDED.display_name,
            email = EXCLUDED.email,
            role = EXCLUDED.role,
            tenant_id = EXCLUDED.tenant_id
        ",
    )
    .bind(&args.subject)
    .bind(&args.display_name)
    .bind(&args.email)
    .bind(role.as_str())
    .bind(tenant_id)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to upsert user: {error}")))?;

    println!("user '{}' assigned role '{}'", args.subject, role.as_str());
    Ok(())
}

async fn issue_token(pool: &PgPool, args: IssueTokenArgs) -> Result<(), AppError> {
    let row = sqlx::query_as::<_, (Uuid,)>("SELECT id FROM users WHERE subject = $1")
        .bind(&args.subject)
        .fetch_optional(pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to look up user: {error}")))?;

    let Some((user_id,)) = row else {
        return Err(AppError::NotFound(format!(
            "user '{}' not found",
            args.subject
        )));
    };

    // 244 bits of token entropy.
    let token = format!(
        "vt_{}{}",
        Uuid::new_v4().simple(),
        Uuid::new_v4().simple()
    );

    sqlx::query(
        "INSERT INTO api_tokens (user_id, token_digest, label) VALUES ($1, $2, $3)",
    )
    .bind(user_id)
    .bind(token_digest(&token))
    .bind(&args.label)
    .execute(pool)
    .await
    .map_err(|error| AppError::Internal(format!("failed to store token: {error}")))?;

    println!("token for '{}' (shown once, store it now):", args.subject);
    println!("{token}");
    Ok(())
}

/// Re-runs the stage normalization applied by the migration history,
/// for rows written by older importers after that migration ran.
async fn backfill_stages(pool: &PgPool) -> Result<(), AppError> {
    let statements = [
        "UPDATE vendors SET workflow_stage = btrim(workflow_stage) WHERE workflow_stage <> btrim(workflow_stage)",
        "UPDATE vendors SET workflow_stage = 'draft' WHERE workflow_stage = ''",
        "UPDATE agents SET workflow_stage = btrim(workflow_stage) WHERE workflow_stage <> btrim(workflow_stage)",
        "UPDATE agents SET workflow_stage = 'draft' WHERE workflow_stage = ''",
        "UPDATE assessment_assignments SET workflow_stage = btrim(workflow_stage) WHERE workflow_stage <> btrim(workflow_stage)",
        "UPDATE assessment_assignments SET workflow_stage = 'draft' WHERE workflow_stage = ''",
        "UPDATE onboarding_requests SET workflow_stage = btrim(workflow_stage) WHERE workflow_stage <> btrim(workflow_stage)",
        "UPDATE onboarding_requests SET workflow_stage = 'submitted' WHERE workflow_stage = ''",
    ];

    let mut normalized = 0_u64;
    for statement in statements {
        let result = sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to backfill workflow stages: {error}"))
            })?;

        normalized += result.rows_affected();
    }

    println!("normalized {normalized} workflow stage values");
    Ok(())
}
