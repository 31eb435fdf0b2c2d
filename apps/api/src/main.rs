//! Veritrail API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod dto;
mod error;
mod handlers;
mod middleware;
mod observability;
mod state;

use std::sync::Arc;

use axum::Router;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use veritrail_application::{
    AgentService, AssessmentService, AuthorizationService, IdentityService, MasterDataService,
    MessageService, OnboardingService, SecurityAdminService, TenantService, VendorService,
};
use veritrail_core::AppError;
use veritrail_infrastructure::{
    PostgresAgentRepository, PostgresAssessmentRepository, PostgresAuditLogRepository,
    PostgresAuthorizationRepository, PostgresDataFilterSourceRepository,
    PostgresIdentityRepository, PostgresMasterDataRepository, PostgresMessageRepository,
    PostgresOnboardingRepository, PostgresSecurityAdminRepository, PostgresTenantRepository,
    PostgresVendorRepository,
};

use crate::api_config::ApiConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    api_config::init_tracing();

    let config = ApiConfig::load()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if config.migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let metrics_handle = observability::install_metrics_recorder()?;

    let authorization_service = AuthorizationService::new(
        Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
        Arc::new(PostgresDataFilterSourceRepository::new(pool.clone())),
    );

    let app_state = AppState {
        identity_service: IdentityService::new(Arc::new(PostgresIdentityRepository::new(
            pool.clone(),
        ))),
        tenant_service: TenantService::new(
            authorization_service.clone(),
            Arc::new(PostgresTenantRepository::new(pool.clone())),
        ),
        vendor_service: VendorService::new(
            authorization_service.clone(),
            Arc::new(PostgresVendorRepository::new(pool.clone())),
        ),
        agent_service: AgentService::new(
            authorization_service.clone(),
            Arc::new(PostgresAgentRepository::new(pool.clone())),
        ),
        assessment_service: AssessmentService::new(
            authorization_service.clone(),
            Arc::new(PostgresAssessmentRepository::new(pool.clone())),
        ),
        onboarding_service: OnboardingService::new(
            authorization_service.clone(),
            Arc::new(PostgresOnboardingRepository::new(pool.clone())),
        ),
        master_data_service: MasterDataService::new(
            authorization_service.clone(),
            Arc::new(PostgresMasterDataRepository::new(pool.clone())),
        ),
        message_service: MessageService::new(
            authorization_service.clone(),
            Arc::new(PostgresMessageRepository::new(pool.clone())),
        ),
        security_admin_service: SecurityAdminService::new(
            authorization_service,
            Arc::new(PostgresSecurityAdminRepository::new(pool.clone())),
            Arc::new(PostgresAuditLogRepository::new(pool.clone())),
        ),
        metrics_handle,
    };

    let protected_routes = Router::new()
        .route("/auth/me", get(handlers::tenants::me_handler))
        .route(
            "/api/tenants",
            get(handlers::tenants::list_tenants_handler)
                .post(handlers::tenants::create_tenant_handler),
        )
        .route(
            "/api/tenants/current",
            get(handlers::tenants::get_current_tenant_handler)
                .put(handlers::tenants::update_current_tenant_handler),
        )
        .route(
            "/api/vendors",
            get(handlers::vendors::list_vendors_handler)
                .post(handlers::vendors::create_vendor_handler),
        )
        .route(
            "/api/vendors/{vendor_id}",
            get(handlers::vendors::get_vendor_handler)
                .put(handlers::vendors::update_vendor_handler)
                .delete(handlers::vendors::delete_vendor_handler),
        )
        .route(
            "/api/vendors/{vendor_id}/stage",
            post(handlers::vendors::advance_vendor_stage_handler),
        )
        .route(
            "/api/agents",
            get(handlers::agents::list_agents_handler)
                .post(handlers::agents::create_agent_handler),
        )
        .route(
            "/api/agents/{agent_id}",
            get(handlers::agents::get_agent_handler)
                .put(handlers::agents::update_agent_handler)
                .delete(handlers::agents::delete_agent_handler),
        )
        .route(
            "/api/agents/{agent_id}/stage",
            post(handlers::agents::advance_agent_stage_handler),
        )
        .route(
            "/api/assessments",
            get(handlers::assessments::list_assessments_handler)
                .post(handlers::assessments::assign_assessment_handler),
        )
        .route(
            "/api/assessments/{assessment_id}",
            get(handlers::assessments::get_assessment_handler),
        )
        .route(
            "/api/assessments/{assessment_id}/responses",
            post(handlers::assessments::submit_responses_handler),
        )
        .route(
            "/api/assessments/{assessment_id}/stage",
            post(handlers::assessments::advance_assessment_stage_handler),
        )
        .route(
            "/api/onboarding",
            get(handlers::onboarding::list_onboarding_handler)
                .post(handlers::onboarding::submit_onboarding_handler),
        )
        .route(
            "/api/onboarding/{request_id}",
            get(handlers::onboarding::get_onboarding_handler),
        )
        .route(
            "/api/onboarding/{request_id}/decision",
            post(handlers::onboarding::decide_onboarding_handler),
        )
        .route(
            "/api/master-data",
            get(handlers::master_data::list_master_data_handler)
                .post(handlers::master_data::create_master_data_handler),
        )
        .route(
            "/api/master-data/{list_name}",
            get(handlers::master_data::get_master_data_handler)
                .put(handlers::master_data::update_master_data_handler)
                .delete(handlers::master_data::delete_master_data_handler),
        )
        .route(
            "/api/messages/{resource_kind}/{resource_id}",
            get(handlers::messages::list_thread_handler)
                .post(handlers::messages::post_message_handler),
        )
        .route(
            "/api/security/role-permissions",
            get(handlers::security::list_role_permissions_handler)
                .put(handlers::security::save_role_permission_handler),
        )
        .route(
            "/api/security/role-permissions/remove",
            post(handlers::security::remove_role_permission_handler),
        )
        .route(
            "/api/security/audit-log",
            get(handlers::security::list_audit_log_handler),
        )
        .route_layer(from_fn_with_state(
            app_state.clone(),
            middleware::require_auth,
        ));

    let cors_layer = CorsLayer::new()
        .allow_origin(
            HeaderValue::from_str(&config.frontend_url)
                .map_err(|error| AppError::Internal(format!("invalid FRONTEND_URL: {error}")))?,
        )
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION]);

    let app = Router::new()
        .route("/health", get(handlers::health::health_handler))
        .route("/metrics", get(observability::metrics_handler))
        .merge(protected_routes)
        .layer(from_fn(observability::track_http_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer)
        .with_state(app_state);

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "veritrail-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}
