//! HTTP API Layer
//!
//! This crate provides the REST API for the hiring engine using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Request handlers per resource (hirings, claims,
//!   compliances, payment webhook)
//! - **Middleware**: JWT authentication, tracing, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: `ErrorKind`-driven status codes
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::postgres(pool, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod handlers;
pub mod dto;
pub mod auth;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use core_kernel::{Clock, HealthCheckable, KeyedLocks, SystemClock};
use domain_billing::{PaymentAuditLog, PaymentReconciler};
use domain_claims::{ClaimEngine, ClaimRepository, ComplianceTracker};
use domain_hiring::{HiringContext, HiringService, QuotationNegotiator};
use infra_db::{
    PostgresClaimAdapter, PostgresHiringAdapter, PostgresIdentityAdapter, PostgresPaymentAuditAdapter,
};

use crate::config::ApiConfig;
use crate::handlers::{claims, compliance, health, hiring, payments};
use crate::middleware::{audit_middleware, auth_middleware};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub hirings: Arc<HiringService>,
    pub negotiator: Arc<QuotationNegotiator>,
    pub reconciler: Arc<PaymentReconciler>,
    pub claims: Arc<ClaimEngine>,
    pub tracker: Arc<ComplianceTracker>,
    /// Adapters probed by the readiness check
    pub probes: Vec<Arc<dyn HealthCheckable>>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    /// Wires every service over the given ports
    pub fn new(
        ctx: HiringContext,
        claims: Arc<dyn ClaimRepository>,
        audit: Arc<dyn PaymentAuditLog>,
        config: ApiConfig,
    ) -> Self {
        let engine = ClaimEngine::new(ctx.clone(), claims);
        Self {
            hirings: Arc::new(HiringService::new(ctx.clone())),
            negotiator: Arc::new(QuotationNegotiator::new(ctx.clone())),
            reconciler: Arc::new(PaymentReconciler::new(ctx, audit)),
            claims: Arc::new(engine.clone()),
            tracker: Arc::new(ComplianceTracker::new(engine)),
            probes: Vec::new(),
            config: Arc::new(config),
        }
    }

    pub fn with_probes(mut self, probes: Vec<Arc<dyn HealthCheckable>>) -> Self {
        self.probes = probes;
        self
    }

    /// Wires every service over the PostgreSQL adapters and the system clock
    pub fn postgres(pool: PgPool, config: ApiConfig) -> Self {
        let hirings = Arc::new(PostgresHiringAdapter::new(pool.clone()));
        let claims = Arc::new(PostgresClaimAdapter::new(pool.clone()));
        let audit = Arc::new(PostgresPaymentAuditAdapter::new(pool.clone()));
        let identity = Arc::new(PostgresIdentityAdapter::new(pool));
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let ctx = HiringContext::new(
            hirings.clone(),
            identity.clone(),
            clock,
            Arc::new(KeyedLocks::new()),
            config.engine.clone(),
        );
        let probes: Vec<Arc<dyn HealthCheckable>> = vec![
            hirings as Arc<dyn HealthCheckable>,
            claims.clone() as Arc<dyn HealthCheckable>,
            audit.clone() as Arc<dyn HealthCheckable>,
            identity as Arc<dyn HealthCheckable>,
        ];
        Self::new(ctx, claims, audit, config).with_probes(probes)
    }
}

/// Creates the main API router
///
/// Everything under `/api/v1` requires a bearer token. Health checks and
/// the payment webhook are mounted outside the JWT layer.
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/webhooks/payments", post(payments::payment_webhook));

    let hiring_routes = Router::new()
        .route("/", post(hiring::create_hiring))
        .route("/:id", get(hiring::get_hiring))
        .route("/:id/quotations", post(hiring::create_quotation))
        .route("/:id/requote", post(hiring::request_requote))
        .route("/:id/checkout", post(hiring::initiate_checkout))
        .route("/:id/delivery-events", post(hiring::apply_delivery_event))
        .route("/:id/cancel", post(hiring::cancel_hiring))
        .route("/:id/claims", post(claims::file_claim).get(claims::list_claims_for_hiring));

    let claims_routes = Router::new()
        .route("/:id", get(claims::get_claim))
        .route("/:id/review", post(claims::start_review))
        .route("/:id/resolution", post(claims::resolve_claim))
        .route("/:id/compliances", get(claims::list_compliances))
        .route("/:id/discharge", get(claims::discharge_status));

    let compliance_routes = Router::new()
        .route("/sweep", post(compliance::sweep_overdue))
        .route("/:id/submissions", post(compliance::submit_compliance));

    let submission_routes = Router::new()
        .route("/:id/review", post(compliance::review_submission))
        .route("/:id/peer-review", post(compliance::peer_review));

    // Protected API routes
    let api_routes = Router::new()
        .nest("/hirings", hiring_routes)
        .nest("/claims", claims_routes)
        .nest("/compliances", compliance_routes)
        .nest("/submissions", submission_routes)
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
