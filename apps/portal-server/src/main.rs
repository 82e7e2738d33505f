use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::HeaderValue;
use tracing::{error, info};

use portal_api::{build_router, AppState};
use portal_core::repositories::{CrmStore, LedgerStore, PortalStore};
use portal_core::services::{
    AuthService, CampaignService, NotificationService, PasswordResetService, PaymentService,
    PropertyService, ReferralService, RegistrationService,
};
use portal_infrastructure::{
    create_pool, DarajaClient, ExpoPushClient, MySqlCrmStore, MySqlLedgerStore, MySqlPortalStore,
    SmtpOtpMailer,
};
use portal_security::jwt::JwtService;
use portal_shared::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env
    dotenvy::dotenv().ok();

    // Initialize telemetry
    portal_shared::telemetry::init_telemetry();

    info!("Portal server starting...");

    // Load configuration
    let config = match AppConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    // Connect to the three logical databases
    let portal_pool = connect(&config.portal_database_url, &config, "portal").await;
    let crm_pool = connect(&config.crm_database_url, &config, "CRM").await;
    let ledger_pool = connect(&config.ledger_database_url, &config, "ledger").await;
    info!("Database connections established.");

    // Stores
    let portal: Arc<dyn PortalStore> = Arc::new(MySqlPortalStore::new(portal_pool));
    let crm: Arc<dyn CrmStore> = Arc::new(MySqlCrmStore::new(crm_pool));
    let ledger: Arc<dyn LedgerStore> = Arc::new(MySqlLedgerStore::new(ledger_pool));

    // Outbound gateways
    let mailer = match SmtpOtpMailer::from_config(&config) {
        Ok(m) => Arc::new(m),
        Err(e) => {
            error!("Failed to configure the SMTP mailer: {}", e);
            std::process::exit(1);
        }
    };
    let push = Arc::new(ExpoPushClient::new(config.push_base_url.clone()));
    let gateway = Arc::new(DarajaClient::from_config(&config));

    // Services
    let jwt = Arc::new(JwtService::new(
        config.jwt_secret.clone(),
        config.jwt_validity_hours,
    ));
    let notifications = Arc::new(NotificationService::new(portal.clone(), push));
    let state = AppState {
        auth: Arc::new(AuthService::new(portal.clone(), crm.clone(), jwt.clone())),
        registration: Arc::new(RegistrationService::new(
            crm.clone(),
            portal.clone(),
            mailer.clone(),
        )),
        password_reset: Arc::new(PasswordResetService::new(portal.clone(), mailer)),
        payments: Arc::new(PaymentService::new(
            portal.clone(),
            crm.clone(),
            gateway,
            notifications.clone(),
        )),
        properties: Arc::new(PropertyService::new(crm, ledger, portal.clone())),
        notifications,
        referrals: Arc::new(ReferralService::new(portal.clone())),
        campaigns: Arc::new(CampaignService::new(portal.clone())),
        portal,
        jwt,
    };

    // Build router
    let cors_origin: HeaderValue = config.cors_origin.parse()?;
    let app = build_router(state, cors_origin);

    // Bind address
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn connect(url: &str, config: &AppConfig, name: &str) -> sqlx::MySqlPool {
    match create_pool(url, config.database_max_connections).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to connect to the {} database: {}", name, e);
            std::process::exit(1);
        }
    }
}
