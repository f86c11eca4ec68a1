use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use user_service::domain::user::InMemoryUserRepository;
use user_service::{Settings, UserCommandService};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,user_service=debug,grpc_identity_propagation=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let settings = Settings::from_env()?;

    let repository = Arc::new(InMemoryUserRepository::new(settings.event_buffer));
    let service = UserCommandService::new(repository.clone(), settings);
    let interceptor = service.role_interceptor();
    tracing::info!(
        required_role = %interceptor.policy().required_role(),
        "User command service ready"
    );

    let mut events = repository.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => tracing::info!(
                    user_id = %event.aggregate_id(),
                    event_type = event.event_type(),
                    "User event published"
                ),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Live event log fell behind")
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    event_log.abort();
    Ok(())
}
