mod dispatch;
mod pipeline;
mod telemetry;
#[cfg(test)]
mod test_support;
mod window;
mod workos;

use std::time::Duration;

use orgsync_config::{init_tracing, AppConfig};
use orgsync_db::cursor::sqlite_repository::SqliteCheckpointRepository;
use orgsync_db::membership::sqlite_repository::SqliteMembershipRepository;
use orgsync_db::organization::sqlite_repository::SqliteOrganizationRepository;
use orgsync_db::user::sqlite_repository::SqliteUserRepository;
use tokio::time::MissedTickBehavior;

use crate::dispatch::Dispatcher;
use crate::pipeline::{EventsConsumer, PipelineSettings};
use crate::telemetry::CycleContext;
use crate::workos::client::{WorkosClient, WorkosClientConfig};

#[tokio::main]
async fn main() {
    let config = AppConfig::from_env().expect("failed to load config");
    init_tracing(&config.log_level);

    tracing::info!(
        service = %config.service_name,
        environment = %config.environment,
        failure_policy = config.failure_policy.as_str(),
        "starting"
    );
    if let Some(range) = &config.events_range {
        tracing::warn!(
            range_start = %range.start.to_rfc3339(),
            range_end = %range.end.to_rfc3339(),
            "explicit events range configured, checkpoint will be ignored"
        );
    }

    let pool = orgsync_db::create_pool(&config.database_url)
        .await
        .expect("failed to connect to database");
    orgsync_db::migrate(&pool)
        .await
        .expect("failed to apply database schema");

    let workos_config = WorkosClientConfig::from_env().expect("workos configuration error");
    let client = WorkosClient::new(workos_config).expect("failed to create workos client");

    let dispatcher = Dispatcher::new(
        SqliteOrganizationRepository::new(pool.clone()),
        SqliteMembershipRepository::new(pool.clone()),
        SqliteUserRepository::new(pool.clone()),
    );
    let consumer = EventsConsumer::new(
        client,
        SqliteCheckpointRepository::new(pool),
        dispatcher,
        PipelineSettings {
            events_range: config.events_range,
            failure_policy: config.failure_policy,
        },
    );

    let Some(interval_secs) = config.sync_interval_secs else {
        let ctx = CycleContext::new(&config.service_name, &config.environment);
        consumer.run_scheduled(&ctx).await;
        tracing::info!("single cycle finished");
        return;
    };

    tracing::info!(interval_secs, "running scheduled cycles");
    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let ctx = CycleContext::new(&config.service_name, &config.environment);
                consumer.run_scheduled(&ctx).await;
            }
            _ = &mut shutdown => {
                tracing::info!("shutting down");
                break;
            }
        }
    }
}
