use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pbm_cleanup::adapters::{InMemoryCleanupMetrics, InMemoryNotificationBus};
use pbm_cleanup::application::CleanupCoordinator;
use pbm_cleanup::config::{AppConfig, LoggingConfig};
use pbm_cleanup::domain::cleanup::{CleanupCollector, FailureMask};
use pbm_cleanup::ports::{CleanupObserver, NotificationBus};

/// Stand-in for a storage subsystem that clears its data in the background.
struct SimulatedStore {
    name: &'static str,
    work: Duration,
    category: Option<FailureMask>,
}

impl CleanupObserver for SimulatedStore {
    fn observe(&self, collector: &CleanupCollector) {
        let pending = collector.add_pending_cleanup();
        let (name, work, category) = (self.name, self.work, self.category);
        tokio::spawn(async move {
            tokio::time::sleep(work).await;
            match category {
                Some(mask) => pending.fail(mask),
                None => pending.succeed(),
            }
            tracing::debug!(store = name, "Simulated store finished clearing");
        });
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    let coordinator_config = config.cleanup.coordinator_config()?;
    let topic = coordinator_config.topic.clone();

    let bus = Arc::new(InMemoryNotificationBus::new());
    let metrics = Arc::new(InMemoryCleanupMetrics::new());
    let coordinator = CleanupCoordinator::with_config(bus.clone(), metrics.clone(), coordinator_config);

    bus.subscribe(
        &topic,
        Arc::new(SimulatedStore {
            name: "cookies",
            work: Duration::from_millis(15),
            category: None,
        }),
    );
    bus.subscribe(
        &topic,
        Arc::new(SimulatedStore {
            name: "network-cache",
            work: Duration::from_millis(40),
            category: None,
        }),
    );

    info!(%topic, subscribers = bus.subscriber_count(&topic), "Running private session cleanup");
    let mask = coordinator.run_cycle().await?;

    if mask.is_success() {
        info!("All private session data cleared");
    } else {
        info!(%mask, categories = ?mask.category_names(), "Private session cleanup incomplete");
    }

    print!("{}", metrics.export_text());
    Ok(())
}
