use std::sync::Arc;
use std::time::Duration;

use brain::{Classifier, GoalRegistry, ItemBook, Pipeline, Router, ITEMS_FILE};
use clap::Parser;
use dotenvy::dotenv;
use llm::{detect_profile, Backend, BackendProfile, KoboldClient, OllamaClient};
use memory::{CachedStore, KeywordStore, KnowledgeStore, NoKnowledge};
use motor::{Actuator, HttpActuator, LoggingActuator, Motor};
use runtime::{init_logging, server, Agent, Config};
use sensor::{Frame, HttpPerception, Perception, ScriptedPerception};
use tokio::sync::watch;
use tracing::{info, warn};

const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging("info");
    let config = Config::parse();

    let (strategic, profile) = match &config.strategic_url {
        Some(url) => {
            let backend: Arc<dyn Backend> = Arc::new(KoboldClient::new(url));
            let profile = detect_profile(backend.as_ref(), PROBE_TIMEOUT).await;
            (Some(backend), profile)
        }
        None => {
            info!("no strategic server configured");
            (None, BackendProfile::unknown())
        }
    };

    let mut router = Router::new(config.router_config(&profile))
        .with_knowledge(knowledge(&config).await)
        .with_items(items(&config).await);
    if let Some(backend) = strategic {
        router = router.with_strategic(backend, profile);
    }
    if !config.no_local {
        let local = OllamaClient::new(&config.local_url, config.local_model.clone());
        if let Err(e) = local.probe().await {
            warn!(error = %e, model = %config.local_model, "local model not ready");
        }
        router = router.with_local(Arc::new(local));
    }

    let pipeline = Pipeline::new(
        GoalRegistry::default(),
        Classifier::new(config.low_health),
        router,
    );

    let perception: Arc<dyn Perception> = match &config.perception_url {
        Some(url) => Arc::new(HttpPerception::new(url).with_timeout(config.capture_timeout())),
        None => {
            warn!("no perception service configured, the game will never look active");
            Arc::new(ScriptedPerception::new([Frame::inactive()]))
        }
    };
    let actuator: Arc<dyn Actuator> = match &config.actuator_url {
        Some(url) => Arc::new(HttpActuator::new(url)),
        None => {
            info!("no actuator configured, actions are only logged");
            Arc::new(LoggingActuator)
        }
    };

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let (agent, control) = Agent::new(
        pipeline,
        perception,
        Motor::new(actuator),
        config.agent_config(),
        shutdown_rx,
    );
    let agent = tokio::spawn(agent.run());

    let app = server::router(control);
    let listener = tokio::net::TcpListener::bind(config.control_addr).await?;
    info!(addr = %config.control_addr, "control surface listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await?;

    shutdown_tx.send_replace(true);
    let status = agent.await?;
    info!(
        cycles = status.cycles,
        executions = status.executions,
        "agent stopped"
    );
    Ok(())
}

async fn knowledge(config: &Config) -> Arc<dyn KnowledgeStore> {
    let Some(dir) = &config.knowledge_dir else {
        return Arc::new(NoKnowledge);
    };
    match KeywordStore::load_dir(dir).await {
        Ok(store) => {
            info!(dir = %dir.display(), chunks = store.len(), "knowledge loaded");
            Arc::new(CachedStore::new(store))
        }
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "knowledge unavailable");
            Arc::new(NoKnowledge)
        }
    }
}

async fn items(config: &Config) -> ItemBook {
    let Some(dir) = &config.knowledge_dir else {
        return ItemBook::new();
    };
    let path = dir.join(ITEMS_FILE);
    if !path.exists() {
        return ItemBook::new();
    }
    match ItemBook::load(&path).await {
        Ok(book) => {
            info!(items = book.len(), god_rolls = book.god_rolls(), "item knowledge loaded");
            book
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "item knowledge unavailable");
            ItemBook::new()
        }
    }
}
