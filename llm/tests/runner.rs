use std::time::Duration;

use async_trait::async_trait;
use llm::{detect_profile, generate_within, Backend, BackendError, Generation, ModelFamily};

struct SlowBackend;

#[async_trait]
impl Backend for SlowBackend {
    fn name(&self) -> &str {
        "slow"
    }

    async fn generate(&self, _request: &Generation) -> Result<String, BackendError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok("{}".into())
    }

    async fn probe(&self) -> Result<String, BackendError> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok("hermes".into())
    }
}

struct HermesBackend;

#[async_trait]
impl Backend for HermesBackend {
    fn name(&self) -> &str {
        "hermes"
    }

    async fn generate(&self, request: &Generation) -> Result<String, BackendError> {
        Ok(request.prompt.clone())
    }

    async fn probe(&self) -> Result<String, BackendError> {
        Ok("OpenHermes-2.5".into())
    }
}

#[tokio::test(start_paused = true)]
async fn slow_generation_times_out() {
    let err = generate_within(&SlowBackend, &Generation::new("x"), Duration::from_secs(3))
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Timeout));
}

#[tokio::test(start_paused = true)]
async fn slow_probe_yields_unknown_profile() {
    let profile = detect_profile(&SlowBackend, Duration::from_secs(5)).await;
    assert_eq!(profile.family, ModelFamily::Generic);
    assert_eq!(profile.escalation_threshold, 0.7);
}

#[tokio::test]
async fn detected_hermes_profile() {
    let profile = detect_profile(&HermesBackend, Duration::from_secs(5)).await;
    assert_eq!(profile.family, ModelFamily::Hermes);
    let text = generate_within(&HermesBackend, &Generation::new("echo"), Duration::from_secs(1))
        .await
        .unwrap();
    assert_eq!(text, "echo");
}
