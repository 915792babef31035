//! Narrative service -- natural-language explanations from a hosted model.
//!
//! Purely advisory. Nothing here feeds back into scores or status, and every
//! failure degrades to deterministic fallback text instead of an error.

pub mod format;
pub mod openai;
pub mod prompt;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::monitor::alert::ALERT_THRESHOLD;
use crate::monitor::{scorer, MachineData, MachineStatus};
use crate::registry::Machine;

#[derive(Debug, Error)]
pub enum NarrativeError {
    #[error("narrative service is not configured")]
    Unavailable,

    #[error("narrative service timed out after {0:?}")]
    Timeout(Duration),

    #[error("narrative request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("narrative service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed narrative response: {0}")]
    Malformed(String),
}

/// A system instruction plus the user request.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Text-generation capability: prompt in, text out.
#[async_trait::async_trait]
pub trait NarrativeService: Send + Sync {
    async fn complete(&self, prompt: &Prompt) -> Result<String, NarrativeError>;
}

/// Where a facility report's text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct FacilityReport {
    pub report: String,
    pub machine_count: usize,
    pub generated_at: DateTime<Utc>,
    pub source: ReportSource,
}

/// Text used whenever an anomaly explanation cannot be produced.
pub fn anomaly_fallback(score: f64) -> String {
    format!(
        "**Issue**: Anomaly detected with score {:.2}\n**Action**: Manual inspection recommended.",
        score
    )
}

/// Single-attempt, time-bounded access to an optional [`NarrativeService`].
#[derive(Clone)]
pub struct Narrator {
    service: Option<Arc<dyn NarrativeService>>,
    timeout: Duration,
}

impl Narrator {
    pub fn new(service: Arc<dyn NarrativeService>, timeout: Duration) -> Self {
        Self {
            service: Some(service),
            timeout,
        }
    }

    /// A narrator with no backing service; every call yields fallback text.
    pub fn disabled() -> Self {
        Self {
            service: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn is_available(&self) -> bool {
        self.service.is_some()
    }

    async fn complete(&self, prompt: &Prompt) -> Result<String, NarrativeError> {
        let service = self.service.as_ref().ok_or(NarrativeError::Unavailable)?;
        let text = tokio::time::timeout(self.timeout, service.complete(prompt))
            .await
            .map_err(|_| NarrativeError::Timeout(self.timeout))??;
        let cleaned = format::clean_text_formatting(&text);
        if cleaned.is_empty() {
            return Err(NarrativeError::Malformed("empty completion".to_string()));
        }
        Ok(cleaned)
    }

    /// Explain an anomalous reading. `None` below the alert threshold.
    pub async fn explain_anomaly(
        &self,
        machine: &Machine,
        data: &MachineData,
        score: f64,
    ) -> Option<String> {
        if score < ALERT_THRESHOLD {
            return None;
        }

        let prompt = prompt::anomaly_prompt(machine, data, score);
        match self.complete(&prompt).await {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(machine_id = %machine.id, score, error = %e, "anomaly narrative unavailable, using fallback");
                Some(anomaly_fallback(score))
            }
        }
    }

    /// Summarize the latest reading of every machine into one report.
    pub async fn performance_report(&self, readings: &[(Machine, MachineData)]) -> FacilityReport {
        let generated_at = Utc::now();
        let machine_count = readings.len();

        if readings.is_empty() {
            return FacilityReport {
                report: "**Summary**: No machine data available yet. Request current machine data before generating a report.".to_string(),
                machine_count,
                generated_at,
                source: ReportSource::Fallback,
            };
        }

        let prompt = prompt::performance_prompt(readings);
        let (report, source) = match self.complete(&prompt).await {
            Ok(text) => {
                info!(machines = machine_count, "facility report generated");
                (text, ReportSource::Model)
            }
            Err(e) => {
                warn!(machines = machine_count, error = %e, "facility report unavailable, using local summary");
                (local_summary(readings), ReportSource::Fallback)
            }
        };

        FacilityReport {
            report,
            machine_count,
            generated_at,
            source,
        }
    }
}

fn reading_score(machine: &Machine, data: &MachineData) -> f64 {
    data.anomaly_score
        .unwrap_or_else(|| scorer::anomaly_score(machine, data))
}

/// Deterministic report built from the readings alone.
fn local_summary(readings: &[(Machine, MachineData)]) -> String {
    let count = |status: MachineStatus| readings.iter().filter(|(_, d)| d.status == status).count();
    let scores: Vec<f64> = readings.iter().map(|(m, d)| reading_score(m, d)).collect();
    let mean = scores.iter().sum::<f64>() / scores.len() as f64;

    let mut lines = vec![format!(
        "**Summary**: {} machines reporting; {} critical, {} warning, {} normal. Mean anomaly score {:.2}.",
        readings.len(),
        count(MachineStatus::Critical),
        count(MachineStatus::Warning),
        count(MachineStatus::Normal),
        mean
    )];

    let worst = readings
        .iter()
        .zip(&scores)
        .fold(None::<(&Machine, f64)>, |acc, ((m, _), &s)| match acc {
            Some((_, best)) if best >= s => acc,
            _ => Some((m, s)),
        });
    if let Some((machine, score)) = worst {
        lines.push(format!(
            "**Concerns**: {} has the highest anomaly score ({:.2}).",
            machine.name, score
        ));
    }
    lines.push(
        "**Recommendations**: Inspect machines in critical status first; AI analysis was unavailable for this report."
            .to_string(),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::monitor::MetricValues;
    use crate::testutil::machine;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Canned {
        reply: Result<&'static str, ()>,
        calls: AtomicUsize,
    }

    impl Canned {
        fn ok(text: &'static str) -> Arc<Self> {
            Arc::new(Self { reply: Ok(text), calls: AtomicUsize::new(0) })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self { reply: Err(()), calls: AtomicUsize::new(0) })
        }
    }

    #[async_trait::async_trait]
    impl NarrativeService for Canned {
        async fn complete(&self, _prompt: &Prompt) -> Result<String, NarrativeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply
                .map(str::to_string)
                .map_err(|_| NarrativeError::Malformed("no choices".into()))
        }
    }

    struct Stalled;

    #[async_trait::async_trait]
    impl NarrativeService for Stalled {
        async fn complete(&self, _prompt: &Prompt) -> Result<String, NarrativeError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".into())
        }
    }

    fn reading(temperature: f64) -> (Machine, MachineData) {
        let m = machine("m");
        let mut values = MetricValues::centered(&m);
        values.temperature = temperature;
        let mut data = MachineData::new(&m, values);
        data.anomaly_score = Some(scorer::anomaly_score(&m, &data));
        (m, data)
    }

    #[tokio::test]
    async fn test_below_threshold_skips_service() {
        let service = Canned::ok("**Issue**: x");
        let narrator = Narrator::new(service.clone(), Duration::from_secs(1));
        let (m, d) = reading(70.0);
        assert!(narrator.explain_anomaly(&m, &d, 0.29).await.is_none());
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_text_is_cleaned() {
        let narrator = Narrator::new(Canned::ok("\n  **Issue**: Overheating\n**Cause**: Fan\n\n"), Duration::from_secs(1));
        let (m, d) = reading(120.0);
        let text = narrator.explain_anomaly(&m, &d, 0.9).await.unwrap();
        assert_eq!(text, "**Issue**: Overheating\n**Cause**: Fan");
    }

    #[tokio::test]
    async fn test_failure_falls_back_once() {
        let service = Canned::failing();
        let narrator = Narrator::new(service.clone(), Duration::from_secs(1));
        let (m, d) = reading(120.0);
        let text = narrator.explain_anomaly(&m, &d, 0.9).await.unwrap();
        assert_eq!(text, anomaly_fallback(0.9));
        assert!(text.contains("0.90"));
        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_timeout_falls_back() {
        let narrator = Narrator::new(Arc::new(Stalled), Duration::from_millis(50));
        let (m, d) = reading(120.0);
        let text = narrator.explain_anomaly(&m, &d, 0.9).await.unwrap();
        assert_eq!(text, anomaly_fallback(0.9));
    }

    #[tokio::test]
    async fn test_disabled_narrator_falls_back() {
        let narrator = Narrator::disabled();
        assert!(!narrator.is_available());
        let (m, d) = reading(120.0);
        assert_eq!(narrator.explain_anomaly(&m, &d, 0.45).await, Some(anomaly_fallback(0.45)));
    }

    #[tokio::test]
    async fn test_report_sources() {
        let readings = vec![reading(70.0), reading(200.0)];

        let report = Narrator::new(Canned::ok("**Summary**: fine"), Duration::from_secs(1))
            .performance_report(&readings)
            .await;
        assert_eq!(report.source, ReportSource::Model);
        assert_eq!(report.machine_count, 2);

        let report = Narrator::disabled().performance_report(&readings).await;
        assert_eq!(report.source, ReportSource::Fallback);
        assert!(report.report.contains("2 machines reporting; 1 critical, 0 warning, 1 normal"));

        let empty = Narrator::new(Canned::ok("unused"), Duration::from_secs(1))
            .performance_report(&[])
            .await;
        assert_eq!(empty.source, ReportSource::Fallback);
        assert_eq!(empty.machine_count, 0);
    }
}
