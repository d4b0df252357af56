//! One driver run: build the engine an [`ExperimentConfig`] names, compute
//! its distribution, optionally cross-validate against the matching sampler,
//! and summarize.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::alternation::AlternationSequence;
use crate::config::{EngineKind, ExperimentConfig, SamplerConfig};
use crate::constants::SUMMARY_PERCENTILES;
use crate::distribution::{LatencyDistribution, OutputForm};
use crate::engine::{
    AlternationEngine, ExactJitterLossEngine, FixedIntervalEngine, LatencyEngine,
    LossyAlternationEngine,
};
use crate::error::{LatencyError, Result};
use crate::logging::RunLog;
use crate::simulation::{AlternationSampler, LatencySampler, PeriodicSampler};

/// JSON summary printed by the driver.
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub engine: &'static str,
    pub config: ExperimentConfig,
    pub timeout_probability: f64,
    pub mean_discovered: Option<f64>,
    pub percentiles: BTreeMap<String, u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sampler: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rmse: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub values: Option<Vec<f64>>,
}

fn sequence_of(cfg: &ExperimentConfig) -> Result<AlternationSequence> {
    if cfg.sequence.is_empty() {
        // a periodic broadcaster is a one-element alternation
        return AlternationSequence::new(vec![cfg.adv_interval()?]);
    }
    AlternationSequence::new(cfg.sequence.clone())
}

/// Advertising interval of a periodic engine; such engines take no sequence.
fn periodic_interval(cfg: &ExperimentConfig) -> Result<u64> {
    if !cfg.sequence.is_empty() {
        return Err(LatencyError::config(format!(
            "engine {:?} is periodic and takes no alternation sequence",
            cfg.engine
        )));
    }
    cfg.adv_interval()
}

pub fn build_engine(cfg: &ExperimentConfig, log: RunLog) -> Result<Box<dyn LatencyEngine>> {
    let scan = cfg.scan_params()?;
    Ok(match cfg.engine {
        EngineKind::Fixed => {
            if cfg.loss_percent > 0.0 {
                return Err(LatencyError::config(
                    "fixed engine is lossless; use the lossy engine for a loss rate",
                ));
            }
            Box::new(FixedIntervalEngine::new(periodic_interval(cfg)?, scan, log)?)
        }
        EngineKind::Alternation => {
            Box::new(AlternationEngine::new(sequence_of(cfg)?, scan, log)?)
        }
        EngineKind::Lossy => Box::new(LossyAlternationEngine::new(
            sequence_of(cfg)?,
            scan,
            cfg.loss()?,
            log,
        )?),
        EngineKind::Exact => Box::new(ExactJitterLossEngine::new(
            periodic_interval(cfg)?,
            scan,
            cfg.loss()?,
            cfg.max_adv_delay,
            log,
        )?),
    })
}

/// The sampler modelling the same schedule as `cfg.engine`.
pub fn build_sampler(cfg: &ExperimentConfig) -> Result<Box<dyn LatencySampler>> {
    let scan = cfg.scan_params()?;
    let loss = cfg.loss()?;
    Ok(match cfg.engine {
        EngineKind::Fixed | EngineKind::Exact => {
            let delay = if cfg.engine == EngineKind::Exact {
                cfg.max_adv_delay
            } else {
                0
            };
            Box::new(PeriodicSampler::new(
                periodic_interval(cfg)?,
                SamplerConfig::new(scan, loss, delay),
            )?)
        }
        EngineKind::Alternation | EngineKind::Lossy => {
            Box::new(AlternationSampler::new(sequence_of(cfg)?, scan, loss)?)
        }
    })
}

/// Compute, validate if asked, and summarize.
pub fn run(cfg: &ExperimentConfig, log: RunLog) -> Result<LatencySummary> {
    let engine = build_engine(cfg, log.clone())?;
    let pdf = engine.simulate_all(OutputForm::Pdf)?;
    log.info(format_args!(
        "{} engine done, timeout probability {:.6}",
        engine.name(),
        pdf.timeout_probability()
    ));

    let mut sampler_id = None;
    let mut rmse = None;
    if cfg.validate.is_some() {
        let sampler = build_sampler(cfg)?;
        let empirical = sampler.empirical(cfg.sample_count(), cfg.seed, OutputForm::Cdf)?;
        let err = pdf.rmse(&empirical)?;
        log.info(format_args!(
            "{} draws from {}: cdf rmse {:.6}",
            cfg.sample_count(),
            sampler.identifier(),
            err
        ));
        sampler_id = Some(sampler.identifier());
        rmse = Some(err);
    }

    Ok(summarize(engine.name(), cfg, &pdf, sampler_id, rmse))
}

fn summarize(
    engine: &'static str,
    cfg: &ExperimentConfig,
    pdf: &LatencyDistribution,
    sampler: Option<String>,
    rmse: Option<f64>,
) -> LatencySummary {
    let percentiles = SUMMARY_PERCENTILES
        .iter()
        .map(|&p| (format!("p{p}"), pdf.percentile(p as f64 / 100.0)))
        .collect();
    let values = cfg.cdf.then(|| pdf.to_cdf().into_values());
    LatencySummary {
        engine,
        config: cfg.clone(),
        timeout_probability: pdf.timeout_probability(),
        mean_discovered: pdf.mean_discovered(),
        percentiles,
        sampler,
        rmse,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(json: &str) -> ExperimentConfig {
        ExperimentConfig::from_json_str(json).unwrap()
    }

    #[test]
    fn test_unsupported_exact_regime_is_skippable() {
        let c = cfg(r#"{"engine":"exact","adv_interval":6000,"scan_interval":5120,
                        "scan_window":512,"end_time":20000}"#);
        let err = run(&c, RunLog::quiet()).unwrap_err();
        assert!(matches!(err, LatencyError::Unsupported { .. }));
        assert!(err.is_skippable());
    }

    #[test]
    fn test_fixed_rejects_loss() {
        let c = cfg(r#"{"engine":"fixed","adv_interval":100,"scan_interval":500,
                        "scan_window":50,"end_time":5000,"loss_percent":10}"#);
        assert!(build_engine(&c, RunLog::quiet()).is_err());
    }

    #[test]
    fn test_periodic_engines_reject_sequence() {
        for engine in ["fixed", "exact"] {
            let c = cfg(&format!(
                r#"{{"engine":"{engine}","adv_interval":250,"sequence":[90,130],
                    "scan_interval":600,"scan_window":60,"end_time":4000}}"#
            ));
            assert!(matches!(
                build_engine(&c, RunLog::quiet()),
                Err(LatencyError::Configuration { .. })
            ));
            assert!(matches!(build_sampler(&c), Err(LatencyError::Configuration { .. })));
        }
    }

    #[test]
    fn test_lossy_run_with_validation() {
        let c = cfg(r#"{"engine":"lossy","sequence":[90,130],"scan_interval":500,
                        "scan_window":60,"end_time":6000,"loss_percent":20,
                        "validate":4000,"cdf":true}"#);
        let summary = run(&c, RunLog::quiet()).unwrap();
        assert_eq!(summary.engine, "lossy");
        assert!(summary.rmse.unwrap() < 0.03);
        assert_eq!(summary.values.as_ref().unwrap().len(), 6002);
        assert!(summary.percentiles["p50"] <= summary.percentiles["p90"]);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["config"]["engine"], "lossy");
    }
}
