//! Temporal projection of a risk score over future years.
//!
//! projected(year) = clamp(current + rate · year · age_accelerator, 0, 100)
//! age_accelerator = 1 + max(0, age − onset) / span

use serde::{Deserialize, Serialize};

use cardiosense_common::{ProjectionConfig, RiskLevel, RiskTrend};

use crate::classifier::RiskThresholds;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub year: u32,
    pub projected_risk: f64,
    pub risk_category: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalProjection {
    pub trend: RiskTrend,
    pub current_score: f64,
    pub age_accelerator: f64,
    pub points: Vec<ProjectionPoint>,
}

#[derive(Debug, Clone)]
pub struct TemporalProjector {
    config: ProjectionConfig,
    thresholds: RiskThresholds,
}

impl Default for TemporalProjector {
    fn default() -> Self {
        Self::new(ProjectionConfig::default(), RiskThresholds::default())
    }
}

impl TemporalProjector {
    pub fn new(config: ProjectionConfig, thresholds: RiskThresholds) -> Self {
        Self { config, thresholds }
    }

    pub fn age_accelerator(&self, age: f64) -> f64 {
        let span = if self.config.accelerator_span_years > 0.0 {
            self.config.accelerator_span_years
        } else {
            1.0
        };
        1.0 + (age - self.config.accelerator_onset_age).max(0.0) / span
    }

    pub fn project(&self, current_score: f64, age: f64, trend: RiskTrend) -> TemporalProjection {
        let rate = self.config.rate_for(trend);
        let accelerator = self.age_accelerator(age);
        let current = current_score.clamp(0.0, 100.0);

        let points = self
            .config
            .horizons
            .iter()
            .map(|&year| {
                let projected = (current + rate * year as f64 * accelerator).clamp(0.0, 100.0);
                ProjectionPoint {
                    year,
                    projected_risk: projected,
                    risk_category: self.thresholds.classify(projected),
                }
            })
            .collect();

        TemporalProjection {
            trend,
            current_score: current,
            age_accelerator: accelerator,
            points,
        }
    }

    /// Improving, stable and worsening projections side by side.
    pub fn project_scenarios(&self, current_score: f64, age: f64) -> Vec<TemporalProjection> {
        RiskTrend::ALL
            .iter()
            .map(|trend| self.project(current_score, age, *trend))
            .collect()
    }
}
