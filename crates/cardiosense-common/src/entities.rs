//! Core patient and risk types shared by the scoring engine, the advisor
//! and the HTTP layer.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Demographics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

impl Gender {
    pub fn is_male(&self) -> bool {
        matches!(self, Gender::Male)
    }

    /// Parse the loose strings the intake forms send ("M", "male", "1", ...).
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "m" | "male" | "man" | "1" => Gender::Male,
            "f" | "female" | "woman" | "0" => Gender::Female,
            _ => Gender::Unspecified,
        }
    }
}

/// Named population group used for ensemble calibration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum PopulationGroup {
    #[default]
    General,
    SouthAsian,
    EastAsian,
    African,
    Hispanic,
    European,
}

impl PopulationGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            PopulationGroup::General    => "general",
            PopulationGroup::SouthAsian => "south_asian",
            PopulationGroup::EastAsian  => "east_asian",
            PopulationGroup::African    => "african",
            PopulationGroup::Hispanic   => "hispanic",
            PopulationGroup::European   => "european",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Sedentary,
    #[default]
    Moderate,
    Active,
}

// ---------------------------------------------------------------------------
// Raw patient input
// ---------------------------------------------------------------------------

/// Raw patient-entered data. Every field is optional; the feature extractor
/// substitutes defaults for anything missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientInput {
    pub age: Option<f64>,
    pub gender: Option<Gender>,
    #[serde(alias = "systolicBP")]
    pub systolic_bp: Option<f64>,
    #[serde(alias = "diastolicBP")]
    pub diastolic_bp: Option<f64>,
    pub total_cholesterol: Option<f64>,
    pub hdl_cholesterol: Option<f64>,
    pub ldl_cholesterol: Option<f64>,
    pub triglycerides: Option<f64>,
    pub fasting_glucose: Option<f64>,
    pub bmi: Option<f64>,
    pub smoker: Option<bool>,
    pub diabetes: Option<bool>,
    pub family_history: Option<bool>,
    pub treated_hypertension: Option<bool>,
    pub activity_level: Option<ActivityLevel>,
    pub population: Option<PopulationGroup>,

    // Auxiliary labs used by the biomarker-enhanced models
    pub hs_crp: Option<f64>,            // mg/L
    pub lipoprotein_a: Option<f64>,     // mg/dL
    pub hba1c: Option<f64>,             // %
    pub creatinine: Option<f64>,        // mg/dL

    /// Self-reported direction of travel, used by the temporal projector.
    pub trend: Option<RiskTrend>,
}

// ---------------------------------------------------------------------------
// Risk band
// ---------------------------------------------------------------------------

/// Ordinal risk band. Ordering follows severity so bands can be compared.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low      => "low",
            RiskLevel::Medium   => "medium",
            RiskLevel::High     => "high",
            RiskLevel::VeryHigh => "very-high",
        }
    }

    pub fn is_elevated(&self) -> bool {
        *self >= RiskLevel::High
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "low"       => Ok(RiskLevel::Low),
            "medium"    => Ok(RiskLevel::Medium),
            "high"      => Ok(RiskLevel::High),
            "very-high" => Ok(RiskLevel::VeryHigh),
            other       => Err(format!("unknown risk level: {other}")),
        }
    }
}

/// Qualitative trend flag for projections.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskTrend {
    Improving,
    #[default]
    Stable,
    Worsening,
}

impl RiskTrend {
    pub const ALL: [RiskTrend; 3] = [RiskTrend::Improving, RiskTrend::Stable, RiskTrend::Worsening];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTrend::Improving => "improving",
            RiskTrend::Stable    => "stable",
            RiskTrend::Worsening => "worsening",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::High < RiskLevel::VeryHigh);
        assert!(RiskLevel::High.is_elevated());
        assert!(!RiskLevel::Medium.is_elevated());
    }

    #[test]
    fn test_risk_level_parses_own_labels() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High, RiskLevel::VeryHigh] {
            assert_eq!(level.as_str().parse::<RiskLevel>(), Ok(level));
        }
        assert_eq!("VERY_HIGH".parse::<RiskLevel>(), Ok(RiskLevel::VeryHigh));
        assert!("severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_risk_level_serde_kebab() {
        let json = serde_json::to_string(&RiskLevel::VeryHigh).unwrap();
        assert_eq!(json, "\"very-high\"");
    }

    #[test]
    fn test_patient_input_accepts_camel_case_and_missing_fields() {
        let json = r#"{ "age": 65, "systolicBP": 170, "totalCholesterol": 280, "smoker": true }"#;
        let input: PatientInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.age, Some(65.0));
        assert_eq!(input.systolic_bp, Some(170.0));
        assert_eq!(input.total_cholesterol, Some(280.0));
        assert_eq!(input.smoker, Some(true));
        assert_eq!(input.diabetes, None);
    }

    #[test]
    fn test_gender_from_loose_strings() {
        assert_eq!(Gender::from_str("M"), Gender::Male);
        assert_eq!(Gender::from_str("female"), Gender::Female);
        assert_eq!(Gender::from_str("n/a"), Gender::Unspecified);
    }
}
