//! Advisor request and response types.

use serde::{Deserialize, Serialize};

use cardiosense_common::sanitize::sanitize_text;
use cardiosense_common::{PatientInput, RiskLevel};
use cardiosense_llm::parse::string_list;

/// One recommendation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Medicines,
    Ayurveda,
    Yoga,
    Diet,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Medicines, Category::Ayurveda, Category::Yoga, Category::Diet];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Medicines => "medicines",
            Category::Ayurveda  => "ayurveda",
            Category::Yoga      => "yoga",
            Category::Diet      => "diet",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestType {
    Medicines,
    Ayurveda,
    Yoga,
    Diet,
    #[default]
    Comprehensive,
}

impl RequestType {
    pub fn categories(&self) -> &'static [Category] {
        match self {
            RequestType::Medicines     => &[Category::Medicines],
            RequestType::Ayurveda      => &[Category::Ayurveda],
            RequestType::Yoga          => &[Category::Yoga],
            RequestType::Diet          => &[Category::Diet],
            RequestType::Comprehensive => &Category::ALL,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestType::Medicines     => "medicines",
            RequestType::Ayurveda      => "ayurveda",
            RequestType::Yoga          => "yoga",
            RequestType::Diet          => "diet",
            RequestType::Comprehensive => "comprehensive",
        }
    }
}

/// Suggestions keyed by category. Absent categories are omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Suggestions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub medicines: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ayurveda: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yoga: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diet: Option<Vec<String>>,
}

impl Suggestions {
    pub fn get(&self, category: Category) -> Option<&Vec<String>> {
        match category {
            Category::Medicines => self.medicines.as_ref(),
            Category::Ayurveda  => self.ayurveda.as_ref(),
            Category::Yoga      => self.yoga.as_ref(),
            Category::Diet      => self.diet.as_ref(),
        }
    }

    pub fn set(&mut self, category: Category, items: Vec<String>) {
        let slot = match category {
            Category::Medicines => &mut self.medicines,
            Category::Ayurveda  => &mut self.ayurveda,
            Category::Yoga      => &mut self.yoga,
            Category::Diet      => &mut self.diet,
        };
        *slot = Some(items);
    }

    /// Number of categories holding at least one item.
    pub fn non_empty_categories(&self) -> usize {
        Category::ALL
            .iter()
            .filter(|c| self.get(**c).is_some_and(|items| !items.is_empty()))
            .count()
    }

    /// Lenient read of a provider's `suggestions` object. Only the requested
    /// categories are kept; unusable entries are dropped.
    pub fn from_json(value: &serde_json::Value, wanted: &[Category]) -> Self {
        let mut out = Suggestions::default();
        for category in wanted {
            let items = string_list(&value[category.as_str()]);
            if !items.is_empty() {
                out.set(*category, items);
            }
        }
        out
    }

    /// Sanitize every item and drop the ones that end up empty.
    pub fn sanitized(self) -> Self {
        let clean = |items: Option<Vec<String>>| {
            items.map(|v| {
                v.iter()
                    .map(|s| sanitize_text(s))
                    .filter(|s| !s.is_empty())
                    .collect::<Vec<_>>()
            })
        };
        Self {
            medicines: clean(self.medicines),
            ayurveda: clean(self.ayurveda),
            yoga: clean(self.yoga),
            diet: clean(self.diet),
        }
    }
}

/// Who produced the suggestions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Gemini,
    Openai,
    Fallback,
}

impl Source {
    /// Map a chain provider name; unknown providers report as their
    /// closest wire-compatible family.
    pub fn from_provider(provider: &str) -> Self {
        match provider {
            "gemini" => Source::Gemini,
            "openai" => Source::Openai,
            _ => Source::Openai,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Gemini   => "gemini",
            Source::Openai   => "openai",
            Source::Fallback => "fallback",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(default)]
    pub patient: PatientInput,
    #[serde(default, alias = "requestType")]
    pub request_type: RequestType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub suggestions: Suggestions,
    pub warnings: Vec<String>,
    pub disclaimer: String,
    pub source: Source,
    pub risk_level: RiskLevel,
    pub risk_score: f64,
}
