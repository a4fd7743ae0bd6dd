use serde::{Deserialize, Serialize};
use std::fmt;

/// Device profile the upstream audit emulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    Desktop,
    Mobile,
}

impl Strategy {
    pub const ALL: [Strategy; 2] = [Strategy::Desktop, Strategy::Mobile];

    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Desktop => "desktop",
            Strategy::Mobile => "mobile",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four audit dimensions requested for every URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Performance,
    Accessibility,
    BestPractices,
    Seo,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Performance,
        Category::Accessibility,
        Category::BestPractices,
        Category::Seo,
    ];

    /// Canonical upstream name, also used as the `category` query parameter
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Performance => "performance",
            Category::Accessibility => "accessibility",
            Category::BestPractices => "best-practices",
            Category::Seo => "seo",
        }
    }

    /// Column label used by tabular exports
    pub fn label(&self) -> &'static str {
        match self {
            Category::Performance => "Performance",
            Category::Accessibility => "Accessibility",
            Category::BestPractices => "Best Practices",
            Category::Seo => "SEO",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named sub-measurements copied from the upstream `audits` mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuditId {
    FirstContentfulPaint,
    Interactive,
    LargestContentfulPaint,
    CumulativeLayoutShift,
    TotalBlockingTime,
    ServerResponseTime,
    InteractionToNextPaint,
}

impl AuditId {
    pub const ALL: [AuditId; 7] = [
        AuditId::FirstContentfulPaint,
        AuditId::Interactive,
        AuditId::LargestContentfulPaint,
        AuditId::CumulativeLayoutShift,
        AuditId::TotalBlockingTime,
        AuditId::ServerResponseTime,
        AuditId::InteractionToNextPaint,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditId::FirstContentfulPaint => "first-contentful-paint",
            AuditId::Interactive => "interactive",
            AuditId::LargestContentfulPaint => "largest-contentful-paint",
            AuditId::CumulativeLayoutShift => "cumulative-layout-shift",
            AuditId::TotalBlockingTime => "total-blocking-time",
            AuditId::ServerResponseTime => "server-response-time",
            AuditId::InteractionToNextPaint => "interaction-to-next-paint",
        }
    }
}

impl fmt::Display for AuditId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Score of a single category. `0` doubles as "unknown".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
}

/// Display value and score of a single audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetric {
    #[serde(rename = "displayValue")]
    pub display_value: String,
    pub score: f64,
}

impl Default for AuditMetric {
    fn default() -> Self {
        Self {
            display_value: NOT_AVAILABLE.to_string(),
            score: 0.0,
        }
    }
}

/// Placeholder for values the upstream did not provide
pub const NOT_AVAILABLE: &str = "N/A";

/// Category scores, one field per category so none can go missing
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CategoryScores {
    pub performance: CategoryScore,
    pub accessibility: CategoryScore,
    #[serde(rename = "best-practices")]
    pub best_practices: CategoryScore,
    pub seo: CategoryScore,
}

impl CategoryScores {
    pub fn get(&self, category: Category) -> &CategoryScore {
        match category {
            Category::Performance => &self.performance,
            Category::Accessibility => &self.accessibility,
            Category::BestPractices => &self.best_practices,
            Category::Seo => &self.seo,
        }
    }

    pub fn get_mut(&mut self, category: Category) -> &mut CategoryScore {
        match category {
            Category::Performance => &mut self.performance,
            Category::Accessibility => &mut self.accessibility,
            Category::BestPractices => &mut self.best_practices,
            Category::Seo => &mut self.seo,
        }
    }
}

/// Audit metrics, one field per tracked audit
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AuditMetrics {
    #[serde(rename = "first-contentful-paint")]
    pub first_contentful_paint: AuditMetric,
    pub interactive: AuditMetric,
    #[serde(rename = "largest-contentful-paint")]
    pub largest_contentful_paint: AuditMetric,
    #[serde(rename = "cumulative-layout-shift")]
    pub cumulative_layout_shift: AuditMetric,
    #[serde(rename = "total-blocking-time")]
    pub total_blocking_time: AuditMetric,
    #[serde(rename = "server-response-time")]
    pub server_response_time: AuditMetric,
    #[serde(rename = "interaction-to-next-paint")]
    pub interaction_to_next_paint: AuditMetric,
}

impl AuditMetrics {
    pub fn get(&self, audit: AuditId) -> &AuditMetric {
        match audit {
            AuditId::FirstContentfulPaint => &self.first_contentful_paint,
            AuditId::Interactive => &self.interactive,
            AuditId::LargestContentfulPaint => &self.largest_contentful_paint,
            AuditId::CumulativeLayoutShift => &self.cumulative_layout_shift,
            AuditId::TotalBlockingTime => &self.total_blocking_time,
            AuditId::ServerResponseTime => &self.server_response_time,
            AuditId::InteractionToNextPaint => &self.interaction_to_next_paint,
        }
    }

    pub fn get_mut(&mut self, audit: AuditId) -> &mut AuditMetric {
        match audit {
            AuditId::FirstContentfulPaint => &mut self.first_contentful_paint,
            AuditId::Interactive => &mut self.interactive,
            AuditId::LargestContentfulPaint => &mut self.largest_contentful_paint,
            AuditId::CumulativeLayoutShift => &mut self.cumulative_layout_shift,
            AuditId::TotalBlockingTime => &mut self.total_blocking_time,
            AuditId::ServerResponseTime => &mut self.server_response_time,
            AuditId::InteractionToNextPaint => &mut self.interaction_to_next_paint,
        }
    }
}

/// Fixed-shape audit result for one URL and one strategy.
///
/// Every category and every tracked audit is always present. The
/// `Default` value is the all-defaults result (scores `0`, audits `"N/A"`).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedAuditResult {
    pub categories: CategoryScores,
    pub audits: AuditMetrics,
}

impl NormalizedAuditResult {
    pub fn category_score(&self, category: Category) -> f64 {
        self.categories.get(category).score
    }

    pub fn audit(&self, audit: AuditId) -> &AuditMetric {
        self.audits.get(audit)
    }
}
