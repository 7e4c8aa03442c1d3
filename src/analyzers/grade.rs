use serde::Serialize;

/// Area health tier derived from the share of hotspot points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthLevel {
    Excellent,
    Good,
    Fair,
    Poor,
    Critical,
}

impl HealthLevel {
    pub fn label(&self) -> &'static str {
        match self {
            HealthLevel::Excellent => "excellent",
            HealthLevel::Good => "good",
            HealthLevel::Fair => "fair",
            HealthLevel::Poor => "poor",
            HealthLevel::Critical => "critical",
        }
    }
}

/// Health tier and score of an area. `score` is `None` when there is nothing to grade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AreaHealth {
    pub level: HealthLevel,
    pub score: Option<u8>,
}

/// Grades an area from its hotspot share. First matching row wins.
///
/// | Condition               | Level     | Score |
/// |-------------------------|-----------|-------|
/// | total == 0              | Excellent | none  |
/// | hot_ratio > 0.40        | Critical  | 20    |
/// | hot_ratio > 0.25        | Poor      | 40    |
/// | hot_ratio > 0.10        | Fair      | 60    |
/// | hotspot_count > 0       | Good      | 80    |
/// | otherwise               | Excellent | 95    |
pub fn grade_area(total: usize, hotspot_count: usize, hot_ratio: f64) -> AreaHealth {
    let (level, score) = match hot_ratio {
        _ if total == 0 => (HealthLevel::Excellent, None),
        r if r > 0.40 => (HealthLevel::Critical, Some(20)),
        r if r > 0.25 => (HealthLevel::Poor, Some(40)),
        r if r > 0.10 => (HealthLevel::Fair, Some(60)),
        _ if hotspot_count > 0 => (HealthLevel::Good, Some(80)),
        _ => (HealthLevel::Excellent, Some(95)),
    };

    AreaHealth { level, score }
}
