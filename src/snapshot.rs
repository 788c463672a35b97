use chrono::{DateTime, Utc};
use serde::Serialize;

/// The latest captured value of every sensor kind. A `None` field means no
/// capture has succeeded for that device yet; it serializes as JSON `null`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub soil_moisture: Option<i64>,
    pub temperature: Option<i64>,
    pub humidity: Option<i64>,
    pub soil_temperature: Option<f64>,
    pub visible: Option<i64>,
    pub infra_red: Option<i64>,
    pub ultra_violet: Option<f64>,
    pub relay: Option<bool>,
    pub button1: Option<bool>,
    pub button2: Option<bool>,
    #[serde(skip)]
    pub captured_at: Option<DateTime<Utc>>,
}
