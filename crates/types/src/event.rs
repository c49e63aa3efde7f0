use serde::{Deserialize, Serialize};

/// A priced cycle, emitted unconditionally by the Evaluator for every cycle
/// touched by a reserve update — even when `rate <= 0` — so observers can
/// tell a quiescent pool apart from a cycle that no longer exists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateUpdate {
    pub path_id:          String,
    pub path_description: String,
    pub rate:             f64
}

const MESSAGE_TYPE: &str = "arbitrageRateUpdated";

/// The wire shape delivered to Broadcaster observers:
/// `{"type":"arbitrageRateUpdated","pathId":...,"pathDescription":...,"rate":...}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArbitrageRateUpdatedMessage {
    #[serde(rename = "type")]
    pub kind:             String,
    #[serde(rename = "pathId")]
    pub path_id:          String,
    #[serde(rename = "pathDescription")]
    pub path_description: String,
    pub rate:             f64
}

impl From<RateUpdate> for ArbitrageRateUpdatedMessage {
    fn from(update: RateUpdate) -> Self {
        Self {
            kind:             MESSAGE_TYPE.to_string(),
            path_id:          update.path_id,
            path_description: update.path_description,
            rate:             update.rate
        }
    }
}
