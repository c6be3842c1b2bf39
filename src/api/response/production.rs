use crate::model::Readings;
use serde::{Deserialize, Serialize};

pub const PRODUCTION: &str = "production";
pub const TOTAL_CONSUMPTION: &str = "total-consumption";
pub const NET_CONSUMPTION: &str = "net-consumption";

/// One meter channel of `production.json`.
///
/// Metered gateways tag each channel with `measurementType`; the inverter aggregate only carries
/// `type`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub measurement_type: Option<String>,
    #[serde(default)]
    pub active_count: u32,
    #[serde(default)]
    pub reading_time: i64,
    #[serde(default)]
    pub w_now: f64,
    #[serde(default)]
    pub wh_lifetime: f64,
    #[serde(default)]
    pub wh_today: f64,
    #[serde(default)]
    pub wh_last_seven_days: f64,
    #[serde(default)]
    pub rms_current: Option<f64>,
    #[serde(default)]
    pub rms_voltage: Option<f64>,
    #[serde(default)]
    pub pwr_factor: Option<f64>,
}

impl Channel {
    pub fn label(&self) -> &str {
        self.measurement_type.as_deref().unwrap_or(&self.kind)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Storage {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub active_count: u32,
    #[serde(default)]
    pub reading_time: i64,
    #[serde(default)]
    pub w_now: f64,
    #[serde(default)]
    pub wh_now: f64,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Production {
    #[serde(default)]
    pub production: Vec<Channel>,
    #[serde(default)]
    pub consumption: Vec<Channel>,
    #[serde(default)]
    pub storage: Vec<Storage>,
}

/// Value of the last channel labelled `label`, `0.0` when the gateway does not report it.
fn channel_value(channels: &[Channel], label: &str, value: fn(&Channel) -> f64) -> f64 {
    channels
        .iter()
        .rev()
        .find(|c| c.label() == label)
        .map(value)
        .unwrap_or(0.0)
}

impl Production {
    fn readings(&self, value: fn(&Channel) -> f64) -> Readings {
        Readings {
            production: channel_value(&self.production, PRODUCTION, value),
            consumption: channel_value(&self.consumption, TOTAL_CONSUMPTION, value),
            net: channel_value(&self.consumption, NET_CONSUMPTION, value),
        }
    }

    /// Instantaneous power in W.
    pub fn now(&self) -> Readings {
        self.readings(|c| c.w_now)
    }

    /// Energy since midnight in Wh.
    pub fn today(&self) -> Readings {
        self.readings(|c| c.wh_today)
    }
}
