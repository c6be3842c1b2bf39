use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Interface {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub interface: String,
    #[serde(default)]
    pub mac: String,
    #[serde(default)]
    pub dhcp: bool,
    #[serde(default)]
    pub ip: String,
    #[serde(default)]
    pub signal_strength: i32,
    #[serde(default)]
    pub signal_strength_max: i32,
    #[serde(default)]
    pub carrier: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub web_comm: bool,
    #[serde(default)]
    pub ever_reported_to_enlighten: bool,
    #[serde(default)]
    pub last_enlighten_report_time: i64,
    #[serde(default)]
    pub primary_interface: String,
    #[serde(default)]
    pub interfaces: Vec<Interface>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Comm {
    #[serde(default)]
    pub num: i32,
    #[serde(default)]
    pub level: i32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Home {
    #[serde(default)]
    pub software_build_epoch: i64,
    #[serde(default)]
    pub is_nonvoy: bool,
    /// e.g. `"12 MB"`
    #[serde(default)]
    pub db_size: String,
    #[serde(default)]
    pub db_percent_full: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub current_date: String,
    #[serde(default)]
    pub current_time: String,
    #[serde(default)]
    pub network: Network,
    #[serde(default)]
    pub comm: Comm,
    #[serde(default)]
    pub alerts: Vec<serde_json::Value>,
    #[serde(default)]
    pub update_status: String,
}

impl Home {
    /// Database size in bytes, parsed from the human readable `db_size`. `None` when it does not
    /// parse or does not fit.
    pub fn db_size_bytes(&self) -> Option<u64> {
        let mut iter = self.db_size.split_ascii_whitespace();
        let number = iter.next()?.parse::<u64>().ok()?;
        let multiple = match iter.next().map(|s| s.to_ascii_uppercase()).as_deref() {
            Some("GB") => 1024 * 1024 * 1024,
            Some("MB") => 1024 * 1024,
            Some("KB") => 1024,
            _ => 1,
        };
        number.checked_mul(multiple)
    }
}
