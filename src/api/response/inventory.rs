use serde::{Deserialize, Serialize};

/* Device groups are keyed by `type`: "PCU" (micro-inverters), "ACB" (batteries), "NSRB" (relays) */
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub devices: Vec<Device>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    #[serde(default)]
    pub part_num: String,
    #[serde(default)]
    pub installed: String,
    #[serde(default)]
    pub serial_num: String,
    #[serde(default)]
    pub device_status: Vec<String>,
    #[serde(default)]
    pub last_rpt_date: String,
    #[serde(default)]
    pub admin_state: i32,
    #[serde(default)]
    pub dev_type: i32,
    #[serde(default)]
    pub img_pnum_running: String,
    #[serde(default)]
    pub producing: bool,
    #[serde(default)]
    pub communicating: bool,
    #[serde(default)]
    pub provisioned: bool,
    #[serde(default)]
    pub operating: bool,
}
