use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Device {
    /// Serial number
    #[serde(default)]
    pub sn: String,
    /// Part number
    #[serde(default)]
    pub pn: String,
    #[serde(default)]
    pub software: String,
    #[serde(default)]
    pub euaid: String,
    #[serde(default)]
    pub seqnum: u32,
    #[serde(default)]
    pub apiver: u32,
    #[serde(default)]
    pub imeter: bool,
}

/// `info.xml`, the only endpoint that answers in XML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename = "envoy_info")]
pub struct Info {
    #[serde(default)]
    pub time: i64,
    pub device: Device,
    #[serde(rename = "web-tokens", default)]
    pub web_tokens: bool,
}
