use serde::{Deserialize, Serialize};

/* {"serialNumber":"123456789012","lastReportDate":1688000000,"devType":1,"lastReportWatts":123,"maxReportWatts":234} */
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Inverter {
    pub serial_number: String,
    #[serde(default)]
    pub last_report_date: i64,
    #[serde(default)]
    pub dev_type: Option<u32>,
    #[serde(default)]
    pub last_report_watts: i64,
    #[serde(default)]
    pub max_report_watts: u64,
}

/// Sum of `maxReportWatts` over all inverters.
pub fn system_max(inverters: &[Inverter]) -> u64 {
    inverters.iter().map(|i| i.max_report_watts).sum()
}
