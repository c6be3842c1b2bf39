use crate::api::Error;
use crate::model::Snapshot;
use lazy_static::lazy_static;
use prometheus::{
    opts, register_gauge, register_gauge_vec, register_int_counter, Encoder, Gauge, GaugeVec,
    IntCounter, TextEncoder,
};

lazy_static! {
    static ref WATTS_NOW_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "envoy_watts_now",
            "current power per channel (in W), negative net means export",
        ),
        &["channel"],
    )
    .unwrap();
    static ref WH_TODAY_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "envoy_wh_today",
            "energy per channel since midnight (in Wh)",
        ),
        &["channel"],
    )
    .unwrap();
    static ref INVERTER_WATTS_GAUGE: GaugeVec = register_gauge_vec!(
        opts!(
            "envoy_inverter_watts",
            "last power reported by inverter (in W)",
        ),
        &["serial"],
    )
    .unwrap();
    static ref SYSTEM_MAX_GAUGE: Gauge = register_gauge!(
        "envoy_system_max_watts",
        "sum of the maximum power reported by all inverters (in W)"
    )
    .unwrap();
    pub static ref REFRESH_FAILURES: IntCounter = register_int_counter!(
        "envoy_refresh_failures_total",
        "refresh cycles that left the published snapshot unchanged"
    )
    .unwrap();
}

/// Feed a freshly published snapshot into the registry.
pub fn record(snapshot: &Snapshot) {
    let summary = snapshot.summary();

    for (channel, now, today) in [
        ("production", summary.now.production, summary.today.production),
        ("consumption", summary.now.consumption, summary.today.consumption),
        ("net", summary.now.net, summary.today.net),
    ] {
        WATTS_NOW_GAUGE.with_label_values(&[channel]).set(now);
        WH_TODAY_GAUGE.with_label_values(&[channel]).set(today);
    }

    for inverter in &snapshot.inverters {
        INVERTER_WATTS_GAUGE
            .with_label_values(&[&inverter.serial_number])
            .set(inverter.last_report_watts as f64);
    }

    SYSTEM_MAX_GAUGE.set(summary.system_max as f64);
}

/// Read metrics from Prometheus exporter registry.
pub fn read() -> Result<String, Error> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();

    encoder
        .encode(&metric_families, &mut buffer)
        .or(Err(Error::InternalError))?;
    String::from_utf8(buffer).or(Err(Error::InternalError))
}

#[cfg(test)]
mod test {
    use super::{read, record};
    use crate::api::response::inverters::Inverter;
    use crate::api::response::production::{Channel, Production};
    use crate::model::Snapshot;
    use chrono::Utc;

    #[test]
    fn snapshot_is_exported() {
        let snapshot = Snapshot {
            production: Production {
                production: vec![Channel {
                    kind: String::from("eim"),
                    measurement_type: Some(String::from("production")),
                    w_now: 620.0,
                    ..Channel::default()
                }],
                ..Production::default()
            },
            inventory: vec![],
            inverters: vec![Inverter {
                serial_number: String::from("122100000009"),
                last_report_watts: 123,
                max_report_watts: 250,
                ..Inverter::default()
            }],
            updated: Utc::now(),
        };

        record(&snapshot);
        let text = read().unwrap();

        assert!(text.contains("envoy_watts_now{channel=\"production\"}"));
        assert!(text.contains("envoy_inverter_watts{serial=\"122100000009\"} 123"));
    }
}
