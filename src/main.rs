#[macro_use]
extern crate rocket;

use envoy_monitor::api::response::{inventory::Inventory, inverters::Inverter};
use envoy_monitor::api::response::production::Production;
use envoy_monitor::model::{Snapshot, Summary};
use envoy_monitor::state::SharedSnapshot;
use envoy_monitor::{api, metrics, refresh, settings};
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use std::sync::Arc;

fn latest(state: &State<SharedSnapshot>) -> Result<Arc<Snapshot>, api::Error> {
    state.latest().ok_or(api::Error::NoData)
}

#[get("/")]
fn index(state: &State<SharedSnapshot>) -> Result<RawHtml<String>, api::Error> {
    let summary = latest(state)?.summary();

    Ok(RawHtml(format!(
        "<html><head><title>Envoy</title><meta http-equiv=\"refresh\" content=\"5\"></head><body>\
         <h3>Now</h3>\
         <p>Production: {:.0} W / {} W</p><p>Consumption: {:.0} W</p><p>Net: {:.0} W</p>\
         <h3>Today</h3>\
         <p>Production: {:.2} kWh</p><p>Consumption: {:.2} kWh</p><p>Net: {:.2} kWh</p>\
         <p><small>Updated {}</small></p>\
         </body></html>",
        summary.now.production,
        summary.system_max,
        summary.now.consumption,
        summary.now.net,
        summary.today.production / 1000.0,
        summary.today.consumption / 1000.0,
        summary.today.net / 1000.0,
        summary.updated.to_rfc3339(),
    )))
}

#[get("/api/production")]
fn production_route(state: &State<SharedSnapshot>) -> Result<Json<Production>, api::Error> {
    latest(state).map(|s| Json(s.production.clone()))
}

#[get("/api/inventory")]
fn inventory_route(state: &State<SharedSnapshot>) -> Result<Json<Vec<Inventory>>, api::Error> {
    latest(state).map(|s| Json(s.inventory.clone()))
}

#[get("/api/inverters")]
fn inverters_route(state: &State<SharedSnapshot>) -> Result<Json<Vec<Inverter>>, api::Error> {
    latest(state).map(|s| Json(s.inverters.clone()))
}

#[get("/api/summary")]
fn summary_route(state: &State<SharedSnapshot>) -> Result<Json<Summary>, api::Error> {
    latest(state).map(|s| Json(s.summary()))
}

#[get("/metrics")]
fn metrics_route() -> Result<String, api::Error> {
    metrics::read()
}

fn server(state: SharedSnapshot) -> Rocket<Build> {
    rocket::build().manage(state).mount(
        "/",
        routes![
            index,
            production_route,
            inventory_route,
            inverters_route,
            summary_route,
            metrics_route
        ],
    )
}

#[rocket::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let settings = settings::read_settings()?;
    let (store, credentials) = settings::load_credentials(&settings)?;
    let envoy = settings::envoy(&settings, credentials)?;

    let state = SharedSnapshot::new();
    let (tx, rx) = tokio::sync::oneshot::channel();
    let updater = tokio::spawn(refresh::run(
        envoy,
        store,
        state.clone(),
        settings.interval(),
        rx,
    ));

    if let Err(e) = server(state).launch().await {
        log::error!("Server failed unexpectedly: {}", e);
    }

    if tx.send(()).is_err() {
        log::warn!("Refresh loop already stopped");
    }
    updater.await?;

    Ok(())
}
