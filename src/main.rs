#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate prometheus;
#[macro_use]
extern crate rocket;

use rocket::fairing::AdHoc;
use rocket::serde::json::Json;
use rocket::{Build, Rocket, State};
use smawebconnect_rs::model::MetricDefinitions;
use smawebconnect_rs::session::{FileSessionStore, SessionManager};
use smawebconnect_rs::settings::{self, Settings};
use smawebconnect_rs::{api, catalog, Error, MetricsQueue, Poller};

mod metrics;

/// Structure containing state for API handlers.
pub struct StateData {
    queue: MetricsQueue,
}

#[get("/metrics")]
fn metrics_route(state: &State<StateData>) -> Result<String, Error> {
    let drained = metrics::collect(&state.queue);
    log::debug!("Exported {} samples", drained);
    metrics::read()
}

#[get("/definitions")]
fn definitions_route() -> Json<MetricDefinitions> {
    Json(catalog::metric_definitions())
}

/// One poller per configured device, each with its own HTTP client and session file.
fn pollers(settings: &Settings, queue: &MetricsQueue) -> Result<Vec<Poller>, Error> {
    settings
        .devices()?
        .into_iter()
        .map(|device| -> Result<Poller, Error> {
            let client = api::client(settings.http_timeout())?;
            let store = FileSessionStore::new(device.session_file);
            let sessions =
                SessionManager::new(client.clone(), Box::new(store), &device.endpoint);

            Ok(Poller::new(device.endpoint, client, sessions, queue.clone())
                .with_sample_rate(settings.sample_rate())
                .with_max_login_retries(settings.max_login_retries))
        })
        .collect()
}

#[launch]
fn rocket() -> Rocket<Build> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let queue = MetricsQueue::new();
    let pollers = match settings::read_settings().and_then(|s| pollers(&s, &queue)) {
        Ok(pollers) => pollers,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    log::info!(
        "{} {} polling {} device(s)",
        smawebconnect_rs::NAME,
        smawebconnect_rs::VERSION,
        pollers.len()
    );

    rocket::build()
        .manage(StateData { queue })
        .attach(AdHoc::on_liftoff("SMA pollers", |_| {
            Box::pin(async move {
                for poller in pollers {
                    log::info!("Starting poller for {}", poller.device().base_url);
                    tokio::spawn(poller.run());
                }
            })
        }))
        .mount("/", routes![metrics_route, definitions_route])
}
