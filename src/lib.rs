use std::time::Duration;

use log::{error, info};
use rocket::fairing::AdHoc;
use rocket::{catchers, routes, Build, Rocket};
use tokio::sync::Mutex;
use tokio_cron_scheduler::JobScheduler;

use crate::config::Config;
use crate::cron_jobs::register_cron_jobs;
use crate::modules::diagnostic::{health_url, http_client, run_diagnostic, StatusCell};
use crate::modules::models::general::DbPool;
use crate::routes::api;

pub mod config;
pub mod cron_jobs;
pub mod errors;
pub mod modules;
pub mod schema;

pub(crate) mod macros {
    pub(crate) mod database_error_handler;
}

pub mod routes {
    pub mod api {
        pub mod catalog;
        pub mod catchers;
        pub mod health;
        pub mod lap;
        pub mod leaderboard;
        pub mod user;
    }
}

/// the scheduler started at liftoff, kept so it can be stopped at shutdown
#[derive(Default)]
struct BackgroundJobs(Mutex<Option<JobScheduler>>);

/// # assemble the web server
/// the pool, the config and a fresh diagnostic status cell become managed
/// state. background jobs are only attached when the config enables them.
///
/// ## Arguments
/// * `config` - The loaded configuration
/// * `pool` - A pool on a migrated database
///
/// ## Returns
/// * `Rocket<Build>` - The server, ready to launch
pub fn build_rocket(config: &Config, pool: DbPool) -> Rocket<Build> {
    let rocket = rocket::build()
        .manage(pool)
        .manage(config.clone())
        .manage(StatusCell::new())
        .mount(
            "/api",
            routes![
                // accounts
                api::user::register,
                api::user::login,
                api::user::logout,
                api::user::get_current,
                api::user::delete_current,
                // catalog
                api::catalog::list_game_titles,
                api::catalog::create_game_title,
                api::catalog::list_car_models,
                api::catalog::create_car_model,
                api::catalog::list_tracks,
                api::catalog::create_track,
                // lap records
                api::lap::submit,
                api::lap::list,
                api::lap::stats,
                api::lap::get_one,
                api::leaderboard::get_leaderboard,
                // health
                api::health::health,
                api::health::diagnostic,
            ],
        )
        .register(
            "/",
            catchers![
                api::catchers::bad_request,
                api::catchers::unauthorized,
                api::catchers::forbidden,
                api::catchers::not_found,
                api::catchers::unprocessable,
                api::catchers::internal_error,
                api::catchers::default,
            ],
        );

    if config.background_jobs {
        rocket
            .manage(BackgroundJobs::default())
            .attach(start_background_jobs(config.diagnostic_interval()))
            .attach(stop_background_jobs())
    } else {
        rocket
    }
}

/// runs the diagnostic once the server listens and schedules the periodic jobs
fn start_background_jobs(diagnostic_interval: Duration) -> AdHoc {
    AdHoc::on_liftoff("Background jobs", move |rocket| {
        Box::pin(async move {
            let (Some(pool), Some(cell)) = (rocket.state::<DbPool>(), rocket.state::<StatusCell>()) else {
                error!(target: "lib:start_background_jobs", "pool or status cell missing, no background jobs");
                return;
            };

            let pool = pool.clone();
            let cell = cell.clone();
            let url = health_url(rocket.config().address, rocket.config().port);

            match register_cron_jobs(pool.clone(), cell.clone(), url.clone(), diagnostic_interval).await {
                Ok(scheduler) => {
                    if let Some(jobs) = rocket.state::<BackgroundJobs>() {
                        *jobs.0.lock().await = Some(scheduler);
                    }
                }
                Err(error) => error!(target: "lib:start_background_jobs", "{}", error),
            }

            // the first run must not hold up liftoff, it requests this server
            tokio::spawn(async move {
                match http_client() {
                    Ok(client) => {
                        run_diagnostic(&pool, &client, &url, &cell).await;
                    }
                    Err(error) => error!(target: "lib:start_background_jobs", "could not build http client: {}", error),
                }
            });
        })
    })
}

fn stop_background_jobs() -> AdHoc {
    AdHoc::on_shutdown("Stop background jobs", |rocket| {
        Box::pin(async move {
            let Some(jobs) = rocket.state::<BackgroundJobs>() else {
                return;
            };

            if let Some(mut scheduler) = jobs.0.lock().await.take() {
                match scheduler.shutdown().await {
                    Ok(()) => info!(target: "lib:stop_background_jobs", "background jobs stopped"),
                    Err(error) => error!(target: "lib:stop_background_jobs", "{:?}", error),
                }
            }
        })
    })
}
