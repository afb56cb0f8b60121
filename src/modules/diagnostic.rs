use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use log::{error, info, warn};
use serde::Serialize;

use crate::modules::models::general::{ping, DbPool};

/// how long the self check waits for the health endpoint
pub const HEALTH_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl ComponentStatus {
    fn from_check(ok: bool) -> ComponentStatus {
        if ok {
            ComponentStatus::Healthy
        } else {
            ComponentStatus::Unhealthy
        }
    }
}

/// result of the latest diagnostic run
#[derive(Serialize, Clone, PartialEq, Debug, Default)]
pub struct DiagnosticStatus {
    pub last_check: Option<NaiveDateTime>,
    pub database_status: ComponentStatus,
    pub api_status: ComponentStatus,
    pub error_count: u64,
}

/// shared handle on the diagnostic status. the job writes it, the
/// `/api/diagnostic` route reads it. cloning shares the same status.
#[derive(Clone, Default, Debug)]
pub struct StatusCell(Arc<RwLock<DiagnosticStatus>>);

impl StatusCell {
    pub fn new() -> StatusCell {
        StatusCell::default()
    }

    pub fn snapshot(&self) -> DiagnosticStatus {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// # store the outcome of a run
    /// every failed check adds one to the error count
    pub fn record(&self, database_ok: bool, api_ok: bool) -> DiagnosticStatus {
        let mut status = self.0.write().unwrap_or_else(PoisonError::into_inner);

        status.last_check = Some(Utc::now().naive_utc());
        status.database_status = ComponentStatus::from_check(database_ok);
        status.api_status = ComponentStatus::from_check(api_ok);
        status.error_count += u64::from(!database_ok) + u64::from(!api_ok);

        status.clone()
    }
}

/// the url the self check requests. a wildcard listen address is reached
/// over loopback.
pub fn health_url(address: IpAddr, port: u16) -> String {
    let address = if address.is_unspecified() {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    } else {
        address
    };

    match address {
        IpAddr::V4(ip) => format!("http://{ip}:{port}/api/health"),
        IpAddr::V6(ip) => format!("http://[{ip}]:{port}/api/health"),
    }
}

pub fn http_client() -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(HEALTH_REQUEST_TIMEOUT).build()
}

/// `SELECT 1` on a blocking thread
async fn check_database(pool: &DbPool) -> bool {
    let pool = pool.clone();

    let result = tokio::task::spawn_blocking(move || {
        let mut conn = pool.get().map_err(|error| error.to_string())?;
        ping(&mut conn).map_err(|error| error.to_string())
    })
    .await;

    match result {
        Ok(Ok(())) => true,
        Ok(Err(error)) => {
            error!(target: "diagnostic:check_database", "database check failed: {}", error);
            false
        }
        Err(error) => {
            error!(target: "diagnostic:check_database", "database check panicked: {}", error);
            false
        }
    }
}

async fn check_api(client: &reqwest::Client, url: &str) -> bool {
    match client.get(url).send().await {
        Ok(response) if response.status() == reqwest::StatusCode::OK => true,
        Ok(response) => {
            warn!(target: "diagnostic:check_api", "health endpoint answered {}", response.status());
            false
        }
        Err(error) => {
            warn!(target: "diagnostic:check_api", "health endpoint unreachable: {}", error);
            false
        }
    }
}

/// # run the diagnostic once
/// checks the database, then the health endpoint, and stores the outcome
///
/// ## Arguments
/// * `pool` - The pool to check
/// * `client` - The http client for the self check
/// * `url` - The health endpoint
/// * `cell` - Where the outcome is stored
///
/// ## Returns
/// * `DiagnosticStatus` - The status after this run
pub async fn run_diagnostic(pool: &DbPool, client: &reqwest::Client, url: &str, cell: &StatusCell) -> DiagnosticStatus {
    let database_ok = check_database(pool).await;
    let api_ok = check_api(client, url).await;

    let status = cell.record(database_ok, api_ok);
    info!(
        target: "diagnostic:run_diagnostic",
        "database {:?}, api {:?}, {} errors so far",
        status.database_status, status.api_status, status.error_count
    );

    status
}
