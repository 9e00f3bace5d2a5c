//! Initial response time probe
//!
//! Times a bare TCP connect to each valid instance and records the latency
//! in seconds under `timing.initial`.

use serde_json::Value;
use std::time::Instant;
use tokio::{net::TcpStream, time::timeout};

use crate::{
    config::AppConfig,
    error::CollectorError,
    factory::FetchAndMerge,
    fetcher::FetchModule,
    network::host_port_of,
    store::{InstanceFilter, Record},
};

pub fn response_time_fetcher(config: &AppConfig) -> impl FetchModule {
    let connect_timeout = config.connect_timeout();

    FetchAndMerge::new(
        "response-time",
        &["timing", "initial"],
        move |url: String, _record: Record| async move {
            let (host, port) = host_port_of(&url)?;
            let started = Instant::now();
            timeout(connect_timeout, TcpStream::connect((host.as_str(), port)))
                .await
                .map_err(|_| CollectorError::timeout("tcp_connect", connect_timeout.as_secs()))?
                .map_err(|error| CollectorError::network(error.to_string()))?;
            Ok(Value::from(started.elapsed().as_secs_f64()))
        },
    )
    .with_filter(InstanceFilter::default().with_only_valid(true))
    .with_limit(config.fetching.default_limit)
}
