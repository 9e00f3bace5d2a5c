//! Version detection probe
//!
//! Fetches each instance's `config` endpoint and records the advertised
//! version. Instances that fail here keep no `version` field and stay out
//! of valid-only iteration.

use serde_json::Value;
use url::Url;

use crate::{
    config::AppConfig,
    error::{CollectorError, Result},
    factory::FetchAndMerge,
    fetcher::FetchModule,
    store::{InstanceFilter, Record},
};

pub fn version_fetcher(config: &AppConfig) -> Result<impl FetchModule> {
    let client = reqwest::Client::builder()
        .user_agent(config.fetching.user_agent.clone())
        .timeout(config.request_timeout())
        .build()?;

    let fetch_one = move |url: String, _record: Record| {
        let client = client.clone();
        async move {
            let endpoint = Url::parse(&url)?.join("config")?;
            let body: Value = client
                .get(endpoint)
                .send()
                .await?
                .error_for_status()?
                .json()
                .await?;
            match body.get("version").and_then(Value::as_str) {
                Some(version) => Ok(Value::String(version.to_owned())),
                None => Err(CollectorError::probe(
                    "version",
                    url.as_str(),
                    "response carries no version field",
                )),
            }
        }
    };

    Ok(
        FetchAndMerge::new("version", &["version"], fetch_one)
            .with_filter(InstanceFilter::default().with_valid_or_private(false))
            .with_limit(config.fetching.default_limit),
    )
}
