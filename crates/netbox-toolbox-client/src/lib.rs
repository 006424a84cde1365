// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use netbox_toolbox_app::{Device, DeviceId, Interface, InventoryApi, Page, Rack};
use reqwest::StatusCode;
use reqwest::blocking::Client as HttpClient;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use url::Url;

pub const PAGE_LIMIT: usize = 1000;

/// Blocking NetBox REST client. One instance is built at startup and shared
/// by every query.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    timeout: Duration,
    http: HttpClient,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerStatus {
    #[serde(rename = "netbox-version")]
    pub netbox_version: String,
}

impl Client {
    pub fn new(base_url: &str, token: &str, timeout: Duration) -> Result<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_owned();
        if base_url.is_empty() {
            bail!("netbox url must not be empty; set NETBOX_API_URL");
        }
        let parsed = Url::parse(&base_url)
            .with_context(|| format!("netbox url {base_url:?} is not a valid URL"))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            bail!(
                "netbox url {base_url:?} must use http or https, got {}",
                parsed.scheme()
            );
        }

        let token = token.trim();
        if token.is_empty() {
            bail!("netbox token must not be empty; set NETBOX_API_TOKEN");
        }

        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Token {token}"))
            .context("netbox token contains characters not allowed in a header")?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = HttpClient::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .context("build HTTP client")?;

        Ok(Self {
            base_url,
            timeout,
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn ping(&self) -> Result<ServerStatus> {
        self.get_json(&format!("{}/api/status/", self.base_url))
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        debug!(%url, "GET");
        let response = self
            .http
            .get(url)
            .send()
            .map_err(|error| connection_error(&self.base_url, error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(clean_error_response(status, &body));
        }

        response
            .json()
            .with_context(|| format!("decode response from {url}"))
    }

    /// Fetches `path` and follows `next` links until the collection is
    /// exhausted.
    fn list_all<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<Vec<T>> {
        let mut url = Url::parse(&format!("{}{path}", self.base_url))
            .with_context(|| format!("build url for {path}"))?;
        {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
            pairs.append_pair("limit", &PAGE_LIMIT.to_string());
        }

        // Pages must share the base origin: the token goes out with each one.
        let origin = url.origin();
        let mut visited = HashSet::new();
        let mut records = Vec::new();
        let mut next = Some(url);
        while let Some(page_url) = next.take() {
            if !visited.insert(page_url.to_string()) {
                bail!("pagination for {path} loops back to {page_url}");
            }
            let page: Page<T> = self.get_json(page_url.as_str())?;
            debug!(
                url = %page_url,
                count = page.count,
                received = page.results.len(),
                "page fetched"
            );
            records.extend(page.results);
            if let Some(link) = page.next.filter(|link| !link.is_empty()) {
                let link_url =
                    Url::parse(&link).with_context(|| format!("parse next link {link:?}"))?;
                if link_url.origin() != origin {
                    bail!(
                        "next link {link_url} leaves {}; refusing to follow it",
                        self.base_url
                    );
                }
                next = Some(link_url);
            }
        }
        Ok(records)
    }
}

impl InventoryApi for Client {
    fn list_devices(&self) -> Result<Vec<Device>> {
        self.list_all("/api/dcim/devices/", &[])
    }

    fn list_interfaces(&self) -> Result<Vec<Interface>> {
        self.list_all("/api/dcim/interfaces/", &[])
    }

    fn get_device(&self, id: DeviceId) -> Result<Option<Device>> {
        let url = format!("{}/api/dcim/devices/{id}/", self.base_url);
        match self.get_json(&url) {
            Ok(device) => Ok(Some(device)),
            Err(error) if is_not_found(&error) => Ok(None),
            Err(error) => Err(error),
        }
    }

    fn interfaces_for_device(&self, device: &Device) -> Result<Vec<Interface>> {
        self.list_all(
            "/api/dcim/interfaces/",
            &[("device_id", device.id.to_string())],
        )
    }

    fn get_rack_by_name(&self, name: &str) -> Result<Option<Rack>> {
        let mut racks: Vec<Rack> =
            self.list_all("/api/dcim/racks/", &[("name", name.to_owned())])?;
        match racks.len() {
            0 => Ok(None),
            1 => Ok(racks.pop()),
            count => Err(anyhow!(
                "{count} racks are named {name:?}; rack names must be unique to query by name"
            )),
        }
    }

    fn devices_in_rack(&self, rack: &Rack) -> Result<Vec<Device>> {
        self.list_all("/api/dcim/devices/", &[("rack_id", rack.id.to_string())])
    }
}

#[derive(Debug)]
struct HttpStatusError {
    status: StatusCode,
    message: String,
}

impl std::fmt::Display for HttpStatusError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpStatusError {}

fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .downcast_ref::<HttpStatusError>()
        .is_some_and(|error| error.status == StatusCode::NOT_FOUND)
}

fn connection_error(base_url: &str, error: reqwest::Error) -> anyhow::Error {
    anyhow!(
        "cannot reach {} -- check NETBOX_API_URL and that the server is up ({})",
        base_url,
        error
    )
}

#[derive(Debug, Deserialize)]
struct NetboxErrorEnvelope {
    detail: Option<String>,
}

fn clean_error_response(status: StatusCode, body: &str) -> anyhow::Error {
    let message = if let Ok(parsed) = serde_json::from_str::<NetboxErrorEnvelope>(body)
        && let Some(detail) = parsed.detail
        && !detail.is_empty()
    {
        format!("netbox error ({}): {}", status.as_u16(), detail)
    } else if !body.is_empty() && body.len() < 100 && !body.contains('{') && !body.contains('<')
    {
        format!("netbox error ({}): {}", status.as_u16(), body.trim())
    } else {
        format!("netbox returned {}", status.as_u16())
    };

    let message = if status == StatusCode::FORBIDDEN || status == StatusCode::UNAUTHORIZED {
        format!("{message} -- check NETBOX_API_TOKEN")
    } else {
        message
    };
    anyhow::Error::new(HttpStatusError { status, message })
}

#[cfg(test)]
mod tests {
    use super::{Client, clean_error_response, is_not_found};
    use reqwest::StatusCode;
    use std::time::Duration;

    #[test]
    fn new_trims_trailing_slashes() -> anyhow::Result<()> {
        let client = Client::new("https://netbox.example///", "abc", Duration::from_secs(1))?;
        assert_eq!(client.base_url(), "https://netbox.example");
        assert_eq!(client.timeout(), Duration::from_secs(1));
        Ok(())
    }

    #[test]
    fn new_rejects_missing_values_and_bad_schemes() {
        let empty = Client::new("", "abc", Duration::from_secs(1)).expect_err("empty url");
        assert!(empty.to_string().contains("NETBOX_API_URL"));

        let token = Client::new("https://netbox.example", "  ", Duration::from_secs(1))
            .expect_err("empty token");
        assert!(token.to_string().contains("NETBOX_API_TOKEN"));

        let scheme = Client::new("ftp://netbox.example", "abc", Duration::from_secs(1))
            .expect_err("ftp scheme");
        assert!(scheme.to_string().contains("http or https"));

        let garbage =
            Client::new("not a url", "abc", Duration::from_secs(1)).expect_err("garbage url");
        assert!(garbage.to_string().contains("not a valid URL"));
    }

    #[test]
    fn error_response_prefers_netbox_detail() {
        let error = clean_error_response(
            StatusCode::FORBIDDEN,
            r#"{"detail": "Invalid token"}"#,
        );
        assert_eq!(
            error.to_string(),
            "netbox error (403): Invalid token -- check NETBOX_API_TOKEN"
        );
        assert!(!is_not_found(&error));
    }

    #[test]
    fn error_response_falls_back_to_status_for_html_bodies() {
        let error = clean_error_response(
            StatusCode::BAD_GATEWAY,
            "<html><body>bad gateway</body></html>",
        );
        assert_eq!(error.to_string(), "netbox returned 502");

        let short = clean_error_response(StatusCode::INTERNAL_SERVER_ERROR, "oops\n");
        assert_eq!(short.to_string(), "netbox error (500): oops");
    }

    #[test]
    fn not_found_survives_context_wrapping() {
        let error = clean_error_response(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#);
        assert!(is_not_found(&error));
        let wrapped = error.context("load device");
        assert!(is_not_found(&wrapped));
    }
}
