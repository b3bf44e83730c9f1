//! HTTPS client for the appliance's threat-prevention API.
//!
//! # Endpoints
//!
//! All calls are `POST`s relative to one base URL, by default
//! `https://<address>/UserCheck/TPAPI/`:
//!
//! - `query` - JSON body, asks for the verdict on an MD5
//! - `upload` - multipart body with a `request` part and a `file` part
//!
//! # TLS
//!
//! Certificates are verified by default. A PEM certificate can be added as
//! an extra trust root for appliances with a private CA. Appliances that
//! present self-signed certificates can be reached by setting
//! `insecure_skip_verify`, which disables all peer verification and should
//! not be used where the network between client and appliance is untrusted.

use crate::core::{
    ApplianceApi, ContentHash, ScanError, ScanRequest, ScanResponse, ScanTarget,
};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

const QUERY_ENDPOINT: &str = "query";
const UPLOAD_ENDPOINT: &str = "upload";
const API_PATH: &str = "UserCheck/TPAPI";

/// Where the appliance lives. An IP address and a hostname are mutually
/// exclusive ways of naming it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplianceAddress {
    /// A literal IPv4 or IPv6 address.
    Ip(IpAddr),
    /// A fully qualified domain name.
    Hostname(String),
}

impl ApplianceAddress {
    /// Returns `true` for `Hostname`.
    pub fn is_hostname(&self) -> bool {
        matches!(self, Self::Hostname(_))
    }
}

impl fmt::Display for ApplianceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ip(IpAddr::V6(ip)) => write!(f, "[{}]", ip),
            Self::Ip(ip) => write!(f, "{}", ip),
            Self::Hostname(host) => f.write_str(host),
        }
    }
}

/// Connection settings for an appliance.
///
/// Built once at startup and handed to [`HttpAppliance::new`]; never
/// modified afterwards.
#[derive(Debug, Clone)]
pub struct ApplianceConfig {
    /// How the appliance is addressed.
    pub address: ApplianceAddress,

    /// API key sent in the `Authorization` header (kept secret).
    pub api_key: SecretString,

    /// Base URL the endpoint names are appended to.
    pub base_url: String,

    /// Extra PEM trust root for the TLS handshake. Requires a hostname.
    pub certificate: Option<PathBuf>,

    /// Disable TLS peer verification entirely.
    pub insecure_skip_verify: bool,

    /// Per-request timeout. `None` leaves the transport default.
    pub timeout: Option<Duration>,
}

impl ApplianceConfig {
    /// Creates a configuration for the appliance at `address`.
    pub fn new(address: ApplianceAddress, api_key: impl Into<String>) -> Self {
        let api_key: String = api_key.into();
        let base_url = format!("https://{}/{}/", address, API_PATH);
        Self {
            address,
            api_key: SecretString::from(api_key),
            base_url,
            certificate: None,
            insecure_skip_verify: false,
            timeout: None,
        }
    }

    /// Overrides the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Trusts the PEM certificate at `path` for the TLS handshake.
    pub fn with_certificate(mut self, path: impl Into<PathBuf>) -> Self {
        self.certificate = Some(path.into());
        self
    }

    /// Enables or disables TLS peer verification bypass.
    pub fn with_insecure_skip_verify(mut self, skip: bool) -> Self {
        self.insecure_skip_verify = skip;
        self
    }

    /// Sets the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Checks option combinations that cannot work together.
    pub fn validate(&self) -> Result<(), ScanError> {
        if self.certificate.is_some() && !self.address.is_hostname() {
            return Err(ScanError::configuration(
                "a certificate file can only be used with a hostname address, since it must match the appliance FQDN",
            ));
        }
        if !(self.base_url.starts_with("https://") || self.base_url.starts_with("http://")) {
            return Err(ScanError::configuration(format!(
                "base URL must be http(s): {}",
                self.base_url
            )));
        }
        if self.api_key.expose_secret().is_empty() {
            return Err(ScanError::configuration("API key must not be empty"));
        }
        Ok(())
    }

    /// Returns the full URL of `endpoint`.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if self.base_url.ends_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }
}

/// Appliance client over HTTPS.
///
/// # Example
///
/// ```rust,ignore
/// use scanrelay::backends::http::{ApplianceAddress, ApplianceConfig, HttpAppliance};
///
/// let config = ApplianceConfig::new(
///     ApplianceAddress::Hostname("gw.example.com".into()),
///     "api-key",
/// );
/// let appliance = HttpAppliance::new(config)?;
/// ```
#[derive(Debug)]
pub struct HttpAppliance {
    config: ApplianceConfig,
    client: reqwest::Client,
    query_url: String,
    upload_url: String,
}

impl HttpAppliance {
    /// Creates a client from a validated configuration.
    pub fn new(config: ApplianceConfig) -> Result<Self, ScanError> {
        config.validate()?;

        let mut auth = HeaderValue::from_str(config.api_key.expose_secret()).map_err(|_| {
            ScanError::configuration("API key contains characters not allowed in an HTTP header")
        })?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder()
            .default_headers(headers)
            .danger_accept_invalid_certs(config.insecure_skip_verify);

        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        if let Some(path) = &config.certificate {
            let pem = std::fs::read(path).map_err(|e| {
                ScanError::configuration(format!(
                    "failed to read certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ScanError::configuration(format!(
                    "invalid certificate {}: {}",
                    path.display(),
                    e
                ))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if config.insecure_skip_verify {
            tracing::warn!(
                address = %config.address,
                "TLS certificate verification is disabled for the appliance"
            );
        }

        let client = builder
            .build()
            .map_err(|e| ScanError::configuration(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            query_url: config.endpoint_url(QUERY_ENDPOINT),
            upload_url: config.endpoint_url(UPLOAD_ENDPOINT),
            config,
            client,
        })
    }

    /// Returns the configuration this client was built from.
    pub fn config(&self) -> &ApplianceConfig {
        &self.config
    }

    async fn read_response(
        endpoint: &str,
        response: reqwest::Response,
    ) -> Result<ScanResponse, ScanError> {
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScanError::connection_failed(endpoint, e.to_string()))?;

        ScanResponse::from_slice(endpoint, &body).map_err(|e| {
            if status.is_success() {
                e
            } else {
                ScanError::ambiguous(endpoint, format!("HTTP {}: {}", status, e))
            }
        })
    }
}

#[async_trait]
impl ApplianceApi for HttpAppliance {
    fn name(&self) -> &str {
        &self.config.base_url
    }

    async fn query(&self, hash: &ContentHash) -> Result<ScanResponse, ScanError> {
        let body = ScanRequest::query(hash).to_json()?;

        tracing::debug!(md5 = %hash.as_str(), url = %self.query_url, "Sending query request");

        let response = self
            .client
            .post(&self.query_url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| ScanError::connection_failed(QUERY_ENDPOINT, e.to_string()))?;

        Self::read_response(QUERY_ENDPOINT, response).await
    }

    async fn upload(&self, target: &ScanTarget) -> Result<ScanResponse, ScanError> {
        let data = tokio::fs::read(target.path()).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ScanError::FileNotFound {
                    path: target.path().display().to_string(),
                }
            } else {
                ScanError::Io(e)
            }
        })?;

        let form = Form::new()
            .text("request", ScanRequest::upload().to_json()?)
            .part("file", Part::bytes(data).file_name(target.name().to_string()));

        tracing::debug!(file = %target.name(), url = %self.upload_url, "Sending upload request");

        let response = match self.client.post(&self.upload_url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(file = %target.name(), error = %e, "Upload failed");
                return Err(ScanError::connection_failed(UPLOAD_ENDPOINT, e.to_string()));
            }
        };

        let response = Self::read_response(UPLOAD_ENDPOINT, response).await?;
        tracing::info!(
            file = %target.name(),
            status = %response.label(),
            "Upload response received"
        );
        Ok(response)
    }
}
