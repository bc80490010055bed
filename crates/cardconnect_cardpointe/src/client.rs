//! The CardPointe gateway client.
//!
//! Every public operation performs exactly one HTTP round trip against
//! `{endpoint}cardconnect/rest/{resource}` with Basic authentication and a JSON
//! body, and decodes the answer into the matching response type.

use chrono::NaiveDate;
use http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, USER_AGENT};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Method};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, info, warn};

use cardconnect_common::{create_client, log_result, ClientOptions, DEFAULT_TIMEOUT_SECS};
use cardconnect_config::{load_config, load_config_from, AppConfig, CardPointeConfig};

use crate::error::{CardPointeError, Result};
use crate::request::AuthorizationRequest;
use crate::response::{
    Authorization, AuthorizationResponse, CaptureResponse, InquireResponse, RefundResponse,
    Response, SettlementResponse, VoidResponse,
};

/// Heading of the servlet root page when the credentials are accepted.
pub const AUTH_TEXT: &str = "CardConnect REST Servlet";
/// Plain-text body `settlestat` returns when there is nothing to report.
pub const NO_BATCHES_TEXT: &str = "Null batches";
pub const CLIENT_NAME: &str = "RUST CARDCONNECT";
pub const CLIENT_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Path appended to every configured endpoint.
pub const ENDPOINT_SUFFIX: &str = "cardconnect/rest/";
pub const DEFAULT_CURRENCY: &str = "USD";

static HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<h1>(.*?)</h1>").expect("heading pattern is valid"));

/// `User-Agent` sent with every request.
pub fn user_agent() -> String {
    format!("{} v{}", CLIENT_NAME, CLIENT_VERSION)
}

/// Appends [`ENDPOINT_SUFFIX`] to `endpoint`, adding a separating `/` if needed.
///
/// An endpoint that already ends with the suffix is returned unchanged, so the
/// suffix appears exactly once.
pub fn normalize_endpoint(endpoint: &str) -> String {
    let mut normalized = endpoint.to_string();
    if !normalized.ends_with('/') {
        normalized.push('/');
    }
    if !normalized.ends_with(ENDPOINT_SUFFIX) {
        normalized.push_str(ENDPOINT_SUFFIX);
    }
    normalized
}

/// First `<h1>` heading of an HTML page.
fn extract_heading(html: &str) -> Option<&str> {
    HEADING
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|heading| heading.as_str())
}

/// Writes a client-owned identity field into a caller payload. A caller value
/// under the same key is discarded.
fn merge_identity(payload: &mut Map<String, Value>, key: &str, value: &str) {
    let value = Value::String(value.to_string());
    if let Some(previous) = payload.insert(key.to_string(), value.clone()) {
        if previous != value {
            warn!(
                "Discarding caller-supplied '{}' ({}); the client value is used",
                key, previous
            );
        }
    }
}

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

/// Headers every request starts from, before per-call overrides.
fn default_request_headers() -> HeaderMap {
    let mut headers = json_headers();
    if let Ok(agent) = HeaderValue::from_str(&user_agent()) {
        headers.insert(USER_AGENT, agent);
    }
    headers
}

fn build_transport(accept_invalid_certs: bool, timeout_secs: u64) -> Result<Client> {
    let options = ClientOptions {
        timeout_secs,
        follow_redirects: false,
        accept_invalid_certs,
        user_agent: Some(user_agent()),
        default_headers: json_headers(),
    };
    let client = log_result(
        create_client(&options),
        "CardPointe transport ready",
        "Failed to build CardPointe transport",
    )?;
    Ok(client)
}

/// Per-call additions layered over the default request options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Replace default headers of the same name.
    pub headers: HeaderMap,
    pub query: Vec<(String, String)>,
}

impl RequestOptions {
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }
}

/// The last outbound request as assembled by the client. The password is
/// never recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestSnapshot {
    pub method: String,
    pub url: String,
    pub username: String,
    pub headers: BTreeMap<String, String>,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

/// Client for the CardPointe REST servlet.
///
/// Operations take `&mut self`: the client records the last request and
/// response, so a single instance serves one caller at a time.
pub struct CardPointe {
    merchant_id: String,
    user: String,
    password: String,
    endpoint: String,
    currency: String,
    accept_invalid_certs: bool,
    timeout_secs: u64,
    http: Client,
    last_request: Option<RequestSnapshot>,
    last_response: Option<Value>,
}

impl fmt::Debug for CardPointe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardPointe")
            .field("merchant_id", &self.merchant_id)
            .field("user", &self.user)
            .field("password", &"***")
            .field("endpoint", &self.endpoint)
            .field("currency", &self.currency)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .field("timeout_secs", &self.timeout_secs)
            .finish_non_exhaustive()
    }
}

impl CardPointe {
    /// Creates a client charging in [`DEFAULT_CURRENCY`] with TLS verification on.
    ///
    /// `endpoint` is the gateway host, e.g. `https://fts-uat.cardconnect.com/`.
    pub fn new(
        merchant_id: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        endpoint: &str,
    ) -> Result<Self> {
        Self::with_currency(merchant_id, user, password, endpoint, DEFAULT_CURRENCY)
    }

    /// Like [`CardPointe::new`], charging in `currency` (e.g. `CAD`).
    pub fn with_currency(
        merchant_id: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
        endpoint: &str,
        currency: impl Into<String>,
    ) -> Result<Self> {
        let endpoint = normalize_endpoint(endpoint);
        Ok(Self {
            merchant_id: merchant_id.into(),
            user: user.into(),
            password: password.into(),
            http: build_transport(false, DEFAULT_TIMEOUT_SECS)?,
            endpoint,
            currency: currency.into(),
            accept_invalid_certs: false,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            last_request: None,
            last_response: None,
        })
    }

    /// Creates a client from a loaded [`CardPointeConfig`].
    pub fn from_config(config: &CardPointeConfig) -> Result<Self> {
        let password = config
            .password
            .clone()
            .ok_or_else(|| CardPointeError::Config("cardpointe.password is not set".to_string()))?;

        let mut client = Self::with_currency(
            config.merchant_id.clone(),
            config.username.clone(),
            password,
            &config.endpoint,
            config.currency.clone(),
        )?;
        client.accept_invalid_certs = config.accept_invalid_certs;
        client.timeout_secs = config.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);
        client.rebuild_transport()?;
        Ok(client)
    }

    /// Creates a client from `./config`, the environment and `.env`.
    pub fn load() -> Result<Self> {
        let app_config = load_config().map_err(|e| CardPointeError::Config(e.to_string()))?;
        Self::from_app_config(app_config)
    }

    /// Creates a client from `config_dir`, using `{run_env}` as the
    /// environment-specific file.
    pub fn load_from(config_dir: &Path, run_env: &str) -> Result<Self> {
        let app_config = load_config_from(config_dir, run_env)
            .map_err(|e| CardPointeError::Config(e.to_string()))?;
        Self::from_app_config(app_config)
    }

    fn from_app_config(app_config: AppConfig) -> Result<Self> {
        let config = app_config
            .cardpointe
            .ok_or_else(|| CardPointeError::Config("cardpointe section is missing".to_string()))?;
        Self::from_config(&config)
    }

    fn rebuild_transport(&mut self) -> Result<()> {
        self.http = build_transport(self.accept_invalid_certs, self.timeout_secs)?;
        info!(
            "CardPointe transport rebuilt for {} (accept_invalid_certs={})",
            self.endpoint, self.accept_invalid_certs
        );
        Ok(())
    }

    // --- Operations ---

    /// Checks the credentials against the servlet root page.
    ///
    /// A 4xx answer means the credentials were refused and yields `false`.
    pub async fn test_credentials(&mut self) -> Result<bool> {
        let options = RequestOptions::default().query("merchid", self.merchant_id.as_str());

        let body = match self.send(Method::GET, "", None, options).await {
            Ok(body) => body,
            Err(e) if e.is_client_error() => {
                debug!("CardPointe refused the credentials: {}", e);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        Ok(extract_heading(&body).is_some_and(|heading| heading.eq_ignore_ascii_case(AUTH_TEXT)))
    }

    /// True when the gateway reports the merchant as `enabled`.
    pub async fn validate_merchant_id(&mut self) -> Result<bool> {
        match self.inquire_merchant().await {
            Ok(res) => Ok(res.get_bool("enabled") == Some(true)),
            Err(e) if e.is_client_error() => {
                debug!("CardPointe rejected the merchant inquiry: {}", e);
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn inquire_merchant(&mut self) -> Result<Response> {
        let resource = format!("inquireMerchant/{}", self.merchant_id);
        let body = self
            .send(Method::GET, &resource, None, RequestOptions::default())
            .await?;
        Ok(Response::new(parse_object(&body)?))
    }

    /// Authorizes a transaction, capturing it too when the request's capture
    /// flag is set (see [`AuthorizationRequest::is_capture`]).
    ///
    /// The client currency is sent unless the request names its own.
    pub async fn authorize(&mut self, request: &AuthorizationRequest) -> Result<Authorization> {
        let mut payload = request.fields().clone();
        payload
            .entry("currency")
            .or_insert_with(|| Value::String(self.currency.clone()));
        merge_identity(&mut payload, "merchid", &self.merchant_id);

        let body = self
            .send(
                Method::PUT,
                "auth",
                Some(&Value::Object(payload)),
                RequestOptions::default(),
            )
            .await?;
        let fields = parse_object(&body)?;

        if request.is_capture() {
            Ok(Authorization::Captured(CaptureResponse::new(fields)))
        } else {
            Ok(Authorization::Authorized(AuthorizationResponse::new(fields)))
        }
    }

    /// Captures a previous authorization. `extra` may carry `amount`,
    /// `invoiceid` and other capture fields; it cannot replace `merchid` or `retref`.
    pub async fn capture(
        &mut self,
        retref: &str,
        extra: Map<String, Value>,
    ) -> Result<CaptureResponse> {
        let fields = self.put_with_retref("capture", retref, extra).await?;
        Ok(CaptureResponse::new(fields))
    }

    /// Voids a transaction that has not settled yet.
    pub async fn void(&mut self, retref: &str, extra: Map<String, Value>) -> Result<VoidResponse> {
        let fields = self.put_with_retref("void", retref, extra).await?;
        Ok(VoidResponse::new(fields))
    }

    /// Refunds a settled transaction; `request` names it through `retref`.
    pub async fn refund(&mut self, request: Map<String, Value>) -> Result<RefundResponse> {
        let mut payload = request;
        merge_identity(&mut payload, "merchid", &self.merchant_id);

        let body = self
            .send(
                Method::PUT,
                "refund",
                Some(&Value::Object(payload)),
                RequestOptions::default(),
            )
            .await?;
        Ok(RefundResponse::new(parse_object(&body)?))
    }

    pub async fn inquire(&mut self, retref: &str) -> Result<InquireResponse> {
        let resource = format!("inquire/{}/{}", retref, self.merchant_id);
        let body = self
            .send(Method::GET, &resource, None, RequestOptions::default())
            .await?;
        Ok(InquireResponse::new(parse_object(&body)?))
    }

    /// Settlement batches for `day` (`MMDD`).
    ///
    /// `None` when the gateway answers with the "Null batches" text, otherwise
    /// the batches in gateway order (possibly empty).
    pub async fn settle_stat(&mut self, day: &str) -> Result<Option<Vec<SettlementResponse>>> {
        let options = RequestOptions::default()
            .query("merchid", self.merchant_id.as_str())
            .query("date", day);

        let body = self.send(Method::GET, "settlestat", None, options).await?;

        if body.eq_ignore_ascii_case(NO_BATCHES_TEXT) {
            debug!("No settlement batches for {}", day);
            return Ok(None);
        }

        let batches: Vec<Map<String, Value>> = serde_json::from_str(&body)?;
        Ok(Some(
            batches.into_iter().map(SettlementResponse::new).collect(),
        ))
    }

    /// [`CardPointe::settle_stat`] for a calendar date.
    pub async fn settle_stat_on(
        &mut self,
        date: NaiveDate,
    ) -> Result<Option<Vec<SettlementResponse>>> {
        let day = date.format("%m%d").to_string();
        self.settle_stat(&day).await
    }

    /// Creates or updates a stored profile and returns the decoded answer as is.
    pub async fn create_profile(&mut self, request: Map<String, Value>) -> Result<Value> {
        let mut payload = request;
        merge_identity(&mut payload, "merchid", &self.merchant_id);

        let body = self
            .send(
                Method::PUT,
                "profile",
                Some(&Value::Object(payload)),
                RequestOptions::default(),
            )
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Reads a stored profile. Without `account_id` the literal `null`
    /// takes its place in the path, which the gateway reads as "all accounts".
    pub async fn profile(&mut self, profile_id: &str, account_id: Option<&str>) -> Result<Value> {
        let resource = self.profile_resource(profile_id, account_id);
        let body = self
            .send(Method::GET, &resource, None, RequestOptions::default())
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    pub async fn delete_profile(
        &mut self,
        profile_id: &str,
        account_id: Option<&str>,
    ) -> Result<Value> {
        let resource = self.profile_resource(profile_id, account_id);
        let body = self
            .send(Method::DELETE, &resource, None, RequestOptions::default())
            .await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// Sends a request to any resource under the REST base and returns the raw
    /// body of a 2xx answer.
    ///
    /// Nothing is merged into `body`; `options` headers replace the defaults of
    /// the same name.
    pub async fn send_with(
        &mut self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
        options: RequestOptions,
    ) -> Result<String> {
        self.send(method, resource, body, options).await
    }

    // --- Request plumbing ---

    fn profile_resource(&self, profile_id: &str, account_id: Option<&str>) -> String {
        format!(
            "profile/{}/{}/{}",
            profile_id,
            account_id.unwrap_or("null"),
            self.merchant_id
        )
    }

    async fn put_with_retref(
        &mut self,
        resource: &str,
        retref: &str,
        extra: Map<String, Value>,
    ) -> Result<Map<String, Value>> {
        let mut payload = extra;
        merge_identity(&mut payload, "merchid", &self.merchant_id);
        merge_identity(&mut payload, "retref", retref);

        let body = self
            .send(
                Method::PUT,
                resource,
                Some(&Value::Object(payload)),
                RequestOptions::default(),
            )
            .await?;
        parse_object(&body)
    }

    fn snapshot(
        &self,
        method: &Method,
        url: &str,
        options: &RequestOptions,
        body: Option<&Value>,
    ) -> RequestSnapshot {
        let mut headers = default_request_headers();
        for (name, value) in options.headers.iter() {
            headers.insert(name.clone(), value.clone());
        }

        RequestSnapshot {
            method: method.to_string(),
            url: url.to_string(),
            username: self.user.clone(),
            headers: headers
                .iter()
                .map(|(name, value)| {
                    (
                        name.as_str().to_string(),
                        value.to_str().unwrap_or_default().to_string(),
                    )
                })
                .collect(),
            query: options.query.clone(),
            body: body.cloned(),
        }
    }

    /// Sends one request and returns the raw body of a 2xx answer.
    ///
    /// Any other status becomes [`CardPointeError::Api`] with the body attached.
    async fn send(
        &mut self,
        method: Method,
        resource: &str,
        body: Option<&Value>,
        options: RequestOptions,
    ) -> Result<String> {
        let url = format!("{}{}", self.endpoint, resource);
        self.last_request = Some(self.snapshot(&method, &url, &options, body));

        debug!("Sending {} request to CardPointe: {}", method, url);

        let mut builder = self
            .http
            .request(method, &url)
            .basic_auth(&self.user, Some(&self.password))
            .headers(options.headers);
        if !options.query.is_empty() {
            builder = builder.query(&options.query);
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        debug!("CardPointe response status: {}", status);
        self.last_response = serde_json::from_str(&text).ok();

        if !status.is_success() {
            warn!("CardPointe returned {}: {}", status, text);
            return Err(CardPointeError::Api {
                status_code: status.as_u16(),
                body: text,
            });
        }

        Ok(text)
    }

    // --- Getters / Setters ---

    pub fn merchant_id(&self) -> &str {
        &self.merchant_id
    }

    pub fn set_merchant_id(&mut self, merchant_id: impl Into<String>) -> &mut Self {
        self.merchant_id = merchant_id.into();
        self
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn set_user(&mut self, user: impl Into<String>) -> &mut Self {
        self.user = user.into();
        self
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn set_password(&mut self, password: impl Into<String>) -> &mut Self {
        self.password = password.into();
        self
    }

    /// The normalized base URL, ending in [`ENDPOINT_SUFFIX`].
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Points the client at another gateway host and rebuilds the transport.
    pub fn set_endpoint(&mut self, endpoint: &str) -> Result<&mut Self> {
        self.endpoint = normalize_endpoint(endpoint);
        self.rebuild_transport()?;
        Ok(self)
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn set_currency(&mut self, currency: impl Into<String>) -> &mut Self {
        self.currency = currency.into();
        self
    }

    pub fn accept_invalid_certs(&self) -> bool {
        self.accept_invalid_certs
    }

    /// Disables TLS certificate verification, for sandbox gateways with
    /// self-signed certificates. Off unless set here or in the configuration.
    pub fn set_accept_invalid_certs(&mut self, accept: bool) -> Result<&mut Self> {
        self.accept_invalid_certs = accept;
        self.rebuild_transport()?;
        Ok(self)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    pub fn set_timeout_secs(&mut self, timeout_secs: u64) -> Result<&mut Self> {
        self.timeout_secs = timeout_secs;
        self.rebuild_transport()?;
        Ok(self)
    }

    /// The request sent by the most recent call.
    pub fn last_request(&self) -> Option<&RequestSnapshot> {
        self.last_request.as_ref()
    }

    /// The decoded JSON answer of the most recent call; `None` when the body
    /// was not JSON.
    pub fn last_response(&self) -> Option<&Value> {
        self.last_response.as_ref()
    }
}

fn parse_object(body: &str) -> Result<Map<String, Value>> {
    Ok(serde_json::from_str(body)?)
}
