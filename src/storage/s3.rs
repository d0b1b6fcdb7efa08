//! S3 object-store client
//!
//! Blocking HTTP client for S3 and S3-compatible stores. Requests use
//! path-style URLs (`{endpoint}/{bucket}/{key}`) and are signed with AWS
//! Signature Version 4. Retries and timeouts are left to the HTTP client's
//! own defaults; the first failure is returned as a storage error.

use std::fmt;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::blocking::{Client, Response};
use reqwest::{Method, Url};
use sha2::{Digest, Sha256};

use super::ObjectStore;
use crate::config;
use crate::error::{ProjectError, Result};

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "s3";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Credentials for signing requests.
#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl S3Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token: None,
        }
    }

    /// Attach a session token for temporary credentials
    pub fn with_session_token(mut self, token: impl Into<String>) -> Self {
        self.session_token = Some(token.into());
        self
    }

    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN` from the environment (or `.env`).
    pub fn from_env() -> Result<Self> {
        let access_key_id = config::var(config::AWS_ACCESS_KEY_ID).ok_or_else(|| {
            ProjectError::invalid(format!("{} is not set", config::AWS_ACCESS_KEY_ID))
        })?;
        let secret_access_key = config::var(config::AWS_SECRET_ACCESS_KEY).ok_or_else(|| {
            ProjectError::invalid(format!("{} is not set", config::AWS_SECRET_ACCESS_KEY))
        })?;

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: config::var(config::AWS_SESSION_TOKEN),
        })
    }
}

impl fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// A request ready to send: the final URL plus the headers that were signed.
#[derive(Debug)]
struct SignedRequest {
    url: String,
    headers: Vec<(&'static str, String)>,
}

/// Blocking S3 client
#[derive(Debug)]
pub struct S3Client {
    client: Client,
    credentials: S3Credentials,
    region: String,
    endpoint: Url,
}

impl S3Client {
    /// Create a client for the public AWS endpoint of `region`
    pub fn new(credentials: S3Credentials, region: impl Into<String>) -> Result<Self> {
        let region = region.into();
        let endpoint = format!("https://s3.{}.amazonaws.com", region);
        Self::with_endpoint(credentials, region, &endpoint)
    }

    /// Create a client for an S3-compatible endpoint
    pub fn with_endpoint(
        credentials: S3Credentials,
        region: impl Into<String>,
        endpoint: &str,
    ) -> Result<Self> {
        let endpoint = Url::parse(endpoint).map_err(|e| {
            ProjectError::invalid(format!("invalid endpoint '{}': {}", endpoint, e))
        })?;
        if endpoint.host_str().is_none() {
            return Err(ProjectError::invalid(format!(
                "endpoint '{}' has no host",
                endpoint
            )));
        }

        let client = Client::builder()
            .build()
            .map_err(|e| ProjectError::storage(endpoint.as_str(), "cannot build HTTP client", e))?;

        Ok(Self {
            client,
            credentials,
            region: region.into(),
            endpoint,
        })
    }

    /// Build a client from environment credentials, region and endpoint.
    pub fn from_env() -> Result<Self> {
        let credentials = S3Credentials::from_env()?;
        let region = config::var_or(config::AWS_REGION, config::DEFAULT_REGION);
        match config::var(config::AWS_ENDPOINT_URL) {
            Some(endpoint) => Self::with_endpoint(credentials, region, &endpoint),
            None => Self::new(credentials, region),
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    fn host(&self) -> String {
        let host = self.endpoint.host_str().unwrap_or_default();
        match self.endpoint.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    fn sign(
        &self,
        method: &Method,
        bucket: &str,
        key: &str,
        query: &[(&str, String)],
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<SignedRequest> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = hex::encode(Sha256::digest(payload));

        let base_path = self.endpoint.path().trim_end_matches('/');
        let mut canonical_uri = format!("{}/{}", base_path, uri_encode(bucket, false));
        if !key.is_empty() {
            canonical_uri.push('/');
            canonical_uri.push_str(&uri_encode(key, true));
        }
        let canonical_query = canonical_query(query);

        let mut headers = vec![
            ("host", self.host()),
            ("x-amz-content-sha256", payload_hash.clone()),
            ("x-amz-date", amz_date.clone()),
        ];
        if let Some(token) = &self.credentials.session_token {
            headers.push(("x-amz-security-token", token.clone()));
        }

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name, value.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| *name)
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            method.as_str(),
            canonical_uri,
            canonical_query,
            canonical_headers,
            signed_headers,
            payload_hash
        );

        let scope = format!("{}/{}/{}/aws4_request", date, self.region, SERVICE);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            amz_date,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes()))
        );

        let signing_key = signing_key(
            &self.credentials.secret_access_key,
            &date,
            &self.region,
            SERVICE,
        )?;
        let signature = hex::encode(hmac_sha256(&signing_key, string_to_sign.as_bytes())?);

        headers.push((
            "authorization",
            format!(
                "{} Credential={}/{}, SignedHeaders={}, Signature={}",
                ALGORITHM, self.credentials.access_key_id, scope, signed_headers, signature
            ),
        ));

        let origin = self.endpoint.origin().ascii_serialization();
        let mut url = format!("{}{}", origin, canonical_uri);
        if !canonical_query.is_empty() {
            url.push('?');
            url.push_str(&canonical_query);
        }

        Ok(SignedRequest { url, headers })
    }

    fn send(
        &self,
        method: Method,
        bucket: &str,
        key: &str,
        query: &[(&str, String)],
        payload: Vec<u8>,
    ) -> Result<Response> {
        let location = format!("s3://{}/{}", bucket, key);
        let signed = self.sign(&method, bucket, key, query, &payload, Utc::now())?;
        log::debug!("{} {}", method, signed.url);

        let mut request = self.client.request(method, &signed.url);
        for (name, value) in &signed.headers {
            // reqwest derives Host from the URL
            if *name != "host" {
                request = request.header(*name, value);
            }
        }

        let response = request
            .body(payload)
            .send()
            .map_err(|e| ProjectError::storage(location.as_str(), "request failed", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            let code = xml_values(&body, "Code").into_iter().next();
            return Err(ProjectError::Storage {
                location,
                reason: format!(
                    "service returned {}{}",
                    status,
                    code.map(|c| format!(" ({})", c)).unwrap_or_default()
                ),
                source: None,
            });
        }

        Ok(response)
    }
}

impl ObjectStore for S3Client {
    fn put_object(&self, bucket: &str, key: &str, data: &[u8]) -> Result<String> {
        let response = self.send(Method::PUT, bucket, key, &[], data.to_vec())?;
        response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ProjectError::Storage {
                location: format!("s3://{}/{}", bucket, key),
                reason: "response carried no ETag".to_string(),
                source: None,
            })
    }

    fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let response = self.send(Method::GET, bucket, key, &[], Vec::new())?;
        response
            .bytes()
            .map(|b| b.to_vec())
            .map_err(|e| ProjectError::storage(format!("s3://{}/{}", bucket, key), "cannot read body", e))
    }

    fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut query = vec![
                ("delimiter", "/".to_string()),
                ("list-type", "2".to_string()),
                ("prefix", prefix.to_string()),
            ];
            if let Some(token) = &continuation {
                query.push(("continuation-token", token.clone()));
            }

            let body = self
                .send(Method::GET, bucket, "", &query, Vec::new())?
                .text()
                .map_err(|e| {
                    ProjectError::storage(format!("s3://{}/{}", bucket, prefix), "cannot read listing", e)
                })?;

            keys.extend(xml_values(&body, "Key"));

            let truncated = xml_values(&body, "IsTruncated")
                .first()
                .is_some_and(|v| v == "true");
            continuation = xml_values(&body, "NextContinuationToken").into_iter().next();
            if !truncated || continuation.is_none() {
                break;
            }
        }

        Ok(keys)
    }

    fn delete_object(&self, bucket: &str, key: &str) -> Result<()> {
        self.send(Method::DELETE, bucket, key, &[], Vec::new())?;
        Ok(())
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| ProjectError::invalid(format!("invalid signing key: {}", e)))?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Derive the SigV4 signing key for one day, region and service.
fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{}", secret).as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Percent-encode everything except unreserved characters (and `/` when
/// encoding a key path).
fn uri_encode(input: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

fn canonical_query(query: &[(&str, String)]) -> String {
    let mut pairs: Vec<(String, String)> = query
        .iter()
        .map(|(k, v)| (uri_encode(k, false), uri_encode(v, false)))
        .collect();
    pairs.sort();
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

/// Text content of every `<tag>...</tag>` element, entity-decoded.
fn xml_values(body: &str, tag: &str) -> Vec<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let mut values = Vec::new();
    let mut rest = body;

    while let Some(start) = rest.find(&open) {
        let after = &rest[start + open.len()..];
        let Some(end) = after.find(&close) else {
            break;
        };
        values.push(xml_unescape(&after[..end]));
        rest = &after[end + close.len()..];
    }
    values
}

fn xml_unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
