//! SigV4 canonical request construction
//!
//! Builds the exact string that is hashed and signed:
//!
//! ```text
//! METHOD\nCANONICAL_URI\nCANONICAL_QUERY\nCANONICAL_HEADERS\nSIGNED_HEADERS\nPAYLOAD_HASH
//! ```
//!
//! Any byte of difference from what the store reconstructs on its side
//! turns into an authorization failure, never a parse error.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::credentials::Endpoint;

/// SHA-256 of the empty payload, used for DELETE
pub const EMPTY_PAYLOAD_SHA256: &str =
    "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

/// HTTP methods this client signs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningMethod {
    Put,
    Delete,
}

impl SigningMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SigningMethod::Put => "PUT",
            SigningMethod::Delete => "DELETE",
        }
    }
}

impl fmt::Display for SigningMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the bucket is a path segment or a host subdomain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AddressingStyle {
    /// `{endpoint}/{bucket}/{key}`
    Path,
    /// `https://{bucket}.{host}/{key}`
    VirtualHost,
}

impl AddressingStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            AddressingStyle::Path => "path",
            AddressingStyle::VirtualHost => "virtual-host",
        }
    }
}

impl fmt::Display for AddressingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything that determines one signing attempt.
///
/// Created per attempt and never mutated. `payload_sha256_hex` borrows the
/// hash computed once per upload so every candidate signs the same value.
#[derive(Debug, Clone, Copy)]
pub struct SigningContext<'a> {
    pub method: SigningMethod,
    pub object_key: &'a str,
    pub payload_sha256_hex: &'a str,
    pub content_type: Option<&'a str>,
    pub region: &'a str,
    pub style: AddressingStyle,
}

/// Where the request for one object goes under one addressing style
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTarget {
    pub url: String,
    pub host: String,
    pub canonical_uri: String,
}

impl RequestTarget {
    pub fn resolve(
        endpoint: &Endpoint,
        bucket: &str,
        object_key: &str,
        style: AddressingStyle,
    ) -> Self {
        let encoded_key = encode_object_key(object_key);
        match style {
            AddressingStyle::Path => Self {
                url: format!("{}/{}/{}", endpoint.base_url, bucket, encoded_key),
                host: endpoint.host.clone(),
                canonical_uri: format!("{}/{}/{}", endpoint.base_path, bucket, encoded_key),
            },
            AddressingStyle::VirtualHost => {
                let host = format!("{}.{}", bucket, endpoint.host);
                Self {
                    url: format!("https://{}/{}", host, encoded_key),
                    host,
                    canonical_uri: format!("/{}", encoded_key),
                }
            }
        }
    }
}

/// Percent-encode an object key segment by segment, keeping `/` literal.
///
/// Only the RFC 3986 unreserved set (`A-Z a-z 0-9 - _ . ~`) passes through.
pub fn encode_object_key(key: &str) -> String {
    key.split('/')
        .map(urlencoding::encode)
        .collect::<Vec<_>>()
        .join("/")
}

/// A built canonical request plus the pieces the signer reuses
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    /// The full newline-joined canonical request
    pub canonical: String,
    /// `;`-joined lower-case header names, same set as the canonical headers
    pub signed_headers: String,
    /// Lower-cased, trimmed, name-sorted headers to send
    pub headers: Vec<(String, String)>,
}

impl CanonicalRequest {
    /// Build the canonical request for `ctx` against `target`.
    ///
    /// `amz_date` is the `YYYYMMDDTHHMMSSZ` timestamp captured for this attempt.
    pub fn build(target: &RequestTarget, ctx: &SigningContext<'_>, amz_date: &str) -> Self {
        // BTreeMap keeps names sorted; names are inserted lower-case.
        let mut headers: BTreeMap<&'static str, String> = BTreeMap::new();
        headers.insert("host", target.host.trim().to_string());
        headers.insert(
            "x-amz-content-sha256",
            ctx.payload_sha256_hex.trim().to_string(),
        );
        headers.insert("x-amz-date", amz_date.trim().to_string());
        if let Some(content_type) = ctx.content_type.map(str::trim).filter(|v| !v.is_empty()) {
            headers.insert("content-type", content_type.to_string());
        }

        let mut canonical_headers = String::with_capacity(headers.len() * 64);
        for (name, value) in &headers {
            canonical_headers.push_str(name);
            canonical_headers.push(':');
            canonical_headers.push_str(value);
            canonical_headers.push('\n');
        }

        let signed_headers = headers.keys().copied().collect::<Vec<_>>().join(";");

        // The query string is never signed for single-object PUT/DELETE.
        let canonical_query = "";

        let canonical = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            ctx.method.as_str(),
            target.canonical_uri,
            canonical_query,
            canonical_headers,
            signed_headers,
            ctx.payload_sha256_hex
        );

        Self {
            canonical,
            signed_headers,
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "vehicles/t1/v1/1705321845000-0f8fad5b-d9cb-469f-a165-70867728950e.jpg";
    const PAYLOAD_HASH: &str = "45ae705277879f7f01d778f7c95a065bb0c06ab9936cf24307f375211fee13d1";

    fn endpoint() -> Endpoint {
        Endpoint {
            base_url: "https://s3.example.com".to_string(),
            host: "s3.example.com".to_string(),
            base_path: String::new(),
        }
    }

    fn put_context(style: AddressingStyle) -> SigningContext<'static> {
        SigningContext {
            method: SigningMethod::Put,
            object_key: KEY,
            payload_sha256_hex: PAYLOAD_HASH,
            content_type: Some("image/jpeg"),
            region: "sa-east-1",
            style,
        }
    }

    #[test]
    fn path_style_target_keeps_bucket_in_path() {
        let target = RequestTarget::resolve(&endpoint(), "cars", KEY, AddressingStyle::Path);

        assert_eq!(target.url, format!("https://s3.example.com/cars/{KEY}"));
        assert_eq!(target.host, "s3.example.com");
        assert_eq!(target.canonical_uri, format!("/cars/{KEY}"));
    }

    #[test]
    fn virtual_host_target_folds_bucket_into_host() {
        let target =
            RequestTarget::resolve(&endpoint(), "cars", KEY, AddressingStyle::VirtualHost);

        assert_eq!(target.url, format!("https://cars.s3.example.com/{KEY}"));
        assert_eq!(target.host, "cars.s3.example.com");
        assert_eq!(target.canonical_uri, format!("/{KEY}"));
    }

    #[test]
    fn path_style_target_includes_endpoint_path_prefix() {
        let endpoint = Endpoint {
            base_url: "http://127.0.0.1:9000/minio".to_string(),
            host: "127.0.0.1:9000".to_string(),
            base_path: "/minio".to_string(),
        };
        let target = RequestTarget::resolve(&endpoint, "cars", "a/b.jpg", AddressingStyle::Path);

        assert_eq!(target.url, "http://127.0.0.1:9000/minio/cars/a/b.jpg");
        assert_eq!(target.canonical_uri, "/minio/cars/a/b.jpg");
    }

    #[test]
    fn encode_object_key_preserves_slashes() {
        assert_eq!(encode_object_key("a b/c+d/e~f.jpg"), "a%20b/c%2Bd/e~f.jpg");
        assert_eq!(encode_object_key("fotos/ação.png"), "fotos/a%C3%A7%C3%A3o.png");
    }

    #[test]
    fn canonical_request_matches_expected_layout() {
        let target = RequestTarget::resolve(&endpoint(), "cars", KEY, AddressingStyle::Path);
        let request =
            CanonicalRequest::build(&target, &put_context(AddressingStyle::Path), "20240115T123045Z");

        let expected = format!(
            "PUT\n\
             /cars/{KEY}\n\
             \n\
             content-type:image/jpeg\n\
             host:s3.example.com\n\
             x-amz-content-sha256:{PAYLOAD_HASH}\n\
             x-amz-date:20240115T123045Z\n\
             \n\
             content-type;host;x-amz-content-sha256;x-amz-date\n\
             {PAYLOAD_HASH}"
        );
        assert_eq!(request.canonical, expected);
        assert_eq!(
            request.signed_headers,
            "content-type;host;x-amz-content-sha256;x-amz-date"
        );
    }

    #[test]
    fn canonical_request_is_deterministic() {
        let target = RequestTarget::resolve(&endpoint(), "cars", KEY, AddressingStyle::Path);
        let ctx = put_context(AddressingStyle::Path);

        let first = CanonicalRequest::build(&target, &ctx, "20240115T123045Z");
        let second = CanonicalRequest::build(&target, &ctx, "20240115T123045Z");
        assert_eq!(first, second);
    }

    #[test]
    fn signed_headers_match_canonical_header_names() {
        let target = RequestTarget::resolve(&endpoint(), "cars", KEY, AddressingStyle::Path);
        let request =
            CanonicalRequest::build(&target, &put_context(AddressingStyle::Path), "20240115T123045Z");

        let names: Vec<&str> = request.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names.join(";"), request.signed_headers);
        let mut sorted = names.clone();
        sorted.sort_unstable();
        assert_eq!(names, sorted);
    }

    #[test]
    fn delete_without_content_type_omits_header() {
        let target =
            RequestTarget::resolve(&endpoint(), "cars", KEY, AddressingStyle::VirtualHost);
        let ctx = SigningContext {
            method: SigningMethod::Delete,
            object_key: KEY,
            payload_sha256_hex: EMPTY_PAYLOAD_SHA256,
            content_type: None,
            region: "us-east-1",
            style: AddressingStyle::VirtualHost,
        };
        let request = CanonicalRequest::build(&target, &ctx, "20240115T123045Z");

        assert!(request.canonical.starts_with("DELETE\n/vehicles/"));
        assert_eq!(request.signed_headers, "host;x-amz-content-sha256;x-amz-date");
        assert!(request.canonical.contains("host:cars.s3.example.com\n"));
    }

    #[test]
    fn empty_payload_constant_is_sha256_of_nothing() {
        use sha2::{Digest, Sha256};
        assert_eq!(EMPTY_PAYLOAD_SHA256, hex::encode(Sha256::digest(b"")));
    }
}
