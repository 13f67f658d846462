//! SigV4 request signer
//!
//! Combines the canonical request and the derived signing key into the
//! `Authorization` header and the final request URL.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::canonical::{CanonicalRequest, RequestTarget, SigningContext, SigningMethod};
use super::credentials::{Endpoint, StorageCredentials};
use super::signing_key::{CredentialScope, SigningKey};

/// SigV4 algorithm identifier
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// A fully signed request, consumed once by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: SigningMethod,
    pub url: String,
    /// Name-sorted signed headers followed by `authorization`
    pub headers: Vec<(String, String)>,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// `AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{hex(sha256(canonical))}`
pub fn build_string_to_sign(amz_date: &str, scope: &CredentialScope, canonical: &str) -> String {
    format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        amz_date,
        scope,
        hex::encode(Sha256::digest(canonical.as_bytes()))
    )
}

/// Sign one attempt.
///
/// Pure apart from the caller-supplied `now`, which is captured once per
/// attempt and used for both `x-amz-date` and the credential scope date.
pub fn sign(
    credentials: &StorageCredentials,
    endpoint: &Endpoint,
    ctx: &SigningContext<'_>,
    now: DateTime<Utc>,
) -> SignedRequest {
    let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let scope = CredentialScope::s3(now.format("%Y%m%d").to_string(), ctx.region);

    let target = RequestTarget::resolve(
        endpoint,
        &credentials.bucket_name,
        ctx.object_key,
        ctx.style,
    );
    let canonical = CanonicalRequest::build(&target, ctx, &amz_date);
    tracing::trace!(
        canonical_request = %canonical.canonical,
        region = ctx.region,
        style = %ctx.style,
        "Built canonical request"
    );

    let string_to_sign = build_string_to_sign(&amz_date, &scope, &canonical.canonical);
    let signature = SigningKey::derive(&credentials.secret_access_key, &scope).sign(&string_to_sign);

    let authorization = format!(
        "{} Credential={}/{}, SignedHeaders={}, Signature={}",
        ALGORITHM, credentials.access_key_id, scope, canonical.signed_headers, signature
    );

    let mut headers = canonical.headers;
    headers.push(("authorization".to_string(), authorization));

    SignedRequest {
        method: ctx.method,
        url: target.url,
        headers,
    }
}
