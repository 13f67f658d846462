//! SigV4 signing-key derivation
//!
//! ```text
//! kDate    = HMAC("AWS4" + secret, date)
//! kRegion  = HMAC(kDate, region)
//! kService = HMAC(kRegion, service)
//! kSigning = HMAC(kService, "aws4_request")
//! ```
//!
//! Each stage keys the next with its raw 32-byte output. Intermediate keys
//! are `[u8; 32]` so they cannot be hex- or string-encoded by accident.

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Service literal for S3-compatible stores
pub const S3_SERVICE: &str = "s3";

/// Final element of every credential scope
pub const SCOPE_TERMINATOR: &str = "aws4_request";

/// `date/region/service/aws4_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialScope {
    /// UTC date, `YYYYMMDD`
    pub date: String,
    pub region: String,
    pub service: String,
}

impl CredentialScope {
    pub fn s3(date: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            region: region.into(),
            service: S3_SERVICE.to_string(),
        }
    }
}

impl fmt::Display for CredentialScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.date, self.region, self.service, SCOPE_TERMINATOR
        )
    }
}

/// Derived day/region/service-scoped signing key
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct SigningKey([u8; 32]);

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

impl SigningKey {
    /// Run the four-stage HMAC chain for `scope`
    pub fn derive(secret_access_key: &str, scope: &CredentialScope) -> Self {
        let k_date = hmac_sha256(
            format!("AWS4{secret_access_key}").as_bytes(),
            scope.date.as_bytes(),
        );
        let k_region = hmac_sha256(&k_date, scope.region.as_bytes());
        let k_service = hmac_sha256(&k_region, scope.service.as_bytes());
        Self(hmac_sha256(&k_service, SCOPE_TERMINATOR.as_bytes()))
    }

    /// Hex-encoded HMAC-SHA256 of `string_to_sign` under this key
    pub fn sign(&self, string_to_sign: &str) -> String {
        hex::encode(hmac_sha256(&self.0, string_to_sign.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

/// HMAC-SHA256 into a fixed-size array
fn hmac_sha256(key: &[u8], msg: &[u8]) -> [u8; 32] {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC can take key of any size");
    mac.update(msg);
    let mut output = [0u8; 32];
    output.copy_from_slice(&mac.finalize().into_bytes());
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_matches_published_iam_vector() {
        // AWS General Reference, "Examples of how to derive a signing key".
        let scope = CredentialScope {
            date: "20120215".to_string(),
            region: "us-east-1".to_string(),
            service: "iam".to_string(),
        };
        let key = SigningKey::derive("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY", &scope);

        assert_eq!(
            hex::encode(key.as_bytes()),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn sign_matches_s3_get_object_example() {
        let key = SigningKey::derive(
            "wJalrXUtnFEMI/K7MDENG/bPxRfiCYEXAMPLEKEY",
            &CredentialScope::s3("20130524", "us-east-1"),
        );
        let string_to_sign = "AWS4-HMAC-SHA256\n\
                              20130524T000000Z\n\
                              20130524/us-east-1/s3/aws4_request\n\
                              7344ae5b7ee6c3e7e6b0fe0640412a37625d1fbfff95c48bbb2dc43964946972";

        assert_eq!(
            key.sign(string_to_sign),
            "f0e8bdb87c964420e857bd35b5d6ed310bd44f0170aba48dd91039c6036bdb41"
        );
    }

    #[test]
    fn scope_renders_in_aws_order() {
        assert_eq!(
            CredentialScope::s3("20240115", "sa-east-1").to_string(),
            "20240115/sa-east-1/s3/aws4_request"
        );
    }

    #[test]
    fn key_depends_on_region() {
        let secret = "secret";
        let sa = SigningKey::derive(secret, &CredentialScope::s3("20240115", "sa-east-1"));
        let us = SigningKey::derive(secret, &CredentialScope::s3("20240115", "us-east-1"));
        assert_ne!(sa, us);
    }

    #[test]
    fn debug_does_not_leak_key_material() {
        let key = SigningKey::derive("secret", &CredentialScope::s3("20240115", "us-east-1"));
        assert_eq!(format!("{key:?}"), "SigningKey(<redacted>)");
    }
}
