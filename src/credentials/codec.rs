//! Packing a [`CredentialRecord`] into a single storable string.
//!
//! Format: `base64(expiry):base64(token)`, standard alphabet with padding.
//! The expiry is an RFC 3339 timestamp with an explicit offset.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, SecondsFormat, Utc};
use secrecy::{ExposeSecret, SecretString};

use super::CredentialRecord;

const SEPARATOR: char = ':';

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("no stored value")]
    Empty,

    #[error("missing ':' separator")]
    MissingSeparator,

    #[error("{part} is not valid base64")]
    Base64 {
        part: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("{part} is not valid UTF-8")]
    Utf8 {
        part: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("expiry is not an ISO-8601 timestamp")]
    Timestamp(#[from] chrono::ParseError),
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EncodeError {
    /// A token without an expiry is never constructed by the cache; seeing
    /// one here is a bug.
    #[error("credential has a token but no expiry")]
    MissingExpiry,
}

/// Decode a stored value, falling back to an empty record on any failure.
///
/// A value that can't be decoded is indistinguishable from no value at all.
pub fn decode(input: Option<&str>) -> CredentialRecord {
    match input.map_or(Err(DecodeError::Empty), try_decode) {
        Ok(record) => record,
        Err(DecodeError::Empty) => CredentialRecord::empty(),
        Err(err) => {
            tracing::debug!(error = %err, "Stored credential could not be decoded");
            CredentialRecord::empty()
        }
    }
}

/// Decode a stored value, reporting why it could not be read.
pub fn try_decode(input: &str) -> Result<CredentialRecord, DecodeError> {
    if input.is_empty() {
        return Err(DecodeError::Empty);
    }

    let (encoded_expiry, encoded_token) = input
        .split_once(SEPARATOR)
        .ok_or(DecodeError::MissingSeparator)?;

    let expiry = decode_part(encoded_expiry, "expiry")?;
    let expiry = DateTime::parse_from_rfc3339(&expiry)?.with_timezone(&Utc);
    let token = decode_part(encoded_token, "token")?;

    Ok(CredentialRecord::new(SecretString::from(token), expiry))
}

fn decode_part(encoded: &str, part: &'static str) -> Result<String, DecodeError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|source| DecodeError::Base64 { part, source })?;
    String::from_utf8(bytes).map_err(|source| DecodeError::Utf8 { part, source })
}

/// Encode a record for storage.
///
/// Returns `Ok(None)` when there is no token to persist.
pub fn encode(record: &CredentialRecord) -> Result<Option<String>, EncodeError> {
    let Some(token) = &record.token else {
        return Ok(None);
    };
    let expiry = record.expiry.ok_or(EncodeError::MissingExpiry)?;

    let encoded_expiry = STANDARD.encode(expiry.to_rfc3339_opts(SecondsFormat::AutoSi, false));
    let encoded_token = STANDARD.encode(token.expose_secret());

    Ok(Some(format!("{encoded_expiry}{SEPARATOR}{encoded_token}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn expiry() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 5, 12, 55, 0).unwrap()
    }

    #[test]
    fn test_roundtrip_preserves_token_and_expiry() {
        let expiry = expiry() + Duration::nanoseconds(123_456_789);
        let record = CredentialRecord::new(SecretString::from("ya29.a0AfH6SM"), expiry);

        let encoded = encode(&record).unwrap().expect("token present");
        let decoded = decode(Some(&encoded));

        assert_eq!(decoded.expiry, Some(expiry));
        assert_eq!(
            decoded.token.as_ref().map(|t| t.expose_secret()),
            Some("ya29.a0AfH6SM")
        );
    }

    #[test]
    fn test_encoded_layout() {
        let record = CredentialRecord::new(SecretString::from("tok-abc"), expiry());
        let encoded = encode(&record).unwrap().unwrap();

        let (expiry_part, token_part) = encoded.split_once(':').unwrap();
        assert_eq!(
            STANDARD.decode(expiry_part).unwrap(),
            b"2026-02-05T12:55:00+00:00"
        );
        assert_eq!(STANDARD.decode(token_part).unwrap(), b"tok-abc");
        assert_eq!(encoded.matches(':').count(), 1);
    }

    #[test]
    fn test_decodes_offset_timestamps_to_utc() {
        let encoded = format!(
            "{}:{}",
            STANDARD.encode("2026-02-05T13:55:00.5+01:00"),
            STANDARD.encode("tok")
        );
        let record = try_decode(&encoded).unwrap();
        assert_eq!(
            record.expiry,
            Some(expiry() + Duration::milliseconds(500))
        );
    }

    #[test]
    fn test_encode_without_token_is_none() {
        assert_eq!(encode(&CredentialRecord::empty()), Ok(None));

        let expiry_only = CredentialRecord {
            token: None,
            expiry: Some(expiry()),
        };
        assert_eq!(encode(&expiry_only), Ok(None));
    }

    #[test]
    fn test_encode_token_without_expiry_is_an_error() {
        let record = CredentialRecord {
            token: Some(SecretString::from("tok")),
            expiry: None,
        };
        assert_eq!(encode(&record), Err(EncodeError::MissingExpiry));
    }

    #[test]
    fn test_decode_absent_and_garbage_yield_empty_record() {
        let now = expiry();
        for input in [None, Some(""), Some("garbage-not-base64")] {
            let record = decode(input);
            assert!(record.token.is_none());
            assert!(record.expiry.is_none());
            assert!(!record.is_valid(now));
        }
    }

    #[test]
    fn test_try_decode_reports_each_failure() {
        assert!(matches!(try_decode(""), Err(DecodeError::Empty)));
        assert!(matches!(
            try_decode("no-separator"),
            Err(DecodeError::MissingSeparator)
        ));
        assert!(matches!(
            try_decode("!!!:dG9r"),
            Err(DecodeError::Base64 { part: "expiry", .. })
        ));

        let bad_time = format!("{}:{}", STANDARD.encode("yesterday"), STANDARD.encode("tok"));
        assert!(matches!(try_decode(&bad_time), Err(DecodeError::Timestamp(_))));

        let good_time = STANDARD.encode("2026-02-05T12:55:00+00:00");
        let extra_separator = format!("{good_time}:dG9r:dG9r");
        assert!(matches!(
            try_decode(&extra_separator),
            Err(DecodeError::Base64 { part: "token", .. })
        ));

        let bad_utf8 = format!("{good_time}:{}", STANDARD.encode([0xff, 0xfe]));
        assert!(matches!(
            try_decode(&bad_utf8),
            Err(DecodeError::Utf8 { part: "token", .. })
        ));
    }

    #[test]
    fn test_naive_timestamp_is_rejected() {
        let encoded = format!(
            "{}:{}",
            STANDARD.encode("2026-02-05T12:55:00"),
            STANDARD.encode("tok")
        );
        assert!(decode(Some(&encoded)).token.is_none());
    }
}
