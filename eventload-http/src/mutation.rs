//! Deterministic URL mutations used to spread load across query windows
//!
//! A load run derives request `i` from a template by shifting the bounding
//! box and advancing the time cursor by an amount proportional to `i`, so no
//! two requests hit the same cached query.

use crate::errors::HttpError;
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use url::Url;

/// Number of components in a bounding box parameter
const BBOX_LEN: usize = 4;

/// Add `step * multiplier` to every element of the comma-joined 4-tuple
/// parameter `name`.
pub fn shift_numeric_range_param(
    url: &Url,
    name: &str,
    step: f64,
    multiplier: i64,
) -> Result<Url, HttpError> {
    let raw = query_param(url, name)?;
    let values = raw
        .split(',')
        .map(|part| {
            part.trim().parse::<f64>().map_err(|e| HttpError::MalformedParam {
                name: name.to_string(),
                value: raw.clone(),
                reason: e.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if values.len() != BBOX_LEN {
        return Err(HttpError::MalformedParam {
            name: name.to_string(),
            value: raw,
            reason: format!("expected {} numbers, got {}", BBOX_LEN, values.len()),
        });
    }

    let shift = step * multiplier as f64;
    let shifted = values
        .iter()
        .map(|v| (v + shift).to_string())
        .collect::<Vec<_>>()
        .join(",");

    Ok(set_query_param(url, name, &shifted))
}

/// Move the ISO-8601 timestamp parameter `name` forward by `minutes`.
///
/// The result is re-serialized in UTC with millisecond precision.
pub fn advance_timestamp_param(url: &Url, name: &str, minutes: i64) -> Result<Url, HttpError> {
    let raw = query_param(url, name)?;
    let parsed = DateTime::parse_from_rfc3339(raw.trim()).map_err(|e| {
        HttpError::MalformedParam {
            name: name.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        }
    })?;

    let advanced = TimeDelta::try_minutes(minutes)
        .and_then(|offset| parsed.with_timezone(&Utc).checked_add_signed(offset))
        .ok_or_else(|| HttpError::MalformedParam {
            name: name.to_string(),
            value: raw.clone(),
            reason: format!("offset of {} minutes out of range", minutes),
        })?;
    let formatted = advanced.to_rfc3339_opts(SecondsFormat::Millis, true);

    Ok(set_query_param(url, name, &formatted))
}

fn query_param(url: &Url, name: &str) -> Result<String, HttpError> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .ok_or_else(|| HttpError::MissingParam {
            name: name.to_string(),
            url: url.to_string(),
        })
}

/// Replace the first `name` pair in place and drop any later duplicates,
/// keeping every other pair in its original position.
fn set_query_param(url: &Url, name: &str, value: &str) -> Url {
    let mut replaced = false;
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .into_owned()
        .filter_map(|(key, old)| {
            if key != name {
                Some((key, old))
            } else if !replaced {
                replaced = true;
                Some((key, value.to_string()))
            } else {
                None
            }
        })
        .collect();

    let mut updated = url.clone();
    updated.query_pairs_mut().clear().extend_pairs(pairs);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;

    fn template() -> Url {
        let mut url = Url::parse("https://apps.example.org/events/v1/").unwrap();
        url.query_pairs_mut()
            .append_pair("feed", "pdc")
            .append_pair("bbox", "-93.2175,30.198,-93.2165,30.199")
            .append_pair("after", "2024-02-13T23:20:50.52Z")
            .append_pair("limit", "1000");
        url
    }

    fn bbox_of(url: &Url) -> Vec<f64> {
        query_param(url, "bbox")
            .unwrap()
            .split(',')
            .map(|v| v.parse().unwrap())
            .collect()
    }

    #[test]
    fn test_shift_with_zero_multiplier_is_identity() {
        let url = template();
        let shifted = shift_numeric_range_param(&url, "bbox", 0.00001, 0).unwrap();
        assert_eq!(bbox_of(&shifted), bbox_of(&url));
    }

    #[test]
    fn test_shift_is_additive_per_element() {
        let url = template();
        for k in [1i64, 3, 250] {
            let shifted = shift_numeric_range_param(&url, "bbox", 0.00001, k).unwrap();
            for (before, after) in bbox_of(&url).iter().zip(bbox_of(&shifted)) {
                assert!((after - before - 0.00001 * k as f64).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_shift_preserves_parameter_order() {
        let shifted = shift_numeric_range_param(&template(), "bbox", 1.0, 1).unwrap();
        let keys: Vec<String> = shifted.query_pairs().map(|(k, _)| k.into_owned()).collect();
        assert_eq!(keys, vec!["feed", "bbox", "after", "limit"]);
    }

    #[test]
    fn test_shift_requires_the_parameter() {
        let url = Url::parse("https://apps.example.org/events/v1/?feed=pdc").unwrap();
        let err = shift_numeric_range_param(&url, "bbox", 1.0, 1).unwrap_err();
        assert!(matches!(err, HttpError::MissingParam { .. }));
    }

    #[test]
    fn test_shift_rejects_wrong_arity() {
        let url = Url::parse("https://apps.example.org/?bbox=1,2,3").unwrap();
        let err = shift_numeric_range_param(&url, "bbox", 1.0, 1).unwrap_err();
        assert!(matches!(err, HttpError::MalformedParam { .. }));
    }

    #[test]
    fn test_advance_with_zero_minutes_keeps_the_instant() {
        let url = template();
        let advanced = advance_timestamp_param(&url, "after", 0).unwrap();
        let before = DateTime::parse_from_rfc3339(&query_param(&url, "after").unwrap()).unwrap();
        let after = DateTime::parse_from_rfc3339(&query_param(&advanced, "after").unwrap()).unwrap();
        assert_eq!(before, after);
        assert_eq!(query_param(&advanced, "after").unwrap(), "2024-02-13T23:20:50.520Z");
    }

    #[test]
    fn test_advance_moves_cursor_by_minutes() {
        let advanced = advance_timestamp_param(&template(), "after", 75).unwrap();
        assert_eq!(query_param(&advanced, "after").unwrap(), "2024-02-14T00:35:50.520Z");
    }

    #[test]
    fn test_advance_rejects_missing_or_garbled_timestamp() {
        let missing = Url::parse("https://apps.example.org/?feed=pdc").unwrap();
        assert!(matches!(
            advance_timestamp_param(&missing, "after", 1).unwrap_err(),
            HttpError::MissingParam { .. }
        ));

        let garbled = Url::parse("https://apps.example.org/?after=last-tuesday").unwrap();
        assert!(matches!(
            advance_timestamp_param(&garbled, "after", 1).unwrap_err(),
            HttpError::MalformedParam { .. }
        ));
    }

    #[test]
    fn test_advance_rejects_offsets_outside_the_calendar() {
        for minutes in [i64::MAX / 100, 200_000_000_000, -200_000_000_000] {
            let err = advance_timestamp_param(&template(), "after", minutes).unwrap_err();
            assert!(
                matches!(&err, HttpError::MalformedParam { reason, .. } if reason.contains("out of range")),
                "unexpected error for {} minutes: {}",
                minutes,
                err
            );
        }
    }
}
