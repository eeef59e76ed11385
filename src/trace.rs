//! Trace payload loading and validation.
//!
//! The trace arrives as JSON, either from a local file or from the upload
//! endpoint. Keys are fixed by the wire format:
//!
//! ```text
//! {
//!   "peakA": [0, 0, 4138, ...],        // required, one array per channel
//!   "peakC": [...],
//!   "peakG": [...],
//!   "peakT": [...],
//!   "basecallPos": [12, 34, ...],      // required, ordered scan positions
//!   "basecalls": {"12": "1:C", ...},   // required, "<n>:<primary>[:<secondary>]"
//!   "refalign": "CCCGGCAT...",         // optional
//!   "refchr": "example",               // optional
//!   "refpos": 32,                      // optional
//!   "forward": 1                       // optional
//! }
//! ```
//!
//! Validation is field by field; the first missing required key wins and the
//! whole load is rejected. An invalid trace is never partially rendered.

use std::fs;
use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::model::{BaseCall, Channel, Trace};

/// Errors that can occur while loading a trace payload.
#[derive(Error, Debug)]
pub enum TraceError {
    #[error("Failed to read trace file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Bad trace data: not valid JSON ({0})")]
    JsonError(#[from] serde_json::Error),

    #[error("Bad trace data: payload is not an object")]
    NotAnObject,

    #[error("Bad trace data: {0} missing")]
    MissingField(&'static str),

    #[error("Bad trace data: {0} is not an array")]
    NotAnArray(&'static str),

    #[error("Bad trace data: basecalls is not an object")]
    BasecallsNotAnObject,

    #[error("Bad trace data: basecallPos entry {0} is not a position")]
    BadPosition(usize),

    #[error("Bad trace data: no base call for position {0}")]
    MissingCall(usize),

    #[error("Bad trace data: malformed base call {0:?}")]
    MalformedCall(String),
}

/// Result type for trace loading.
pub type TraceResult<T> = Result<T, TraceError>;

const PEAK_KEYS: [(&str, Channel); 4] = [
    ("peakA", Channel::A),
    ("peakC", Channel::C),
    ("peakG", Channel::G),
    ("peakT", Channel::T),
];

/// Loads and validates a trace from a JSON file.
pub fn load_file<P: AsRef<Path>>(path: P) -> TraceResult<Trace> {
    let content = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&content)?;
    from_value(&value)
}

/// Validates and converts a decoded JSON payload into a `Trace`.
pub fn from_value(value: &Value) -> TraceResult<Trace> {
    let obj = value.as_object().ok_or(TraceError::NotAnObject)?;

    // Required keys, checked in wire order so the first missing one wins.
    for (key, _) in PEAK_KEYS {
        if !obj.contains_key(key) {
            return Err(TraceError::MissingField(key));
        }
    }
    if !obj.contains_key("basecallPos") {
        return Err(TraceError::MissingField("basecallPos"));
    }
    if !obj.contains_key("basecalls") {
        return Err(TraceError::MissingField("basecalls"));
    }

    let mut peaks: [Vec<Option<f64>>; 4] = Default::default();
    for (key, channel) in PEAK_KEYS {
        let arr = obj[key].as_array().ok_or(TraceError::NotAnArray(key))?;
        peaks[channel.index()] = arr.iter().map(sample_value).collect();
    }

    let pos_arr = obj["basecallPos"]
        .as_array()
        .ok_or(TraceError::NotAnArray("basecallPos"))?;
    let mut basecall_pos = Vec::with_capacity(pos_arr.len());
    for (i, entry) in pos_arr.iter().enumerate() {
        let pos = position_value(entry).ok_or(TraceError::BadPosition(i))?;
        basecall_pos.push(pos);
    }

    let call_map = obj["basecalls"]
        .as_object()
        .ok_or(TraceError::BasecallsNotAnObject)?;
    let mut calls = Vec::with_capacity(basecall_pos.len());
    for &pos in &basecall_pos {
        let raw = call_map
            .get(&pos.to_string())
            .and_then(Value::as_str)
            .ok_or(TraceError::MissingCall(pos))?;
        calls.push(parse_call(raw)?);
    }

    Ok(Trace {
        peaks,
        basecall_pos,
        calls,
        ref_align: obj.get("refalign").and_then(Value::as_str).map(str::to_owned),
        ref_chr: obj.get("refchr").and_then(Value::as_str).map(str::to_owned),
        ref_pos: obj.get("refpos").and_then(integer_value),
        forward: obj.get("forward").map(|v| integer_value(v) == Some(1)),
    })
}

/// One channel sample: numbers pass through, `null` and anything
/// non-numeric is an absent sample.
fn sample_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// A base-call position: a non-negative integer, possibly stringified.
fn position_value(value: &Value) -> Option<usize> {
    match value {
        Value::Number(n) => n.as_u64().map(|v| v as usize),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// An integer field (`refpos`, `forward`), possibly stringified.
fn integer_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parses a call string `"<n>:<primary>[:<secondary>]"`.
fn parse_call(raw: &str) -> TraceResult<BaseCall> {
    let malformed = || TraceError::MalformedCall(raw.to_string());

    let mut parts = raw.splitn(3, ':');
    let index = parts
        .next()
        .and_then(|s| s.trim().parse::<i64>().ok())
        .ok_or_else(malformed)?;
    let primary = parts
        .next()
        .and_then(|s| s.chars().next())
        .ok_or_else(malformed)?;
    let secondary = parts.next().and_then(|s| s.chars().next());

    Ok(BaseCall {
        index,
        primary,
        secondary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    fn minimal_payload() -> Value {
        json!({
            "peakA": [0, 10, 20],
            "peakC": [1, 11, 21],
            "peakG": [2, 12, 22],
            "peakT": [3, 13, 23],
            "basecallPos": [0, 2],
            "basecalls": {"0": "1:A", "2": "2:C"}
        })
    }

    #[test]
    fn test_minimal_payload() {
        let trace = from_value(&minimal_payload()).unwrap();
        assert_eq!(trace.len(), 3);
        assert_eq!(trace.basecall_pos, vec![0, 2]);
        assert_eq!(trace.calls[0].index, 1);
        assert_eq!(trace.calls[0].primary, 'A');
        assert_eq!(trace.calls[1].primary, 'C');
        assert!(trace.ref_align.is_none());
        assert!(trace.forward.is_none());
    }

    #[test]
    fn test_each_missing_required_field_is_named() {
        for key in ["peakA", "peakC", "peakG", "peakT", "basecallPos", "basecalls"] {
            let mut payload = minimal_payload();
            payload.as_object_mut().unwrap().remove(key);
            let err = from_value(&payload).unwrap_err();
            assert!(
                err.to_string().contains(key),
                "error for missing {key} was {err}"
            );
        }
    }

    #[test]
    fn test_first_missing_field_wins() {
        let mut payload = minimal_payload();
        let obj = payload.as_object_mut().unwrap();
        obj.remove("peakC");
        obj.remove("peakT");
        let err = from_value(&payload).unwrap_err();
        assert!(err.to_string().contains("peakC"));
    }

    #[test]
    fn test_sparse_samples_are_absent_not_zero() {
        let mut payload = minimal_payload();
        payload["peakA"] = json!([0, null, 20]);
        let trace = from_value(&payload).unwrap();
        assert_eq!(trace.channel(Channel::A)[1], None);
        assert_eq!(trace.channel(Channel::A)[2], Some(20.0));
    }

    #[test]
    fn test_stringified_samples_parse() {
        let mut payload = minimal_payload();
        payload["peakA"] = json!(["5", "x", 20]);
        let trace = from_value(&payload).unwrap();
        assert_eq!(trace.channel(Channel::A)[0], Some(5.0));
        assert_eq!(trace.channel(Channel::A)[1], None);
    }

    #[test]
    fn test_secondary_call() {
        let mut payload = minimal_payload();
        payload["basecalls"]["0"] = json!("1:A:G");
        let trace = from_value(&payload).unwrap();
        assert_eq!(trace.calls[0].secondary, Some('G'));
        assert_eq!(trace.calls[0].tick_label(), "AG");
        assert_eq!(trace.calls[1].secondary, None);
        assert_eq!(trace.calls[1].secondary_or_primary(), 'C');
    }

    #[test]
    fn test_missing_call_for_position() {
        let mut payload = minimal_payload();
        payload["basecallPos"] = json!([0, 1]);
        let err = from_value(&payload).unwrap_err();
        assert!(err.to_string().contains("position 1"));
    }

    #[test]
    fn test_malformed_call_string() {
        let mut payload = minimal_payload();
        payload["basecalls"]["0"] = json!("nonsense");
        assert!(matches!(
            from_value(&payload).unwrap_err(),
            TraceError::MalformedCall(_)
        ));
    }

    #[test]
    fn test_reference_fields() {
        let mut payload = minimal_payload();
        let obj = payload.as_object_mut().unwrap();
        obj.insert("refalign".into(), json!("AC"));
        obj.insert("refchr".into(), json!("chr7"));
        obj.insert("refpos".into(), json!(128));
        obj.insert("forward".into(), json!(1));
        let trace = from_value(&payload).unwrap();
        assert_eq!(trace.ref_align.as_deref(), Some("AC"));
        assert_eq!(trace.ref_chr.as_deref(), Some("chr7"));
        assert_eq!(trace.ref_pos, Some(128));
        assert_eq!(trace.forward, Some(true));
    }

    #[test]
    fn test_forward_zero_is_reverse() {
        let mut payload = minimal_payload();
        payload
            .as_object_mut()
            .unwrap()
            .insert("forward".into(), json!(0));
        let trace = from_value(&payload).unwrap();
        assert_eq!(trace.forward, Some(false));
    }

    #[test]
    fn test_load_file_round_trip() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", minimal_payload()).unwrap();
        let trace = load_file(file.path()).unwrap();
        assert_eq!(trace.len(), 3);
    }

    #[test]
    fn test_load_file_rejects_invalid_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        assert!(matches!(
            load_file(file.path()).unwrap_err(),
            TraceError::JsonError(_)
        ));
    }

    #[test]
    fn test_payload_must_be_object() {
        assert!(matches!(
            from_value(&json!([1, 2, 3])).unwrap_err(),
            TraceError::NotAnObject
        ));
    }
}
