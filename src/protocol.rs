//! Wire protocol between the client and the computation backend.
//!
//! Every message is a JSON object tagged with a numeric `action` code. Requests
//! are `{"action": code, "id": n, "content": {...}}`. Replies are decoded into
//! the closed [`Reply`] enum so that each action has its own payload shape and
//! every handler `match` is exhaustive.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::data::dataset::{Dataset, DatasetError};
use crate::data::network::Link;

/// Client-assigned correlation id, echoed by backends that support it.
pub type RequestId = u64;

/// Action codes understood by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u64")]
pub enum Action {
    PassData,
    PassSelectionMeans,
    PassOverallMeans,
    PassNetworkLayout,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::PassData,
        Action::PassSelectionMeans,
        Action::PassOverallMeans,
        Action::PassNetworkLayout,
    ];

    pub const fn code(self) -> u8 {
        match self {
            Action::PassData => 0,
            Action::PassSelectionMeans => 1,
            Action::PassOverallMeans => 2,
            Action::PassNetworkLayout => 3,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        Self::ALL.into_iter().find(|a| a.code() as u64 == code)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Action::PassData => "passData",
            Action::PassSelectionMeans => "passSelectionMeans",
            Action::PassOverallMeans => "passOverallMeans",
            Action::PassNetworkLayout => "passNetworkLayout",
        }
    }
}

impl From<Action> for u8 {
    fn from(a: Action) -> u8 {
        a.code()
    }
}

impl TryFrom<u64> for Action {
    type Error = ProtocolError;

    fn try_from(code: u64) -> Result<Self, Self::Error> {
        Action::from_code(code).ok_or(ProtocolError::UnknownAction(code))
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("message has no numeric `action`")]
    MissingAction,
    #[error("unknown action code {0}")]
    UnknownAction(u64),
    #[error("{action} reply is missing `{field}`")]
    MissingField { action: Action, field: &'static str },
    #[error("{action} reply has an invalid `{field}`: {detail}")]
    InvalidField {
        action: Action,
        field: &'static str,
        detail: String,
    },
    #[error("passData reply has invalid records: {0}")]
    Dataset(#[from] DatasetError),
}

/// Requests the client can issue.
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// Ask for the dataset, optionally naming which one.
    Data { name: Option<String> },
    /// Means over the given point indices.
    SelectionMeans { indices: Vec<usize> },
    /// Means over every point.
    OverallMeans,
    /// Layout positions for a node-link structure.
    NetworkLayout { nodes: Vec<usize>, links: Vec<Link> },
}

impl Request {
    pub fn action(&self) -> Action {
        match self {
            Request::Data { .. } => Action::PassData,
            Request::SelectionMeans { .. } => Action::PassSelectionMeans,
            Request::OverallMeans => Action::PassOverallMeans,
            Request::NetworkLayout { .. } => Action::PassNetworkLayout,
        }
    }

    pub fn content(&self) -> Value {
        match self {
            Request::Data { name: Some(name) } => json!({ "name": name }),
            Request::Data { name: None } | Request::OverallMeans => json!({}),
            Request::SelectionMeans { indices } => json!({ "indices": indices }),
            Request::NetworkLayout { nodes, links } => json!({ "nodes": nodes, "links": links }),
        }
    }

    /// Serialize to the wire text for request `id`.
    pub fn encode(&self, id: RequestId) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(&json!({
            "action": self.action(),
            "id": id,
            "content": self.content(),
        }))?)
    }
}

/// Mean value per feature over a set of points.
#[derive(Debug, Clone, PartialEq)]
pub struct MeansReply {
    pub means: Vec<f64>,
    /// Number of points the means summarize.
    pub count: usize,
}

/// Decoded backend replies, one variant per action.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Data(Dataset),
    SelectionMeans(MeansReply),
    OverallMeans(MeansReply),
    /// Positions aligned by node index.
    NetworkLayout { positions: Vec<[f64; 2]> },
}

impl Reply {
    pub fn action(&self) -> Action {
        match self {
            Reply::Data(_) => Action::PassData,
            Reply::SelectionMeans(_) => Action::PassSelectionMeans,
            Reply::OverallMeans(_) => Action::PassOverallMeans,
            Reply::NetworkLayout { .. } => Action::PassNetworkLayout,
        }
    }
}

/// An incoming message whose envelope decoded. The payload may still be invalid.
#[derive(Debug)]
pub struct Incoming {
    pub action: Action,
    pub id: Option<RequestId>,
    pub body: Result<Reply, ProtocolError>,
}

/// Decode wire text. Fails only when the envelope itself (JSON, action) is unusable.
///
/// Bare `NaN` / `Infinity` tokens, which Python's `json.dumps` writes for
/// non-finite floats, are read as `null`.
pub fn decode_incoming(text: &str) -> Result<Incoming, ProtocolError> {
    let value: Value = serde_json::from_str(&replace_non_finite(text))?;
    let obj = value.as_object().ok_or(ProtocolError::MissingAction)?;
    let code = obj
        .get("action")
        .and_then(Value::as_u64)
        .ok_or(ProtocolError::MissingAction)?;
    let action = Action::try_from(code)?;
    let id = obj.get("id").and_then(Value::as_u64);
    let body = match action {
        Action::PassData => decode_data(obj).map(Reply::Data),
        Action::PassSelectionMeans => decode_means(action, obj).map(Reply::SelectionMeans),
        Action::PassOverallMeans => decode_means(action, obj).map(Reply::OverallMeans),
        Action::PassNetworkLayout => {
            decode_layout(obj).map(|positions| Reply::NetworkLayout { positions })
        }
    };
    Ok(Incoming { action, id, body })
}

/// Best-effort lookup of the `action` code in text that failed to decode.
pub fn sniff_action(text: &str) -> Option<Action> {
    let (_, rest) = text.split_once("\"action\"")?;
    let rest = rest.trim_start().strip_prefix(':')?.trim_start();
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok().and_then(Action::from_code)
}

/// Rewrite non-finite number tokens outside of strings to `null`.
fn replace_non_finite(text: &str) -> Cow<'_, str> {
    if !text.contains("NaN") && !text.contains("Infinity") {
        return Cow::Borrowed(text);
    }
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    let mut in_string = false;
    let mut escaped = false;
    while let Some(c) = rest.chars().next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if let Some(token) = ["-Infinity", "Infinity", "NaN"]
            .into_iter()
            .find(|t| rest.starts_with(t))
        {
            out.push_str("null");
            rest = &rest[token.len()..];
            continue;
        }
        out.push(c);
        rest = &rest[c.len_utf8()..];
    }
    Cow::Owned(out)
}

fn decode_data(obj: &Map<String, Value>) -> Result<Dataset, ProtocolError> {
    let action = Action::PassData;
    let content = obj.get("content").ok_or(ProtocolError::MissingField {
        action,
        field: "content",
    })?;
    // The reference backend double-encodes the records as a JSON string.
    let parsed;
    let records = match content {
        Value::String(s) => {
            parsed = serde_json::from_str::<Value>(s)?;
            &parsed
        }
        other => other,
    };
    let records = records.as_array().ok_or_else(|| ProtocolError::InvalidField {
        action,
        field: "content",
        detail: "expected an array of records".to_string(),
    })?;
    let feature_names = string_list(obj, action, "featureNames")?;
    let class_names = string_list(obj, action, "classNames")?;
    Ok(Dataset::from_records(records, feature_names, class_names)?)
}

fn string_list(
    obj: &Map<String, Value>,
    action: Action,
    field: &'static str,
) -> Result<Vec<String>, ProtocolError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(v) => serde_json::from_value(v.clone()).map_err(|e| ProtocolError::InvalidField {
            action,
            field,
            detail: e.to_string(),
        }),
    }
}

fn decode_means(action: Action, obj: &Map<String, Value>) -> Result<MeansReply, ProtocolError> {
    // Means travel either at the top level or inside `content`.
    let source = if obj.contains_key("means") {
        obj
    } else {
        obj.get("content")
            .and_then(Value::as_object)
            .ok_or(ProtocolError::MissingField {
                action,
                field: "means",
            })?
    };
    let means = source.get("means").ok_or(ProtocolError::MissingField {
        action,
        field: "means",
    })?;
    // A constant feature normalizes to NaN on the backend; draw it as an empty bar.
    let means: Vec<Option<f64>> =
        serde_json::from_value(means.clone()).map_err(|e| ProtocolError::InvalidField {
            action,
            field: "means",
            detail: e.to_string(),
        })?;
    let means = means.into_iter().map(|m| m.unwrap_or(0.0)).collect();
    let count = source
        .get("count")
        .ok_or(ProtocolError::MissingField {
            action,
            field: "count",
        })?
        .as_u64()
        .ok_or_else(|| ProtocolError::InvalidField {
            action,
            field: "count",
            detail: "expected a non-negative integer".to_string(),
        })?;
    Ok(MeansReply {
        means,
        count: count as usize,
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum WirePosition {
    Pair([f64; 2]),
    Object { x: f64, y: f64 },
}

fn decode_layout(obj: &Map<String, Value>) -> Result<Vec<[f64; 2]>, ProtocolError> {
    let action = Action::PassNetworkLayout;
    let content = obj.get("content").ok_or(ProtocolError::MissingField {
        action,
        field: "content",
    })?;
    let positions: Vec<WirePosition> =
        serde_json::from_value(content.clone()).map_err(|e| ProtocolError::InvalidField {
            action,
            field: "content",
            detail: e.to_string(),
        })?;
    Ok(positions
        .into_iter()
        .map(|p| match p {
            WirePosition::Pair(xy) => xy,
            WirePosition::Object { x, y } => [x, y],
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_codes_are_stable() {
        assert_eq!(Action::PassData.code(), 0);
        assert_eq!(Action::PassSelectionMeans.code(), 1);
        assert_eq!(Action::PassOverallMeans.code(), 2);
        assert_eq!(Action::PassNetworkLayout.code(), 3);
        assert_eq!(Action::from_code(3), Some(Action::PassNetworkLayout));
        assert_eq!(Action::from_code(9), None);
    }

    #[test]
    fn selection_means_request_wire_shape() {
        let text = Request::SelectionMeans { indices: vec![0, 4] }.encode(7).unwrap();
        let v: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v, json!({"action": 1, "id": 7, "content": {"indices": [0, 4]}}));
    }

    #[test]
    fn data_request_carries_dataset_name() {
        let req = Request::Data {
            name: Some("wine_result.csv".into()),
        };
        assert_eq!(req.content(), json!({"name": "wine_result.csv"}));
        assert_eq!(Request::Data { name: None }.content(), json!({}));
    }

    #[test]
    fn means_reply_at_top_level_or_in_content() {
        let top = decode_incoming(r#"{"action": 2, "means": [0.5, 0.25], "count": 178}"#).unwrap();
        assert_eq!(top.action, Action::PassOverallMeans);
        assert_eq!(
            top.body.unwrap(),
            Reply::OverallMeans(MeansReply {
                means: vec![0.5, 0.25],
                count: 178
            })
        );

        let nested =
            decode_incoming(r#"{"action": 1, "id": 3, "content": {"means": [1.0], "count": 1}}"#)
                .unwrap();
        assert_eq!(nested.id, Some(3));
        assert!(matches!(nested.body, Ok(Reply::SelectionMeans(_))));
    }

    #[test]
    fn missing_means_is_a_payload_error_not_an_envelope_error() {
        let inc = decode_incoming(r#"{"action": 1, "count": 3}"#).unwrap();
        assert_eq!(inc.action, Action::PassSelectionMeans);
        assert!(matches!(
            inc.body,
            Err(ProtocolError::MissingField { field: "means", .. })
        ));
    }

    #[test]
    fn envelope_errors() {
        assert!(matches!(decode_incoming("not json"), Err(ProtocolError::Json(_))));
        assert!(matches!(decode_incoming("{}"), Err(ProtocolError::MissingAction)));
        assert!(matches!(
            decode_incoming(r#"{"action": 42}"#),
            Err(ProtocolError::UnknownAction(42))
        ));
    }

    #[test]
    fn non_finite_means_decode_as_empty_bars() {
        let inc = decode_incoming(r#"{"action": 1, "means": [NaN, 0.5, -Infinity], "count": 1}"#)
            .unwrap();
        assert_eq!(
            inc.body.unwrap(),
            Reply::SelectionMeans(MeansReply {
                means: vec![0.0, 0.5, 0.0],
                count: 1
            })
        );
    }

    #[test]
    fn non_finite_tokens_inside_strings_are_kept() {
        let text = r#"{"action": 0, "note": "NaN \" Infinity", "x": NaN}"#;
        let fixed = replace_non_finite(text);
        assert_eq!(fixed, r#"{"action": 0, "note": "NaN \" Infinity", "x": null}"#);
        assert!(matches!(replace_non_finite("{\"a\": 1}"), Cow::Borrowed(_)));
    }

    #[test]
    fn action_is_recovered_from_broken_text() {
        assert_eq!(
            sniff_action(r#"{"action": 2, "means": [0.1,"#),
            Some(Action::PassOverallMeans)
        );
        assert_eq!(sniff_action(r#"{"action":1,"means":[nan]}"#), Some(Action::PassSelectionMeans));
        assert_eq!(sniff_action("{not json"), None);
        assert_eq!(sniff_action(r#"{"action": 42}"#), None);
    }

    #[test]
    fn data_reply_with_string_encoded_records() {
        let records = r#"[{"tsne_1": 1.0, "tsne_2": 2.0, "label": 1, "ash": 2.5}]"#;
        let msg = json!({
            "action": 0,
            "content": records,
            "featureNames": ["ash"],
            "classNames": ["a", "b"],
        });
        let inc = decode_incoming(&msg.to_string()).unwrap();
        let Reply::Data(ds) = inc.body.unwrap() else {
            panic!("expected data reply");
        };
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.feature(0, "ash"), Some(2.5));
        assert_eq!(ds.class_names, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn layout_reply_accepts_pairs_and_objects() {
        let inc = decode_incoming(r#"{"action": 3, "content": [[0, 1], {"x": 2.5, "y": -1}]}"#).unwrap();
        assert_eq!(
            inc.body.unwrap(),
            Reply::NetworkLayout {
                positions: vec![[0.0, 1.0], [2.5, -1.0]]
            }
        );
    }
}
