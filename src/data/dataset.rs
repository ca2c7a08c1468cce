//! The explored dataset: projected points with labels and named features.

use serde_json::{Map, Value};

/// Record keys that carry the projection and the label rather than features.
pub const X_KEY: &str = "tsne_1";
pub const Y_KEY: &str = "tsne_2";
pub const LABEL_KEY: &str = "label";

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("record {index} is not a JSON object")]
    NotAnObject { index: usize },
    #[error("record {index} is missing numeric field `{field}`")]
    MissingField { index: usize, field: String },
    #[error("record {index} has invalid label {value}")]
    InvalidLabel { index: usize, value: String },
}

/// A single data point. Its identity is its index in [`Dataset::points`].
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    /// 2-D projected position (`tsne_1`, `tsne_2`).
    pub position: [f64; 2],
    pub label: u32,
    /// Feature values aligned with [`Dataset::feature_names`].
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub points: Vec<Point>,
    pub feature_names: Vec<String>,
    pub class_names: Vec<String>,
}

impl Dataset {
    /// Build a dataset from decoded JSON records.
    ///
    /// When `feature_names` is empty the names are taken from the numeric keys
    /// of the first record, excluding projection and label keys.
    pub fn from_records(
        records: &[Value],
        feature_names: Vec<String>,
        class_names: Vec<String>,
    ) -> Result<Self, DatasetError> {
        let feature_names = if feature_names.is_empty() {
            infer_feature_names(records.first())
        } else {
            feature_names
        };
        let points = records
            .iter()
            .enumerate()
            .map(|(index, rec)| {
                let obj = rec.as_object().ok_or(DatasetError::NotAnObject { index })?;
                let x = number(obj, index, X_KEY)?;
                let y = number(obj, index, Y_KEY)?;
                let label = label(obj, index)?;
                let features = feature_names
                    .iter()
                    .map(|name| number(obj, index, name))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Point {
                    position: [x, y],
                    label,
                    features,
                })
            })
            .collect::<Result<Vec<_>, DatasetError>>()?;
        Ok(Self {
            points,
            feature_names,
            class_names,
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn labels(&self) -> Vec<u32> {
        self.points.iter().map(|p| p.label).collect()
    }

    pub fn positions(&self) -> Vec<[f64; 2]> {
        self.points.iter().map(|p| p.position).collect()
    }

    /// Value of feature `name` for point `index`.
    pub fn feature(&self, index: usize, name: &str) -> Option<f64> {
        let column = self.feature_names.iter().position(|n| n == name)?;
        self.points.get(index)?.features.get(column).copied()
    }

    /// Human-readable class name for `label`, falling back to the number.
    pub fn class_name(&self, label: u32) -> String {
        self.class_names
            .get(label as usize)
            .cloned()
            .unwrap_or_else(|| label.to_string())
    }
}

fn infer_feature_names(first: Option<&Value>) -> Vec<String> {
    let Some(obj) = first.and_then(Value::as_object) else {
        return Vec::new();
    };
    obj.iter()
        .filter(|(k, v)| v.is_number() && !matches!(k.as_str(), X_KEY | Y_KEY | LABEL_KEY))
        .map(|(k, _)| k.clone())
        .collect()
}

fn number(obj: &Map<String, Value>, index: usize, field: &str) -> Result<f64, DatasetError> {
    obj.get(field)
        .and_then(Value::as_f64)
        .ok_or_else(|| DatasetError::MissingField {
            index,
            field: field.to_string(),
        })
}

fn label(obj: &Map<String, Value>, index: usize) -> Result<u32, DatasetError> {
    let value = obj.get(LABEL_KEY).ok_or_else(|| DatasetError::MissingField {
        index,
        field: LABEL_KEY.to_string(),
    })?;
    if let Some(l) = value.as_u64() {
        return u32::try_from(l).map_err(|_| DatasetError::InvalidLabel {
            index,
            value: value.to_string(),
        });
    }
    // pandas may emit integral labels as floats
    match value.as_f64() {
        Some(f) if f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 => Ok(f as u32),
        _ => Err(DatasetError::InvalidLabel {
            index,
            value: value.to_string(),
        }),
    }
}
