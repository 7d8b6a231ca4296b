//! # Validated API Models
//!
//! Every request and response shape in this crate tolerates fields it does
//! not declare. Unknown keys are captured into an [`ExtraFields`] map at
//! construction or decode time instead of being rejected, so values built
//! from newer server payloads (or by hand, with a typo) can be held and
//! inspected freely.
//!
//! ## How it works
//!
//! Strictness is enforced on demand, not on construction. The transport
//! calls [`StrictFields::check_extra_fields`] exactly once before a request
//! is sent; the check walks the whole value graph (nested shapes, vectors,
//! string-keyed maps, optionals) and fails with a [`SchemaError`] naming the
//! offending fields. A failure in a child fails the parent unchanged.
//!
//! Responses keep their captured extras after decoding; nothing validates a
//! response.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// A value (or one of its children) holds fields outside its declared shape.
///
/// Raised by [`StrictFields::check_extra_fields`] before a request leaves
/// the process, never by construction or decoding.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Cannot set unknown fields: [{}]", .fields.join(", "))]
pub struct SchemaError {
    /// Names of the unknown fields, in lexicographic order.
    pub fields: Vec<String>,
}

/// Unknown fields captured during construction or decoding.
///
/// Declared on every wire shape as a `#[serde(flatten)]` trailing field, so
/// serialization writes the captured keys back at the top level and decoding
/// collects whatever the declared fields did not consume.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExtraFields(BTreeMap<String, serde_json::Value>);

impl ExtraFields {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&serde_json::Value> {
        self.0.get(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: serde_json::Value) {
        self.0.insert(name.into(), value);
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Fails with a [`SchemaError`] naming every captured field.
    pub fn check_empty(&self) -> Result<(), SchemaError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(SchemaError {
                fields: self.0.keys().cloned().collect(),
            })
        }
    }
}

/// On-demand validation that a value declares every field it carries.
///
/// Implementations check their own [`ExtraFields`] first, then every
/// declared field that can contain nested shapes. Scalar fields and
/// free-form `serde_json::Value` fields are not walked.
pub trait StrictFields {
    fn check_extra_fields(&self) -> Result<(), SchemaError>;
}

impl<T: StrictFields> StrictFields for Option<T> {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        match self {
            Some(value) => value.check_extra_fields(),
            None => Ok(()),
        }
    }
}

impl<T: StrictFields> StrictFields for Vec<T> {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.iter().try_for_each(StrictFields::check_extra_fields)
    }
}

impl<T: StrictFields> StrictFields for Box<T> {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.as_ref().check_extra_fields()
    }
}

impl<T: StrictFields> StrictFields for BTreeMap<String, T> {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.values().try_for_each(StrictFields::check_extra_fields)
    }
}

impl<T: StrictFields> StrictFields for HashMap<String, T> {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.values().try_for_each(StrictFields::check_extra_fields)
    }
}

/// Plain maps carry no declared shape, so there is nothing to validate.
impl StrictFields for serde_json::Map<String, serde_json::Value> {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Measurement {
        count: i64,
        ratio: f64,
        label: String,
        #[serde(flatten)]
        extra: ExtraFields,
    }

    impl StrictFields for Measurement {
        fn check_extra_fields(&self) -> Result<(), SchemaError> {
            self.extra.check_empty()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Sample {
        measurement: Measurement,
        run: i64,
        #[serde(flatten)]
        extra: ExtraFields,
    }

    impl StrictFields for Sample {
        fn check_extra_fields(&self) -> Result<(), SchemaError> {
            self.extra.check_empty()?;
            self.measurement.check_extra_fields()
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    struct Batch {
        run: i64,
        measurements: Vec<Measurement>,
        sample: Option<Sample>,
        by_name: HashMap<String, Measurement>,
        #[serde(flatten)]
        extra: ExtraFields,
    }

    impl StrictFields for Batch {
        fn check_extra_fields(&self) -> Result<(), SchemaError> {
            self.extra.check_empty()?;
            self.measurements.check_extra_fields()?;
            self.sample.check_extra_fields()?;
            self.by_name.check_extra_fields()
        }
    }

    fn measurement(value: serde_json::Value) -> Measurement {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn unknown_fields_are_captured_not_rejected() {
        let m = measurement(json!({
            "count": 2, "ratio": 3.3, "label": "val", "unknown": "surprise"
        }));
        assert_eq!(m.extra.get("unknown"), Some(&json!("surprise")));

        // The failure happens only when the check is requested.
        let err = m.check_extra_fields().unwrap_err();
        assert_eq!(err.fields, vec!["unknown".to_string()]);
        assert_eq!(
            err.to_string(),
            "Cannot set unknown fields: [unknown]"
        );
    }

    #[test]
    fn clean_value_passes() {
        let m = measurement(json!({"count": 2, "ratio": 3.3, "label": "val"}));
        assert!(m.check_extra_fields().is_ok());
    }

    #[test]
    fn child_failure_fails_the_parent() {
        let sample = Sample {
            measurement: measurement(json!({
                "count": 2, "ratio": 3.3, "label": "val", "unknown": 1
            })),
            run: 3,
            extra: ExtraFields::default(),
        };
        let err = sample.check_extra_fields().unwrap_err();
        assert_eq!(err.fields, vec!["unknown".to_string()]);
    }

    #[test]
    fn own_extras_reported_before_children() {
        let mut sample = Sample {
            measurement: measurement(json!({
                "count": 2, "ratio": 3.3, "label": "val", "deep": 1
            })),
            run: 3,
            extra: ExtraFields::default(),
        };
        sample.extra.insert("shallow", json!(true));
        let err = sample.check_extra_fields().unwrap_err();
        assert_eq!(err.fields, vec!["shallow".to_string()]);
    }

    #[test]
    fn list_items_are_walked() {
        let batch = Batch {
            measurements: vec![
                measurement(json!({"count": 2, "ratio": 3.3, "label": "a"})),
                measurement(json!({"count": 2, "ratio": 3.3, "label": "b", "unknown": 1})),
            ],
            ..Default::default()
        };
        assert!(batch.check_extra_fields().is_err());
    }

    #[test]
    fn map_values_are_walked() {
        let mut by_name = HashMap::new();
        by_name.insert(
            "a".to_string(),
            measurement(json!({"count": 2, "ratio": 2.2, "label": "hello", "oops": 4})),
        );
        let batch = Batch {
            by_name,
            ..Default::default()
        };
        assert!(batch.check_extra_fields().is_err());

        let mut by_name = HashMap::new();
        by_name.insert(
            "a".to_string(),
            measurement(json!({"count": 2, "ratio": 2.2, "label": "hello"})),
        );
        let batch = Batch {
            by_name,
            ..Default::default()
        };
        assert!(batch.check_extra_fields().is_ok());
    }

    #[test]
    fn optional_children_are_walked() {
        let batch = Batch {
            sample: Some(Sample {
                measurement: measurement(json!({
                    "count": 2, "ratio": 3.3, "label": "v", "unknown": "x"
                })),
                run: 2,
                extra: ExtraFields::default(),
            }),
            ..Default::default()
        };
        assert!(batch.check_extra_fields().is_err());

        let batch = Batch::default();
        assert!(batch.check_extra_fields().is_ok());
    }

    #[test]
    fn several_unknown_fields_all_named() {
        let m = measurement(json!({
            "count": 2, "ratio": 3.3, "label": "val", "zeta": 1, "alpha": 2
        }));
        let err = m.check_extra_fields().unwrap_err();
        assert_eq!(err.fields, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn extras_round_trip_through_serialization() {
        let m = measurement(json!({
            "count": 2, "ratio": 3.3, "label": "val", "unknown": "kept"
        }));
        let encoded = serde_json::to_value(&m).unwrap();
        assert_eq!(encoded.get("unknown"), Some(&json!("kept")));
    }
}
