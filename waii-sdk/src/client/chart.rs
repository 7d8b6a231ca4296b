//! # Chart Generation
//!
//! Builds chart specifications from a result set, an ask, or both. The
//! service answers with a vendor specific spec (Superset, Metabase,
//! Plotly or Vega-Lite), discriminated on the wire by `spec_type`.
use crate::client::database::ColumnDefinition;
use crate::facade::AsyncFacade;
use crate::http::client::{ApiError, WaiiHttpClient};
use crate::model::{ExtraFields, SchemaError, StrictFields};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

const GENERATE_CHART_ENDPOINT: &str = "generate-chart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Metabase,
    Superset,
    Plotly,
    Vegalite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuperSetChartSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_axis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grid_style: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stacked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<i64>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetabaseChartSpec {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlotlyChartSpec {
    /// Python source for the plot, to be fed to plotly.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plot: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VegaliteChartSpec {
    /// The Vega-Lite chart definition as a JSON string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub number_of_data_points: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_message: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

/// One spec per supported charting stack, tagged by `spec_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "spec_type", rename_all = "lowercase")]
pub enum ChartSpec {
    Superset(SuperSetChartSpec),
    Metabase(MetabaseChartSpec),
    Plotly(PlotlyChartSpec),
    Vegalite(VegaliteChartSpec),
}

impl StrictFields for ChartSpec {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        match self {
            Self::Superset(spec) => spec.extra.check_empty(),
            Self::Metabase(spec) => spec.extra.check_empty(),
            Self::Plotly(spec) => spec.extra.check_empty(),
            Self::Vegalite(spec) => spec.extra.check_empty(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartTweak {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_spec: Option<ChartSpec>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ChartTweak {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.chart_spec.check_extra_fields()
    }
}

/// Chart generation input. Rows travel as plain JSON objects keyed by
/// column name, with column types described separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartGenerationRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ask: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataframe_rows: Option<Vec<HashMap<String, Value>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataframe_cols: Option<Vec<ColumnDefinition>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_type: Option<ChartType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_uuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweak_history: Option<Vec<ChartTweak>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub use_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<HashMap<String, Value>>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl Default for ChartGenerationRequest {
    fn default() -> Self {
        Self {
            sql: None,
            ask: None,
            dataframe_rows: None,
            dataframe_cols: None,
            chart_type: None,
            parent_uuid: None,
            tweak_history: None,
            model: None,
            use_cache: Some(true),
            tags: None,
            parameters: None,
            extra: ExtraFields::default(),
        }
    }
}

impl StrictFields for ChartGenerationRequest {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.dataframe_cols.check_extra_fields()?;
        self.tweak_history.check_extra_fields()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartGenerationResponse {
    pub uuid: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart_spec: Option<ChartSpec>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl StrictFields for ChartGenerationResponse {
    fn check_extra_fields(&self) -> Result<(), SchemaError> {
        self.extra.check_empty()?;
        self.chart_spec.check_extra_fields()
    }
}

/// Blocking chart operations.
#[derive(Debug, Clone)]
pub struct Chart {
    http: Arc<WaiiHttpClient>,
}

impl Chart {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self { http }
    }

    pub fn generate_chart(
        &self,
        params: &ChartGenerationRequest,
    ) -> Result<ChartGenerationResponse, ApiError> {
        self.http.common_fetch(GENERATE_CHART_ENDPOINT, params)
    }
}

/// [`Chart`] lifted onto the blocking worker pool.
#[derive(Debug, Clone)]
pub struct AsyncChart {
    inner: AsyncFacade<Chart>,
}

impl AsyncChart {
    pub fn new(http: Arc<WaiiHttpClient>) -> Self {
        Self {
            inner: AsyncFacade::new(Chart::new(http)),
        }
    }

    pub async fn generate_chart(
        &self,
        params: ChartGenerationRequest,
    ) -> Result<ChartGenerationResponse, ApiError> {
        self.inner.run(move |chart| chart.generate_chart(&params)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chart_spec_round_trips_through_its_tag() {
        let spec = ChartSpec::Vegalite(VegaliteChartSpec {
            chart: Some("{\"mark\": \"bar\"}".to_string()),
            number_of_data_points: Some(12),
            ..VegaliteChartSpec::default()
        });

        let value = serde_json::to_value(&spec).unwrap();
        assert_eq!(value["spec_type"], json!("vegalite"));
        assert_eq!(value["number_of_data_points"], json!(12));

        let decoded: ChartSpec = serde_json::from_value(value).unwrap();
        assert_eq!(decoded, spec);
    }

    #[test]
    fn superset_spec_decodes_from_wire_shape() {
        let decoded: ChartSpec = serde_json::from_value(json!({
            "spec_type": "superset",
            "plot_type": "bar",
            "metrics": ["revenue"],
            "dimensions": ["month"],
            "stacked": true
        }))
        .unwrap();

        match decoded {
            ChartSpec::Superset(spec) => {
                assert_eq!(spec.plot_type.as_deref(), Some("bar"));
                assert_eq!(spec.stacked, Some(true));
                assert!(spec.extra.is_empty());
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[test]
    fn unknown_spec_fields_are_captured_then_rejected() {
        let spec: ChartSpec = serde_json::from_value(json!({
            "spec_type": "plotly",
            "plot": "fig = px.bar(df)",
            "renderer": "svg"
        }))
        .unwrap();

        let err = spec.check_extra_fields().unwrap_err();
        assert_eq!(err.fields, vec!["renderer".to_string()]);

        let request = ChartGenerationRequest {
            tweak_history: Some(vec![ChartTweak {
                chart_spec: Some(spec),
                ..ChartTweak::default()
            }]),
            ..ChartGenerationRequest::default()
        };
        assert!(request.check_extra_fields().is_err());
    }
}
