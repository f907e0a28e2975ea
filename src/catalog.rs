//! Declarative chart specifications.
//!
//! A [`ChartSpec`] says which dataset columns feed one visualization panel and how that panel
//! is drawn. Specs are plain values: the builder receives the catalog as a parameter and never
//! holds one itself.

use serde::{Deserialize, Serialize};

use crate::error::EbasResult;

/// How a chart renders its matched columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Dense `(row, column, value)` grid.
    Heatmap,
    /// One series per matched column over the row index.
    Line,
}

/// Color-scale hint passed through to the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorScale {
    /// Dark-to-bright concentration scale.
    GrafanaStyle,
    /// Plain two-tone scale, used for quality flags.
    Standard,
}

/// One entry of the chart catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartSpec {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub kind: ChartKind,
    /// Regular expression searched (case-insensitively, anywhere in the name) in column names.
    pub columns_pattern: String,
    /// Columns also matching this expression are dropped.
    #[serde(default)]
    pub exclude_pattern: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub units: String,
    #[serde(default, rename = "colour_scale")]
    pub color_scale: Option<ColorScale>,
    #[serde(default)]
    pub show_controls: bool,
    #[serde(default)]
    pub default_min: Option<f64>,
    #[serde(default)]
    pub default_max: Option<f64>,
}

impl ChartSpec {
    /// Minimal spec: no exclusion, no description/units, no color hint, no controls.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: ChartKind,
        columns_pattern: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            columns_pattern: columns_pattern.into(),
            exclude_pattern: None,
            description: String::new(),
            units: String::new(),
            color_scale: None,
            show_controls: false,
            default_min: None,
            default_max: None,
        }
    }

    pub fn with_exclude(mut self, pattern: impl Into<String>) -> Self {
        self.exclude_pattern = Some(pattern.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>, units: impl Into<String>) -> Self {
        self.description = description.into();
        self.units = units.into();
        self
    }

    pub fn with_color_scale(mut self, scale: ColorScale) -> Self {
        self.color_scale = Some(scale);
        self
    }

    /// Show range controls, optionally with a fixed default range.
    pub fn with_controls(mut self, default_min: Option<f64>, default_max: Option<f64>) -> Self {
        self.show_controls = true;
        self.default_min = default_min;
        self.default_max = default_max;
        self
    }
}

/// Deserialize a catalog from a JSON array of specs.
pub fn catalog_from_json(json: &str) -> EbasResult<Vec<ChartSpec>> {
    Ok(serde_json::from_str(json)?)
}

/// Built-in catalog for particle size-distribution files, in display order.
pub fn default_catalog() -> Vec<ChartSpec> {
    use ChartKind::{Heatmap, Line};
    use ColorScale::{GrafanaStyle, Standard};

    const CONCENTRATION: &str = "particles/cm³";
    const FLAG: &str = "flag code";

    vec![
        ChartSpec::new("chart_bins", "Particle Distribution - Bins", Heatmap, r"^bin_\d+$")
            .with_exclude("flag_")
            .with_description("Particle concentration by bin size", CONCENTRATION)
            .with_color_scale(GrafanaStyle)
            .with_controls(Some(0.0), Some(5.0)),
        ChartSpec::new("chart_flag_bins", "Quality Flags - Bins", Heatmap, r"^flag_bin_\d+$")
            .with_description("Quality codes for bin measurements", FLAG)
            .with_color_scale(Standard)
            .with_controls(Some(0.0), Some(1.0)),
        ChartSpec::new("chart_bnloer", "Lower Percentiles (15.87%)", Heatmap, r"^bnloer\d+$")
            .with_exclude("flag_")
            .with_description("15.87th percentile of distribution by bin", CONCENTRATION)
            .with_color_scale(GrafanaStyle)
            .with_controls(Some(0.0), Some(5.0)),
        ChartSpec::new("chart_flag_bnloer", "Flags - Lower Percentiles", Heatmap, r"^flag_bnloer\d+$")
            .with_description("Quality codes for lower percentiles", FLAG)
            .with_color_scale(Standard)
            .with_controls(Some(0.0), Some(1.0)),
        ChartSpec::new("chart_bnhier", "Upper Percentiles (84.13%)", Heatmap, r"^bnhier\d+$")
            .with_exclude("flag_")
            .with_description("84.13th percentile of distribution by bin", CONCENTRATION)
            .with_color_scale(GrafanaStyle)
            .with_controls(Some(0.0), Some(5.0)),
        ChartSpec::new("chart_flag_bnhier", "Flags - Upper Percentiles", Heatmap, r"^flag_bnhier\d+$")
            .with_description("Quality codes for upper percentiles", FLAG)
            .with_color_scale(Standard)
            .with_controls(Some(0.0), Some(1.0)),
        ChartSpec::new("chart_rh", "Relative Humidity", Line, r".*RH.*")
            .with_exclude("flag_")
            .with_description("Relative humidity of inlet air", "%")
            .with_controls(Some(0.0), Some(60.0)),
        ChartSpec::new(
            "chart_met",
            "Meteorological Variables",
            Line,
            r"^(P_sys|T_sys|temperature|pressure)$",
        )
        .with_exclude("flag_")
        .with_description("System pressure and temperature", "Pa, K")
        .with_controls(None, None),
        ChartSpec::new(
            "chart_flags_met",
            "Flags - Meteorological Variables",
            Heatmap,
            r"^flag_(P_sys|T_sys|RH|temperature|pressure)",
        )
        .with_description("Quality codes for meteorological variables", FLAG)
        .with_color_scale(Standard)
        .with_controls(Some(0.0), Some(1.0)),
    ]
}
