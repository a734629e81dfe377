use crate::adjustment::{AdjustmentPolicy, LandType};
use crate::error::Result;
use crate::hydraulics::ChannelGeometry;
use crate::methods::{DEFAULT_C, DEFAULT_CN, DEFAULT_OVERLAND_N, TcMethod};
use serde::{Deserialize, Serialize};
use std::path::Path;

// Run options shared by every acquisition mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TcConfig {
    pub p2_rainfall_in: f64,
    pub apply_slope_adjustment: bool,
    pub apply_tc_minimum: bool,
    pub selected_methods: Vec<TcMethod>,
    pub default_cn: f64,
    pub default_c: f64,
    pub default_n: f64,
    pub default_land_type: LandType,
    pub default_hydraulic_radius_ft: f64,
    pub default_pipe_diameter_ft: f64,
    pub channel_geometry: Option<ChannelGeometry>,
    pub estimate_velocity_tc: bool,
    pub policy: AdjustmentPolicy,
}

impl Default for TcConfig {
    fn default() -> Self {
        TcConfig {
            p2_rainfall_in: 3.5,
            apply_slope_adjustment: true,
            apply_tc_minimum: true,
            selected_methods: TcMethod::ALL.to_vec(),
            default_cn: DEFAULT_CN,
            default_c: DEFAULT_C,
            default_n: DEFAULT_OVERLAND_N,
            default_land_type: LandType::General,
            default_hydraulic_radius_ft: 1.0,
            default_pipe_diameter_ft: 1.5,
            channel_geometry: None,
            estimate_velocity_tc: false,
            policy: AdjustmentPolicy::default(),
        }
    }
}

impl TcConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Selected methods, deduplicated, in canonical column order.
    pub fn methods(&self) -> Vec<TcMethod> {
        let mut methods = self.selected_methods.clone();
        methods.sort();
        methods.dedup();
        methods
    }
}

// Accepted header names per input column, matched case-insensitively
#[derive(Debug, Clone)]
pub struct ColumnConfig {
    pub catchment_id: Vec<String>,
    pub length: Vec<String>,
    pub slope: Vec<String>,
    pub mannings_n: Vec<String>,
    pub flow_type: Vec<String>,
    pub surface: Vec<String>,
    pub cn: Vec<String>,
    pub c_value: Vec<String>,
    pub land_type: Vec<String>,
    pub channel_depth: Vec<String>,
    pub channel_width: Vec<String>,
    pub side_slope: Vec<String>,
    pub pipe_diameter: Vec<String>,
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

impl ColumnConfig {
    pub fn new() -> Self {
        ColumnConfig {
            catchment_id: names(&[
                "subbasin_id",
                "catchment_id",
                "subbasinid",
                "sb_id",
                "sbid",
                "id",
            ]),
            length: names(&["length_ft", "length", "len"]),
            slope: names(&["slope_pct", "slope_percent", "slope"]),
            mannings_n: names(&["mannings_n", "manning_n", "n"]),
            flow_type: names(&["flow_type", "flowtype", "type"]),
            surface: names(&["surface", "surface_type"]),
            cn: names(&["cn", "curve_number"]),
            c_value: names(&["c_value", "c", "runoff_coefficient"]),
            land_type: names(&["land_type", "landtype", "land_use"]),
            channel_depth: names(&["channel_depth", "depth_ft"]),
            channel_width: names(&["channel_width", "bottom_width_ft"]),
            side_slope: names(&["side_slope", "side_slope_h_per_v"]),
            pipe_diameter: names(&["pipe_diameter", "pipe_diameter_ft"]),
        }
    }
}

impl Default for ColumnConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = TcConfig::default();
        assert_eq!(config.p2_rainfall_in, 3.5);
        assert!(config.apply_slope_adjustment);
        assert!(config.apply_tc_minimum);
        assert_eq!(config.methods(), TcMethod::ALL.to_vec());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = TcConfig::from_toml_str(
            r#"
            p2_rainfall_in = 4.2
            selected_methods = ["scs_lag", "kirpich", "kirpich"]
            default_land_type = "rural"

            [policy]
            min_tc_rural = 15.0

            [channel_geometry]
            depth_ft = 2.0
            bottom_width_ft = 4.0
            side_slope_h_per_v = 3.0
            pipe_diameter_ft = 1.5
            "#,
        )
        .unwrap();
        assert_eq!(config.p2_rainfall_in, 4.2);
        assert_eq!(config.methods(), vec![TcMethod::Kirpich, TcMethod::ScsLag]);
        assert_eq!(config.default_land_type, LandType::Rural);
        assert_eq!(config.policy.min_tc_rural, 15.0);
        assert_eq!(config.policy.min_tc_paved, 5.0);
        assert!(config.channel_geometry.is_some());
        assert!(config.apply_tc_minimum);
    }

    #[test]
    fn unknown_method_is_a_config_error() {
        let err = TcConfig::from_toml_str(r#"selected_methods = ["rational"]"#).unwrap_err();
        assert!(err.to_string().starts_with("config error"));
    }
}
