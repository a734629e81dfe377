//! Length and slope estimated from an elevation raster and catchment polygons.
//!
//! The high point is the highest of an 11 x 11 grid of samples over the
//! polygon's bounding box (only samples strictly inside the polygon count). The outlet
//! is the supplied point, or else the lowest sampled boundary vertex. Length is
//! the straight line between the two, so this is a coarse approximation of the
//! longest flow path, not a traced one.

use crate::adjustment::LandType;
use crate::catchment::{CatchmentInput, CatchmentRecord};
use crate::config::TcConfig;
use crate::error::{Result, TcError};
use crate::raster::{ElevationSource, LinearUnit, Point, Polygon, diagonal, is_degenerate, ring_vertices};
use geo::{BoundingRect, Centroid, Contains, EuclideanDistance};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::debug;

/// Slope used when the raster cannot be sampled, in percent.
pub const FALLBACK_SLOPE_PCT: f64 = 0.2;

const GRID_DIVISIONS: usize = 10;
const PROFILE_SAMPLES: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct PolygonFeature {
    pub geometry: Polygon,
    pub attributes: HashMap<String, String>,
    pub outlet: Option<Point>,
}

impl PolygonFeature {
    pub fn new(geometry: Polygon) -> Self {
        PolygonFeature {
            geometry,
            attributes: HashMap::new(),
            outlet: None,
        }
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    // Attribute lookup ignores case, like the CSV header matching
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Which polygon attributes carry the id, CN and land type.
#[derive(Debug, Clone, PartialEq)]
pub struct DemFieldMapping {
    pub id_field: String,
    pub cn_field: Option<String>,
    pub land_type_field: Option<String>,
}

impl DemFieldMapping {
    pub fn new(id_field: &str) -> Self {
        DemFieldMapping {
            id_field: id_field.to_string(),
            cn_field: None,
            land_type_field: None,
        }
    }
}

#[derive(Debug)]
pub struct DemInput {
    pub raster: Option<Box<dyn ElevationSource>>,
    pub features: Vec<PolygonFeature>,
    pub fields: DemFieldMapping,
    pub units: LinearUnit,
}

impl DemInput {
    pub fn new(raster: Box<dyn ElevationSource>, fields: DemFieldMapping, units: LinearUnit) -> Self {
        DemInput {
            raster: Some(raster),
            features: Vec::new(),
            fields,
            units,
        }
    }
}

/// Why the raster could not give a length and slope for one polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingFailure {
    DegenerateGeometry,
    NoHighPoint,
    NoOutletElevation,
    ZeroLength,
}

impl fmt::Display for SamplingFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SamplingFailure::DegenerateGeometry => f.write_str("malformed polygon geometry"),
            SamplingFailure::NoHighPoint => f.write_str("no valid elevation inside the polygon"),
            SamplingFailure::NoOutletElevation => f.write_str("no valid elevation at the outlet"),
            SamplingFailure::ZeroLength => f.write_str("high point and outlet coincide"),
        }
    }
}

/// Raw result of sampling one polygon. Lengths and elevations in feet.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowpathSample {
    pub high_point: Point,
    pub outlet: Point,
    pub high_elevation_ft: f64,
    pub low_elevation_ft: f64,
    pub length_ft: f64,
    pub slope_ftft: f64,
    /// Number of uphill steps seen walking the straight line to the outlet.
    pub adverse_steps: usize,
}

pub fn extract_flowpath(
    raster: &dyn ElevationSource,
    feature: &PolygonFeature,
    units: LinearUnit,
) -> std::result::Result<FlowpathSample, SamplingFailure> {
    let polygon = &feature.geometry;
    if is_degenerate(polygon) {
        return Err(SamplingFailure::DegenerateGeometry);
    }
    let bbox = polygon.bounding_rect().ok_or(SamplingFailure::DegenerateGeometry)?;
    let centroid = polygon.centroid().ok_or(SamplingFailure::DegenerateGeometry)?;

    let x_step = bbox.width() / GRID_DIVISIONS as f64;
    let y_step = bbox.height() / GRID_DIVISIONS as f64;
    let mut high: Option<(Point, f64)> = None;
    for i in 0..=GRID_DIVISIONS {
        for j in 0..=GRID_DIVISIONS {
            let pt = Point::new(bbox.min().x + i as f64 * x_step, bbox.min().y + j as f64 * y_step);
            if !polygon.contains(&pt) {
                continue;
            }
            if let Some(z) = raster.sample(&pt) {
                if high.is_none_or(|(_, best)| z > best) {
                    high = Some((pt, z));
                }
            }
        }
    }
    let (high_point, high_z) = high.ok_or(SamplingFailure::NoHighPoint)?;

    let outlet = match feature.outlet {
        Some(pt) => pt,
        None => {
            let mut lowest: Option<(Point, f64)> = None;
            for v in ring_vertices(polygon).iter().map(|&c| Point::from(c)) {
                if let Some(z) = raster.sample(&v) {
                    if lowest.is_none_or(|(_, best)| z < best) {
                        lowest = Some((v, z));
                    }
                }
            }
            lowest.map(|(p, _)| p).unwrap_or(centroid)
        }
    };
    let low_z = raster.sample(&outlet).ok_or(SamplingFailure::NoOutletElevation)?;

    let length_ft = units.to_feet(high_point.euclidean_distance(&outlet));
    if !(length_ft > 0.0) {
        return Err(SamplingFailure::ZeroLength);
    }
    let high_elevation_ft = units.to_feet(high_z);
    let low_elevation_ft = units.to_feet(low_z);

    Ok(FlowpathSample {
        high_point,
        outlet,
        high_elevation_ft,
        low_elevation_ft,
        length_ft,
        slope_ftft: (high_elevation_ft - low_elevation_ft) / length_ft,
        adverse_steps: count_adverse_steps(raster, &high_point, &outlet),
    })
}

// Walk the straight line from the high point to the outlet and count rises
fn count_adverse_steps(raster: &dyn ElevationSource, from: &Point, to: &Point) -> usize {
    let mut previous: Option<f64> = None;
    let mut adverse = 0;
    for k in 0..=PROFILE_SAMPLES {
        let t = k as f64 / PROFILE_SAMPLES as f64;
        let pt = Point::new(from.x() + t * (to.x() - from.x()), from.y() + t * (to.y() - from.y()));
        if let Some(z) = raster.sample(&pt) {
            if previous.is_some_and(|p| z > p) {
                adverse += 1;
            }
            previous = Some(z);
        }
    }
    adverse
}

fn check_features(input: &DemInput) -> Result<Vec<String>> {
    if input.features.is_empty() {
        return Err(TcError::EmptyInput("catchment polygon layer".to_string()));
    }
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(input.features.len());
    for feature in &input.features {
        let id = feature
            .attribute(&input.fields.id_field)
            .ok_or_else(|| TcError::MissingField {
                field: input.fields.id_field.clone(),
                input_name: "catchment polygon layer".to_string(),
            })?;
        if !seen.insert(id.to_string()) {
            return Err(TcError::DuplicateId(id.to_string()));
        }
        ids.push(id.to_string());
    }
    Ok(ids)
}

/// One record per polygon. Sampling failures fall back to the bounding-box
/// diagonal and a 0.2% slope instead of failing the run.
pub fn normalize(input: &DemInput, config: &TcConfig) -> Result<Vec<CatchmentInput>> {
    let raster = match input.raster.as_deref() {
        Some(r) if !r.is_empty() => r,
        Some(_) => return Err(TcError::InvalidRaster("raster has no cells".to_string())),
        None => return Err(TcError::InvalidRaster("no elevation raster supplied".to_string())),
    };
    let ids = check_features(input)?;

    let mut inputs = Vec::with_capacity(ids.len());
    for (id, feature) in ids.into_iter().zip(&input.features) {
        let mut warnings = Vec::new();
        let mut adjusted = false;

        let curve_number = match &input.fields.cn_field {
            Some(field) => match feature.attribute(field).map(str::parse::<f64>) {
                Some(Ok(cn)) => cn,
                Some(Err(_)) | None => {
                    warnings.push(format!(
                        "CN missing or unreadable in '{}', using {}",
                        field, config.default_cn
                    ));
                    config.default_cn
                }
            },
            None => config.default_cn,
        };
        let land_type = input
            .fields
            .land_type_field
            .as_ref()
            .and_then(|field| feature.attribute(field))
            .map(LandType::from_tag)
            .unwrap_or(config.default_land_type);

        let (length_ft, slope_pct, high, low) =
            match extract_flowpath(raster, feature, input.units) {
                Ok(sample) => {
                    debug!(
                        "{}: high {:.2} ft, outlet {:.2} ft, L={:.1} ft, S={:.5}",
                        id, sample.high_elevation_ft, sample.low_elevation_ft, sample.length_ft, sample.slope_ftft
                    );
                    if sample.adverse_steps > 0 {
                        warnings.push(format!(
                            "{} adverse sections along the sampled profile",
                            sample.adverse_steps
                        ));
                    }
                    let mut slope_ftft = sample.slope_ftft;
                    if config.apply_slope_adjustment {
                        let adj = config.policy.adjust_slope(slope_ftft);
                        slope_ftft = adj.slope_ftft;
                        adjusted |= adj.was_adjusted;
                        warnings.extend(adj.warning);
                    }
                    (
                        sample.length_ft,
                        slope_ftft * 100.0,
                        Some(sample.high_elevation_ft),
                        Some(sample.low_elevation_ft),
                    )
                }
                Err(failure) => {
                    let diagonal = feature
                        .geometry
                        .bounding_rect()
                        .map(|b| input.units.to_feet(diagonal(&b)))
                        .unwrap_or(0.0);
                    warnings.push(format!(
                        "DEM sampling failed ({}), fallback used: length = bounding-box diagonal {:.1} ft, slope = {}%",
                        failure, diagonal, FALLBACK_SLOPE_PCT
                    ));
                    adjusted = true;
                    (diagonal, FALLBACK_SLOPE_PCT, None, None)
                }
            };

        let record = CatchmentRecord {
            id,
            total_length_ft: length_ft,
            avg_slope_pct: slope_pct,
            curve_number,
            runoff_coefficient: config.default_c,
            mannings_n_avg: config.default_n,
            land_type,
            segments: None,
            high_elevation_ft: high,
            low_elevation_ft: low,
            // the fallback slope is already conservative
            slope_policy_applied: config.apply_slope_adjustment || high.is_none(),
        };
        inputs.push(CatchmentInput {
            record,
            segment_tc: None,
            warnings,
            adjusted,
        });
    }

    Ok(inputs)
}
