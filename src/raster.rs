//! Geometry helpers and elevation sampling used by DEM extraction.

use crate::error::{Result, TcError};
use geo::{Coord, Rect};
use std::fmt;

pub use geo::{LineString, Point, Polygon};

pub const FEET_PER_METER: f64 = 3.28084;

/// Horizontal/vertical unit of the source coordinate system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinearUnit {
    #[default]
    Feet,
    Meters,
}

impl LinearUnit {
    pub fn to_feet(&self, value: f64) -> f64 {
        match self {
            LinearUnit::Feet => value,
            LinearUnit::Meters => value * FEET_PER_METER,
        }
    }
}

/// Single-ring polygon from `(x, y)` pairs. The ring may be open or closed.
pub fn ring_polygon(points: &[(f64, f64)]) -> Polygon {
    Polygon::new(LineString::from(points.to_vec()), vec![])
}

// Exterior ring without the closing duplicate
pub fn ring_vertices(polygon: &Polygon) -> &[Coord] {
    let coords = &polygon.exterior().0;
    match (coords.first(), coords.last()) {
        (Some(first), Some(last)) if coords.len() > 1 && first == last => &coords[..coords.len() - 1],
        _ => coords,
    }
}

/// Fewer than three distinct vertices or any non-finite coordinate.
pub fn is_degenerate(polygon: &Polygon) -> bool {
    let finite = polygon
        .exterior()
        .coords()
        .all(|c| c.x.is_finite() && c.y.is_finite());
    !finite || ring_vertices(polygon).len() < 3
}

pub fn diagonal(rect: &Rect) -> f64 {
    rect.width().hypot(rect.height())
}

/// Anything that can report an elevation at a map coordinate.
pub trait ElevationSource: fmt::Debug {
    /// `None` outside the data extent or on no-data cells.
    fn sample(&self, point: &Point) -> Option<f64>;

    /// True when the source holds no cells at all.
    fn is_empty(&self) -> bool;
}

/// North-up elevation grid anchored at its lower-left corner.
#[derive(Debug, Clone)]
pub struct ElevationGrid {
    ncols: usize,
    nrows: usize,
    xll: f64,
    yll: f64,
    cell_size: f64,
    nodata: Option<f64>,
    // row-major, first row is the northern edge
    values: Vec<f64>,
}

impl ElevationGrid {
    pub fn new(
        ncols: usize,
        nrows: usize,
        xll: f64,
        yll: f64,
        cell_size: f64,
        nodata: Option<f64>,
        values: Vec<f64>,
    ) -> Result<Self> {
        if !(cell_size > 0.0) {
            return Err(TcError::InvalidRaster(format!(
                "cell size must be positive, got {}",
                cell_size
            )));
        }
        if values.len() != ncols * nrows {
            return Err(TcError::InvalidRaster(format!(
                "expected {} values for {}x{} grid, got {}",
                ncols * nrows,
                ncols,
                nrows,
                values.len()
            )));
        }
        Ok(ElevationGrid {
            ncols,
            nrows,
            xll,
            yll,
            cell_size,
            nodata,
            values,
        })
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.ncols, self.nrows)
    }
}

impl ElevationSource for ElevationGrid {
    fn sample(&self, point: &Point) -> Option<f64> {
        let col = ((point.x() - self.xll) / self.cell_size).floor();
        let row = ((self.yll + self.nrows as f64 * self.cell_size - point.y()) / self.cell_size).floor();
        if !col.is_finite() || !row.is_finite() || col < 0.0 || row < 0.0 {
            return None;
        }
        // the far edges belong to the last cell
        let col = (col as usize).min(self.ncols.checked_sub(1)?);
        let row = (row as usize).min(self.nrows.checked_sub(1)?);
        if point.x() > self.xll + self.ncols as f64 * self.cell_size || point.y() < self.yll {
            return None;
        }

        let value = self.values[row * self.ncols + col];
        if value.is_nan() || self.nodata.is_some_and(|nd| value == nd) {
            return None;
        }
        Some(value)
    }

    fn is_empty(&self) -> bool {
        self.ncols == 0 || self.nrows == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use geo::{BoundingRect, Centroid, Contains};

    fn square(size: f64) -> Polygon {
        ring_polygon(&[(0.0, 0.0), (size, 0.0), (size, size), (0.0, size), (0.0, 0.0)])
    }

    #[test]
    fn polygon_basics() {
        let poly = square(10.0);
        assert_eq!(ring_vertices(&poly).len(), 4);
        assert!(!is_degenerate(&poly));
        assert!(poly.contains(&Point::new(5.0, 5.0)));
        assert!(!poly.contains(&Point::new(15.0, 5.0)));
        let c = poly.centroid().unwrap();
        assert!((c.x() - 5.0).abs() < 1e-12 && (c.y() - 5.0).abs() < 1e-12);
        let bbox = poly.bounding_rect().unwrap();
        assert!((diagonal(&bbox) - 200f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn open_rings_are_closed() {
        let open = ring_polygon(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]);
        assert_eq!(open, square(10.0));
        assert_eq!(ring_vertices(&open).len(), 4);
    }

    #[test]
    fn degenerate_polygons() {
        assert!(is_degenerate(&ring_polygon(&[])));
        assert!(is_degenerate(&ring_polygon(&[(0.0, 0.0), (1.0, 1.0)])));
        assert!(is_degenerate(&ring_polygon(&[(0.0, 0.0), (f64::NAN, 1.0), (1.0, 0.0)])));
    }

    #[test]
    fn grid_sampling() {
        // 2x2 grid, 10 ft cells, lower-left at origin
        let grid = ElevationGrid::new(2, 2, 0.0, 0.0, 10.0, Some(-9999.0), vec![1.0, 2.0, 3.0, -9999.0])
            .unwrap();
        assert_eq!(grid.sample(&Point::new(5.0, 15.0)), Some(1.0));
        assert_eq!(grid.sample(&Point::new(15.0, 15.0)), Some(2.0));
        assert_eq!(grid.sample(&Point::new(5.0, 5.0)), Some(3.0));
        assert_eq!(grid.sample(&Point::new(15.0, 5.0)), None);
        assert_eq!(grid.sample(&Point::new(20.0, 20.0)), Some(2.0));
        assert_eq!(grid.sample(&Point::new(25.0, 5.0)), None);
        assert_eq!(grid.sample(&Point::new(5.0, -1.0)), None);
    }

    #[test]
    fn grid_validation() {
        assert!(ElevationGrid::new(2, 2, 0.0, 0.0, 0.0, None, vec![0.0; 4]).is_err());
        assert!(ElevationGrid::new(2, 2, 0.0, 0.0, 1.0, None, vec![0.0; 3]).is_err());
        let empty = ElevationGrid::new(0, 0, 0.0, 0.0, 1.0, None, vec![]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.sample(&Point::new(0.0, 0.0)), None);
    }

    #[test]
    fn unit_conversion() {
        assert_eq!(LinearUnit::Feet.to_feet(10.0), 10.0);
        assert!((LinearUnit::Meters.to_feet(10.0) - 32.8084).abs() < 1e-9);
    }
}
