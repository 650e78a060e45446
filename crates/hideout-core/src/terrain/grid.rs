//! Regular lat/lon elevation grid with bilinear sampling.

use crate::models::GeoPoint;
use crate::spatial;

use super::TerrainError;

const MIN_SPACING_M: f64 = 5.0;
const MAX_SPACING_M: f64 = 2000.0;

/// Geographic bounding box of a grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridBounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GridBounds {
    /// Square box covering `radius_m` around `center`.
    pub fn around(center: GeoPoint, radius_m: f64) -> Self {
        let pad_lat = spatial::meters_to_lat(radius_m, center.lat);
        let pad_lon = spatial::meters_to_lon(radius_m, center.lat);
        Self {
            min_lat: center.lat - pad_lat,
            max_lat: center.lat + pad_lat,
            min_lon: center.lon - pad_lon,
            max_lon: center.lon + pad_lon,
        }
    }

    fn mean_lat(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }
}

/// Row/column layout of a grid over some bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub bounds: GridBounds,
    pub rows: usize,
    pub cols: usize,
    pub lat_step_deg: f64,
    pub lon_step_deg: f64,
}

impl GridLayout {
    /// Pick the finest spacing (starting at `spacing_m`) that keeps the grid
    /// under `max_points`.
    pub fn resolve(bounds: GridBounds, spacing_m: f64, max_points: usize) -> Self {
        let meters_per_deg_lat = spatial::meters_per_deg_lat(bounds.mean_lat());
        let meters_per_deg_lon = spatial::meters_per_deg_lon(bounds.mean_lat()).max(1.0);
        let max_points = max_points.max(4);
        let mut spacing = spacing_m.max(MIN_SPACING_M);

        loop {
            let lat_step_deg = spacing / meters_per_deg_lat;
            let lon_step_deg = spacing / meters_per_deg_lon;
            let rows = ((bounds.max_lat - bounds.min_lat) / lat_step_deg).ceil().max(1.0) as usize + 1;
            let cols = ((bounds.max_lon - bounds.min_lon) / lon_step_deg).ceil().max(1.0) as usize + 1;
            let total = rows.saturating_mul(cols);
            if total <= max_points || spacing >= MAX_SPACING_M {
                return Self {
                    bounds,
                    rows,
                    cols,
                    lat_step_deg,
                    lon_step_deg,
                };
            }

            let scale = ((total as f64) / (max_points as f64)).sqrt().max(1.1);
            spacing = (spacing * scale).min(MAX_SPACING_M);
        }
    }

    pub fn len(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Grid node positions in row-major order.
    pub fn points(&self) -> Vec<GeoPoint> {
        let mut points = Vec::with_capacity(self.len());
        for row in 0..self.rows {
            let lat = self.bounds.min_lat + row as f64 * self.lat_step_deg;
            for col in 0..self.cols {
                let lon = self.bounds.min_lon + col as f64 * self.lon_step_deg;
                points.push(GeoPoint::new(lat, lon));
            }
        }
        points
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    layout: GridLayout,
    elevations_m: Vec<f64>,
}

impl ElevationGrid {
    /// Build a grid from provider samples in row-major order.
    pub fn from_samples(layout: GridLayout, elevations_m: Vec<f64>) -> Result<Self, TerrainError> {
        if elevations_m.len() != layout.len() {
            return Err(TerrainError::SampleCount {
                expected: layout.len(),
                actual: elevations_m.len(),
            });
        }
        let elevations_m = elevations_m
            .into_iter()
            .map(|value| if value.is_finite() { value } else { 0.0 })
            .collect();
        Ok(Self {
            layout,
            elevations_m,
        })
    }

    /// Build a grid by evaluating `elevation` at every node.
    pub fn from_fn(layout: GridLayout, elevation: impl Fn(GeoPoint) -> f64) -> Self {
        let elevations_m = layout.points().into_iter().map(elevation).collect();
        Self {
            layout,
            elevations_m,
        }
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    /// Bilinear sample; points outside the grid are clamped to its edge.
    pub fn sample(&self, lat: f64, lon: f64) -> f64 {
        if !lat.is_finite() || !lon.is_finite() || self.layout.is_empty() {
            return 0.0;
        }
        let GridLayout {
            bounds,
            rows,
            cols,
            lat_step_deg,
            lon_step_deg,
        } = self.layout;

        let clamped_lat = lat.clamp(bounds.min_lat, bounds.max_lat);
        let clamped_lon = lon.clamp(bounds.min_lon, bounds.max_lon);

        let y = ((clamped_lat - bounds.min_lat) / lat_step_deg.max(1e-9)).clamp(0.0, (rows - 1) as f64);
        let x = ((clamped_lon - bounds.min_lon) / lon_step_deg.max(1e-9)).clamp(0.0, (cols - 1) as f64);
        if !y.is_finite() || !x.is_finite() {
            return 0.0;
        }

        let y0 = y.floor() as usize;
        let x0 = x.floor() as usize;
        let y1 = (y0 + 1).min(rows - 1);
        let x1 = (x0 + 1).min(cols - 1);
        let dy = y - y0 as f64;
        let dx = x - x0 as f64;

        let v00 = self.value_at(y0, x0);
        let v10 = self.value_at(y0, x1);
        let v01 = self.value_at(y1, x0);
        let v11 = self.value_at(y1, x1);

        let v0 = v00 + (v10 - v00) * dx;
        let v1 = v01 + (v11 - v01) * dx;
        v0 + (v1 - v0) * dy
    }

    pub fn sample_point(&self, point: GeoPoint) -> f64 {
        self.sample(point.lat, point.lon)
    }

    fn value_at(&self, row: usize, col: usize) -> f64 {
        let idx = row.saturating_mul(self.layout.cols) + col.min(self.layout.cols - 1);
        self.elevations_m.get(idx).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> GridLayout {
        GridLayout::resolve(GridBounds::around(GeoPoint::new(51.0, 5.0), 1000.0), 250.0, 4096)
    }

    #[test]
    fn test_layout_respects_point_budget() {
        let bounds = GridBounds::around(GeoPoint::new(51.0, 5.0), 4500.0);
        let fine = GridLayout::resolve(bounds, 50.0, 400);
        assert!(fine.len() <= 400, "got {} points", fine.len());
        assert!(fine.rows >= 2 && fine.cols >= 2);
    }

    #[test]
    fn test_points_are_row_major() {
        let layout = layout();
        let points = layout.points();
        assert_eq!(points.len(), layout.len());
        assert_eq!(points[0].lat, layout.bounds.min_lat);
        assert_eq!(points[1].lat, layout.bounds.min_lat);
        assert!(points[1].lon > points[0].lon);
    }

    #[test]
    fn test_bilinear_reproduces_plane() {
        let layout = layout();
        let grid = ElevationGrid::from_fn(layout, |p| 100.0 + (p.lat - 51.0) * 1000.0);
        let sampled = grid.sample(51.003, 5.001);
        assert!((sampled - 103.0).abs() < 1e-6, "got {sampled}");
    }

    #[test]
    fn test_sample_clamps_outside_bounds() {
        let grid = ElevationGrid::from_fn(layout(), |_| 42.0);
        assert_eq!(grid.sample(60.0, 20.0), 42.0);
        assert_eq!(grid.sample(f64::NAN, 5.0), 0.0);
    }

    #[test]
    fn test_from_samples_checks_count() {
        let layout = layout();
        let err = ElevationGrid::from_samples(layout, vec![1.0; 3]).unwrap_err();
        assert!(matches!(err, TerrainError::SampleCount { actual: 3, .. }));
        let ok = ElevationGrid::from_samples(layout, vec![f64::NAN; layout.len()]).unwrap();
        assert_eq!(ok.sample(51.0, 5.0), 0.0);
    }
}
