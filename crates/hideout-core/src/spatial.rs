//! Spherical geodesy used by candidate generation, boundary checks and terrain lookups.
//!
//! All distances are great-circle meters on a sphere of radius [`EARTH_RADIUS_M`].
//! Local projections (ENU) are only used where a planar approximation is
//! needed, e.g. projecting a point onto a short segment.

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Calculate distance between two points in meters using the Haversine formula.
///
/// # Arguments
/// * `lat1`, `lon1` - First point coordinates in decimal degrees
/// * `lat2`, `lon2` - Second point coordinates in decimal degrees
///
/// # Returns
/// Distance in meters
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();
    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Initial bearing from point 1 to point 2 in radians (0 = north, π/2 = east).
pub fn bearing(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let x = delta_lambda.sin() * phi2.cos();
    let y = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * delta_lambda.cos();

    x.atan2(y)
}

/// Initial bearing from point 1 to point 2, normalized to degrees in `[0, 360)`.
pub fn initial_bearing_deg(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    normalize_bearing_deg(bearing(lat1, lon1, lat2, lon2).to_degrees())
}

/// Wrap any angle in degrees into `[0, 360)`.
pub fn normalize_bearing_deg(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round tiny negatives up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Smallest absolute difference between two bearings, in `[0, 180]`.
pub fn angular_difference_deg(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs().rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Offset a position by distance and bearing (spherical destination point).
///
/// # Arguments
/// * `lat`, `lon` - Starting position in degrees
/// * `distance_m` - Distance in meters
/// * `bearing_rad` - Bearing in radians (0 = north, π/2 = east)
///
/// # Returns
/// (new_lat, new_lon) in degrees
pub fn offset_by_bearing(lat: f64, lon: f64, distance_m: f64, bearing_rad: f64) -> (f64, f64) {
    if distance_m.abs() <= f64::EPSILON {
        return (lat, lon);
    }

    let lat1 = lat.to_radians();
    let lon1 = lon.to_radians();
    let angular_distance = distance_m / EARTH_RADIUS_M;

    let sin_lat1 = lat1.sin();
    let cos_lat1 = lat1.cos();
    let sin_ad = angular_distance.sin();
    let cos_ad = angular_distance.cos();

    let sin_lat2 = sin_lat1 * cos_ad + cos_lat1 * sin_ad * bearing_rad.cos();
    let lat2 = sin_lat2.clamp(-1.0, 1.0).asin();

    let y = bearing_rad.sin() * sin_ad * cos_lat1;
    let x = cos_ad - sin_lat1 * sin_lat2;
    let mut lon2 = lon1 + y.atan2(x);
    lon2 =
        (lon2 + std::f64::consts::PI).rem_euclid(2.0 * std::f64::consts::PI) - std::f64::consts::PI;

    (lat2.to_degrees(), lon2.to_degrees())
}

/// Destination point reached by travelling `distance_m` along `bearing_deg`.
pub fn destination_point(lat: f64, lon: f64, distance_m: f64, bearing_deg: f64) -> (f64, f64) {
    offset_by_bearing(lat, lon, distance_m, bearing_deg.to_radians())
}

// ==== ENU (East-North-Up) Coordinate Conversion ====

/// Meters per degree of latitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lat(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_132.954 - 559.822 * (2.0 * lat_rad).cos() + 1.175 * (4.0 * lat_rad).cos()
        - 0.0023 * (6.0 * lat_rad).cos()
}

/// Meters per degree of longitude at a given latitude (WGS84 approximation).
pub fn meters_per_deg_lon(lat_deg: f64) -> f64 {
    let lat_rad = lat_deg.to_radians();
    111_412.84 * lat_rad.cos() - 93.5 * (3.0 * lat_rad).cos() + 0.118 * (5.0 * lat_rad).cos()
}

/// Convert a north/south offset in meters to degrees latitude.
pub fn meters_to_lat(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lat(ref_lat_deg).max(1e-9)
}

/// Convert an east/west offset in meters to degrees longitude.
pub fn meters_to_lon(meters: f64, ref_lat_deg: f64) -> f64 {
    meters / meters_per_deg_lon(ref_lat_deg).max(1e-9)
}

/// Project a point into local east/north meters around a reference origin.
pub fn to_local_xy(lat: f64, lon: f64, ref_lat: f64, ref_lon: f64) -> (f64, f64) {
    (
        (lon - ref_lon) * meters_per_deg_lon(ref_lat),
        (lat - ref_lat) * meters_per_deg_lat(ref_lat),
    )
}

/// Closest point on the segment A-B to P, in degrees.
///
/// The projection parameter is computed in a local ENU frame anchored at A
/// and clamped to `[0, 1]`, so the result always lies on the segment.
pub fn closest_point_on_segment(
    point_lat: f64,
    point_lon: f64,
    seg_start_lat: f64,
    seg_start_lon: f64,
    seg_end_lat: f64,
    seg_end_lon: f64,
) -> (f64, f64) {
    let (px, py) = to_local_xy(point_lat, point_lon, seg_start_lat, seg_start_lon);
    let (sx, sy) = to_local_xy(seg_end_lat, seg_end_lon, seg_start_lat, seg_start_lon);

    let seg_len_sq = sx * sx + sy * sy;
    if seg_len_sq < 0.0001 {
        return (seg_start_lat, seg_start_lon);
    }

    let t = ((px * sx + py * sy) / seg_len_sq).clamp(0.0, 1.0);
    (
        seg_start_lat + t * (seg_end_lat - seg_start_lat),
        seg_start_lon + t * (seg_end_lon - seg_start_lon),
    )
}

/// Great-circle distance in meters from a point to the closest point of a segment.
pub fn distance_to_segment_m(
    point_lat: f64,
    point_lon: f64,
    seg_start_lat: f64,
    seg_start_lon: f64,
    seg_end_lat: f64,
    seg_end_lon: f64,
) -> f64 {
    let (closest_lat, closest_lon) = closest_point_on_segment(
        point_lat,
        point_lon,
        seg_start_lat,
        seg_start_lon,
        seg_end_lat,
        seg_end_lon,
    );
    haversine_distance(point_lat, point_lon, closest_lat, closest_lon)
}

/// Whether two planar segments touch or cross (coordinates in local meters).
pub fn segments_intersect_2d(
    a1: (f64, f64),
    a2: (f64, f64),
    b1: (f64, f64),
    b2: (f64, f64),
) -> bool {
    // Tolerance in projected meters
    const EPS_M: f64 = 1e-6;

    fn orient(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> f64 {
        (q.0 - p.0) * (r.1 - p.1) - (q.1 - p.1) * (r.0 - p.0)
    }

    fn within(a: f64, b: f64, value: f64) -> bool {
        value >= a.min(b) - EPS_M && value <= a.max(b) + EPS_M
    }

    fn on_segment(p: (f64, f64), q: (f64, f64), r: (f64, f64)) -> bool {
        within(p.0, q.0, r.0) && within(p.1, q.1, r.1)
    }

    let o1 = orient(a1, a2, b1);
    let o2 = orient(a1, a2, b2);
    let o3 = orient(b1, b2, a1);
    let o4 = orient(b1, b2, a2);

    if (o1.abs() <= EPS_M && on_segment(a1, a2, b1))
        || (o2.abs() <= EPS_M && on_segment(a1, a2, b2))
        || (o3.abs() <= EPS_M && on_segment(b1, b2, a1))
        || (o4.abs() <= EPS_M && on_segment(b1, b2, a2))
    {
        return true;
    }

    let a_crosses = (o1 > EPS_M && o2 < -EPS_M) || (o1 < -EPS_M && o2 > EPS_M);
    let b_crosses = (o3 > EPS_M && o4 < -EPS_M) || (o3 < -EPS_M && o4 > EPS_M);
    a_crosses && b_crosses
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_haversine_known_distance() {
        // ~111km between these points (1 degree latitude)
        let dist = haversine_distance(0.0, 0.0, 1.0, 0.0);
        assert!((dist - 111_194.0).abs() < 100.0);
    }

    #[test]
    fn test_haversine_same_point() {
        let dist = haversine_distance(51.6564, 5.7083, 51.6564, 5.7083);
        assert!(dist < 0.001);
    }

    #[test]
    fn test_haversine_is_symmetric() {
        let a = haversine_distance(51.6564, 5.7083, 52.3105, 4.7683);
        let b = haversine_distance(52.3105, 4.7683, 51.6564, 5.7083);
        assert!((a - b).abs() < 1e-6);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let north = initial_bearing_deg(51.0, 5.0, 51.1, 5.0);
        let east = initial_bearing_deg(51.0, 5.0, 51.0, 5.1);
        let south = initial_bearing_deg(51.0, 5.0, 50.9, 5.0);
        let west = initial_bearing_deg(51.0, 5.0, 51.0, 4.9);
        assert!(north.abs() < 0.01);
        assert!((east - 90.0).abs() < 0.1);
        assert!((south - 180.0).abs() < 0.01);
        assert!((west - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_destination_point_round_trip() {
        for bearing_deg in [0.0, 45.0, 135.0, 200.0, 315.0] {
            let (lat, lon) = destination_point(51.6564, 5.7083, 2000.0, bearing_deg);
            let dist = haversine_distance(51.6564, 5.7083, lat, lon);
            let back = initial_bearing_deg(51.6564, 5.7083, lat, lon);
            assert!((dist - 2000.0).abs() < 0.01, "distance drifted: {dist}");
            assert!(angular_difference_deg(back, bearing_deg) < 0.01);
        }
    }

    #[test]
    fn test_angular_difference_wraps() {
        assert!((angular_difference_deg(350.0, 10.0) - 20.0).abs() < 1e-9);
        assert!((angular_difference_deg(0.0, 180.0) - 180.0).abs() < 1e-9);
        assert!((angular_difference_deg(90.0, 90.0)).abs() < 1e-9);
        assert!((angular_difference_deg(-30.0, 30.0) - 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_normalize_bearing() {
        assert_eq!(normalize_bearing_deg(360.0), 0.0);
        assert!((normalize_bearing_deg(-90.0) - 270.0).abs() < 1e-9);
        assert!(normalize_bearing_deg(-1e-15) < 360.0);
    }

    #[test]
    fn test_distance_to_segment_perpendicular_and_clamped() {
        let lat = 51.0;
        let lon = 5.0;
        let end_lon = lon + meters_to_lon(1000.0, lat);
        let mid_north = lat + meters_to_lat(100.0, lat);
        let mid_lon = lon + meters_to_lon(500.0, lat);

        let perpendicular = distance_to_segment_m(mid_north, mid_lon, lat, lon, lat, end_lon);
        assert!((perpendicular - 100.0).abs() < 1.0, "got {perpendicular}");

        let beyond_lon = lon + meters_to_lon(1300.0, lat);
        let clamped = distance_to_segment_m(lat, beyond_lon, lat, lon, lat, end_lon);
        assert!((clamped - 300.0).abs() < 1.0, "got {clamped}");
    }

    #[test]
    fn segments_intersect_detects_crossing_and_disjoint() {
        assert!(segments_intersect_2d(
            (0.0, 0.0),
            (10.0, 10.0),
            (0.0, 10.0),
            (10.0, 0.0)
        ));
        assert!(!segments_intersect_2d(
            (0.0, 0.0),
            (10.0, 0.0),
            (0.0, 5.0),
            (10.0, 5.0)
        ));
    }
}
