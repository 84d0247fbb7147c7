use crate::model::GeoRecord;

/// Mean Earth radius in miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.87433;

const KM_PER_MILE: f64 = 1.609344;

/// Linear unit distances are reported in.
#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    Miles,
    #[value(name = "km")]
    Kilometers,
}

impl Unit {
    pub fn radius(&self) -> f64 {
        match self {
            Unit::Miles => EARTH_RADIUS_MILES,
            Unit::Kilometers => EARTH_RADIUS_MILES * KM_PER_MILE,
        }
    }

    /// Great-circle distance between two records. LOWER is closer.
    #[inline(always)]
    pub fn distance(&self, a: &GeoRecord, b: &GeoRecord) -> f64 {
        haversine(a.latitude, a.longitude, b.latitude, b.longitude, self.radius())
    }

    pub fn label(&self) -> &'static str {
        match self {
            Unit::Miles => "mi",
            Unit::Kilometers => "km",
        }
    }
}

/// Great-circle distance in miles.
pub fn distance(a: &GeoRecord, b: &GeoRecord) -> f64 {
    Unit::Miles.distance(a, b)
}

/// Haversine distance between two lat/lon pairs given in degrees.
#[inline(always)]
pub fn haversine(lat_a: f64, lon_a: f64, lat_b: f64, lon_b: f64, radius: f64) -> f64 {
    let (lat_a, lon_a) = (lat_a.to_radians(), lon_a.to_radians());
    let (lat_b, lon_b) = (lat_b.to_radians(), lon_b.to_radians());

    let s_lat = ((lat_b - lat_a) / 2.0).sin();
    let s_lon = ((lon_b - lon_a) / 2.0).sin();
    let h = s_lat * s_lat + lat_a.cos() * lat_b.cos() * s_lon * s_lon;

    // Rounding can push h a hair past 1 near antipodes.
    2.0 * radius * h.sqrt().clamp(-1.0, 1.0).asin()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Channel;
    use approx::assert_relative_eq;

    fn at(lat: f64, lon: f64) -> GeoRecord {
        GeoRecord::new(0, lat, lon, Channel::Unknown)
    }

    #[test]
    fn one_degree_along_equator() {
        let d = distance(&at(0.0, 0.0), &at(0.0, 1.0));
        assert_relative_eq!(d, EARTH_RADIUS_MILES * 1f64.to_radians(), max_relative = 1e-12);
    }

    #[test]
    fn coincident_points_are_zero() {
        assert_eq!(distance(&at(51.5, -0.12), &at(51.5, -0.12)), 0.0);
    }

    #[test]
    fn symmetric() {
        let a = at(40.7128, -74.0060);
        let b = at(34.0522, -118.2437);
        assert_relative_eq!(distance(&a, &b), distance(&b, &a), max_relative = 1e-9);
        // New York to Los Angeles is roughly 2445 miles.
        assert!((distance(&a, &b) - 2445.0).abs() < 5.0);
    }

    #[test]
    fn antipodes_stay_finite() {
        let d = distance(&at(0.0, 0.0), &at(0.0, 180.0));
        assert!(d.is_finite());
        assert_relative_eq!(d, EARTH_RADIUS_MILES * std::f64::consts::PI, max_relative = 1e-9);
    }

    #[test]
    fn kilometers_scale_radius() {
        let a = at(10.0, 10.0);
        let b = at(11.0, 12.0);
        let miles = Unit::Miles.distance(&a, &b);
        let km = Unit::Kilometers.distance(&a, &b);
        assert_relative_eq!(km, miles * KM_PER_MILE, max_relative = 1e-12);
    }
}
