/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_009.0;

/// Kilometres to metres.
pub const KM2M: f64 = 1e3;

pub struct GeoHelper;

impl GeoHelper {
    /// Haversine distance in metres between `(lon1, lat1)` and `(lon2, lat2)`,
    /// all in degrees.
    pub fn great_circle(lon1: f64, lon2: f64, lat1: f64, lat2: f64) -> f64 {
        Self::great_circle_with_radius(lon1, lon2, lat1, lat2, EARTH_RADIUS_M)
    }

    pub fn great_circle_with_radius(lon1: f64, lon2: f64, lat1: f64, lat2: f64, radius: f64) -> f64 {
        let (lon1, lon2) = (lon1.to_radians(), lon2.to_radians());
        let (lat1, lat2) = (lat1.to_radians(), lat2.to_radians());
        let dlon = lon2 - lon1;
        let dlat = lat2 - lat1;
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * a.sqrt().min(1.0).asin() * radius
    }

    /// Area in km² of the spherical rectangle spanned by two longitudes and
    /// two latitudes (degrees).
    pub fn spherical_cell_area_km2(lon_w: f64, lon_e: f64, lat_s: f64, lat_n: f64) -> f64 {
        let r_km = EARTH_RADIUS_M / KM2M;
        let dlon = (lon_e - lon_w).abs().to_radians();
        let dsin = (lat_n.to_radians().sin() - lat_s.to_radians().sin()).abs();
        r_km * r_km * dlon * dsin
    }
}
