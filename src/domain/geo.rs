use super::errors::DomainError;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Default maximum distance between store and delivery address.
pub const DEFAULT_MAX_DELIVERY_KM: f64 = 17.0;

/// Great-circle distance in kilometres (haversine, spherical Earth).
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

pub fn validate_coordinates(latitude: f64, longitude: f64) -> Result<(), DomainError> {
    if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
        return Err(DomainError::validation(
            "latitude",
            "The latitude must be between -90 and 90.",
        ));
    }
    if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
        return Err(DomainError::validation(
            "longitude",
            "The longitude must be between -180 and 180.",
        ));
    }
    Ok(())
}

/// Rejects deliveries farther than a fixed radius from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeliveryRange {
    max_km: f64,
}

impl DeliveryRange {
    pub fn new(max_km: f64) -> Self {
        Self { max_km }
    }

    pub fn max_km(&self) -> f64 {
        self.max_km
    }

    /// Returns the measured distance when the address is within range.
    pub fn check(&self, customer: (f64, f64), store: (f64, f64)) -> Result<f64, DomainError> {
        let distance = distance_km(customer.0, customer.1, store.0, store.1);
        if distance > self.max_km {
            return Err(DomainError::validation(
                "latitude",
                format!(
                    "Delivery is only available within {} km. Your distance is {:.2} km.",
                    self.max_km, distance
                ),
            ));
        }
        Ok(distance)
    }
}

impl Default for DeliveryRange {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DELIVERY_KM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_distance_for_same_point() {
        assert_eq!(distance_km(33.5, 36.3, 33.5, 36.3), 0.0);
    }

    #[test]
    fn one_degree_of_latitude_is_about_111_km() {
        let d = distance_km(0.0, 0.0, 1.0, 0.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = distance_km(33.51, 36.29, 33.40, 36.51);
        let b = distance_km(33.40, 36.51, 33.51, 36.29);
        assert!((a - b).abs() < 1e-9);
    }

    #[test]
    fn known_city_pair() {
        // Paris to London
        let d = distance_km(48.8566, 2.3522, 51.5074, -0.1278);
        assert!((d - 343.5).abs() < 1.0, "got {d}");
    }

    #[test]
    fn range_accepts_nearby_address() {
        // ~5 km north of the store
        let store = (33.5000, 36.3000);
        let customer = (33.5450, 36.3000);
        let d = DeliveryRange::default().check(customer, store).unwrap();
        assert!(d > 4.9 && d < 5.1, "got {d}");
    }

    #[test]
    fn range_rejects_far_address_with_formatted_message() {
        let store = (0.0, 0.0);
        // 20 km along the equator
        let lon = 20.0 / (EARTH_RADIUS_KM * std::f64::consts::PI / 180.0);
        let err = DeliveryRange::default().check((0.0, lon), store).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Delivery is only available within 17 km. Your distance is 20.00 km."
        );
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let lon = 17.0 / (EARTH_RADIUS_KM * std::f64::consts::PI / 180.0);
        let range = DeliveryRange::new(17.000_001);
        assert!(range.check((0.0, lon), (0.0, 0.0)).is_ok());
    }

    #[test]
    fn coordinates_out_of_range_are_rejected() {
        assert!(validate_coordinates(91.0, 0.0).is_err());
        assert!(validate_coordinates(0.0, -180.5).is_err());
        assert!(validate_coordinates(f64::NAN, 0.0).is_err());
        assert!(validate_coordinates(-90.0, 180.0).is_ok());
    }
}
