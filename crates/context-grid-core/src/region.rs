//! Region name → grid center.
//!
//! Free-text geocoding lives outside the engine; callers plug in their own
//! [`RegionResolver`]. [`StaticRegionTable`] covers tests and the CLI.

use std::collections::BTreeMap;

use crate::coords::GeoPoint;
use crate::error::GridError;

pub trait RegionResolver {
    fn resolve(&self, name: &str) -> Result<GeoPoint, GridError>;
}

/// Case-insensitive fixed lookup table.
#[derive(Debug, Clone, Default)]
pub struct StaticRegionTable {
    entries: BTreeMap<String, GeoPoint>,
}

const BUILTIN_REGIONS: &[(&str, f64, f64)] = &[
    ("amsterdam", 52.3676, 4.9041),
    ("bangkok", 13.7563, 100.5018),
    ("cape town", -33.9249, 18.4241),
    ("dhaka", 23.8103, 90.4125),
    ("jakarta", -6.2088, 106.8456),
    ("lagos", 6.5244, 3.3792),
    ("london", 51.5074, -0.1278),
    ("miami", 25.7617, -80.1918),
    ("mumbai", 19.0760, 72.8777),
    ("nairobi", -1.2921, 36.8219),
    ("new york", 40.7128, -74.0060),
    ("rotterdam", 51.9244, 4.4777),
    ("sao paulo", -23.5505, -46.6333),
    ("tokyo", 35.6762, 139.6503),
];

fn key(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

impl StaticRegionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        BUILTIN_REGIONS
            .iter()
            .fold(Self::new(), |t, &(name, lat, lon)| t.with_region(name, GeoPoint::new(lat, lon)))
    }

    pub fn with_region(mut self, name: &str, center: GeoPoint) -> Self {
        self.entries.insert(key(name), center);
        self
    }

    /// Known names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

impl RegionResolver for StaticRegionTable {
    fn resolve(&self, name: &str) -> Result<GeoPoint, GridError> {
        self.entries
            .get(&key(name))
            .copied()
            .ok_or_else(|| GridError::UnknownRegion(name.trim().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_ignores_case_and_spacing() {
        let t = StaticRegionTable::builtin();
        let a = t.resolve("Cape Town").unwrap();
        let b = t.resolve("  cape   TOWN ").unwrap();
        assert_eq!(a, b);
        assert!((a.lat + 33.9249).abs() < 1e-9);
    }

    #[test]
    fn unknown_region_is_an_error() {
        let t = StaticRegionTable::builtin();
        assert_eq!(t.resolve(" Atlantis "), Err(GridError::UnknownRegion("Atlantis".into())));
    }

    #[test]
    fn custom_entries_extend_the_table() {
        let t = StaticRegionTable::new().with_region("Test Site", GeoPoint::new(1.0, 2.0));
        assert_eq!(t.resolve("test site").unwrap(), GeoPoint::new(1.0, 2.0));
        assert_eq!(t.names().collect::<Vec<_>>(), vec!["test site"]);
    }

    #[test]
    fn builtin_centers_are_valid() {
        let t = StaticRegionTable::builtin();
        for name in t.names() {
            assert!(t.resolve(name).unwrap().validate().is_ok(), "{name}");
        }
    }
}
