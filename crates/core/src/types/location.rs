//! Resolved customer location.

use serde::{Deserialize, Serialize};

use super::postal::PostalCode;
use super::region::RegionCode;

/// Where a [`Location`] came from.
///
/// Variants are listed from highest to lowest resolution precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    /// ZIP typed in by the shopper.
    UserInput,
    /// Default address on the logged-in customer's account.
    PlatformAccount,
    /// ZIP remembered from an earlier visit.
    Stored,
    /// IP-based geolocation.
    GeoLookup,
    /// Nothing known; the warehouse's own region.
    Default,
}

/// A resolved destination.
///
/// Immutable once built; re-resolution replaces it wholesale. The region is
/// always populated, the ZIP may be absent (e.g. for [`LocationSource::Default`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub zip: Option<PostalCode>,
    pub region: RegionCode,
    pub source: LocationSource,
}

impl Location {
    #[must_use]
    pub const fn new(zip: Option<PostalCode>, region: RegionCode, source: LocationSource) -> Self {
        Self { zip, region, source }
    }

    /// Location used when nothing better is known.
    #[must_use]
    pub const fn fallback(region: RegionCode) -> Self {
        Self::new(None, region, LocationSource::Default)
    }

    /// The ZIP as a string slice, if one is known.
    #[must_use]
    pub fn zip_str(&self) -> Option<&str> {
        self.zip.as_ref().map(PostalCode::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_shape() {
        let loc = Location::new(
            Some(PostalCode::parse("07105").unwrap()),
            RegionCode::parse("NJ").unwrap(),
            LocationSource::UserInput,
        );
        let json = serde_json::to_value(&loc).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"zip": "07105", "region": "NJ", "source": "user_input"})
        );
    }

    #[test]
    fn test_fallback_has_no_zip() {
        let loc = Location::fallback(RegionCode::from_static("NJ"));
        assert_eq!(loc.zip_str(), None);
        assert_eq!(loc.source, LocationSource::Default);
    }
}
