//! ZIP prefix to region lookup.
//!
//! The first three digits of a US ZIP identify a sectional center facility,
//! which is enough to pin down the state for zone purposes. The built-in table
//! carries three layers:
//!
//! - 3-digit prefixes for the dense metro areas that ship most often
//! - the complete 2-digit table (`00`–`99`)
//! - 1-digit fallbacks for truncated input
//!
//! Lookups try the longest prefix first, so a 3-digit entry always beats the
//! 2-digit entry it overlaps (`201` is VA even though `20` is DC).

use std::collections::HashMap;

use delivery_estimate_core::RegionCode;

/// Capability for turning an (untrusted) ZIP into a region.
///
/// Estimation code is constructed with an implementation instead of probing
/// for one at runtime, so an enhanced resolver (e.g. a full USPS table) can be
/// swapped in without touching the callers.
pub trait RegionResolver: Send + Sync {
    /// Resolve a ZIP to a region. Never fails; unknown input yields
    /// [`RegionResolver::default_region`].
    fn region_for_zip(&self, zip: Option<&str>) -> RegionCode;

    /// Region used when the ZIP is missing or unrecognised.
    fn default_region(&self) -> RegionCode;
}

/// Longest prefix considered during lookup.
const MAX_PREFIX_LEN: usize = 3;

const THREE_DIGIT_PREFIXES: &[(&str, &str)] = &[
    ("006", "PR"), ("007", "PR"), ("008", "PR"), ("009", "PR"),
    ("010", "MA"), ("011", "MA"), ("012", "MA"), ("013", "MA"), ("014", "MA"),
    ("070", "NJ"), ("071", "NJ"), ("072", "NJ"), ("073", "NJ"), ("074", "NJ"),
    ("075", "NJ"), ("076", "NJ"), ("077", "NJ"), ("078", "NJ"), ("079", "NJ"),
    ("080", "NJ"), ("081", "NJ"), ("082", "NJ"), ("083", "NJ"), ("084", "NJ"),
    ("085", "NJ"), ("086", "NJ"), ("087", "NJ"), ("088", "NJ"), ("089", "NJ"),
    ("100", "NY"), ("101", "NY"), ("102", "NY"), ("103", "NY"), ("104", "NY"),
    ("110", "NY"), ("111", "NY"), ("112", "NY"), ("113", "NY"), ("114", "NY"),
    ("115", "NY"), ("116", "NY"), ("117", "NY"), ("118", "NY"), ("119", "NY"),
    ("120", "NY"), ("121", "NY"), ("122", "NY"), ("123", "NY"), ("124", "NY"),
    ("150", "PA"), ("151", "PA"), ("152", "PA"), ("153", "PA"), ("154", "PA"),
    ("190", "PA"), ("191", "PA"), ("192", "PA"), ("193", "PA"), ("194", "PA"),
    ("200", "DC"), ("201", "VA"), ("202", "DC"), ("203", "DC"), ("204", "DC"),
    ("320", "FL"), ("321", "FL"), ("322", "FL"), ("323", "FL"), ("324", "FL"),
    ("325", "FL"), ("326", "FL"), ("327", "FL"), ("328", "FL"), ("329", "FL"),
    ("330", "FL"), ("331", "FL"), ("332", "FL"), ("333", "FL"), ("334", "FL"),
    ("600", "IL"), ("601", "IL"), ("602", "IL"), ("603", "IL"), ("604", "IL"),
    ("750", "TX"), ("751", "TX"), ("752", "TX"), ("753", "TX"), ("754", "TX"),
    ("760", "TX"), ("761", "TX"), ("762", "TX"), ("763", "TX"), ("764", "TX"),
    ("770", "TX"), ("772", "TX"), ("773", "TX"), ("774", "TX"), ("775", "TX"),
    ("780", "TX"), ("781", "TX"), ("782", "TX"), ("783", "TX"), ("784", "TX"),
    ("900", "CA"), ("901", "CA"), ("902", "CA"), ("903", "CA"), ("904", "CA"),
    ("905", "CA"), ("906", "CA"), ("907", "CA"), ("908", "CA"), ("910", "CA"),
    ("920", "CA"), ("921", "CA"), ("922", "CA"), ("923", "CA"), ("924", "CA"),
    ("945", "CA"), ("946", "CA"), ("947", "CA"), ("948", "CA"), ("949", "CA"),
    ("950", "CA"), ("951", "CA"), ("952", "CA"), ("953", "CA"), ("954", "CA"),
];

const TWO_DIGIT_PREFIXES: &[(&str, &str)] = &[
    ("00", "PR"), ("01", "MA"), ("02", "MA"), ("03", "NH"), ("04", "ME"),
    ("05", "VT"), ("06", "CT"), ("07", "NJ"), ("08", "NJ"), ("09", "PR"),
    ("10", "NY"), ("11", "NY"), ("12", "NY"), ("13", "NY"), ("14", "NY"),
    ("15", "PA"), ("16", "PA"), ("17", "PA"), ("18", "PA"), ("19", "PA"),
    ("20", "DC"), ("21", "MD"), ("22", "VA"), ("23", "VA"), ("24", "VA"),
    ("25", "WV"), ("26", "WV"), ("27", "NC"), ("28", "NC"), ("29", "SC"),
    ("30", "GA"), ("31", "GA"), ("32", "FL"), ("33", "FL"), ("34", "FL"),
    ("35", "AL"), ("36", "AL"), ("37", "TN"), ("38", "TN"), ("39", "MS"),
    ("40", "KY"), ("41", "KY"), ("42", "KY"), ("43", "OH"), ("44", "OH"),
    ("45", "OH"), ("46", "IN"), ("47", "IN"), ("48", "MI"), ("49", "MI"),
    ("50", "IA"), ("51", "IA"), ("52", "IA"), ("53", "WI"), ("54", "WI"),
    ("55", "MN"), ("56", "MN"), ("57", "SD"), ("58", "ND"), ("59", "MT"),
    ("60", "IL"), ("61", "IL"), ("62", "IL"), ("63", "MO"), ("64", "MO"),
    ("65", "MO"), ("66", "KS"), ("67", "KS"), ("68", "NE"), ("69", "NE"),
    ("70", "LA"), ("71", "LA"), ("72", "AR"), ("73", "OK"), ("74", "OK"),
    ("75", "TX"), ("76", "TX"), ("77", "TX"), ("78", "TX"), ("79", "TX"),
    ("80", "CO"), ("81", "CO"), ("82", "WY"), ("83", "ID"), ("84", "UT"),
    ("85", "AZ"), ("86", "AZ"), ("87", "NM"), ("88", "TX"), ("89", "NV"),
    ("90", "CA"), ("91", "CA"), ("92", "CA"), ("93", "CA"), ("94", "CA"),
    ("95", "CA"), ("96", "CA"), ("97", "OR"), ("98", "WA"), ("99", "WA"),
];

const ONE_DIGIT_PREFIXES: &[(&str, &str)] = &[
    ("0", "NJ"), ("1", "NY"), ("2", "VA"), ("3", "FL"), ("4", "KY"),
    ("5", "IA"), ("6", "IL"), ("7", "TX"), ("8", "CO"), ("9", "CA"),
];

/// Static prefix table with a default region.
#[derive(Debug, Clone)]
pub struct ZipRegionTable {
    prefixes: HashMap<String, RegionCode>,
    default_region: RegionCode,
}

impl ZipRegionTable {
    /// Build a table from `(prefix, region)` pairs.
    ///
    /// Prefixes longer than three digits are accepted but never matched.
    pub fn new<I, P>(entries: I, default_region: RegionCode) -> Self
    where
        I: IntoIterator<Item = (P, RegionCode)>,
        P: Into<String>,
    {
        Self {
            prefixes: entries.into_iter().map(|(p, r)| (p.into(), r)).collect(),
            default_region,
        }
    }

    /// The built-in US table.
    #[must_use]
    pub fn standard(default_region: RegionCode) -> Self {
        let entries = ONE_DIGIT_PREFIXES
            .iter()
            .chain(TWO_DIGIT_PREFIXES)
            .chain(THREE_DIGIT_PREFIXES)
            .map(|&(prefix, region)| (prefix, RegionCode::from_static(region)));
        Self::new(entries, default_region)
    }

    /// Number of prefixes in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.prefixes.len()
    }

    /// Whether the table has no prefixes at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.prefixes.is_empty()
    }

    /// Look a ZIP up without applying the default.
    #[must_use]
    pub fn lookup(&self, zip: &str) -> Option<RegionCode> {
        let digits = usable_prefix(zip);
        (1..=digits.len())
            .rev()
            .filter_map(|len| digits.get(..len))
            .find_map(|prefix| self.prefixes.get(prefix).copied())
    }
}

impl RegionResolver for ZipRegionTable {
    fn region_for_zip(&self, zip: Option<&str>) -> RegionCode {
        zip.and_then(|z| self.lookup(z))
            .unwrap_or(self.default_region)
    }

    fn default_region(&self) -> RegionCode {
        self.default_region
    }
}

/// Coerce arbitrary input to the leading digits worth looking up.
///
/// Non-digits are dropped, so `"07105-1234"` and `" 071 05"` both yield `"071"`.
fn usable_prefix(zip: &str) -> String {
    zip.chars()
        .filter(char::is_ascii_digit)
        .take(MAX_PREFIX_LEN)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn nj() -> RegionCode {
        RegionCode::from_static("NJ")
    }

    fn table() -> ZipRegionTable {
        ZipRegionTable::standard(nj())
    }

    #[test]
    fn test_tables_only_hold_valid_region_codes() {
        for (prefix, region) in ONE_DIGIT_PREFIXES
            .iter()
            .chain(TWO_DIGIT_PREFIXES)
            .chain(THREE_DIGIT_PREFIXES)
        {
            assert!(RegionCode::parse(region).is_ok(), "bad region for {prefix}");
            assert!(prefix.len() <= MAX_PREFIX_LEN);
        }
    }

    #[test]
    fn test_every_two_digit_prefix_is_covered() {
        let t = table();
        for n in 0..100 {
            let zip = format!("{n:02}000");
            assert!(t.lookup(&zip).is_some(), "no region for {zip}");
        }
    }

    #[test]
    fn test_known_zips() {
        let t = table();
        assert_eq!(t.region_for_zip(Some("07105")).as_str(), "NJ");
        assert_eq!(t.region_for_zip(Some("10001")).as_str(), "NY");
        assert_eq!(t.region_for_zip(Some("90210")).as_str(), "CA");
        assert_eq!(t.region_for_zip(Some("60601")).as_str(), "IL");
        assert_eq!(t.region_for_zip(Some("98101")).as_str(), "WA");
        assert_eq!(t.region_for_zip(Some("00901")).as_str(), "PR");
    }

    #[test]
    fn test_longest_prefix_wins() {
        let t = table();
        // "20" alone is DC, "201" is northern Virginia.
        assert_eq!(t.region_for_zip(Some("20101")).as_str(), "VA");
        assert_eq!(t.region_for_zip(Some("20001")).as_str(), "DC");
    }

    #[test]
    fn test_malformed_input_is_coerced() {
        let t = table();
        assert_eq!(t.region_for_zip(Some("07105-1234")).as_str(), "NJ");
        assert_eq!(t.region_for_zip(Some("  331")).as_str(), "FL");
        assert_eq!(t.region_for_zip(Some("9")).as_str(), "CA");
        assert_eq!(t.region_for_zip(Some("zip 75")).as_str(), "TX");
    }

    #[test]
    fn test_missing_or_digitless_falls_back() {
        let t = table();
        assert_eq!(t.region_for_zip(None), nj());
        assert_eq!(t.region_for_zip(Some("")), nj());
        assert_eq!(t.region_for_zip(Some("ABCDE")), nj());
    }

    #[test]
    fn test_absent_prefix_uses_default() {
        let ca = RegionCode::from_static("CA");
        let t = ZipRegionTable::new([("070", nj())], ca);
        assert_eq!(t.region_for_zip(Some("07011")), nj());
        assert_eq!(t.region_for_zip(Some("10001")), ca);
        assert_eq!(t.default_region(), ca);
    }
}
