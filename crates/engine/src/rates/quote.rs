//! Rate records and normalized quote sets.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use delivery_estimate_core::{PostalCode, Price, RawPrice, ShippingMethod, normalize_price};
use serde::{Deserialize, Deserializer, Serialize};

/// Upper bound on transit days read from a provider.
const MAX_DELIVERY_DAYS: f64 = 60.0;

const OVERNIGHT_KEYWORDS: &[&str] = &["overnight", "next day"];
const EXPRESS_KEYWORDS: &[&str] = &["express", "2 day", "2-day"];

// =============================================================================
// Raw provider records
// =============================================================================

/// One rate exactly as the cart API returns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRate {
    pub name: String,
    #[serde(default)]
    pub price: Option<RawPrice>,
    #[serde(default)]
    pub code: Option<String>,
    /// Rate source, usually the carrier (`usps`, `ups`, `shopify`).
    #[serde(default)]
    pub source: Option<String>,
    /// Unrecognised shapes read as absent.
    #[serde(default, deserialize_with = "lenient_delivery_days")]
    pub delivery_days: Option<RawDeliveryDays>,
    #[serde(default)]
    pub delivery_date: Option<String>,
    #[serde(default)]
    pub delivery_range: Option<Vec<String>>,
}

impl RawRate {
    /// Minimal record, handy for providers that only know a name and a price.
    #[must_use]
    pub fn new(name: impl Into<String>, price: RawPrice) -> Self {
        Self {
            name: name.into(),
            price: Some(price),
            code: None,
            source: None,
            delivery_days: None,
            delivery_date: None,
            delivery_range: None,
        }
    }
}

/// Transit days in any of the shapes the API has produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDeliveryDays {
    /// `[min, max]`
    Span(Vec<u32>),
    /// `3` or `3.5`
    Number(f64),
    /// `"3,4"` (comma as decimal point) or `"3"`
    Text(String),
}

impl RawDeliveryDays {
    /// `(min, max)` business days, or `None` when nothing positive is present.
    #[must_use]
    pub fn span(&self) -> Option<(u32, u32)> {
        match self {
            Self::Span(values) => {
                let min = values.first().copied()?;
                let max = values.get(1).copied().unwrap_or(min);
                (min > 0 || max > 0).then(|| (min.min(max), min.max(max)))
            }
            Self::Number(n) => fractional_span(*n),
            Self::Text(s) => s.trim().replace(',', ".").parse::<f64>().ok().and_then(fractional_span),
        }
    }
}

fn lenient_delivery_days<'de, D>(deserializer: D) -> Result<Option<RawDeliveryDays>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| RawDeliveryDays::deserialize(v).ok()))
}

/// `3.4` reads as "3 to 4 days".
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to (0, 60]
fn fractional_span(days: f64) -> Option<(u32, u32)> {
    if !days.is_finite() || days <= 0.0 {
        return None;
    }
    let days = days.min(MAX_DELIVERY_DAYS);
    Some((days.floor() as u32, days.ceil() as u32))
}

fn parse_api_date(s: &str) -> Option<NaiveDate> {
    let head = s.trim().get(..10)?;
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

// =============================================================================
// Normalized quotes
// =============================================================================

/// When a quote says the parcel arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeliveryTiming {
    Date { date: NaiveDate },
    Range { earliest: NaiveDate, latest: NaiveDate },
    BusinessDays { min: u32, max: u32 },
    Unknown,
}

impl DeliveryTiming {
    /// Exact date beats a range, a range beats a day count.
    #[must_use]
    pub fn from_raw(raw: &RawRate) -> Self {
        if let Some(date) = raw.delivery_date.as_deref().and_then(parse_api_date) {
            return Self::Date { date };
        }

        if let Some(range) = &raw.delivery_range {
            let mut dates = range.iter().filter_map(|s| parse_api_date(s));
            if let (Some(a), Some(b)) = (dates.next(), dates.next()) {
                return Self::Range {
                    earliest: a.min(b),
                    latest: a.max(b),
                };
            }
        }

        raw.delivery_days
            .as_ref()
            .and_then(RawDeliveryDays::span)
            .map_or(Self::Unknown, |(min, max)| Self::BusinessDays { min, max })
    }
}

/// A carrier-supplied shipping option with a normalized price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Quote {
    pub name: String,
    pub carrier: Option<String>,
    pub code: Option<String>,
    pub price: Price,
    pub delivery: DeliveryTiming,
}

impl Quote {
    #[must_use]
    pub fn from_raw(raw: &RawRate) -> Self {
        Self {
            name: raw.name.clone(),
            carrier: raw.source.clone().filter(|s| !s.trim().is_empty()),
            code: raw.code.clone(),
            price: Price::usd(normalize_price(raw.price.as_ref())),
            delivery: DeliveryTiming::from_raw(raw),
        }
    }

    fn name_contains_any(&self, keywords: &[&str]) -> bool {
        let name = self.name.to_lowercase();
        keywords.iter().any(|k| name.contains(k))
    }

    /// Express, two-day, next-day or overnight service.
    #[must_use]
    pub fn is_expedited(&self) -> bool {
        self.name_contains_any(OVERNIGHT_KEYWORDS) || self.name_contains_any(EXPRESS_KEYWORDS)
    }
}

/// Pick the quote for `method` from a cheapest-first list.
///
/// Overnight looks for "overnight" / "next day", express and two-day look for
/// "express" / "2 day" / "2-day". Ground, and any method without a name match,
/// takes the first (cheapest) quote.
#[must_use]
pub fn select_quote(quotes: &[Quote], method: ShippingMethod) -> Option<&Quote> {
    let keywords = match method {
        ShippingMethod::Overnight => OVERNIGHT_KEYWORDS,
        ShippingMethod::Express | ShippingMethod::TwoDay => EXPRESS_KEYWORDS,
        ShippingMethod::Ground => &[],
    };

    quotes
        .iter()
        .find(|q| q.name_contains_any(keywords))
        .or_else(|| quotes.first())
}

// =============================================================================
// CachedQuoteSet
// =============================================================================

/// Quotes for one destination, sorted ascending by price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CachedQuoteSet {
    destination_zip: PostalCode,
    quotes: Vec<Quote>,
    fetched_at: DateTime<Utc>,
}

impl CachedQuoteSet {
    /// Build a set; quotes are stably sorted cheapest-first.
    #[must_use]
    pub fn new(destination_zip: PostalCode, mut quotes: Vec<Quote>, fetched_at: DateTime<Utc>) -> Self {
        quotes.sort_by(|a, b| a.price.amount.cmp(&b.price.amount));
        Self {
            destination_zip,
            quotes,
            fetched_at,
        }
    }

    /// Normalize raw provider records into a set.
    #[must_use]
    pub fn from_raw(destination_zip: PostalCode, raw: &[RawRate], fetched_at: DateTime<Utc>) -> Self {
        Self::new(destination_zip, raw.iter().map(Quote::from_raw).collect(), fetched_at)
    }

    #[must_use]
    pub const fn destination_zip(&self) -> &PostalCode {
        &self.destination_zip
    }

    #[must_use]
    pub fn quotes(&self) -> &[Quote] {
        &self.quotes
    }

    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// True once `ttl` has elapsed since the fetch.
    ///
    /// A fetch time in the future (clock skew) counts as fresh.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        (now - self.fetched_at)
            .to_std()
            .is_ok_and(|age| age >= ttl)
    }

    #[must_use]
    pub fn cheapest(&self) -> Option<&Quote> {
        self.quotes.first()
    }

    /// Quotes for faster-than-ground service, cheapest first.
    pub fn expedited(&self) -> impl Iterator<Item = &Quote> {
        self.quotes.iter().filter(|q| q.is_expedited())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;

    fn zip() -> PostalCode {
        PostalCode::parse("90210").unwrap()
    }

    fn raw(name: &str, price: RawPrice) -> RawRate {
        RawRate::new(name, price)
    }

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 15, h, m, 0).unwrap()
    }

    #[test]
    fn test_quotes_sorted_by_price() {
        let set = CachedQuoteSet::from_raw(
            zip(),
            &[
                raw("UPS Express", RawPrice::from("19.99")),
                raw("Economy", RawPrice::from(499_i64)),
                raw("UPS Ground", RawPrice::from("8.99")),
            ],
            at(10, 0),
        );
        let names: Vec<_> = set.quotes().iter().map(|q| q.name.as_str()).collect();
        assert_eq!(names, ["Economy", "UPS Ground", "UPS Express"]);
        assert_eq!(set.cheapest().unwrap().price.amount, Decimal::new(499, 2));
    }

    #[test]
    fn test_sort_is_stable_for_equal_prices() {
        let set = CachedQuoteSet::from_raw(
            zip(),
            &[raw("B", RawPrice::from("5.00")), raw("A", RawPrice::from(500_i64))],
            at(10, 0),
        );
        assert_eq!(set.cheapest().unwrap().name, "B");
    }

    #[test]
    fn test_expiry() {
        let set = CachedQuoteSet::new(zip(), vec![], at(10, 0));
        let ttl = Duration::from_secs(300);
        assert!(!set.is_expired(at(10, 4), ttl));
        assert!(set.is_expired(at(10, 5), ttl));
        assert!(!set.is_expired(at(9, 0), ttl));
    }

    #[test]
    fn test_select_quote_by_method() {
        let set = CachedQuoteSet::from_raw(
            zip(),
            &[
                raw("UPS Ground", RawPrice::from("8.99")),
                raw("UPS 2-Day Air", RawPrice::from("15.99")),
                raw("UPS Next Day Air", RawPrice::from("39.99")),
            ],
            at(10, 0),
        );
        let q = set.quotes();
        assert_eq!(select_quote(q, ShippingMethod::Ground).unwrap().name, "UPS Ground");
        assert_eq!(select_quote(q, ShippingMethod::Express).unwrap().name, "UPS 2-Day Air");
        assert_eq!(select_quote(q, ShippingMethod::TwoDay).unwrap().name, "UPS 2-Day Air");
        assert_eq!(select_quote(q, ShippingMethod::Overnight).unwrap().name, "UPS Next Day Air");
    }

    #[test]
    fn test_select_quote_without_match_takes_cheapest() {
        let set = CachedQuoteSet::from_raw(
            zip(),
            &[raw("Standard", RawPrice::from("6.00")), raw("Priority", RawPrice::from("12.00"))],
            at(10, 0),
        );
        assert_eq!(
            select_quote(set.quotes(), ShippingMethod::Overnight).unwrap().name,
            "Standard"
        );
        assert!(select_quote(&[], ShippingMethod::Ground).is_none());
    }

    #[test]
    fn test_expedited_filter() {
        let set = CachedQuoteSet::from_raw(
            zip(),
            &[
                raw("Ground", RawPrice::from("6.00")),
                raw("FedEx Overnight", RawPrice::from("40.00")),
                raw("Express Saver", RawPrice::from("20.00")),
            ],
            at(10, 0),
        );
        let names: Vec<_> = set.expedited().map(|q| q.name.as_str()).collect();
        assert_eq!(names, ["Express Saver", "FedEx Overnight"]);
    }

    #[test]
    fn test_raw_rate_from_api_json() {
        let json = serde_json::json!({
            "name": "USPS Priority Mail",
            "code": "priority",
            "price": "9.45",
            "source": "usps",
            "delivery_date": "2024-10-18",
            "delivery_range": ["2024-10-17", "2024-10-18"],
            "delivery_days": [2, 3],
            "phone_required": false
        });
        let rate: RawRate = serde_json::from_value(json).unwrap();
        let quote = Quote::from_raw(&rate);
        assert_eq!(quote.price.display(), "$9.45");
        assert_eq!(quote.carrier.as_deref(), Some("usps"));
        assert_eq!(
            quote.delivery,
            DeliveryTiming::Date {
                date: NaiveDate::from_ymd_opt(2024, 10, 18).unwrap()
            }
        );
    }

    #[test]
    fn test_delivery_timing_priority() {
        let mut rate = raw("X", RawPrice::from("1.00"));
        rate.delivery_range = Some(vec!["2024-10-21".into(), "2024-10-18T00:00:00-04:00".into()]);
        rate.delivery_days = Some(RawDeliveryDays::Span(vec![2, 3]));
        assert_eq!(
            DeliveryTiming::from_raw(&rate),
            DeliveryTiming::Range {
                earliest: NaiveDate::from_ymd_opt(2024, 10, 18).unwrap(),
                latest: NaiveDate::from_ymd_opt(2024, 10, 21).unwrap(),
            }
        );

        rate.delivery_range = Some(vec!["garbage".into()]);
        assert_eq!(
            DeliveryTiming::from_raw(&rate),
            DeliveryTiming::BusinessDays { min: 2, max: 3 }
        );

        rate.delivery_days = None;
        assert_eq!(DeliveryTiming::from_raw(&rate), DeliveryTiming::Unknown);
    }

    #[test]
    fn test_delivery_days_shapes() {
        let days: RawDeliveryDays = serde_json::from_str("[3]").unwrap();
        assert_eq!(days.span(), Some((3, 3)));
        let days: RawDeliveryDays = serde_json::from_str("\"3,4\"").unwrap();
        assert_eq!(days.span(), Some((3, 4)));
        let days: RawDeliveryDays = serde_json::from_str("5").unwrap();
        assert_eq!(days.span(), Some((5, 5)));
        let days: RawDeliveryDays = serde_json::from_str("[]").unwrap();
        assert_eq!(days.span(), None);
        let days: RawDeliveryDays = serde_json::from_str("\"0\"").unwrap();
        assert_eq!(days.span(), None);
    }

    #[test]
    fn test_free_rate() {
        let quote = Quote::from_raw(&raw("Free Shipping", RawPrice::from(0_i64)));
        assert!(quote.price.is_free());
    }
}
