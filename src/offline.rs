//! Offline stand-ins for the chat and geocoding services.
//!
//! With no credentials the planner still answers structured requests: start
//! locations come from a small Bay Area gazetteer, suggestions from a fixed
//! catalog of businesses per errand type, and every suggested place is
//! pinned at a stable spot within about a kilometer of the start.

use tracing::debug;

use crate::error::ServiceError;
use crate::geo::GeoPoint;
use crate::suggest::read_suggestion_request;
use crate::traits::{ChatCompletion, ChatMessage, ChatReply, GeocodeQuery, GeocodeResult, Geocoder, Role};

/// `(match key, name, latitude, longitude)`
const GAZETTEER: [(&str, &str, f64, f64); 8] = [
    ("santa clara", "Santa Clara", 37.3541, -121.9552),
    ("san jose", "San Jose", 37.3382, -121.8863),
    ("palo alto", "Palo Alto", 37.4419, -122.1430),
    ("san ramon", "San Ramon", 37.7799, -121.9780),
    ("san francisco", "San Francisco", 37.7749, -122.4194),
    ("dublin", "Dublin", 37.7022, -121.9358),
    ("fremont", "Fremont", 37.5485, -121.9886),
    ("oakland", "Oakland", 37.8044, -122.2712),
];

/// Largest offset, in degrees, of a placed suggestion from the query's
/// proximity point.
const SPREAD_DEG: f64 = 0.01;

/// `(errand type, [(business, address)])`
const CATALOG: [(&str, &[(&str, &str)]); 6] = [
    (
        "gym",
        &[
            ("24 Hour Fitness", "123 Main St, San Jose, CA"),
            ("LA Fitness", "456 Oak Ave, Santa Clara, CA"),
            ("Planet Fitness", "789 Pine St, San Jose, CA"),
        ],
    ),
    (
        "groceries",
        &[
            ("Costco Fremont", "1000 Costco Dr, Fremont, CA"),
            ("Safeway", "200 Safeway Blvd, Santa Clara, CA"),
            ("Whole Foods", "300 Organic Way, San Jose, CA"),
        ],
    ),
    (
        "restaurant",
        &[
            ("Curry House Indian Restaurant", "111 Spice Ln, San Jose, CA"),
            ("Taco Bell Mexican", "222 Taco St, Santa Clara, CA"),
            ("Pizza Palace", "333 Pizza Ave, San Jose, CA"),
        ],
    ),
    (
        "pharmacy",
        &[
            ("CVS Pharmacy", "444 Health St, Palo Alto, CA"),
            ("Walgreens", "555 Drug Ave, San Jose, CA"),
        ],
    ),
    (
        "coffee",
        &[
            ("Starbucks", "666 Coffee Ln, San Jose, CA"),
            ("Peet's Coffee", "777 Bean St, Santa Clara, CA"),
        ],
    ),
    (
        "bank",
        &[
            ("Bank of America", "888 Finance Blvd, Palo Alto, CA"),
            ("Wells Fargo", "999 Money Ave, San Jose, CA"),
        ],
    ),
];

/// Geocoder that needs no network.
///
/// Queries without a proximity point are looked up in the gazetteer. Queries
/// with one are placed near it, at an offset derived from the query text so
/// the same suggestion always lands on the same spot.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineGeocoder;

impl Geocoder for OfflineGeocoder {
    fn geocode(&self, query: &GeocodeQuery) -> Result<Vec<GeocodeResult>, ServiceError> {
        let text = query.text.trim();
        if text.is_empty() || query.limit == 0 {
            return Ok(Vec::new());
        }

        let found = match query.proximity {
            Some(near) => Some(place_near(text, near)),
            None => lookup_city(text),
        };
        debug!("Offline geocode {text:?} -> {:?}", found.as_ref().map(|r| r.coordinates));
        Ok(found.into_iter().collect())
    }
}

fn lookup_city(text: &str) -> Option<GeocodeResult> {
    let lowered = text.to_lowercase();
    GAZETTEER
        .iter()
        .find(|(key, ..)| lowered.contains(key))
        .map(|&(_, name, latitude, longitude)| GeocodeResult {
            coordinates: GeoPoint::new(latitude, longitude),
            display_name: format!("{name}, CA, USA"),
            short_name: name.to_string(),
        })
}

fn place_near(text: &str, near: GeoPoint) -> GeocodeResult {
    let hash = fnv1a(&text.to_lowercase());
    let offset = |bits: u64| ((bits & 0xffff) as f64 / 65_535.0 - 0.5) * 2.0 * SPREAD_DEG;

    let (short_name, address) = text.split_once(',').unwrap_or((text, text));
    GeocodeResult {
        coordinates: GeoPoint::new(near.latitude + offset(hash), near.longitude + offset(hash >> 16)),
        display_name: address.trim().to_string(),
        short_name: short_name.trim().to_string(),
    }
}

fn fnv1a(text: &str) -> u64 {
    text.bytes()
        .fold(0xcbf2_9ce4_8422_2325, |hash, byte| (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3))
}

/// Chat stand-in that answers place-suggestion requests from the catalog.
///
/// A chain name in front of the errand type narrows the answer to matching
/// businesses when any match. Any other conversation, intent parsing
/// included, fails as not configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct CatalogChat;

impl ChatCompletion for CatalogChat {
    fn complete(&self, messages: &[ChatMessage]) -> Result<ChatReply, ServiceError> {
        let request = messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .and_then(|m| read_suggestion_request(&m.content));
        let Some((count, subject)) = request else {
            return Err(ServiceError::NotConfigured("chat api key"));
        };

        let suggestions = catalog_suggestions(subject, count);
        debug!("Catalog suggestions for {subject:?}: {suggestions:?}");
        Ok(ChatReply {
            content: serde_json::to_string(&suggestions)?,
        })
    }
}

fn catalog_suggestions(subject: &str, count: usize) -> Vec<String> {
    let subject = subject.to_lowercase();
    let Some((brand, places)) = CATALOG.iter().find_map(|(kind, places)| {
        subject
            .strip_suffix(*kind)
            .map(|brand| (brand.trim().to_string(), *places))
    }) else {
        return Vec::new();
    };

    let branded: Vec<_> = places
        .iter()
        .filter(|(name, _)| !brand.is_empty() && name.to_lowercase().contains(&brand))
        .collect();
    let chosen = if branded.is_empty() { places.iter().collect() } else { branded };

    chosen
        .into_iter()
        .take(count)
        .map(|(name, address)| format!("{name}, {address}"))
        .collect()
}
