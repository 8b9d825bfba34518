//! Static coordinate tables and the country/location fallback chains.

use serde::Serialize;

use super::GeoPoint;

/// Country value for news that cannot be tied to one place.
pub const GLOBAL: &str = "global";

/// Longest AI country answer still treated as a country name.
const MAX_COUNTRY_NAME_LEN: usize = 40;

/// A named point with a population used for visual weighting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountryCoordinate {
    pub name: &'static str,
    pub code: &'static str,
    pub lat: f64,
    pub lng: f64,
    pub population: u64,
}

impl CountryCoordinate {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

const fn place(
    name: &'static str,
    code: &'static str,
    lat: f64,
    lng: f64,
    population: u64,
) -> CountryCoordinate {
    CountryCoordinate {
        name,
        code,
        lat,
        lng,
        population,
    }
}

/// Countries, placed at their capital or main news city.
pub static COUNTRIES: &[CountryCoordinate] = &[
    // Asia
    place("South Korea", "KR", 37.5665, 126.9780, 51_700_000),
    place("Japan", "JP", 35.6762, 139.6503, 124_500_000),
    place("China", "CN", 39.9042, 116.4074, 1_410_000_000),
    place("Taiwan", "TW", 25.0330, 121.5654, 23_400_000),
    place("Hong Kong", "HK", 22.3193, 114.1694, 7_500_000),
    place("India", "IN", 28.6139, 77.2090, 1_430_000_000),
    place("Singapore", "SG", 1.3521, 103.8198, 5_900_000),
    place("Vietnam", "VN", 21.0285, 105.8542, 98_800_000),
    place("Thailand", "TH", 13.7563, 100.5018, 71_800_000),
    place("Indonesia", "ID", -6.2088, 106.8456, 277_500_000),
    place("Malaysia", "MY", 3.1390, 101.6869, 34_300_000),
    place("Philippines", "PH", 14.5995, 120.9842, 117_300_000),
    // North America
    place("USA", "US", 38.9072, -77.0369, 334_900_000),
    place("Canada", "CA", 45.4215, -75.6972, 40_100_000),
    place("Mexico", "MX", 19.4326, -99.1332, 128_500_000),
    // Europe
    place("UK", "GB", 51.5074, -0.1278, 68_300_000),
    place("France", "FR", 48.8566, 2.3522, 68_200_000),
    place("Germany", "DE", 52.5200, 13.4050, 84_500_000),
    place("Italy", "IT", 41.9028, 12.4964, 58_800_000),
    place("Spain", "ES", 40.4168, -3.7038, 48_300_000),
    place("Netherlands", "NL", 52.3676, 4.9041, 17_900_000),
    place("Belgium", "BE", 50.8503, 4.3517, 11_800_000),
    place("Switzerland", "CH", 46.9480, 7.4474, 8_800_000),
    place("Austria", "AT", 48.2082, 16.3738, 9_100_000),
    place("Poland", "PL", 52.2297, 21.0122, 36_700_000),
    place("Czechia", "CZ", 50.0755, 14.4378, 10_900_000),
    place("Sweden", "SE", 59.3293, 18.0686, 10_600_000),
    place("Norway", "NO", 59.9139, 10.7522, 5_500_000),
    place("Denmark", "DK", 55.6761, 12.5683, 5_900_000),
    place("Finland", "FI", 60.1699, 24.9384, 5_600_000),
    place("Ireland", "IE", 53.3498, -6.2603, 5_300_000),
    place("Portugal", "PT", 38.7223, -9.1393, 10_500_000),
    place("Greece", "GR", 37.9838, 23.7275, 10_400_000),
    place("Russia", "RU", 55.7558, 37.6173, 144_400_000),
    place("Ukraine", "UA", 50.4501, 30.5234, 37_000_000),
    place("Turkey", "TR", 41.0082, 28.9784, 85_300_000),
    // Middle East
    place("Israel", "IL", 31.7683, 35.2137, 9_800_000),
    place("Iran", "IR", 35.6892, 51.3890, 89_200_000),
    place("Saudi Arabia", "SA", 24.7136, 46.6753, 36_900_000),
    place("UAE", "AE", 25.2048, 55.2708, 9_500_000),
    place("Qatar", "QA", 25.2854, 51.5310, 2_700_000),
    place("Iraq", "IQ", 33.3152, 44.3661, 45_500_000),
    place("Syria", "SY", 33.5138, 36.2765, 23_200_000),
    // Oceania
    place("Australia", "AU", -33.8688, 151.2093, 26_600_000),
    place("New Zealand", "NZ", -41.2865, 174.7762, 5_200_000),
    // South America
    place("Brazil", "BR", -23.5505, -46.6333, 216_400_000),
    place("Argentina", "AR", -34.6037, -58.3816, 46_700_000),
    place("Chile", "CL", -33.4489, -70.6693, 19_600_000),
    place("Colombia", "CO", 4.7110, -74.0721, 52_100_000),
    place("Peru", "PE", -12.0464, -77.0428, 34_400_000),
    place("Venezuela", "VE", 10.4806, -66.9036, 28_800_000),
    // Africa
    place("South Africa", "ZA", -33.9249, 18.4241, 60_400_000),
    place("Egypt", "EG", 30.0444, 31.2357, 112_700_000),
    place("Nigeria", "NG", 6.5244, 3.3792, 223_800_000),
    place("Kenya", "KE", -1.2921, 36.8219, 55_100_000),
    place("Morocco", "MA", 33.9716, -6.8498, 37_800_000),
    place("Ethiopia", "ET", 9.0320, 38.7469, 126_500_000),
];

/// States, provinces and territories that show up often in the news.
pub static REGIONS: &[CountryCoordinate] = &[
    place("California", "US", 36.7783, -119.4179, 39_000_000),
    place("Texas", "US", 31.9686, -99.9018, 30_500_000),
    place("Florida", "US", 27.6648, -81.5158, 22_600_000),
    place("Ontario", "CA", 51.2538, -85.3232, 15_600_000),
    place("Quebec", "CA", 52.9399, -73.5491, 8_900_000),
    place("British Columbia", "CA", 53.7267, -127.6476, 5_600_000),
    place("Scotland", "GB", 56.4907, -4.2026, 5_400_000),
    place("Wales", "GB", 52.1307, -3.7837, 3_100_000),
    place("Northern Ireland", "GB", 54.7877, -6.4923, 1_900_000),
    place("Bavaria", "DE", 48.7904, 11.4979, 13_400_000),
    place("Catalonia", "ES", 41.5912, 1.5209, 8_000_000),
    place("Lombardy", "IT", 45.4791, 9.8452, 10_000_000),
    place("Gyeonggi", "KR", 37.4138, 127.5183, 13_600_000),
    place("Jeju", "KR", 33.4996, 126.5312, 700_000),
    place("Hokkaido", "JP", 43.2203, 142.8635, 5_100_000),
    place("Okinawa", "JP", 26.2124, 127.6809, 1_500_000),
    place("Guangdong", "CN", 23.3790, 113.7633, 127_000_000),
    place("Xinjiang", "CN", 42.5246, 87.5396, 25_900_000),
    place("Kashmir", "IN", 34.0837, 74.7973, 13_600_000),
    place("Punjab", "IN", 31.1471, 75.3412, 30_100_000),
    place("Gaza", "PS", 31.3547, 34.3088, 2_100_000),
    place("West Bank", "PS", 31.9466, 35.3027, 3_200_000),
    place("Crimea", "UA", 44.9521, 34.1024, 2_400_000),
    place("Donbas", "UA", 48.0159, 37.8029, 6_500_000),
    place("Kurdistan", "IQ", 36.4101, 44.3873, 6_400_000),
    place("Queensland", "AU", -20.9176, 142.7028, 5_400_000),
    place("New South Wales", "AU", -31.2532, 146.9211, 8_300_000),
];

/// Major cities, also drawn as night lights on the globe.
pub static CITIES: &[CountryCoordinate] = &[
    place("Seoul", "KR", 37.5665, 126.9780, 9_700_000),
    place("Busan", "KR", 35.1796, 129.0756, 3_400_000),
    place("Tokyo", "JP", 35.6762, 139.6503, 37_400_000),
    place("Osaka", "JP", 34.6937, 135.5023, 19_000_000),
    place("Beijing", "CN", 39.9042, 116.4074, 21_500_000),
    place("Shanghai", "CN", 31.2304, 121.4737, 27_000_000),
    place("Taipei", "TW", 25.0330, 121.5654, 2_600_000),
    place("Delhi", "IN", 28.7041, 77.1025, 32_000_000),
    place("Mumbai", "IN", 19.0760, 72.8777, 21_000_000),
    place("Bangkok", "TH", 13.7563, 100.5018, 10_700_000),
    place("Jakarta", "ID", -6.2088, 106.8456, 10_600_000),
    place("Manila", "PH", 14.5995, 120.9842, 14_000_000),
    place("Hanoi", "VN", 21.0285, 105.8542, 8_000_000),
    place("Kuala Lumpur", "MY", 3.1390, 101.6869, 8_000_000),
    place("New York", "US", 40.7128, -74.0060, 18_800_000),
    place("Washington", "US", 38.9072, -77.0369, 5_400_000),
    place("Los Angeles", "US", 34.0522, -118.2437, 12_500_000),
    place("Chicago", "US", 41.8781, -87.6298, 8_900_000),
    place("San Francisco", "US", 37.7749, -122.4194, 3_300_000),
    place("Toronto", "CA", 43.6532, -79.3832, 6_200_000),
    place("Mexico City", "MX", 19.4326, -99.1332, 21_800_000),
    place("London", "GB", 51.5074, -0.1278, 9_500_000),
    place("Paris", "FR", 48.8566, 2.3522, 11_000_000),
    place("Berlin", "DE", 52.5200, 13.4050, 3_700_000),
    place("Brussels", "BE", 50.8503, 4.3517, 2_100_000),
    place("Geneva", "CH", 46.2044, 6.1432, 600_000),
    place("Rome", "IT", 41.9028, 12.4964, 4_300_000),
    place("Madrid", "ES", 40.4168, -3.7038, 6_700_000),
    place("Moscow", "RU", 55.7558, 37.6173, 12_600_000),
    place("Kyiv", "UA", 50.4501, 30.5234, 3_000_000),
    place("Istanbul", "TR", 41.0082, 28.9784, 15_600_000),
    place("Jerusalem", "IL", 31.7683, 35.2137, 970_000),
    place("Tel Aviv", "IL", 32.0853, 34.7818, 4_200_000),
    place("Tehran", "IR", 35.6892, 51.3890, 9_100_000),
    place("Riyadh", "SA", 24.7136, 46.6753, 7_600_000),
    place("Dubai", "AE", 25.2048, 55.2708, 3_500_000),
    place("Doha", "QA", 25.2854, 51.5310, 2_400_000),
    place("Baghdad", "IQ", 33.3152, 44.3661, 7_500_000),
    place("Cairo", "EG", 30.0444, 31.2357, 21_300_000),
    place("Lagos", "NG", 6.5244, 3.3792, 15_400_000),
    place("Nairobi", "KE", -1.2921, 36.8219, 4_900_000),
    place("Johannesburg", "ZA", -26.2041, 28.0473, 6_000_000),
    place("Cape Town", "ZA", -33.9249, 18.4241, 4_700_000),
    place("Sydney", "AU", -33.8688, 151.2093, 5_300_000),
    place("Melbourne", "AU", -37.8136, 144.9631, 5_100_000),
    place("Sao Paulo", "BR", -23.5505, -46.6333, 22_400_000),
    place("Rio de Janeiro", "BR", -22.9068, -43.1729, 13_600_000),
    place("Buenos Aires", "AR", -34.6037, -58.3816, 15_400_000),
];

/// Alternative spellings mapped onto names in [`COUNTRIES`].
static COUNTRY_ALIASES: &[(&str, &str)] = &[
    ("United States", "USA"),
    ("United States of America", "USA"),
    ("US", "USA"),
    ("U.S.", "USA"),
    ("America", "USA"),
    ("United Kingdom", "UK"),
    ("Britain", "UK"),
    ("Great Britain", "UK"),
    ("England", "UK"),
    ("Korea", "South Korea"),
    ("Republic of Korea", "South Korea"),
    ("Czech Republic", "Czechia"),
    ("United Arab Emirates", "UAE"),
    ("Türkiye", "Turkey"),
    ("Russian Federation", "Russia"),
    // Values written by earlier Korean-language deployments.
    ("미국", "USA"),
    ("영국", "UK"),
    ("대한민국", "South Korea"),
    ("한국", "South Korea"),
    ("일본", "Japan"),
    ("중국", "China"),
    ("프랑스", "France"),
    ("독일", "Germany"),
    ("러시아", "Russia"),
    ("인도", "India"),
    ("홍콩", "Hong Kong"),
    ("싱가포르", "Singapore"),
    ("카타르", "Qatar"),
    ("이스라엘", "Israel"),
    ("호주", "Australia"),
    ("브라질", "Brazil"),
    ("남아프리카공화국", "South Africa"),
    ("우크라이나", "Ukraine"),
];

/// Spellings of "no particular country".
static GLOBAL_ALIASES: &[&str] = &[
    GLOBAL,
    "worldwide",
    "world",
    "international",
    "none",
    "unknown",
    "전세계",
    "글로벌",
];

/// Source name to home country, for news without an explicit country.
pub static SOURCE_COUNTRY: &[(&str, &str)] = &[
    ("CNN", "USA"),
    ("CNN World", "USA"),
    ("New York Times", "USA"),
    ("NYT", "USA"),
    ("NYT World", "USA"),
    ("Washington Post", "USA"),
    ("NPR", "USA"),
    ("AP", "USA"),
    ("BBC", "UK"),
    ("BBC News", "UK"),
    ("BBC World", "UK"),
    ("The Guardian", "UK"),
    ("The Telegraph", "UK"),
    ("Reuters", "UK"),
    ("Naver Politics", "South Korea"),
    ("Naver Economy", "South Korea"),
    ("Naver World", "South Korea"),
    ("Yonhap", "South Korea"),
    ("네이버", "South Korea"),
    ("네이버 정치", "South Korea"),
    ("네이버 경제", "South Korea"),
    ("네이버 IT/과학", "South Korea"),
    ("연합뉴스", "South Korea"),
    ("Deutsche Welle", "Germany"),
    ("DW", "Germany"),
    ("France24", "France"),
    ("AFP", "France"),
    ("TASS", "Russia"),
    ("RT", "Russia"),
    ("NHK", "Japan"),
    ("Xinhua", "China"),
    ("신화통신", "China"),
    ("South China Morning Post", "Hong Kong"),
    ("NDTV", "India"),
    ("Times of India", "India"),
    ("Straits Times", "Singapore"),
    ("Al Jazeera", "Qatar"),
    ("Times of Israel", "Israel"),
    ("ABC Australia", "Australia"),
    ("UOL Brazil", "Brazil"),
    ("News24 South Africa", "South Africa"),
];

/// How precisely an item could be placed, least precise first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Specificity {
    Country,
    Region,
    City,
}

/// Where an item lands on the map and what to call that spot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placement {
    pub point: GeoPoint,
    pub label: String,
    pub specificity: Specificity,
}

fn find(table: &'static [CountryCoordinate], name: &str) -> Option<&'static CountryCoordinate> {
    let name = name.trim();
    table.iter().find(|p| p.name.eq_ignore_ascii_case(name))
}

pub fn is_global(name: &str) -> bool {
    let name = name.trim();
    GLOBAL_ALIASES.iter().any(|g| g.eq_ignore_ascii_case(name))
}

/// Maps a free-form country answer onto the name used by the tables.
///
/// Empty, overly long and worldwide answers become [`GLOBAL`]; unknown names
/// are returned trimmed.
pub fn canonical_country(name: &str) -> String {
    let name = name.trim().trim_matches(|c| c == '"' || c == '.');
    if name.is_empty() || name.chars().count() > MAX_COUNTRY_NAME_LEN || is_global(name) {
        return GLOBAL.to_string();
    }

    if let Some((_, canonical)) = COUNTRY_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(name))
    {
        return canonical.to_string();
    }

    match find(COUNTRIES, name) {
        Some(country) => country.name.to_string(),
        None => name.to_string(),
    }
}

pub fn country_coordinates(name: &str) -> Option<&'static CountryCoordinate> {
    find(COUNTRIES, &canonical_country(name))
}

pub fn region_coordinates(name: &str) -> Option<&'static CountryCoordinate> {
    find(REGIONS, name)
}

pub fn city_coordinates(name: &str) -> Option<&'static CountryCoordinate> {
    find(CITIES, name)
}

pub fn country_from_source(source: &str) -> Option<&'static str> {
    let source = source.trim();
    SOURCE_COUNTRY
        .iter()
        .find(|(name, _)| *name == source)
        .map(|(_, country)| *country)
}

/// Resolves the country shown for a news item.
///
/// An explicit, non-global country wins; otherwise the source's home country;
/// otherwise [`GLOBAL`].
pub fn assign_country(country: Option<&str>, source: Option<&str>) -> String {
    if let Some(country) = country
        .map(str::trim)
        .filter(|c| !c.is_empty() && !is_global(c))
    {
        return country.to_string();
    }

    source
        .and_then(country_from_source)
        .unwrap_or(GLOBAL)
        .to_string()
}

/// Places an item using the most specific known name: city, then region,
/// then country. Global news has no place on the map.
pub fn resolve_location(
    city: Option<&str>,
    region: Option<&str>,
    country: &str,
) -> Option<Placement> {
    let candidates = [
        (city.and_then(city_coordinates), Specificity::City),
        (region.and_then(region_coordinates), Specificity::Region),
        (country_coordinates(country), Specificity::Country),
    ];

    candidates
        .into_iter()
        .find_map(|(found, specificity)| found.map(|p| (p, specificity)))
        .map(|(p, specificity)| Placement {
            point: p.point(),
            label: p.name.to_string(),
            specificity,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_assign_country_fallback_chain() {
        assert_eq!(assign_country(Some("France"), None), "France");
        assert_eq!(assign_country(Some("France"), Some("BBC")), "France");
        assert_eq!(assign_country(None, Some("BBC")), "UK");
        assert_eq!(assign_country(Some("global"), Some("BBC")), "UK");
        assert_eq!(assign_country(Some("  "), Some("CNN")), "USA");
        assert_eq!(assign_country(None, Some("Unknown Blog")), GLOBAL);
        assert_eq!(assign_country(None, None), GLOBAL);
    }

    #[test]
    fn test_canonical_country() {
        assert_eq!(canonical_country("United Kingdom"), "UK");
        assert_eq!(canonical_country(" france. "), "France");
        assert_eq!(canonical_country("Worldwide"), GLOBAL);
        assert_eq!(canonical_country(""), GLOBAL);
        assert_eq!(canonical_country("미국"), "USA");
        assert_eq!(canonical_country("Atlantis"), "Atlantis");
        assert_eq!(
            canonical_country("The article covers several countries across the region"),
            GLOBAL
        );
    }

    #[test]
    fn test_resolve_location_prefers_city_then_region() {
        let city = resolve_location(Some("Osaka"), Some("Hokkaido"), "Japan").unwrap();
        assert_eq!(city.label, "Osaka");
        assert_eq!(city.specificity, Specificity::City);

        let region = resolve_location(Some("Nowhere"), Some("hokkaido"), "Japan").unwrap();
        assert_eq!(region.label, "Hokkaido");
        assert_eq!(region.specificity, Specificity::Region);

        let country = resolve_location(None, None, "United States").unwrap();
        assert_eq!(country.label, "USA");
        assert_eq!(country.specificity, Specificity::Country);
        assert_eq!(country.point, GeoPoint::new(38.9072, -77.0369));
    }

    #[test]
    fn test_global_news_is_not_placed() {
        assert!(resolve_location(None, None, GLOBAL).is_none());
        assert!(resolve_location(None, None, "Atlantis").is_none());
    }

    #[test]
    fn test_tables_are_consistent() {
        for (_, country) in SOURCE_COUNTRY {
            assert!(find(COUNTRIES, country).is_some(), "{country}");
        }
        for (_, country) in COUNTRY_ALIASES {
            assert!(find(COUNTRIES, country).is_some(), "{country}");
        }
        for p in COUNTRIES.iter().chain(REGIONS).chain(CITIES) {
            assert!((-90.0..=90.0).contains(&p.lat), "{}", p.name);
            assert!((-180.0..=180.0).contains(&p.lng), "{}", p.name);
            assert!(p.population > 0, "{}", p.name);
        }
    }
}
