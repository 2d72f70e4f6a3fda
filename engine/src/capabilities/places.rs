//! Static place search
//!
//! A place-search backend over a curated in-memory list. Filters by
//! location substring, optional cuisine, and minimum rating, then ranks by
//! rating descending. Stands in for a places API in the CLI and tests.

use async_trait::async_trait;
use tracing::debug;

use sdk::capability::PlaceSearch;
use sdk::errors::CapabilityError;
use sdk::types::Place;

/// Place search over a fixed list.
pub struct StaticPlaceSearch {
    places: Vec<Place>,
}

impl StaticPlaceSearch {
    pub fn new(places: Vec<Place>) -> Self {
        Self { places }
    }

    /// A small curated set for demos.
    pub fn sample() -> Self {
        let place = |name: &str, address: &str, rating: f64, cuisine: &str, phone: &str| Place {
            name: name.to_string(),
            address: address.to_string(),
            rating,
            cuisine: Some(cuisine.to_string()),
            phone: Some(phone.to_string()),
            hours: vec!["12:00 - 23:00".to_string()],
            source: "local".to_string(),
        };

        Self::new(vec![
            place(
                "Paradise Biryani",
                "SD Road, Secunderabad, Hyderabad",
                4.5,
                "Hyderabadi",
                "+91 40 6666 1100",
            ),
            place(
                "Bawarchi",
                "RTC X Roads, Hyderabad",
                4.3,
                "Hyderabadi",
                "+91 40 2764 8222",
            ),
            place(
                "Shah Ghouse",
                "Tolichowki, Hyderabad",
                4.2,
                "Hyderabadi",
                "+91 40 2356 1122",
            ),
            place(
                "Minerva Coffee Shop",
                "Himayatnagar, Hyderabad",
                4.1,
                "Indian",
                "+91 40 2322 0044",
            ),
            place(
                "Trattoria Milano",
                "Banjara Hills, Hyderabad",
                4.0,
                "Italian",
                "+91 40 4455 6677",
            ),
            place(
                "Wok Republic",
                "Linking Road, Mumbai",
                4.4,
                "Chinese",
                "+91 22 2605 8899",
            ),
            place(
                "Trishna",
                "Fort, Mumbai",
                4.6,
                "Indian",
                "+91 22 2270 3213",
            ),
            place(
                "Roadside Dhaba",
                "Old Highway, Hyderabad",
                3.1,
                "Indian",
                "+91 40 0000 0000",
            ),
        ])
    }
}

#[async_trait]
impl PlaceSearch for StaticPlaceSearch {
    async fn search(
        &self,
        location: &str,
        cuisine: Option<&str>,
        min_rating: f64,
    ) -> Result<Vec<Place>, CapabilityError> {
        let location_lower = location.to_lowercase();

        let mut results: Vec<Place> = self
            .places
            .iter()
            .filter(|place| place.address.to_lowercase().contains(&location_lower))
            .filter(|place| place.rating >= min_rating)
            .filter(|place| match cuisine {
                Some(wanted) => place
                    .cuisine
                    .as_deref()
                    .map(|c| c.eq_ignore_ascii_case(wanted))
                    .unwrap_or(false),
                None => true,
            })
            .cloned()
            .collect();

        // Rating descending, name as the stable tie-break
        results.sort_by(|a, b| {
            b.rating
                .partial_cmp(&a.rating)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.name.cmp(&b.name))
        });

        debug!(
            "Place search '{}' ({:?}, >= {:.1}) -> {} results",
            location,
            cuisine,
            min_rating,
            results.len()
        );
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_filters_and_ranks() {
        let search = StaticPlaceSearch::sample();
        let results = search
            .search("Hyderabad", Some("Hyderabadi"), 3.5)
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        // Best rating first
        assert_eq!(results[0].name, "Paradise Biryani");
        assert!(results.windows(2).all(|w| w[0].rating >= w[1].rating));
    }

    #[tokio::test]
    async fn test_min_rating_drops_low_entries() {
        let search = StaticPlaceSearch::sample();
        let results = search.search("Hyderabad", None, 3.5).await.unwrap();
        assert!(results.iter().all(|p| p.rating >= 3.5));
        assert!(!results.iter().any(|p| p.name == "Roadside Dhaba"));
    }

    #[tokio::test]
    async fn test_unknown_location_is_empty_not_error() {
        let search = StaticPlaceSearch::sample();
        let results = search.search("Atlantis", None, 0.0).await.unwrap();
        assert!(results.is_empty());
    }
}
