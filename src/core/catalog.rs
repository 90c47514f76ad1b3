//! Static catalog of restaurants and rewards
//!
//! Loaded once at startup and never mutated. Filtering by rarity or
//! neighborhood is offered for collaborators; the loyalty rules only need
//! lookups by id.

use crate::types::{GeoPoint, RarityTier, RestaurantEntry, RewardEntry};

/// Read-only restaurant + reward reference data
#[derive(Debug, Clone)]
pub struct Catalog {
    restaurants: Vec<RestaurantEntry>,
    rewards: Vec<RewardEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        Self::oakland()
    }
}

impl Catalog {
    /// Build a catalog from explicit entries (order is preserved)
    pub fn new(restaurants: Vec<RestaurantEntry>, rewards: Vec<RewardEntry>) -> Self {
        Self { restaurants, rewards }
    }

    /// The built-in Oakland launch catalog
    pub fn oakland() -> Self {
        let restaurants = vec![
            restaurant(
                1, "Khana Peena", "Burmese", "Fruitvale", 4.7, 0.8, 50, RarityTier::Epic,
                (37.7749, -122.2194), "3560 Fruitvale Ave, Oakland, CA",
                "Authentic Burmese tea leaf salads and mohinga", "🍜",
            ),
            restaurant(
                2, "Café Romanat", "Eritrean", "Temescal", 4.8, 1.2, 75, RarityTier::Legendary,
                (37.8350, -122.2661), "462 Santa Clara Ave, Oakland, CA",
                "Traditional Eritrean coffee ceremony and injera", "☕",
            ),
            restaurant(
                3, "Cholita Linda", "Mexican", "Fruitvale", 4.6, 0.5, 25, RarityTier::Rare,
                (37.7699, -122.2256), "4923 E 12th St, Oakland, CA",
                "Fresh ceviche and Baja-style tacos", "🌮",
            ),
            restaurant(
                4, "Daughter Thai", "Thai", "Montclair", 4.9, 2.1, 60, RarityTier::Epic,
                (37.8272, -122.2097), "2068 Mountain Blvd, Oakland, CA",
                "Modern Thai with Oakland soul", "🍛",
            ),
            restaurant(
                5, "Belotti Ristorante", "Italian", "Rockridge", 4.7, 1.5, 35, RarityTier::Rare,
                (37.8444, -122.2508), "5403 College Ave, Oakland, CA",
                "Northern Italian with house-made pasta", "🍝",
            ),
        ];

        let rewards = vec![
            reward(1, "Free Appetizer", "Redeem at any participating restaurant", 100, "🥗"),
            reward(2, "15% Off Coupon", "Valid for one week at select locations", 200, "🎫"),
            reward(3, "Free Meal", "Complete meal at featured restaurant", 1500, "🍽️"),
        ];

        Self::new(restaurants, rewards)
    }

    /// All restaurants in catalog order
    pub fn restaurants(&self) -> &[RestaurantEntry] {
        &self.restaurants
    }

    /// All rewards in catalog order
    pub fn rewards(&self) -> &[RewardEntry] {
        &self.rewards
    }

    pub fn restaurant(&self, id: u32) -> Option<&RestaurantEntry> {
        self.restaurants.iter().find(|r| r.id == id)
    }

    pub fn reward(&self, id: u32) -> Option<&RewardEntry> {
        self.rewards.iter().find(|r| r.id == id)
    }

    /// Restaurants of one tier, catalog order
    pub fn by_rarity(&self, rarity: RarityTier) -> impl Iterator<Item = &RestaurantEntry> {
        self.restaurants.iter().filter(move |r| r.rarity == rarity)
    }

    /// Restaurants in a neighborhood (case-insensitive)
    pub fn by_neighborhood<'a>(&'a self, neighborhood: &'a str) -> impl Iterator<Item = &'a RestaurantEntry> {
        self.restaurants
            .iter()
            .filter(move |r| r.neighborhood.eq_ignore_ascii_case(neighborhood))
    }
}

#[allow(clippy::too_many_arguments)]
fn restaurant(
    id: u32,
    name: &str,
    cuisine: &str,
    neighborhood: &str,
    rating: f32,
    distance_miles: f32,
    point_value: u32,
    rarity: RarityTier,
    (lat, lng): (f64, f64),
    address: &str,
    description: &str,
    icon: &str,
) -> RestaurantEntry {
    RestaurantEntry {
        id,
        name: name.to_string(),
        cuisine: cuisine.to_string(),
        neighborhood: neighborhood.to_string(),
        rating,
        distance_miles,
        point_value,
        rarity,
        location: GeoPoint { lat, lng },
        address: address.to_string(),
        description: description.to_string(),
        icon: icon.to_string(),
    }
}

fn reward(id: u32, name: &str, description: &str, cost_points: u32, icon: &str) -> RewardEntry {
    RewardEntry {
        id,
        name: name.to_string(),
        description: description.to_string(),
        cost_points,
        icon: icon.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_ids_are_unique() {
        let catalog = Catalog::oakland();
        let ids: HashSet<u32> = catalog.restaurants().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), catalog.restaurants().len());
        let ids: HashSet<u32> = catalog.rewards().iter().map(|r| r.id).collect();
        assert_eq!(ids.len(), catalog.rewards().len());
    }

    #[test]
    fn test_entries_respect_bounds() {
        let catalog = Catalog::oakland();
        for r in catalog.restaurants() {
            assert!(r.point_value > 0, "{} has no points", r.name);
            assert!((0.0..=5.0).contains(&r.rating));
            assert!(r.distance_miles >= 0.0);
        }
        for w in catalog.rewards() {
            assert!(w.cost_points > 0, "{} is free", w.name);
        }
    }

    #[test]
    fn test_lookup_by_id() {
        let catalog = Catalog::oakland();
        let thai = catalog.restaurant(4).unwrap();
        assert_eq!(thai.name, "Daughter Thai");
        assert_eq!(thai.point_value, 60);
        assert!(catalog.restaurant(42).is_none());
        assert_eq!(catalog.reward(3).unwrap().cost_points, 1500);
    }

    #[test]
    fn test_filters() {
        let catalog = Catalog::oakland();
        let rare: Vec<u32> = catalog.by_rarity(RarityTier::Rare).map(|r| r.id).collect();
        assert_eq!(rare, vec![3, 5]);

        let fruitvale: Vec<u32> = catalog.by_neighborhood("fruitvale").map(|r| r.id).collect();
        assert_eq!(fruitvale, vec![1, 3]);

        assert_eq!(catalog.by_rarity(RarityTier::Common).count(), 0);
    }
}
