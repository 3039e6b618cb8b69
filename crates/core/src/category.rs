//! The static category catalog.
//!
//! Listings carry a top-level category and a free-form sub-category label;
//! both are validated against this fixed table at creation and edit time.
//! The catalog is read-only after startup and is handed to components as an
//! explicit value rather than reached for as module-global state.

use serde::Serialize;

/// Error validating a `(category, subCategory)` pair.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The top-level category is not in the catalog.
    #[error("unknown category: {0}")]
    UnknownCategory(String),
    /// The sub-category label does not belong to the given category.
    #[error("unknown sub-category {sub_category:?} for category {category:?}")]
    UnknownSubCategory {
        category: String,
        sub_category: String,
    },
}

/// A top-level category with its fixed sub-category labels.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Display name, also the stored value on listings.
    pub name: &'static str,
    /// Fixed sub-category labels in catalog order.
    pub sub_categories: &'static [&'static str],
}

/// The process-wide category catalog.
///
/// Obtain the built-in instance with [`Catalog::builtin`] and pass it to
/// whatever needs it; nothing else in the crate reads these tables directly.
#[derive(Debug, Clone, Copy)]
pub struct Catalog {
    categories: &'static [Category],
}

static BUILTIN: Catalog = Catalog {
    categories: &[
        Category {
            name: "Vehicles",
            sub_categories: &[
                "Cars",
                "Motorbikes",
                "Three Wheelers",
                "Bicycles",
                "Vans",
                "Buses & Lorries",
                "Vans, Buses, Lorries & Trucks",
                "Trucks",
                "Heavy Machinery & Tractors",
                "Heavy Duty",
                "Tractors",
                "Auto Services",
                "Rentals",
                "Auto Parts & Accessories",
                "Maintenance and Repair",
                "Boats & Water Transport",
            ],
        },
        Category {
            name: "Property",
            sub_categories: &[
                "Land",
                "Houses For Sale",
                "House Rentals",
                "Room & Annex Rentals",
                "Houses",
                "Apartments",
                "New Developments",
                "Commercial Property",
            ],
        },
        Category {
            name: "Electronics",
            sub_categories: &[
                "Mobile Phones",
                "Mobile Phone Accessories",
                "Computers & Tablets",
                "Computer Accessories",
                "TVs",
                "TV & Video Accessories",
                "Cameras & Camcorders",
                "Audio & MP3",
                "Electronic Home Appliances",
                "Air Conditions & Electrical fittings",
                "Video Games & Consoles",
                "Other Electronics",
            ],
        },
        Category {
            name: "Home & Garden",
            sub_categories: &[
                "Furniture",
                "Home Appliances",
                "Bathroom & Sanitary ware",
                "Building Material & Tools",
                "Garden",
                "Home Decor",
                "Kitchen items",
                "Electricity, AC, Bathroom & Garden",
                "Other Home Items",
            ],
        },
        Category {
            name: "Fashion & Beauty",
            sub_categories: &[
                "Bags & Luggage",
                "Clothing",
                "Shoes & Footwear",
                "Jewellery",
                "Sunglasses & Opticians",
                "Watches",
                "Other Fashion Accessories",
                "Beauty Products",
            ],
        },
        Category {
            name: "Animals",
            sub_categories: &[
                "Pets",
                "Pet Food",
                "Veterinary Services",
                "Farm Animals",
                "Animal Accessories",
                "Other Animals",
            ],
        },
        Category {
            name: "Hobby, Sport & Kids",
            sub_categories: &[
                "Musical Instruments",
                "Sports & Fitness",
                "Sports Supplements",
                "Travel",
                "Events & Tickets",
                "Art & Collectibles",
                "Music, Books & Movies",
                "Children's Items",
                "Other Hobby, Sport & Kids Items",
            ],
        },
        Category {
            name: "Business & Industry",
            sub_categories: &["Service", "Solar & Generators"],
        },
        Category {
            name: "Education",
            sub_categories: &[
                "Higher Education",
                "Textbooks",
                "Tuition",
                "Vocational Institutes",
                "Other Education",
            ],
        },
        Category {
            name: "Agriculture",
            sub_categories: &["Food", "Crops", "Seeds & Plants", "Other Agriculture"],
        },
    ],
};

impl Catalog {
    /// The built-in catalog compiled into the binary.
    #[must_use]
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// All categories in catalog order.
    #[must_use]
    pub const fn categories(&self) -> &'static [Category] {
        self.categories
    }

    /// Look up a category by its display name.
    #[must_use]
    pub fn category(&self, name: &str) -> Option<&'static Category> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Validate a `(category, subCategory)` pair against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::UnknownCategory`] when the category is not
    /// listed, and [`CatalogError::UnknownSubCategory`] when the sub-category
    /// label does not belong to it.
    pub fn validate(&self, category: &str, sub_category: &str) -> Result<(), CatalogError> {
        let found = self
            .category(category)
            .ok_or_else(|| CatalogError::UnknownCategory(category.to_owned()))?;

        if found.sub_categories.contains(&sub_category) {
            Ok(())
        } else {
            Err(CatalogError::UnknownSubCategory {
                category: category.to_owned(),
                sub_category: sub_category.to_owned(),
            })
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_top_level_categories() {
        assert_eq!(Catalog::builtin().categories().len(), 10);
    }

    #[test]
    fn test_every_category_has_sub_categories() {
        for category in Catalog::builtin().categories() {
            assert!(
                !category.sub_categories.is_empty(),
                "category {} has no sub-categories",
                category.name
            );
        }
    }

    #[test]
    fn test_validate_known_pair() {
        let catalog = Catalog::builtin();
        assert!(catalog.validate("Vehicles", "Cars").is_ok());
        assert!(catalog.validate("Electronics", "Mobile Phones").is_ok());
        assert!(catalog.validate("Agriculture", "Crops").is_ok());
    }

    #[test]
    fn test_validate_unknown_category() {
        let err = Catalog::builtin().validate("Spaceships", "Rockets").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownCategory(_)));
    }

    #[test]
    fn test_validate_mismatched_sub_category() {
        // "Cars" exists, but under Vehicles, not Electronics
        let err = Catalog::builtin().validate("Electronics", "Cars").unwrap_err();
        assert!(matches!(err, CatalogError::UnknownSubCategory { .. }));
    }

    #[test]
    fn test_category_lookup_is_exact() {
        assert!(Catalog::builtin().category("vehicles").is_none());
        assert!(Catalog::builtin().category("Vehicles").is_some());
    }
}
