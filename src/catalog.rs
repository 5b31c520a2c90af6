//! Catalog query engine.
//!
//! Answers read-only filter, sort, and segment queries over the fixed
//! listing set. Every operation is a total function computed fresh from the
//! immutable catalog; an unmatched category or search yields an empty
//! result, never an error.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::model::{ListingError, ListingId, RewardListing, SegmentFlag};

/// Category selector; `All` matches every listing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    Category(String),
}

impl CategoryFilter {
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Category(wanted) => wanted == category,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("all") {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::Category(s.to_string()))
        }
    }
}

/// Presentation order for query results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Curated catalog order; the default, and the tie-break everywhere else.
    #[default]
    Featured,
    /// Recently-added listings first, catalog order otherwise.
    Newest,
    /// Ascending claim cost.
    LowestPrice,
    /// Descending claim cost.
    HighestPrice,
}

impl SortOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            SortOrder::Featured => "featured",
            SortOrder::Newest => "newest",
            SortOrder::LowestPrice => "lowest-price",
            SortOrder::HighestPrice => "highest-price",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sort label that matches none of the known orders.
#[derive(Debug, Error)]
#[error("unknown sort order '{0}'")]
pub struct UnknownSortOrder(pub String);

impl FromStr for SortOrder {
    type Err = UnknownSortOrder;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "featured" => Ok(SortOrder::Featured),
            "newest" => Ok(SortOrder::Newest),
            "lowest-price" => Ok(SortOrder::LowestPrice),
            "highest-price" => Ok(SortOrder::HighestPrice),
            other => Err(UnknownSortOrder(other.to_string())),
        }
    }
}

/// A combined query: category and search intersected, then sorted.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
    pub category: CategoryFilter,
    pub search: String,
    pub sort: SortOrder,
}

/// Error building a catalog from raw listings.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("listing {0}: {1}")]
    InvalidListing(ListingId, ListingError),

    #[error("duplicate listing id {0}")]
    DuplicateId(ListingId),
}

/// The immutable listing set and its query operations.
///
/// Catalog order (the order listings were loaded in) is preserved and acts
/// as the tie-break for every sort.
pub struct Catalog {
    listings: Vec<RewardListing>,
    index: HashMap<ListingId, usize>,
}

impl Catalog {
    /// Build a catalog, validating every listing and rejecting duplicate ids.
    pub fn new(listings: Vec<RewardListing>) -> Result<Self, CatalogError> {
        let mut index = HashMap::with_capacity(listings.len());
        for (pos, listing) in listings.iter().enumerate() {
            listing
                .validate()
                .map_err(|e| CatalogError::InvalidListing(listing.id, e))?;
            if index.insert(listing.id, pos).is_some() {
                return Err(CatalogError::DuplicateId(listing.id));
            }
        }
        Ok(Self { listings, index })
    }

    pub fn len(&self) -> usize {
        self.listings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listings.is_empty()
    }

    /// All listings in catalog order.
    pub fn listings(&self) -> &[RewardListing] {
        &self.listings
    }

    pub fn get(&self, id: ListingId) -> Option<&RewardListing> {
        self.index.get(&id).map(|&pos| &self.listings[pos])
    }

    /// Distinct category labels in first-seen catalog order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for listing in &self.listings {
            if !seen.contains(&listing.category.as_str()) {
                seen.push(listing.category.as_str());
            }
        }
        seen
    }

    pub fn filter_by_category(&self, filter: &CategoryFilter) -> Vec<&RewardListing> {
        self.listings
            .iter()
            .filter(|l| filter.matches(&l.category))
            .collect()
    }

    /// Case-insensitive substring search over title, description, and brand.
    /// An empty query matches every listing.
    pub fn search(&self, query: &str) -> Vec<&RewardListing> {
        if query.is_empty() {
            return self.listings.iter().collect();
        }
        let needle = query.to_lowercase();
        self.listings
            .iter()
            .filter(|l| matches_search(l, &needle))
            .collect()
    }

    /// Intersection of the category and search filters, sorted.
    pub fn query(&self, query: &ListingQuery) -> Vec<&RewardListing> {
        let needle = query.search.to_lowercase();
        let mut hits: Vec<&RewardListing> = self
            .listings
            .iter()
            .filter(|l| query.category.matches(&l.category))
            .filter(|l| needle.is_empty() || matches_search(l, &needle))
            .collect();
        sort_listings(&mut hits, query.sort);
        hits
    }

    /// Every listing carrying `flag`, in catalog order.
    pub fn segment(&self, flag: SegmentFlag) -> Vec<&RewardListing> {
        self.listings
            .iter()
            .filter(|l| l.flags.contains(flag))
            .collect()
    }
}

fn matches_search(listing: &RewardListing, needle_lower: &str) -> bool {
    listing.title.to_lowercase().contains(needle_lower)
        || listing.description.to_lowercase().contains(needle_lower)
        || listing.brand.to_lowercase().contains(needle_lower)
}

/// Reorder `listings` by `order`.
///
/// Sorts are stable: equal keys keep their input order, and `Featured`
/// leaves the input order untouched.
pub fn sort_listings(listings: &mut [&RewardListing], order: SortOrder) {
    match order {
        SortOrder::Featured => {}
        SortOrder::Newest => {
            listings.sort_by_key(|l| !l.flags.contains(SegmentFlag::RecentlyAdded));
        }
        SortOrder::LowestPrice => listings.sort_by_key(|l| l.cost),
        SortOrder::HighestPrice => listings.sort_by_key(|l| std::cmp::Reverse(l.cost)),
    }
}
