use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

use crate::Points;
use crate::model::{
    ListingError, ListingId, RewardKind, RewardListing, SegmentFlag, SegmentFlags, UnknownFlag,
    UnknownKind,
};

/// Errors that can occur when parsing catalog rows
#[derive(Debug, Error)]
pub enum CsvError {
    #[error("line {line}: failed to parse row: {source}")]
    Parse { line: usize, source: csv::Error },

    #[error("line {line}: {source}")]
    UnknownKind { line: usize, source: UnknownKind },

    #[error("line {line}: {source}")]
    UnknownFlag { line: usize, source: UnknownFlag },

    #[error("line {line}: invalid listing: {source}")]
    Invalid { line: usize, source: ListingError },
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    id: ListingId,
    title: String,
    description: String,
    full_description: String,
    contributor: String,
    kind: String,
    category: String,
    brand: String,
    cost: u64,
    total_supply: u32,
    remaining_supply: u32,
    expiry_window: Option<String>,
    flags: String,
    redemption_instructions: String,
    terms: String,
    delivery_time: String,
}

#[derive(Debug, Serialize)]
struct OutputRow {
    id: ListingId,
    title: String,
    brand: String,
    category: String,
    cost: u64,
    supply: String,
    flags: String,
}

/// Read reward listings from a csv file
pub fn read_listings(
    path: impl AsRef<Path>,
) -> impl Iterator<Item = Result<RewardListing, CsvError>> {
    let reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .expect("failed to open csv file");

    reader
        .into_deserialize::<ListingRow>()
        .enumerate()
        .map(|(idx, result)| {
            let line = idx + 2; // 1-indexed, skip header
            let row = result.map_err(|source| CsvError::Parse { line, source })?;
            listing_from_row(row, line)
        })
}

fn listing_from_row(row: ListingRow, line: usize) -> Result<RewardListing, CsvError> {
    let kind = row
        .kind
        .parse::<RewardKind>()
        .map_err(|source| CsvError::UnknownKind { line, source })?;

    let mut flags = SegmentFlags::none();
    for label in row.flags.split('|').map(str::trim).filter(|s| !s.is_empty()) {
        let flag = label
            .parse::<SegmentFlag>()
            .map_err(|source| CsvError::UnknownFlag { line, source })?;
        flags.insert(flag);
    }

    let listing = RewardListing {
        id: row.id,
        title: row.title,
        description: row.description,
        full_description: row.full_description,
        contributor: row.contributor,
        kind,
        category: row.category,
        brand: row.brand,
        cost: Points::new(row.cost),
        total_supply: row.total_supply,
        remaining_supply: row.remaining_supply,
        expiry_window: row.expiry_window,
        flags,
        redemption_instructions: row.redemption_instructions,
        terms: row.terms,
        delivery_time: row.delivery_time,
    };
    listing
        .validate()
        .map_err(|source| CsvError::Invalid { line, source })?;
    Ok(listing)
}

/// Write query results to stdout in csv format
pub fn write_listings<'a>(listings: impl IntoIterator<Item = &'a RewardListing>) {
    let stdout = io::stdout();
    let mut writer = csv::Writer::from_writer(stdout.lock());

    for listing in listings {
        let row = OutputRow {
            id: listing.id,
            title: listing.title.clone(),
            brand: listing.brand.clone(),
            category: listing.category.clone(),
            cost: listing.cost.get(),
            supply: format!("{}/{}", listing.remaining_supply, listing.total_supply),
            flags: listing.flags.to_string(),
        };
        writer.serialize(&row).expect("failed to write csv row");
    }

    writer.flush().expect("failed to flush csv writer");
}
