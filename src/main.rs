use std::env;
use std::process;

use tokio_stream::StreamExt;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use rewards_eng::claim::CreditNotice;
use rewards_eng::csv::{read_listings, write_listings};
use rewards_eng::model::SegmentFlag;
use rewards_eng::{
    Catalog, CategoryFilter, ClaimFlow, ClaimPhase, ListingId, ListingQuery, Points, SortOrder,
};

const USAGE: &str = "usage: rewards-eng <catalog.csv> [--category C] [--search TEXT] \
[--sort featured|newest|lowest-price|highest-price] [--segment FLAG] [--claim ID --balance N]";

struct CliArgs {
    path: String,
    category: CategoryFilter,
    search: String,
    sort: SortOrder,
    segment: Option<SegmentFlag>,
    claim: Option<ListingId>,
    balance: Points,
}

fn parse_args() -> CliArgs {
    let mut args = env::args().skip(1);
    let path = args.next().expect(USAGE);

    let mut parsed = CliArgs {
        path,
        category: CategoryFilter::All,
        search: String::new(),
        sort: SortOrder::Featured,
        segment: None,
        claim: None,
        balance: Points::new(0),
    };

    while let Some(flag) = args.next() {
        let value = args.next().expect(USAGE);
        match flag.as_str() {
            "--category" => parsed.category = value.parse().expect(USAGE),
            "--search" => parsed.search = value,
            "--sort" => parsed.sort = value.parse().expect(USAGE),
            "--segment" => parsed.segment = Some(value.parse().expect(USAGE)),
            "--claim" => parsed.claim = Some(value.parse().expect(USAGE)),
            "--balance" => parsed.balance = Points::new(value.parse().expect(USAGE)),
            _ => panic!("{USAGE}"),
        }
    }
    parsed
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let cli = parse_args();

    if !cli.path.ends_with(".csv") {
        warn!(path = cli.path, "input file seems to not be a csv file");
    }

    let mut listings = Vec::new();
    for result in read_listings(&cli.path) {
        match result {
            Ok(listing) => listings.push(listing),
            Err(e) => {
                warn!("{e}");
            }
        }
    }

    let catalog = match Catalog::new(listings) {
        Ok(catalog) => catalog,
        Err(e) => {
            eprintln!("invalid catalog: {e}");
            process::exit(1);
        }
    };
    info!(listings = catalog.len(), "catalog loaded");

    if let Some(id) = cli.claim {
        run_claim(&catalog, id, cli.balance).await;
        return;
    }

    let rows = if let Some(flag) = cli.segment {
        catalog.segment(flag)
    } else {
        catalog.query(&ListingQuery {
            category: cli.category,
            search: cli.search,
            sort: cli.sort,
        })
    };
    write_listings(rows);
}

/// Run one claim end to end: enforce blockers, confirm, await settlement,
/// surface the contributor credit, then close the flow.
async fn run_claim(catalog: &Catalog, id: ListingId, balance: Points) {
    let Some(listing) = catalog.get(id) else {
        eprintln!("no listing with id {id} in the catalog");
        process::exit(1);
    };

    let mut flow = ClaimFlow::initiate(listing.clone(), balance);
    let blockers = flow.blockers();
    if !blockers.is_empty() {
        for blocker in &blockers {
            eprintln!("cannot claim '{}': {blocker}", listing.title);
        }
        process::exit(1);
    }

    let mut phases = flow.subscribe();
    let mut notices = flow.notices().expect("notice stream already taken");
    flow.confirm().expect("claim could not be confirmed");

    let receipt = loop {
        let phase = phases.borrow_and_update().clone();
        match phase {
            ClaimPhase::Success(receipt) => break receipt,
            ClaimPhase::Failed => {
                eprintln!("claim failed");
                process::exit(1);
            }
            _ => {}
        }
        phases.changed().await.expect("claim flow dropped");
    };

    println!("claimed {} ({})", listing.title, listing.brand);
    println!("code: {}", receipt.code);
    println!("transaction: {}", receipt.transaction_id);
    println!(
        "balance after claim: {}",
        balance.remaining_after(listing.cost)
    );

    if let Some(CreditNotice::Posted { contributor, amount }) = notices.next().await {
        println!("credited {contributor} with {amount} points");
    }

    // Done observing; this also cancels the notice expiry timer.
    flow.close();
}
