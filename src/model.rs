//! Core domain types for the rewards catalog.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::Points;

/// Listing identifier.
pub type ListingId = u32;

/// What a listing delivers when claimed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardKind {
    AccessCode,
    DiscountCode,
    TicketCode,
    PromoCode,
    Subscription,
    Token,
    Nft,
    GiftCard,
}

impl RewardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RewardKind::AccessCode => "access-code",
            RewardKind::DiscountCode => "discount-code",
            RewardKind::TicketCode => "ticket-code",
            RewardKind::PromoCode => "promo-code",
            RewardKind::Subscription => "subscription",
            RewardKind::Token => "token",
            RewardKind::Nft => "nft",
            RewardKind::GiftCard => "gift-card",
        }
    }
}

impl fmt::Display for RewardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reward kind label that matches none of the known kinds.
#[derive(Debug, Error)]
#[error("unknown reward kind '{0}'")]
pub struct UnknownKind(pub String);

impl FromStr for RewardKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "access-code" => Ok(RewardKind::AccessCode),
            "discount-code" => Ok(RewardKind::DiscountCode),
            "ticket-code" => Ok(RewardKind::TicketCode),
            "promo-code" => Ok(RewardKind::PromoCode),
            "subscription" => Ok(RewardKind::Subscription),
            "token" => Ok(RewardKind::Token),
            "nft" => Ok(RewardKind::Nft),
            "gift-card" => Ok(RewardKind::GiftCard),
            other => Err(UnknownKind(other.to_string())),
        }
    }
}

/// Curated display grouping a listing can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFlag {
    Trending,
    Featured,
    HeroFeatured,
    RecentlyAdded,
}

impl SegmentFlag {
    pub const ALL: [SegmentFlag; 4] = [
        SegmentFlag::Trending,
        SegmentFlag::Featured,
        SegmentFlag::HeroFeatured,
        SegmentFlag::RecentlyAdded,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SegmentFlag::Trending => "trending",
            SegmentFlag::Featured => "featured",
            SegmentFlag::HeroFeatured => "hero-featured",
            SegmentFlag::RecentlyAdded => "recently-added",
        }
    }

    fn bit(self) -> u8 {
        match self {
            SegmentFlag::Trending => 1 << 0,
            SegmentFlag::Featured => 1 << 1,
            SegmentFlag::HeroFeatured => 1 << 2,
            SegmentFlag::RecentlyAdded => 1 << 3,
        }
    }
}

impl fmt::Display for SegmentFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A segment label that matches none of the known flags.
#[derive(Debug, Error)]
#[error("unknown segment flag '{0}'")]
pub struct UnknownFlag(pub String);

impl FromStr for SegmentFlag {
    type Err = UnknownFlag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "trending" => Ok(SegmentFlag::Trending),
            "featured" => Ok(SegmentFlag::Featured),
            "hero-featured" => Ok(SegmentFlag::HeroFeatured),
            "recently-added" => Ok(SegmentFlag::RecentlyAdded),
            other => Err(UnknownFlag(other.to_string())),
        }
    }
}

/// Set of segment flags; zero or more apply to a listing simultaneously.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SegmentFlags(u8);

impl SegmentFlags {
    pub const fn none() -> Self {
        SegmentFlags(0)
    }

    pub fn contains(self, flag: SegmentFlag) -> bool {
        self.0 & flag.bit() != 0
    }

    pub fn insert(&mut self, flag: SegmentFlag) {
        self.0 |= flag.bit();
    }

    pub fn with(mut self, flag: SegmentFlag) -> Self {
        self.insert(flag);
        self
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = SegmentFlag> {
        SegmentFlag::ALL
            .into_iter()
            .filter(move |flag| self.contains(*flag))
    }
}

impl FromIterator<SegmentFlag> for SegmentFlags {
    fn from_iter<I: IntoIterator<Item = SegmentFlag>>(iter: I) -> Self {
        let mut flags = SegmentFlags::none();
        for flag in iter {
            flags.insert(flag);
        }
        flags
    }
}

impl fmt::Display for SegmentFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for flag in self.iter() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(flag.as_str())?;
            first = false;
        }
        Ok(())
    }
}

/// A listing violates one of its structural invariants.
#[derive(Debug, Error)]
pub enum ListingError {
    #[error("remaining supply {remaining} exceeds total supply {total}")]
    SupplyExceedsTotal { remaining: u32, total: u32 },

    #[error("claim cost must be positive")]
    ZeroCost,
}

/// One redeemable reward in the catalog.
///
/// Listings are seeded at startup and never mutated by the engine. In
/// particular `remaining_supply` is not decremented on a successful claim;
/// any real supply or balance mutation belongs to the owning caller.
#[derive(Debug, Clone)]
pub struct RewardListing {
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub full_description: String,
    /// Who put the reward up; the display initial derives from this.
    pub contributor: String,
    pub kind: RewardKind,
    pub category: String,
    pub brand: String,
    /// Claim units required to claim; always positive.
    pub cost: Points,
    pub total_supply: u32,
    pub remaining_supply: u32,
    /// Display label such as "14 days"; presence alone matters, never parsed.
    pub expiry_window: Option<String>,
    pub flags: SegmentFlags,
    pub redemption_instructions: String,
    pub terms: String,
    pub delivery_time: String,
}

impl RewardListing {
    /// Check the structural invariants: positive cost and
    /// `remaining_supply <= total_supply`.
    pub fn validate(&self) -> Result<(), ListingError> {
        if self.cost == Points::new(0) {
            return Err(ListingError::ZeroCost);
        }
        if self.remaining_supply > self.total_supply {
            return Err(ListingError::SupplyExceedsTotal {
                remaining: self.remaining_supply,
                total: self.total_supply,
            });
        }
        Ok(())
    }

    pub fn is_in_stock(&self) -> bool {
        self.remaining_supply > 0
    }

    /// Remaining supply as a whole percentage of the total (floored).
    /// A listing with zero total supply reports 0.
    pub fn supply_percent(&self) -> u8 {
        if self.total_supply == 0 {
            return 0;
        }
        ((self.remaining_supply as u64 * 100) / self.total_supply as u64) as u8
    }

    /// Upper-cased first character of the contributor name.
    pub fn contributor_initial(&self) -> Option<char> {
        self.contributor.chars().next().map(|c| c.to_ascii_uppercase())
    }

    pub fn cost_tier(&self) -> CostTier {
        CostTier::from_cost(self.cost)
    }
}

/// Display tier derived from a listing's claim cost.
///
/// The thresholds and colors are display constants; a front end that wants
/// different bands replaces this one function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostTier {
    Starter,
    Standard,
    Premium,
    Elite,
}

impl CostTier {
    pub fn from_cost(cost: Points) -> Self {
        match cost.get() {
            0..=24 => CostTier::Starter,
            25..=99 => CostTier::Standard,
            100..=499 => CostTier::Premium,
            _ => CostTier::Elite,
        }
    }

    /// Accent color name for badges rendered against this tier.
    pub fn color(self) -> &'static str {
        match self {
            CostTier::Starter => "emerald",
            CostTier::Standard => "sky",
            CostTier::Premium => "violet",
            CostTier::Elite => "amber",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing() -> RewardListing {
        RewardListing {
            id: 1,
            title: "Backstage Pass".to_string(),
            description: "One night backstage".to_string(),
            full_description: "Full backstage access for one show".to_string(),
            contributor: "maya".to_string(),
            kind: RewardKind::TicketCode,
            category: "events".to_string(),
            brand: "Velvet Hall".to_string(),
            cost: Points::new(120),
            total_supply: 20,
            remaining_supply: 5,
            expiry_window: Some("14 days".to_string()),
            flags: SegmentFlags::none().with(SegmentFlag::Featured),
            redemption_instructions: "Show the code at the door".to_string(),
            terms: "Non-transferable".to_string(),
            delivery_time: "instant".to_string(),
        }
    }

    #[test]
    fn kind_labels_roundtrip() {
        for kind in [
            RewardKind::AccessCode,
            RewardKind::DiscountCode,
            RewardKind::TicketCode,
            RewardKind::PromoCode,
            RewardKind::Subscription,
            RewardKind::Token,
            RewardKind::Nft,
            RewardKind::GiftCard,
        ] {
            assert_eq!(kind.as_str().parse::<RewardKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_kind_label_is_rejected() {
        let err = "voucher".parse::<RewardKind>().unwrap_err();
        assert_eq!(err.to_string(), "unknown reward kind 'voucher'");
    }

    #[test]
    fn flag_labels_roundtrip() {
        for flag in SegmentFlag::ALL {
            assert_eq!(flag.as_str().parse::<SegmentFlag>().unwrap(), flag);
        }
    }

    #[test]
    fn flags_set_operations() {
        let mut flags = SegmentFlags::none();
        assert!(flags.is_empty());

        flags.insert(SegmentFlag::Trending);
        flags.insert(SegmentFlag::HeroFeatured);
        assert!(flags.contains(SegmentFlag::Trending));
        assert!(flags.contains(SegmentFlag::HeroFeatured));
        assert!(!flags.contains(SegmentFlag::Featured));

        let collected: Vec<_> = flags.iter().collect();
        assert_eq!(
            collected,
            vec![SegmentFlag::Trending, SegmentFlag::HeroFeatured]
        );
    }

    #[test]
    fn flags_display_pipe_joined() {
        let flags: SegmentFlags = [SegmentFlag::Featured, SegmentFlag::RecentlyAdded]
            .into_iter()
            .collect();
        assert_eq!(flags.to_string(), "featured|recently-added");
        assert_eq!(SegmentFlags::none().to_string(), "");
    }

    #[test]
    fn validate_accepts_well_formed_listing() {
        assert!(listing().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_cost() {
        let mut bad = listing();
        bad.cost = Points::new(0);
        assert!(matches!(bad.validate(), Err(ListingError::ZeroCost)));
    }

    #[test]
    fn validate_rejects_remaining_over_total() {
        let mut bad = listing();
        bad.remaining_supply = 21;
        assert!(matches!(
            bad.validate(),
            Err(ListingError::SupplyExceedsTotal {
                remaining: 21,
                total: 20
            })
        ));
    }

    #[test]
    fn stock_and_supply_percent() {
        let l = listing();
        assert!(l.is_in_stock());
        assert_eq!(l.supply_percent(), 25);

        let mut empty = listing();
        empty.remaining_supply = 0;
        assert!(!empty.is_in_stock());
        assert_eq!(empty.supply_percent(), 0);
    }

    #[test]
    fn supply_percent_zero_total_is_zero() {
        let mut l = listing();
        l.total_supply = 0;
        l.remaining_supply = 0;
        assert_eq!(l.supply_percent(), 0);
    }

    #[test]
    fn supply_percent_floors() {
        let mut l = listing();
        l.total_supply = 3;
        l.remaining_supply = 2;
        assert_eq!(l.supply_percent(), 66);
    }

    #[test]
    fn contributor_initial_uppercases() {
        assert_eq!(listing().contributor_initial(), Some('M'));

        let mut anon = listing();
        anon.contributor = String::new();
        assert_eq!(anon.contributor_initial(), None);
    }

    #[test]
    fn cost_tier_bands() {
        assert_eq!(CostTier::from_cost(Points::new(1)), CostTier::Starter);
        assert_eq!(CostTier::from_cost(Points::new(24)), CostTier::Starter);
        assert_eq!(CostTier::from_cost(Points::new(25)), CostTier::Standard);
        assert_eq!(CostTier::from_cost(Points::new(99)), CostTier::Standard);
        assert_eq!(CostTier::from_cost(Points::new(100)), CostTier::Premium);
        assert_eq!(CostTier::from_cost(Points::new(499)), CostTier::Premium);
        assert_eq!(CostTier::from_cost(Points::new(500)), CostTier::Elite);
    }

    #[test]
    fn cost_tier_colors() {
        assert_eq!(CostTier::Starter.color(), "emerald");
        assert_eq!(CostTier::Standard.color(), "sky");
        assert_eq!(CostTier::Premium.color(), "violet");
        assert_eq!(CostTier::Elite.color(), "amber");
    }
}
