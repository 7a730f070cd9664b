//! Resolution rules: from accumulated proposals to one winning colour.
//!
//! Both rules are pure functions over the projection's visible (ascending
//! timestamp) order, re-derived on every query. No tally state is kept
//! anywhere else. Each rule is a named policy type so product intent can
//! be revisited without re-deriving behavior from the ledger.

use crate::projection::Projection;
use fresco_records::{Colour, Location, Purchase, Vote};
use std::collections::HashMap;

/// Plurality vote: the colour with the strictly highest vote count wins.
///
/// Tie-break: the current leader is only displaced by a *strictly* greater
/// count, so among colours that end on the same count, the one that
/// reached it earliest in timestamp order wins. Deterministic and
/// reproducible across runs.
pub struct PluralityPolicy;

impl PluralityPolicy {
    /// Winning colour at a location, or `None` with no votes there.
    ///
    /// `votes` must arrive in ascending timestamp order.
    pub fn resolve<'a, I>(votes: I, location: &Location) -> Option<Colour>
    where
        I: IntoIterator<Item = &'a Vote>,
    {
        let mut counts: HashMap<Colour, u32> = HashMap::new();
        let mut winner: Option<(Colour, u32)> = None;
        for vote in votes {
            if vote.location != *location {
                continue;
            }
            let count = counts.entry(vote.colour).or_insert(0);
            *count += 1;
            match winner {
                Some((_, best)) if *count <= best => {}
                _ => winner = Some((vote.colour, *count)),
            }
        }
        winner.map(|(colour, _)| colour)
    }
}

/// Auction by strictly-increasing repeat bid.
///
/// The first bid for a colour at a location only registers that colour's
/// baseline price - it never takes ownership. A later bid in the *same*
/// colour takes ownership when its price strictly exceeds the colour's
/// registered price, which is then updated.
///
/// The first-bid-never-wins asymmetry is preserved deliberately: it is the
/// observed behavior of the system this rule was derived from, and may be
/// an artifact of its control flow rather than intended market design.
/// Revisit here, in one place, if product intent changes.
pub struct EscalatingBidPolicy;

impl EscalatingBidPolicy {
    /// Owning colour at a location, or `None` if no bid ever escalated.
    ///
    /// `purchases` must arrive in ascending timestamp order.
    pub fn resolve<'a, I>(purchases: I, location: &Location) -> Option<Colour>
    where
        I: IntoIterator<Item = &'a Purchase>,
    {
        let mut registered: HashMap<Colour, u32> = HashMap::new();
        let mut owner: Option<Colour> = None;
        for purchase in purchases {
            if purchase.location != *location {
                continue;
            }
            match registered.get_mut(&purchase.colour) {
                None => {
                    registered.insert(purchase.colour, purchase.price);
                }
                Some(price) if purchase.price > *price => {
                    owner = Some(purchase.colour);
                    *price = purchase.price;
                }
                Some(_) => {}
            }
        }
        owner
    }
}

/// All purchases in a projection authored by one alias, in visible order.
///
/// Settlement support; resolution never consults the author.
pub fn purchases_by<'a>(
    projection: &'a Projection<Purchase>,
    creator: &'a str,
) -> impl Iterator<Item = &'a Purchase> + 'a {
    projection
        .iter()
        .filter_map(move |(_, entry, purchase)| (entry.creator() == creator).then_some(purchase))
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Colour = Colour::opaque(255, 0, 0);
    const BLUE: Colour = Colour::opaque(0, 0, 255);
    const GREEN: Colour = Colour::opaque(0, 255, 0);

    const HERE: Location = Location::cell(1, 1, 0);
    const ELSEWHERE: Location = Location::cell(2, 2, 0);

    fn votes(sequence: &[(Location, Colour)]) -> Vec<Vote> {
        sequence.iter().map(|&(l, c)| Vote::new(l, c)).collect()
    }

    #[test]
    fn plurality_picks_the_strict_majority() {
        let votes = votes(&[
            (HERE, RED),
            (HERE, BLUE),
            (HERE, RED),
            (HERE, BLUE),
            (HERE, RED),
        ]);
        assert_eq!(PluralityPolicy::resolve(&votes, &HERE), Some(RED));
    }

    #[test]
    fn plurality_ignores_other_locations() {
        let votes = votes(&[(ELSEWHERE, BLUE), (ELSEWHERE, BLUE), (HERE, RED)]);
        assert_eq!(PluralityPolicy::resolve(&votes, &HERE), Some(RED));
        assert_eq!(PluralityPolicy::resolve(&votes, &ELSEWHERE), Some(BLUE));
    }

    #[test]
    fn plurality_no_votes_no_winner() {
        assert_eq!(PluralityPolicy::resolve(&[], &HERE), None);
    }

    #[test]
    fn plurality_tie_goes_to_the_earliest_leader() {
        // red and blue both end on two votes; red reached two first.
        let tied = votes(&[(HERE, RED), (HERE, BLUE), (HERE, RED), (HERE, BLUE)]);
        assert_eq!(PluralityPolicy::resolve(&tied, &HERE), Some(RED));

        // Same multiset, blue first: the tie flips with the order.
        let flipped = votes(&[(HERE, BLUE), (HERE, RED), (HERE, BLUE), (HERE, RED)]);
        assert_eq!(PluralityPolicy::resolve(&flipped, &HERE), Some(BLUE));

        // Reproducible across repeated runs.
        for _ in 0..100 {
            assert_eq!(PluralityPolicy::resolve(&tied, &HERE), Some(RED));
        }
    }

    #[test]
    fn plurality_distinguishes_w_coordinate() {
        let frame0 = Location::new(0, 1, 1, 0);
        let frame1 = Location::new(1, 1, 1, 0);
        let votes = votes(&[(frame0, RED), (frame1, BLUE)]);
        assert_eq!(PluralityPolicy::resolve(&votes, &frame0), Some(RED));
        assert_eq!(PluralityPolicy::resolve(&votes, &frame1), Some(BLUE));
    }

    fn purchases(sequence: &[(Colour, u32)]) -> Vec<Purchase> {
        sequence.iter().map(|&(c, price)| Purchase::new(HERE, c, price, 0)).collect()
    }

    #[test]
    fn auction_walkthrough() {
        // The canonical scenario: red@10, blue@5, red@12, blue@20.
        let bids = purchases(&[(RED, 10), (BLUE, 5), (RED, 12), (BLUE, 20)]);

        // After each prefix the owner is: none, none, red, blue.
        assert_eq!(EscalatingBidPolicy::resolve(&bids[..1], &HERE), None);
        assert_eq!(EscalatingBidPolicy::resolve(&bids[..2], &HERE), None);
        assert_eq!(EscalatingBidPolicy::resolve(&bids[..3], &HERE), Some(RED));
        assert_eq!(EscalatingBidPolicy::resolve(&bids[..4], &HERE), Some(BLUE));
    }

    #[test]
    fn auction_first_bid_never_wins() {
        let bids = purchases(&[(GREEN, 1_000_000)]);
        assert_eq!(EscalatingBidPolicy::resolve(&bids, &HERE), None);
    }

    #[test]
    fn auction_requires_strict_increase() {
        // An equal repeat bid neither wins nor re-registers.
        let bids = purchases(&[(RED, 10), (RED, 10)]);
        assert_eq!(EscalatingBidPolicy::resolve(&bids, &HERE), None);

        let bids = purchases(&[(RED, 10), (RED, 9), (RED, 11)]);
        assert_eq!(EscalatingBidPolicy::resolve(&bids, &HERE), Some(RED));
    }

    #[test]
    fn auction_ownership_sticks_until_outbid() {
        // blue escalates its own colour but never re-escalates after red.
        let bids = purchases(&[(RED, 5), (RED, 8), (BLUE, 100)]);
        assert_eq!(EscalatingBidPolicy::resolve(&bids, &HERE), Some(RED));
    }

    #[test]
    fn auction_tax_is_ignored() {
        let mut bids = purchases(&[(RED, 10), (RED, 12)]);
        bids[1].tax = 999;
        assert_eq!(EscalatingBidPolicy::resolve(&bids, &HERE), Some(RED));
    }

    #[test]
    fn purchases_by_filters_on_creator() {
        use fresco_ledger::{Entry, Identity};
        use fresco_records::Payload;

        let alice = Identity::generate("alice");
        let bob = Identity::generate("bob");
        let mut projection = Projection::<Purchase>::new();
        for (timestamp, identity, price) in [(1u64, &alice, 10), (2, &bob, 20), (3, &alice, 30)] {
            let purchase = Purchase::new(HERE, RED, price, 0);
            let entry = Entry::new(identity.sign_at(timestamp, purchase.encode().unwrap()));
            projection.absorb(&entry).unwrap();
        }
        projection.reorder();

        let prices: Vec<u32> = purchases_by(&projection, "alice").map(|p| p.price).collect();
        assert_eq!(prices, vec![10, 30]);
        assert_eq!(purchases_by(&projection, "carol").count(), 0);
    }
}
