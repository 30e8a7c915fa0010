use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::cards::{all_suits, Card, Rank};
use crate::errors::GameError;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub enum Category {
    HighCard = 0,
    OnePair = 1,
    TwoPair = 2,
    ThreeOfAKind = 3,
    Straight = 4,
    Flush = 5,
    FullHouse = 6,
    FourOfAKind = 7,
    StraightFlush = 8,
    RoyalFlush = 9,
}

impl Category {
    /// Rank class 0..=9, higher is stronger.
    pub fn class(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Category::HighCard => "High Card",
            Category::OnePair => "One Pair",
            Category::TwoPair => "Two Pair",
            Category::ThreeOfAKind => "Three of a Kind",
            Category::Straight => "Straight",
            Category::Flush => "Flush",
            Category::FullHouse => "Full House",
            Category::FourOfAKind => "Four of a Kind",
            Category::StraightFlush => "Straight Flush",
            Category::RoyalFlush => "Royal Flush",
        }
    }
}

/// Result of evaluating a hand: its category plus the five cards that make
/// it, ordered from most to least decisive for tie-breaks.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct HandStrength {
    pub category: Category,
    pub best5: [Card; 5],
}

impl HandStrength {
    pub fn rank_values(&self) -> [u8; 5] {
        self.best5.map(|c| c.value())
    }

    pub fn describe(&self) -> String {
        let cards: Vec<String> = self.best5.iter().map(|c| c.to_string()).collect();
        format!("{} ({})", self.category.name(), cards.join(" "))
    }
}

/// Evaluates hole cards plus whatever part of the board is out.
pub fn evaluate(hole: &[Card], board: &[Card]) -> Result<HandStrength, GameError> {
    let mut cards = Vec::with_capacity(hole.len() + board.len());
    cards.extend_from_slice(hole);
    cards.extend_from_slice(board);
    evaluate_hand(&cards)
}

/// Best five-card hand out of 5 to 7 cards.
///
/// Categories are tried strongest first and the first match wins:
/// straight flush, quads, full house, flush, straight, trips, two pair,
/// one pair, high card.
pub fn evaluate_hand(cards: &[Card]) -> Result<HandStrength, GameError> {
    if !(5..=7).contains(&cards.len()) {
        return Err(GameError::InvalidCardCount(cards.len()));
    }

    // high -> low; stable so equal ranks keep input order
    let mut sorted = cards.to_vec();
    sorted.sort_by(|a, b| b.rank.cmp(&a.rank));

    let suited = flush_cards(&sorted);

    if let Some(sf) = suited.as_deref().and_then(find_straight) {
        let category = if sf[0].rank == Rank::Ace {
            Category::RoyalFlush
        } else {
            Category::StraightFlush
        };
        return Ok(HandStrength { category, best5: sf });
    }

    let groups = rank_groups(&sorted);

    if let Some(best5) = n_of_a_kind(&sorted, &groups, 4) {
        return Ok(strength(Category::FourOfAKind, best5));
    }

    if let Some(best5) = full_house(&groups) {
        return Ok(strength(Category::FullHouse, best5));
    }

    if let Some(best5) = suited.and_then(|s| top_five(&s)) {
        return Ok(strength(Category::Flush, best5));
    }

    if let Some(best5) = find_straight(&sorted) {
        return Ok(strength(Category::Straight, best5));
    }

    if let Some(best5) = n_of_a_kind(&sorted, &groups, 3) {
        return Ok(strength(Category::ThreeOfAKind, best5));
    }

    if let Some(best5) = two_pair(&sorted, &groups) {
        return Ok(strength(Category::TwoPair, best5));
    }

    if let Some(best5) = n_of_a_kind(&sorted, &groups, 2) {
        return Ok(strength(Category::OnePair, best5));
    }

    top_five(&sorted)
        .map(|best5| strength(Category::HighCard, best5))
        .ok_or(GameError::InvalidCardCount(cards.len()))
}

/// Total order over evaluated hands: category first, then the best five
/// cards by rank value, position by position.
pub fn compare_hands(a: &HandStrength, b: &HandStrength) -> Ordering {
    match a.category.cmp(&b.category) {
        Ordering::Equal => a.rank_values().cmp(&b.rank_values()),
        ord => ord,
    }
}

fn strength(category: Category, best5: [Card; 5]) -> HandStrength {
    HandStrength { category, best5 }
}

fn top_five(sorted: &[Card]) -> Option<[Card; 5]> {
    sorted.get(..5).and_then(|s| <[Card; 5]>::try_from(s).ok())
}

/// Cards of the first suit holding five or more, high -> low.
fn flush_cards(sorted: &[Card]) -> Option<Vec<Card>> {
    all_suits().into_iter().find_map(|suit| {
        let same: Vec<Card> = sorted.iter().copied().filter(|c| c.suit == suit).collect();
        (same.len() >= 5).then_some(same)
    })
}

/// Highest straight in `sorted` (high -> low). The wheel comes back as
/// 5-4-3-2-A so the five leads comparisons.
fn find_straight(sorted: &[Card]) -> Option<[Card; 5]> {
    let mut unique: Vec<Card> = Vec::with_capacity(sorted.len());
    for &c in sorted {
        if unique.last().map_or(true, |u: &Card| u.rank != c.rank) {
            unique.push(c);
        }
    }

    for window in unique.windows(5) {
        if window[0].value() - window[4].value() == 4 {
            return <[Card; 5]>::try_from(window).ok();
        }
    }

    let find = |rank: Rank| unique.iter().copied().find(|c| c.rank == rank);
    Some([
        find(Rank::Five)?,
        find(Rank::Four)?,
        find(Rank::Three)?,
        find(Rank::Two)?,
        find(Rank::Ace)?,
    ])
}

/// Runs of equal rank, highest rank first.
fn rank_groups(sorted: &[Card]) -> Vec<Vec<Card>> {
    let mut groups: Vec<Vec<Card>> = Vec::new();
    for &c in sorted {
        match groups.last_mut() {
            Some(g) if g[0].rank == c.rank => g.push(c),
            _ => groups.push(vec![c]),
        }
    }
    groups
}

fn n_of_a_kind(sorted: &[Card], groups: &[Vec<Card>], n: usize) -> Option<[Card; 5]> {
    let group = groups.iter().find(|g| g.len() == n)?;
    let rank = group[0].rank;
    let mut hand = group.clone();
    hand.extend(sorted.iter().copied().filter(|c| c.rank != rank).take(5 - n));
    <[Card; 5]>::try_from(hand).ok()
}

fn full_house(groups: &[Vec<Card>]) -> Option<[Card; 5]> {
    let trips = groups.iter().find(|g| g.len() == 3)?;
    let pair = groups
        .iter()
        .find(|g| g.len() >= 2 && g[0].rank != trips[0].rank)?;
    let mut hand = trips.clone();
    hand.extend_from_slice(&pair[..2]);
    <[Card; 5]>::try_from(hand).ok()
}

fn two_pair(sorted: &[Card], groups: &[Vec<Card>]) -> Option<[Card; 5]> {
    let mut pairs = groups.iter().filter(|g| g.len() == 2);
    let high = pairs.next()?;
    let low = pairs.next()?;
    let kicker = sorted
        .iter()
        .copied()
        .find(|c| c.rank != high[0].rank && c.rank != low[0].rank)?;
    let mut hand = high.clone();
    hand.extend_from_slice(low);
    hand.push(kicker);
    <[Card; 5]>::try_from(hand).ok()
}
