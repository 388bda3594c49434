//! Playing-card identities carried by chips and the poker categories they form.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of chips that form a complete poker hand.
pub const HAND_SIZE: usize = 5;

/// Card suit printed on a chip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    /// ♥
    Hearts,
    /// ♦
    Diamonds,
    /// ♣
    Clubs,
    /// ♠
    Spades,
}

impl Suit {
    /// Every suit in declaration order.
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    /// Glyph used when printing the suit.
    #[must_use]
    pub const fn symbol(self) -> char {
        match self {
            Self::Hearts => '♥',
            Self::Diamonds => '♦',
            Self::Clubs => '♣',
            Self::Spades => '♠',
        }
    }
}

/// Card rank printed on a chip. Aces are always high.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    /// 2
    Two = 2,
    /// 3
    Three,
    /// 4
    Four,
    /// 5
    Five,
    /// 6
    Six,
    /// 7
    Seven,
    /// 8
    Eight,
    /// 9
    Nine,
    /// 10
    Ten,
    /// J
    Jack,
    /// Q
    Queen,
    /// K
    King,
    /// A
    Ace,
}

impl Rank {
    /// Every rank from lowest to highest.
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    /// Numeric value of the rank in the range `2..=14`.
    #[must_use]
    pub const fn value(self) -> u8 {
        self as u8
    }

    /// Resolves a numeric value in the range `2..=14` into a rank.
    #[must_use]
    pub fn from_value(value: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|rank| rank.value() == value)
    }

    const fn glyph(self) -> char {
        match self {
            Self::Two => '2',
            Self::Three => '3',
            Self::Four => '4',
            Self::Five => '5',
            Self::Six => '6',
            Self::Seven => '7',
            Self::Eight => '8',
            Self::Nine => '9',
            Self::Ten => 'T',
            Self::Jack => 'J',
            Self::Queen => 'Q',
            Self::King => 'K',
            Self::Ace => 'A',
        }
    }
}

/// Suit and rank pair. Immutable once assigned; pooled chips receive a fresh
/// card every time they are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    suit: Suit,
    rank: Rank,
}

impl Card {
    /// Creates a card from its rank and suit.
    #[must_use]
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { suit, rank }
    }

    /// Suit of the card.
    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.suit
    }

    /// Rank of the card.
    #[must_use]
    pub const fn rank(&self) -> Rank {
        self.rank
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.glyph(), self.suit.symbol())
    }
}

/// Poker categories ordered from weakest to strongest.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum HandType {
    /// No other category matched.
    HighCard,
    /// One pair of matching ranks.
    Pair,
    /// Exactly two distinct pairs.
    TwoPair,
    /// Three cards of one rank.
    ThreeOfAKind,
    /// Five consecutive ranks, ace high only.
    Straight,
    /// Five cards of one suit.
    Flush,
    /// A triple and a pair.
    FullHouse,
    /// Four cards of one rank.
    FourOfAKind,
    /// Straight and flush at once.
    StraightFlush,
    /// Ten to ace straight flush.
    RoyalFlush,
}

impl HandType {
    /// Damage multiplier awarded for the category.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Self::HighCard => 1,
            Self::Pair | Self::TwoPair => 2,
            Self::ThreeOfAKind => 3,
            Self::Straight => 4,
            Self::Flush => 5,
            Self::FullHouse => 6,
            Self::FourOfAKind => 7,
            Self::StraightFlush => 8,
            Self::RoyalFlush => 10,
        }
    }

    /// Human readable name of the category.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::HighCard => "High Card",
            Self::Pair => "Pair",
            Self::TwoPair => "Two Pair",
            Self::ThreeOfAKind => "Three of a Kind",
            Self::Straight => "Straight",
            Self::Flush => "Flush",
            Self::FullHouse => "Full House",
            Self::FourOfAKind => "Four of a Kind",
            Self::StraightFlush => "Straight Flush",
            Self::RoyalFlush => "Royal Flush",
        }
    }
}

/// Outcome of scoring a hand. Derived on every evaluation and never stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandResult {
    /// Category the hand fell into.
    pub hand_type: HandType,
    /// Damage multiplier awarded for the category.
    pub multiplier: u32,
    /// Human readable name of the category.
    pub label: &'static str,
}

impl HandResult {
    /// Builds the result describing the provided category.
    #[must_use]
    pub const fn of(hand_type: HandType) -> Self {
        Self {
            hand_type,
            multiplier: hand_type.multiplier(),
            label: hand_type.label(),
        }
    }
}

impl fmt::Display for HandResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (x{})", self.label, self.multiplier)
    }
}
