#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Poker hand scoring and the combo effects it unlocks.
//!
//! [`evaluate`] ranks a hand, [`resolve`] turns the ranking into a gameplay
//! effect, and [`Combo`] wires both into the command loop by answering every
//! hand activation with a [`Command::ApplyCombo`].

use pokershot_core::{
    Card, ComboConfig, ComboEffect, Command, Event, HandResult, HandType, Rank, HAND_SIZE,
};
use tracing::debug;

/// Scores a hand of exactly five cards.
///
/// Categories are tried from strongest to weakest and the first match wins.
/// Aces are always high, so `A-2-3-4-5` is not a straight. Hands of any
/// other size score as [`HandType::HighCard`].
#[must_use]
pub fn evaluate(cards: &[Card]) -> HandResult {
    if cards.len() != HAND_SIZE {
        return HandResult::of(HandType::HighCard);
    }

    let mut ranks: Vec<Rank> = cards.iter().map(Card::rank).collect();
    ranks.sort_unstable_by(|a, b| b.cmp(a));

    let suit = cards[0].suit();
    let is_flush = cards.iter().all(|card| card.suit() == suit);
    let is_straight = ranks
        .windows(2)
        .all(|pair| pair[0].value() == pair[1].value() + 1);
    let is_royal = is_straight && ranks[0] == Rank::Ace && ranks[ranks.len() - 1] == Rank::Ten;

    let mut counts = [0_u8; 15];
    for rank in &ranks {
        counts[rank.value() as usize] += 1;
    }
    let has_quad = counts.contains(&4);
    let has_triple = counts.contains(&3);
    let pairs = counts.iter().filter(|count| **count == 2).count();

    let hand_type = if is_royal && is_flush {
        HandType::RoyalFlush
    } else if is_straight && is_flush {
        HandType::StraightFlush
    } else if has_quad {
        HandType::FourOfAKind
    } else if has_triple && pairs > 0 {
        HandType::FullHouse
    } else if is_flush {
        HandType::Flush
    } else if is_straight {
        HandType::Straight
    } else if has_triple {
        HandType::ThreeOfAKind
    } else if pairs == 2 {
        HandType::TwoPair
    } else if pairs == 1 {
        HandType::Pair
    } else {
        HandType::HighCard
    };
    HandResult::of(hand_type)
}

/// Maps a scored hand to its gameplay effect, if the category has one.
#[must_use]
pub fn resolve(result: &HandResult, config: &ComboConfig) -> Option<ComboEffect> {
    match result.hand_type {
        HandType::Pair => Some(ComboEffect::DamageBoost {
            multiplier: config.pair_damage_multiplier,
            duration: config.pair_duration(),
        }),
        HandType::ThreeOfAKind => Some(ComboEffect::AreaDamage {
            radius: config.area_radius,
            damage: config.area_damage,
        }),
        HandType::Flush => Some(ComboEffect::Heal {
            amount: config.flush_heal,
        }),
        HandType::RoyalFlush => Some(ComboEffect::ArenaWipe {
            damage: config.wipe_damage,
        }),
        HandType::HighCard
        | HandType::TwoPair
        | HandType::Straight
        | HandType::FullHouse
        | HandType::FourOfAKind
        | HandType::StraightFlush => None,
    }
}

/// Pure system that scores activated hands and requests their combos.
#[derive(Debug)]
pub struct Combo {
    config: ComboConfig,
}

impl Combo {
    /// Creates the system with the combo tuning of the run.
    #[must_use]
    pub fn new(config: ComboConfig) -> Self {
        Self { config }
    }

    /// Emits `Command::ApplyCombo` for every hand activation in `events`.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            let Event::HandActivated { cards } = event else {
                continue;
            };
            let result = evaluate(cards);
            let effect = resolve(&result, &self.config);
            debug!(hand = %result, ?effect, "hand scored");
            out.push(Command::ApplyCombo { result, effect });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pokershot_core::Suit;

    fn card(rank: Rank, suit: Suit) -> Card {
        Card::new(rank, suit)
    }

    #[test]
    fn pair_grants_a_temporary_damage_boost() {
        let config = ComboConfig::default();
        let effect = resolve(&HandResult::of(HandType::Pair), &config);
        assert_eq!(
            effect,
            Some(ComboEffect::DamageBoost {
                multiplier: 2.0,
                duration: config.pair_duration(),
            })
        );
    }

    #[test]
    fn categories_without_effects_resolve_to_nothing() {
        let config = ComboConfig::default();
        for hand_type in [
            HandType::HighCard,
            HandType::TwoPair,
            HandType::Straight,
            HandType::FullHouse,
            HandType::FourOfAKind,
            HandType::StraightFlush,
        ] {
            assert_eq!(resolve(&HandResult::of(hand_type), &config), None);
        }
    }

    #[test]
    fn royal_flush_wipes_the_arena() {
        let config = ComboConfig::default();
        assert_eq!(
            resolve(&HandResult::of(HandType::RoyalFlush), &config),
            Some(ComboEffect::ArenaWipe { damage: 9_999.0 })
        );
    }

    #[test]
    fn system_answers_each_activation() {
        let mut combo = Combo::new(ComboConfig::default());
        let flush = vec![
            card(Rank::Two, Suit::Hearts),
            card(Rank::Six, Suit::Hearts),
            card(Rank::Nine, Suit::Hearts),
            card(Rank::Jack, Suit::Hearts),
            card(Rank::King, Suit::Hearts),
        ];
        let mut out = Vec::new();
        combo.handle(
            &[
                Event::HandChanged { size: 0 },
                Event::HandActivated { cards: flush },
            ],
            &mut out,
        );

        assert_eq!(
            out,
            vec![Command::ApplyCombo {
                result: HandResult::of(HandType::Flush),
                effect: Some(ComboEffect::Heal { amount: 25.0 }),
            }]
        );
    }
}
