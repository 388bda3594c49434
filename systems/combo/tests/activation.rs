use std::time::Duration;

use pokershot_core::{Card, Command, Event, GameConfig, HandType, Rank, Suit, Vec2};
use pokershot_system_combo::Combo;
use pokershot_world::{self as world, query, World};

fn started_world() -> World {
    let mut world = World::new(GameConfig::default()).expect("default config is valid");
    let mut events = Vec::new();
    world::apply(&mut world, Command::StartRun, &mut events);
    world
}

fn collect(world: &mut World, cards: &[Card]) {
    let mut events = Vec::new();
    for card in cards {
        world::apply(
            world,
            Command::DropChip {
                position: Vec2::ZERO,
                card: Some(*card),
            },
            &mut events,
        );
    }
    world::apply(
        world,
        Command::Tick {
            dt: Duration::from_millis(16),
        },
        &mut events,
    );
}

fn activate(world: &mut World, combo: &mut Combo) -> Vec<Event> {
    let mut log = Vec::new();
    let mut events = Vec::new();
    world::apply(world, Command::ActivateHand, &mut events);

    while !events.is_empty() {
        log.extend(events.iter().cloned());
        let mut commands = Vec::new();
        combo.handle(&events, &mut commands);
        events.clear();
        for command in commands {
            world::apply(world, command, &mut events);
        }
    }
    log
}

#[test]
fn short_hand_scores_high_card_and_recycles_chips() {
    let mut world = started_world();
    let mut combo = Combo::new(query::config(&world).combo.clone());
    let pooled = query::pooled_chips(&world);
    collect(
        &mut world,
        &[
            Card::new(Rank::King, Suit::Clubs),
            Card::new(Rank::King, Suit::Hearts),
        ],
    );
    assert_eq!(query::pooled_chips(&world), pooled - 2);

    let log = activate(&mut world, &mut combo);

    assert!(log.contains(&Event::ComboActivated {
        hand_type: HandType::HighCard,
        multiplier: 1,
        label: "High Card",
    }));
    assert_eq!(query::pooled_chips(&world), pooled);
    assert!(query::hand(&world).is_empty());
}

#[test]
fn full_hand_pair_applies_the_boost() {
    let mut world = started_world();
    let mut combo = Combo::new(query::config(&world).combo.clone());
    collect(
        &mut world,
        &[
            Card::new(Rank::King, Suit::Clubs),
            Card::new(Rank::King, Suit::Hearts),
            Card::new(Rank::Two, Suit::Spades),
            Card::new(Rank::Seven, Suit::Diamonds),
            Card::new(Rank::Nine, Suit::Clubs),
        ],
    );

    let log = activate(&mut world, &mut combo);

    assert!(log.contains(&Event::ComboActivated {
        hand_type: HandType::Pair,
        multiplier: 2,
        label: "Pair",
    }));
    assert!(log
        .iter()
        .any(|event| matches!(event, Event::DamageBoostApplied { multiplier, .. } if *multiplier == 2.0)));
    let player = query::player(&world).expect("player exists");
    assert_eq!(player.damage_multiplier, 2.0);
    assert_eq!(player.activation_ready_in, Duration::from_secs(9));
}

#[test]
fn second_activation_waits_for_the_cooldown() {
    let mut world = started_world();
    let mut combo = Combo::new(query::config(&world).combo.clone());
    let pair = [
        Card::new(Rank::Four, Suit::Clubs),
        Card::new(Rank::Four, Suit::Hearts),
    ];
    collect(&mut world, &pair);
    let _ = activate(&mut world, &mut combo);

    collect(&mut world, &pair);
    let log = activate(&mut world, &mut combo);

    assert!(matches!(
        log.as_slice(),
        [Event::ActivationRejected {
            reason: pokershot_core::ActivationError::CoolingDown { .. }
        }]
    ));
    assert_eq!(query::hand(&world).len(), 2);
}
