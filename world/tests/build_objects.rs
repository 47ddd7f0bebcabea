use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rune_hall_core::{EnchantmentKind, Event, GameTime, HallName, ObjectId, PixelPoint};
use rune_hall_world::{
    BuildObject, BuildObjectRegistry, ClickOutcome, Player, RegistryError, RuneRelocator,
};

const EARTH_DOCUMENT: &str = r#"{
    "EARTH": [
        {"x": 0, "y": 0, "objectType": "box", "hasRune": false},
        {"x": 1, "y": 1, "objectType": "chest", "hasRune": false}
    ]
}"#;

#[test]
fn loading_earth_document_picks_exactly_one_holder() {
    let mut registry = BuildObjectRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    let report = registry
        .load_from_json(Some(EARTH_DOCUMENT), &mut rng)
        .expect("document parses");

    assert_eq!(report.objects, 2);
    assert!(report.skipped_halls.is_empty());
    let earth = registry.objects_for_hall(HallName::Earth);
    assert_eq!(earth.len(), 2);
    assert_eq!(earth.iter().filter(|object| object.has_rune()).count(), 1);
    let holder = registry.rune_holder().expect("holder assigned");
    assert_eq!(holder.hall(), HallName::Earth);
    assert_eq!(report.rune_holder, Some(holder));
    assert!(registry.objects_for_hall(HallName::Air).is_empty());
    assert_eq!(registry.check_invariant(), Ok(()));
}

#[test]
fn hall_keys_match_case_insensitively_and_unknown_keys_are_skipped() {
    let document = r#"{
        "earth": [{"x": 3, "y": 4, "objectType": "pillar", "hasRune": false}],
        "Lava": [{"x": 1, "y": 1, "objectType": "box", "hasRune": false}]
    }"#;
    let mut registry = BuildObjectRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    let report = registry
        .load_from_json(Some(document), &mut rng)
        .expect("document parses");

    assert_eq!(report.skipped_halls, vec!["Lava".to_owned()]);
    assert_eq!(report.objects, 1);
    assert_eq!(registry.objects_for_hall(HallName::Earth).len(), 1);
    assert_eq!(
        registry.rune_holder(),
        Some(ObjectId::new(HallName::Earth, 0))
    );
}

#[test]
fn rune_flags_in_the_document_are_replaced_by_a_single_draw() {
    let document = r#"{
        "EARTH": [
            {"x": 0, "y": 0, "objectType": "box", "hasRune": true},
            {"x": 1, "y": 0, "objectType": "box", "hasRune": true}
        ],
        "FIRE": [{"x": 2, "y": 2, "objectType": "brazier", "hasRune": true}]
    }"#;
    let mut registry = BuildObjectRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    let _ = registry
        .load_from_json(Some(document), &mut rng)
        .expect("document parses");

    assert_eq!(registry.check_invariant(), Ok(()));
    assert!(!registry.objects_for_hall(HallName::Fire)[0].has_rune());
}

#[test]
fn malformed_document_resets_to_empty_registry() {
    let mut registry = BuildObjectRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let _ = registry
        .load_from_json(Some(EARTH_DOCUMENT), &mut rng)
        .expect("document parses");

    let result = registry.load_from_json(Some("{\"EARTH\": [oops"), &mut rng);

    assert!(matches!(result, Err(RegistryError::MalformedJson(_))));
    assert!(registry.objects_for_hall(HallName::Earth).is_empty());
    assert_eq!(registry.rune_holder(), None);
    assert_eq!(registry.check_invariant(), Ok(()));
}

#[test]
fn empty_and_null_documents_reset_the_registry() {
    let mut rng = ChaCha8Rng::seed_from_u64(4);
    for input in [None, Some(""), Some("   "), Some("null")] {
        let mut registry = BuildObjectRegistry::new();
        let _ = registry.add_object(HallName::Earth, BuildObject::new(0, 0, "box"));
        let report = registry
            .load_from_json(input, &mut rng)
            .expect("empty input is not an error");
        assert_eq!(report.objects, 0, "input {input:?}");
        assert!(registry.objects_for_hall(HallName::Earth).is_empty());
        assert_eq!(registry.rune_holder(), None);
    }
}

#[test]
fn export_then_import_preserves_objects() {
    let mut registry = BuildObjectRegistry::new();
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let _ = registry
        .load_from_json(Some(EARTH_DOCUMENT), &mut rng)
        .expect("document parses");

    let exported = registry.to_json().expect("export");
    let mut restored = BuildObjectRegistry::new();
    let _ = restored
        .load_from_json(Some(&exported), &mut rng)
        .expect("exported document parses");

    let cells: Vec<_> = restored
        .objects_for_hall(HallName::Earth)
        .iter()
        .map(|object| (object.grid_x(), object.grid_y(), object.object_type().to_owned()))
        .collect();
    assert_eq!(
        cells,
        vec![(0, 0, "box".to_owned()), (1, 1, "chest".to_owned())]
    );
    assert_eq!(restored.check_invariant(), Ok(()));
}

#[test]
fn transfer_eventually_moves_rune_to_another_object() {
    let mut registry = BuildObjectRegistry::new();
    let _ = registry.add_object(HallName::Earth, BuildObject::new(0, 0, "box"));
    let _ = registry.add_object(HallName::Earth, BuildObject::new(1, 0, "box"));
    let original = ObjectId::new(HallName::Earth, 0);
    assert!(registry.set_rune(original));

    let mut rng = ChaCha8Rng::seed_from_u64(6);
    let transfer = registry
        .relocate_rune(&mut rng)
        .expect("a free candidate exists among two objects");

    assert_eq!(transfer.from, Some(original));
    assert_eq!(transfer.to, ObjectId::new(HallName::Earth, 1));
    assert_eq!(registry.rune_holder(), Some(transfer.to));
    assert_eq!(registry.check_invariant(), Ok(()));
}

#[test]
fn clicking_the_holder_within_reach_collects_the_rune() {
    let mut registry = BuildObjectRegistry::new();
    let holder = registry.add_object(HallName::Earth, BuildObject::new(2, 2, "chest"));
    assert!(registry.set_rune(holder));
    let mut player = Player::new(PixelPoint::new(15.0, 25.0), 3);
    let mut events = Vec::new();

    let outcome = registry.handle_click(
        PixelPoint::new(25.0, 21.0),
        10.0,
        &mut player,
        GameTime::from_secs(4),
        &mut events,
    );

    assert_eq!(outcome, ClickOutcome::RuneCollected(holder));
    assert!(player.holds_rune());
    assert_eq!(registry.rune_holder(), None);
    assert_eq!(events, vec![Event::RuneCollected { from: holder }]);
    assert_eq!(registry.check_invariant(), Ok(()));
}

#[test]
fn clicking_out_of_reach_changes_nothing() {
    let mut registry = BuildObjectRegistry::new();
    let holder = registry.add_object(HallName::Earth, BuildObject::new(9, 9, "chest"));
    assert!(registry.set_rune(holder));
    let mut player = Player::new(PixelPoint::new(5.0, 5.0), 3);
    let mut events = Vec::new();

    let outcome = registry.handle_click(
        PixelPoint::new(95.0, 95.0),
        10.0,
        &mut player,
        GameTime::ZERO,
        &mut events,
    );

    assert_eq!(outcome, ClickOutcome::OutOfReach(holder));
    assert!(!player.inventory().contains(EnchantmentKind::Rune));
    assert_eq!(registry.rune_holder(), Some(holder));
    assert!(events.is_empty());
}

#[test]
fn clicking_a_rune_free_object_acknowledges_it_briefly() {
    let mut registry = BuildObjectRegistry::new();
    let decoy = registry.add_object(HallName::Earth, BuildObject::new(1, 1, "box"));
    let mut player = Player::new(PixelPoint::new(15.0, 15.0), 3);
    let mut events = Vec::new();

    let outcome = registry.handle_click(
        PixelPoint::new(12.0, 18.0),
        10.0,
        &mut player,
        GameTime::from_secs(7),
        &mut events,
    );

    assert_eq!(outcome, ClickOutcome::Acknowledged(decoy));
    assert_eq!(registry.acknowledged(GameTime::from_secs(7)), Some(decoy));
    assert_eq!(registry.acknowledged(GameTime::from_secs(8)), None);
    assert_eq!(player.lives(), 3);
}

#[derive(Clone, Debug)]
enum RuneOp {
    Set { hall: usize, index: usize },
    Remove,
    Transfer,
    Reload { earth: usize, air: usize },
    SwitchHall { hall: usize },
}

fn rune_op() -> impl Strategy<Value = RuneOp> {
    prop_oneof![
        (0..4usize, 0..6usize).prop_map(|(hall, index)| RuneOp::Set { hall, index }),
        Just(RuneOp::Remove),
        Just(RuneOp::Transfer),
        (0..5usize, 0..5usize).prop_map(|(earth, air)| RuneOp::Reload { earth, air }),
        (0..4usize).prop_map(|hall| RuneOp::SwitchHall { hall }),
    ]
}

fn document(earth: usize, air: usize) -> String {
    let objects = |count: usize| {
        (0..count)
            .map(|index| format!(r#"{{"x":{index},"y":0,"objectType":"box","hasRune":true}}"#))
            .collect::<Vec<_>>()
            .join(",")
    };
    format!(r#"{{"EARTH":[{}],"AIR":[{}]}}"#, objects(earth), objects(air))
}

proptest! {
    #[test]
    fn at_most_one_rune_after_any_sequence(
        seed in any::<u64>(),
        ops in proptest::collection::vec(rune_op(), 0..40),
    ) {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut registry = BuildObjectRegistry::new();
        let _ = registry
            .load_from_json(Some(&document(3, 2)), &mut rng)
            .expect("seed document parses");

        for op in ops {
            match op {
                RuneOp::Set { hall, index } => {
                    let _ = registry.set_rune(ObjectId::new(HallName::ALL[hall], index));
                }
                RuneOp::Remove => {
                    let _ = registry.remove_rune();
                }
                RuneOp::Transfer => {
                    let _ = registry.transfer_rune(&mut rng);
                }
                RuneOp::Reload { earth, air } => {
                    let _ = registry
                        .load_from_json(Some(&document(earth, air)), &mut rng)
                        .expect("generated document parses");
                }
                RuneOp::SwitchHall { hall } => registry.set_active_hall(HallName::ALL[hall]),
            }
            prop_assert_eq!(registry.check_invariant(), Ok(()));
        }
    }
}
