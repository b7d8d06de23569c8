use proptest::prelude::*;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use seabattle::{Field, FieldState, Orientation, Pos, FIELD_SIZE, FLEET};

fn empty_field() -> Field {
    Field::new(Pos::new(FIELD_SIZE, FIELD_SIZE), FieldState::Preparing)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn adjacency_rule_matches_chebyshev(
        ax in 0..FIELD_SIZE, ay in 0..FIELD_SIZE,
        bx in 0..FIELD_SIZE, by in 0..FIELD_SIZE,
    ) {
        let mut field = empty_field();
        let a = field.add_ship(Pos::new(ax, ay), Orientation::Horizontal, 1, false);
        let b = field.add_ship(Pos::new(bx, by), Orientation::Horizontal, 1, false);

        prop_assert!(!field.ship(a).unwrap().placement_violated);
        let expected = Pos::new(ax, ay).chebyshev(Pos::new(bx, by)) < 2;
        prop_assert_eq!(field.ship(b).unwrap().placement_violated, expected);
    }

    #[test]
    fn random_fleet_is_always_legal(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut field = empty_field();
        prop_assume!(field.random_fleet(&mut rng));

        prop_assert_eq!(field.ships().count(), FLEET.len());
        prop_assert!(field.all_ships_placed());

        // the invariant directly: parts of different ships never touch,
        // not even diagonally, and everything is on the grid
        let parts: Vec<_> = field.parts().map(|(_, p)| (p.position, p.ship)).collect();
        for (i, &(pa, sa)) in parts.iter().enumerate() {
            prop_assert!(field.contains(pa));
            for &(pb, sb) in parts.iter().skip(i + 1) {
                if sa != sb {
                    prop_assert!(pa.chebyshev(pb) >= 2);
                }
            }
        }
    }

    #[test]
    fn revalidation_is_idempotent(seed in any::<u64>(), x in 0..FIELD_SIZE, y in 0..FIELD_SIZE) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut field = empty_field();
        prop_assume!(field.random_fleet(&mut rng));
        let intruder = field.add_ship(Pos::new(x, y), Orientation::Vertical, 2, false);

        field.revalidate(intruder);
        let first = field.ship(intruder).unwrap().placement_violated;
        field.revalidate(intruder);
        prop_assert_eq!(field.ship(intruder).unwrap().placement_violated, first);
    }

    #[test]
    fn rotation_never_leaves_a_legal_ship_illegal(seed in any::<u64>()) {
        let mut rng = SmallRng::seed_from_u64(seed);
        let mut field = empty_field();
        prop_assume!(field.random_fleet(&mut rng));

        let ids: Vec<_> = field.ships().map(|(id, _)| id).collect();
        for id in ids {
            field.rotate_ship(id);
            // committed or silently rejected, the ship stays legal
            prop_assert!(!field.ship(id).unwrap().placement_violated);
        }
    }
}
