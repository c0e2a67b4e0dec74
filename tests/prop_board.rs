//! Property-based tests for board geometry and the tide.
//!
//! Run with: cargo test --release prop_board

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;

use rising_tide::game::{
    BOARD_SIZE, CITIES, FLOOD_CAP_ROUND, MAX_HEIGHT, SUNK, below_waterline, flood, is_legal,
    legal_moves, neighbors, rotate, to_canonical, to_local,
};
use rising_tide::{Coord, Terrain};

/// Arbitrary board with every cell in -1..=8 and cities at 0.
fn arb_terrain() -> impl Strategy<Value = Terrain> {
    prop::collection::vec(SUNK..=MAX_HEIGHT, BOARD_SIZE * BOARD_SIZE).prop_map(|cells| {
        let mut terrain = Terrain::filled(0);
        for (pos, height) in Coord::all().zip(cells) {
            terrain.set(pos, height);
        }
        for city in CITIES {
            terrain.set(city, 0);
        }
        terrain
    })
}

fn arb_coord() -> impl Strategy<Value = Coord> {
    (0u8..18, 0u8..18).prop_map(|(row, col)| Coord::new(row, col))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Moves touching a city are never legal.
    #[test]
    fn prop_cities_never_move(terrain in arb_terrain(), other in arb_coord(), city_idx in 0usize..4) {
        let city = CITIES[city_idx];
        prop_assert!(!is_legal(&terrain, city, other));
        prop_assert!(!is_legal(&terrain, other, city));
    }

    /// Moves leaving the board are never legal.
    #[test]
    fn prop_off_board_never_legal(terrain in arb_terrain(), inside in arb_coord(), far in 18u8..=255) {
        prop_assert!(!is_legal(&terrain, inside, Coord::new(far, inside.col)));
        prop_assert!(!is_legal(&terrain, Coord::new(inside.row, far), inside));
    }

    /// Applying a legal move conserves total height.
    #[test]
    fn prop_legal_moves_conserve_land(terrain in arb_terrain()) {
        let total: i32 = terrain.iter().map(|(_, h)| i32::from(h)).sum();
        for mv in legal_moves(&terrain).into_iter().take(16) {
            let mut next = terrain.clone();
            prop_assert!(next.apply(mv));
            let after: i32 = next.iter().map(|(_, h)| i32::from(h)).sum();
            prop_assert_eq!(after, total);
        }
    }

    /// Four quarter turns are the identity, and the frame maps invert each other.
    #[test]
    fn prop_rotation_order_four(pos in arb_coord(), frame in 0u8..4) {
        prop_assert_eq!(rotate(4, pos), pos);
        prop_assert_eq!(to_canonical(frame, to_local(frame, pos)), pos);
        prop_assert_eq!(to_local(frame, CITIES[usize::from(frame)]), CITIES[0]);
    }

    /// The rotated view holds exactly the canonical heights.
    #[test]
    fn prop_rotated_view_is_a_permutation(terrain in arb_terrain(), frame in 0u8..4) {
        let view = terrain.rotated_view(frame);
        for pos in Coord::all() {
            prop_assert_eq!(view[pos], terrain[to_canonical(frame, pos)]);
        }
    }

    /// The tide only ever takes land below the waterline, and only land
    /// already touching water before the call.
    #[test]
    fn prop_flood_takes_one_layer(terrain in arb_terrain(), round in 0u32..=FLOOD_CAP_ROUND) {
        let once = flood(&terrain, round);
        for (pos, height) in terrain.iter() {
            if height == SUNK {
                prop_assert!(once.is_sunk(pos));
            } else if once.is_sunk(pos) {
                prop_assert!(below_waterline(height, round));
                let wet = pos.is_border() || neighbors(pos).iter().any(|&n| terrain.is_sunk(n));
                prop_assert!(wet, "{} sank without touching water", pos);
            } else {
                prop_assert_eq!(once[pos], height);
            }
        }
    }

    /// For the same board, a later tide takes at least what an earlier one does.
    #[test]
    fn prop_flood_grows_with_round(terrain in arb_terrain(), round in 0u32..FLOOD_CAP_ROUND) {
        let earlier = flood(&terrain, round);
        let later = flood(&terrain, round + 1);
        for pos in Coord::all() {
            prop_assert!(!earlier.is_sunk(pos) || later.is_sunk(pos));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Flooding round after round never gives land back: whatever is sunk
    /// after round `r1` is still sunk after round `r2`.
    #[test]
    fn prop_sequential_flood_never_shrinks(
        terrain in arb_terrain(),
        (r1, r2) in (0u32..=FLOOD_CAP_ROUND).prop_flat_map(|r2| (0..=r2, Just(r2))),
    ) {
        let mut board = terrain;
        let mut at_r1 = None;
        for round in 0..=r2 {
            board = flood(&board, round);
            if round == r1 {
                at_r1 = Some(board.clone());
            }
        }
        let at_r1 = at_r1.unwrap();
        for pos in Coord::all() {
            prop_assert!(!at_r1.is_sunk(pos) || board.is_sunk(pos), "{} resurfaced", pos);
        }
        prop_assert!(board.sunk_count() >= at_r1.sunk_count());
    }

    /// A low channel cut in from the shore floods one cell per round, so a
    /// channel of length `len` takes exactly `len` rounds to fill.
    #[test]
    fn prop_channel_fills_in_len_rounds(len in 1u8..=17, row in 1u8..17) {
        let mut board = Terrain::filled(MAX_HEIGHT);
        for col in 0..len {
            board.set(Coord::new(row, col), 1);
        }
        for step in 0..u32::from(len) {
            board = flood(&board, 101 + step);
            let expected = usize::try_from(step).unwrap() + 1;
            prop_assert_eq!(board.sunk_count(), expected);
        }
        prop_assert!(Coord::all().filter(|p| p.row == row && p.col < len).all(|p| board.is_sunk(p)));
    }
}
