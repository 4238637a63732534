//! Coordinate text and overmap assignment.

use mapprune::{Coordinate, OvermapKey, Span};
use mapprune_core::{parse, parse_list, to_overmap_key};
use proptest::prelude::*;

#[test]
fn floor_semantics_at_the_edges() {
    let cases = [
        (Coordinate::new(-1, -1, 0), OvermapKey::new(-1, -1)),
        (Coordinate::new(0, 0, 0), OvermapKey::new(0, 0)),
        (Coordinate::new(179, 0, 0), OvermapKey::new(0, 0)),
        (Coordinate::new(180, 0, 0), OvermapKey::new(1, 0)),
        (Coordinate::new(-180, 0, 0), OvermapKey::new(-1, 0)),
        (Coordinate::new(-181, 0, 0), OvermapKey::new(-2, 0)),
    ];
    for (coord, key) in cases {
        assert_eq!(to_overmap_key(coord, 180).unwrap(), key, "{}", coord);
    }
}

#[test]
fn zero_span_rejected() {
    assert!(to_overmap_key(Coordinate::new(1, 1, 1), 0).is_err());
    assert!(Span::new(0).is_err());
}

#[test]
fn keep_list_preserves_order_and_duplicates() {
    let coords = parse_list(" 119.183.10 ,, 119.183.9, 119.183.10 ", ',').unwrap();
    assert_eq!(
        coords,
        vec![
            Coordinate::new(119, 183, 10),
            Coordinate::new(119, 183, 9),
            Coordinate::new(119, 183, 10)
        ]
    );
}

proptest! {
    #[test]
    fn parse_then_display_is_identity(
        x in any::<i32>(),
        y in any::<i32>(),
        z in -20i32..20,
        pad_left in "[ \t]{0,3}",
        pad_right in "[ \t]{0,3}",
    ) {
        let text = format!("{}{}.{}.{}{}", pad_left, x, y, z, pad_right);
        let coord = parse(&text).unwrap();
        prop_assert_eq!(coord.to_string(), text.trim());
    }

    #[test]
    fn overmap_key_contains_coordinate(
        x in -100_000i32..100_000,
        y in -100_000i32..100_000,
        span in 1i32..1000,
    ) {
        let span = Span::new(span).unwrap();
        let coord = Coordinate::new(x, y, 0);
        let key = coord.overmap_key(span);
        let (ox, oy) = key.origin(span).unwrap();
        prop_assert!(ox <= x && x < ox + span.get());
        prop_assert!(oy <= y && y < oy + span.get());
    }
}
