use super::*;

fn pos(line: usize, character: usize) -> LinePos {
	LinePos::new(line, character)
}

#[test]
fn single_selection() {
	let sel = Selection::single(pos(0, 0), pos(1, 17));
	assert_eq!(sel.len(), 1);
	assert_eq!(sel.primary(), Range::new(pos(0, 0), pos(1, 17)));
}

#[test]
fn point_selection() {
	let sel = Selection::point(pos(2, 5));
	assert!(sel.primary().is_empty());
	assert!(sel.primary().is_single_line());
}

#[test]
fn reversed_range_orders_bounds() {
	let range = Range::new(pos(3, 4), pos(1, 2));
	assert!(range.is_reversed());
	assert_eq!(range.start(), pos(1, 2));
	assert_eq!(range.end(), pos(3, 4));
	assert_eq!(range.lines(), 1..=3);
}

#[test]
fn with_bounds_keeps_orientation() {
	let forward = Range::new(pos(0, 3), pos(2, 1));
	assert_eq!(forward.with_bounds(pos(0, 12), pos(2, 1)), Range::new(pos(0, 12), pos(2, 1)));

	let reversed = Range::new(pos(2, 1), pos(0, 3));
	assert_eq!(reversed.with_bounds(pos(0, 12), pos(2, 1)), Range::new(pos(2, 1), pos(0, 12)));
}

#[test]
fn from_vec_rejects_bad_primary() {
	assert!(Selection::from_vec(Vec::new(), 0).is_none());
	assert!(Selection::from_vec(vec![Range::point(pos(0, 0))], 1).is_none());

	let sel = Selection::from_vec(vec![Range::point(pos(0, 0)), Range::point(pos(4, 0))], 1).unwrap();
	assert_eq!(sel.primary(), Range::point(pos(4, 0)));
}

#[test]
fn map_preserves_primary() {
	let sel = Selection::from_vec(vec![Range::point(pos(0, 0)), Range::point(pos(4, 0))], 1).unwrap();
	let shifted = sel.map(|r| Range::point(pos(r.head.line, 12)));
	assert_eq!(shifted.primary_index(), 1);
	assert_eq!(shifted.primary(), Range::point(pos(4, 12)));
}
