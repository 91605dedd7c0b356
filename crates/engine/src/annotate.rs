//! Gutter annotations.
//!
//! Each prefixed line in a visible range gets one [`Annotation`] labelled with
//! its date field, concealing the prefix columns from the text flow.

use std::collections::BTreeSet;
use std::ops::Range;

use seqline_primitives::{RopeSlice, line_count, line_text};

use crate::codec::{PREFIX_LEN, date_field};
use crate::host::Annotation;

/// Computes annotations for the prefixed lines of the visible ranges.
///
/// `visible` holds half-open line ranges; an empty slice means the whole
/// document. Overlapping ranges yield each line once.
pub fn compute_annotations(text: RopeSlice, visible: &[Range<usize>]) -> Vec<Annotation> {
	let total = line_count(text);
	let lines: BTreeSet<usize> = if visible.is_empty() {
		(0..total).collect()
	} else {
		visible
			.iter()
			.flat_map(|range| range.start.min(total)..range.end.min(total))
			.collect()
	};

	lines
		.into_iter()
		.filter_map(|line| {
			let content = line_text(text, line)?;
			let label = date_field(&content)?.to_string();
			Some(Annotation {
				line,
				label,
				concealed: 0..PREFIX_LEN,
			})
		})
		.collect()
}
