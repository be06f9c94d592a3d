//! Strand and coordinate-span extraction from GenBank feature locations.

use gb_io::seq::{Feature, Location};

fn collect_strands(location: &Location, reverse: bool, strands: &mut Vec<bool>) {
    match location {
        Location::Range(_, _) | Location::Between(_, _) => strands.push(reverse),
        Location::Complement(inner) => collect_strands(inner, !reverse, strands),
        Location::Join(parts)
        | Location::Order(parts)
        | Location::Bond(parts)
        | Location::OneOf(parts) => {
            for part in parts {
                collect_strands(part, reverse, strands);
            }
        }
        Location::External(_, maybe_loc) => {
            if let Some(loc) = maybe_loc {
                collect_strands(loc, reverse, strands);
            }
        }
        Location::Gap(_) => {}
    }
}

/// Majority vote across all segments; an empty location counts as forward.
pub fn feature_is_reverse(feature: &Feature) -> bool {
    let mut strands = Vec::new();
    collect_strands(&feature.location, false, &mut strands);
    if strands.is_empty() {
        false
    } else {
        strands.iter().filter(|is_reverse| **is_reverse).count() > strands.len() / 2
    }
}

fn collect_spans(location: &Location, spans: &mut Vec<(u64, u64)>) {
    match location {
        Location::Range((from, _), (to, _)) | Location::Between(from, to) => {
            if *from < 0 || *to < 0 {
                return;
            }
            let mut start = *from as u64;
            let mut end = *to as u64;
            if end < start {
                std::mem::swap(&mut start, &mut end);
            }
            spans.push((start, end));
        }
        Location::Complement(inner) => collect_spans(inner, spans),
        Location::Join(parts)
        | Location::Order(parts)
        | Location::Bond(parts)
        | Location::OneOf(parts) => {
            for part in parts {
                collect_spans(part, spans);
            }
        }
        Location::External(_, maybe_loc) => {
            if let Some(loc) = maybe_loc {
                collect_spans(loc, spans);
            }
        }
        Location::Gap(_) => {}
    }
}

/// Ascending, non-overlapping segments of a feature. Falls back to the
/// location bounds when no explicit segment can be extracted.
pub fn feature_spans_sorted(feature: &Feature) -> Vec<(u64, u64)> {
    let mut spans = Vec::new();
    collect_spans(&feature.location, &mut spans);
    if spans.is_empty() {
        if let Ok((from, to)) = feature.location.find_bounds() {
            if from >= 0 && to >= 0 {
                spans.push((from.min(to) as u64, from.max(to) as u64));
            }
        }
    }
    spans.sort_unstable_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));
    // Collapse overlapping segments so downstream span arithmetic can rely
    // on strict ascending order.
    let mut merged: Vec<(u64, u64)> = Vec::with_capacity(spans.len());
    for (start, end) in spans {
        match merged.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => merged.push((start, end)),
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::borrow::Cow;

    fn make_feature(location: Location) -> Feature {
        Feature {
            kind: Cow::from("CDS"),
            location,
            qualifiers: vec![],
        }
    }

    #[test]
    fn splits_join_into_sorted_segments() {
        let feature = make_feature(Location::Complement(Box::new(Location::Join(vec![
            Location::simple_range(40, 50),
            Location::simple_range(10, 20),
        ]))));
        assert_eq!(feature_spans_sorted(&feature), vec![(10, 20), (40, 50)]);
        assert!(feature_is_reverse(&feature));
    }

    #[test]
    fn merges_overlapping_segments() {
        let feature = make_feature(Location::Join(vec![
            Location::simple_range(10, 30),
            Location::simple_range(20, 50),
        ]));
        assert_eq!(feature_spans_sorted(&feature), vec![(10, 50)]);
        assert!(!feature_is_reverse(&feature));
    }

    #[test]
    fn simple_range_is_single_forward_segment() {
        let feature = make_feature(Location::simple_range(100, 400));
        assert_eq!(feature_spans_sorted(&feature), vec![(100, 400)]);
        assert!(!feature_is_reverse(&feature));
    }
}
