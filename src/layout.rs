//! Stacked-figure layout: horizontal alignment on a shared reference gene,
//! vertical row placement with gap handling, and canvas sizing.

use crate::cluster::ClusterCollection;
use crate::filter::WorkingSet;
use crate::reference::{resolve_reference, scaled_cluster_length, ReferenceAlignment};
use crate::style::ArrowStyle;
use log::warn;

/// Transient per-cluster render placement. Built fresh for every layout
/// invocation and handed to the cluster renderer; never persisted.
#[derive(Clone, Debug, PartialEq)]
pub struct DrawSpec {
    pub identifier: String,
    pub x_offset: f64,
    pub y_offset: f64,
    pub mirror: bool,
}

#[derive(Clone, Debug, Default)]
pub struct StackedLayout {
    /// Placements for the clusters actually present, in draw order.
    pub placements: Vec<DrawSpec>,
    /// Rows consumed, counting preserved gaps.
    pub rows: usize,
    pub width: u64,
    pub height: u64,
}

struct MeasuredCluster {
    identifier: String,
    length: f64,
    alignment: ReferenceAlignment,
}

/// Computes the full stacked layout for one working set. Clusters named in
/// the draw order but absent from the collection either consume an empty
/// row (`preserve_gaps`) or are skipped without advancing the row counter.
pub fn layout_stacked(
    working: &WorkingSet,
    collection: &ClusterCollection,
    style: &ArrowStyle,
    preserve_gaps: bool,
) -> StackedLayout {
    // Measuring pass: lengths, mirror flags and the shared alignment anchor.
    let mut measured: Vec<MeasuredCluster> = Vec::with_capacity(working.len());
    let mut max_distance = 0.0_f64;
    for entry in working.iter() {
        let Some(cluster) = collection.get(&entry.identifier) else {
            warn!("Cannot find cluster '{}' in input data", entry.identifier);
            continue;
        };
        let alignment = resolve_reference(cluster, entry.reference.as_deref(), style);
        if let Some(distance) = alignment.distance_to_reference {
            max_distance = max_distance.max(distance);
        }
        measured.push(MeasuredCluster {
            identifier: entry.identifier.clone(),
            length: scaled_cluster_length(cluster, style),
            alignment,
        });
    }

    // Canvas width: the widest cluster after shifting each onto the anchor.
    let mut width = 0.0_f64;
    for cluster in &measured {
        let x_offset = x_offset_for(&cluster.alignment, max_distance);
        width = width.max(x_offset + cluster.length);
    }

    // Row pass in draw order; missing clusters advance the counter only
    // when gaps are preserved.
    let mut placements = Vec::with_capacity(measured.len());
    let mut measured_iter = measured.iter().peekable();
    let mut rows = 0_usize;
    for entry in working.iter() {
        let found = measured_iter
            .peek()
            .is_some_and(|m| m.identifier == entry.identifier);
        if !found {
            if preserve_gaps {
                rows += 1;
            }
            continue;
        }
        let cluster = measured_iter.next().expect("peeked");
        placements.push(DrawSpec {
            identifier: cluster.identifier.clone(),
            x_offset: x_offset_for(&cluster.alignment, max_distance),
            y_offset: rows as f64 * style.row_height(),
            mirror: cluster.alignment.mirror,
        });
        rows += 1;
    }

    let height = style.gene_contour_thickness + rows as f64 * style.row_height();
    StackedLayout {
        placements,
        rows,
        width: width as u64,
        height: height as u64,
    }
}

fn x_offset_for(alignment: &ReferenceAlignment, max_distance: f64) -> f64 {
    match alignment.distance_to_reference {
        Some(distance) => max_distance - distance,
        None => 0.0,
    }
}
