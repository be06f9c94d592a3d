//! Scene assembly: composes per-cluster subtrees into finished SVG
//! documents and writes them out.

use crate::cluster::{ClusterCollection, GeneCluster};
use crate::filter::WorkingSet;
use crate::layout::{layout_stacked, DrawSpec, StackedLayout};
use crate::reference::scaled_cluster_length;
use crate::style::ArrowStyle;
use anyhow::{Context, Result};
use itertools::Itertools;
use std::path::Path;
use svg::Document;

fn base_document(width: u64, height: u64) -> Document {
    Document::new()
        .set("version", "1.1")
        .set("baseProfile", "full")
        .set("width", width as i64)
        .set("height", height as i64)
}

/// Lays out the working set and appends one subtree per cluster actually
/// present, in draw order. The root carries the computed canvas size.
pub fn stacked_document(
    working: &WorkingSet,
    collection: &ClusterCollection,
    style: &ArrowStyle,
    preserve_gaps: bool,
) -> (Document, StackedLayout) {
    let layout = layout_stacked(working, collection, style, preserve_gaps);
    let mut doc = base_document(layout.width, layout.height);
    for placement in &layout.placements {
        let cluster = collection
            .get(&placement.identifier)
            .expect("placements only name clusters present in the collection");
        doc = doc.add(crate::render_cluster::cluster_group(cluster, style, placement));
    }
    (doc, layout)
}

/// Single-cluster figure: the degenerate stacked case at offset (0, 0).
pub fn individual_document(cluster: &GeneCluster, style: &ArrowStyle, mirror: bool) -> Document {
    let spec = DrawSpec {
        identifier: cluster.identifier.clone(),
        x_offset: 0.0,
        y_offset: 0.0,
        mirror,
    };
    let width = scaled_cluster_length(cluster, style) as u64;
    let height = (style.gene_contour_thickness + style.row_height()) as u64;
    base_document(width, height).add(crate::render_cluster::cluster_group(cluster, style, &spec))
}

/// Output name for an individual figure: identifier, classification tags in
/// brackets when present, and an `_m` suffix when mirrored.
pub fn individual_file_name(cluster: &GeneCluster, mirror: bool) -> String {
    let tags = if cluster.tags.is_empty() {
        String::new()
    } else {
        format!("_[{}]", cluster.tags.iter().join(","))
    };
    let mirror_suffix = if mirror { "_m" } else { "" };
    format!("{}{}{}.svg", cluster.identifier, tags, mirror_suffix)
}

pub fn write_document(path: &Path, document: &Document) -> Result<()> {
    std::fs::write(path, document.to_string())
        .with_context(|| format!("Could not write SVG '{}'", path.display()))
}
