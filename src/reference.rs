//! Reference-gene resolution: per-cluster mirroring decisions and the
//! horizontal distance from a cluster's drawn start to its reference gene.

use crate::cluster::GeneCluster;
use crate::style::ArrowStyle;
use log::warn;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReferenceAlignment {
    pub mirror: bool,
    /// Scaled distance from the cluster's drawn start to the reference
    /// gene. `None` means no alignment anchor: the cluster had no request,
    /// or the requested gene was not found.
    pub distance_to_reference: Option<f64>,
}

/// Scaled total drawn length of a cluster: loci plus inter-locus spacing
/// plus one contour-thickness unit.
pub fn scaled_cluster_length(cluster: &GeneCluster, style: &ArrowStyle) -> f64 {
    let loci_px: f64 = cluster
        .loci
        .iter()
        .map(|locus| locus.length as f64 / style.scaling)
        .sum();
    loci_px
        + style.inter_locus_spacing() * (cluster.loci.len().saturating_sub(1)) as f64
        + style.gene_contour_thickness
}

/// Locates the requested gene and derives the mirror flag and alignment
/// distance. The first gene matching either identifier wins, scanning loci
/// in cluster order. A reverse-strand reference gene forces a mirror, and
/// its distance is measured from the mirrored orientation's start. A failed
/// lookup logs a warning and falls back to no anchor, no mirror.
pub fn resolve_reference(
    cluster: &GeneCluster,
    request: Option<&str>,
    style: &ArrowStyle,
) -> ReferenceAlignment {
    let Some(request) = request.filter(|pid| !pid.is_empty()) else {
        return ReferenceAlignment::default();
    };

    let spacing = style.inter_locus_spacing();
    for (locus_index, locus) in cluster.loci.iter().enumerate() {
        for gene in &locus.genes {
            if !gene.matches_id(request) {
                continue;
            }
            let distance = if gene.forward {
                let preceding_px: f64 = cluster.loci[..locus_index]
                    .iter()
                    .map(|l| l.length as f64 / style.scaling)
                    .sum();
                preceding_px
                    + spacing * locus_index as f64
                    + gene.span_start() as f64 / style.scaling
            } else {
                let following = &cluster.loci[locus_index + 1..];
                let following_px: f64 = following
                    .iter()
                    .map(|l| l.length as f64 / style.scaling)
                    .sum();
                following_px
                    + spacing * following.len() as f64
                    + locus.length.saturating_sub(gene.span_end()) as f64 / style.scaling
            };
            return ReferenceAlignment {
                mirror: !gene.forward,
                distance_to_reference: Some(distance),
            };
        }
    }

    warn!(
        "Cannot find reference gene '{}' in cluster '{}'",
        request, cluster.identifier
    );
    ReferenceAlignment::default()
}
