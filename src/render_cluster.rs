//! Per-cluster SVG rendering: locus stripes, strand-oriented gene arrows
//! and domain boxes, positioned by a [`DrawSpec`].

use crate::cluster::{Gene, GeneCluster, Locus};
use crate::layout::DrawSpec;
use crate::style::ArrowStyle;
use svg::node::element::path::Data;
use svg::node::element::{Group, Path, Rectangle};

const STRIPE_COLOR: &str = "#7a7a7a";
const GENE_CONTOUR_COLOR: &str = "#000000";

const DOMAIN_PALETTE: [&str; 8] = [
    "#1f4fcc", "#cc1f1f", "#238023", "#b4640a", "#7a2c8f", "#0a7f8a", "#8a6d0a", "#5a5a5a",
];

pub fn gene_fill(role: Option<&str>) -> &'static str {
    match role.unwrap_or("") {
        "PKS" => "#d8e4f5",
        "NRPS" => "#f5d8d8",
        "Hybrid" => "#ead8f5",
        "Terpene" => "#d8f5dc",
        "DMATS" => "#f5ecd8",
        _ => "#ffffff",
    }
}

/// Deterministic palette pick so the same accession gets the same color in
/// every figure of a run.
pub fn domain_color(accession: &str) -> &'static str {
    let sum: usize = accession.bytes().map(usize::from).sum();
    DOMAIN_PALETTE[sum % DOMAIN_PALETTE.len()]
}

/// Renders one cluster as a `<g>` subtree at the placement's offsets. Loci
/// are concatenated left to right in cluster order; mirroring reverses the
/// locus order, flips intra-locus coordinates and flips every strand.
pub fn cluster_group(cluster: &GeneCluster, style: &ArrowStyle, spec: &DrawSpec) -> Group {
    let mut group = Group::new().set("id", format!("cluster_{}", spec.identifier));
    let center_y = (spec.y_offset + style.gene_contour_thickness + style.arrow_height) as f32;

    let mut cursor_x = spec.x_offset as f32;
    let mut loci: Vec<&Locus> = cluster.loci.iter().collect();
    if spec.mirror {
        loci.reverse();
    }
    for locus in loci {
        group = group.add(locus_group(locus, style, cursor_x, center_y, spec.mirror));
        cursor_x += (locus.length as f64 / style.scaling + style.inter_locus_spacing()) as f32;
    }
    group
}

fn locus_group(
    locus: &Locus,
    style: &ArrowStyle,
    origin_x: f32,
    center_y: f32,
    mirror: bool,
) -> Group {
    let scaling = style.scaling as f32;
    let stripe = style.stripe_thickness as f32;
    let locus_px = locus.length as f32 / scaling;
    let mut group = Group::new().add(
        Rectangle::new()
            .set("x", origin_x)
            .set("y", center_y - stripe / 2.0)
            .set("width", locus_px)
            .set("height", stripe)
            .set("fill", STRIPE_COLOR),
    );

    for gene in &locus.genes {
        let (x1, x2) = if mirror {
            (
                origin_x + locus.length.saturating_sub(gene.span_end()) as f32 / scaling,
                origin_x + locus.length.saturating_sub(gene.span_start()) as f32 / scaling,
            )
        } else {
            (
                origin_x + gene.span_start() as f32 / scaling,
                origin_x + gene.span_end() as f32 / scaling,
            )
        };
        let points_right = gene.forward != mirror;
        group = group.add(
            Path::new()
                .set("d", arrow_data(x1, x2, center_y, points_right, style))
                .set("fill", gene_fill(gene.role.as_deref()))
                .set("stroke", GENE_CONTOUR_COLOR)
                .set("stroke-width", style.gene_contour_thickness),
        );
        if style.draw_domains {
            for rect in domain_boxes(gene, style, x1, x2, center_y, points_right) {
                group = group.add(rect);
            }
        }
    }
    group
}

/// Arrow outline: body of height `arrow_height`, head widening to the full
/// band. Genes shorter than the head length collapse to a bare triangle.
fn arrow_data(x1: f32, x2: f32, center_y: f32, points_right: bool, style: &ArrowStyle) -> Data {
    let half_body = style.arrow_height as f32 / 2.0;
    let head_extent = style.arrow_height as f32;
    let head_len = (style.arrow_height as f32 / 2.0).min(x2 - x1);

    if points_right {
        let neck = x2 - head_len;
        if neck <= x1 {
            Data::new()
                .move_to((x1, center_y - head_extent))
                .line_to((x2, center_y))
                .line_to((x1, center_y + head_extent))
                .close()
        } else {
            Data::new()
                .move_to((x1, center_y - half_body))
                .line_to((neck, center_y - half_body))
                .line_to((neck, center_y - head_extent))
                .line_to((x2, center_y))
                .line_to((neck, center_y + head_extent))
                .line_to((neck, center_y + half_body))
                .line_to((x1, center_y + half_body))
                .close()
        }
    } else {
        let neck = x1 + head_len;
        if neck >= x2 {
            Data::new()
                .move_to((x2, center_y - head_extent))
                .line_to((x1, center_y))
                .line_to((x2, center_y + head_extent))
                .close()
        } else {
            Data::new()
                .move_to((x2, center_y - half_body))
                .line_to((neck, center_y - half_body))
                .line_to((neck, center_y - head_extent))
                .line_to((x1, center_y))
                .line_to((neck, center_y + head_extent))
                .line_to((neck, center_y + half_body))
                .line_to((x2, center_y + half_body))
                .close()
        }
    }
}

/// Domain boxes sit inside the arrow body with an internal margin. Domain
/// coordinates are amino acids from the gene's translational start, which
/// is the display-left end exactly when the arrow points right.
fn domain_boxes(
    gene: &Gene,
    style: &ArrowStyle,
    x1: f32,
    x2: f32,
    center_y: f32,
    points_right: bool,
) -> Vec<Rectangle> {
    let half_body = style.arrow_height as f32 / 2.0;
    let margin = style.internal_domain_margin as f32;
    let box_y = center_y - half_body + margin;
    let box_height = style.arrow_height as f32 - 2.0 * margin;
    let scaling = style.scaling as f32;

    gene.domains
        .iter()
        .filter_map(|domain| {
            let start_px = 3.0 * domain.start as f32 / scaling;
            let end_px = 3.0 * domain.end as f32 / scaling;
            let (mut dx1, mut dx2) = if points_right {
                (x1 + start_px, x1 + end_px)
            } else {
                (x2 - end_px, x2 - start_px)
            };
            dx1 = dx1.max(x1);
            dx2 = dx2.min(x2);
            if dx2 <= dx1 {
                return None;
            }
            Some(
                Rectangle::new()
                    .set("x", dx1)
                    .set("y", box_y)
                    .set("width", dx2 - dx1)
                    .set("height", box_height)
                    .set("fill", domain_color(&domain.accession))
                    .set("stroke", GENE_CONTOUR_COLOR)
                    .set("stroke-width", style.domain_contour_thickness),
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::test_support::{gene, single_locus_cluster};
    use crate::cluster::Domain;

    fn plain_style() -> ArrowStyle {
        ArrowStyle {
            scaling: 1.0,
            arrow_height: 10.0,
            gene_contour_thickness: 2.0,
            ..ArrowStyle::default()
        }
    }

    fn spec(x: f64, y: f64, mirror: bool) -> DrawSpec {
        DrawSpec {
            identifier: "c".to_string(),
            x_offset: x,
            y_offset: y,
            mirror,
        }
    }

    #[test]
    fn group_contains_stripe_and_one_path_per_gene() {
        let cluster = single_locus_cluster(
            "c",
            1000,
            vec![gene("a", true, 100, 400), gene("b", false, 500, 900)],
        );
        let svg = cluster_group(&cluster, &plain_style(), &spec(0.0, 0.0, false)).to_string();
        assert!(svg.contains("cluster_c"));
        assert_eq!(svg.matches("<path").count(), 2);
        assert!(svg.contains(STRIPE_COLOR));
    }

    #[test]
    fn forward_gene_arrow_starts_at_scaled_span_start() {
        let cluster = single_locus_cluster("c", 1000, vec![gene("a", true, 100, 400)]);
        let svg = cluster_group(&cluster, &plain_style(), &spec(0.0, 0.0, false)).to_string();
        // center_y = thickness + H = 12; body top at 7, tail at x=100.
        assert!(svg.contains("M100,7"));
    }

    #[test]
    fn mirroring_flips_coordinates_and_strand() {
        let style = plain_style();
        let cluster = single_locus_cluster("c", 1000, vec![gene("a", false, 100, 400)]);
        let plain = cluster_group(&cluster, &style, &spec(0.0, 0.0, false)).to_string();
        let mirrored = cluster_group(&cluster, &style, &spec(0.0, 0.0, true)).to_string();
        // Reverse gene drawn plain points left: tip at span start.
        assert!(plain.contains("L100,12"));
        // Mirrored it spans [600, 900] and points right: tip at 900.
        assert!(mirrored.contains("L900,12"));
    }

    #[test]
    fn short_gene_collapses_to_triangle() {
        let cluster = single_locus_cluster("c", 1000, vec![gene("tiny", true, 10, 13)]);
        let svg = cluster_group(&cluster, &plain_style(), &spec(0.0, 0.0, false)).to_string();
        assert!(svg.contains("M10,2 L13,12 L10,22 z"));
    }

    #[test]
    fn domains_track_the_arrow_tail() {
        let style = plain_style();
        let mut g = gene("a", true, 0, 300);
        g.domains.push(Domain {
            accession: "PF00001".to_string(),
            name: "ks".to_string(),
            start: 10,
            end: 50,
            score: 12.0,
        });
        let cluster = single_locus_cluster("c", 1000, vec![g]);
        let svg = cluster_group(&cluster, &style, &spec(0.0, 0.0, false)).to_string();
        // 3 nt per aa at scaling 1: x = 30, width = 120.
        assert!(svg.contains(r#"x="30""#));
        assert!(svg.contains(r#"width="120""#));
        assert!(svg.contains(domain_color("PF00001")));
    }

    #[test]
    fn domains_are_suppressed_when_disabled() {
        let mut style = plain_style();
        style.draw_domains = false;
        let mut g = gene("a", true, 0, 300);
        g.domains.push(Domain {
            accession: "PF00001".to_string(),
            name: "ks".to_string(),
            start: 10,
            end: 50,
            score: 12.0,
        });
        let cluster = single_locus_cluster("c", 1000, vec![g]);
        let svg = cluster_group(&cluster, &style, &spec(0.0, 0.0, false)).to_string();
        assert_eq!(svg.matches("<rect").count(), 1); // stripe only
    }

    #[test]
    fn second_locus_is_offset_by_length_and_spacing() {
        let mut cluster = single_locus_cluster("c", 500, vec![]);
        cluster.loci.push(crate::cluster::Locus {
            name: "l1".to_string(),
            length: 400,
            genes: vec![],
        });
        let svg = cluster_group(&cluster, &plain_style(), &spec(0.0, 0.0, false)).to_string();
        // Second stripe starts at 500 + spacing(10).
        assert!(svg.contains(r#"x="510""#));
    }
}
