//! SVG arrow style options, loadable from a JSON file.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ArrowStyle {
    /// Genomic units per pixel.
    pub scaling: f64,
    /// Arrow body height; also the spacing between consecutive loci.
    pub arrow_height: f64,
    pub gene_contour_thickness: f64,
    pub stripe_thickness: f64,
    pub internal_domain_margin: f64,
    pub domain_contour_thickness: f64,
    pub draw_domains: bool,
}

impl Default for ArrowStyle {
    fn default() -> Self {
        Self {
            scaling: 30.0,
            arrow_height: 30.0,
            gene_contour_thickness: 2.0,
            stripe_thickness: 3.0,
            internal_domain_margin: 3.0,
            domain_contour_thickness: 1.0,
            draw_domains: true,
        }
    }
}

impl ArrowStyle {
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read style file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Invalid style file '{}'", path.display()))
    }

    /// Full band occupied by one drawn cluster: arrow body plus head
    /// overhang above and below.
    pub fn cluster_band_height(&self) -> f64 {
        2.0 * self.arrow_height
    }

    /// Vertical stride between stacked rows.
    pub fn row_height(&self) -> f64 {
        self.cluster_band_height() + self.gene_contour_thickness
    }

    /// Horizontal spacing between consecutive loci of one cluster.
    pub fn inter_locus_spacing(&self) -> f64 {
        self.arrow_height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_style_file_falls_back_to_defaults() {
        let style: ArrowStyle = serde_json::from_str(r#"{"scaling": 10.0}"#).unwrap();
        assert_eq!(style.scaling, 10.0);
        assert_eq!(style.arrow_height, ArrowStyle::default().arrow_height);
        assert!(style.draw_domains);
    }

    #[test]
    fn row_height_is_band_plus_contour() {
        let style = ArrowStyle::default();
        assert_eq!(style.row_height(), 62.0);
    }
}
