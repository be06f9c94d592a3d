//! Optional protein-domain annotation and gene classification.
//!
//! Domain prediction matches motif models (regular expressions over the
//! amino-acid translation) against every gene of every cluster still
//! flagged as needing annotation. Both prediction and classification fan
//! out across clusters with rayon; the layout pipeline only ever consumes
//! their completed results.

use crate::cluster::{ClusterCollection, Domain, Gene};
use anyhow::{Context, Result};
use itertools::Itertools;
use rayon::prelude::*;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MotifModel {
    pub accession: String,
    pub name: String,
    /// Regular expression over the amino-acid alphabet.
    pub pattern: String,
    #[serde(default)]
    pub bits: f64,
}

struct CompiledMotif {
    model: MotifModel,
    regex: Regex,
}

/// A set of motif models loaded from one or more JSON model files.
#[derive(Default)]
pub struct MotifLibrary {
    motifs: Vec<CompiledMotif>,
}

impl MotifLibrary {
    pub fn from_files(paths: &[impl AsRef<Path>]) -> Result<Self> {
        let mut library = MotifLibrary::default();
        for path in paths {
            library.add_model_file(path.as_ref())?;
        }
        Ok(library)
    }

    pub fn add_model_file(&mut self, path: &Path) -> Result<()> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Could not read model file '{}'", path.display()))?;
        let models: Vec<MotifModel> = serde_json::from_str(&text)
            .with_context(|| format!("Invalid model file '{}'", path.display()))?;
        for model in models {
            let regex = Regex::new(&model.pattern).with_context(|| {
                format!(
                    "Bad pattern for motif '{}' in '{}'",
                    model.accession,
                    path.display()
                )
            })?;
            self.motifs.push(CompiledMotif { model, regex });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.motifs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.motifs.is_empty()
    }

    /// All motif hits in one translation, ascending by start coordinate.
    pub fn scan(&self, sequence: &str) -> Vec<Domain> {
        let mut domains: Vec<Domain> = self
            .motifs
            .iter()
            .flat_map(|motif| {
                motif.regex.find_iter(sequence).map(|hit| Domain {
                    accession: motif.model.accession.clone(),
                    name: motif.model.name.clone(),
                    start: hit.start() as u64,
                    end: hit.end() as u64,
                    score: motif.model.bits,
                })
            })
            .collect();
        domains.sort_by(|a, b| a.start.cmp(&b.start).then(a.end.cmp(&b.end)));
        domains
    }
}

/// Runs domain prediction across the collection. Clusters already carrying
/// annotation are skipped unless `override_existing` is set; annotated
/// clusters drop their needs-annotation flag.
pub fn predict_domains(
    collection: &mut ClusterCollection,
    library: &MotifLibrary,
    override_existing: bool,
) {
    collection
        .clusters_mut()
        .par_iter_mut()
        .for_each(|cluster| {
            if !cluster.needs_annotation && !override_existing {
                return;
            }
            for gene in cluster.genes_mut() {
                if let Some(sequence) = gene.sequence.as_deref() {
                    gene.domains = library.scan(sequence);
                }
            }
            cluster.needs_annotation = false;
        });
}

fn role_for(gene: &Gene) -> Option<&'static str> {
    let mut text = gene.product.clone().unwrap_or_default();
    for domain in &gene.domains {
        text.push(' ');
        text.push_str(&domain.name);
    }
    let text = text.to_ascii_lowercase();

    let pks = text.contains("polyketide") || text.contains("ketosynthase") || text.contains("pks");
    let nrps = text.contains("nonribosomal")
        || text.contains("non-ribosomal")
        || text.contains("peptide synthetase")
        || text.contains("nrps");
    match (pks, nrps) {
        (true, true) => Some("Hybrid"),
        (true, false) => Some("PKS"),
        (false, true) => Some("NRPS"),
        (false, false) => {
            if text.contains("terpene") {
                Some("Terpene")
            } else if text.contains("prenyltransferase") || text.contains("dimethylallyl") {
                Some("DMATS")
            } else {
                None
            }
        }
    }
}

/// Assigns biosynthetic roles to genes and derives cluster classification
/// tags as the ordered distinct roles. Tags feed the individual-mode
/// output filename; layout never reads them.
pub fn classify_genes(collection: &mut ClusterCollection) {
    collection
        .clusters_mut()
        .par_iter_mut()
        .for_each(|cluster| {
            for gene in cluster.genes_mut() {
                gene.role = role_for(gene).map(ToOwned::to_owned);
            }
            cluster.tags = cluster
                .genes()
                .filter_map(|gene| gene.role.clone())
                .unique()
                .collect();
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::test_support::{gene, single_locus_cluster};
    use std::io::Write;

    fn library_with(pattern: &str) -> MotifLibrary {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"accession":"PF00109","name":"ketosynthase","pattern":"{pattern}","bits":25.0}}]"#
        )
        .unwrap();
        MotifLibrary::from_files(&[file.path()]).unwrap()
    }

    fn gene_with_sequence(id: &str, sequence: &str) -> Gene {
        let mut g = gene(id, true, 0, 3 * sequence.len() as u64);
        g.sequence = Some(sequence.to_string());
        g
    }

    #[test]
    fn scan_reports_sorted_aa_coordinates() {
        let library = library_with("KS[IL]");
        let domains = library.scan("AAKSIAAAKSLA");
        assert_eq!(domains.len(), 2);
        assert_eq!((domains[0].start, domains[0].end), (2, 5));
        assert_eq!((domains[1].start, domains[1].end), (8, 11));
        assert_eq!(domains[0].accession, "PF00109");
        assert_eq!(domains[0].score, 25.0);
    }

    #[test]
    fn prediction_skips_annotated_clusters_unless_overridden() {
        let library = library_with("KSI");
        let mut collection = ClusterCollection::new();
        let mut cluster =
            single_locus_cluster("done", 100, vec![gene_with_sequence("g", "AAKSIAA")]);
        cluster.needs_annotation = false;
        collection.insert(cluster);

        predict_domains(&mut collection, &library, false);
        assert!(collection.get("done").unwrap().genes().next().unwrap().domains.is_empty());

        predict_domains(&mut collection, &library, true);
        let annotated = collection.get("done").unwrap();
        assert_eq!(annotated.genes().next().unwrap().domains.len(), 1);
        assert!(!annotated.needs_annotation);
    }

    #[test]
    fn prediction_clears_the_needs_annotation_flag() {
        let library = library_with("KSI");
        let mut collection = ClusterCollection::new();
        let mut cluster =
            single_locus_cluster("fresh", 100, vec![gene_with_sequence("g", "KSIKSI")]);
        cluster.needs_annotation = true;
        collection.insert(cluster);
        predict_domains(&mut collection, &library, false);
        let annotated = collection.get("fresh").unwrap();
        assert!(!annotated.needs_annotation);
        assert_eq!(annotated.genes().next().unwrap().domains.len(), 2);
    }

    #[test]
    fn classification_tags_are_ordered_and_distinct() {
        let mut pks_a = gene("a", true, 0, 30);
        pks_a.product = Some("polyketide synthase".to_string());
        let mut nrps = gene("b", true, 40, 70);
        nrps.product = Some("nonribosomal peptide synthetase".to_string());
        let mut pks_b = gene("c", true, 80, 110);
        pks_b.product = Some("ketosynthase domain protein".to_string());

        let mut collection = ClusterCollection::new();
        collection.insert(single_locus_cluster("c1", 200, vec![pks_a, nrps, pks_b]));
        classify_genes(&mut collection);

        let cluster = collection.get("c1").unwrap();
        assert_eq!(cluster.tags, vec!["PKS", "NRPS"]);
    }

    #[test]
    fn hybrid_product_text_wins_over_single_roles() {
        let mut g = gene("a", true, 0, 30);
        g.product = Some("hybrid PKS-NRPS enzyme".to_string());
        let mut collection = ClusterCollection::new();
        collection.insert(single_locus_cluster("c1", 100, vec![g]));
        classify_genes(&mut collection);
        assert_eq!(collection.get("c1").unwrap().tags, vec!["Hybrid"]);
    }

    #[test]
    fn bad_pattern_is_a_load_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"accession":"X","name":"broken","pattern":"(["}}]"#
        )
        .unwrap();
        assert!(MotifLibrary::from_files(&[file.path()]).is_err());
    }
}
