//! Gene-cluster data model and GenBank ingestion.
//!
//! A cluster is an ordered list of loci (one per GenBank record), each
//! carrying the genes found in its `CDS` features. Clusters round-trip
//! through JSON for the `.bgc` and `.bgccase` input formats.

use crate::feature_span::{feature_is_reverse, feature_spans_sorted};
use anyhow::{anyhow, Result};
use gb_io::seq::{Feature, Seq};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub accession: String,
    pub name: String,
    /// Amino-acid coordinates within the gene's translation.
    pub start: u64,
    pub end: u64,
    pub score: f64,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Gene {
    /// Primary identifier (GenBank `protein_id`).
    pub gene_id: String,
    /// Alternate identifier (`gene` or `locus_tag`); either may satisfy a
    /// reference-gene request.
    #[serde(default)]
    pub alt_id: Option<String>,
    pub forward: bool,
    /// Ascending, non-overlapping coordinate segments within the locus.
    pub spans: Vec<(u64, u64)>,
    #[serde(default)]
    pub product: Option<String>,
    /// Amino-acid sequence from the `translation` qualifier, if present.
    #[serde(default)]
    pub sequence: Option<String>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub role: Option<String>,
}

impl Gene {
    pub fn matches_id(&self, request: &str) -> bool {
        self.gene_id == request || self.alt_id.as_deref() == Some(request)
    }

    pub fn span_start(&self) -> u64 {
        self.spans.first().map(|(start, _)| *start).unwrap_or(0)
    }

    pub fn span_end(&self) -> u64 {
        self.spans.last().map(|(_, end)| *end).unwrap_or(0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Locus {
    pub name: String,
    pub length: u64,
    pub genes: Vec<Gene>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneCluster {
    pub identifier: String,
    pub loci: Vec<Locus>,
    /// Ordered distinct biosynthetic roles found among the genes.
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub needs_annotation: bool,
}

fn qualifier_text(feature: &Feature, key: &str) -> Option<String> {
    feature
        .qualifier_values(key.into())
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

fn gene_from_cds(feature: &Feature, ordinal: usize) -> Option<Gene> {
    let spans = feature_spans_sorted(feature);
    if spans.is_empty() {
        return None;
    }
    let gene_id = qualifier_text(feature, "protein_id")
        .unwrap_or_else(|| format!("cds_{ordinal}"));
    let alt_id =
        qualifier_text(feature, "gene").or_else(|| qualifier_text(feature, "locus_tag"));
    Some(Gene {
        gene_id,
        alt_id,
        forward: !feature_is_reverse(feature),
        spans,
        product: qualifier_text(feature, "product"),
        sequence: qualifier_text(feature, "translation").map(|t| t.replace(char::is_whitespace, "")),
        domains: vec![],
        role: None,
    })
}

fn locus_from_record(seq: Seq, ordinal: usize) -> Locus {
    let mut genes: Vec<Gene> = seq
        .features
        .iter()
        .filter(|feature| feature.kind.to_string().to_ascii_uppercase() == "CDS")
        .enumerate()
        .filter_map(|(i, feature)| gene_from_cds(feature, i))
        .collect();
    genes.sort_by_key(Gene::span_start);

    let max_gene_end = genes.iter().map(Gene::span_end).max().unwrap_or(0);
    let length = (seq.seq.len() as u64)
        .max(seq.len.unwrap_or(0) as u64)
        .max(max_gene_end);

    Locus {
        name: seq.name.unwrap_or_else(|| format!("locus_{ordinal}")),
        length,
        genes,
    }
}

impl GeneCluster {
    /// Parses one GenBank file into a cluster, one locus per record. The
    /// cluster identifier is the file stem, matching how the reference list
    /// names clusters.
    pub fn from_genbank_file(path: &Path) -> Result<Self> {
        let identifier = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .ok_or_else(|| anyhow!("No file stem for '{}'", path.display()))?;
        let records = gb_io::reader::parse_file(path)?;
        let loci: Vec<Locus> = records
            .into_iter()
            .enumerate()
            .map(|(i, record)| locus_from_record(record, i))
            .collect();
        if loci.is_empty() {
            return Err(anyhow!("No records in '{}'", path.display()));
        }
        Ok(GeneCluster {
            identifier,
            loci,
            tags: vec![],
            needs_annotation: true,
        })
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn genes(&self) -> impl Iterator<Item = &Gene> {
        self.loci.iter().flat_map(|locus| locus.genes.iter())
    }

    pub fn genes_mut(&mut self) -> impl Iterator<Item = &mut Gene> {
        self.loci.iter_mut().flat_map(|locus| locus.genes.iter_mut())
    }

    /// First gene matching the request, scanning loci in order.
    pub fn find_gene(&self, request: &str) -> Option<&Gene> {
        self.genes().find(|gene| gene.matches_id(request))
    }
}

/// Insertion-ordered cluster set. Replacing an existing identifier keeps its
/// original position; iteration never depends on map order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(from = "Vec<GeneCluster>", into = "Vec<GeneCluster>")]
pub struct ClusterCollection {
    clusters: Vec<GeneCluster>,
    index: HashMap<String, usize>,
}

impl ClusterCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, cluster: GeneCluster) -> Option<GeneCluster> {
        match self.index.get(&cluster.identifier) {
            Some(&slot) => Some(std::mem::replace(&mut self.clusters[slot], cluster)),
            None => {
                self.index.insert(cluster.identifier.clone(), self.clusters.len());
                self.clusters.push(cluster);
                None
            }
        }
    }

    pub fn remove(&mut self, identifier: &str) -> Option<GeneCluster> {
        let slot = self.index.remove(identifier)?;
        let removed = self.clusters.remove(slot);
        for position in self.index.values_mut() {
            if *position > slot {
                *position -= 1;
            }
        }
        Some(removed)
    }

    pub fn get(&self, identifier: &str) -> Option<&GeneCluster> {
        self.index.get(identifier).map(|&slot| &self.clusters[slot])
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GeneCluster> {
        self.clusters.iter()
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> {
        self.clusters.iter().map(|cluster| cluster.identifier.as_str())
    }

    pub fn clusters_mut(&mut self) -> &mut [GeneCluster] {
        &mut self.clusters
    }

    pub fn extend_from(&mut self, other: ClusterCollection) {
        for cluster in other.clusters {
            self.insert(cluster);
        }
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

impl From<Vec<GeneCluster>> for ClusterCollection {
    fn from(clusters: Vec<GeneCluster>) -> Self {
        let mut collection = ClusterCollection::new();
        for cluster in clusters {
            collection.insert(cluster);
        }
        collection
    }
}

impl From<ClusterCollection> for Vec<GeneCluster> {
    fn from(collection: ClusterCollection) -> Self {
        collection.clusters
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn gene(id: &str, forward: bool, start: u64, end: u64) -> Gene {
        Gene {
            gene_id: id.to_string(),
            alt_id: None,
            forward,
            spans: vec![(start, end)],
            product: None,
            sequence: None,
            domains: vec![],
            role: None,
        }
    }

    pub fn single_locus_cluster(id: &str, length: u64, genes: Vec<Gene>) -> GeneCluster {
        GeneCluster {
            identifier: id.to_string(),
            loci: vec![Locus {
                name: format!("{id}_locus"),
                length,
                genes,
            }],
            tags: vec![],
            needs_annotation: false,
        }
    }
}
