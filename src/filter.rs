//! Cluster name filtering and the ordered working set.

use anyhow::{bail, Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Substring include/exclude rules plus an optional exact-identifier
/// allow-list. An empty include or exclude set is pass-all; a non-empty
/// allow-list additionally requires membership.
pub fn accepts(identifier: &str, include: &[String], exclude: &[String], allow: Option<&WorkingSet>) -> bool {
    if !include.is_empty() && !include.iter().any(|word| identifier.contains(word.as_str())) {
        return false;
    }
    if exclude.iter().any(|word| identifier.contains(word.as_str())) {
        return false;
    }
    match allow {
        Some(list) if !list.is_empty() => list.contains(identifier),
        _ => true,
    }
}

#[derive(Clone, Debug)]
pub struct WorkingEntry {
    pub identifier: String,
    /// Reference-gene identifier used for mirroring and alignment.
    pub reference: Option<String>,
}

/// The ordered list of cluster identifiers to draw, with the per-cluster
/// reference-gene requests. Immutable once built; draw order is the entry
/// order, never map iteration order.
#[derive(Clone, Debug, Default)]
pub struct WorkingSet {
    entries: Vec<WorkingEntry>,
    index: HashMap<String, usize>,
}

impl WorkingSet {
    /// Reads a reference list file: tab-separated, first column the cluster
    /// identifier, optional second column the reference-gene identifier,
    /// `#` lines ignored, extra columns ignored. Identifiers are
    /// case-sensitive. An empty file is a user error.
    pub fn from_list_file(path: &Path) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .comment(Some(b'#'))
            .from_path(path)
            .with_context(|| format!("Could not read cluster list '{}'", path.display()))?;

        let mut set = WorkingSet::default();
        for record in reader.records() {
            let record =
                record.with_context(|| format!("Bad row in cluster list '{}'", path.display()))?;
            let identifier = match record.get(0).map(str::trim) {
                Some(id) if !id.is_empty() => id.to_string(),
                _ => continue,
            };
            let reference = record
                .get(1)
                .map(str::trim)
                .filter(|pid| !pid.is_empty())
                .map(ToOwned::to_owned);
            set.push(identifier, reference);
        }
        if set.is_empty() {
            bail!(
                "Cluster list '{}' was given but contains no entries",
                path.display()
            );
        }
        Ok(set)
    }

    /// Working set in natural discovery order, with no reference requests.
    pub fn from_natural_order<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut set = WorkingSet::default();
        for identifier in identifiers {
            set.push(identifier.into(), None);
        }
        set
    }

    fn push(&mut self, identifier: String, reference: Option<String>) {
        if self.index.contains_key(&identifier) {
            return;
        }
        self.index.insert(identifier.clone(), self.entries.len());
        self.entries.push(WorkingEntry {
            identifier,
            reference,
        });
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkingEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.index.contains_key(identifier)
    }

    pub fn reference_for(&self, identifier: &str) -> Option<&str> {
        self.index
            .get(identifier)
            .and_then(|&slot| self.entries[slot].reference.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn strings(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn include_and_exclude_compose() {
        let include = strings(&["region"]);
        let exclude = strings(&["final"]);
        let ids = ["abc_region_1", "abc_region_final", "xyz_cluster"];
        let passed: Vec<&str> = ids
            .iter()
            .copied()
            .filter(|id| accepts(id, &include, &exclude, None))
            .collect();
        assert_eq!(passed, vec!["abc_region_1"]);
    }

    #[test]
    fn empty_include_passes_all() {
        assert!(accepts("anything", &[], &[], None));
    }

    #[test]
    fn allow_list_requires_membership() {
        let allow = WorkingSet::from_natural_order(["keep_region"]);
        let include = strings(&["region"]);
        assert!(accepts("keep_region", &include, &[], Some(&allow)));
        assert!(!accepts("drop_region", &include, &[], Some(&allow)));
    }

    #[test]
    fn list_file_parses_order_references_and_comments() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# comment line").unwrap();
        writeln!(file, "cluster_b\tprot_77\textra_ignored").unwrap();
        writeln!(file, "cluster_a").unwrap();
        let set = WorkingSet::from_list_file(file.path()).unwrap();
        assert_eq!(
            set.iter().map(|e| e.identifier.as_str()).collect::<Vec<_>>(),
            vec!["cluster_b", "cluster_a"]
        );
        assert_eq!(set.reference_for("cluster_b"), Some("prot_77"));
        assert_eq!(set.reference_for("cluster_a"), None);
    }

    #[test]
    fn empty_list_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# only comments").unwrap();
        assert!(WorkingSet::from_list_file(file.path()).is_err());
    }
}
