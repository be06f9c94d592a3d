//! Input resolution and collection building.
//!
//! Every candidate path is classified once into a tagged input kind; the
//! filter rules then decide which clusters enter the working set. Raw
//! GenBank records still need domain prediction, serialized inputs only
//! when `--override` asks for it.

use crate::cluster::{ClusterCollection, GeneCluster};
use crate::filter::{accepts, WorkingSet};
use anyhow::{Context, Result};
use log::warn;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Input kinds, resolved once by file extension.
#[derive(Clone, Debug, PartialEq)]
pub enum InputRecord {
    /// Raw GenBank annotation record (`.gb`/`.gbk`); domain prediction pending.
    GenBank(PathBuf),
    /// One serialized, possibly pre-annotated cluster (`.bgc`).
    Cluster(PathBuf),
    /// A serialized cluster collection (`.bgccase`).
    Collection(PathBuf),
}

impl InputRecord {
    pub fn classify(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "gb" | "gbk" => Some(InputRecord::GenBank(path.to_path_buf())),
            "bgc" => Some(InputRecord::Cluster(path.to_path_buf())),
            "bgccase" => Some(InputRecord::Collection(path.to_path_buf())),
            _ => None,
        }
    }

    pub fn needs_annotation(&self) -> bool {
        matches!(self, InputRecord::GenBank(_))
    }
}

/// Immutable per-run ingestion options; passed explicitly, never read from
/// globals.
#[derive(Clone, Copy, Debug)]
pub struct GatherOptions<'a> {
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub allow: Option<&'a WorkingSet>,
    pub override_annotation: bool,
}

impl GatherOptions<'_> {
    fn accepts(&self, identifier: &str) -> bool {
        accepts(identifier, self.include, self.exclude, self.allow)
    }
}

#[derive(Debug, Default)]
pub struct GatheredClusters {
    /// Clusters that still need domain prediction.
    pub working: ClusterCollection,
    /// Pre-annotated clusters taken as-is from serialized inputs.
    pub external: ClusterCollection,
}

impl GatheredClusters {
    pub fn total(&self) -> usize {
        self.working.len() + self.external.len()
    }

    /// Merged render collection, serialized inputs overriding raw ones.
    pub fn into_render_collection(self) -> ClusterCollection {
        let mut merged = self.working;
        merged.extend_from(self.external);
        merged
    }
}

/// Recursively collects GenBank files under each folder. Within one run
/// `.gb` files are listed before `.gbk` so a `.gbk` twin wins the
/// duplicate-identifier rule, matching the original tool's preference.
pub fn discover_genbank_files(folders: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut gb_files = Vec::new();
    let mut gbk_files = Vec::new();
    for folder in folders {
        walk_folder(folder, &mut gb_files, &mut gbk_files)?;
    }
    gb_files.sort();
    gbk_files.sort();
    gb_files.extend(gbk_files);
    Ok(gb_files)
}

fn walk_folder(folder: &Path, gb: &mut Vec<PathBuf>, gbk: &mut Vec<PathBuf>) -> Result<()> {
    for entry in std::fs::read_dir(folder)
        .with_context(|| format!("Could not read folder '{}'", folder.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            walk_folder(&path, gb, gbk)?;
            continue;
        }
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("gb") => gb.push(path),
            Some(ext) if ext.eq_ignore_ascii_case("gbk") => gbk.push(path),
            _ => {}
        }
    }
    Ok(())
}

struct Gatherer<'a> {
    options: GatherOptions<'a>,
    origins: HashMap<String, PathBuf>,
    gathered: GatheredClusters,
}

impl Gatherer<'_> {
    fn note_origin(&mut self, identifier: &str, path: &Path) -> bool {
        match self
            .origins
            .insert(identifier.to_string(), path.to_path_buf())
        {
            Some(previous) => {
                warn!(
                    "Substituting '{}' with '{}' for cluster '{}'",
                    previous.display(),
                    path.display(),
                    identifier
                );
                true
            }
            None => false,
        }
    }

    fn add_genbank(&mut self, path: &Path) -> Result<()> {
        let Some(stem) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
            return Ok(());
        };
        if !self.options.accepts(&stem) {
            return Ok(());
        }
        let cluster = GeneCluster::from_genbank_file(path)?;
        self.note_origin(&cluster.identifier, path);
        self.gathered.working.insert(cluster);
        Ok(())
    }

    fn add_serialized(&mut self, mut cluster: GeneCluster, path: &Path) {
        if !self.options.accepts(&cluster.identifier) {
            return;
        }
        let duplicate = self.note_origin(&cluster.identifier, path);
        if duplicate && !self.options.override_annotation {
            self.gathered.working.remove(&cluster.identifier);
        }
        if self.options.override_annotation {
            cluster.needs_annotation = true;
            self.gathered.working.insert(cluster);
        } else {
            self.gathered.external.insert(cluster);
        }
    }

    fn add_record(&mut self, record: InputRecord) -> Result<()> {
        match record {
            InputRecord::GenBank(path) => self.add_genbank(&path),
            InputRecord::Cluster(path) => {
                let cluster = GeneCluster::from_json_file(&path)
                    .with_context(|| format!("Could not load cluster '{}'", path.display()))?;
                self.add_serialized(cluster, &path);
                Ok(())
            }
            InputRecord::Collection(path) => {
                let collection = ClusterCollection::from_json_file(&path).with_context(|| {
                    format!("Could not load cluster collection '{}'", path.display())
                })?;
                for cluster in Vec::<GeneCluster>::from(collection) {
                    self.add_serialized(cluster, &path);
                }
                Ok(())
            }
        }
    }
}

/// Reads all input sources, applying the name filters. Later sources win
/// duplicate identifiers; unknown extensions are skipped with a warning.
pub fn gather(
    folders: &[PathBuf],
    files: &[PathBuf],
    options: GatherOptions<'_>,
) -> Result<GatheredClusters> {
    let mut gatherer = Gatherer {
        options,
        origins: HashMap::new(),
        gathered: GatheredClusters::default(),
    };

    for path in discover_genbank_files(folders)? {
        gatherer.add_genbank(&path)?;
    }
    for path in files {
        match InputRecord::classify(path) {
            Some(record) => gatherer.add_record(record)?,
            None => warn!("Unknown format '{}'", path.display()),
        }
    }
    Ok(gatherer.gathered)
}
