use anyhow::{bail, Context, Result};
use arrower::annotation::{classify_genes, predict_domains, MotifLibrary};
use arrower::filter::WorkingSet;
use arrower::ingest::{gather, GatherOptions};
use arrower::reference::resolve_reference;
use arrower::scene;
use arrower::style::ArrowStyle;
use clap::Parser;
use log::info;
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "arrower")]
#[command(version, about = "Generate SVG figures from GenBank files or serialized cluster objects.", long_about = None)]
struct Args {
    /// Folder(s) searched recursively for .gb and .gbk files.
    #[arg(short = 'i', long = "inputfolders", value_name = "FOLDER", num_args = 1..)]
    inputfolders: Vec<PathBuf>,

    /// File(s) to draw (.gb, .gbk, .bgc, .bgccase). For serialized inputs
    /// the name filters apply to the internal cluster identifier, not the
    /// file name.
    #[arg(short = 'f', long = "files", value_name = "FILE", num_args = 1..)]
    files: Vec<PathBuf>,

    /// Motif model file(s) (JSON) enabling protein-domain prediction. With
    /// 'draw_domains' disabled in the style, no prediction is made.
    #[arg(long = "models", value_name = "FILE", num_args = 1..)]
    models: Vec<PathBuf>,

    /// Cluster list file: one identifier per line, optional tab-separated
    /// reference-gene identifier, '#' lines ignored. Determines draw order
    /// and the stacked output name; reference genes drive mirroring and
    /// horizontal alignment.
    #[arg(short = 'l', long = "bgclist", value_name = "FILE")]
    bgclist: Option<PathBuf>,

    /// Accept only cluster identifiers containing one of these strings.
    /// Pass the flag with no values to disable the filter.
    #[arg(long = "include", value_name = "STRING", num_args = 0..,
          default_values_t = [String::from("region"), String::from("cluster")])]
    include: Vec<String>,

    /// Reject cluster identifiers containing any of these strings.
    #[arg(long = "exclude", value_name = "STRING", num_args = 0..,
          default_values_t = [String::from("final")])]
    exclude: Vec<String>,

    /// SVG style configuration (JSON); built-in defaults otherwise.
    #[arg(long = "cfg", value_name = "FILE")]
    cfg: Option<PathBuf>,

    /// Mirror each individual figure. Ignored with --stacked; overridden
    /// per cluster by a resolved reference gene from --bgclist.
    #[arg(short = 'm', long = "mirror")]
    mirror: bool,

    /// Re-predict domains for .bgc and .bgccase inputs even if they
    /// already carry domain data (input files are not rewritten).
    #[arg(long = "override")]
    override_annotation: bool,

    /// Number of worker threads for domain prediction and classification.
    /// Default: all available cores.
    #[arg(short = 'c', long = "cpus", value_name = "N")]
    cpus: Option<usize>,

    /// Folder where figures are written; created recursively if absent.
    #[arg(short = 'o', long = "outputfolder", value_name = "FOLDER", default_value = "output")]
    outputfolder: PathBuf,

    /// Put all clusters in one stacked figure instead of one SVG each.
    #[arg(short = 's', long = "stacked")]
    stacked: bool,

    /// With --stacked, leave an empty row for every cluster named in the
    /// list but missing from the input data.
    #[arg(short = 'g', long = "gaps")]
    gaps: bool,
}

fn main() {
    env_logger::init();
    if let Err(e) = run(Args::parse()) {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}

fn check_input_paths(args: &Args) -> Result<()> {
    if args.inputfolders.is_empty() && args.files.is_empty() {
        bail!("No input data. See options using -h");
    }
    for file in &args.files {
        if !file.is_file() {
            bail!("--files: '{}' is not a file", file.display());
        }
    }
    for folder in &args.inputfolders {
        if !folder.is_dir() {
            bail!("--inputfolders: '{}' is not a folder", folder.display());
        }
    }
    for model in &args.models {
        if !model.is_file() {
            bail!("--models: '{}' is not a file", model.display());
        }
    }
    if let Some(list) = &args.bgclist {
        if !list.is_file() {
            bail!("--bgclist: '{}' is not a file", list.display());
        }
    }
    Ok(())
}

fn run(args: Args) -> Result<()> {
    check_input_paths(&args)?;

    if let Some(threads) = args.cpus {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Could not configure the worker pool")?;
    }

    let working_list = match &args.bgclist {
        Some(path) => Some(WorkingSet::from_list_file(path)?),
        None => None,
    };
    let style = match &args.cfg {
        Some(path) => ArrowStyle::load_from_path(path)?,
        None => ArrowStyle::default(),
    };

    info!("Collecting data");
    if !args.include.is_empty() {
        info!("Including only clusters containing: {}", args.include.join(", "));
    }
    if !args.exclude.is_empty() {
        info!("Excluding clusters containing: {}", args.exclude.join(", "));
    }
    let gathered = gather(
        &args.inputfolders,
        &args.files,
        GatherOptions {
            include: &args.include,
            exclude: &args.exclude,
            allow: working_list.as_ref(),
            override_annotation: args.override_annotation,
        },
    )?;
    if gathered.total() == 0 {
        bail!("No valid input clusters found");
    }
    info!("Working with {} cluster(s)", gathered.total());

    fs::create_dir_all(&args.outputfolder).with_context(|| {
        format!(
            "Could not create output folder '{}'",
            args.outputfolder.display()
        )
    })?;

    let mut gathered = gathered;
    if style.draw_domains && !args.models.is_empty() {
        let library = MotifLibrary::from_files(&args.models)?;
        info!("Predicting domains with {} motif model(s)", library.len());
        predict_domains(&mut gathered.working, &library, args.override_annotation);
    }

    let mut collection = gathered.into_render_collection();
    classify_genes(&mut collection);

    if args.stacked {
        info!("Generating stacked figure");
        let working = match &working_list {
            Some(list) => list.clone(),
            None => WorkingSet::from_natural_order(collection.identifiers()),
        };
        let (document, layout) = scene::stacked_document(&working, &collection, &style, args.gaps);
        let file_name = match &args.bgclist {
            Some(path) => format!(
                "{}.svg",
                path.file_stem().unwrap_or_default().to_string_lossy()
            ),
            None => "stacked_figure.svg".to_string(),
        };
        let output = args.outputfolder.join(file_name);
        scene::write_document(&output, &document)?;
        info!(
            "Wrote stacked figure ({}x{}) to '{}'",
            layout.width,
            layout.height,
            output.display()
        );
    } else {
        info!("Generating individual figures");
        for cluster in collection.iter() {
            let mirror = match working_list
                .as_ref()
                .and_then(|list| list.reference_for(&cluster.identifier))
            {
                Some(reference) => {
                    let alignment = resolve_reference(cluster, Some(reference), &style);
                    if alignment.distance_to_reference.is_some() {
                        alignment.mirror
                    } else {
                        args.mirror
                    }
                }
                None => args.mirror,
            };
            let document = scene::individual_document(cluster, &style, mirror);
            let output = args
                .outputfolder
                .join(scene::individual_file_name(cluster, mirror));
            scene::write_document(&output, &document)?;
        }
        info!(
            "Wrote {} individual figure(s) to '{}'",
            collection.len(),
            args.outputfolder.display()
        );
    }
    Ok(())
}
