//! skinio CLI - export, import and version skin weight records.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use skinio::ops::{self, BatchReport};
use skinio::pack::PackManifest;
use skinio::record::{parse_header, FieldValue, RecordStore};
use skinio::scene::MemoryScene;
use skinio::versioning::VersionStore;
use skinio::Config;
use tracing_subscriber::EnvFilter;

/// Verbosity selected on the command line.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Verbosity {
    Quiet,
    Info,
    Debug,
    Trace,
}

impl Verbosity {
    fn directive(self) -> &'static str {
        match self {
            Self::Quiet => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}

/// `RUST_LOG` wins over the `-v`/`-q` flags.
fn init_logging(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.directive()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Options shared by every command.
#[derive(Default)]
struct Options {
    scene: Option<PathBuf>,
    config: Option<PathBuf>,
    dir: Option<PathBuf>,
    objects: Vec<String>,
    version: Option<u32>,
    versioned: Option<bool>,
    skip_skinned: Option<bool>,
    positional: Vec<String>,
}

impl Options {
    fn parse(args: &[&str]) -> Result<Self> {
        let mut opts = Self::default();
        let mut iter = args.iter();
        while let Some(&arg) = iter.next() {
            let mut value = |name: &str| {
                iter.next()
                    .map(|s| s.to_string())
                    .with_context(|| format!("{name} needs a value"))
            };
            match arg {
                "--scene" | "-s" => opts.scene = Some(PathBuf::from(value(arg)?)),
                "--config" | "-c" => opts.config = Some(PathBuf::from(value(arg)?)),
                "--dir" | "-d" => opts.dir = Some(PathBuf::from(value(arg)?)),
                "--objects" | "-o" => opts
                    .objects
                    .extend(value(arg)?.split(',').filter(|s| !s.is_empty()).map(str::to_string)),
                "--version" | "-n" => {
                    let v = value(arg)?;
                    opts.version = Some(v.parse().with_context(|| format!("invalid version '{v}'"))?);
                }
                "--versioned" => opts.versioned = Some(true),
                "--no-versioned" => opts.versioned = Some(false),
                "--skip-skinned" => opts.skip_skinned = Some(true),
                "--no-skip-skinned" => opts.skip_skinned = Some(false),
                s if s.starts_with("--") => bail!("unknown option '{s}'"),
                s => opts.positional.push(s.to_string()),
            }
        }
        Ok(opts)
    }

    /// `--config`, else the per-user default location, else built-in defaults.
    fn load_config(&self) -> Result<Config> {
        let mut config = match (&self.config, Config::default_path()) {
            (Some(path), _) => Config::load(path).with_context(|| format!("loading config {}", path.display()))?,
            (None, Some(path)) => Config::load_or_default(&path)?,
            (None, None) => Config::default(),
        };
        if let Some(skip) = self.skip_skinned {
            config.skip_already_skinned = skip;
        }
        Ok(config)
    }

    fn scene_path(&self) -> Result<&Path> {
        self.scene.as_deref().context("--scene <scene.json> is required")
    }

    fn skin_dir(&self, config: &Config) -> Result<PathBuf> {
        self.dir
            .clone()
            .or_else(|| config.skin_dir.clone())
            .context("--dir is required (or set skin_dir in the config)")
    }

    fn versioned(&self, config: &Config) -> bool {
        self.versioned.unwrap_or(config.versioning)
    }

    /// Positional objects plus `--objects`, falling back to the tracked list.
    fn export_objects(&self, skip: usize, config: &Config) -> Vec<String> {
        let mut objects: Vec<String> = self.positional.iter().skip(skip).cloned().collect();
        objects.extend(self.objects.iter().cloned());
        if objects.is_empty() {
            objects = config.tracked_objects.clone();
        }
        objects
    }
}

fn main() {
    let args: Vec<String> = env::args().collect();

    // Parse global flags
    let mut verbosity = Verbosity::Info;
    let mut filtered_args: Vec<&str> = Vec::new();
    for arg in &args[1..] {
        match arg.as_str() {
            "-v" | "--verbose" => verbosity = Verbosity::Debug,
            "-vv" | "--trace" => verbosity = Verbosity::Trace,
            "-q" | "--quiet" => verbosity = Verbosity::Quiet,
            _ => filtered_args.push(arg),
        }
    }
    init_logging(verbosity);

    if filtered_args.is_empty() {
        print_help();
        return;
    }

    let command = filtered_args[0];
    let result = Options::parse(&filtered_args[1..]).and_then(|opts| match command {
        "export" | "e" => cmd_export(&opts),
        "import" | "im" => cmd_import(&opts),
        "export-pack" | "ep" => cmd_export_pack(&opts),
        "import-pack" | "ip" => cmd_import_pack(&opts),
        "versions" | "ls" => cmd_versions(&opts),
        "archive" | "a" => cmd_archive(&opts),
        "info" | "i" => cmd_info(&opts),
        "version" | "--version" | "-V" => {
            print_version();
            Ok(true)
        }
        "help" | "h" | "--help" | "-h" => {
            print_help();
            Ok(true)
        }
        other => bail!("unknown command '{other}' (try 'skinio help')"),
    });

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }
}

fn print_version() {
    println!(
        "skinio {} (built {} {})",
        env!("CARGO_PKG_VERSION"),
        env!("SKINIO_BUILD_DATE"),
        env!("SKINIO_BUILD_TIME")
    );
}

fn print_help() {
    println!("skinio - skin weight record toolkit");
    println!();
    println!("USAGE:");
    println!("    skinio [OPTIONS] <COMMAND> [ARGS]");
    println!();
    println!("COMMANDS:");
    println!("    e, export       <objects...>        Export skins to <dir>/<object><ext>");
    println!("    im, import                          Import every record in <dir> onto the scene");
    println!("    ep, export-pack <pack> <objects...> Export skins next to <pack> and write the manifest");
    println!("    ip, import-pack <pack>              Import the members of a pack manifest");
    println!("    ls, versions    <file>              List the versions of a record or pack");
    println!("    a, archive      <file> <n...>       Archive versions and renumber the rest");
    println!("    i, info         <file>              Show the header and fields of a record");
    println!("    h, help                             Show this help");
    println!();
    println!("OPTIONS:");
    println!("    -s, --scene <scene.json>   Scene to read from / write to");
    println!("    -c, --config <file>        Config file (default: user config dir)");
    println!("    -d, --dir <dir>            Skin directory (default: config skin_dir)");
    println!("    -o, --objects <a,b,...>    Objects to export or import");
    println!("    -n, --version <n>          Import version n of a single object");
    println!("    --versioned                Snapshot existing files before overwriting");
    println!("    --[no-]skip-skinned        Skip objects that already have a skin");
    println!("    -v, --verbose              Show debug output");
    println!("    -vv, --trace               Show trace output (very verbose)");
    println!("    -q, --quiet                Only show warnings and errors");
    println!();
    println!("EXAMPLES:");
    println!("    skinio -s rig.json export body head -d skins --versioned");
    println!("    skinio -s rig.json import -d skins --no-skip-skinned");
    println!("    skinio -s rig.json import -d skins -o body -n 2");
    println!("    skinio -s rig.json export-pack skins/rig.skinpack body head");
    println!("    skinio versions skins/body.skinrecord");
    println!("    skinio archive skins/body.skinrecord 1 2");
    println!();
    println!("NOTES:");
    println!("    - RUST_LOG overrides -v/-q");
    println!("    - Import commands save the updated scene back to --scene");
}

/// Print a batch summary; `true` when nothing failed.
fn report(label: &str, report: &BatchReport) -> bool {
    for warning in &report.warnings {
        println!("warning: {warning}");
    }
    for (name, reason) in &report.skipped {
        println!("skipped: {name} ({reason})");
    }
    for (name, err) in &report.failed {
        eprintln!("failed:  {name}: {err}");
    }
    println!(
        "{label}: {} ok, {} skipped, {} failed",
        report.succeeded.len(),
        report.skipped.len(),
        report.failed.len()
    );
    report.is_success()
}

fn cmd_export(opts: &Options) -> Result<bool> {
    let config = opts.load_config()?;
    let scene = MemoryScene::load(opts.scene_path()?)?;
    let dir = opts.skin_dir(&config)?;
    let objects = opts.export_objects(0, &config);
    let batch = ops::export_skins(&scene, &dir, &objects, opts.versioned(&config), &config)?;
    Ok(report("export", &batch))
}

fn cmd_import(opts: &Options) -> Result<bool> {
    let config = opts.load_config()?;
    let scene_path = opts.scene_path()?;
    let mut scene = MemoryScene::load(scene_path)?;
    let dir = opts.skin_dir(&config)?;

    let ok = match opts.version {
        Some(version) => {
            let [object] = opts.objects.as_slice() else {
                bail!("--version needs exactly one object in --objects");
            };
            let artifact = dir.join(format!("{object}{}", config.file_ext));
            let deformer = ops::import_version(&mut scene, &artifact, version, &config)
                .with_context(|| format!("importing version {version} of {}", artifact.display()))?;
            println!("import: {object} v{version} -> {deformer}");
            true
        }
        None => {
            let batch = ops::import_skins(&mut scene, &dir, &opts.objects, &config)?;
            report("import", &batch)
        }
    };
    scene.save(scene_path)?;
    Ok(ok)
}

fn cmd_export_pack(opts: &Options) -> Result<bool> {
    let config = opts.load_config()?;
    let Some(pack) = opts.positional.first() else {
        bail!("usage: skinio export-pack <pack> <objects...>");
    };
    let scene = MemoryScene::load(opts.scene_path()?)?;
    let objects = opts.export_objects(1, &config);
    let batch = ops::export_pack(&scene, Path::new(pack), &objects, opts.versioned(&config), &config)?;
    Ok(report("export-pack", &batch))
}

fn cmd_import_pack(opts: &Options) -> Result<bool> {
    let config = opts.load_config()?;
    let Some(pack) = opts.positional.first() else {
        bail!("usage: skinio import-pack <pack>");
    };
    let scene_path = opts.scene_path()?;
    let mut scene = MemoryScene::load(scene_path)?;
    let batch = ops::import_pack(&mut scene, Path::new(pack), &config)?;
    scene.save(scene_path)?;
    Ok(report("import-pack", &batch))
}

fn cmd_versions(opts: &Options) -> Result<bool> {
    let Some(path) = opts.positional.first() else {
        bail!("usage: skinio versions <file>");
    };
    let entries = VersionStore::new().versions(path)?;
    if entries.is_empty() {
        println!("{path}: no versions");
        return Ok(true);
    }
    for entry in &entries {
        let modified = entry
            .modified
            .map(|m| time::OffsetDateTime::from(m).date().to_string())
            .unwrap_or_else(|| "-".to_string());
        let latest = if entry.is_latest() { "  (latest)" } else { "" };
        println!("v{:04}  {}  {}{}", entry.number, modified, entry.path.display(), latest);
    }
    Ok(true)
}

fn cmd_archive(opts: &Options) -> Result<bool> {
    let Some((path, numbers)) = opts.positional.split_first() else {
        bail!("usage: skinio archive <file> <n...>");
    };
    let selected = numbers
        .iter()
        .map(|n| n.trim_start_matches('v').parse::<u32>().with_context(|| format!("invalid version '{n}'")))
        .collect::<Result<Vec<_>>>()?;
    if selected.is_empty() {
        bail!("no versions given");
    }

    let archived = VersionStore::new().archive(path, &selected)?;
    if let Some(dir) = &archived.archive_dir {
        println!("archived {} version(s) to {}", archived.archived.len(), dir.display());
    }
    for (from, to) in &archived.renamed {
        println!("  {} -> {}", from.display(), to.display());
    }
    println!("{} version(s) remain", archived.remaining);
    Ok(true)
}

fn cmd_info(opts: &Options) -> Result<bool> {
    let Some(path) = opts.positional.first() else {
        bail!("usage: skinio info <file>");
    };
    let config = opts.load_config()?;

    if path.ends_with(&config.pack_ext) {
        let pack = PackManifest::load(path)?;
        println!("Pack: {path}");
        println!("Root: {}", pack.root_path().display());
        for member in pack.members() {
            println!("  {member}");
        }
        return Ok(true);
    }

    let data = std::fs::read(path).with_context(|| format!("reading {path}"))?;
    let header = parse_header(&data)?;
    let store = RecordStore::from_config(&config);
    let fields = store.load_fields(&data)?;

    println!("Record: {path}");
    println!("Format: v{} ({})", header.version, if header.is_compressed() { "zlib" } else { "plain" });
    println!("Fields:");
    for (name, value) in fields.iter() {
        let summary = match value {
            FieldValue::F64Array(v) => format!("f64[{}]", v.len()),
            FieldValue::I64Array(v) => format!("i64[{}]", v.len()),
            FieldValue::StrArray(v) => format!("string[{}]", v.len()),
            FieldValue::Str(s) => format!("\"{s}\""),
            FieldValue::I64(n) => n.to_string(),
            FieldValue::F64(x) => x.to_string(),
            FieldValue::Bool(b) => b.to_string(),
            FieldValue::Unknown(tag) => format!("<tag {tag}>"),
        };
        println!("    {name:<24} {summary}");
    }

    let record = store.load(&data)?;
    println!();
    println!("Geometry:   {}", record.geometry());
    println!("Deformer:   {} ({})", record.name(), record.deformer_type());
    println!("Vertices:   {}", record.vertex_count());
    println!("Influences: {}", record.influences().len());
    println!("Nonzero:    {}", record.weights().nonzero_count());
    Ok(true)
}
