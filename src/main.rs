//! dabcat - Dummy App Builder for Code And Transforms
//!
//! Builds a dummy copy of a connector app that answers chosen actions with
//! canned data.
//!
//! # Usage
//!
//! ```bash
//! # Patch the app in the current directory using a rule batch file
//! dabcat --rules dummy/rules.toml
//!
//! # Preview the patched connector without writing anything
//! dabcat --rules dummy/rules.toml --dry-run path/to/app
//! ```

use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use dabcat::{
    audit::AuditLogger,
    config::Config,
    discovery::{self, ProjectFiles},
    engine::PatchEngine,
    output::{self, PatchReport},
    package::{self, AppIdentity, PackageContents},
    session::Session,
};

/// Print version information
fn print_version() {
    println!("dabcat {}", env!("CARGO_PKG_VERSION"));
}

/// Print help message
fn print_help() {
    println!(
        r#"dabcat - Dummy App Builder for Code And Transforms

USAGE:
    dabcat [OPTIONS] [DIR]

ARGS:
    DIR                     App source directory (default: current directory)

OPTIONS:
    -h, --help              Print this help message
    -v, --version           Print version information
    -r, --rules PATH        Rule batch file (TOML, [[rule]] tables)
    -s, --substitutions PATH
                            Substitution table (JSON) applied to dummy data
        --connector PATH    Connector module (default: discovered *_connector.py)
        --metadata PATH     Metadata document (default: discovered *.json)
    -n, --name NAME         Dummy app name (default: "<name> DEV")
        --product-name NAME Dummy product name (default: "<product_name> DEV")
        --app-id ID         Dummy app id (default: new UUID)
    -o, --output DIR        Output directory (default: ../<name>_dummy)
    -d, --dry-run           Print the patched connector, write nothing
        --no-archive        Skip the .tgz of the output directory
        --strict            Fail on ambiguous anchors, reject colliding payloads
    -c, --config PATH       Path to config file

RULE FILE:
    [[rule]]
    action = "get url reputation"
    data_file = "url.json"

    [[rule]]
    action = "lookup ip"
    data_file = "ip.json"
    parameter = "ip"
    value = "10.0.0.1"
"#
    );
}

/// Parse command line arguments
#[derive(Default)]
struct Args {
    help: bool,
    version: bool,
    dry_run: bool,
    strict: bool,
    no_archive: bool,
    dir: Option<PathBuf>,
    rules: Option<PathBuf>,
    substitutions: Option<PathBuf>,
    connector: Option<PathBuf>,
    metadata: Option<PathBuf>,
    name: Option<String>,
    product_name: Option<String>,
    app_id: Option<String>,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut result = Args::default();

        let mut i = 1;
        while i < args.len() {
            let arg = args[i].as_str();

            // --flag=value form
            if let Some((flag, value)) = arg.split_once('=').filter(|_| arg.starts_with("--")) {
                result.set_value(flag, value.to_string());
                i += 1;
                continue;
            }

            match arg {
                "-h" | "--help" => result.help = true,
                "-v" | "--version" => result.version = true,
                "-d" | "--dry-run" => result.dry_run = true,
                "--strict" => result.strict = true,
                "--no-archive" => result.no_archive = true,
                flag if flag.starts_with('-') => {
                    if i + 1 < args.len() {
                        i += 1;
                        result.set_value(flag, args[i].clone());
                    } else {
                        eprintln!("Warning: {} expects a value", flag);
                    }
                }
                dir => result.dir = Some(PathBuf::from(dir)),
            }
            i += 1;
        }

        result
    }

    fn set_value(&mut self, flag: &str, value: String) {
        match flag {
            "-r" | "--rules" => self.rules = Some(value.into()),
            "-s" | "--substitutions" => self.substitutions = Some(value.into()),
            "--connector" => self.connector = Some(value.into()),
            "--metadata" => self.metadata = Some(value.into()),
            "-n" | "--name" => self.name = Some(value),
            "--product-name" => self.product_name = Some(value),
            "--app-id" => self.app_id = Some(value),
            "-o" | "--output" => self.output = Some(value.into()),
            "-c" | "--config" => self.config_path = Some(value.into()),
            other => eprintln!("Warning: Unknown option: {}", other),
        }
    }
}

/// Locate project files, letting explicit paths override discovery
fn resolve_files(args: &Args, config: &Config, root: &Path) -> ProjectFiles {
    let mut files = discovery::discover(root, &config.discovery).unwrap_or_else(|e| {
        eprintln!("Warning: Discovery failed under {}: {}", root.display(), e);
        ProjectFiles::new(root)
    });

    if let Some(ref path) = args.connector {
        files.connector = Some(path.clone());
    }
    if let Some(ref path) = args.metadata {
        files.metadata = Some(path.clone());
    }
    if let Some(ref path) = args.substitutions {
        files.substitutions = Some(path.clone());
    }

    files
}

fn run(args: &Args, config: &Config) -> Result<PatchReport, PatchReport> {
    let root = args.dir.clone().unwrap_or_else(|| PathBuf::from("."));
    let files = resolve_files(args, config, &root);
    let connector = files
        .connector
        .clone()
        .unwrap_or_else(|| root.join("<connector>"));
    let fail = |e: &dyn std::error::Error| PatchReport::failed(&connector, e.to_string());

    let mut session = Session::open(files).map_err(|e| fail(&e))?;

    match args.rules {
        Some(ref path) => {
            session
                .load_rule_file(path)
                .map_err(|e| fail(&e))?;
        }
        None => eprintln!("Warning: No rule file given; the generated block will be empty"),
    }

    for failure in session.failures() {
        eprintln!(
            "Warning: Skipping rule #{} ({}): {}",
            failure.index,
            failure.data_file.display(),
            failure.error
        );
    }

    let engine = PatchEngine::new(config);
    let patch = engine
        .synthesize(session.connector_source(), session.rules())
        .map_err(|e| fail(&e))?;

    if patch.already_patched {
        eprintln!(
            "Warning: {} already contains a generated block; a second one was inserted",
            connector.display()
        );
    }
    for skipped in &patch.skipped {
        eprintln!(
            "Warning: Rule #{} for '{}' ignored; rule #{} already handles that action",
            skipped.index, skipped.action_id, skipped.kept_index
        );
    }
    for rejected in &patch.rejected {
        eprintln!("Warning: {}", rejected);
    }

    let report = PatchReport::from_patch(&connector, &patch).with_load_failures(session.failures());

    if args.dry_run {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        output::write_patched(&mut handle, &patch.text).map_err(|e| fail(&e))?;
        return Ok(report);
    }

    let identity = AppIdentity::derive(
        session.metadata(),
        args.name.clone(),
        args.product_name.clone(),
        args.app_id.clone(),
    );
    identity.apply(session.metadata_mut());

    let out_dir = match args.output {
        Some(ref dir) => dir.clone(),
        None => {
            let parent = root
                .canonicalize()
                .ok()
                .and_then(|p| p.parent().map(Path::to_path_buf))
                .unwrap_or_else(|| PathBuf::from(".."));
            parent.join(identity.dir_name(&config.package.output_suffix))
        }
    };

    let files = session.files();
    let contents = PackageContents {
        connector: (files.connector_path().map_err(|e| fail(&e))?, &patch.text),
        metadata: (files.metadata_path().map_err(|e| fail(&e))?, session.metadata()),
    };
    let written = package::write_package(&root, &out_dir, &contents, &config.discovery.prune_dirs)
        .map_err(|e| fail(&e))?;

    let report = report.with_output(&written, identity);
    if !config.package.archive || args.no_archive {
        return Ok(report);
    }

    let archive = package::write_archive(&written).map_err(|e| fail(&e))?;
    Ok(report.with_archive(&archive))
}

fn main() {
    let args = Args::parse();

    // Handle help and version
    if args.help {
        print_help();
        return;
    }

    if args.version {
        print_version();
        return;
    }

    // Load configuration
    let mut config = if let Some(ref path) = args.config_path {
        Config::load_from(path).unwrap_or_else(|e| {
            eprintln!("Warning: Failed to load config from {}: {}", path.display(), e);
            Config::default()
        })
    } else {
        Config::load()
    };

    if args.strict {
        config = config.strict();
    }

    let audit_path = if config.general.audit_log {
        config.audit_path()
    } else {
        None
    };
    let mut logger = AuditLogger::new(audit_path.as_deref());

    let (report, ok) = match run(&args, &config) {
        Ok(report) => (report, true),
        Err(report) => (report, false),
    };

    if let Err(e) = logger.log_report(&report) {
        eprintln!("Warning: Failed to write audit log: {}", e);
    }

    if let Some(ref error) = report.error {
        eprintln!("Error: {}", error);
    }

    // The patched text owns stdout in dry-run mode
    if args.dry_run {
        eprintln!("{}", report.to_json());
    } else {
        println!("{}", report.to_json());
    }

    if !ok {
        process::exit(1);
    }
}
