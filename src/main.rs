//! Weft CLI - scans annotated sources and writes generated container units

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use weft::batch::{self, BatchOptions, SourceFile};
use weft::config::{self, WeftConfig};
use weft::ui;

#[derive(Parser)]
#[command(name = "weft")]
#[command(version)]
#[command(about = "Annotation-driven dependency injection code generator")]
#[command(long_about = r#"
Weft scans source files for dependency annotations such as:

  // weft: api = API <- APIProtocol
  // weft: api.scope = container

validates the cross-file dependency graph, and writes one generated
container/resolver unit per annotated type.

Example usage:
  weft init
  weft validate --path Sources
  weft generate --path Sources --output Generated
"#)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate container units for every annotated type
    Generate {
        /// Directory to scan for annotated sources
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Directory generated files are written to
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Custom template file (defaults to the embedded template)
        #[arg(short, long)]
        template: Option<PathBuf>,

        /// Source file extension to scan
        #[arg(short, long)]
        ext: Option<String>,

        /// Annotation sigil (the word before the colon)
        #[arg(short, long)]
        sigil: Option<String>,

        /// Config file (defaults to weft.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Validate and render without writing any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the dependency graph without generating anything
    Validate {
        /// Directory to scan for annotated sources
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Source file extension to scan
        #[arg(short, long)]
        ext: Option<String>,

        /// Annotation sigil (the word before the colon)
        #[arg(short, long)]
        sigil: Option<String>,

        /// Config file (defaults to weft.toml if present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Write a starter weft.toml
    Init {
        /// Where to write the config
        #[arg(short, long, default_value = "weft.toml")]
        path: PathBuf,

        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    match cli.command {
        Commands::Generate {
            path,
            output,
            template,
            ext,
            sigil,
            config,
            dry_run,
        } => {
            let settings = Settings::resolve(config.as_deref(), path, ext, sigil)?;
            let files = discover_sources(&settings.path, &settings.extension)?;
            if files.is_empty() {
                ui::success(&format!(
                    "No .{} files found under {}",
                    settings.extension,
                    settings.path.display()
                ));
                return Ok(());
            }

            let template_text = match template
                .or_else(|| settings.template.clone())
            {
                Some(path) => Some(std::fs::read_to_string(&path)?),
                None => None,
            };

            let options = BatchOptions {
                sigil: settings.sigil.clone(),
                template: template_text,
            };

            let units = match batch::run(&files, &options) {
                Ok(units) => units,
                Err(e) => {
                    ui::diagnostic(&format!("error[{}]: {}", e.code(), e));
                    std::process::exit(1);
                }
            };

            let output_dir = output
                .or_else(|| settings.output.clone())
                .unwrap_or_else(|| config::default_output_dir_in(&settings.path));

            let mut written = 0;
            let mut skipped = 0;
            for unit in &units {
                match &unit.text {
                    Some(text) => {
                        if !dry_run {
                            config::ensure_output_dir(&output_dir)?;
                            let file_name =
                                format!("Weft.{}.{}", unit.type_name, settings.extension);
                            std::fs::write(output_dir.join(&file_name), text)?;
                            tracing::info!(file = %file_name, "wrote generated unit");
                        }
                        written += 1;
                    }
                    None => skipped += 1,
                }
            }

            if dry_run {
                ui::success(&format!(
                    "{} units validated ({} types without annotations), nothing written",
                    written, skipped
                ));
            } else {
                ui::success(&format!(
                    "Wrote {} units to {} ({} types without annotations)",
                    written,
                    output_dir.display(),
                    skipped
                ));
            }
        }

        Commands::Validate { path, ext, sigil, config } => {
            let settings = Settings::resolve(config.as_deref(), path, ext, sigil)?;
            let files = discover_sources(&settings.path, &settings.extension)?;

            let forest = match batch::parse_all(&files, &settings.sigil)
                .and_then(|forest| weft::inspector::validate(&forest).map(|_| forest))
            {
                Ok(forest) => forest,
                Err(e) => {
                    ui::diagnostic(&format!("error[{}]: {}", e.code(), e));
                    std::process::exit(1);
                }
            };

            let annotated = forest
                .iter()
                .filter(|t| t.has_declarations_recursive())
                .count();
            ui::success(&format!(
                "Dependency graph is valid: {} files, {} annotated root types",
                files.len(),
                annotated
            ));
        }

        Commands::Init { path, force } => {
            let starter = WeftConfig {
                path: Some("Sources".to_string()),
                output: Some("Generated".to_string()),
                extension: Some("swift".to_string()),
                sigil: Some("weft".to_string()),
                template: None,
            };
            config::write_config(&path, &starter, force)?;
            ui::success(&format!("Wrote {}", path.display()));
        }
    }

    Ok(())
}

/// Effective settings after merging config file and CLI flags; flags win.
struct Settings {
    path: PathBuf,
    output: Option<PathBuf>,
    template: Option<PathBuf>,
    extension: String,
    sigil: String,
}

impl Settings {
    fn resolve(
        config_path: Option<&Path>,
        path: Option<PathBuf>,
        ext: Option<String>,
        sigil: Option<String>,
    ) -> anyhow::Result<Self> {
        let config = config::load_config(config_path)?.unwrap_or_default();

        Ok(Self {
            path: path
                .or_else(|| config.path.as_ref().map(PathBuf::from))
                .unwrap_or_else(|| PathBuf::from(".")),
            output: config.output.as_ref().map(PathBuf::from),
            template: config.template.as_ref().map(PathBuf::from),
            extension: ext
                .or(config.extension)
                .unwrap_or_else(|| "swift".to_string()),
            sigil: sigil
                .or(config.sigil)
                .unwrap_or_else(|| weft::lexer::DEFAULT_SIGIL.to_string()),
        })
    }
}

/// Discover source files under `root` with the given extension.
///
/// Uses a VCS-aware walk and sorts paths so batch input order, and therefore
/// diagnostic order, is deterministic.
fn discover_sources(root: &Path, extension: &str) -> anyhow::Result<Vec<SourceFile>> {
    let mut paths = Vec::new();
    for entry in ignore::WalkBuilder::new(root).build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }
        let path = entry.into_path();
        if path.extension().and_then(|e| e.to_str()) == Some(extension) {
            paths.push(path);
        }
    }
    paths.sort();

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let contents = std::fs::read_to_string(&path)?;
        let display = path
            .strip_prefix(root)
            .unwrap_or(&path)
            .to_string_lossy()
            .to_string();
        files.push(SourceFile::new(display, contents));
    }
    Ok(files)
}
