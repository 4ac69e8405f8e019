//! Command-line surface of the `certstamp` binary.

use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};

use crate::background::BackgroundImage;
use crate::config::{load_app_config, AppConfig};
use crate::error::AppError;
use crate::session::EditorSession;
use crate::storage::{DirectoryBackend, TemplateBackend};
use crate::template::{Language, Template, TemplateError, TemplateId, TemplateLibrary};
use crate::text::{choices_for, FontBook, BUNDLED_FAMILY};

#[derive(Parser, Debug)]
#[command(
    name = "certstamp",
    version,
    about = "Place a name on a certificate template and export it as PNG"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Render a certificate from an exported template collection or a template store
    Render(RenderArgs),
    /// Copy every template of a collection into a template store
    Save(SaveArgs),
    /// List selectable fonts and whether a face is installed for each
    Fonts,
}

#[derive(Args, Debug, Clone)]
pub struct RenderArgs {
    /// Template collection JSON (as written by a template export)
    #[arg(
        short = 't',
        long = "templates",
        required_unless_present = "store",
        conflicts_with = "store"
    )]
    pub templates: Option<PathBuf>,

    /// Template store directory (as filled by `certstamp save`)
    #[arg(short = 's', long = "store", requires = "id")]
    pub store: Option<PathBuf>,

    /// Template id inside the collection or store (default: first template of the collection)
    #[arg(long = "id")]
    pub id: Option<u64>,

    /// Name drawn onto the certificate
    #[arg(short = 'n', long = "name")]
    pub name: String,

    /// Output directory (default: `output_dir` from config.json, then the current directory)
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SaveArgs {
    /// Template collection JSON; rewritten with the ids assigned by the store
    #[arg(short = 't', long = "templates")]
    pub templates: PathBuf,

    /// Template store directory, created when missing
    #[arg(short = 's', long = "store")]
    pub store: PathBuf,
}

pub fn run(cli: Cli) -> Result<()> {
    let config = load_app_config();
    match cli.command {
        Command::Render(args) => {
            let path = render_certificate(&args, &config)?;
            println!("{}", path.display());
        }
        Command::Save(args) => {
            for (from, to) in save_templates(&args)? {
                println!("{from} -> {to}");
            }
        }
        Command::Fonts => {
            let fonts = FontBook::from_config(&config);
            for line in font_report(&fonts) {
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn read_collection(path: &Path) -> Result<TemplateLibrary> {
    let serialized =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut library = TemplateLibrary::new();
    library
        .import_json(&serialized)
        .with_context(|| format!("invalid template collection {}", path.display()))?;
    Ok(library)
}

fn load_template(args: &RenderArgs) -> Result<Template> {
    if let Some(store) = &args.store {
        if !store.is_dir() {
            bail!("template store {} does not exist", store.display());
        }
        let id = TemplateId(args.id.context("--store needs --id")?);
        let backend = DirectoryBackend::open(store)?;
        return backend
            .get(id)
            .map_err(AppError::from)
            .with_context(|| format!("cannot load template {id} from {}", store.display()));
    }

    let templates = args
        .templates
        .as_deref()
        .context("either --templates or --store is required")?;
    let library = read_collection(templates)?;
    let template = match args.id {
        Some(id) => library
            .get(TemplateId(id))
            .cloned()
            .ok_or(TemplateError::UnknownTemplate(TemplateId(id)))?,
        None => library
            .templates()
            .first()
            .cloned()
            .context("template collection is empty")?,
    };
    Ok(template)
}

/// Stores every template of `args.templates` in `args.store`, then rewrites the collection with
/// the store's ids. Returns the `(old, new)` id pairs in collection order.
pub fn save_templates(args: &SaveArgs) -> Result<Vec<(TemplateId, TemplateId)>> {
    let mut library = read_collection(&args.templates)?;
    let mut backend = DirectoryBackend::open(&args.store)
        .with_context(|| format!("cannot open template store {}", args.store.display()))?;

    let mut reassigned = Vec::with_capacity(library.len());
    for template in library.templates() {
        let stored = backend.create(template).map_err(AppError::from)?;
        reassigned.push((template.id, stored));
    }
    for &(from, to) in &reassigned {
        library
            .reassign_id(from, to)
            .with_context(|| format!("cannot renumber template {from} to {to}"))?;
    }

    fs::write(&args.templates, library.export_json()?)
        .with_context(|| format!("failed to write {}", args.templates.display()))?;
    tracing::info!(count = reassigned.len(), store = %args.store.display(), "templates saved");
    Ok(reassigned)
}

/// Loads the requested template, draws `args.name` on it and writes the PNG.
pub fn render_certificate(args: &RenderArgs, config: &AppConfig) -> Result<PathBuf> {
    let template = load_template(args)?;
    tracing::info!(id = %template.id, name = %template.name, "rendering certificate");

    let background = BackgroundImage::decode_now(template.image.bytes());
    if let BackgroundImage::Failed(err) = &background {
        return Err(AppError::from(err.clone()))
            .with_context(|| format!("template {} has an unreadable image", template.id));
    }

    let fonts = Rc::new(FontBook::from_config(config));
    let mut session = EditorSession::with_background(template, fonts, args.name.as_str(), background);
    let out_dir = args
        .out
        .clone()
        .or_else(|| config.output_dir.clone())
        .unwrap_or_else(|| PathBuf::from("."));
    let path = session
        .save_certificate(&out_dir)
        .context("failed to export certificate")?;
    Ok(path)
}

/// Catalog fonts grouped by language, each marked `installed` when a loaded face carries that
/// family and `fallback` otherwise.
pub fn font_report(fonts: &FontBook) -> Vec<String> {
    let mut lines = Vec::new();
    if fonts.is_empty() {
        lines.push(format!("no fonts loaded; drawing with bundled {BUNDLED_FAMILY}"));
    }
    for language in [Language::En, Language::Ur] {
        lines.push(format!("[{}]", language.code()));
        for choice in choices_for(language) {
            let status = if fonts.resolve_exact(choice.value).is_some() {
                "installed"
            } else {
                "fallback"
            };
            lines.push(format!("  {:<20} {status}", choice.label));
        }
    }
    lines
}
