use std::path::{Component, Path, PathBuf};

use sfconfig_diff::diff_trees;
use sfconfig_patch::{PatchEngine, PatchSet};
use sfconfig_schema::access::config_version;
use sfconfig_schema::{SchemaProfile, VirtualLayer};
use sfconfig_store::{FileTreeStore, TreeStore};
use sfconfig_types::ConfigTree;
use sfconfig_walk::{filter_prefix, logical_fields};
use tracing::{debug, info};

use crate::cli::*;
use crate::error::{CliError, CliResult};
use crate::output::{BuildReport, DiffReport, FieldEntry, InspectReport, Report};

/// Everything a command needs besides its own arguments.
pub struct Context {
    pub profile: SchemaProfile,
    /// Installed spider version, when known.
    pub app_version: Option<String>,
    pub store: Box<dyn TreeStore>,
}

impl Context {
    pub fn new(profile: SchemaProfile, app_version: Option<String>, store: Box<dyn TreeStore>) -> Self {
        Self {
            profile,
            app_version,
            store,
        }
    }

    fn load(&self, path: &Path) -> CliResult<ConfigTree> {
        self.store.load(path).map_err(|err| CliError::reading(path, err))
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<Report> {
    let profile = match &cli.profile {
        Some(path) => SchemaProfile::from_path(path).map_err(CliError::from)?,
        None => SchemaProfile::default(),
    };
    let ctx = Context::new(profile, cli.app_version, Box::new(FileTreeStore::new()));

    let report = match cli.command {
        Command::Inspect(args) => Report::Inspect(cmd_inspect(&ctx, &args)?),
        Command::Build(args) => Report::Build(cmd_build(&ctx, &args)?),
        Command::Diff(args) => Report::Diff(cmd_diff(&ctx, &args)?),
    };
    Ok(report)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

pub fn cmd_inspect(ctx: &Context, args: &InspectArgs) -> CliResult<InspectReport> {
    let path = validate_path(ctx, &args.config, true)?;
    let tree = ctx.load(&path)?;
    let layer = VirtualLayer::new(&ctx.profile);

    let mut fields = logical_fields(&tree, &layer);
    if let Some(prefix) = &args.prefix {
        fields = filter_prefix(fields, prefix);
    }
    let fields: Vec<FieldEntry> = fields
        .into_iter()
        .map(|(path, info)| FieldEntry {
            value: ctx.profile.mask(&path, info.value),
            ty: info.ty,
            enum_options: info.enum_options,
            editable: info.editable,
            length: info.length,
            path,
        })
        .collect();
    info!(config = %path.display(), fields = fields.len(), "inspected config");

    let config_version = config_version(&tree);
    Ok(InspectReport {
        warning: version_warning(config_version.as_deref(), ctx.app_version.as_deref()),
        config_version,
        sf_version: ctx.app_version.clone(),
        fields,
    })
}

pub fn cmd_build(ctx: &Context, args: &BuildArgs) -> CliResult<BuildReport> {
    let template = validate_path(ctx, &args.template, true)?;
    let output = validate_path(ctx, &args.output, false)?;
    let patch_text = resolve_patches(args)?;

    let mut tree = ctx.load(&template)?;
    let patches: PatchSet = patch_text.parse()?;

    let engine = PatchEngine::new(&ctx.profile);
    let outcome = engine.apply(&mut tree, &patches)?;

    let output_path = if args.dry_run {
        debug!("dry run, output not written");
        None
    } else {
        ctx.store
            .save(&output, &tree)
            .map_err(|err| CliError::writing(&output, err))?;
        Some(output.display().to_string())
    };
    info!(
        template = %template.display(),
        changes = outcome.changes.len(),
        warnings = outcome.warnings.len(),
        dry_run = args.dry_run,
        "built config"
    );

    let config_version = config_version(&tree);
    let mut warnings = outcome.warnings;
    warnings.extend(version_warning(config_version.as_deref(), ctx.app_version.as_deref()));
    Ok(BuildReport {
        success: true,
        output_path,
        config_version,
        sf_version: ctx.app_version.clone(),
        changes: outcome.changes,
        warnings,
    })
}

pub fn cmd_diff(ctx: &Context, args: &DiffArgs) -> CliResult<DiffReport> {
    let path_a = validate_path(ctx, &args.config_a, true)?;
    let path_b = validate_path(ctx, &args.config_b, true)?;
    let tree_a = ctx.load(&path_a)?;
    let tree_b = ctx.load(&path_b)?;

    let layer = VirtualLayer::new(&ctx.profile);
    let diff = diff_trees(&tree_a, &tree_b, &layer, args.prefix.as_deref());
    info!(
        scalars = diff.scalars(),
        lists = diff.lists(),
        "diffed configs"
    );

    let version_a = config_version(&tree_a);
    Ok(DiffReport {
        warning: version_warning(version_a.as_deref(), ctx.app_version.as_deref()),
        config_version_a: version_a,
        config_version_b: config_version(&tree_b),
        sf_version: ctx.app_version.clone(),
        total_differences: diff.len(),
        differences: diff.differences,
    })
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Reject empty and traversing paths, then make the path absolute.
///
/// With `must_exist`, the path has to name a stored config.
pub fn validate_path(ctx: &Context, raw: &str, must_exist: bool) -> CliResult<PathBuf> {
    if raw.trim().is_empty() {
        return Err(CliError::validation("Empty path"));
    }
    if raw.split(['/', '\\']).any(|segment| segment == "..") {
        return Err(CliError::validation(format!(
            "Path traversal is not allowed: {raw}"
        )));
    }
    let path = std::path::absolute(raw)
        .map_err(|err| CliError::io(format!("Invalid path: {raw}")).with_detail("reason", err.to_string()))?;
    let path: PathBuf = path
        .components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect();
    if must_exist && !ctx.store.exists(&path) {
        return Err(CliError::io(format!("File not found: {}", path.display())));
    }
    Ok(path)
}

/// The patch document text; `--patches-file` wins over `--patches`.
fn resolve_patches(args: &BuildArgs) -> CliResult<String> {
    if let Some(file) = args.patches_file.as_deref().filter(|f| !f.trim().is_empty()) {
        return std::fs::read_to_string(file).map_err(|err| {
            CliError::io("Unable to read patches file").with_detail("reason", err.to_string())
        });
    }
    match args.patches.as_deref() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(CliError::validation(
            "Missing required argument: --patches or --patches-file",
        )),
    }
}

fn version_warning(config: Option<&str>, app: Option<&str>) -> Option<String> {
    match (config, app) {
        (Some(config), Some(app)) if config != app => Some(format!(
            "Config version {config} may not be compatible with SF {app}"
        )),
        _ => None,
    }
}
