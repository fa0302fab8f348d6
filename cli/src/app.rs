//! CLI assembly: merge config and flags, build plugins, drive the engine.
use std::io::Write;
use std::path::{Path, PathBuf};

use veritree_core::api as core_api;
use veritree_plugins::factory;

use crate::commands::cli::{Args, RunArgs};

/// Directory used for config discovery and as the default task cwd.
pub fn working_dir(args: &Args) -> Result<PathBuf, core_api::CliError> {
    let current = std::env::current_dir()?;
    let Some(dir) = &args.cwd else {
        return Ok(current);
    };
    let dir = current.join(dir);
    if !dir.is_dir() {
        return Err(core_api::CliError::Config(format!(
            "working directory {} does not exist",
            dir.display()
        )));
    }
    Ok(dir)
}

pub fn load_config(args: &Args, cwd: &Path) -> Result<core_api::LoadedConfig, core_api::CliError> {
    core_api::load(args.config.as_deref(), cwd)
        .map_err(|e| core_api::CliError::Config(format!("{e:#}")))
}

/// Engine options: config file values, then command-line overrides.
pub fn execution_opts(
    args: &Args,
    run_args: &RunArgs,
    loaded: &core_api::LoadedConfig,
    cwd: &Path,
) -> core_api::ExecutionOpts {
    let base_dir = if args.cwd.is_some() {
        cwd.to_path_buf()
    } else {
        loaded.base_dir(cwd)
    };
    let mut opts = loaded
        .config
        .execution_opts()
        .with_cwd(base_dir)
        .with_filters(run_args.filters.clone());
    if let Some(n) = run_args.max_parallel {
        opts = opts.with_max_parallel(Some(n));
    }
    if args.strict_deps {
        opts = opts.with_strict_dependencies(true);
    }
    opts
}

/// Run the tree once. Returns the process exit code: 0 when the run passed, 1 otherwise.
#[tracing::instrument(name = "cli.run", skip_all, fields(format = run_args.format.as_str()))]
pub async fn run(
    args: &Args,
    run_args: &RunArgs,
    loaded: &core_api::LoadedConfig,
    cwd: &Path,
) -> Result<i32, core_api::CliError> {
    if loaded.path.is_none() {
        tracing::warn!(dir = %cwd.display(), "no configuration file found; nothing to run");
    }
    let cfg = &loaded.config;
    let opts = execution_opts(args, run_args, loaded, cwd);
    let logs = run_args.logs.unwrap_or(cfg.run.logs);
    tracing::debug!(
        config = ?loaded.path,
        cwd = %opts.cwd.display(),
        max_parallel = ?opts.max_parallel,
        logs = %logs,
        "options resolved"
    );

    let reporter = factory::build_reporter(run_args.format.as_str(), run_args.ascii)?;
    let engine = core_api::ExecutionEngine::builder(opts)
        .with_parser(factory::build_parser())
        .with_reporter(reporter)
        .with_logs(logs)
        .build();

    let result = engine.run(&cfg.tree()).await?;
    Ok(if result.ok { 0 } else { 1 })
}

/// Print every task path and what each one waits on.
pub fn list<W: Write>(
    args: &Args,
    loaded: &core_api::LoadedConfig,
    out: &mut W,
) -> Result<i32, core_api::CliError> {
    let tree = loaded.config.tree();
    core_api::validate_tree(&tree)?;
    let strict = args.strict_deps || loaded.config.run.strict_dependencies;
    let graph = core_api::DependencyGraph::build(&tree, strict)?;

    let mut lines = Vec::new();
    tree.walk(|path, node| {
        let mut line = path.to_string();
        if node.is_group() {
            line.push_str(&format!(" [{}]", node.strategy.as_str()));
        }
        lines.push(line);
        for (identifier, resolved) in core_api::describe_dependencies(&graph, path) {
            lines.push(match resolved {
                Some(target) if target == identifier => format!("  <- {target}"),
                Some(target) => format!("  <- {target} ({identifier})"),
                None => format!("  <- {identifier} (unresolved)"),
            });
        }
    });

    for line in lines {
        writeln!(out, "{line}")?;
    }
    Ok(0)
}
