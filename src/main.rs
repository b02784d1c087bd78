//! Command-line front end: loads a repository description, applies a
//! profile and individual settings, then reports and exports the result.
//!
//! ```text
//! variantry <repository.toml> [--import <profile>] [--set reg:path=value]...
//!           [--export <profile.json>] [--dump]
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use variantry::error::{Result, VariantError};
use variantry::profile::{ImportFlags, Profile, export_profile, import_profile};
use variantry::repository::{Repository, parse_variant_path};

/// Variant repository command line arguments.
#[derive(Parser, Debug)]
#[command(name = "variantry")]
#[command(about = "Loads a variant repository, applies choices and exports the resulting profile")]
struct Args {
    /// Repository description (TOML or JSON)
    #[arg(value_name = "REPOSITORY")]
    repository: PathBuf,

    /// Profile imported before any individual setting
    #[arg(long, value_name = "PROFILE")]
    import: Option<PathBuf>,

    /// Individual setting, repeatable
    #[arg(long = "set", value_name = "REG:PATH=VALUE")]
    sets: Vec<String>,

    /// Writes the exported profile as JSON instead of printing it
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,

    /// Prints the repository tree
    #[arg(long)]
    dump: bool,
}

fn apply_setting(repository: &mut Repository, setting: &str) -> Result<()> {
    let (target, token) = setting
        .split_once('=')
        .ok_or_else(|| VariantError::Config(format!("setting '{}' is not reg:path=value", setting)))?;
    let parsed = parse_variant_path(target.trim())
        .filter(|p| !p.reversed)
        .ok_or_else(|| VariantError::Config(format!("setting '{}' is not reg:path=value", setting)))?;
    repository
        .cmd_set_parameter_value(&parsed.registry, &parsed.path, token.trim())
        .map_err(|e| VariantError::Logic(format!("{} ({})", e.message(), e.code())))?;
    info!(registry = %parsed.registry, path = %parsed.path, value = %token.trim(), "parameter set");
    Ok(())
}

fn run(args: Args) -> Result<()> {
    let mut repository = Repository::from_file(&args.repository)?;
    if let Some(path) = &args.import {
        let profile = Profile::from_file(path)?;
        import_profile(&mut repository, &profile, ImportFlags::default())?;
        info!(profile = %path.display(), "profile imported");
    }
    for setting in &args.sets {
        apply_setting(&mut repository, setting)?;
    }
    repository.update()?;
    if args.dump {
        print!("{}", repository.tree_dump(""));
    }
    if repository.is_accomplished()? {
        info!(repository = %repository.name(), "repository is accomplished");
    } else {
        warn!(repository = %repository.name(), "repository is not accomplished");
    }
    let profile = export_profile(&repository)?;
    match &args.export {
        Some(path) => {
            profile.store(path)?;
            info!(profile = %path.display(), settings = profile.settings.len(), "profile exported");
        }
        None => {
            for setting in &profile.settings {
                println!("{}", setting);
            }
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "variantry failed");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_repeat_and_accept_both_forms() {
        let args = Args::try_parse_from([
            "variantry",
            "repo.toml",
            "--set",
            "geo:count=2",
            "--set=phys:mode=fast",
            "--export",
            "out.json",
            "--dump",
        ])
        .unwrap();
        assert_eq!(args.repository, PathBuf::from("repo.toml"));
        assert_eq!(args.sets, vec!["geo:count=2", "phys:mode=fast"]);
        assert_eq!(args.export, Some(PathBuf::from("out.json")));
        assert!(args.dump && args.import.is_none());
    }

    #[test]
    fn a_repository_is_required() {
        assert!(Args::try_parse_from(["variantry", "--dump"]).is_err());
        assert!(Args::try_parse_from(["variantry", "repo.toml", "--set"]).is_err());
    }
}
