use crate::commands::collect_catalogs;
use crate::errors::CliError;
use camino::Utf8PathBuf;
use colored::Colorize;
use miette::{IntoDiagnostic, Result, WrapErr};
use nxm_core::TitleId;
use nxm_overlay::{resolve_content, ContentResolution};
use nxm_pack::Pack;
use std::fs::File;
use std::path::PathBuf;

#[derive(Debug)]
pub struct ResolveArgs {
    pub roots: Vec<String>,
    pub title: String,
    pub base: String,
    pub output: String,
}

pub fn resolve_title(args: ResolveArgs) -> Result<()> {
    let title: TitleId = args
        .title
        .parse()
        .map_err(|_| CliError::invalid_title_id(&args.title))?;

    let base_path = PathBuf::from(&args.base);
    if !base_path.is_file() {
        return Err(CliError::base_container_not_found(base_path).into());
    }

    let set = collect_catalogs(&args.roots)?;
    let Some(catalog) = set.title(title) else {
        println!(
            "{} no mods found for title {}, base container is already current",
            "Nothing to do:".yellow().bold(),
            title
        );
        return Ok(());
    };

    println!(
        "{} {}",
        "Resolving overlays for title".bright_blue().bold(),
        title.to_string().bright_cyan().bold()
    );

    let base = File::open(&base_path)
        .into_diagnostic()
        .and_then(|file| Pack::mount_from_reader(file).into_diagnostic())
        .wrap_err("failed to mount base container")?;

    let out_path = Utf8PathBuf::from(&args.output);
    let resolution = resolve_content(catalog, base, &out_path)
        .into_diagnostic()
        .wrap_err("overlay resolution failed")?;

    match resolution {
        ContentResolution::Unmodified(_) => {
            println!(
                "{} no overlay files apply, base container left unchanged",
                "Done:".green().bold()
            );
        }
        ContentResolution::Rebuilt { stats, .. } => {
            println!(
                "{} wrote {} ({} overlay file(s), {} base file(s), {} conflict(s))",
                "Done:".green().bold(),
                out_path.to_string().bright_cyan(),
                stats.overlay_files,
                stats.base_files,
                stats.conflicts
            );
        }
    }

    Ok(())
}
