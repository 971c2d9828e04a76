use crate::commands::collect_catalogs;
use crate::errors::CliError;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use nxm_catalog::{PatchCatalog, TitleCatalog};
use nxm_core::TitleId;
use serde::Serialize;

#[derive(Debug)]
pub struct ScanArgs {
    pub roots: Vec<String>,
    pub title: Option<String>,
    pub json: bool,
}

#[derive(Serialize)]
struct ScanReport<'a> {
    titles: Vec<&'a TitleCatalog>,
    patches: &'a PatchCatalog,
}

pub fn scan_mods(args: ScanArgs) -> Result<()> {
    let title_filter = args
        .title
        .as_deref()
        .map(|value| {
            value
                .parse::<TitleId>()
                .map_err(|_| CliError::invalid_title_id(value))
        })
        .transpose()?;

    let set = collect_catalogs(&args.roots)?;

    let titles: Vec<&TitleCatalog> = set
        .titles()
        .into_iter()
        .filter(|catalog| title_filter.is_none_or(|id| catalog.title_id == id))
        .collect();

    if args.json {
        let report = ScanReport {
            titles,
            patches: set.patches(),
        };
        println!(
            "{}",
            serde_json::to_string_pretty(&report).into_diagnostic()?
        );
        return Ok(());
    }

    if titles.is_empty() {
        println!("{}", "No mods found.".yellow());
    }

    for catalog in titles {
        println!(
            "{} {}",
            "Title".bright_blue().bold(),
            catalog.title_id.to_string().bright_cyan().bold()
        );
        for dir in &catalog.romfs_dirs {
            println!("  romfs   {} ({})", dir.name.bright_green(), dir.path);
        }
        for dir in &catalog.exefs_dirs {
            println!("  exefs   {} ({})", dir.name.bright_green(), dir.path);
        }
        for container in &catalog.romfs_containers {
            println!("  romfs container  {} ({})", container.name, container.path);
        }
        for container in &catalog.exefs_containers {
            println!("  exefs container  {} ({})", container.name, container.path);
        }
        if !catalog.cheats.is_empty() {
            println!("  {} cheat entr(ies)", catalog.cheats.len());
        }
    }

    let patches = set.patches();
    let patch_sets =
        patches.exefs_patches.len() + patches.nro_patches.len() + patches.kip_patches.len();
    if patch_sets > 0 {
        println!(
            "{} {} exefs / {} nro / {} kip patch set(s)",
            "Patches:".bright_blue().bold(),
            patches.exefs_patches.len(),
            patches.nro_patches.len(),
            patches.kip_patches.len()
        );
    }

    Ok(())
}
