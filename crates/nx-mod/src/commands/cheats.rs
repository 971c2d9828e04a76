use crate::commands::collect_catalogs;
use crate::errors::CliError;
use colored::Colorize;
use miette::{IntoDiagnostic, Result};
use nxm_core::TitleId;

#[derive(Debug)]
pub struct CheatsArgs {
    pub roots: Vec<String>,
    pub title: String,
    pub json: bool,
}

pub fn list_cheats(args: CheatsArgs) -> Result<()> {
    let title: TitleId = args
        .title
        .parse()
        .map_err(|_| CliError::invalid_title_id(&args.title))?;

    let set = collect_catalogs(&args.roots)?;
    let cheats = set.title(title).map(|c| c.cheats.as_slice()).unwrap_or(&[]);

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(cheats).into_diagnostic()?
        );
        return Ok(());
    }

    if cheats.is_empty() {
        println!("{} no cheats found for title {}", "Empty:".yellow(), title);
        return Ok(());
    }

    println!(
        "{} {} cheat entr(ies) for title {}",
        "Found".bright_blue().bold(),
        cheats.len(),
        title.to_string().bright_cyan().bold()
    );
    for cheat in cheats {
        println!(
            "  {} ({} instruction(s), from {})",
            cheat.name.bright_green(),
            cheat.instructions.len(),
            cheat
                .source
                .file_name()
                .unwrap_or_else(|| cheat.source.as_str())
        );
    }

    Ok(())
}
