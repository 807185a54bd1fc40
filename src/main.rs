use std::{fs, io::IsTerminal, path::Path};

use anyhow::Context;
use bibsite::{
    Bibliography, Config, Renderer,
    config::{EnrichConfig, ReferencesConfig},
    doi::Doi,
    enrich::{self, Scraper},
    entry::Entry,
    export,
    orcid::{Importer, OrcidId},
    site::SiteBuilder,
};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, Format, Source};

mod cli;

fn use_color() -> bool {
    std::env::var_os("NO_COLOR").is_none()
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("bibsite=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_ansi(use_color() && std::io::stderr().is_terminal())
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Cli::parse();
    match args.command {
        Command::Build { config } => {
            let config = Config::load(&config)
                .with_context(|| format!("failed to load {}", config.display()))?;
            let out = SiteBuilder::new(&config).build()?;
            info!(entries = out.entries, "built {}", out.index.display());
        }
        Command::Render {
            file,
            author,
            config,
        } => {
            let mut references = match config {
                Some(path) => Config::load(&path)
                    .with_context(|| format!("failed to load {}", path.display()))?
                    .references,
                None => ReferencesConfig::new("", &file),
            };
            if let Some(author) = author {
                references.author = author;
            }
            let bibliography = Bibliography::parse_file(&file)?;
            println!("{}", Renderer::new(&references).section(&bibliography));
        }
        Command::Export { file, format } => {
            let bibliography = Bibliography::parse_file(&file)?;
            print!("{}", serialize(bibliography.entries(), format)?);
        }
        Command::Enrich {
            from,
            output,
            format,
            config,
        } => {
            let settings = request_settings(config.as_deref())?;
            run_enrich(&from, output.as_deref(), format, &settings)?;
        }
        Command::Import {
            orcid,
            output,
            format,
            no_confirm,
            config,
        } => {
            let settings = request_settings(config.as_deref())?;
            run_import(&orcid, output.as_deref(), format, !no_confirm, &settings)?;
        }
    }
    Ok(())
}

fn request_settings(config: Option<&Path>) -> anyhow::Result<EnrichConfig> {
    Ok(match config {
        Some(path) => {
            Config::load(path)
                .with_context(|| format!("failed to load {}", path.display()))?
                .enrich
        }
        None => EnrichConfig::default(),
    })
}

fn write_output(text: &str, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))
        }
        None => {
            print!("{text}");
            Ok(())
        }
    }
}

fn print_summary(ok: usize, failed: usize) {
    if use_color() {
        eprintln!("{} {ok}  {} {failed}", "✓".green(), "✗".red());
    } else {
        eprintln!("✓ {ok}  ✗ {failed}");
    }
}

fn run_import(
    orcid: &str,
    output: Option<&Path>,
    format: Format,
    confirm: bool,
    settings: &EnrichConfig,
) -> anyhow::Result<()> {
    let orcid = OrcidId::parse(orcid)
        .ok_or_else(|| anyhow::anyhow!("not a valid ORCID iD: {orcid}"))?;
    let importer = Importer::new(settings, confirm);

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner().template("{prefix:.blue.bold} {spinner:.blue} {msg}")?,
    );
    pb.set_prefix(format!("{:>12}", "Importing"));
    let (entries, report) = importer.import(&orcid, |doi| {
        pb.set_message(doi.to_string());
        pb.tick();
    })?;
    pb.finish_and_clear();
    info!(
        listed = report.listed,
        unconfirmed = report.unconfirmed,
        "imported works for {orcid}"
    );

    let bibliography = Bibliography::from_entries(entries);
    write_output(&serialize(bibliography.entries(), format)?, output)?;
    print_summary(report.imported, report.failed);
    Ok(())
}

fn serialize(entries: &[Entry], format: Format) -> anyhow::Result<String> {
    Ok(match format {
        Format::Json => {
            let mut json = export::to_json(entries).context("failed to serialize entries")?;
            json.push('\n');
            json
        }
        Format::Bibtex => export::to_bibtex(entries),
    })
}

fn progress_bar(len: usize) -> anyhow::Result<ProgressBar> {
    let pb = ProgressBar::new(len as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{prefix:.blue.bold} [{bar:30}] {pos}/{len} {msg}")?
            .progress_chars("=> "),
    );
    pb.set_prefix(format!("{:>12}", "Enriching"));
    Ok(pb)
}

fn run_enrich(
    from: &[Source],
    output: Option<&Path>,
    format: Format,
    settings: &EnrichConfig,
) -> anyhow::Result<()> {
    let scraper = Scraper::new(settings);
    let (mut ok, mut failed) = (0usize, 0usize);
    let mut enriched = Vec::new();

    for source in from {
        match source {
            Source::Identifier(id) => match Doi::parse(id) {
                Some(doi) => match scraper.scrape(&doi) {
                    Some(text) => {
                        println!("{text}");
                        ok += 1;
                    }
                    None => failed += 1,
                },
                None => {
                    warn!("unrecognised identifier: {id}");
                    failed += 1;
                }
            },
            Source::File(path) => {
                let bibliography = Bibliography::parse_file(path)?;
                let pb = progress_bar(bibliography.len())?;
                let (entries, report) = enrich::enrich(
                    bibliography.entries(),
                    |doi| scraper.scrape(doi),
                    |entry| {
                        pb.set_message(entry.key().to_string());
                        pb.inc(1);
                    },
                );
                pb.finish_and_clear();
                info!(
                    total = report.total,
                    with_doi = report.with_doi,
                    needing = report.needing,
                    found = report.found,
                    "enriched {}",
                    path.display()
                );
                ok += report.found;
                failed += report.needing - report.found;
                enriched.extend(entries);
            }
        }
    }

    if !enriched.is_empty() {
        let bibliography = Bibliography::from_entries(enriched);
        write_output(&serialize(bibliography.entries(), format)?, output)?;
    }

    print_summary(ok, failed);
    Ok(())
}
