use std::{fs, path::PathBuf, str::FromStr};

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build the site described by a config file
    Build {
        #[arg(short, long, value_name = "FILE", default_value = "config.toml")]
        config: PathBuf,
    },
    /// Print the publications section for a bibliography
    Render {
        file: PathBuf,
        /// Author to highlight, overriding the config
        #[arg(short, long)]
        author: Option<String>,
        /// Take the author and topics from this config
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Print a bibliography as JSON or BibTeX
    Export {
        file: PathBuf,
        #[arg(short, long, value_enum, default_value_t = Format::Json)]
        format: Format,
    },
    /// Fetch missing abstracts for identifiers or bibliography files
    Enrich {
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,
        /// Write enriched entries here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Bibtex)]
        format: Format,
        /// Take request settings from this config
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
    /// Build a bibliography from the works listed on an ORCID profile
    Import {
        /// ORCID iD, bare or as an orcid.org URL
        orcid: String,
        /// Write entries here instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
        #[arg(short, long, value_enum, default_value_t = Format::Bibtex)]
        format: Format,
        /// Keep DOIs that Crossref does not know about
        #[arg(long)]
        no_confirm: bool,
        /// Take request settings from this config
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Json,
    Bibtex,
}

#[derive(Clone, Debug)]
/// What to enrich, which can either be
///
/// - a single identifier, or
/// - a bibliography file.
///
/// The latter will be treated as a list of the former.
pub enum Source {
    Identifier(String),
    File(PathBuf),
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Is this a path?
        if let Ok(path) = fs::canonicalize(s) {
            Ok(Source::File(path))
        }
        // No? Must be an identifier then!
        else {
            Ok(Source::Identifier(s.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::Builder;

    #[test]
    fn existing_bib_file_is_a_file_source() {
        let tmp = Builder::new().suffix(".bib").tempfile().expect("tmp file");
        match Source::from_str(tmp.path().to_str().unwrap()).expect("parse") {
            Source::File(p) => assert_eq!(p, fs::canonicalize(tmp.path()).unwrap()),
            other => panic!("expected file source, got {other:?}"),
        }
    }

    #[test]
    fn missing_bib_file_is_taken_as_identifier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("refs.bib");
        let s = path.to_str().unwrap();
        assert!(matches!(Source::from_str(s), Ok(Source::Identifier(id)) if id == s));
    }

    #[test]
    fn doi_strings_are_identifiers() {
        proptest::proptest!(|(digits in "[0-9]{4,9}", suffix in "[a-z0-9]{1,16}(\\.[a-z0-9]{1,8}){0,3}")| {
            let doi = format!("10.{digits}/{suffix}");
            proptest::prop_assume!(!PathBuf::from(&doi).exists());
            match Source::from_str(&doi).expect("parse") {
                Source::Identifier(id) => proptest::prop_assert_eq!(id, doi),
                Source::File(_) => proptest::prop_assert!(false, "should not be a file"),
            }
        })
    }

    #[test]
    fn enrich_requires_a_source() {
        assert!(Cli::try_parse_from(["bibsite", "enrich"]).is_err());
    }

    #[test]
    fn enrich_mixes_files_and_dois() {
        let tmp = Builder::new().suffix(".bib").tempfile().unwrap();
        let cli = Cli::try_parse_from([
            "bibsite",
            "enrich",
            tmp.path().to_str().unwrap(),
            "10.1101/2020.03.01.123456",
        ])
        .unwrap();
        match cli.command {
            Command::Enrich { from, format, .. } => {
                assert!(matches!(from[0], Source::File(_)));
                assert!(matches!(&from[1], Source::Identifier(id) if id == "10.1101/2020.03.01.123456"));
                assert_eq!(format, Format::Bibtex);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn build_defaults_to_config_toml() {
        let cli = Cli::try_parse_from(["bibsite", "build"]).unwrap();
        match cli.command {
            Command::Build { config } => assert_eq!(config, PathBuf::from("config.toml")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn export_format_parses_value_enum() {
        let cli = Cli::try_parse_from(["bibsite", "export", "refs.bib", "-f", "bibtex"]).unwrap();
        match cli.command {
            Command::Export { format, .. } => assert_eq!(format, Format::Bibtex),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn import_takes_an_orcid() {
        let cli = Cli::try_parse_from(["bibsite", "import", "0000-0002-1825-0097", "--no-confirm"])
            .unwrap();
        match cli.command {
            Command::Import {
                orcid, no_confirm, ..
            } => {
                assert_eq!(orcid, "0000-0002-1825-0097");
                assert!(no_confirm);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
