//! Assemble `index.html` from the layout, the rendered publications and the stylesheet.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::Context;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::{bibliography::Bibliography, config::Config, html::Element, render::Renderer, sections};

const HEAD_PLACEHOLDER: &str = "{{head}}";
const MAIN_PLACEHOLDER: &str = "{{main}}";

/// What a build wrote.
#[derive(Debug)]
pub struct BuildOutput {
    pub index: PathBuf,
    pub stylesheet: Option<PathBuf>,
    pub entries: usize,
}

pub struct SiteBuilder<'a> {
    config: &'a Config,
}

impl<'a> SiteBuilder<'a> {
    pub fn new(config: &'a Config) -> Self {
        SiteBuilder { config }
    }

    pub fn build(&self) -> anyhow::Result<BuildOutput> {
        let output = self.config.resolve(&self.config.layout.output);
        fs::create_dir_all(&output)
            .with_context(|| format!("failed to create output directory {}", output.display()))?;

        let stylesheet = self.write_stylesheet(&output)?;
        let head = stylesheet
            .as_deref()
            .and_then(Path::file_name)
            .map(|name| {
                Element::new("link")
                    .attr("rel", "stylesheet")
                    .attr("href", name.to_string_lossy())
                    .to_string()
            })
            .unwrap_or_default();

        let bib_path = self.config.bibliography_path();
        let bibliography = Bibliography::parse_file(&bib_path)?;
        info!(
            entries = bibliography.len(),
            "parsed {}",
            bib_path.display()
        );
        // Science communication, then education, then publications.
        let mut main: String = [
            sections::science_communication(self.config),
            sections::education(&self.config.education),
        ]
        .into_iter()
        .flatten()
        .map(|section| section.to_string())
        .collect();
        main.push_str(&Renderer::new(&self.config.references).section(&bibliography));

        let skeleton = self.config.resolve(&self.config.layout.skeleton);
        let layout = fs::read_to_string(&skeleton)
            .with_context(|| format!("failed to read layout {}", skeleton.display()))?;

        let index = output.join("index.html");
        fs::write(&index, assemble(&layout, &head, &main))
            .with_context(|| format!("failed to write {}", index.display()))?;
        info!("wrote {}", index.display());

        Ok(BuildOutput {
            index,
            stylesheet,
            entries: bibliography.len(),
        })
    }

    /// Write `style-{hash}.css` into `output`, replacing earlier builds' stylesheets.
    fn write_stylesheet(&self, output: &Path) -> anyhow::Result<Option<PathBuf>> {
        let folder = self.config.resolve(&self.config.layout.folder);
        let css = concat_css(&folder)?;
        if css.is_empty() {
            warn!("no stylesheets found in {}", folder.display());
            return Ok(None);
        }

        for old in stylesheets_in(output)? {
            debug!("removing {}", old.display());
            fs::remove_file(&old)
                .with_context(|| format!("failed to remove {}", old.display()))?;
        }

        let path = output.join(format!("style-{}.css", content_hash(&css)));
        fs::write(&path, css).with_context(|| format!("failed to write {}", path.display()))?;
        info!("wrote {}", path.display());
        Ok(Some(path))
    }
}

/// Replace the layout placeholders.
pub fn assemble(layout: &str, head: &str, main: &str) -> String {
    layout
        .replace(HEAD_PLACEHOLDER, head)
        .replace(MAIN_PLACEHOLDER, main)
}

/// Every `*.css` file in `folder`, in name order, each preceded by a `/* name */` header.
pub fn concat_css(folder: &Path) -> anyhow::Result<String> {
    let mut files = Vec::new();
    for item in fs::read_dir(folder)
        .with_context(|| format!("failed to read stylesheet folder {}", folder.display()))?
    {
        let path = item?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "css") {
            files.push(path);
        }
    }
    files.sort();

    let mut css = String::new();
    for path in files {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path.file_name().unwrap_or_default().to_string_lossy();
        css.push_str(&format!("/* {name} */\n"));
        css.push_str(&contents);
        if !contents.ends_with('\n') {
            css.push('\n');
        }
    }
    Ok(css)
}

/// First 8 hex digits of the SHA-256 of `contents`.
pub fn content_hash(contents: &str) -> String {
    let digest = Sha256::digest(contents.as_bytes());
    format!("{digest:x}")[..8].to_string()
}

fn stylesheets_in(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut found = Vec::new();
    for item in fs::read_dir(dir)? {
        let path = item?.path();
        let is_generated = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .is_some_and(|n| n.starts_with("style-") && n.ends_with(".css"));
        if is_generated {
            found.push(path);
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn site(css: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        fs::create_dir(root.join("css")).unwrap();
        for (name, body) in css {
            fs::write(root.join("css").join(name), body).unwrap();
        }
        fs::write(
            root.join("layout.html"),
            "<html><head>{{head}}</head><body>{{main}}</body></html>",
        )
        .unwrap();
        fs::write(
            root.join("references.bib"),
            "@article{a,\n  author = {Keestra, Sarai},\n  title = {Older},\n  year = {2021}\n}\n\
             @article{b,\n  author = {Smith, John},\n  title = {Newer},\n  year = {2023}\n}\n",
        )
        .unwrap();
        fs::write(
            root.join("config.toml"),
            "[layout]\nfolder = \"css\"\nskeleton = \"layout.html\"\noutput = \"docs\"\n\n\
             [references]\nauthor = \"Keestra\"\nfile = \"references.bib\"\n",
        )
        .unwrap();
        dir
    }

    #[test]
    fn assemble_fills_both_placeholders() {
        assert_eq!(
            assemble("<head>{{head}}</head><main>{{main}}</main>", "H", "M"),
            "<head>H</head><main>M</main>"
        );
    }

    #[test]
    fn concat_css_sorts_by_name_and_skips_other_files() {
        let dir = site(&[("b.css", "b {}"), ("a.css", "a {}\n"), ("notes.txt", "x")]);
        let css = concat_css(&dir.path().join("css")).unwrap();
        assert_eq!(css, "/* a.css */\na {}\n/* b.css */\nb {}\n");
    }

    #[test]
    fn missing_css_folder_is_an_error() {
        let dir = TempDir::new().unwrap();
        assert!(concat_css(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn content_hash_is_eight_hex_digits() {
        let h = content_hash("body {}");
        assert_eq!(h.len(), 8);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(h, content_hash("body {}"));
        assert_ne!(h, content_hash("body { margin: 0 }"));
    }

    #[test]
    fn build_writes_index_and_hashed_stylesheet() {
        let dir = site(&[("main.css", "body {}")]);
        let config = Config::load(dir.path().join("config.toml")).unwrap();
        let out = SiteBuilder::new(&config).build().unwrap();

        assert_eq!(out.entries, 2);
        let sheet = out.stylesheet.expect("stylesheet");
        let name = sheet.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("style-{}.css", content_hash("/* main.css */\nbody {}\n")));

        let html = fs::read_to_string(&out.index).unwrap();
        assert!(html.contains(&format!(r#"<link rel="stylesheet" href="{name}">"#)));
        assert!(!html.contains("{{main}}"));
        let newer = html.find("Newer").unwrap();
        let older = html.find("Older").unwrap();
        assert!(newer < older);
        assert!(html.contains(r#"<strong class="author-highlight">Keestra, Sarai</strong>"#));
    }

    #[test]
    fn page_sections_precede_publications() {
        let dir = site(&[("main.css", "body {}")]);
        let config_path = dir.path().join("config.toml");
        let mut toml = fs::read_to_string(&config_path).unwrap();
        toml.push_str(
            "\n[[education]]\ndegree = \"DPhil\"\ninstitution = \"Oxford\"\nyears = \"2021 - 2025\"\n\n\
             [[media]]\ntitle = \"Radio interview\"\noutlet = \"NPO Radio 1\"\nyear = 2023\n",
        );
        fs::write(&config_path, toml).unwrap();
        let config = Config::load(&config_path).unwrap();
        let out = SiteBuilder::new(&config).build().unwrap();

        let html = fs::read_to_string(&out.index).unwrap();
        let scicomm = html.find("<h2>Science Communication</h2>").unwrap();
        let education = html.find(r#"<section class="education">"#).unwrap();
        let publications = html.find("Newer").unwrap();
        assert!(scicomm < education);
        assert!(education < publications);
        assert!(!html.contains("nemo-box"));
    }

    #[test]
    fn rebuild_replaces_old_stylesheet() {
        let dir = site(&[("main.css", "body {}")]);
        let config = Config::load(dir.path().join("config.toml")).unwrap();
        let first = SiteBuilder::new(&config).build().unwrap().stylesheet.unwrap();

        fs::write(dir.path().join("css/main.css"), "body { color: red }").unwrap();
        let second = SiteBuilder::new(&config).build().unwrap().stylesheet.unwrap();

        assert_ne!(first, second);
        assert!(!first.exists());
        assert!(second.exists());
    }

    #[test]
    fn empty_css_folder_builds_without_stylesheet() {
        let dir = site(&[]);
        let config = Config::load(dir.path().join("config.toml")).unwrap();
        let out = SiteBuilder::new(&config).build().unwrap();
        assert!(out.stylesheet.is_none());
        let html = fs::read_to_string(&out.index).unwrap();
        assert!(html.contains("<head></head>"));
    }
}
