//! Localized markdown content.
//!
//! Pages live under `content/{locale}/pages/{slug}.md` with YAML frontmatter
//! and are loaded into memory at startup. Each page body is split on its
//! `##` headings into ordered sections, and every section is rendered to
//! HTML, so templates and API consumers get structured fragments instead of
//! one opaque blob.
//!
//! Lookup falls back to the default locale when a page has no translation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use comrak::{Options, markdown_to_html};
use gray_matter::{Matter, ParsedEntity, engine::YAML};
use serde::{Deserialize, Serialize};

/// Locale served when the requested one has no translation.
pub const DEFAULT_LOCALE: &str = "en";

/// Frontmatter metadata for a page.
#[derive(Debug, Clone, Deserialize)]
pub struct PageMeta {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub updated_at: Option<NaiveDate>,
}

/// One rendered section of a page.
#[derive(Debug, Clone, Serialize)]
pub struct PageSection {
    /// Anchor id, slugified from the heading (empty-heading intro sections
    /// get `intro`).
    pub id: String,
    /// The `##` heading text; `None` for content before the first heading.
    pub title: Option<String>,
    /// Rendered HTML for the section body.
    pub html: String,
}

/// A rendered page in one locale.
#[derive(Debug, Clone)]
pub struct Page {
    pub slug: String,
    pub locale: String,
    pub meta: PageMeta,
    pub sections: Vec<PageSection>,
}

/// Content loading errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("parse error: {0}")]
    Parse(String),
}

/// In-memory store of all loaded pages, keyed by `(locale, slug)`.
#[derive(Debug, Clone)]
pub struct ContentStore {
    pages: Arc<HashMap<(String, String), Page>>,
    locales: Arc<Vec<String>>,
}

impl ContentStore {
    /// Load all content from the filesystem.
    ///
    /// Locales are the subdirectories of `content_dir`; a missing content
    /// directory yields an empty store rather than an error so the service
    /// can boot without content.
    ///
    /// # Errors
    ///
    /// Returns an error if a locale directory cannot be read.
    pub fn load(content_dir: &Path) -> Result<Self, ContentError> {
        let mut pages = HashMap::new();
        let mut locales = Vec::new();

        if !content_dir.exists() {
            tracing::warn!("content directory does not exist: {:?}", content_dir);
            return Ok(Self {
                pages: Arc::new(pages),
                locales: Arc::new(locales),
            });
        }

        let entries =
            std::fs::read_dir(content_dir).map_err(|e| ContentError::Io(e.to_string()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let Some(locale) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let locale = locale.to_owned();

            Self::load_locale_pages(&path.join("pages"), &locale, &mut pages)?;
            locales.push(locale);
        }

        locales.sort();
        tracing::info!(locales = ?locales, pages = pages.len(), "content loaded");

        Ok(Self {
            pages: Arc::new(pages),
            locales: Arc::new(locales),
        })
    }

    fn load_locale_pages(
        dir: &Path,
        locale: &str,
        pages: &mut HashMap<(String, String), Page>,
    ) -> Result<(), ContentError> {
        if !dir.exists() {
            tracing::warn!(locale, "pages directory does not exist: {:?}", dir);
            return Ok(());
        }

        let entries = std::fs::read_dir(dir).map_err(|e| ContentError::Io(e.to_string()))?;
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "md") {
                match Self::load_page(&path, locale) {
                    Ok(page) => {
                        tracing::info!(locale, slug = %page.slug, "loaded page");
                        pages.insert((locale.to_owned(), page.slug.clone()), page);
                    }
                    Err(e) => {
                        tracing::error!("failed to load page {:?}: {}", path, e);
                    }
                }
            }
        }

        Ok(())
    }

    /// Load a single page from a markdown file.
    fn load_page(path: &Path, locale: &str) -> Result<Page, ContentError> {
        let content = std::fs::read_to_string(path).map_err(|e| ContentError::Io(e.to_string()))?;

        let slug = path
            .file_stem()
            .and_then(|s| s.to_str())
            .ok_or_else(|| ContentError::Parse("invalid filename".to_owned()))?
            .to_owned();

        let matter = Matter::<YAML>::new();
        let parsed: ParsedEntity<PageMeta> = matter
            .parse(&content)
            .map_err(|e| ContentError::Parse(format!("failed to parse frontmatter: {e}")))?;
        let meta = parsed
            .data
            .ok_or_else(|| ContentError::Parse("missing frontmatter".to_owned()))?;

        let sections = split_sections(&parsed.content)
            .into_iter()
            .map(|(title, body)| {
                let id = title.as_deref().map_or_else(|| "intro".to_owned(), slugify);
                PageSection {
                    id,
                    title,
                    html: render_markdown(&body),
                }
            })
            .collect();

        Ok(Page {
            slug,
            locale: locale.to_owned(),
            meta,
            sections,
        })
    }

    /// Exact lookup by locale and slug.
    #[must_use]
    pub fn get(&self, locale: &str, slug: &str) -> Option<&Page> {
        self.pages.get(&(locale.to_owned(), slug.to_owned()))
    }

    /// Lookup with fallback to the default locale.
    #[must_use]
    pub fn get_with_fallback(&self, locale: &str, slug: &str) -> Option<&Page> {
        self.get(locale, slug)
            .or_else(|| self.get(DEFAULT_LOCALE, slug))
    }

    /// Locales the store carries content for.
    #[must_use]
    pub fn locales(&self) -> &[String] {
        &self.locales
    }
}

/// Split a markdown body into `(heading, body)` sections on `##` headings.
///
/// Content before the first heading becomes a leading section with no title.
/// Headings inside fenced code blocks do not split.
fn split_sections(markdown: &str) -> Vec<(Option<String>, String)> {
    let mut sections: Vec<(Option<String>, String)> = Vec::new();
    let mut current_title: Option<String> = None;
    let mut current_body = String::new();
    let mut started = false;
    let mut in_fence = false;

    for line in markdown.lines() {
        if line.trim_start().starts_with("```") {
            in_fence = !in_fence;
        }

        if !in_fence
            && let Some(heading) = line.strip_prefix("## ")
        {
            if started && !(current_title.is_none() && current_body.trim().is_empty()) {
                sections.push((current_title.take(), std::mem::take(&mut current_body)));
            }
            current_title = Some(heading.trim().to_owned());
            current_body = String::new();
            started = true;
            continue;
        }

        if !started && !line.trim().is_empty() {
            started = true;
        }
        current_body.push_str(line);
        current_body.push('\n');
    }

    if started && !(current_title.is_none() && current_body.trim().is_empty()) {
        sections.push((current_title, current_body));
    }

    sections
}

/// Render markdown to HTML with GitHub Flavored Markdown support.
fn render_markdown(content: &str) -> String {
    let mut options = Options::default();

    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.extension.header_ids = Some(String::new());
    options.extension.footnotes = true;

    // Content files are part of the repository, raw HTML in them is trusted
    options.render.r#unsafe = true;

    markdown_to_html(content, &options)
}

/// Turn a heading into an anchor id.
fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_dash = true;
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_dash = false;
        } else if !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_end_matches('-').to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Shipping & Returns"), "shipping-returns");
        assert_eq!(slugify("FAQ"), "faq");
        assert_eq!(slugify("  What's  inside?  "), "what-s-inside");
    }

    #[test]
    fn test_split_sections_basic() {
        let md = "Intro paragraph.\n\n## First\n\nbody one\n\n## Second\n\nbody two\n";
        let sections = split_sections(md);

        assert_eq!(sections.len(), 3);
        assert_eq!(sections[0].0, None);
        assert!(sections[0].1.contains("Intro paragraph."));
        assert_eq!(sections[1].0.as_deref(), Some("First"));
        assert!(sections[1].1.contains("body one"));
        assert_eq!(sections[2].0.as_deref(), Some("Second"));
    }

    #[test]
    fn test_split_sections_without_leading_intro() {
        let md = "## Only section\n\nbody\n";
        let sections = split_sections(md);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].0.as_deref(), Some("Only section"));
    }

    #[test]
    fn test_split_sections_ignores_headings_in_code_fences() {
        let md = "## Real\n\n```\n## not a heading\n```\n";
        let sections = split_sections(md);
        assert_eq!(sections.len(), 1);
        assert!(sections[0].1.contains("## not a heading"));
    }

    #[test]
    fn test_split_sections_empty_input() {
        assert!(split_sections("").is_empty());
        assert!(split_sections("   \n\n").is_empty());
    }

    #[test]
    fn test_render_markdown_gfm() {
        let html = render_markdown("some **bold** text\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<table>"));
    }
}
