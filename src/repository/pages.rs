//! Pages - `<slug>/index.md` directories under the pages root

use std::fs;
use std::path::{Path, PathBuf};

use super::{
    check_field, check_name, read_source, require_title, write_atomic, write_new_in_dir,
    RecordLocks, Revision, PLACEHOLDER,
};
use crate::content::{newest_first, FrontMatter, Page, SlugStyle};
use crate::error::{Result, WriterError};
use crate::helpers::Clock;

const INDEX_FILE: &str = "index.md";

/// Arguments of [`PageRepository::create`]
#[derive(Debug, Clone)]
pub struct NewPage {
    pub title: String,
    pub layout: String,
}

impl NewPage {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            layout: "page".to_string(),
        }
    }
}

/// Full replacement of a page's title, layout and body
#[derive(Debug, Clone)]
pub struct PageUpdate {
    pub title: String,
    pub layout: String,
    pub content: String,
    pub expected_revision: Option<Revision>,
}

impl PageUpdate {
    pub fn from_page(page: &Page) -> Self {
        Self {
            title: page.title.clone(),
            layout: page.layout.clone(),
            content: page.body.clone(),
            expected_revision: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PageRepository {
    pages_dir: PathBuf,
    clock: Clock,
    slug_style: SlugStyle,
    locks: RecordLocks,
}

impl PageRepository {
    pub fn new(
        pages_dir: PathBuf,
        clock: Clock,
        slug_style: SlugStyle,
        locks: RecordLocks,
    ) -> Self {
        Self {
            pages_dir,
            clock,
            slug_style,
            locks,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.pages_dir
    }

    /// Create `<slug>/index.md` and return its path
    pub fn create(&self, new: NewPage) -> Result<PathBuf> {
        let title = require_title(&new.title)?;
        check_field("layout", &new.layout)?;
        let slug = self.slug_style.slugify(title);
        if slug.is_empty() {
            return Err(WriterError::InvalidArgument(format!(
                "title {:?} has no characters usable in a directory name",
                title
            )));
        }
        self.check_slug(&slug)?;

        let page_dir = self.pages_dir.join(&slug);
        let index = page_dir.join(INDEX_FILE);

        let _guard = self.locks.acquire(&index);
        if index.exists() {
            return Err(WriterError::AlreadyExists(index));
        }

        let mut fm = FrontMatter::new();
        fm.insert("title", title);
        fm.insert("date", self.clock.timestamp());
        fm.insert("layout", new.layout);

        let body = format!("# {}\n\n{}\n\n", title, PLACEHOLDER);
        write_new_in_dir(&page_dir, &index, &fm.serialize(&body))?;

        tracing::info!("Created page: {:?}", index);
        Ok(index)
    }

    /// All pages, newest first
    pub fn list(&self) -> Result<Vec<Page>> {
        let mut pages = Vec::new();
        for (slug, index) in self.page_files()? {
            match read_source(&index) {
                Ok(raw) => pages.push(Page::from_source(&slug, &index, &raw)),
                Err(e) => tracing::warn!("Failed to load page {:?}: {}", index, e),
            }
        }

        pages.sort_by(|a, b| {
            newest_first(a.date.as_deref(), &a.slug, b.date.as_deref(), &b.slug)
        });
        Ok(pages)
    }

    /// (slug, index.md path) of every page directory, by slug
    pub fn page_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let entries = fs::read_dir(&self.pages_dir)
            .map_err(|e| WriterError::from_io(&self.pages_dir, e))?;

        let mut files = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            let Some(slug) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            // _posts, _drafts and friends belong to the site builder
            if slug.starts_with('_') || slug.starts_with('.') || !path.is_dir() {
                continue;
            }

            let index = path.join(INDEX_FILE);
            if index.is_file() {
                files.push((slug.to_string(), index));
            }
        }

        files.sort();
        Ok(files)
    }

    pub fn get(&self, slug: &str) -> Result<Page> {
        let index = self.index_of(slug)?;
        let raw = read_source(&index)?;
        Ok(Page::from_source(slug, &index, &raw))
    }

    pub fn revision(&self, slug: &str) -> Result<Revision> {
        Revision::of(&self.index_of(slug)?)
    }

    /// Overwrite a page's title, layout and body, keeping its date
    pub fn update(&self, slug: &str, update: PageUpdate) -> Result<()> {
        let index = self.index_of(slug)?;
        let title = require_title(&update.title)?;
        check_field("layout", &update.layout)?;

        let _guard = self.locks.acquire(&index);
        let raw = read_source(&index)?;
        if let Some(expected) = &update.expected_revision {
            expected.check(&index)?;
        }

        let (existing, _) = FrontMatter::parse_lenient(&raw);
        let mut fm = FrontMatter::new();
        fm.insert("title", title);
        if let Some(date) = existing.date() {
            fm.insert("date", date);
        }
        fm.insert("layout", update.layout);

        write_atomic(&index, &fm.serialize(&update.content))?;

        tracing::info!("Updated page: {:?}", index);
        Ok(())
    }

    /// Remove the page's whole directory
    pub fn delete(&self, slug: &str) -> Result<()> {
        let index = self.index_of(slug)?;
        let page_dir = self.pages_dir.join(slug);

        let _guard = self.locks.acquire(&index);
        // Only directories that really are pages may be removed
        if !index.is_file() {
            return Err(WriterError::NotFound(page_dir));
        }
        fs::remove_dir_all(&page_dir).map_err(|e| WriterError::from_io(&page_dir, e))?;

        tracing::info!("Deleted page: {:?}", page_dir);
        Ok(())
    }

    fn check_slug(&self, slug: &str) -> Result<()> {
        check_name(slug, "page slug")?;
        if slug.starts_with('_') || slug.starts_with('.') {
            return Err(WriterError::InvalidArgument(format!(
                "page slug may not start with '_' or '.': {:?}",
                slug
            )));
        }
        Ok(())
    }

    fn index_of(&self, slug: &str) -> Result<PathBuf> {
        self.check_slug(slug)?;
        Ok(self.pages_dir.join(slug).join(INDEX_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::parse_timestamp;
    use tempfile::TempDir;

    fn repo_at(dir: &TempDir) -> PageRepository {
        fs::create_dir_all(dir.path().join("_posts")).unwrap();
        PageRepository::new(
            dir.path().to_path_buf(),
            Clock::Fixed(parse_timestamp("2024-06-01 12:00:00").unwrap()),
            SlugStyle::Unicode,
            RecordLocks::new(),
        )
    }

    #[test]
    fn test_create_and_get() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);

        let path = repo.create(NewPage::new("About Me")).unwrap();
        assert_eq!(path, dir.path().join("about-me").join("index.md"));
        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "---\ntitle: About Me\ndate: 2024-06-01 12:00:00\nlayout: page\n---\n\n# About Me\n\nStart writing here...\n\n"
        );

        let page = repo.get("about-me").unwrap();
        assert_eq!(page.title, "About Me");
        assert_eq!(page.layout, "page");
    }

    #[test]
    fn test_create_collision() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);
        repo.create(NewPage::new("About")).unwrap();
        assert!(matches!(
            repo.create(NewPage::new("about")),
            Err(WriterError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_list_skips_special_dirs() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);
        repo.create(NewPage::new("About")).unwrap();
        fs::create_dir_all(dir.path().join("images")).unwrap();
        fs::write(dir.path().join("_posts").join("index.md"), "---\ntitle: no\n---\n\n").unwrap();

        let pages = repo.list().unwrap();
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].slug, "about");
    }

    #[test]
    fn test_update_keeps_date_and_replaces_body() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);
        repo.create(NewPage::new("About")).unwrap();

        let mut update = PageUpdate::from_page(&repo.get("about").unwrap());
        update.title = "About Us".into();
        update.content = "We write things.\n".into();
        repo.update("about", update).unwrap();

        let page = repo.get("about").unwrap();
        assert_eq!(page.title, "About Us");
        assert_eq!(page.date.as_deref(), Some("2024-06-01 12:00:00"));
        assert_eq!(page.body, "We write things.\n");
    }

    #[test]
    fn test_update_missing_page() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);
        let update = PageUpdate {
            title: "x".into(),
            layout: "page".into(),
            content: String::new(),
            expected_revision: None,
        };
        assert!(matches!(
            repo.update("nope", update),
            Err(WriterError::NotFound(_))
        ));
    }

    #[test]
    fn test_delete_removes_directory() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);
        let index = repo.create(NewPage::new("About")).unwrap();
        fs::write(index.with_file_name("photo.png"), b"png").unwrap();

        repo.delete("about").unwrap();
        assert!(!dir.path().join("about").exists());
        assert!(matches!(repo.delete("about"), Err(WriterError::NotFound(_))));
    }

    #[test]
    fn test_delete_refuses_non_pages() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);
        fs::create_dir_all(dir.path().join("images")).unwrap();

        assert!(matches!(repo.delete("images"), Err(WriterError::NotFound(_))));
        assert!(dir.path().join("images").exists());
        assert!(matches!(
            repo.delete("_posts"),
            Err(WriterError::InvalidArgument(_))
        ));
        assert!(dir.path().join("_posts").exists());
    }

    #[test]
    fn test_create_rejects_line_breaks() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);

        assert!(matches!(
            repo.create(NewPage::new("About\n---\nInjected")),
            Err(WriterError::InvalidArgument(_))
        ));
        let mut new = NewPage::new("About");
        new.layout = "page\rcomments: false".into();
        assert!(matches!(repo.create(new), Err(WriterError::InvalidArgument(_))));

        assert!(!dir.path().join("about").exists());
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_update_rejects_line_breaks() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir);
        let index = repo.create(NewPage::new("About")).unwrap();
        let original = fs::read_to_string(&index).unwrap();
        let page = repo.get("about").unwrap();

        let mut title = PageUpdate::from_page(&page);
        title.title = "About\ndate: 1999-01-01 00:00:00".into();
        let mut layout = PageUpdate::from_page(&page);
        layout.layout = "page\n---".into();

        for update in [title, layout] {
            assert!(matches!(
                repo.update("about", update),
                Err(WriterError::InvalidArgument(_))
            ));
        }
        assert_eq!(fs::read_to_string(&index).unwrap(), original);
    }
}
