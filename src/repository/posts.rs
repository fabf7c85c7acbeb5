//! Posts - flat `.md` files in the posts directory

use std::fs;
use std::path::{Path, PathBuf};

use super::{
    check_field, check_items, check_name, read_source, require_title, write_atomic, write_new,
    RecordLocks, Revision, MORE_MARKER, PLACEHOLDER,
};
use crate::content::{
    is_draft_name, newest_first, FrontMatter, Post, SearchHit, SlugStyle, DRAFT_PREFIX,
};
use crate::error::{Result, WriterError};
use crate::helpers::Clock;

/// Most matching lines kept per search hit
const MAX_PREVIEW_LINES: usize = 3;

/// Arguments of [`PostRepository::create`]
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub layout: String,
    pub draft: bool,
}

impl NewPost {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            tags: Vec::new(),
            categories: Vec::new(),
            layout: "post".to_string(),
            draft: false,
        }
    }
}

/// Filters of [`PostRepository::list`]
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    /// Keep at most this many posts; `None` keeps all
    pub limit: Option<usize>,
    pub category: Option<String>,
    pub tag: Option<String>,
}

/// Full replacement of a post's metadata and body
#[derive(Debug, Clone)]
pub struct PostUpdate {
    pub title: String,
    pub date: String,
    pub layout: String,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
    pub content: String,
    /// Fail with `Conflict` if the file changed after this revision
    pub expected_revision: Option<Revision>,
}

impl PostUpdate {
    /// Start from the post as it currently is
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            date: post.date.clone().unwrap_or_default(),
            layout: post.layout.clone(),
            tags: post.tags.clone(),
            categories: post.categories.clone(),
            content: post.body.clone(),
            expected_revision: None,
        }
    }
}

/// Posts stored as `<YYYY-MM-DD>-<slug>.md` (or `draft-...`) in one directory
#[derive(Debug, Clone)]
pub struct PostRepository {
    posts_dir: PathBuf,
    clock: Clock,
    slug_style: SlugStyle,
    locks: RecordLocks,
}

impl PostRepository {
    pub fn new(
        posts_dir: PathBuf,
        clock: Clock,
        slug_style: SlugStyle,
        locks: RecordLocks,
    ) -> Self {
        Self {
            posts_dir,
            clock,
            slug_style,
            locks,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.posts_dir
    }

    /// The file name a new post with this title gets today
    pub fn filename_for(&self, title: &str, draft: bool) -> Result<String> {
        let slug = self.slug_style.slugify(title);
        if slug.is_empty() {
            return Err(WriterError::InvalidArgument(format!(
                "title {:?} has no characters usable in a file name",
                title
            )));
        }
        let filename = format!("{}-{}.md", self.clock.today(), slug);
        Ok(if draft {
            format!("{}{}", DRAFT_PREFIX, filename)
        } else {
            filename
        })
    }

    /// Create a new post and return its path
    pub fn create(&self, new: NewPost) -> Result<PathBuf> {
        let title = require_title(&new.title)?;
        check_field("layout", &new.layout)?;
        check_items("tags", &new.tags)?;
        check_items("categories", &new.categories)?;
        let filename = self.filename_for(title, new.draft)?;
        let path = self.posts_dir.join(&filename);

        let _guard = self.locks.acquire(&path);
        if path.exists() {
            return Err(WriterError::AlreadyExists(path));
        }

        let mut fm = FrontMatter::new();
        fm.insert("title", title);
        fm.insert("date", self.clock.timestamp());
        if !new.tags.is_empty() {
            fm.insert("tags", new.tags);
        }
        if !new.categories.is_empty() {
            fm.insert("categories", new.categories);
        }
        fm.insert("layout", new.layout);

        let body = format!(
            "# {}\n\n{}\n\n{}\n\n## Keep going\n\n",
            title, PLACEHOLDER, MORE_MARKER
        );
        write_new(&path, &fm.serialize(&body))?;

        tracing::info!("Created post: {:?}", path);
        Ok(path)
    }

    /// Published posts, newest first, optionally filtered and truncated
    pub fn list(&self, query: &ListQuery) -> Result<Vec<Post>> {
        let mut posts: Vec<Post> = self
            .load_published()?
            .into_iter()
            .filter(|post| {
                query
                    .category
                    .as_ref()
                    .map_or(true, |c| post.categories.contains(c))
            })
            .filter(|post| query.tag.as_ref().map_or(true, |t| post.tags.contains(t)))
            .collect();

        sort_posts(&mut posts);
        if let Some(limit) = query.limit {
            posts.truncate(limit);
        }
        Ok(posts)
    }

    /// Case-insensitive search over the whole file text
    pub fn search(&self, keyword: &str) -> Result<Vec<SearchHit>> {
        let needle = keyword.trim().to_lowercase();
        if needle.is_empty() {
            return Err(WriterError::InvalidArgument(
                "search keyword must not be empty".to_string(),
            ));
        }

        let mut hits = Vec::new();
        for path in self.published_files()? {
            let raw = match read_source(&path) {
                Ok(raw) => raw,
                Err(e) => {
                    tracing::warn!("Failed to read post {:?}: {}", path, e);
                    continue;
                }
            };
            if !raw.to_lowercase().contains(&needle) {
                continue;
            }

            let mut matches: Vec<String> = Vec::new();
            for line in raw.lines() {
                if matches.len() == MAX_PREVIEW_LINES {
                    break;
                }
                let line = line.trim();
                if line.to_lowercase().contains(&needle) && !matches.iter().any(|m| m == line) {
                    matches.push(line.to_string());
                }
            }

            hits.push(SearchHit {
                post: Post::from_source(&path, &raw),
                matches,
            });
        }

        hits.sort_by(|a, b| {
            newest_first(
                a.post.date.as_deref(),
                &a.post.filename,
                b.post.date.as_deref(),
                &b.post.filename,
            )
        });
        Ok(hits)
    }

    /// Load one post by file name; drafts included
    pub fn get(&self, filename: &str) -> Result<Post> {
        let path = self.path_of(filename)?;
        let raw = read_source(&path)?;
        Ok(Post::from_source(&path, &raw))
    }

    pub fn revision(&self, filename: &str) -> Result<Revision> {
        Revision::of(&self.path_of(filename)?)
    }

    /// Overwrite a post's metadata and body.
    ///
    /// Keys not in the update and the previous body are discarded.
    pub fn update(&self, filename: &str, update: PostUpdate) -> Result<()> {
        let path = self.path_of(filename)?;
        let title = require_title(&update.title)?;
        check_field("date", &update.date)?;
        check_field("layout", &update.layout)?;
        check_items("tags", &update.tags)?;
        check_items("categories", &update.categories)?;

        let _guard = self.locks.acquire(&path);
        if !path.is_file() {
            return Err(WriterError::NotFound(path));
        }
        if let Some(expected) = &update.expected_revision {
            expected.check(&path)?;
        }

        let mut fm = FrontMatter::new();
        fm.insert("title", title);
        fm.insert("date", update.date.trim());
        fm.insert("tags", update.tags);
        fm.insert("categories", update.categories);
        fm.insert("layout", update.layout);

        write_atomic(&path, &fm.serialize(&update.content))?;

        tracing::info!("Updated post: {:?}", path);
        Ok(())
    }

    /// Remove a post file for good
    pub fn delete(&self, filename: &str) -> Result<()> {
        let path = self.path_of(filename)?;
        let _guard = self.locks.acquire(&path);
        if !path.is_file() {
            return Err(WriterError::NotFound(path));
        }
        fs::remove_file(&path).map_err(|e| WriterError::from_io(&path, e))?;

        tracing::info!("Deleted post: {:?}", path);
        Ok(())
    }

    /// Every `.md` file in the posts directory, drafts included, by name
    pub fn all_files(&self) -> Result<Vec<PathBuf>> {
        let dir = glob::Pattern::escape(&self.posts_dir.to_string_lossy());
        let pattern = format!("{}/*.md", dir.trim_end_matches('/'));

        let mut files: Vec<PathBuf> = glob::glob(&pattern)
            .map_err(|e| WriterError::InvalidArgument(format!("bad posts path: {}", e)))?
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    tracing::warn!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect();
        files.sort();
        Ok(files)
    }

    /// `.md` files that are not drafts, by name
    pub fn published_files(&self) -> Result<Vec<PathBuf>> {
        Ok(self
            .all_files()?
            .into_iter()
            .filter(|path| {
                path.file_name()
                    .and_then(|n| n.to_str())
                    .map_or(false, |n| !is_draft_name(n))
            })
            .collect())
    }

    /// Parse every published post, skipping files that cannot be read
    pub fn load_published(&self) -> Result<Vec<Post>> {
        let mut posts = Vec::new();
        for path in self.published_files()? {
            match read_source(&path) {
                Ok(raw) => posts.push(Post::from_source(&path, &raw)),
                Err(e) => tracing::warn!("Failed to load post {:?}: {}", path, e),
            }
        }
        Ok(posts)
    }

    /// Only plain `.md` names in the posts directory address a post
    fn path_of(&self, filename: &str) -> Result<PathBuf> {
        check_name(filename, "post filename")?;
        if !filename.ends_with(".md") {
            return Err(WriterError::InvalidArgument(format!(
                "not a post file: {:?}",
                filename
            )));
        }
        Ok(self.posts_dir.join(filename))
    }
}

fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| {
        newest_first(
            a.date.as_deref(),
            &a.filename,
            b.date.as_deref(),
            &b.filename,
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::parse_timestamp;
    use tempfile::TempDir;

    fn repo_at(dir: &TempDir, now: &str) -> PostRepository {
        let posts_dir = dir.path().join("_posts");
        fs::create_dir_all(&posts_dir).unwrap();
        PostRepository::new(
            posts_dir,
            Clock::Fixed(parse_timestamp(now).unwrap()),
            SlugStyle::Unicode,
            RecordLocks::new(),
        )
    }

    fn write_post(repo: &PostRepository, name: &str, content: &str) {
        fs::write(repo.dir().join(name), content).unwrap();
    }

    #[test]
    fn test_create_and_list_hello_world() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 09:15:00");

        let path = repo.create(NewPost::new("Hello World")).unwrap();
        assert_eq!(path.file_name().unwrap(), "2024-01-01-hello-world.md");

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "---\ntitle: Hello World\ndate: 2024-01-01 09:15:00\nlayout: post\n---\n\n# Hello World\n"
        ));
        assert!(text.contains("<!-- more -->"));

        let posts = repo.list(&ListQuery::default()).unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].title, "Hello World");
        assert!(posts[0].tags.is_empty());
        assert_eq!(posts[0].date.as_deref(), Some("2024-01-01 09:15:00"));
    }

    #[test]
    fn test_create_with_tags_and_draft() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-02-03 00:00:00");

        let mut new = NewPost::new("Secret Plans");
        new.tags = vec!["rust".into(), "life".into()];
        new.categories = vec!["notes".into()];
        new.draft = true;
        let path = repo.create(new).unwrap();
        assert_eq!(
            path.file_name().unwrap(),
            "draft-2024-02-03-secret-plans.md"
        );

        let post = repo.get("draft-2024-02-03-secret-plans.md").unwrap();
        assert_eq!(post.tags, vec!["rust", "life"]);
        assert_eq!(post.categories, vec!["notes"]);

        // drafts exist on disk but stay out of listings
        assert!(repo.list(&ListQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_create_rejects_empty_title() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        assert!(matches!(
            repo.create(NewPost::new("   ")),
            Err(WriterError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.create(NewPost::new("?!")),
            Err(WriterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_collision_leaves_file_untouched() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(&repo, "2024-01-01-hello-world.md", "original");

        let err = repo.create(NewPost::new("Hello, World!")).unwrap_err();
        assert!(matches!(err, WriterError::AlreadyExists(_)));
        assert_eq!(
            fs::read_to_string(repo.dir().join("2024-01-01-hello-world.md")).unwrap(),
            "original"
        );
    }

    #[test]
    fn test_list_filters_sorts_and_limits() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(
            &repo,
            "a.md",
            "---\ntitle: A\ndate: 2024-01-01 00:00:00\ntags: [rust]\ncategories: [code]\n---\n\n",
        );
        write_post(
            &repo,
            "b.md",
            "---\ntitle: B\ndate: 2024-03-01 00:00:00\ntags: [rusty]\n---\n\n",
        );
        write_post(&repo, "c.md", "---\ntitle: C\ntags: rust\n---\n\n");
        write_post(
            &repo,
            "d.md",
            "---\ntitle: D\ndate: 2024-02-01 00:00:00\ntags: [Rust, rust]\n---\n\n",
        );
        write_post(
            &repo,
            "draft-e.md",
            "---\ntitle: E\ndate: 2025-01-01 00:00:00\ntags: [rust]\n---\n\n",
        );
        write_post(&repo, "notes.txt", "not a post");

        let all = repo.list(&ListQuery::default()).unwrap();
        let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["B", "D", "A", "C"]);

        let rust = repo
            .list(&ListQuery {
                tag: Some("rust".into()),
                ..Default::default()
            })
            .unwrap();
        let titles: Vec<_> = rust.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["D", "A", "C"]);
        assert!(rust.iter().all(|p| p.tags.contains(&"rust".to_string())));

        let code = repo
            .list(&ListQuery {
                category: Some("code".into()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(code.len(), 1);
        assert_eq!(code[0].title, "A");

        let limited = repo
            .list(&ListQuery {
                limit: Some(2),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(limited.len(), 2);
        assert!(limited.iter().all(|p| !p.is_draft()));
    }

    #[test]
    fn test_list_survives_broken_file() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(&repo, "broken.md", "---\ntitle: never closed\n");
        write_post(&repo, "ok.md", "---\ntitle: Fine\n---\n\n");

        let posts = repo.list(&ListQuery::default()).unwrap();
        assert_eq!(posts.len(), 2);
        let broken = posts.iter().find(|p| p.filename == "broken.md").unwrap();
        assert_eq!(broken.title, "broken");
    }

    #[test]
    fn test_search_case_insensitive_with_preview() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(&repo, "one.md", "---\ntitle: One\n---\n\nFoo bar\nnothing here\n");
        write_post(&repo, "two.md", "---\ntitle: Two\n---\n\nunrelated\n");
        write_post(&repo, "draft-three.md", "---\ntitle: Three\n---\n\nfoo in a draft\n");

        let hits = repo.search("foo").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].post.title, "One");
        assert_eq!(hits[0].matches, vec!["Foo bar"]);
    }

    #[test]
    fn test_search_preview_capped_and_distinct() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(
            &repo,
            "many.md",
            "---\ntitle: Rust notes\n---\n\nrust\n  rust\nRust again\nmore rust\neven more rust\n",
        );

        let hits = repo.search("RUST").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(
            hits[0].matches,
            vec!["title: Rust notes", "rust", "Rust again"]
        );
    }

    #[test]
    fn test_search_rejects_empty_keyword() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        assert!(matches!(
            repo.search("  "),
            Err(WriterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_update_replaces_everything() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(
            &repo,
            "a.md",
            "---\ntitle: Old\ndate: 2024-01-01 00:00:00\ncomments: false\n---\n\nOld body\n",
        );

        repo.update(
            "a.md",
            PostUpdate {
                title: "New".into(),
                date: "2024-01-02 03:04:05".into(),
                layout: "post".into(),
                tags: vec!["x".into()],
                categories: vec![],
                content: String::new(),
                expected_revision: None,
            },
        )
        .unwrap();

        let text = fs::read_to_string(repo.dir().join("a.md")).unwrap();
        assert_eq!(
            text,
            "---\ntitle: New\ndate: 2024-01-02 03:04:05\ntags: [x]\ncategories: []\nlayout: post\n---\n\n"
        );
        let post = repo.get("a.md").unwrap();
        assert_eq!(post.body, "");
        assert!(post.extra.is_empty());
    }

    #[test]
    fn test_update_missing_and_stale() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(&repo, "a.md", "---\ntitle: A\n---\n\nbody\n");

        let post = repo.get("a.md").unwrap();
        assert!(matches!(
            repo.update("missing.md", PostUpdate::from_post(&post)),
            Err(WriterError::NotFound(_))
        ));

        let mut update = PostUpdate::from_post(&post);
        update.expected_revision = Some(repo.revision("a.md").unwrap());
        write_post(&repo, "a.md", "---\ntitle: A\n---\n\nsomeone else wrote this\n");

        assert!(matches!(
            repo.update("a.md", update.clone()),
            Err(WriterError::Conflict(_))
        ));
        assert!(fs::read_to_string(repo.dir().join("a.md"))
            .unwrap()
            .contains("someone else"));

        // the lock was released on the error path
        update.expected_revision = None;
        repo.update("a.md", update).unwrap();
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(&repo, "a.md", "x");

        repo.delete("a.md").unwrap();
        assert!(!repo.dir().join("a.md").exists());
        assert!(matches!(repo.delete("a.md"), Err(WriterError::NotFound(_))));
        assert!(matches!(
            repo.delete("../secrets.md"),
            Err(WriterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_only_md_names_address_posts() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        write_post(&repo, "photo.png", "png");

        assert!(matches!(
            repo.delete("photo.png"),
            Err(WriterError::InvalidArgument(_))
        ));
        assert!(repo.dir().join("photo.png").is_file());
        assert!(matches!(
            repo.get("photo.png"),
            Err(WriterError::InvalidArgument(_))
        ));
        assert!(matches!(
            repo.revision("notes.txt"),
            Err(WriterError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_create_rejects_line_breaks() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");

        assert!(matches!(
            repo.create(NewPost::new("Hello\n---\nInjected")),
            Err(WriterError::InvalidArgument(_))
        ));

        let mut new = NewPost::new("Hello");
        new.tags = vec!["rust".into(), "a\rb".into()];
        assert!(matches!(repo.create(new), Err(WriterError::InvalidArgument(_))));

        let mut new = NewPost::new("Hello");
        new.categories = vec!["x\ndate: 1999-01-01 00:00:00".into()];
        assert!(matches!(repo.create(new), Err(WriterError::InvalidArgument(_))));

        let mut new = NewPost::new("Hello");
        new.layout = "post\ncomments: false".into();
        assert!(matches!(repo.create(new), Err(WriterError::InvalidArgument(_))));

        assert!(repo.all_files().unwrap().is_empty());
    }

    #[test]
    fn test_update_rejects_line_breaks() {
        let dir = TempDir::new().unwrap();
        let repo = repo_at(&dir, "2024-01-01 00:00:00");
        let original = "---\ntitle: A\ndate: 2024-01-01 00:00:00\n---\n\nbody\n";
        write_post(&repo, "a.md", original);
        let post = repo.get("a.md").unwrap();

        let mut title = PostUpdate::from_post(&post);
        title.title = "A\n---\nInjected".into();
        let mut date = PostUpdate::from_post(&post);
        date.date = "2024-01-01 00:00:00\nlayout: page".into();
        let mut layout = PostUpdate::from_post(&post);
        layout.layout = "post\r".into();
        let mut tags = PostUpdate::from_post(&post);
        tags.tags = vec!["ok".into(), "not\nok".into()];
        let mut categories = PostUpdate::from_post(&post);
        categories.categories = vec!["a\nb".into()];

        for update in [title, date, layout, tags, categories] {
            assert!(matches!(
                repo.update("a.md", update),
                Err(WriterError::InvalidArgument(_))
            ));
        }
        assert_eq!(fs::read_to_string(repo.dir().join("a.md")).unwrap(), original);

        // multi-line bodies are still fine
        let mut body = PostUpdate::from_post(&post);
        body.content = "line one\n---\nline two\n".into();
        repo.update("a.md", body).unwrap();
        let post = repo.get("a.md").unwrap();
        assert_eq!(post.title, "A");
        assert_eq!(post.body, "line one\n---\nline two\n");
    }
}
