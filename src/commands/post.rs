//! Post commands: new, list, search, show, update, delete

use anyhow::Result;

use super::print_json;
use crate::content::Post;
use crate::repository::{ListQuery, NewPost, PostUpdate};
use crate::Blog;

/// Fields to change on `update`; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct PostEdit {
    pub title: Option<String>,
    pub date: Option<String>,
    pub layout: Option<String>,
    pub tags: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
    pub content: Option<String>,
}

impl PostEdit {
    /// The full replacement to write, starting from the post as read
    pub fn apply(self, post: &Post) -> PostUpdate {
        let mut update = PostUpdate::from_post(post);
        if let Some(title) = self.title {
            update.title = title;
        }
        if let Some(date) = self.date {
            update.date = date;
        }
        if let Some(layout) = self.layout {
            update.layout = layout;
        }
        if let Some(tags) = self.tags {
            update.tags = tags;
        }
        if let Some(categories) = self.categories {
            update.categories = categories;
        }
        if let Some(content) = self.content {
            update.content = content;
        }
        update
    }
}

pub fn create(blog: &Blog, new: NewPost) -> Result<()> {
    let path = blog.posts().create(new)?;
    println!("Created: {}", path.display());
    Ok(())
}

pub fn list(blog: &Blog, query: &ListQuery, json: bool) -> Result<()> {
    let posts = blog.posts().list(query)?;
    if json {
        return print_json(&posts);
    }

    println!("Posts ({}):", posts.len());
    for post in &posts {
        println!(
            "  {} - {} [{}]",
            post.date.as_deref().unwrap_or("----------"),
            post.title,
            post.filename
        );
        if !post.tags.is_empty() {
            println!("      tags: {}", post.tags.join(", "));
        }
        if !post.categories.is_empty() {
            println!("      categories: {}", post.categories.join(", "));
        }
    }
    Ok(())
}

pub fn search(blog: &Blog, keyword: &str, json: bool) -> Result<()> {
    let hits = blog.posts().search(keyword)?;
    if json {
        return print_json(&hits);
    }

    println!("Found {} post(s) matching {:?}:", hits.len(), keyword);
    for hit in &hits {
        println!("  {} [{}]", hit.post.title, hit.post.filename);
        for line in &hit.matches {
            println!("      | {}", line);
        }
    }
    Ok(())
}

pub fn show(blog: &Blog, filename: &str, json: bool) -> Result<()> {
    let post = blog.posts().get(filename)?;
    if json {
        return print_json(&post);
    }

    println!("Title:      {}", post.title);
    println!("Date:       {}", post.date.as_deref().unwrap_or(""));
    println!("Layout:     {}", post.layout);
    println!("Tags:       {}", post.tags.join(", "));
    println!("Categories: {}", post.categories.join(", "));
    for (key, value) in &post.extra {
        println!("{:<11} {}", format!("{}:", key), value.to_list().join(", "));
    }
    println!();
    print!("{}", post.body);
    Ok(())
}

/// Read, merge the edit, and write back unless the file changed meanwhile
pub fn update(blog: &Blog, filename: &str, edit: PostEdit) -> Result<()> {
    let posts = blog.posts();
    let revision = posts.revision(filename)?;
    let post = posts.get(filename)?;

    let mut update = edit.apply(&post);
    update.expected_revision = Some(revision);
    posts.update(filename, update)?;

    println!("Updated: {}", post.path.display());
    Ok(())
}

pub fn delete(blog: &Blog, filename: &str) -> Result<()> {
    blog.posts().delete(filename)?;
    println!("Deleted: {}", filename);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::{parse_timestamp, Clock};
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_edit_keeps_unset_fields() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("source/_posts")).unwrap();
        let blog = Blog::open(dir.path())
            .unwrap()
            .with_clock(Clock::Fixed(parse_timestamp("2024-01-01 00:00:00").unwrap()));

        let mut new = NewPost::new("Hello");
        new.tags = vec!["rust".into()];
        create(&blog, new).unwrap();

        let edit = PostEdit {
            title: Some("Hello again".into()),
            content: Some("new body\n".into()),
            ..Default::default()
        };
        update(&blog, "2024-01-01-hello.md", edit).unwrap();

        let post = blog.posts().get("2024-01-01-hello.md").unwrap();
        assert_eq!(post.title, "Hello again");
        assert_eq!(post.date.as_deref(), Some("2024-01-01 00:00:00"));
        assert_eq!(post.tags, vec!["rust"]);
        assert_eq!(post.body, "new body\n");
    }
}
