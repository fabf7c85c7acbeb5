//! Page commands

use anyhow::Result;

use super::print_json;
use crate::repository::{NewPage, PageUpdate};
use crate::Blog;

pub fn create(blog: &Blog, new: NewPage) -> Result<()> {
    let path = blog.pages().create(new)?;
    println!("Created: {}", path.display());
    Ok(())
}

pub fn list(blog: &Blog, json: bool) -> Result<()> {
    let pages = blog.pages().list()?;
    if json {
        return print_json(&pages);
    }

    println!("Pages ({}):", pages.len());
    for page in &pages {
        println!("  {} [{}]", page.title, page.slug);
    }
    Ok(())
}

pub fn show(blog: &Blog, slug: &str, json: bool) -> Result<()> {
    let page = blog.pages().get(slug)?;
    if json {
        return print_json(&page);
    }

    println!("Title:  {}", page.title);
    println!("Date:   {}", page.date.as_deref().unwrap_or(""));
    println!("Layout: {}", page.layout);
    println!();
    print!("{}", page.body);
    Ok(())
}

/// Change any of title, layout and body; the rest stays as it is
pub fn update(
    blog: &Blog,
    slug: &str,
    title: Option<String>,
    layout: Option<String>,
    content: Option<String>,
) -> Result<()> {
    let pages = blog.pages();
    let revision = pages.revision(slug)?;
    let page = pages.get(slug)?;

    let mut update = PageUpdate::from_page(&page);
    if let Some(title) = title {
        update.title = title;
    }
    if let Some(layout) = layout {
        update.layout = layout;
    }
    if let Some(content) = content {
        update.content = content;
    }
    update.expected_revision = Some(revision);
    pages.update(slug, update)?;

    println!("Updated: {}", page.path.display());
    Ok(())
}

pub fn delete(blog: &Blog, slug: &str) -> Result<()> {
    blog.pages().delete(slug)?;
    println!("Deleted page: {}", slug);
    Ok(())
}
