//! Content module - front-matter codec, slugs and the post/page models

mod frontmatter;
mod record;
mod slug;

pub use frontmatter::{FieldValue, FrontMatter, DELIMITER, FIXED_FIELDS};
pub use record::{is_draft_name, newest_first, Page, Post, SearchHit, DRAFT_PREFIX};
pub use slug::{slugify, SlugStyle};
