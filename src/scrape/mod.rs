//! HTML scraping: the listing scraper (C7) turns a publisher homepage/section
//! page into a list of article stubs; the deep scraper (C8) enriches a stub
//! with full article content. Both run `scraper` parsing inside
//! `spawn_blocking` since `scraper::Html` parsing is CPU-bound and not `Send`
//! across an await point in all versions of the crate.

pub mod deep;
pub mod listing;
