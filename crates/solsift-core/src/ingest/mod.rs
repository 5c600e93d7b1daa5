mod github;
mod google_doc;
mod local;
mod pdf;
mod pipeline;
mod strategy;
mod web;
mod wiki;

pub use github::GitHubStrategy;
pub use google_doc::GoogleDocStrategy;
pub use local::LocalStrategy;
pub use pdf::PdfUrlStrategy;
pub use pipeline::Ingestor;
pub use strategy::{default_strategies, IngestContext, RetrievalStrategy};
pub use web::WebPageStrategy;
pub use wiki::RestrictedWikiStrategy;
