mod code;
mod normalize;

pub use code::{dedupe, extract_from_html, extract_from_text};
pub use normalize::{visible_text, HtmlNormalizer};
