//! Finding matches: literal scan, delegated semantic scan and the matcher
//! that chooses between them

pub mod literal;
pub mod matcher;
pub mod semantic;
pub mod types;

pub use literal::literal_scan;
pub use matcher::Matcher;
pub use types::{
    set_all_selected, toggle_selection, total_matches, Approval, Match, SearchMode,
    SearchResult, SearchStrategy,
};
