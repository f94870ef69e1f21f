//! XML navigation helpers shared by the USLM parser and TOC extraction.

mod utils;

pub use utils::{collect_text, element_children, find_ancestor, find_child, get_tag_name, has_tag};
