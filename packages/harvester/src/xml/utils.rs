//! XML utility functions for navigating and extracting data from DOM trees.

use roxmltree::Node;

/// Get the tag name without namespace prefix.
///
/// USLM documents use a default namespace, so comparisons are always made
/// on the local name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use statute_harvester::xml::get_tag_name;
///
/// let xml = r#"<uscDoc xmlns="http://xml.house.gov/schemas/uslm/1.0"><section/></uscDoc>"#;
/// let doc = Document::parse(xml).unwrap();
/// let section = doc.root_element().first_element_child().unwrap();
/// assert_eq!(get_tag_name(section), "section");
/// ```
pub fn get_tag_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// Find the first child element with the given tag name.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use statute_harvester::xml::find_child;
///
/// let xml = r#"<section><num>1</num><heading/></section>"#;
/// let doc = Document::parse(xml).unwrap();
/// let root = doc.root_element();
///
/// assert!(find_child(root, "num").is_some());
/// assert!(find_child(root, "content").is_none());
/// ```
pub fn find_child<'a, 'input>(node: Node<'a, 'input>, tag: &str) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|child| child.is_element() && get_tag_name(*child) == tag)
}

/// Check if a node is an element with a specific tag name.
pub fn has_tag(node: Node<'_, '_>, tag: &str) -> bool {
    node.is_element() && get_tag_name(node) == tag
}

/// Get all element children of a node.
pub fn element_children<'a, 'input>(
    node: Node<'a, 'input>,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children().filter(|child| child.is_element())
}

/// Find the nearest ancestor element with one of the given tag names.
pub fn find_ancestor<'a, 'input>(
    node: Node<'a, 'input>,
    tags: &[&str],
) -> Option<Node<'a, 'input>> {
    node.ancestors()
        .skip(1)
        .find(|n| n.is_element() && tags.contains(&get_tag_name(*n)))
}

/// Concatenate all descendant text, skipping subtrees rooted at `skip` tags.
///
/// Block-level children are separated by a space so adjacent paragraphs do
/// not run together; callers normalize whitespace afterwards.
///
/// # Examples
/// ```
/// use roxmltree::Document;
/// use statute_harvester::xml::collect_text;
///
/// let xml = r#"<section><num>§ 1.</num><content>Tax <i>imposed</i>.</content></section>"#;
/// let doc = Document::parse(xml).unwrap();
/// assert_eq!(collect_text(doc.root_element(), &["num"]).trim(), "Tax imposed.");
/// ```
pub fn collect_text(node: Node<'_, '_>, skip: &[&str]) -> String {
    let mut out = String::new();
    collect_into(node, skip, &mut out);
    out
}

fn collect_into(node: Node<'_, '_>, skip: &[&str], out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            if let Some(text) = child.text() {
                out.push_str(text);
            }
        } else if child.is_element() {
            let tag = get_tag_name(child);
            if skip.contains(&tag) {
                continue;
            }
            let block = is_block(tag);
            if block && !out.ends_with(char::is_whitespace) && !out.is_empty() {
                out.push(' ');
            }
            collect_into(child, skip, out);
            if block {
                out.push(' ');
            }
        }
    }
}

fn is_block(tag: &str) -> bool {
    matches!(
        tag,
        "p" | "content"
            | "chapeau"
            | "continuation"
            | "subsection"
            | "paragraph"
            | "subparagraph"
            | "clause"
            | "subclause"
            | "item"
            | "note"
            | "heading"
    )
}
