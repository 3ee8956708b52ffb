//! XML scalar readers — parse a single element's text into a typed value.
//!
//! Element matching throughout the crate is by local name; namespaces are
//! ignored.

use imf_common::{ImfError, ImfResult, Rational};
use roxmltree::Node;
use uuid::Uuid;

/// Textual UUID prefix mandated by the CPL and asset map grammars.
const UUID_URN_PREFIX: &str = "urn:uuid:";

/// Length of the canonical hyphenated 8-4-4-4-12 form.
const UUID_HYPHENATED_LEN: usize = 36;

/// First child element of `parent` whose local name equals `name`
/// (case-sensitive, per XML).
pub fn child_by_local_name<'a, 'input>(
    parent: Node<'a, 'input>,
    name: &str,
) -> Option<Node<'a, 'input>> {
    parent
        .children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
}

/// Concatenated text content of an element, trimmed.
pub fn element_text(node: Node) -> String {
    node.children()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_owned()
}

/// Read a `urn:uuid:`-prefixed UUID in the canonical 8-4-4-4-12 form.
/// Hex digits are matched case-insensitively.
pub fn read_uuid(node: Node) -> ImfResult<Uuid> {
    let text = element_text(node);
    let hex = text
        .strip_prefix(UUID_URN_PREFIX)
        .ok_or_else(|| ImfError::invalid(format!("UUID is missing urn:uuid: prefix: {text}")))?;
    if hex.len() != UUID_HYPHENATED_LEN {
        return Err(ImfError::invalid(format!("malformed UUID: {text}")));
    }
    Uuid::parse_str(hex).map_err(|_| ImfError::invalid(format!("malformed UUID: {text}")))
}

/// Read a rational of the form `"<num> <den>"` (two whitespace-separated
/// signed integers). A zero denominator is rejected.
pub fn read_rational(node: Node) -> ImfResult<Rational> {
    let text = element_text(node);
    let mut parts = text.split_whitespace();
    let (num, den) = match (parts.next(), parts.next(), parts.next()) {
        (Some(num), Some(den), None) => (num, den),
        _ => {
            return Err(ImfError::invalid(format!(
                "expected two integers in rational: {text:?}"
            )))
        }
    };
    let num: i64 = num
        .parse()
        .map_err(|_| ImfError::invalid(format!("bad rational numerator: {num:?}")))?;
    let den: i64 = den
        .parse()
        .map_err(|_| ImfError::invalid(format!("bad rational denominator: {den:?}")))?;
    if den == 0 {
        return Err(ImfError::invalid("rational denominator is zero"));
    }
    Ok(Rational::new(num, den))
}

/// Read an unsigned decimal integer fitting in 64 bits.
pub fn read_ulong(node: Node) -> ImfResult<u64> {
    let text = element_text(node);
    text.parse()
        .map_err(|_| ImfError::invalid(format!("bad unsigned integer: {text:?}")))
}
