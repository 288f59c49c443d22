//! Small queries and edits over a single [`Element`].

use crate::constants::{INCLUDE, REMOVE, UPDATE};
use crate::xml::{Attribute, Element, Node};

/// Value of the named attribute, or `None` if it is missing or blank.
pub fn attribute_value<'a>(element: &'a Element, name: &str) -> Option<&'a str> {
    element
        .attributes
        .iter()
        .find(|attr| attr.local_name() == name)
        .map(|attr| attr.value.as_str())
        .filter(|value| !value.trim().is_empty())
}

pub fn set_attribute(element: &mut Element, name: &str, value: impl Into<String>) {
    let value = value.into();
    match element
        .attributes
        .iter_mut()
        .find(|attr| attr.local_name() == name)
    {
        Some(attr) => attr.value = value,
        None => element.attributes.push(Attribute::new(name, value)),
    }
}

pub fn elements_by_local_name<'a>(
    element: &'a Element,
    local_name: &'a str,
) -> impl Iterator<Item = &'a Element> + 'a {
    element.elements().filter(move |el| el.local_name() == local_name)
}

pub fn child_by_local_name<'a>(element: &'a Element, local_name: &'a str) -> Option<&'a Element> {
    elements_by_local_name(element, local_name).next()
}

pub fn child_by_local_name_mut<'a>(
    element: &'a mut Element,
    local_name: &str,
) -> Option<&'a mut Element> {
    element.elements_mut().find(|el| el.local_name() == local_name)
}

/// Removes every child element with the given local name and reports how
/// many were dropped.
pub fn remove_children_by_local_name(element: &mut Element, local_name: &str) -> usize {
    let before = element.children.len();
    element
        .children
        .retain(|node| !matches!(node, Node::Element(el) if el.local_name() == local_name));
    before - element.children.len()
}

/// Concatenated direct text of an element.
pub fn text(element: &Element) -> String {
    element
        .children
        .iter()
        .filter_map(|node| match node {
            Node::Text(text) | Node::CData(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

pub fn set_text(element: &mut Element, value: impl Into<String>) {
    element.children = vec![Node::Text(value.into())];
}

/// True when the element has no child elements and only blank text.
pub fn has_no_content(element: &Element) -> bool {
    !element.has_elements() && text(element).trim().is_empty()
}

/// Drops all child nodes so the element serializes self-closing.
/// Returns whether anything was removed.
pub fn make_empty(element: &mut Element) -> bool {
    let had_children = !element.children.is_empty();
    element.children.clear();
    had_children
}

pub fn ends_with_any_of(subject: &str, suffixes: &[&str]) -> bool {
    suffixes.iter().any(|suffix| subject.ends_with(suffix))
}

/// The first of `Remove`, `Include` or `Update` present on the element, in
/// the element's own attribute order.
pub fn primary_attribute_name(element: &Element) -> Option<&str> {
    element
        .attributes
        .iter()
        .map(Attribute::local_name)
        .find(|name| [REMOVE, INCLUDE, UPDATE].contains(name))
}

/// First attribute value that ends with the given suffix, ignoring case.
pub fn attribute_ending_with<'a>(element: &'a Element, suffix: &str) -> Option<&'a str> {
    let suffix = suffix.to_lowercase();
    element
        .attributes
        .iter()
        .map(|attr| attr.value.as_str())
        .find(|value| value.to_lowercase().ends_with(&suffix))
}

/// Changes the local part of the element name, keeping any prefix.
pub fn rename_local(element: &mut Element, local_name: &str) {
    element.name = match element.prefix() {
        Some(prefix) => format!("{}:{}", prefix, local_name),
        None => local_name.to_string(),
    };
}
