//! Dialect templates: the rules applied to one project file.
//!
//! [`ProjectTemplate`] is the contract the processor drives. The state and
//! the rule primitives both dialects share live in [`TemplateBase`].

use crate::conflict::ConflictResolver;
use crate::constants::{
    ALWAYS, COPY_TO_OUTPUT_DIRECTORY, INCLUDE, ITEM_GROUP, PRESERVE_NEWEST, PROPERTY_GROUP,
};
use crate::dialect::Dialect;
use crate::element::{self, attribute_value};
use crate::entity::ItemGroupEntity;
use crate::options::FixOptions;
use crate::xml::{Document, Element, Node};
use crate::{FixprojError, Result};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

mod legacy;
mod sdk;

pub use legacy::LegacyTemplate;
pub use sdk::SdkTemplate;

/// Ordered log of the edits made to one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeLog {
    entries: Vec<String>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        debug!("{}", message);
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Operations every project dialect supports.
///
/// The processor calls them in a fixed order: `fix_content` once, then
/// `sort_property_groups` if sorting, then per entity `delete_duplicates`,
/// `delete_references_to_non_existent_files` and `merge_and_sort_item_groups`.
pub trait ProjectTemplate {
    fn dialect(&self) -> Dialect;

    fn base(&self) -> &TemplateBase;

    fn base_mut(&mut self) -> &mut TemplateBase;

    /// Detaches the item groups, applies the dialect's content rules and
    /// returns the items bucketed by type, ordered by type name.
    fn fix_content(&mut self, resolver: &mut dyn ConflictResolver)
        -> Result<Vec<ItemGroupEntity>>;

    fn delete_duplicates(&mut self, entity: &mut ItemGroupEntity) -> Result<()>;

    fn delete_references_to_non_existent_files(
        &mut self,
        entity: &mut ItemGroupEntity,
    ) -> Result<()>;

    fn merge_and_sort_item_groups(&mut self, entity: ItemGroupEntity, sort: bool) -> Result<()>;

    fn sort_property_groups(&mut self) {
        self.base_mut().sort_property_groups();
    }

    fn changes(&self) -> &ChangeLog {
        &self.base().changes
    }

    fn document(&self) -> &Document {
        &self.base().document
    }

    fn into_document(self: Box<Self>) -> Document;
}

/// State owned by a template for the duration of one file's pass.
#[derive(Debug, Clone)]
pub struct TemplateBase {
    pub path: PathBuf,
    pub document: Document,
    pub options: FixOptions,
    pub changes: ChangeLog,
    /// The unconditional `ItemGroup` containers found in the document.
    item_groups: Vec<Element>,
    /// Position among the root's children where the next regenerated
    /// container goes.
    anchor: usize,
    detached: bool,
}

impl TemplateBase {
    /// Records the item-group containers and where the first one stood.
    pub fn initialize(path: &Path, document: Document, options: FixOptions) -> Self {
        let item_groups: Vec<Element> = document
            .root
            .elements()
            .filter(|el| is_collectable_item_group(el))
            .cloned()
            .collect();

        let anchor = document
            .root
            .children
            .iter()
            .position(|node| matches!(node, Node::Element(el) if is_collectable_item_group(el)))
            .unwrap_or(document.root.children.len());

        Self {
            path: path.to_path_buf(),
            document,
            options,
            changes: ChangeLog::new(),
            item_groups,
            anchor,
            detached: false,
        }
    }

    /// Removes the collected containers from the document and hands out
    /// their items. Only the first call returns anything.
    pub fn detach_item_groups(&mut self) -> Vec<Element> {
        if self.detached {
            return Vec::new();
        }
        self.detached = true;
        self.document
            .root
            .children
            .retain(|node| !matches!(node, Node::Element(el) if is_collectable_item_group(el)));

        std::mem::take(&mut self.item_groups)
            .into_iter()
            .flat_map(|group| {
                group.children.into_iter().filter_map(|node| match node {
                    Node::Element(el) => Some(el),
                    _ => None,
                })
            })
            .collect()
    }

    pub fn project_dir(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    /// Qualifies a local name with the root element's prefix, if any.
    pub fn qualified(&self, local_name: &str) -> String {
        match self.document.root.prefix() {
            Some(prefix) => format!("{}:{}", prefix, local_name),
            None => local_name.to_string(),
        }
    }

    /// Collapses blank property groups and strips disallowed properties.
    pub fn fix_property_groups(&mut self, disallowed: &[&str]) {
        let changes = &mut self.changes;
        for group in self
            .document
            .root
            .elements_mut()
            .filter(|el| el.local_name() == PROPERTY_GROUP)
        {
            if element::has_no_content(group) {
                if element::make_empty(group) {
                    changes.record(format!("Removing empty content from property {}.", group.name));
                }
                continue;
            }

            for property in disallowed {
                if element::remove_children_by_local_name(group, property) > 0 {
                    changes.record(format!(
                        "{}: removed {} because it belongs in Directory.Build.props",
                        group.name, property
                    ));
                }
            }
        }
    }

    /// Orders attributes and child elements of every property group,
    /// depth first.
    pub fn sort_property_groups(&mut self) {
        for group in self
            .document
            .root
            .elements_mut()
            .filter(|el| el.local_name() == PROPERTY_GROUP)
        {
            sort_element(group);
        }
    }

    /// Keeps the first item of every set sharing a key (compared
    /// case-insensitively) and drops the rest. Items without a key are
    /// never treated as duplicates.
    pub fn delete_duplicates_by<F>(&mut self, entity: &mut ItemGroupEntity, key: F) -> Result<()>
    where
        F: Fn(&Element) -> Option<String>,
    {
        ensure_named(entity)?;

        let mut first_seen: HashMap<String, usize> = HashMap::new();
        let mut dropped: Vec<(usize, Vec<usize>)> = Vec::new();

        for (index, el) in entity.elements.iter().enumerate() {
            let Some(value) = key(el) else {
                continue;
            };
            let value = value.to_lowercase();
            match first_seen.get(&value) {
                Some(&slot) => dropped[slot].1.push(index),
                None => {
                    first_seen.insert(value, dropped.len());
                    dropped.push((index, Vec::new()));
                }
            }
        }

        let mut remove = vec![false; entity.elements.len()];
        for (_, dupes) in dropped.iter().filter(|(_, dupes)| !dupes.is_empty()) {
            let representative = key(&entity.elements[dupes[0]]).unwrap_or_default();
            self.changes.record(format!(
                "{}: removed {} dupes of {}",
                entity.local_name,
                dupes.len(),
                representative
            ));
            for &index in dupes {
                remove[index] = true;
            }
        }

        let mut flags = remove.into_iter();
        entity
            .elements
            .retain(|_| !flags.next().unwrap_or(false));
        Ok(())
    }

    /// Drops items whose `Include` names a file that is not on disk.
    /// Types listed in `exempt` are left alone.
    pub fn delete_missing_files(
        &mut self,
        entity: &mut ItemGroupEntity,
        exempt: &[&str],
    ) -> Result<()> {
        ensure_named(entity)?;
        if exempt.contains(&entity.local_name.as_str()) {
            return Ok(());
        }

        let dir = self.project_dir();
        let changes = &mut self.changes;
        let local_name = &entity.local_name;
        entity.elements.retain(|el| {
            if !is_dangling(el, &dir) {
                return true;
            }
            changes.record(format!(
                "{}: removed reference to {} because it doesn't exist",
                local_name,
                attribute_value(el, INCLUDE).unwrap_or_default()
            ));
            false
        });
        Ok(())
    }

    /// Puts the entity back into the document as one fresh container,
    /// right after the previously inserted one.
    pub fn merge_and_sort(
        &mut self,
        entity: ItemGroupEntity,
        sort_attribute: Option<&str>,
        sort: bool,
    ) -> Result<()> {
        ensure_named(&entity)?;
        if entity.is_empty() {
            return Ok(());
        }

        let mut elements = entity.elements;
        if sort {
            if let Some(attribute) = sort_attribute {
                elements.sort_by(|a, b| {
                    attribute_value(a, attribute).cmp(&attribute_value(b, attribute))
                });
            }
        }

        let mut container = Element::new(self.qualified(ITEM_GROUP));
        container.children = elements.into_iter().map(Node::Element).collect();

        let at = self.anchor.min(self.document.root.children.len());
        self.document
            .root
            .children
            .insert(at, Node::Element(container));
        self.anchor = at + 1;
        Ok(())
    }
}

/// Downgrades `CopyToOutputDirectory` of `Always` to `PreserveNewest`.
pub fn fix_copy_issue(item: &mut Element, changes: &mut ChangeLog) {
    let include = attribute_value(item, INCLUDE).unwrap_or_default().to_string();
    let item_name = item.local_name().to_string();
    let Some(copy) = element::child_by_local_name_mut(item, COPY_TO_OUTPUT_DIRECTORY) else {
        return;
    };
    if element::text(copy).trim() != ALWAYS {
        return;
    }
    element::set_text(copy, PRESERVE_NEWEST);
    changes.record(format!(
        "{}: Changing {} to PreserveNewest instead of CopyAlways",
        item_name, include
    ));
}

/// Undoes the URL escaping the IDE applies to include values.
pub fn unescape_include(value: &str) -> String {
    value
        .replace("%27", "'")
        .replace("%28", "(")
        .replace("%29", ")")
}

/// An item is dangling when its include resolves to no file, unless it
/// points into a `packages` folder or is a wildcard.
pub fn is_dangling(item: &Element, project_dir: &Path) -> bool {
    let Some(include) = attribute_value(item, INCLUDE) else {
        return false;
    };
    let value = unescape_include(include).replace('\\', "/");

    if value.contains('*') || value.contains('?') {
        return false;
    }
    if is_under_packages(Path::new(&value)) {
        return false;
    }

    !project_dir.join(&value).is_file()
}

/// True if any component of the path is a `packages` folder.
pub fn is_under_packages(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.eq_ignore_ascii_case("packages"),
        _ => false,
    })
}

fn is_collectable_item_group(el: &Element) -> bool {
    // conditional or labelled groups keep their own place
    el.local_name() == ITEM_GROUP && el.attributes.is_empty()
}

fn ensure_named(entity: &ItemGroupEntity) -> Result<()> {
    if entity.local_name.trim().is_empty() {
        return Err(FixprojError::InvalidArgument(
            "item group entity has no type name".to_string(),
        ));
    }
    Ok(())
}

fn sort_element(el: &mut Element) {
    el.attributes
        .sort_by_key(|attr| format!("{}=\"{}\"", attr.name, attr.value));

    if !el.has_elements() {
        return;
    }

    let (mut elements, others): (Vec<Node>, Vec<Node>) = std::mem::take(&mut el.children)
        .into_iter()
        .partition(|node| matches!(node, Node::Element(_)));

    for node in elements.iter_mut() {
        if let Node::Element(child) = node {
            sort_element(child);
        }
    }
    elements.sort_by(|a, b| match (a, b) {
        (Node::Element(a), Node::Element(b)) => a.name.cmp(&b.name),
        _ => std::cmp::Ordering::Equal,
    });

    // comments stay ahead of the sorted properties
    el.children = others;
    el.children.extend(elements);
}
