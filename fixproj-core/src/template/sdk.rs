//! Rules for SDK-style projects, which glob most of their items implicitly.

use super::{fix_copy_issue, ProjectTemplate, TemplateBase};
use crate::conflict::ConflictResolver;
use crate::constants::{
    COMPILE, CONFIG_EXTENSION, CONTENT, DIRECTORY_BUILD_PROPERTIES, EMBEDDED_RESOURCE, INCLUDE, NONE, REMOVE,
    RESOURCE_EXTENSION, SDK_EXEMPT_ITEMS,
};
use crate::dialect::Dialect;
use crate::element::{self, attribute_value, primary_attribute_name};
use crate::entity::ItemGroupEntity;
use crate::options::FixOptions;
use crate::xml::{Document, Element};
use crate::Result;
use std::collections::HashMap;
use std::path::Path;

pub struct SdkTemplate {
    base: TemplateBase,
}

impl SdkTemplate {
    pub fn new(path: &Path, document: Document, options: FixOptions) -> Self {
        Self {
            base: TemplateBase::initialize(path, document, options),
        }
    }

    /// Items the SDK already provides through its default globs, plus the
    /// `None Remove` entries this template regenerates itself.
    fn is_implicit(&mut self, item: &Element) -> bool {
        let reason = match item.local_name() {
            EMBEDDED_RESOURCE => {
                element::attribute_ending_with(item, RESOURCE_EXTENSION).map(|value| {
                    format!("{}: removed {}, resources are globbed by the SDK", EMBEDDED_RESOURCE, value)
                })
            }
            COMPILE => attribute_value(item, INCLUDE).map(|value| {
                format!("{}: removed {}, sources are globbed by the SDK", COMPILE, value)
            }),
            NONE => attribute_value(item, REMOVE)
                .map(|value| format!("{}: dropped Remove of {} for regeneration", NONE, value)),
            _ => None,
        };

        match reason {
            Some(message) => {
                self.base.changes.record(message);
                true
            }
            None => false,
        }
    }
}

impl ProjectTemplate for SdkTemplate {
    fn dialect(&self) -> Dialect {
        Dialect::Sdk
    }

    fn base(&self) -> &TemplateBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TemplateBase {
        &mut self.base
    }

    fn fix_content(
        &mut self,
        _resolver: &mut dyn ConflictResolver,
    ) -> Result<Vec<ItemGroupEntity>> {
        let items = self.base.detach_item_groups();
        self.base.fix_property_groups(DIRECTORY_BUILD_PROPERTIES);

        let mut kept = Vec::with_capacity(items.len());
        for item in items {
            if !self.is_implicit(&item) {
                kept.push(item);
            }
        }

        let none_name = self.base.qualified(NONE);
        let mut none_removes = Vec::new();
        for item in kept.iter_mut() {
            if element::has_no_content(item) && element::make_empty(item) {
                self.base.changes.record(format!(
                    "{}: removing all empty content from {}",
                    item.local_name(),
                    primary_attribute_name(item)
                        .and_then(|attribute| attribute_value(item, attribute))
                        .unwrap_or_default()
                ));
            }
            fix_copy_issue(item, &mut self.base.changes);

            let name = item.local_name();
            if name != EMBEDDED_RESOURCE && name != CONTENT {
                continue;
            }
            // keep the implicit None glob from picking the file up twice
            let value = primary_attribute_name(item)
                .and_then(|attribute| attribute_value(item, attribute))
                .unwrap_or_default();
            if value.is_empty() || value.to_lowercase().ends_with(CONFIG_EXTENSION) {
                continue;
            }
            self.base.changes.record(format!(
                "Create new none node with Remove attribute name and attribute value {}",
                value
            ));
            none_removes.push(Element::new(none_name.as_str()).with_attribute(REMOVE, value));
        }

        let mut buckets: Vec<ItemGroupEntity> = Vec::new();
        let mut slots: HashMap<(String, Option<String>), usize> = HashMap::new();
        for item in kept {
            let key_attribute = primary_attribute_name(&item).map(str::to_string);
            let key = (item.name.clone(), key_attribute.clone());
            let slot = *slots.entry(key).or_insert_with(|| {
                let local_name = item.local_name().to_string();
                buckets.push(ItemGroupEntity::keyed(local_name, key_attribute, Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].elements.push(item);
        }
        buckets.sort_by(|a, b| a.local_name.cmp(&b.local_name));

        let mut entities = Vec::with_capacity(buckets.len() + 1);
        if !none_removes.is_empty() {
            entities.push(ItemGroupEntity::keyed(
                NONE,
                Some(REMOVE.to_string()),
                none_removes,
            ));
        }
        entities.extend(buckets);
        Ok(entities)
    }

    fn delete_duplicates(&mut self, entity: &mut ItemGroupEntity) -> Result<()> {
        let attribute = match entity.local_name.as_str() {
            COMPILE => Some(REMOVE.to_string()),
            NONE => entity.key_attribute.clone(),
            _ => Some(entity.key_attribute.clone().unwrap_or_else(|| INCLUDE.to_string())),
        };
        let Some(attribute) = attribute else {
            return Ok(());
        };

        self.base.delete_duplicates_by(entity, |el| {
            attribute_value(el, &attribute).map(str::to_string)
        })
    }

    fn delete_references_to_non_existent_files(
        &mut self,
        entity: &mut ItemGroupEntity,
    ) -> Result<()> {
        self.base.delete_missing_files(entity, SDK_EXEMPT_ITEMS)
    }

    fn merge_and_sort_item_groups(&mut self, entity: ItemGroupEntity, sort: bool) -> Result<()> {
        let attribute = entity.key_attribute.clone();
        self.base.merge_and_sort(entity, attribute.as_deref(), sort)
    }

    fn into_document(self: Box<Self>) -> Document {
        self.base.document
    }
}
