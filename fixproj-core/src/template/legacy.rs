//! Rules for framework-style projects that declare every file explicitly.

use super::{fix_copy_issue, is_under_packages, ProjectTemplate, TemplateBase};
use crate::conflict::{ConflictChoice, ConflictResolver};
use crate::constants::{
    APP_CONFIG, CODE_SUB_TYPE, COMPILE, CONTENT, COPY_TO_OUTPUT_DIRECTORY, EMBEDDED_RESOURCE,
    INCLUDE, LEGACY_STRUCTURAL_ITEMS, NONE, PACKAGES_CONFIG, PRESERVE_NEWEST, SUB_TYPE,
    WEB_CONFIG, WEB_TEMPLATE_EXTENSION,
};
use crate::dialect::Dialect;
use crate::element::{self, attribute_value};
use crate::entity::ItemGroupEntity;
use crate::options::{split_globs, FixOptions};
use crate::xml::{Document, Element};
use crate::Result;
use glob::Pattern;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::warn;
use walkdir::WalkDir;

pub struct LegacyTemplate {
    base: TemplateBase,
}

impl LegacyTemplate {
    pub fn new(path: &Path, document: Document, options: FixOptions) -> Self {
        Self {
            base: TemplateBase::initialize(path, document, options),
        }
    }

    fn fix_item(&mut self, item: &mut Element, resolver: &mut dyn ConflictResolver) -> Result<()> {
        let changes = &mut self.base.changes;
        let include = attribute_value(item, INCLUDE).unwrap_or_default().to_string();
        let lower = include.to_lowercase();

        if element::has_no_content(item) && element::make_empty(item) {
            changes.record(format!(
                "{}: removing all empty content from {}",
                item.local_name(),
                include
            ));
        }

        let is_code_sub_type = element::child_by_local_name(item, SUB_TYPE)
            .is_some_and(|sub_type| element::text(sub_type).trim() == CODE_SUB_TYPE);
        if is_code_sub_type {
            element::remove_children_by_local_name(item, SUB_TYPE);
            changes.record(format!(
                "{}: removed Code SubType from {}",
                item.local_name(),
                include
            ));
        }

        if element::ends_with_any_of(&lower, &[PACKAGES_CONFIG, APP_CONFIG, WEB_CONFIG]) {
            // build servers choke on web.config unless it is Content
            let wanted = if lower.ends_with(WEB_CONFIG) { CONTENT } else { NONE };
            if item.local_name() != wanted {
                changes.record(format!(
                    "{}: changing to {} for {}",
                    item.local_name(),
                    wanted,
                    include
                ));
                element::rename_local(item, wanted);
            }

            if element::remove_children_by_local_name(item, COPY_TO_OUTPUT_DIRECTORY) > 0 {
                changes.record(format!(
                    "{}: Removing CopyToOutputDirectory for {}",
                    item.local_name(),
                    include
                ));
            }
        }

        if element::child_by_local_name(item, COPY_TO_OUTPUT_DIRECTORY).is_some() {
            fix_copy_issue(item, changes);

            if item.local_name() == EMBEDDED_RESOURCE {
                match resolver.resolve(&include)? {
                    ConflictChoice::Embed => {
                        element::remove_children_by_local_name(item, COPY_TO_OUTPUT_DIRECTORY);
                        changes.record(format!(
                            "{}: kept {} embedded and removed CopyToOutputDirectory",
                            EMBEDDED_RESOURCE, include
                        ));
                    }
                    ConflictChoice::Content => {
                        element::rename_local(item, CONTENT);
                        if let Some(copy) =
                            element::child_by_local_name_mut(item, COPY_TO_OUTPUT_DIRECTORY)
                        {
                            element::set_text(copy, PRESERVE_NEWEST);
                        }
                        changes.record(format!(
                            "{}: changed {} to Content with PreserveNewest",
                            EMBEDDED_RESOURCE, include
                        ));
                    }
                    ConflictChoice::Skip => {
                        warn!("Left conflicting EmbeddedResource {} untouched", include);
                    }
                }
            }
        }

        let name = item.local_name();
        if lower.ends_with(WEB_TEMPLATE_EXTENSION) && name != CONTENT && name != EMBEDDED_RESOURCE {
            changes.record(format!("{}: making {} into Content", name, lower));
            element::rename_local(item, CONTENT);
        }

        Ok(())
    }

    /// Declares files found on disk that the project does not list yet and
    /// corrects includes that differ from the disk only in case.
    fn add_files_on_disk(&mut self, entities: &mut Vec<ItemGroupEntity>) -> Result<()> {
        let requested = [
            (COMPILE, self.base.options.add_compile_files.clone()),
            (CONTENT, self.base.options.add_content_files.clone()),
            (EMBEDDED_RESOURCE, self.base.options.add_embedded_resource_files.clone()),
        ];

        for (item_type, globs) in requested {
            let Some(globs) = globs else {
                continue;
            };
            let on_disk = self.files_on_disk(&split_globs(&globs))?;
            if on_disk.is_empty() {
                continue;
            }

            let position = match entities.iter().position(|e| e.local_name == item_type) {
                Some(position) => position,
                None => {
                    let at = entities
                        .iter()
                        .position(|e| e.local_name.as_str() > item_type)
                        .unwrap_or(entities.len());
                    entities.insert(
                        at,
                        ItemGroupEntity::keyed(item_type, Some(INCLUDE.to_string()), Vec::new()),
                    );
                    at
                }
            };
            let qualified_name = self.base.qualified(item_type);
            let entity = &mut entities[position];
            let changes = &mut self.base.changes;

            let mut by_lower: HashMap<String, usize> = HashMap::new();
            for (index, el) in entity.elements.iter().enumerate() {
                if let Some(include) = attribute_value(el, INCLUDE) {
                    by_lower.entry(include.to_lowercase()).or_insert(index);
                }
            }

            for file in &on_disk {
                let Some(&index) = by_lower.get(&file.to_lowercase()) else {
                    continue;
                };
                let el = &mut entity.elements[index];
                let current = attribute_value(el, INCLUDE).unwrap_or_default().to_string();
                if current != *file {
                    changes.record(format!(
                        "{}: case mismatch between Include and file system name. Changing case from '{}' to '{}'",
                        item_type, current, file
                    ));
                    element::set_attribute(el, INCLUDE, file.as_str());
                }
            }

            let declared: HashSet<String> = by_lower.into_keys().collect();
            for file in on_disk {
                if declared.contains(&file.to_lowercase()) {
                    continue;
                }
                changes.record(format!("{}: added {}", item_type, file));
                entity
                    .elements
                    .push(Element::new(qualified_name.as_str()).with_attribute(INCLUDE, file));
            }
        }

        Ok(())
    }

    /// Project-relative paths (with `\` separators) of files matching any
    /// of the globs, skipping build output and generated files.
    fn files_on_disk(&self, globs: &[String]) -> Result<Vec<String>> {
        let patterns = globs
            .iter()
            .map(|glob| Pattern::new(glob))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        let dir = self.base.project_dir();
        let special = Regex::new(SPECIAL_FILES)?;

        let mut files = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !patterns.iter().any(|pattern| pattern.matches(&name)) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&dir) else {
                continue;
            };
            if is_under_packages(relative) {
                continue;
            }
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("\\");
            if special.is_match(&relative) {
                continue;
            }
            files.push(relative);
        }
        Ok(files)
    }
}

/// Build output and designer leftovers that must never be declared.
const SPECIAL_FILES: &str = r"(?i)(^|\\)(bin|obj)\\|\.cs\.|TemporaryGenerated";

impl ProjectTemplate for LegacyTemplate {
    fn dialect(&self) -> Dialect {
        Dialect::Legacy
    }

    fn base(&self) -> &TemplateBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut TemplateBase {
        &mut self.base
    }

    fn fix_content(
        &mut self,
        resolver: &mut dyn ConflictResolver,
    ) -> Result<Vec<ItemGroupEntity>> {
        let mut items = self.base.detach_item_groups();
        self.base.fix_property_groups(&[]);

        for item in items.iter_mut() {
            self.fix_item(item, resolver)?;
        }

        let mut buckets: Vec<(String, Vec<Element>)> = Vec::new();
        let mut slots: HashMap<String, usize> = HashMap::new();
        for item in items {
            let slot = *slots.entry(item.name.clone()).or_insert_with(|| {
                buckets.push((item.name.clone(), Vec::new()));
                buckets.len() - 1
            });
            buckets[slot].1.push(item);
        }

        let mut entities: Vec<ItemGroupEntity> = buckets
            .into_iter()
            .map(|(name, elements)| {
                let local_name = Element::new(name).local_name().to_string();
                ItemGroupEntity::keyed(local_name, Some(INCLUDE.to_string()), elements)
            })
            .collect();
        entities.sort_by(|a, b| a.local_name.cmp(&b.local_name));

        self.add_files_on_disk(&mut entities)?;
        Ok(entities)
    }

    fn delete_duplicates(&mut self, entity: &mut ItemGroupEntity) -> Result<()> {
        let attribute = key_attribute(entity);
        self.base.delete_duplicates_by(entity, |el| {
            attribute_value(el, &attribute).map(str::to_string)
        })
    }

    fn delete_references_to_non_existent_files(
        &mut self,
        entity: &mut ItemGroupEntity,
    ) -> Result<()> {
        self.base.delete_missing_files(entity, LEGACY_STRUCTURAL_ITEMS)
    }

    fn merge_and_sort_item_groups(&mut self, entity: ItemGroupEntity, sort: bool) -> Result<()> {
        let local_name = entity.local_name.clone();
        let attribute = key_attribute(&entity);
        self.base.merge_and_sort(entity, Some(&attribute), sort)?;
        if sort {
            self.base.changes.record(format!("{}: sorted", local_name));
        }
        Ok(())
    }

    fn into_document(self: Box<Self>) -> Document {
        self.base.document
    }
}

/// Legacy buckets are keyed on `Include` unless they say otherwise.
fn key_attribute(entity: &ItemGroupEntity) -> String {
    entity
        .key_attribute
        .clone()
        .unwrap_or_else(|| INCLUDE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conflict::FixedResolver;
    use crate::constants::MSBUILD_NAMESPACE;
    use tempfile::tempdir;

    fn project(items: &str) -> Document {
        Document::parse(&format!(
            "<Project ToolsVersion=\"15.0\" xmlns=\"{}\"><PropertyGroup><OutputType>Library</OutputType></PropertyGroup>\
             <ItemGroup>{}</ItemGroup></Project>",
            MSBUILD_NAMESPACE, items
        ))
        .unwrap()
    }

    fn fixed(items: &str, choice: ConflictChoice) -> (LegacyTemplate, Vec<ItemGroupEntity>) {
        let mut template =
            LegacyTemplate::new(Path::new("app.csproj"), project(items), FixOptions::default());
        let entities = template
            .fix_content(&mut FixedResolver(choice))
            .unwrap();
        (template, entities)
    }

    fn entity<'a>(entities: &'a [ItemGroupEntity], name: &str) -> &'a ItemGroupEntity {
        entities.iter().find(|e| e.local_name == name).unwrap()
    }

    #[test]
    fn test_entities_are_bucketed_and_ordered() {
        let (template, entities) = fixed(
            "<None Include=\"b.txt\" /><Compile Include=\"a.cs\" /><None Include=\"a.txt\" />",
            ConflictChoice::Skip,
        );
        let names: Vec<&str> = entities.iter().map(|e| e.local_name.as_str()).collect();
        assert_eq!(names, vec!["Compile", "None"]);
        assert_eq!(entity(&entities, "None").len(), 2);
        assert!(!template
            .document()
            .root
            .elements()
            .any(|el| el.local_name() == "ItemGroup"));
    }

    #[test]
    fn test_code_sub_type_is_removed() {
        let (_, entities) = fixed(
            "<Compile Include=\"a.cs\"><SubType>Code</SubType></Compile>\
             <Compile Include=\"b.cs\"><SubType>Form</SubType></Compile>",
            ConflictChoice::Skip,
        );
        let compile = entity(&entities, "Compile");
        assert!(compile.elements[0].children.is_empty());
        assert_eq!(compile.elements[1].elements().count(), 1);
    }

    #[test]
    fn test_config_files_are_reclassified() {
        let (_, entities) = fixed(
            "<None Include=\"web.config\" />\
             <Content Include=\"packages.config\"><CopyToOutputDirectory>Always</CopyToOutputDirectory></Content>\
             <Content Include=\"Sub\\App.Config\" />",
            ConflictChoice::Skip,
        );
        let content = entity(&entities, "Content");
        assert_eq!(content.len(), 1);
        assert_eq!(attribute_value(&content.elements[0], INCLUDE), Some("web.config"));

        let none = entity(&entities, "None");
        assert_eq!(none.len(), 2);
        assert!(none.elements.iter().all(|el| el.children.is_empty()));
    }

    #[test]
    fn test_always_copy_becomes_preserve_newest() {
        let (_, entities) = fixed(
            "<Content Include=\"a.txt\"><CopyToOutputDirectory>Always</CopyToOutputDirectory></Content>\
             <Content Include=\"b.txt\"><CopyToOutputDirectory>Never</CopyToOutputDirectory></Content>",
            ConflictChoice::Skip,
        );
        let values: Vec<String> = entity(&entities, "Content")
            .elements
            .iter()
            .map(|el| element::text(element::child_by_local_name(el, COPY_TO_OUTPUT_DIRECTORY).unwrap()))
            .collect();
        assert_eq!(values, vec!["PreserveNewest", "Never"]);
    }

    #[test]
    fn test_embedded_copy_conflict_uses_resolver() {
        let items = "<EmbeddedResource Include=\"r.txt\"><CopyToOutputDirectory>Always</CopyToOutputDirectory></EmbeddedResource>";

        let (_, embed) = fixed(items, ConflictChoice::Embed);
        assert!(entity(&embed, "EmbeddedResource").elements[0].children.is_empty());

        let (_, content) = fixed(items, ConflictChoice::Content);
        let item = &entity(&content, "Content").elements[0];
        let copy = element::child_by_local_name(item, COPY_TO_OUTPUT_DIRECTORY).unwrap();
        assert_eq!(element::text(copy), "PreserveNewest");

        let (_, skipped) = fixed(items, ConflictChoice::Skip);
        assert_eq!(entity(&skipped, "EmbeddedResource").elements[0].elements().count(), 1);
    }

    #[test]
    fn test_resolver_is_only_asked_for_embedded_resources() {
        let mut asked = Vec::new();
        let mut resolver = |include: &str| {
            asked.push(include.to_string());
            Ok::<_, crate::FixprojError>(ConflictChoice::Skip)
        };
        let mut template = LegacyTemplate::new(
            Path::new("app.csproj"),
            project(
                "<Content Include=\"a.txt\"><CopyToOutputDirectory>Always</CopyToOutputDirectory></Content>\
                 <EmbeddedResource Include=\"b.txt\"><CopyToOutputDirectory>PreserveNewest</CopyToOutputDirectory></EmbeddedResource>",
            ),
            FixOptions::default(),
        );
        template.fix_content(&mut resolver).unwrap();
        assert_eq!(asked, vec!["b.txt"]);
    }

    #[test]
    fn test_web_templates_become_content() {
        let (_, entities) = fixed(
            "<None Include=\"Views\\Index.cshtml\" /><EmbeddedResource Include=\"Views\\Mail.cshtml\" />",
            ConflictChoice::Skip,
        );
        assert_eq!(entity(&entities, "Content").len(), 1);
        assert_eq!(entity(&entities, "EmbeddedResource").len(), 1);
        assert!(entities.iter().all(|e| e.local_name != "None"));
    }

    #[test]
    fn test_structural_items_are_never_checked_on_disk() {
        let temp = tempdir().unwrap();
        let mut template = LegacyTemplate::new(
            &temp.path().join("app.csproj"),
            project("<ProjectReference Include=\"..\\Other\\Other.csproj\" /><Compile Include=\"Gone.cs\" />"),
            FixOptions::default(),
        );
        let mut entities = template
            .fix_content(&mut FixedResolver(ConflictChoice::Skip))
            .unwrap();
        for entity in entities.iter_mut() {
            template
                .delete_references_to_non_existent_files(entity)
                .unwrap();
        }
        assert!(entity(&entities, "Compile").is_empty());
        assert_eq!(entity(&entities, "ProjectReference").len(), 1);
    }

    #[test]
    fn test_merge_sorts_by_include() {
        let (mut template, entities) = fixed("<Compile Include=\"b.cs\" /><Compile Include=\"a.cs\" />", ConflictChoice::Skip);
        for entity in entities {
            template.merge_and_sort_item_groups(entity, true).unwrap();
        }
        let xml = template.document().to_xml_string().unwrap();
        let a = xml.find("a.cs").unwrap();
        let b = xml.find("b.cs").unwrap();
        assert!(a < b);
        assert!(xml.contains("<ItemGroup>"));
        assert_eq!(template.changes().entries().last().unwrap(), "Compile: sorted");
    }

    #[test]
    fn test_dedupe_follows_the_bucket_key() {
        let mut template = LegacyTemplate::new(Path::new("app.csproj"), project(""), FixOptions::default());

        let mut plain = ItemGroupEntity::new(
            "Reference",
            vec![
                Element::new("Reference").with_attribute(INCLUDE, "System"),
                Element::new("Reference").with_attribute(INCLUDE, "SYSTEM"),
            ],
        );
        template.delete_duplicates(&mut plain).unwrap();
        assert_eq!(plain.len(), 1);

        let mut updates = ItemGroupEntity::keyed(
            "None",
            Some("Update".to_string()),
            vec![
                Element::new("None").with_attribute("Update", "a.txt"),
                Element::new("None").with_attribute("Update", "a.txt"),
            ],
        );
        template.delete_duplicates(&mut updates).unwrap();
        assert_eq!(updates.len(), 1);
    }

    #[test]
    fn test_add_files_on_disk() {
        let temp = tempdir().unwrap();
        std::fs::create_dir_all(temp.path().join("Models")).unwrap();
        std::fs::create_dir_all(temp.path().join("obj")).unwrap();
        std::fs::write(temp.path().join("Models").join("User.cs"), "").unwrap();
        std::fs::write(temp.path().join("Program.cs"), "").unwrap();
        std::fs::write(temp.path().join("obj").join("Generated.cs"), "").unwrap();

        let options = FixOptions {
            add_compile_files: Some("*.cs".to_string()),
            ..FixOptions::default()
        };
        let mut template = LegacyTemplate::new(
            &temp.path().join("app.csproj"),
            project("<Compile Include=\"program.cs\" />"),
            options,
        );
        let entities = template
            .fix_content(&mut FixedResolver(ConflictChoice::Skip))
            .unwrap();

        let includes: Vec<&str> = entity(&entities, "Compile")
            .elements
            .iter()
            .filter_map(|el| attribute_value(el, INCLUDE))
            .collect();
        assert_eq!(includes, vec!["Program.cs", "Models\\User.cs"]);
    }
}
