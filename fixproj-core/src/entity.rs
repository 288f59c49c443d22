use crate::xml::Element;

/// Every declaration of one item type, gathered from all the scattered
/// `ItemGroup` containers of a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemGroupEntity {
    pub local_name: String,
    /// Attribute that identifies the items of this bucket (`Include`,
    /// `Remove` or `Update`), when the dialect buckets by it.
    pub key_attribute: Option<String>,
    pub elements: Vec<Element>,
}

impl ItemGroupEntity {
    pub fn new(local_name: impl Into<String>, elements: Vec<Element>) -> Self {
        Self {
            local_name: local_name.into(),
            key_attribute: None,
            elements,
        }
    }

    pub fn keyed(
        local_name: impl Into<String>,
        key_attribute: Option<String>,
        elements: Vec<Element>,
    ) -> Self {
        Self {
            local_name: local_name.into(),
            key_attribute,
            elements,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }
}
