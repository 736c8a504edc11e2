//! Element builders.

use crate::types::{Children, Component, Element, ElementType, Key, PropValue, Props};

/// Start building a host element.
pub fn element(tag: impl Into<String>) -> ElementBuilder {
    ElementBuilder {
        tag: tag.into(),
        key: None,
        props: Props::new(),
    }
}

/// A text child.
pub fn text(content: impl Into<String>) -> Children {
    Children::Text(content.into())
}

/// A function component element.
pub fn component(component: &Component, props: Props) -> Element {
    Element::component(component, props)
}

/// Builder for a host element descriptor.
#[derive(Debug, Clone)]
pub struct ElementBuilder {
    tag: String,
    key: Option<Key>,
    props: Props,
}

impl ElementBuilder {
    /// Set the identity key.
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set an attribute.
    pub fn attr(mut self, name: impl Into<String>, value: impl Into<PropValue>) -> Self {
        self.props.attributes.insert(name.into(), value.into());
        self
    }

    /// Set the single child.
    pub fn child(mut self, child: impl Into<Children>) -> Self {
        self.props.children = child.into();
        self
    }

    /// Finish the descriptor.
    pub fn build(self) -> Element {
        Element {
            element_type: ElementType::Host(self.tag),
            key: self.key,
            props: self.props,
        }
    }
}

impl From<ElementBuilder> for Children {
    fn from(builder: ElementBuilder) -> Self {
        Children::from(builder.build())
    }
}
