//! Minimal XML element tree for classic API request bodies.
//!
//! The classic API is read as JSON but written as XML. Only element nesting
//! and text content are needed; attributes, namespaces and mixed content are
//! not.

use std::fmt::{self, Write};

/// One XML element with either text or child elements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct XmlElement {
    name: String,
    text: Option<String>,
    children: Vec<XmlElement>,
}

impl XmlElement {
    /// An empty element.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: None,
            children: Vec::new(),
        }
    }

    /// An element holding text.
    pub fn with_text(name: impl Into<String>, text: impl ToString) -> Self {
        Self {
            name: name.into(),
            text: Some(text.to_string()),
            children: Vec::new(),
        }
    }

    /// Builder form of [`push`](Self::push).
    pub fn child(mut self, child: XmlElement) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: XmlElement) {
        self.children.push(child);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[XmlElement] {
        &self.children
    }

    /// First direct child with the given name.
    pub fn find(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follow a `/`-separated path of child names.
    pub fn find_path(&self, path: &str) -> Option<&XmlElement> {
        path.split('/')
            .try_fold(self, |element, name| element.find(name))
    }

    /// Compact serialization without an XML declaration.
    pub fn to_xml_string(&self) -> String {
        let mut out = String::new();
        // writing to a String cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    /// Serialization with the XML declaration, as sent in request bodies.
    pub fn to_document(&self) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>{}",
            self.to_xml_string()
        )
    }

    fn write_to(&self, out: &mut String) -> fmt::Result {
        if self.text.is_none() && self.children.is_empty() {
            return write!(out, "<{}/>", self.name);
        }
        write!(out, "<{}>", self.name)?;
        if let Some(text) = &self.text {
            out.push_str(&escape(text));
        }
        for child in &self.children {
            child.write_to(out)?;
        }
        write!(out, "</{}>", self.name)
    }
}

impl fmt::Display for XmlElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_xml_string())
    }
}

/// Escape text content.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_rendering() {
        let xml = XmlElement::new("computer_group")
            .child(XmlElement::with_text("name", "Lab & Co"))
            .child(XmlElement::with_text("is_smart", true))
            .child(XmlElement::new("site"));
        assert_eq!(
            xml.to_xml_string(),
            "<computer_group><name>Lab &amp; Co</name><is_smart>true</is_smart><site/></computer_group>"
        );
    }

    #[test]
    fn test_document_declaration() {
        let xml = XmlElement::with_text("size", 0);
        assert_eq!(
            xml.to_document(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><size>0</size>"
        );
    }

    #[test]
    fn test_find_path() {
        let xml = XmlElement::new("scope").child(
            XmlElement::new("limitations").child(XmlElement::with_text("users", "x")),
        );
        assert_eq!(xml.find_path("limitations/users").and_then(XmlElement::text), Some("x"));
        assert!(xml.find_path("exclusions/users").is_none());
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape("<a href=\"x\">'"), "&lt;a href=&quot;x&quot;&gt;&apos;");
    }
}
