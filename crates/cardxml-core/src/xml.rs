//! Element trees and their XML text form

use crate::error::{Error, Result};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

/// One element of a parsed document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
    /// Element name
    pub name: String,
    /// Attributes in document order
    pub attributes: Vec<(String, String)>,
    /// Concatenated, trimmed character data directly inside this element
    pub text: String,
    /// Child elements
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    /// Create an empty element
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Builder: add an attribute
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((key.into(), value.into()));
        self
    }

    /// Builder: set the text
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Builder: add a child
    pub fn with_child(mut self, child: XmlNode) -> Self {
        self.children.push(child);
        self
    }

    /// Append a child
    pub fn push(&mut self, child: XmlNode) {
        self.children.push(child);
    }

    /// Value of an attribute
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Children with the given element name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a XmlNode> {
        self.children.iter().filter(move |c| c.name == name)
    }
}

/// Parse an XML document from a string
pub fn parse_document(content: &str, source_name: &str) -> Result<XmlNode> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => stack.push(start_node(&e)?),
            Event::Empty(e) => {
                let node = start_node(&e)?;
                attach(&mut stack, &mut root, node, source_name)?;
            }
            Event::End(_) => {
                let node = stack.pop().ok_or_else(|| Error::MalformedDocument {
                    name: source_name.to_string(),
                    message: "unbalanced closing element".to_string(),
                })?;
                attach(&mut stack, &mut root, node, source_name)?;
            }
            Event::Text(t) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(Error::MalformedDocument {
            name: source_name.to_string(),
            message: "unexpected end of document".to_string(),
        });
    }

    root.ok_or_else(|| Error::MalformedDocument {
        name: source_name.to_string(),
        message: "no root element".to_string(),
    })
}

fn start_node(e: &BytesStart<'_>) -> Result<XmlNode> {
    let mut node = XmlNode::new(String::from_utf8_lossy(e.name().as_ref()).into_owned());
    for attr in e.attributes() {
        let attr = attr?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr.unescape_value()?.into_owned();
        node.attributes.push((key, value));
    }
    Ok(node)
}

fn attach(
    stack: &mut [XmlNode],
    root: &mut Option<XmlNode>,
    node: XmlNode,
    source_name: &str,
) -> Result<()> {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    } else if root.is_some() {
        return Err(Error::MalformedDocument {
            name: source_name.to_string(),
            message: "more than one root element".to_string(),
        });
    } else {
        *root = Some(node);
    }
    Ok(())
}

/// Serialize a tree as a tab-indented XML document
pub fn write_document(root: &XmlNode) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b'\t', 1);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    write_node(&mut writer, root)?;

    String::from_utf8(writer.into_inner()).map_err(|e| Error::MalformedDocument {
        name: root.name.clone(),
        message: e.to_string(),
    })
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    let mut start = BytesStart::new(node.name.as_str());
    for (key, value) in &node.attributes {
        start.push_attribute((key.as_str(), value.as_str()));
    }

    if node.children.is_empty() && node.text.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    if !node.text.is_empty() {
        writer.write_event(Event::Text(BytesText::new(&node.text)))?;
    }
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(node.name.as_str())))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nested_document() {
        let xml = r#"<?xml version="1.0"?>
<CardDefs build="3937">
    <Entity CardID="CS2_029" version="2">
        <Tag enumID="185" type="String">Fireball</Tag>
        <Tag enumID="48" type="Int" value="4"/>
    </Entity>
</CardDefs>"#;
        let root = parse_document(xml, "enUS").unwrap();

        assert_eq!(root.name, "CardDefs");
        assert_eq!(root.attr("build"), Some("3937"));
        let entity = &root.children[0];
        assert_eq!(entity.attr("CardID"), Some("CS2_029"));
        assert_eq!(entity.children.len(), 2);
        assert_eq!(entity.children[0].text, "Fireball");
        assert_eq!(entity.children[1].attr("value"), Some("4"));
    }

    #[test]
    fn test_parse_unescapes_text_and_attributes() {
        let xml = r#"<Tag note="a &amp; b">Can&apos;t attack &lt;b&gt;</Tag>"#;
        let root = parse_document(xml, "test").unwrap();
        assert_eq!(root.attr("note"), Some("a & b"));
        assert_eq!(root.text, "Can't attack <b>");
    }

    #[test]
    fn test_parse_rejects_empty_document() {
        let err = parse_document("", "empty").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn test_parse_rejects_two_roots() {
        let err = parse_document("<A/><B/>", "two").unwrap_err();
        assert!(matches!(err, Error::MalformedDocument { .. }));
    }

    #[test]
    fn test_write_then_read_keeps_structure() {
        let tree = XmlNode::new("CardDefs").with_attr("build", "4217").with_child(
            XmlNode::new("Entity")
                .with_attr("CardID", "EX1_323h")
                .with_child(XmlNode::new("HeroPower").with_attr("cardID", "EX1_tk33"))
                .with_child(XmlNode::new("Texture").with_text("final/assets/jaraxxus.psd")),
        );

        let text = write_document(&tree).unwrap();
        assert!(text.starts_with("<?xml"));
        assert!(text.contains("\t<Entity CardID=\"EX1_323h\">"));

        let back = parse_document(&text, "roundtrip").unwrap();
        assert_eq!(back, tree);
    }
}
