use crate::{FixprojError, Result};
use quick_xml::escape::partial_escape;
use quick_xml::events::attributes::Attribute as XmlAttribute;
use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesPI, BytesStart, BytesText, Event};
use quick_xml::name::QName;
use quick_xml::{Reader, Writer};
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

/// A parsed project file.
///
/// Whitespace-only text between elements is dropped while parsing, so two documents
/// compare equal whenever their element trees, attributes and text agree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub prolog: Vec<Node>,
    pub root: Element,
    pub epilog: Vec<Node>,
    /// Whether the source started with a UTF-8 byte order mark.
    pub bom: bool,
    /// Line terminator used when writing the document back out.
    pub newline: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Element(Element),
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
    Declaration {
        version: String,
        encoding: Option<String>,
        standalone: Option<String>,
    },
    DocType(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}

impl Attribute {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Attribute name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Element {
    /// Qualified name exactly as written in the source (`prefix:local` or `local`).
    pub name: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, value));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(Node::Element(child));
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    pub fn local_name(&self) -> &str {
        local_part(&self.name)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.children.iter_mut().filter_map(|node| match node {
            Node::Element(el) => Some(el),
            _ => None,
        })
    }

    pub fn has_elements(&self) -> bool {
        self.elements().next().is_some()
    }
}

fn local_part(name: &str) -> &str {
    name.rsplit_once(':').map(|(_, local)| local).unwrap_or(name)
}

impl Document {
    pub fn parse(input: &str) -> Result<Self> {
        let (bom, input) = match input.strip_prefix('\u{feff}') {
            Some(rest) => (true, rest),
            None => (false, input),
        };
        let newline = if input.contains("\r\n") { "\r\n" } else { "\n" };

        let mut reader = Reader::from_str(input);
        reader.config_mut().trim_text(false);

        let mut prolog = Vec::new();
        let mut epilog = Vec::new();
        let mut root: Option<Element> = None;
        let mut stack: Vec<Element> = Vec::new();

        loop {
            let node = match reader.read_event()? {
                Event::Start(start) => {
                    stack.push(start_element(&start)?);
                    continue;
                }
                Event::End(_) => {
                    let finished = stack
                        .pop()
                        .ok_or_else(|| invalid("unexpected closing tag"))?;
                    Node::Element(finished)
                }
                Event::Empty(start) => Node::Element(start_element(&start)?),
                Event::Text(text) => {
                    let value = text.unescape()?;
                    if value.trim().is_empty() {
                        continue;
                    }
                    Node::Text(value.into_owned())
                }
                Event::CData(data) => Node::CData(String::from_utf8_lossy(&data).into_owned()),
                Event::Comment(comment) => {
                    Node::Comment(String::from_utf8_lossy(&comment).into_owned())
                }
                Event::PI(pi) => {
                    Node::ProcessingInstruction(String::from_utf8_lossy(&pi).into_owned())
                }
                Event::Decl(decl) => Node::Declaration {
                    version: String::from_utf8_lossy(&decl.version()?).into_owned(),
                    encoding: decl
                        .encoding()
                        .transpose()?
                        .map(|v| String::from_utf8_lossy(&v).into_owned()),
                    standalone: decl
                        .standalone()
                        .transpose()?
                        .map(|v| String::from_utf8_lossy(&v).into_owned()),
                },
                Event::DocType(doctype) => {
                    Node::DocType(String::from_utf8_lossy(&doctype).into_owned())
                }
                Event::Eof => break,
            };

            if let Some(parent) = stack.last_mut() {
                parent.children.push(node);
                continue;
            }

            match node {
                Node::Element(el) => {
                    if root.is_some() {
                        return Err(invalid("more than one root element"));
                    }
                    root = Some(el);
                }
                Node::Text(_) | Node::CData(_) => {
                    return Err(invalid("text outside of the root element"));
                }
                other if root.is_none() => prolog.push(other),
                other => epilog.push(other),
            }
        }

        if !stack.is_empty() {
            return Err(invalid("unexpected end of document"));
        }

        let root = root.ok_or_else(|| invalid("document has no root element"))?;

        Ok(Self {
            prolog,
            root,
            epilog,
            bom,
            newline,
        })
    }

    /// Loads and parses a file, tagging parse failures with its path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|err| {
            let reason = match err {
                FixprojError::DocumentInvalid { reason, .. } => reason,
                other => other.to_string(),
            };
            FixprojError::DocumentInvalid {
                path: path.to_path_buf(),
                reason,
            }
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_xml_string()?)?;
        Ok(())
    }

    /// Renders the document with two-space indentation. Elements holding
    /// text stay on one line, so text content is written back untouched.
    pub fn to_xml_string(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        for node in &self.prolog {
            write_node(&mut writer, node)?;
        }
        write_element(&mut writer, &self.root)?;
        for node in &self.epilog {
            write_node(&mut writer, node)?;
        }

        let mut out = String::new();
        if self.bom {
            out.push('\u{feff}');
        }
        out.push_str(&String::from_utf8_lossy(&writer.into_inner()));
        out.push('\n');
        if self.newline == "\r\n" {
            out = out.replace("\r\n", "\n").replace('\n', "\r\n");
        }
        Ok(out)
    }
}

fn invalid(reason: &str) -> FixprojError {
    FixprojError::DocumentInvalid {
        path: Default::default(),
        reason: reason.to_string(),
    }
}

fn start_element(start: &BytesStart<'_>) -> Result<Element> {
    let mut element = Element::new(String::from_utf8_lossy(start.name().as_ref()).into_owned());
    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        element.attributes.push(Attribute {
            name: String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            value: attr.unescape_value()?.into_owned(),
        });
    }
    Ok(element)
}

fn write_node<W: Write>(writer: &mut Writer<W>, node: &Node) -> Result<()> {
    match node {
        Node::Element(el) => return write_element(writer, el),
        Node::Text(text) => {
            writer.write_event(Event::Text(BytesText::from_escaped(partial_escape(text.as_str()))))?
        }
        Node::CData(data) => writer.write_event(Event::CData(BytesCData::new(data.as_str())))?,
        Node::Comment(comment) => {
            writer.write_event(Event::Comment(BytesText::from_escaped(comment.as_str())))?
        }
        Node::ProcessingInstruction(pi) => writer.write_event(Event::PI(BytesPI::new(pi.as_str())))?,
        Node::Declaration {
            version,
            encoding,
            standalone,
        } => writer.write_event(Event::Decl(BytesDecl::new(
            version,
            encoding.as_deref(),
            standalone.as_deref(),
        )))?,
        Node::DocType(doctype) => {
            writer.write_event(Event::DocType(BytesText::from_escaped(doctype.as_str())))?
        }
    }
    Ok(())
}

fn write_element<W: Write>(writer: &mut Writer<W>, el: &Element) -> Result<()> {
    let mut start = BytesStart::new(el.name.as_str());
    for attr in &el.attributes {
        // apostrophes stay literal, MSBuild conditions are full of them
        let value = partial_escape(attr.value.as_str()).replace('"', "&quot;");
        start.push_attribute(XmlAttribute {
            key: QName(attr.name.as_bytes()),
            value: Cow::Owned(value.into_bytes()),
        });
    }

    if el.children.is_empty() {
        writer.write_event(Event::Empty(start))?;
        return Ok(());
    }

    writer.write_event(Event::Start(start))?;
    for child in &el.children {
        write_node(writer, child)?;
    }
    writer.write_event(Event::End(BytesEnd::new(el.name.as_str())))?;
    Ok(())
}
