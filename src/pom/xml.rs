//! pom::xml
//!
//! Byte-faithful textual mirror of an XML descriptor.
//!
//! # Design
//!
//! The document keeps the original source text and a light element tree
//! with byte offsets into it. Text edits are recorded against those offsets
//! and spliced in by [`XmlDocument::render`]; every byte outside an edited
//! element's content (comments, whitespace, attribute quoting, entity
//! spelling) is reproduced exactly.
//!
//! Edits replace the whole content of an element, so they are meant for
//! leaf elements such as `<version>` or a property.
//!
//! # Example
//!
//! ```
//! use git_versioning::pom::xml::XmlDocument;
//!
//! let source = "<project>\n  <!-- keep -->\n  <version>1.0</version>\n</project>\n";
//! let mut doc = XmlDocument::parse(source).unwrap();
//! let root = doc.root();
//! let version = doc.child(root, "version").unwrap();
//! doc.set_text(version, "2.0");
//!
//! assert_eq!(
//!     doc.render(),
//!     "<project>\n  <!-- keep -->\n  <version>2.0</version>\n</project>\n"
//! );
//! ```

use std::collections::BTreeMap;

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use super::PomError;

/// Handle to an element of an [`XmlDocument`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

/// Where an element's replaceable content sits in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Content {
    /// Between the end of the start tag and the start of the end tag
    Inner { start: usize, end: usize },
    /// The whole self-closing tag (`<version/>`)
    SelfClosing { start: usize, end: usize },
}

impl Content {
    fn start(&self) -> usize {
        match *self {
            Content::Inner { start, .. } | Content::SelfClosing { start, .. } => start,
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    /// Qualified name as written in the source
    name: String,
    /// Name without namespace prefix
    local_name: String,
    children: Vec<ElementId>,
    /// Direct text and CDATA content, unescaped
    text: String,
    content: Content,
}

/// Parsed XML document with recorded text edits.
#[derive(Debug, Clone)]
pub struct XmlDocument {
    source: String,
    nodes: Vec<Node>,
    root: ElementId,
    /// Replacement text per edited element
    edits: BTreeMap<ElementId, String>,
}

impl XmlDocument {
    /// Parse a document.
    ///
    /// # Errors
    ///
    /// Returns [`PomError::Xml`] for malformed XML or a document without a
    /// root element.
    pub fn parse(source: impl Into<String>) -> Result<Self, PomError> {
        let source = source.into();
        let nodes = Self::build_tree(&source)?;
        if nodes.is_empty() {
            return Err(PomError::Xml {
                message: "document has no root element".to_string(),
            });
        }

        Ok(Self {
            source,
            nodes,
            root: ElementId(0),
            edits: BTreeMap::new(),
        })
    }

    fn build_tree(source: &str) -> Result<Vec<Node>, PomError> {
        let mut reader = Reader::from_str(source);
        let mut nodes: Vec<Node> = Vec::new();
        let mut open: Vec<ElementId> = Vec::new();
        let xml_error = |e: quick_xml::Error, position: usize| PomError::Xml {
            message: format!("{} at byte {}", e, position),
        };

        loop {
            let before = reader.buffer_position() as usize;
            let event = reader.read_event().map_err(|e| xml_error(e, before))?;
            let after = reader.buffer_position() as usize;

            match event {
                Event::Start(start) | Event::Empty(start)
                    if open.is_empty() && !nodes.is_empty() =>
                {
                    return Err(PomError::Xml {
                        message: format!(
                            "multiple root elements ('{}')",
                            String::from_utf8_lossy(start.name().as_ref())
                        ),
                    });
                }
                Event::Start(start) => {
                    let id = Self::push_node(
                        &mut nodes,
                        &open,
                        start.name().as_ref(),
                        start.local_name().as_ref(),
                        Content::Inner {
                            start: after,
                            end: after,
                        },
                    );
                    open.push(id);
                }
                Event::Empty(start) => {
                    Self::push_node(
                        &mut nodes,
                        &open,
                        start.name().as_ref(),
                        start.local_name().as_ref(),
                        Content::SelfClosing {
                            start: before,
                            end: after,
                        },
                    );
                }
                Event::End(_) => {
                    if let Some(ElementId(index)) = open.pop() {
                        if let Content::Inner { start, .. } = nodes[index].content {
                            nodes[index].content = Content::Inner { start, end: before };
                        }
                    }
                }
                Event::Text(text) => {
                    if let Some(ElementId(index)) = open.last().copied() {
                        let unescaped = text.unescape().map_err(|e| xml_error(e, before))?;
                        nodes[index].text.push_str(&unescaped);
                    }
                }
                Event::CData(cdata) => {
                    if let Some(ElementId(index)) = open.last().copied() {
                        let raw = cdata.into_inner();
                        nodes[index].text.push_str(&String::from_utf8_lossy(&raw));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(ElementId(index)) = open.last() {
            return Err(PomError::Xml {
                message: format!("unclosed element '{}'", nodes[*index].name),
            });
        }

        Ok(nodes)
    }

    fn push_node(
        nodes: &mut Vec<Node>,
        open: &[ElementId],
        name: &[u8],
        local_name: &[u8],
        content: Content,
    ) -> ElementId {
        let id = ElementId(nodes.len());
        nodes.push(Node {
            name: String::from_utf8_lossy(name).into_owned(),
            local_name: String::from_utf8_lossy(local_name).into_owned(),
            children: Vec::new(),
            text: String::new(),
            content,
        });
        if let Some(ElementId(parent)) = open.last() {
            nodes[*parent].children.push(id);
        }
        id
    }

    fn node(&self, id: ElementId) -> &Node {
        &self.nodes[id.0]
    }

    /// The document element.
    pub fn root(&self) -> ElementId {
        self.root
    }

    /// Local name of an element.
    pub fn name(&self, id: ElementId) -> &str {
        &self.node(id).local_name
    }

    /// Child elements in document order.
    pub fn children(&self, id: ElementId) -> &[ElementId] {
        &self.node(id).children
    }

    /// Child elements with the given local name, in document order.
    pub fn children_named<'a>(
        &'a self,
        id: ElementId,
        name: &'a str,
    ) -> impl Iterator<Item = ElementId> + 'a {
        self.children(id)
            .iter()
            .copied()
            .filter(move |child| self.name(*child) == name)
    }

    /// First child element with the given local name.
    pub fn child(&self, id: ElementId, name: &str) -> Option<ElementId> {
        self.children_named(id, name).next()
    }

    /// Follow a path of child names, e.g. `["build", "pluginManagement", "plugins"]`.
    pub fn descend(&self, id: ElementId, path: &[&str]) -> Option<ElementId> {
        path.iter()
            .try_fold(id, |current, name| self.child(current, name))
    }

    /// Current text of an element, including pending edits.
    pub fn text(&self, id: ElementId) -> &str {
        self.edits
            .get(&id)
            .map(String::as_str)
            .unwrap_or(self.node(id).text.as_str())
    }

    /// Trimmed text of a named child, if present.
    pub fn child_text(&self, id: ElementId, name: &str) -> Option<&str> {
        self.child(id, name).map(|child| self.text(child).trim())
    }

    /// Replace the content of an element.
    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) {
        let text = text.into();
        if text == self.node(id).text {
            self.edits.remove(&id);
        } else {
            self.edits.insert(id, text);
        }
    }

    /// Replace the content of an element unless its trimmed text already
    /// equals `text`. Returns whether an edit was recorded.
    pub fn set_text_if_changed(&mut self, id: ElementId, text: &str) -> bool {
        if self.text(id).trim() == text {
            return false;
        }
        self.set_text(id, text);
        true
    }

    /// Whether any edit is pending.
    pub fn is_modified(&self) -> bool {
        !self.edits.is_empty()
    }

    /// Serialize the document with all edits applied.
    pub fn render(&self) -> String {
        let mut spliced: Vec<(Content, &str, &str)> = self
            .edits
            .iter()
            .map(|(id, text)| {
                let node = self.node(*id);
                (node.content, node.name.as_str(), text.as_str())
            })
            .collect();
        spliced.sort_by_key(|(content, _, _)| content.start());

        let mut out = String::with_capacity(self.source.len());
        let mut cursor = 0;
        for (content, name, text) in spliced {
            match content {
                Content::Inner { start, end } => {
                    if start < cursor {
                        continue;
                    }
                    out.push_str(&self.source[cursor..start]);
                    out.push_str(&escape(text));
                    cursor = end;
                }
                Content::SelfClosing { start, end } => {
                    if start < cursor {
                        continue;
                    }
                    out.push_str(&self.source[cursor..start]);
                    out.push_str(&format!("<{}>{}</{}>", name, escape(text), name));
                    cursor = end;
                }
            }
        }
        out.push_str(&self.source[cursor..]);
        out
    }

    /// The unmodified source.
    pub fn source(&self) -> &str {
        &self.source
    }
}
