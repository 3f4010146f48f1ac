use std::path::Path;

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use crate::error::SheetError;

/// Handle into a [`SheetDoc`] arena. Rows of the view-model keep these
/// instead of borrowed references so detail text can be resolved lazily
/// after the build without tying the model to the document's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
enum Piece {
    Text(String),
    Child(usize),
}

#[derive(Clone, Debug)]
struct NodeData {
    name: String,
    pieces: Vec<Piece>,
}

/// Element tree of one parsed export, stored as a flat arena. Node 0 is a
/// synthetic document node whose children are the top-level elements.
#[derive(Clone, Debug)]
pub struct SheetDoc {
    nodes: Vec<NodeData>,
}

impl SheetDoc {
    /// Document element, if the document has one.
    pub fn root(&self) -> Option<NodeId> {
        self.element_children(0).next()
    }

    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// Element children in document order.
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.element_children(id.0)
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.element_children(id.0).next()
    }

    /// First direct child with the given tag name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.element_children(id.0).find(|c| self.name(*c) == name)
    }

    /// Resolve a whitespace-separated chain of tag names, each step a
    /// first-match direct-child lookup from the previous node. An empty
    /// selector addresses the node itself. Every field the export schema
    /// defines sits at a fixed, shallow path, so child steps are enough.
    pub fn select(&self, id: NodeId, sel: &str) -> Option<NodeId> {
        let mut cur = id;
        for step in sel.split_whitespace() {
            cur = self.child(cur, step)?;
        }
        Some(cur)
    }

    /// Concatenated text of the whole subtree, in document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id.0, &mut out);
        out
    }

    fn collect_text(&self, idx: usize, out: &mut String) {
        for piece in &self.nodes[idx].pieces {
            match piece {
                Piece::Text(t) => out.push_str(t),
                Piece::Child(c) => self.collect_text(*c, out),
            }
        }
    }

    fn element_children(&self, idx: usize) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes[idx].pieces.iter().filter_map(|p| match p {
            Piece::Child(c) => Some(NodeId(*c)),
            Piece::Text(_) => None,
        })
    }
}

/// Parse raw markup text into a navigable tree. Any reader error is a
/// `ParseError`; a document with no top-level element is also malformed.
pub fn parse_document(text: &str) -> Result<SheetDoc, SheetError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(false);

    let mut nodes = vec![NodeData {
        name: String::new(),
        pieces: Vec::new(),
    }];
    let mut stack: Vec<usize> = vec![0];

    loop {
        let ev = reader
            .read_event()
            .map_err(|e| SheetError::Parse(e.to_string()))?;
        match ev {
            Event::Eof => break,
            Event::Start(s) => {
                let name = String::from_utf8_lossy(s.name().as_ref()).into_owned();
                let idx = add_child(&mut nodes, &stack, name);
                stack.push(idx);
            }
            Event::Empty(s) => {
                let name = String::from_utf8_lossy(s.name().as_ref()).into_owned();
                add_child(&mut nodes, &stack, name);
            }
            Event::End(_) => {
                if stack.len() > 1 {
                    stack.pop();
                }
            }
            Event::Text(t) => {
                let txt = t
                    .unescape()
                    .map_err(|e| SheetError::Parse(e.to_string()))?
                    .into_owned();
                add_text(&mut nodes, &stack, txt);
            }
            Event::CData(t) => {
                let txt = String::from_utf8_lossy(&t.into_inner()).into_owned();
                add_text(&mut nodes, &stack, txt);
            }
            Event::Decl(_) | Event::Comment(_) | Event::PI(_) | Event::DocType(_) => {}
        }
    }

    if stack.len() != 1 {
        return Err(SheetError::Parse("unexpected end of document".to_string()));
    }
    let doc = SheetDoc { nodes };
    if doc.root().is_none() {
        return Err(SheetError::Parse("no root element".to_string()));
    }
    Ok(doc)
}

fn add_child(nodes: &mut Vec<NodeData>, stack: &[usize], name: String) -> usize {
    let idx = nodes.len();
    nodes.push(NodeData {
        name,
        pieces: Vec::new(),
    });
    let parent = stack.last().copied().unwrap_or(0);
    nodes[parent].pieces.push(Piece::Child(idx));
    idx
}

fn add_text(nodes: &mut [NodeData], stack: &[usize], text: String) {
    if text.is_empty() {
        return;
    }
    let parent = stack.last().copied().unwrap_or(0);
    nodes[parent].pieces.push(Piece::Text(text));
}

/// Locate the character record at the fixed `root > character` path.
/// Absence is `MissingRecord`, distinct from a parse failure, so callers
/// can report a format problem rather than a syntax one.
pub fn character_node(doc: &SheetDoc) -> Result<NodeId, SheetError> {
    let root = doc
        .root()
        .filter(|r| doc.name(*r) == "root")
        .ok_or(SheetError::MissingRecord)?;
    doc.child(root, "character").ok_or(SheetError::MissingRecord)
}

static ENCODING_DECL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"encoding\s*=\s*["']([A-Za-z0-9._-]+)["']"#).expect("encoding decl"));

/// Decode raw export bytes to text. Fantasy Grounds exports declare
/// `iso-8859-1` more often than UTF-8, so the prolog declaration wins when
/// no BOM is present.
pub fn decode_sheet_bytes(bytes: &[u8]) -> String {
    if let Some((enc, _)) = encoding_rs::Encoding::for_bom(bytes) {
        return enc.decode(bytes).0.into_owned();
    }
    let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]);
    if let Some(cap) = ENCODING_DECL_RE.captures(&head) {
        if let Some(enc) = encoding_rs::Encoding::for_label(cap[1].as_bytes()) {
            return enc.decode(bytes).0.into_owned();
        }
    }
    encoding_rs::UTF_8.decode(bytes).0.into_owned()
}

pub fn read_sheet_text(path: &Path) -> Result<String, SheetError> {
    let bytes = std::fs::read(path).map_err(SheetError::Read)?;
    Ok(decode_sheet_bytes(&bytes))
}

#[cfg(test)]
mod tests {
    use super::{character_node, decode_sheet_bytes, parse_document};
    use crate::error::SheetError;

    #[test]
    fn parses_nested_elements() {
        let doc = parse_document("<root><character><name>Mira</name></character></root>")
            .expect("parse");
        let character = character_node(&doc).expect("character");
        let name = doc.child(character, "name").expect("name child");
        assert_eq!(doc.text_content(name), "Mira");
    }

    #[test]
    fn select_chains_descendant_searches() {
        let doc = parse_document(
            "<root><character><backgroundlink><recordname>reference.x</recordname></backgroundlink></character></root>",
        )
        .expect("parse");
        let character = character_node(&doc).expect("character");
        let rec = doc
            .select(character, "backgroundlink recordname")
            .expect("recordname");
        assert_eq!(doc.text_content(rec), "reference.x");
    }

    #[test]
    fn text_content_preserves_document_order() {
        let doc = parse_document("<root><t>a<b>c</b>d</t></root>").expect("parse");
        let root = doc.root().expect("root");
        let t = doc.child(root, "t").expect("t");
        assert_eq!(doc.text_content(t), "acd");
    }

    #[test]
    fn mismatched_tags_are_a_parse_error() {
        let err = parse_document("<root><a></b></root>").expect_err("must fail");
        assert!(matches!(err, SheetError::Parse(_)));
    }

    #[test]
    fn truncated_document_is_a_parse_error() {
        let err = parse_document("<root><character>").expect_err("must fail");
        assert!(matches!(err, SheetError::Parse(_)));
    }

    #[test]
    fn missing_character_is_distinct_from_parse_failure() {
        let err = parse_document("<root><npc/></root>")
            .and_then(|doc| character_node(&doc))
            .expect_err("must fail");
        assert!(matches!(err, SheetError::MissingRecord));
    }

    #[test]
    fn wrong_root_element_is_missing_record() {
        let err = parse_document("<export><character/></export>")
            .and_then(|doc| character_node(&doc))
            .expect_err("must fail");
        assert!(matches!(err, SheetError::MissingRecord));
    }

    #[test]
    fn decodes_declared_latin1() {
        let mut bytes = b"<?xml version=\"1.0\" encoding=\"iso-8859-1\"?><root><character><name>F".to_vec();
        bytes.push(0xE9); // e-acute in latin-1
        bytes.extend_from_slice(b"</name></character></root>");
        let text = decode_sheet_bytes(&bytes);
        assert!(text.contains("F\u{e9}"));
    }
}
