//! Lenient tag tokenizer for XML views and fragments
//!
//! Produces the list of element tags with their byte offsets and the
//! attributes inside them. Malformed input never aborts the scan: an
//! unterminated attribute string or tag ends the scan and the tags collected
//! so far are returned.

use crate::types::ByteRange;

/// One attribute of a tag, with the absolute byte range of its value
/// (quotes excluded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlAttribute {
    pub name: String,
    pub value: String,
    pub value_range: ByteRange,
}

/// An opening, closing or self-closing element tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlTag {
    /// Full tag text including `<` and `>`
    pub text: String,
    /// Byte offset of `<`
    pub position_begin: usize,
    /// Byte offset just past `>`
    pub position_end: usize,
    /// Qualified name as written, e.g. `m:Button`
    pub name: String,
    pub attributes: Vec<XmlAttribute>,
    pub is_closing: bool,
    pub is_self_closing: bool,
}

impl XmlTag {
    /// Namespace prefix of the tag name, if any
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Tag name without its namespace prefix
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    pub fn attribute(&self, name: &str) -> Option<&XmlAttribute> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn attribute_value(&self, name: &str) -> Option<&str> {
        self.attribute(name).map(|a| a.value.as_str())
    }
}

/// Tokenize every element tag in `content`.
pub fn tokenize(content: &str) -> Vec<XmlTag> {
    let bytes = content.as_bytes();
    let mut tags = Vec::new();
    let mut pos = 0;

    while let Some(rel) = content[pos..].find('<') {
        let begin = pos + rel;
        let rest = &content[begin..];

        // Comments, CDATA, processing instructions and doctype carry no elements
        if rest.starts_with("<!--") {
            match rest.find("-->") {
                Some(end) => {
                    pos = begin + end + 3;
                    continue;
                }
                None => break,
            }
        }
        if rest.starts_with("<![CDATA[") {
            match rest.find("]]>") {
                Some(end) => {
                    pos = begin + end + 3;
                    continue;
                }
                None => break,
            }
        }
        if rest.starts_with("<?") || rest.starts_with("<!") {
            match rest.find('>') {
                Some(end) => {
                    pos = begin + end + 1;
                    continue;
                }
                None => break,
            }
        }

        let Some(end) = find_tag_end(bytes, begin + 1) else {
            // Unterminated string or tag: keep what we have
            break;
        };

        if let Some(tag) = parse_tag(content, begin, end) {
            tags.push(tag);
        }
        pos = end;
    }

    tags
}

/// Offset just past the `>` closing the tag started at `from - 1`,
/// skipping quoted attribute values.
fn find_tag_end(bytes: &[u8], from: usize) -> Option<usize> {
    let mut quote: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) if b == q => quote = None,
            Some(_) => {}
            None => match b {
                b'"' | b'\'' => quote = Some(b),
                b'>' => return Some(i + 1),
                // A new tag opening before this one closed: the tag is broken
                b'<' => return None,
                _ => {}
            },
        }
        i += 1;
    }
    None
}

fn parse_tag(content: &str, begin: usize, end: usize) -> Option<XmlTag> {
    let text = &content[begin..end];
    let mut inner_start = begin + 1;
    let mut inner_end = end - 1;

    let is_closing = text.starts_with("</");
    if is_closing {
        inner_start += 1;
    }
    let is_self_closing = !is_closing && text.len() >= 3 && text[..text.len() - 1].ends_with('/');
    if is_self_closing {
        inner_end -= 1;
    }

    let inner = &content[inner_start..inner_end];
    let name_len = inner
        .find(|c: char| c.is_whitespace() || c == '/')
        .unwrap_or(inner.len());
    let name = inner[..name_len].trim();
    if name.is_empty() {
        return None;
    }

    let attributes = if is_closing {
        Vec::new()
    } else {
        parse_attributes(content, inner_start + name_len, inner_end)
    };

    Some(XmlTag {
        text: text.to_string(),
        position_begin: begin,
        position_end: end,
        name: name.to_string(),
        attributes,
        is_closing,
        is_self_closing,
    })
}

fn parse_attributes(content: &str, from: usize, to: usize) -> Vec<XmlAttribute> {
    let bytes = content.as_bytes();
    let mut attributes = Vec::new();
    let mut i = from;

    loop {
        while i < to && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= to {
            break;
        }

        let name_start = i;
        while i < to && bytes[i] != b'=' && !bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        let name = &content[name_start..i];

        while i < to && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= to || bytes[i] != b'=' {
            // Attribute without a value; not meaningful in XML views
            continue;
        }
        i += 1;
        while i < to && bytes[i].is_ascii_whitespace() {
            i += 1;
        }
        if i >= to || (bytes[i] != b'"' && bytes[i] != b'\'') {
            break;
        }
        let quote = bytes[i];
        let value_start = i + 1;
        let Some(rel) = bytes[value_start..to].iter().position(|&b| b == quote) else {
            break;
        };
        let value_end = value_start + rel;

        if !name.is_empty() {
            attributes.push(XmlAttribute {
                name: name.to_string(),
                value: content[value_start..value_end].to_string(),
                value_range: ByteRange::new(value_start, value_end),
            });
        }
        i = value_end + 1;
    }

    attributes
}
