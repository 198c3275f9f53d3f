//! Text to tree.
//!
//! The block structure is read line by line; flow collections and quoted
//! scalars are read character by character straight from the source so they
//! may span lines. Everything that is not data (comments, blank lines,
//! spacing) is recorded on the nodes so the emitter can write it back.

use super::error::Error;
use super::node::{BlockBody, Entry, Node, NodeData, Scalar, ScalarStyle, Style, Tag};
use super::scalar;
use log::trace;

/// Result of parsing a document.
#[derive(Debug, Clone)]
pub struct Parsed {
    pub root: Node,
    /// Lines before the root: directives, `---` and leading comments
    pub head: Vec<String>,
    /// Column of the root collection
    pub margin: usize,
    pub crlf: bool,
    /// Whether the text contains any node at all
    pub has_content: bool,
}

/// Parse a complete document.
pub fn parse(text: &str) -> Result<Parsed, Error> {
    let crlf = text.contains("\r\n");
    let src = if crlf {
        text.replace("\r\n", "\n")
    } else {
        text.to_string()
    };
    let mut parser = Parser::new(src);
    let head = parser.preamble()?;
    let (root, margin, has_content) = parser.root()?;
    if has_content {
        check_well_formed(text)?;
    }
    trace!(
        "parsed {} document ({} lines)",
        root.kind(),
        parser.lines.len()
    );
    Ok(Parsed {
        root,
        head,
        margin,
        crlf,
        has_content,
    })
}

/// Let libfyaml reject anything the line reader was lenient about.
fn check_well_formed(text: &str) -> Result<(), Error> {
    text.parse::<fyaml::Value>()
        .map(|_| ())
        .map_err(|e| Error::Parse {
            line: 0,
            message: e.to_string(),
        })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    Mapping,
    Sequence,
}

struct Line {
    text: String,
    /// Offset of the line in the source
    start: usize,
}

impl Line {
    fn indent(&self) -> usize {
        self.text.len() - self.text.trim_start_matches(' ').len()
    }

    fn content(&self) -> &str {
        &self.text[self.indent()..]
    }

    /// Only spaces and tabs are YAML white space; other Unicode spacing is
    /// content.
    fn trimmed(&self) -> &str {
        self.text.trim_matches([' ', '\t'])
    }

    fn is_trivia(&self) -> bool {
        let t = self.trimmed();
        t.is_empty() || t.starts_with('#')
    }

    fn is_blank(&self) -> bool {
        self.trimmed().is_empty()
    }
}

fn is_document_start(text: &str) -> bool {
    text == "---" || text.starts_with("--- ") || text.starts_with("---\t")
}

fn is_document_end(text: &str) -> bool {
    text == "..." || text.starts_with("... ") || text.starts_with("...\t")
}

fn is_dash(content: &str) -> bool {
    content == "-" || content.starts_with("- ") || content.starts_with("-\t")
}

fn starts_flow(content: &str) -> bool {
    content.starts_with(['[', '{'])
}

/// Position of the key end and of the `:` on a block mapping line.
struct KeySplit {
    key_end: usize,
    colon: usize,
}

fn find_key(content: &str) -> Option<KeySplit> {
    let bytes = content.as_bytes();
    let first = *bytes.first()?;
    let scan_from = match first {
        b'"' | b'\'' => quoted_span(content, 0).filter(|end| !content[..*end].contains('\n'))?,
        b'[' | b'{' | b'#' | b'|' | b'>' | b'!' | b'&' | b'*' | b'?' | b'%' | b'@' | b'`' => {
            return None
        }
        b'-' if is_dash(content) => return None,
        _ => 0,
    };
    let quoted = scan_from > 0;
    let mut i = scan_from;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b':' && matches!(bytes.get(i + 1), None | Some(b' ' | b'\t')) {
            let key_end = content[..i].trim_end_matches([' ', '\t']).len();
            if key_end == 0 || (quoted && key_end != scan_from) {
                return None;
            }
            return Some(KeySplit { key_end, colon: i });
        }
        if b == b'#' && i > 0 && matches!(bytes[i - 1], b' ' | b'\t') {
            return None;
        }
        if quoted && !matches!(b, b' ' | b'\t' | b':') {
            return None;
        }
        i += 1;
    }
    None
}

/// End (exclusive) of the quoted scalar starting at `start`.
fn quoted_span(src: &str, start: usize) -> Option<usize> {
    let bytes = src.as_bytes();
    let quote = *bytes.get(start)?;
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' if quote == b'"' => i += 2,
            b'\'' if quote == b'\'' && bytes.get(i + 1) == Some(&b'\'') => i += 2,
            b if b == quote => return Some(i + 1),
            _ => i += 1,
        }
    }
    None
}

fn decode_quoted(raw: &str) -> Result<Scalar, String> {
    let body = &raw[1..raw.len() - 1];
    let (value, style) = if raw.starts_with('"') {
        (scalar::unescape_double(body)?, ScalarStyle::DoubleQuoted)
    } else {
        (scalar::unescape_single(body), ScalarStyle::SingleQuoted)
    };
    Ok(Scalar {
        tag: Tag::String,
        value,
        style,
        raw: Some(raw.to_string()),
        block: None,
    })
}

fn plain_scalar(raw: &str) -> Scalar {
    let value = if raw.contains('\n') {
        scalar::fold_plain(raw)
    } else {
        raw.to_string()
    };
    Scalar {
        tag: scalar::resolve_plain(&value),
        value,
        style: ScalarStyle::Plain,
        raw: Some(raw.to_string()),
        block: None,
    }
}

fn implicit_null() -> Node {
    Node::scalar(Scalar {
        tag: Tag::Null,
        value: String::new(),
        style: ScalarStyle::Plain,
        raw: Some(String::new()),
        block: None,
    })
}

/// Byte length of a run of `!tag` / `&anchor` tokens, and of the
/// whitespace after it.
fn props_span(text: &str) -> (usize, usize) {
    let mut token_end = 0;
    let mut pos = 0;
    loop {
        let rest = &text[pos..];
        if !rest.starts_with(['!', '&']) {
            break;
        }
        let len = rest
            .find([' ', '\t', '\n', ',', '[', ']', '{', '}'])
            .unwrap_or(rest.len());
        token_end = pos + len;
        let after = &text[token_end..];
        pos = token_end + (after.len() - after.trim_start_matches([' ', '\t']).len());
    }
    let after = &text[token_end..];
    let gap = after.len() - after.trim_start_matches([' ', '\t']).len();
    (token_end, gap)
}

/// Apply a core `!!type` property to a scalar.
fn apply_explicit_tag(node: &mut Node) {
    let tag = node
        .layout
        .props
        .as_ref()
        .and_then(|(token, _)| token.split_whitespace().find_map(scalar::explicit_tag));
    if let (Some(tag), NodeData::Scalar(s)) = (tag, &mut node.data) {
        s.tag = tag;
    }
}

fn line_of(src: &str, pos: usize) -> usize {
    src[..pos.min(src.len())].matches('\n').count() + 1
}

struct Parser {
    src: String,
    lines: Vec<Line>,
    pos: usize,
    /// Trivia lines waiting for the next node
    pending: Vec<String>,
}

impl Parser {
    fn new(src: String) -> Self {
        let mut lines = Vec::new();
        let mut start = 0;
        for piece in src.split_inclusive('\n') {
            let text = piece.strip_suffix('\n').unwrap_or(piece).to_string();
            lines.push(Line { text, start });
            start += piece.len();
        }
        Self {
            src,
            lines,
            pos: 0,
            pending: Vec::new(),
        }
    }

    fn error_at(&self, line: usize, message: &str) -> Error {
        Error::Parse {
            line: line + 1,
            message: message.to_string(),
        }
    }

    fn line_index(&self, offset: usize) -> usize {
        self.lines
            .partition_point(|l| l.start <= offset)
            .saturating_sub(1)
    }

    /// Lines up to the first node that belong to the document rather than
    /// to the root.
    fn preamble(&mut self) -> Result<Vec<String>, Error> {
        let mut end = 0;
        let mut marker = None;
        while let Some(line) = self.lines.get(end) {
            if line.is_trivia() || line.text.starts_with('%') {
                end += 1;
                continue;
            }
            if is_document_start(&line.text) {
                marker = Some(end);
            }
            break;
        }
        let split = match marker {
            Some(m) => {
                let rest = self.lines[m].text[3..].trim();
                if !rest.is_empty() && !rest.starts_with('#') {
                    return Err(
                        self.error_at(m, "content on the document start line is not supported")
                    );
                }
                self.pos = m + 1;
                m + 1
            }
            None => {
                self.pos = end;
                self.lines[..end]
                    .iter()
                    .rposition(Line::is_blank)
                    .map_or(0, |i| i + 1)
            }
        };
        let head = self.lines[..split].iter().map(|l| l.text.clone()).collect();
        self.pending = self.lines[split..self.pos]
            .iter()
            .map(|l| l.text.clone())
            .collect();
        Ok(head)
    }

    fn collect_trivia(&mut self) {
        while let Some(line) = self.lines.get(self.pos) {
            if !line.is_trivia() {
                break;
            }
            self.pending.push(line.text.clone());
            self.pos += 1;
        }
    }

    /// Indentation of the next structural line, if any.
    fn peek_content(&mut self) -> Result<Option<usize>, Error> {
        self.collect_trivia();
        let line = match self.lines.get(self.pos) {
            Some(line) => line,
            None => return Ok(None),
        };
        if is_document_start(&line.text) || is_document_end(&line.text) {
            return Ok(None);
        }
        if line.content().starts_with('\t') {
            return Err(Error::UnsupportedIndentation { line: self.pos + 1 });
        }
        Ok(Some(line.indent()))
    }

    fn take_foot(&mut self, indent: usize) -> Vec<String> {
        let n = self
            .pending
            .iter()
            .take_while(|l| {
                let t = l.trim_start_matches(' ');
                t.starts_with('#') && l.len() - t.len() >= indent
            })
            .count();
        self.pending.drain(..n).collect()
    }

    fn root(&mut self) -> Result<(Node, usize, bool), Error> {
        let indent = match self.peek_content()? {
            Some(indent) => indent,
            None => {
                let mut root = Node::mapping(Style::Block);
                self.finish(&mut root)?;
                return Ok((root, 0, false));
            }
        };
        let line_no = self.pos;
        let content = self.lines[line_no].content().to_string();
        let mut root = if starts_flow(&content) {
            let start = self.lines[line_no].start + indent;
            let (mut node, end) = self.flow(start)?;
            let (gap, comment) = self.finish_line(end)?;
            node.layout.eol_gap = gap;
            node.comments.inline = comment;
            node
        } else if is_dash(&content) {
            self.block_sequence(indent)?
        } else if content.starts_with('?') {
            return Err(self.error_at(line_no, "complex mapping keys are not supported"));
        } else if find_key(&content).is_some() {
            self.block_mapping(indent)?
        } else {
            return Err(self.error_at(line_no, "document root must be a mapping or a sequence"));
        };
        self.finish(&mut root)?;
        Ok((root, indent, true))
    }

    /// Everything after the root must be trivia; it becomes the root's foot.
    fn finish(&mut self, root: &mut Node) -> Result<(), Error> {
        if self.peek_content()?.is_some() {
            return Err(self.error_at(self.pos, "unexpected indentation"));
        }
        if let Some(line) = self.lines.get(self.pos) {
            if is_document_start(&line.text) {
                return Err(self.error_at(self.pos, "multiple documents are not supported"));
            }
            // `...` ends the document; only comments may follow
            self.pending.push(line.text.clone());
            self.pos += 1;
            self.collect_trivia();
            if self.pos < self.lines.len() {
                return Err(self.error_at(self.pos, "multiple documents are not supported"));
            }
        }
        let foot = std::mem::take(&mut self.pending);
        root.comments.foot.extend(foot);
        Ok(())
    }

    fn block_mapping(&mut self, indent: usize) -> Result<Node, Error> {
        let mut node = Node::mapping(Style::Block);
        let mut entries = Vec::new();
        while let Some(ind) = self.peek_content()? {
            if ind < indent {
                break;
            }
            let line_no = self.pos;
            if ind > indent {
                return Err(self.error_at(line_no, "unexpected indentation"));
            }
            let content = self.lines[line_no].content().to_string();
            if content.starts_with('?') {
                return Err(self.error_at(line_no, "complex mapping keys are not supported"));
            }
            let split = find_key(&content)
                .ok_or_else(|| self.error_at(line_no, "expected a mapping key"))?;
            let key_raw = &content[..split.key_end];
            let key = if key_raw.starts_with(['"', '\'']) {
                decode_quoted(key_raw).map_err(|e| self.error_at(line_no, &e))?
            } else {
                plain_scalar(key_raw)
            };
            let mut key = Node::scalar(Scalar {
                tag: Tag::String,
                ..key
            });
            key.comments.head = std::mem::take(&mut self.pending);
            let (ws, value) = self.value(line_no, indent + split.colon + 1, indent, Context::Mapping)?;
            let colon = format!("{}{}", &content[split.key_end..=split.colon], ws);
            entries.push(Entry { key, colon, value });
        }
        node.data = NodeData::Mapping(entries);
        node.comments.foot = self.take_foot(indent);
        Ok(node)
    }

    fn block_sequence(&mut self, indent: usize) -> Result<Node, Error> {
        let mut node = Node::sequence(Style::Block);
        let mut items = Vec::new();
        while let Some(ind) = self.peek_content()? {
            if ind < indent {
                break;
            }
            let line_no = self.pos;
            if ind > indent {
                return Err(self.error_at(line_no, "unexpected indentation"));
            }
            let content = self.lines[line_no].content().to_string();
            if !is_dash(&content) {
                break;
            }
            let head = std::mem::take(&mut self.pending);
            let after = &content[1..];
            let body = after.trim_start_matches([' ', '\t']);
            let gap = &after[..after.len() - body.len()];
            let compact_seq = is_dash(body);
            let compact_map = !compact_seq
                && !body.is_empty()
                && !starts_flow(body)
                && find_key(body).is_some();
            let mut item = if compact_seq || compact_map {
                // Re-read the rest of the line as if it started the child block
                let col = indent + 1 + gap.len();
                let line = &mut self.lines[line_no];
                line.text = format!("{}{}", " ".repeat(col), &line.text[col..]);
                let mut child = if compact_seq {
                    self.block_sequence(col)?
                } else {
                    self.block_mapping(col)?
                };
                child.layout.compact = true;
                child.layout.lead = gap.to_string();
                child
            } else {
                let (ws, mut child) = self.value(line_no, indent + 1, indent, Context::Sequence)?;
                child.layout.lead = ws;
                child
            };
            item.comments.head = head;
            items.push(item);
        }
        node.data = NodeData::Sequence(items);
        node.comments.foot = self.take_foot(indent);
        Ok(node)
    }

    /// Parse the node that follows an indicator (`:` or `-`) ending at
    /// column `col` of line `line_no`. Returns the whitespace between the
    /// indicator and the node, and the node.
    fn value(
        &mut self,
        line_no: usize,
        col: usize,
        parent: usize,
        ctx: Context,
    ) -> Result<(String, Node), Error> {
        let line_start = self.lines[line_no].start;
        let text = self.lines[line_no].text.clone();
        let rest = &text[col.min(text.len())..];
        let mut body = rest.trim_start_matches([' ', '\t']);
        let ws = rest[..rest.len() - body.len()].to_string();
        let mut body_col = col + ws.len();

        let mut props = None;
        if body.starts_with(['!', '&']) {
            let (token_len, gap_len) = props_span(body);
            props = Some((
                body[..token_len].to_string(),
                body[token_len..token_len + gap_len].to_string(),
            ));
            body = &body[token_len + gap_len..];
            body_col += token_len + gap_len;
        }

        let mut node = if body.is_empty() || body.starts_with('#') {
            let comment = (!body.is_empty()).then(|| body.to_string());
            let (lead, eol_gap) = match props.as_mut() {
                Some((_, gap)) => (ws, std::mem::take(gap)),
                None => (String::new(), ws),
            };
            self.pos = line_no + 1;
            let mut node = self.nested(parent, ctx)?;
            node.layout.props = props;
            node.layout.eol_gap = eol_gap;
            node.comments.inline = comment;
            apply_explicit_tag(&mut node);
            return Ok((lead, node));
        } else if body.starts_with(['|', '>']) {
            self.block_scalar(line_no, body, parent)?
        } else if starts_flow(body) {
            let (mut node, end) = self.flow(line_start + body_col)?;
            let (gap, comment) = self.finish_line(end)?;
            node.layout.eol_gap = gap;
            node.comments.inline = comment;
            node
        } else if body.starts_with(['"', '\'']) {
            let start = line_start + body_col;
            let end = quoted_span(&self.src, start)
                .ok_or_else(|| self.error_at(line_no, "unterminated quoted scalar"))?;
            let scalar =
                decode_quoted(&self.src[start..end]).map_err(|e| self.error_at(line_no, &e))?;
            let mut node = Node::scalar(scalar);
            let (gap, comment) = self.finish_line(end)?;
            node.layout.eol_gap = gap;
            node.comments.inline = comment;
            node
        } else if let Some(name) = body.strip_prefix('*') {
            let len = name.find([' ', '\t']).unwrap_or(name.len());
            let mut node = Node {
                data: NodeData::Alias(name[..len].to_string()),
                ..Node::null()
            };
            let (gap, comment) = self.finish_line(line_start + body_col + 1 + len)?;
            node.layout.eol_gap = gap;
            node.comments.inline = comment;
            node
        } else {
            self.plain(line_no, body_col, parent)
        };
        node.layout.props = props;
        apply_explicit_tag(&mut node);
        Ok((ws, node))
    }

    /// Node on the lines after an indicator with nothing after it: a nested
    /// block collection, or an implicit null.
    fn nested(&mut self, parent: usize, ctx: Context) -> Result<Node, Error> {
        let ind = match self.peek_content()? {
            Some(ind) => ind,
            None => return Ok(implicit_null()),
        };
        let line_no = self.pos;
        let content = self.lines[line_no].content().to_string();
        let indentless = ind == parent && ctx == Context::Mapping && is_dash(&content);
        if ind <= parent && !indentless {
            return Ok(implicit_null());
        }
        let mut node = if is_dash(&content) {
            self.block_sequence(ind)?
        } else if content.starts_with('?') {
            return Err(self.error_at(line_no, "complex mapping keys are not supported"));
        } else if find_key(&content).is_some() {
            self.block_mapping(ind)?
        } else {
            return Err(self.error_at(line_no, "a value on its own line is not supported"));
        };
        node.layout.offset = Some(ind - parent);
        node.layout.compact = false;
        Ok(node)
    }

    fn block_scalar(&mut self, line_no: usize, body: &str, parent: usize) -> Result<Node, Error> {
        let header_len = body.find([' ', '\t']).unwrap_or(body.len());
        let header = body[..header_len].to_string();
        let valid = header[1..]
            .chars()
            .all(|c| matches!(c, '-' | '+' | '1'..='9'))
            && header[1..].chars().filter(|c| c.is_ascii_digit()).count() <= 1;
        if !valid {
            return Err(self.error_at(line_no, "invalid block scalar header"));
        }
        let after = &body[header_len..];
        let rest = after.trim_start_matches([' ', '\t']);
        let gap = after[..after.len() - rest.len()].to_string();
        if !rest.is_empty() && !rest.starts_with('#') {
            return Err(self.error_at(line_no, "unexpected text after block scalar header"));
        }
        let explicit = header[1..]
            .chars()
            .find_map(|c| c.to_digit(10))
            .map(|d| parent + d as usize);
        let keep = header.contains('+');

        let start = line_no + 1;
        let content_indent = match explicit {
            Some(indent) => Some(indent),
            None => self.lines[start.min(self.lines.len())..]
                .iter()
                .find(|l| !l.is_blank())
                .map(Line::indent)
                .filter(|&i| i > parent),
        };
        let mut end = start;
        if let Some(content_indent) = content_indent {
            let mut j = start;
            while let Some(line) = self.lines.get(j) {
                if line.is_blank() {
                    j += 1;
                    if keep {
                        end = j;
                    }
                } else if line.indent() >= content_indent {
                    j += 1;
                    end = j;
                } else {
                    break;
                }
            }
        }
        let lines: Vec<String> = self.lines[start..end]
            .iter()
            .map(|l| l.text.clone())
            .collect();
        self.pos = end;

        let value = scalar::decode_block(&header, &lines, explicit.unwrap_or(0));
        let style = if header.starts_with('|') {
            ScalarStyle::Literal
        } else {
            ScalarStyle::Folded
        };
        let mut node = Node::scalar(Scalar {
            tag: Tag::String,
            value,
            style,
            raw: Some(header.clone()),
            block: Some(Box::new(BlockBody {
                header,
                lines,
                base_indent: parent,
            })),
        });
        node.layout.eol_gap = gap;
        node.comments.inline = (!rest.is_empty()).then(|| rest.to_string());
        Ok(node)
    }

    /// Plain scalar starting at `col`, with any continuation lines.
    fn plain(&mut self, line_no: usize, col: usize, parent: usize) -> Node {
        let text = &self.lines[line_no].text;
        let body = &text[col..];
        let comment_at = body
            .match_indices('#')
            .map(|(i, _)| i)
            .find(|&i| i > 0 && body[..i].ends_with([' ', '\t']));
        let (value_part, comment) = match comment_at {
            Some(i) => (&body[..i], Some(body[i..].to_string())),
            None => (body, None),
        };
        let trimmed = value_part.trim_end_matches([' ', '\t']);
        let mut gap = value_part[trimmed.len()..].to_string();
        let start = self.lines[line_no].start + col;
        let mut end = start + trimmed.len();
        self.pos = line_no + 1;

        if comment.is_none() {
            let mut j = line_no + 1;
            while let Some(line) = self.lines.get(j) {
                if line.is_blank() {
                    j += 1;
                    continue;
                }
                let content = line.content();
                let continues = line.indent() > parent
                    && !content.starts_with(['#', '\t'])
                    && !is_dash(content)
                    && !content.contains(" #")
                    && find_key(content).is_none()
                    && !is_document_start(&line.text)
                    && !is_document_end(&line.text);
                if !continues {
                    break;
                }
                let kept = line.text.trim_end_matches([' ', '\t']);
                gap = line.text[kept.len()..].to_string();
                end = line.start + kept.len();
                j += 1;
                self.pos = j;
            }
        }

        let mut node = Node::scalar(plain_scalar(&self.src[start..end]));
        node.layout.eol_gap = gap;
        node.comments.inline = comment;
        node
    }

    /// Whitespace and comment after a node that ends at `end`; moves to the
    /// next line.
    fn finish_line(&mut self, end: usize) -> Result<(String, Option<String>), Error> {
        let line_no = self.line_index(end);
        let line = &self.lines[line_no];
        let rest = &line.text[(end - line.start).min(line.text.len())..];
        let body = rest.trim_start_matches([' ', '\t']);
        let gap = rest[..rest.len() - body.len()].to_string();
        self.pos = line_no + 1;
        if body.is_empty() {
            Ok((gap, None))
        } else if body.starts_with('#') {
            Ok((gap, Some(body.to_string())))
        } else {
            Err(self.error_at(line_no, "unexpected text after value"))
        }
    }

    fn flow(&self, start: usize) -> Result<(Node, usize), Error> {
        let mut flow = Flow {
            src: &self.src,
            pos: start,
        };
        let node = flow.node()?;
        Ok((node, flow.pos))
    }
}

/// Reader for flow collections.
struct Flow<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Flow<'a> {
    fn peek(&self) -> Option<u8> {
        self.src.as_bytes().get(self.pos).copied()
    }

    fn error(&self, message: &str) -> Error {
        Error::Parse {
            line: line_of(self.src, self.pos),
            message: message.to_string(),
        }
    }

    /// Whitespace, line breaks and comments.
    fn trivia(&mut self) -> String {
        let start = self.pos;
        let bytes = self.src.as_bytes();
        while let Some(&b) = bytes.get(self.pos) {
            match b {
                b' ' | b'\t' | b'\n' => self.pos += 1,
                b'#' if self.pos > 0 && matches!(bytes[self.pos - 1], b' ' | b'\t' | b'\n') => {
                    while !matches!(bytes.get(self.pos), None | Some(b'\n')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        self.src[start..self.pos].to_string()
    }

    fn node(&mut self) -> Result<Node, Error> {
        let mut props = None;
        if matches!(self.peek(), Some(b'!' | b'&')) {
            let (token_len, gap_len) = props_span(&self.src[self.pos..]);
            let token = self.src[self.pos..self.pos + token_len].to_string();
            let gap = self.src[self.pos + token_len..self.pos + token_len + gap_len].to_string();
            self.pos += token_len + gap_len;
            props = Some((token, gap));
        }
        let mut node = match self.peek() {
            Some(b'[') => self.sequence()?,
            Some(b'{') => self.mapping()?,
            Some(b'"' | b'\'') => self.quoted()?,
            Some(b'*') => {
                let start = self.pos + 1;
                let len = self.src[start..]
                    .find([' ', '\t', '\n', ',', ']', '}'])
                    .unwrap_or(self.src.len() - start);
                self.pos = start + len;
                Node {
                    data: NodeData::Alias(self.src[start..start + len].to_string()),
                    ..Node::null()
                }
            }
            Some(b',' | b']' | b'}') | None if props.is_some() => implicit_null(),
            Some(b',' | b']' | b'}' | b':') | None => return Err(self.error("expected a value")),
            Some(_) => self.plain()?,
        };
        node.layout.props = props;
        apply_explicit_tag(&mut node);
        Ok(node)
    }

    fn sequence(&mut self) -> Result<Node, Error> {
        self.pos += 1;
        let mut node = Node::sequence(Style::Flow);
        let mut items = Vec::new();
        loop {
            let lead = self.trivia();
            match self.peek() {
                Some(b']') => {
                    self.pos += 1;
                    node.layout.trailing_comma = !items.is_empty();
                    node.layout.tail = lead;
                    break;
                }
                None => return Err(self.error("unterminated flow sequence")),
                _ => {}
            }
            let mut item = self.node()?;
            item.layout.lead = lead;
            item.layout.trail = self.trivia();
            items.push(item);
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or ']' in flow sequence")),
            }
        }
        node.data = NodeData::Sequence(items);
        Ok(node)
    }

    fn mapping(&mut self) -> Result<Node, Error> {
        self.pos += 1;
        let mut node = Node::mapping(Style::Flow);
        let mut entries = Vec::new();
        loop {
            let lead = self.trivia();
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    node.layout.trailing_comma = !entries.is_empty();
                    node.layout.tail = lead;
                    break;
                }
                None => return Err(self.error("unterminated flow mapping")),
                _ => {}
            }
            let mut key = match self.peek() {
                Some(b'"' | b'\'') => self.quoted()?,
                Some(b'[' | b'{' | b'?') => {
                    return Err(self.error("complex mapping keys are not supported"))
                }
                _ => self.plain()?,
            };
            if let NodeData::Scalar(s) = &mut key.data {
                s.tag = Tag::String;
            }
            key.layout.lead = lead;
            let before = self.trivia();
            let (colon, mut value) = if self.peek() == Some(b':') {
                self.pos += 1;
                let after = self.trivia();
                let value = if matches!(self.peek(), Some(b',' | b'}')) {
                    implicit_null()
                } else {
                    self.node()?
                };
                (format!("{}:{}", before, after), value)
            } else {
                let mut value = implicit_null();
                value.layout.trail = before;
                (String::new(), value)
            };
            value.layout.trail.push_str(&self.trivia());
            entries.push(Entry { key, colon, value });
            match self.peek() {
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(self.error("expected ',' or '}' in flow mapping")),
            }
        }
        node.data = NodeData::Mapping(entries);
        Ok(node)
    }

    fn quoted(&mut self) -> Result<Node, Error> {
        let start = self.pos;
        let end = quoted_span(self.src, start)
            .ok_or_else(|| self.error("unterminated quoted scalar"))?;
        let scalar = decode_quoted(&self.src[start..end]).map_err(|e| self.error(&e))?;
        self.pos = end;
        Ok(Node::scalar(scalar))
    }

    fn plain(&mut self) -> Result<Node, Error> {
        let bytes = self.src.as_bytes();
        let start = self.pos;
        let mut end = start;
        let mut i = start;
        while let Some(&b) = bytes.get(i) {
            match b {
                b',' | b'[' | b']' | b'{' | b'}' | b'\n' => break,
                b':' if matches!(
                    bytes.get(i + 1),
                    None | Some(b' ' | b'\t' | b'\n' | b',' | b'[' | b']' | b'{' | b'}')
                ) =>
                {
                    break
                }
                b'#' if i > start && matches!(bytes[i - 1], b' ' | b'\t') => break,
                b' ' | b'\t' => {}
                _ => end = i + 1,
            }
            i += 1;
        }
        if end == start {
            return Err(self.error("expected a value"));
        }
        self.pos = end;
        Ok(Node::scalar(plain_scalar(&self.src[start..end])))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn root(text: &str) -> Node {
        parse(text).unwrap().root
    }

    fn scalar_at<'a>(node: &'a Node, key: &str) -> &'a Scalar {
        node.get(key).and_then(|n| n.as_scalar()).unwrap()
    }

    #[test]
    fn test_empty_document() {
        let parsed = parse("").unwrap();
        assert!(parsed.root.is_mapping());
        assert!(parsed.root.is_empty());
        assert!(!parsed.has_content);
    }

    #[test]
    fn test_comment_only_document() {
        let parsed = parse("# nothing here\n").unwrap();
        assert!(parsed.root.is_empty());
        assert_eq!(parsed.root.comments.foot, vec!["# nothing here"]);
    }

    #[test]
    fn test_block_mapping_scalars() {
        let node = root(indoc! {"
            name: demo
            port: 8080
            ratio: 0.5
            enabled: true
            nothing: ~
            quoted: \"a: b\"
        "});
        assert_eq!(scalar_at(&node, "name").tag, Tag::String);
        assert_eq!(scalar_at(&node, "port").tag, Tag::Int);
        assert_eq!(scalar_at(&node, "ratio").tag, Tag::Float);
        assert_eq!(scalar_at(&node, "enabled").tag, Tag::Bool);
        assert_eq!(scalar_at(&node, "nothing").tag, Tag::Null);
        assert_eq!(scalar_at(&node, "quoted").value, "a: b");
    }

    #[test]
    fn test_comments_attach_to_nodes() {
        let node = root(indoc! {"
            # about a
            a: 1 # one
            b:
              c: 2
              # end of b
            # about d
            d: 3
        "});
        let entries = node.entries();
        assert_eq!(entries[0].key.comments.head, vec!["# about a"]);
        assert_eq!(entries[0].value.comments.inline.as_deref(), Some("# one"));
        assert_eq!(entries[1].value.comments.foot, vec!["  # end of b"]);
        assert_eq!(entries[2].key.comments.head, vec!["# about d"]);
    }

    #[test]
    fn test_document_head() {
        let parsed = parse("%YAML 1.2\n---\n# first\na: 1\n").unwrap();
        assert_eq!(parsed.head, vec!["%YAML 1.2", "---"]);
        assert_eq!(parsed.root.entries()[0].key.comments.head, vec!["# first"]);
    }

    #[test]
    fn test_head_without_marker_splits_at_blank_line() {
        let parsed = parse("# file header\n\n# about a\na: 1\n").unwrap();
        assert_eq!(parsed.head, vec!["# file header", ""]);
        assert_eq!(parsed.root.entries()[0].key.comments.head, vec!["# about a"]);
    }

    #[test]
    fn test_sequences() {
        let node = root(indoc! {"
            plain:
              - a
              - b
            indentless:
            - x
            compact:
              - name: one
                size: 1
              - name: two
            flow: [1, 2, 3]
        "});
        assert_eq!(node.get("plain").unwrap().len(), 2);
        let indentless = node.get("indentless").unwrap();
        assert_eq!(indentless.layout.offset, Some(0));
        let compact = node.get("compact").unwrap();
        assert!(compact.items()[0].layout.compact);
        assert_eq!(compact.items()[0].len(), 2);
        let flow = node.get("flow").unwrap();
        assert_eq!(flow.style, Style::Flow);
        assert_eq!(flow.len(), 3);
    }

    #[test]
    fn test_nested_offset_recorded() {
        let node = root("a:\n    b: 1\n");
        assert_eq!(node.get("a").unwrap().layout.offset, Some(4));
    }

    #[test]
    fn test_flow_mapping_with_spacing() {
        let node = root("m: { a: 1 ,b: [x, y], c }\n");
        let m = node.get("m").unwrap();
        assert_eq!(m.style, Style::Flow);
        assert_eq!(m.entries()[0].key.layout.lead, " ");
        assert_eq!(m.entries()[0].value.layout.trail, " ");
        assert!(m.get("b").unwrap().is_sequence());
        assert!(m.get("c").unwrap().is_null());
    }

    #[test]
    fn test_block_scalar() {
        let node = root("text: |\n  line one\n  line two\nnext: 1\n");
        let text = scalar_at(&node, "text");
        assert_eq!(text.value, "line one\nline two\n");
        assert_eq!(text.style, ScalarStyle::Literal);
        assert!(node.get("next").is_some());
    }

    #[test]
    fn test_multiline_plain() {
        let node = root("a: first\n  second\nb: 2\n");
        assert_eq!(scalar_at(&node, "a").value, "first second");
    }

    #[test]
    fn test_explicit_tag() {
        let node = root("a: !!str 123\n");
        assert_eq!(scalar_at(&node, "a").tag, Tag::String);
    }

    #[test]
    fn test_sequence_root() {
        let node = root("- a: 1\n- a: 2\n");
        assert!(node.is_sequence());
        assert_eq!(node.len(), 2);
    }

    #[test]
    fn test_flow_root() {
        let node = root("[1, 2]\n");
        assert_eq!(node.style, Style::Flow);
    }

    #[test]
    fn test_tab_indentation_rejected() {
        let err = parse("a:\n\tb: 1\n").unwrap_err();
        assert_eq!(err, Error::UnsupportedIndentation { line: 2 });
    }

    #[test]
    fn test_scalar_root_rejected() {
        assert!(matches!(parse("just text\n"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_second_document_rejected() {
        assert!(matches!(parse("a: 1\n---\nb: 2\n"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_unterminated_flow_rejected() {
        assert!(matches!(parse("a: [1, 2\n"), Err(Error::Parse { .. })));
    }

    #[test]
    fn test_bad_indentation_rejected() {
        let err = parse("a: 1\n  b: 2\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 2, .. }));
    }

    #[test]
    fn test_crlf_detected() {
        let parsed = parse("a: 1\r\nb: 2\r\n").unwrap();
        assert!(parsed.crlf);
        assert_eq!(parsed.root.len(), 2);
    }

    #[test]
    fn test_unicode_space_is_not_blank() {
        let err = parse("a: |\n  x\n\u{3000}\n  y\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 3, .. }));
    }
}
