//! Path-addressed edits for JSONC text, plus the edit applier.
//!
//! [`modify`] locates the node at a path using [`jsonc_parsing`], decides
//! whether that is a set/replace, a removal, or an insertion, and emits the
//! minimal edit list that performs it. New fragments are serialized as
//! compact JSON and then reindented with [`jsonc_formatting::format`] so
//! they match the surrounding document.

use jsonc_formatting::{format, Edit, FormattingOptions};
pub use jsonc_formatting::apply_edits;
use jsonc_parsing::{find_node_at_location, parse_tree, NodeKind, NodeRef, ParseOptions, PathSegment, Tree, Value};

/// What to do at the target path: write a value, or remove whatever is
/// there. Kept as its own variant instead of overloading [`Value::Null`],
/// which is itself a legitimate value to set.
#[derive(Debug, Clone, PartialEq)]
pub enum ModifyValue {
    Set(Value),
    Remove,
}

/// Error surfaced when the target path cannot be resolved against the
/// document.
#[derive(Debug, Clone, PartialEq)]
pub struct ModifyError {
    pub message: String,
}

impl std::fmt::Display for ModifyError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Options controlling a [`modify`] call.
pub struct ModificationOptions<'a> {
    pub formatting_options: FormattingOptions,
    /// Computes the insertion index for a new object property, given the
    /// object's current keys in document order. `None` appends at the end.
    pub get_insertion_index: Option<&'a dyn Fn(&[&str]) -> usize>,
    /// When the path's last segment is an array index, `true` means insert
    /// at that index (existing items shift right); `false` means replace
    /// the item at that index (or append, if the index equals the length).
    pub is_array_insertion: bool,
}

impl<'a> Default for ModificationOptions<'a> {
    fn default() -> Self {
        Self {
            formatting_options: FormattingOptions::default(),
            get_insertion_index: None,
            is_array_insertion: false,
        }
    }
}

/// Computes the edits that, when applied, make `text` represent `value` at
/// `path`. Returns an empty list (with an error) only when the path cannot
/// be located and the operation is not an insertion.
pub fn modify(
    text: &str,
    path: &[PathSegment],
    value: ModifyValue,
    options: &ModificationOptions,
) -> Result<Vec<Edit>, ModifyError> {
    if path.is_empty() {
        return Ok(set_root(text, &value, &options.formatting_options));
    }

    let mut errors = Vec::new();
    let tree = parse_tree(text, &mut errors, ParseOptions::default());
    let parent_path = &path[..path.len() - 1];
    let last = &path[path.len() - 1];

    let parent = match find_node_at_location(&tree, parent_path) {
        Some(p) => p,
        None => return build_missing_path(text, &tree, path, value, options),
    };

    match (last, parent.kind()) {
        (PathSegment::Key(key), NodeKind::Object) => {
            let existing = parent.children().rev().find(|p| p.property_key() == Some(key.as_str()));
            match (value, existing) {
                (ModifyValue::Remove, None) => Ok(Vec::new()),
                (ModifyValue::Remove, Some(prop)) => Ok(remove_node(text, prop.property_value().unwrap_or(prop))),
                (ModifyValue::Set(v), None) => Ok(insert_property(text, parent, key, &v, options)),
                (ModifyValue::Set(v), Some(prop)) => match prop.property_value() {
                    Some(value_node) => Ok(set_node(text, value_node, &v, &options.formatting_options)),
                    None => Ok(fill_missing_property_value(text, prop, &v, &options.formatting_options)),
                },
            }
        }
        (PathSegment::Index(index), NodeKind::Array) => {
            let children: Vec<NodeRef> = parent.children().collect();
            match value {
                ModifyValue::Remove => {
                    if *index < children.len() {
                        Ok(remove_node(text, children[*index]))
                    } else {
                        Ok(Vec::new())
                    }
                }
                ModifyValue::Set(v) => {
                    if options.is_array_insertion {
                        Ok(insert_array_item(text, parent, *index, &v, options))
                    } else if *index < children.len() {
                        Ok(set_node(text, children[*index], &v, &options.formatting_options))
                    } else {
                        Ok(insert_array_item(text, parent, children.len(), &v, options))
                    }
                }
            }
        }
        _ => Err(ModifyError {
            message: "path segment does not match the container found at its parent path".to_string(),
        }),
    }
}

/// Handles a path whose parent does not fully resolve against the document:
/// walks as far as existing nodes allow, then (for `Set`) builds the missing
/// nested object/array chain and serializes it at the deepest existing node.
/// `Remove` at an absent path is a no-op.
fn build_missing_path(
    text: &str,
    tree: &Tree,
    path: &[PathSegment],
    value: ModifyValue,
    options: &ModificationOptions,
) -> Result<Vec<Edit>, ModifyError> {
    let v = match value {
        ModifyValue::Remove => return Ok(Vec::new()),
        ModifyValue::Set(v) => v,
    };

    let (ancestor, remaining) = deepest_existing_ancestor(tree, path).ok_or_else(|| ModifyError {
        message: "root is not a container".to_string(),
    })?;

    if remaining.is_empty() {
        return Err(ModifyError {
            message: "path resolved fully but its container kind did not match the path segment".to_string(),
        });
    }

    match (&remaining[0], ancestor.kind()) {
        (PathSegment::Key(_), NodeKind::Object) | (PathSegment::Index(_), NodeKind::Array) => {}
        _ => {
            return Err(ModifyError {
                message: "path segment does not match the container found at its parent path".to_string(),
            })
        }
    }

    let nested = build_nested(&remaining[1..], v);

    match &remaining[0] {
        PathSegment::Key(key) => Ok(insert_property(text, ancestor, key, &nested, options)),
        PathSegment::Index(index) => Ok(insert_array_item(text, ancestor, *index, &nested, options)),
    }
}

/// Wraps `value` in the object/array nesting implied by the segments
/// following the one actually inserted into the deepest existing ancestor.
fn build_nested(segments: &[PathSegment], value: Value) -> Value {
    match segments.split_first() {
        None => value,
        Some((PathSegment::Key(key), rest)) => Value::Object(vec![(key.clone(), build_nested(rest, value))]),
        Some((PathSegment::Index(_), rest)) => Value::Array(vec![build_nested(rest, value)]),
    }
}

fn fill_missing_property_value(text: &str, prop: NodeRef, value: &Value, formatting_options: &FormattingOptions) -> Vec<Edit> {
    let level = indent_level_at(text, prop.offset(), formatting_options);
    let fragment = serialize_indented(value, level, formatting_options);
    let insertion = if prop.colon_offset().is_some() {
        format!(" {fragment}")
    } else {
        format!(": {fragment}")
    };
    vec![Edit::new(prop.end(), 0, insertion)]
}

/// Descends `path` against `tree` as far as existing nodes allow, returning
/// the deepest existing container node and the unresolved suffix of `path`.
fn deepest_existing_ancestor<'a>(tree: &'a Tree, path: &[PathSegment]) -> Option<(NodeRef<'a>, &'a [PathSegment])> {
    let mut node = tree.root()?;
    let mut i = 0;

    while i < path.len() {
        let next = match (&path[i], node.kind()) {
            (PathSegment::Key(key), NodeKind::Object) => node
                .children()
                .rev()
                .find(|prop| prop.property_key() == Some(key.as_str()))
                .and_then(|prop| prop.property_value()),
            (PathSegment::Index(idx), NodeKind::Array) => node.children().nth(*idx),
            _ => None,
        };

        match next {
            Some(n) => {
                node = n;
                i += 1;
            }
            None => break,
        }
    }

    Some((node, &path[i..]))
}

fn indent_level_at(text: &str, offset: usize, options: &FormattingOptions) -> usize {
    let line_start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let bytes = text.as_bytes();
    let mut i = line_start;
    let mut width = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b' ' => width += 1,
            b'\t' => width += options.tab_size.max(1),
            _ => break,
        }
        i += 1;
    }

    if options.tab_size == 0 {
        0
    } else {
        width / options.tab_size
    }
}

fn eol_of(options: &FormattingOptions, text: &str) -> String {
    options.eol.clone().unwrap_or_else(|| {
        if text.contains("\r\n") {
            "\r\n".to_string()
        } else if text.contains('\r') {
            "\r".to_string()
        } else {
            "\n".to_string()
        }
    })
}

fn indent_str(level: usize, options: &FormattingOptions) -> String {
    if options.insert_spaces {
        " ".repeat(level * options.tab_size)
    } else {
        "\t".repeat(level)
    }
}

/// Serializes `value` compactly (standard JSON, no comments), then formats
/// the fragment at `indent_level` so it matches the surrounding document.
fn serialize_indented(value: &Value, indent_level: usize, options: &FormattingOptions) -> String {
    let compact = serialize_compact(value);
    let edits = format(&compact, None, options);
    let reindented = apply_edits(&compact, &edits);

    if indent_level == 0 {
        return reindented;
    }

    let eol = eol_of(options, &compact);
    let pad = indent_str(indent_level, options);
    reindented
        .split(&eol as &str)
        .enumerate()
        .map(|(i, line)| if i == 0 || line.is_empty() { line.to_string() } else { format!("{pad}{line}") })
        .collect::<Vec<_>>()
        .join(&eol)
}

fn serialize_compact(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(*n),
        Value::String(s) => serialize_string(s),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().map(serialize_compact).collect();
            format!("[{}]", parts.join(","))
        }
        Value::Object(entries) => {
            let parts: Vec<String> = entries
                .iter()
                .map(|(k, v)| format!("{}:{}", serialize_string(k), serialize_compact(v)))
                .collect();
            format!("{{{}}}", parts.join(","))
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

fn serialize_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn set_root(text: &str, value: &ModifyValue, formatting_options: &FormattingOptions) -> Vec<Edit> {
    match value {
        ModifyValue::Remove => vec![Edit::new(0, text.len(), String::new())],
        ModifyValue::Set(v) => {
            let fragment = serialize_indented(v, 0, formatting_options);
            vec![Edit::new(0, text.len(), fragment)]
        }
    }
}

fn set_node(text: &str, node: NodeRef, value: &Value, formatting_options: &FormattingOptions) -> Vec<Edit> {
    let level = indent_level_at(text, node.offset(), formatting_options);
    let fragment = serialize_indented(value, level, formatting_options);
    vec![Edit::new(node.offset(), node.length(), fragment)]
}

/// Removes `node` (a property's value node, or a bare array element) along
/// with the comma that made it part of a list: the comma before it if it
/// was the last item, otherwise the comma after.
fn remove_node(text: &str, node: NodeRef) -> Vec<Edit> {
    let target = match node.parent() {
        Some(p) if p.kind() == NodeKind::Property => p,
        _ => node,
    };

    let parent = match target.parent() {
        Some(p) => p,
        None => return vec![Edit::new(target.offset(), target.length(), String::new())],
    };

    let siblings: Vec<NodeRef> = parent.children().collect();
    let idx = siblings.iter().position(|s| s.id() == target.id()).unwrap_or(0);
    let is_last = idx + 1 == siblings.len();

    let (remove_start, remove_end) = if is_last {
        if idx > 0 {
            let prev_end = siblings[idx - 1].end();
            (find_comma_after(text, prev_end).unwrap_or(prev_end), target.end())
        } else {
            (target.offset(), target.end())
        }
    } else {
        let next_start = siblings[idx + 1].offset();
        (target.offset(), find_comma_before(text, target.end(), next_start).unwrap_or(target.end()))
    };

    vec![Edit::new(remove_start, remove_end - remove_start, String::new())]
}

fn find_comma_after(text: &str, from: usize) -> Option<usize> {
    text[from..].find(',').map(|i| from + i)
}

fn find_comma_before(text: &str, from: usize, before: usize) -> Option<usize> {
    text.get(from..before)?.find(',').map(|i| from + i + 1)
}

fn insert_property(text: &str, object: NodeRef, key: &str, value: &Value, options: &ModificationOptions) -> Vec<Edit> {
    let keys: Vec<&str> = object.children().filter_map(|p| p.property_key()).collect();
    let children: Vec<NodeRef> = object.children().collect();

    let insert_at = options.get_insertion_index.map(|f| f(&keys)).unwrap_or(children.len());
    let level = indent_level_at(text, object.offset(), &options.formatting_options) + 1;
    let eol = eol_of(&options.formatting_options, text);
    let pad = indent_str(level, &options.formatting_options);

    let fragment = serialize_indented(value, level, &options.formatting_options);
    let prop_text = format!("\"{}\": {}", escape_key(key), fragment);

    if children.is_empty() {
        let open_end = object.offset() + 1;
        let close_start = find_matching_close(text, object.offset(), '{', '}').unwrap_or(object.end().saturating_sub(1));
        return vec![Edit::new(
            open_end,
            close_start - open_end,
            format!("{eol}{pad}{prop_text}{eol}{}", indent_str(level - 1, &options.formatting_options)),
        )];
    }

    if insert_at >= children.len() {
        let last = &children[children.len() - 1];
        vec![Edit::new(last.end(), 0, format!(",{eol}{pad}{prop_text}"))]
    } else {
        let at = &children[insert_at];
        vec![Edit::new(at.offset(), 0, format!("{prop_text},{eol}{pad}"))]
    }
}

fn insert_array_item(text: &str, array: NodeRef, index: usize, value: &Value, options: &ModificationOptions) -> Vec<Edit> {
    let children: Vec<NodeRef> = array.children().collect();
    let level = indent_level_at(text, array.offset(), &options.formatting_options) + 1;
    let eol = eol_of(&options.formatting_options, text);
    let pad = indent_str(level, &options.formatting_options);
    let fragment = serialize_indented(value, level, &options.formatting_options);

    if children.is_empty() {
        let open_end = array.offset() + 1;
        let close_start = find_matching_close(text, array.offset(), '[', ']').unwrap_or(array.end().saturating_sub(1));
        return vec![Edit::new(
            open_end,
            close_start - open_end,
            format!("{eol}{pad}{fragment}{eol}{}", indent_str(level - 1, &options.formatting_options)),
        )];
    }

    // `-1` (or any out-of-range index under replace semantics) means append.
    let append = index >= children.len();

    if options.is_array_insertion {
        if append {
            let last = &children[children.len() - 1];
            vec![Edit::new(last.end(), 0, format!(",{eol}{pad}{fragment}"))]
        } else {
            let at = &children[index];
            vec![Edit::new(at.offset(), 0, format!("{fragment},{eol}{pad}"))]
        }
    } else if append {
        let last = &children[children.len() - 1];
        vec![Edit::new(last.end(), 0, format!(",{eol}{pad}{fragment}"))]
    } else {
        let at = &children[index];
        vec![Edit::new(at.offset(), at.length(), fragment)]
    }
}

fn escape_key(key: &str) -> String {
    serialize_string(key).trim_matches('"').to_string()
}

fn find_matching_close(text: &str, open_offset: usize, open: char, close: char) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = open_offset;
    let mut in_string = false;

    while i < bytes.len() {
        let c = bytes[i] as char;
        if in_string {
            if c == '\\' {
                i += 1;
            } else if c == '"' {
                in_string = false;
            }
        } else if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
        i += 1;
    }
    None
}
