use crate::error::ParseError;
use crate::node::{LiteralValue, NodeData, NodeId, NodeKind, Tree};
use crate::options::ParseOptions;
use crate::path::PathSegment;
use crate::value::Value;
use crate::visit::{visit, Visitor};

enum Frame {
    Object(Vec<(String, Value)>, Option<String>),
    Array(Vec<Value>),
}

struct ValueBuilder {
    stack: Vec<Frame>,
    result: Value,
    errors: Vec<ParseError>,
}

impl ValueBuilder {
    fn place(&mut self, value: Value) {
        match self.stack.last_mut() {
            None => self.result = value,
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Object(entries, pending_key)) => {
                let key = pending_key.take().unwrap_or_default();
                entries.push((key, value));
            }
        }
    }
}

impl Visitor for ValueBuilder {
    fn on_object_begin(&mut self, _offset: usize, _length: usize, _path: &dyn Fn() -> Vec<PathSegment>) -> bool {
        self.stack.push(Frame::Object(Vec::new(), None));
        true
    }

    fn on_object_property(&mut self, key: &str, _offset: usize, _length: usize) -> bool {
        if let Some(Frame::Object(_, pending_key)) = self.stack.last_mut() {
            *pending_key = Some(key.to_string());
        }
        true
    }

    fn on_object_end(&mut self, _offset: usize, _length: usize) {
        if let Some(Frame::Object(entries, _)) = self.stack.pop() {
            self.place(Value::Object(entries));
        }
    }

    fn on_array_begin(&mut self, _offset: usize, _length: usize, _path: &dyn Fn() -> Vec<PathSegment>) -> bool {
        self.stack.push(Frame::Array(Vec::new()));
        true
    }

    fn on_array_end(&mut self, _offset: usize, _length: usize) {
        if let Some(Frame::Array(items)) = self.stack.pop() {
            self.place(Value::Array(items));
        }
    }

    fn on_literal_value(&mut self, value: LiteralValue, _offset: usize, _length: usize) {
        self.place(value.into());
    }

    fn on_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}

/// Parses `text` into a [`Value`], collecting recoverable errors into
/// `errors` rather than aborting on the first one.
pub fn parse(text: &str, errors: &mut Vec<ParseError>, options: ParseOptions) -> Value {
    let mut builder = ValueBuilder {
        stack: Vec::new(),
        result: Value::Null,
        errors: Vec::new(),
    };
    visit(text, &mut builder, options);
    errors.extend(builder.errors);
    builder.result
}

enum OpenContainer {
    Object {
        id: NodeId,
        pending_property: Option<NodeId>,
    },
    Array {
        id: NodeId,
    },
}

struct TreeBuilder {
    tree: Tree,
    stack: Vec<OpenContainer>,
    errors: Vec<ParseError>,
}

impl TreeBuilder {
    fn push_node(
        &mut self,
        kind: NodeKind,
        offset: usize,
        length: usize,
        value: Option<LiteralValue>,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = self.tree.nodes.len();
        self.tree.nodes.push(NodeData {
            kind,
            offset,
            length,
            value,
            colon_offset: None,
            parent,
            children: Vec::new(),
        });
        id
    }

    /// Attaches a just-completed node (literal, or a container that just
    /// closed) to whatever is waiting for it: the enclosing array, the
    /// enclosing property's value slot, or the tree root.
    fn place_node(&mut self, id: NodeId) {
        match self.stack.last_mut() {
            None => self.tree.root = Some(id),
            Some(OpenContainer::Array { id: array_id }) => {
                let array_id = *array_id;
                self.tree.nodes[array_id].children.push(id);
                self.tree.nodes[id].parent = Some(array_id);
            }
            Some(OpenContainer::Object { pending_property, .. }) => {
                let prop_id = pending_property.take().expect("value without a pending property");
                self.tree.nodes[prop_id].children.push(id);
                self.tree.nodes[id].parent = Some(prop_id);

                let value_end = self.tree.nodes[id].offset + self.tree.nodes[id].length;
                let prop_offset = self.tree.nodes[prop_id].offset;
                self.tree.nodes[prop_id].length = value_end - prop_offset;
            }
        }
    }
}

impl Visitor for TreeBuilder {
    fn on_object_begin(&mut self, offset: usize, length: usize, _path: &dyn Fn() -> Vec<PathSegment>) -> bool {
        let id = self.push_node(NodeKind::Object, offset, length, None, None);
        self.stack.push(OpenContainer::Object {
            id,
            pending_property: None,
        });
        true
    }

    fn on_object_property(&mut self, key: &str, offset: usize, length: usize) -> bool {
        let parent_id = match self.stack.last() {
            Some(OpenContainer::Object { id, .. }) => *id,
            _ => unreachable!("on_object_property fired outside an object"),
        };

        let prop_id = self.push_node(
            NodeKind::Property,
            offset,
            length,
            Some(LiteralValue::String(key.to_string())),
            Some(parent_id),
        );
        self.tree.nodes[parent_id].children.push(prop_id);

        if let Some(OpenContainer::Object { pending_property, .. }) = self.stack.last_mut() {
            *pending_property = Some(prop_id);
        }

        true
    }

    fn on_object_end(&mut self, offset: usize, length: usize) {
        let id = match self.stack.pop() {
            Some(OpenContainer::Object { id, .. }) => id,
            _ => unreachable!("on_object_end without a matching on_object_begin"),
        };
        self.tree.nodes[id].length = (offset + length) - self.tree.nodes[id].offset;
        self.place_node(id);
    }

    fn on_array_begin(&mut self, offset: usize, length: usize, _path: &dyn Fn() -> Vec<PathSegment>) -> bool {
        let id = self.push_node(NodeKind::Array, offset, length, None, None);
        self.stack.push(OpenContainer::Array { id });
        true
    }

    fn on_array_end(&mut self, offset: usize, length: usize) {
        let id = match self.stack.pop() {
            Some(OpenContainer::Array { id }) => id,
            _ => unreachable!("on_array_end without a matching on_array_begin"),
        };
        self.tree.nodes[id].length = (offset + length) - self.tree.nodes[id].offset;
        self.place_node(id);
    }

    fn on_literal_value(&mut self, value: LiteralValue, offset: usize, length: usize) {
        let kind = match value {
            LiteralValue::Null => NodeKind::Null,
            LiteralValue::Bool(_) => NodeKind::Boolean,
            LiteralValue::Number(_) => NodeKind::Number,
            LiteralValue::String(_) => NodeKind::String,
        };
        let id = self.push_node(kind, offset, length, Some(value), None);
        self.place_node(id);
    }

    fn on_separator(&mut self, ch: char, offset: usize, _length: usize) {
        if ch != ':' {
            return;
        }
        if let Some(OpenContainer::Object {
            pending_property: Some(prop_id),
            ..
        }) = self.stack.last()
        {
            self.tree.nodes[*prop_id].colon_offset = Some(offset);
        }
    }

    fn on_error(&mut self, error: ParseError) {
        self.errors.push(error);
    }
}

/// Parses `text` into a concrete syntax [`Tree`].
pub fn parse_tree(text: &str, errors: &mut Vec<ParseError>, options: ParseOptions) -> Tree {
    let mut builder = TreeBuilder {
        tree: Tree::empty(),
        stack: Vec::new(),
        errors: Vec::new(),
    };
    visit(text, &mut builder, options);
    errors.extend(builder.errors);
    builder.tree
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::ParseErrorCode;
    use crate::node::{find_node_at_location, find_node_at_offset, get_node_path, get_node_value};
    use crate::path::PathSegment;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_object_parses_with_no_errors() {
        let mut errors = Vec::new();
        let value = parse("{}", &mut errors, ParseOptions::default());
        assert_eq!(value, Value::Object(vec![]));
        assert!(errors.is_empty());
    }

    #[test]
    fn parses_nested_structure_with_comments() {
        let text = r#"{
            // a leading comment
            "foo": [1, -0.5e2, true, null, "bar"],
        }"#;
        let mut errors = Vec::new();
        let value = parse(text, &mut errors, ParseOptions { allow_trailing_comma: true, ..ParseOptions::default() });

        assert_eq!(
            value,
            Value::Object(vec![(
                "foo".to_string(),
                Value::Array(vec![
                    Value::Number(1.0),
                    Value::Number(-50.0),
                    Value::Bool(true),
                    Value::Null,
                    Value::String("bar".to_string()),
                ])
            )])
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn trailing_comma_is_an_error_unless_allowed() {
        let mut errors = Vec::new();
        parse(r#"{"a": 1,}"#, &mut errors, ParseOptions::default());
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].code, ParseErrorCode::ValueExpected);

        let mut errors = Vec::new();
        parse(
            r#"{"a": 1,}"#,
            &mut errors,
            ParseOptions { allow_trailing_comma: true, ..ParseOptions::default() },
        );
        assert!(errors.is_empty());
    }

    #[test]
    fn missing_colon_is_recovered() {
        let mut errors = Vec::new();
        let value = parse(r#"{"a" 1}"#, &mut errors, ParseOptions::default());
        assert_eq!(value, Value::Object(vec![("a".to_string(), Value::Number(1.0))]));
        assert_eq!(errors[0].code, ParseErrorCode::ColonExpected);
    }

    #[test]
    fn disallowed_comment_is_reported() {
        let mut errors = Vec::new();
        parse(
            "{ /* x */ }",
            &mut errors,
            ParseOptions { disallow_comments: true, ..ParseOptions::default() },
        );
        assert_eq!(errors[0].code, ParseErrorCode::InvalidCommentToken);
    }

    #[test]
    fn empty_content_without_allow_flag_errors() {
        let mut errors = Vec::new();
        let value = parse("   ", &mut errors, ParseOptions::default());
        assert_eq!(value, Value::Null);
        assert_eq!(errors[0].code, ParseErrorCode::ValueExpected);
    }

    #[test]
    fn empty_content_with_allow_flag_is_silent() {
        let mut errors = Vec::new();
        parse("", &mut errors, ParseOptions { allow_empty_content: true, ..ParseOptions::default() });
        assert!(errors.is_empty());
    }

    #[test]
    fn tree_round_trips_through_node_queries() {
        let text = r#"{"a": {"b": [1, 2, 3]}}"#;
        let mut errors = Vec::new();
        let tree = parse_tree(text, &mut errors, ParseOptions::default());
        assert!(errors.is_empty());

        let path = vec![
            PathSegment::Key("a".to_string()),
            PathSegment::Key("b".to_string()),
            PathSegment::Index(1),
        ];
        let node = find_node_at_location(&tree, &path).expect("node should resolve");
        assert_eq!(node.kind(), NodeKind::Number);
        assert_eq!(get_node_value(node), Value::Number(2.0));
        assert_eq!(get_node_path(node), path);

        let offset = text.find('2').unwrap();
        let at_offset = find_node_at_offset(&tree, offset, false).unwrap();
        assert_eq!(at_offset.kind(), NodeKind::Number);
    }

    #[test]
    fn get_node_value_materializes_whole_document() {
        let text = r#"{"a": 1, "b": [true, null]}"#;
        let mut errors = Vec::new();
        let tree = parse_tree(text, &mut errors, ParseOptions::default());
        let root = tree.root().unwrap();
        assert_eq!(
            get_node_value(root),
            Value::Object(vec![
                ("a".to_string(), Value::Number(1.0)),
                ("b".to_string(), Value::Array(vec![Value::Bool(true), Value::Null])),
            ])
        );
    }
}
