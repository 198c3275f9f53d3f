//! Integration tests for the `Document` API

use indoc::indoc;
use yedit::{Document, Error, ValidationRule, Value};

fn load(text: &str) -> Document {
    Document::load(text).expect("document should parse")
}

// =============================================================================
// Round trip
// =============================================================================

#[test]
fn test_round_trip_preserves_everything() {
    let text = indoc! {"
        # Service configuration
        ---
        service:
            name: api      # public name
            replicas: 3

            # ports exposed by the container
            ports: [80,  443]
            labels: {tier: backend, 'team': \"core\"}
        script: |
          echo one
          echo two
        notes: >-
          folded
          text
        empty:
        list:
        - a
        -   b   # spaced
        # trailing comment
    "};
    assert_eq!(load(text).to_string(), text);
}

#[test]
fn test_trailing_comment_round_trip() {
    for text in ["a: 1\n# end\n", "%YAML 1.2\n---\na: 1\n...\n", "[1, 2]\n# end\n"] {
        assert_eq!(load(text).to_string(), text);
    }
}

#[test]
fn test_unicode_space_line_in_block_scalar_is_an_error() {
    assert!(matches!(
        Document::load("a: |\n  x\n\u{3000}\n  y\n"),
        Err(Error::Parse { .. })
    ));
}

#[test]
fn test_tabs_are_rejected() {
    assert_eq!(
        Document::load("a:\n\tb: 1\n").unwrap_err(),
        Error::UnsupportedIndentation { line: 2 }
    );
}

// =============================================================================
// Get / Set
// =============================================================================

#[test]
fn test_set_preserves_four_space_indent() {
    let mut doc = load(indoc! {"
        config:
            app:
                name: demo  # app name
                debug: false
            db:
                host: localhost
    "});
    doc.set("config.app.name", "updated").unwrap();
    doc.set("config.app.extra.level", 2).unwrap();
    assert_eq!(
        doc.to_string(),
        indoc! {"
            config:
                app:
                    name: updated  # app name
                    debug: false
                    extra:
                        level: 2
                db:
                    host: localhost
        "}
    );
}

#[test]
fn test_set_then_get_returns_value() {
    let mut doc = load("a: 1\n");
    let value = Value::List(vec![Value::Int(1), Value::from("two"), Value::Null]);
    doc.set("x.y", value.clone()).unwrap();
    assert_eq!(doc.get("x.y").unwrap(), value);
    doc.set("f", 2.5).unwrap();
    assert_eq!(doc.get("f").unwrap(), Value::Float(2.5));
}

#[test]
fn test_encoded_maps_sort_keys() {
    let mut doc = load("a: 1\n");
    let mut map = indexmap::IndexMap::new();
    map.insert("zeta".to_string(), Value::Int(1));
    map.insert("alpha".to_string(), Value::Int(2));
    doc.set("m", Value::Map(map)).unwrap();
    assert_eq!(doc.to_string(), "a: 1\nm:\n  alpha: 2\n  zeta: 1\n");
}

#[test]
fn test_failed_set_leaves_document_untouched() {
    let text = "list: [1, 2]\nname: x\n";
    let mut doc = load(text);
    assert!(matches!(
        doc.set("list.key", 1),
        Err(Error::NotAMapping { .. })
    ));
    assert!(matches!(
        doc.set("missing.items[0]", 1),
        Err(Error::KeyNotFound { .. })
    ));
    assert_eq!(doc.to_string(), text);
}

#[test]
fn test_typed_get_errors() {
    let doc = load("name: demo\nlist: [a]\n");
    assert!(matches!(doc.get_int("name"), Err(Error::TypeMismatch { .. })));
    assert!(matches!(
        doc.get_string("nope"),
        Err(Error::KeyNotFound { .. })
    ));
    assert!(matches!(
        doc.get_typed_array_element("list", 0, "date"),
        Err(Error::UnsupportedType(_))
    ));
}

// =============================================================================
// Arrays
// =============================================================================

#[test]
fn test_append_to_flow_array() {
    let mut doc = load("key: [1,2,3]");
    doc.append_to_array("key", 4).unwrap();
    assert_eq!(doc.to_string(), "key: [1,2,3,4]\n");
    assert_eq!(doc.get_array_length("key").unwrap(), 4);
}

#[test]
fn test_append_creates_flow_array() {
    let mut doc = load("name: x\n");
    doc.append_to_array("tags.list", "first").unwrap();
    assert_eq!(doc.to_string(), "name: x\ntags:\n  list: [first]\n");
}

#[test]
fn test_insert_then_remove_restores_block_array() {
    let text = indoc! {"
        steps:
          - build   # compile
          - test
          - deploy
    "};
    let mut doc = load(text);
    for index in 0..=3 {
        doc.insert_into_array("steps", index, "lint").unwrap();
        assert_eq!(doc.get_array_element("steps", index).unwrap(), Value::from("lint"));
        doc.remove_from_array("steps", index).unwrap();
        assert_eq!(doc.to_string(), text);
    }
}

#[test]
fn test_array_index_bounds() {
    let mut doc = load("l: [a, b]\n");
    assert!(matches!(
        doc.insert_into_array("l", 3, "x"),
        Err(Error::IndexOutOfBounds { .. })
    ));
    assert!(matches!(
        doc.remove_from_array("l", 2),
        Err(Error::IndexOutOfBounds { .. })
    ));
    assert!(matches!(
        doc.update_array_element("l", -1, "x"),
        Err(Error::IndexOutOfBounds { .. })
    ));
    assert!(matches!(
        doc.append_to_array("l[0]", "x"),
        Err(Error::NotAnArray { .. })
    ));
    assert_eq!(doc.to_string(), "l: [a, b]\n");
}

#[test]
fn test_update_keeps_item_comment() {
    let mut doc = load("hosts:\n  - a.example  # primary\n  - b.example\n");
    doc.update_array_element("hosts", 0, "c.example").unwrap();
    assert_eq!(
        doc.to_string(),
        "hosts:\n  - c.example  # primary\n  - b.example\n"
    );
}

#[test]
fn test_update_keeps_comment_under_replaced_item() {
    let mut doc = load("l:\n  - x: 1\n    # about x\n  - y\n");
    doc.update_array_element("l", 0, "z").unwrap();
    assert_eq!(doc.to_string(), "l:\n  - z\n    # about x\n  - y\n");
}

// =============================================================================
// Array-rooted documents
// =============================================================================

#[test]
fn test_set_array_element_touches_one_record() {
    let mut doc = load(indoc! {"
        - name: first
          vars:
            max_clients: 100
        - name: second
          vars:
            max_clients: 100
    "});
    doc.set_array_element(0, "vars.max_clients", 500).unwrap();
    assert_eq!(
        doc.to_string(),
        indoc! {"
            - name: first
              vars:
                max_clients: 500
            - name: second
              vars:
                max_clients: 100
        "}
    );
    assert_eq!(
        doc.get_array_document_element(1, "vars.max_clients").unwrap(),
        Value::Int(100)
    );
}

#[test]
fn test_add_array_element() {
    let mut doc = load("- a\n- b\n");
    doc.add_array_element("c").unwrap();
    assert_eq!(doc.to_string(), "- a\n- b\n- c\n");
    assert!(matches!(
        doc.get_array_document_element(5, ""),
        Err(Error::IndexOutOfBounds { .. })
    ));
}

// =============================================================================
// Wildcards
// =============================================================================

#[test]
fn test_wildcards() {
    let mut doc = load(indoc! {"
        envs:
          dev:
            replicas: 1
          prod:
            replicas: 3
        replicas: 0
    "});
    let all = doc.get_all("envs.*.replicas").unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all["envs.prod.replicas"], Value::Int(3));
    assert_eq!(
        doc.get_keys("**.replicas").unwrap(),
        vec!["envs.dev.replicas", "envs.prod.replicas", "replicas"]
    );
    assert_eq!(doc.set_all("envs.*.replicas", 5).unwrap(), 2);
    assert_eq!(doc.get_int("envs.dev.replicas").unwrap(), 5);
    assert_eq!(doc.get_int("replicas").unwrap(), 0);
    assert_eq!(doc.set_all("nothing.*", 1).unwrap(), 0);
}

// =============================================================================
// Merge
// =============================================================================

#[test]
fn test_merge_keeps_base_comments() {
    let mut base = load("name: test # Original name\nport: 80\n");
    let other = load("name: new-name\nextra: true\n");
    base.merge(Some(&other)).unwrap();
    assert_eq!(
        base.to_string(),
        "name: new-name # Original name\nport: 80\nextra: true\n"
    );
}

#[test]
fn test_set_scalar_over_mapping_keeps_comments_below_it() {
    let text = "a:\n  b: 1\n  # note about a\nc: 2\n";
    let mut doc = load(text);
    doc.set("a", 5).unwrap();
    assert_eq!(doc.to_string(), "a: 5\n  # note about a\nc: 2\n");

    let mut base = load(text);
    base.merge(Some(&load("a: 5\n"))).unwrap();
    assert_eq!(base.to_string(), "a: 5\n  # note about a\nc: 2\n");
}

#[test]
fn test_merge_with_empty_document_is_identity() {
    let text = "# head\na:\n  b: [1, 2]  # keep\n# end\n";
    let mut base = load(text);
    base.merge(Some(&Document::new())).unwrap();
    assert_eq!(base.to_string(), text);
    assert_eq!(base.merge(None), Err(Error::NilDocument));
}

#[test]
fn test_merge_at_path() {
    let mut base = load("app: {}\n");
    base.merge_at("app.db", Some(&load("host: localhost\n"))).unwrap();
    assert_eq!(base.get_string("app.db.host").unwrap(), "localhost");
}

// =============================================================================
// Validation
// =============================================================================

#[test]
fn test_validation() {
    let rule = ValidationRule::parse(indoc! {"
        type: map
        required: [name, port]
        properties:
          name: {type: string, minLength: 1}
          port: {type: int, minimum: 1, maximum: 65535}
          env: {type: string, enum: [dev, prod]}
        additionalProperties: false
    "})
    .unwrap();

    assert!(load("name: api\nport: 8080\nenv: dev\n").validate(&rule).is_ok());
    assert_eq!(
        load("name: api\n").validate(&rule),
        Err(Error::RequiredFieldMissing {
            path: String::new(),
            field: "port".into()
        })
    );
    assert!(matches!(
        load("name: api\nport: 70000\n").validate(&rule),
        Err(Error::ConstraintViolation { ref path, .. }) if path == "port"
    ));
    assert!(matches!(
        load("name: api\nport: 1\nenv: qa\n").validate(&rule),
        Err(Error::EnumViolation { .. })
    ));
    assert!(matches!(
        load("name: api\nport: 1\nother: 1\n").validate(&rule),
        Err(Error::AdditionalPropertyNotAllowed { .. })
    ));
}
