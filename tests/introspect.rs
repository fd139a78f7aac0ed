use std::collections::HashMap;

use serde_json::json;
use structmeta::sample::{Person, Thing};
use structmeta::{
    AggregateZero, IntrospectError, Kind, Registry, RegistryConfig, Shape, TypeShape, Value,
    introspect_struct,
};

#[derive(Default)]
struct Node {
    _next: Option<Box<Node>>,
    _id: u64,
    _name: String,
}

introspect_struct! {
    Node {
        _next: Option<Box<Node>>,
        _id: u64 = "json:\"id\"",
        _name: String = "json:\"name\"",
    }
}

#[derive(Default)]
struct Point {
    _x: i32,
    _y: i32,
}

introspect_struct! {
    Point {
        _x: i32,
        _y: i32,
    }
}

#[derive(Default)]
struct Segment {
    _from: Point,
    _to: Point,
}

introspect_struct! {
    Segment {
        _from: Point,
        _to: Point,
    }
}

#[derive(Default)]
struct Marker {
    _at: Point,
    _label: String,
}

introspect_struct! {
    Marker {
        _at: Point,
        _label: String,
    }
}

// ---- scenarios ----

#[test]
fn text_value_is_a_scalar() {
    let mut registry = Registry::new();
    let text = registry.describe(&"hello").unwrap();
    assert_eq!(text.kind(), Kind::Scalar);
    assert_eq!(text.name(), "&str");
    assert_eq!(text.zero(), Some(&Value::String(String::new())));

    let owned = registry.describe(&String::from("hello")).unwrap();
    assert_eq!(owned.name(), "String");
    assert_eq!(owned.zero(), Some(&Value::String(String::new())));
}

#[test]
fn optional_text_is_a_pointer() {
    let mut registry = Registry::new();
    let ptr = registry.describe(&Some(String::from("x"))).unwrap();
    assert_eq!(ptr.kind(), Kind::Pointer);
    assert_eq!(ptr.name(), "*String");
    assert_eq!(ptr.pointer_target().unwrap().kind(), Kind::Scalar);
    assert!(ptr.zero().unwrap().is_null());
}

#[test]
fn vec_of_scalars_is_a_sequence() {
    let mut registry = Registry::new();
    let seq = registry.describe(&vec![1_u8, 2, 3]).unwrap();
    assert_eq!(seq.kind(), Kind::Sequence);
    assert_eq!(seq.name(), "[]u8");
    assert_eq!(seq.sequence_element().unwrap().kind(), Kind::Scalar);
    assert_eq!(seq.zero().unwrap().len(), Some(0));
}

#[test]
fn string_map_is_a_map() {
    let mut registry = Registry::new();
    let map = registry
        .describe(&HashMap::from([("a".to_string(), "b".to_string())]))
        .unwrap();
    assert_eq!(map.kind(), Kind::Map);
    assert_eq!(map.name(), "map[String]String");
    assert_eq!(map.map_key().unwrap().kind(), Kind::Scalar);
    assert_eq!(map.map_value().unwrap().kind(), Kind::Scalar);
}

#[test]
fn self_referential_struct_builds_and_formats_once() {
    let mut registry = Registry::new();
    let node = registry.describe(&Node::default()).unwrap();
    let fields: Vec<_> = node.fields().map(|f| (f.name(), f.tag(), f.is_embedded())).collect();
    assert_eq!(
        fields,
        [
            ("_next", "", false),
            ("_id", "json:\"id\"", false),
            ("_name", "json:\"name\"", false),
        ]
    );
    let dump = node.debug_format();
    assert_eq!(dump.matches("// recursion").count(), 1);
    assert_eq!(dump.lines().count(), 5);
}

#[test]
fn shared_nested_aggregate_is_one_descriptor() {
    let mut registry = Registry::new();
    let segment = registry.introspect(&Segment::default()).unwrap();
    let marker = registry.introspect(&Marker::default()).unwrap();

    let segment = registry.descriptor(segment).unwrap();
    let marker = registry.descriptor(marker).unwrap();
    let from = segment.field("_from").unwrap().descriptor();
    let to = segment.field("_to").unwrap().descriptor();
    let at = marker.field("_at").unwrap().descriptor();
    assert_eq!(from, to);
    assert_eq!(from, at);
    assert_eq!(from.id(), at.id());
}

// ---- whole graphs ----

#[test]
fn thing_graph_dump() {
    let mut registry = Registry::new();
    let root = registry.describe(&Some(Thing::default())).unwrap();
    let dump = root.debug_format();
    let expected = "\
pointer\t(root): *Thing
aggregate\t  (ptr value): Thing
pointer\t    thing: *Thing
aggregate\t      (ptr value): Thing // recursion
pointer\t    nested_thing: *Thing
aggregate\t      (ptr value): Thing // recursion
pointer\t    another_nested_thing: *Thing
aggregate\t      (ptr value): Thing // recursion
scalar\t    cheese: f64 json:\"cheese\"
map\t    milk: map[String]String json:\"milk\"
scalar\t      (map key): String
scalar\t      (map elem): String
scalar\t    pork: i64 json:\"pork\"
aggregate\t    grinch: struct { hi } json:\"grinch\"
scalar\t      hi: i64 json:\"hi\"
aggregate\t    anon: struct { bilk } json:\"anon\"
sequence\t      bilk: []*struct { dilk } json:\"bilk\"
pointer\t        (slice elem): *struct { dilk }
aggregate\t          (ptr value): struct { dilk }
map\t            dilk: map[String]struct { drilk boo } json:\"dilk\"
scalar\t              (map key): String
aggregate\t              (map elem): struct { drilk boo }
scalar\t                drilk: DateTime<Utc> json:\"drilk\"
scalar\t                boo: Duration json:\"boo\"
";
    assert_eq!(dump, expected);
}

#[test]
fn thing_records_every_visited_descriptor() {
    let mut registry = Registry::new();
    let root = registry.describe(&Some(Thing::default())).unwrap();
    let names: Vec<_> = root.all_descriptors().map(|d| d.name()).collect();
    assert_eq!(names.last(), Some(&"*Thing"));
    assert!(names.contains(&"Thing"));
    assert!(names.contains(&"struct { drilk boo }"));
    assert!(!names.contains(&"any"));
    assert_eq!(names.iter().filter(|n| **n == "*Thing").count(), 1);

    let mut ids: Vec<_> = root.all_descriptors().map(|d| d.id()).collect();
    let visited = ids.len();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), visited);
}

#[test]
fn thing_root_is_the_self_pointer() {
    let mut registry = Registry::new();
    let root = registry.describe(&Some(Thing::default())).unwrap();
    let thing = root.pointer_target().unwrap();
    for name in ["thing", "nested_thing", "another_nested_thing"] {
        let field = thing.field(name).unwrap();
        assert_eq!(field.descriptor(), root);
        assert_eq!(field.zero(), Some(&Value::Null { pointee: "Thing".to_string() }));
    }
    assert_eq!(root.zero(), Some(&Value::Null { pointee: "Thing".to_string() }));
}

#[test]
fn static_reference_shares_the_option_descriptor() {
    let text: &'static String = Box::leak(Box::new(String::from("x")));
    let mut registry = Registry::new();
    let borrowed = registry.introspect(&text).unwrap();
    let optional = registry.introspect(&Some(String::new())).unwrap();
    assert_eq!(borrowed, optional);
    assert_eq!(registry.descriptor(borrowed).unwrap().name(), "*String");
}

#[test]
fn thing_field_zero_renders_as_json() {
    let mut registry = Registry::new();
    let root = registry.describe(&Some(Thing::default())).unwrap();
    let thing = root.pointer_target().unwrap();

    let grinch = thing.field("grinch").unwrap().zero().unwrap();
    assert_eq!(grinch.to_json().unwrap(), json!({"hi": 0}));
    assert_eq!(grinch.to_string(), "struct { hi }{hi: 0}");

    let milk = thing.field("milk").unwrap().zero().unwrap();
    assert_eq!(milk.to_json().unwrap(), json!({}));

    let zero = thing.zero().unwrap();
    assert!(zero.field("thing").is_none());
    assert_eq!(zero.field("pork"), Some(&Value::I64(0)));
}

#[test]
fn outermost_root_policy_matches_legacy_dumps() {
    let config = RegistryConfig { aggregate_zero: AggregateZero::OutermostRoot };
    let mut registry = Registry::with_config(config);
    let root = registry.describe(&Some(Thing::default())).unwrap();
    let thing = root.pointer_target().unwrap();
    let grinch = thing.field("grinch").unwrap().zero().unwrap();
    assert_eq!(grinch, &Value::Null { pointee: "Thing".to_string() });
}

#[test]
fn person_fields_are_looked_up_by_name() {
    let mut registry = Registry::new();
    let person = registry.describe(&Person::default()).unwrap();
    assert_eq!(person.field("email").unwrap().descriptor().name(), "*String");
    assert_eq!(person.field("tags").unwrap().tag(), "json:\"tags\"");
    assert_eq!(
        person.zero().unwrap().to_json().unwrap(),
        json!({"name": "", "age": 0, "email": null, "tags": []})
    );
}

// ---- errors and fallbacks ----

#[test]
fn hand_written_enum_shape_is_rejected() {
    #[allow(dead_code)]
    enum Mode {
        On,
        Off,
    }
    impl structmeta::Introspect for Mode {
        fn shape() -> Shape {
            Shape::Enum { name: "Mode", variants: vec!["On", "Off"] }
        }
    }

    let mut registry = Registry::new();
    let error = registry.build_root(TypeShape::of::<Vec<Mode>>()).unwrap_err();
    assert_eq!(
        error,
        IntrospectError::UnsupportedKind { kind: "enum", type_name: std::any::type_name::<Mode>() }
    );
    assert!(registry.is_empty());
}

#[test]
fn closures_and_channels_are_opaque() {
    let mut registry = Registry::new();
    let callback = registry.introspect_type::<fn(u32) -> u32>().unwrap();
    let (tx, _rx) = std::sync::mpsc::channel::<u8>();
    let sender = registry.introspect(&tx).unwrap();
    assert_eq!(callback, sender);
    let any = registry.any();
    assert_eq!(any.id(), callback);
    assert_eq!(any.kind(), Kind::Opaque);
    assert!(any.zero().is_none());
}
