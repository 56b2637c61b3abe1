use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};

use fulmen::convert::{
    node_from_tree, Converter, ObjectConverter, ScalarConverter, SequenceConverter, TreeFragment,
};
use fulmen::node::{
    FieldDescriptor, NodeShape, NodeType, NodeTypeBuilder, ScalarKind, TypeSignature,
};
use fulmen::schema::SchemaStore;
use fulmen::tree::OpaqueValue;
use fulmen::{Error, FlushOption, ObjectNode, Registry, ScalarNode, SequenceNode, Value};

const WFI_IMAGE_TAG_V1: &str = "tag:integration:wfi_image-1.0.0";
const WFI_IMAGE_TAG_V2: &str = "tag:integration:wfi_image-1.1.0";
const WFI_IMAGE_SCHEMA_V1: &str = "schema:integration/wfi_image-1.0.0";
const WFI_IMAGE_SCHEMA_V2: &str = "schema:integration/wfi_image-1.1.0";

fn default_start_time() -> DateTime<Utc> {
    DateTime::from_timestamp(1_735_689_600, 0).expect("valid timestamp")
}

/// The pattern-table element type, implied by the WFI image class.
fn phot_entry_type() -> Arc<NodeType> {
    static TYPE: OnceLock<Arc<NodeType>> = OnceLock::new();
    Arc::clone(TYPE.get_or_init(|| {
        NodeTypeBuilder::implied("WfiImage", "phot_table")
            .field(FieldDescriptor::new(
                "abvega_offset",
                TypeSignature::Scalar(ScalarKind::Float),
                || Value::Float(0.0),
            ))
            .register()
            .expect("registers once")
    }))
}

/// A WFI image exposure class: three required fields, an optional
/// placeholder and a pattern-keyed photometry table, bound to two tag
/// versions.
fn wfi_image_type() -> Arc<NodeType> {
    static TYPE: OnceLock<Arc<NodeType>> = OnceLock::new();
    Arc::clone(TYPE.get_or_init(|| {
        SchemaStore::global().add_source(
            WFI_IMAGE_SCHEMA_V1,
            r#"{
                "title": "WFI image exposure",
                "properties": {
                    "type": {"type": "string", "description": "Exposure type."},
                    "start_time": {"description": "Exposure start time."},
                    "nresultants": {"type": "integer"}
                },
                "required": ["type", "start_time", "nresultants"],
                "propertyOrder": ["type", "start_time", "nresultants"]
            }"#,
        );
        SchemaStore::global().add_source(
            WFI_IMAGE_SCHEMA_V2,
            r#"{
                "title": "WFI image exposure",
                "properties": {
                    "type": {"type": "string", "description": "Exposure type."},
                    "start_time": {"description": "Exposure start time."},
                    "nresultants": {"type": "integer"},
                    "effective_exposure_time": {"type": "number"},
                    "phot_table": {
                        "patternProperties": {
                            "^(F\\d{3}|GRISM|PRISM|DARK)$": {"type": "object"}
                        }
                    }
                },
                "required": ["type", "start_time", "nresultants"],
                "propertyOrder": [
                    "type", "start_time", "nresultants",
                    "effective_exposure_time", "phot_table"
                ]
            }"#,
        );
        let entry = phot_entry_type();
        NodeTypeBuilder::tagged("WfiImage")
            .tag(WFI_IMAGE_TAG_V1, WFI_IMAGE_SCHEMA_V1)
            .tag(WFI_IMAGE_TAG_V2, WFI_IMAGE_SCHEMA_V2)
            .field(
                FieldDescriptor::new("type", TypeSignature::Scalar(ScalarKind::String), || {
                    Value::from("WFI_IMAGE")
                })
                .with_description("Exposure type."),
            )
            .field(FieldDescriptor::new(
                "start_time",
                TypeSignature::Scalar(ScalarKind::Time),
                || Value::from(default_start_time()),
            ))
            .field(FieldDescriptor::new(
                "nresultants",
                TypeSignature::Scalar(ScalarKind::Int),
                || Value::Int(6),
            ))
            .field(FieldDescriptor::new(
                "effective_exposure_time",
                TypeSignature::Scalar(ScalarKind::Float),
                || Value::Float(-999999.0),
            ))
            .field(FieldDescriptor::new(
                "phot_table",
                TypeSignature::pattern(
                    r"^(F\d{3}|GRISM|PRISM|DARK)$",
                    TypeSignature::Node(entry),
                )
                .expect("valid pattern"),
                || Value::Mapping(BTreeMap::new()),
            ))
            .register()
            .expect("registers once")
    }))
}

/// A guide-window class carrying the legacy reserved-word field.
fn guide_window_type() -> Arc<NodeType> {
    static TYPE: OnceLock<Arc<NodeType>> = OnceLock::new();
    Arc::clone(TYPE.get_or_init(|| {
        SchemaStore::global().add_source(
            "schema:integration/guide_window-1.0.0",
            r#"{
                "properties": {"pass": {"type": "integer"}},
                "required": []
            }"#,
        );
        NodeTypeBuilder::tagged("GuideWindow")
            .tag(
                "tag:integration:guide_window-1.0.0",
                "schema:integration/guide_window-1.0.0",
            )
            .field(FieldDescriptor::new(
                "pass",
                TypeSignature::Scalar(ScalarKind::Int),
                || Value::Int(0),
            ))
            .register()
            .expect("registers once")
    }))
}

/// A tagged sequence class of calibration log lines.
fn cal_logs_type() -> Arc<NodeType> {
    static TYPE: OnceLock<Arc<NodeType>> = OnceLock::new();
    Arc::clone(TYPE.get_or_init(|| {
        NodeTypeBuilder::tagged("CalLogs")
            .shape(NodeShape::Sequence)
            .tag(
                "tag:integration:cal_logs-1.0.0",
                "schema:integration/cal_logs-1.0.0",
            )
            .register()
            .expect("registers once")
    }))
}

/// An enumerated-scalar detector class.
fn detector_type() -> Arc<NodeType> {
    static TYPE: OnceLock<Arc<NodeType>> = OnceLock::new();
    Arc::clone(TYPE.get_or_init(|| {
        SchemaStore::global().add_source(
            "schema:integration/detector-1.0.0",
            r#"{"enum": ["WFI01", "WFI02", "WFI03"]}"#,
        );
        NodeTypeBuilder::enum_scalar("Detector")
            .tag(
                "tag:integration:detector-1.0.0",
                "schema:integration/detector-1.0.0",
            )
            .register()
            .expect("registers once")
    }))
}

/// A REQUIRED flush materializes exactly the schema-required set, with
/// the declared defaults.
#[test]
fn test_required_flush_materializes_exactly_the_required_set() {
    let ty = wfi_image_type();
    let mut node = ObjectNode::new(&ty);
    node.flush(FlushOption::Required, false, false)
        .expect("flushes");

    let mut keys = node.stored_keys();
    keys.sort_unstable();
    assert_eq!(keys, ["nresultants", "start_time", "type"]);

    assert_eq!(node.try_get("type"), Some(&Value::from("WFI_IMAGE")));
    assert_eq!(
        node.try_get("start_time"),
        Some(&Value::Opaque(OpaqueValue::Time(default_start_time())))
    );
    assert_eq!(node.try_get("nresultants"), Some(&Value::Int(6)));
}

/// A default-constructed instance carries the lexically-last tag and
/// resolves the schema paired with it.
#[test]
fn test_default_instance_carries_the_latest_tag() {
    let ty = wfi_image_type();
    let node = ObjectNode::new(&ty);
    assert_eq!(node.tag(), Some(WFI_IMAGE_TAG_V2));
    assert_eq!(node.schema().expect("resolvable").uri(), WFI_IMAGE_SCHEMA_V2);
}

/// Flushing an already-flushed node again is a no-op: no backing-store
/// change, nothing synthesized.
#[test]
fn test_second_flush_is_a_no_op() {
    let ty = wfi_image_type();
    let mut node = ObjectNode::new(&ty);
    node.flush(FlushOption::Required, false, true).expect("flushes");
    let before: Vec<_> = {
        let mut keys = node.stored_keys();
        keys.sort_unstable();
        keys.into_iter().map(str::to_string).collect()
    };
    let synthesized = node
        .flush(FlushOption::Required, true, true)
        .expect("flushes");
    assert!(synthesized.is_empty());
    let mut after = node.stored_keys();
    after.sort_unstable();
    assert_eq!(before, after);
}

/// Stripping a coerced value to raw form and recoercing against the
/// declared signature reconstructs an equal value.
#[test]
fn test_coercion_round_trips_through_raw_form() {
    let ty = wfi_image_type();
    let mut node = ObjectNode::new(&ty);
    let mut table = BTreeMap::new();
    let mut entry = BTreeMap::new();
    entry.insert("abvega_offset".to_string(), Value::Float(1.5));
    table.insert("F158".to_string(), Value::Mapping(entry));
    node.set_attr("phot_table", Value::Mapping(table)).expect("declared");

    let field = ty.field("phot_table").expect("declared");
    let coerced = node.get_attr("phot_table").expect("coercible").clone();
    let round_tripped =
        fulmen::node::coerce(coerced.unwrapped(), field.signature()).expect("recoercible");
    assert_eq!(round_tripped, coerced);
}

/// Two successive node_items calls on an unmutated instance yield
/// identical sequences in identical order.
#[test]
fn test_node_items_is_deterministic() {
    let ty = wfi_image_type();
    let mut node = ObjectNode::new(&ty);
    node.flush(FlushOption::All, false, false).expect("flushes");
    node.set_index("zz_interop", 1);

    let first: Vec<(String, Value)> = node
        .node_items()
        .expect("ordered")
        .into_iter()
        .map(|(k, v)| (k, v.clone()))
        .collect();
    let second: Vec<(String, Value)> = node
        .node_items()
        .expect("ordered")
        .into_iter()
        .map(|(k, v)| (k, v.clone()))
        .collect();
    assert_eq!(first, second);

    // Schema property order leads.
    let keys: Vec<&str> = first.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(
        keys,
        [
            "type",
            "start_time",
            "nresultants",
            "effective_exposure_time",
            "phot_table",
            "zz_interop"
        ]
    );
}

/// Registering a second class under an already-claimed tag fails before
/// either class can be instantiated.
#[test]
fn test_duplicate_tag_registration_is_fatal() {
    let registry = Registry::new();
    NodeTypeBuilder::tagged("Original")
        .tag(
            "tag:integration:contested-1.0.0",
            "schema:integration/original-1.0.0",
        )
        .register_in(&registry)
        .expect("first claim succeeds");
    let result = NodeTypeBuilder::tagged("Usurper")
        .tag(
            "tag:integration:contested-1.0.0",
            "schema:integration/usurper-1.0.0",
        )
        .register_in(&registry);
    assert!(matches!(result, Err(Error::DuplicateRegistration(_))));
    assert!(registry.class_named("Usurper").is_none());
}

/// An ALL flush additionally materializes the optional placeholder.
#[test]
fn test_all_flush_adds_the_optional_placeholder() {
    let ty = wfi_image_type();
    let mut node = ObjectNode::new(&ty);
    node.flush(FlushOption::All, false, false).expect("flushes");
    assert_eq!(
        node.try_get("effective_exposure_time"),
        Some(&Value::Float(-999999.0))
    );
}

/// Setting the aliased reserved-word field produces exactly one
/// backing-store entry under the canonical name, retrievable through both
/// the alias accessor and index access.
#[test]
fn test_reserved_word_alias_round_trip() {
    let ty = guide_window_type();
    let mut node = ObjectNode::new(&ty);
    node.set_attr("pass_", 3).expect("aliased field");
    assert_eq!(node.len(), 1);
    assert_eq!(node.get_attr("pass_").expect("alias"), &Value::Int(3));
    assert_eq!(node.get_index("pass").expect("canonical"), &Value::Int(3));
}

/// A pattern-keyed table coerces matching keys into the element type; a
/// non-matching key inserted through the permissive index-style setter is
/// tolerated without raising.
#[test]
fn test_pattern_table_coerces_and_tolerates_foreign_keys() {
    let ty = wfi_image_type();
    let entry_ty = phot_entry_type();
    let mut node = ObjectNode::new(&ty);

    let mut table = BTreeMap::new();
    let mut entry = BTreeMap::new();
    entry.insert("abvega_offset".to_string(), Value::Float(1.5));
    table.insert("F158".to_string(), Value::Mapping(entry));
    node.set_attr("phot_table", Value::Mapping(table)).expect("declared");

    let table = node
        .get_attr("phot_table")
        .expect("coercible")
        .as_mapping()
        .expect("mapping")
        .clone();
    let element = table.get("F158").and_then(Value::as_object).expect("coerced");
    assert!(Arc::ptr_eq(element.node_type(), &entry_ty));

    node.set_index("uncatalogued", Value::from("interop"));
    assert_eq!(
        node.get_index("uncatalogued").expect("tolerated"),
        &Value::from("interop")
    );
}

/// The implied element class is discoverable from its containing type and
/// property without a backlink table.
#[test]
fn test_implied_class_resolves_from_the_container() {
    let _ = wfi_image_type();
    let entry_ty = phot_entry_type();
    let found = Registry::global()
        .implied_class("WfiImage", "phot_table")
        .expect("registered");
    assert!(Arc::ptr_eq(&found, &entry_ty));
}

/// Reconstructing an instance from a fragment read under an older tag
/// preserves that exact tag, and writing it again selects the same tag.
#[test]
fn test_converter_preserves_the_read_tag() {
    let _ = wfi_image_type();
    let mut raw = BTreeMap::new();
    raw.insert("nresultants".to_string(), Value::Int(4));
    let mut value =
        node_from_tree(Value::Mapping(raw), WFI_IMAGE_TAG_V1).expect("known tag");
    {
        let node = value.as_object().expect("object node");
        assert_eq!(node.tag(), Some(WFI_IMAGE_TAG_V1));
        assert_eq!(node.schema().expect("resolvable").uri(), WFI_IMAGE_SCHEMA_V1);
    }

    let converter = ObjectConverter;
    let fragment = converter.to_tree(&mut value, false).expect("convertible");
    match fragment {
        TreeFragment::Object { tag, items } => {
            assert_eq!(tag, WFI_IMAGE_TAG_V1);
            // The supplied value survived; required fields were flushed in.
            let keys: Vec<&str> = items.iter().map(|(k, _)| k.as_str()).collect();
            assert_eq!(keys, ["type", "start_time", "nresultants"]);
            assert_eq!(items[2].1, Value::Int(4));
        }
        other => panic!("expected an object fragment, got {:?}", other),
    }
}

/// An unknown tag is a conversion error.
#[test]
fn test_unknown_tag_is_a_conversion_error() {
    let result = node_from_tree(
        Value::Mapping(BTreeMap::new()),
        "tag:integration:never_registered-1.0.0",
    );
    assert!(matches!(result, Err(Error::ConversionError(_))));
}

/// Sequence classes convert element lists and keep their own tag.
#[test]
fn test_sequence_converter_round_trip() {
    let ty = cal_logs_type();
    let mut seq = SequenceNode::new(&ty);
    seq.push("step one complete");
    seq.push("step two complete");

    let converter = SequenceConverter;
    let mut value = Value::Sequence(seq);
    let fragment = converter.to_tree(&mut value, false).expect("convertible");
    let (tag, items) = match fragment {
        TreeFragment::Sequence { tag, items } => (tag, items),
        other => panic!("expected a sequence fragment, got {:?}", other),
    };
    assert_eq!(tag, "tag:integration:cal_logs-1.0.0");

    let rebuilt = converter
        .from_tree(Value::List(items), &tag)
        .expect("convertible");
    assert_eq!(rebuilt, value);
}

/// Enumerated scalars convert their underlying primitive and validate
/// against the schema enumeration.
#[test]
fn test_scalar_converter_and_enum_validation() {
    let ty = detector_type();
    let scalar = ScalarNode::new(&ty, Value::from("WFI02"));
    scalar.check_enum().expect("enumerated value");

    let converter = ScalarConverter;
    let mut value = Value::Scalar(scalar);
    let fragment = converter.to_tree(&mut value, false).expect("convertible");
    match fragment {
        TreeFragment::Scalar { tag, value } => {
            assert_eq!(tag, "tag:integration:detector-1.0.0");
            assert_eq!(value, Value::from("WFI02"));
        }
        other => panic!("expected a scalar fragment, got {:?}", other),
    }
}

/// The registry index classifies every registered class for tooling.
#[test]
fn test_registry_index_covers_the_fixture_classes() {
    let _ = (wfi_image_type(), guide_window_type(), cal_logs_type(), detector_type());
    let index = Registry::global().classify();
    assert!(index.tagged.iter().any(|n| n == "WfiImage"));
    assert!(index.tagged.iter().any(|n| n == "CalLogs"));
    assert!(index.implied.iter().any(|n| n == "WfiImage_PhotTable"));
    assert!(index.enum_scalars.iter().any(|n| n == "Detector"));
}
