use serde_json::json;
use std::sync::Arc;
use wiremodel::{
    DecodeError, FieldDescriptor, ModelInstance, ModelSchema, Scope, TypeDescriptor, Value,
    WiremodelError,
};

fn construct_ok(schema: &Arc<ModelSchema>, input: serde_json::Value) -> ModelInstance {
    let raw = Value::from_json(input).unwrap();
    match schema.construct(raw, &Scope::empty()) {
        Ok(instance) => instance,
        Err(err) => panic!("{:#}", miette::Report::from(err)),
    }
}

fn construct_err(schema: &Arc<ModelSchema>, input: serde_json::Value) -> WiremodelError {
    let raw = Value::from_json(input).unwrap();
    match schema.construct(raw, &Scope::empty()) {
        Ok(_) => panic!("expected a decode failure, but construction succeeded"),
        Err(err) => err,
    }
}

#[test]
fn test_simple_union() {
    let schema = ModelSchema::builder("SimpleUnion")
        .field(FieldDescriptor::new(
            "foo",
            TypeDescriptor::union(vec![TypeDescriptor::int(), TypeDescriptor::string()]),
        ))
        .build()
        .unwrap();

    assert_eq!(
        construct_ok(&schema, json!({"foo": 1})).get("foo").unwrap().as_int(),
        Some(1)
    );
    assert_eq!(
        construct_ok(&schema, json!({"foo": "nice"}))
            .get("foo")
            .unwrap()
            .as_str(),
        Some("nice")
    );

    let err = construct_err(&schema, json!({"foo": []}));
    assert!(matches!(
        err,
        WiremodelError::Decode(DecodeError::UnionExhausted { .. })
    ));
}

#[test]
fn test_union_exhausted_collects_one_failure_per_member_in_order() {
    let schema = ModelSchema::builder("SimpleUnion")
        .field(FieldDescriptor::new(
            "foo",
            TypeDescriptor::union(vec![TypeDescriptor::int(), TypeDescriptor::string()]),
        ))
        .build()
        .unwrap();

    let err = construct_err(&schema, json!({"foo": []}));
    match err {
        WiremodelError::Decode(DecodeError::UnionExhausted { path, attempts, .. }) => {
            assert_eq!(path, "foo");
            assert_eq!(attempts.len(), 2);
            assert!(matches!(&attempts[0], DecodeError::TypeMismatch { expected, .. } if expected == "integer"));
            assert!(matches!(&attempts[1], DecodeError::TypeMismatch { expected, .. } if expected == "string"));
        }
        other => panic!("expected union exhaustion, got {other:?}"),
    }
}

#[test]
fn test_optional_field() {
    let schema = ModelSchema::builder("OptionalModel")
        .field(FieldDescriptor::new(
            "stuff",
            TypeDescriptor::nullable(TypeDescriptor::int()),
        ))
        .build()
        .unwrap();

    assert_eq!(
        construct_ok(&schema, json!({"stuff": 10}))
            .get("stuff")
            .unwrap()
            .as_int(),
        Some(10)
    );
    // Absent key: null is accepted by the nullable descriptor.
    assert!(construct_ok(&schema, json!({})).get("stuff").unwrap().is_null());
}

#[test]
fn test_union_of_lists() {
    let schema = ModelSchema::builder("ListUnion")
        .field(FieldDescriptor::new(
            "foo",
            TypeDescriptor::union(vec![
                TypeDescriptor::list(TypeDescriptor::union(vec![
                    TypeDescriptor::int(),
                    TypeDescriptor::list(TypeDescriptor::int()),
                ])),
                TypeDescriptor::list(TypeDescriptor::string()),
            ]),
        ))
        .build()
        .unwrap();

    let strings = construct_ok(&schema, json!({"foo": ["hello", "world"]}));
    assert_eq!(
        strings.get("foo").unwrap().as_array().unwrap()[0].as_str(),
        Some("hello")
    );

    let mixed = construct_ok(&schema, json!({"foo": [1, [4, 5], 3]}));
    let items = mixed.get("foo").unwrap().as_array().unwrap();
    assert_eq!(items[1].as_array().unwrap()[1].as_int(), Some(5));

    assert!(construct_err(&schema, json!({"foo": "wrong"})).to_string().contains("matched no member"));
    construct_err(&schema, json!({"foo": [1, 2, "abc"]}));
    construct_err(&schema, json!({"foo": [1, 2, [4, "nice", 6]]}));
}

#[test]
fn test_union_of_maps() {
    let schema = ModelSchema::builder("DictUnion")
        .field(FieldDescriptor::new(
            "stuff",
            TypeDescriptor::union(vec![
                TypeDescriptor::map(TypeDescriptor::map(TypeDescriptor::union(vec![
                    TypeDescriptor::int(),
                    TypeDescriptor::string(),
                ]))),
                TypeDescriptor::map(TypeDescriptor::string()),
            ]),
        ))
        .build()
        .unwrap();

    let nested = construct_ok(&schema, json!({"stuff": {"nice": {"what": 1, "hmm": "123"}}}));
    let outer = nested.get("stuff").unwrap().as_object().unwrap();
    assert_eq!(outer["nice"].as_object().unwrap()["what"].as_int(), Some(1));

    let simple = construct_ok(&schema, json!({"stuff": {"nice": "hmm"}}));
    assert_eq!(
        simple.get("stuff").unwrap().as_object().unwrap()["nice"].as_str(),
        Some("hmm")
    );

    construct_err(&schema, json!({"stuff": {"nice": 1}}));
    construct_err(&schema, json!({"stuff": {"nice": {"hmm": 1}, "wrong": {"no": []}}}));
}

#[test]
fn test_union_of_models_without_overlap() {
    let model_a = ModelSchema::builder("ModelA")
        .field(FieldDescriptor::new("key_a", TypeDescriptor::int()))
        .build()
        .unwrap();
    let model_b = ModelSchema::builder("ModelB")
        .field(FieldDescriptor::new("key_b", TypeDescriptor::int()))
        .build()
        .unwrap();
    let parent = ModelSchema::builder("Parent")
        .field(FieldDescriptor::new(
            "child",
            TypeDescriptor::union(vec![
                TypeDescriptor::model(&model_a),
                TypeDescriptor::model(&model_b),
            ]),
        ))
        .build()
        .unwrap();

    let a = construct_ok(&parent, json!({"child": {"key_a": 1}}));
    assert!(Arc::ptr_eq(
        a.get("child").unwrap().as_model().unwrap().schema(),
        &model_a
    ));

    let b = construct_ok(&parent, json!({"child": {"key_b": 2}}));
    assert!(Arc::ptr_eq(
        b.get("child").unwrap().as_model().unwrap().schema(),
        &model_b
    ));

    construct_err(&parent, json!({"child": {"key_a": []}}));
}

#[test]
fn test_union_of_models_with_overlapping_key() {
    // Both members declare a field named "key"; the value's type decides.
    let model_a = ModelSchema::builder("ModelA")
        .field(FieldDescriptor::new("key", TypeDescriptor::int()))
        .build()
        .unwrap();
    let model_b = ModelSchema::builder("ModelB")
        .field(FieldDescriptor::new("key", TypeDescriptor::string()))
        .build()
        .unwrap();
    let parent = ModelSchema::builder("Parent")
        .field(FieldDescriptor::new(
            "child",
            TypeDescriptor::union(vec![
                TypeDescriptor::model(&model_a),
                TypeDescriptor::model(&model_b),
            ]),
        ))
        .build()
        .unwrap();

    let a = construct_ok(&parent, json!({"child": {"key": 1}}));
    assert!(Arc::ptr_eq(
        a.get("child").unwrap().as_model().unwrap().schema(),
        &model_a
    ));

    let b = construct_ok(&parent, json!({"child": {"key": "hello"}}));
    assert!(Arc::ptr_eq(
        b.get("child").unwrap().as_model().unwrap().schema(),
        &model_b
    ));

    construct_err(&parent, json!({"child": {"key": []}}));
}

#[test]
fn test_union_commits_to_first_declared_match() {
    // The input satisfies both the model and the raw map; declaration
    // order wins, with no backtracking.
    let model_a = ModelSchema::builder("ModelA")
        .field(FieldDescriptor::new("key", TypeDescriptor::int()))
        .build()
        .unwrap();
    let parent = ModelSchema::builder("Parent")
        .field(FieldDescriptor::new(
            "child",
            TypeDescriptor::union(vec![
                TypeDescriptor::model(&model_a),
                TypeDescriptor::map(TypeDescriptor::int()),
            ]),
        ))
        .build()
        .unwrap();

    let decoded = construct_ok(&parent, json!({"child": {"key": 1}}));
    let child = decoded.get("child").unwrap();
    assert!(child.as_model().is_some(), "expected the model member to win");
    assert_eq!(
        child.as_model().unwrap().get("key").unwrap().as_int(),
        Some(1)
    );
}

#[test]
fn test_union_falls_back_to_map_when_model_rejects() {
    let model_a = ModelSchema::builder("ModelA")
        .field(FieldDescriptor::new("key", TypeDescriptor::int()))
        .build()
        .unwrap();
    let parent = ModelSchema::builder("Parent")
        .field(FieldDescriptor::new(
            "child",
            TypeDescriptor::union(vec![
                TypeDescriptor::model(&model_a),
                TypeDescriptor::map(TypeDescriptor::int()),
            ]),
        ))
        .build()
        .unwrap();

    // "nice" is not a declared field of ModelA, so the strict model member
    // rejects the object and the map member takes it.
    let decoded = construct_ok(&parent, json!({"child": {"nice": 1}}));
    let child = decoded.get("child").unwrap();
    assert!(child.as_object().is_some());
    assert_eq!(child.as_object().unwrap()["nice"].as_int(), Some(1));

    construct_err(&parent, json!({"child": {"hmm": "what"}}));
}
