// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use docmap::error::Error;
use docmap::mapper::{DocumentMapper, MapperBuilder};
use docmap::model::{FieldDef, TypeDef, TypeDescriptor, TypeExpr};
use docmap::types::raw;
use docmap::value::{Instance, Value};
use docmap::wire::{DocumentWriter, StructuredWriter};

fn shapes() -> DocumentMapper {
    MapperBuilder::new()
        .register_type(
            TypeDef::abstract_type("Shape")
                .field(FieldDef::new("name", TypeExpr::named(raw::STRING))),
        )
        .register_type(
            TypeDef::concrete("Circle")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("radius", TypeExpr::named(raw::FLOAT64))),
        )
        .register_type(
            TypeDef::concrete("Square")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("side", TypeExpr::named(raw::FLOAT64))),
        )
        .build()
        .unwrap()
}

fn circle(radius: f64) -> Instance {
    Instance::new("Circle".into())
        .with("name", "c")
        .with("radius", radius)
}

#[test]
fn discriminated_round_trip() {
    let mapper = shapes();
    let shape: TypeDescriptor = "Shape".into();
    let bytes = mapper
        .encode_value(&shape, &Value::Entity(circle(2.5)))
        .unwrap();

    let decoded = mapper.decode_value(&shape, &bytes).unwrap();
    assert_eq!(decoded, Value::Entity(circle(2.5)));

    // the discriminator is the first document field
    let doc = mapper.decode_value(&"document".into(), &bytes).unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    assert_eq!(fields[0], ("_t".to_owned(), Value::String("Circle".into())));
}

#[test]
fn dispatch_is_deterministic() {
    let mapper = shapes();
    let shape: TypeDescriptor = "Shape".into();
    let bytes = mapper
        .encode_value(&shape, &Value::Entity(circle(1.0)))
        .unwrap();
    let a = mapper.decode_value(&shape, &bytes).unwrap();
    let b = mapper.decode_value(&shape, &bytes).unwrap();
    assert_eq!(a, b);
}

#[test]
fn custom_key_and_value() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::interface("Event"))
        .register_type(
            TypeDef::concrete("Login")
                .implements(TypeExpr::named("Event"))
                .discriminator_key("kind")
                .discriminator_value("login-v1")
                .field(FieldDef::new("user", TypeExpr::named(raw::STRING))),
        )
        .register_type(
            TypeDef::concrete("Logout")
                .implements(TypeExpr::named("Event"))
                .discriminator_key("kind")
                .field(FieldDef::new("user", TypeExpr::named(raw::STRING))),
        )
        .build()
        .unwrap();

    let event: TypeDescriptor = "Event".into();
    let login = Instance::new("Login".into()).with("user", "ada");
    let bytes = mapper
        .encode_value(&event, &Value::Entity(login.clone()))
        .unwrap();

    let doc = mapper.decode_value(&"document".into(), &bytes).unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    assert_eq!(
        fields[0],
        ("kind".to_owned(), Value::String("login-v1".into()))
    );
    assert_eq!(
        mapper.decode_value(&event, &bytes).unwrap(),
        Value::Entity(login)
    );
}

#[test]
fn alias_decodes_but_never_encodes() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::abstract_type("Shape"))
        .register_type(
            TypeDef::concrete("Square")
                .extends(TypeExpr::named("Shape"))
                .discriminator_alias("Sq")
                .field(FieldDef::new("side", TypeExpr::named(raw::FLOAT64))),
        )
        .register_type(
            TypeDef::concrete("Circle")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("radius", TypeExpr::named(raw::FLOAT64))),
        )
        .build()
        .unwrap();

    // legacy bytes carrying the alias
    let mut w = DocumentWriter::new();
    w.write_start_document().unwrap();
    w.write_name("_t").unwrap();
    w.write_string("Sq").unwrap();
    w.write_name("side").unwrap();
    w.write_f64(3.0).unwrap();
    w.write_end_document().unwrap();
    let bytes = w.finish().unwrap();

    let decoded = mapper.decode_value(&"Shape".into(), &bytes).unwrap();
    assert_eq!(
        decoded,
        Value::Entity(Instance::new("Square".into()).with("side", 3.0))
    );

    // re-encoding writes the canonical name, not the alias
    let reencoded = mapper.encode_value(&"Shape".into(), &decoded).unwrap();
    let doc = mapper
        .decode_value(&"document".into(), &reencoded)
        .unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    assert_eq!(fields[0], ("_t".to_owned(), Value::String("Square".into())));
}

#[test]
fn fallback_catches_untagged_documents() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::abstract_type("Shape"))
        .register_type(
            TypeDef::concrete("Square")
                .extends(TypeExpr::named("Shape"))
                .fallback()
                .field(FieldDef::new("side", TypeExpr::named(raw::FLOAT64))),
        )
        .register_type(
            TypeDef::concrete("Circle")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("radius", TypeExpr::named(raw::FLOAT64))),
        )
        .build()
        .unwrap();

    let mut w = DocumentWriter::new();
    w.write_start_document().unwrap();
    w.write_name("side").unwrap();
    w.write_f64(4.0).unwrap();
    w.write_end_document().unwrap();
    let bytes = w.finish().unwrap();

    assert_eq!(
        mapper.decode_value(&"Shape".into(), &bytes).unwrap(),
        Value::Entity(Instance::new("Square".into()).with("side", 4.0))
    );
}

#[test]
fn undispatchable_document_yields_null() {
    let mapper = shapes();
    let mut w = DocumentWriter::new();
    w.write_start_document().unwrap();
    w.write_name("_t").unwrap();
    w.write_string("Hexagon").unwrap();
    w.write_end_document().unwrap();
    let bytes = w.finish().unwrap();

    // two candidates, no fallback: skipped, not an error
    assert_eq!(
        mapper.decode_value(&"Shape".into(), &bytes).unwrap(),
        Value::Null
    );
}

#[test]
fn sole_implementation_stays_monomorphic() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::interface("Shape"))
        .register_type(
            TypeDef::concrete("Circle")
                .implements(TypeExpr::named("Shape"))
                .field(FieldDef::new("radius", TypeExpr::named(raw::FLOAT64))),
        )
        .build()
        .unwrap();

    let bytes = mapper
        .encode_value(&"Shape".into(), &Value::Entity(
            Instance::new("Circle".into()).with("radius", 1.0),
        ))
        .unwrap();

    let doc = mapper.decode_value(&"document".into(), &bytes).unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    assert!(!fields.iter().any(|(k, _)| k == "_t"));
}

#[test]
fn explicit_discriminator_forces_polymorphism() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::interface("Shape"))
        .register_type(
            TypeDef::concrete("Circle")
                .implements(TypeExpr::named("Shape"))
                .with_discriminator()
                .field(FieldDef::new("radius", TypeExpr::named(raw::FLOAT64))),
        )
        .build()
        .unwrap();

    let bytes = mapper
        .encode_value(&"Shape".into(), &Value::Entity(
            Instance::new("Circle".into()).with("radius", 1.0),
        ))
        .unwrap();

    let doc = mapper.decode_value(&"document".into(), &bytes).unwrap();
    let Value::Document(fields) = doc else {
        panic!("expected document")
    };
    assert_eq!(fields[0], ("_t".to_owned(), Value::String("Circle".into())));
}

#[test]
fn duplicate_discriminator_is_a_configuration_error() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::abstract_type("Shape"))
        .register_type(
            TypeDef::concrete("Circle")
                .extends(TypeExpr::named("Shape"))
                .discriminator_value("S"),
        )
        .register_type(
            TypeDef::concrete("Square")
                .extends(TypeExpr::named("Shape"))
                .discriminator_value("S"),
        )
        .build()
        .unwrap();

    let err = mapper.codec_for(&"Shape".into()).err().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn field_colliding_with_discriminator_key_is_rejected() {
    let mapper = MapperBuilder::new()
        .register_type(TypeDef::abstract_type("Shape"))
        .register_type(
            TypeDef::concrete("Circle")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("_t", TypeExpr::named(raw::STRING))),
        )
        .register_type(TypeDef::concrete("Square").extends(TypeExpr::named("Shape")))
        .build()
        .unwrap();

    let err = mapper.codec_for(&"Shape".into()).err().unwrap();
    assert!(matches!(err, Error::Configuration(_)));
}

#[test]
fn entity_field_of_hierarchy_type_dispatches() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::abstract_type("Shape")
                .field(FieldDef::new("name", TypeExpr::named(raw::STRING))),
        )
        .register_type(
            TypeDef::concrete("Circle")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("radius", TypeExpr::named(raw::FLOAT64))),
        )
        .register_type(
            TypeDef::concrete("Square")
                .extends(TypeExpr::named("Shape"))
                .field(FieldDef::new("side", TypeExpr::named(raw::FLOAT64))),
        )
        .register_type(
            TypeDef::concrete("Drawing")
                .field(FieldDef::new("main", TypeExpr::named("Shape"))),
        )
        .build()
        .unwrap();

    let ty: TypeDescriptor = "Drawing".into();
    let drawing = Instance::new(ty.clone()).with("main", circle(2.0));
    let bytes = mapper
        .encode_value(&ty, &Value::Entity(drawing.clone()))
        .unwrap();
    assert_eq!(
        mapper.decode_value(&ty, &bytes).unwrap(),
        Value::Entity(drawing)
    );
}

#[test]
fn concrete_parent_makes_child_requests_polymorphic() {
    let mapper = MapperBuilder::new()
        .register_type(
            TypeDef::concrete("Animal")
                .field(FieldDef::new("name", TypeExpr::named(raw::STRING))),
        )
        .register_type(
            TypeDef::concrete("Dog")
                .extends(TypeExpr::named("Animal"))
                .field(FieldDef::new("breed", TypeExpr::named(raw::STRING))),
        )
        .build()
        .unwrap();

    // encoding a Dog as a Dog still tags it: an Animal-typed decode of the
    // same bytes must recover the concrete type
    let dog = Instance::new("Dog".into())
        .with("name", "rex")
        .with("breed", "lab");
    let bytes = mapper
        .encode_value(&"Dog".into(), &Value::Entity(dog.clone()))
        .unwrap();
    assert_eq!(
        mapper.decode_value(&"Animal".into(), &bytes).unwrap(),
        Value::Entity(dog)
    );
}
