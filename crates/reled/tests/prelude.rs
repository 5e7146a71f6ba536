use std::rc::Rc;

use reled::prelude::*;

#[test]
fn prelude_builds_and_edits_a_record() {
    let catalog = StaticCatalog::from_json(
        r#"{ "link_types": { "5": { "descr": "composed", "entity_types": ["artist", "work"] } } }"#,
    )
    .unwrap();
    let cx = Context::builder(Rc::new(catalog)).build();
    let init = RelationshipInit::new(RelationshipId::new(1), EntityData::new("w1", "work", "Suite"))
        .with_link_type(LinkTypeId::new(5))
        .new_record();
    let rel = Relationship::new(init, &cx).unwrap();
    rel.revalidate().unwrap();

    assert_eq!(rel.action().get(), Action::Add);
    assert_eq!(rel.record_type().get().as_deref(), Some("artist-work"));
    assert!(!rel.has_errors().get());

    rel.end_date().set(DateParts::y(1800));
    rel.begin_date().set(DateParts::y(1801));
    assert_eq!(rel.end_date().error(), "The end date cannot precede the begin date.");
    assert!(rel.has_errors().get());
}
