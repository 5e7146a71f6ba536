//! Structured events emitted while editing a record.

use std::rc::Rc;
use std::sync::{Arc, Mutex};

use reled_core::{
    Context, DateParts, EntityData, LinkTypeId, Relationship, RelationshipId, RelationshipInit,
    StaticCatalog,
};
use serde_json::json;
use tracing::{Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::{Context as LayerContext, SubscriberExt};

#[derive(Clone, Default)]
struct Capture {
    events: Arc<Mutex<Vec<(Level, String)>>>,
}

impl Capture {
    fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .expect("capture lock")
            .iter()
            .map(|(_, message)| message.clone())
            .collect()
    }

    fn level_of(&self, message: &str) -> Option<Level> {
        self.events
            .lock()
            .expect("capture lock")
            .iter()
            .find(|(_, m)| m == message)
            .map(|(level, _)| *level)
    }
}

impl<S: Subscriber> Layer<S> for Capture {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: LayerContext<'_, S>) {
        struct Msg {
            message: Option<String>,
        }
        impl tracing::field::Visit for Msg {
            fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
                if field.name() == "message" {
                    self.message = Some(value.to_string());
                }
            }

            fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
                if field.name() == "message" {
                    self.message = Some(format!("{value:?}").trim_matches('"').to_string());
                }
            }
        }
        let mut msg = Msg { message: None };
        event.record(&mut msg);
        if let Some(message) = msg.message {
            self.events
                .lock()
                .expect("capture lock")
                .push((*event.metadata().level(), message));
        }
    }
}

fn catalog() -> Rc<StaticCatalog> {
    Rc::new(
        StaticCatalog::from_json(
            r#"{
            "link_types": {
                "1": { "descr": "performed", "entity_types": ["artist", "recording"],
                       "attrs": { "14": [1, null] } },
                "2": { "descr": "produced", "entity_types": ["artist", "recording"] }
            },
            "attributes": [ { "name": "instrument", "root_id": 14, "kind": "multi_select" } ]
        }"#,
        )
        .unwrap(),
    )
}

fn record(cx: &Context) -> Rc<Relationship> {
    let init = RelationshipInit::new(RelationshipId(9), EntityData::new("r1", "recording", "Song"))
        .with_link_type(LinkTypeId(1));
    Relationship::new(init, cx).unwrap()
}

#[test]
fn editing_emits_structured_events() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let cx = Context::builder(catalog()).build();
    let rel = record(&cx);
    rel.revalidate().unwrap();
    rel.begin_date().set(DateParts::ym(2020, 2));
    rel.link_type().set(Some(LinkTypeId(2)));
    rel.retarget(EntityData::new("r2", "recording", "Other")).unwrap();
    rel.discard();

    let messages = capture.messages();
    for expected in [
        "validate.dispatch",
        "field.error",
        "field.changed",
        "attributes.reconcile",
        "target.change",
        "relationship.discard",
    ] {
        assert!(
            messages.iter().any(|m| m == expected),
            "expected {expected} in {messages:?}"
        );
    }
    assert_eq!(capture.level_of("validate.dispatch"), Some(Level::TRACE));
    assert_eq!(capture.level_of("field.error"), Some(Level::DEBUG));
}

#[test]
fn misuse_is_reported_as_warning() {
    let capture = Capture::default();
    let subscriber = tracing_subscriber::registry().with(capture.clone());
    let _guard = tracing::subscriber::set_default(subscriber);

    let cx = Context::builder(catalog()).build();
    let rel = record(&cx);
    let ended = rel.ended();
    ended.set(json!(true));
    assert!(ended.dispose());
    assert!(!ended.dispose());

    assert_eq!(capture.level_of("field.dispose_twice"), Some(Level::WARN));
}
