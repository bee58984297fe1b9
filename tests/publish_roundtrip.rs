use std::sync::Arc;

use slotflow::{
    Annotation, Delay, EngineBuilder, Flow, FlowRow, FlowTarget, MemRowStore, Position, RowKey, RowStore, START_NODE_ID, Size, Slot, StepPayload, TimeRule,
};

fn slot(name: &str) -> Slot {
    name.parse().unwrap()
}

fn build_flow() -> (Flow, Vec<String>) {
    let mut flow = Flow::new();
    flow.set_start(Position::new(-300.0, 0.0));
    let welcome = flow.add_group("Welcome", Position::new(0.0, 0.0));
    let offer = flow.add_group("Offer", Position::new(400.0, -50.0));
    let later = flow.add_group("Later", Position::new(400.0, 300.0));
    flow.add_edge(START_NODE_ID, &welcome).unwrap();
    flow.add_edge(&welcome, &later).unwrap();
    flow.add_edge(&welcome, &offer).unwrap();

    let mut steps = Vec::new();
    steps.push(flow.add_step(&welcome, StepPayload::text("Hi there; welcome | friend")).unwrap());
    steps.push(
        flow.add_step(
            &welcome,
            StepPayload::Timer {
                min: 2,
                max: 6,
            },
        )
        .unwrap(),
    );
    steps.push(
        flow.add_step(
            &welcome,
            StepPayload::TextLink {
                text: "Read the guide".to_string(),
                url: "https://example.com/guide".to_string(),
            },
        )
        .unwrap(),
    );
    steps.push(
        flow.add_step(
            &offer,
            StepPayload::PhotoSchedule {
                rules: vec![
                    TimeRule::new("08:00", "12:00", "https://cdn.example.com/morning.png", Some("good morning".to_string())).unwrap(),
                    TimeRule::new("12:00", "23:59", "https://cdn.example.com/evening.png", None).unwrap(),
                ],
            },
        )
        .unwrap(),
    );
    steps.push(flow.add_step(&offer, StepPayload::ReminderAdd(FlowTarget::new("checkout").with_delay(Delay::new(24, 0).unwrap()))).unwrap());
    steps.push(
        flow.add_step(
            &later,
            StepPayload::PaymentTag {
                name: "paid".to_string(),
            },
        )
        .unwrap(),
    );
    flow.add_annotation(Annotation::new(
        Position::new(0.0, 600.0),
        Size {
            width: 240.0,
            height: 120.0,
        },
        "<p>Ask legal</p><p>before launch</p>",
    ));
    (flow, steps)
}

fn payloads(flow: &Flow) -> Vec<(Slot, StepPayload)> {
    flow.slots().into_iter().map(|(slot, step)| (slot, step.payload.clone())).collect()
}

#[test]
fn publish_then_load_is_lossless() {
    let store = Arc::new(MemRowStore::new());
    let engine = EngineBuilder::new().store(store.clone()).build().unwrap();
    let key = RowKey::new("sales", "onboarding");
    let (mut flow, _) = build_flow();

    let row = engine.publish(&mut flow, &key).unwrap();
    assert_eq!(row.slots.get(&slot("M2")).map(String::as_str), Some("TEXT LINK Read the guide https://example.com/guide"));
    assert_eq!(row.slots.get(&slot("T1")).map(String::as_str), Some("TIMER 2-6"));

    let loaded = engine.load(&key).unwrap().unwrap();
    assert_eq!(payloads(&loaded), payloads(&flow));
    assert_eq!(loaded.order(), flow.order());
    assert_eq!(loaded.edges(), flow.edges());
    assert_eq!(loaded.start(), flow.start());
    assert_eq!(loaded.annotations().len(), 1);
    assert_eq!(loaded.annotations()[0].html, "Ask legal<br>before launch");
    assert!(loaded.is_normalized());

    let titles: Vec<&str> = loaded.order().iter().filter_map(|og| loaded.group(&og.id)).map(|g| g.title.as_str()).collect();
    assert_eq!(titles, vec!["Welcome", "Offer", "Later"]);
}

#[test]
fn republish_clears_vacated_slots() {
    let store = Arc::new(MemRowStore::new());
    let engine = EngineBuilder::new().store(store.clone()).build().unwrap();
    let key = RowKey::new("sales", "onboarding");
    let (mut flow, steps) = build_flow();
    engine.publish(&mut flow, &key).unwrap();
    assert_eq!(store.find(&key).unwrap().unwrap().slots.len(), 6);

    flow.remove_step(&steps[0]).unwrap();
    flow.remove_step(&steps[1]).unwrap();
    engine.publish(&mut flow, &key).unwrap();

    let stored = store.find(&key).unwrap().unwrap();
    let named: Vec<(String, bool)> = stored.columns().into_iter().map(|(c, v)| (c.to_string(), v.is_some())).collect();
    assert!(named.contains(&("M4".to_string(), true)));
    assert!(named.contains(&("M5".to_string(), false)));
    assert!(named.contains(&("T1".to_string(), false)));
    assert_eq!(stored.slots.get(&slot("M1")).map(String::as_str), Some("TEXT LINK Read the guide https://example.com/guide"));

    let loaded = engine.load(&key).unwrap().unwrap();
    assert_eq!(payloads(&loaded), payloads(&flow));
}

#[test]
fn legacy_rows_load_and_migrate() {
    let store = Arc::new(MemRowStore::new());
    let engine = EngineBuilder::new().store(store.clone()).build().unwrap();
    let key = RowKey::new("sales", "old");

    let legacy = FlowRow::from_columns(
        &key,
        vec![
            ("POSICAO", Some("v1|g:Intro@10,20{M1,M2}|g:Tail{T1}".to_string())),
            ("M1", Some("TEXT hello".to_string())),
            ("M2", Some("PHOTO CAPTION SCHEDULE 08:00-12:00-https://cdn.example.com/a.png morning".to_string())),
            ("T1", Some("TIMER 5-10".to_string())),
        ],
    );
    store.upsert(&legacy).unwrap();

    let mut flow = engine.load(&key).unwrap().unwrap();
    assert_eq!(flow.groups().len(), 2);
    assert!(flow.edges().is_empty());

    let row = engine.publish(&mut flow, &key).unwrap();
    assert_eq!(row.slots.get(&slot("M2")).map(String::as_str), Some("PHOTO CAPTION SCHEDULE 08:00|12:00|https://cdn.example.com/a.png|morning"));
    assert!(row.posicao.unwrap().starts_with("{\"v\":2"));
}

#[test]
fn corrupt_documents_degrade() {
    let store = Arc::new(MemRowStore::new());
    let engine = EngineBuilder::new().store(store.clone()).build().unwrap();
    let key = RowKey::new("sales", "broken");

    let row = FlowRow::from_columns(
        &key,
        vec![
            ("POSICAO", Some("{not valid json".to_string())),
            ("BLK", Some("{not valid json".to_string())),
            ("M1", Some("SOMETHING UNKNOWN".to_string())),
        ],
    );
    store.upsert(&row).unwrap();

    let flow = engine.load(&key).unwrap().unwrap();
    assert!(flow.annotations().is_empty());
    assert_eq!(flow.steps().map(|s| s.payload.clone()).collect::<Vec<_>>(), vec![StepPayload::text("SOMETHING UNKNOWN")]);
    assert_eq!(engine.load(&RowKey::new("sales", "missing")).unwrap(), None);
}
