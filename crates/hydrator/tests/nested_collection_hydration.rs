use std::cell::RefCell;

use hydrator::prelude::*;

/// Factory that records every hydration and builds string instances.
#[derive(Default)]
struct RecordingFactory {
    hydrated: RefCell<Vec<String>>,
    proxied: RefCell<Vec<String>>,
}

impl InstanceFactory for RecordingFactory {
    fn hydrate(&self, key: &EntityKey, _state: &[Value]) -> Result<Instance> {
        self.hydrated.borrow_mut().push(key.to_string());
        Ok(Instance::new(key.to_string()))
    }

    fn proxy(&self, key: &EntityKey) -> Result<Instance> {
        self.proxied.borrow_mut().push(key.to_string());
        Ok(Instance::new(format!("proxy:{key}")))
    }
}

/// Team -> heroes (collection) -> powers (collection), plus a single-valued
/// headquarters fetch on the team.
fn build_plan() -> (std::sync::Arc<LoadPlan>, PlanHandles) {
    let mut builder = LoadPlanBuilder::root(
        ReferenceSpec::new("Team", SqlType::BigInt)
            .id_alias("t_id")
            .attr_alias("t_name"),
    );
    let team = builder.root_ref();
    let heroes = builder.collection_fetch(
        team,
        "heroes",
        ReferenceSpec::new("Hero", SqlType::BigInt)
            .id_alias("h_id")
            .attr_alias("h_name"),
    );
    builder.collection_fetch(
        heroes,
        "powers",
        ReferenceSpec::new("Power", SqlType::BigInt)
            .id_alias("p_id")
            .attr_alias("p_name"),
    );
    builder.entity_fetch(
        team,
        "headquarters",
        ReferenceSpec::new("Hq", SqlType::BigInt)
            .id_alias("q_id")
            .attr_alias("q_city"),
        true,
    );
    let plan = builder.build();
    let heroes_fetch = plan.fetches_of(team)[0];
    let hq_fetch = plan.fetches_of(team)[1];
    let powers_fetch = plan.fetches_of(heroes)[0];
    (
        plan,
        PlanHandles {
            heroes_fetch,
            powers_fetch,
            hq_fetch,
        },
    )
}

struct PlanHandles {
    heroes_fetch: FetchId,
    powers_fetch: FetchId,
    hq_fetch: FetchId,
}

const ALIASES: [&str; 8] = [
    "t_id", "t_name", "h_id", "h_name", "p_id", "p_name", "q_id", "q_city",
];

fn row(values: [Value; 8]) -> Vec<Value> {
    values.into()
}

#[test]
fn two_level_collection_join_assembles_nested_graphs() {
    let (plan, handles) = build_plan();
    let factory = RecordingFactory::default();
    let processor = ResultSetProcessor::new(plan, QueryParameters::new(), &factory);
    let mut session = SessionIdentityMap::new();

    // The cartesian shape a two-level collection join produces: team 1 has
    // two heroes, the first hero has two powers, and the second team's hero
    // column set is entirely null.
    let mut source = VecRowSource::new(
        ALIASES.to_vec(),
        vec![
            row([
                Value::BigInt(1),
                Value::Text("Avengers".into()),
                Value::BigInt(10),
                Value::Text("Spider-Man".into()),
                Value::BigInt(100),
                Value::Text("Wall-crawling".into()),
                Value::BigInt(7),
                Value::Text("New York".into()),
            ]),
            row([
                Value::BigInt(1),
                Value::Text("Avengers".into()),
                Value::BigInt(10),
                Value::Text("Spider-Man".into()),
                Value::BigInt(101),
                Value::Text("Spider-sense".into()),
                Value::BigInt(7),
                Value::Text("New York".into()),
            ]),
            row([
                Value::BigInt(1),
                Value::Text("Avengers".into()),
                Value::BigInt(11),
                Value::Text("Iron Man".into()),
                Value::Null,
                Value::Null,
                Value::BigInt(7),
                Value::Text("New York".into()),
            ]),
            row([
                Value::BigInt(2),
                Value::Text("Solo Acts".into()),
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
                Value::Null,
            ]),
        ],
    );

    let roots = processor.process(&mut source, &mut session).unwrap();
    assert_eq!(roots.len(), 2);

    let avengers = &roots[0];
    let members = avengers
        .fetch_value(handles.heroes_fetch)
        .unwrap()
        .collection();
    assert_eq!(members.len(), 2);

    // First hero accumulated both powers across two rows.
    let spider_man = &members[0];
    let powers = spider_man
        .fetch_value(handles.powers_fetch)
        .unwrap()
        .collection();
    assert_eq!(powers.len(), 2);

    // Second hero has no powers; the null identifier short-circuited its
    // power subtree rather than erroring.
    let iron_man = &members[1];
    assert!(
        iron_man
            .fetch_value(handles.powers_fetch)
            .unwrap()
            .collection()
            .is_empty()
    );

    // Headquarters resolved for the first team, absent for the second.
    assert!(avengers.fetch_value(handles.hq_fetch).unwrap().entity().is_some());
    assert!(roots[1].fetch_value(handles.hq_fetch).unwrap().entity().is_none());

    // Every distinct entity hydrated exactly once, despite the repetition in
    // the denormalized rows: 2 teams, 2 heroes, 2 powers, 1 headquarters.
    assert_eq!(factory.hydrated.borrow().len(), 7);
}

#[test]
fn session_carries_identity_across_loads() {
    let (plan, handles) = build_plan();
    let factory = RecordingFactory::default();
    let mut session = SessionIdentityMap::new();

    let rows = vec![row([
        Value::BigInt(1),
        Value::Text("Avengers".into()),
        Value::BigInt(10),
        Value::Text("Spider-Man".into()),
        Value::Null,
        Value::Null,
        Value::Null,
        Value::Null,
    ])];

    let processor = ResultSetProcessor::new(plan, QueryParameters::new(), &factory);
    let mut source = VecRowSource::new(ALIASES.to_vec(), rows.clone());
    let first = processor.process(&mut source, &mut session).unwrap();

    // A second load of the same data reuses the session-managed instances.
    let mut source = VecRowSource::new(ALIASES.to_vec(), rows);
    let second = processor.process(&mut source, &mut session).unwrap();

    assert!(first[0].instance.ptr_eq(&second[0].instance));
    let first_hero = &first[0].fetch_value(handles.heroes_fetch).unwrap().collection()[0];
    let second_hero = &second[0].fetch_value(handles.heroes_fetch).unwrap().collection()[0];
    assert!(first_hero.instance.ptr_eq(&second_hero.instance));

    // The second load hydrated nothing.
    assert_eq!(factory.hydrated.borrow().len(), 2);
}

#[test]
fn proxies_stand_in_for_fetched_entities_when_requested() {
    let (plan, handles) = build_plan();
    let factory = RecordingFactory::default();
    let params = QueryParameters::new().return_proxies(true);
    let processor = ResultSetProcessor::new(plan, params, &factory);
    let mut session = SessionIdentityMap::new();

    let mut source = VecRowSource::new(
        ALIASES.to_vec(),
        vec![row([
            Value::BigInt(1),
            Value::Text("Avengers".into()),
            Value::BigInt(10),
            Value::Text("Spider-Man".into()),
            Value::Null,
            Value::Null,
            Value::Null,
            Value::Null,
        ])],
    );

    let roots = processor.process(&mut source, &mut session).unwrap();

    // The root is always fully hydrated; fetched entities came back as
    // proxies.
    assert_eq!(factory.hydrated.borrow().len(), 1);
    assert_eq!(factory.proxied.borrow().len(), 1);
    let hero = &roots[0].fetch_value(handles.heroes_fetch).unwrap().collection()[0];
    let rendered: &String = hero.instance.downcast_ref().unwrap();
    assert!(rendered.starts_with("proxy:"));
}
