//! End-to-end tests: derived and explicit query methods executed against an
//! in-memory engine, with post processors, hooks and client-side paging.

use regionql::{
    EngineExecutor, EntityMetadata, Execution, ExecutorChain, HookAction, Invocation, OqlError,
    PageRequest, PagedQueryString, PropertyKind, QueryContext, QueryHook, QueryMethod,
    QueryMethodMetadata, QueryResult, RepositoryQuery, Sort,
};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct Person {
    firstname: &'static str,
    lastname: &'static str,
    age: i64,
}

fn people() -> Arc<EntityMetadata> {
    Arc::new(
        EntityMetadata::new("/People")
            .with_identity("id", PropertyKind::Integer)
            .with_property("firstname", PropertyKind::String)
            .with_property("lastname", PropertyKind::String)
            .with_property("age", PropertyKind::Integer),
    )
}

fn data() -> Vec<Person> {
    vec![
        Person { firstname: "Jon", lastname: "Smith", age: 41 },
        Person { firstname: "Ann", lastname: "Smith", age: 35 },
        Person { firstname: "Bob", lastname: "Jones", age: 52 },
        Person { firstname: "Eve", lastname: "Smith", age: 67 },
        Person { firstname: "Tom", lastname: "Smith", age: 22 },
    ]
}

/// A tiny engine that understands the queries used in these tests and records
/// what it was handed.
#[derive(Default)]
struct InMemoryEngine {
    seen: Mutex<Vec<(String, Vec<Value>)>>,
}

impl InMemoryEngine {
    fn select(&self, oql: &str, args: &[Value]) -> Result<Vec<Person>, std::io::Error> {
        self.seen
            .lock()
            .unwrap()
            .push((oql.to_string(), args.to_vec()));

        let where_clause = oql.split(" WHERE ").nth(1).unwrap_or("");
        let mut rows: Vec<Person> = data()
            .into_iter()
            .filter(|p| match where_clause.split(" ORDER BY ").next().unwrap_or("") {
                "" => true,
                "x.lastname = $1 AND x.age > $2" => {
                    Value::from(p.lastname) == args[0] && p.age > args[1].as_i64().unwrap()
                }
                "x.lastname LIKE $1" => {
                    let prefix = args[0].as_str().unwrap().trim_end_matches('%');
                    p.lastname.starts_with(prefix)
                }
                other => panic!("unexpected predicate: {other}"),
            })
            .collect();
        if oql.contains("ORDER BY age DESC") {
            rows.sort_by(|a, b| b.age.cmp(&a.age));
        }
        Ok(rows)
    }

    fn queries(&self) -> Vec<(String, Vec<Value>)> {
        self.seen.lock().unwrap().clone()
    }
}

fn repository(
    name: &str,
    params: usize,
    metadata: QueryMethodMetadata,
    engine: &Arc<InMemoryEngine>,
) -> RepositoryQuery<Person> {
    let method = QueryMethod::new(name, params, people(), metadata).unwrap();
    let engine = Arc::clone(engine);
    RepositoryQuery::new(
        method,
        ExecutorChain::new().then(EngineExecutor::new(move |oql: &str, args: &[Value]| {
            engine.select(oql, args)
        })),
    )
}

#[test]
fn derived_query_pages_three_matches() {
    let engine = Arc::new(InMemoryEngine::default());
    let query = repository(
        "findByLastnameAndAgeGreaterThan",
        2,
        QueryMethodMetadata::new(),
        &engine,
    );
    let args = [json!("Smith"), json!(30)];

    let first = query
        .execute_paged(&args, &Invocation::new().with_page(PageRequest::of(0, 2).unwrap()))
        .unwrap();
    assert_eq!(first.size(), 2);
    assert_eq!(first.total_elements(), 3);

    let second = first.with(first.page_request().next());
    assert_eq!(second.size(), 1);
    assert_eq!(second.as_list()[0].firstname, "Eve");

    let page = second.to_page();
    assert_eq!(page.total_pages, 2);
    assert!(!page.has_next);
    assert!(page.has_previous);

    let queries = engine.queries();
    assert_eq!(queries.len(), 1, "paging must not re-run the query");
    assert_eq!(
        queries[0].0,
        "SELECT * FROM /People x WHERE x.lastname = $1 AND x.age > $2"
    );
    assert_eq!(queries[0].1, args.to_vec());
}

#[test]
fn page_sort_and_limit_reach_the_engine() {
    let engine = Arc::new(InMemoryEngine::default());
    let query = repository(
        "findByLastnameStartingWith",
        1,
        QueryMethodMetadata::new().with_limit(10),
        &engine,
    );
    let page = PageRequest::of(0, 3)
        .unwrap()
        .with_sort(Sort::new().desc("age").unwrap());

    let results = query
        .execute_paged(&[json!("Smi")], &Invocation::new().with_page(page))
        .unwrap();
    let ages: Vec<i64> = results.iter().map(|p| p.age).collect();
    assert_eq!(ages, vec![67, 41, 35]);

    let (oql, args) = engine.queries().remove(0);
    assert_eq!(
        oql,
        "SELECT * FROM /People x WHERE x.lastname LIKE $1 ORDER BY age DESC LIMIT 10"
    );
    assert_eq!(args, vec![json!("Smi%")]);
}

#[test]
fn explicit_query_with_extensions() {
    let engine = Arc::new(InMemoryEngine::default());
    let metadata = QueryMethodMetadata::new()
        .with_query("SELECT * FROM /People x")
        .with_hints(["LastnameIdx"])
        .with_import("org.example.Person")
        .trace();
    let query = repository("everyone", 0, metadata, &engine);

    let rows = query.execute(&[], &Invocation::new()).unwrap();
    assert_eq!(rows.len(), 5);
    assert_eq!(
        engine.queries()[0].0,
        "<TRACE> <HINT 'LastnameIdx'> IMPORT org.example.Person; SELECT * FROM /People x"
    );
}

#[test]
fn executor_chain_falls_back_without_swallowing_errors() {
    let method = QueryMethod::new("findByAgeGreaterThan", 1, people(), QueryMethodMetadata::new())
        .unwrap();

    let cache_only = |_: &QueryMethod, q: &PagedQueryString, _: &[Value]| -> regionql::OqlResult<Execution<Person>> {
        if q.as_str().contains("/Cache") {
            Ok(Execution::Completed(Vec::new()))
        } else {
            Ok(Execution::Unsupported)
        }
    };
    let fallback = EngineExecutor::new(|_: &str, _: &[Value]| Ok::<_, std::io::Error>(data()));
    let query = RepositoryQuery::new(
        method.clone(),
        ExecutorChain::new().then(cache_only).then(fallback),
    );
    assert_eq!(query.execute(&[json!(18)], &Invocation::new()).unwrap().len(), 5);

    let failing = EngineExecutor::new(|_: &str, _: &[Value]| {
        Err::<Vec<Person>, _>(std::io::Error::other("member departed"))
    });
    let never = EngineExecutor::new(|_: &str, _: &[Value]| -> Result<Vec<Person>, std::io::Error> {
        panic!("strategies after an error must not run")
    });
    let query = RepositoryQuery::new(method, ExecutorChain::new().then(failing).then(never));
    let err = query.execute(&[json!(18)], &Invocation::new()).unwrap_err();
    assert!(matches!(err, OqlError::Engine(_)));
}

#[test]
fn post_processors_and_hooks_see_final_text() {
    #[derive(Default)]
    struct Recorder {
        before: Mutex<Vec<String>>,
        after: Mutex<Vec<QueryResult>>,
    }
    impl QueryHook for Recorder {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            self.before.lock().unwrap().push(ctx.oql.clone());
            HookAction::Continue
        }
        fn after_query(&self, _: &QueryContext, _: Duration, result: &QueryResult) {
            self.after.lock().unwrap().push(result.clone());
        }
    }

    struct Shared(Arc<Recorder>);
    impl QueryHook for Shared {
        fn before_query(&self, ctx: &QueryContext) -> HookAction {
            self.0.before_query(ctx)
        }
        fn after_query(&self, ctx: &QueryContext, d: Duration, r: &QueryResult) {
            self.0.after_query(ctx, d, r)
        }
    }

    let engine = Arc::new(InMemoryEngine::default());
    let recorder = Arc::new(Recorder::default());
    let query = repository(
        "findByLastnameAndAgeGreaterThan",
        2,
        QueryMethodMetadata::new(),
        &engine,
    )
    .register(|_: &QueryMethod, q: &str, _: &[Value]| format!("{q} ORDER BY age DESC"))
    .with_hook(Shared(Arc::clone(&recorder)));

    let rows = query
        .execute(&[json!("Smith"), json!(30)], &Invocation::new())
        .unwrap();
    assert_eq!(rows[0].age, 67);

    let expected = "SELECT * FROM /People x WHERE x.lastname = $1 AND x.age > $2 ORDER BY age DESC";
    assert_eq!(*recorder.before.lock().unwrap(), vec![expected.to_string()]);
    assert_eq!(*recorder.after.lock().unwrap(), vec![QueryResult::Rows(3)]);
    assert_eq!(engine.queries()[0].0, expected);
}

#[test]
fn registration_errors_name_the_method() {
    let err = QueryMethod::new("findByShoeSize", 1, people(), QueryMethodMetadata::new())
        .unwrap_err();
    assert_eq!(err.method(), Some("findByShoeSize"));
    assert!(matches!(err.root(), OqlError::NoSuchProperty { .. }));

    let err = QueryMethod::new("findByLastnameTrue", 0, people(), QueryMethodMetadata::new())
        .unwrap_err();
    assert!(matches!(err.root(), OqlError::IncompatibleOperator { .. }));
}
