//! Integration tests for the plugin lifecycle and exposed properties

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use modelstore_core::middleware::from_fn;
use modelstore_core::{Action, Hook, Middleware, Model, StoreError};
use modelstore_runtime::{
    init, ActionReducer, Bag, Exposed, InitConfig, Plugin, ReduxConfig, Store,
};
use modelstore_testing::{init_tracing, test_store, HookCall, RecordingPlugin};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// ============================================================================
// Test Fixtures
// ============================================================================

fn count() -> Model {
    Model::new("count", json!(0)).reducer("increment", |state, payload| {
        Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(1)))
    })
}

/// Middleware that appends `label` to a shared journal for every action
fn journaling(label: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Arc<dyn Middleware> {
    let journal = Arc::clone(journal);
    Arc::new(from_fn(move |_api, action, next| {
        journal.lock().unwrap().push(label.to_string());
        next.run(action)
    }))
}

// ============================================================================
// Hook ordering
// ============================================================================

#[test]
fn hooks_run_in_registration_order() {
    init_tracing();
    let first = RecordingPlugin::new("first");
    let second = RecordingPlugin::new("second");
    let store = test_store(
        vec![count(), Model::new("todos", json!([]))],
        vec![first.plugin(), second.plugin()],
    );

    assert_eq!(
        first.calls(),
        vec![
            HookCall::CreateMiddleware(1),
            HookCall::OnReducer("count".into()),
            HookCall::OnReducer("todos".into()),
            HookCall::OnModel { model: "count".into(), store: store.name().to_string() },
            HookCall::OnModel { model: "todos".into(), store: store.name().to_string() },
            HookCall::OnStoreCreated(store.name().to_string()),
        ]
    );
    // The second plugin's middleware sees effects + first plugin's middleware
    assert_eq!(second.calls()[0], HookCall::CreateMiddleware(2));
    assert_eq!(second.models_seen(), vec!["count".to_string(), "todos".to_string()]);
}

#[test]
fn on_model_fires_for_added_models() {
    let recorder = RecordingPlugin::new("recorder");
    let store = test_store(vec![count()], vec![recorder.plugin()]);
    store.add_model(Model::new("todos", json!([]))).unwrap();

    assert_eq!(recorder.models_seen(), vec!["count".to_string(), "todos".to_string()]);
    assert!(recorder.calls().contains(&HookCall::OnReducer("todos".into())));
}

#[test]
fn on_model_sees_a_dispatch_capable_store() {
    let plugin = Plugin::new("warmup").on_model(|model, store| {
        if model.name() == "count" {
            store.dispatch_to("count", "increment", Some(json!(10)))?;
        }
        Ok(())
    });
    let store = test_store(vec![count()], vec![plugin]);
    assert_eq!(store.get_state()["count"], json!(10));
}

// ============================================================================
// Middleware order
// ============================================================================

#[test]
fn middleware_order_is_effects_plugins_passthrough() {
    let journal = Arc::new(Mutex::new(Vec::new()));
    let effect_journal = Arc::clone(&journal);

    let model = count().effect("ping", move |_payload, _root| {
        effect_journal.lock().unwrap().push("effect".to_string());
        Ok(json!("pong"))
    });
    let plugin_a = {
        let journal = Arc::clone(&journal);
        Plugin::new("a").create_middleware(move |_bag: &Bag| Ok(journaling("plugin-a", &journal)))
    };
    let plugin_b = {
        let journal = Arc::clone(&journal);
        Plugin::new("b").create_middleware(move |_bag: &Bag| Ok(journaling("plugin-b", &journal)))
    };
    let mut redux = ReduxConfig::new();
    redux.middlewares.push(journaling("passthrough", &journal));

    let store = init(
        InitConfig::new()
            .with_model(model)
            .with_plugin(plugin_a)
            .with_plugin(plugin_b)
            .with_redux(redux),
    )
    .unwrap();

    let result = store.dispatch_to("count", "ping", None).unwrap();
    assert_eq!(result.as_value(), Some(&json!("pong")));
    assert_eq!(
        *journal.lock().unwrap(),
        vec!["plugin-a", "plugin-b", "passthrough", "effect"]
    );
}

#[test]
fn plugin_middleware_can_wrap_effect_results() {
    // Plugin middleware sits inside the effects middleware, so it sees the
    // reducer-phase result, never the effect's
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let plugin = Plugin::new("inspect").with_middleware(from_fn(move |_api, action, next| {
        let result = next.run(action)?;
        sink.lock().unwrap().push(result.as_action().is_some());
        Ok(result)
    }));
    let model = count().effect("ping", |_payload, _root| Ok(json!("pong")));
    let store = test_store(vec![model], vec![plugin]);

    let result = store.dispatch_to("count", "ping", None).unwrap();
    assert_eq!(result.as_value(), Some(&json!("pong")));
    assert_eq!(*seen.lock().unwrap(), vec![true]);
}

// ============================================================================
// Store replacement
// ============================================================================

#[test]
fn on_store_created_replacement_chain() {
    let received = Arc::new(Mutex::new(Vec::new()));
    let replacer = Plugin::new("replacer").on_store_created(|store, _bag| {
        Ok(Some(store.derive("replaced")))
    });
    let observer = {
        let received = Arc::clone(&received);
        Plugin::new("observer").on_store_created(move |store, _bag| {
            received.lock().unwrap().push(store.name().to_string());
            Ok(None)
        })
    };

    let store = init(
        InitConfig::new()
            .with_name("original")
            .with_model(count())
            .with_plugin(replacer)
            .with_plugin(observer),
    )
    .unwrap();

    assert_eq!(store.name(), "replaced");
    assert_eq!(*received.lock().unwrap(), vec!["replaced".to_string()]);

    // The replacement is a full store over the same state
    store.dispatch_to("count", "increment", Some(json!(2))).unwrap();
    assert_eq!(store.get_state()["count"], json!(2));
}

#[test]
fn later_replacement_wins() {
    let first = Plugin::new("first").on_store_created(|store, _bag| Ok(Some(store.derive("one"))));
    let second = Plugin::new("second").on_store_created(|store, _bag| {
        assert_eq!(store.name(), "one");
        Ok(Some(store.derive("two")))
    });
    let store = test_store(vec![count()], vec![first, second]);
    assert_eq!(store.name(), "two");
}

#[test]
fn replacement_can_add_properties() {
    let plugin = Plugin::new("extend").on_store_created(|store, _bag| {
        let replacement = store.derive(format!("{}-extended", store.name()));
        replacement.expose("version", Exposed::Value(Arc::new(json!("2.0"))));
        Ok(Some(replacement))
    });
    let store = init(InitConfig::new().with_name("app").with_plugin(plugin)).unwrap();

    assert_eq!(store.name(), "app-extended");
    assert_eq!(store.exposed_value("version").unwrap(), json!("2.0"));
}

// ============================================================================
// Exposed properties
// ============================================================================

#[test]
fn exposed_function_receives_the_current_store() {
    let plugin = Plugin::new("describe")
        .expose_fn("describe", |store, args| {
            Ok(json!({ "store": store.name(), "args": args }))
        })
        .on_store_created(|store, _bag| Ok(Some(store.derive("final"))));

    let captured: Arc<Mutex<Option<Store>>> = Arc::new(Mutex::new(None));
    let capture = {
        let captured = Arc::clone(&captured);
        Plugin::new("capture").on_model(move |_model, store| {
            *captured.lock().unwrap() = Some(store.clone());
            Ok(())
        })
    };

    let store = init(
        InitConfig::new()
            .with_name("initial")
            .with_model(count())
            .with_plugin(capture)
            .with_plugin(plugin),
    )
    .unwrap();

    let expected = json!({ "store": "final", "args": [1, 2] });
    assert_eq!(store.call("describe", vec![json!(1), json!(2)]).unwrap(), expected);

    // Called through the pre-replacement facade, still bound to the current store
    let early = captured.lock().unwrap().clone().unwrap();
    assert_eq!(early.name(), "initial");
    assert_eq!(early.call("describe", vec![json!(1), json!(2)]).unwrap(), expected);
}

#[test]
fn exposed_function_falls_back_to_caller() {
    let plugin = Plugin::new("name").expose_fn("name", |store, _args| Ok(json!(store.name())));
    let replaced_away = Plugin::new("swap").on_store_created(|store, _bag| Ok(Some(store.derive("gone"))));

    let original = Arc::new(Mutex::new(None));
    let keep = {
        let original = Arc::clone(&original);
        Plugin::new("keep").on_store_created(move |store: &Store, _bag: &Bag| {
            *original.lock().unwrap() = Some(store.clone());
            Ok(None)
        })
    };

    let store = init(
        InitConfig::new()
            .with_name("kept")
            .with_plugin(plugin)
            .with_plugin(keep)
            .with_plugin(replaced_away),
    )
    .unwrap();
    let kept = original.lock().unwrap().take().unwrap();
    assert_eq!(kept.call("name", vec![]).unwrap(), json!("gone"));

    // Once the current store is dropped, calls use the calling store
    drop(store);
    assert_eq!(kept.call("name", vec![]).unwrap(), json!("kept"));
}

#[test]
fn exposed_collisions_last_plugin_wins() {
    let store = test_store(
        vec![],
        vec![
            Plugin::new("a").expose_value("flag", json!("a")),
            Plugin::new("b").expose_value("flag", json!("b")),
        ],
    );
    assert_eq!(store.exposed_value("flag").unwrap(), json!("b"));
}

#[test]
fn exposed_function_errors_are_wrapped() {
    let plugin = Plugin::new("broken").expose_fn("explode", |_store, _args| {
        Err(anyhow::anyhow!("kaboom"))
    });
    let store = test_store(vec![], vec![plugin]);
    let err = store.call("explode", vec![]).unwrap_err();
    assert_eq!(err.to_string(), "exposed function `explode` failed: kaboom");
}

#[test]
fn exposed_function_can_dispatch() {
    let plugin = Plugin::new("shortcuts").expose_fn("bump", |store, args| {
        let amount = args.first().cloned().unwrap_or(json!(1));
        store.dispatch_to("count", "increment", Some(amount))?;
        Ok(store.get_state()["count"].clone())
    });
    let store = test_store(vec![count()], vec![plugin]);
    assert_eq!(store.call("bump", vec![json!(3)]).unwrap(), json!(3));
    assert_eq!(store.call("bump", vec![]).unwrap(), json!(4));
}

// ============================================================================
// Reducer enhancers
// ============================================================================

#[test]
fn on_reducer_wraps_initial_and_added_models() {
    let wrapped = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&wrapped);
    let plugin = Plugin::new("clamp").on_reducer(move |reducer: ActionReducer, _model: &str, _bag: &Bag| {
        counter.fetch_add(1, Ordering::SeqCst);
        let clamped: ActionReducer = Arc::new(move |state: Value, action: &Action| -> anyhow::Result<Value> {
            let next = reducer(state, action)?;
            Ok(match next.as_i64() {
                Some(n) => json!(n.min(10)),
                None => next,
            })
        });
        Ok(Some(clamped))
    });
    let store = test_store(vec![count()], vec![plugin]);
    store.add_model(count_named("other")).unwrap();

    store.dispatch_to("count", "increment", Some(json!(50))).unwrap();
    store.dispatch_to("other", "increment", Some(json!(50))).unwrap();
    assert_eq!(store.get_state(), json!({ "count": 10, "other": 10 }));
    assert_eq!(wrapped.load(Ordering::SeqCst), 2);
}

fn count_named(name: &str) -> Model {
    Model::new(name, json!(0)).reducer("increment", |state, payload| {
        Ok(json!(state.as_i64().unwrap_or(0) + payload.as_i64().unwrap_or(1)))
    })
}

// ============================================================================
// Hook failures
// ============================================================================

#[test]
fn failing_hooks_abort_construction() {
    let cases = vec![
        (
            Plugin::new("mw").create_middleware(|_bag| Err(anyhow::anyhow!("no"))),
            Hook::CreateMiddleware,
        ),
        (
            Plugin::new("model").on_model(|_model, _store| Err(anyhow::anyhow!("no"))),
            Hook::OnModel,
        ),
        (
            Plugin::new("created").on_store_created(|_store, _bag| Err(anyhow::anyhow!("no"))),
            Hook::OnStoreCreated,
        ),
        (
            Plugin::new("reducer").on_reducer(|_reducer, _model, _bag| Err(anyhow::anyhow!("no"))),
            Hook::OnReducer,
        ),
    ];

    for (plugin, expected) in cases {
        let name = plugin.name().to_string();
        let err = init(InitConfig::new().with_model(count()).with_plugin(plugin)).unwrap_err();
        match err {
            StoreError::PluginHook { plugin, hook, .. } => {
                assert_eq!(plugin, name);
                assert_eq!(hook, expected);
            },
            other => panic!("expected a plugin hook error, got {other}"),
        }
    }
}

#[test]
fn later_plugins_do_not_run_after_a_failure() {
    let recorder = RecordingPlugin::new("after");
    let failing = Plugin::new("failing").on_store_created(|_store, _bag| Err(anyhow::anyhow!("stop")));
    let result = init(
        InitConfig::new()
            .with_model(count())
            .with_plugin(failing)
            .with_plugin(recorder.plugin()),
    );

    assert!(result.is_err());
    assert!(!recorder
        .calls()
        .iter()
        .any(|call| matches!(call, HookCall::OnStoreCreated(_))));
}
