//! Autocomplete Widget
//!
//! This example drives three cooperating machines (search box, dropdown and
//! highlight) the way an autocomplete input would, with an asynchronous
//! in-memory search standing in for a remote API.
//!
//! Key concepts:
//! - Broadcast and scoped events
//! - Entry actions that merge into the shared context
//! - Re-entrant sends from actions
//! - Guards on the highlight machine
//! - Deferred sends from a spawned task
//!
//! Run with: cargo run --example autocomplete

use ministate::builder::ConfigBuilder;
use ministate::core::{Event, GuardParams};
use ministate::runtime::{ActionParams, ContextListener, Machine, StateListener};
use serde_json::{json, Value};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

const MACHINES: &str = r#"[
    {
        "id": "searchBox",
        "initial": "initial",
        "states": {
            "initial": { "entry": ["resetSearch"], "on": { "INPUT": "searching" } },
            "searching": {
                "entry": ["setQuery", "search"],
                "on": { "FETCHED": "success", "INPUT": "searching", "RESET_SEARCH": "initial" }
            },
            "success": {
                "entry": ["setHits", "openOrCloseDropdown"],
                "on": { "INPUT": "searching", "RESET_SEARCH": "initial" }
            }
        }
    },
    {
        "id": "dropdown",
        "initial": "closed",
        "states": {
            "closed": { "on": { "OPEN": "opened", "ESCAPE": "reset" } },
            "opened": { "on": { "CLOSE": "closed", "ESCAPE": "closed" } },
            "reset": {
                "entry": ["resetEverything", "redirectToClosed"],
                "on": { "REDIRECT_TO_CLOSED": "closed" }
            }
        }
    },
    {
        "id": "highlight",
        "initial": "none",
        "states": {
            "none": {
                "entry": ["resetHighlightedIndex"],
                "on": {
                    "HIGHLIGHT_NEXT": { "target": "highlighted", "cond": "hasHits" },
                    "HIGHLIGHT_PREV": { "target": "highlighted", "cond": "hasHits" },
                    "HIGHLIGHT_SPECIFIC_INDEX": "highlighted"
                }
            },
            "highlighted": {
                "entry": ["updateHighlightedIndex"],
                "on": {
                    "HIGHLIGHT_NEXT": "highlighted",
                    "HIGHLIGHT_PREV": "highlighted",
                    "HIGHLIGHT_SPECIFIC_INDEX": "highlighted",
                    "RESET_HIGHLIGHT": "none"
                }
            }
        }
    }
]"#;

const PRODUCTS: [&str; 5] = [
    "Apple iPhone XR",
    "Apple iPhone 11 Pro",
    "Apple iPad Air",
    "Samsung Galaxy S10",
    "Google Pixel 4",
];

async fn search(query: String) -> Vec<Value> {
    tokio::time::sleep(Duration::from_millis(30)).await;
    let query = query.to_lowercase();
    PRODUCTS
        .iter()
        .filter(|name| !query.is_empty() && name.to_lowercase().contains(&query))
        .map(|name| json!({ "name": name }))
        .collect()
}

fn field<'a>(data: Option<&'a Value>, key: &str) -> Option<&'a Value> {
    data.and_then(|data| data.get(key))
}

fn hit_count(params: &ActionParams<'_>) -> i64 {
    params
        .context
        .get("hits")
        .and_then(Value::as_array)
        .map_or(0, |hits| hits.len() as i64)
}

fn update_highlighted_index(params: &ActionParams<'_>) {
    let hits = hit_count(params);
    let current = params
        .context
        .get("highlightedIndex")
        .and_then(Value::as_i64);

    let next = if let Some(index) = field(params.data, "specificIndex") {
        index.clone()
    } else {
        let wrapped = match (current, params.event_type) {
            (None, _) => Some(0),
            (Some(index), "HIGHLIGHT_NEXT") if index + 1 < hits => Some(index + 1),
            (Some(_), "HIGHLIGHT_NEXT") => Some(0),
            (Some(index), "HIGHLIGHT_PREV") if index > 0 => Some(index - 1),
            (Some(_), "HIGHLIGHT_PREV") => Some(hits - 1),
            _ => None,
        };
        wrapped.map_or(Value::Null, Value::from)
    };
    params.set_context([("highlightedIndex".to_string(), next)]);
}

fn build() -> Result<Machine, Box<dyn std::error::Error>> {
    let config = ConfigBuilder::new()
        .context(json!({ "query": null, "hits": [], "highlightedIndex": null }))
        .machines_json(MACHINES)?
        .action("resetSearch", |p: &ActionParams<'_>| {
            p.set_context([
                ("hits".to_string(), json!([])),
                ("query".to_string(), Value::Null),
            ]);
        })
        .action("setQuery", |p: &ActionParams<'_>| {
            let query = field(p.data, "query").cloned().unwrap_or_default();
            p.set_context([("query".to_string(), query)]);
        })
        .action("search", |p: &ActionParams<'_>| {
            let query = field(p.data, "query")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let handle = p.handle();
            // Responses are not de-duplicated; a slow stale search can land
            // after a newer one.
            tokio::spawn(async move {
                let hits = search(query).await;
                if let Err(error) = handle.send(Event::with_data("FETCHED", json!({ "hits": hits }))) {
                    tracing::error!(%error, "failed to deliver search results");
                }
            });
        })
        .action("setHits", |p: &ActionParams<'_>| {
            let hits = field(p.data, "hits").cloned().unwrap_or_else(|| json!([]));
            p.set_context([("hits".to_string(), hits)]);
        })
        .action("openOrCloseDropdown", |p: &ActionParams<'_>| {
            let has_hits = field(p.data, "hits")
                .and_then(Value::as_array)
                .is_some_and(|hits| !hits.is_empty());
            let event = if has_hits { "dropdown.OPEN" } else { "dropdown.CLOSE" };
            if let Err(error) = p.send(event) {
                tracing::error!(%error, "failed to toggle dropdown");
            }
        })
        .action("resetHighlightedIndex", |p: &ActionParams<'_>| {
            p.set_context([("highlightedIndex".to_string(), Value::Null)]);
        })
        .action("updateHighlightedIndex", update_highlighted_index)
        .action("resetEverything", |p: &ActionParams<'_>| {
            for event in ["RESET_SEARCH", "RESET_HIGHLIGHT"] {
                if let Err(error) = p.send(event) {
                    tracing::error!(%error, event, "reset failed");
                }
            }
        })
        .action("redirectToClosed", |p: &ActionParams<'_>| {
            if let Err(error) = p.send("REDIRECT_TO_CLOSED") {
                tracing::error!(%error, "redirect failed");
            }
        })
        .guard("hasHits", |p: &GuardParams<'_>| {
            p.context
                .get("hits")
                .and_then(Value::as_array)
                .is_some_and(|hits| !hits.is_empty())
        })
        .build()?;

    Ok(Machine::new(config)?)
}

fn render(machine: &Machine) {
    let context = machine.context();
    let state = machine.state();
    println!("  state: {state:?}");
    println!(
        "  query: {}  highlighted: {}",
        context["query"], context["highlightedIndex"]
    );
    if state.get("dropdown").map(String::as_str) == Some("opened") {
        if let Some(hits) = context["hits"].as_array() {
            for (i, hit) in hits.iter().enumerate() {
                let marker = if context["highlightedIndex"].as_u64() == Some(i as u64) {
                    ">"
                } else {
                    " "
                };
                println!("   {marker} {}", hit["name"]);
            }
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== Autocomplete ===\n");

    let machine = build()?;
    machine
        .listen()
        .on_state_change(Some(StateListener::new(|next, prev| {
            for (id, state) in next {
                if prev.get(id) != Some(state) {
                    println!("  [{id}] {} -> {state}", prev[id]);
                }
            }
        })));
    machine
        .listen()
        .on_context_change(Some(ContextListener::new(|next, prev| {
            for (key, value) in next {
                if prev.get(key) != Some(value) {
                    println!("  context.{key} = {value}");
                }
            }
        })));

    println!("Typing \"apple\":");
    machine.send(Event::with_data("INPUT", json!({ "query": "apple" })))?;
    tokio::time::sleep(Duration::from_millis(100)).await;
    render(&machine);

    println!("\nArrow down twice, then arrow up:");
    machine.send("HIGHLIGHT_NEXT")?;
    machine.send("HIGHLIGHT_NEXT")?;
    machine.send("HIGHLIGHT_PREV")?;
    render(&machine);

    println!("\nHovering the third result:");
    machine.send(Event::with_data(
        "HIGHLIGHT_SPECIFIC_INDEX",
        json!({ "specificIndex": 2 }),
    ))?;
    render(&machine);

    println!("\nEscape closes the dropdown:");
    machine.send("dropdown.ESCAPE")?;
    render(&machine);

    println!("\nEscape again resets everything:");
    machine.send("dropdown.ESCAPE")?;
    render(&machine);

    println!("\n=== Example Complete ===");
    Ok(())
}
