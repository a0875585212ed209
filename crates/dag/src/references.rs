use once_cell::sync::Lazy;
use regex::Regex;
use resources::Address;
use serde_json::Value;
use std::collections::BTreeSet;

// `$${` is the engine's escape for a literal `${`, captured so it can be skipped.
static INTERPOLATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$?)\$\{(data\.)?([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_-]*)")
        .expect("valid interpolation regex")
});

/// Addresses of every descriptor interpolated anywhere inside `body`.
pub fn extract_references(body: &Value) -> BTreeSet<Address> {
    let mut found = BTreeSet::new();
    collect(body, &mut found);
    found
}

fn collect(value: &Value, found: &mut BTreeSet<Address>) {
    match value {
        Value::String(s) => scan(s, found),
        Value::Array(items) => items.iter().for_each(|v| collect(v, found)),
        Value::Object(map) => map.values().for_each(|v| collect(v, found)),
        _ => {}
    }
}

fn scan(raw: &str, found: &mut BTreeSet<Address>) {
    for caps in INTERPOLATION.captures_iter(raw) {
        if !caps[1].is_empty() {
            continue;
        }
        let kind = &caps[3];
        let name = &caps[4];
        let address = if caps.get(2).is_some() {
            Address::data(kind, name)
        } else {
            Address::resource(kind, name)
        };
        found.insert(address);
    }
}
