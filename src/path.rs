use serde_json::{Map, Value};

/// Key into a configuration tree.
///
/// A dotted key such as `"route.domain"` descends one mapping per segment.
/// A segment list addresses the same tree without splitting on dots, which
/// lets callers reach keys that themselves contain a `.`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigKey {
    Dotted(String),
    Segments(Vec<String>),
}

impl ConfigKey {
    pub fn segments(&self) -> Vec<&str> {
        match self {
            ConfigKey::Dotted(s) => s.split('.').collect(),
            ConfigKey::Segments(v) => v.iter().map(String::as_str).collect(),
        }
    }
}

impl From<&str> for ConfigKey {
    fn from(s: &str) -> Self {
        ConfigKey::Dotted(s.to_string())
    }
}

impl From<String> for ConfigKey {
    fn from(s: String) -> Self {
        ConfigKey::Dotted(s)
    }
}

impl From<&[&str]> for ConfigKey {
    fn from(v: &[&str]) -> Self {
        ConfigKey::Segments(v.iter().map(|s| s.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for ConfigKey {
    fn from(v: [&str; N]) -> Self {
        ConfigKey::Segments(v.iter().map(|s| s.to_string()).collect())
    }
}

impl From<Vec<String>> for ConfigKey {
    fn from(v: Vec<String>) -> Self {
        ConfigKey::Segments(v)
    }
}

/// Look up `key` in a mapping.
///
/// A dotted key that exists verbatim at the top level wins over descent, so
/// `{"a.b": 1}` answers `"a.b"` with `1`. Arrays are indexed by numeric
/// segments. Any missing segment yields `None`.
pub fn get<'a>(map: &'a Map<String, Value>, key: &ConfigKey) -> Option<&'a Value> {
    if let ConfigKey::Dotted(full) = key {
        if let Some(v) = map.get(full.as_str()) {
            return Some(v);
        }
    }

    let mut segments = key.segments().into_iter();
    let first = segments.next()?;
    let mut cur = map.get(first)?;
    for seg in segments {
        cur = step(cur, seg)?;
    }
    Some(cur)
}

fn step<'a>(cur: &'a Value, seg: &str) -> Option<&'a Value> {
    match cur {
        Value::Object(m) => m.get(seg),
        Value::Array(a) => seg.parse::<usize>().ok().and_then(|i| a.get(i)),
        _ => None,
    }
}

/// Write `value` at a dotted `key`, creating intermediate mappings and
/// replacing any non-mapping found on the way.
pub fn set(map: &mut Map<String, Value>, key: &str, value: Value) {
    let mut segments: Vec<&str> = key.split('.').collect();
    let last = match segments.pop() {
        Some(last) => last,
        None => return,
    };

    let mut cur = map;
    for seg in segments {
        let slot = cur
            .entry(seg.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        cur = match slot {
            Value::Object(m) => m,
            _ => return,
        };
    }
    cur.insert(last.to_string(), value);
}

/// Loose truthiness of a settings value.
///
/// `null`, `false`, `0`, `0.0`, `""`, `"0"` and empty arrays or mappings are
/// false. Everything else is true.
pub fn is_truthy(v: &Value) -> bool {
    match v {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Value::String(s) => !(s.is_empty() || s == "0"),
        Value::Array(a) => !a.is_empty(),
        Value::Object(m) => !m.is_empty(),
    }
}

/// Coerce a loaded configuration into a mapping; anything else is empty.
pub fn into_mapping(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn sample() -> Map<String, Value> {
        into_mapping(json!({
            "route": { "domain": "shop.test", "prefix": "admin" },
            "menu": [ { "title": "Home" }, { "title": "Users" } ],
            "auth.guard": "web",
            "title": "Admin"
        }))
    }

    #[test]
    fn nested_lookup() {
        let cfg = sample();
        assert_eq!(get(&cfg, &"route.domain".into()), Some(&json!("shop.test")));
        assert_eq!(get(&cfg, &"title".into()), Some(&json!("Admin")));
        assert_eq!(get(&cfg, &"menu.1.title".into()), Some(&json!("Users")));
    }

    #[test]
    fn missing_segments_are_none() {
        let cfg = sample();
        assert_eq!(get(&cfg, &"route.missing".into()), None);
        assert_eq!(get(&cfg, &"title.deeper".into()), None);
        assert_eq!(get(&cfg, &"menu.9".into()), None);
        assert_eq!(get(&cfg, &"".into()), None);
    }

    #[test]
    fn verbatim_dotted_key_wins() {
        let cfg = sample();
        assert_eq!(get(&cfg, &"auth.guard".into()), Some(&json!("web")));
        // segments never fall back to the verbatim key
        assert_eq!(get(&cfg, &["auth", "guard"].into()), None);
    }

    #[test]
    fn set_creates_and_replaces() {
        let mut cfg = sample();
        set(&mut cfg, "title.sub", json!(1));
        set(&mut cfg, "a.b.c", json!(true));
        assert_eq!(get(&cfg, &"title.sub".into()), Some(&json!(1)));
        assert_eq!(get(&cfg, &"a.b.c".into()), Some(&json!(true)));
    }

    #[test]
    fn truthiness() {
        for falsy in [json!(null), json!(false), json!(0), json!(0.0), json!(""), json!("0"), json!([]), json!({})] {
            assert!(!is_truthy(&falsy), "{falsy} should be falsy");
        }
        for truthy in [json!(true), json!(1), json!(-2), json!("no"), json!([0]), json!({"a": 0})] {
            assert!(is_truthy(&truthy), "{truthy} should be truthy");
        }
    }
}
