//! Demo records the fixtures exercise.
use std::sync::Once;

use json_keymap::{json, keymap_serde, Converter, Field, KeyMap, Kind, Record};
use once_cell::sync::Lazy;
use serde_json::Value;

// ————————————————————————————————————————————————————————————————————————————
// RECORDS
// ————————————————————————————————————————————————————————————————————————————

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Status {
    pub code: i64,
    pub reason: Option<String>,
}

impl Record for Status {
    fn key_map() -> &'static KeyMap<Self> {
        static MAP: Lazy<KeyMap<Status>> = Lazy::new(|| {
            KeyMap::<Status>::new()
                .value(["code", "status", "c"], |s| &s.code, |s, v| s.code = v)
                .optional(["reason", "message", "meta.reason"], |s| s.reason.as_ref(), |s, v| s.reason = Some(v))
        });
        &MAP
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Versioned {
    pub status: Status,
    pub version: u32,
}

impl Record for Versioned {
    fn key_map() -> &'static KeyMap<Self> {
        static MAP: Lazy<KeyMap<Versioned>> = Lazy::new(|| {
            KeyMap::extending(|v: &Versioned| &v.status, |v| &mut v.status)
                .value("version", |v| &v.version, |v, x| v.version = x)
        });
        &MAP
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Account {
    pub id: u64,
    pub name: String,
    pub email: Option<String>,
    pub active: bool,
}

/// `"on"` / `"off"` switches, which the built-in table does not know.
static SWITCH_WORDS: fn(&Value, Kind) -> Option<Value> = |node, target| match (node.as_str()?, target) {
    ("on", Kind::Bool) => Some(Value::Bool(true)),
    ("off", Kind::Bool) => Some(Value::Bool(false)),
    _ => None,
};

impl Record for Account {
    fn key_map() -> &'static KeyMap<Self> {
        static MAP: Lazy<KeyMap<Account>> = Lazy::new(|| {
            KeyMap::<Account>::new()
                .field(Field::value("id", |a: &Account| &a.id, |a, v| a.id = v).nonnull(true))
                .value(["profile.name", "name"], |a| &a.name, |a, v| a.name = v)
                .optional("profile.contact.email", |a| a.email.as_ref(), |a, v| a.email = Some(v))
                .value(["active", "enabled"], |a| &a.active, |a, v| a.active = v)
        });
        &MAP
    }

    fn converter() -> Option<&'static dyn Converter> {
        Some(&SWITCH_WORDS)
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Team {
    pub name: String,
    pub members: Vec<Account>,
    pub lead: Option<Account>,
}

impl Record for Team {
    fn key_map() -> &'static KeyMap<Self> {
        static MAP: Lazy<KeyMap<Team>> = Lazy::new(|| {
            KeyMap::<Team>::new()
                .value("name", |t| &t.name, |t, v| t.name = v)
                .value("members", |t| &t.members, |t, v| t.members = v)
                .optional("lead", |t| t.lead.as_ref(), |t, v| t.lead = Some(v))
        });
        &MAP
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Reading {
    pub sensor: String,
    pub value: f64,
    pub unit: Option<String>,
    pub tags: Vec<String>,
}

impl Record for Reading {
    const THROWS: bool = true;

    fn key_map() -> &'static KeyMap<Self> {
        static MAP: Lazy<KeyMap<Reading>> = Lazy::new(|| {
            KeyMap::<Reading>::new()
                .value(["sensor", "id"], |r| &r.sensor, |r, v| r.sensor = v)
                .value(["value", "v"], |r| &r.value, |r, v| r.value = v)
                .optional("unit", |r| r.unit.as_ref(), |r, v| r.unit = Some(v))
                .value("tags", |r| &r.tags, |r, v| r.tags = v)
        });
        &MAP
    }
}

keymap_serde!(Status, Account);

// ————————————————————————————————————————————————————————————————————————————
// CONVERTERS
// ————————————————————————————————————————————————————————————————————————————

/// Numbers written with a trailing unit, e.g. `"70.5F"` or `"21°C"`.
fn strip_unit(node: &Value, target: Kind) -> Option<Value> {
    let Kind::Float(_) = target else { return None };
    let number = node
        .as_str()?
        .trim_end_matches(|c: char| c.is_alphabetic() || c == '°')
        .trim();
    let parsed: f64 = number.parse().ok()?;
    parsed.is_finite().then(|| serde_json::json!(parsed))
}

static INSTALL: Once = Once::new();

/// Register the runner's process-wide converters. Idempotent.
pub fn install_converters() {
    INSTALL.call_once(|| json_keymap::register(strip_unit));
}

// ————————————————————————————————————————————————————————————————————————————
// LOOKUP
// ————————————————————————————————————————————————————————————————————————————

pub type RoundTrip = fn(&Value) -> json_keymap::Result<Value>;

fn round_trip<R: Record>(input: &Value) -> json_keymap::Result<Value> {
    let record: R = json::from_value(input)?;
    json::to_value(&record)
}

const RECORDS: &[(&str, RoundTrip)] = &[
    ("status", round_trip::<Status> as RoundTrip),
    ("versioned", round_trip::<Versioned> as RoundTrip),
    ("account", round_trip::<Account> as RoundTrip),
    ("team", round_trip::<Team> as RoundTrip),
    ("reading", round_trip::<Reading> as RoundTrip),
];

pub fn names() -> impl Iterator<Item = &'static str> {
    RECORDS.iter().map(|(name, _)| *name)
}

pub fn lookup(name: &str) -> Option<RoundTrip> {
    RECORDS.iter().find(|(n, _)| *n == name).map(|(_, f)| *f)
}
