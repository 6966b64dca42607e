//! Registry of named units and SI prefixes.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use qel_core::QelError;
use regex::Regex;
use tracing::debug;

use crate::dimension::Dimensions;
use crate::error::UnitError;
use crate::unit::Unit;

const PREFIXES: &[(&str, i32)] = &[
    ("Y", 24),
    ("Z", 21),
    ("E", 18),
    ("P", 15),
    ("T", 12),
    ("G", 9),
    ("M", 6),
    ("k", 3),
    ("h", 2),
    ("da", 1),
    ("d", -1),
    ("c", -2),
    ("m", -3),
    ("μ", -6),
    ("u", -6),
    ("n", -9),
    ("p", -12),
    ("f", -15),
    ("a", -18),
    ("z", -21),
    ("y", -24),
];

/// Exponents in the order time, length, mass, current, temperature, amount,
/// luminosity.
const METRIC: &[(&str, f64, [i32; 7])] = &[
    ("s", 1.0, [1, 0, 0, 0, 0, 0, 0]),
    ("m", 1.0, [0, 1, 0, 0, 0, 0, 0]),
    ("g", 1.0, [0, 0, 1, 0, 0, 0, 0]),
    ("A", 1.0, [0, 0, 0, 1, 0, 0, 0]),
    ("K", 1.0, [0, 0, 0, 0, 1, 0, 0]),
    ("mol", 1.0, [0, 0, 0, 0, 0, 1, 0]),
    ("cd", 1.0, [0, 0, 0, 0, 0, 0, 1]),
    ("rad", 1.0, [0; 7]),
    ("sr", 1.0, [0; 7]),
    ("Hz", 1.0, [-1, 0, 0, 0, 0, 0, 0]),
    ("N", 1e3, [-2, 1, 1, 0, 0, 0, 0]),
    ("Pa", 1e3, [-2, -1, 1, 0, 0, 0, 0]),
    ("J", 1e3, [-2, 2, 1, 0, 0, 0, 0]),
    ("W", 1e3, [-3, 2, 1, 0, 0, 0, 0]),
    ("C", 1.0, [1, 0, 0, 1, 0, 0, 0]),
    ("V", 1e3, [-3, 2, 1, -1, 0, 0, 0]),
    ("F", 1e-3, [4, -2, -1, 2, 0, 0, 0]),
    ("Ohm", 1e3, [-3, 2, 1, -2, 0, 0, 0]),
    ("Ω", 1e3, [-3, 2, 1, -2, 0, 0, 0]),
    ("S", 1e-3, [3, -2, -1, 2, 0, 0, 0]),
    ("Wb", 1e3, [-2, 2, 1, -1, 0, 0, 0]),
    ("T", 1e3, [-2, 0, 1, -1, 0, 0, 0]),
    ("H", 1e3, [-2, 2, 1, -2, 0, 0, 0]),
    ("L", 1e-3, [0, 3, 0, 0, 0, 0, 0]),
    ("eV", 1.602_176_634e-16, [-2, 2, 1, 0, 0, 0, 0]),
];

/// Metric units that take no prefix.
const PLAIN: &[(&str, f64, [i32; 7])] = &[
    ("min", 60.0, [1, 0, 0, 0, 0, 0, 0]),
    ("h", 3_600.0, [1, 0, 0, 0, 0, 0, 0]),
    ("d", 86_400.0, [1, 0, 0, 0, 0, 0, 0]),
    ("au", 149_597_870_700.0, [0, 1, 0, 0, 0, 0, 0]),
];

const IMPERIAL: &[(&str, f64, [i32; 7])] = &[
    ("ft", 0.3048, [0, 1, 0, 0, 0, 0, 0]),
    ("in", 0.0254, [0, 1, 0, 0, 0, 0, 0]),
    ("yd", 0.9144, [0, 1, 0, 0, 0, 0, 0]),
    ("mi", 1_609.344, [0, 1, 0, 0, 0, 0, 0]),
    ("acre", 4_046.856_422_4, [0, 2, 0, 0, 0, 0, 0]),
    ("oz", 28.349_523_125, [0, 0, 1, 0, 0, 0, 0]),
    ("lb", 453.592_37, [0, 0, 1, 0, 0, 0, 0]),
];

static SHARED: OnceLock<Result<UnitSystem, UnitError>> = OnceLock::new();

/// Immutable table of units, built once and passed by reference.
#[derive(Debug, Clone)]
pub struct UnitSystem {
    prefixes: BTreeMap<String, i32>,
    metric: BTreeMap<String, Unit>,
    whole: BTreeMap<String, Unit>,
    token: Regex,
    magnitude: Regex,
}

fn table(entries: &[(&str, f64, [i32; 7])]) -> BTreeMap<String, Unit> {
    entries
        .iter()
        .map(|&(name, multiplier, dims)| {
            (name.to_string(), Unit::new(multiplier, Dimensions(dims)))
        })
        .collect()
}

/// Longest names first so alternation prefers them.
fn alternation<'a>(names: impl Iterator<Item = &'a String>) -> String {
    let mut names: Vec<&String> = names.collect();
    names.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()).then(a.cmp(b)));
    names
        .into_iter()
        .map(|name| regex::escape(name))
        .collect::<Vec<_>>()
        .join("|")
}

impl UnitSystem {
    /// SI units with prefixes, common non-SI metric units and imperial units.
    pub fn standard() -> Result<Self, UnitError> {
        let prefixes: BTreeMap<String, i32> = PREFIXES
            .iter()
            .map(|&(name, exp)| (name.to_string(), exp))
            .collect();
        let metric = table(METRIC);
        let mut whole = table(PLAIN);
        whole.extend(table(IMPERIAL));
        let pattern = format!(
            "^(?:(?P<whole>{})|(?P<prefix>{})?(?P<metric>{}))$",
            alternation(whole.keys()),
            alternation(prefixes.keys()),
            alternation(metric.keys()),
        );
        let registry = |err: regex::Error| UnitError::Registry {
            reason: err.to_string(),
        };
        let token = Regex::new(&pattern).map_err(registry)?;
        let magnitude =
            Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").map_err(registry)?;
        debug!(
            metric = metric.len(),
            whole = whole.len(),
            prefixes = prefixes.len(),
            "built unit registry"
        );
        Ok(Self {
            prefixes,
            metric,
            whole,
            token,
            magnitude,
        })
    }

    /// Process-wide standard registry, built on first use.
    pub fn shared() -> Result<&'static UnitSystem, QelError> {
        SHARED
            .get_or_init(UnitSystem::standard)
            .as_ref()
            .map_err(|err| err.clone().into())
    }

    /// Resolves one unit token such as `kN`, `μs`, `min` or `ft`.
    pub fn lookup(&self, token: &str) -> Option<Unit> {
        let caps = self.token.captures(token)?;
        if let Some(whole) = caps.name("whole") {
            return self.whole.get(whole.as_str()).copied();
        }
        let unit = *self.metric.get(caps.name("metric")?.as_str())?;
        match caps.name("prefix") {
            Some(prefix) => {
                let exp = *self.prefixes.get(prefix.as_str())?;
                Some(unit.scaled(10f64.powi(exp)))
            }
            None => Some(unit),
        }
    }

    /// Length in bytes of the leading magnitude literal of `text`, if any.
    pub(crate) fn magnitude_len(&self, text: &str) -> Option<usize> {
        self.magnitude.find(text).map(|m| m.end())
    }
}
