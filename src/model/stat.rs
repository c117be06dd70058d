//! Stat identifiers and fixed-size per-stat containers.
//!
//! Every collection keyed by stat uses [`StatMap`], which always holds exactly
//! one value per stat and iterates in the canonical order
//! speed, stamina, power, guts, wit. Serialized form is a JSON object keyed by
//! the lowercase stat name, matching the profile and run-state files.

use anyhow::{anyhow, bail, Result};
use regex::Regex;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;
use std::sync::LazyLock;

/// Game stat ceiling. A reading above this is always a misread.
pub const MAX_STAT_VALUE: u32 = 1200;

/// Matches `name=value` / `name: value` pairs in manual stat entry.
static STAT_PAIR_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(speed|stamina|power|guts|wit)\s*[=:]\s*(\S+)").expect("valid stat regex")
});

/// One of the five trainable stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stat {
    Speed,
    Stamina,
    Power,
    Guts,
    Wit,
}

impl Stat {
    /// All stats in canonical order. Tie-breaks everywhere follow this order.
    pub const ALL: [Stat; 5] = [Stat::Speed, Stat::Stamina, Stat::Power, Stat::Guts, Stat::Wit];

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Lowercase name used in files and on the command line.
    pub fn name(self) -> &'static str {
        match self {
            Stat::Speed => "speed",
            Stat::Stamina => "stamina",
            Stat::Power => "power",
            Stat::Guts => "guts",
            Stat::Wit => "wit",
        }
    }

    /// Capitalized name for human-facing output.
    pub fn label(self) -> &'static str {
        match self {
            Stat::Speed => "Speed",
            Stat::Stamina => "Stamina",
            Stat::Power => "Power",
            Stat::Guts => "Guts",
            Stat::Wit => "Wit",
        }
    }
}

impl fmt::Display for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let lower = s.trim().to_ascii_lowercase();
        Stat::ALL
            .into_iter()
            .find(|stat| stat.name() == lower)
            .ok_or_else(|| {
                anyhow!(
                    "unknown stat '{}' (expected one of speed, stamina, power, guts, wit)",
                    s.trim()
                )
            })
    }
}

/// Exactly one `T` per stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StatMap<T>([T; 5]);

/// A confirmed or scanned reading of all five stats.
pub type StatSnapshot = StatMap<u32>;

/// Target value per stat for a trainee.
pub type IdealStats = StatMap<u32>;

impl<T> StatMap<T> {
    pub const fn new(values: [T; 5]) -> Self {
        Self(values)
    }

    pub fn from_fn(mut f: impl FnMut(Stat) -> T) -> Self {
        Self(Stat::ALL.map(&mut f))
    }

    /// Iterate `(stat, value)` pairs in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Stat, &T)> {
        Stat::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> &[T; 5] {
        &self.0
    }

    pub fn map<U>(&self, mut f: impl FnMut(Stat, &T) -> U) -> StatMap<U> {
        StatMap::from_fn(|stat| f(stat, &self.0[stat.index()]))
    }
}

impl StatMap<u32> {
    /// Build a snapshot, rejecting any value above [`MAX_STAT_VALUE`].
    pub fn checked(values: [u32; 5]) -> Result<Self> {
        let snapshot = Self(values);
        for (stat, &value) in snapshot.iter() {
            if value > MAX_STAT_VALUE {
                bail!(
                    "{} value {} exceeds the stat ceiling of {}",
                    stat.label(),
                    value,
                    MAX_STAT_VALUE
                );
            }
        }
        Ok(snapshot)
    }
}

impl<T> Index<Stat> for StatMap<T> {
    type Output = T;

    #[inline]
    fn index(&self, stat: Stat) -> &T {
        &self.0[stat.index()]
    }
}

impl<T> IndexMut<Stat> for StatMap<T> {
    #[inline]
    fn index_mut(&mut self, stat: Stat) -> &mut T {
        &mut self.0[stat.index()]
    }
}

impl<T: fmt::Display> fmt::Display for StatMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (stat, value)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}: {}", stat.label(), value)?;
        }
        Ok(())
    }
}

impl<T: Serialize> Serialize for StatMap<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(Stat::ALL.len()))?;
        for (stat, value) in self.iter() {
            map.serialize_entry(&stat, value)?;
        }
        map.end()
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for StatMap<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let mut raw: BTreeMap<Stat, T> = BTreeMap::deserialize(deserializer)?;
        let mut values = Vec::with_capacity(Stat::ALL.len());
        for stat in Stat::ALL {
            match raw.remove(&stat) {
                Some(v) => values.push(v),
                None => {
                    return Err(serde::de::Error::custom(format!(
                        "missing value for stat '{}'",
                        stat
                    )));
                }
            }
        }
        let values: [T; 5] = values
            .try_into()
            .map_err(|_| serde::de::Error::custom("expected exactly five stats"))?;
        Ok(Self(values))
    }
}

/// Lenient deserializer for sparse maps (`null`, `{}`, or missing keys).
///
/// Missing stats take `T::default()`. Use with
/// `#[serde(default, deserialize_with = "stat::sparse")]`.
pub fn sparse<'de, D, T>(deserializer: D) -> Result<StatMap<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let raw: Option<BTreeMap<Stat, T>> = Option::deserialize(deserializer)?;
    let mut raw = raw.unwrap_or_default();
    Ok(StatMap::from_fn(|stat| raw.remove(&stat).unwrap_or_default()))
}

/// Parse five stat values from user input.
///
/// Accepts either `name=value` pairs in any order
/// (`speed=400 stamina=300 ...`) or five bare numbers in canonical order
/// separated by spaces or commas.
pub fn parse_stat_values(input: &str) -> Result<StatMap<u32>> {
    let pairs: Vec<(Stat, &str)> = STAT_PAIR_REGEX
        .captures_iter(input)
        .map(|caps| {
            let stat = caps[1].parse::<Stat>()?;
            let value = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            Ok((stat, value))
        })
        .collect::<Result<_>>()?;

    let mut values: [Option<u32>; 5] = [None; 5];
    if pairs.is_empty() {
        let tokens: Vec<&str> = input
            .split(|c: char| c.is_whitespace() || c == ',')
            .filter(|t| !t.is_empty())
            .collect();
        if tokens.len() != Stat::ALL.len() {
            bail!(
                "expected 5 values (speed stamina power guts wit), got {}",
                tokens.len()
            );
        }
        for (stat, token) in Stat::ALL.into_iter().zip(tokens) {
            values[stat.index()] = Some(parse_value(stat, token)?);
        }
    } else {
        for (stat, token) in pairs {
            let token = token.trim_end_matches(',');
            if values[stat.index()].is_some() {
                bail!("{} given more than once", stat.label());
            }
            values[stat.index()] = Some(parse_value(stat, token)?);
        }
    }

    let mut out = [0u32; 5];
    for stat in Stat::ALL {
        out[stat.index()] =
            values[stat.index()].ok_or_else(|| anyhow!("missing value for {}", stat.label()))?;
    }
    Ok(StatMap::new(out))
}

/// Parse a full snapshot from user input, enforcing the stat ceiling.
pub fn parse_snapshot(input: &str) -> Result<StatSnapshot> {
    let values = parse_stat_values(input)?;
    StatSnapshot::checked(*values.values())
}

fn parse_value(stat: Stat, token: &str) -> Result<u32> {
    token.parse::<u32>().map_err(|_| {
        anyhow!(
            "invalid value '{}' for {}: expected a non-negative integer",
            token,
            stat.label()
        )
    })
}
