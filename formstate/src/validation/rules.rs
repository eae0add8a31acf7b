//! Rule expressions handed to the external validator.
//!
//! The rule language itself belongs to the validator; this module only
//! carries expressions around and resolves the observable parts of them.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::state::State;
use crate::subscription::Subscription;

/// A single parameter of a structured rule expression.
#[derive(Debug, Clone)]
pub enum RuleParam {
    /// A fixed parameter.
    Value(Value),
    /// A parameter read from another cell at validation time, e.g. the
    /// value a "confirmed" rule compares against.
    Observable(State<Value>),
}

impl RuleParam {
    fn resolve(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Observable(state) => state.get(),
        }
    }
}

impl From<Value> for RuleParam {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl From<State<Value>> for RuleParam {
    fn from(state: State<Value>) -> Self {
        Self::Observable(state)
    }
}

/// A rule expression: either opaque text or a mapping of rule name to
/// parameter.
#[derive(Debug, Clone)]
pub enum RuleExpr {
    Text(String),
    Map(BTreeMap<String, RuleParam>),
}

impl RuleExpr {
    /// Build a structured expression from `(rule, param)` pairs.
    pub fn map<I, K, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, P)>,
        K: Into<String>,
        P: Into<RuleParam>,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, p)| (k.into(), p.into()))
                .collect(),
        )
    }

    /// Snapshot the expression, reading every observable parameter.
    pub fn resolve(&self) -> ResolvedRules {
        match self {
            Self::Text(text) => ResolvedRules::Text(text.clone()),
            Self::Map(entries) => ResolvedRules::Map(
                entries
                    .iter()
                    .map(|(name, param)| (name.clone(), param.resolve()))
                    .collect(),
            ),
        }
    }

    fn observables(&self) -> impl Iterator<Item = &State<Value>> {
        let entries = match self {
            Self::Text(_) => None,
            Self::Map(entries) => Some(entries.values()),
        };
        entries.into_iter().flatten().filter_map(|param| match param {
            RuleParam::Observable(state) => Some(state),
            RuleParam::Value(_) => None,
        })
    }
}

impl From<&str> for RuleExpr {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for RuleExpr {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

/// The rules of a field, possibly swappable at runtime.
#[derive(Debug, Clone)]
pub enum Rules {
    Static(RuleExpr),
    Observable(State<RuleExpr>),
}

impl Rules {
    /// Snapshot the current expression.
    pub fn resolve(&self) -> ResolvedRules {
        match self {
            Self::Static(expr) => expr.resolve(),
            Self::Observable(state) => state.with(RuleExpr::resolve),
        }
    }

    /// Subscribe `on_change` to every observable part of these rules.
    ///
    /// Observable rules are watched as a whole; observable parameters are
    /// watched only when the expression itself is static.
    pub(crate) fn watch(&self, on_change: Arc<dyn Fn() + Send + Sync>) -> Vec<Subscription> {
        match self {
            Self::Observable(state) => {
                vec![state.subscribe(move |_: &RuleExpr| on_change())]
            }
            Self::Static(expr) => expr
                .observables()
                .map(|state| {
                    let on_change = Arc::clone(&on_change);
                    state.subscribe(move |_: &Value| on_change())
                })
                .collect(),
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Self::Static(RuleExpr::Text(String::new()))
    }
}

impl From<RuleExpr> for Rules {
    fn from(expr: RuleExpr) -> Self {
        Self::Static(expr)
    }
}

impl From<State<RuleExpr>> for Rules {
    fn from(state: State<RuleExpr>) -> Self {
        Self::Observable(state)
    }
}

impl From<&str> for Rules {
    fn from(text: &str) -> Self {
        Self::Static(text.into())
    }
}

impl From<String> for Rules {
    fn from(text: String) -> Self {
        Self::Static(text.into())
    }
}

/// A rule expression with every observable read, as seen by the validator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResolvedRules {
    Text(String),
    Map(BTreeMap<String, Value>),
}

impl ResolvedRules {
    /// The text form, if this is a text expression
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Map(_) => None,
        }
    }

    /// A parameter of a structured expression
    pub fn param(&self, rule: &str) -> Option<&Value> {
        match self {
            Self::Text(_) => None,
            Self::Map(entries) => entries.get(rule),
        }
    }
}
