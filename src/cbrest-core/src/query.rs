//! N1QL query requests
//!
//! A statement is bound in exactly one of three ways:
//! - positional: `$1, $2, ...` placeholders, sent as an `args` array
//! - named: `$name` placeholders, each spliced into the request object as a
//!   top-level field whose key is the parameter name verbatim (e.g. `"$r"`)
//! - none: the bare statement

use serde_json::{Map, Value};

/// Parameter binding for a query statement
#[derive(Debug, Clone, PartialEq, Default)]
pub enum QueryParams {
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Map<String, Value>),
}

impl QueryParams {
    /// Pick the binding mode when a caller may supply both kinds.
    /// A non-empty positional list always wins; named values are only used
    /// when there are no positional values.
    pub fn resolve(positional: Option<Vec<Value>>, named: Option<Map<String, Value>>) -> Self {
        match (positional, named) {
            (Some(args), _) if !args.is_empty() => QueryParams::Positional(args),
            (_, Some(named)) if !named.is_empty() => QueryParams::Named(named),
            _ => QueryParams::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    pub statement: String,
    pub params: QueryParams,
}

impl QueryRequest {
    pub fn new(statement: impl Into<String>, params: QueryParams) -> Self {
        Self {
            statement: statement.into(),
            params,
        }
    }

    pub fn bare(statement: impl Into<String>) -> Self {
        Self::new(statement, QueryParams::None)
    }

    pub fn positional(statement: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(statement, QueryParams::resolve(Some(args), None))
    }

    pub fn named(statement: impl Into<String>, named: Map<String, Value>) -> Self {
        Self::new(statement, QueryParams::resolve(None, Some(named)))
    }

    /// JSON body for `POST /query/service`
    pub fn to_body(&self) -> Value {
        let mut body = Map::new();
        body.insert("statement".to_string(), Value::String(self.statement.clone()));

        match &self.params {
            QueryParams::Positional(args) if !args.is_empty() => {
                body.insert("args".to_string(), Value::Array(args.clone()));
            }
            QueryParams::Named(named) => {
                for (name, value) in named {
                    body.insert(name.clone(), value.clone());
                }
            }
            _ => {}
        }

        Value::Object(body)
    }
}
