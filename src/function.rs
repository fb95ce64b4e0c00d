use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionKind {
    Managed,
    Native,
}

/// Canonical description of a callable. Two functions are equal iff every
/// field matches — this is the intern key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Function {
    pub kind: FunctionKind,
    pub name: String,
    pub filename: Option<String>,
    pub start_lineno: Option<i32>,
    pub start_address: Option<usize>,
}
