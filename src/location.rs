use serde::Serialize;

/// A call site within a function: `function_index` into the serialized
/// `functions[]` array, plus a managed `lineno` or a native `address`
/// (the other is zero). Field-wise equality is the intern key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Location {
    pub function_index: u32,
    pub lineno: i32,
    pub address: usize,
}
