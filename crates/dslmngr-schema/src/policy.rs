use serde_json::{json, Map, Value};

/// Wire type of one method argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Int32,
    String,
    Bool,
    Table,
    Array,
}

impl ArgType {
    /// Type name announced in object signatures.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Int32 => "int32",
            Self::String => "string",
            Self::Bool => "bool",
            Self::Table => "table",
            Self::Array => "array",
        }
    }

    fn json_schema(self) -> Value {
        match self {
            Self::Int32 => json!({
                "type": "integer",
                "minimum": i32::MIN,
                "maximum": i32::MAX,
            }),
            Self::String => json!({ "type": "string" }),
            Self::Bool => json!({ "type": "boolean" }),
            Self::Table => json!({ "type": "object" }),
            Self::Array => json!({ "type": "array" }),
        }
    }
}

/// Ordered argument list of one method. Every argument is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArgPolicy {
    fields: Vec<(String, ArgType)>,
}

impl ArgPolicy {
    /// A policy accepting no named arguments.
    pub fn none() -> Self {
        Self::default()
    }

    /// Add an argument.
    pub fn arg(mut self, name: impl Into<String>, kind: ArgType) -> Self {
        self.fields.push((name.into(), kind));
        self
    }

    pub fn fields(&self) -> &[(String, ArgType)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// `{arg: type}` map used in `add_object` signatures.
    pub fn signature(&self) -> Map<String, Value> {
        self.fields
            .iter()
            .map(|(name, kind)| (name.clone(), Value::from(kind.as_str())))
            .collect()
    }

    /// JSON Schema for the argument table.
    pub fn to_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, kind)| (name.clone(), kind.json_schema()))
            .collect();
        json!({
            "type": "object",
            "properties": properties,
        })
    }
}
