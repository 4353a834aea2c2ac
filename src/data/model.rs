use crate::ast::Value;
use crate::error::ConversionError;
use crate::reference::FieldReference;
use ahash::AHashMap;
use std::fs;

static NULL: Value = Value::Null;

/// Live form values across every module of a workflow: module key → field id → value.
///
/// Unqualified field references resolve against the current module. The store is
/// built fresh for each evaluation from the caller's snapshot and never persisted.
#[derive(Debug, Clone, Default)]
pub struct WorkflowFormData {
    modules: AHashMap<String, AHashMap<String, Value>>,
    current_module: String,
}

impl WorkflowFormData {
    pub fn new(current_module: impl Into<String>) -> Self {
        Self {
            modules: AHashMap::new(),
            current_module: current_module.into(),
        }
    }

    /// A single-module snapshot, as produced by one form page.
    pub fn for_module<K, V>(
        module: impl Into<String>,
        values: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let module = module.into();
        let mut data = Self::new(module.clone());
        for (field, value) in values {
            data.insert(&module, field, value);
        }
        data
    }

    pub fn current_module(&self) -> &str {
        &self.current_module
    }

    pub fn set_current_module(&mut self, module: impl Into<String>) {
        self.current_module = module.into();
    }

    pub fn with_current_module(mut self, module: impl Into<String>) -> Self {
        self.current_module = module.into();
        self
    }

    pub fn insert(&mut self, module: &str, field: impl Into<String>, value: impl Into<Value>) {
        self.modules
            .entry(module.to_string())
            .or_default()
            .insert(field.into(), value.into());
    }

    /// Inserts into the current module.
    pub fn insert_current(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        let module = self.current_module.clone();
        self.insert(&module, field, value);
    }

    pub fn module(&self, module: &str) -> Option<&AHashMap<String, Value>> {
        self.modules.get(module)
    }

    pub fn module_keys(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    pub fn contains_module(&self, module: &str) -> bool {
        self.modules.contains_key(module)
    }

    pub fn get(&self, module: &str, field: &str) -> Option<&Value> {
        self.modules
            .get(module)
            .and_then(|fields| fields.get(field))
    }

    /// Looks up the value a reference points to. Missing modules or fields read as `Null`.
    ///
    /// A module prefix that names no loaded module is not treated as a prefix: the whole
    /// reference is then looked up as a field id of the current module, which covers
    /// field ids that contain dots.
    pub fn resolve(&self, reference: &FieldReference) -> &Value {
        let found = match &reference.module_key {
            Some(module) if self.contains_module(module) => self.get(module, &reference.field_id),
            Some(_) => self.get(&self.current_module, &reference.to_string()),
            None => self.get(&self.current_module, &reference.field_id),
        };
        found.unwrap_or(&NULL)
    }

    /// Parses `{ "ModuleKey": { "fieldId": value, ... }, ... }`.
    pub fn from_json(json: &str, current_module: &str) -> Result<Self, ConversionError> {
        let raw: AHashMap<String, AHashMap<String, serde_json::Value>> =
            serde_json::from_str(json).map_err(|e| ConversionError::Json(e.to_string()))?;

        let mut data = Self::new(current_module);
        for (module, fields) in raw {
            for (field, value) in fields {
                data.insert(&module, field, Value::from_json(value));
            }
        }
        Ok(data)
    }

    /// Load a snapshot from a JSON file.
    pub fn from_file(path: &str, current_module: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = fs::read_to_string(path)?;
        Ok(Self::from_json(&content, current_module)?)
    }

    /// Serializes the snapshot back into the `from_json` shape.
    pub fn to_json(&self) -> serde_json::Value {
        let modules = self
            .modules
            .iter()
            .map(|(module, fields)| {
                let fields = fields
                    .iter()
                    .map(|(field, value)| (field.clone(), value.to_json()))
                    .collect::<serde_json::Map<_, _>>();
                (module.clone(), serde_json::Value::Object(fields))
            })
            .collect::<serde_json::Map<_, _>>();
        serde_json::Value::Object(modules)
    }
}
