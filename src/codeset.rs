use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::error::CodeSetError;
use crate::schema::{FieldOption, FormFieldSchema};
use ahash::AHashMap;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Expands a field's `code_set_id` into concrete selectable options.
///
/// Implemented by the persistence layer; the hierarchy builder only consumes it.
#[async_trait]
pub trait CodeSetProvider: Send + Sync {
    async fn get_code_set_as_field_options(
        &self,
        code_set_id: &str,
    ) -> Result<Vec<FieldOption>, CodeSetError>;
}

/// A provider backed by an in-memory table.
#[derive(Debug, Clone, Default)]
pub struct StaticCodeSetProvider {
    code_sets: AHashMap<String, Vec<FieldOption>>,
}

impl StaticCodeSetProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code_set(
        mut self,
        code_set_id: impl Into<String>,
        options: Vec<FieldOption>,
    ) -> Self {
        self.code_sets.insert(code_set_id.into(), options);
        self
    }
}

#[async_trait]
impl CodeSetProvider for StaticCodeSetProvider {
    async fn get_code_set_as_field_options(
        &self,
        code_set_id: &str,
    ) -> Result<Vec<FieldOption>, CodeSetError> {
        self.code_sets
            .get(code_set_id)
            .cloned()
            .ok_or_else(|| CodeSetError::NotFound(code_set_id.to_string()))
    }
}

/// Summary of one resolution pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CodeSetResolution {
    pub resolved: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Resolves the code set of every field that declares one, in field order.
///
/// A failing lookup leaves that field with empty options and the pass continues.
/// Cancellation is checked before each lookup; fields resolved before it keep
/// their options.
pub async fn resolve_code_sets(
    fields: &mut [FormFieldSchema],
    provider: &dyn CodeSetProvider,
    sink: &dyn DiagnosticSink,
    cancellation: Option<&CancellationToken>,
) -> CodeSetResolution {
    let mut report = CodeSetResolution::default();

    for field in fields.iter_mut() {
        let Some(code_set_id) = field.code_set_id.clone() else {
            continue;
        };

        if cancellation.is_some_and(CancellationToken::is_cancelled) {
            sink.record(Diagnostic::warning(
                DiagnosticKind::Cancelled,
                format!(
                    "Code set resolution cancelled before field '{}'; {} field(s) resolved",
                    field.id, report.resolved
                ),
            ));
            report.cancelled = true;
            break;
        }

        match provider.get_code_set_as_field_options(&code_set_id).await {
            Ok(options) => {
                sink.record(Diagnostic::debug(
                    DiagnosticKind::CodeSetResolved,
                    format!(
                        "Resolved code set '{}' for field '{}' ({} options)",
                        code_set_id,
                        field.id,
                        options.len()
                    ),
                ));
                field.options = options;
                report.resolved += 1;
            }
            Err(e) => {
                sink.record(Diagnostic::warning(
                    DiagnosticKind::CodeSetFailure,
                    format!("Field '{}' keeps empty options: {}", field.id, e),
                ));
                field.options.clear();
                report.failed += 1;
            }
        }
    }

    report
}
