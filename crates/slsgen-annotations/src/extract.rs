//! Annotation extraction for a single route method.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::{AnnotationOccurrence, AnnotationTable, AnnotationValue, ParameterBinding};
use crate::syntax::{strip_quotes, Call, ClassDecl, Decorator, MethodDecl, ParameterDecl};
use crate::visit::Visitor;

/// Build the annotation table of an instance method.
///
/// An unknown method yields an empty table.
pub fn extract(method_name: &str, class: &ClassDecl) -> AnnotationTable {
    match class.instance_method(method_name) {
        Some(method) => extract_method(method),
        None => {
            tracing::debug!(
                class = %class.name,
                method = %method_name,
                "method not found, no annotations"
            );
            AnnotationTable::new()
        }
    }
}

/// Build the annotation table of a method declaration.
pub fn extract_method(method: &MethodDecl) -> AnnotationTable {
    let mut collector = AnnotationCollector::default();
    collector.visit_method(method);
    collector.table
}

/// Parse raw argument text as a JSON array body, falling back to a comma
/// split. The fallback does not respect quoting: `"a, b"` splits in two.
pub fn parse_arguments(raw: &str) -> Vec<Value> {
    match serde_json::from_str::<Vec<Value>>(&format!("[{raw}]")) {
        Ok(values) => values,
        Err(_) => raw
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
    }
}

#[derive(Default)]
struct AnnotationCollector {
    table: AnnotationTable,
}

impl Visitor for AnnotationCollector {
    fn visit_decorator(&mut self, decorator: &Decorator) {
        let Some(call) = decorator.application() else {
            return;
        };
        let values = parse_arguments(&call.arguments.raw)
            .into_iter()
            .map(AnnotationValue::Literal)
            .collect();

        let mut chains = ChainCollector::default();
        chains.visit_decorator(decorator);

        self.table.push(
            call.name(),
            AnnotationOccurrence {
                values,
                children: chains.children,
            },
        );
    }

    fn visit_parameter(&mut self, parameter: &ParameterDecl) {
        let mut seen: Vec<&str> = Vec::new();
        for decorator in &parameter.decorators {
            let Some(name) = decorator.name() else {
                continue;
            };
            if seen.contains(&name) {
                continue;
            }
            seen.push(name);
            let binding = ParameterBinding {
                name: parameter.name.clone(),
                type_name: parameter.type_name().to_string(),
            };
            self.table.push(
                name,
                AnnotationOccurrence::new(vec![AnnotationValue::Parameter(binding)]),
            );
        }
    }
}

/// Flattens the chained segments of a decorator into one child map.
///
/// Calls nested in arguments are not descended into.
#[derive(Default)]
struct ChainCollector {
    children: BTreeMap<String, AnnotationOccurrence>,
}

impl Visitor for ChainCollector {
    fn visit_call(&mut self, call: &Call) {
        for segment in &call.chain {
            // Segments without arguments carry no value.
            let Some(first) = segment.arguments.items.first() else {
                continue;
            };
            let value = AnnotationValue::Literal(Value::String(strip_quotes(&first.text)));
            self.children
                .insert(segment.callee.clone(), AnnotationOccurrence::new(vec![value]));
        }
    }
}
