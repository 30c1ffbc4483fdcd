use indexmap::IndexMap;

use crate::{
    diagnostics::{fault, DiagnosticKind, Result},
    value::{Function, Value},
};

/// A named mutable binding. The value is absent while a declaration is
/// still pending assignment.
#[derive(Clone)]
pub struct Var {
    pub name: String,
    pub value: Option<Value>,
}

/// The single flat namespace: one variable registry and one function
/// registry, both keyed uniquely by name and alive for the whole process.
/// Entering a function call or loop body does not push a frame; every
/// write is globally visible and persists after the construct exits.
#[derive(Default)]
pub struct Environment {
    vars: IndexMap<String, Var>,
    functions: IndexMap<String, Function>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins; assigning to an unbound name creates it.
    pub fn set_var(&mut self, name: &str, value: Value) {
        self.vars.insert(
            name.to_string(),
            Var {
                name: name.to_string(),
                value: Some(value),
            },
        );
    }

    pub fn get_var(&self, name: &str) -> Result<Value> {
        match self.vars.get(name).and_then(|var| var.value.clone()) {
            Some(value) => Ok(value),
            None => Err(fault(
                DiagnosticKind::UnknownIdentifier,
                format!("unknown variable `{name}`"),
            )),
        }
    }

    /// Variable lookup without the failure, for the silent-miss token
    /// interpolation contract.
    pub fn lookup_var(&self, name: &str) -> Option<Value> {
        self.vars.get(name).and_then(|var| var.value.clone())
    }

    pub fn set_function(&mut self, name: &str, function: Function) {
        self.functions.insert(name.to_string(), function);
    }

    pub fn get_function(&self, name: &str) -> Result<Function> {
        match self.functions.get(name) {
            Some(function) => Ok(function.clone()),
            None => Err(fault(
                DiagnosticKind::UnknownIdentifier,
                format!("unknown function `{name}`"),
            )),
        }
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }
}
