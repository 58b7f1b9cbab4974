//! CK cohesion model (component I), spec.md §3/§4.I.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ClassMetrics {
    pub path: String,
    pub class_name: String,
    pub wmc: u32,
    pub nom: usize,
    pub nof: usize,
    pub rfc: usize,
    pub cbo: usize,
    pub lcom: usize,
    pub dit: usize,
    pub noc: usize,
    pub methods: Vec<String>,
    pub fields: Vec<String>,
    pub coupled_classes: Vec<String>,
    pub loc: usize,
}

/// A class definition as seen before metrics are computed: name, file,
/// declared parents, methods (with per-method field accesses and callees
/// for RFC/LCOM4), and referenced type names for CBO.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClassDeclaration {
    pub path: String,
    pub class_name: String,
    pub parents: Vec<String>,
    pub methods: Vec<MethodDeclaration>,
    pub fields: Vec<String>,
    pub referenced_types: Vec<String>,
    pub loc: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MethodDeclaration {
    pub name: String,
    pub cyclomatic: u32,
    pub accessed_fields: Vec<String>,
    pub called_names: Vec<String>,
}
