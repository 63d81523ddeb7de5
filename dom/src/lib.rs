pub mod arena;
pub mod document;
pub mod dom_exception;
pub mod dump;
pub mod interfaces;
pub mod mutation_algorithms;
pub mod node;
pub mod ranges;
pub mod serialize;

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct QualifiedName {
    pub prefix: Option<String>,
    pub ns: Option<String>,
    pub local: String,
}

impl QualifiedName {
    // FIXME: `ns` should be passed as a parameter.
    pub fn new(prefix: Option<String>, local: String) -> Self {
        QualifiedName {
            prefix,
            ns: None,
            local,
        }
    }
}

#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone)]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}
