use crate::ast::Identifier;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Linkage {
    None,
    External,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Variable,
    Parameter,
    Function,
}

/// The only scalar type is the 32-bit integer, so type information
/// degenerates into "int" versus a function signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeInfo {
    Int,
    Fun { num_params: usize, is_defined: bool },
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnvEntry {
    pub unique_name: Identifier,
    pub linkage: Linkage,
    pub category: Category,
    pub type_info: TypeInfo,
}

impl EnvEntry {
    pub fn variable(unique_name: Identifier) -> Self {
        Self {
            unique_name,
            linkage: Linkage::None,
            category: Category::Variable,
            type_info: TypeInfo::Int,
        }
    }

    pub fn parameter(unique_name: Identifier) -> Self {
        Self {
            unique_name,
            linkage: Linkage::None,
            category: Category::Parameter,
            type_info: TypeInfo::Int,
        }
    }

    pub fn function(name: Identifier, num_params: usize, is_defined: bool) -> Self {
        Self {
            unique_name: name,
            linkage: Linkage::External,
            category: Category::Function,
            type_info: TypeInfo::Fun {
                num_params,
                is_defined,
            },
        }
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        self.category == Category::Function
    }

    #[inline]
    pub fn is_parameter(&self) -> bool {
        self.category == Category::Parameter
    }
}

/// Two-tier name table: a global map for externally linked names plus a LIFO
/// stack of lexical block scopes. Scopes are strictly nested, so a plain
/// `Vec` of frames replaces parent pointers.
#[derive(Debug)]
pub struct Environments {
    global: HashMap<Identifier, EnvEntry>,
    scopes: Vec<HashMap<Identifier, EnvEntry>>,
}

impl Default for Environments {
    fn default() -> Self {
        Self::new()
    }
}

impl Environments {
    pub fn new() -> Self {
        Self {
            global: HashMap::new(),
            scopes: vec![HashMap::new()],
        }
    }

    pub fn begin_block(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn end_block(&mut self) {
        self.scopes.pop();
    }

    /// Inserts into the innermost scope; an externally linked entry is
    /// recorded in the global table as well.
    pub fn set(&mut self, name: Identifier, entry: EnvEntry) {
        if entry.linkage == Linkage::External {
            self.global.insert(name.clone(), entry.clone());
        }
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name, entry);
    }

    /// Walks the block stack innermost first.
    pub fn get(&self, name: &str) -> Option<&EnvEntry> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    pub fn get_current_scope(&self, name: &str) -> Option<&EnvEntry> {
        self.scopes
            .last()
            .expect("scope stack is never empty")
            .get(name)
    }

    /// The scope directly enclosing the current one; used for the rule that
    /// a parameter may not be redeclared in the outermost body scope.
    pub fn get_enclosing_scope(&self, name: &str) -> Option<&EnvEntry> {
        let n = self.scopes.len();
        if n < 2 {
            return None;
        }
        self.scopes[n - 2].get(name)
    }

    pub fn get_global(&self, name: &str) -> Option<&EnvEntry> {
        self.global.get(name)
    }

    pub fn mark_function_defined(&mut self, name: &str) {
        let copies = self
            .global
            .get_mut(name)
            .into_iter()
            .chain(self.scopes.iter_mut().filter_map(|scope| scope.get_mut(name)));
        for entry in copies {
            if let TypeInfo::Fun { is_defined, .. } = &mut entry.type_info {
                *is_defined = true;
            }
        }
    }

    /// Whether `name` is a function defined in this program; calls to
    /// anything else are routed through the PLT.
    pub fn is_function_defined(&self, name: &str) -> bool {
        matches!(
            self.global.get(name),
            Some(EnvEntry {
                type_info: TypeInfo::Fun { is_defined: true, .. },
                ..
            })
        )
    }
}
