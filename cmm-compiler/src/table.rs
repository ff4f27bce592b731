//! Structure-definition registry and the scoped symbol table.

use std::collections::HashMap;
use std::rc::Rc;

use cmm_ir::{IdGen, VarId};

use crate::types::Type;

/// Whole-program registry of structure definitions, in insertion order.
///
/// Anonymous structures are stored but never found by name; name uniqueness
/// among the named ones is enforced by the checked wrapper in the analyser.
#[derive(Debug, Default)]
pub struct StructRegistry {
    defs: Vec<Rc<Type>>,
}

impl StructRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a structure type.
    pub fn add(&mut self, def: Rc<Type>) {
        debug_assert!(matches!(*def, Type::Struct(_)));
        self.defs.push(def);
    }

    /// First registered structure with the given tag.
    pub fn find(&self, name: &str) -> Option<&Rc<Type>> {
        self.defs.iter().find(|def| {
            def.as_struct()
                .and_then(|s| s.name.as_deref())
                .is_some_and(|tag| tag == name)
        })
    }
}

/// Index of a symbol in the table's arena.
pub type SymbolId = usize;

/// A named entity: variable, parameter or function.
#[derive(Debug, Clone)]
pub struct Symbol {
    /// Source name.
    pub name: String,
    /// Resolved type.
    pub ty: Rc<Type>,
    /// IR variable id, assigned when the symbol enters the table.
    pub id: VarId,
    /// Line of the declaration.
    pub lineno: u32,
    /// Whether a definition (not just a declaration) has been seen.
    pub is_defined: bool,
    /// Whether the symbol is a function parameter.
    pub is_param: bool,
}

impl Symbol {
    /// Symbol awaiting insertion; the IR id is assigned by
    /// [`SymbolTable::add`].
    pub fn new(name: impl Into<String>, ty: Rc<Type>, lineno: u32, is_defined: bool) -> Self {
        Self {
            name: name.into(),
            ty,
            id: 0,
            lineno,
            is_defined,
            is_param: false,
        }
    }
}

/// Scoped name resolution.
///
/// Two coordinated indexes over one symbol arena: the environment stack
/// (innermost scope last, each holding its symbols in insertion order) and a
/// name index mapping each name to its chain of visible bindings, innermost
/// at the tail. Popping a scope unlinks every symbol of that scope from the
/// name index, so resolution always sees the innermost live binding.
#[derive(Debug)]
pub struct SymbolTable {
    arena: Vec<Symbol>,
    scopes: Vec<Vec<SymbolId>>,
    index: HashMap<String, Vec<SymbolId>>,
}

impl SymbolTable {
    /// Table with the global scope open.
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            scopes: vec![Vec::new()],
            index: HashMap::new(),
        }
    }

    /// Open a new innermost scope.
    pub fn push_env(&mut self) {
        self.scopes.push(Vec::new());
    }

    /// Discard the innermost scope and unlink its symbols.
    pub fn pop_env(&mut self) {
        let scope = self.scopes.pop().unwrap_or_default();
        for sym in scope {
            let name = self.arena[sym].name.as_str();
            if let Some(chain) = self.index.get_mut(name) {
                chain.retain(|&id| id != sym);
                if chain.is_empty() {
                    self.index.remove(name);
                }
            }
        }
    }

    /// Insert a symbol into the innermost scope, assigning its IR id.
    pub fn add(&mut self, mut symbol: Symbol, vars: &mut IdGen) -> SymbolId {
        symbol.id = vars.next_id();
        let sym = self.arena.len();
        self.index
            .entry(symbol.name.clone())
            .or_default()
            .push(sym);
        self.arena.push(symbol);
        self.scopes
            .last_mut()
            .expect("the global scope is always open")
            .push(sym);
        sym
    }

    /// Innermost visible binding of `name`.
    pub fn find(&self, name: &str) -> Option<SymbolId> {
        self.index.get(name).and_then(|chain| chain.last().copied())
    }

    /// Binding of `name` in the innermost scope only.
    pub fn find_in_current(&self, name: &str) -> Option<SymbolId> {
        self.scopes
            .last()
            .and_then(|scope| {
                scope
                    .iter()
                    .find(|&&sym| self.arena[sym].name == name)
            })
            .copied()
    }

    /// The symbol behind an id.
    pub fn symbol(&self, sym: SymbolId) -> &Symbol {
        &self.arena[sym]
    }

    /// Mutable access, for marking definitions.
    pub fn symbol_mut(&mut self, sym: SymbolId) -> &mut Symbol {
        &mut self.arena[sym]
    }

    /// Live symbols never given a definition, ordered by line number.
    ///
    /// Run after the whole tree is analysed; what remains undefined at that
    /// point is a function declared without a body.
    pub fn undefined_symbols(&self) -> Vec<&Symbol> {
        let mut found: Vec<&Symbol> = self
            .scopes
            .iter()
            .flatten()
            .map(|&sym| &self.arena[sym])
            .filter(|symbol| !symbol.is_defined)
            .collect();
        found.sort_by_key(|symbol| symbol.lineno);
        found
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldList, StructDef};

    fn add(table: &mut SymbolTable, vars: &mut IdGen, name: &str) -> SymbolId {
        table.add(Symbol::new(name, Type::int(), 1, true), vars)
    }

    #[test]
    fn inner_bindings_shadow_and_scope_pop_restores() {
        let mut vars = IdGen::new();
        let mut table = SymbolTable::new();
        let outer = add(&mut table, &mut vars, "x");

        table.push_env();
        let inner = add(&mut table, &mut vars, "x");
        assert_eq!(table.find("x"), Some(inner));
        assert_eq!(table.find_in_current("x"), Some(inner));

        table.pop_env();
        assert_eq!(table.find("x"), Some(outer));
    }

    #[test]
    fn current_scope_lookup_ignores_outer_bindings() {
        let mut vars = IdGen::new();
        let mut table = SymbolTable::new();
        add(&mut table, &mut vars, "x");
        table.push_env();
        assert_eq!(table.find_in_current("x"), None);
        assert!(table.find("x").is_some());
    }

    #[test]
    fn symbol_ids_come_from_the_variable_counter() {
        let mut vars = IdGen::new();
        let mut table = SymbolTable::new();
        let a = add(&mut table, &mut vars, "a");
        let b = add(&mut table, &mut vars, "b");
        assert_eq!(table.symbol(a).id, 1);
        assert_eq!(table.symbol(b).id, 2);
        assert_eq!(vars.next_id(), 3);
    }

    #[test]
    fn undefined_symbols_are_line_ordered() {
        let mut vars = IdGen::new();
        let mut table = SymbolTable::new();
        let f = Rc::new(Type::Func {
            ret: Type::int(),
            params: vec![],
        });
        table.add(Symbol::new("g", f.clone(), 9, false), &mut vars);
        table.add(Symbol::new("f", f, 3, false), &mut vars);
        let names: Vec<&str> = table
            .undefined_symbols()
            .iter()
            .map(|symbol| symbol.name.as_str())
            .collect();
        assert_eq!(names, ["f", "g"]);
    }

    #[test]
    fn registry_never_finds_anonymous_structs() {
        let mut registry = StructRegistry::new();
        registry.add(Rc::new(Type::Struct(StructDef {
            name: None,
            fields: FieldList::new(),
        })));
        registry.add(Rc::new(Type::Struct(StructDef {
            name: Some("P".into()),
            fields: FieldList::new(),
        })));
        assert!(registry.find("P").is_some());
        assert!(registry.find("Q").is_none());
    }
}
