//! Type hierarchy for override discovery

use crate::SymbolError;
use ripple_ir::Program;
use std::collections::{HashMap, HashSet, VecDeque};

/// Supertype relation over the program's declared types
#[derive(Debug, Default, Clone)]
pub struct TypeHierarchy {
    /// type -> direct supertypes
    supertypes_of: HashMap<String, Vec<String>>,
}

impl TypeHierarchy {
    /// Build the hierarchy by scanning all type declarations.
    ///
    /// Supertypes that are not declared in the program are kept (they still
    /// take part in subtype queries) and reported as soft errors.
    pub fn build(program: &Program) -> (Self, Vec<SymbolError>) {
        let mut hierarchy = TypeHierarchy::default();
        let mut errors = Vec::new();

        for decl in &program.types {
            hierarchy
                .supertypes_of
                .insert(decl.name.clone(), decl.supertypes.clone());
            for sup in &decl.supertypes {
                if program.type_decl(sup).is_none() {
                    errors.push(SymbolError::UnknownSupertype {
                        type_name: decl.name.clone(),
                        supertype: sup.clone(),
                        span: decl.span,
                    });
                }
            }
        }

        (hierarchy, errors)
    }

    /// Reflexive, transitive subtype test. Cyclic declarations terminate.
    pub fn is_subtype(&self, sub: &str, sup: &str) -> bool {
        if sub == sup {
            return true;
        }

        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<&str> = VecDeque::from([sub]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            if let Some(parents) = self.supertypes_of.get(current) {
                for parent in parents {
                    if parent == sup {
                        return true;
                    }
                    queue.push_back(parent);
                }
            }
        }
        false
    }

    pub fn is_strict_subtype(&self, sub: &str, sup: &str) -> bool {
        sub != sup && self.is_subtype(sub, sup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ripple_ir::ProgramBuilder;

    #[test]
    fn transitive_subtypes() {
        let mut builder = ProgramBuilder::new();
        builder.type_decl("Shape", &[]);
        builder.type_decl("Polygon", &["Shape"]);
        builder.type_decl("Square", &["Polygon"]);
        let (hierarchy, errors) = TypeHierarchy::build(&builder.finish());

        assert!(errors.is_empty());
        assert!(hierarchy.is_subtype("Square", "Shape"));
        assert!(hierarchy.is_subtype("Square", "Square"));
        assert!(!hierarchy.is_strict_subtype("Square", "Square"));
        assert!(!hierarchy.is_subtype("Shape", "Square"));
        assert!(hierarchy.is_strict_subtype("Polygon", "Shape"));
    }

    #[test]
    fn cyclic_declarations_terminate() {
        let mut builder = ProgramBuilder::new();
        builder.type_decl("A", &["B"]);
        builder.type_decl("B", &["A"]);
        let (hierarchy, _) = TypeHierarchy::build(&builder.finish());

        assert!(hierarchy.is_subtype("A", "B"));
        assert!(!hierarchy.is_subtype("A", "C"));
    }

    #[test]
    fn unknown_supertype_is_soft() {
        let mut builder = ProgramBuilder::new();
        builder.type_decl("Widget", &["java.lang.Object"]);
        let (_, errors) = TypeHierarchy::build(&builder.finish());

        assert_eq!(errors.len(), 1);
        assert!(!errors[0].is_hard_error());
        assert_eq!(errors[0].code(), "E-TYPE-001");
    }
}
