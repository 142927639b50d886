
use std::collections::HashMap;

use tracing::trace;

use lexer::Token;
use parser::ast::Type;

use crate::error::GenResult;

#[derive(Debug, Clone)]
pub(crate) struct Function {
    pub name: String,
    pub params: Vec<Type>,
    pub returns: usize,
    pub label: String,
}

/* `add(a int, b int)` becomes `add_I.I.`. Identifiers cannot contain `.`. */
pub(crate) fn mangle(name: &str, params: &[Type]) -> String {
    let codes: String = params.iter()
        .map(|ty| format!("{}.", ty.code()))
        .collect();
    format!("{}_{}", name, codes)
}

/* Signatures defined so far, keyed on name and parameter types. */
pub(crate) struct FunctionTable {
    functions: HashMap<(String, Vec<Type>), Function>,
}

impl FunctionTable {
    pub fn new() -> Self {
        FunctionTable {functions: HashMap::new()}
    }

    pub fn define<'a>(&mut self, ident: &Token<'a>, params: Vec<Type>, returns: usize) -> GenResult<'a, Function> {
        let name = ident.text();
        let key = (name.clone(), params.clone());
        let label = mangle(&name, &params);

        if self.functions.contains_key(&key) {
            return Err((ident.pos, format!("function signature already defined: {}", label)).into());
        }

        let function = Function {name, params, returns, label};
        self.functions.insert(key, function.clone());
        Ok(function)
    }

    /*
     * Picks the overload of `ident` taking `arity` arguments. Argument
     * types, computed lazily by `arg_types`, are only consulted when
     * several overloads share that arity; `None` stands for a type that
     * cannot be inferred.
     */
    pub fn resolve<'a, F>(&self, ident: &Token<'a>, arity: usize, arg_types: F) -> GenResult<'a, &Function>
    where F: FnOnce() -> Vec<Option<Type>>
    {
        let name = ident.text();
        let named: Vec<&Function> = self.functions.values()
            .filter(|f| f.name == name)
            .collect();

        if named.is_empty() {
            return Err((ident.pos, format!("undefined function: '{}'", name)).into());
        }

        let candidates: Vec<&Function> = named.into_iter()
            .filter(|f| f.params.len() == arity)
            .collect();

        let chosen = match candidates.len() {
            0 => return Err((ident.pos, format!(
                "incorrect number of arguments passed to '{}': found {}", name, arity
            )).into()),
            1 => candidates[0],
            _ => {
                let types = arg_types();
                let exact: Vec<&Function> = candidates.into_iter()
                    .filter(|f| f.params.iter().zip(&types).all(|(p, a)| a.as_ref() == Some(p)))
                    .collect();

                match exact.as_slice() {
                    [f] => *f,
                    _ => return Err((ident.pos, format!("ambiguous call to '{}'", name)).into()),
                }
            },
        };

        trace!(%name, label = %chosen.label, "resolved call");
        Ok(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lexer::{Position, TokenKind};
    use parser::ast::BaseType;

    fn ident(name: &str) -> Token<'static> {
        Token::with_value(TokenKind::Identifier, name.to_string(), Position::new("test.mltn", 2, 5))
    }

    fn int() -> Type {
        Type::Pure(BaseType::Int)
    }

    fn boolean() -> Type {
        Type::Pure(BaseType::Bool)
    }

    #[test]
    fn mangled_labels() {
        assert_eq!(mangle("add", &[int(), int()]), "add_I.I.");
        assert_eq!(mangle("f", &[Type::pointer_to(int())]), "f_PI.");
        assert_eq!(mangle("g", &[]), "g_");
    }

    #[test]
    fn duplicate_signature() {
        let mut table = FunctionTable::new();
        table.define(&ident("f"), vec![int()], 1).unwrap();
        table.define(&ident("f"), vec![boolean()], 0).unwrap();

        let err = table.define(&ident("f"), vec![int()], 0).unwrap_err();
        assert_eq!(err.message, "function signature already defined: f_I.");
    }

    #[test]
    fn resolution_by_arity() {
        let mut table = FunctionTable::new();
        table.define(&ident("f"), vec![int()], 1).unwrap();
        table.define(&ident("f"), vec![int(), int()], 1).unwrap();

        assert_eq!(table.resolve(&ident("f"), 1, Vec::new).unwrap().label, "f_I.");
        assert_eq!(table.resolve(&ident("f"), 2, Vec::new).unwrap().label, "f_I.I.");

        let err = table.resolve(&ident("f"), 3, Vec::new).unwrap_err();
        assert!(err.message.starts_with("incorrect number of arguments"));

        let err = table.resolve(&ident("h"), 0, Vec::new).unwrap_err();
        assert_eq!(err.message, "undefined function: 'h'");
        assert_eq!((err.pos.line, err.pos.column), (2, 5));
    }

    #[test]
    fn resolution_by_argument_types() {
        let mut table = FunctionTable::new();
        table.define(&ident("f"), vec![int()], 1).unwrap();
        table.define(&ident("f"), vec![boolean()], 1).unwrap();

        let chosen = table.resolve(&ident("f"), 1, || vec![Some(boolean())]).unwrap();
        assert_eq!(chosen.label, "f_B.");

        let err = table.resolve(&ident("f"), 1, || vec![None]).unwrap_err();
        assert_eq!(err.message, "ambiguous call to 'f'");
    }
}
