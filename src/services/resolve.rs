//! Identifier resolution
//!
//! Turns the identifier under the cursor into a `ResolvedSymbol` using the
//! checker's tables, then classifies it into the documentation lookup key.

use crate::error::ResolveError;
use crate::models::config::ResolveConfig;
use crate::models::symbol::{LookupKey, Object, ObjectKind, Owner, ResolvedSymbol, is_exported};
use crate::services::check::Recorded;
use crate::services::loader::Program;
use crate::services::locate::{Located, is_qualified, locate};

/// Resolve the symbol at byte `offset` of the edited file.
pub fn resolve(program: &Program, offset: usize) -> Result<ResolvedSymbol, ResolveError> {
    let syntax = &program.edited().syntax;
    let node = match locate(syntax, offset)? {
        Located::ImportPath(path) => return Ok(ResolvedSymbol::Package(path)),
        Located::Ident(node) => node,
    };

    let key = program.key(node);
    let Some((object, recorded)) = program.info().lookup(&key) else {
        return Err(ResolveError::UnresolvedIdentifier(
            syntax.text(node).to_string(),
        ));
    };
    tracing::debug!(
        "{} {} ({:?}) recorded as {:?}",
        object.kind,
        object.name,
        object.owner,
        recorded
    );
    Ok(symbol_of(object, recorded, || is_qualified(syntax, offset)))
}

fn symbol_of(object: &Object, recorded: Recorded, qualified: impl FnOnce() -> bool) -> ResolvedSymbol {
    if object.kind == ObjectKind::Builtin || object.owner.is_universe() {
        return ResolvedSymbol::Builtin(object.name.clone());
    }
    if let (ObjectKind::PkgName, Some(path)) = (object.kind, &object.imported) {
        return ResolvedSymbol::Package(path.clone());
    }
    // The qualifier is kept for the debug log and callers; classification
    // goes by owner, so `b.Reset()` and `bytes.NewBuffer` both land in bytes.
    match recorded {
        Recorded::Def => ResolvedSymbol::Declaration {
            kind: object.kind,
            name: object.name.clone(),
            owner: object.owner.clone(),
        },
        Recorded::Use => ResolvedSymbol::Usage {
            kind: object.kind,
            name: object.name.clone(),
            owner: object.owner.clone(),
            from_import: qualified(),
        },
    }
}

/// Documentation key for `symbol`; `import_path` is the import path of the
/// package being edited.
pub fn classify(
    symbol: &ResolvedSymbol,
    import_path: &str,
    policy: &ResolveConfig,
) -> Result<LookupKey, ResolveError> {
    let (kind, name, owner) = match symbol {
        ResolvedSymbol::Builtin(name) => return Ok(LookupKey::builtin(name.as_str())),
        ResolvedSymbol::Package(path) => return Ok(LookupKey::package(path.as_str())),
        ResolvedSymbol::Declaration { kind, name, owner }
        | ResolvedSymbol::Usage {
            kind, name, owner, ..
        } => (*kind, name, owner),
    };

    if !matches!(
        kind,
        ObjectKind::Const | ObjectKind::Func | ObjectKind::TypeName | ObjectKind::Var | ObjectKind::Nil
    ) {
        return Err(ResolveError::UnsupportedSymbolKind {
            kind: kind.to_string(),
            name: name.clone(),
        });
    }
    if policy.exported_only && !is_exported(name) {
        return Err(ResolveError::Unexported(name.clone()));
    }

    let path = match owner {
        Owner::Universe => LookupKey::BUILTIN,
        Owner::Local => import_path,
        // Qualified or not (fields, methods, dot imports), imported members
        // are documented by their own package.
        Owner::Imported(path) => path.as_str(),
        Owner::Foreign => return Err(ResolveError::UnresolvedIdentifier(name.clone())),
    };
    Ok(LookupKey::new(path, name.as_str()))
}
