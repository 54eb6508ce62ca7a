use ripple::ir::{MethodKey, MethodModifiers, Program, ProgramBuilder, VarId, VarScope};
use std::fs;
use std::path::Path;

/// Load a test fixture from tests/fixtures/
pub fn load_fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("Failed to load fixture {name}: {e}"))
}

pub fn deposit_key() -> MethodKey {
    MethodKey::new("Bank", "deposit", &["int"])
}

pub fn main_key() -> MethodKey {
    MethodKey::new("App", "main", &[])
}

/// A compiled library: `Bank.deposit(int)` adds its argument to the
/// `Bank#balance` field, optionally logging the new balance
pub struct Library {
    pub program: Program,
    pub balance: VarId,
}

pub fn bank_library(logs: bool) -> Library {
    let mut b = ProgramBuilder::new();
    let balance = b.variable("Bank", "balance", VarScope::Field);
    let amount = b.variable("Bank.deposit", "amount", VarScope::Parameter);

    let current = b.read(balance);
    let added = b.read(amount);
    let sum = b.binary(ripple::ir::BinaryOp::Add, current, added);
    let update = b.assign(balance, sum);
    let mut statements = vec![b.expr_stmt(update)];
    if logs {
        let shown = b.read(balance);
        let log = b.io("print", vec![shown]);
        statements.push(b.expr_stmt(log));
    }
    let body = b.block(statements);
    b.method(deposit_key(), MethodModifiers::concrete(), Some(body));

    Library {
        program: b.finish(),
        balance,
    }
}

/// A later compilation that only sees `Bank.deposit` as an external
/// declared with `declared_hash`
pub struct Client {
    pub program: Program,
    pub balance: VarId,
}

pub fn bank_client(declared_hash: &str) -> Client {
    let mut b = ProgramBuilder::new();
    b.variable("App", "started", VarScope::Static);
    let balance = b.variable("Bank", "balance", VarScope::Field);
    b.external(deposit_key(), declared_hash);

    let amount = b.int(10);
    let call = b.call(deposit_key(), vec![amount]);
    let stmt = b.expr_stmt(call);
    let body = b.block(vec![stmt]);
    b.method(main_key(), MethodModifiers::concrete(), Some(body));

    Client {
        program: b.finish(),
        balance,
    }
}

/// Content hash of `key` as declared by the program that defines it
pub fn content_hash_of(program: &Program, key: &MethodKey) -> String {
    program
        .method_by_key(key)
        .map(|decl| decl.content_hash(program))
        .unwrap_or_else(|| panic!("{key} is not defined"))
}
