use codegen::{compile_source, CompileError, GeneratorOptions};

const FILE: &str = "test.mltn";

fn compile(src: &str) -> Result<String, CompileError<'static>> {
    compile_source(FILE, src, GeneratorOptions {comments: false})
}

/* The lines between `_start:` and the exit sequence. */
fn entry_point(asm: &str) -> Vec<&str> {
    asm.lines()
        .skip_while(|l| *l != "_start:")
        .skip(1)
        .take_while(|l| *l != "\tmov rax, 60")
        .collect()
}

fn calls(asm: &str) -> Vec<&str> {
    asm.lines()
        .filter(|l| l.starts_with("\tcall "))
        .map(|l| &l["\tcall ".len()..])
        .collect()
}

#[test]
fn program_layout() {
    let asm = compile("func 0 f() { } var x int;").unwrap();

    assert!(asm.starts_with("global _start\n"));
    let function = asm.find("f_:").unwrap();
    let start = asm.find("_start:\n").unwrap();
    assert!(function < start);
    assert!(asm.ends_with("\tmov rax, 60\n\tmov rdi, 0\n\tsyscall\n"));
}

#[test]
fn call_leaves_one_result_slot() {
    let src = "\
func 1 add(a int, b int) { return a + b; }
var r int;
r = add(2, 3);
";
    let asm = compile(src).unwrap();

    assert_eq!(entry_point(&asm), vec![
        "\tmov rax, 0",
        "\tpush rax",
        "\tpush QWORD 0",
        "\tmov rax, 3",
        "\tpush rax",
        "\tmov rax, 2",
        "\tpush rax",
        "\tcall add_I.I.",
        "\tadd rsp, 16",
        "\tpop rax",
        "\tmov QWORD [rsp + 0], rax",
    ]);
}

#[test]
fn callee_reads_parameters_and_writes_result_above_frame() {
    let asm = compile("func 1 add(a int, b int) { return a + b; }").unwrap();

    let expected = "\
add_I.I.:
\tpush rbp
\tmov rbp, rsp
\tpush QWORD [rbp + 16]
\tpush QWORD [rbp + 24]
\tpop rbx
\tpop rax
\tadd rax, rbx
\tpush rax
\tpop QWORD [rbp + 32]
\tpop rbp
\tret
";
    assert!(asm.contains(expected));
}

#[test]
fn return_releases_every_local_of_the_function() {
    let asm = compile("func 1 g() { var a int; { var b int; return a; } }").unwrap();
    assert!(asm.contains("\tpush QWORD [rsp + 8]\n\tpop QWORD [rbp + 16]\n\tadd rsp, 16\n\tpop rbp\n\tret\n"));
}

#[test]
fn discarded_results_are_dropped() {
    let asm = compile("func 2 two() { return 1, 2; } two();").unwrap();
    assert_eq!(entry_point(&asm), vec![
        "\tpush QWORD 0",
        "\tpush QWORD 0",
        "\tcall two_",
        "\tadd rsp, 16",
    ]);
}

#[test]
fn overloads_by_arity() {
    let src = "\
func 1 f(a int) { return a; }
func 1 f(a int, b int) { return a + b; }
var r int;
r = f(1);
r = f(1, 2);
";
    let asm = compile(src).unwrap();
    assert_eq!(calls(&asm), vec!["f_I.", "f_I.I."]);

    let err = compile(&format!("{}r = f(1, 2, 3);", src)).unwrap_err();
    assert_eq!(err.message(), "incorrect number of arguments passed to 'f': found 3");
    assert_eq!((err.pos().line, err.pos().column), (6, 5));
}

#[test]
fn duplicate_signature_is_rejected() {
    let err = compile("func 0 f(a int) { } func 1 f(b int) { return 1; }").unwrap_err();
    assert_eq!(err.message(), "function signature already defined: f_I.");
}

#[test]
fn recursion_resolves_to_the_function_being_defined() {
    let src = "func 1 fact(n int) { if (n <= 1) { return 1; } return n * fact(n - 1); }";
    let asm = compile(src).unwrap();
    assert_eq!(calls(&asm), vec!["fact_I."]);
}

#[test]
fn functions_are_visible_only_after_their_definition() {
    let err = compile("func 0 a() { b(); } func 0 b() { }").unwrap_err();
    assert_eq!(err.message(), "undefined function: 'b'");
}

#[test]
fn function_bodies_do_not_see_top_level_variables() {
    let err = compile("var g int; func 0 f() { g = 1; }").unwrap_err();
    assert_eq!(err.message(), "undefined variable: 'g'");
}

#[test]
fn wrong_return_count() {
    let err = compile("func 1 f() { return; }").unwrap_err();
    assert_eq!(err.message(), "incorrect number of values returned: expected 1, found 0");
}

#[test]
fn redeclaration_after_scope_closes() {
    assert!(compile("{ var x int; } var x int;").is_ok());

    let err = compile("var x int; { var x bool; }").unwrap_err();
    assert_eq!(err.message(), "variable identifier already used: x");
    assert_eq!((err.pos().line, err.pos().column), (1, 18));
}

#[test]
fn break_and_continue_target_the_loop_labels() {
    let src = "\
var i int;
while (i < 10) {
    var j int;
    if (i == 5) { break; }
    i = i + 1;
    continue;
}
";
    let asm = compile(src).unwrap();

    assert!(asm.contains("label1_startWhile:\n"));
    assert!(asm.contains("\tjz label2_endWhile\n"));
    assert!(asm.contains("\tadd rsp, 8\n\tjmp label2_endWhile\n"));
    assert!(asm.contains("\tadd rsp, 8\n\tjmp label1_startWhile\n"));
    assert!(asm.contains("\tjmp label1_startWhile\nlabel2_endWhile:\n"));
}

#[test]
fn break_after_inner_loop_targets_the_outer_one() {
    let src = "while (1 == 1) { while (1 == 1) { break; } break; }";
    let asm = compile(src).unwrap();

    let jumps: Vec<&str> = asm.lines().filter(|l| l.starts_with("\tjmp label")).collect();
    assert_eq!(jumps, vec![
        "\tjmp label4_endWhile",
        "\tjmp label3_startWhile",
        "\tjmp label2_endWhile",
        "\tjmp label1_startWhile",
    ]);
}

#[test]
fn break_outside_loop() {
    let err = compile("var x int;\nbreak;").unwrap_err();
    assert_eq!(err.message(), "can't break when not in a loop");
    assert_eq!((err.pos().line, err.pos().column), (2, 1));

    let err = compile("{ continue; }").unwrap_err();
    assert_eq!(err.message(), "can't continue when not in a loop");
}

#[test]
fn pointer_round_trip() {
    let src = "var x int; x = 5; var p *int; p = &x; var y int; y = *p;";
    let asm = compile(src).unwrap();

    // `&x` is taken with `x` one slot below the top.
    assert!(asm.contains("\tlea rax, [rsp + 8]\n\tpush rax\n\tpop rax\n\tmov QWORD [rsp + 0], rax\n"));
    assert!(asm.contains("\tmov rax, QWORD [rsp + 8]\n\tmov rax, QWORD [rax]\n"));
}

#[test]
fn pointer_assignment_stores_through_the_pointer() {
    let asm = compile("var x int; var p *int; p = &x; *p = 3;").unwrap();
    assert!(asm.contains("\tpop rax\n\tmov rbx, QWORD [rsp + 0]\n\tmov QWORD [rbx], rax\n"));
}

#[test]
fn syscall_registers() {
    let asm = compile("syscall(1, 3);").unwrap();
    assert_eq!(entry_point(&asm), vec![
        "\tmov rax, 1",
        "\tpush rax",
        "\tmov rax, 3",
        "\tpush rax",
        "\tpop rdi",
        "\tpop rax",
        "\tsyscall",
    ]);
}

#[test]
fn syscall_argument_limit_is_checked_while_parsing() {
    let err = compile("syscall(1, 2, 3, 4, 5, 6, 7, 8);").unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
    assert!(err.message().starts_with("too many arguments"));

    let asm = compile("syscall(1, 2, 3, 4, 5, 6, 7);").unwrap();
    let pops: Vec<&str> = asm.lines().filter(|l| l.starts_with("\tpop ")).collect();
    assert_eq!(pops, vec!["\tpop r9", "\tpop r8", "\tpop r10", "\tpop rdx", "\tpop rsi", "\tpop rdi", "\tpop rax"]);
}

#[test]
fn else_if_chain_nests_its_labels() {
    let src = "\
var a bool;
var b bool;
var x int;
if (a) { x = 1; } else if (b) { x = 2; } else { x = 3; }
";
    let asm = compile(src).unwrap();

    let flow: Vec<&str> = asm.lines()
        .filter(|l| l.starts_with("label") || l.starts_with("\tj"))
        .collect();
    assert_eq!(flow, vec![
        "\tjz label1_else",
        "\tjmp label2_endIf",
        "label1_else:",
        "\tjz label3_else",
        "\tjmp label4_endIf",
        "label3_else:",
        "label4_endIf:",
        "label2_endIf:",
    ]);
}

#[test]
fn error_messages_carry_file_and_position() {
    let err = compile("var x int; @").unwrap_err();
    assert!(matches!(err, CompileError::Lex(_)));
    assert_eq!(err.to_string(), "test.mltn:1:12: unknown token: '@'");

    let err = compile("var x int;\nx = 5").unwrap_err();
    assert!(matches!(err, CompileError::Parse(_)));
    assert_eq!(err.to_string(), "test.mltn:2:6: missing ';' (found end of input)");

    let err = compile("var x int;\nvar x int;").unwrap_err();
    assert!(matches!(err, CompileError::Gen(_)));
    assert_eq!(err.to_string(), "test.mltn:2:5: variable identifier already used: x");
}

#[test]
fn annotations() {
    let asm = compile_source(FILE, "func 0 f() { }", GeneratorOptions::default()).unwrap();
    let expected = "\
f_:
\t;=====FUNCTION SETUP=====
\tpush rbp
\tmov rbp, rsp
\t;=====FUNCTION BODY=====
\t;---start_scope---
\t;---end_scope---
\t;=====FUNCTION CLEANUP=====
\tpop rbp
\tret
";
    assert!(asm.contains(expected));
}
