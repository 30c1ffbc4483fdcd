use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use abacus::{
    diagnostics::{AbacusError, DiagnosticKind},
    fraction::Fraction,
    runtime::Interpreter,
    value::Value,
};

fn eval(source: &str) -> Value {
    let mut interpreter = Interpreter::new();
    interpreter
        .eval_source(source)
        .expect("evaluation should succeed")
}

fn eval_error(source: &str) -> AbacusError {
    let mut interpreter = Interpreter::new();
    match interpreter.eval_source(source) {
        Ok(value) => panic!("expected error, received value {value}"),
        Err(err) => err,
    }
}

fn expect_fraction(value: &Value) -> Fraction {
    match value {
        Value::Fraction(fraction) => *fraction,
        _ => panic!("expected Fraction, found {}", value.type_name()),
    }
}

fn expect_int(value: &Value) -> i64 {
    let fraction = expect_fraction(value);
    assert!(fraction.is_integer(), "expected integer, found {fraction}");
    fraction.numerator()
}

fn expect_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        _ => panic!("expected Bool, found {}", value.type_name()),
    }
}

fn expect_kind(err: AbacusError, kind: DiagnosticKind) {
    assert_eq!(err.kind(), Some(kind), "unexpected error: {err}");
}

/// Capture target for `print` output.
#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn eval_with_output(source: &str) -> (Value, String) {
    let buffer = SharedBuffer::default();
    let mut interpreter = Interpreter::with_output(buffer.clone());
    let value = interpreter
        .eval_source(source)
        .expect("evaluation should succeed");
    (value, buffer.contents())
}

#[test]
fn evaluates_basic_arithmetic() {
    assert_eq!(expect_int(&eval("2 + 2")), 4);
    assert_eq!(expect_int(&eval("2 + 3 * 4")), 14);
    assert_eq!(expect_int(&eval("10 - 4 - 3")), 3);
}

#[test]
fn fractions_stay_exact() {
    let value = eval("1/3 + 1/6");
    assert_eq!(expect_fraction(&value), Fraction::new(1, 2).unwrap());
}

#[test]
fn decimal_literals_are_exact_fractions() {
    let value = eval("0.5 + 0.25");
    assert_eq!(expect_fraction(&value), Fraction::new(3, 4).unwrap());
    assert_eq!(eval("0.1 + 0.2").to_string(), "3/10");
}

#[test]
fn division_by_zero_faults() {
    expect_kind(eval_error("1/0"), DiagnosticKind::DivisionByZero);
}

#[test]
fn arithmetic_overflow_faults_instead_of_panicking() {
    expect_kind(
        eval_error("10000000000 * 10000000000"),
        DiagnosticKind::Runtime,
    );
    expect_kind(eval_error("10 ^ 100"), DiagnosticKind::Runtime);
    // Close to the 64-bit edge but still representable.
    assert_eq!(
        eval("1/3000000000 + 1/3000000001").to_string(),
        "6000000001/9000000003000000000"
    );
}

#[test]
fn exponent_is_right_associative() {
    assert_eq!(expect_int(&eval("2^3^2")), 512);
}

#[test]
fn factorial_applies_after_exponentiation() {
    assert_eq!(expect_int(&eval("5!")), 120);
    // `2^3!` reads as `(2^3)!`
    assert_eq!(expect_int(&eval("2^3!")), 40320);
}

#[test]
fn loose_equality_compares_numeric_value() {
    assert!(expect_bool(&eval("1/2 == 2/4")));
    assert!(expect_bool(&eval("1 != 2")));
}

#[test]
fn ternary_selects_branch() {
    assert_eq!(expect_int(&eval("x = 3  x > 2 ? 10 : 20")), 10);
    assert_eq!(expect_int(&eval("x = 1  x > 2 ? 10 : 20")), 20);
}

#[test]
fn compound_assignment_applies_operator() {
    assert_eq!(expect_int(&eval("x = 10  x += 5  x")), 15);
    assert_eq!(expect_int(&eval("x = 2  x ^= 5  x")), 32);
}

#[test]
fn when_block_runs_on_true_guard() {
    assert_eq!(expect_int(&eval("x = 5  when x > 3 { x *= 2 }  x")), 10);
    assert_eq!(expect_int(&eval("when false { 1 }  42")), 42);
}

#[test]
fn when_guard_requires_bool() {
    expect_kind(eval_error("when 1 { 2 }"), DiagnosticKind::TypeMismatch);
}

#[test]
fn for_loop_accumulates_sum() {
    let value = eval(
        r#"
        sum = 0
        for item in [1, 2, 3, 4] {
            sum += item
        }
        sum
        "#,
    );
    assert_eq!(expect_int(&value), 10);
}

#[test]
fn loop_bindings_destructure_and_persist() {
    // Loop variables are global bindings; they keep their final values.
    let value = eval(
        r#"
        for a, b in [[1, 2], [3, 4]] { }
        a + b
        "#,
    );
    assert_eq!(expect_int(&value), 7);
}

#[test]
fn function_declaration_and_call() {
    assert_eq!(expect_int(&eval("fn double(x) { return x * 2 }  double(21)")), 42);
}

#[test]
fn function_without_return_yields_true() {
    assert!(expect_bool(&eval("fn noop() { 1 + 1 }  noop()")));
}

#[test]
fn default_parameters_fill_omitted_arguments() {
    let value = eval(
        r#"
        fn shout(word, punct = "!") {
            return upper(word) + punct
        }
        shout("hey")
        "#,
    );
    assert_eq!(value.to_string(), "HEY!");
}

#[test]
fn arity_mismatch_faults() {
    expect_kind(
        eval_error("fn f(x) { return x }  f(1, 2)"),
        DiagnosticKind::ArityMismatch,
    );
    expect_kind(eval_error("abs(1, 2)"), DiagnosticKind::ArityMismatch);
}

#[test]
fn unknown_identifier_faults() {
    expect_kind(eval_error("nope"), DiagnosticKind::UnknownIdentifier);
    expect_kind(eval_error("nope()"), DiagnosticKind::UnknownIdentifier);
}

#[test]
fn parameters_bind_into_the_flat_namespace() {
    // No call frames: the argument binding is a plain global variable.
    assert_eq!(expect_int(&eval("fn f(x) { return x }  f(99)  x")), 99);
}

#[test]
fn assigned_anonymous_function_is_callable() {
    assert_eq!(expect_int(&eval("square = fn(x) => x * x  square(6)")), 36);
}

#[test]
fn map_applies_function_over_sequence() {
    let value = eval("map([1, 2, 3], fn(x) => x * x)");
    assert_eq!(value.to_string(), "[1, 4, 9]");
}

#[test]
fn filter_keeps_matching_elements() {
    let value = eval("filter(range(1, 6, 1), fn(x) => x % 2 == 0)");
    assert_eq!(value.to_string(), "[2, 4]");
}

#[test]
fn reduce_folds_with_initial_value() {
    let value = eval("reduce([1, 2, 3, 4], fn(acc, x) => acc + x, 0)");
    assert_eq!(expect_int(&value), 10);
}

#[test]
fn pipe_takes_absolute_value_of_numbers() {
    assert_eq!(expect_int(&eval("|-5|")), 5);
    assert_eq!(expect_int(&eval("x = 0 - 7  |x|")), 7);
}

#[test]
fn pipe_takes_length_of_sequences() {
    assert_eq!(expect_int(&eval("|[1, 2, 3]|")), 3);
    assert_eq!(expect_int(&eval("|\"hello\"|")), 5);
}

#[test]
fn logical_operators_short_circuit() {
    assert!(expect_bool(&eval("fn boom() { return missing }  true || boom()")));
    assert!(!expect_bool(&eval("fn boom() { return missing }  false && boom()")));
}

#[test]
fn text_concatenation() {
    assert_eq!(eval("\"foo\" + \"bar\"").to_string(), "foobar");
}

#[test]
fn sequence_mutation_is_visible_through_the_variable() {
    assert_eq!(expect_int(&eval("xs = [1, 2]  append(xs, 3)  length(xs)")), 3);
    assert_eq!(eval("xs = [1, 2]  set(xs, 0, 9)  xs").to_string(), "[9, 2]");
}

#[test]
fn slice_is_end_inclusive() {
    assert_eq!(eval("slice([1, 2, 3, 4], 1, 2)").to_string(), "[2, 3]");
    assert_eq!(eval("slice(\"abacus\", 0, 2)").to_string(), "aba");
}

#[test]
fn insert_and_remove_mutate_in_place() {
    assert_eq!(eval("xs = [1, 3]  insert(xs, 1, 2)  xs").to_string(), "[1, 2, 3]");
    // remove hands back the evicted element.
    assert_eq!(expect_int(&eval("xs = [1, 2, 3]  remove(xs, 0)")), 1);
    assert_eq!(eval("xs = [1, 2, 3]  remove(xs, 0)  xs").to_string(), "[2, 3]");
}

#[test]
fn index_of_and_contains_search_sequences() {
    assert_eq!(expect_int(&eval("index_of([5, 6, 7], 6)")), 1);
    assert_eq!(expect_int(&eval("index_of([5, 6, 7], 9)")), -1);
    assert!(expect_bool(&eval("contains([5, 6, 7], 7)")));
    assert!(!expect_bool(&eval("contains([5, 6, 7], 8)")));
}

#[test]
fn text_reverse() {
    assert_eq!(eval("reverse(\"abc\")").to_string(), "cba");
}

#[test]
fn text_find_reports_character_positions() {
    assert_eq!(expect_int(&eval("find(\"abacus\", \"cus\")")), 3);
    assert_eq!(expect_int(&eval("find(\"abacus\", \"z\")")), -1);
    assert!(expect_bool(&eval("contains(\"abacus\", \"cus\")")));
}

#[test]
fn text_replace_and_split() {
    assert_eq!(eval("replace(\"a-b-c\", \"-\", \"+\")").to_string(), "a+b+c");
    assert_eq!(eval("split(\"a,b,c\", \",\")").to_string(), "[a, b, c]");
    // An empty separator splits into single characters.
    assert_eq!(eval("split(\"abc\", \"\")").to_string(), "[a, b, c]");
}

#[test]
fn substring_is_end_inclusive() {
    assert_eq!(eval("substring(\"abacus\", 1, 3)").to_string(), "bac");
}

#[test]
fn text_padding_and_truncation() {
    assert_eq!(eval("pad_start(\"7\", 3, \"0\")").to_string(), "007");
    assert_eq!(eval("pad_end(\"7\", 3, \"0\")").to_string(), "700");
    assert_eq!(eval("truncate(\"abacus\", 3)").to_string(), "aba");
}

#[test]
fn text_insert_and_remove_mutate_the_value() {
    assert_eq!(eval("t = \"ac\"  insert(t, 1, \"b\")  t").to_string(), "abc");
    assert_eq!(eval("t = \"abc\"  remove(t, 1)  t").to_string(), "ac");
}

#[test]
fn index_out_of_range_faults() {
    expect_kind(eval_error("get([1, 2], 5)"), DiagnosticKind::IndexOutOfRange);
}

#[test]
fn range_is_end_exclusive() {
    assert_eq!(eval("range(0, 10, 3)").to_string(), "[0, 3, 6, 9]");
    assert_eq!(eval("range(5, 0, -2)").to_string(), "[5, 3, 1]");
}

#[test]
fn complex_arithmetic_through_the_i_constant() {
    assert_eq!(expect_int(&eval("re((2 + 3 * i) * (1 - i))")), 5);
    assert_eq!(expect_int(&eval("im((2 + 3 * i) * (1 - i))")), 1);
}

#[test]
fn matrix_determinant_native() {
    assert_eq!(expect_int(&eval("det([[1, 2], [3, 4]])")), -2);
}

#[test]
fn matrix_dimension_mismatch_faults() {
    expect_kind(
        eval_error("[[1, 2]] + [[1], [2]]"),
        DiagnosticKind::DimensionMismatch,
    );
}

#[test]
fn print_joins_arguments_with_spaces() {
    let (_, output) = eval_with_output("print(\"answer:\", 6 * 7)");
    assert_eq!(output, "answer: 42\n");
}

#[test]
fn print_interpolates_variable_tokens() {
    let (_, output) = eval_with_output("name = \"world\"  print(\"hello $name\")");
    assert_eq!(output, "hello world\n");
}

#[test]
fn interpolation_call_form_reenters_the_evaluator() {
    let (_, output) =
        eval_with_output("fn double(x) { return x * 2 }  print(\"got $double(21)\")");
    assert_eq!(output, "got 42\n");
}

#[test]
fn interpolation_call_form_resolves_function_variables() {
    let (_, output) = eval_with_output("square = fn(x) => x * x  print(\"$square(6)\")");
    assert_eq!(output, "36\n");
}

#[test]
fn unresolved_tokens_stay_verbatim() {
    let (_, output) = eval_with_output("print(\"cost: $missing dollars\")");
    assert_eq!(output, "cost: $missing dollars\n");
}

#[test]
fn pretty_flag_switches_to_decimal_rendering() {
    let (_, plain) = eval_with_output("print(1/2)");
    assert_eq!(plain, "1/2\n");
    let (_, pretty) = eval_with_output("pretty = true  print(1/2)");
    assert_eq!(pretty, "0.5\n");
}

#[test]
fn top_level_return_stops_the_program() {
    assert_eq!(expect_int(&eval("return 7  1 + 1")), 7);
}

#[test]
fn program_value_is_the_last_expression() {
    assert_eq!(expect_int(&eval("x = 40  x + 2")), 42);
    // A program producing no value yields the true sentinel.
    assert!(expect_bool(&eval("when false { 1 }")));
}

#[test]
fn block_comments_nest() {
    assert_eq!(expect_int(&eval("/* outer /* inner */ still out */ 5")), 5);
}
