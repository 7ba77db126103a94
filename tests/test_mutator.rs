use std::collections::BTreeMap;

use jsmutator::mutants::ROOT_MUTATION_ID;
use jsmutator::mutator::ParenTokens;
use jsmutator::parser_js;
use jsmutator::{JsDialect, Mutation, Mutator, MutatorError, RuleCode, apply_mutation};

fn mutations(source: &str) -> Vec<Mutation> {
    mutations_with(source, &[])
}

fn mutations_with(source: &str, overrides: &[(RuleCode, bool)]) -> Vec<Mutation> {
    let overrides: BTreeMap<RuleCode, bool> = overrides.iter().copied().collect();
    Mutator::new(source, JsDialect::JavaScript)
        .unwrap()
        .collect_mutations(&overrides)
}

fn of_rule(mutations: &[Mutation], rule: RuleCode) -> Vec<&Mutation> {
    mutations.iter().filter(|m| m.rule == rule).collect()
}

const ALL_ON: &[(RuleCode, bool)] = &[(RuleCode::Math, false), (RuleCode::UpdateExpression, false)];

const SAMPLE: &str = r#"
function sum(items, limit) {
    var total = 0;
    for (var i = 0; i < items.length; i++) {
        if (items[i] > limit || !items[i]) {
            continue;
        }
        total += items[i] * 2;
    }
    var meta = { count: items.length, label: 'sum', ok: true };
    log.info([total, meta], -1);
    return total;
}
"#;

// --- Range and identity invariants ---

#[test]
fn every_mutation_stays_inside_the_source() {
    let ms = mutations_with(SAMPLE, ALL_ON);
    assert!(!ms.is_empty());
    for m in &ms {
        assert!(m.begin <= m.end, "{:?}", m);
        assert!(m.end <= SAMPLE.len(), "{:?}", m);
        assert_eq!(&SAMPLE[m.begin..m.end], m.original);
    }
}

#[test]
fn splicing_the_original_back_undoes_any_mutant() {
    for m in mutations_with(SAMPLE, ALL_ON) {
        let mutated = apply_mutation(SAMPLE, &m);
        let tail = m.begin + m.replacement.len();
        let restored = format!("{}{}{}", &mutated[..m.begin], m.original, &mutated[tail..]);
        assert_eq!(restored, SAMPLE, "{:?}", m);
    }
}

#[test]
fn collecting_twice_yields_the_same_mutations() {
    let first: Vec<_> = mutations(SAMPLE)
        .into_iter()
        .map(|m| (m.begin, m.end, m.replacement))
        .collect();
    let second: Vec<_> = mutations(SAMPLE)
        .into_iter()
        .map(|m| (m.begin, m.end, m.replacement))
        .collect();
    assert_eq!(first, second);
}

#[test]
fn ids_count_up_from_one_per_walk() {
    let mutator = Mutator::new(SAMPLE, JsDialect::JavaScript).unwrap();
    for _ in 0..2 {
        let ms = mutator.collect_mutations(&BTreeMap::new());
        let ids: Vec<u64> = ms.iter().map(|m| m.id).collect();
        let expected: Vec<u64> = (1..=ms.len() as u64).collect();
        assert_eq!(ids, expected);
    }
}

#[test]
fn parents_are_root_or_earlier_mutations() {
    let ms = mutations_with(SAMPLE, ALL_ON);
    for m in &ms {
        if m.parent_id != ROOT_MUTATION_ID {
            let parent = ms
                .iter()
                .find(|p| p.id == m.parent_id)
                .unwrap_or_else(|| panic!("missing parent for {:?}", m));
            assert!(parent.id < m.id);
        }
    }
}

// --- Statement deletion ---

#[test]
fn deletes_each_statement_and_parents_its_subtree() {
    let source = "function add(a,b){return a+b;}";
    let ms = mutations_with(source, &[(RuleCode::Math, false)]);
    let blocks = of_rule(&ms, RuleCode::BlockStatement);
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].original, source);
    assert_eq!(blocks[0].parent_id, ROOT_MUTATION_ID);
    assert_eq!(blocks[1].original, "return a+b;");
    assert_eq!(blocks[1].replacement, "");
    assert_eq!(blocks[1].parent_id, blocks[0].id);

    let math = of_rule(&ms, RuleCode::Math);
    assert_eq!(math.len(), 1);
    assert_eq!(math[0].parent_id, blocks[1].id);
    assert_eq!(apply_mutation(source, math[0]), "function add(a,b){return a-b;}");
}

#[test]
fn empty_statements_are_not_deleted() {
    let ms = mutations("x();;");
    let blocks = of_rule(&ms, RuleCode::BlockStatement);
    assert_eq!(blocks.len(), 1);
    assert_eq!(blocks[0].original, "x();");
}

// --- Comparison ---

#[test]
fn less_than_yields_boundary_and_negation_only() {
    let source = "a < b;";
    let ms = mutations(source);
    let at_op: Vec<_> = ms.iter().filter(|m| m.begin == 2 && m.end == 3).collect();
    assert_eq!(at_op.len(), 2);
    assert_eq!(at_op[0].replacement, "<=");
    assert_eq!(at_op[1].replacement, ">=");
    assert!(at_op.iter().all(|m| m.rule == RuleCode::Comparison));
}

#[test]
fn strict_equality_has_boundary_and_negation() {
    let ms = mutations("a === b;");
    let cmp = of_rule(&ms, RuleCode::Comparison);
    let replacements: Vec<_> = cmp.iter().map(|m| m.replacement.as_str()).collect();
    assert_eq!(replacements, vec!["==", "!=="]);
}

#[test]
fn comparison_operands_are_walked() {
    let ms = mutations("a < 1;");
    let lit = of_rule(&ms, RuleCode::Literal);
    assert_eq!(lit.len(), 1);
    assert_eq!(lit[0].replacement, "2");
}

// --- Math and logical ---

#[test]
fn math_is_off_by_default() {
    let ms = mutations("x = a + b * c;");
    assert!(of_rule(&ms, RuleCode::Math).is_empty());
}

#[test]
fn math_flips_to_fixed_opposites() {
    let ms = mutations_with("x = a + b * c % d;", &[(RuleCode::Math, false)]);
    let replacements: Vec<_> = of_rule(&ms, RuleCode::Math)
        .iter()
        .map(|m| (m.original.clone(), m.replacement.clone()))
        .collect();
    assert!(replacements.contains(&("+".to_string(), "-".to_string())));
    assert!(replacements.contains(&("*".to_string(), "/".to_string())));
    assert!(replacements.contains(&("%".to_string(), "*".to_string())));
}

#[test]
fn logical_and_flips_to_or() {
    let source = "ok = a && b;";
    let ms = mutations(source);
    let logic = of_rule(&ms, RuleCode::LogicalExpression);
    assert_eq!(logic.len(), 1);
    assert_eq!(apply_mutation(source, logic[0]), "ok = a || b;");
}

#[test]
fn nullish_coalescing_is_not_a_logical_flip() {
    let ms = mutations("x = a ?? b;");
    assert!(of_rule(&ms, RuleCode::LogicalExpression).is_empty());
}

// --- Unary, update, literal ---

#[test]
fn unary_operator_is_stripped() {
    let source = "x = !ready;";
    let ms = mutations(source);
    let unary = of_rule(&ms, RuleCode::UnaryExpression);
    assert_eq!(unary.len(), 1);
    assert_eq!(apply_mutation(source, unary[0]), "x = ready;");
}

#[test]
fn unary_is_terminal() {
    let ms = mutations("x = -(a < 1);");
    assert!(of_rule(&ms, RuleCode::Comparison).is_empty());
    assert!(of_rule(&ms, RuleCode::Literal).is_empty());
}

#[test]
fn typeof_is_not_stripped() {
    let ms = mutations("x = typeof y;");
    assert!(of_rule(&ms, RuleCode::UnaryExpression).is_empty());
}

#[test]
fn update_flips_prefix_and_postfix() {
    let source = "a++; --b;";
    let ms = mutations_with(source, &[(RuleCode::UpdateExpression, false)]);
    let updates = of_rule(&ms, RuleCode::UpdateExpression);
    assert_eq!(updates.len(), 2);
    assert_eq!((updates[0].begin, updates[0].end), (1, 3));
    assert_eq!(apply_mutation(source, updates[0]), "a--; --b;");
    assert_eq!((updates[1].begin, updates[1].end), (5, 7));
    assert_eq!(apply_mutation(source, updates[1]), "a++; ++b;");
}

#[test]
fn literals_get_their_replacements() {
    let source = "a = 41; b = 'hi'; c = true; d = 1.5;";
    let ms = mutations(source);
    let lits: Vec<_> = of_rule(&ms, RuleCode::Literal)
        .iter()
        .map(|m| (m.original.clone(), m.replacement.clone()))
        .collect();
    assert_eq!(
        lits,
        vec![
            ("41".to_string(), "42".to_string()),
            ("'hi'".to_string(), "\"MUTATION!\"".to_string()),
            ("true".to_string(), "false".to_string()),
            ("1.5".to_string(), "2.5".to_string()),
        ]
    );
}

// --- Arrays and objects ---

#[test]
fn array_elements_are_deleted_through_the_next_comma() {
    let source = "[1, 2, 3];";
    let ms = mutations(source);
    let arr = of_rule(&ms, RuleCode::Array);
    assert_eq!(arr.len(), 3);
    assert_eq!((arr[0].begin, arr[0].end), (1, 4));
    assert_eq!((arr[1].begin, arr[1].end), (4, 7));
    assert_eq!((arr[2].begin, arr[2].end), (7, 8));
    assert_eq!(apply_mutation(source, arr[1]), "[1, 3];");
    assert_eq!(apply_mutation(source, arr[2]), "[1, 2, ];");
}

#[test]
fn array_elements_hang_off_their_deletion() {
    let ms = mutations("[1, 2, 3];");
    let arr = of_rule(&ms, RuleCode::Array);
    let two = ms
        .iter()
        .find(|m| m.rule == RuleCode::Literal && m.original == "2")
        .unwrap();
    assert_eq!(two.parent_id, arr[1].id);
}

#[test]
fn object_properties_are_deleted_with_their_comma() {
    let source = "o = { a: 1, b: 'x' };";
    let ms = mutations(source);
    let obj = of_rule(&ms, RuleCode::Object);
    assert_eq!(obj.len(), 2);
    assert_eq!(obj[0].original, "a: 1, ");
    assert_eq!(obj[1].original, "b: 'x'");
    assert_eq!(apply_mutation(source, obj[0]), "o = { b: 'x' };");

    let lits = of_rule(&ms, RuleCode::Literal);
    assert_eq!(lits.len(), 2);
    assert_eq!(lits[0].parent_id, obj[0].id);
    assert_eq!(lits[1].parent_id, obj[1].id);
}

#[test]
fn object_keys_are_not_mutated() {
    let ms = mutations("o = { 'key': x };");
    assert!(of_rule(&ms, RuleCode::Literal).is_empty());
}

#[test]
fn object_methods_are_walked_not_deleted() {
    let ms = mutations("o = { run() { return a < b; } };");
    assert!(of_rule(&ms, RuleCode::Object).is_empty());
    assert_eq!(of_rule(&ms, RuleCode::Comparison).len(), 2);
}

// --- Calls ---

#[test]
fn method_call_mutates_arguments_and_receiver() {
    let source = "foo.bar(x, 2);";
    let ms = mutations(source);
    let calls = of_rule(&ms, RuleCode::MethodCall);
    let results: Vec<_> = calls.iter().map(|m| apply_mutation(source, m)).collect();
    assert_eq!(
        results,
        vec![
            "foo.bar(\"MUTATION!\", 2);".to_string(),
            "foo.bar(x, 3);".to_string(),
            "foo;".to_string(),
        ]
    );
    // the literal argument is walked again but its change is only kept once
    assert!(of_rule(&ms, RuleCode::Literal).is_empty());
}

#[test]
fn literal_arguments_are_mutated_exactly_once() {
    let source = "f(2, 'a', x);";
    let ms = mutations(source);
    for literal in ["2", "'a'"] {
        let at = source.find(literal).unwrap();
        let hits = ms.iter().filter(|m| m.begin == at && m.end == at + literal.len()).count();
        assert_eq!(hits, 1, "{literal}");
    }
    let ids: Vec<u64> = ms.iter().map(|m| m.id).collect();
    assert_eq!(ids, (1..=ms.len() as u64).collect::<Vec<_>>());
}

#[test]
fn literal_arguments_still_get_literal_mutants_without_method_call() {
    let ms = mutations_with("f(41);", &[(RuleCode::MethodCall, true)]);
    let literals = of_rule(&ms, RuleCode::Literal);
    assert_eq!(literals.len(), 1);
    assert_eq!(literals[0].replacement, "42");
    assert!(of_rule(&ms, RuleCode::MethodCall).is_empty());
}

#[test]
fn single_argument_call_is_replaced_by_its_argument() {
    let source = "f(a + b);";
    let ms = mutations(source);
    let calls = of_rule(&ms, RuleCode::MethodCall);
    assert_eq!(calls.len(), 2);
    assert_eq!(apply_mutation(source, calls[0]), "f(\"MUTATION!\");");
    assert_eq!(apply_mutation(source, calls[1]), "a + b;");
}

#[test]
fn spread_argument_is_not_promoted() {
    let ms = mutations("f(...args);");
    let calls = of_rule(&ms, RuleCode::MethodCall);
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].original, "...args");
}

#[test]
fn call_arguments_are_walked() {
    let ms = mutations("check(a < b, c);");
    assert_eq!(of_rule(&ms, RuleCode::Comparison).len(), 2);
}

// --- Loops ---

#[test]
fn for_loop_test_and_update_are_left_alone() {
    let source = "for (var i = 0; i < arr.length; i++) { arr[i] = i; }";
    let ms = mutations_with(source, ALL_ON);

    let test_at = source.find("i < arr.length").unwrap();
    let test_range = test_at..test_at + "i < arr.length".len();
    let update_at = source.find("i++").unwrap();
    let update_range = update_at..update_at + 3;
    for m in &ms {
        let inside_test = test_range.start <= m.begin && m.end <= test_range.end;
        let inside_update = update_range.start <= m.begin && m.end <= update_range.end;
        assert!(!inside_test && !inside_update, "touches a loop clause: {:?}", m);
    }

    assert!(of_rule(&ms, RuleCode::UpdateExpression).is_empty());
    assert!(ms
        .iter()
        .any(|m| m.rule == RuleCode::BlockStatement && m.original == "arr[i] = i;"));
}

#[test]
fn for_loop_initializer_is_walked() {
    let ms = mutations("for (var i = 0; i < n; i++) {}");
    let lit = of_rule(&ms, RuleCode::Literal);
    assert_eq!(lit.len(), 1);
    assert_eq!(lit[0].original, "0");
}

#[test]
fn writes_to_loop_variables_are_not_mutated() {
    let source = "while (n > 0) { k++; n = n - 1; n--; }";
    let ms = mutations_with(source, ALL_ON);

    let updates = of_rule(&ms, RuleCode::UpdateExpression);
    assert_eq!(updates.len(), 1);
    assert_eq!(apply_mutation(source, updates[0]), "while (n > 0) { k--; n = n - 1; n--; }");

    assert!(of_rule(&ms, RuleCode::Math).is_empty());
    assert!(of_rule(&ms, RuleCode::Comparison).is_empty());
    // statements in the body can still be deleted
    assert_eq!(of_rule(&ms, RuleCode::BlockStatement).len(), 4);
}

#[test]
fn do_while_protects_its_test_variables() {
    let ms = mutations_with("do { i++; j++; } while (i < 3);", ALL_ON);
    let updates = of_rule(&ms, RuleCode::UpdateExpression);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].begin, "do { i++; j".len());
}

#[test]
fn inner_function_declaring_the_name_releases_it() {
    let source = r#"
while (i < 10) {
    run(function () { var i = 0; i++; });
    run(function () { i++; });
    i++;
}
"#;
    let ms = mutations_with(source, ALL_ON);
    let updates = of_rule(&ms, RuleCode::UpdateExpression);
    assert_eq!(updates.len(), 1);
    let shadowing = source.find("var i = 0; i++").unwrap();
    assert_eq!(updates[0].begin, shadowing + "var i = 0; i".len());
}

#[test]
fn parameters_shadow_loop_variables() {
    let source = "while (i < 10) { each(function (i) { i++; }); i++; }";
    let ms = mutations_with(source, ALL_ON);
    let updates = of_rule(&ms, RuleCode::UpdateExpression);
    assert_eq!(updates.len(), 1);
}

// --- Overrides ---

#[test]
fn excluded_rule_still_walks_its_children() {
    let ms = mutations_with("function f() { return a < b; }", &[(RuleCode::BlockStatement, true)]);
    assert!(of_rule(&ms, RuleCode::BlockStatement).is_empty());
    assert_eq!(of_rule(&ms, RuleCode::Comparison).len(), 2);
}

// --- Function scoping ---

#[test]
fn scoped_walk_only_covers_the_named_function() {
    let source = "function a(x) { return x < 1; }\nfunction b(y) { return y > 2; }";
    let mutator = Mutator::new(source, JsDialect::JavaScript)
        .unwrap()
        .scoped_to("b")
        .unwrap();
    let ms = mutator.collect_mutations(&BTreeMap::new());
    let b_start = source.find("function b").unwrap();
    assert!(!ms.is_empty());
    assert!(ms.iter().all(|m| m.begin > b_start));
}

#[test]
fn scoping_to_a_missing_function_lists_the_real_ones() {
    let err = Mutator::new("function a() {}\nconst b = () => 1;", JsDialect::JavaScript)
        .unwrap()
        .scoped_to("c")
        .err()
        .unwrap();
    match err {
        MutatorError::FunctionNotFound { name, available } => {
            assert_eq!(name, "c");
            assert_eq!(available, vec!["a".to_string(), "b".to_string()]);
        }
        other => panic!("unexpected error {other}"),
    }
}

// --- Parse failures ---

#[test]
fn syntax_error_is_a_parse_failure() {
    let err = Mutator::new("function (", JsDialect::JavaScript).err().unwrap();
    assert!(matches!(err, MutatorError::Parse { .. }));
}

// --- Application ---

#[test]
#[should_panic(expected = "outside a source")]
fn out_of_range_mutation_panics() {
    let mut m = mutations("a < b;").remove(0);
    m.end = 100;
    apply_mutation("a < b;", &m);
}

#[test]
fn location_uses_one_based_column() {
    let ms = mutations("x = a < b;");
    let cmp = of_rule(&ms, RuleCode::Comparison);
    assert_eq!(cmp[0].location("src/x.js"), "src/x.js:1:7");
}

#[test]
fn multi_line_positions() {
    let ms = mutations("x = 1;\n  y = 'z';");
    let lit = of_rule(&ms, RuleCode::Literal);
    assert_eq!((lit[1].line, lit[1].column), (2, 6));
}

// --- Parenthesis calibration ---

#[test]
fn calibration_keeps_parenthesis_pairs_whole() {
    let source = "f(a)(b);";
    let tree = parser_js::parse(source, JsDialect::JavaScript).unwrap();
    let parens = ParenTokens::collect(tree.root_node(), source);
    // starts on `)` of the first call and ends just past `(` of the second
    assert_eq!(parens.calibrate(3, 5), (4, 4));
    assert_eq!(parens.calibrate(2, 3), (2, 3));
    assert_eq!(parens.calibrate(0, 7), (0, 7));
}

#[test]
fn engine_spans_never_split_a_parenthesis_pair() {
    let source = "if ((a + 1) * (b - 2) > f(c)(d)) { g((x), [(y), z], { k: (w) }); }";
    for m in mutations_with(source, ALL_ON) {
        let opens = m.original.matches('(').count();
        let closes = m.original.matches(')').count();
        assert_eq!(opens, closes, "{:?}", m);
    }
}

#[test]
fn parens_inside_strings_are_not_tokens() {
    let source = "s = '(';";
    let tree = parser_js::parse(source, JsDialect::JavaScript).unwrap();
    let parens = ParenTokens::collect(tree.root_node(), source);
    assert_eq!(parens.calibrate(4, 6), (4, 6));
}

// --- Literals that are not mutated ---

#[test]
fn module_specifiers_are_left_alone() {
    let source = "import x from './x';\nexport { y } from './y';\nexport * from './z';\nconst s = 'kept';\nexport default 'too';";
    let ms = mutations(source);
    let literals: Vec<_> = of_rule(&ms, RuleCode::Literal)
        .iter()
        .map(|m| m.original.clone())
        .collect();
    assert_eq!(literals, vec!["'kept'".to_string(), "'too'".to_string()]);
}

#[test]
fn typescript_literal_types_are_left_alone() {
    let source = "type Mode = 'on' | 'off';\nlet mode: Mode = 'on';";
    let ms = Mutator::new(source, JsDialect::TypeScript)
        .unwrap()
        .collect_mutations(&BTreeMap::new());
    let literals = of_rule(&ms, RuleCode::Literal);
    assert_eq!(literals.len(), 1);
    assert_eq!(literals[0].begin, source.rfind("'on'").unwrap());
}

#[test]
fn overflowing_number_literal_is_skipped() {
    let ms = mutations("x = 1e400;\ny = 1;");
    let literals = of_rule(&ms, RuleCode::Literal);
    assert_eq!(literals.len(), 1);
    assert_eq!(literals[0].original, "1");
}
