use cr_lexer::scanner::keywords::Keyword;
use cr_lexer::scanner::lexer::tokenize;
use cr_lexer::{
    BracketKind, Grammar, GrammarVersion, LexError, Span, Token, TokenKind, TokenTree,
    tokenize_tree,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn tree_ok(source: &str) -> Vec<TokenTree> {
    tokenize_tree(source.as_bytes(), Grammar::shared()).expect("scan should succeed")
}

fn tree_err(source: &str) -> LexError {
    tokenize_tree(source.as_bytes(), Grammar::shared()).unwrap_err()
}

/// Every leaf token in the tree, depth first.
fn leaves(trees: &[TokenTree]) -> Vec<Token> {
    TokenTree::flatten(trees)
        .into_iter()
        .filter(|t| !t.kind.is_group_marker())
        .collect()
}

fn count_kind(trees: &[TokenTree], kind: TokenKind) -> usize {
    leaves(trees).iter().filter(|t| t.kind == kind).count()
}

#[test]
fn parenthesized_list_becomes_one_group() {
    let tree = tree_ok("(a,b)");
    assert_eq!(tree.len(), 2);
    let group = tree[0].as_group().expect("paren group");
    assert_eq!(group.bracket_kind, BracketKind::Paren);
    assert_eq!(group.span, Span::new(0, 4));
    let kinds: Vec<TokenKind> = group
        .children
        .iter()
        .map(|c| c.as_token().expect("leaf").kind)
        .collect();
    assert_eq!(
        kinds,
        vec![TokenKind::Identifier, TokenKind::Comma, TokenKind::Identifier]
    );
    assert_eq!(tree[1].as_token().map(|t| t.kind), Some(TokenKind::End));
}

#[test]
fn mismatched_bracket_names_both_kinds() {
    let err = tree_err("( ] ");
    assert!(
        matches!(
            err,
            LexError::MismatchedBracket {
                line: 1,
                expected: Some(BracketKind::Paren),
                found: BracketKind::Bracket,
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn unclosed_brace_is_reported() {
    let err = tree_err("{ a");
    assert!(matches!(err, LexError::UnclosedBracket { line: 1, .. }));
}

#[test]
fn stray_closer_at_root_is_a_mismatch() {
    let err = tree_err("a )");
    assert!(matches!(
        err,
        LexError::MismatchedBracket { expected: None, found: BracketKind::Paren, .. }
    ));
}

#[test]
fn block_comment_advances_line_count() {
    let tree = tree_ok("x\n/*\n\n\n*/ y");
    let tokens = leaves(&tree);
    assert_eq!(tokens[0].line, 1);
    assert_eq!(tokens[1].line, 2 + 3);
}

#[test]
fn wait_is_keyword_but_waiting_is_not() {
    let grammar = Grammar::new(GrammarVersion::Classic);
    let tree = tokenize_tree(b"wait waiting", &grammar).expect("scan");
    let kinds: Vec<TokenKind> = leaves(&tree).iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Keyword(Keyword::Wait),
            TokenKind::Identifier,
            TokenKind::End
        ]
    );
}

#[test]
fn brackets_inside_literals_and_comments_do_not_nest() {
    let tree = tree_ok("f(\"(\", ']', /* { */ x) // }");
    assert_eq!(tree.len(), 3);
    let group = tree[1].as_group().expect("call arguments");
    assert_eq!(group.children.len(), 5);
}

#[test]
fn group_records_open_and_close_lines() {
    let tree = tree_ok("{\n  a;\n}");
    let group = tree[0].as_group().expect("brace group");
    assert_eq!((group.line, group.close_line), (1, 3));
}

#[test]
fn worker_fixture_builds_tree() {
    let source = include_str!("../fixtures/worker.cr");
    let tree = tree_ok(source);

    assert_eq!(count_kind(&tree, TokenKind::Include), 2);
    assert_eq!(count_kind(&tree, TokenKind::Keyword(Keyword::Coroutine)), 2);
    assert_eq!(count_kind(&tree, TokenKind::Keyword(Keyword::Endvars)), 2);
    assert_eq!(count_kind(&tree, TokenKind::Keyword(Keyword::Cancel)), 1);
    assert_eq!(count_kind(&tree, TokenKind::Keyword(Keyword::Who)), 1);
    assert_eq!(count_kind(&tree, TokenKind::Arrow), 1);
    assert_eq!(count_kind(&tree, TokenKind::HexLiteral), 1);
    assert_eq!(count_kind(&tree, TokenKind::CharLiteral), 1);

    // struct job { ... } ;
    let struct_at = tree
        .iter()
        .position(|t| t.as_token().map(|t| t.kind) == Some(TokenKind::Keyword(Keyword::Struct)))
        .expect("struct keyword at top level");
    let body = tree[struct_at + 2].as_group().expect("struct body");
    assert_eq!(body.bracket_kind, BracketKind::Brace);
    assert_eq!(body.line, 4);
    assert_eq!(body.close_line, 7);

    let end = tree.last().and_then(TokenTree::as_token).expect("end token");
    assert_eq!(end.kind, TokenKind::End);
    assert_eq!(end.span, Span::at(source.len()));
}

#[test]
fn worker_fixture_under_classic_grammar() {
    let source = include_str!("../fixtures/worker.cr");
    let grammar = Grammar::new(GrammarVersion::Classic);
    let tree = tokenize_tree(source.as_bytes(), &grammar).expect("scan");
    assert_eq!(count_kind(&tree, TokenKind::Keyword(Keyword::Cancel)), 0);
    assert_eq!(count_kind(&tree, TokenKind::Colon), 0);
    assert!(count_kind(&tree, TokenKind::Identifier) > 0);
}

#[test]
fn mismatched_fixture_reports_closing_line() {
    let err = tree_err(include_str!("../fixtures/error_mismatched.cr"));
    assert!(
        matches!(
            err,
            LexError::MismatchedBracket {
                line: 4,
                expected: Some(BracketKind::Bracket),
                found: BracketKind::Brace,
                ..
            }
        ),
        "{err}"
    );
}

#[test]
fn unclosed_fixture_reports_innermost_open_line() {
    let err = tree_err(include_str!("../fixtures/error_unclosed.cr"));
    assert!(matches!(err, LexError::UnclosedBracket { line: 1, .. }), "{err}");
}

#[test]
fn unterminated_comment_fixture_reports_opening_line() {
    let err = tree_err(include_str!("../fixtures/error_unterminated_comment.cr"));
    assert!(matches!(err, LexError::UnterminatedComment { line: 2, .. }), "{err}");
}

#[test]
fn diagnostic_renders_with_source() {
    let source = include_str!("../fixtures/error_unclosed.cr");
    let err = tree_err(source).with_source_code("error_unclosed.cr", source);
    let mut out = String::new();
    miette::GraphicalReportHandler::new_themed(miette::GraphicalTheme::unicode_nocolor())
        .render_report(&mut out, &err)
        .expect("render");
    assert!(out.contains("cr::unclosed_bracket"), "{out}");
    assert!(out.contains("opened here"), "{out}");
}

#[test]
fn deeply_nested_tree_is_walked_and_dropped_iteratively() {
    let depth = 100_000;
    let source = format!("{}a{}", "(".repeat(depth), ")".repeat(depth));
    let tree = tree_ok(&source);
    assert_eq!(tree.len(), 2);
    assert_eq!(TokenTree::max_depth(&tree), depth);

    let flat = tokenize(source.as_bytes(), Grammar::shared()).expect("flat scan");
    let rebuilt = TokenTree::flatten(&tree);
    assert_eq!(rebuilt.len(), 2 * depth + 2);
    assert!(rebuilt == flat);

    let again = tree_ok(&source);
    assert!(tree == again);
    drop(again);

    let mut other = tree_ok(&source.replacen('a', "1", 1));
    assert!(tree != other);
    other.truncate(1);
    drop(other);
    drop(tree);
}

#[test]
fn deeply_nested_unclosed_input_is_dropped_on_error() {
    let depth = 100_000;
    let err = tree_err(&"[".repeat(depth));
    assert!(matches!(err, LexError::UnclosedBracket { line: 1, .. }), "{err}");

    let nested = format!("{{{}{}", "[".repeat(depth), "]".repeat(depth));
    let err = tree_err(&nested);
    assert!(matches!(err, LexError::UnclosedBracket { line: 1, .. }), "{err}");
}

fn balanced_source() -> impl Strategy<Value = String> {
    let leaf = "[a-z0-9 ;,.=:+\n-]{0,6}";
    let nested = leaf.prop_recursive(4, 48, 4, |inner| {
        (
            prop::sample::select(vec![("(", ")"), ("{", "}"), ("[", "]")]),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|((open, close), parts)| format!("{open}{}{close}", parts.concat()))
    });
    prop::collection::vec(nested, 0..4).prop_map(|parts| parts.join(" "))
}

proptest! {
    #[test]
    fn tree_flattens_to_flat_stream(source in balanced_source()) {
        let grammar = Grammar::shared();
        let tree = tokenize_tree(source.as_bytes(), grammar);
        prop_assert!(tree.is_ok(), "{:?}", tree);
        let flat = tokenize(source.as_bytes(), grammar).expect("flat scan");
        prop_assert_eq!(TokenTree::flatten(&tree.expect("checked")), flat);
    }

    #[test]
    fn arbitrary_bytes_never_panic(source in prop::collection::vec(any::<u8>(), 0..256)) {
        match tokenize_tree(&source, Grammar::shared()) {
            Ok(tree) => {
                let last = tree.last().and_then(TokenTree::as_token).map(|t| t.kind);
                prop_assert_eq!(last, Some(TokenKind::End));
            }
            Err(err) => prop_assert!(err.line() >= 1),
        }
    }
}
