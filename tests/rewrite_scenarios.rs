use azd::compiler::Compiler;
use azd::{Dialect, NestingPolicy, RewriteError, Rewriter};

const PREAMBLE: &str = "LET enforcer = lookup(\"policies\")\n";

fn rewrite(source: &str) -> Result<String, RewriteError> {
    Rewriter::new(Dialect::neutral()).rewrite(source).map(|r| r.text)
}

#[test]
fn test_template_without_directives_is_unchanged() {
    let sources = [
        "",
        "<h1>{{ $title }}</h1>",
        "@if($user)\n  hi\n@endif",
        "contact: admin@allows.example",
    ];

    for source in sources {
        assert_eq!(rewrite(source).unwrap(), source);
    }
}

#[test]
fn test_simple_allows_block() {
    assert_eq!(
        rewrite("@allows('edit-post') stuff @endallows").unwrap(),
        format!("{PREAMBLE}IF enforcer.allows('edit-post', currentUser()) == true THEN stuff END IF")
    );
}

#[test]
fn test_complex_denies_block() {
    let output = rewrite("@denies('post', $post, 'extra') hide @enddenies").unwrap();
    assert_eq!(
        output,
        format!("{PREAMBLE}IF enforcer.denies('post', currentUser(), [$post, 'extra']) == true THEN hide END IF")
    );
}

#[test]
fn test_auxiliary_list_ignores_separator_whitespace() {
    let spaced = rewrite("@allows(X ,  Y) a @endallows").unwrap();
    let tight = rewrite("@allows(X,Y) a @endallows").unwrap();
    assert_eq!(spaced, tight);
    assert!(tight.contains("IF enforcer.allows(X, currentUser(), [Y]) == true THEN"));
}

#[test]
fn test_two_blocks_with_different_policies() {
    let source = "<nav>\n@allows('edit') <a>edit</a> @endallows\n@allows('delete') <a>delete</a> @endallows\n</nav>";
    let output = rewrite(source).unwrap();

    assert_eq!(
        output,
        format!(
            "{PREAMBLE}<nav>\n\
             IF enforcer.allows('edit', currentUser()) == true THEN <a>edit</a> END IF\n\
             IF enforcer.allows('delete', currentUser()) == true THEN <a>delete</a> END IF\n\
             </nav>"
        )
    );
}

#[test]
fn test_blade_template() {
    let source = "<div>\n@allows('post.edit', $post)\n  <button>Edit</button>\n@endallows\n</div>\n";
    let output = Rewriter::new(Dialect::blade()).rewrite(source).unwrap().text;

    assert_eq!(
        output,
        "<?php $enforcer = \\App::make(\"policies\"); ?><div>\n\
         <?php if ($enforcer->allows('post.edit', \\Auth::user(), [$post]) === true) : ?>\n  \
         <button>Edit</button>\n\
         <?php endif; ?>\n\
         </div>\n"
    );
}

#[test]
fn test_argument_with_closing_parenthesis_in_string() {
    let output = rewrite("@denies(policy('a)b'), $x) body @enddenies").unwrap();
    assert!(output.contains("IF enforcer.denies(policy('a)b'), currentUser(), [$x]) == true THEN body END IF"));
}

#[test]
fn test_malformed_templates_are_reported() {
    let cases = [
        ("@allows('a') never closed", "unclosed-directive"),
        ("stray @enddenies", "unexpected-end"),
        ("@allows('a') x @enddenies", "mismatched-end"),
        ("@denies('a', foo(1) x", "unterminated-directive"),
        ("@allows() x @endallows", "empty-policy"),
        ("@allows('a', , 'b') x @endallows", "empty-argument"),
    ];

    for (source, code) in cases {
        let err = rewrite(source).unwrap_err();
        assert_eq!(err.code(), code, "source: {source}");
    }
}

#[test]
fn test_nesting_policies() {
    let source = "@allows(A)\n@allows(B) inner @endallows\n@endallows";

    let allow = Rewriter::with_nesting(Dialect::neutral(), NestingPolicy::Allow).rewrite(source).unwrap();
    assert!(allow.warnings.is_empty());

    let warn = Rewriter::with_nesting(Dialect::neutral(), NestingPolicy::Warn).rewrite(source).unwrap();
    assert_eq!(warn.text, allow.text);
    assert_eq!(warn.warnings.len(), 1);

    let deny = Rewriter::with_nesting(Dialect::neutral(), NestingPolicy::Deny).rewrite(source);
    assert_eq!(deny.unwrap_err().code(), "nested-directive");
}

#[test]
fn test_compiler_hook_chain() {
    let mut compiler = Compiler::with_rewriter(Rewriter::new(Dialect::neutral()));
    compiler.extend("trailing-newline", |source| format!("{source}\n"));

    let output = compiler.compile("@allows(P) p @endallows").unwrap();
    assert!(output.text.ends_with("END IF\n"));

    let err = compiler.compile("@allows(P) p").unwrap_err();
    assert_eq!(err.extension, "authorization");
}
