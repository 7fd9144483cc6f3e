//! Placeholder token rules
//!
//! Quoted placeholder markers in connector text become parameter-access
//! expressions. The rules are applied in the order listed here. Each key
//! class excludes the rule's own closing delimiter character.

use crate::rules::TokenRule;

/// Delimiter sequences that only ever appear inside placeholder tokens
pub const DELIMITERS: &[&str] = &["***", "<<<", ">>>"];

pub const TOKEN_RULES: &[TokenRule] = &[
    // 'x***key***'  ->  param['key']
    TokenRule::new(
        "wholesale",
        r#"u?['"]\*\*\*(?P<key>[^*]+)\*\*\*['"]"#,
        "{param}['${key}']",
        "Replace the whole quoted literal with the parameter value",
    ),
    // 'text <<<key<<<'  ->  'text ' + param['key']
    TokenRule::new(
        "left-append",
        r#"<<<(?P<key>[^<]+)<<<(?P<q>['"])"#,
        "${q} + {param}['${key}']",
        "Close the literal and append the parameter value",
    ),
    // '>>>key>>> text'  ->  param['key'] + ' text'; a u prefix moves to the reopened literal
    TokenRule::new(
        "right-append",
        r#"(?P<u>u?)(?P<q>['"])>>>(?P<key>[^>]+)>>>"#,
        "{param}['${key}'] + ${u}${q}",
        "Prepend the parameter value and reopen the literal",
    ),
    // '<<<key>>>'  ->  '' + param['key'] + ''
    TokenRule::new(
        "insert",
        r#"u?(?P<q>['"])<<<(?P<key>[^>]+)>>>['"]"#,
        "${q} + {param}['${key}'] + ${q}",
        "Splice the parameter value between two literals",
    ),
];
