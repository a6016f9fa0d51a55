//! The boolean keyword-search engine.
//!
//! An expression compiles from an argv-style token vector:
//!
//! ```text
//! expr  := term (-a term | -o term | term)* | '(' expr ')' | -i term
//! term  := [types '=' | types '~'] value
//! types := typename (',' typename)*
//! ```
//!
//! `=` is a substring match, case-sensitive unless `-i` precedes the
//! term; `~` compiles an extended regular expression. With no `types`
//! prefix, a term searches names and descriptions. AND binds tighter
//! than OR, and evaluation short-circuits left to right.
//!
//! Execution streams the keyword file in key order, folds hits per
//! record number, and reports matching records to the caller's callback
//! in record-number order.

use std::collections::BTreeMap;
use std::path::Path;

use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::classes::KeyMask;
use crate::db::{DbError, DbReader, Record};

/// Expression compilation failures.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Tokens do not follow the grammar.
    #[error("malformed search expression")]
    BadExpression,
    /// A `~` pattern failed to compile.
    #[error("bad regular expression: {0}")]
    BadPattern(#[from] regex::Error),
}

/// Optional result filters.
#[derive(Debug, Clone, Default)]
pub struct QueryOpts {
    /// Keep only manuals for this architecture.
    pub arch: Option<String>,
    /// Keep only manuals in this section.
    pub section: Option<String>,
}

#[derive(Debug)]
enum Matcher {
    Substring { value: String, fold_case: bool },
    Pattern(Regex),
}

impl Matcher {
    fn matches(&self, key: &str) -> bool {
        match self {
            Matcher::Substring { value, fold_case: false } => key.contains(value),
            Matcher::Substring { value, fold_case: true } => {
                key.to_lowercase().contains(value)
            }
            Matcher::Pattern(re) => re.is_match(key),
        }
    }
}

#[derive(Debug)]
struct Term {
    index: usize,
    mask: KeyMask,
    matcher: Matcher,
}

#[derive(Debug)]
enum Item {
    Term(Term),
    Sub(Chain),
}

#[derive(Debug)]
struct ChainItem {
    /// Joined to the previous item with AND rather than OR.
    and: bool,
    item: Item,
}

#[derive(Debug, Default)]
struct Chain {
    items: Vec<ChainItem>,
}

/// A compiled search expression.
#[derive(Debug)]
pub struct Query {
    root: Chain,
    term_count: usize,
}

impl Query {
    /// Compile an argv-style token vector.
    pub fn compile<T: AsRef<str>>(args: &[T]) -> Result<Query, QueryError> {
        let tokens: Vec<&str> = args.iter().map(AsRef::as_ref).collect();
        if tokens.is_empty() {
            return Err(QueryError::BadExpression);
        }
        let mut pos = 0;
        let mut term_count = 0;
        let root = parse_chain(&tokens, &mut pos, 0, &mut term_count)?;
        if pos != tokens.len() || root.items.is_empty() {
            return Err(QueryError::BadExpression);
        }
        Ok(Query { root, term_count })
    }

    /// Number of terminals; the size of each record's truth vector.
    pub fn term_count(&self) -> usize {
        self.term_count
    }

    /// Mark every terminal matching this keyword in `truth`.
    fn mark(&self, key: &str, mask: KeyMask, truth: &mut [bool]) {
        mark_chain(&self.root, key, mask, truth);
    }

    /// Evaluate the expression over a record's truth vector.
    fn eval(&self, truth: &[bool]) -> bool {
        eval_chain(&self.root, truth)
    }

    /// Whether any terminal at all matches this keyword.
    fn touches(&self, key: &str, mask: KeyMask) -> bool {
        touches_chain(&self.root, key, mask)
    }
}

fn parse_chain(
    tokens: &[&str],
    pos: &mut usize,
    depth: usize,
    term_count: &mut usize,
) -> Result<Chain, QueryError> {
    let mut chain = Chain::default();
    while *pos < tokens.len() {
        let tok = tokens[*pos];

        if tok == ")" {
            if depth == 0 {
                return Err(QueryError::BadExpression);
            }
            return Ok(chain);
        }

        // Leading `-a`/`-o` are plain tokens; between items they are
        // operators.
        let mut and = false;
        let mut tok = tok;
        if !chain.items.is_empty() && (tok == "-a" || tok == "-o") {
            and = tok == "-a";
            *pos += 1;
            if *pos >= tokens.len() {
                return Err(QueryError::BadExpression);
            }
            tok = tokens[*pos];
        }

        let item = if tok == "(" {
            *pos += 1;
            let sub = parse_chain(tokens, pos, depth + 1, term_count)?;
            if tokens.get(*pos) != Some(&")") || sub.items.is_empty() {
                return Err(QueryError::BadExpression);
            }
            *pos += 1;
            Item::Sub(sub)
        } else {
            let fold_case = tok == "-i";
            if fold_case {
                *pos += 1;
                if *pos >= tokens.len() {
                    return Err(QueryError::BadExpression);
                }
                tok = tokens[*pos];
            }
            *pos += 1;
            Item::Term(parse_term(tok, fold_case, term_count)?)
        };
        chain.items.push(ChainItem { and, item });
    }
    Ok(chain)
}

fn parse_term(token: &str, fold_case: bool, term_count: &mut usize) -> Result<Term, QueryError> {
    let (types, op, value) = match token.find(['=', '~']) {
        Some(at) => {
            let op = token.as_bytes()[at];
            (&token[..at], op, &token[at + 1..])
        }
        None => ("", b'=', token),
    };

    let mut mask = KeyMask::default();
    if !types.is_empty() {
        for name in types.split(',') {
            // Unknown type names contribute nothing, matching no class.
            if let Some(m) = KeyMask::from_type_name(name) {
                mask = mask.union(m);
            }
        }
    }
    if mask == KeyMask::default() {
        mask = KeyMask::DEFAULT;
    }

    let matcher = if op == b'~' {
        let pattern =
            if fold_case { format!("(?i){value}") } else { value.to_string() };
        Matcher::Pattern(Regex::new(&pattern)?)
    } else {
        let value =
            if fold_case { value.to_lowercase() } else { value.to_string() };
        Matcher::Substring { value, fold_case }
    };

    let index = *term_count;
    *term_count += 1;
    Ok(Term { index, mask, matcher })
}

fn mark_chain(chain: &Chain, key: &str, mask: KeyMask, truth: &mut [bool]) {
    for entry in &chain.items {
        match &entry.item {
            Item::Sub(sub) => mark_chain(sub, key, mask, truth),
            Item::Term(term) => {
                if term.mask.intersects(mask) && term.matcher.matches(key) {
                    truth[term.index] = true;
                }
            }
        }
    }
}

fn touches_chain(chain: &Chain, key: &str, mask: KeyMask) -> bool {
    chain.items.iter().any(|entry| match &entry.item {
        Item::Sub(sub) => touches_chain(sub, key, mask),
        Item::Term(term) => term.mask.intersects(mask) && term.matcher.matches(key),
    })
}

/// OR of AND-chains, short-circuit left to right.
fn eval_chain(chain: &Chain, truth: &[bool]) -> bool {
    let mut i = 0;
    while i < chain.items.len() {
        let mut group = eval_item(&chain.items[i].item, truth);
        i += 1;
        while i < chain.items.len() && chain.items[i].and {
            group = group && eval_item(&chain.items[i].item, truth);
            i += 1;
        }
        if group {
            return true;
        }
    }
    false
}

fn eval_item(item: &Item, truth: &[bool]) -> bool {
    match item {
        Item::Term(term) => truth[term.index],
        Item::Sub(sub) => eval_chain(sub, truth),
    }
}

struct RecState {
    record: Record,
    truth: Vec<bool>,
}

/// Stream the database and hand matching records to `callback` in
/// record-number order.
///
/// Records failing the `opts` filters are skipped entirely. Two
/// invocations over one database return identical results in identical
/// order.
pub fn search<F>(
    dir: &Path,
    opts: &QueryOpts,
    query: &Query,
    mut callback: F,
) -> Result<usize, DbError>
where
    F: FnMut(&[Record]),
{
    let reader = DbReader::open(dir)?;
    let mut states: BTreeMap<u32, RecState> = BTreeMap::new();

    for entry in reader.keywords() {
        let key = String::from_utf8_lossy(&entry.key);
        if !query.touches(&key, entry.mask) {
            continue;
        }
        let state = match states.entry(entry.rec) {
            std::collections::btree_map::Entry::Occupied(o) => o.into_mut(),
            std::collections::btree_map::Entry::Vacant(v) => {
                let Some(record) = reader.record(entry.rec) else {
                    continue;
                };
                if let Some(arch) = &opts.arch {
                    if !record.arch.eq_ignore_ascii_case(arch) {
                        continue;
                    }
                }
                if let Some(section) = &opts.section {
                    if !record.sec.eq_ignore_ascii_case(section) {
                        continue;
                    }
                }
                v.insert(RecState {
                    record: record.clone(),
                    truth: vec![false; query.term_count()],
                })
            }
        };
        query.mark(&key, entry.mask, &mut state.truth);
    }

    let matched: Vec<Record> = states
        .into_values()
        .filter(|s| query.eval(&s.truth))
        .map(|s| s.record)
        .collect();
    debug!(matches = matched.len(), "query finished");
    callback(&matched);
    Ok(matched.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn q(tokens: &[&str]) -> Query {
        Query::compile(tokens).unwrap()
    }

    fn eval_against(query: &Query, keys: &[(&str, KeyMask)]) -> bool {
        let mut truth = vec![false; query.term_count()];
        for &(key, mask) in keys {
            query.mark(key, mask, &mut truth);
        }
        query.eval(&truth)
    }

    #[test]
    fn bare_term_defaults_to_name_and_desc() {
        let query = q(&["test"]);
        assert!(eval_against(&query, &[("test", KeyMask::NAME)]));
        assert!(eval_against(&query, &[("a test thing", KeyMask::DESC)]));
        assert!(!eval_against(&query, &[("test", KeyMask::PATH)]));
    }

    #[test]
    fn typed_term_restricts_classes() {
        let query = q(&["path=/etc"]);
        assert!(eval_against(&query, &[("/etc/hosts", KeyMask::PATH)]));
        assert!(!eval_against(&query, &[("/etc/hosts", KeyMask::NAME)]));
    }

    #[test]
    fn type_lists_union() {
        let query = q(&["env,err=FOO"]);
        assert!(eval_against(&query, &[("FOO", KeyMask::ENV)]));
        assert!(eval_against(&query, &[("EFOO", KeyMask::ERR)]));
        assert!(!eval_against(&query, &[("FOO", KeyMask::NAME)]));
    }

    #[test]
    fn substring_is_case_sensitive_by_default() {
        let query = q(&["name=Test"]);
        assert!(!eval_against(&query, &[("test", KeyMask::NAME)]));
        let query = q(&["-i", "name=TEST"]);
        assert!(eval_against(&query, &[("my test", KeyMask::NAME)]));
    }

    #[test]
    fn regex_terms() {
        let query = q(&["name~^ca[tp]$"]);
        assert!(eval_against(&query, &[("cat", KeyMask::NAME)]));
        assert!(eval_against(&query, &[("cap", KeyMask::NAME)]));
        assert!(!eval_against(&query, &[("car", KeyMask::NAME)]));
    }

    #[test]
    fn bad_regex_is_an_error() {
        assert!(matches!(
            Query::compile(&["name~([".to_string()]),
            Err(QueryError::BadPattern(_))
        ));
    }

    #[test]
    fn and_binds_tighter_than_or() {
        // a -o b -a c  ==  a OR (b AND c)
        let query = q(&["name=a", "-o", "name=b", "-a", "name=c"]);
        assert!(eval_against(&query, &[("a", KeyMask::NAME)]));
        assert!(!eval_against(&query, &[("b", KeyMask::NAME)]));
        assert!(eval_against(&query, &[("b", KeyMask::NAME), ("c", KeyMask::NAME)]));
    }

    #[test]
    fn adjacent_terms_are_or() {
        let query = q(&["name=a", "name=b"]);
        assert!(eval_against(&query, &[("b", KeyMask::NAME)]));
    }

    #[test]
    fn parenthesized_subexpressions() {
        // (a -o b) -a c
        let query = q(&["(", "name=a", "-o", "name=b", ")", "-a", "name=c"]);
        assert!(!eval_against(&query, &[("a", KeyMask::NAME)]));
        assert!(eval_against(&query, &[("a", KeyMask::NAME), ("c", KeyMask::NAME)]));
        assert!(eval_against(&query, &[("b", KeyMask::NAME), ("c", KeyMask::NAME)]));
    }

    #[test]
    fn unbalanced_parens_fail() {
        assert!(matches!(
            Query::compile(&["(", "name=a"]),
            Err(QueryError::BadExpression)
        ));
        assert!(matches!(
            Query::compile(&["name=a", ")"]),
            Err(QueryError::BadExpression)
        ));
    }

    #[test]
    fn empty_expression_fails() {
        assert!(Query::compile::<&str>(&[]).is_err());
    }
}
