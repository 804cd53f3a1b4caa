//! Extraction of search terms from a raw query.
//!
//! Highlighting and found-metadata explanations need to know which words the
//! user searched for and in which field. The query string is scanned for
//! `FIELD:term`, `FIELD:"phrase"` and `FIELD:(a b)` groups; prohibited
//! clauses and range expressions are ignored.

use std::iter::Peekable;
use std::str::Chars;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::index::fields;
use crate::query::builder::{AGGREGATION_QUERY_PREFIX, validate_query};

/// Search terms grouped by field, in the order they appear in the query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchTerms {
    terms: IndexMap<String, Vec<String>>,
}

impl SearchTerms {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term for a field. Duplicates are ignored.
    pub fn insert<S: Into<String>, T: Into<String>>(&mut self, field: S, term: T) {
        let term = term.into();
        if term.trim().is_empty() {
            return;
        }
        let entry = self.terms.entry(field.into()).or_default();
        if !entry.contains(&term) {
            entry.push(term);
        }
    }

    /// Terms searched in a field.
    pub fn get(&self, field: &str) -> &[String] {
        self.terms.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Fields with at least one term.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.terms.keys().map(String::as_str)
    }

    /// All terms regardless of field, without duplicates.
    pub fn all_terms(&self) -> Vec<String> {
        let mut all: Vec<String> = Vec::new();
        for term in self.terms.values().flatten() {
            if !all.contains(term) {
                all.push(term.clone());
            }
        }
        all
    }

    /// Terms relevant for a field: its own terms plus the catch-all terms.
    pub fn terms_for_field(&self, field: &str) -> Vec<String> {
        let mut terms = self.get(field).to_vec();
        for term in self.get(fields::DEFAULT) {
            if !terms.contains(term) {
                terms.push(term.clone());
            }
        }
        terms
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Open,
    Close,
    Field(String),
    Word(String),
    Phrase(String),
    Range,
    Required,
    Prohibited,
    Operator,
}

struct Tokenizer<'a> {
    chars: Peekable<Chars<'a>>,
}

impl<'a> Tokenizer<'a> {
    fn new(query: &'a str) -> Self {
        Tokenizer {
            chars: query.chars().peekable(),
        }
    }

    fn tokens(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        while let Some(&c) = self.chars.peek() {
            match c {
                c if c.is_whitespace() => {
                    self.chars.next();
                }
                '(' => {
                    self.chars.next();
                    tokens.push(Token::Open);
                }
                ')' => {
                    self.chars.next();
                    tokens.push(Token::Close);
                }
                '"' => {
                    self.chars.next();
                    tokens.push(Token::Phrase(self.read_until('"')));
                }
                '[' | '{' => {
                    self.chars.next();
                    self.read_until(if c == '[' { ']' } else { '}' });
                    tokens.push(Token::Range);
                }
                '+' => {
                    self.chars.next();
                    tokens.push(Token::Required);
                }
                '-' | '!' => {
                    self.chars.next();
                    tokens.push(Token::Prohibited);
                }
                _ => self.read_word(&mut tokens),
            }
        }
        tokens
    }

    fn read_until(&mut self, end: char) -> String {
        let mut value = String::new();
        while let Some(c) = self.chars.next() {
            if c == '\\' {
                if let Some(next) = self.chars.next() {
                    value.push(next);
                }
            } else if c == end {
                break;
            } else {
                value.push(c);
            }
        }
        value
    }

    fn read_word(&mut self, tokens: &mut Vec<Token>) {
        let mut word = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_whitespace() || matches!(c, '(' | ')' | '"') {
                break;
            }
            self.chars.next();
            if c == '\\' {
                if let Some(next) = self.chars.next() {
                    word.push(next);
                }
            } else if c == ':' && !word.is_empty() {
                tokens.push(Token::Field(std::mem::take(&mut word)));
                // A range or phrase may follow the colon directly.
                return;
            } else {
                word.push(c);
            }
        }

        match word.as_str() {
            "" => {}
            "AND" | "OR" | "&&" | "||" => tokens.push(Token::Operator),
            "NOT" => tokens.push(Token::Prohibited),
            _ => {
                let word = word.split('^').next().unwrap_or_default().to_string();
                if word.chars().any(char::is_alphanumeric) {
                    tokens.push(Token::Word(word));
                }
            }
        }
    }
}

/// Map the index's combined fields to the fields terms are highlighted in.
fn normalize_field(field: &str) -> &str {
    match field {
        fields::SUPERDEFAULT => fields::DEFAULT,
        fields::SUPERFULLTEXT => fields::FULLTEXT,
        fields::SUPERUGCTERMS => fields::UGCTERMS,
        other => other,
    }
}

/// Extract the field-to-terms map from a raw query.
///
/// Fails with [`crate::error::VellumError::MalformedQuery`] for unbalanced
/// quotes or parentheses.
pub fn extract_search_terms(query: &str) -> Result<SearchTerms> {
    validate_query(query)?;
    let query = query.trim();
    let query = query
        .strip_prefix(AGGREGATION_QUERY_PREFIX)
        .unwrap_or(query);

    let mut terms = SearchTerms::new();
    // (field, prohibited) per open group
    let mut groups: Vec<(Option<String>, bool)> = vec![(None, false)];
    let mut field: Option<String> = None;
    let mut prohibited = false;

    for token in Tokenizer::new(query).tokens() {
        let (group_field, group_prohibited) = groups.last().cloned().unwrap_or((None, false));
        match token {
            Token::Required | Token::Operator => {}
            Token::Prohibited => prohibited = true,
            Token::Field(name) => field = Some(name),
            Token::Open => {
                groups.push((field.take().or(group_field), prohibited || group_prohibited));
                prohibited = false;
            }
            Token::Close => {
                if groups.len() > 1 {
                    groups.pop();
                }
                field = None;
                prohibited = false;
            }
            Token::Range => {
                field = None;
                prohibited = false;
            }
            Token::Word(value) | Token::Phrase(value) => {
                let target = field.take().or(group_field);
                if !(prohibited || group_prohibited) {
                    let target = target.as_deref().unwrap_or(fields::DEFAULT);
                    terms.insert(normalize_field(target), value.trim());
                }
                prohibited = false;
            }
        }
    }

    Ok(terms)
}
