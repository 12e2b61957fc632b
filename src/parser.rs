//! This module provides the parser for pushdown automaton programs, utilizing the `pest` crate.
//! It defines the grammar for `.pda` files and functions to parse the input into a `Program` struct.

use crate::{
    analyzer::{analyze, unreachable_states},
    types::{
        Acceptance, Input, Next, PdaError, Program, Symbol, Transition, CELL_SEPARATOR,
        DEFAULT_BOTTOM_SYMBOL,
    },
};
use pest::{
    error::{Error, ErrorVariant},
    iterators::{Pair, Pairs},
    Parser as PestParser, Span,
};
use pest_derive::Parser as PestParser;
use std::collections::HashSet;
use tracing::warn;

/// Derives a `PestParser` for the pushdown automaton grammar defined in `grammar.pest`.
#[derive(PestParser)]
#[grammar = "grammar.pest"]
pub struct PdaParser;

/// Parses the given input string into a `Program` struct.
///
/// This is the main entry point for parsing program definitions. It trims the input,
/// parses it using the `PdaParser`, and then processes the resulting parse tree into a
/// structured `Program`. The parsed program is validated before being returned.
///
/// # Arguments
///
/// * `input` - A string slice containing the program definition.
///
/// # Returns
///
/// * `Ok(Program)` if the input is successfully parsed and validated.
/// * `Err(PdaError::ParseError)` if there are any syntax errors.
/// * `Err(PdaError::MalformedTransition)` if a transition cell is not `<nextState>/<pushString>`.
/// * `Err(PdaError::UndefinedState)` or `Err(PdaError::UndefinedSymbol)` if the program
///   references something it never declares.
pub fn parse(input: &str) -> Result<Program, PdaError> {
    let root = PdaParser::parse(Rule::program, input.trim())
        .map_err(|e| PdaError::ParseError(e.into()))?
        .next()
        .ok_or_else(|| PdaError::ValidationError("Empty program".to_string()))?;

    let program = parse_program(root)?;

    analyze(&program)?;

    let unreachable = unreachable_states(&program);
    if !unreachable.is_empty() {
        warn!(program = %program.name, states = ?unreachable, "unreachable states");
    }

    Ok(program)
}

/// Parses the top-level structure of a program from a `Pair<Rule::program>`.
///
/// This function extracts every section, checks that each one appears at most once,
/// and fills in the defaults for the optional ones.
fn parse_program(pair: Pair<Rule>) -> Result<Program, PdaError> {
    let mut name: Option<String> = None;
    let mut alphabet: Option<Vec<Symbol>> = None;
    let mut stack_alphabet: Option<Vec<Symbol>> = None;
    let mut bottom: Option<Symbol> = None;
    let mut states: Option<Vec<String>> = None;
    let mut initial_state: Option<String> = None;
    let mut final_states: Option<Vec<String>> = None;
    let mut acceptance: Option<Acceptance> = None;
    let mut rules: Option<Vec<(String, Vec<Transition>)>> = None;
    let mut seen = HashSet::new();

    for p in pair.into_inner() {
        let span = p.as_span();
        let rule = p.as_rule();

        check_unique_rule(rule, span, &mut seen)?;

        match rule {
            Rule::name => name = Some(parse_inner_string(p, span)?.trim().to_string()),
            Rule::alphabet => alphabet = Some(parse_symbols(p)),
            Rule::stack => stack_alphabet = Some(parse_symbols(p)),
            Rule::bottom => bottom = parse_symbols(p).first().copied(),
            Rule::states => states = Some(parse_states(p)),
            Rule::initial => initial_state = Some(parse_inner_string(p, span)?),
            Rule::finals => final_states = Some(parse_states(p)),
            Rule::acceptance => acceptance = Some(parse_acceptance(p, span)?),
            Rule::rules => rules = Some(parse_blocks(p)?),
            _ => {} // Skip EOI
        }
    }

    // Handle mandatory checks
    let name = check_required_rule(name, "name")?;
    let alphabet = check_required_rule(alphabet, "alphabet")?;
    let rules = check_required_rule(rules, "rules")?;

    // Without a `states:` section the rule blocks declare the states
    let states =
        states.unwrap_or_else(|| rules.iter().map(|(state, _)| state.clone()).collect());

    // The first rule block is the start state unless `initial:` says otherwise
    let initial_state = initial_state
        .or_else(|| rules.first().map(|(state, _)| state.clone()))
        .or_else(|| states.first().cloned());
    let initial_state = check_required_rule(initial_state, "initial")?;

    Ok(Program {
        name,
        alphabet,
        stack_alphabet: stack_alphabet.unwrap_or_default(),
        bottom: bottom.unwrap_or(DEFAULT_BOTTOM_SYMBOL),
        states,
        initial_state,
        final_states: final_states.unwrap_or_default(),
        acceptance: acceptance.unwrap_or_default(),
        transitions: rules.into_iter().flat_map(|(_, block)| block).collect(),
    })
}

/// Parses the rule blocks of a `Pair<Rule::rules>`, rejecting a state that owns two blocks.
fn parse_blocks(pair: Pair<Rule>) -> Result<Vec<(String, Vec<Transition>)>, PdaError> {
    let mut blocks: Vec<(String, Vec<Transition>)> = Vec::new();

    for block in pair.into_inner() {
        let span = block.as_span();
        let (state, transitions) = parse_block(block)?;

        // Prevent duplicated rule block
        if blocks.iter().any(|(s, _)| *s == state) {
            return Err(parse_error(&format!("Duplicate rule block: {state}"), span));
        }

        blocks.push((state, transitions));
    }

    Ok(blocks)
}

/// Parses a single rule block: a state followed by its transitions.
fn parse_block(pair: Pair<Rule>) -> Result<(String, Vec<Transition>), PdaError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();
    let state = parse_string(&mut pairs, span)?;

    let transitions = pairs
        .filter(|p| p.as_rule() == Rule::transition)
        .map(|p| parse_transition(p, &state))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((state, transitions))
}

/// Parses `<input>, <top> -> <cell>` belonging to `state`.
fn parse_transition(pair: Pair<Rule>, state: &str) -> Result<Transition, PdaError> {
    let span = pair.as_span();
    let mut pairs = pair.into_inner();

    let input = match pairs.next() {
        Some(p) if p.as_rule() == Rule::epsilon => Input::Epsilon,
        Some(p) => Input::Symbol(parse_symbol(p.as_str())),
        None => return Err(parse_error("Missing input symbol", span)),
    };
    let top = parse_symbol(&parse_string(&mut pairs, span)?);
    let next = parse_cell(&parse_string(&mut pairs, span)?, state)?;

    Ok(Transition {
        state: state.to_string(),
        input,
        top,
        next,
    })
}

/// Parses a transition cell `<nextState>/<pushString>`.
///
/// An omitted next state stays in `state`. The push string is listed top-of-stack-first
/// and may be empty.
pub fn parse_cell(cell: &str, state: &str) -> Result<Next, PdaError> {
    let Some((target, push)) = cell.split_once(CELL_SEPARATOR) else {
        return Err(PdaError::MalformedTransition(format!(
            "'{cell}' in state {state} is missing '/'"
        )));
    };

    if push.contains(CELL_SEPARATOR) {
        return Err(PdaError::MalformedTransition(format!(
            "'{cell}' in state {state} has more than one '/'"
        )));
    }

    let target = if target.is_empty() { state } else { target };

    Ok(Next::new(target, push))
}

/// Parses the `[a, b, ...]` list (or single symbol) below `pair`.
fn parse_symbols(pair: Pair<Rule>) -> Vec<Symbol> {
    pair.into_inner()
        .flat_map(|p| match p.as_rule() {
            Rule::symbols => p.into_inner().map(|s| parse_symbol(s.as_str())).collect(),
            Rule::symbol => vec![parse_symbol(p.as_str())],
            _ => Vec::new(),
        })
        .collect()
}

/// Parses the `[S0, S1, ...]` list below `pair`.
fn parse_states(pair: Pair<Rule>) -> Vec<String> {
    pair.into_inner()
        .flat_map(|p| p.into_inner())
        .filter(|p| p.as_rule() == Rule::state)
        .map(|p| p.as_str().to_string())
        .collect()
}

/// Parses the acceptance mode: `final-bottom` (default) or `final`.
fn parse_acceptance(pair: Pair<Rule>, span: Span) -> Result<Acceptance, PdaError> {
    match parse_inner_string(pair, span)?.as_str() {
        "final-bottom" => Ok(Acceptance::FinalAndBottom),
        "final" => Ok(Acceptance::Final),
        other => Err(parse_error(
            &format!("Unsupported acceptance mode: {other}"),
            span,
        )),
    }
}

/// Creates a `PdaError::ParseError` from a message and a `Span`.
fn parse_error(msg: &str, span: Span) -> PdaError {
    PdaError::ParseError(Box::new(Error::new_from_span(
        ErrorVariant::CustomError {
            message: msg.to_string(),
        },
        span,
    )))
}

/// Parses a single character symbol from a string, handling quoted and unquoted symbols.
fn parse_symbol(input: &str) -> Symbol {
    let inner = input
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .filter(|s| !s.is_empty())
        .unwrap_or(input);

    inner.chars().next().unwrap_or(DEFAULT_BOTTOM_SYMBOL)
}

/// Extracts the inner string content from a `Pair`.
fn parse_inner_string(pair: Pair<Rule>, span: Span) -> Result<String, PdaError> {
    parse_string(&mut pair.into_inner(), span)
}

/// Extracts the string content from the current `Pair` in a `Pairs` iterator.
fn parse_string(pairs: &mut Pairs<Rule>, span: Span) -> Result<String, PdaError> {
    pairs
        .next()
        .map(|p| p.as_str().to_string())
        .ok_or_else(|| parse_error("Unexpected end of input", span))
}

/// Checks if a given section has already been declared.
fn check_unique_rule(rule: Rule, span: Span, seen: &mut HashSet<Rule>) -> Result<(), PdaError> {
    if matches!(rule, Rule::EOI) {
        return Ok(());
    }

    if !seen.insert(rule) {
        return Err(parse_error(
            &format!("Duplicate \"{}:\" declaration", section_name(rule)),
            span,
        ));
    }

    Ok(())
}

/// Checks if a required section is present, returning an `Err` if it's missing.
fn check_required_rule<T>(value: Option<T>, name: &str) -> Result<T, PdaError> {
    value.ok_or_else(|| PdaError::ValidationError(format!("Missing '{name}' section")))
}

/// Returns the keyword a section is written with.
fn section_name(rule: Rule) -> &'static str {
    match rule {
        Rule::name => "name",
        Rule::alphabet => "alphabet",
        Rule::stack => "stack",
        Rule::bottom => "bottom",
        Rule::states => "states",
        Rule::initial => "initial",
        Rule::finals => "final",
        Rule::acceptance => "acceptance",
        Rule::rules => "rules",
        _ => "unknown",
    }
}
