//! `time:*` (spec.md §4.5 Time).

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Timelike, Utc};

use super::bind_or_check;
use crate::engine::Engine;
use crate::literal;
use crate::subst::Substitution;
use crate::term::Term;
use crate::triple::Triple;

pub const KNOWN: &[&str] = &[
    "localTime",
    "year",
    "month",
    "day",
    "hour",
    "minute",
    "second",
    "dateDifference",
    "dayTimeDuration",
    "inSeconds",
];

pub fn eval(engine: &mut Engine, goal: &Triple, local: &str) -> Vec<Substitution> {
    match local {
        "localTime" => local_time(engine, goal),
        "year" => component(engine, goal, |dt| dt.year() as i64),
        "month" => component(engine, goal, |dt| dt.month() as i64),
        "day" => component(engine, goal, |dt| dt.day() as i64),
        "hour" => component(engine, goal, |dt| dt.hour() as i64),
        "minute" => component(engine, goal, |dt| dt.minute() as i64),
        "second" => component(engine, goal, |dt| dt.second() as i64),
        "dateDifference" => date_difference(engine, goal),
        "dayTimeDuration" => day_time_duration(engine, goal),
        "inSeconds" => in_seconds(engine, goal),
        _ => Vec::new(),
    }
}

fn lexical_and_type<'a>(engine: &'a Engine, t: &Term) -> Option<(&'a str, Option<&'a str>)> {
    match t {
        Term::Literal(lit) => {
            Some((engine.run.interner.resolve(lit.lexical), literal::datatype_str(&engine.run.interner, lit)))
        }
        _ => None,
    }
}

fn parse_datetime(lex: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(lex) {
        return Some(dt.naive_utc());
    }
    if let Ok(d) = NaiveDate::parse_from_str(lex, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0);
    }
    NaiveDateTime::parse_from_str(lex, "%Y-%m-%dT%H:%M:%S").ok()
}

/// `time:localTime`: the unique built-in with no bound subject input
/// (spec.md §4.5 "now"); binds object to the current instant.
fn local_time(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let now = Utc::now();
    let lexical = now.to_rfc3339();
    let value = Term::typed_literal(&mut engine.run.interner, &lexical, literal::XSD_DATETIME);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn component(engine: &mut Engine, goal: &Triple, f: impl Fn(NaiveDateTime) -> i64) -> Vec<Substitution> {
    let Some((lex, _)) = lexical_and_type(engine, &goal.subject) else { return Vec::new() };
    let Some(dt) = parse_datetime(lex) else { return Vec::new() };
    let value = Term::typed_literal(&mut engine.run.interner, &f(dt).to_string(), literal::XSD_INTEGER);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `time:dateDifference`: subject is `(later earlier)`, binds object to an
/// `xsd:duration` lexical form.
fn date_difference(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some(items) = super::list_items(&goal.subject) else { return Vec::new() };
    if items.len() != 2 {
        return Vec::new();
    }
    let (Some((l1, _)), Some((l2, _))) = (lexical_and_type(engine, &items[0]), lexical_and_type(engine, &items[1]))
    else {
        return Vec::new();
    };
    let (Some(a), Some(b)) = (parse_datetime(l1), parse_datetime(l2)) else { return Vec::new() };
    let delta = a - b;
    let lexical = format_duration(delta);
    let value = Term::typed_literal(&mut engine.run.interner, &lexical, literal::XSD_DURATION);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

/// `time:dayTimeDuration`: subject is a number of seconds, binds object to
/// the equivalent `xsd:duration` lexical form.
fn day_time_duration(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some((lex, dt)) = lexical_and_type(engine, &goal.subject) else { return Vec::new() };
    let Some(num) = literal::parse_numeric(lex, dt) else { return Vec::new() };
    let seconds = num.to_f64();
    let delta = Duration::milliseconds((seconds * 1000.0) as i64);
    let lexical = format_duration(delta);
    let value = Term::typed_literal(&mut engine.run.interner, &lexical, literal::XSD_DURATION);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn in_seconds(engine: &mut Engine, goal: &Triple) -> Vec<Substitution> {
    let Some((lex, _)) = lexical_and_type(engine, &goal.subject) else { return Vec::new() };
    let Some(secs) = parse_duration_seconds(lex) else { return Vec::new() };
    let value = Term::typed_literal(&mut engine.run.interner, &format!("{:.3}", secs), literal::XSD_DECIMAL);
    bind_or_check(&goal.object, value, &engine.run.interner).into_iter().collect()
}

fn format_duration(d: Duration) -> String {
    let neg = d.num_milliseconds() < 0;
    let total_ms = d.num_milliseconds().unsigned_abs();
    let secs = total_ms as f64 / 1000.0;
    let hours = (secs / 3600.0).floor() as u64;
    let minutes = ((secs - (hours as f64 * 3600.0)) / 60.0).floor() as u64;
    let remaining_secs = secs - hours as f64 * 3600.0 - minutes as f64 * 60.0;
    format!(
        "{}PT{}H{}M{:.3}S",
        if neg { "-" } else { "" },
        hours,
        minutes,
        remaining_secs
    )
}

/// Parses the minimal `PT#H#M#S` subset this engine itself produces.
fn parse_duration_seconds(lex: &str) -> Option<f64> {
    let (neg, rest) = if let Some(stripped) = lex.strip_prefix('-') { (true, stripped) } else { (false, lex) };
    let rest = rest.strip_prefix("PT")?;
    let mut total = 0.0;
    let mut num = String::new();
    for c in rest.chars() {
        match c {
            '0'..='9' | '.' => num.push(c),
            'H' => {
                total += num.parse::<f64>().ok()? * 3600.0;
                num.clear();
            }
            'M' => {
                total += num.parse::<f64>().ok()? * 60.0;
                num.clear();
            }
            'S' => {
                total += num.parse::<f64>().ok()?;
                num.clear();
            }
            _ => return None,
        }
    }
    Some(if neg { -total } else { total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReasonerConfig, RunState};

    #[test]
    fn year_component_of_date() {
        let mut e = Engine::new(RunState::new(ReasonerConfig::default()));
        let subj = Term::typed_literal(&mut e.run.interner, "2024-03-15", literal::XSD_DATE);
        let out_var = Term::variable(&mut e.run.interner, "y");
        let goal = Triple::new(subj, Term::iri(&mut e.run.interner, "x"), out_var);
        let out = component(&mut e, &goal, |dt| dt.year() as i64);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn duration_round_trip_seconds() {
        let d = Duration::seconds(3725);
        let lexical = format_duration(d);
        let secs = parse_duration_seconds(&lexical).unwrap();
        assert!((secs - 3725.0).abs() < 0.001);
    }
}
