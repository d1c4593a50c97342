use std::fmt::Write;

use serde_json::{json, Value};
use shot_engine::{aggregate_by_zone, aggregate_totals, clamped_tally, get_rounds, round_pct};
use shot_schema::{Session, Totals};

fn type_label(training_type: &str) -> String {
    training_type.replace('_', " ")
}

pub fn totals_line(totals: &Totals) -> String {
    format!(
        "attempts {} | made {} | accuracy {:.1}%",
        totals.attempts, totals.made, totals.pct
    )
}

pub fn list_table(sessions: &[Session]) -> String {
    if sessions.is_empty() {
        return "No sessions yet.\n".to_string();
    }

    let mut out = String::new();
    let _ = writeln!(out, "Date       | Type                 | Att  | Made | Acc");
    let _ = writeln!(out, "-----------|----------------------|------|------|-------");
    for session in sessions {
        let totals = aggregate_totals(&get_rounds(session));
        let _ = writeln!(
            out,
            "{:10} | {:20} | {:>4} | {:>4} | {:>5.1}%",
            session.date,
            type_label(&session.training_type),
            totals.attempts,
            totals.made,
            totals.pct
        );
    }
    out
}

pub fn list_json(sessions: &[Session]) -> Value {
    let rows: Vec<Value> = sessions
        .iter()
        .map(|session| {
            json!({
                "id": session.id,
                "date": session.date,
                "trainingType": session.training_type,
                "totals": aggregate_totals(&get_rounds(session)),
            })
        })
        .collect();
    Value::Array(rows)
}

pub fn session_detail(session: &Session) -> String {
    let rounds = get_rounds(session);
    let mut out = String::new();

    let _ = writeln!(out, "{} {} ({})", session.id, session.date, type_label(&session.training_type));
    if let Some(notes) = session.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        let _ = writeln!(out, "notes: {notes}");
    }

    if rounds.is_empty() {
        let _ = writeln!(out, "No rounds recorded.");
        return out;
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "  # | Zone                 | Att  | Made | Acc");
    let _ = writeln!(out, "----|----------------------|------|------|-------");
    for round in &rounds {
        let (attempts, made) = clamped_tally(round);
        let _ = writeln!(
            out,
            "{:>3} | {:20} | {:>4} | {:>4} | {:>5.1}%",
            round.idx + 1,
            round.zone,
            attempts,
            made,
            round_pct(round)
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "By zone:");
    for (zone, agg) in aggregate_by_zone(&rounds).iter() {
        let _ = writeln!(
            out,
            "  {:20} {:>4}/{:<4} {:>5.1}%  ({} rounds)",
            zone, agg.made, agg.attempts, agg.pct, agg.rounds_count
        );
    }

    let _ = writeln!(out);
    let _ = writeln!(out, "{}", totals_line(&aggregate_totals(&rounds)));
    out
}

pub fn session_json(session: &Session) -> Value {
    let rounds = get_rounds(session);
    json!({
        "session": session,
        "rounds": rounds,
        "totals": aggregate_totals(&rounds),
        "byZone": aggregate_by_zone(&rounds),
    })
}
