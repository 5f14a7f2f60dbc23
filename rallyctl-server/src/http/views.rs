//! Server-rendered HTML pages
//!
//! Plain `format!` templates; every value that came from the user or the
//! warehouse goes through [`escape`].

use std::fmt::Write as _;

use rallyctl_core::TrackCatalog;

use crate::db::{Car, Race, RaceResult, Team};
use crate::race::{BudgetChange, RaceOutcome};

use super::routes::cars::CarForm;
use super::routes::race::RaceForm;
use super::routes::teams::TeamForm;

/// Message shown above the page content
#[derive(Debug, Clone, PartialEq)]
pub struct Banner {
    pub kind: BannerKind,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BannerKind {
    Success,
    Warning,
    Error,
}

impl Banner {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Success,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Warning,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: BannerKind::Error,
            message: message.into(),
        }
    }

    fn render(&self) -> String {
        let class = match self.kind {
            BannerKind::Success => "success",
            BannerKind::Warning => "warning",
            BannerKind::Error => "error",
        };
        format!(
            r#"<div class="banner {class}" role="status">{}</div>"#,
            escape(&self.message)
        )
    }
}

/// Navigation entries: (path, label)
const NAV: [(&str, &str); 4] = [
    ("/teams", "Teams"),
    ("/cars", "Cars"),
    ("/race", "Race"),
    ("/races", "History"),
];

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; margin: 0; color: #1d1d1f; }
header { background: #29b5e8; color: #fff; padding: 0.75rem 1.5rem; }
header h1 { margin: 0; font-size: 1.4rem; }
nav a { color: #fff; margin-right: 1rem; text-decoration: none; }
nav a.active { font-weight: bold; text-decoration: underline; }
main { padding: 1rem 1.5rem; max-width: 1100px; }
table { border-collapse: collapse; width: 100%; margin: 0.5rem 0 1.5rem; }
th, td { border: 1px solid #ddd; padding: 0.35rem 0.6rem; text-align: left; }
th { background: #f4f6f8; }
td.num { text-align: right; font-variant-numeric: tabular-nums; }
form.inline { display: inline; }
fieldset { border: 1px solid #ddd; margin-bottom: 1rem; }
label { display: block; margin: 0.4rem 0; }
.banner { padding: 0.6rem 1rem; margin: 0.75rem 0; border-radius: 4px; }
.banner.success { background: #e6f4ea; }
.banner.warning { background: #fff4e5; }
.banner.error { background: #fdecea; }
.muted { color: #666; }
"#;

/// Escape text for HTML element content and attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full page with header, navigation and optional banner.
pub fn layout(title: &str, active: &str, banner: Option<&Banner>, body: &str) -> String {
    let nav: String = NAV
        .iter()
        .map(|(path, label)| {
            let class = if *path == active { r#" class="active""# } else { "" };
            format!(r#"<a href="{path}"{class}>{label}</a>"#)
        })
        .collect();
    let banner = banner.map(Banner::render).unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Bootcamp Rally</title>
<style>{STYLE}</style>
</head>
<body>
<header><h1>Bootcamp Rally</h1><nav>{nav}</nav></header>
<main>
<h2>{title}</h2>
{banner}
{body}
</main>
</body>
</html>"#,
        title = escape(title),
    )
}

/// Page whose content could not be loaded.
pub fn error_page(title: &str, active: &str, banner: &Banner) -> String {
    layout(title, active, Some(banner), "")
}

fn opt(value: Option<&str>) -> String {
    value.map(escape).unwrap_or_default()
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

pub fn teams_page(teams: &[Team], form: &TeamForm, banner: Option<&Banner>) -> String {
    let mut body = format!(
        r#"<fieldset><legend>Add new team</legend>
<form method="post" action="/teams">
<label>Team name <input name="team_name" value="{name}" required maxlength="128"></label>
<label>Members (comma separated) <input name="members" value="{members}" placeholder="Alice,Bob"></label>
<label>Initial budget (USD) <input name="budget" type="number" min="0" step="1000" value="{budget}"></label>
<button type="submit">Add team</button>
</form></fieldset>
<h3>Teams</h3>
"#,
        name = escape(&form.team_name),
        members = escape(&form.members),
        budget = escape(&form.budget),
    );
    body.push_str(&teams_table(teams, true));
    layout("Teams", "/teams", banner, &body)
}

fn teams_table(teams: &[Team], with_actions: bool) -> String {
    if teams.is_empty() {
        return r#"<p class="muted">No teams yet.</p>"#.to_string();
    }

    let mut html = String::from(
        "<table><thead><tr><th>ID</th><th>Name</th><th>Members</th><th>Budget</th>",
    );
    if with_actions {
        html.push_str("<th></th>");
    }
    html.push_str("</tr></thead><tbody>");
    for team in teams {
        let _ = write!(
            html,
            r#"<tr><td class="num">{}</td><td>{}</td><td>{}</td><td class="num">{}</td>"#,
            team.team_id,
            escape(&team.team_name),
            opt(team.members.as_deref()),
            money(team.budget),
        );
        if with_actions {
            let _ = write!(
                html,
                r#"<td><form class="inline" method="post" action="/teams/{}/delete"><button type="submit">Delete</button></form></td>"#,
                team.team_id
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn cars_page(cars: &[Car], teams: &[Team], form: &CarForm, banner: Option<&Banner>) -> String {
    let mut body = String::new();

    if teams.is_empty() {
        body.push_str(&Banner::warning("Create a team first.").render());
    } else {
        let options: String = teams
            .iter()
            .map(|t| {
                let selected = if form.team_id == t.team_id.to_string() {
                    " selected"
                } else {
                    ""
                };
                format!(
                    r#"<option value="{id}"{selected}>{name} (ID {id})</option>"#,
                    id = t.team_id,
                    name = escape(&t.team_name),
                )
            })
            .collect();

        let _ = write!(
            body,
            r#"<fieldset><legend>Add new car</legend>
<form method="post" action="/cars">
<label>Team <select name="team_id">{options}</select></label>
<label>Car name <input name="car_name" value="{name}" required maxlength="128"></label>
<label>Base speed (km/h) <input name="speed" type="number" min="120" step="1" value="{speed}"></label>
<label>Durability (0-1) <input name="durability" type="number" min="0" max="1" step="0.01" value="{durability}"></label>
<label>Acceleration (0-1) <input name="acceleration" type="number" min="0" max="1" step="0.01" value="{acceleration}"></label>
<button type="submit">Add car</button>
</form></fieldset>
"#,
            name = escape(&form.car_name),
            speed = escape(&form.speed),
            durability = escape(&form.durability),
            acceleration = escape(&form.acceleration),
        );
    }

    body.push_str("<h3>Cars</h3>");
    body.push_str(&cars_table(cars, true));
    layout("Cars", "/cars", banner, &body)
}

fn cars_table(cars: &[Car], with_actions: bool) -> String {
    if cars.is_empty() {
        return r#"<p class="muted">No cars yet.</p>"#.to_string();
    }

    let mut html = String::from(
        "<table><thead><tr><th>ID</th><th>Name</th><th>Team</th><th>Speed</th>\
         <th>Durability</th><th>Acceleration</th>",
    );
    if with_actions {
        html.push_str("<th></th>");
    }
    html.push_str("</tr></thead><tbody>");
    for car in cars {
        let team = match (car.team_name.as_deref(), car.team_id) {
            (Some(name), _) => escape(name),
            (None, Some(id)) => format!(r#"<span class="muted">missing team {id}</span>"#),
            (None, None) => String::new(),
        };
        let _ = write!(
            html,
            r#"<tr><td class="num">{}</td><td>{}</td><td>{}</td><td class="num">{}</td><td class="num">{:.2}</td><td class="num">{:.2}</td>"#,
            car.car_id,
            escape(&car.car_name),
            team,
            car.speed,
            car.durability,
            car.acceleration,
        );
        if with_actions {
            let _ = write!(
                html,
                r#"<td><form class="inline" method="post" action="/cars/{}/delete"><button type="submit">Delete</button></form></td>"#,
                car.car_id
            );
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

pub fn race_page(
    catalog: &TrackCatalog,
    form: &RaceForm,
    cars: &[Car],
    teams: &[Team],
    outcome: Option<&RaceOutcome>,
    banner: Option<&Banner>,
) -> String {
    let mut body = String::new();

    if let Some(outcome) = outcome {
        body.push_str("<h3>Race results (minutes, lower is better)</h3>");
        body.push_str(&results_table(&outcome.results));
        body.push_str("<h3>Budgets (before/after race)</h3>");
        body.push_str(&budget_table(&outcome.budgets));
    }

    let options: String = catalog
        .iter()
        .map(|track| {
            let selected = if track.name == form.track { " selected" } else { "" };
            format!(
                r#"<option value="{name}"{selected}>{name}</option>"#,
                name = escape(&track.name)
            )
        })
        .collect();
    let info: String = catalog
        .iter()
        .map(|t| {
            format!(
                "<li><strong>{}</strong>: {} (factor {:.2})</li>",
                escape(&t.name),
                escape(&t.description),
                t.factor
            )
        })
        .collect();

    let _ = write!(
        body,
        r#"<fieldset><legend>Race settings</legend>
<form method="post" action="/race">
<label>Track <select name="track">{options}</select></label>
<label>Participation fee (per team) <input name="fee" type="number" min="0" step="100" value="{fee}"></label>
<label>Winner prize <input name="prize" type="number" min="0" step="500" value="{prize}"></label>
<button type="submit">Start race!</button>
</form>
<p class="muted">Track info:</p><ul>{info}</ul>
</fieldset>
"#,
        fee = escape(&form.fee),
        prize = escape(&form.prize),
    );

    body.push_str("<h3>Eligible cars</h3>");
    body.push_str(&cars_table(cars, false));
    body.push_str("<details><summary>Current teams and budgets</summary>");
    body.push_str(&teams_table(teams, false));
    body.push_str("</details>");

    layout("Rally Race", "/race", banner, &body)
}

pub fn results_table(results: &[RaceResult]) -> String {
    if results.is_empty() {
        return r#"<p class="muted">No results recorded.</p>"#.to_string();
    }

    let mut html = String::from(
        "<table><thead><tr><th>Position</th><th>Car</th><th>Team</th><th>Time (min)</th></tr></thead><tbody>",
    );
    for r in results {
        let car = r
            .car_name
            .as_deref()
            .map(escape)
            .unwrap_or_else(|| format!("#{}", r.car_id));
        let _ = write!(
            html,
            r#"<tr><td class="num">{}</td><td>{}</td><td>{}</td><td class="num">{:.3}</td></tr>"#,
            r.position,
            car,
            opt(r.team_name.as_deref()),
            r.time_taken,
        );
    }
    html.push_str("</tbody></table>");
    html
}

fn budget_table(rows: &[BudgetChange]) -> String {
    let mut html = String::from(
        "<table><thead><tr><th>Team</th><th>Before</th><th>After</th><th>Delta</th></tr></thead><tbody>",
    );
    for row in rows {
        let _ = write!(
            html,
            r#"<tr><td>{}</td><td class="num">{}</td><td class="num">{}</td><td class="num">{:+.2}</td></tr>"#,
            escape(&row.team),
            money(row.before),
            money(row.after),
            row.delta,
        );
    }
    html.push_str("</tbody></table>");
    html
}

pub fn races_page(races: &[Race], banner: Option<&Banner>) -> String {
    let body = if races.is_empty() {
        r#"<p class="muted">No races run yet.</p>"#.to_string()
    } else {
        let mut html = String::from(
            "<table><thead><tr><th>Race</th><th>Track</th><th>Winner</th><th>Run at (UTC)</th></tr></thead><tbody>",
        );
        for race in races {
            let run_at = race
                .created_at
                .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_default();
            let _ = write!(
                html,
                r#"<tr><td><a href="/races/{id}">{id}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>"#,
                escape(&race.track_name),
                opt(race.winner_team_name.as_deref()),
                run_at,
                id = race.race_id,
            );
        }
        html.push_str("</tbody></table>");
        html
    };
    layout("Race history", "/races", banner, &body)
}

pub fn race_detail_page(race_id: i64, results: &[RaceResult]) -> String {
    let body = format!(
        r#"<p><a href="/races">&larr; All races</a></p><h3>Race results (minutes, lower is better)</h3>{}"#,
        results_table(results)
    );
    layout(&format!("Race {race_id}"), "/races", None, &body)
}
