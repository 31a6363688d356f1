//! Plain-text rendering of classified messages for the terminal.

pub mod people;

use crate::classify::relevance::ScoreTier;
use crate::classify::{ AlumniTable, DataCategory, ParsedBlock, NO_VALID_ALUMNI };
use crate::models::analyze::MiloResponse;
use crate::models::chat::ChatMessage;
use crate::models::company::{ CompanyCard, CompanyEntry };
use crate::models::moves::{ MoveEntry, TimelineTier };

const ALUMNI_MAX_ROWS: usize = 10;
const CONTACTS_MAX_ROWS: usize = 5;

fn tier_badge(tier: ScoreTier) -> &'static str {
    match tier {
        ScoreTier::Top => "●●●●",
        ScoreTier::Mid => "●●●○",
        ScoreTier::LowMid => "●●○○",
        ScoreTier::Lowest => "●○○○",
    }
}

fn timeline_badge(tier: TimelineTier) -> &'static str {
    match tier {
        TimelineTier::Immediate => "!!",
        TimelineTier::ThisSemester => "! ",
        TimelineTier::Later => "  ",
    }
}

fn section(title: &str) -> String {
    format!("── {} ──\n", title.to_uppercase())
}

pub fn company_card(company: &CompanyEntry) -> String {
    format!(
        "  {} {} ({})\n    MATCH {} {} ({})\n    Team: {}\n    Apply: {}\n",
        company.initial(),
        company.name,
        company.domain,
        company.display_score(),
        tier_badge(company.score_tier()),
        company.score_tier().label(),
        company.team_label(),
        company.apply_url()
    )
}

pub fn move_card(entry: &MoveEntry) -> String {
    let mut out = format!(
        "  {} {} [{}] ({})\n",
        timeline_badge(entry.timeline_tier()),
        entry.title,
        entry.timeline,
        entry.domain
    );
    for point in entry.description_points() {
        out.push_str(&format!("    • {}\n", point));
    }
    let start = entry.start_points();
    if !start.is_empty() {
        out.push_str("    Start:\n");
        for point in start {
            out.push_str(&format!("    → {}\n", point));
        }
    }
    out
}

fn attached_company(card: &CompanyCard) -> String {
    format!(
        "  {} · {} · {}% match {}\n",
        card.name,
        card.industry,
        card.relevance,
        tier_badge(card.score_tier())
    )
}

fn inline_error(category: DataCategory) -> String {
    format!("{}  {}\n", section(category.title()), category.error_message())
}

/// Renders a message the way its classification says it should look.
pub fn render_message(message: &ChatMessage, block: &ParsedBlock) -> String {
    match block {
        ParsedBlock::Markdown => format!("{}\n", message.content),
        ParsedBlock::Thinking => format!("… {}\n", message.content.trim()),
        ParsedBlock::Companies(companies) => {
            let mut out = section(DataCategory::Companies.title());
            for company in companies {
                out.push_str(&company_card(company));
            }
            out
        }
        ParsedBlock::Moves(moves) => {
            let mut out = section(DataCategory::Moves.title());
            for entry in moves {
                out.push_str(&move_card(entry));
            }
            out
        }
        ParsedBlock::Alumni { narrative, table } => {
            let mut out = format!("{}\n", narrative.trim_end());
            match table {
                AlumniTable::Rows(rows) => {
                    out.push_str(&people::alumni_rows(rows, DataCategory::Alumni.title(), ALUMNI_MAX_ROWS));
                }
                AlumniTable::NoValidData => {
                    out.push_str(&format!("  {}\n", NO_VALID_ALUMNI));
                }
                AlumniTable::Failed => {
                    out.push_str(&format!("  {}\n", DataCategory::Alumni.error_message()));
                }
                AlumniTable::Absent => {}
            }
            out
        }
        ParsedBlock::LoadError(category) => inline_error(*category),
        ParsedBlock::AttachedAlumni(people) =>
            format!("{}\n{}", message.content, people::people_table(people, "Yale Alumni", ALUMNI_MAX_ROWS)),
        ParsedBlock::AttachedContacts(people) =>
            format!(
                "{}\n{}",
                message.content,
                people::people_table(people, "People to Contact First", CONTACTS_MAX_ROWS)
            ),
        ParsedBlock::AttachedCompanies(cards) => {
            let mut out = format!("{}\n", message.content);
            for card in cards {
                out.push_str(&attached_company(card));
            }
            out
        }
    }
}

/// Summary of a legacy analyze response.
pub fn render_analysis(resp: &MiloResponse) -> String {
    let mut out = String::new();
    if let Some(err) = &resp.error {
        out.push_str(&format!("(offline: {})\n\n", err));
    }
    let analysis = &resp.analysis;
    if !analysis.industry.is_empty() {
        out.push_str(&format!(
            "Industry: {}\nTarget companies: {}\nTarget roles: {}\nTimeline: {}\n\n",
            analysis.industry,
            analysis.target_companies.join(", "),
            analysis.target_roles.join(", "),
            analysis.timeline
        ));
    }
    out.push_str(&format!("Success odds: {}%\n\n", resp.success_odds));
    out.push_str(&people::people_table(&resp.target_company_alumni, "Yale Alumni", ALUMNI_MAX_ROWS));
    out.push_str(&people::people_table(&resp.people_to_contact, "People to Contact First", CONTACTS_MAX_ROWS));
    for path in &resp.career_paths {
        out.push_str(&format!("Path: {} ({} alumni)\n", path.path, path.count));
    }
    if !resp.action_plan.plan.is_empty() {
        out.push_str(&format!("\n{}\n", resp.action_plan.plan));
    }
    out
}
