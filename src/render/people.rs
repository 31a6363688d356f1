use crate::models::analyze::{ AlumniProfile, CareerExample };

pub fn initials(name: &str) -> String {
    name.split(' ')
        .filter_map(|part| part.chars().next())
        .collect::<String>()
        .to_uppercase()
}

pub fn experience(person: &AlumniProfile) -> String {
    let Some(current) = person.experience_history.first() else {
        return "No experience data".to_string();
    };
    let years = person.career_progression
        .as_ref()
        .map(|p| p.years_experience)
        .unwrap_or(0.0);
    format!("{} ({} years exp)", current.title, years)
}

pub fn career_stage(person: &AlumniProfile) -> &str {
    match person.career_progression.as_ref().map(|p| p.career_stage.as_str()) {
        Some(stage) if !stage.is_empty() => stage,
        _ => "Unknown stage",
    }
}

pub fn skills(person: &AlumniProfile) -> String {
    if person.key_skills.is_empty() {
        return "Not specified".to_string();
    }
    person.key_skills.iter().take(3).cloned().collect::<Vec<_>>().join(", ")
}

pub fn education(person: &AlumniProfile) -> String {
    let major = if person.major.is_empty() { "Not specified" } else { person.major.as_str() };
    let year_known = person.graduation_year != "XX";
    let year = if !person.degree.is_empty() && year_known {
        format!("{} '{}", person.degree, person.graduation_year)
    } else if year_known {
        format!("'{}", person.graduation_year)
    } else {
        "Graduation year unknown".to_string()
    };
    format!("{}, {}", major, year)
}

pub fn networking_label(score: f64) -> &'static str {
    if score >= 80.0 {
        "Excellent"
    } else if score >= 60.0 {
        "Good"
    } else if score >= 40.0 {
        "Fair"
    } else {
        "Limited"
    }
}

/// A titled table of profiles, truncated to `max_rows`. Empty lists render nothing.
pub fn people_table(people: &[AlumniProfile], title: &str, max_rows: usize) -> String {
    if people.is_empty() {
        return String::new();
    }
    let mut out = format!("{} ({} total)\n", title, people.len());
    if max_rows < people.len() {
        out.push_str(&format!("Showing top {} results\n", max_rows));
    }
    for person in people.iter().take(max_rows) {
        out.push_str(&format!(
            "  [{}] {} - {}\n      {} · {}\n      {}\n      {} · {}\n      Skills: {}\n      Network: {}/100 ({})\n",
            initials(&person.name),
            person.name,
            person.position,
            person.company,
            person.location,
            education(person),
            experience(person),
            career_stage(person),
            skills(person),
            person.networking_score,
            networking_label(person.networking_score)
        ));
    }
    out
}

/// Rows pulled out of an alumni reply.
pub fn alumni_rows(rows: &[CareerExample], title: &str, max_rows: usize) -> String {
    let mut out = format!("{} ({} total)\n", title, rows.len());
    if max_rows < rows.len() {
        out.push_str(&format!("Showing top {} results\n", max_rows));
    }
    for row in rows.iter().take(max_rows) {
        out.push_str(&format!(
            "  [{}] {} - {} at {}\n",
            initials(&row.name),
            row.name,
            row.current_role,
            row.current_company
        ));
        if !row.career_path.is_empty() {
            out.push_str(&format!("      Path: {}\n", row.career_path));
        }
    }
    out
}
