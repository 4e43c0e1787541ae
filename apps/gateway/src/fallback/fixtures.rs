//! Seed data for the fallback engine. Ids here are plain (`job1`,
//! `resume1`) while anything created at runtime gets a `local-` prefix, so
//! the two can never collide.

use chrono::{DateTime, TimeZone, Utc};

use crate::models::{JobPosting, JobStatus, ResumeRecord, Role, UserProfile};

use super::DemoUser;

/// Skills assigned to simulated resume extractions.
pub(super) const SKILL_POOL: &[&str] = &[
    "Python",
    "Django",
    "React",
    "TypeScript",
    "Node.js",
    "AWS",
    "SQL",
    "Docker",
    "Kubernetes",
    "CI/CD",
    "Linux",
    "Machine Learning",
    "Figma",
    "User Research",
];

pub(super) fn demo_users() -> Vec<DemoUser> {
    vec![
        demo_user("admin_id", "admin@recruitai.com", "Admin", Role::Admin),
        demo_user(
            "recruiter_id",
            "recruiter@recruitai.com",
            "Recruiter",
            Role::Recruiter,
        ),
        demo_user(
            "candidate_id",
            "candidate@recruitai.com",
            "Candidate",
            Role::Candidate,
        ),
    ]
}

fn demo_user(id: &str, email: &str, display_name: &str, role: Role) -> DemoUser {
    let slug = display_name.to_lowercase();
    DemoUser {
        profile: UserProfile {
            id: id.to_string(),
            email: email.to_string(),
            display_name: display_name.to_string(),
            role,
        },
        password: "password123".to_string(),
        access_token: format!("mock_{slug}_token"),
        refresh_token: format!("mock_{slug}_refresh"),
    }
}

pub(super) fn seed_jobs() -> Vec<JobPosting> {
    vec![
        job(
            "job1",
            "Senior Software Engineer",
            "Develop and maintain high-quality software solutions across our hiring platform.",
            &["Python", "Django", "React", "AWS", "SQL"],
            "Remote",
            JobStatus::Open,
            day(2026, 6, 2),
        ),
        job(
            "job2",
            "Frontend Developer",
            "Build user interfaces for recruiter and candidate dashboards using modern web technologies.",
            &["React", "JavaScript", "HTML", "CSS", "TypeScript"],
            "New York, NY",
            JobStatus::Open,
            day(2026, 6, 9),
        ),
        job(
            "job3",
            "DevOps Engineer",
            "Streamline development and operations processes for our deployment pipeline.",
            &["Docker", "Kubernetes", "CI/CD", "Ansible", "Linux"],
            "San Francisco, CA",
            JobStatus::Open,
            day(2026, 6, 16),
        ),
        job(
            "job4",
            "Data Scientist",
            "Analyze large hiring datasets and build predictive matching models.",
            &["Python", "R", "Machine Learning", "SQL", "Statistics"],
            "Boston, MA",
            JobStatus::Closed,
            day(2026, 6, 23),
        ),
        job(
            "job5",
            "UI/UX Designer",
            "Create intuitive, visually appealing interfaces for web and mobile applications.",
            &["Figma", "Sketch", "Adobe XD", "User Research", "Prototyping"],
            "Remote",
            JobStatus::Open,
            day(2026, 6, 30),
        ),
    ]
}

pub(super) fn seed_resumes() -> Vec<ResumeRecord> {
    vec![
        resume(
            "resume1",
            "Alice Smith",
            &["Python", "Django", "AWS", "SQL", "JavaScript"],
            5,
            day(2026, 7, 6),
            &[("job1", 92)],
        ),
        resume(
            "resume2",
            "Bob Johnson",
            &["React", "TypeScript", "HTML", "CSS", "Node.js"],
            3,
            day(2026, 7, 8),
            &[("job2", 88)],
        ),
        resume(
            "resume3",
            "Charlie Brown",
            &["Docker", "Kubernetes", "CI/CD", "Ansible", "Linux"],
            7,
            day(2026, 7, 10),
            &[("job3", 95)],
        ),
        resume(
            "resume4",
            "Diana Prince",
            &["Python", "Machine Learning", "R", "SQL", "Data Visualization"],
            4,
            day(2026, 7, 12),
            &[("job4", 70)],
        ),
        resume(
            "resume5",
            "Eve Adams",
            &["Figma", "User Research", "Prototyping", "Sketch", "Adobe XD"],
            2,
            day(2026, 7, 14),
            &[("job5", 85)],
        ),
    ]
}

fn job(
    id: &str,
    title: &str,
    description: &str,
    skills: &[&str],
    location: &str,
    status: JobStatus,
    created_at: DateTime<Utc>,
) -> JobPosting {
    JobPosting {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        required_skills: skills.iter().map(|s| s.to_string()).collect(),
        location: location.to_string(),
        status,
        created_at,
    }
}

fn resume(
    id: &str,
    name: &str,
    skills: &[&str],
    experience_years: u32,
    upload_date: DateTime<Utc>,
    scores: &[(&str, u8)],
) -> ResumeRecord {
    let slug = name.to_lowercase().replace(' ', ".");
    ResumeRecord {
        id: id.to_string(),
        candidate_name: name.to_string(),
        candidate_email: format!("{slug}@example.com"),
        skills: skills.iter().map(|s| s.to_string()).collect(),
        experience_years,
        upload_date,
        match_scores: scores
            .iter()
            .map(|(job_id, score)| (job_id.to_string(), *score))
            .collect(),
    }
}

fn day(year: i32, month: u32, dom: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, dom, 9, 0, 0).unwrap()
}
