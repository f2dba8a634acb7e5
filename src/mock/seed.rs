//! Sample records for an empty mock store

use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{Availability, EmploymentType, Job, JobStatus, Profile, UserType};

pub(crate) const SAMPLE_SCHOOL_ID: &str = "school_sample_001";
pub(crate) const SAMPLE_TEACHER_ID: &str = "teacher_sample_001";
pub(crate) const SAMPLE_JOB_ID: &str = "job_sample_001";

/// Ids of the seeded accounts, in listing order
pub(crate) const SAMPLE_ACCOUNT_IDS: [&str; 2] = [SAMPLE_TEACHER_ID, SAMPLE_SCHOOL_ID];

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}

pub(crate) fn sample_school() -> Profile {
    let joined = day(2024, 1, 15);
    Profile {
        id: SAMPLE_SCHOOL_ID.to_string(),
        email: "admin@harbourview-primary.edu".to_string(),
        first_name: "Grace".to_string(),
        last_name: "Adeyemi".to_string(),
        user_type: UserType::School,
        phone: Some("+234-800-555-0100".to_string()),
        profile_image: None,
        availability: Some(Availability::Active),
        bio: Some(
            "A community primary school with small classes and a strong maths programme."
                .to_string(),
        ),
        experience: None,
        education: None,
        skills: Vec::new(),
        location: Some("Lagos, Nigeria".to_string()),
        school_name: Some("Harbourview Primary School".to_string()),
        school_logo: None,
        created_at: joined,
        updated_at: joined,
    }
}

pub(crate) fn sample_teacher() -> Profile {
    let joined = day(2024, 1, 10);
    Profile {
        id: SAMPLE_TEACHER_ID.to_string(),
        email: "amaka.nwosu@example.com".to_string(),
        first_name: "Amaka".to_string(),
        last_name: "Nwosu".to_string(),
        user_type: UserType::Teacher,
        phone: Some("+234-800-555-0199".to_string()),
        profile_image: None,
        availability: Some(Availability::Available),
        bio: Some("Primary teacher focused on numeracy and early science.".to_string()),
        experience: Some("7 years in public and private primary schools".to_string()),
        education: Some("B.Ed Mathematics Education".to_string()),
        skills: vec![
            "Mathematics".to_string(),
            "Science".to_string(),
            "Classroom Management".to_string(),
        ],
        location: Some("Lagos, Nigeria".to_string()),
        school_name: None,
        school_logo: None,
        created_at: joined,
        updated_at: joined,
    }
}

pub(crate) fn sample_job(school: &Profile) -> Job {
    let posted = day(2024, 1, 20);
    Job {
        id: SAMPLE_JOB_ID.to_string(),
        school_id: school.id.clone(),
        title: "Primary Mathematics Teacher".to_string(),
        description: "Plan and deliver engaging numeracy lessons for years 3 to 6.".to_string(),
        requirements: vec![
            "Degree in Education or Mathematics".to_string(),
            "Teaching certification".to_string(),
            "Two years of classroom experience".to_string(),
        ],
        location: "Lagos, Nigeria".to_string(),
        salary_range: Some("₦250,000 - ₦350,000 monthly".to_string()),
        employment_type: EmploymentType::FullTime,
        subject: Some("Mathematics".to_string()),
        grade_level: Some("Primary (Years 3-6)".to_string()),
        application_deadline: None,
        status: JobStatus::Open,
        posted_date: posted.date_naive(),
        school: school.display_name(),
        school_email: school.email.clone(),
        school_logo: school.school_logo.clone(),
        created_at: posted,
        updated_at: posted,
    }
}
