//! Sample-data generator for the local store: professionals with accounts,
//! reviews from generated reviewers, and featured projects.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;
use serde::Serialize;
use uuid::Uuid;

use crate::backend::local::register_account;
use crate::backend::SignUpRequest;
use crate::db::{self, DatabaseError};
use crate::models::*;

pub const SAMPLE_PASSWORD: &str = "password123";

const CATEGORIES: &[&str] = &[
    "plumbing", "electrical", "carpentry", "painting",
    "hvac", "landscaping", "cleaning", "roofing",
    "tiling", "concrete", "masonry", "drywall",
    "flooring", "pool", "pest control", "security",
    "solar", "moving", "appliance repair", "cabinetry",
];

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "John", "Patricia", "Robert", "Jennifer", "Michael", "Linda",
    "William", "Elizabeth", "David", "Barbara", "Richard", "Susan", "Joseph", "Jessica",
    "Thomas", "Sarah", "Charles", "Karen", "Christopher", "Nancy", "Daniel", "Lisa",
    "Matthew", "Margaret", "Anthony", "Betty", "Mark", "Sandra", "Donald", "Ashley",
    "Steven", "Dorothy", "Paul", "Kimberly", "Andrew", "Emily", "Joshua", "Donna",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis",
    "Rodriguez", "Martinez", "Hernandez", "Lopez", "Gonzalez", "Wilson", "Anderson",
    "Thomas", "Taylor", "Moore", "Jackson", "Martin", "Lee", "Perez", "Thompson", "White",
    "Harris", "Sanchez", "Clark", "Ramirez", "Lewis", "Robinson", "Walker", "Young",
    "Allen", "King", "Wright", "Scott", "Torres", "Nguyen", "Hill", "Flores",
];

const LOCATIONS: &[&str] = &[
    "New York, NY", "Los Angeles, CA", "Chicago, IL", "Houston, TX", "Phoenix, AZ",
    "Philadelphia, PA", "San Antonio, TX", "San Diego, CA", "Dallas, TX", "San Jose, CA",
    "Austin, TX", "Jacksonville, FL", "Fort Worth, TX", "Columbus, OH", "Charlotte, NC",
    "San Francisco, CA", "Indianapolis, IN", "Seattle, WA", "Denver, CO", "Boston, MA",
];

const SPECIALTY_OPTIONS: &[&str] = &[
    "Emergency Repairs", "Installation", "Maintenance", "Residential",
    "Commercial", "Industrial", "Green Solutions", "Custom Work",
    "Renovations", "New Construction", "Troubleshooting", "Inspections",
    "Consultations", "Upgrades", "Repairs", "Smart Home",
];

const AVAILABILITY: &[&str] = &["Available now", "Available next week", "Limited availability"];

const FIVE_STAR_COMMENTS: &[&str] = &[
    "Excellent service! Very professional and completed the job quickly.",
    "Couldn't be happier with the quality of work. Highly recommend!",
    "Arrived on time, worked efficiently, and left the area clean. Perfect!",
    "Outstanding professional. Will definitely hire again for future projects.",
    "Top-notch service and expertise. Worth every penny!",
];

const FOUR_STAR_COMMENTS: &[&str] = &[
    "Good work overall. Minor issues but addressed them promptly.",
    "Reliable and knowledgeable. Slightly over the estimated time but good results.",
    "Professional service with good attention to detail. Would use again.",
    "Very satisfied with the work. Good communication throughout the project.",
    "Quality service and fair pricing. Some delays but worth the wait.",
];

const THREE_STAR_COMMENTS: &[&str] = &[
    "Decent work but took longer than expected.",
    "Acceptable service but communication could be improved.",
    "Got the job done but had to clarify several requirements multiple times.",
    "Service was okay. Some room for improvement but got the basics right.",
    "Average service. Met expectations but nothing exceptional.",
];

const DEFAULT_PROJECT_TITLES: &[&str] = &[
    "Professional Service Project",
    "Client Renovation",
    "Custom Installation",
];

fn project_titles(category: &str) -> &'static [&'static str] {
    match category {
        "plumbing" => &["Complete Bathroom Remodel", "Kitchen Sink Installation", "Water Heater Replacement"],
        "electrical" => &["Home Rewiring", "Smart Home Installation", "Lighting System Upgrade"],
        "carpentry" => &["Custom Kitchen Cabinets", "Deck Construction", "Built-in Bookshelves"],
        "painting" => &["Exterior Home Painting", "Interior Color Transformation", "Cabinet Refinishing"],
        "hvac" => &["Central AC Installation", "Heating System Upgrade", "Ductwork Replacement"],
        "landscaping" => &["Garden Design & Implementation", "Backyard Transformation", "Water Feature Installation"],
        "cleaning" => &["Deep Home Cleaning", "Post-Construction Cleanup", "Move-out Cleaning"],
        "roofing" => &["Complete Roof Replacement", "Roof Leak Repair", "Gutter System Installation"],
        _ => DEFAULT_PROJECT_TITLES,
    }
}

/// Comment pool for a 3 to 5 star rating.
pub fn comments_for(rating: i32) -> &'static [&'static str] {
    match rating {
        5 => FIVE_STAR_COMMENTS,
        4 => FOUR_STAR_COMMENTS,
        _ => THREE_STAR_COMMENTS,
    }
}

fn pick<'a, R: Rng>(rng: &mut R, options: &'a [&'a str]) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}

#[derive(Debug, Clone)]
pub struct SampleReview {
    pub reviewer_first_name: String,
    pub reviewer_last_name: String,
    pub rating: i32,
    pub comment: String,
    pub days_ago: i64,
}

#[derive(Debug, Clone)]
pub struct SampleProject {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub days_ago: i64,
}

/// One generated provider before it is written anywhere.
#[derive(Debug, Clone)]
pub struct SampleProfessional {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
    pub category: String,
    pub hourly_rate: f64,
    pub years_experience: i32,
    pub specialties: Vec<String>,
    pub verified: bool,
    pub availability: String,
    pub emergency_available: bool,
    pub daily_pay_available: bool,
    pub reviews: Vec<SampleReview>,
    pub project: Option<SampleProject>,
}

impl SampleProfessional {
    pub fn bio(&self) -> String {
        format!(
            "Professional {} specialist with {} years of experience.",
            self.category, self.years_experience
        )
    }
}

pub fn sample_professional<R: Rng>(rng: &mut R) -> SampleProfessional {
    let first_name = pick(rng, FIRST_NAMES).to_string();
    let last_name = pick(rng, LAST_NAMES).to_string();
    let email = format!(
        "{}.{}{}@example.com",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        rng.gen_range(0..1000)
    );
    let phone = format!(
        "+1{}{}{}",
        rng.gen_range(100..1000),
        rng.gen_range(100..1000),
        rng.gen_range(1000..10000)
    );
    let category = pick(rng, CATEGORIES).to_string();

    let mut specialties: Vec<String> = Vec::new();
    for _ in 0..rng.gen_range(2..=4) {
        let specialty = pick(rng, SPECIALTY_OPTIONS);
        if !specialties.iter().any(|s| s == specialty) {
            specialties.push(specialty.to_string());
        }
    }

    let reviews = (0..rng.gen_range(3..=5))
        .map(|_| {
            let rating = rng.gen_range(3..=5);
            SampleReview {
                reviewer_first_name: pick(rng, FIRST_NAMES).to_string(),
                reviewer_last_name: pick(rng, LAST_NAMES).to_string(),
                rating,
                comment: pick(rng, comments_for(rating)).to_string(),
                days_ago: rng.gen_range(0..90),
            }
        })
        .collect();

    let project = rng.gen_bool(0.5).then(|| SampleProject {
        title: pick(rng, project_titles(&category)).to_string(),
        description: format!(
            "A showcase of my best work in {category}. This project demonstrates my attention to detail and commitment to quality."
        ),
        image_url: format!(
            "https://source.unsplash.com/random/600x400?{}",
            category.replace(' ', "%20")
        ),
        days_ago: rng.gen_range(0..180),
    });

    SampleProfessional {
        hourly_rate: f64::from(rng.gen_range(20..120)),
        years_experience: rng.gen_range(1..=20),
        verified: rng.gen_bool(0.7),
        availability: pick(rng, AVAILABILITY).to_string(),
        emergency_available: rng.gen_bool(0.25),
        daily_pay_available: rng.gen_bool(0.4),
        first_name,
        last_name,
        email,
        phone,
        location: pick(rng, LOCATIONS).to_string(),
        category,
        specialties,
        reviews,
        project,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeedReport {
    pub professionals: u32,
    pub reviews: u32,
    pub projects: u32,
    pub skipped: u32,
}

/// Write one sample provider. Returns the new professional's id.
fn insert_sample(
    conn: &Connection,
    sample: &SampleProfessional,
    now: DateTime<Utc>,
) -> Result<Uuid, DatabaseError> {
    let id = register_account(
        conn,
        &SignUpRequest {
            email: sample.email.clone(),
            password: SAMPLE_PASSWORD.into(),
            first_name: sample.first_name.clone(),
            last_name: sample.last_name.clone(),
            phone: Some(sample.phone.clone()),
            is_professional: false,
        },
    )?;

    db::update_profile(
        conn,
        &id,
        &ProfileUpdate {
            location: Some(sample.location.clone()),
            bio: Some(sample.bio()),
            is_professional: Some(true),
            updated_at: now,
            ..Default::default()
        },
    )?;
    conn.execute(
        "UPDATE profiles SET avatar_url = ?2 WHERE id = ?1",
        rusqlite::params![id.to_string(), format!("https://i.pravatar.cc/300?u={id}")],
    )?;

    db::insert_professional(
        conn,
        &Professional {
            id,
            category: sample.category.clone(),
            hourly_rate: Some(sample.hourly_rate),
            years_experience: Some(sample.years_experience),
            availability: Some(sample.availability.clone()),
            verification_badge: sample.verified,
            specialties: sample.specialties.clone(),
            emergency_available: sample.emergency_available,
            daily_pay_available: sample.daily_pay_available,
        },
    )?;

    for review in &sample.reviews {
        let reviewer = Uuid::new_v4();
        db::insert_profile(
            conn,
            &Profile {
                id: reviewer,
                first_name: Some(review.reviewer_first_name.clone()),
                last_name: Some(review.reviewer_last_name.clone()),
                avatar_url: None,
                phone: None,
                bio: None,
                location: None,
                is_professional: false,
                created_at: now,
                updated_at: now,
            },
        )?;
        db::insert_review(
            conn,
            &Review {
                id: Uuid::new_v4(),
                professional_id: id,
                client_id: reviewer,
                rating: review.rating,
                comment: Some(review.comment.clone()),
                created_at: now - Duration::days(review.days_ago),
            },
        )?;
    }

    if let Some(ref project) = sample.project {
        db::insert_project(
            conn,
            &Project {
                id: Uuid::new_v4(),
                professional_id: id,
                title: project.title.clone(),
                description: Some(project.description.clone()),
                image_url: Some(project.image_url.clone()),
                is_featured: true,
                completion_date: Some((now - Duration::days(project.days_ago)).date_naive()),
            },
        )?;
    }

    Ok(id)
}

/// Generate `count` providers. A provider whose generated email is already
/// taken is skipped, mirroring a failed account creation.
pub fn generate<R: Rng>(
    conn: &Connection,
    count: u32,
    rng: &mut R,
) -> Result<SeedReport, DatabaseError> {
    let now = Utc::now();
    let mut report = SeedReport::default();

    for i in 0..count {
        let sample = sample_professional(rng);
        match insert_sample(conn, &sample, now) {
            Ok(_) => {
                report.professionals += 1;
                report.reviews += sample.reviews.len() as u32;
                report.projects += u32::from(sample.project.is_some());
            }
            Err(DatabaseError::ConstraintViolation(reason)) => {
                tracing::warn!(index = i, %reason, "Skipping sample professional");
                report.skipped += 1;
            }
            Err(e) => return Err(e),
        }
    }

    tracing::info!(
        professionals = report.professionals,
        reviews = report.reviews,
        projects = report.projects,
        skipped = report.skipped,
        "Sample data generated"
    );
    Ok(report)
}
