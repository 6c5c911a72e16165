use chrono::Utc;

use crate::auth::PasswordHasher;
use crate::constructors::Repositories;
use crate::entities::{
    Category, Comment, CommentId, Date, Idea, IdeaId, ModerationAction, PrivacyLevel,
    RequiredHelp, Role, Status, User, UserId,
};

const DEMO_PASSWORD: &str = "password123";

struct Person {
    name: &'static str,
    email: &'static str,
    role: Role,
    student_id: Option<&'static str>,
    university: Option<&'static str>,
    department: Option<&'static str>,
    year: Option<u8>,
    expertise: &'static [&'static str],
    bio: Option<&'static str>,
}

const PEOPLE: [Person; 4] = [
    Person {
        name: "John Doe",
        email: "john.student@university.edu",
        role: Role::Student,
        student_id: Some("STU001"),
        university: Some("Tech University"),
        department: Some("Computer Science"),
        year: Some(3),
        expertise: &[],
        bio: None,
    },
    Person {
        name: "Jane Smith",
        email: "jane.student@university.edu",
        role: Role::Student,
        student_id: Some("STU002"),
        university: Some("Tech University"),
        department: Some("Business Administration"),
        year: Some(2),
        expertise: &[],
        bio: None,
    },
    Person {
        name: "Dr. Robert Wilson",
        email: "robert.teacher@university.edu",
        role: Role::Teacher,
        student_id: None,
        university: Some("Tech University"),
        department: Some("Computer Science"),
        year: None,
        expertise: &["AI/ML", "Web Development", "Software Engineering"],
        bio: Some("Professor with 10+ years of experience in AI and software development."),
    },
    Person {
        name: "Sarah Johnson",
        email: "sarah.mentor@techcorp.com",
        role: Role::Teacher,
        student_id: None,
        university: None,
        department: None,
        year: None,
        expertise: &["Business Strategy", "Marketing", "Entrepreneurship"],
        bio: Some("Industry mentor and startup advisor with expertise in business development."),
    },
];

struct Pitch {
    title: &'static str,
    problem: &'static str,
    solution: &'static str,
    secret_sauce: &'static str,
    target_audience: &'static str,
    required_help: &'static [RequiredHelp],
    privacy_level: PrivacyLevel,
    category: Category,
    tags: &'static [&'static str],
    status: Status,
}

const PITCHES: [Pitch; 3] = [
    Pitch {
        title: "EcoTrack - Carbon Footprint Tracker",
        problem: "People are unaware of their daily carbon footprint and need an easy way to \
                  track and reduce their environmental impact.",
        solution: "A mobile app that automatically tracks carbon footprint through location \
                   data, purchase history, and manual input, providing personalized reduction \
                   tips.",
        secret_sauce: "AI-powered recommendations based on user behavior patterns and \
                       gamification elements to encourage sustainable habits.",
        target_audience: "Environmentally conscious individuals aged 18-35 who want to make a \
                          positive impact.",
        required_help: &[
            RequiredHelp::TechnicalMentorship,
            RequiredHelp::BusinessAdvice,
            RequiredHelp::Funding,
        ],
        privacy_level: PrivacyLevel::Public,
        category: Category::Sustainability,
        tags: &["environment", "ai", "mobile app", "sustainability"],
        status: Status::Submitted,
    },
    Pitch {
        title: "StudyBuddy AI",
        problem: "Students struggle with personalized learning and often lack study companions \
                  or mentors for difficult subjects.",
        solution: "An AI-powered study companion that adapts to individual learning styles and \
                   connects students with peer study groups.",
        secret_sauce: "Advanced ML algorithms that understand learning patterns and create \
                       personalized study plans with peer matching.",
        target_audience: "College and university students looking for effective study methods \
                          and peer collaboration.",
        required_help: &[RequiredHelp::TechnicalMentorship, RequiredHelp::Teammates],
        privacy_level: PrivacyLevel::Public,
        category: Category::Education,
        tags: &["ai", "education", "machine learning", "social"],
        status: Status::UnderReview,
    },
    Pitch {
        title: "FinanceFlow - Personal Budget Manager",
        problem: "Young adults struggle with personal finance management and lack proper \
                  budgeting tools designed for their lifestyle.",
        solution: "A smart budgeting app that categorizes expenses automatically and provides \
                   insights on spending patterns.",
        secret_sauce: "Integration with bank APIs and machine learning for expense \
                       categorization and financial goal prediction.",
        target_audience: "Young professionals and students aged 18-30 who want to improve their \
                          financial literacy.",
        required_help: &[
            RequiredHelp::BusinessAdvice,
            RequiredHelp::LegalGuidance,
            RequiredHelp::Funding,
        ],
        privacy_level: PrivacyLevel::Private,
        category: Category::FinTech,
        tags: &["fintech", "budgeting", "mobile app", "ai"],
        status: Status::MentorAssigned,
    },
];

const REMARKS: [&str; 3] = [
    "This is a brilliant idea! Have you considered partnering with environmental organizations \
     for data validation?",
    "Great concept! I think the gamification aspect could be enhanced with social challenges \
     between friends.",
    "The AI study companion sounds promising. What specific ML algorithms are you planning to \
     use for learning pattern recognition?",
];

fn to_user(p: &Person, password_hash: String, now: Date) -> User {
    User {
        id: UserId::generate(),
        name: p.name.to_string(),
        email: p.email.to_string(),
        password_hash,
        role: p.role,
        student_id: p.student_id.map(str::to_string),
        university: p.university.map(str::to_string),
        department: p.department.map(str::to_string),
        year: p.year,
        expertise: p.expertise.iter().map(|e| e.to_string()).collect(),
        bio: p.bio.map(str::to_string),
        avatar: None,
        phone: None,
        is_active: true,
        is_verified: p.role == Role::Teacher,
        email_verified: true,
        last_login: None,
        created_at: now,
        updated_at: now,
    }
}

fn to_idea(p: &Pitch, creator: UserId, mentor: Option<UserId>, now: Date) -> Idea {
    Idea {
        id: IdeaId::generate(),
        creator,
        title: p.title.to_string(),
        problem: p.problem.to_string(),
        solution: p.solution.to_string(),
        secret_sauce: p.secret_sauce.to_string(),
        target_audience: p.target_audience.to_string(),
        required_help: p.required_help.to_vec(),
        privacy_level: p.privacy_level,
        category: p.category,
        tags: p.tags.iter().map(|t| t.to_string()).collect(),
        status: p.status,
        assigned_mentor: mentor,
        mentor_assigned_at: mentor.map(|_| now),
        upvotes: vec![],
        views: 0,
        milestones: vec![],
        updates: vec![],
        reviewed_by: None,
        reviewed_at: None,
        review_notes: None,
        is_featured: false,
        featured_at: None,
        created_at: now,
        updated_at: now,
    }
}

fn to_comment(content: &str, author: UserId, idea: IdeaId, now: Date) -> Comment {
    Comment {
        id: CommentId::generate(),
        content: content.to_string(),
        author,
        idea,
        parent_comment: None,
        likes: vec![],
        is_edited: false,
        edited_at: None,
        is_deleted: false,
        deleted_at: None,
        flags: vec![],
        moderated_by: None,
        moderation_action: ModerationAction::Approved,
        moderation_note: None,
        moderated_at: None,
        created_at: now,
        updated_at: now,
    }
}

/// Wipes every collection and fills it with a small demo data set.
pub async fn seed(repos: &Repositories, passwords: PasswordHasher) -> anyhow::Result<()> {
    tracing::info!("clearing existing data...");
    repos.comments.clear().await?;
    repos.ideas.clear().await?;
    repos.users.clear().await?;

    let now = Utc::now();
    let hash = passwords.hash(DEMO_PASSWORD).await?;

    let mut users = vec![];
    for p in PEOPLE.iter() {
        let user = to_user(p, hash.clone(), now);
        repos.users.insert(user.clone()).await?;
        users.push(user.id);
    }
    tracing::info!("created {} users", users.len());

    let mut ideas = vec![];
    for (i, p) in PITCHES.iter().enumerate() {
        let mentor = (i == 2).then_some(users[2]);
        let idea = to_idea(p, users[i % 2], mentor, now);
        repos.ideas.insert(idea.clone()).await?;
        ideas.push(idea.id);
    }
    tracing::info!("created {} ideas", ideas.len());

    for (i, content) in REMARKS.iter().enumerate() {
        let author = users[(i + 2) % users.len()];
        let comment = to_comment(content, author, ideas[i % ideas.len()], now);
        repos.comments.insert(comment).await?;
    }
    tracing::info!("created {} comments", REMARKS.len());

    for (idea, voter) in [
        (ideas[0], users[1]),
        (ideas[0], users[2]),
        (ideas[1], users[0]),
        (ideas[1], users[3]),
    ] {
        repos.ideas.toggle_upvote(idea, voter, now).await?;
    }
    tracing::info!("added upvotes to ideas");

    tracing::info!("seeding completed, demo credentials:");
    for p in PEOPLE.iter() {
        tracing::info!("  {} ({}): {} / {}", p.name, p.role, p.email, DEMO_PASSWORD);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{CommentQuery, IdeaQuery, Page, ParentQuery};

    #[tokio::test]
    async fn fills_an_empty_store() {
        let repos = Repositories::in_memory();

        seed(&repos, PasswordHasher::new(4)).await.unwrap();
        // a second run starts over
        seed(&repos, PasswordHasher::new(4)).await.unwrap();

        let teacher = repos
            .users
            .find_by_email("robert.teacher@university.edu")
            .await
            .unwrap();
        assert!(teacher.is_verified);

        assert_eq!(repos.ideas.count(IdeaQuery::default()).await.unwrap(), 3);

        let ideas = repos
            .ideas
            .finds(IdeaQuery::default(), Default::default(), Page::all())
            .await
            .unwrap();
        let private = ideas.iter().find(|i| !i.is_public()).unwrap();
        assert_eq!(private.assigned_mentor, Some(teacher.id));

        let eco = ideas.iter().find(|i| i.title.starts_with("EcoTrack")).unwrap();
        assert_eq!(eco.upvote_count(), 2);

        let comments = repos
            .comments
            .count(CommentQuery {
                idea: Some(eco.id),
                parent: Some(ParentQuery::TopLevel),
                listed_only: true,
            })
            .await
            .unwrap();
        assert_eq!(comments, 1);
    }
}
