use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Publication {
    pub title: String,
    pub url: String,
    pub authors: String,
    pub journal: String,
    pub year: String,
}

impl Display for Publication {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} — {}, {}", self.title, self.journal, self.year)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alumnus {
    pub name: String,
    pub linkedin: String,
    pub duration: String,
    pub position: String,
}

impl Display for Alumnus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) — {}", self.name, self.duration, self.position)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerEntry {
    pub period: String,
    pub position: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EducationEntry {
    pub period: String,
    pub degree: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub name: String,
    pub description: String,
    pub research_interests: String,
    pub professional_career: Vec<CareerEntry>,
    pub education: Vec<EducationEntry>,
    pub email: String,
    pub telephone: String,
    pub orcid: String,
    pub image: String,
}

impl Display for TeamMember {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.email.is_empty() {
            write!(f, " <{}>", self.email)?;
        }
        if !self.professional_career.is_empty() || !self.education.is_empty() {
            write!(
                f,
                " — {} career entry(ies), {} degree(s)",
                self.professional_career.len(),
                self.education.len()
            )?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCategories {
    pub featured: bool,
    pub tool: bool,
    pub database: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolRecord {
    pub name: String,
    pub short_description: String,
    pub long_description: String,
    pub code_repository: String,
    pub website: String,
    pub publication: String,
    pub image: String,
    pub categories: ToolCategories,
}

impl Display for ToolRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)?;
        let mut flags = Vec::new();
        if self.categories.featured {
            flags.push("featured");
        }
        if self.categories.tool {
            flags.push("tool");
        }
        if self.categories.database {
            flags.push("database");
        }
        if !flags.is_empty() {
            write!(f, " [{}]", flags.join(", "))?;
        }
        Ok(())
    }
}

/// A parsed profile page: the record plus the portrait URL still to fetch.
#[derive(Debug, Clone)]
pub struct MemberPage {
    pub member: TeamMember,
    pub image_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ToolPage {
    pub tool: ToolRecord,
    pub image_url: Option<String>,
}

/// Input roster document; only the `current` members are scraped.
#[derive(Debug, Clone, Deserialize)]
pub struct Roster {
    pub current: Vec<RosterMember>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RosterMember {
    pub name: String,
}
