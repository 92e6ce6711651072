//! Document models - the schemas stored in the document store, with the
//! draft shapes accepted from the admin panel.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::content::{
    lists::{compact, non_blank, Blank},
    media::{check_link, check_links, ImageHosts},
    required, sanitize_html,
};
use crate::error::ValidationErrors;

// ============================================================================
// Resource contract
// ============================================================================

/// A document that must exist for another document to be valid.
#[derive(Debug, Clone, PartialEq)]
pub struct Reference {
    pub field: &'static str,
    pub collection: &'static str,
    pub id: Uuid,
    /// The referenced document's `(field, id)` must match as well.
    pub parent: Option<(&'static str, Uuid)>,
}

/// Documents in `collection` pointing at this resource through `field`.
#[derive(Debug, Clone, Copy)]
pub struct Dependent {
    pub collection: &'static str,
    pub field: &'static str,
}

/// A collection served by the generic resource handlers.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    /// Human-readable name used in error messages.
    const NAME: &'static str;
    /// Documents that block deletion while they reference this one.
    const DEPENDENTS: &'static [Dependent] = &[];
    /// Fields that may not change while any dependent still references
    /// this document.
    const PINNED_FIELDS: &'static [&'static str] = &[];

    /// Body accepted on create. Updates merge the stored document with the
    /// request body and parse the result as a draft again.
    type Draft: DeserializeOwned + Send;

    fn from_draft(draft: Self::Draft, hosts: &ImageHosts) -> Result<Self, ValidationErrors>;

    /// Collections with a date are listed newest first.
    fn sort_date(&self) -> Option<DateTime<Utc>> {
        None
    }

    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }
}

/// A document with its store metadata, as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<R> {
    pub id: Uuid,
    #[serde(flatten)]
    pub doc: R,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Category / Subcategory
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryDraft {
    pub name: Option<String>,
}

impl Resource for Category {
    const COLLECTION: &'static str = "categories";
    const NAME: &'static str = "Category";
    const DEPENDENTS: &'static [Dependent] = &[
        Dependent {
            collection: Subcategory::COLLECTION,
            field: "category",
        },
        Dependent {
            collection: Portfolio::COLLECTION,
            field: "category",
        },
    ];
    type Draft = CategoryDraft;

    fn from_draft(draft: CategoryDraft, _: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", draft.name);
        errors.into_result()?;
        Ok(Self { name })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subcategory {
    pub name: String,
    pub category: Uuid,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubcategoryDraft {
    pub name: Option<String>,
    pub category: Option<Uuid>,
}

impl Resource for Subcategory {
    const COLLECTION: &'static str = "subcategories";
    const NAME: &'static str = "Subcategory";
    const DEPENDENTS: &'static [Dependent] = &[Dependent {
        collection: Portfolio::COLLECTION,
        field: "subcategory",
    }];
    // portfolios pair a subcategory with its category
    const PINNED_FIELDS: &'static [&'static str] = &["category"];
    type Draft = SubcategoryDraft;

    fn from_draft(draft: SubcategoryDraft, _: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", draft.name);
        if draft.category.is_none() {
            errors.add("category", "is required");
        }
        errors.into_result()?;
        Ok(Self {
            name,
            category: draft.category.unwrap_or_default(),
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![Reference {
            field: "category",
            collection: Category::COLLECTION,
            id: self.category,
            parent: None,
        }]
    }
}

// ============================================================================
// Articles: Blog and Service
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Paragraph {
    pub heading: String,
    pub content: String,
}

impl Blank for Paragraph {
    fn is_blank(&self) -> bool {
        self.heading.is_blank() && self.content.is_blank()
    }
}

/// Fields shared by blog posts and service pages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    /// Free-text label; the public pages group by it.
    pub category: String,
    pub title: String,
    pub head_photo_link: String,
    pub head_photo_links: Vec<String>,
    pub paragraphs: Vec<Paragraph>,
    pub sub_photos: Vec<String>,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub date: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArticleDraft {
    pub category: Option<String>,
    pub title: Option<String>,
    pub head_photo_link: Option<String>,
    pub head_photo_links: Vec<String>,
    pub paragraphs: Vec<Paragraph>,
    pub sub_photos: Vec<String>,
    pub photos: Vec<String>,
    pub videos: Vec<String>,
    pub date: Option<DateTime<Utc>>,
}

impl ArticleDraft {
    fn build(self, errors: &mut ValidationErrors, hosts: &ImageHosts) -> Article {
        let category = required(errors, "category", self.category);
        let title = required(errors, "title", self.title);
        let head_photo_link = required(errors, "headPhotoLink", self.head_photo_link);

        let head_photo_links = compact(self.head_photo_links);
        let sub_photos = compact(self.sub_photos);
        let photos = compact(self.photos);
        let videos = compact(self.videos);
        let paragraphs = compact(self.paragraphs)
            .into_iter()
            .map(|p| Paragraph {
                heading: p.heading.trim().to_string(),
                content: sanitize_html(&p.content),
            })
            .collect();

        if !head_photo_link.is_empty() {
            check_link(errors, "headPhotoLink", &head_photo_link, Some(hosts));
        }
        check_links(errors, "headPhotoLinks", &head_photo_links, Some(hosts));
        check_links(errors, "subPhotos", &sub_photos, Some(hosts));
        check_links(errors, "photos", &photos, Some(hosts));
        check_links(errors, "videos", &videos, None);

        Article {
            category,
            title,
            head_photo_link,
            head_photo_links,
            paragraphs,
            sub_photos,
            photos,
            videos,
            date: self.date.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blog {
    #[serde(flatten)]
    pub article: Article,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub couple_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub wedding_date: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogDraft {
    #[serde(flatten)]
    pub article: ArticleDraft,
    pub couple_name: Option<String>,
    pub wedding_date: Option<NaiveDate>,
}

impl Resource for Blog {
    const COLLECTION: &'static str = "blogs";
    const NAME: &'static str = "Blog";
    type Draft = BlogDraft;

    fn from_draft(draft: BlogDraft, hosts: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let article = draft.article.build(&mut errors, hosts);
        errors.into_result()?;
        Ok(Self {
            article,
            couple_name: non_blank(draft.couple_name),
            wedding_date: draft.wedding_date,
        })
    }

    fn sort_date(&self) -> Option<DateTime<Utc>> {
        Some(self.article.date)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    #[serde(flatten)]
    pub article: Article,
}

impl Resource for Service {
    const COLLECTION: &'static str = "services";
    const NAME: &'static str = "Service";
    type Draft = ArticleDraft;

    fn from_draft(draft: ArticleDraft, hosts: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let article = draft.build(&mut errors, hosts);
        errors.into_result()?;
        Ok(Self { article })
    }

    fn sort_date(&self) -> Option<DateTime<Utc>> {
        Some(self.article.date)
    }
}

// ============================================================================
// BlogNew - single-body post
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogNew {
    pub photo: String,
    pub headline: String,
    pub date: DateTime<Utc>,
    pub body: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogNewDraft {
    pub photo: Option<String>,
    pub headline: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub body: Option<String>,
}

impl Resource for BlogNew {
    const COLLECTION: &'static str = "blognews";
    const NAME: &'static str = "BlogNew";
    type Draft = BlogNewDraft;

    fn from_draft(draft: BlogNewDraft, hosts: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let photo = required(&mut errors, "photo", draft.photo);
        let headline = required(&mut errors, "headline", draft.headline);
        let body = required(&mut errors, "body", draft.body);
        if !photo.is_empty() {
            check_link(&mut errors, "photo", &photo, Some(hosts));
        }
        errors.into_result()?;
        Ok(Self {
            photo,
            headline,
            date: draft.date.unwrap_or_else(Utc::now),
            body: sanitize_html(&body),
        })
    }

    fn sort_date(&self) -> Option<DateTime<Utc>> {
        Some(self.date)
    }
}

// ============================================================================
// Portfolio
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portfolio {
    pub title: String,
    pub category: Uuid,
    pub subcategory: Uuid,
    pub photos: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PortfolioDraft {
    pub title: Option<String>,
    pub category: Option<Uuid>,
    pub subcategory: Option<Uuid>,
    pub photos: Vec<String>,
}

impl Resource for Portfolio {
    const COLLECTION: &'static str = "portfolios";
    const NAME: &'static str = "Portfolio";
    type Draft = PortfolioDraft;

    fn from_draft(draft: PortfolioDraft, hosts: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let title = required(&mut errors, "title", draft.title);
        if draft.category.is_none() {
            errors.add("category", "is required");
        }
        if draft.subcategory.is_none() {
            errors.add("subcategory", "is required");
        }
        let photos = compact(draft.photos);
        check_links(&mut errors, "photos", &photos, Some(hosts));
        errors.into_result()?;
        Ok(Self {
            title,
            category: draft.category.unwrap_or_default(),
            subcategory: draft.subcategory.unwrap_or_default(),
            photos,
        })
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference {
                field: "category",
                collection: Category::COLLECTION,
                id: self.category,
                parent: None,
            },
            Reference {
                field: "subcategory",
                collection: Subcategory::COLLECTION,
                id: self.subcategory,
                parent: Some(("category", self.category)),
            },
        ]
    }
}

// ============================================================================
// Testimonial / FAQ
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub name: String,
    pub location: String,
    pub review: String,
    pub rating: u8,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TestimonialDraft {
    pub name: Option<String>,
    pub location: Option<String>,
    pub review: Option<String>,
    pub rating: Option<i64>,
}

impl Resource for Testimonial {
    const COLLECTION: &'static str = "testimonials";
    const NAME: &'static str = "Testimonial";
    type Draft = TestimonialDraft;

    fn from_draft(draft: TestimonialDraft, _: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let name = required(&mut errors, "name", draft.name);
        let location = required(&mut errors, "location", draft.location);
        let review = required(&mut errors, "review", draft.review);
        let rating = match draft.rating {
            Some(r @ 1..=5) => r as u8,
            Some(_) => {
                errors.add("rating", "must be between 1 and 5");
                0
            }
            None => {
                errors.add("rating", "is required");
                0
            }
        };
        errors.into_result()?;
        Ok(Self {
            name,
            location,
            review,
            rating,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FaqDraft {
    pub question: Option<String>,
    pub answer: Option<String>,
}

impl Resource for Faq {
    const COLLECTION: &'static str = "faqs";
    const NAME: &'static str = "FAQ";
    type Draft = FaqDraft;

    fn from_draft(draft: FaqDraft, _: &ImageHosts) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let question = required(&mut errors, "question", draft.question);
        let answer = required(&mut errors, "answer", draft.answer);
        errors.into_result()?;
        Ok(Self { question, answer })
    }
}
