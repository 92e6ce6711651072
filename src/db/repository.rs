//! Typed CRUD over the document store for any [`Resource`].

use serde_json::Value;
use std::marker::PhantomData;
use uuid::Uuid;

use crate::content::media::ImageHosts;
use crate::db::models::{Record, Resource};
use crate::db::store::{DocumentStore, StoreError, StoredDocument};
use crate::error::{ApiError, ValidationErrors};

pub struct Repository<'a, R> {
    store: &'a DocumentStore,
    hosts: &'a ImageHosts,
    _resource: PhantomData<R>,
}

fn decode<R: Resource>(doc: StoredDocument) -> Result<Record<R>, StoreError> {
    Ok(Record {
        id: doc.id,
        doc: serde_json::from_value(doc.body)?,
        created_at: doc.created_at,
        updated_at: doc.updated_at,
    })
}

impl<'a, R: Resource> Repository<'a, R> {
    pub fn new(store: &'a DocumentStore, hosts: &'a ImageHosts) -> Self {
        Self {
            store,
            hosts,
            _resource: PhantomData,
        }
    }

    /// Every document; dated resources newest first, the rest in creation order.
    pub async fn list(&self) -> Result<Vec<Record<R>>, ApiError> {
        let mut records = self
            .store
            .list(R::COLLECTION)
            .await?
            .into_iter()
            .map(decode::<R>)
            .collect::<Result<Vec<_>, _>>()?;

        // sort_by is stable, so equal dates keep creation order
        records.sort_by(|a, b| b.doc.sort_date().cmp(&a.doc.sort_date()));
        Ok(records)
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Record<R>>, ApiError> {
        match self.store.get(R::COLLECTION, id).await? {
            Some(doc) => Ok(Some(decode(doc)?)),
            None => Ok(None),
        }
    }

    pub async fn create(&self, draft: R::Draft) -> Result<Record<R>, ApiError> {
        let doc = R::from_draft(draft, self.hosts)?;
        self.check_references(&doc).await?;

        let body = serde_json::to_value(&doc).map_err(StoreError::from)?;
        let stored = self.store.insert(R::COLLECTION, body).await?;
        tracing::info!(collection = R::COLLECTION, id = %stored.id, "document created");
        Ok(decode(stored)?)
    }

    /// Replace the top-level fields present in `patch`, then re-validate the
    /// whole document. `None` when the document does not exist.
    pub async fn update(&self, id: Uuid, patch: Value) -> Result<Option<Record<R>>, ApiError> {
        let patch = match patch {
            Value::Object(map) => map,
            _ => return Err(ApiError::BadRequest("Body must be a JSON object".to_string())),
        };

        let existing = match self.find(id).await? {
            Some(record) => record,
            None => return Ok(None),
        };

        let previous = serde_json::to_value(&existing.doc).map_err(StoreError::from)?;
        let mut merged = match previous.clone() {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        merged.extend(patch);

        let draft: R::Draft = serde_json::from_value(Value::Object(merged))
            .map_err(|e| ApiError::BadRequest(e.to_string()))?;
        let doc = R::from_draft(draft, self.hosts)?;
        self.check_references(&doc).await?;

        let body = serde_json::to_value(&doc).map_err(StoreError::from)?;
        let moved = R::PINNED_FIELDS
            .iter()
            .find(|field| previous.get(**field) != body.get(**field));
        if let Some(field) = moved {
            if let Some((collection, count)) = self.first_dependent(id).await? {
                return Err(ApiError::Conflict(format!(
                    "{} {} cannot change while {} document(s) in {} reference it",
                    R::NAME,
                    field,
                    count,
                    collection
                )));
            }
        }

        match self.store.replace(R::COLLECTION, id, body).await? {
            Some(stored) => {
                tracing::info!(collection = R::COLLECTION, id = %id, "document updated");
                Ok(Some(decode(stored)?))
            }
            None => Ok(None),
        }
    }

    /// Returns false when the document does not exist. Refuses while other
    /// documents still reference it.
    pub async fn delete(&self, id: Uuid) -> Result<bool, ApiError> {
        if !R::DEPENDENTS.is_empty() {
            if self.store.get(R::COLLECTION, id).await?.is_none() {
                return Ok(false);
            }

            if let Some((collection, count)) = self.first_dependent(id).await? {
                return Err(ApiError::Conflict(format!(
                    "{} is still referenced by {} document(s) in {}",
                    R::NAME,
                    count,
                    collection
                )));
            }
        }

        let deleted = self.store.delete(R::COLLECTION, id).await?;
        if deleted {
            tracing::info!(collection = R::COLLECTION, id = %id, "document deleted");
        }
        Ok(deleted)
    }

    /// The first dependent collection still pointing at `id`, with its count.
    async fn first_dependent(&self, id: Uuid) -> Result<Option<(&'static str, i64)>, ApiError> {
        let key = id.to_string();
        for dependent in R::DEPENDENTS {
            let count = self
                .store
                .count_where(dependent.collection, dependent.field, &key)
                .await?;
            if count > 0 {
                return Ok(Some((dependent.collection, count)));
            }
        }
        Ok(None)
    }

    async fn check_references(&self, doc: &R) -> Result<(), ApiError> {
        let mut errors = ValidationErrors::new();

        for reference in doc.references() {
            let target = self.store.get(reference.collection, reference.id).await?;
            let target = match target {
                Some(t) => t,
                None => {
                    errors.add(
                        reference.field,
                        format!("references a missing {} document", reference.collection),
                    );
                    continue;
                }
            };

            if let Some((field, parent_id)) = reference.parent {
                let parent_key = parent_id.to_string();
                if target.body.get(field).and_then(Value::as_str) != Some(parent_key.as_str()) {
                    errors.add(
                        reference.field,
                        format!("does not belong to the given {}", field),
                    );
                }
            }
        }

        errors.into_result().map_err(ApiError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{
        Blog, BlogDraft, Category, CategoryDraft, Faq, FaqDraft, Portfolio, PortfolioDraft,
        Subcategory, SubcategoryDraft,
    };
    use serde_json::json;

    fn parse<T: serde::de::DeserializeOwned>(value: Value) -> T {
        serde_json::from_value(value).unwrap()
    }

    async fn category(store: &DocumentStore, hosts: &ImageHosts, name: &str) -> Uuid {
        Repository::<Category>::new(store, hosts)
            .create(parse::<CategoryDraft>(json!({ "name": name })))
            .await
            .unwrap()
            .id
    }

    async fn subcategory(
        store: &DocumentStore,
        hosts: &ImageHosts,
        name: &str,
        category: Uuid,
    ) -> Uuid {
        Repository::<Subcategory>::new(store, hosts)
            .create(parse::<SubcategoryDraft>(
                json!({ "name": name, "category": category }),
            ))
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_list_sorts_dated_resources_newest_first() {
        let store = DocumentStore::memory();
        let hosts = ImageHosts::default();
        let repo = Repository::<Blog>::new(&store, &hosts);
        for (title, date) in [
            ("old", "2023-01-01T00:00:00Z"),
            ("new", "2025-01-01T00:00:00Z"),
            ("mid", "2024-01-01T00:00:00Z"),
        ] {
            repo.create(parse::<BlogDraft>(json!({
                "category": "Wedding",
                "title": title,
                "headPhotoLink": "url",
                "date": date
            })))
            .await
            .unwrap();
        }
        let titles: Vec<String> = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.doc.article.title)
            .collect();
        assert_eq!(titles, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn test_update_merges_and_revalidates() {
        let store = DocumentStore::memory();
        let hosts = ImageHosts::default();
        let repo = Repository::<Faq>::new(&store, &hosts);
        let created = repo
            .create(parse::<FaqDraft>(json!({"question": "Q", "answer": "A"})))
            .await
            .unwrap();

        let updated = repo
            .update(created.id, json!({"answer": "B", "id": "ignored"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.doc.question, "Q");
        assert_eq!(updated.doc.answer, "B");

        let err = repo
            .update(created.id, json!({"question": ""}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = repo.update(created.id, json!(["not", "object"])).await.unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));

        assert!(repo
            .update(Uuid::new_v4(), json!({"answer": "C"}))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_portfolio_requires_existing_references() {
        let store = DocumentStore::memory();
        let hosts = ImageHosts::default();
        let weddings = category(&store, &hosts, "Weddings").await;
        let portraits = category(&store, &hosts, "Portraits").await;
        let beach = subcategory(&store, &hosts, "Beach", weddings).await;
        let repo = Repository::<Portfolio>::new(&store, &hosts);

        let err = repo
            .create(parse::<PortfolioDraft>(json!({
                "title": "T",
                "category": Uuid::new_v4(),
                "subcategory": beach
            })))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let err = repo
            .create(parse::<PortfolioDraft>(json!({
                "title": "T",
                "category": portraits,
                "subcategory": beach
            })))
            .await
            .unwrap_err();
        match err {
            ApiError::Validation(errors) => assert_eq!(errors.fields()[0].field, "subcategory"),
            other => panic!("unexpected error: {other:?}"),
        }

        let ok = repo
            .create(parse::<PortfolioDraft>(json!({
                "title": "T",
                "category": weddings,
                "subcategory": beach
            })))
            .await
            .unwrap();
        assert_eq!(ok.doc.subcategory, beach);
    }

    #[tokio::test]
    async fn test_delete_refuses_referenced_category() {
        let store = DocumentStore::memory();
        let hosts = ImageHosts::default();
        let weddings = category(&store, &hosts, "Weddings").await;
        let beach = subcategory(&store, &hosts, "Beach", weddings).await;

        let categories = Repository::<Category>::new(&store, &hosts);
        let err = categories.delete(weddings).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        let subcategories = Repository::<Subcategory>::new(&store, &hosts);
        assert!(subcategories.delete(beach).await.unwrap());
        assert!(categories.delete(weddings).await.unwrap());
        assert!(!categories.delete(weddings).await.unwrap());
    }

    #[tokio::test]
    async fn test_subcategory_cannot_move_while_portfolios_pair_it() {
        let store = DocumentStore::memory();
        let hosts = ImageHosts::default();
        let weddings = category(&store, &hosts, "Weddings").await;
        let portraits = category(&store, &hosts, "Portraits").await;
        let beach = subcategory(&store, &hosts, "Beach", weddings).await;
        let portfolios = Repository::<Portfolio>::new(&store, &hosts);
        let portfolio = portfolios
            .create(parse::<PortfolioDraft>(json!({
                "title": "P",
                "category": weddings,
                "subcategory": beach
            })))
            .await
            .unwrap();

        let subcategories = Repository::<Subcategory>::new(&store, &hosts);
        let err = subcategories
            .update(beach, json!({"category": portraits}))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));

        // renaming leaves the pairing intact
        let renamed = subcategories
            .update(beach, json!({"name": "Seaside"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.doc.category, weddings);

        let edited = portfolios
            .update(portfolio.id, json!({"title": "P2"}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(edited.doc.title, "P2");

        assert!(portfolios.delete(portfolio.id).await.unwrap());
        let moved = subcategories
            .update(beach, json!({"category": portraits}))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.doc.category, portraits);
    }
}
