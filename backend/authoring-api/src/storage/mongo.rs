use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, LocalResult, TimeZone, Utc};
use mongodb::{
    bson::{doc, oid::ObjectId, to_bson, Bson, Document},
    Collection, Database,
};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::models::activity::{Activity, ActivityContent, ActivityStatus};
use crate::models::taxonomy::PersistedType;
use crate::storage::{ActivityPatch, ActivityStore, StoreError, SubmissionStore};

const ACTIVITIES_COLLECTION: &str = "activities";
const SUBMISSIONS_COLLECTION: &str = "submissions";

/// Storage shape of an activity. The `type` field holds the persisted
/// classification string; the taxonomy mapper runs on every read and
/// every write, so unknown values fail the operation instead of leaking.
#[derive(Debug, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub activity_type: String,
    pub max_score: f64,
    pub content: ActivityContent,
    pub status: ActivityStatus,
    pub owner_id: String,
    #[serde(default)]
    pub due_date: Option<mongodb::bson::DateTime>,
    #[serde(rename = "createdAt", alias = "created_at")]
    pub created_at: mongodb::bson::DateTime,
    #[serde(rename = "updatedAt", alias = "updated_at")]
    pub updated_at: mongodb::bson::DateTime,
}

impl ActivityRecord {
    pub fn into_domain(self) -> Result<Activity, StoreError> {
        let persisted = PersistedType::from_str(&self.activity_type)?;
        Ok(Activity {
            id: self.id.to_hex(),
            title: self.title,
            description: self.description,
            author_type: persisted.to_author(),
            max_score: self.max_score,
            content: self.content,
            status: self.status,
            owner_id: self.owner_id,
            due_date: self.due_date.as_ref().map(bson_to_chrono),
            created_at: bson_to_chrono(&self.created_at),
            updated_at: bson_to_chrono(&self.updated_at),
        })
    }
}

pub struct MongoActivityStore {
    mongo: Database,
}

impl MongoActivityStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }

    fn collection(&self) -> Collection<ActivityRecord> {
        self.mongo.collection(ACTIVITIES_COLLECTION)
    }
}

#[async_trait]
impl ActivityStore for MongoActivityStore {
    async fn insert(&self, activity: &Activity) -> Result<String, StoreError> {
        let content =
            to_bson(&activity.content).context("Failed to serialize activity content")?;
        let record = doc! {
            "title": activity.title.clone(),
            "description": activity.description.clone(),
            "type": activity.persisted_type().as_str(),
            "max_score": activity.max_score,
            "content": content,
            "status": activity.status.as_str(),
            "owner_id": activity.owner_id.clone(),
            "due_date": activity.due_date.map(|dt| chrono_to_bson(&dt)),
            "created_at": chrono_to_bson(&activity.created_at),
            "updated_at": chrono_to_bson(&activity.updated_at),
        };

        let collection: Collection<Document> = self.mongo.collection(ACTIVITIES_COLLECTION);
        let result = collection
            .insert_one(record)
            .await
            .context("Failed to insert activity")?;

        let id = result
            .inserted_id
            .as_object_id()
            .ok_or_else(|| anyhow!("Activity insertion did not return ObjectId"))?;
        Ok(id.to_hex())
    }

    async fn update(&self, id: &str, patch: ActivityPatch) -> Result<(), StoreError> {
        let object_id = ObjectId::parse_str(id)
            .map_err(|_| StoreError::Backend(anyhow!("Invalid activity id: {}", id)))?;

        let mut update = Document::new();
        if let Some(title) = patch.title {
            update.insert("title", title);
        }
        if let Some(description) = patch.description {
            update.insert("description", description);
        }
        if let Some(author_type) = patch.author_type {
            update.insert("type", author_type.to_persisted().as_str());
        }
        if let Some(max_score) = patch.max_score {
            update.insert("max_score", max_score);
        }
        if let Some(content) = patch.content {
            update.insert(
                "content",
                to_bson(&content).context("Failed to serialize activity content")?,
            );
        }
        if let Some(status) = patch.status {
            update.insert("status", status.as_str());
        }
        if let Some(due_date) = patch.due_date {
            match due_date {
                Some(dt) => update.insert("due_date", chrono_to_bson(&dt)),
                None => update.insert("due_date", Bson::Null),
            };
        }
        update.insert(
            "updated_at",
            chrono_to_bson(&patch.updated_at.unwrap_or_else(Utc::now)),
        );

        self.collection()
            .update_one(doc! { "_id": object_id }, doc! { "$set": update })
            .await
            .context("Failed to update activity")?;
        Ok(())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Activity>, StoreError> {
        let object_id = match ObjectId::parse_str(id) {
            Ok(oid) => oid,
            Err(_) => return Ok(None),
        };

        let record = self
            .collection()
            .find_one(doc! { "_id": object_id })
            .await
            .context("Failed to fetch activity")?;

        record.map(ActivityRecord::into_domain).transpose()
    }
}

pub struct MongoSubmissionStore {
    mongo: Database,
}

impl MongoSubmissionStore {
    pub fn new(mongo: Database) -> Self {
        Self { mongo }
    }
}

#[async_trait]
impl SubmissionStore for MongoSubmissionStore {
    async fn exists_for_activity(&self, activity_id: &str) -> Result<bool, StoreError> {
        let collection: Collection<Document> = self.mongo.collection(SUBMISSIONS_COLLECTION);
        let count = collection
            .count_documents(doc! { "activity_id": activity_id })
            .await
            .context("Failed to count submissions for activity")?;
        Ok(count > 0)
    }
}

fn bson_to_chrono(dt: &mongodb::bson::DateTime) -> DateTime<Utc> {
    match Utc.timestamp_millis_opt(dt.timestamp_millis()) {
        LocalResult::Single(value) => value,
        LocalResult::Ambiguous(first, _) => first,
        LocalResult::None => DateTime::<Utc>::UNIX_EPOCH,
    }
}

fn chrono_to_bson(dt: &DateTime<Utc>) -> mongodb::bson::DateTime {
    mongodb::bson::DateTime::from_millis(dt.timestamp_millis())
}
