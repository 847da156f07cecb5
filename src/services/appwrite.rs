use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;
use crate::models::{
    DispatchEntity, DriverLocation, DriverRating, DriverRecord, DriverStatus, NotificationRecord,
    NotifiedMarker, Vehicle,
};
use crate::services::store::{DocumentStore, StoreError};

/// Documents fetched per list request
const DEFAULT_PAGE_SIZE: usize = 100;

/// Appwrite API client
///
/// Implements [`DocumentStore`] on top of the Appwrite databases REST API:
/// - Listing drivers and their last known locations
/// - Looking up a single driver
/// - Writing driver notifications and notified-driver markers
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
    page_size: usize,
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub drivers: String,
    pub driver_locations: String,
    pub notifications: String,
    pub notified_drivers: String,
}

/// Flat driver document as stored in Appwrite
#[derive(Debug, Deserialize)]
struct DriverDocument {
    #[serde(rename = "$id")]
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    status: DriverStatus,
    #[serde(rename = "isOnline", default)]
    is_online: bool,
    #[serde(default)]
    rating: Option<f64>,
    #[serde(rename = "ratingCount", default)]
    rating_count: Option<u32>,
    #[serde(rename = "vehicleMake", default)]
    vehicle_make: Option<String>,
    #[serde(rename = "vehicleModel", default)]
    vehicle_model: Option<String>,
    #[serde(rename = "vehicleColor", default)]
    vehicle_color: Option<String>,
    #[serde(rename = "plateNumber", default)]
    plate_number: Option<String>,
    #[serde(rename = "vehicleType", default)]
    vehicle_type: Option<String>,
}

impl From<DriverDocument> for DriverRecord {
    fn from(doc: DriverDocument) -> Self {
        let rating = doc.rating.map(|average| DriverRating {
            average,
            count: doc.rating_count.unwrap_or(0),
        });

        let vehicle = Vehicle {
            make: doc.vehicle_make,
            model: doc.vehicle_model,
            color: doc.vehicle_color,
            plate_number: doc.plate_number,
            vehicle_type: doc.vehicle_type,
        };
        let vehicle = (vehicle != Vehicle::default()).then_some(vehicle);

        DriverRecord {
            id: doc.id,
            name: doc.name,
            status: doc.status,
            is_online: doc.is_online,
            rating,
            vehicle,
        }
    }
}

/// Appwrite document ids are limited to 36 characters, so the marker id is
/// a name-based UUID of the (entity, driver) pair.
fn marker_document_id(entity: &DispatchEntity, driver_id: &str) -> String {
    let name = format!("{}:{}", entity, driver_id);
    Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    fn documents_url(&self, collection: &str) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            collection
        )
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
    }

    async fn status_error(response: Response, action: &str) -> StoreError {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return StoreError::Unauthorized;
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Appwrite {} failed: {} - {}", action, status, body);

        StoreError::ApiError {
            status: status.as_u16(),
            message: format!("Failed to {}: {}", action, body),
        }
    }

    /// Fetch every document of a collection, one page at a time
    async fn list_documents(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let base = self.documents_url(collection);
        let mut documents = Vec::new();
        let mut offset = 0usize;

        loop {
            let queries = [
                json!({ "method": "limit", "values": [self.page_size] }).to_string(),
                json!({ "method": "offset", "values": [offset] }).to_string(),
            ];
            let query_string = queries
                .iter()
                .map(|q| format!("queries[]={}", urlencoding::encode(q)))
                .collect::<Vec<_>>()
                .join("&");
            let url = format!("{}?{}", base, query_string);

            tracing::debug!("Listing {} documents from offset {}", collection, offset);

            let response = self.request(Method::GET, &url).send().await?;
            if !response.status().is_success() {
                return Err(Self::status_error(response, &format!("list {}", collection)).await);
            }

            let json: Value = response.json().await?;
            let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0) as usize;
            let page = json
                .get("documents")
                .and_then(|d| d.as_array())
                .cloned()
                .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

            let page_len = page.len();
            documents.extend(page);
            offset += page_len;

            if page_len < self.page_size || offset >= total {
                break;
            }
        }

        Ok(documents)
    }

    /// Create a document; `Ok(false)` when the id is already taken
    async fn create_document(
        &self,
        collection: &str,
        document_id: &str,
        data: Value,
    ) -> Result<bool, StoreError> {
        let url = self.documents_url(collection);
        let payload = json!({ "documentId": document_id, "data": data });

        let response = self
            .request(Method::POST, &url)
            .json(&payload)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!("Document {} already exists in {}", document_id, collection);
            return Ok(false);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response, &format!("create document in {}", collection)).await);
        }

        Ok(true)
    }
}

impl DocumentStore for AppwriteClient {
    async fn list_drivers(&self) -> Result<Vec<DriverRecord>, StoreError> {
        let documents = self.list_documents(&self.collections.drivers).await?;
        let total = documents.len();

        let drivers: Vec<DriverRecord> = documents
            .into_iter()
            .filter_map(|doc| {
                let data = doc.get("data").cloned().unwrap_or(doc);
                match serde_json::from_value::<DriverDocument>(data) {
                    Ok(parsed) => Some(DriverRecord::from(parsed)),
                    Err(e) => {
                        tracing::warn!("Skipping malformed driver document: {}", e);
                        None
                    }
                }
            })
            .collect();

        tracing::debug!("Loaded {} drivers ({} documents)", drivers.len(), total);
        Ok(drivers)
    }

    async fn list_locations(&self) -> Result<HashMap<String, DriverLocation>, StoreError> {
        let documents = self.list_documents(&self.collections.driver_locations).await?;
        let mut locations = HashMap::with_capacity(documents.len());

        for doc in documents {
            let data = doc.get("data").cloned().unwrap_or(doc);
            let driver_id = data
                .get("driverId")
                .or_else(|| data.get("$id"))
                .and_then(|id| id.as_str())
                .map(str::to_string);

            let Some(driver_id) = driver_id else {
                tracing::warn!("Skipping location document without a driver id");
                continue;
            };

            match serde_json::from_value::<DriverLocation>(data) {
                // Several documents may exist for one driver; keep the newest
                Ok(location) => {
                    locations
                        .entry(driver_id)
                        .and_modify(|current: &mut DriverLocation| {
                            if location.updated_at_ms > current.updated_at_ms {
                                *current = location.clone();
                            }
                        })
                        .or_insert(location);
                }
                Err(e) => tracing::warn!("Ignoring invalid location for driver {}: {}", driver_id, e),
            }
        }

        Ok(locations)
    }

    async fn get_driver(&self, driver_id: &str) -> Result<Option<DriverRecord>, StoreError> {
        let url = format!(
            "{}/{}",
            self.documents_url(&self.collections.drivers),
            urlencoding::encode(driver_id)
        );

        tracing::debug!("Fetching driver: {}", driver_id);

        let response = self.request(Method::GET, &url).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response, "fetch driver").await);
        }

        let json: Value = response.json().await?;
        let data = json.get("data").cloned().unwrap_or(json);

        serde_json::from_value::<DriverDocument>(data)
            .map(|doc| Some(DriverRecord::from(doc)))
            .map_err(|e| StoreError::InvalidResponse(format!("Failed to parse driver: {}", e)))
    }

    async fn append_notification(&self, record: &NotificationRecord) -> Result<(), StoreError> {
        let mut data = serde_json::to_value(record)?;
        if let Some(obj) = data.as_object_mut() {
            obj.remove("id");
        }

        self.create_document(&self.collections.notifications, &record.id, data)
            .await?;

        tracing::debug!("Stored notification {} for driver {}", record.id, record.driver_id);
        Ok(())
    }

    async fn record_notified_marker(
        &self,
        entity: &DispatchEntity,
        marker: &NotifiedMarker,
    ) -> Result<bool, StoreError> {
        let document_id = marker_document_id(entity, &marker.driver_id);
        let data = json!({
            "entityType": entity.collection(),
            "entityId": entity.id(),
            "driverId": marker.driver_id,
            "notifiedAt": marker.notified_at,
            "responded": marker.responded,
        });

        self.create_document(&self.collections.notified_drivers, &document_id, data)
            .await
    }
}
