//! HTTP handlers for the upload and listing endpoints.
//! Both are stateless and delegate all storage concerns to the shared
//! `ObjectStore`; no state survives a request.

use crate::{
    errors::AppError,
    models::object::FileRecord,
    services::storage_service::{SIGNED_URL_TTL_SECS, SharedStore, object_key},
};
use axum::{
    Json,
    extract::{Multipart, State},
};
use bytes::Bytes;
use chrono::Utc;
use futures::future::try_join_all;
use std::time::Duration;
use tracing::info;

/// Field name the frontend posts file parts under.
const FILE_FIELD: &str = "files";

/// Upper bound on file parts per request. Individual file sizes are not
/// limited; everything is buffered in memory.
const MAX_FILES_PER_REQUEST: usize = 10;

/// One buffered file part, alive only for the duration of the request.
struct UploadedFile {
    filename: String,
    content_type: String,
    data: Bytes,
}

/// `POST /upload` — buffer every file part, then for each file in input
/// order write it to the bucket under a timestamped key and collect a
/// signed download URL. Responds with the URLs in input order.
///
/// A mid-batch failure aborts the request; objects already written stay in
/// the bucket with no URL returned for them.
pub async fn upload_files(
    State(store): State<SharedStore>,
    multipart: Multipart,
) -> Result<Json<Vec<String>>, AppError> {
    let files = collect_files(multipart).await?;
    if files.is_empty() {
        return Err(AppError::client("No files uploaded"));
    }

    let ttl = Duration::from_secs(SIGNED_URL_TTL_SECS);
    let mut download_urls = Vec::with_capacity(files.len());
    for file in files {
        let key = object_key(Utc::now().timestamp_millis(), &file.filename);
        store
            .put_object(&key, file.data, &file.content_type)
            .await
            .map_err(AppError::storage)?;
        let url = store
            .presigned_get_url(&key, ttl)
            .await
            .map_err(AppError::storage)?;
        download_urls.push(url);
    }

    info!(count = download_urls.len(), "upload complete");
    Ok(Json(download_urls))
}

/// Drain the multipart body into memory before any storage call is made.
///
/// Parts that are not file parts under `FILE_FIELD` are skipped. The count
/// limit is enforced here so an over-limit request never touches storage.
async fn collect_files(mut multipart: Multipart) -> Result<Vec<UploadedFile>, AppError> {
    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::client(err.to_string()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        if files.len() == MAX_FILES_PER_REQUEST {
            return Err(AppError::client("Too many files uploaded"));
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|err| AppError::client(err.to_string()))?;

        files.push(UploadedFile {
            filename,
            content_type,
            data,
        });
    }
    Ok(files)
}

/// `GET /files` — fetch one listing page, then sign a download URL per
/// object concurrently and join before responding. Output order matches
/// listing order; a single signing failure fails the whole request.
pub async fn list_files(
    State(store): State<SharedStore>,
) -> Result<Json<Vec<FileRecord>>, AppError> {
    let objects = store.list_objects().await.map_err(AppError::listing)?;

    let ttl = Duration::from_secs(SIGNED_URL_TTL_SECS);
    let urls = try_join_all(objects.iter().map(|obj| store.presigned_get_url(&obj.key, ttl)))
        .await
        .map_err(AppError::listing)?;

    let records = objects
        .into_iter()
        .zip(urls)
        .map(|(obj, url)| FileRecord {
            key: obj.key,
            size: obj.size,
            last_modified: obj.last_modified,
            url,
        })
        .collect();

    Ok(Json(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::object::ObjectSummary;
    use crate::routes::routes::routes;
    use crate::services::storage_service::{ObjectStore, StorageError, StorageResult};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chrono::{DateTime, TimeZone, Utc};
    use http_body_util::BodyExt;
    use std::sync::{Arc, Mutex};
    use tower::ServiceExt;

    /// In-memory store that records writes and can be scripted to fail.
    #[derive(Default)]
    struct FakeStore {
        puts: Mutex<Vec<(String, String)>>,
        objects: Vec<ObjectSummary>,
        fail_put: Option<String>,
        fail_presign: Option<String>,
        fail_list: Option<String>,
    }

    #[async_trait]
    impl ObjectStore for FakeStore {
        async fn put_object(
            &self,
            key: &str,
            _body: Bytes,
            content_type: &str,
        ) -> StorageResult<()> {
            if let Some(message) = &self.fail_put {
                return Err(StorageError::Put {
                    key: key.to_string(),
                    message: message.clone(),
                });
            }
            self.puts
                .lock()
                .unwrap()
                .push((key.to_string(), content_type.to_string()));
            Ok(())
        }

        async fn presigned_get_url(
            &self,
            key: &str,
            _expires_in: Duration,
        ) -> StorageResult<String> {
            if let Some(message) = &self.fail_presign {
                return Err(StorageError::Presign {
                    key: key.to_string(),
                    message: message.clone(),
                });
            }
            Ok(format!("https://signed.example/{}", key))
        }

        async fn list_objects(&self) -> StorageResult<Vec<ObjectSummary>> {
            if let Some(message) = &self.fail_list {
                return Err(StorageError::List(message.clone()));
            }
            Ok(self.objects.clone())
        }
    }

    fn app(store: &Arc<FakeStore>) -> axum::Router {
        let shared: SharedStore = store.clone();
        routes("frontend").with_state(shared)
    }

    const BOUNDARY: &str = "test-boundary";

    fn multipart_body(files: &[(&str, &str, &str)]) -> Body {
        let mut body = String::new();
        for (filename, content_type, content) in files {
            body.push_str(&format!("--{}\r\n", BOUNDARY));
            body.push_str(&format!(
                "Content-Disposition: form-data; name=\"files\"; filename=\"{}\"\r\n",
                filename
            ));
            body.push_str(&format!("Content-Type: {}\r\n\r\n", content_type));
            body.push_str(content);
            body.push_str("\r\n");
        }
        body.push_str(&format!("--{}--\r\n", BOUNDARY));
        Body::from(body)
    }

    fn upload_request(files: &[(&str, &str, &str)]) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/upload")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", BOUNDARY),
            )
            .body(multipart_body(files))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn upload_single_file_returns_one_url() {
        let store = Arc::new(FakeStore::default());
        let response = app(&store)
            .oneshot(upload_request(&[("report.pdf", "application/pdf", "%PDF")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let urls = body_json(response).await;
        let urls = urls.as_array().unwrap();
        assert_eq!(urls.len(), 1);

        let puts = store.puts.lock().unwrap();
        assert_eq!(puts.len(), 1);
        let (key, content_type) = &puts[0];
        assert!(key.ends_with("_report.pdf"));
        let prefix = key.strip_suffix("_report.pdf").unwrap();
        assert!(prefix.chars().all(|c| c.is_ascii_digit()));
        assert_eq!(content_type, "application/pdf");
        assert_eq!(
            urls[0].as_str().unwrap(),
            format!("https://signed.example/{}", key)
        );
    }

    #[tokio::test]
    async fn upload_preserves_input_order() {
        let store = Arc::new(FakeStore::default());
        let response = app(&store)
            .oneshot(upload_request(&[
                ("a.txt", "text/plain", "aaa"),
                ("b.txt", "text/plain", "bbb"),
                ("c.txt", "text/plain", "ccc"),
            ]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let urls = body_json(response).await;
        let urls = urls.as_array().unwrap();
        assert_eq!(urls.len(), 3);
        for (url, filename) in urls.iter().zip(["a.txt", "b.txt", "c.txt"]) {
            assert!(url.as_str().unwrap().ends_with(&format!("_{}", filename)));
        }
    }

    #[tokio::test]
    async fn empty_upload_is_rejected_without_storage_calls() {
        let store = Arc::new(FakeStore::default());
        let response = app(&store).oneshot(upload_request(&[])).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "No files uploaded");
        assert_eq!(store.puts.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn over_limit_upload_is_rejected_without_storage_calls() {
        let files: Vec<(&str, &str, &str)> =
            (0..11).map(|_| ("x.bin", "application/octet-stream", "x")).collect();

        let store = Arc::new(FakeStore::default());
        let response = app(&store).oneshot(upload_request(&files)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(store.puts.lock().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn upload_storage_failure_surfaces_error_text() {
        let store = Arc::new(FakeStore {
            fail_put: Some("access denied".into()),
            ..FakeStore::default()
        });
        let response = app(&store)
            .oneshot(upload_request(&[("report.pdf", "application/pdf", "%PDF")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        let message = body["message"].as_str().unwrap();
        assert!(message.ends_with("access denied"), "got: {}", message);
    }

    #[tokio::test]
    async fn listing_returns_one_record_per_object() {
        let store = Arc::new(FakeStore {
            objects: vec![
                ObjectSummary {
                    key: "1700000000000_report.pdf".into(),
                    size: 1024,
                    last_modified: Utc.timestamp_millis_opt(1700000000000).unwrap(),
                },
                ObjectSummary {
                    key: "1700000123456_photo.png".into(),
                    size: 2048,
                    last_modified: Utc.timestamp_millis_opt(1700000123456).unwrap(),
                },
            ],
            ..FakeStore::default()
        });

        let response = app(&store)
            .oneshot(Request::get("/files").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let records = body_json(response).await;
        let records = records.as_array().unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0]["key"], "1700000000000_report.pdf");
        assert_eq!(records[0]["size"], 1024);
        assert_eq!(records[0]["lastModified"], "2023-11-14T22:13:20.000Z");
        assert_eq!(
            records[0]["url"],
            "https://signed.example/1700000000000_report.pdf"
        );

        assert_eq!(records[1]["key"], "1700000123456_photo.png");
        assert_eq!(records[1]["size"], 2048);
        // Every lastModified parses back as ISO-8601.
        for record in records {
            DateTime::parse_from_rfc3339(record["lastModified"].as_str().unwrap()).unwrap();
        }
    }

    #[tokio::test]
    async fn listing_failure_returns_error_field() {
        let store = Arc::new(FakeStore {
            fail_list: Some("bucket unavailable".into()),
            ..FakeStore::default()
        });
        let response = app(&store)
            .oneshot(Request::get("/files").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.ends_with("bucket unavailable"), "got: {}", error);
    }

    #[tokio::test]
    async fn single_signing_failure_fails_whole_listing() {
        let store = Arc::new(FakeStore {
            objects: vec![ObjectSummary {
                key: "1_a.txt".into(),
                size: 1,
                last_modified: Utc.timestamp_millis_opt(0).unwrap(),
            }],
            fail_presign: Some("signing key expired".into()),
            ..FakeStore::default()
        });
        let response = app(&store)
            .oneshot(Request::get("/files").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().contains("signing key expired"));
    }

    #[tokio::test]
    async fn unknown_path_without_frontend_is_404() {
        let store = Arc::new(FakeStore::default());
        let response = app(&store)
            .oneshot(Request::get("/no-such-page").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
